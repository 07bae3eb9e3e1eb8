//! Classification helpers for pending computations.
//!
//! These are the only functions the rest of the crate uses to look inside a
//! [`Pending`]. They centralize the rule that an in-flight, failed, or
//! cancelled computation reads as absent, so a failure never escapes into
//! map semantics.
//!
//! | Helper                | Blocks | In flight | Failed | Succeeded |
//! |-----------------------|--------|-----------|--------|-----------|
//! | [`is_ready`]          | no     | `false`   | `false`| `true`    |
//! | [`get_if_ready`]      | no     | `None`    | `None` | `Some(v)` |
//! | [`get_when_successful`]| yes   | waits     | `None` | `Some(v)` |

use crate::pending::Pending;

/// Returns `true` if the computation finished without failure.
#[inline]
pub fn is_ready<V>(pending: Option<&Pending<V>>) -> bool {
    pending.is_some_and(|p| p.is_done() && !p.is_completed_exceptionally())
}

/// Returns the value if the computation succeeded, or `None` if it is still
/// in flight, failed, or missing.
#[inline]
pub fn get_if_ready<V: Clone>(pending: Option<&Pending<V>>) -> Option<V> {
    pending.and_then(|p| p.peek()).and_then(Result::ok)
}

/// Waits for the computation and returns its value, or `None` if it failed,
/// was cancelled, or is missing. The failure itself is discarded.
pub fn get_when_successful<V: Clone>(pending: Option<&Pending<V>>) -> Option<V> {
    pending.and_then(|p| p.wait().ok())
}
