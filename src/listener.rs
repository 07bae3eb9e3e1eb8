//! Removal notifications.
//!
//! Stores report every entry they drop (explicitly or by replacement) to an
//! optional [`RemovalListener`]. Notifications are dispatched on the store's
//! executor after the entry's lock has been released, so a listener may call
//! back into the cache.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use crate::executor::Executor;
use crate::outcome;
use crate::pending::Pending;

/// Why an entry left the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RemovalCause {
    /// Removed by the user (`remove`, `invalidate`, `clear`, a remapping that
    /// returned absent).
    Explicit,
    /// The value was overwritten by `put`, `replace`, or a remapping.
    Replaced,
}

/// Receives notifications when entries are removed.
pub trait RemovalListener<K, V>: Send + Sync {
    fn on_removal(&self, key: &K, value: &V, cause: RemovalCause);
}

impl<K, V, F> RemovalListener<K, V> for F
where
    F: Fn(&K, &V, RemovalCause) + Send + Sync,
{
    fn on_removal(&self, key: &K, value: &V, cause: RemovalCause) {
        self(key, value, cause)
    }
}

/// Adapts a listener over realized values to a store holding pending
/// computations; only successfully completed values are reported.
pub(crate) struct ReadyValueListener<K, V> {
    inner: Arc<dyn RemovalListener<K, V>>,
}

impl<K, V> ReadyValueListener<K, V> {
    pub(crate) fn new(inner: Arc<dyn RemovalListener<K, V>>) -> Self {
        Self { inner }
    }
}

impl<K, V: Clone> RemovalListener<K, Pending<V>> for ReadyValueListener<K, V> {
    fn on_removal(&self, key: &K, value: &Pending<V>, cause: RemovalCause) {
        if let Some(value) = outcome::get_if_ready(Some(value)) {
            self.inner.on_removal(key, &value, cause);
        }
    }
}

/// Hands a removal notification to `executor`, containing listener panics.
pub(crate) fn notify<K, V>(
    listener: &Arc<dyn RemovalListener<K, V>>,
    executor: &dyn Executor,
    key: K,
    value: V,
    cause: RemovalCause,
) where
    K: Send + 'static,
    V: Send + 'static,
{
    let listener = Arc::clone(listener);
    executor.execute(Box::new(move || {
        let delivered = panic::catch_unwind(AssertUnwindSafe(|| {
            listener.on_removal(&key, &value, cause);
        }));
        if delivered.is_err() {
            tracing::warn!(?cause, "removal listener panicked");
        }
    }));
}

#[cfg(test)]
mod tests {
    use parking_lot::Mutex;

    use super::*;
    use crate::executor::SameThreadExecutor;

    #[test]
    fn notify_delivers_on_executor() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let listener: Arc<dyn RemovalListener<u32, String>> =
            Arc::new(move |k: &u32, v: &String, cause: RemovalCause| {
                sink.lock().push((*k, v.clone(), cause))
            });

        notify(&listener, &SameThreadExecutor, 1, "a".to_string(), RemovalCause::Explicit);
        assert_eq!(*seen.lock(), vec![(1, "a".to_string(), RemovalCause::Explicit)]);
    }

    #[test]
    fn panicking_listener_is_contained() {
        let listener: Arc<dyn RemovalListener<u32, u32>> =
            Arc::new(|_: &u32, _: &u32, _: RemovalCause| panic!("listener bug"));
        notify(&listener, &SameThreadExecutor, 1, 1, RemovalCause::Replaced);
    }

    #[test]
    fn ready_value_listener_skips_unfinished() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let inner: Arc<dyn RemovalListener<u32, u32>> =
            Arc::new(move |k: &u32, v: &u32, _: RemovalCause| sink.lock().push((*k, *v)));
        let adapter = ReadyValueListener::new(inner);

        adapter.on_removal(&1, &Pending::new(), RemovalCause::Explicit);
        adapter.on_removal(&2, &Pending::completed(20), RemovalCause::Explicit);
        assert_eq!(*seen.lock(), vec![(2, 20)]);
    }
}
