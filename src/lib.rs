//! loadkit: loading and asynchronous caches over a concurrent map of pending
//! computations.
//!
//! The [`store`] owns entries and their atomic primitives. The [`cache`]
//! facades ([`traits::Cache`], [`traits::LoadingCache`]) add loading,
//! bulk loading, refresh, and statistics on top. A store of [`pending::Pending`]
//! computations is read as a map of finished values through
//! [`view::AsyncValueView`].

pub mod builder;
pub mod cache;
pub mod entry;
pub mod error;
pub mod executor;
pub mod listener;
pub mod loader;
pub mod map;
pub mod outcome;
pub mod pending;
pub mod prelude;
pub mod stats;
pub mod store;
pub mod time;
pub mod traits;
pub mod view;
