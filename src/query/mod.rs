//! Client-side data synchronization.
//!
//! Server resources are cached by [`QueryKey`], loaded through fetchers, and
//! kept current by invalidating keys after writes:
//! - `QueryClient::fetch` reads a key, joining any fetch already in flight
//! - `QueryClient::invalidate` marks a key and everything under it stale
//! - `QueryClient::observe` subscribes a view to one key
//! - `MutationRunner::run` performs a write and invalidates afterwards

mod client;
mod config;
mod entry;
mod error;
mod key;
mod mutation;
mod observer;

pub use client::{fetcher, CacheEvent, CacheEventKind, FetchFuture, Fetcher, QueryClient};
pub use config::QueryConfig;
pub use entry::{CacheEntry, QueryStatus};
pub use error::QueryError;
pub use key::{QueryKey, Segment};
pub use mutation::{MutationCallbacks, MutationRunner, MutationState};
pub use observer::{PrefixSubscriber, QueryObserver, QueryResult};
