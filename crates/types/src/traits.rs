//! Async traits shared across all hlbridge crates.
//!
//! Every cross-crate abstraction is defined here so that higher layers depend
//! only on `hlbridge-types`, not on each other.

use crate::{TokenRecord, TokenUpdate};
use async_trait::async_trait;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

pub use crate::error::Result;

/// Persistent storage for OAuth tokens, keyed by location id.
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Create the record for `location_id`, or overwrite its mutable fields.
    ///
    /// Must be atomic with respect to the key: concurrent callers never
    /// create two rows for the same location; the last writer wins.
    async fn upsert(&self, location_id: &str, update: &TokenUpdate) -> Result<TokenRecord>;

    /// Exact-key lookup.
    async fn get_by_location(&self, location_id: &str) -> Result<Option<TokenRecord>>;

    /// All stored location ids, sorted.
    async fn list_locations(&self) -> Result<Vec<String>>;
}

/// Source of the current time as unix seconds.
pub trait Clock: Send + Sync {
    fn now(&self) -> i64;
}

/// [`Clock`] backed by the system wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> i64 {
        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or(Duration::ZERO)
            .as_secs();
        i64::try_from(secs).unwrap_or(i64::MAX)
    }
}
