//! In-memory token store backed by a `HashMap` behind a `Mutex`.

use async_trait::async_trait;
use hlbridge_types::{HlError, TokenRecord, TokenStore, TokenUpdate, traits::Result};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

/// An in-memory [`TokenStore`] implementation for testing and ephemeral use.
pub struct InMemoryTokenStore {
    /// Location-keyed token map.
    data: Mutex<HashMap<String, TokenRecord>>,
}

impl InMemoryTokenStore {
    /// Creates a new empty in-memory token store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            data: Mutex::new(HashMap::new()),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<String, TokenRecord>>> {
        self.data
            .lock()
            .map_err(|_| HlError::Storage("token map lock poisoned".into()))
    }
}

impl Default for InMemoryTokenStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TokenStore for InMemoryTokenStore {
    /// Inserts or overwrites the record for the location within one lock scope.
    async fn upsert(&self, location_id: &str, update: &TokenUpdate) -> Result<TokenRecord> {
        let mut data = self.lock()?;
        let record = data
            .entry(location_id.to_string())
            .and_modify(|r| update.apply_to(r))
            .or_insert_with(|| update.clone().into_record(location_id));
        Ok(record.clone())
    }

    async fn get_by_location(&self, location_id: &str) -> Result<Option<TokenRecord>> {
        Ok(self.lock()?.get(location_id).cloned())
    }

    async fn list_locations(&self) -> Result<Vec<String>> {
        let mut ids: Vec<String> = self.lock()?.keys().cloned().collect();
        ids.sort();
        Ok(ids)
    }
}
