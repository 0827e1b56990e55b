use std::collections::BTreeMap;
use std::sync::RwLock;

use async_trait::async_trait;
use tierds_types::{Context, DatastoreKey};

use crate::error::{StoreError, StoreResult};
use crate::traits::Datastore;

/// In-memory, map-based datastore.
///
/// Intended for tests and embedding. Values are held behind a `RwLock` and
/// cloned on read/write. Every call checks the context before touching the
/// map.
pub struct InMemoryDatastore {
    values: RwLock<BTreeMap<DatastoreKey, Vec<u8>>>,
}

impl InMemoryDatastore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self {
            values: RwLock::new(BTreeMap::new()),
        }
    }

    /// Create a store pre-populated with `entries`.
    pub fn with_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<DatastoreKey>,
        V: Into<Vec<u8>>,
    {
        let values = entries
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self {
            values: RwLock::new(values),
        }
    }

    /// Number of stored values.
    pub fn len(&self) -> usize {
        self.values.read().expect("lock poisoned").len()
    }

    /// Returns `true` if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.values.read().expect("lock poisoned").is_empty()
    }

    /// All keys in sorted order.
    pub fn keys(&self) -> Vec<DatastoreKey> {
        self.values
            .read()
            .expect("lock poisoned")
            .keys()
            .cloned()
            .collect()
    }

    /// Remove all values.
    pub fn clear(&self) {
        self.values.write().expect("lock poisoned").clear();
    }
}

impl Default for InMemoryDatastore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Datastore for InMemoryDatastore {
    async fn get(&self, ctx: &Context, key: &DatastoreKey) -> StoreResult<Vec<u8>> {
        ctx.check()?;
        let map = self.values.read().expect("lock poisoned");
        map.get(key)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(key.clone()))
    }

    async fn has(&self, ctx: &Context, key: &DatastoreKey) -> StoreResult<bool> {
        ctx.check()?;
        Ok(self.values.read().expect("lock poisoned").contains_key(key))
    }

    async fn get_size(&self, ctx: &Context, key: &DatastoreKey) -> StoreResult<u64> {
        ctx.check()?;
        let map = self.values.read().expect("lock poisoned");
        map.get(key)
            .map(|v| v.len() as u64)
            .ok_or_else(|| StoreError::NotFound(key.clone()))
    }

    async fn put(&self, ctx: &Context, key: &DatastoreKey, value: &[u8]) -> StoreResult<()> {
        ctx.check()?;
        self.values
            .write()
            .expect("lock poisoned")
            .insert(key.clone(), value.to_vec());
        Ok(())
    }

    async fn delete(&self, ctx: &Context, key: &DatastoreKey) -> StoreResult<()> {
        ctx.check()?;
        self.values.write().expect("lock poisoned").remove(key);
        Ok(())
    }
}

impl std::fmt::Debug for InMemoryDatastore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryDatastore")
            .field("value_count", &self.len())
            .finish()
    }
}
