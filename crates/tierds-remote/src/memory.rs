use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use tierds_types::{block_cid, Cid, Codec, Context};

use crate::error::{RemoteError, RemoteResult};
use crate::traits::BlockStore;

/// In-memory, CID-keyed block store for tests and embedding.
pub struct InMemoryBlockStore {
    blocks: RwLock<HashMap<Cid, Vec<u8>>>,
}

impl InMemoryBlockStore {
    pub fn new() -> Self {
        Self {
            blocks: RwLock::new(HashMap::new()),
        }
    }

    /// Store `data` under an explicit CID.
    pub fn insert(&self, cid: Cid, data: impl Into<Vec<u8>>) {
        self.blocks
            .write()
            .expect("lock poisoned")
            .insert(cid, data.into());
    }

    /// Store `data` under its SHA2-256 CID for `codec` and return that CID.
    pub fn put(&self, codec: Codec, data: impl Into<Vec<u8>>) -> Cid {
        let data = data.into();
        let cid = block_cid(codec, &data);
        self.insert(cid, data);
        cid
    }

    pub fn len(&self) -> usize {
        self.blocks.read().expect("lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.read().expect("lock poisoned").is_empty()
    }
}

impl Default for InMemoryBlockStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BlockStore for InMemoryBlockStore {
    async fn get(&self, ctx: &Context, cid: &Cid) -> RemoteResult<Vec<u8>> {
        ctx.check()?;
        let blocks = self.blocks.read().expect("lock poisoned");
        blocks.get(cid).cloned().ok_or(RemoteError::NotFound(*cid))
    }

    async fn has(&self, ctx: &Context, cid: &Cid) -> RemoteResult<bool> {
        ctx.check()?;
        Ok(self.blocks.read().expect("lock poisoned").contains_key(cid))
    }

    async fn get_size(&self, ctx: &Context, cid: &Cid) -> RemoteResult<u64> {
        ctx.check()?;
        let blocks = self.blocks.read().expect("lock poisoned");
        blocks
            .get(cid)
            .map(|data| data.len() as u64)
            .ok_or(RemoteError::NotFound(*cid))
    }
}

impl std::fmt::Debug for InMemoryBlockStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryBlockStore")
            .field("block_count", &self.len())
            .finish()
    }
}
