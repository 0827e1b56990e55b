use async_trait::async_trait;
use tierds_remote::{BlockStore, RemoteError, RemoteResult};
use tierds_store::{Datastore, StoreResult};
use tierds_types::{Cid, CodecCandidates, Context, DatastoreKey};
use tracing::{debug, warn};

use crate::metrics::ResolverMetrics;

/// Read operation being resolved.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Op {
    Get,
    Has,
    GetSize,
}

impl Op {
    fn as_str(self) -> &'static str {
        match self {
            Op::Get => "get",
            Op::Has => "has",
            Op::GetSize => "get_size",
        }
    }
}

/// A positive remote answer.
enum Found {
    Block(Vec<u8>),
    Present,
    Size(u64),
}

/// Datastore that answers reads from a remote block store first.
///
/// A read of `key` tries, in order, the CIDs produced by the configured
/// [`CodecCandidates`] against the remote tier. The first positive answer is
/// returned. When every candidate misses, fails, or the key does not name a
/// multihash at all, the request goes to the local tier and its result is
/// returned unchanged, errors included.
///
/// Remote failures never reach the caller, including a remote that reports
/// its own interruption; they are logged and counted in [`ResolverMetrics`]. Cancellation or deadline expiry
/// of the caller's [`Context`] ends the request at once without consulting
/// the local tier.
///
/// Writes and deletes go to the local tier only.
pub struct TieredDatastore<R, L> {
    remote: R,
    local: L,
    candidates: CodecCandidates,
    metrics: ResolverMetrics,
}

impl<R: BlockStore, L: Datastore> TieredDatastore<R, L> {
    /// Tiered store probing raw, then dag-pb.
    pub fn new(remote: R, local: L) -> Self {
        Self::with_candidates(remote, local, CodecCandidates::default())
    }

    /// Tiered store probing `candidates` in order.
    pub fn with_candidates(remote: R, local: L, candidates: CodecCandidates) -> Self {
        Self {
            remote,
            local,
            candidates,
            metrics: ResolverMetrics::default(),
        }
    }

    pub fn remote(&self) -> &R {
        &self.remote
    }

    pub fn local(&self) -> &L {
        &self.local
    }

    pub fn candidates(&self) -> &CodecCandidates {
        &self.candidates
    }

    /// Counters for this store. Clones share the underlying values.
    pub fn metrics(&self) -> &ResolverMetrics {
        &self.metrics
    }

    async fn lookup(&self, ctx: &Context, op: Op, cid: &Cid) -> RemoteResult<Option<Found>> {
        match op {
            Op::Get => self.remote.get(ctx, cid).await.map(|data| Some(Found::Block(data))),
            Op::Has => self
                .remote
                .has(ctx, cid)
                .await
                .map(|found| found.then_some(Found::Present)),
            Op::GetSize => self
                .remote
                .get_size(ctx, cid)
                .await
                .map(|size| Some(Found::Size(size))),
        }
    }

    /// Walk the candidates against the remote tier.
    ///
    /// `Ok(None)` means the local tier must answer.
    async fn resolve_remote(
        &self,
        ctx: &Context,
        op: Op,
        key: &DatastoreKey,
    ) -> StoreResult<Option<Found>> {
        let cids = match self.candidates.candidates(key) {
            Ok(cids) => cids,
            Err(e) => {
                self.metrics.record_malformed_key();
                debug!(op = op.as_str(), %key, error = %e, "key has no remote candidates");
                return Ok(None);
            }
        };

        for cid in &cids {
            // The remote call is raced against the context so that a store
            // which ignores cancellation cannot hold the request open.
            match ctx.run(self.lookup(ctx, op, cid)).await? {
                Ok(Some(found)) => {
                    self.metrics.record_remote_hit();
                    debug!(op = op.as_str(), %key, %cid, "remote hit");
                    return Ok(Some(found));
                }
                Ok(None) => {
                    self.metrics.record_remote_miss();
                    debug!(op = op.as_str(), %key, %cid, "remote miss");
                }
                // Only the caller's own context ends the request. A remote
                // that gave up on its own is a failed lookup like any other.
                Err(RemoteError::Interrupted(remote_reason)) => match ctx.err() {
                    Some(reason) => return Err(reason.into()),
                    None => {
                        self.metrics.record_remote_error();
                        warn!(op = op.as_str(), %key, %cid, error = %remote_reason, "remote lookup interrupted, trying next candidate");
                    }
                },
                Err(e) if e.is_not_found() => {
                    self.metrics.record_remote_miss();
                    debug!(op = op.as_str(), %key, %cid, "remote miss");
                }
                Err(e) => {
                    self.metrics.record_remote_error();
                    warn!(op = op.as_str(), %key, %cid, error = %e, "remote lookup failed, trying next candidate");
                }
            }
        }
        Ok(None)
    }

    fn fall_back(&self, op: Op, key: &DatastoreKey) {
        self.metrics.record_local_fallback();
        debug!(op = op.as_str(), %key, "falling back to local store");
    }
}

#[async_trait]
impl<R: BlockStore, L: Datastore> Datastore for TieredDatastore<R, L> {
    async fn get(&self, ctx: &Context, key: &DatastoreKey) -> StoreResult<Vec<u8>> {
        if let Some(Found::Block(data)) = self.resolve_remote(ctx, Op::Get, key).await? {
            return Ok(data);
        }
        self.fall_back(Op::Get, key);
        ctx.run(self.local.get(ctx, key)).await?
    }

    async fn has(&self, ctx: &Context, key: &DatastoreKey) -> StoreResult<bool> {
        if let Some(Found::Present) = self.resolve_remote(ctx, Op::Has, key).await? {
            return Ok(true);
        }
        self.fall_back(Op::Has, key);
        ctx.run(self.local.has(ctx, key)).await?
    }

    async fn get_size(&self, ctx: &Context, key: &DatastoreKey) -> StoreResult<u64> {
        if let Some(Found::Size(size)) = self.resolve_remote(ctx, Op::GetSize, key).await? {
            return Ok(size);
        }
        self.fall_back(Op::GetSize, key);
        ctx.run(self.local.get_size(ctx, key)).await?
    }

    async fn put(&self, ctx: &Context, key: &DatastoreKey, value: &[u8]) -> StoreResult<()> {
        self.local.put(ctx, key, value).await
    }

    async fn delete(&self, ctx: &Context, key: &DatastoreKey) -> StoreResult<()> {
        self.local.delete(ctx, key).await
    }
}

impl<R, L> std::fmt::Debug for TieredDatastore<R, L> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TieredDatastore")
            .field("candidates", &self.candidates)
            .field("metrics", &self.metrics.snapshot())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;
    use tierds_remote::InMemoryBlockStore;
    use tierds_store::{InMemoryDatastore, StoreError};
    use tierds_types::{key_to_cid, multihash_to_key, sha256_multihash, Codec, Interrupted};
    use tokio::sync::Notify;

    // -----------------------------------------------------------------------
    // Stubs
    // -----------------------------------------------------------------------

    #[derive(Clone, Copy)]
    enum Mode {
        Serve,
        Fail,
        Interrupt,
        Hang,
    }

    /// Remote tier that records every call and can fail or hang on demand.
    struct StubRemote {
        blocks: InMemoryBlockStore,
        mode: Mode,
        calls: Mutex<Vec<(&'static str, Cid)>>,
        entered: Notify,
    }

    impl StubRemote {
        fn new(mode: Mode) -> Arc<Self> {
            Arc::new(Self {
                blocks: InMemoryBlockStore::new(),
                mode,
                calls: Mutex::new(Vec::new()),
                entered: Notify::new(),
            })
        }

        fn calls(&self) -> Vec<(&'static str, Cid)> {
            self.calls.lock().unwrap().clone()
        }

        fn codecs_queried(&self) -> Vec<u64> {
            self.calls().iter().map(|(_, cid)| cid.codec()).collect()
        }

        async fn enter(&self, op: &'static str, cid: &Cid) -> RemoteResult<()> {
            self.calls.lock().unwrap().push((op, *cid));
            match self.mode {
                Mode::Serve => Ok(()),
                Mode::Fail => Err(RemoteError::TransportError("connection refused".into())),
                Mode::Interrupt => Err(Interrupted::DeadlineExceeded.into()),
                Mode::Hang => {
                    self.entered.notify_one();
                    std::future::pending().await
                }
            }
        }
    }

    #[async_trait]
    impl BlockStore for StubRemote {
        async fn get(&self, ctx: &Context, cid: &Cid) -> RemoteResult<Vec<u8>> {
            self.enter("get", cid).await?;
            self.blocks.get(ctx, cid).await
        }

        async fn has(&self, ctx: &Context, cid: &Cid) -> RemoteResult<bool> {
            self.enter("has", cid).await?;
            self.blocks.has(ctx, cid).await
        }

        async fn get_size(&self, ctx: &Context, cid: &Cid) -> RemoteResult<u64> {
            self.enter("get_size", cid).await?;
            self.blocks.get_size(ctx, cid).await
        }
    }

    /// Local tier that records every call.
    struct StubLocal {
        inner: InMemoryDatastore,
        hang_reads: bool,
        calls: Mutex<Vec<(&'static str, DatastoreKey)>>,
        entered: Notify,
    }

    impl StubLocal {
        fn new() -> Arc<Self> {
            Self::build(false)
        }

        /// Local tier whose reads never complete on their own.
        fn hanging() -> Arc<Self> {
            Self::build(true)
        }

        fn build(hang_reads: bool) -> Arc<Self> {
            Arc::new(Self {
                inner: InMemoryDatastore::new(),
                hang_reads,
                calls: Mutex::new(Vec::new()),
                entered: Notify::new(),
            })
        }

        fn record(&self, op: &'static str, key: &DatastoreKey) {
            self.calls.lock().unwrap().push((op, key.clone()));
        }

        async fn read(&self, op: &'static str, key: &DatastoreKey) {
            self.record(op, key);
            if self.hang_reads {
                self.entered.notify_one();
                std::future::pending::<()>().await;
            }
        }

        fn calls(&self) -> Vec<(&'static str, DatastoreKey)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Datastore for StubLocal {
        async fn get(&self, ctx: &Context, key: &DatastoreKey) -> StoreResult<Vec<u8>> {
            self.read("get", key).await;
            self.inner.get(ctx, key).await
        }

        async fn has(&self, ctx: &Context, key: &DatastoreKey) -> StoreResult<bool> {
            self.read("has", key).await;
            self.inner.has(ctx, key).await
        }

        async fn get_size(&self, ctx: &Context, key: &DatastoreKey) -> StoreResult<u64> {
            self.read("get_size", key).await;
            self.inner.get_size(ctx, key).await
        }

        async fn put(&self, ctx: &Context, key: &DatastoreKey, value: &[u8]) -> StoreResult<()> {
            self.record("put", key);
            self.inner.put(ctx, key, value).await
        }

        async fn delete(&self, ctx: &Context, key: &DatastoreKey) -> StoreResult<()> {
            self.record("delete", key);
            self.inner.delete(ctx, key).await
        }
    }

    type Tiered = TieredDatastore<Arc<StubRemote>, Arc<StubLocal>>;

    fn setup(mode: Mode) -> (Tiered, Arc<StubRemote>, Arc<StubLocal>) {
        let remote = StubRemote::new(mode);
        let local = StubLocal::new();
        let ds = TieredDatastore::new(remote.clone(), local.clone());
        (ds, remote, local)
    }

    fn block_key(data: &[u8]) -> DatastoreKey {
        multihash_to_key(&sha256_multihash(data))
    }

    fn cid_for(key: &DatastoreKey, codec: Codec) -> Cid {
        key_to_cid(key, codec).unwrap()
    }

    const RAW: u64 = 0x55;
    const DAG_PB: u64 = 0x70;

    // -----------------------------------------------------------------------
    // Remote hits
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn raw_hit_short_circuits() {
        let (ds, remote, local) = setup(Mode::Serve);
        let ctx = Context::background();
        let key = block_key(b"hello");
        remote.blocks.insert(cid_for(&key, Codec::RAW), b"hello".to_vec());

        assert_eq!(ds.get(&ctx, &key).await.unwrap(), b"hello");
        assert_eq!(remote.codecs_queried(), vec![RAW]);
        assert!(local.calls().is_empty());
        assert_eq!(ds.metrics().snapshot().remote_hits, 1);
    }

    #[tokio::test]
    async fn dag_pb_hit_wins_over_local() {
        let (ds, remote, local) = setup(Mode::Serve);
        let ctx = Context::background();
        let key = block_key(b"hello");
        remote.blocks.insert(cid_for(&key, Codec::DAG_PROTOBUF), b"hello".to_vec());
        local.inner.put(&ctx, &key, b"bye").await.unwrap();

        assert_eq!(ds.get(&ctx, &key).await.unwrap(), b"hello");
        assert_eq!(remote.codecs_queried(), vec![RAW, DAG_PB]);
        assert!(local.calls().is_empty());
    }

    #[tokio::test]
    async fn get_size_from_remote() {
        let (ds, remote, local) = setup(Mode::Serve);
        let ctx = Context::background();
        let key = block_key(b"sized block");
        remote.blocks.insert(cid_for(&key, Codec::DAG_PROTOBUF), b"sized block".to_vec());

        assert_eq!(ds.get_size(&ctx, &key).await.unwrap(), 11);
        assert!(local.calls().is_empty());
    }

    #[tokio::test]
    async fn has_true_from_remote() {
        let (ds, remote, local) = setup(Mode::Serve);
        let ctx = Context::background();
        let key = block_key(b"present");
        remote.blocks.insert(cid_for(&key, Codec::RAW), b"present".to_vec());

        assert!(ds.has(&ctx, &key).await.unwrap());
        assert_eq!(remote.calls(), vec![("has", cid_for(&key, Codec::RAW))]);
        assert!(local.calls().is_empty());
    }

    // -----------------------------------------------------------------------
    // Fallback
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn double_miss_queries_local_once() {
        let (ds, remote, local) = setup(Mode::Serve);
        let ctx = Context::background();
        let key = block_key(b"hello");
        local.inner.put(&ctx, &key, b"bye").await.unwrap();

        assert_eq!(ds.get(&ctx, &key).await.unwrap(), b"bye");
        assert_eq!(remote.codecs_queried(), vec![RAW, DAG_PB]);
        assert_eq!(local.calls(), vec![("get", key)]);

        let snap = ds.metrics().snapshot();
        assert_eq!(snap.remote_misses, 2);
        assert_eq!(snap.local_fallbacks, 1);
    }

    #[tokio::test]
    async fn local_not_found_is_returned_verbatim() {
        let (ds, _remote, _local) = setup(Mode::Serve);
        let ctx = Context::background();
        let key = block_key(b"nowhere");

        let err = ds.get(&ctx, &key).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(k) if k == key));
        assert!(ds.get_size(&ctx, &key).await.unwrap_err().is_not_found());
        assert!(!ds.has(&ctx, &key).await.unwrap());
    }

    #[tokio::test]
    async fn remote_has_false_falls_through_to_local() {
        let (ds, remote, local) = setup(Mode::Serve);
        let ctx = Context::background();
        let key = block_key(b"local only");
        local.inner.put(&ctx, &key, b"local only").await.unwrap();

        assert!(ds.has(&ctx, &key).await.unwrap());
        assert_eq!(remote.codecs_queried(), vec![RAW, DAG_PB]);
        assert_eq!(local.calls(), vec![("has", key)]);
    }

    #[tokio::test]
    async fn transport_errors_are_absorbed() {
        let (ds, remote, local) = setup(Mode::Fail);
        let ctx = Context::background();
        let key = block_key(b"hello");
        local.inner.put(&ctx, &key, b"bye").await.unwrap();

        assert_eq!(ds.get(&ctx, &key).await.unwrap(), b"bye");
        assert_eq!(remote.codecs_queried(), vec![RAW, DAG_PB]);
        assert_eq!(local.calls().len(), 1);

        let snap = ds.metrics().snapshot();
        assert_eq!(snap.remote_errors, 2);
        assert_eq!(snap.remote_misses, 0);
    }

    #[tokio::test]
    async fn malformed_key_goes_straight_to_local() {
        let (ds, remote, local) = setup(Mode::Serve);
        let ctx = Context::background();
        let key = DatastoreKey::new("/not-a-multihash");
        local.inner.put(&ctx, &key, b"plain").await.unwrap();

        assert_eq!(ds.get(&ctx, &key).await.unwrap(), b"plain");
        assert!(remote.calls().is_empty());
        assert_eq!(local.calls().len(), 1);
        assert_eq!(ds.metrics().snapshot().malformed_keys, 1);
    }

    #[tokio::test]
    async fn every_operation_uses_the_same_order() {
        let (ds, remote, _local) = setup(Mode::Serve);
        let ctx = Context::background();
        let key = block_key(b"absent");

        let _ = ds.get(&ctx, &key).await;
        let _ = ds.has(&ctx, &key).await;
        let _ = ds.get_size(&ctx, &key).await;

        let ops: Vec<_> = remote.calls().iter().map(|(op, cid)| (*op, cid.codec())).collect();
        assert_eq!(
            ops,
            vec![
                ("get", RAW),
                ("get", DAG_PB),
                ("has", RAW),
                ("has", DAG_PB),
                ("get_size", RAW),
                ("get_size", DAG_PB),
            ]
        );
    }

    #[tokio::test]
    async fn custom_candidate_order() {
        let remote = StubRemote::new(Mode::Serve);
        let local = StubLocal::new();
        let candidates =
            CodecCandidates::new(vec![Codec::DAG_CBOR, Codec::RAW, Codec::DAG_PROTOBUF]).unwrap();
        let ds = TieredDatastore::with_candidates(remote.clone(), local.clone(), candidates);
        let ctx = Context::background();
        let key = block_key(b"cbor");
        remote.blocks.insert(cid_for(&key, Codec::RAW), b"cbor".to_vec());

        assert_eq!(ds.get(&ctx, &key).await.unwrap(), b"cbor");
        assert_eq!(remote.codecs_queried(), vec![0x71, RAW]);
    }

    // -----------------------------------------------------------------------
    // Cancellation
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn cancel_during_remote_lookup_skips_local() {
        let (ds, remote, local) = setup(Mode::Hang);
        let ds = Arc::new(ds);
        let ctx = Context::background();
        let key = block_key(b"hello");
        local.inner.put(&ctx, &key, b"bye").await.unwrap();

        let task = {
            let ds = ds.clone();
            let ctx = ctx.clone();
            let key = key.clone();
            tokio::spawn(async move { ds.get(&ctx, &key).await })
        };
        remote.entered.notified().await;
        ctx.cancel();

        let err = task.await.unwrap().unwrap_err();
        assert!(matches!(err, StoreError::Interrupted(Interrupted::Cancelled)));
        assert_eq!(remote.codecs_queried(), vec![RAW]);
        assert!(local.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_during_remote_lookup() {
        let (ds, remote, local) = setup(Mode::Hang);
        let ctx = Context::background().with_timeout(Duration::from_secs(5));
        let key = block_key(b"slow");

        let err = ds.has(&ctx, &key).await.unwrap_err();
        assert!(matches!(err, StoreError::Interrupted(Interrupted::DeadlineExceeded)));
        assert_eq!(remote.calls().len(), 1);
        assert!(local.calls().is_empty());
    }

    #[tokio::test]
    async fn already_cancelled_context_touches_nothing() {
        let (ds, remote, local) = setup(Mode::Serve);
        let ctx = Context::background();
        ctx.cancel();

        let err = ds.get_size(&ctx, &block_key(b"x")).await.unwrap_err();
        assert!(matches!(err, StoreError::Interrupted(Interrupted::Cancelled)));
        assert!(remote.calls().is_empty());
        assert!(local.calls().is_empty());
    }

    #[tokio::test]
    async fn remote_side_interruption_falls_back_to_local() {
        let (ds, remote, local) = setup(Mode::Interrupt);
        let ctx = Context::background();
        let key = block_key(b"hello");
        local.inner.put(&ctx, &key, b"bye").await.unwrap();

        assert_eq!(ds.get(&ctx, &key).await.unwrap(), b"bye");
        assert_eq!(remote.codecs_queried(), vec![RAW, DAG_PB]);
        assert_eq!(local.calls(), vec![("get", key)]);

        let snap = ds.metrics().snapshot();
        assert_eq!(snap.remote_errors, 2);
        assert_eq!(snap.local_fallbacks, 1);
    }

    #[tokio::test]
    async fn remote_side_interruption_with_cancelled_caller() {
        let (ds, remote, local) = setup(Mode::Interrupt);
        let ctx = Context::background();
        ctx.cancel();

        let err = ds.has(&ctx, &block_key(b"x")).await.unwrap_err();
        assert!(matches!(err, StoreError::Interrupted(Interrupted::Cancelled)));
        assert!(remote.calls().is_empty());
        assert!(local.calls().is_empty());
    }

    #[tokio::test]
    async fn cancel_during_local_read() {
        let remote = StubRemote::new(Mode::Serve);
        let local = StubLocal::hanging();
        let ds = Arc::new(TieredDatastore::new(remote.clone(), local.clone()));
        let ctx = Context::background();
        let key = block_key(b"local only");

        let task = {
            let ds = ds.clone();
            let ctx = ctx.clone();
            let key = key.clone();
            tokio::spawn(async move { ds.get_size(&ctx, &key).await })
        };
        local.entered.notified().await;
        ctx.cancel();

        let err = task.await.unwrap().unwrap_err();
        assert!(matches!(err, StoreError::Interrupted(Interrupted::Cancelled)));
        assert_eq!(remote.codecs_queried(), vec![RAW, DAG_PB]);
        assert_eq!(local.calls(), vec![("get_size", key)]);
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_during_local_read() {
        let remote = StubRemote::new(Mode::Serve);
        let local = StubLocal::hanging();
        let ds = TieredDatastore::new(remote, local.clone());
        let ctx = Context::background().with_timeout(Duration::from_secs(5));

        let err = ds.get(&ctx, &block_key(b"slow disk")).await.unwrap_err();
        assert!(matches!(err, StoreError::Interrupted(Interrupted::DeadlineExceeded)));
        assert_eq!(local.calls().len(), 1);
    }

    // -----------------------------------------------------------------------
    // Writes and concurrency
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn writes_go_to_local_only() {
        let (ds, remote, local) = setup(Mode::Serve);
        let ctx = Context::background();
        let key = block_key(b"written");

        ds.put(&ctx, &key, b"written").await.unwrap();
        assert_eq!(local.inner.get(&ctx, &key).await.unwrap(), b"written");
        ds.delete(&ctx, &key).await.unwrap();
        assert!(!local.inner.has(&ctx, &key).await.unwrap());

        assert!(remote.calls().is_empty());
        assert_eq!(local.calls(), vec![("put", key.clone()), ("delete", key)]);
    }

    #[tokio::test]
    async fn concurrent_reads() {
        let (ds, remote, local) = setup(Mode::Serve);
        let ds = Arc::new(ds);
        let ctx = Context::background();

        let mut handles = Vec::new();
        for i in 0..16u8 {
            let data = vec![i; 8];
            let key = block_key(&data);
            if i % 2 == 0 {
                remote.blocks.insert(cid_for(&key, Codec::RAW), data.clone());
            } else {
                local.inner.put(&ctx, &key, &data).await.unwrap();
            }
            let ds = ds.clone();
            let ctx = ctx.clone();
            handles.push(tokio::spawn(async move {
                assert_eq!(ds.get(&ctx, &key).await.unwrap(), data);
            }));
        }
        for h in handles {
            h.await.unwrap();
        }

        let snap = ds.metrics().snapshot();
        assert_eq!(snap.remote_hits, 8);
        assert_eq!(snap.local_fallbacks, 8);
    }
}
