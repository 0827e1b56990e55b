use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tierds_types::{Context, DatastoreKey};
use tracing::{debug, info};

use crate::error::{StoreError, StoreResult};
use crate::shard::ShardFunction;
use crate::traits::Datastore;

/// Name of the file recording the shard function of a store.
pub const SHARDING_FILE: &str = "SHARDING";
/// Name of the human-readable description written next to `SHARDING`.
pub const README_FILE: &str = "_README";
/// Extension of value files.
pub const DATA_EXTENSION: &str = "data";

const README: &str = "This is a repository of flat-file blocks.\n\
Each value lives in <shard>/<key>.data, where <shard> is chosen by the\n\
shard function recorded in the SHARDING file.\n";

/// Sharded, one-file-per-value datastore.
///
/// On-disk layout:
/// ```text
/// <root>/SHARDING          shard function identifier
/// <root>/_README
/// <root>/<shard>/<name>.data
/// ```
///
/// Only single-segment keys made of `[0-9A-Z+-_=]` can be stored. Reads of any
/// other key report [`StoreError::NotFound`]; writes reject them with
/// [`StoreError::InvalidKey`].
///
/// Writes go to a temporary file in the shard directory which is then renamed
/// over the target. With `sync` enabled the file and its directory are
/// flushed to disk before `put` returns.
#[derive(Debug)]
pub struct FlatfsDatastore {
    root: PathBuf,
    shard: ShardFunction,
    sync: bool,
}

impl FlatfsDatastore {
    /// Initialise a store directory for `shard`.
    ///
    /// Succeeds if the directory already holds a store with the same shard
    /// function; fails with [`StoreError::ShardMismatch`] if it holds another.
    pub fn create(root: &Path, shard: ShardFunction) -> StoreResult<()> {
        fs::create_dir_all(root)?;
        match read_shard_function(root) {
            Ok(existing) if existing == shard => Ok(()),
            Ok(existing) => Err(StoreError::ShardMismatch {
                path: root.to_path_buf(),
                expected: shard.to_string(),
                found: existing.to_string(),
            }),
            Err(StoreError::NotInitialized(_)) => {
                fs::write(root.join(SHARDING_FILE), format!("{shard}\n"))?;
                fs::write(root.join(README_FILE), README)?;
                info!(path = %root.display(), shard = %shard, "created flatfs datastore");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// Open an initialised store directory.
    pub fn open(root: &Path, sync: bool) -> StoreResult<Self> {
        let shard = read_shard_function(root)?;
        debug!(path = %root.display(), shard = %shard, sync, "opened flatfs datastore");
        Ok(Self {
            root: root.to_path_buf(),
            shard,
            sync,
        })
    }

    /// [`create`](Self::create) then [`open`](Self::open).
    pub fn create_or_open(root: &Path, shard: ShardFunction, sync: bool) -> StoreResult<Self> {
        Self::create(root, shard)?;
        Self::open(root, sync)
    }

    /// Root directory of the store.
    pub fn path(&self) -> &Path {
        &self.root
    }

    /// The store's shard function.
    pub fn shard(&self) -> ShardFunction {
        self.shard
    }

    /// Whether writes are flushed to disk before returning.
    pub fn sync(&self) -> bool {
        self.sync
    }

    /// Shard directory and value file for `key`, or `None` for unstorable keys.
    fn locate(&self, key: &DatastoreKey) -> Option<(PathBuf, PathBuf)> {
        if !key_is_valid(key) {
            return None;
        }
        let name = &key.as_str()[1..];
        let dir = self.root.join(self.shard.dir(name));
        let file = dir.join(format!("{name}.{DATA_EXTENSION}"));
        Some((dir, file))
    }
}

/// Returns `true` if `key` can be stored in a flatfs datastore.
pub fn key_is_valid(key: &DatastoreKey) -> bool {
    let name = &key.as_str()[1..];
    !name.is_empty()
        && name
            .bytes()
            .all(|b| b.is_ascii_digit() || b.is_ascii_uppercase() || matches!(b, b'+' | b'-' | b'_' | b'='))
}

/// Read the shard function recorded in a store directory.
pub fn read_shard_function(root: &Path) -> StoreResult<ShardFunction> {
    match fs::read_to_string(root.join(SHARDING_FILE)) {
        Ok(id) => ShardFunction::parse(&id),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            Err(StoreError::NotInitialized(root.to_path_buf()))
        }
        Err(e) => Err(e.into()),
    }
}

fn write_atomic(dir: &Path, file: &Path, value: &[u8], sync: bool) -> io::Result<()> {
    fs::create_dir_all(dir)?;
    let mut tmp = tempfile::Builder::new().prefix(".put-").tempfile_in(dir)?;
    tmp.write_all(value)?;
    if sync {
        tmp.as_file().sync_all()?;
    }
    tmp.persist(file).map_err(|e| e.error)?;
    if sync {
        sync_dir(dir)?;
    }
    Ok(())
}

#[cfg(unix)]
fn sync_dir(dir: &Path) -> io::Result<()> {
    fs::File::open(dir)?.sync_all()
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) -> io::Result<()> {
    Ok(())
}

fn not_found(key: &DatastoreKey, e: io::Error) -> StoreError {
    if e.kind() == io::ErrorKind::NotFound {
        StoreError::NotFound(key.clone())
    } else {
        StoreError::Io(e)
    }
}

#[async_trait]
impl Datastore for FlatfsDatastore {
    async fn get(&self, ctx: &Context, key: &DatastoreKey) -> StoreResult<Vec<u8>> {
        let Some((_, file)) = self.locate(key) else {
            return Err(StoreError::NotFound(key.clone()));
        };
        ctx.run(tokio::fs::read(&file))
            .await?
            .map_err(|e| not_found(key, e))
    }

    async fn has(&self, ctx: &Context, key: &DatastoreKey) -> StoreResult<bool> {
        let Some((_, file)) = self.locate(key) else {
            return Ok(false);
        };
        match ctx.run(tokio::fs::metadata(&file)).await? {
            Ok(_) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn get_size(&self, ctx: &Context, key: &DatastoreKey) -> StoreResult<u64> {
        let Some((_, file)) = self.locate(key) else {
            return Err(StoreError::NotFound(key.clone()));
        };
        ctx.run(tokio::fs::metadata(&file))
            .await?
            .map(|meta| meta.len())
            .map_err(|e| not_found(key, e))
    }

    async fn put(&self, ctx: &Context, key: &DatastoreKey, value: &[u8]) -> StoreResult<()> {
        let Some((dir, file)) = self.locate(key) else {
            return Err(StoreError::InvalidKey(key.clone()));
        };
        let value = value.to_vec();
        let sync = self.sync;
        let task = tokio::task::spawn_blocking(move || write_atomic(&dir, &file, &value, sync));
        ctx.run(task)
            .await?
            .map_err(io::Error::other)??;
        debug!(key = %key, "flatfs put");
        Ok(())
    }

    async fn delete(&self, ctx: &Context, key: &DatastoreKey) -> StoreResult<()> {
        let Some((_, file)) = self.locate(key) else {
            return Ok(());
        };
        match ctx.run(tokio::fs::remove_file(&file)).await? {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
