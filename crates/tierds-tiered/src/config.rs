//! Construction of a tiered datastore from plugin-style parameters.
//!
//! Parameters arrive as a JSON object (or a TOML document with the same
//! fields):
//!
//! ```toml
//! path = "blocks"
//! shardFunc = "/repo/flatfs/shard/v1/next-to-last/2"
//! sync = true
//! endpoint = "http://127.0.0.1:5080"
//! codecs = ["raw", "dag-pb"]   # optional
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tierds_remote::HttpBlockStore;
use tierds_store::{FlatfsDatastore, ShardFunction};
use tierds_types::CodecCandidates;
use tracing::info;

use crate::error::{ConfigError, ConfigResult, Tier};
use crate::resolver::TieredDatastore;

/// Datastore type reported in the disk spec.
pub const DATASTORE_TYPE: &str = "flatfs";

/// The tiered store produced by [`DatastoreConfig::create`].
pub type HttpTieredDatastore = TieredDatastore<HttpBlockStore, FlatfsDatastore>;

/// Validated datastore parameters with a ready remote client.
#[derive(Clone, Debug)]
pub struct DatastoreConfig {
    path: PathBuf,
    shard: ShardFunction,
    sync: bool,
    endpoint: String,
    candidates: CodecCandidates,
    remote: HttpBlockStore,
}

impl DatastoreConfig {
    /// Validate a parameter map and build the remote client.
    pub fn from_params(params: &Map<String, Value>) -> ConfigResult<Self> {
        let path = required_str(params, "path")?;
        let shard_func = required_str(params, "shardFunc")?;
        let sync = params
            .get("sync")
            .and_then(Value::as_bool)
            .ok_or(ConfigError::InvalidField {
                field: "sync",
                expected: "boolean",
            })?;
        let endpoint = required_str(params, "endpoint")?;
        let candidates = match params.get("codecs") {
            None | Some(Value::Null) => CodecCandidates::default(),
            Some(Value::Array(items)) => {
                let names = items
                    .iter()
                    .map(|v| {
                        v.as_str().ok_or(ConfigError::InvalidField {
                            field: "codecs",
                            expected: "a list of strings",
                        })
                    })
                    .collect::<ConfigResult<Vec<_>>>()?;
                CodecCandidates::from_names(names)?
            }
            Some(_) => {
                return Err(ConfigError::InvalidField {
                    field: "codecs",
                    expected: "a list of strings",
                })
            }
        };

        let shard = ShardFunction::parse(shard_func)
            .map_err(|e| ConfigError::unavailable(Tier::Local, e))?;
        let remote =
            HttpBlockStore::new(endpoint).map_err(|e| ConfigError::unavailable(Tier::Remote, e))?;

        Ok(Self {
            path: PathBuf::from(path),
            shard,
            sync,
            endpoint: endpoint.to_string(),
            candidates,
            remote,
        })
    }

    /// Parse a TOML document with the same fields as [`from_params`](Self::from_params).
    pub fn from_toml(text: &str) -> ConfigResult<Self> {
        let doc: toml::Table = toml::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        match serde_json::to_value(doc).map_err(|e| ConfigError::Parse(e.to_string()))? {
            Value::Object(params) => Self::from_params(&params),
            _ => Err(ConfigError::Parse("expected a table".into())),
        }
    }

    /// Read and parse a TOML config file.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Parse(format!("{}: {e}", path.display())))?;
        Self::from_toml(&text)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn shard(&self) -> ShardFunction {
        self.shard
    }

    pub fn sync(&self) -> bool {
        self.sync
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn candidates(&self) -> &CodecCandidates {
        &self.candidates
    }

    /// Identity of the on-disk layout, used to detect config changes that
    /// would need a migration.
    pub fn disk_spec(&self) -> DiskSpec {
        DiskSpec {
            kind: DATASTORE_TYPE.to_string(),
            path: self.path.to_string_lossy().into_owned(),
            shard_func: self.shard.to_string(),
        }
    }

    /// Open (or initialise) the local store and assemble the tiered store.
    ///
    /// A relative `path` is resolved against `root`.
    pub fn create(&self, root: &Path) -> ConfigResult<HttpTieredDatastore> {
        let path = if self.path.is_absolute() {
            self.path.clone()
        } else {
            root.join(&self.path)
        };
        let local = FlatfsDatastore::create_or_open(&path, self.shard, self.sync)
            .map_err(|e| ConfigError::unavailable(Tier::Local, e))?;
        info!(
            path = %path.display(),
            endpoint = %self.remote.endpoint(),
            codecs = ?self.candidates.codecs(),
            "tiered datastore ready"
        );
        Ok(TieredDatastore::with_candidates(
            self.remote.clone(),
            local,
            self.candidates.clone(),
        ))
    }
}

fn required_str<'a>(params: &'a Map<String, Value>, field: &'static str) -> ConfigResult<&'a str> {
    params
        .get(field)
        .and_then(Value::as_str)
        .ok_or(ConfigError::InvalidField {
            field,
            expected: "a string",
        })
}

/// On-disk identity of a datastore.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiskSpec {
    #[serde(rename = "type")]
    pub kind: String,
    pub path: String,
    #[serde(rename = "shardFunc")]
    pub shard_func: String,
}
