use std::fmt;
use std::str::FromStr;

use crate::error::{StoreError, StoreResult};

/// Prefix of every versioned shard function identifier.
pub const SHARD_PREFIX: &str = "/repo/flatfs/shard/";

/// Strategy mapping a key name to the directory that holds it.
///
/// Identifiers look like `/repo/flatfs/shard/v1/next-to-last/2`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ShardFunction {
    /// First `n` characters, right-padded with `_`.
    Prefix(usize),
    /// Last `n` characters, left-padded with `_`.
    Suffix(usize),
    /// The `n` characters before the last one, left-padded with `_`.
    NextToLast(usize),
}

impl ShardFunction {
    /// Parse an identifier with or without the `/repo/flatfs/shard/` prefix.
    pub fn parse(id: &str) -> StoreResult<Self> {
        let id = id.trim();
        let invalid = |reason: &str| StoreError::InvalidShardFunction(format!("{id:?}: {reason}"));
        if id.is_empty() {
            return Err(invalid("empty identifier"));
        }
        let rest = id.strip_prefix(SHARD_PREFIX).unwrap_or(id);
        let parts: Vec<&str> = rest.split('/').collect();
        let [version, name, param] = parts.as_slice() else {
            return Err(invalid("expected <version>/<name>/<length>"));
        };
        if *version != "v1" {
            return Err(invalid("unsupported version"));
        }
        let len: usize = param
            .parse()
            .map_err(|_| invalid("length is not a number"))?;
        if len == 0 {
            return Err(invalid("length must be positive"));
        }
        match *name {
            "prefix" => Ok(Self::Prefix(len)),
            "suffix" => Ok(Self::Suffix(len)),
            "next-to-last" => Ok(Self::NextToLast(len)),
            _ => Err(invalid("unknown function")),
        }
    }

    /// The function's name within the identifier.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Prefix(_) => "prefix",
            Self::Suffix(_) => "suffix",
            Self::NextToLast(_) => "next-to-last",
        }
    }

    /// Number of characters in the directory name.
    pub fn width(&self) -> usize {
        match self {
            Self::Prefix(n) | Self::Suffix(n) | Self::NextToLast(n) => *n,
        }
    }

    /// Directory name for a key name (the key without its leading `/`).
    pub fn dir(&self, name: &str) -> String {
        match *self {
            Self::Prefix(n) => name
                .chars()
                .chain(std::iter::repeat('_'))
                .take(n)
                .collect(),
            Self::Suffix(n) => {
                let padded: Vec<char> = std::iter::repeat('_').take(n).chain(name.chars()).collect();
                padded[padded.len() - n..].iter().collect()
            }
            Self::NextToLast(n) => {
                let padded: Vec<char> = std::iter::repeat('_')
                    .take(n + 1)
                    .chain(name.chars())
                    .collect();
                let start = padded.len() - n - 1;
                padded[start..start + n].iter().collect()
            }
        }
    }
}

impl Default for ShardFunction {
    fn default() -> Self {
        Self::NextToLast(2)
    }
}

impl fmt::Display for ShardFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{SHARD_PREFIX}v1/{}/{}", self.name(), self.width())
    }
}

impl FromStr for ShardFunction {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
