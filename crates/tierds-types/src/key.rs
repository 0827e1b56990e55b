use std::fmt;

use serde::{Deserialize, Serialize};

/// Hierarchical datastore key.
///
/// Keys are `/`-separated paths. Construction cleans the input: the result
/// always starts with `/`, never ends with one (except the root key `/`), and
/// contains no empty, `.` or `..` segments. The key carries no knowledge of
/// how the value it names is encoded.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct DatastoreKey(String);

impl DatastoreKey {
    /// Build a cleaned key from any path-like string.
    pub fn new(raw: impl AsRef<str>) -> Self {
        let mut segments: Vec<&str> = Vec::new();
        for segment in raw.as_ref().split('/') {
            match segment {
                "" | "." => {}
                ".." => {
                    segments.pop();
                }
                s => segments.push(s),
            }
        }
        Self(format!("/{}", segments.join("/")))
    }

    /// The root key `/`.
    pub fn root() -> Self {
        Self("/".into())
    }

    /// Returns `true` for the root key.
    pub fn is_root(&self) -> bool {
        self.0 == "/"
    }

    /// The full key string, including the leading `/`.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The last path segment (empty for the root key).
    pub fn name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or("")
    }

    /// All path segments in order.
    pub fn namespaces(&self) -> Vec<&str> {
        self.0.split('/').filter(|s| !s.is_empty()).collect()
    }

    /// The key one level up. The parent of the root is the root.
    pub fn parent(&self) -> Self {
        match self.0.rfind('/') {
            Some(0) | None => Self::root(),
            Some(idx) => Self(self.0[..idx].to_string()),
        }
    }

    /// Append a path (cleaned) below this key.
    pub fn child(&self, path: impl AsRef<str>) -> Self {
        Self::new(format!("{}/{}", self.0, path.as_ref()))
    }

    /// Returns `true` if `other` lives strictly below this key.
    pub fn is_ancestor_of(&self, other: &DatastoreKey) -> bool {
        if self.is_root() {
            return !other.is_root();
        }
        other
            .0
            .strip_prefix(&self.0)
            .map(|rest| rest.starts_with('/'))
            .unwrap_or(false)
    }
}

impl fmt::Debug for DatastoreKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DatastoreKey({})", self.0)
    }
}

impl fmt::Display for DatastoreKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for DatastoreKey {
    fn from(raw: String) -> Self {
        Self::new(raw)
    }
}

impl From<&str> for DatastoreKey {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl From<DatastoreKey> for String {
    fn from(key: DatastoreKey) -> Self {
        key.0
    }
}

impl AsRef<str> for DatastoreKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
