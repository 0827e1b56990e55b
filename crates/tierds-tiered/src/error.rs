use std::fmt;

/// The tier a construction failure belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tier {
    Remote,
    Local,
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tier::Remote => f.write_str("remote"),
            Tier::Local => f.write_str("local"),
        }
    }
}

/// Errors raised while parsing configuration or assembling a tiered store.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A required parameter is absent or has the wrong type.
    #[error("'{field}' field is missing or not {expected}")]
    InvalidField {
        field: &'static str,
        expected: &'static str,
    },

    /// The `codecs` list names an unknown codec, repeats one, or is empty.
    #[error("invalid 'codecs' field: {0}")]
    InvalidCodecs(#[from] tierds_types::TypeError),

    /// The configuration document itself could not be read.
    #[error("config parse error: {0}")]
    Parse(String),

    /// A backing store could not be constructed.
    #[error("{tier} store unavailable: {reason}")]
    StoreUnavailable { tier: Tier, reason: String },
}

impl ConfigError {
    pub(crate) fn unavailable(tier: Tier, reason: impl fmt::Display) -> Self {
        Self::StoreUnavailable {
            tier,
            reason: reason.to_string(),
        }
    }
}

/// Result alias for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;
