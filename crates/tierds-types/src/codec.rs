use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Multicodec tag describing how a block's payload is structured.
///
/// The tag is part of a CID's encoding, so one multihash produces a different
/// CID for every codec.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Codec(u64);

impl Codec {
    /// Raw bytes (`0x55`).
    pub const RAW: Self = Self(0x55);
    /// Protobuf-encoded DAG node (`0x70`).
    pub const DAG_PROTOBUF: Self = Self(0x70);
    /// CBOR-encoded DAG node (`0x71`).
    pub const DAG_CBOR: Self = Self(0x71);

    /// Wrap an arbitrary multicodec number.
    pub const fn new(code: u64) -> Self {
        Self(code)
    }

    /// The multicodec number.
    pub const fn code(self) -> u64 {
        self.0
    }

    /// The canonical multicodec name, if this is a known codec.
    pub fn name(self) -> Option<&'static str> {
        match self {
            Self::RAW => Some("raw"),
            Self::DAG_PROTOBUF => Some("dag-pb"),
            Self::DAG_CBOR => Some("dag-cbor"),
            _ => None,
        }
    }

    /// Parse a codec name (`raw`, `dag-pb`, `dag-cbor`) or a hex code (`0x55`).
    pub fn from_name(name: &str) -> Result<Self, TypeError> {
        match name {
            "raw" => Ok(Self::RAW),
            "dag-pb" | "protobuf" => Ok(Self::DAG_PROTOBUF),
            "dag-cbor" | "cbor" => Ok(Self::DAG_CBOR),
            other => other
                .strip_prefix("0x")
                .and_then(|hex| u64::from_str_radix(hex, 16).ok())
                .map(Self)
                .ok_or_else(|| TypeError::UnknownCodec(other.to_string())),
        }
    }
}

impl FromStr for Codec {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s)
    }
}

impl TryFrom<String> for Codec {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::from_name(&s)
    }
}

impl From<Codec> for String {
    fn from(codec: Codec) -> Self {
        codec.to_string()
    }
}

impl fmt::Display for Codec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => f.write_str(name),
            None => write!(f, "0x{:x}", self.0),
        }
    }
}

impl fmt::Debug for Codec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Codec({self})")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_codes() {
        assert_eq!(Codec::RAW.code(), 0x55);
        assert_eq!(Codec::DAG_PROTOBUF.code(), 0x70);
        assert_eq!(Codec::DAG_CBOR.code(), 0x71);
    }

    #[test]
    fn parse_names() {
        assert_eq!("raw".parse::<Codec>().unwrap(), Codec::RAW);
        assert_eq!("dag-pb".parse::<Codec>().unwrap(), Codec::DAG_PROTOBUF);
        assert_eq!("dag-cbor".parse::<Codec>().unwrap(), Codec::DAG_CBOR);
        assert_eq!("0x129".parse::<Codec>().unwrap(), Codec::new(0x129));
    }

    #[test]
    fn parse_unknown_fails() {
        let err = "git-raw".parse::<Codec>().unwrap_err();
        assert_eq!(err, TypeError::UnknownCodec("git-raw".into()));
        assert!("0xzz".parse::<Codec>().is_err());
    }

    #[test]
    fn display_uses_name_or_hex() {
        assert_eq!(Codec::DAG_PROTOBUF.to_string(), "dag-pb");
        assert_eq!(Codec::new(0x129).to_string(), "0x129");
        assert_eq!(format!("{:?}", Codec::RAW), "Codec(raw)");
    }

    #[test]
    fn serde_as_name() {
        let json = serde_json::to_string(&Codec::RAW).unwrap();
        assert_eq!(json, "\"raw\"");
        let parsed: Codec = serde_json::from_str("\"dag-pb\"").unwrap();
        assert_eq!(parsed, Codec::DAG_PROTOBUF);
        assert!(serde_json::from_str::<Codec>("\"nope\"").is_err());
    }
}
