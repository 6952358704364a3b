//! Core type definitions for the quoter

use serde::{Deserialize, Serialize};
use std::fmt;

pub use solana_program::pubkey::Pubkey;

/// Settlement program revision a quote is predicting.
///
/// The adaptive-fee oracle tracks its last "major swap" differently across
/// program revisions. The caller resolves the revision from the fee tier and
/// passes it in; the core never guesses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProtocolVersion {
    /// Every reference update also stamps the major-swap timestamp.
    V1,
    /// The major-swap timestamp moves only when a swap crosses the threshold.
    #[default]
    V2,
}

impl ProtocolVersion {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::V1 => "v1",
            Self::V2 => "v2",
        }
    }
}

impl fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Whether an extra tick array adjacent to the swap window is included.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FallbackPolicy {
    Never,
    Always,
    /// Only when the current price sits in the edge tick group of its array.
    #[default]
    Situational,
}

impl FallbackPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Never => "never",
            Self::Always => "always",
            Self::Situational => "situational",
        }
    }
}

impl fmt::Display for FallbackPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Serde adapter writing a [`Pubkey`] as its base58 string.
pub mod pubkey_string {
    use super::Pubkey;
    use serde::{de::Error, Deserialize, Deserializer, Serializer};
    use std::str::FromStr;

    pub fn serialize<S: Serializer>(key: &Pubkey, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(key)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Pubkey, D::Error> {
        let s = String::deserialize(deserializer)?;
        Pubkey::from_str(&s).map_err(|e| D::Error::custom(format!("invalid pubkey {}: {}", s, e)))
    }
}

/// Serde adapter for `Option<Pubkey>` as an optional base58 string.
pub mod option_pubkey_string {
    use super::Pubkey;
    use serde::{de::Error, Deserialize, Deserializer, Serializer};
    use std::str::FromStr;

    pub fn serialize<S: Serializer>(
        key: &Option<Pubkey>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match key {
            Some(key) => serializer.collect_str(key),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Pubkey>, D::Error> {
        Option::<String>::deserialize(deserializer)?
            .map(|s| {
                Pubkey::from_str(&s)
                    .map_err(|e| D::Error::custom(format!("invalid pubkey {}: {}", s, e)))
            })
            .transpose()
    }
}

/// Serde adapter for `Vec<Pubkey>` as a list of base58 strings.
pub mod pubkey_string_vec {
    use super::Pubkey;
    use serde::{de::Error, ser::SerializeSeq, Deserialize, Deserializer, Serializer};
    use std::str::FromStr;

    pub fn serialize<S: Serializer>(keys: &[Pubkey], serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(keys.len()))?;
        for key in keys {
            seq.serialize_element(&key.to_string())?;
        }
        seq.end()
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Vec<Pubkey>, D::Error> {
        Vec::<String>::deserialize(deserializer)?
            .into_iter()
            .map(|s| {
                Pubkey::from_str(&s)
                    .map_err(|e| D::Error::custom(format!("invalid pubkey {}: {}", s, e)))
            })
            .collect()
    }
}
