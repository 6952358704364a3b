//! Configuration types for the quoter

use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{Error, FallbackPolicy, ProtocolVersion, Pubkey};

/// Whirlpool program id on Solana mainnet and devnet
pub const WHIRLPOOL_PROGRAM_ID: &str = "whirLbMiicVdio4qvUfM5KAg6Ct8VwpYzGff3uctyCc";

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Program that owns pools and tick arrays (base58)
    #[serde(default = "default_program_id")]
    pub program_id: String,

    /// API server port
    #[serde(default = "default_api_port")]
    pub api_port: u16,

    /// Revision of the settlement program quotes are predicting
    #[serde(default)]
    pub protocol_version: ProtocolVersion,

    /// Default fallback tick array policy when a request does not set one
    #[serde(default)]
    pub fallback_policy: FallbackPolicy,

    /// Default slippage tolerance in basis points
    #[serde(default = "default_slippage_bps")]
    pub default_slippage_bps: u16,
}

fn default_program_id() -> String {
    WHIRLPOOL_PROGRAM_ID.to_string()
}

fn default_api_port() -> u16 {
    18080
}

fn default_slippage_bps() -> u16 {
    100
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            program_id: default_program_id(),
            api_port: default_api_port(),
            protocol_version: ProtocolVersion::default(),
            fallback_policy: FallbackPolicy::default(),
            default_slippage_bps: default_slippage_bps(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a JSON file. Missing fields take their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read {}: {}", path.display(), e)))?;
        serde_json::from_str(&raw).map_err(|e| Error::Serialization(e.to_string()))
    }

    /// Parsed program id
    pub fn program_id(&self) -> Result<Pubkey, Error> {
        Pubkey::from_str(&self.program_id)
            .map_err(|e| Error::Config(format!("Invalid program id {}: {}", self.program_id, e)))
    }
}
