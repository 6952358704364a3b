//! Data Transfer Objects for API requests and responses

use std::str::FromStr;

use axum::{http::StatusCode, Json};
use serde::{Deserialize, Serialize};

use clmm::{
    OracleState, PairPaths, Path, PoolState, PoolTokenPair, SwapAccountList, SwapQuote,
    SwapTickArrays, TickArray, TwoHopSwapQuote,
};
use quoter_core::types::{option_pubkey_string, pubkey_string};
use quoter_core::{FallbackPolicy, ProtocolVersion, Pubkey, QuoteError};

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Generic API error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new("bad_request", message)
    }
}

/// Handler error pair
pub type ApiFailure = (StatusCode, Json<ApiError>);

/// Map a quote failure to its status and symbolic code
pub fn quote_error(err: QuoteError) -> ApiFailure {
    let status =
        StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::UNPROCESSABLE_ENTITY);
    (status, Json(ApiError::new(err.error_code(), err.to_string())))
}

pub fn bad_request(message: impl Into<String>) -> ApiFailure {
    (StatusCode::BAD_REQUEST, Json(ApiError::bad_request(message)))
}

/// Parse a base58 mint or account address from a request field
pub fn parse_pubkey(field: &str, value: &str) -> Result<Pubkey, ApiFailure> {
    Pubkey::from_str(value).map_err(|e| bad_request(format!("Invalid {} {}: {}", field, value, e)))
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Update request; omitted fields keep their current values
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigRequest {
    pub program_id: Option<String>,
    pub protocol_version: Option<ProtocolVersion>,
    pub fallback_policy: Option<FallbackPolicy>,
    pub default_slippage_bps: Option<u16>,
}

// ---------------------------------------------------------------------------
// CLMM
// ---------------------------------------------------------------------------

/// Single-pool quote request over caller-supplied snapshots
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuoteRequest {
    pub pool: PoolState,
    pub tick_arrays: Vec<TickArray>,
    #[serde(default)]
    pub oracle: Option<OracleState>,
    pub amount: u64,
    pub a_to_b: bool,
    pub amount_specified_is_input: bool,
    /// 0 for no explicit limit
    #[serde(default)]
    pub sqrt_price_limit: u128,
    /// Falls back to the configured default
    pub slippage_tolerance_bps: Option<u16>,
    /// Unix seconds; defaults to now
    pub timestamp: Option<u64>,
    pub protocol_version: Option<ProtocolVersion>,
    pub fallback_policy: Option<FallbackPolicy>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuoteResponse {
    pub quote: SwapQuote,
    pub accounts: SwapAccountList,
}

/// One pool of a routed swap
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HopRequest {
    pub pool: PoolState,
    pub tick_arrays: Vec<TickArray>,
    #[serde(default)]
    pub oracle: Option<OracleState>,
    pub a_to_b: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TwoHopQuoteRequest {
    pub hop_one: HopRequest,
    pub hop_two: HopRequest,
    pub amount: u64,
    pub amount_specified_is_input: bool,
    pub slippage_tolerance_bps: Option<u16>,
    pub timestamp: Option<u64>,
    pub protocol_version: Option<ProtocolVersion>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TwoHopQuoteResponse {
    pub quote: TwoHopSwapQuote,
}

/// Tick arrays a swap would need, without simulating it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TickArraysRequest {
    #[serde(with = "pubkey_string")]
    pub pool: Pubkey,
    pub tick_current_index: i32,
    pub tick_spacing: u16,
    pub a_to_b: bool,
    pub fallback_policy: Option<FallbackPolicy>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TickArraysResponse {
    pub tick_arrays: SwapTickArrays,
    pub accounts: SwapAccountList,
    #[serde(default, with = "option_pubkey_string")]
    pub oracle: Option<Pubkey>,
}

// ---------------------------------------------------------------------------
// Routing
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsRequest {
    pub pools: Vec<PoolTokenPair>,
    pub start_token_mint: String,
    pub end_token_mint: String,
    pub intermediate_tokens: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsResponse {
    pub paths: Vec<Path>,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPairDto {
    pub start_token_mint: String,
    pub end_token_mint: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PairsRequest {
    pub pools: Vec<PoolTokenPair>,
    pub pairs: Vec<TokenPairDto>,
    pub intermediate_tokens: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllPathsRequest {
    pub pools: Vec<PoolTokenPair>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PairPathsResponse {
    pub results: Vec<PairPaths>,
    pub pool_count: usize,
}
