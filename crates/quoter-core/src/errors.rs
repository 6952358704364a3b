//! Error types for the quoter

use thiserror::Error;

/// Top-level errors surfaced by the quoter workspace
#[derive(Debug, Error)]
pub enum Error {
    #[error("Quote error: {0}")]
    Quote(#[from] QuoteError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Errors raised while converting prices, addressing tick arrays, predicting
/// adaptive fees or simulating a swap.
///
/// Every variant rejects the quote as a whole. None of them leave partial
/// state behind, since all computations run over immutable snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuoteError {
    #[error("Supplied tick arrays do not cover tick index {tick_index}")]
    TickArrayOutOfRange { tick_index: i32 },

    #[error("Trading is not enabled until {trade_enable_timestamp} (now {timestamp})")]
    TradeNotEnabled {
        trade_enable_timestamp: u64,
        timestamp: u64,
    },

    #[error("Fee rate {fee_rate} exceeds maximum {max}")]
    FeeRateMaxExceeded { fee_rate: u32, max: u32 },

    #[error("Protocol fee rate {protocol_fee_rate} exceeds maximum {max}")]
    ProtocolFeeRateMaxExceeded { protocol_fee_rate: u32, max: u32 },

    #[error("Arithmetic overflow")]
    Overflow,

    #[error("Division by zero")]
    DivisionByZero,

    #[error("Slippage exceeded: got {got}, threshold {threshold}")]
    SlippageExceeded { got: u64, threshold: u64 },

    #[error("Swap amount must be greater than zero")]
    ZeroTradableAmount,

    #[error("Sqrt price {sqrt_price} is out of bounds")]
    SqrtPriceOutOfBounds { sqrt_price: u128 },

    #[error("Tick index {tick_index} is out of bounds")]
    TickIndexOutOfBounds { tick_index: i32 },

    #[error("Sqrt price limit is on the wrong side of the current price")]
    InvalidSqrtPriceLimitDirection,

    #[error("Invalid tick spacing: {tick_spacing}")]
    InvalidTickSpacing { tick_spacing: u16 },

    #[error("Invalid tick array sequence: {reason}")]
    InvalidTickArraySequence { reason: String },

    #[error("Timestamp {timestamp} is earlier than last oracle update {last_update}")]
    InvalidTimestamp { timestamp: u64, last_update: u64 },

    #[error("Invalid adaptive fee constants: {reason}")]
    InvalidAdaptiveFeeConstants { reason: String },

    #[error("Invalid slippage tolerance: {bps} bps")]
    InvalidSlippageTolerance { bps: u16 },

    #[error("Swap cannot be completely filled without an explicit price limit")]
    PartialFill,

    #[error("Intermediate token mismatch: hop one {hop_one_output}, hop two {hop_two_input}")]
    IntermediateTokenMismatch {
        hop_one_output: String,
        hop_two_input: String,
    },

    #[error("Intermediate amount mismatch: hop one {hop_one_output}, hop two {hop_two_input}")]
    IntermediateAmountMismatch {
        hop_one_output: u64,
        hop_two_input: u64,
    },

    #[error("Hops disagree on exact input vs exact output")]
    SwapModeMismatch,
}

/// Result type alias for quoter operations
pub type Result<T> = std::result::Result<T, Error>;

impl QuoteError {
    /// Get a stable symbolic error code
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::TickArrayOutOfRange { .. } => "tick_array_out_of_range",
            Self::TradeNotEnabled { .. } => "trade_not_enabled",
            Self::FeeRateMaxExceeded { .. } => "fee_rate_max_exceeded",
            Self::ProtocolFeeRateMaxExceeded { .. } => "protocol_fee_rate_max_exceeded",
            Self::Overflow => "overflow",
            Self::DivisionByZero => "division_by_zero",
            Self::SlippageExceeded { .. } => "slippage_exceeded",
            Self::ZeroTradableAmount => "zero_tradable_amount",
            Self::SqrtPriceOutOfBounds { .. } => "sqrt_price_out_of_bounds",
            Self::TickIndexOutOfBounds { .. } => "tick_index_out_of_bounds",
            Self::InvalidSqrtPriceLimitDirection => "invalid_sqrt_price_limit_direction",
            Self::InvalidTickSpacing { .. } => "invalid_tick_spacing",
            Self::InvalidTickArraySequence { .. } => "invalid_tick_array_sequence",
            Self::InvalidTimestamp { .. } => "invalid_timestamp",
            Self::InvalidAdaptiveFeeConstants { .. } => "invalid_adaptive_fee_constants",
            Self::InvalidSlippageTolerance { .. } => "invalid_slippage_tolerance",
            Self::PartialFill => "partial_fill",
            Self::IntermediateTokenMismatch { .. } => "intermediate_token_mismatch",
            Self::IntermediateAmountMismatch { .. } => "intermediate_amount_mismatch",
            Self::SwapModeMismatch => "swap_mode_mismatch",
        }
    }

    /// Get HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            Self::TradeNotEnabled { .. } => 403,
            Self::TickArrayOutOfRange { .. }
            | Self::SlippageExceeded { .. }
            | Self::PartialFill
            | Self::Overflow => 422,
            _ => 400,
        }
    }
}
