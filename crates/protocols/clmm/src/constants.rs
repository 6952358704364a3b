//! CLMM Constants
//!
//! Tick bounds, fixed-point limits, fee denominators and account seeds used by
//! the settlement program whose behavior the quoter predicts.

/// Tick and price bounds
pub mod ticks {
    /// Number of ticks stored in one tick array
    pub const TICK_ARRAY_SIZE: usize = 88;

    /// Lowest tick index a price can map to
    pub const MIN_TICK_INDEX: i32 = -443636;

    /// Highest tick index a price can map to
    pub const MAX_TICK_INDEX: i32 = 443636;

    /// Sqrt price (Q64.64) at `MIN_TICK_INDEX`
    pub const MIN_SQRT_PRICE: u128 = 4295048016;

    /// Sqrt price (Q64.64) at `MAX_TICK_INDEX`
    pub const MAX_SQRT_PRICE: u128 = 79226673515401279992447579055;

    /// Tick arrays swept by the fixed-slot swap instruction
    pub const MAX_SWAP_TICK_ARRAYS: usize = 3;

    /// Reward slots tracked per tick
    pub const NUM_REWARDS: usize = 3;
}

/// Fee constants
pub mod fees {
    /// Fee rates are hundredths of a basis point: 3000 = 0.3%
    pub const FEE_RATE_DENOMINATOR: u32 = 1_000_000;

    /// Highest static fee rate a fee tier may be configured with (6%)
    pub const MAX_FEE_RATE: u32 = 60_000;

    /// Cap applied to static + adaptive fee rate (10%)
    pub const FEE_RATE_HARD_LIMIT: u32 = 100_000;

    /// Protocol fee rates are basis points of the trade fee
    pub const PROTOCOL_FEE_RATE_DENOMINATOR: u32 = 10_000;

    /// Highest protocol fee rate (25% of the trade fee)
    pub const MAX_PROTOCOL_FEE_RATE: u32 = 2_500;

    /// Slippage tolerances are basis points
    pub const BPS_DENOMINATOR: u16 = 10_000;
}

/// Adaptive fee constants
pub mod adaptive_fee {
    /// One tick group of movement adds this much to the volatility accumulator
    pub const VOLATILITY_ACCUMULATOR_SCALE_FACTOR: u32 = 10_000;

    /// A reduction factor of 5_000 halves the carried volatility
    pub const REDUCTION_FACTOR_DENOMINATOR: u32 = 10_000;

    /// A control factor of 1_000 acts as 0.01
    pub const ADAPTIVE_FEE_CONTROL_FACTOR_DENOMINATOR: u32 = 100_000;
}

/// Program-derived address seeds
pub mod seeds {
    pub const TICK_ARRAY: &[u8] = b"tick_array";
    pub const ORACLE: &[u8] = b"oracle";
}
