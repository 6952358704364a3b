//! CLMM State Types
//!
//! Read-only snapshots of pool, tick-array and oracle accounts, plus the
//! request and result records of a swap quote.

use serde::{Deserialize, Serialize};
use std::fmt;

use quoter_core::types::{option_pubkey_string, pubkey_string, pubkey_string_vec};
use quoter_core::{ProtocolVersion, Pubkey};

use crate::constants::ticks::{NUM_REWARDS, TICK_ARRAY_SIZE};

/// A single tick: a point on the price curve where liquidity may start or end
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tick {
    pub initialized: bool,
    /// Liquidity added when crossing left to right
    pub liquidity_net: i128,
    pub liquidity_gross: u128,
    /// Q64.64
    #[serde(default)]
    pub fee_growth_outside_a: u128,
    /// Q64.64
    #[serde(default)]
    pub fee_growth_outside_b: u128,
    #[serde(default)]
    pub reward_growths_outside: [u128; NUM_REWARDS],
}

/// Fixed-size batch of ticks starting at an aligned tick index
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickArray {
    /// Pool the array belongs to
    #[serde(with = "pubkey_string")]
    pub pool: Pubkey,
    /// Aligned to `tick_spacing * TICK_ARRAY_SIZE`
    pub start_tick_index: i32,
    #[serde(with = "tick_slots")]
    pub ticks: [Tick; TICK_ARRAY_SIZE],
}

impl TickArray {
    /// Stand-in for an array that does not exist on chain: every tick
    /// uninitialized, so a swap can still step through its range.
    pub fn uninitialized(pool: Pubkey, start_tick_index: i32) -> Self {
        Self {
            pool,
            start_tick_index,
            ticks: [Tick::default(); TICK_ARRAY_SIZE],
        }
    }

    /// Number of initialized ticks in the array
    pub fn initialized_count(&self) -> usize {
        self.ticks.iter().filter(|t| t.initialized).count()
    }
}

/// Serde adapter for the fixed tick slots: a JSON sequence checked for length.
mod tick_slots {
    use super::{Tick, TICK_ARRAY_SIZE};
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        ticks: &[Tick; TICK_ARRAY_SIZE],
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(ticks.iter())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<[Tick; TICK_ARRAY_SIZE], D::Error> {
        let ticks = Vec::<Tick>::deserialize(deserializer)?;
        let len = ticks.len();
        ticks.try_into().map_err(|_| {
            D::Error::custom(format!(
                "expected {} ticks, found {}",
                TICK_ARRAY_SIZE, len
            ))
        })
    }
}

/// Pool account snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolState {
    #[serde(with = "pubkey_string")]
    pub address: Pubkey,
    #[serde(with = "pubkey_string")]
    pub token_mint_a: Pubkey,
    #[serde(with = "pubkey_string")]
    pub token_mint_b: Pubkey,
    /// Q64.64
    pub sqrt_price: u128,
    pub tick_current_index: i32,
    pub liquidity: u128,
    pub tick_spacing: u16,
    /// Hundredths of a basis point
    pub fee_rate: u32,
    /// Basis points of the trade fee
    pub protocol_fee_rate: u32,
    #[serde(default)]
    pub fee_growth_global_a: u128,
    #[serde(default)]
    pub fee_growth_global_b: u128,
}

impl fmt::Display for PoolState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Pool {} | tick {} | spacing {} | liquidity {}",
            self.address, self.tick_current_index, self.tick_spacing, self.liquidity
        )
    }
}

/// Adaptive fee parameters fixed per fee tier
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdaptiveFeeConstants {
    /// Seconds within which the reference is left untouched
    pub filter_period: u16,
    /// Seconds after which the reference volatility resets to zero
    pub decay_period: u16,
    /// Share of the accumulator carried into the reference, over 10_000
    pub reduction_factor: u16,
    /// Over 100_000
    pub adaptive_fee_control_factor: u32,
    pub max_volatility_accumulator: u32,
    pub tick_group_size: u16,
    pub major_swap_threshold_ticks: u16,
}

/// Oracle volatility state; all zero until the first swap
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdaptiveFeeVariables {
    pub last_reference_update_timestamp: u64,
    pub last_major_swap_timestamp: u64,
    pub volatility_reference: u32,
    pub tick_group_index_reference: i32,
    pub volatility_accumulator: u32,
}

/// Adaptive fee oracle snapshot
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OracleState {
    /// Swaps before this unix timestamp are rejected; zero disables the gate
    #[serde(default)]
    pub trade_enable_timestamp: u64,
    pub constants: AdaptiveFeeConstants,
    #[serde(default)]
    pub variables: AdaptiveFeeVariables,
}

/// Swap quote request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapQuoteParams {
    /// Exact input when `amount_specified_is_input`, exact output otherwise
    pub amount: u64,
    pub a_to_b: bool,
    pub amount_specified_is_input: bool,
    /// Q64.64; zero means no limit beyond the global price bounds
    #[serde(default)]
    pub sqrt_price_limit: u128,
    #[serde(default)]
    pub slippage_tolerance_bps: u16,
    /// Unix timestamp the swap is expected to land at
    #[serde(default)]
    pub timestamp: u64,
    #[serde(default)]
    pub protocol_version: ProtocolVersion,
    #[serde(with = "pubkey_string")]
    pub program_id: Pubkey,
}

/// Swap quote with calculated values
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapQuote {
    #[serde(with = "pubkey_string")]
    pub pool: Pubkey,
    #[serde(with = "pubkey_string")]
    pub input_mint: Pubkey,
    #[serde(with = "pubkey_string")]
    pub output_mint: Pubkey,
    pub a_to_b: bool,
    pub amount_specified_is_input: bool,
    /// Requested amount
    pub amount: u64,
    /// Minimum output for exact input, maximum input for exact output
    pub other_amount_threshold: u64,
    /// Price limit the quote was computed against, resolved from zero
    pub sqrt_price_limit: u128,
    pub estimated_amount_in: u64,
    pub estimated_amount_out: u64,
    /// Included in `estimated_amount_in`
    pub estimated_fee_amount: u64,
    /// Part of the fee kept by the protocol
    pub estimated_protocol_fee: u64,
    /// Total fee rate applied, static plus adaptive
    pub fee_rate: u32,
    pub estimated_end_sqrt_price: u128,
    pub estimated_end_tick_index: i32,
    /// Tick arrays touched, in traversal order
    #[serde(with = "pubkey_string_vec")]
    pub tick_arrays: Vec<Pubkey>,
    pub tick_array_start_indexes: Vec<i32>,
    #[serde(with = "option_pubkey_string", default)]
    pub oracle_address: Option<Pubkey>,
    /// Predicted oracle state after the swap lands
    #[serde(default)]
    pub next_adaptive_fee: Option<AdaptiveFeeVariables>,
}

impl SwapQuote {
    /// The amount not fixed by the request: output for exact input, input
    /// for exact output.
    pub fn other_amount(&self) -> u64 {
        if self.amount_specified_is_input {
            self.estimated_amount_out
        } else {
            self.estimated_amount_in
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uninitialized_tick_array() {
        let pool = Pubkey::new_unique();
        let array = TickArray::uninitialized(pool, -5632);
        assert_eq!(array.start_tick_index, -5632);
        assert_eq!(array.initialized_count(), 0);
        assert_eq!(array.ticks.len(), TICK_ARRAY_SIZE);
    }

    #[test]
    fn test_tick_array_serde_round_trip() {
        let mut array = TickArray::uninitialized(Pubkey::new_unique(), 0);
        array.ticks[3] = Tick {
            initialized: true,
            liquidity_net: -1_000,
            liquidity_gross: 1_000,
            ..Tick::default()
        };
        let json = serde_json::to_string(&array).unwrap();
        let parsed: TickArray = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, array);
        assert_eq!(parsed.initialized_count(), 1);
    }

    #[test]
    fn test_tick_array_wrong_length_rejected() {
        let json = format!(
            r#"{{"pool":"{}","start_tick_index":0,"ticks":[]}}"#,
            Pubkey::new_unique()
        );
        let err = serde_json::from_str::<TickArray>(&json).unwrap_err();
        assert!(err.to_string().contains("expected 88 ticks"));
    }

    #[test]
    fn test_large_sqrt_price_survives_json() {
        let pool = PoolState {
            address: Pubkey::new_unique(),
            token_mint_a: Pubkey::new_unique(),
            token_mint_b: Pubkey::new_unique(),
            sqrt_price: 79226673515401279992447579055,
            tick_current_index: 443636,
            liquidity: u128::MAX,
            tick_spacing: 64,
            fee_rate: 3000,
            protocol_fee_rate: 300,
            fee_growth_global_a: 0,
            fee_growth_global_b: 0,
        };
        let json = serde_json::to_string(&pool).unwrap();
        let parsed: PoolState = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, pool);
    }

    #[test]
    fn test_oracle_defaults_to_zeroed_variables() {
        let json = r#"{"constants":{"filter_period":30,"decay_period":600,"reduction_factor":500,
            "adaptive_fee_control_factor":4000,"max_volatility_accumulator":350000,
            "tick_group_size":64,"major_swap_threshold_ticks":64}}"#;
        let oracle: OracleState = serde_json::from_str(json).unwrap();
        assert_eq!(oracle.variables, AdaptiveFeeVariables::default());
        assert_eq!(oracle.trade_enable_timestamp, 0);
        assert_eq!(oracle.constants.tick_group_size, 64);
    }
}
