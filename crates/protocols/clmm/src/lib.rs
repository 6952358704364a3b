//! Concentrated-Liquidity Pool Quoting
//!
//! Off-chain prediction of a concentrated-liquidity swap: fixed-point tick
//! and price math, tick array addressing, the adaptive fee oracle, the swap
//! simulation itself and a pool graph for two-hop routing. Every function
//! works over caller-supplied snapshots; nothing here fetches accounts.

pub mod accounts;
pub mod adaptive_fee;
pub mod constants;
pub mod price_math;
pub mod router;
pub mod sequence;
pub mod state;
pub mod swap_quote;
pub mod tick;
pub mod tick_arrays;
pub mod two_hop;

// Re-exports
pub use accounts::{
    build_swap_accounts, LegacySwapAccounts, SwapAccountList, SwapAccountsBuilder,
    SwapInstructionVariant, SwapV2Accounts,
};
pub use adaptive_fee::{
    compute_adaptive_fee_rate, simulate_adaptive_fee, AdaptiveFeeUpdate, FeeRateController,
};
pub use constants::{adaptive_fee as adaptive_fee_constants, fees, seeds, ticks};
pub use price_math::{
    amount_delta_a, amount_delta_b, sqrt_price_x64_to_tick_index, tick_index_to_sqrt_price_x64,
};
pub use router::{PairPaths, Path, PoolGraph, PoolTokenPair};
pub use sequence::TickArraySequence;
pub use state::{
    AdaptiveFeeConstants, AdaptiveFeeVariables, OracleState, PoolState, SwapQuote,
    SwapQuoteParams, Tick, TickArray,
};
pub use swap_quote::{
    compute_swap, other_amount_threshold, swap_quote, verify_other_amount_threshold,
};
pub use tick_arrays::{
    oracle_address, swap_tick_array_addresses, swap_tick_arrays_with_fallback,
    tick_array_address, SwapTickArrays, TickArrayAddress,
};
pub use two_hop::{
    quote_two_hop_by_input, quote_two_hop_by_output, HopSnapshot, TwoHopQuoteParams,
    TwoHopSwapQuote,
};
