//! Swap Quote Engine
//!
//! Simulates the settlement program's tick-crossing swap loop over a pool
//! snapshot and its loaded tick arrays, producing a deterministic quote.
//!
//! The fee rate (static plus adaptive) is fixed once at the start of the
//! swap. Each step moves the price toward the next initialized tick or the
//! price limit, whichever is closer, and crosses liquidity at tick
//! boundaries. Running out of loaded tick arrays is an error, never a
//! silently truncated quote.

use num_bigint::BigUint;
use num_traits::{ToPrimitive, Zero};

use quoter_core::QuoteError;

use crate::adaptive_fee::{validate_fee_rates, FeeRateController};
use crate::constants::fees::{
    BPS_DENOMINATOR, FEE_RATE_DENOMINATOR, PROTOCOL_FEE_RATE_DENOMINATOR,
};
use crate::constants::ticks::{MAX_SQRT_PRICE, MAX_TICK_INDEX, MIN_SQRT_PRICE, MIN_TICK_INDEX};
use crate::price_math::{
    lower_sqrt_price_from_token_a, lower_sqrt_price_from_token_b, sqrt_price_x64_to_tick_index,
    tick_index_to_sqrt_price_x64, try_amount_delta_a, try_amount_delta_b,
    upper_sqrt_price_from_token_a, upper_sqrt_price_from_token_b,
};
use crate::sequence::TickArraySequence;
use crate::state::{OracleState, PoolState, SwapQuote, SwapQuoteParams, Tick, TickArray};
use crate::tick::ensure_tick_spacing;
use crate::tick_arrays::{oracle_address, tick_array_address};

// ----------------------------------------------------------------------------
// Quote
// ----------------------------------------------------------------------------

/// Quote a swap against a pool snapshot.
///
/// `tick_arrays` must be contiguous and cover the swap path; missing on-chain
/// arrays are passed as [`TickArray::uninitialized`]. `oracle` is the
/// adaptive fee oracle snapshot for pools that have one.
pub fn swap_quote(
    pool: &PoolState,
    tick_arrays: &[TickArray],
    oracle: Option<&OracleState>,
    params: &SwapQuoteParams,
) -> Result<SwapQuote, QuoteError> {
    validate_fee_rates(pool.fee_rate, pool.protocol_fee_rate)?;
    ensure_tick_spacing(pool.tick_spacing)?;
    if params.slippage_tolerance_bps > BPS_DENOMINATOR {
        return Err(QuoteError::InvalidSlippageTolerance {
            bps: params.slippage_tolerance_bps,
        });
    }
    if let Some(oracle) = oracle {
        oracle.constants.validate(pool.tick_spacing)?;
    }

    let controller = FeeRateController::new(
        pool.tick_current_index,
        params.timestamp,
        pool.fee_rate,
        oracle,
        params.protocol_version,
    )?;
    let fee_rate = controller.total_fee_rate();

    let sequence = TickArraySequence::new(tick_arrays, &pool.address, pool.tick_spacing)?;
    let result = compute_swap(
        pool,
        &sequence,
        params.amount,
        params.sqrt_price_limit,
        params.a_to_b,
        params.amount_specified_is_input,
        fee_rate,
    )?;

    if !params.amount_specified_is_input
        && params.sqrt_price_limit == 0
        && result.amount_out < params.amount
    {
        return Err(QuoteError::PartialFill);
    }

    let next_adaptive_fee = controller.next_variables(
        pool.sqrt_price,
        result.end_sqrt_price,
        result.end_tick_index,
        params.timestamp,
    )?;

    let other_amount = if params.amount_specified_is_input {
        result.amount_out
    } else {
        result.amount_in
    };
    let other_amount_threshold = other_amount_threshold(
        other_amount,
        params.slippage_tolerance_bps,
        params.amount_specified_is_input,
    )?;

    let tick_arrays = result
        .tick_array_start_indexes
        .iter()
        .map(|&start| tick_array_address(&params.program_id, &pool.address, start))
        .collect();

    let (input_mint, output_mint) = if params.a_to_b {
        (pool.token_mint_a, pool.token_mint_b)
    } else {
        (pool.token_mint_b, pool.token_mint_a)
    };

    tracing::debug!(
        "Quote pool {}: in {} out {} fee {} (rate {}), tick {} -> {}",
        pool.address,
        result.amount_in,
        result.amount_out,
        result.fee_amount,
        fee_rate,
        pool.tick_current_index,
        result.end_tick_index
    );

    Ok(SwapQuote {
        pool: pool.address,
        input_mint,
        output_mint,
        a_to_b: params.a_to_b,
        amount_specified_is_input: params.amount_specified_is_input,
        amount: params.amount,
        other_amount_threshold,
        sqrt_price_limit: result.sqrt_price_limit,
        estimated_amount_in: result.amount_in,
        estimated_amount_out: result.amount_out,
        estimated_fee_amount: result.fee_amount,
        estimated_protocol_fee: result.protocol_fee,
        fee_rate,
        estimated_end_sqrt_price: result.end_sqrt_price,
        estimated_end_tick_index: result.end_tick_index,
        tick_arrays,
        tick_array_start_indexes: result.tick_array_start_indexes,
        oracle_address: oracle.map(|_| oracle_address(&params.program_id, &pool.address)),
        next_adaptive_fee,
    })
}

// ----------------------------------------------------------------------------
// Swap loop
// ----------------------------------------------------------------------------

/// Raw outcome of the swap loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapComputation {
    pub amount_in: u64,
    pub amount_out: u64,
    /// Included in `amount_in`
    pub fee_amount: u64,
    pub protocol_fee: u64,
    pub sqrt_price_limit: u128,
    pub end_sqrt_price: u128,
    pub end_tick_index: i32,
    /// Arrays searched for initialized ticks, in traversal order
    pub tick_array_start_indexes: Vec<i32>,
}

/// Run the swap loop at a fixed `fee_rate`.
pub fn compute_swap(
    pool: &PoolState,
    sequence: &TickArraySequence<'_>,
    amount: u64,
    sqrt_price_limit: u128,
    a_to_b: bool,
    amount_specified_is_input: bool,
    fee_rate: u32,
) -> Result<SwapComputation, QuoteError> {
    let sqrt_price_limit = resolve_sqrt_price_limit(sqrt_price_limit, pool.sqrt_price, a_to_b)?;
    if amount == 0 {
        return Err(QuoteError::ZeroTradableAmount);
    }

    let mut amount_remaining = amount;
    let mut amount_calculated: u64 = 0;
    let mut current_sqrt_price = pool.sqrt_price;
    let mut current_tick_index = pool.tick_current_index;
    let mut current_liquidity = pool.liquidity;
    let mut fee_amount: u64 = 0;
    let mut protocol_fee: u64 = 0;
    let mut touched: Vec<i32> = Vec::new();

    while amount_remaining > 0 && current_sqrt_price != sqrt_price_limit {
        let array_start = sequence.search_array_start(current_tick_index, a_to_b);
        let (next_tick, next_tick_index) = if a_to_b {
            sequence.prev_initialized_tick(current_tick_index)?
        } else {
            sequence.next_initialized_tick(current_tick_index)?
        };
        if touched.last() != Some(&array_start) {
            touched.push(array_start);
        }
        let next_tick_index = next_tick_index.clamp(MIN_TICK_INDEX, MAX_TICK_INDEX);
        let next_tick_sqrt_price = tick_index_to_sqrt_price_x64(next_tick_index)?;
        let target_sqrt_price = if a_to_b {
            next_tick_sqrt_price.max(sqrt_price_limit)
        } else {
            next_tick_sqrt_price.min(sqrt_price_limit)
        };

        let step = compute_swap_step(
            amount_remaining,
            fee_rate,
            current_liquidity,
            current_sqrt_price,
            target_sqrt_price,
            a_to_b,
            amount_specified_is_input,
        )?;

        fee_amount = checked_add(fee_amount, step.fee_amount)?;
        let step_protocol_fee = protocol_fee_share(step.fee_amount, pool.protocol_fee_rate);
        protocol_fee = checked_add(protocol_fee, step_protocol_fee)?;

        if amount_specified_is_input {
            amount_remaining = amount_remaining
                .checked_sub(step.amount_in)
                .and_then(|a| a.checked_sub(step.fee_amount))
                .ok_or(QuoteError::Overflow)?;
            amount_calculated = checked_add(amount_calculated, step.amount_out)?;
        } else {
            amount_remaining = amount_remaining
                .checked_sub(step.amount_out)
                .ok_or(QuoteError::Overflow)?;
            amount_calculated = checked_add(amount_calculated, step.amount_in)?;
            amount_calculated = checked_add(amount_calculated, step.fee_amount)?;
        }

        if step.next_sqrt_price == next_tick_sqrt_price {
            current_liquidity = next_liquidity(current_liquidity, next_tick, a_to_b)?;
            current_tick_index = if a_to_b {
                next_tick_index - 1
            } else {
                next_tick_index
            };
        } else if step.next_sqrt_price != current_sqrt_price {
            current_tick_index = sqrt_price_x64_to_tick_index(step.next_sqrt_price)?;
        }

        current_sqrt_price = step.next_sqrt_price;
    }

    let swapped = amount - amount_remaining;
    let (amount_in, amount_out) = if amount_specified_is_input {
        (swapped, amount_calculated)
    } else {
        (amount_calculated, swapped)
    };

    Ok(SwapComputation {
        amount_in,
        amount_out,
        fee_amount,
        protocol_fee,
        sqrt_price_limit,
        end_sqrt_price: current_sqrt_price,
        end_tick_index: current_tick_index,
        tick_array_start_indexes: touched,
    })
}

/// Zero means "no limit"; otherwise the limit must sit inside the global
/// bounds and on the far side of the current price.
fn resolve_sqrt_price_limit(
    sqrt_price_limit: u128,
    sqrt_price: u128,
    a_to_b: bool,
) -> Result<u128, QuoteError> {
    let limit = match sqrt_price_limit {
        0 if a_to_b => MIN_SQRT_PRICE,
        0 => MAX_SQRT_PRICE,
        limit => limit,
    };
    if !(MIN_SQRT_PRICE..=MAX_SQRT_PRICE).contains(&limit) {
        return Err(QuoteError::SqrtPriceOutOfBounds { sqrt_price: limit });
    }
    if (a_to_b && limit >= sqrt_price) || (!a_to_b && limit <= sqrt_price) {
        return Err(QuoteError::InvalidSqrtPriceLimitDirection);
    }
    Ok(limit)
}

fn next_liquidity(current: u128, tick: Option<&Tick>, a_to_b: bool) -> Result<u128, QuoteError> {
    let liquidity_net = tick.map(|t| t.liquidity_net).unwrap_or(0);
    let magnitude = liquidity_net.unsigned_abs();
    // Crossing right to left applies the net with its sign flipped
    let adds = (liquidity_net > 0) != a_to_b;
    let next = if adds {
        current.checked_add(magnitude)
    } else {
        current.checked_sub(magnitude)
    };
    next.ok_or(QuoteError::Overflow)
}

fn checked_add(a: u64, b: u64) -> Result<u64, QuoteError> {
    a.checked_add(b).ok_or(QuoteError::Overflow)
}

fn protocol_fee_share(fee_amount: u64, protocol_fee_rate: u32) -> u64 {
    (fee_amount as u128 * protocol_fee_rate as u128 / PROTOCOL_FEE_RATE_DENOMINATOR as u128) as u64
}

// ----------------------------------------------------------------------------
// Swap step
// ----------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SwapStep {
    amount_in: u64,
    amount_out: u64,
    next_sqrt_price: u128,
    fee_amount: u64,
}

/// One move from `current_sqrt_price` toward `target_sqrt_price` at constant
/// liquidity. Stops short of the target when the remaining amount runs out.
fn compute_swap_step(
    amount_remaining: u64,
    fee_rate: u32,
    liquidity: u128,
    current_sqrt_price: u128,
    target_sqrt_price: u128,
    a_to_b: bool,
    amount_specified_is_input: bool,
) -> Result<SwapStep, QuoteError> {
    // None: reaching the target would take more than u64 of the fixed token
    let initial_fixed_delta = amount_fixed_delta(
        current_sqrt_price,
        target_sqrt_price,
        liquidity,
        a_to_b,
        amount_specified_is_input,
    )?;

    let amount_calculated = if amount_specified_is_input {
        apply_swap_fee(amount_remaining, fee_rate)?
    } else {
        amount_remaining
    };

    let next_sqrt_price = match initial_fixed_delta {
        Some(delta) if delta <= amount_calculated => target_sqrt_price,
        _ => next_sqrt_price(
            current_sqrt_price,
            liquidity,
            amount_calculated,
            a_to_b,
            amount_specified_is_input,
        )?,
    };

    let is_max_swap = next_sqrt_price == target_sqrt_price;

    let amount_unfixed = amount_unfixed_delta(
        current_sqrt_price,
        next_sqrt_price,
        liquidity,
        a_to_b,
        amount_specified_is_input,
    )?
    .ok_or(QuoteError::Overflow)?;

    let amount_fixed = match initial_fixed_delta {
        Some(delta) if is_max_swap => delta,
        _ => amount_fixed_delta(
            current_sqrt_price,
            next_sqrt_price,
            liquidity,
            a_to_b,
            amount_specified_is_input,
        )?
        .ok_or(QuoteError::Overflow)?,
    };

    let (amount_in, mut amount_out) = if amount_specified_is_input {
        (amount_fixed, amount_unfixed)
    } else {
        (amount_unfixed, amount_fixed)
    };

    if !amount_specified_is_input && amount_out > amount_remaining {
        amount_out = amount_remaining;
    }

    let fee_amount = if amount_specified_is_input && !is_max_swap {
        amount_remaining
            .checked_sub(amount_in)
            .ok_or(QuoteError::Overflow)?
    } else {
        reverse_apply_swap_fee(amount_in, fee_rate)? - amount_in
    };

    Ok(SwapStep {
        amount_in,
        amount_out,
        next_sqrt_price,
        fee_amount,
    })
}

/// Delta of the token whose amount the request fixes
fn amount_fixed_delta(
    current_sqrt_price: u128,
    target_sqrt_price: u128,
    liquidity: u128,
    a_to_b: bool,
    amount_specified_is_input: bool,
) -> Result<Option<u64>, QuoteError> {
    if a_to_b == amount_specified_is_input {
        try_amount_delta_a(
            current_sqrt_price,
            target_sqrt_price,
            liquidity,
            amount_specified_is_input,
        )
    } else {
        try_amount_delta_b(
            current_sqrt_price,
            target_sqrt_price,
            liquidity,
            amount_specified_is_input,
        )
    }
}

/// Delta of the other token, rounded against the trader
fn amount_unfixed_delta(
    current_sqrt_price: u128,
    target_sqrt_price: u128,
    liquidity: u128,
    a_to_b: bool,
    amount_specified_is_input: bool,
) -> Result<Option<u64>, QuoteError> {
    if a_to_b == amount_specified_is_input {
        try_amount_delta_b(
            current_sqrt_price,
            target_sqrt_price,
            liquidity,
            !amount_specified_is_input,
        )
    } else {
        try_amount_delta_a(
            current_sqrt_price,
            target_sqrt_price,
            liquidity,
            !amount_specified_is_input,
        )
    }
}

fn next_sqrt_price(
    sqrt_price: u128,
    liquidity: u128,
    amount: u64,
    a_to_b: bool,
    amount_specified_is_input: bool,
) -> Result<u128, QuoteError> {
    match (a_to_b, amount_specified_is_input) {
        // A in
        (true, true) => lower_sqrt_price_from_token_a(amount, liquidity, sqrt_price),
        // B out
        (true, false) => lower_sqrt_price_from_token_b(amount, liquidity, sqrt_price),
        // B in
        (false, true) => upper_sqrt_price_from_token_b(amount, liquidity, sqrt_price),
        // A out
        (false, false) => upper_sqrt_price_from_token_a(amount, liquidity, sqrt_price),
    }
}

/// Amount left to trade after the fee: `amount * (1 - fee_rate)`, rounded down.
pub fn apply_swap_fee(amount: u64, fee_rate: u32) -> Result<u64, QuoteError> {
    let denominator = FEE_RATE_DENOMINATOR as u128;
    let kept = denominator
        .checked_sub(fee_rate as u128)
        .ok_or(QuoteError::Overflow)?;
    Ok((amount as u128 * kept / denominator) as u64)
}

/// Gross amount whose post-fee value is `amount`, rounded up.
pub fn reverse_apply_swap_fee(amount: u64, fee_rate: u32) -> Result<u64, QuoteError> {
    let denominator = FEE_RATE_DENOMINATOR as u128;
    let kept = denominator
        .checked_sub(fee_rate as u128)
        .filter(|k| *k > 0)
        .ok_or(QuoteError::DivisionByZero)?;
    let gross = (amount as u128 * denominator).div_ceil(kept);
    u64::try_from(gross).map_err(|_| QuoteError::Overflow)
}

// ----------------------------------------------------------------------------
// Slippage
// ----------------------------------------------------------------------------

/// Bound on the amount the request does not fix.
///
/// Exact input: minimum output `floor(out * (10_000 - bps) / 10_000)`.
/// Exact output: maximum input `ceil(in * (10_000 + bps) / 10_000)`,
/// saturating at `u64::MAX`.
pub fn other_amount_threshold(
    other_amount: u64,
    slippage_tolerance_bps: u16,
    amount_specified_is_input: bool,
) -> Result<u64, QuoteError> {
    if slippage_tolerance_bps > BPS_DENOMINATOR {
        return Err(QuoteError::InvalidSlippageTolerance {
            bps: slippage_tolerance_bps,
        });
    }
    let denominator = BigUint::from(BPS_DENOMINATOR);
    let amount = BigUint::from(other_amount);

    if amount_specified_is_input {
        let numerator = amount * BigUint::from(BPS_DENOMINATOR - slippage_tolerance_bps);
        Ok((numerator / denominator).to_u64().unwrap_or(u64::MAX))
    } else {
        let numerator =
            amount * BigUint::from(BPS_DENOMINATOR as u32 + slippage_tolerance_bps as u32);
        let quotient = &numerator / &denominator;
        let bumped = if (&numerator % &denominator).is_zero() {
            quotient
        } else {
            quotient + 1u32
        };
        Ok(bumped.to_u64().unwrap_or(u64::MAX))
    }
}

/// The settlement program's bound check against the amount it actually
/// computed for the side the request does not fix.
pub fn verify_other_amount_threshold(
    quote: &SwapQuote,
    executed_other_amount: u64,
) -> Result<(), QuoteError> {
    let threshold = quote.other_amount_threshold;
    let violated = if quote.amount_specified_is_input {
        executed_other_amount < threshold
    } else {
        executed_other_amount > threshold
    };
    if violated {
        return Err(QuoteError::SlippageExceeded {
            got: executed_other_amount,
            threshold,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adaptive_fee::compute_adaptive_fee_rate;
    use crate::price_math::amount_delta_b;
    use crate::state::{AdaptiveFeeConstants, AdaptiveFeeVariables};
    use crate::tick_arrays::swap_tick_array_start_indexes;
    use quoter_core::{ProtocolVersion, Pubkey};

    const Q64: u128 = 1 << 64;

    fn pool(tick_current_index: i32, liquidity: u128, tick_spacing: u16) -> PoolState {
        PoolState {
            address: Pubkey::new_unique(),
            token_mint_a: Pubkey::new_unique(),
            token_mint_b: Pubkey::new_unique(),
            sqrt_price: tick_index_to_sqrt_price_x64(tick_current_index).unwrap(),
            tick_current_index,
            liquidity,
            tick_spacing,
            fee_rate: 3_000,
            protocol_fee_rate: 300,
            fee_growth_global_a: 0,
            fee_growth_global_b: 0,
        }
    }

    fn arrays(pool: &PoolState, starts: &[i32]) -> Vec<TickArray> {
        starts
            .iter()
            .map(|&s| TickArray::uninitialized(pool.address, s))
            .collect()
    }

    fn params(amount: u64, a_to_b: bool, exact_in: bool) -> SwapQuoteParams {
        SwapQuoteParams {
            amount,
            a_to_b,
            amount_specified_is_input: exact_in,
            sqrt_price_limit: 0,
            slippage_tolerance_bps: 100,
            timestamp: 1_700_000_000,
            protocol_version: ProtocolVersion::V2,
            program_id: Pubkey::new_unique(),
        }
    }

    fn oracle() -> OracleState {
        OracleState {
            trade_enable_timestamp: 0,
            constants: AdaptiveFeeConstants {
                filter_period: 30,
                decay_period: 600,
                reduction_factor: 500,
                adaptive_fee_control_factor: 4_000,
                max_volatility_accumulator: 350_000,
                tick_group_size: 64,
                major_swap_threshold_ticks: 64,
            },
            variables: AdaptiveFeeVariables::default(),
        }
    }

    #[test]
    fn test_exact_in_a_to_b_single_step() {
        let pool = pool(0, 1_000_000_000, 64);
        let arrays = arrays(&pool, &[0, -5632, -11264]);
        let quote = swap_quote(&pool, &arrays, None, &params(1_000, true, true)).unwrap();

        // 0.3% fee leaves 997 to trade against constant liquidity
        let end = lower_sqrt_price_from_token_a(997, pool.liquidity, Q64).unwrap();
        let out = amount_delta_b(Q64, end, pool.liquidity, false).unwrap();

        assert_eq!(quote.estimated_amount_in, 1_000);
        assert_eq!(quote.estimated_end_sqrt_price, end);
        assert_eq!(quote.estimated_amount_out, out);
        assert_eq!(quote.estimated_fee_amount, 3);
        assert_eq!(quote.estimated_protocol_fee, 0);
        assert_eq!(quote.fee_rate, 3_000);
        assert_eq!(quote.estimated_end_tick_index, -1);
        assert_eq!(quote.input_mint, pool.token_mint_a);
        assert_eq!(quote.output_mint, pool.token_mint_b);
        assert_eq!(quote.sqrt_price_limit, MIN_SQRT_PRICE);
        assert_eq!(quote.tick_array_start_indexes, vec![0, -5632]);
        assert!(quote.oracle_address.is_none());
        assert!(quote.next_adaptive_fee.is_none());
    }

    #[test]
    fn test_exact_out_b_to_a() {
        let pool = pool(0, 1_000_000_000, 64);
        let arrays = arrays(&pool, &[0, 5632, 11264]);
        let quote = swap_quote(&pool, &arrays, None, &params(1_000, false, false)).unwrap();

        assert_eq!(quote.estimated_amount_out, 1_000);
        assert!(quote.estimated_amount_in > 1_000);
        assert!(quote.estimated_end_sqrt_price > pool.sqrt_price);
        assert_eq!(quote.input_mint, pool.token_mint_b);
        // max in with 1% slippage
        assert_eq!(
            quote.other_amount_threshold,
            other_amount_threshold(quote.estimated_amount_in, 100, false).unwrap()
        );
        assert!(quote.other_amount_threshold > quote.estimated_amount_in);
    }

    #[test]
    fn test_quote_is_deterministic() {
        let pool = pool(100, 5_000_000, 64);
        let arrays = arrays(&pool, &[0, -5632, -11264]);
        let p = params(250_000, true, true);
        let first = swap_quote(&pool, &arrays, Some(&oracle()), &p).unwrap();
        let second = swap_quote(&pool, &arrays, Some(&oracle()), &p).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.estimated_amount_in, 250_000);
    }

    #[test]
    fn test_crossing_tick_changes_liquidity() {
        let pool = pool(0, 1_000_000, 64);
        let flat = arrays(&pool, &[0, -5632, -11264]);

        let mut crossing = flat.clone();
        // Tick -64 is slot 87 of the array at -5632; a position ending there
        // leaves the range when crossed right to left
        crossing[1].ticks[87] = Tick {
            initialized: true,
            liquidity_net: 600_000,
            liquidity_gross: 600_000,
            ..Tick::default()
        };

        let p = params(50_000, true, true);
        let flat_quote = swap_quote(&pool, &flat, None, &p).unwrap();
        let crossing_quote = swap_quote(&pool, &crossing, None, &p).unwrap();

        assert!(flat_quote.estimated_end_tick_index < -64);
        assert!(crossing_quote.estimated_end_tick_index < flat_quote.estimated_end_tick_index);
        assert!(crossing_quote.estimated_amount_out < flat_quote.estimated_amount_out);
        assert_eq!(crossing_quote.tick_array_start_indexes, vec![0, -5632]);
        assert_eq!(
            crossing_quote.tick_arrays[1],
            tick_array_address(&p.program_id, &pool.address, -5632)
        );
    }

    #[test]
    fn test_exhausted_tick_arrays_fail() {
        let pool = pool(0, 1_000, 64);
        let arrays = arrays(&pool, &[0]);
        let err = swap_quote(&pool, &arrays, None, &params(1_000_000, true, true)).unwrap_err();
        assert_eq!(err, QuoteError::TickArrayOutOfRange { tick_index: -1 });
    }

    #[test]
    fn test_exhausted_tick_arrays_fail_b_to_a() {
        let pool = pool(0, 1_000, 64);
        let arrays = arrays(&pool, &[0]);
        let err = swap_quote(&pool, &arrays, None, &params(1_000_000, false, true)).unwrap_err();
        // Crossing tick 5568 leaves a search that needs the array at 5632
        assert_eq!(err, QuoteError::TickArrayOutOfRange { tick_index: 5568 });
    }

    #[test]
    fn test_b_to_a_from_last_tick_group_reports_next_array() {
        let pool = pool(5600, 1_000_000_000, 64);
        let starts = swap_tick_array_start_indexes(5600, 64, false, 3).unwrap();
        assert_eq!(starts, vec![5632, 11264, 16896]);
        let arrays = arrays(&pool, &starts);

        let p = params(1_000, false, true);
        let quote = swap_quote(&pool, &arrays, None, &p).unwrap();
        assert!(quote.estimated_end_tick_index < 5632);
        assert_eq!(quote.tick_array_start_indexes, vec![5632]);
        assert_eq!(
            quote.tick_arrays,
            vec![tick_array_address(&p.program_id, &pool.address, 5632)]
        );
    }

    #[test]
    fn test_b_to_a_reports_arrays_in_traversal_order() {
        // ~321 B reaches tick 5568 and ~752 B reaches 11200; 997 stops short
        // of 16832
        let pool = pool(0, 1_000, 64);
        let arrays = arrays(&pool, &[11264, 0, 5632]);
        let quote = swap_quote(&pool, &arrays, None, &params(1_000, false, true)).unwrap();

        assert_eq!(quote.estimated_amount_in, 1_000);
        assert!(quote.estimated_end_tick_index >= 11264);
        assert!(quote.estimated_end_tick_index < 16832);
        assert_eq!(quote.tick_array_start_indexes, vec![0, 5632, 11264]);
    }

    #[test]
    fn test_tick_arrays_of_another_pool_are_rejected() {
        let pool = pool(0, 1_000_000, 64);
        let other = Pubkey::new_unique();
        let arrays: Vec<TickArray> = [0, -5632]
            .iter()
            .map(|&s| TickArray::uninitialized(other, s))
            .collect();
        assert!(matches!(
            swap_quote(&pool, &arrays, None, &params(1_000, true, true)),
            Err(QuoteError::InvalidTickArraySequence { .. })
        ));
    }

    #[test]
    fn test_price_limit_stops_swap() {
        let pool = pool(0, 1_000_000, 64);
        let arrays = arrays(&pool, &[0, -5632, -11264]);
        let limit = tick_index_to_sqrt_price_x64(-10).unwrap();
        let mut p = params(10_000_000, true, true);
        p.sqrt_price_limit = limit;

        let quote = swap_quote(&pool, &arrays, None, &p).unwrap();
        assert_eq!(quote.estimated_end_sqrt_price, limit);
        assert!(quote.estimated_amount_in < p.amount);
        assert_eq!(quote.estimated_end_tick_index, -10);
    }

    #[test]
    fn test_invalid_limit_direction() {
        let pool = pool(0, 1_000_000, 64);
        let arrays = arrays(&pool, &[0]);
        let mut p = params(1_000, true, true);
        p.sqrt_price_limit = pool.sqrt_price + 1;
        assert_eq!(
            swap_quote(&pool, &arrays, None, &p).unwrap_err(),
            QuoteError::InvalidSqrtPriceLimitDirection
        );
    }

    #[test]
    fn test_input_validation() {
        let mut bad_pool = pool(0, 1_000_000, 64);
        bad_pool.fee_rate = 60_001;
        let arrays = arrays(&bad_pool, &[0]);
        assert!(matches!(
            swap_quote(&bad_pool, &arrays, None, &params(1_000, true, true)),
            Err(QuoteError::FeeRateMaxExceeded { .. })
        ));

        let good_pool = pool(0, 1_000_000, 64);
        assert_eq!(
            swap_quote(&good_pool, &arrays, None, &params(0, true, true)).unwrap_err(),
            QuoteError::ZeroTradableAmount
        );

        let mut p = params(1_000, true, true);
        p.slippage_tolerance_bps = 10_001;
        assert_eq!(
            swap_quote(&good_pool, &arrays, None, &p).unwrap_err(),
            QuoteError::InvalidSlippageTolerance { bps: 10_001 }
        );
    }

    #[test]
    fn test_partial_fill_without_limit() {
        // One array per side of zero covers the whole tick range at this spacing
        let pool = pool(0, 1_000, 32768);
        let arrays = arrays(&pool, &[0, -2883584]);
        let p = params(1_000_000_000, true, false);
        assert_eq!(
            swap_quote(&pool, &arrays, None, &p).unwrap_err(),
            QuoteError::PartialFill
        );

        let mut limited = p.clone();
        limited.sqrt_price_limit = tick_index_to_sqrt_price_x64(-1000).unwrap();
        let quote = swap_quote(&pool, &arrays, None, &limited).unwrap();
        assert!(quote.estimated_amount_out < limited.amount);
    }

    #[test]
    fn test_trade_enable_gate() {
        let pool = pool(0, 1_000_000, 64);
        let arrays = arrays(&pool, &[0, -5632]);
        let mut gated = oracle();
        gated.trade_enable_timestamp = 1_700_000_100;

        let mut p = params(1_000, true, true);
        assert_eq!(
            swap_quote(&pool, &arrays, Some(&gated), &p).unwrap_err(),
            QuoteError::TradeNotEnabled {
                trade_enable_timestamp: 1_700_000_100,
                timestamp: 1_700_000_000,
            }
        );

        p.timestamp = 1_700_000_100;
        let first = swap_quote(&pool, &arrays, Some(&gated), &p).unwrap();
        let second = swap_quote(&pool, &arrays, Some(&gated), &p).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_adaptive_fee_scenario_group_two() {
        // floor(150 / 64) = 2
        let pool = pool(150, 1_000_000, 64);
        let arrays = arrays(&pool, &[0, -5632, -11264]);
        let oracle = oracle();
        assert_eq!(oracle.variables.tick_group_index_reference, 0);
        assert_eq!(oracle.variables.volatility_accumulator, 0);

        let mut p = params(20_000, true, true);
        p.slippage_tolerance_bps = 0;
        let quote = swap_quote(&pool, &arrays, Some(&oracle), &p).unwrap();

        let next = quote.next_adaptive_fee.unwrap();
        let post_group = quote.estimated_end_tick_index.div_euclid(64);
        assert!(post_group < 2);
        assert_eq!(next.tick_group_index_reference, 2);
        assert_eq!(
            next.volatility_accumulator,
            (post_group - 2).unsigned_abs() * 10_000
        );
        assert_eq!(next.last_reference_update_timestamp, p.timestamp);
        // Fee charged from the pre-swap accumulator, which is zero
        assert_eq!(quote.fee_rate, pool.fee_rate);
        assert_eq!(quote.other_amount_threshold, quote.estimated_amount_out);
        assert_eq!(quote.estimated_amount_in, 20_000);
        assert!(quote.oracle_address.is_some());
    }

    #[test]
    fn test_adaptive_fee_raises_rate_after_volatility() {
        let pool = pool(150, 1_000_000, 64);
        let arrays = arrays(&pool, &[0, -5632, -11264]);
        let mut volatile = oracle();
        volatile.variables = AdaptiveFeeVariables {
            last_reference_update_timestamp: 1_699_999_990,
            last_major_swap_timestamp: 1_699_999_990,
            volatility_reference: 0,
            tick_group_index_reference: 5,
            volatility_accumulator: 30_000,
        };
        let quote =
            swap_quote(&pool, &arrays, Some(&volatile), &params(1_000, true, true)).unwrap();

        // Within the filter period the reference stays at group 5, so the
        // accumulator at group 2 is 3 * 10_000: ceil(4_000 * 1_920_000^2 / 10^13)
        let adaptive = compute_adaptive_fee_rate(&volatile.constants, &volatile.variables);
        assert_eq!(adaptive, 1_475);
        assert_eq!(quote.fee_rate, pool.fee_rate + adaptive);
    }

    #[test]
    fn test_swap_fee_helpers() {
        assert_eq!(apply_swap_fee(1_000, 3_000).unwrap(), 997);
        assert_eq!(reverse_apply_swap_fee(997, 3_000).unwrap(), 1_000);
        assert_eq!(apply_swap_fee(1_000, 0).unwrap(), 1_000);
    }

    #[test]
    fn test_other_amount_threshold() {
        assert_eq!(other_amount_threshold(10_000, 100, true).unwrap(), 9_900);
        assert_eq!(other_amount_threshold(10_001, 100, true).unwrap(), 9_900);
        assert_eq!(other_amount_threshold(10_000, 100, false).unwrap(), 10_100);
        assert_eq!(other_amount_threshold(10_001, 100, false).unwrap(), 10_102);
        assert_eq!(other_amount_threshold(u64::MAX, 100, false).unwrap(), u64::MAX);
        assert_eq!(other_amount_threshold(10_000, 0, true).unwrap(), 10_000);
        assert!(other_amount_threshold(1, 10_001, true).is_err());
    }

    #[test]
    fn test_verify_other_amount_threshold() {
        let pool = pool(0, 1_000_000_000, 64);
        let arrays = arrays(&pool, &[0, -5632, -11264]);
        let quote = swap_quote(&pool, &arrays, None, &params(100_000, true, true)).unwrap();

        assert!(verify_other_amount_threshold(&quote, quote.estimated_amount_out).is_ok());
        assert!(verify_other_amount_threshold(&quote, quote.other_amount_threshold).is_ok());
        assert_eq!(
            verify_other_amount_threshold(&quote, quote.other_amount_threshold - 1),
            Err(QuoteError::SlippageExceeded {
                got: quote.other_amount_threshold - 1,
                threshold: quote.other_amount_threshold,
            })
        );
    }
}
