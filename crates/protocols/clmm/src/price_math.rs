//! Price Math
//!
//! Q64.64 fixed-point conversions between tick indices and square-root
//! prices, plus the bound helpers the swap engine uses to find where a token
//! amount runs out against a liquidity value.
//!
//! Wide intermediates use `BigUint`; every result is narrowed back with an
//! explicit overflow check.

use num_bigint::BigUint;
use num_traits::{ToPrimitive, Zero};

use quoter_core::QuoteError;

use crate::constants::ticks::{MAX_SQRT_PRICE, MAX_TICK_INDEX, MIN_SQRT_PRICE, MIN_TICK_INDEX};

/// log_b(2) in Q32.32, with b = sqrt(1.0001)
const LOG_B_2_X32: i128 = 59543866431248;

/// Fractional bits computed by the log2 approximation
const BIT_PRECISION: u32 = 14;

const LOG_B_P_ERR_MARGIN_LOWER_X64: i128 = 184467440737095516;
const LOG_B_P_ERR_MARGIN_UPPER_X64: i128 = 15793534762490258745;

/// Q96 factors sqrt(1.0001)^(2^i) applied for set bits of a positive tick
const POSITIVE_TICK_FACTORS: [(i32, u128); 18] = [
    (0x2, 79236085330515764027303304731),
    (0x4, 79244008939048815603706035061),
    (0x8, 79259858533276714757314932305),
    (0x10, 79291567232598584799939703904),
    (0x20, 79355022692464371645785046466),
    (0x40, 79482085999252804386437311141),
    (0x80, 79736823300114093921829183326),
    (0x100, 80248749790819932309965073892),
    (0x200, 81282483887344747381513967011),
    (0x400, 83390072131320151908154831281),
    (0x800, 87770609709833776024991924138),
    (0x1000, 97234110755111693312479820773),
    (0x2000, 119332217159966728226237229890),
    (0x4000, 179736315981702064433883588727),
    (0x8000, 407748233172238350107850275304),
    (0x10000, 2098478828474011932436660412517),
    (0x20000, 55581415166113811149459800483533),
    (0x40000, 38992368544603139932233054999993551),
];

/// Q64 factors 1/sqrt(1.0001)^(2^i) applied for set bits of a negative tick
const NEGATIVE_TICK_FACTORS: [(i32, u128); 18] = [
    (0x2, 18444899583751176498),
    (0x4, 18443055278223354162),
    (0x8, 18439367220385604838),
    (0x10, 18431993317065449817),
    (0x20, 18417254355718160513),
    (0x40, 18387811781193591352),
    (0x80, 18329067761203520168),
    (0x100, 18212142134806087854),
    (0x200, 17980523815641551639),
    (0x400, 17526086738831147013),
    (0x800, 16651378430235024244),
    (0x1000, 15030750278693429944),
    (0x2000, 12247334978882834399),
    (0x4000, 8131365268884726200),
    (0x8000, 3584323654723342297),
    (0x10000, 696457651847595233),
    (0x20000, 26294789957452057),
    (0x40000, 37481735321082),
];

// ----------------------------------------------------------------------------
// Wide arithmetic
// ----------------------------------------------------------------------------

fn narrow_u128(value: BigUint) -> Result<u128, QuoteError> {
    value.to_u128().ok_or(QuoteError::Overflow)
}

fn div_round_up(numerator: &BigUint, denominator: &BigUint) -> Result<BigUint, QuoteError> {
    if denominator.is_zero() {
        return Err(QuoteError::DivisionByZero);
    }
    let quotient = numerator / denominator;
    if (numerator % denominator).is_zero() {
        Ok(quotient)
    } else {
        Ok(quotient + 1u32)
    }
}

fn mul_shift_96(a: u128, b: u128) -> Result<u128, QuoteError> {
    narrow_u128((BigUint::from(a) * BigUint::from(b)) >> 96u32)
}

// ----------------------------------------------------------------------------
// Tick <-> sqrt price
// ----------------------------------------------------------------------------

/// Convert a tick index into its Q64.64 square-root price.
///
/// Strictly increasing over `[MIN_TICK_INDEX, MAX_TICK_INDEX]`.
pub fn tick_index_to_sqrt_price_x64(tick_index: i32) -> Result<u128, QuoteError> {
    if !(MIN_TICK_INDEX..=MAX_TICK_INDEX).contains(&tick_index) {
        return Err(QuoteError::TickIndexOutOfBounds { tick_index });
    }
    if tick_index >= 0 {
        sqrt_price_positive_tick(tick_index)
    } else {
        Ok(sqrt_price_negative_tick(tick_index))
    }
}

fn sqrt_price_positive_tick(tick: i32) -> Result<u128, QuoteError> {
    let mut ratio: u128 = if tick & 1 != 0 {
        79232123823359799118286999567
    } else {
        79228162514264337593543950336
    };
    for &(bit, factor) in POSITIVE_TICK_FACTORS.iter() {
        if tick & bit != 0 {
            ratio = mul_shift_96(ratio, factor)?;
        }
    }
    Ok(ratio >> 32)
}

fn sqrt_price_negative_tick(tick: i32) -> u128 {
    let abs_tick = tick.abs();
    let mut ratio: u128 = if abs_tick & 1 != 0 {
        18445821805675392311
    } else {
        18446744073709551616
    };
    // ratio <= 2^64 and every factor < 2^64, so the product fits in u128
    for &(bit, factor) in NEGATIVE_TICK_FACTORS.iter() {
        if abs_tick & bit != 0 {
            ratio = (ratio * factor) >> 64;
        }
    }
    ratio
}

/// Convert a Q64.64 square-root price into the tick whose band contains it.
///
/// Floors to the band boundary: any price in `[p(t), p(t + 1))` maps to `t`.
pub fn sqrt_price_x64_to_tick_index(sqrt_price: u128) -> Result<i32, QuoteError> {
    if !(MIN_SQRT_PRICE..=MAX_SQRT_PRICE).contains(&sqrt_price) {
        return Err(QuoteError::SqrtPriceOutOfBounds { sqrt_price });
    }

    let msb: u32 = 127 - sqrt_price.leading_zeros();
    let log2p_integer_x32 = (msb as i128 - 64) << 32;

    // Fractional part of log2, one bit per squaring of r / 2^msb
    let mut bit: i128 = 0x8000_0000_0000_0000;
    let mut precision = 0;
    let mut log2p_fraction_x64: i128 = 0;
    let mut r: u128 = if msb >= 64 {
        sqrt_price >> (msb - 63)
    } else {
        sqrt_price << (63 - msb)
    };

    while bit > 0 && precision < BIT_PRECISION {
        r *= r;
        let is_r_more_than_two = (r >> 127) as u32;
        r >>= 63 + is_r_more_than_two;
        log2p_fraction_x64 += bit * is_r_more_than_two as i128;
        bit >>= 1;
        precision += 1;
    }

    let log2p_x32 = log2p_integer_x32 + (log2p_fraction_x64 >> 32);
    let logbp_x64 = log2p_x32 * LOG_B_2_X32;

    let tick_low = ((logbp_x64 - LOG_B_P_ERR_MARGIN_LOWER_X64) >> 64) as i32;
    let tick_high = ((logbp_x64 + LOG_B_P_ERR_MARGIN_UPPER_X64) >> 64) as i32;

    if tick_low == tick_high || tick_high > MAX_TICK_INDEX {
        return Ok(tick_low);
    }
    if tick_index_to_sqrt_price_x64(tick_high)? <= sqrt_price {
        Ok(tick_high)
    } else {
        Ok(tick_low)
    }
}

// ----------------------------------------------------------------------------
// Bound helpers
// ----------------------------------------------------------------------------

/// Price reached after `amount` of token A is added to the pool (a -> b).
///
/// `L * P / (L + amount * P)`, rounded up.
pub fn lower_sqrt_price_from_token_a(
    amount: u64,
    liquidity: u128,
    sqrt_price: u128,
) -> Result<u128, QuoteError> {
    sqrt_price_from_token_a(amount, liquidity, sqrt_price, true)
}

/// Price reached after `amount` of token A is removed from the pool (b -> a).
///
/// `L * P / (L - amount * P)`, rounded up.
pub fn upper_sqrt_price_from_token_a(
    amount: u64,
    liquidity: u128,
    sqrt_price: u128,
) -> Result<u128, QuoteError> {
    sqrt_price_from_token_a(amount, liquidity, sqrt_price, false)
}

fn sqrt_price_from_token_a(
    amount: u64,
    liquidity: u128,
    sqrt_price: u128,
    add: bool,
) -> Result<u128, QuoteError> {
    if liquidity == 0 {
        return Err(QuoteError::DivisionByZero);
    }
    if amount == 0 {
        return Ok(sqrt_price);
    }

    let product = BigUint::from(sqrt_price) * BigUint::from(amount);
    let liquidity_x64 = BigUint::from(liquidity) << 64u32;
    let numerator = &liquidity_x64 * BigUint::from(sqrt_price);

    let denominator = if add {
        liquidity_x64 + product
    } else {
        // Removing more A than the range holds has no finite price
        if liquidity_x64 <= product {
            return Err(QuoteError::Overflow);
        }
        liquidity_x64 - product
    };

    narrow_u128(div_round_up(&numerator, &denominator)?)
}

/// Price reached after `amount` of token B is removed from the pool (a -> b).
///
/// `P - amount / L`, with the delta rounded up so the price rounds down.
pub fn lower_sqrt_price_from_token_b(
    amount: u64,
    liquidity: u128,
    sqrt_price: u128,
) -> Result<u128, QuoteError> {
    if liquidity == 0 {
        return Err(QuoteError::DivisionByZero);
    }
    let amount_x64 = BigUint::from(amount) << 64u32;
    let delta = narrow_u128(div_round_up(&amount_x64, &BigUint::from(liquidity))?)?;
    sqrt_price.checked_sub(delta).ok_or(QuoteError::Overflow)
}

/// Price reached after `amount` of token B is added to the pool (b -> a).
///
/// `P + amount / L`, with the delta rounded down.
pub fn upper_sqrt_price_from_token_b(
    amount: u64,
    liquidity: u128,
    sqrt_price: u128,
) -> Result<u128, QuoteError> {
    if liquidity == 0 {
        return Err(QuoteError::DivisionByZero);
    }
    let delta = ((amount as u128) << 64) / liquidity;
    sqrt_price.checked_add(delta).ok_or(QuoteError::Overflow)
}

// ----------------------------------------------------------------------------
// Amount deltas
// ----------------------------------------------------------------------------

/// Token A held by `liquidity` between two prices: `L * (p1 - p0) / (p0 * p1)`.
///
/// Price order does not matter. Fails with `Overflow` past `u64`.
pub fn amount_delta_a(
    sqrt_price_0: u128,
    sqrt_price_1: u128,
    liquidity: u128,
    round_up: bool,
) -> Result<u64, QuoteError> {
    try_amount_delta_a(sqrt_price_0, sqrt_price_1, liquidity, round_up)?
        .ok_or(QuoteError::Overflow)
}

/// Token B held by `liquidity` between two prices: `L * (p1 - p0)`.
///
/// Price order does not matter. Fails with `Overflow` past `u64`.
pub fn amount_delta_b(
    sqrt_price_0: u128,
    sqrt_price_1: u128,
    liquidity: u128,
    round_up: bool,
) -> Result<u64, QuoteError> {
    try_amount_delta_b(sqrt_price_0, sqrt_price_1, liquidity, round_up)?
        .ok_or(QuoteError::Overflow)
}

/// Like [`amount_delta_a`], but reports a result past `u64` as `None` so the
/// swap step can fall back to a partial move instead of failing.
pub(crate) fn try_amount_delta_a(
    sqrt_price_0: u128,
    sqrt_price_1: u128,
    liquidity: u128,
    round_up: bool,
) -> Result<Option<u64>, QuoteError> {
    let (lower, upper) = ordered(sqrt_price_0, sqrt_price_1);
    if lower == 0 {
        return Err(QuoteError::DivisionByZero);
    }

    let numerator = (BigUint::from(liquidity) * BigUint::from(upper - lower)) << 64u32;
    let denominator = BigUint::from(upper) * BigUint::from(lower);
    let quotient = &numerator / &denominator;
    let result = if round_up && !(&numerator % &denominator).is_zero() {
        quotient + 1u32
    } else {
        quotient
    };

    Ok(result.to_u64())
}

pub(crate) fn try_amount_delta_b(
    sqrt_price_0: u128,
    sqrt_price_1: u128,
    liquidity: u128,
    round_up: bool,
) -> Result<Option<u64>, QuoteError> {
    let (lower, upper) = ordered(sqrt_price_0, sqrt_price_1);

    let product = BigUint::from(liquidity) * BigUint::from(upper - lower);
    let has_remainder = !(&product % (BigUint::from(1u8) << 64u32)).is_zero();
    let quotient = product >> 64u32;
    let result = if round_up && has_remainder {
        quotient + 1u32
    } else {
        quotient
    };

    Ok(result.to_u64())
}

fn ordered(a: u128, b: u128) -> (u128, u128) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

// ----------------------------------------------------------------------------
// Display helpers
// ----------------------------------------------------------------------------

/// Human-readable price of A in B, adjusted for mint decimals. Display only.
pub fn sqrt_price_to_price(sqrt_price: u128, decimals_a: u8, decimals_b: u8) -> f64 {
    let sqrt = sqrt_price as f64 / 2f64.powi(64);
    sqrt * sqrt * 10f64.powi(decimals_a as i32 - decimals_b as i32)
}

/// Inverse of [`sqrt_price_to_price`], floored to the nearest Q64.64 value.
pub fn price_to_sqrt_price(price: f64, decimals_a: u8, decimals_b: u8) -> u128 {
    let raw = price * 10f64.powi(decimals_b as i32 - decimals_a as i32);
    (raw.sqrt() * 2f64.powi(64)).floor() as u128
}
