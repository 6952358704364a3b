//! Tick index helpers
//!
//! Alignment and stepping rules shared by tick-array addressing and the
//! tick-array sequence.

use quoter_core::QuoteError;

use crate::constants::ticks::TICK_ARRAY_SIZE;

/// Floor division that rounds toward negative infinity.
pub fn floor_division(dividend: i32, divisor: i32) -> i32 {
    dividend.div_euclid(divisor)
}

/// Width in ticks covered by one tick array.
pub fn tick_array_width(tick_spacing: u16) -> i32 {
    tick_spacing as i32 * TICK_ARRAY_SIZE as i32
}

/// Start index of the tick array containing `tick_index`.
pub fn tick_array_start_index(tick_index: i32, tick_spacing: u16) -> i32 {
    let width = tick_array_width(tick_spacing);
    floor_division(tick_index, width) * width
}

/// Align `tick_index` to the tick spacing.
///
/// `Some(true)` rounds up, `Some(false)` rounds down, `None` rounds to the
/// nearest initializable tick.
pub fn initializable_tick_index(tick_index: i32, tick_spacing: u16, round_up: Option<bool>) -> i32 {
    let spacing = tick_spacing as i32;
    let remainder = tick_index.rem_euclid(spacing);
    let result = floor_division(tick_index, spacing) * spacing;

    let should_round_up = match round_up {
        Some(round_up) => round_up && remainder > 0,
        None => remainder > 0 && remainder >= spacing / 2,
    };

    if should_round_up {
        result + spacing
    } else {
        result
    }
}

/// First initializable tick strictly above `tick_index`.
pub fn next_initializable_tick_index(tick_index: i32, tick_spacing: u16) -> i32 {
    let spacing = tick_spacing as i32;
    floor_division(tick_index, spacing) * spacing + spacing
}

/// Last initializable tick strictly below `tick_index`.
pub fn prev_initializable_tick_index(tick_index: i32, tick_spacing: u16) -> i32 {
    let spacing = tick_spacing as i32;
    let aligned = floor_division(tick_index, spacing) * spacing;
    if aligned == tick_index {
        aligned - spacing
    } else {
        aligned
    }
}

pub fn is_tick_initializable(tick_index: i32, tick_spacing: u16) -> bool {
    tick_index.rem_euclid(tick_spacing as i32) == 0
}

/// Tick index of the inverted price (B in A).
pub fn invert_tick_index(tick_index: i32) -> i32 {
    -tick_index
}

pub(crate) fn ensure_tick_spacing(tick_spacing: u16) -> Result<(), QuoteError> {
    if tick_spacing == 0 {
        return Err(QuoteError::InvalidTickSpacing { tick_spacing });
    }
    Ok(())
}
