//! Tick Array Addressing
//!
//! Enumerates the tick arrays a swap will traverse, in swap direction, and
//! derives their program addresses. Also decides where an optional fallback
//! array adjacent to the current one is placed.

use serde::{Deserialize, Serialize};
use solana_program::pubkey::Pubkey;

use quoter_core::types::pubkey_string;
use quoter_core::{FallbackPolicy, QuoteError};

use crate::constants::seeds;
use crate::constants::ticks::{MAX_SWAP_TICK_ARRAYS, MAX_TICK_INDEX, MIN_TICK_INDEX};
use crate::tick::{ensure_tick_spacing, floor_division, tick_array_width};

/// A tick array the swap needs, with its derived account address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TickArrayAddress {
    #[serde(with = "pubkey_string")]
    pub address: Pubkey,
    pub start_tick_index: i32,
}

/// Tick arrays for one swap: the fixed slots plus any that only fit in the
/// variable-length supplemental list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapTickArrays {
    pub tick_arrays: Vec<TickArrayAddress>,
    #[serde(default)]
    pub supplemental: Vec<TickArrayAddress>,
}

impl SwapTickArrays {
    pub fn start_indexes(&self) -> Vec<i32> {
        self.tick_arrays
            .iter()
            .chain(self.supplemental.iter())
            .map(|a| a.start_tick_index)
            .collect()
    }
}

/// Program address of the tick array starting at `start_tick_index`.
pub fn tick_array_address(program_id: &Pubkey, pool: &Pubkey, start_tick_index: i32) -> Pubkey {
    let start = start_tick_index.to_string();
    Pubkey::find_program_address(
        &[seeds::TICK_ARRAY, pool.as_ref(), start.as_bytes()],
        program_id,
    )
    .0
}

/// Program address of the adaptive fee oracle for `pool`.
pub fn oracle_address(program_id: &Pubkey, pool: &Pubkey) -> Pubkey {
    Pubkey::find_program_address(&[seeds::ORACLE, pool.as_ref()], program_id).0
}

/// Start index `offset` arrays away from the one containing `tick_index`.
///
/// `None` when that array would lie past the global tick bounds.
pub fn offset_start_tick_index(tick_index: i32, tick_spacing: u16, offset: i32) -> Option<i32> {
    let width = tick_array_width(tick_spacing);
    let start = (floor_division(tick_index, width) + offset) * width;
    let lowest_start = floor_division(MIN_TICK_INDEX, width) * width;
    if start < lowest_start || start > MAX_TICK_INDEX {
        None
    } else {
        Some(start)
    }
}

/// Start indexes of up to `max_arrays` tick arrays a swap starting at
/// `tick_current_index` walks through, in traversal order.
///
/// Near the global tick bounds the list is shorter rather than an error.
pub fn swap_tick_array_start_indexes(
    tick_current_index: i32,
    tick_spacing: u16,
    a_to_b: bool,
    max_arrays: usize,
) -> Result<Vec<i32>, QuoteError> {
    ensure_tick_spacing(tick_spacing)?;

    // a -> b searches at or below the current tick, b -> a strictly above it
    let shift = if a_to_b { 0 } else { tick_spacing as i32 };
    let step = if a_to_b { -1 } else { 1 };

    let mut starts = Vec::with_capacity(max_arrays);
    let mut offset = 0;
    for _ in 0..max_arrays {
        match offset_start_tick_index(tick_current_index + shift, tick_spacing, offset) {
            Some(start) => starts.push(start),
            None => break,
        }
        offset += step;
    }
    Ok(starts)
}

/// Addresses of the tick arrays a swap walks through, in traversal order.
pub fn swap_tick_array_addresses(
    program_id: &Pubkey,
    pool: &Pubkey,
    tick_current_index: i32,
    tick_spacing: u16,
    a_to_b: bool,
    max_arrays: usize,
) -> Result<Vec<TickArrayAddress>, QuoteError> {
    let starts =
        swap_tick_array_start_indexes(tick_current_index, tick_spacing, a_to_b, max_arrays)?;
    Ok(starts
        .into_iter()
        .map(|start_tick_index| TickArrayAddress {
            address: tick_array_address(program_id, pool, start_tick_index),
            start_tick_index,
        })
        .collect())
}

/// The array on the far side of the first traversed array, against the swap
/// direction. Covers a price that moves back across the array edge before
/// the swap lands.
pub fn fallback_start_tick_index(
    first_start_tick_index: i32,
    tick_spacing: u16,
    a_to_b: bool,
) -> Option<i32> {
    let offset = if a_to_b { 1 } else { -1 };
    offset_start_tick_index(first_start_tick_index, tick_spacing, offset)
}

/// Whether the current price sits in the edge tick group of its array,
/// on the side facing the fallback array.
pub fn at_fallback_edge(
    tick_current_index: i32,
    tick_spacing: u16,
    first_start_tick_index: i32,
    a_to_b: bool,
) -> bool {
    if a_to_b {
        tick_current_index + tick_spacing as i32
            >= first_start_tick_index + tick_array_width(tick_spacing)
    } else {
        tick_current_index < first_start_tick_index
    }
}

/// Tick arrays for a swap with the fallback policy applied.
///
/// The fallback array takes a fixed slot when the traversal leaves one free
/// and goes to the supplemental list otherwise.
pub fn swap_tick_arrays_with_fallback(
    program_id: &Pubkey,
    pool: &Pubkey,
    tick_current_index: i32,
    tick_spacing: u16,
    a_to_b: bool,
    policy: FallbackPolicy,
) -> Result<SwapTickArrays, QuoteError> {
    let mut tick_arrays = swap_tick_array_addresses(
        program_id,
        pool,
        tick_current_index,
        tick_spacing,
        a_to_b,
        MAX_SWAP_TICK_ARRAYS,
    )?;
    let mut supplemental = Vec::new();

    let first_start = match tick_arrays.first() {
        Some(first) => first.start_tick_index,
        None => {
            return Ok(SwapTickArrays {
                tick_arrays,
                supplemental,
            })
        }
    };

    let wanted = match policy {
        FallbackPolicy::Never => false,
        FallbackPolicy::Always => true,
        FallbackPolicy::Situational => {
            at_fallback_edge(tick_current_index, tick_spacing, first_start, a_to_b)
        }
    };

    if wanted {
        if let Some(start) = fallback_start_tick_index(first_start, tick_spacing, a_to_b) {
            let fallback = TickArrayAddress {
                address: tick_array_address(program_id, pool, start),
                start_tick_index: start,
            };
            if tick_arrays.len() < MAX_SWAP_TICK_ARRAYS {
                tick_arrays.push(fallback);
            } else {
                supplemental.push(fallback);
            }
            tracing::debug!(
                "Fallback tick array {} for pool {} ({} policy)",
                start,
                pool,
                policy
            );
        }
    }

    Ok(SwapTickArrays {
        tick_arrays,
        supplemental,
    })
}
