//! Tick Array Sequence
//!
//! A contiguous, sorted run of loaded tick arrays that the swap engine walks
//! to find initialized ticks in either direction.

use quoter_core::{Pubkey, QuoteError};

use crate::state::{Tick, TickArray};
use crate::tick::{
    ensure_tick_spacing, initializable_tick_index, next_initializable_tick_index,
    prev_initializable_tick_index, tick_array_start_index, tick_array_width,
};

/// Loaded tick arrays ordered by start index, with no gaps.
#[derive(Debug)]
pub struct TickArraySequence<'a> {
    arrays: Vec<&'a TickArray>,
    tick_spacing: u16,
}

impl<'a> TickArraySequence<'a> {
    /// Sort, de-duplicate and validate the supplied arrays.
    ///
    /// Fails with `InvalidTickArraySequence` when the list is empty or when
    /// any array belongs to another pool, is misaligned or leaves a gap.
    pub fn new(
        arrays: &'a [TickArray],
        pool: &Pubkey,
        tick_spacing: u16,
    ) -> Result<Self, QuoteError> {
        ensure_tick_spacing(tick_spacing)?;
        let width = tick_array_width(tick_spacing);

        if let Some(foreign) = arrays.iter().find(|a| a.pool != *pool) {
            return Err(QuoteError::InvalidTickArraySequence {
                reason: format!(
                    "tick array at {} belongs to pool {}, not {}",
                    foreign.start_tick_index, foreign.pool, pool
                ),
            });
        }

        let mut sorted: Vec<&TickArray> = arrays.iter().collect();
        sorted.sort_by_key(|a| a.start_tick_index);
        sorted.dedup_by_key(|a| a.start_tick_index);

        if sorted.is_empty() {
            return Err(QuoteError::InvalidTickArraySequence {
                reason: "no tick arrays supplied".to_string(),
            });
        }

        for array in &sorted {
            if array.start_tick_index.rem_euclid(width) != 0 {
                return Err(QuoteError::InvalidTickArraySequence {
                    reason: format!(
                        "start index {} is not a multiple of {}",
                        array.start_tick_index, width
                    ),
                });
            }
        }

        for pair in sorted.windows(2) {
            if pair[1].start_tick_index != pair[0].start_tick_index + width {
                return Err(QuoteError::InvalidTickArraySequence {
                    reason: format!(
                        "gap between start indexes {} and {}",
                        pair[0].start_tick_index, pair[1].start_tick_index
                    ),
                });
            }
        }

        Ok(Self {
            arrays: sorted,
            tick_spacing,
        })
    }

    pub fn tick_spacing(&self) -> u16 {
        self.tick_spacing
    }

    /// First tick index covered
    pub fn start_index(&self) -> i32 {
        self.arrays[0].start_tick_index
    }

    /// Last tick index covered
    pub fn end_index(&self) -> i32 {
        let last = self.arrays[self.arrays.len() - 1];
        last.start_tick_index + tick_array_width(self.tick_spacing) - 1
    }

    /// Start indexes of every array in the sequence
    pub fn start_indexes(&self) -> Vec<i32> {
        self.arrays.iter().map(|a| a.start_tick_index).collect()
    }

    /// Start index of the array a search from `tick_index` reads.
    ///
    /// b -> a searches begin one initializable tick above `tick_index`, so a
    /// tick in the last group of an array searches the next array.
    pub fn search_array_start(&self, tick_index: i32, a_to_b: bool) -> i32 {
        let first = if a_to_b {
            tick_index
        } else {
            next_initializable_tick_index(tick_index, self.tick_spacing)
        };
        tick_array_start_index(first, self.tick_spacing)
    }

    fn contains_array(&self, start_tick_index: i32) -> bool {
        start_tick_index >= self.start_index() && start_tick_index <= self.end_index()
    }

    /// Tick stored at an initializable `tick_index`
    pub fn tick(&self, tick_index: i32) -> Result<&'a Tick, QuoteError> {
        let width = tick_array_width(self.tick_spacing);
        if tick_index < self.start_index() || tick_index > self.end_index() {
            return Err(QuoteError::TickArrayOutOfRange { tick_index });
        }

        let array_index = ((tick_index - self.start_index()) / width) as usize;
        let array = self.arrays[array_index];
        let offset = ((tick_index - array.start_tick_index) / self.tick_spacing as i32) as usize;
        array
            .ticks
            .get(offset)
            .ok_or(QuoteError::TickArrayOutOfRange { tick_index })
    }

    /// Nearest initialized tick strictly above `tick_index` (b -> a),
    /// searching one array only.
    ///
    /// Returns the array's last initializable tick with no tick when nothing
    /// above is initialized.
    pub fn next_initialized_tick(
        &self,
        tick_index: i32,
    ) -> Result<(Option<&'a Tick>, i32), QuoteError> {
        let array_start = self.search_array_start(tick_index, false);
        if !self.contains_array(array_start) {
            return Err(QuoteError::TickArrayOutOfRange { tick_index });
        }
        let last = array_start + tick_array_width(self.tick_spacing) - self.tick_spacing as i32;

        let mut next_index = next_initializable_tick_index(tick_index, self.tick_spacing);
        while next_index <= last {
            let tick = self.tick(next_index)?;
            if tick.initialized {
                return Ok((Some(tick), next_index));
            }
            next_index = next_initializable_tick_index(next_index, self.tick_spacing);
        }
        Ok((None, last))
    }

    /// Nearest initialized tick at or below `tick_index` (a -> b), searching
    /// one array only.
    ///
    /// Returns the array's start with no tick when nothing at or below is
    /// initialized.
    pub fn prev_initialized_tick(
        &self,
        tick_index: i32,
    ) -> Result<(Option<&'a Tick>, i32), QuoteError> {
        let array_start = self.search_array_start(tick_index, true);
        if !self.contains_array(array_start) {
            return Err(QuoteError::TickArrayOutOfRange { tick_index });
        }

        let mut prev_index = initializable_tick_index(tick_index, self.tick_spacing, Some(false));
        while prev_index >= array_start {
            let tick = self.tick(prev_index)?;
            if tick.initialized {
                return Ok((Some(tick), prev_index));
            }
            prev_index = prev_initializable_tick_index(prev_index, self.tick_spacing);
        }
        Ok((None, array_start))
    }
}
