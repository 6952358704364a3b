//! Swap Account Lists
//!
//! Shapes the tick array addresses from [`crate::tick_arrays`] into the
//! account lists of the two swap instruction variants. The legacy variant has
//! exactly three tick array slots; the v2 variant adds the oracle and a
//! variable-length supplemental list.

use serde::{Deserialize, Serialize};

use quoter_core::types::{option_pubkey_string, pubkey_string, pubkey_string_vec};
use quoter_core::{Pubkey, QuoteError};

use crate::constants::ticks::MAX_SWAP_TICK_ARRAYS;
use crate::tick_arrays::{SwapTickArrays, TickArrayAddress};

/// Which swap instruction the account list is shaped for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SwapInstructionVariant {
    Legacy,
    V2,
}

impl SwapInstructionVariant {
    /// Supplemental arrays only fit the v2 instruction.
    pub fn for_tick_arrays(arrays: &SwapTickArrays) -> Self {
        if arrays.supplemental.is_empty() {
            Self::Legacy
        } else {
            Self::V2
        }
    }
}

/// Account list ready to hand to a transaction builder
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapAccountList {
    pub variant: SwapInstructionVariant,
    #[serde(with = "pubkey_string")]
    pub pool: Pubkey,
    #[serde(with = "pubkey_string_vec")]
    pub tick_arrays: Vec<Pubkey>,
    #[serde(default, with = "option_pubkey_string")]
    pub oracle: Option<Pubkey>,
    #[serde(default, with = "pubkey_string_vec")]
    pub supplemental_tick_arrays: Vec<Pubkey>,
}

/// Common interface of the per-variant account builders
pub trait SwapAccountsBuilder {
    fn variant(&self) -> SwapInstructionVariant;

    /// The fixed tick array slots, always exactly three
    fn tick_array_slots(&self) -> [Pubkey; MAX_SWAP_TICK_ARRAYS];

    fn account_list(&self) -> SwapAccountList;
}

/// Fill the fixed slots, repeating the last array when fewer are supplied.
fn fill_slots(arrays: &[TickArrayAddress]) -> Result<[Pubkey; MAX_SWAP_TICK_ARRAYS], QuoteError> {
    let last = arrays
        .last()
        .ok_or_else(|| QuoteError::InvalidTickArraySequence {
            reason: "no tick arrays to place in swap slots".to_string(),
        })?;
    if arrays.len() > MAX_SWAP_TICK_ARRAYS {
        return Err(QuoteError::InvalidTickArraySequence {
            reason: format!(
                "{} tick arrays do not fit {} swap slots",
                arrays.len(),
                MAX_SWAP_TICK_ARRAYS
            ),
        });
    }

    let mut slots = [last.address; MAX_SWAP_TICK_ARRAYS];
    for (slot, array) in slots.iter_mut().zip(arrays) {
        *slot = array.address;
    }
    Ok(slots)
}

// ---------------------------------------------------------------------------
// Legacy
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct LegacySwapAccounts {
    pool: Pubkey,
    slots: [Pubkey; MAX_SWAP_TICK_ARRAYS],
}

impl LegacySwapAccounts {
    pub fn new(pool: Pubkey, arrays: &SwapTickArrays) -> Result<Self, QuoteError> {
        if !arrays.supplemental.is_empty() {
            return Err(QuoteError::InvalidTickArraySequence {
                reason: "legacy swap takes no supplemental tick arrays".to_string(),
            });
        }
        Ok(Self {
            pool,
            slots: fill_slots(&arrays.tick_arrays)?,
        })
    }
}

impl SwapAccountsBuilder for LegacySwapAccounts {
    fn variant(&self) -> SwapInstructionVariant {
        SwapInstructionVariant::Legacy
    }

    fn tick_array_slots(&self) -> [Pubkey; MAX_SWAP_TICK_ARRAYS] {
        self.slots
    }

    fn account_list(&self) -> SwapAccountList {
        SwapAccountList {
            variant: self.variant(),
            pool: self.pool,
            tick_arrays: self.slots.to_vec(),
            oracle: None,
            supplemental_tick_arrays: Vec::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// V2
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct SwapV2Accounts {
    pool: Pubkey,
    slots: [Pubkey; MAX_SWAP_TICK_ARRAYS],
    oracle: Option<Pubkey>,
    supplemental: Vec<Pubkey>,
}

impl SwapV2Accounts {
    pub fn new(
        pool: Pubkey,
        arrays: &SwapTickArrays,
        oracle: Option<Pubkey>,
    ) -> Result<Self, QuoteError> {
        Ok(Self {
            pool,
            slots: fill_slots(&arrays.tick_arrays)?,
            oracle,
            supplemental: arrays.supplemental.iter().map(|a| a.address).collect(),
        })
    }
}

impl SwapAccountsBuilder for SwapV2Accounts {
    fn variant(&self) -> SwapInstructionVariant {
        SwapInstructionVariant::V2
    }

    fn tick_array_slots(&self) -> [Pubkey; MAX_SWAP_TICK_ARRAYS] {
        self.slots
    }

    fn account_list(&self) -> SwapAccountList {
        SwapAccountList {
            variant: self.variant(),
            pool: self.pool,
            tick_arrays: self.slots.to_vec(),
            oracle: self.oracle,
            supplemental_tick_arrays: self.supplemental.clone(),
        }
    }
}

/// Pick the instruction variant the arrays need and build its account list.
///
/// The oracle is only carried by the v2 variant.
pub fn build_swap_accounts(
    pool: Pubkey,
    arrays: &SwapTickArrays,
    oracle: Option<Pubkey>,
) -> Result<SwapAccountList, QuoteError> {
    let variant = SwapInstructionVariant::for_tick_arrays(arrays);
    let builder: Box<dyn SwapAccountsBuilder> = match variant {
        SwapInstructionVariant::Legacy => Box::new(LegacySwapAccounts::new(pool, arrays)?),
        SwapInstructionVariant::V2 => Box::new(SwapV2Accounts::new(pool, arrays, oracle)?),
    };
    Ok(builder.account_list())
}
