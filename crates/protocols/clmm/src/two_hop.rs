//! Two-Hop Quotes
//!
//! Chains two single-pool quotes through an intermediate token.

use serde::{Deserialize, Serialize};

use quoter_core::types::{pubkey_string, pubkey_string_vec};
use quoter_core::{ProtocolVersion, Pubkey, QuoteError};

use crate::state::{OracleState, PoolState, SwapQuote, SwapQuoteParams, TickArray};
use crate::swap_quote::swap_quote;

/// Snapshot of one hop's pool and its accounts
#[derive(Debug, Clone, Copy)]
pub struct HopSnapshot<'a> {
    pub pool: &'a PoolState,
    pub tick_arrays: &'a [TickArray],
    pub oracle: Option<&'a OracleState>,
}

/// Request for a routed swap through two pools
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TwoHopQuoteParams {
    pub amount: u64,
    pub a_to_b_one: bool,
    pub a_to_b_two: bool,
    #[serde(default)]
    pub slippage_tolerance_bps: u16,
    #[serde(default)]
    pub timestamp: u64,
    #[serde(default)]
    pub protocol_version: ProtocolVersion,
    #[serde(with = "pubkey_string")]
    pub program_id: Pubkey,
}

impl TwoHopQuoteParams {
    fn hop(&self, amount: u64, a_to_b: bool, amount_specified_is_input: bool) -> SwapQuoteParams {
        SwapQuoteParams {
            amount,
            a_to_b,
            amount_specified_is_input,
            sqrt_price_limit: 0,
            slippage_tolerance_bps: self.slippage_tolerance_bps,
            timestamp: self.timestamp,
            protocol_version: self.protocol_version,
            program_id: self.program_id,
        }
    }
}

/// Two chained quotes with validated continuity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TwoHopSwapQuote {
    pub quote_one: SwapQuote,
    pub quote_two: SwapQuote,
    pub amount_specified_is_input: bool,
    #[serde(with = "pubkey_string")]
    pub input_mint: Pubkey,
    #[serde(with = "pubkey_string")]
    pub intermediate_mint: Pubkey,
    #[serde(with = "pubkey_string")]
    pub output_mint: Pubkey,
    pub estimated_amount_in: u64,
    pub estimated_amount_out: u64,
    /// Minimum final output for exact input, maximum first input otherwise
    pub other_amount_threshold: u64,
    /// Both hops' tick arrays, de-duplicated by address
    #[serde(with = "pubkey_string_vec")]
    pub tick_arrays: Vec<Pubkey>,
    /// Both hops' oracles, de-duplicated by address
    #[serde(with = "pubkey_string_vec")]
    pub oracles: Vec<Pubkey>,
}

impl TwoHopSwapQuote {
    /// Combine two quotes where hop one's output feeds hop two's input.
    pub fn from_quotes(quote_one: SwapQuote, quote_two: SwapQuote) -> Result<Self, QuoteError> {
        if quote_one.amount_specified_is_input != quote_two.amount_specified_is_input {
            return Err(QuoteError::SwapModeMismatch);
        }
        if quote_one.output_mint != quote_two.input_mint {
            return Err(QuoteError::IntermediateTokenMismatch {
                hop_one_output: quote_one.output_mint.to_string(),
                hop_two_input: quote_two.input_mint.to_string(),
            });
        }
        if quote_one.estimated_amount_out != quote_two.estimated_amount_in {
            return Err(QuoteError::IntermediateAmountMismatch {
                hop_one_output: quote_one.estimated_amount_out,
                hop_two_input: quote_two.estimated_amount_in,
            });
        }

        let amount_specified_is_input = quote_one.amount_specified_is_input;
        let other_amount_threshold = if amount_specified_is_input {
            quote_two.other_amount_threshold
        } else {
            quote_one.other_amount_threshold
        };

        let mut tick_arrays: Vec<Pubkey> = Vec::new();
        for address in quote_one.tick_arrays.iter().chain(quote_two.tick_arrays.iter()) {
            if !tick_arrays.contains(address) {
                tick_arrays.push(*address);
            }
        }
        let mut oracles: Vec<Pubkey> = Vec::new();
        for address in [quote_one.oracle_address, quote_two.oracle_address]
            .into_iter()
            .flatten()
        {
            if !oracles.contains(&address) {
                oracles.push(address);
            }
        }

        Ok(Self {
            amount_specified_is_input,
            input_mint: quote_one.input_mint,
            intermediate_mint: quote_one.output_mint,
            output_mint: quote_two.output_mint,
            estimated_amount_in: quote_one.estimated_amount_in,
            estimated_amount_out: quote_two.estimated_amount_out,
            other_amount_threshold,
            tick_arrays,
            oracles,
            quote_one,
            quote_two,
        })
    }
}

/// Quote an exact input routed through two pools, hop one first.
pub fn quote_two_hop_by_input(
    hop_one: HopSnapshot<'_>,
    hop_two: HopSnapshot<'_>,
    params: &TwoHopQuoteParams,
) -> Result<TwoHopSwapQuote, QuoteError> {
    let quote_one = swap_quote(
        hop_one.pool,
        hop_one.tick_arrays,
        hop_one.oracle,
        &params.hop(params.amount, params.a_to_b_one, true),
    )?;
    let quote_two = swap_quote(
        hop_two.pool,
        hop_two.tick_arrays,
        hop_two.oracle,
        &params.hop(quote_one.estimated_amount_out, params.a_to_b_two, true),
    )?;
    TwoHopSwapQuote::from_quotes(quote_one, quote_two)
}

/// Quote an exact output routed through two pools. Hop two runs first and
/// its required input becomes hop one's output target.
pub fn quote_two_hop_by_output(
    hop_one: HopSnapshot<'_>,
    hop_two: HopSnapshot<'_>,
    params: &TwoHopQuoteParams,
) -> Result<TwoHopSwapQuote, QuoteError> {
    let quote_two = swap_quote(
        hop_two.pool,
        hop_two.tick_arrays,
        hop_two.oracle,
        &params.hop(params.amount, params.a_to_b_two, false),
    )?;
    let quote_one = swap_quote(
        hop_one.pool,
        hop_one.tick_arrays,
        hop_one.oracle,
        &params.hop(quote_two.estimated_amount_in, params.a_to_b_one, false),
    )?;
    TwoHopSwapQuote::from_quotes(quote_one, quote_two)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::price_math::tick_index_to_sqrt_price_x64;

    fn pool(mint_a: Pubkey, mint_b: Pubkey) -> PoolState {
        PoolState {
            address: Pubkey::new_unique(),
            token_mint_a: mint_a,
            token_mint_b: mint_b,
            sqrt_price: tick_index_to_sqrt_price_x64(0).unwrap(),
            tick_current_index: 0,
            liquidity: 10_000_000_000,
            tick_spacing: 64,
            fee_rate: 3_000,
            protocol_fee_rate: 0,
            fee_growth_global_a: 0,
            fee_growth_global_b: 0,
        }
    }

    fn arrays(pool: &PoolState) -> Vec<TickArray> {
        [-11264, -5632, 0, 5632, 11264]
            .iter()
            .map(|&s| TickArray::uninitialized(pool.address, s))
            .collect()
    }

    fn params(amount: u64, a_to_b_one: bool, a_to_b_two: bool) -> TwoHopQuoteParams {
        TwoHopQuoteParams {
            amount,
            a_to_b_one,
            a_to_b_two,
            slippage_tolerance_bps: 50,
            timestamp: 0,
            protocol_version: ProtocolVersion::V2,
            program_id: Pubkey::new_unique(),
        }
    }

    #[test]
    fn test_two_hop_by_input() {
        let (x, y, z) = (Pubkey::new_unique(), Pubkey::new_unique(), Pubkey::new_unique());
        // x/y pool swapped a -> b, then z/y pool swapped b -> a
        let pool_one = pool(x, y);
        let pool_two = pool(z, y);
        let (arrays_one, arrays_two) = (arrays(&pool_one), arrays(&pool_two));
        let hop_one = HopSnapshot {
            pool: &pool_one,
            tick_arrays: &arrays_one,
            oracle: None,
        };
        let hop_two = HopSnapshot {
            pool: &pool_two,
            tick_arrays: &arrays_two,
            oracle: None,
        };

        let quote =
            quote_two_hop_by_input(hop_one, hop_two, &params(100_000, true, false)).unwrap();
        assert_eq!(quote.input_mint, x);
        assert_eq!(quote.intermediate_mint, y);
        assert_eq!(quote.output_mint, z);
        assert_eq!(quote.estimated_amount_in, 100_000);
        assert_eq!(quote.estimated_amount_out, quote.quote_two.estimated_amount_out);
        assert_eq!(quote.other_amount_threshold, quote.quote_two.other_amount_threshold);
        assert_eq!(
            quote.tick_arrays.len(),
            quote.quote_one.tick_arrays.len() + quote.quote_two.tick_arrays.len()
        );
        assert!(quote.oracles.is_empty());
    }

    #[test]
    fn test_two_hop_by_output() {
        let (x, y, z) = (Pubkey::new_unique(), Pubkey::new_unique(), Pubkey::new_unique());
        let pool_one = pool(x, y);
        let pool_two = pool(y, z);
        let (arrays_one, arrays_two) = (arrays(&pool_one), arrays(&pool_two));
        let hop_one = HopSnapshot {
            pool: &pool_one,
            tick_arrays: &arrays_one,
            oracle: None,
        };
        let hop_two = HopSnapshot {
            pool: &pool_two,
            tick_arrays: &arrays_two,
            oracle: None,
        };

        let quote = quote_two_hop_by_output(hop_one, hop_two, &params(50_000, true, true)).unwrap();
        assert!(!quote.amount_specified_is_input);
        assert_eq!(quote.estimated_amount_out, 50_000);
        assert_eq!(
            quote.quote_one.estimated_amount_out,
            quote.quote_two.estimated_amount_in
        );
        assert_eq!(quote.other_amount_threshold, quote.quote_one.other_amount_threshold);
        assert!(quote.estimated_amount_in > 50_000);
    }

    #[test]
    fn test_from_quotes_checks_continuity() {
        let (x, y, z) = (Pubkey::new_unique(), Pubkey::new_unique(), Pubkey::new_unique());
        let pool_one = pool(x, y);
        let pool_two = pool(y, z);
        let (arrays_one, arrays_two) = (arrays(&pool_one), arrays(&pool_two));
        let p = params(10_000, true, true);

        let one = swap_quote(&pool_one, &arrays_one, None, &p.hop(10_000, true, true)).unwrap();
        let two = swap_quote(
            &pool_two,
            &arrays_two,
            None,
            &p.hop(one.estimated_amount_out + 1, true, true),
        )
        .unwrap();
        assert!(matches!(
            TwoHopSwapQuote::from_quotes(one.clone(), two),
            Err(QuoteError::IntermediateAmountMismatch { .. })
        ));

        // Hop two in the wrong direction takes z, not y
        let two = swap_quote(
            &pool_two,
            &arrays_two,
            None,
            &p.hop(one.estimated_amount_out, false, true),
        )
        .unwrap();
        assert!(matches!(
            TwoHopSwapQuote::from_quotes(one, two),
            Err(QuoteError::IntermediateTokenMismatch { .. })
        ));
    }

    #[test]
    fn test_from_quotes_rejects_mixed_modes() {
        let (x, y, z) = (Pubkey::new_unique(), Pubkey::new_unique(), Pubkey::new_unique());
        let pool_one = pool(x, y);
        let pool_two = pool(y, z);
        let (arrays_one, arrays_two) = (arrays(&pool_one), arrays(&pool_two));
        let p = params(10_000, true, true);

        let one = swap_quote(&pool_one, &arrays_one, None, &p.hop(10_000, true, true)).unwrap();
        let exact_out = one.estimated_amount_out / 2;
        let mut two =
            swap_quote(&pool_two, &arrays_two, None, &p.hop(exact_out, true, false)).unwrap();
        // Continuity holds, only the mode differs
        two.estimated_amount_in = one.estimated_amount_out;

        assert_eq!(
            TwoHopSwapQuote::from_quotes(one.clone(), two.clone()).unwrap_err(),
            QuoteError::SwapModeMismatch
        );
        assert_eq!(
            TwoHopSwapQuote::from_quotes(two, one).unwrap_err(),
            QuoteError::SwapModeMismatch
        );
    }

    #[test]
    fn test_account_lists_are_deduplicated() {
        let (x, y) = (Pubkey::new_unique(), Pubkey::new_unique());
        let pool_one = pool(x, y);
        let arrays_one = arrays(&pool_one);
        let p = params(10_000, true, false);

        let one = swap_quote(&pool_one, &arrays_one, None, &p.hop(10_000, true, true)).unwrap();
        let mut two = one.clone();
        two.input_mint = one.output_mint;
        two.output_mint = x;
        two.estimated_amount_in = one.estimated_amount_out;
        two.oracle_address = Some(Pubkey::new_unique());

        let quote = TwoHopSwapQuote::from_quotes(one.clone(), two).unwrap();
        assert_eq!(quote.tick_arrays, one.tick_arrays);
        assert_eq!(quote.oracles.len(), 1);
    }
}
