//! Adaptive Fee Controller
//!
//! Predicts the oracle's volatility state machine: the reference update at
//! the start of a swap, the accumulator after it, and the dynamic fee-rate
//! component charged on top of the static fee tier.

use num_bigint::BigUint;

use quoter_core::{ProtocolVersion, QuoteError};

use crate::constants::adaptive_fee::{
    ADAPTIVE_FEE_CONTROL_FACTOR_DENOMINATOR, REDUCTION_FACTOR_DENOMINATOR,
    VOLATILITY_ACCUMULATOR_SCALE_FACTOR,
};
use crate::constants::fees::{FEE_RATE_HARD_LIMIT, MAX_FEE_RATE, MAX_PROTOCOL_FEE_RATE};
use crate::price_math::tick_index_to_sqrt_price_x64;
use crate::state::{AdaptiveFeeConstants, AdaptiveFeeVariables, OracleState};
use crate::tick::floor_division;

/// Reject a swap landing before the pool opens for trading.
pub fn check_trade_enabled(trade_enable_timestamp: u64, timestamp: u64) -> Result<(), QuoteError> {
    if timestamp < trade_enable_timestamp {
        return Err(QuoteError::TradeNotEnabled {
            trade_enable_timestamp,
            timestamp,
        });
    }
    Ok(())
}

/// Static fee rate and protocol fee rate must be within their caps.
pub fn validate_fee_rates(fee_rate: u32, protocol_fee_rate: u32) -> Result<(), QuoteError> {
    if fee_rate > MAX_FEE_RATE {
        return Err(QuoteError::FeeRateMaxExceeded {
            fee_rate,
            max: MAX_FEE_RATE,
        });
    }
    if protocol_fee_rate > MAX_PROTOCOL_FEE_RATE {
        return Err(QuoteError::ProtocolFeeRateMaxExceeded {
            protocol_fee_rate,
            max: MAX_PROTOCOL_FEE_RATE,
        });
    }
    Ok(())
}

fn invalid_constants(reason: &str) -> QuoteError {
    QuoteError::InvalidAdaptiveFeeConstants {
        reason: reason.to_string(),
    }
}

impl AdaptiveFeeConstants {
    /// Check the constants against each other and the pool's tick spacing.
    pub fn validate(&self, tick_spacing: u16) -> Result<(), QuoteError> {
        if self.filter_period == 0 {
            return Err(invalid_constants("filter period must be positive"));
        }
        if self.decay_period <= self.filter_period {
            return Err(invalid_constants("decay period must exceed filter period"));
        }
        if self.reduction_factor as u32 >= REDUCTION_FACTOR_DENOMINATOR {
            return Err(invalid_constants("reduction factor must be below 10000"));
        }
        if self.adaptive_fee_control_factor >= ADAPTIVE_FEE_CONTROL_FACTOR_DENOMINATOR {
            return Err(invalid_constants("control factor must be below 100000"));
        }
        if self.tick_group_size == 0
            || self.tick_group_size > tick_spacing
            || tick_spacing % self.tick_group_size != 0
        {
            return Err(invalid_constants("tick group size must divide tick spacing"));
        }
        if self.major_swap_threshold_ticks == 0 {
            return Err(invalid_constants("major swap threshold must be positive"));
        }
        let crossed = self.max_volatility_accumulator as u64 * self.tick_group_size as u64;
        if crossed > u32::MAX as u64 {
            return Err(invalid_constants(
                "max volatility accumulator times tick group size exceeds u32",
            ));
        }
        Ok(())
    }

    /// Tick group holding `tick_index`
    pub fn tick_group_index(&self, tick_index: i32) -> i32 {
        floor_division(tick_index, self.tick_group_size as i32)
    }
}

impl AdaptiveFeeVariables {
    /// Refresh the reference at the start of a swap.
    ///
    /// Elapsed time is measured from the later of the last reference update
    /// and the last major swap. Within the filter period nothing changes;
    /// within the decay period the reference volatility is the reduced
    /// accumulator; past it, or on the first swap, the reference resets.
    pub fn update_reference(
        &mut self,
        tick_group_index: i32,
        timestamp: u64,
        constants: &AdaptiveFeeConstants,
        version: ProtocolVersion,
    ) -> Result<(), QuoteError> {
        let last_update = self
            .last_reference_update_timestamp
            .max(self.last_major_swap_timestamp);
        if timestamp < last_update {
            return Err(QuoteError::InvalidTimestamp {
                timestamp,
                last_update,
            });
        }

        let reference_age = timestamp - self.last_reference_update_timestamp;
        let elapsed = timestamp - last_update;

        if self.last_reference_update_timestamp == 0
            || reference_age > constants.decay_period as u64
        {
            self.reset_reference(tick_group_index, timestamp);
        } else if elapsed < constants.filter_period as u64 {
            return Ok(());
        } else if elapsed < constants.decay_period as u64 {
            self.tick_group_index_reference = tick_group_index;
            self.volatility_reference = (self.volatility_accumulator as u64
                * constants.reduction_factor as u64
                / REDUCTION_FACTOR_DENOMINATOR as u64) as u32;
            self.last_reference_update_timestamp = timestamp;
        } else {
            self.reset_reference(tick_group_index, timestamp);
        }

        if version == ProtocolVersion::V1 {
            self.last_major_swap_timestamp = self.last_reference_update_timestamp;
        }
        Ok(())
    }

    fn reset_reference(&mut self, tick_group_index: i32, timestamp: u64) {
        self.tick_group_index_reference = tick_group_index;
        self.volatility_reference = 0;
        self.last_reference_update_timestamp = timestamp;
    }

    /// `min(max, reference + |reference group - group| * 10_000)`
    pub fn update_volatility_accumulator(
        &mut self,
        tick_group_index: i32,
        constants: &AdaptiveFeeConstants,
    ) {
        let delta =
            (self.tick_group_index_reference as i64 - tick_group_index as i64).unsigned_abs();
        let accumulator = self.volatility_reference as u64
            + delta.saturating_mul(VOLATILITY_ACCUMULATOR_SCALE_FACTOR as u64);
        self.volatility_accumulator =
            accumulator.min(constants.max_volatility_accumulator as u64) as u32;
    }
}

/// Dynamic fee component for the current accumulator, in hundredths of a
/// basis point, capped at the hard limit.
pub fn compute_adaptive_fee_rate(
    constants: &AdaptiveFeeConstants,
    variables: &AdaptiveFeeVariables,
) -> u32 {
    let crossed = variables.volatility_accumulator as u128 * constants.tick_group_size as u128;
    let numerator = constants.adaptive_fee_control_factor as u128 * crossed * crossed;
    let denominator = ADAPTIVE_FEE_CONTROL_FACTOR_DENOMINATOR as u128
        * VOLATILITY_ACCUMULATOR_SCALE_FACTOR as u128
        * VOLATILITY_ACCUMULATOR_SCALE_FACTOR as u128;
    let fee_rate = numerator.div_ceil(denominator);
    fee_rate.min(FEE_RATE_HARD_LIMIT as u128) as u32
}

/// A swap is major when the price moved by at least the threshold ticks.
pub fn is_major_swap(
    sqrt_price_before: u128,
    sqrt_price_after: u128,
    major_swap_threshold_ticks: u16,
) -> Result<bool, QuoteError> {
    let (smaller, larger) = if sqrt_price_before <= sqrt_price_after {
        (sqrt_price_before, sqrt_price_after)
    } else {
        (sqrt_price_after, sqrt_price_before)
    };
    let factor = tick_index_to_sqrt_price_x64(major_swap_threshold_ticks as i32)?;
    let target = (BigUint::from(smaller) * BigUint::from(factor)) >> 64u32;
    Ok(BigUint::from(larger) >= target)
}

/// Fee rate source for one swap: the static tier rate, or the tier rate plus
/// the oracle-driven adaptive component.
#[derive(Debug, Clone)]
pub enum FeeRateController {
    Static {
        static_fee_rate: u32,
    },
    Adaptive {
        static_fee_rate: u32,
        constants: AdaptiveFeeConstants,
        variables: AdaptiveFeeVariables,
        version: ProtocolVersion,
    },
}

impl FeeRateController {
    /// Prepare the fee rate for a swap starting at `tick_current_index`.
    ///
    /// With an oracle this applies the trade gate, refreshes the reference and
    /// sets the accumulator for the starting tick group. The resulting rate is
    /// used for the whole swap.
    pub fn new(
        tick_current_index: i32,
        timestamp: u64,
        static_fee_rate: u32,
        oracle: Option<&OracleState>,
        version: ProtocolVersion,
    ) -> Result<Self, QuoteError> {
        let oracle = match oracle {
            None => return Ok(Self::Static { static_fee_rate }),
            Some(oracle) => oracle,
        };

        check_trade_enabled(oracle.trade_enable_timestamp, timestamp)?;

        let constants = oracle.constants;
        if constants.tick_group_size == 0 {
            return Err(invalid_constants("tick group size must be positive"));
        }
        let tick_group_index = constants.tick_group_index(tick_current_index);
        let mut variables = oracle.variables;
        variables.update_reference(tick_group_index, timestamp, &constants, version)?;
        variables.update_volatility_accumulator(tick_group_index, &constants);

        Ok(Self::Adaptive {
            static_fee_rate,
            constants,
            variables,
            version,
        })
    }

    /// Adaptive component alone
    pub fn adaptive_fee_rate(&self) -> u32 {
        match self {
            Self::Static { .. } => 0,
            Self::Adaptive {
                constants,
                variables,
                ..
            } => compute_adaptive_fee_rate(constants, variables),
        }
    }

    /// Static plus adaptive rate, capped at the hard limit
    pub fn total_fee_rate(&self) -> u32 {
        match self {
            Self::Static { static_fee_rate } => *static_fee_rate,
            Self::Adaptive {
                static_fee_rate, ..
            } => (static_fee_rate + self.adaptive_fee_rate()).min(FEE_RATE_HARD_LIMIT),
        }
    }

    /// Oracle variables the settlement program is expected to write after the
    /// swap ends at `tick_after` / `sqrt_price_after`.
    pub fn next_variables(
        &self,
        sqrt_price_before: u128,
        sqrt_price_after: u128,
        tick_after: i32,
        timestamp: u64,
    ) -> Result<Option<AdaptiveFeeVariables>, QuoteError> {
        match self {
            Self::Static { .. } => Ok(None),
            Self::Adaptive {
                constants,
                variables,
                version,
                ..
            } => {
                let mut next = *variables;
                next.update_volatility_accumulator(
                    constants.tick_group_index(tick_after),
                    constants,
                );
                if *version == ProtocolVersion::V2
                    && is_major_swap(
                        sqrt_price_before,
                        sqrt_price_after,
                        constants.major_swap_threshold_ticks,
                    )?
                {
                    next.last_major_swap_timestamp = timestamp;
                }
                Ok(Some(next))
            }
        }
    }
}

/// Result of running one swap through the adaptive fee state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdaptiveFeeUpdate {
    pub variables: AdaptiveFeeVariables,
    /// Adaptive component charged on the swap
    pub fee_rate_component: u32,
}

/// Predict the oracle update for a swap moving the pool from `tick_before`
/// to `tick_after`.
pub fn simulate_adaptive_fee(
    timestamp: u64,
    tick_before: i32,
    tick_after: i32,
    constants: &AdaptiveFeeConstants,
    variables: &AdaptiveFeeVariables,
    version: ProtocolVersion,
) -> Result<AdaptiveFeeUpdate, QuoteError> {
    let oracle = OracleState {
        trade_enable_timestamp: 0,
        constants: *constants,
        variables: *variables,
    };
    let controller = FeeRateController::new(tick_before, timestamp, 0, Some(&oracle), version)?;
    let sqrt_price_before = tick_index_to_sqrt_price_x64(tick_before)?;
    let sqrt_price_after = tick_index_to_sqrt_price_x64(tick_after)?;
    let fee_rate_component = controller.adaptive_fee_rate();
    let variables = controller
        .next_variables(sqrt_price_before, sqrt_price_after, tick_after, timestamp)?
        .unwrap_or(*variables);
    Ok(AdaptiveFeeUpdate {
        variables,
        fee_rate_component,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn constants() -> AdaptiveFeeConstants {
        AdaptiveFeeConstants {
            filter_period: 30,
            decay_period: 600,
            reduction_factor: 500,
            adaptive_fee_control_factor: 4_000,
            max_volatility_accumulator: 350_000,
            tick_group_size: 64,
            major_swap_threshold_ticks: 64,
        }
    }

    #[test]
    fn test_trade_gate() {
        assert_eq!(
            check_trade_enabled(1_000, 999),
            Err(QuoteError::TradeNotEnabled {
                trade_enable_timestamp: 1_000,
                timestamp: 999
            })
        );
        assert!(check_trade_enabled(1_000, 1_000).is_ok());
        assert!(check_trade_enabled(0, 0).is_ok());
    }

    #[test]
    fn test_fee_rate_caps() {
        assert!(validate_fee_rates(MAX_FEE_RATE, MAX_PROTOCOL_FEE_RATE).is_ok());
        assert_eq!(
            validate_fee_rates(MAX_FEE_RATE + 1, 0),
            Err(QuoteError::FeeRateMaxExceeded {
                fee_rate: MAX_FEE_RATE + 1,
                max: MAX_FEE_RATE
            })
        );
        assert!(matches!(
            validate_fee_rates(3_000, MAX_PROTOCOL_FEE_RATE + 1),
            Err(QuoteError::ProtocolFeeRateMaxExceeded { .. })
        ));
    }

    #[test]
    fn test_constants_validation() {
        assert!(constants().validate(64).is_ok());
        assert!(constants().validate(128).is_ok());
        // group 64 does not divide spacing 32
        assert!(constants().validate(32).is_err());

        let mut c = constants();
        c.decay_period = c.filter_period;
        assert!(c.validate(64).is_err());

        let mut c = constants();
        c.reduction_factor = 10_000;
        assert!(c.validate(64).is_err());

        let mut c = constants();
        c.max_volatility_accumulator = u32::MAX;
        assert!(matches!(
            c.validate(64),
            Err(QuoteError::InvalidAdaptiveFeeConstants { .. })
        ));
    }

    #[test]
    fn test_first_swap_resets_reference() {
        let mut vars = AdaptiveFeeVariables::default();
        vars.update_reference(2, 1_000, &constants(), ProtocolVersion::V2)
            .unwrap();
        assert_eq!(vars.tick_group_index_reference, 2);
        assert_eq!(vars.volatility_reference, 0);
        assert_eq!(vars.last_reference_update_timestamp, 1_000);
        assert_eq!(vars.last_major_swap_timestamp, 0);
    }

    #[test]
    fn test_reference_windows() {
        let c = constants();
        let base = AdaptiveFeeVariables {
            last_reference_update_timestamp: 1_000,
            last_major_swap_timestamp: 1_000,
            volatility_reference: 1_000,
            tick_group_index_reference: 5,
            volatility_accumulator: 40_000,
        };

        // Within the filter period: untouched
        let mut vars = base;
        vars.update_reference(9, 1_010, &c, ProtocolVersion::V2).unwrap();
        assert_eq!(vars, base);

        // Within the decay period: reduced accumulator becomes the reference
        let mut vars = base;
        vars.update_reference(9, 1_100, &c, ProtocolVersion::V2).unwrap();
        assert_eq!(vars.tick_group_index_reference, 9);
        assert_eq!(vars.volatility_reference, 2_000);
        assert_eq!(vars.last_reference_update_timestamp, 1_100);

        // Past the decay period: reset
        let mut vars = base;
        vars.update_reference(9, 2_000, &c, ProtocolVersion::V2).unwrap();
        assert_eq!(vars.volatility_reference, 0);
        assert_eq!(vars.tick_group_index_reference, 9);
    }

    #[test]
    fn test_major_swap_extends_filter_window() {
        let c = constants();
        let mut vars = AdaptiveFeeVariables {
            last_reference_update_timestamp: 1_000,
            last_major_swap_timestamp: 1_090,
            volatility_reference: 0,
            tick_group_index_reference: 0,
            volatility_accumulator: 20_000,
        };
        // 1_100 is 100s after the reference but only 10s after the major swap
        vars.update_reference(3, 1_100, &c, ProtocolVersion::V2).unwrap();
        assert_eq!(vars.tick_group_index_reference, 0);
        assert_eq!(vars.last_reference_update_timestamp, 1_000);
    }

    #[test]
    fn test_timestamp_before_last_update_rejected() {
        let mut vars = AdaptiveFeeVariables {
            last_reference_update_timestamp: 1_000,
            ..AdaptiveFeeVariables::default()
        };
        assert_eq!(
            vars.update_reference(0, 999, &constants(), ProtocolVersion::V2),
            Err(QuoteError::InvalidTimestamp {
                timestamp: 999,
                last_update: 1_000
            })
        );
    }

    #[test]
    fn test_v1_stamps_major_swap_on_reference_update() {
        let mut vars = AdaptiveFeeVariables::default();
        vars.update_reference(1, 500, &constants(), ProtocolVersion::V1)
            .unwrap();
        assert_eq!(vars.last_major_swap_timestamp, 500);
    }

    #[test]
    fn test_accumulator_is_capped() {
        let c = constants();
        let mut vars = AdaptiveFeeVariables {
            volatility_reference: 5_000,
            tick_group_index_reference: 0,
            ..AdaptiveFeeVariables::default()
        };
        vars.update_volatility_accumulator(-3, &c);
        assert_eq!(vars.volatility_accumulator, 35_000);
        vars.update_volatility_accumulator(1_000, &c);
        assert_eq!(vars.volatility_accumulator, c.max_volatility_accumulator);
    }

    #[test]
    fn test_adaptive_fee_rate() {
        let c = constants();
        let mut vars = AdaptiveFeeVariables::default();
        assert_eq!(compute_adaptive_fee_rate(&c, &vars), 0);

        // one group: (10_000 * 64)^2 * 4_000 / 10^13 = 163.84, rounded up
        vars.volatility_accumulator = 10_000;
        assert_eq!(compute_adaptive_fee_rate(&c, &vars), 164);

        vars.volatility_accumulator = c.max_volatility_accumulator;
        assert_eq!(compute_adaptive_fee_rate(&c, &vars), FEE_RATE_HARD_LIMIT);
    }

    #[test]
    fn test_total_fee_rate_is_capped() {
        let oracle = OracleState {
            trade_enable_timestamp: 0,
            constants: constants(),
            variables: AdaptiveFeeVariables {
                last_reference_update_timestamp: 1_000,
                last_major_swap_timestamp: 1_000,
                volatility_reference: 350_000,
                tick_group_index_reference: 0,
                volatility_accumulator: 350_000,
            },
        };
        let controller =
            FeeRateController::new(0, 1_001, 60_000, Some(&oracle), ProtocolVersion::V2).unwrap();
        assert_eq!(controller.total_fee_rate(), FEE_RATE_HARD_LIMIT);

        let controller =
            FeeRateController::new(0, 1_001, 3_000, None, ProtocolVersion::V2).unwrap();
        assert_eq!(controller.total_fee_rate(), 3_000);
        assert_eq!(controller.next_variables(1, 2, 0, 1_001).unwrap(), None);
    }

    #[test]
    fn test_major_swap_threshold() {
        let p0 = tick_index_to_sqrt_price_x64(0).unwrap();
        let p63 = tick_index_to_sqrt_price_x64(63).unwrap();
        let p64 = tick_index_to_sqrt_price_x64(64).unwrap();
        let p70 = tick_index_to_sqrt_price_x64(70).unwrap();
        assert!(!is_major_swap(p0, p63, 64).unwrap());
        assert!(is_major_swap(p70, p0, 64).unwrap());
        assert!(is_major_swap(p0, p64, 64).unwrap());
    }

    #[test]
    fn test_fresh_oracle_single_swap() {
        // Pre-swap tick in group 2, post-swap tick in group -1
        let update = simulate_adaptive_fee(
            1_700_000_000,
            150,
            -10,
            &constants(),
            &AdaptiveFeeVariables::default(),
            ProtocolVersion::V2,
        )
        .unwrap();
        assert_eq!(update.variables.tick_group_index_reference, 2);
        assert_eq!(update.variables.volatility_reference, 0);
        assert_eq!(update.variables.volatility_accumulator, 30_000);
        assert_eq!(update.variables.last_major_swap_timestamp, 1_700_000_000);
        assert_eq!(update.fee_rate_component, 0);
    }

    #[test]
    fn test_v2_minor_swap_keeps_major_timestamp() {
        let update = simulate_adaptive_fee(
            5_000,
            130,
            140,
            &constants(),
            &AdaptiveFeeVariables::default(),
            ProtocolVersion::V2,
        )
        .unwrap();
        assert_eq!(update.variables.last_major_swap_timestamp, 0);
        assert_eq!(update.variables.volatility_accumulator, 0);
    }
}
