use serde::{Deserialize, Serialize};

use crate::error::LoanCalcError;
use crate::fixed_point::{FixedPoint, Scaled, MAX_FIXED_POINT_DIGITS};
use crate::LoanCalcResult;

const MAX_RATE_DECIMALS: u32 = 6;
const TERM_MONTHS_CEILING: i64 = 100_000;

/// How the month-by-month schedule repays principal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleStrategy {
    /// Every month pays the annuity payment; interest accrues on the remaining
    /// balance and the final month absorbs the rounding residual so the
    /// balance closes at exactly zero. This is the canonical strategy.
    #[default]
    LevelPayment,
    /// Every month repays `balance / months remaining` of principal plus
    /// interest on the pre-payment balance. Payments decline over the term.
    PrincipalAmortized,
}

impl std::fmt::Display for ScheduleStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScheduleStrategy::LevelPayment => write!(f, "level_payment"),
            ScheduleStrategy::PrincipalAmortized => write!(f, "principal_amortized"),
        }
    }
}

/// Engine configuration. Built once by the host and handed to
/// `AmortizationEngine::new`; nothing in the core reads process-wide state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Fractional digits of the internal fixed-point scale (12 → 1e-12).
    pub fixed_point_digits: u32,
    /// Fractional digits of the annual rate percent (2 → 550 means 5.50%).
    pub rate_decimals: u32,
    /// Minor units per major currency unit. Must be a power of ten.
    pub minor_units_per_major: i64,
    /// Longest accepted term.
    pub max_term_months: i64,
    pub strategy: ScheduleStrategy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            fixed_point_digits: 12,
            rate_decimals: 2,
            minor_units_per_major: 100,
            max_term_months: 1200,
            strategy: ScheduleStrategy::LevelPayment,
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> LoanCalcResult<()> {
        if self.fixed_point_digits == 0 || self.fixed_point_digits > MAX_FIXED_POINT_DIGITS {
            return Err(invalid_config(
                "fixed_point_digits",
                format!("must be between 1 and {MAX_FIXED_POINT_DIGITS}"),
            ));
        }
        if self.rate_decimals > MAX_RATE_DECIMALS {
            return Err(invalid_config(
                "rate_decimals",
                format!("must be at most {MAX_RATE_DECIMALS}"),
            ));
        }
        if self.minor_unit_decimals().is_none() {
            return Err(invalid_config(
                "minor_units_per_major",
                "must be a positive power of ten (1, 10, 100, ...)",
            ));
        }
        if self.max_term_months < 1 || self.max_term_months > TERM_MONTHS_CEILING {
            return Err(invalid_config(
                "max_term_months",
                format!("must be between 1 and {TERM_MONTHS_CEILING}"),
            ));
        }
        Ok(())
    }

    pub fn fixed_point(&self) -> LoanCalcResult<FixedPoint> {
        FixedPoint::with_digits(self.fixed_point_digits)
    }

    /// Divisor taking a scaled annual percent to a plain monthly fraction:
    /// `100 (percent) × 10^rate_decimals × 12 (months)`.
    pub fn monthly_rate_divisor(&self) -> Scaled {
        1200 * 10i128.pow(self.rate_decimals)
    }

    /// Number of fractional digits in a major unit, if the denomination is a
    /// power of ten.
    pub fn minor_unit_decimals(&self) -> Option<u32> {
        let mut remaining = self.minor_units_per_major;
        if remaining < 1 {
            return None;
        }
        let mut digits = 0;
        while remaining > 1 {
            if remaining % 10 != 0 {
                return None;
            }
            remaining /= 10;
            digits += 1;
        }
        Some(digits)
    }
}

fn invalid_config(field: &str, reason: impl Into<String>) -> LoanCalcError {
    LoanCalcError::InvalidConfig {
        field: field.into(),
        reason: reason.into(),
    }
}
