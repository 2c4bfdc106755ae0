//! Conversion of human-entered decimal strings into integer loan terms.
//!
//! Hosts (a form handler, the CLI) receive `amount`, `rate` and `years` as
//! text. Parsing goes through `rust_decimal` so no binary floating point ever
//! touches a monetary value, and anything with more precision than the engine
//! represents is rejected rather than silently rounded.

use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::amortization::{EngineConfig, LoanInput};
use crate::error::LoanCalcError;
use crate::LoanCalcResult;

/// Loan terms as entered by a user.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoanRequest {
    /// Principal in major currency units, e.g. "25000.00".
    pub amount: String,
    /// Annual rate in percent, e.g. "5.5".
    pub rate: String,
    /// Term in whole years. Mutually exclusive with `months`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub years: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub months: Option<String>,
    /// ISO date of the first payment, e.g. "2025-02-01".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_payment_date: Option<String>,
}

impl LoanRequest {
    pub fn new(amount: impl Into<String>, rate: impl Into<String>, years: impl Into<String>) -> Self {
        Self {
            amount: amount.into(),
            rate: rate.into(),
            years: Some(years.into()),
            ..Self::default()
        }
    }

    pub fn to_loan_input(&self, config: &EngineConfig) -> LoanCalcResult<LoanInput> {
        config.validate()?;
        let minor_digits = config.minor_unit_decimals().unwrap_or(0);

        let amount = parse_decimal("amount", &self.amount)?;
        if amount <= Decimal::ZERO {
            return Err(LoanCalcError::invalid_input("amount", "Amount must be positive"));
        }
        let principal = scale_exact("amount", amount, minor_digits)?;

        let rate = parse_decimal("rate", &self.rate)?;
        if rate < Decimal::ZERO {
            return Err(LoanCalcError::invalid_input("rate", "Rate cannot be negative"));
        }
        let annual_rate_scaled = scale_exact("rate", rate, config.rate_decimals)?;

        let term_months = match (&self.years, &self.months) {
            (Some(_), Some(_)) => {
                return Err(LoanCalcError::invalid_input(
                    "years",
                    "Provide either years or months, not both",
                ))
            }
            (Some(years), None) => parse_whole("years", years)?
                .checked_mul(12)
                .ok_or_else(|| LoanCalcError::invalid_input("years", "Term is too long"))?,
            (None, Some(months)) => parse_whole("months", months)?,
            (None, None) => {
                return Err(LoanCalcError::invalid_input(
                    "years",
                    "A term in years or months is required",
                ))
            }
        };

        let first_payment_date = self
            .first_payment_date
            .as_deref()
            .map(|raw| {
                NaiveDate::from_str(raw.trim()).map_err(|e| {
                    LoanCalcError::invalid_input("first_payment_date", format!("'{raw}': {e}"))
                })
            })
            .transpose()?;

        Ok(LoanInput {
            principal_minor_units: principal,
            annual_rate_scaled,
            term_months,
            first_payment_date,
        })
    }
}

fn parse_decimal(field: &str, raw: &str) -> LoanCalcResult<Decimal> {
    Decimal::from_str(raw.trim())
        .map_err(|e| LoanCalcError::invalid_input(field, format!("'{raw}' is not a number: {e}")))
}

/// Multiply by `10^digits` and require the result to be a whole `i64`.
fn scale_exact(field: &str, value: Decimal, digits: u32) -> LoanCalcResult<i64> {
    let normalized = value.normalize();
    if normalized.scale() > digits {
        return Err(LoanCalcError::invalid_input(
            field,
            format!("'{value}' has more than {digits} decimal places"),
        ));
    }
    let factor = Decimal::from(10i64.pow(digits));
    normalized
        .checked_mul(factor)
        .and_then(|scaled| scaled.to_i64())
        .ok_or_else(|| LoanCalcError::invalid_input(field, format!("'{value}' is too large")))
}

fn parse_whole(field: &str, raw: &str) -> LoanCalcResult<i64> {
    let value = parse_decimal(field, raw)?;
    if value.normalize().scale() != 0 {
        return Err(LoanCalcError::invalid_input(
            field,
            format!("'{raw}' must be a whole number"),
        ));
    }
    if value <= Decimal::ZERO {
        return Err(LoanCalcError::invalid_input(field, "Term must be positive"));
    }
    value
        .to_i64()
        .ok_or_else(|| LoanCalcError::invalid_input(field, format!("'{raw}' is too large")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> EngineConfig {
        EngineConfig::default()
    }

    #[test]
    fn test_parse_original_terms() {
        let input = LoanRequest::new("25000.00", "5.50", "5")
            .to_loan_input(&config())
            .unwrap();
        assert_eq!(input, LoanInput::new(2_500_000, 550, 60));
    }

    #[test]
    fn test_parse_trims_and_accepts_short_fractions() {
        let input = LoanRequest::new(" 1234.5 ", "7", "30")
            .to_loan_input(&config())
            .unwrap();
        assert_eq!(input.principal_minor_units, 123_450);
        assert_eq!(input.annual_rate_scaled, 700);
        assert_eq!(input.term_months, 360);
    }

    #[test]
    fn test_zero_rate_accepted() {
        let input = LoanRequest::new("10000", "0", "1")
            .to_loan_input(&config())
            .unwrap();
        assert_eq!(input.annual_rate_scaled, 0);
    }

    #[test]
    fn test_months_instead_of_years() {
        let request = LoanRequest {
            amount: "100".into(),
            rate: "1".into(),
            months: Some("18".into()),
            first_payment_date: Some("2025-03-15".into()),
            ..LoanRequest::default()
        };
        let input = request.to_loan_input(&config()).unwrap();
        assert_eq!(input.term_months, 18);
        assert_eq!(input.first_payment_date, NaiveDate::from_ymd_opt(2025, 3, 15));
    }

    #[test]
    fn test_rejections_name_the_field() {
        let cases = [
            (LoanRequest::new("abc", "5", "5"), "amount"),
            (LoanRequest::new("0", "5", "5"), "amount"),
            (LoanRequest::new("-10", "5", "5"), "amount"),
            (LoanRequest::new("10.001", "5", "5"), "amount"),
            (LoanRequest::new("10", "-1", "5"), "rate"),
            (LoanRequest::new("10", "5.125", "5"), "rate"),
            (LoanRequest::new("10", "five", "5"), "rate"),
            (LoanRequest::new("10", "5", "0"), "years"),
            (LoanRequest::new("10", "5", "2.5"), "years"),
            (LoanRequest::new("10", "5", ""), "years"),
        ];
        for (request, field) in cases {
            let err = request.to_loan_input(&config()).unwrap_err();
            assert!(
                matches!(err, LoanCalcError::InvalidInput { .. }),
                "expected InvalidInput for {request:?}"
            );
            assert_eq!(err.field(), Some(field), "wrong field for {request:?}");
        }
    }

    #[test]
    fn test_missing_term_rejected() {
        let request = LoanRequest {
            amount: "10".into(),
            rate: "5".into(),
            ..LoanRequest::default()
        };
        assert!(request.to_loan_input(&config()).is_err());
    }

    #[test]
    fn test_bad_date_rejected() {
        let request = LoanRequest {
            first_payment_date: Some("2025-13-01".into()),
            ..LoanRequest::new("10", "5", "1")
        };
        let err = request.to_loan_input(&config()).unwrap_err();
        assert_eq!(err.field(), Some("first_payment_date"));
    }

    #[test]
    fn test_whole_unit_currency() {
        let whole = EngineConfig {
            minor_units_per_major: 1,
            ..EngineConfig::default()
        };
        let input = LoanRequest::new("5000", "3", "2").to_loan_input(&whole).unwrap();
        assert_eq!(input.principal_minor_units, 5000);
        assert!(LoanRequest::new("5000.5", "3", "2").to_loan_input(&whole).is_err());
    }
}
