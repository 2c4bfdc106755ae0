use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::debug;

use super::config::{EngineConfig, ScheduleStrategy};
use super::schedule::{monthly_interest, RepaymentRule, ScheduleEntry, ScheduleIter};
use crate::error::LoanCalcError;
use crate::fixed_point::{scaled_multiply_divide, FixedPoint, Scaled};
use crate::types::{with_metadata, ComputationOutput, MinorUnits, ScaledRate};
use crate::LoanCalcResult;

/// Loan terms, all integers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanInput {
    pub principal_minor_units: MinorUnits,
    /// Annual rate percent × 10^rate_decimals.
    pub annual_rate_scaled: ScaledRate,
    pub term_months: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_payment_date: Option<NaiveDate>,
}

impl LoanInput {
    pub fn new(principal_minor_units: MinorUnits, annual_rate_scaled: ScaledRate, term_months: i64) -> Self {
        Self {
            principal_minor_units,
            annual_rate_scaled,
            term_months,
            first_payment_date: None,
        }
    }

    pub fn with_first_payment_date(mut self, date: NaiveDate) -> Self {
        self.first_payment_date = Some(date);
        self
    }
}

/// Which formula produced the monthly payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentBasis {
    /// Standard annuity formula at a positive rate.
    Annuity,
    /// Zero-rate loan: `ceil(principal / term)` with no interest.
    ZeroInterest,
    /// `balance / months remaining` of principal plus that month's interest.
    EqualPrincipal,
}

/// Full amortization result. Either fully valid or not produced at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanResult {
    pub principal_minor_units: MinorUnits,
    /// Level payment, or the largest scheduled payment under `PrincipalAmortized`.
    pub monthly_payment_minor_units: MinorUnits,
    /// Sum of every scheduled payment.
    pub total_payment_minor_units: MinorUnits,
    pub total_interest_minor_units: MinorUnits,
    pub term_months: i64,
    pub strategy: ScheduleStrategy,
    pub payment_basis: PaymentBasis,
    /// `total_payment − monthly_payment × term`: the rounding residual the
    /// closing payment(s) absorbed. Normally the final payment's deviation from
    /// the level payment; when the rounded-up payment retires the balance
    /// early it also counts the months left with nothing due. Always 0 under
    /// `PrincipalAmortized`.
    pub rounding_residual_minor_units: MinorUnits,
    pub schedule: Vec<ScheduleEntry>,
}

/// Headline figures without the schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanSummary {
    pub principal_minor_units: MinorUnits,
    pub monthly_payment_minor_units: MinorUnits,
    pub total_payment_minor_units: MinorUnits,
    pub total_interest_minor_units: MinorUnits,
    pub term_months: i64,
    pub strategy: ScheduleStrategy,
    pub payment_basis: PaymentBasis,
    pub rounding_residual_minor_units: MinorUnits,
}

impl LoanResult {
    pub fn summary(&self) -> LoanSummary {
        LoanSummary {
            principal_minor_units: self.principal_minor_units,
            monthly_payment_minor_units: self.monthly_payment_minor_units,
            total_payment_minor_units: self.total_payment_minor_units,
            total_interest_minor_units: self.total_interest_minor_units,
            term_months: self.term_months,
            strategy: self.strategy,
            payment_basis: self.payment_basis,
            rounding_residual_minor_units: self.rounding_residual_minor_units,
        }
    }
}

/// Monthly payment before a schedule is generated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaymentQuote {
    pub payment_minor_units: MinorUnits,
    pub basis: PaymentBasis,
    /// Monthly rate at the engine's fixed-point scale.
    pub monthly_rate: Scaled,
}

/// Stateless fixed-rate amortization calculator. Safe to share across
/// threads; every call works only on its own arguments.
#[derive(Debug, Clone)]
pub struct AmortizationEngine {
    config: EngineConfig,
    fixed_point: FixedPoint,
}

impl AmortizationEngine {
    pub fn new(config: EngineConfig) -> LoanCalcResult<Self> {
        config.validate()?;
        let fixed_point = config.fixed_point()?;
        Ok(Self { config, fixed_point })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn fixed_point(&self) -> FixedPoint {
        self.fixed_point
    }

    /// Rejects non-positive principal or term, a negative rate, or a term
    /// beyond the configured maximum.
    pub fn validate(&self, input: &LoanInput) -> LoanCalcResult<()> {
        if input.principal_minor_units <= 0 {
            return Err(LoanCalcError::invalid_input(
                "principal_minor_units",
                "Principal must be positive",
            ));
        }
        if input.annual_rate_scaled < 0 {
            return Err(LoanCalcError::invalid_input(
                "annual_rate_scaled",
                "Annual rate cannot be negative",
            ));
        }
        if input.term_months <= 0 {
            return Err(LoanCalcError::invalid_input(
                "term_months",
                "Term must be at least 1 month",
            ));
        }
        if input.term_months > self.config.max_term_months {
            return Err(LoanCalcError::invalid_input(
                "term_months",
                format!(
                    "Term exceeds the configured maximum of {} months",
                    self.config.max_term_months
                ),
            ));
        }
        Ok(())
    }

    /// `annual% / 100 / 12` at the engine scale, truncated.
    pub fn monthly_rate(&self, annual_rate_scaled: ScaledRate) -> LoanCalcResult<Scaled> {
        let monthly = scaled_multiply_divide(
            Scaled::from(annual_rate_scaled),
            self.fixed_point.scale(),
            self.config.monthly_rate_divisor(),
        )?;
        if annual_rate_scaled > 0 && monthly == 0 {
            return Err(LoanCalcError::degenerate(format!(
                "annual rate {annual_rate_scaled} is below the resolution of {}",
                self.fixed_point.describe()
            )));
        }
        Ok(monthly)
    }

    /// Level monthly payment for validated terms: the annuity payment, or the
    /// ceiling payment of a zero-rate loan.
    pub fn quote(&self, input: &LoanInput) -> LoanCalcResult<PaymentQuote> {
        self.validate(input)?;
        let principal = input.principal_minor_units;
        let term = input.term_months;

        if input.annual_rate_scaled == 0 {
            let payment = principal / term + i64::from(principal % term != 0);
            return Ok(PaymentQuote {
                payment_minor_units: payment,
                basis: PaymentBasis::ZeroInterest,
                monthly_rate: 0,
            });
        }

        let monthly_rate = self.monthly_rate(input.annual_rate_scaled)?;
        let payment = self.annuity_payment(principal, input.annual_rate_scaled, monthly_rate, term)?;
        Ok(PaymentQuote {
            payment_minor_units: payment,
            basis: PaymentBasis::Annuity,
            monthly_rate,
        })
    }

    /// `P × r × g / (g − 1)` with `g = (1 + r)^n`, rounded to the nearest
    /// minor unit.
    fn annuity_payment(
        &self,
        principal: MinorUnits,
        annual_rate_scaled: ScaledRate,
        monthly_rate: Scaled,
        term_months: i64,
    ) -> LoanCalcResult<MinorUnits> {
        let one = self.fixed_point.scale();
        let exponent = u32::try_from(term_months)
            .map_err(|_| LoanCalcError::invalid_input("term_months", "Term is out of range"))?;

        let base = one
            .checked_add(monthly_rate)
            .ok_or_else(|| LoanCalcError::overflow("growth factor base"))?;
        let growth = self.fixed_point.pow(base, exponent)?;
        let growth_excess = growth - one;
        if growth_excess <= 0 {
            return Err(LoanCalcError::degenerate(format!(
                "growth factor (1 + r)^{term_months} did not exceed 1 at {}",
                self.fixed_point.describe()
            )));
        }

        let accrual = Scaled::from(principal)
            .checked_mul(monthly_rate)
            .ok_or_else(|| LoanCalcError::overflow("principal × monthly rate"))?;
        let scaled_payment = scaled_multiply_divide(accrual, growth, growth_excess)?;
        let payment = FixedPoint::to_minor_units(
            self.fixed_point.round(scaled_payment)?,
            "monthly payment",
        )?;

        if payment == 0 {
            return Err(LoanCalcError::degenerate(format!(
                "monthly payment on {principal} minor units rounds to zero"
            )));
        }
        let first_interest = monthly_interest(
            principal,
            Scaled::from(annual_rate_scaled),
            self.config.monthly_rate_divisor(),
        )?;
        if payment <= first_interest {
            return Err(LoanCalcError::degenerate(format!(
                "monthly payment {payment} does not exceed first month interest {first_interest}"
            )));
        }
        Ok(payment)
    }

    /// Lazily generated schedule for the configured strategy.
    pub fn schedule(&self, input: &LoanInput) -> LoanCalcResult<ScheduleIter> {
        let (rule, _) = self.repayment_rule(input)?;
        Ok(self.schedule_for(input, rule))
    }

    /// Only the level strategy prices an annuity payment; principal-amortized
    /// schedules at a positive rate need nothing beyond validated terms.
    fn repayment_rule(&self, input: &LoanInput) -> LoanCalcResult<(RepaymentRule, PaymentBasis)> {
        if input.annual_rate_scaled > 0 && self.config.strategy == ScheduleStrategy::PrincipalAmortized {
            self.validate(input)?;
            return Ok((RepaymentRule::PrincipalAmortized, PaymentBasis::EqualPrincipal));
        }
        let quote = self.quote(input)?;
        let payment = quote.payment_minor_units;
        let rule = match quote.basis {
            PaymentBasis::ZeroInterest => RepaymentRule::ZeroInterest { payment },
            _ => RepaymentRule::Level { payment },
        };
        Ok((rule, quote.basis))
    }

    fn schedule_for(&self, input: &LoanInput, rule: RepaymentRule) -> ScheduleIter {
        ScheduleIter::new(
            Scaled::from(input.annual_rate_scaled),
            self.config.monthly_rate_divisor(),
            rule,
            input.principal_minor_units,
            input.term_months,
            input.first_payment_date,
        )
    }

    /// Validate, price, generate the schedule and aggregate totals.
    pub fn compute(&self, input: &LoanInput) -> LoanCalcResult<LoanResult> {
        let (rule, basis) = self.repayment_rule(input)?;
        debug!(
            principal = input.principal_minor_units,
            rate = input.annual_rate_scaled,
            term = input.term_months,
            strategy = %self.config.strategy,
            ?basis,
            ?rule,
            "computing amortization"
        );

        let schedule: Vec<ScheduleEntry> = self
            .schedule_for(input, rule)
            .collect::<LoanCalcResult<_>>()?;

        let total_payment = schedule.iter().try_fold(0i64, |acc, e| {
            acc.checked_add(e.payment_minor_units)
                .ok_or_else(|| LoanCalcError::overflow("total payment"))
        })?;
        let total_interest = total_payment
            .checked_sub(input.principal_minor_units)
            .ok_or_else(|| LoanCalcError::overflow("total interest"))?;

        let (monthly_payment, residual) = match rule {
            RepaymentRule::Level { payment } | RepaymentRule::ZeroInterest { payment } => {
                let scheduled = payment
                    .checked_mul(input.term_months)
                    .ok_or_else(|| LoanCalcError::overflow("level payment × term"))?;
                (payment, total_payment - scheduled)
            }
            RepaymentRule::PrincipalAmortized => {
                let peak = schedule.iter().map(|e| e.payment_minor_units).max().unwrap_or(0);
                (peak, 0)
            }
        };
        if residual != 0 {
            debug!(residual, "rounding residual reconciled into closing payments");
        }

        Ok(LoanResult {
            principal_minor_units: input.principal_minor_units,
            monthly_payment_minor_units: monthly_payment,
            total_payment_minor_units: total_payment,
            total_interest_minor_units: total_interest,
            term_months: input.term_months,
            strategy: self.config.strategy,
            payment_basis: basis,
            rounding_residual_minor_units: residual,
            schedule,
        })
    }
}

/// Loan terms plus an optional engine configuration, as accepted over JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AmortizationInput {
    #[serde(flatten)]
    pub loan: LoanInput,
    #[serde(default)]
    pub config: EngineConfig,
}

/// Compute a full amortization and wrap it in the standard output envelope.
pub fn compute_amortization(
    input: &AmortizationInput,
) -> LoanCalcResult<ComputationOutput<LoanResult>> {
    let start = Instant::now();
    let engine = AmortizationEngine::new(input.config.clone())?;
    let result = engine.compute(&input.loan)?;
    let warnings = result_warnings(&result);

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        methodology(&result),
        input,
        warnings,
        elapsed,
        engine.fixed_point().describe(),
        result,
    ))
}

/// Payment headline only; the schedule is still walked to produce exact totals.
pub fn quote_payment(input: &AmortizationInput) -> LoanCalcResult<ComputationOutput<LoanSummary>> {
    let start = Instant::now();
    let engine = AmortizationEngine::new(input.config.clone())?;
    let result = engine.compute(&input.loan)?;
    let warnings = result_warnings(&result);

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        methodology(&result),
        input,
        warnings,
        elapsed,
        engine.fixed_point().describe(),
        result.summary(),
    ))
}

fn methodology(result: &LoanResult) -> &'static str {
    match result.payment_basis {
        PaymentBasis::ZeroInterest => "Zero-interest amortization (ceiling principal payments)",
        PaymentBasis::Annuity => {
            "Level-payment annuity amortization (fixed-point payment, truncated interest)"
        }
        PaymentBasis::EqualPrincipal => {
            "Principal-amortized schedule (balance / months remaining, nominal monthly interest)"
        }
    }
}

fn result_warnings(result: &LoanResult) -> Vec<String> {
    let mut warnings = Vec::new();
    if result.rounding_residual_minor_units != 0 {
        warnings.push(format!(
            "Schedule differs from level payment × term by {} minor units; residual reconciled in the closing payment",
            result.rounding_residual_minor_units
        ));
    }
    if result
        .schedule
        .iter()
        .any(|e| e.payment_minor_units == 0)
    {
        warnings.push("Schedule contains months with no payment due".into());
    }
    warnings
}
