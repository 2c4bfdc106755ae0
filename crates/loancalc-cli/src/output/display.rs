use loancalc_core::amortization::{LoanResult, LoanSummary, PaymentBasis, ScheduleEntry};
use loancalc_core::{to_money, ComputationOutput, MinorUnits, Money};
use serde::Serialize;

/// One schedule row in major currency units.
#[derive(Debug, Clone, Serialize)]
pub struct DisplayRow {
    pub month: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    pub payment: Money,
    pub interest: Money,
    pub principal: Money,
    pub remaining: Money,
}

#[derive(Debug, Clone, Serialize)]
pub struct DisplaySummary {
    pub principal: Money,
    pub monthly_payment: Money,
    pub total_payment: Money,
    pub total_interest: Money,
    pub term_months: i64,
    pub strategy: String,
    pub payment_basis: String,
    pub rounding_residual: Money,
}

#[derive(Debug, Clone, Serialize)]
pub struct DisplayLoan {
    #[serde(flatten)]
    pub summary: DisplaySummary,
    pub schedule: Vec<DisplayRow>,
}

/// Minor units as a major-unit decimal with a fixed number of places
/// (2 for a denomination of 100).
pub fn money(amount: MinorUnits, minor_units_per_major: i64) -> Money {
    let mut value = to_money(amount, minor_units_per_major);
    value.rescale(minor_units_per_major.max(1).ilog10());
    value
}

fn basis_label(basis: PaymentBasis) -> String {
    match basis {
        PaymentBasis::Annuity => "annuity".into(),
        PaymentBasis::ZeroInterest => "zero_interest".into(),
        PaymentBasis::EqualPrincipal => "equal_principal".into(),
    }
}

pub fn summary(result: &LoanSummary, denomination: i64) -> DisplaySummary {
    DisplaySummary {
        principal: money(result.principal_minor_units, denomination),
        monthly_payment: money(result.monthly_payment_minor_units, denomination),
        total_payment: money(result.total_payment_minor_units, denomination),
        total_interest: money(result.total_interest_minor_units, denomination),
        term_months: result.term_months,
        strategy: result.strategy.to_string(),
        payment_basis: basis_label(result.payment_basis),
        rounding_residual: money(result.rounding_residual_minor_units, denomination),
    }
}

pub fn row(entry: &ScheduleEntry, denomination: i64) -> DisplayRow {
    DisplayRow {
        month: entry.month_index,
        due_date: entry.due_date.map(|d| d.to_string()),
        payment: money(entry.payment_minor_units, denomination),
        interest: money(entry.interest_minor_units, denomination),
        principal: money(entry.principal_minor_units, denomination),
        remaining: money(entry.remaining_principal_minor_units, denomination),
    }
}

pub fn loan(result: &LoanResult, denomination: i64) -> DisplayLoan {
    DisplayLoan {
        summary: summary(&result.summary(), denomination),
        schedule: result
            .schedule
            .iter()
            .map(|e| row(e, denomination))
            .collect(),
    }
}

fn rewrap<T: Serialize, U: Serialize>(output: &ComputationOutput<T>, result: U) -> ComputationOutput<U> {
    ComputationOutput {
        result,
        methodology: output.methodology.clone(),
        assumptions: output.assumptions.clone(),
        warnings: output.warnings.clone(),
        metadata: output.metadata.clone(),
    }
}

pub fn loan_envelope(
    output: &ComputationOutput<LoanResult>,
    denomination: i64,
) -> ComputationOutput<DisplayLoan> {
    rewrap(output, loan(&output.result, denomination))
}

pub fn summary_envelope(
    output: &ComputationOutput<LoanSummary>,
    denomination: i64,
) -> ComputationOutput<DisplaySummary> {
    rewrap(output, summary(&output.result, denomination))
}
