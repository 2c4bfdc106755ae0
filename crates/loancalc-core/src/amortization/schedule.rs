use chrono::{Months, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::LoanCalcError;
use crate::fixed_point::{scaled_multiply_divide, FixedPoint, Scaled};
use crate::types::MinorUnits;
use crate::LoanCalcResult;

/// One month of an amortization schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleEntry {
    /// 1-based month number.
    pub month_index: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    /// Interest plus principal paid this month.
    pub payment_minor_units: MinorUnits,
    pub interest_minor_units: MinorUnits,
    pub principal_minor_units: MinorUnits,
    pub remaining_principal_minor_units: MinorUnits,
}

/// Per-month repayment rule the iterator applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RepaymentRule {
    /// Fixed annuity payment; principal is what the payment leaves after interest.
    Level { payment: MinorUnits },
    /// `balance / months remaining` of principal plus interest.
    PrincipalAmortized,
    /// Fixed principal-only payment, no interest.
    ZeroInterest { payment: MinorUnits },
}

/// Interest accrued in one month on `balance`: `balance × annual_rate_scaled /
/// rate_divisor`, floored once over the exact quotient so a whole-unit amount
/// is never shaved by an intermediate truncation.
pub(crate) fn monthly_interest(
    balance: MinorUnits,
    annual_rate_scaled: Scaled,
    rate_divisor: Scaled,
) -> LoanCalcResult<MinorUnits> {
    let interest = scaled_multiply_divide(Scaled::from(balance), annual_rate_scaled, rate_divisor)?;
    FixedPoint::to_minor_units(interest, "monthly interest")
}

/// Walks a loan month by month, recomputing the remaining principal after
/// every payment. The final month always repays whatever balance is left, so a
/// schedule that runs to completion closes at exactly zero.
///
/// Yields `Err` at most once; the iterator is exhausted afterwards.
#[derive(Debug, Clone)]
pub struct ScheduleIter {
    annual_rate_scaled: Scaled,
    rate_divisor: Scaled,
    rule: RepaymentRule,
    term_months: i64,
    months_elapsed: i64,
    balance: MinorUnits,
    first_payment_date: Option<NaiveDate>,
    failed: bool,
}

impl ScheduleIter {
    pub(crate) fn new(
        annual_rate_scaled: Scaled,
        rate_divisor: Scaled,
        rule: RepaymentRule,
        principal: MinorUnits,
        term_months: i64,
        first_payment_date: Option<NaiveDate>,
    ) -> Self {
        Self {
            annual_rate_scaled,
            rate_divisor,
            rule,
            term_months,
            months_elapsed: 0,
            balance: principal,
            first_payment_date,
            failed: false,
        }
    }

    /// Principal still outstanding before the next yielded month.
    pub fn remaining_principal(&self) -> MinorUnits {
        self.balance
    }

    pub fn months_remaining(&self) -> i64 {
        self.term_months - self.months_elapsed
    }

    fn interest_on_balance(&self) -> LoanCalcResult<MinorUnits> {
        if let RepaymentRule::ZeroInterest { .. } = self.rule {
            return Ok(0);
        }
        // Truncating: interest is never rounded up against the borrower.
        monthly_interest(self.balance, self.annual_rate_scaled, self.rate_divisor)
    }

    fn due_date(&self, month_index: i64) -> LoanCalcResult<Option<NaiveDate>> {
        let Some(first) = self.first_payment_date else {
            return Ok(None);
        };
        let offset = u32::try_from(month_index - 1).map_err(|_| {
            LoanCalcError::invalid_input("first_payment_date", "month offset out of range")
        })?;
        first
            .checked_add_months(Months::new(offset))
            .map(Some)
            .ok_or_else(|| {
                LoanCalcError::invalid_input(
                    "first_payment_date",
                    format!("due date for month {month_index} is outside the calendar range"),
                )
            })
    }

    fn next_entry(&self) -> LoanCalcResult<ScheduleEntry> {
        let month_index = self.months_elapsed + 1;
        let months_remaining = self.term_months - self.months_elapsed;
        let interest = self.interest_on_balance()?;

        let principal = if months_remaining == 1 {
            self.balance
        } else {
            match self.rule {
                RepaymentRule::Level { payment } => {
                    if payment < interest {
                        return Err(LoanCalcError::degenerate(format!(
                            "month {month_index}: payment {payment} does not cover interest {interest}"
                        )));
                    }
                    (payment - interest).min(self.balance)
                }
                RepaymentRule::PrincipalAmortized => self.balance / months_remaining,
                RepaymentRule::ZeroInterest { payment } => payment.min(self.balance),
            }
        };

        let payment = interest
            .checked_add(principal)
            .ok_or_else(|| LoanCalcError::overflow(format!("month {month_index} payment")))?;

        Ok(ScheduleEntry {
            month_index,
            due_date: self.due_date(month_index)?,
            payment_minor_units: payment,
            interest_minor_units: interest,
            principal_minor_units: principal,
            remaining_principal_minor_units: self.balance - principal,
        })
    }
}

impl Iterator for ScheduleIter {
    type Item = LoanCalcResult<ScheduleEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.months_elapsed >= self.term_months {
            return None;
        }
        match self.next_entry() {
            Ok(entry) => {
                self.months_elapsed += 1;
                self.balance = entry.remaining_principal_minor_units;
                tracing::trace!(
                    month = entry.month_index,
                    payment = entry.payment_minor_units,
                    interest = entry.interest_minor_units,
                    remaining = entry.remaining_principal_minor_units,
                    "schedule month"
                );
                Some(Ok(entry))
            }
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.failed {
            return (0, Some(0));
        }
        let remaining = usize::try_from(self.months_remaining()).unwrap_or(0);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for ScheduleIter {}

#[cfg(test)]
mod tests {
    use super::*;

    // Annual percent at 2 decimals, so 1200 is 12.00% a year or 1% a month.
    const RATE_DIVISOR: Scaled = 120_000;

    fn iter(rule: RepaymentRule, annual_rate: Scaled, principal: i64, term: i64) -> ScheduleIter {
        ScheduleIter::new(annual_rate, RATE_DIVISOR, rule, principal, term, None)
    }

    #[test]
    fn test_zero_interest_ceiling_payments() {
        let entries: Vec<_> = iter(RepaymentRule::ZeroInterest { payment: 34 }, 0, 100, 3)
            .collect::<Result<_, _>>()
            .unwrap();
        let payments: Vec<_> = entries.iter().map(|e| e.payment_minor_units).collect();
        assert_eq!(payments, vec![34, 34, 32]);
        assert!(entries.iter().all(|e| e.interest_minor_units == 0));
        assert_eq!(entries[2].remaining_principal_minor_units, 0);
    }

    #[test]
    fn test_zero_interest_early_payoff_stays_at_zero() {
        let entries: Vec<_> = iter(RepaymentRule::ZeroInterest { payment: 2 }, 0, 10, 6)
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(entries[4].remaining_principal_minor_units, 0);
        assert_eq!(entries[5].payment_minor_units, 0);
        assert_eq!(entries[5].remaining_principal_minor_units, 0);
    }

    #[test]
    fn test_principal_amortized_slices() {
        // 1% per month
        let entries: Vec<_> = iter(RepaymentRule::PrincipalAmortized, 1200, 1_000_000, 12)
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(entries[0].principal_minor_units, 83_333);
        assert_eq!(entries[0].interest_minor_units, 10_000);
        assert_eq!(entries[0].payment_minor_units, 93_333);
        assert_eq!(entries[1].payment_minor_units, 92_499);
        assert_eq!(entries[11].payment_minor_units, 84_167);
        assert_eq!(entries[11].remaining_principal_minor_units, 0);
    }

    #[test]
    fn test_level_payment_shortfall_is_degenerate() {
        // 1% of 1,000,000 is 10,000 interest; a 5,000 payment never amortizes
        let mut it = iter(
            RepaymentRule::Level { payment: 5_000 },
            1200,
            1_000_000,
            12,
        );
        let first = it.next().unwrap();
        assert!(matches!(first, Err(LoanCalcError::ArithmeticDegenerate { .. })));
        assert!(it.next().is_none());
    }

    #[test]
    fn test_due_dates_follow_calendar_months() {
        let first = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
        let entries: Vec<_> = ScheduleIter::new(
            0,
            RATE_DIVISOR,
            RepaymentRule::ZeroInterest { payment: 1 },
            3,
            3,
            Some(first),
        )
        .collect::<Result<_, _>>()
        .unwrap();
        assert_eq!(entries[0].due_date, Some(first));
        // Clamped to the end of a shorter month
        assert_eq!(entries[1].due_date, NaiveDate::from_ymd_opt(2024, 2, 29));
        assert_eq!(entries[2].due_date, NaiveDate::from_ymd_opt(2024, 3, 31));
    }

    #[test]
    fn test_size_hint_tracks_progress() {
        let mut it = iter(RepaymentRule::ZeroInterest { payment: 1 }, 0, 5, 5);
        assert_eq!(it.size_hint(), (5, Some(5)));
        it.next();
        assert_eq!(it.size_hint(), (4, Some(4)));
        assert_eq!(it.len(), 4);
        assert_eq!(it.remaining_principal(), 4);
    }

    #[test]
    fn test_whole_unit_interest_is_not_shaved() {
        // 2,400,000 at 5.50% accrues exactly 11,000 in the first month
        assert_eq!(monthly_interest(2_400_000, 550, RATE_DIVISOR).unwrap(), 11_000);
        // 1,200 at 100% accrues exactly 100
        assert_eq!(monthly_interest(1_200, 10_000, RATE_DIVISOR).unwrap(), 100);
        // 2,500,000 at 5.50% is 11,458.33.., floored
        assert_eq!(monthly_interest(2_500_000, 550, RATE_DIVISOR).unwrap(), 11_458);
    }

    #[test]
    fn test_size_hint_empty_after_failure() {
        let mut it = iter(RepaymentRule::Level { payment: 5_000 }, 1200, 1_000_000, 12);
        assert!(it.next().unwrap().is_err());
        assert_eq!(it.size_hint(), (0, Some(0)));
    }
}
