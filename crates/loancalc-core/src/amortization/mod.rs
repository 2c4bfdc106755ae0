//! Fixed-rate loan amortization in integer minor units.
//!
//! Two schedule strategies are supported. `LevelPayment` is the canonical
//! one: every month pays the annuity payment and the final month absorbs the
//! accumulated rounding residual, so the balance closes at exactly zero and
//! the residual is reported on the result. `PrincipalAmortized` repays
//! `balance / months remaining` each month and produces declining payments.

pub mod config;
pub mod engine;
pub mod schedule;

pub use config::{EngineConfig, ScheduleStrategy};
pub use engine::{
    compute_amortization, quote_payment, AmortizationEngine, AmortizationInput, LoanInput,
    LoanResult, LoanSummary, PaymentBasis, PaymentQuote,
};
pub use schedule::{ScheduleEntry, ScheduleIter};
