pub mod error;
pub mod fixed_point;
pub mod types;

#[cfg(feature = "amortization")]
pub mod amortization;

#[cfg(feature = "amortization")]
pub mod input;

pub use error::LoanCalcError;
pub use types::*;

/// Standard result type for all loancalc operations
pub type LoanCalcResult<T> = Result<T, LoanCalcError>;
