use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Amounts in the smallest currency denomination (e.g. cents). All engine
/// arithmetic happens on these.
pub type MinorUnits = i64;

/// Display-only amounts in major currency units. Never fed back into the engine.
pub type Money = Decimal;

/// Annual rate in percent, scaled by 10^rate_decimals (550 = 5.50% at 2 decimals).
pub type ScaledRate = i64;

/// Convert minor units into major units for rendering.
///
/// `minor_units_per_major` is validated positive by `EngineConfig`; a zero
/// denominator yields zero rather than panicking in a renderer.
pub fn to_money(amount: MinorUnits, minor_units_per_major: i64) -> Money {
    if minor_units_per_major == 0 {
        return Decimal::ZERO;
    }
    Decimal::from(amount) / Decimal::from(minor_units_per_major)
}

/// Standard computation output envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    pub assumptions: serde_json::Value,
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

/// Metadata for every computation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub computation_time_us: u64,
    pub precision: String,
}

/// Helper to wrap computation results with metadata
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    precision: String,
    result: T,
) -> ComputationOutput<T> {
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: elapsed_us,
            precision,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_to_money_cents() {
        assert_eq!(to_money(2_500_000, 100), dec!(25000));
        assert_eq!(to_money(47_753, 100), dec!(477.53));
    }

    #[test]
    fn test_to_money_other_denomination() {
        assert_eq!(to_money(1_500, 1000), dec!(1.5));
        assert_eq!(to_money(7, 1), dec!(7));
    }

    #[test]
    fn test_envelope_carries_version_and_precision() {
        let out = with_metadata(
            "test",
            &serde_json::json!({ "a": 1 }),
            vec!["w".into()],
            5,
            "i128 fixed-point 1e-12".into(),
            42i64,
        );
        assert_eq!(out.result, 42);
        assert_eq!(out.metadata.version, env!("CARGO_PKG_VERSION"));
        assert_eq!(out.metadata.precision, "i128 fixed-point 1e-12");
        assert_eq!(out.assumptions["a"], 1);
        assert_eq!(out.warnings, vec!["w".to_string()]);
    }
}
