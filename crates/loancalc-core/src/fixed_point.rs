//! Scaled-integer arithmetic for deterministic money math.
//!
//! Fractional quantities (monthly rates, growth factors, sub-cent payment
//! amounts) are carried as `i128` values multiplied by a power-of-ten scale.
//! Every multiplication is checked: an intermediate that leaves the `i128`
//! range is reported as `ArithmeticOverflow`, never wrapped or clamped.
//! Results that collapse to a meaningless value (a power that underflows to
//! zero, a zero divisor) are reported as `ArithmeticDegenerate`.

use crate::error::LoanCalcError;
use crate::types::MinorUnits;
use crate::LoanCalcResult;

/// A fixed-point quantity: the real value multiplied by the scale in use.
pub type Scaled = i128;

/// Largest supported number of fractional digits. Keeps `scale²` well inside
/// the `i128` range so one scaled product of two unit-sized values never
/// overflows.
pub const MAX_FIXED_POINT_DIGITS: u32 = 18;

/// Computes `a * b / scale`, truncating toward zero.
pub fn scaled_multiply_divide(a: Scaled, b: Scaled, scale: Scaled) -> LoanCalcResult<Scaled> {
    if scale == 0 {
        return Err(LoanCalcError::degenerate(
            "scaled multiply-divide with a zero divisor",
        ));
    }
    let product = a
        .checked_mul(b)
        .ok_or_else(|| LoanCalcError::overflow(format!("scaled product {a} × {b}")))?;
    product
        .checked_div(scale)
        .ok_or_else(|| LoanCalcError::overflow(format!("scaled quotient {product} / {scale}")))
}

/// Computes `(base / scale)^exponent`, expressed in the same scale.
///
/// Uses exponentiation by squaring, so at most `2·log2(exponent)` truncating
/// multiplications are applied. Each truncation loses strictly less than one
/// unit of the scale.
///
/// Degenerate-result policy: a non-positive base, a non-positive scale, or any
/// intermediate square or final result that truncates to zero is an
/// `ArithmeticDegenerate` error. A collapsed power is never returned as 0.
pub fn power(base: Scaled, exponent: u32, scale: Scaled) -> LoanCalcResult<Scaled> {
    if scale <= 0 {
        return Err(LoanCalcError::degenerate(format!(
            "power with non-positive scale {scale}"
        )));
    }
    if base <= 0 {
        return Err(LoanCalcError::degenerate(format!(
            "power of non-positive base {base}"
        )));
    }
    if exponent == 0 {
        return Ok(scale);
    }

    let mut result = scale;
    let mut square = base;
    let mut remaining = exponent;

    loop {
        if remaining & 1 == 1 {
            result = scaled_multiply_divide(result, square, scale)?;
        }
        remaining >>= 1;
        if remaining == 0 {
            break;
        }
        square = scaled_multiply_divide(square, square, scale)?;
        if square == 0 {
            return Err(LoanCalcError::degenerate(format!(
                "power {base}^{exponent} underflowed to zero at scale {scale}"
            )));
        }
    }

    if result == 0 {
        return Err(LoanCalcError::degenerate(format!(
            "power {base}^{exponent} underflowed to zero at scale {scale}"
        )));
    }
    Ok(result)
}

/// Divides a scaled value down to whole units, rounding half away from zero.
///
/// With the power-of-ten scales used by the engine `scale / 2` is exact, so a
/// value exactly halfway between two units always moves away from zero
/// (2.5 → 3, −2.5 → −3). The engine only rounds non-negative amounts.
pub fn round_to_nearest_unit(value: Scaled, scale: Scaled) -> LoanCalcResult<Scaled> {
    if scale <= 0 {
        return Err(LoanCalcError::degenerate(format!(
            "rounding with non-positive scale {scale}"
        )));
    }
    let half = scale / 2;
    let adjusted = if value >= 0 {
        value.checked_add(half)
    } else {
        value.checked_sub(half)
    }
    .ok_or_else(|| LoanCalcError::overflow(format!("rounding {value} at scale {scale}")))?;
    Ok(adjusted / scale)
}

/// A fixed-point context bound to one power-of-ten scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedPoint {
    digits: u32,
    scale: Scaled,
}

impl FixedPoint {
    pub fn with_digits(digits: u32) -> LoanCalcResult<Self> {
        if digits == 0 || digits > MAX_FIXED_POINT_DIGITS {
            return Err(LoanCalcError::InvalidConfig {
                field: "fixed_point_digits".into(),
                reason: format!("must be between 1 and {MAX_FIXED_POINT_DIGITS}, got {digits}"),
            });
        }
        Ok(Self {
            digits,
            scale: 10i128.pow(digits),
        })
    }

    pub fn digits(&self) -> u32 {
        self.digits
    }

    /// The scaled representation of 1.
    pub fn scale(&self) -> Scaled {
        self.scale
    }

    pub fn mul_div(&self, a: Scaled, b: Scaled) -> LoanCalcResult<Scaled> {
        scaled_multiply_divide(a, b, self.scale)
    }

    pub fn pow(&self, base: Scaled, exponent: u32) -> LoanCalcResult<Scaled> {
        power(base, exponent, self.scale)
    }

    pub fn round(&self, value: Scaled) -> LoanCalcResult<Scaled> {
        round_to_nearest_unit(value, self.scale)
    }

    /// Narrow a whole-unit `i128` back into `i64` minor units.
    pub fn to_minor_units(value: Scaled, context: &str) -> LoanCalcResult<MinorUnits> {
        MinorUnits::try_from(value).map_err(|_| {
            LoanCalcError::overflow(format!("{context}: {value} exceeds the minor-unit range"))
        })
    }

    pub fn describe(&self) -> String {
        format!("i128 fixed-point 1e-{}", self.digits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MICRO: Scaled = 1_000_000;

    #[test]
    fn test_scaled_multiply_divide_basic() {
        // 1.5 × 2.25 = 3.375
        assert_eq!(
            scaled_multiply_divide(1_500_000, 2_250_000, MICRO).unwrap(),
            3_375_000
        );
    }

    #[test]
    fn test_scaled_multiply_divide_truncates() {
        // 10 × 1/3 at scale 3 → 3.33.. truncated to 3
        assert_eq!(scaled_multiply_divide(10, 1, 3).unwrap(), 3);
        assert_eq!(scaled_multiply_divide(-10, 1, 3).unwrap(), -3);
    }

    #[test]
    fn test_scaled_multiply_divide_overflow() {
        let err = scaled_multiply_divide(i128::MAX, 2, MICRO).unwrap_err();
        assert!(matches!(err, LoanCalcError::ArithmeticOverflow { .. }));
    }

    #[test]
    fn test_scaled_multiply_divide_zero_scale() {
        let err = scaled_multiply_divide(1, 1, 0).unwrap_err();
        assert!(matches!(err, LoanCalcError::ArithmeticDegenerate { .. }));
    }

    #[test]
    fn test_power_exact() {
        // 1.1² = 1.21
        assert_eq!(power(1_100_000, 2, MICRO).unwrap(), 1_210_000);
        // 2^10 = 1024
        assert_eq!(power(2 * MICRO, 10, MICRO).unwrap(), 1024 * MICRO);
    }

    #[test]
    fn test_power_zero_exponent_is_one() {
        assert_eq!(power(1_234_567, 0, MICRO).unwrap(), MICRO);
    }

    #[test]
    fn test_power_monthly_growth_factor() {
        // (1 + 0.055/12)^60 at 1e-12 precision
        let scale = 1_000_000_000_000;
        let growth = power(scale + 4_583_333_333, 60, scale).unwrap();
        assert_eq!(growth, 1_315_703_772_480);
    }

    #[test]
    fn test_power_underflow_is_degenerate() {
        // 0.5^200 cannot be represented at six digits
        let err = power(MICRO / 2, 200, MICRO).unwrap_err();
        assert!(matches!(err, LoanCalcError::ArithmeticDegenerate { .. }));
    }

    #[test]
    fn test_power_non_positive_base_is_degenerate() {
        assert!(matches!(
            power(0, 3, MICRO).unwrap_err(),
            LoanCalcError::ArithmeticDegenerate { .. }
        ));
        assert!(matches!(
            power(-MICRO, 3, MICRO).unwrap_err(),
            LoanCalcError::ArithmeticDegenerate { .. }
        ));
    }

    #[test]
    fn test_power_overflow() {
        // 1000^40 = 1e120 cannot fit in i128
        let err = power(1000 * MICRO, 40, MICRO).unwrap_err();
        assert!(matches!(err, LoanCalcError::ArithmeticOverflow { .. }));
    }

    #[test]
    fn test_round_half_away_from_zero() {
        assert_eq!(round_to_nearest_unit(25, 10).unwrap(), 3);
        assert_eq!(round_to_nearest_unit(24, 10).unwrap(), 2);
        assert_eq!(round_to_nearest_unit(-25, 10).unwrap(), -3);
        assert_eq!(round_to_nearest_unit(-24, 10).unwrap(), -2);
        assert_eq!(round_to_nearest_unit(0, 10).unwrap(), 0);
    }

    #[test]
    fn test_round_overflow() {
        let err = round_to_nearest_unit(i128::MAX, 10).unwrap_err();
        assert!(matches!(err, LoanCalcError::ArithmeticOverflow { .. }));
    }

    #[test]
    fn test_fixed_point_digits_bounds() {
        assert!(FixedPoint::with_digits(0).is_err());
        assert!(FixedPoint::with_digits(19).is_err());
        let fp = FixedPoint::with_digits(6).unwrap();
        assert_eq!(fp.scale(), MICRO);
        assert_eq!(fp.describe(), "i128 fixed-point 1e-6");
    }

    #[test]
    fn test_to_minor_units_narrowing() {
        assert_eq!(FixedPoint::to_minor_units(42, "payment").unwrap(), 42);
        let err = FixedPoint::to_minor_units(i128::from(i64::MAX) + 1, "payment").unwrap_err();
        assert!(matches!(err, LoanCalcError::ArithmeticOverflow { .. }));
    }
}
