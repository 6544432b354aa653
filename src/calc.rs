//! Calculation engine: (quantity, factor) → CO2e.
//!
//! Pure and deterministic — same inputs always produce the same
//! output, which is what makes stored CO2e values reproducible for
//! audit. All arithmetic is exact fixed-point decimal; binary floating
//! point would accumulate rounding error across millions of summed
//! records.

use rust_decimal::{Decimal, RoundingStrategy};

use crate::error::CoreError;
use crate::types::CalculationMethod;

/// Radiative-forcing multiplier applied to aviation emissions.
const RF_MULTIPLIER: Decimal = Decimal::from_parts(19, 0, 0, false, 1); // 1.9

/// Stored CO2e precision (fractional digits).
pub const CO2E_SCALE: u32 = 4;

/// Stored emission-factor precision (fractional digits).
pub const FACTOR_SCALE: u32 = 6;

/// Named switches for the calculation.
#[derive(Debug, Clone, Copy)]
pub struct CalcOptions {
    /// Apply the 1.9× radiative-forcing multiplier to air travel.
    pub use_radiative_forcing: bool,
}

impl Default for CalcOptions {
    fn default() -> Self {
        CalcOptions {
            use_radiative_forcing: true,
        }
    }
}

/// Compute CO2e for one activity.
///
/// `factor_value` is the already-resolved numeric factor — for the GWP
/// method it is itself the Global-Warming-Potential multiplier. No
/// factor lookup happens here.
///
/// Fails with a validation error on negative quantity; never returns a
/// negative CO2e.
pub fn calculate(
    method: CalculationMethod,
    quantity: Decimal,
    factor_value: Decimal,
    options: &CalcOptions,
) -> Result<Decimal, CoreError> {
    if quantity < Decimal::ZERO {
        return Err(CoreError::Validation(
            "quantity cannot be negative".to_string(),
        ));
    }

    let co2e = match method {
        CalculationMethod::Standard | CalculationMethod::Gwp => quantity * factor_value,
        CalculationMethod::RadiativeForcing => {
            if options.use_radiative_forcing {
                quantity * factor_value * RF_MULTIPLIER
            } else {
                quantity * factor_value
            }
        }
    };

    Ok(round_co2e(co2e))
}

/// Round a CO2e value to storage precision (4 fractional digits,
/// half away from zero).
pub fn round_co2e(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(CO2E_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_gwp_refrigerant() {
        // HFC-134a: GWP 1430, 2 kg released → 2860 kg CO2e
        let co2e = calculate(
            CalculationMethod::Gwp,
            dec("2"),
            dec("1430"),
            &CalcOptions::default(),
        )
        .unwrap();
        assert_eq!(co2e, dec("2860"));
    }

    #[test]
    fn test_radiative_forcing_applied_by_default() {
        // Long-haul flight: 1000 km × 0.147 × 1.9 = 279.3
        let co2e = calculate(
            CalculationMethod::RadiativeForcing,
            dec("1000"),
            dec("0.147"),
            &CalcOptions::default(),
        )
        .unwrap();
        assert_eq!(co2e, dec("279.3000"));
    }

    #[test]
    fn test_radiative_forcing_disabled() {
        let co2e = calculate(
            CalculationMethod::RadiativeForcing,
            dec("1000"),
            dec("0.147"),
            &CalcOptions {
                use_radiative_forcing: false,
            },
        )
        .unwrap();
        assert_eq!(co2e, dec("147.0000"));
    }

    #[test]
    fn test_standard_diesel() {
        // 100 liters of diesel × 2.68787 = 268.787
        let co2e = calculate(
            CalculationMethod::Standard,
            dec("100"),
            dec("2.68787"),
            &CalcOptions::default(),
        )
        .unwrap();
        assert_eq!(co2e, dec("268.7870"));
    }

    #[test]
    fn test_negative_quantity_rejected() {
        let err = calculate(
            CalculationMethod::Standard,
            dec("-1"),
            dec("2.68787"),
            &CalcOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
    }

    #[test]
    fn test_zero_quantity_is_valid() {
        let co2e = calculate(
            CalculationMethod::Standard,
            Decimal::ZERO,
            dec("2.68787"),
            &CalcOptions::default(),
        )
        .unwrap();
        assert_eq!(co2e, Decimal::ZERO.round_dp(4));
    }

    #[test]
    fn test_rounding_to_storage_precision() {
        // 1.23456789 × 1 rounds half away from zero at 4 dp
        let co2e = calculate(
            CalculationMethod::Standard,
            dec("1.23456789"),
            dec("1"),
            &CalcOptions::default(),
        )
        .unwrap();
        assert_eq!(co2e, dec("1.2346"));
    }

    #[test]
    fn test_deterministic() {
        let run = || {
            calculate(
                CalculationMethod::RadiativeForcing,
                dec("123.4567"),
                dec("0.147891"),
                &CalcOptions::default(),
            )
            .unwrap()
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn test_rf_multiplier_constant() {
        assert_eq!(RF_MULTIPLIER, dec("1.9"));
    }
}
