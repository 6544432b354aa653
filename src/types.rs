//! Domain enums shared across the crate.
//!
//! Wire values are the lowercase strings used by the original data
//! model (`scope1`, `draft`, ...); each enum round-trips through
//! `as_str`/`parse` so the db layer can store plain TEXT.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// GHG Protocol scope of an emission activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    Scope1,
    Scope2,
    Scope3,
}

impl Scope {
    pub const ALL: [Scope; 3] = [Scope::Scope1, Scope::Scope2, Scope::Scope3];

    pub fn as_str(&self) -> &'static str {
        match self {
            Scope::Scope1 => "scope1",
            Scope::Scope2 => "scope2",
            Scope::Scope3 => "scope3",
        }
    }

    pub fn parse(s: &str) -> Result<Self, CoreError> {
        match s {
            "scope1" => Ok(Scope::Scope1),
            "scope2" => Ok(Scope::Scope2),
            "scope3" => Ok(Scope::Scope3),
            other => Err(CoreError::Validation(format!(
                "unknown scope '{other}' (expected scope1|scope2|scope3)"
            ))),
        }
    }
}

/// Review status of an emission record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordStatus {
    Draft,
    Verified,
}

impl Default for RecordStatus {
    fn default() -> Self {
        RecordStatus::Draft
    }
}

impl RecordStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordStatus::Draft => "draft",
            RecordStatus::Verified => "verified",
        }
    }

    pub fn parse(s: &str) -> Result<Self, CoreError> {
        match s {
            "draft" => Ok(RecordStatus::Draft),
            "verified" => Ok(RecordStatus::Verified),
            other => Err(CoreError::Validation(format!(
                "unknown status '{other}' (expected draft|verified)"
            ))),
        }
    }
}

/// How CO2e is derived from (quantity, factor) for a record.
///
/// Stored explicitly on every record so the choice is unambiguous and
/// auditable. `infer` reproduces the legacy category-substring
/// dispatch and is only used when a payload omits the method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalculationMethod {
    /// quantity × factor. Combustion, electricity, most activities.
    Standard,
    /// quantity × GWP. Fugitive/refrigerant releases where the factor
    /// is a Global-Warming-Potential multiplier, not a combustion factor.
    Gwp,
    /// quantity × factor × RF multiplier. Air travel; the multiplier
    /// accounts for high-altitude climate impact beyond raw CO2.
    RadiativeForcing,
}

impl CalculationMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            CalculationMethod::Standard => "standard",
            CalculationMethod::Gwp => "gwp",
            CalculationMethod::RadiativeForcing => "radiative_forcing",
        }
    }

    pub fn parse(s: &str) -> Result<Self, CoreError> {
        match s {
            "standard" => Ok(CalculationMethod::Standard),
            "gwp" => Ok(CalculationMethod::Gwp),
            "radiative_forcing" => Ok(CalculationMethod::RadiativeForcing),
            other => Err(CoreError::Validation(format!(
                "unknown calculation method '{other}' (expected standard|gwp|radiative_forcing)"
            ))),
        }
    }

    /// Legacy inference from the category text.
    ///
    /// Known sharp edge: this is substring matching, so a category that
    /// merely contains "flight" (e.g. "Freight Flight Cases") selects
    /// the radiative-forcing method. Callers that know the method
    /// should pass it explicitly instead of relying on inference.
    pub fn infer(category: &str) -> Self {
        let c = category.to_lowercase();
        if c.contains("refrigerant") || c.contains("fugitive") {
            CalculationMethod::Gwp
        } else if c.contains("flight") || c.contains("air travel") {
            CalculationMethod::RadiativeForcing
        } else {
            CalculationMethod::Standard
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_round_trip() {
        for scope in Scope::ALL {
            assert_eq!(Scope::parse(scope.as_str()).unwrap(), scope);
        }
        assert!(Scope::parse("scope4").is_err());
    }

    #[test]
    fn test_status_parse() {
        assert_eq!(RecordStatus::parse("draft").unwrap(), RecordStatus::Draft);
        assert_eq!(
            RecordStatus::parse("verified").unwrap(),
            RecordStatus::Verified
        );
        assert!(RecordStatus::parse("approved").is_err());
    }

    #[test]
    fn test_infer_gwp() {
        assert_eq!(
            CalculationMethod::infer("Refrigerant HFC-134a"),
            CalculationMethod::Gwp
        );
        assert_eq!(
            CalculationMethod::infer("Fugitive Emissions"),
            CalculationMethod::Gwp
        );
    }

    #[test]
    fn test_infer_radiative_forcing() {
        assert_eq!(
            CalculationMethod::infer("Flight - Long Haul (Economy)"),
            CalculationMethod::RadiativeForcing
        );
        assert_eq!(
            CalculationMethod::infer("Business Air Travel"),
            CalculationMethod::RadiativeForcing
        );
    }

    #[test]
    fn test_infer_standard_default() {
        assert_eq!(CalculationMethod::infer("Diesel"), CalculationMethod::Standard);
        assert_eq!(
            CalculationMethod::infer("Electricity"),
            CalculationMethod::Standard
        );
    }

    #[test]
    fn test_infer_substring_collision_is_known_behavior() {
        // Documented sharp edge, not special-cased away.
        assert_eq!(
            CalculationMethod::infer("Freight Flight Cases"),
            CalculationMethod::RadiativeForcing
        );
    }
}
