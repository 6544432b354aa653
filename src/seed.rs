//! Built-in starter factor library: a DEFRA/EPA 2024 mix covering the
//! common scope 1-3 activities. Seeding is get-or-create on the factor
//! uniqueness key, so re-running never duplicates or overwrites.

use std::str::FromStr;

use rust_decimal::Decimal;

use crate::db::{EmissionDb, NewEmissionFactor};
use crate::error::CoreError;
use crate::types::Scope;

const SOURCE: &str = "DEFRA/EPA Mix 2024";
const VALID_YEAR: i32 = 2024;

/// (scope, category, subcategory, co2e per unit, unit, region)
const STARTER_FACTORS: [(Scope, &str, &str, &str, &str, &str); 17] = [
    // Scope 1: stationary combustion
    (Scope::Scope1, "Diesel", "Stationary", "2.68787", "liter", "Global"),
    (Scope::Scope1, "Natural Gas", "Stationary", "2.02135", "m3", "Global"),
    (Scope::Scope1, "Natural Gas", "Energy-based", "0.18122", "kWh", "Global"),
    (Scope::Scope1, "LPG", "Stationary", "1.55537", "liter", "Global"),
    // Scope 1: mobile combustion
    (Scope::Scope1, "Petrol", "Passenger Car", "2.31495", "liter", "Global"),
    (Scope::Scope1, "Diesel", "Van (Class II)", "2.68787", "liter", "Global"),
    // Scope 1: fugitive releases (GWP values)
    (Scope::Scope1, "Refrigerant", "HFC-134a", "1430", "kg", "Global"),
    (Scope::Scope1, "Refrigerant", "R-410A", "2088", "kg", "Global"),
    // Scope 2: purchased electricity, location-based
    (Scope::Scope2, "Electricity", "Grid (India)", "0.712", "kWh", "India"),
    (Scope::Scope2, "Electricity", "Grid (USA)", "0.385", "kWh", "US"),
    (Scope::Scope2, "Electricity", "Grid (UK)", "0.285", "kWh", "UK"),
    // Scope 2: purchased heat/steam
    (Scope::Scope2, "District Heating", "Steam", "0.17", "kWh", "Global"),
    // Scope 3: purchased goods and services
    (Scope::Scope3, "Water Supply", "Mains Water", "0.149", "m3", "Global"),
    (Scope::Scope3, "Paper", "Recycled Content 100%", "0.65", "kg", "Global"),
    // Scope 3: business travel
    (Scope::Scope3, "Business Travel", "Flight - Long Haul (Economy)", "0.147", "km", "Global"),
    (Scope::Scope3, "Business Travel", "Taxis", "0.203", "km", "Global"),
    // Scope 3: employee commuting
    (Scope::Scope3, "Employee Commuting", "Public Transport (Bus)", "0.102", "km", "Global"),
];

/// Seed the starter factor set. Returns how many factors were created;
/// keys already present are left untouched.
pub fn seed_factors(db: &EmissionDb) -> Result<usize, CoreError> {
    let mut created = 0;
    for (scope, category, subcategory, value, unit, region) in STARTER_FACTORS {
        if db
            .find_factor(scope, category, subcategory, region, VALID_YEAR)?
            .is_some()
        {
            continue;
        }
        let co2e_per_unit = Decimal::from_str(value)
            .map_err(|e| CoreError::Validation(format!("bad seed value '{value}': {e}")))?;
        db.insert_factor(&NewEmissionFactor {
            scope,
            category: category.to_string(),
            subcategory: subcategory.to_string(),
            co2e_per_unit,
            unit: unit.to_string(),
            region: region.to_string(),
            source: SOURCE.to_string(),
            valid_year: VALID_YEAR,
        })?;
        created += 1;
    }
    tracing::info!(created, "factor library seeded");
    Ok(created)
}

#[cfg(test)]
mod tests {
    use super::seed_factors;
    use crate::db::test_utils::test_db;
    use crate::types::Scope;

    #[test]
    fn test_seed_is_idempotent() {
        let db = test_db();
        assert_eq!(seed_factors(&db).expect("first run"), 17);
        assert_eq!(seed_factors(&db).expect("second run"), 0);

        let all = db.search_factors(None, None, None).expect("list");
        assert_eq!(all.len(), 17);
    }

    #[test]
    fn test_seed_preserves_existing_factor() {
        let db = test_db();
        seed_factors(&db).expect("seed");

        let diesel = db
            .find_factor(Scope::Scope1, "Diesel", "Stationary", "Global", 2024)
            .expect("find")
            .expect("seeded");
        let before = diesel.id.clone();

        seed_factors(&db).expect("reseed");
        let after = db
            .find_factor(Scope::Scope1, "Diesel", "Stationary", "Global", 2024)
            .expect("find")
            .expect("still there");
        assert_eq!(after.id, before);
    }
}
