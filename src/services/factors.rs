//! Emission factor library: lookup and curation.

use crate::db::{DbEmissionFactor, EmissionDb, NewEmissionFactor};
use crate::error::CoreError;
use crate::types::Scope;

/// Resolve the factor for an activity.
///
/// Exact (scope, category, subcategory, region, valid_year) match
/// first, then the same key with the `Global` region. A missing factor
/// is `Ok(None)` — the caller decides what to do; the library never
/// invents a value.
pub fn lookup(
    db: &EmissionDb,
    scope: Scope,
    category: &str,
    subcategory: &str,
    region: &str,
    valid_year: i32,
) -> Result<Option<DbEmissionFactor>, CoreError> {
    if let Some(factor) = db.find_factor(scope, category, subcategory, region, valid_year)? {
        return Ok(Some(factor));
    }
    if region != "Global" {
        return db.find_factor(scope, category, subcategory, "Global", valid_year);
    }
    Ok(None)
}

/// List active factors for the data-entry UI.
pub fn search(
    db: &EmissionDb,
    scope: Option<Scope>,
    category: Option<&str>,
    region: Option<&str>,
) -> Result<Vec<DbEmissionFactor>, CoreError> {
    db.search_factors(scope, category, region)
}

/// Add a factor to the library. Duplicate uniqueness keys are a
/// conflict.
pub fn create_factor(
    db: &EmissionDb,
    new: &NewEmissionFactor,
) -> Result<DbEmissionFactor, CoreError> {
    let factor = db.insert_factor(new)?;
    tracing::info!(
        factor_id = %factor.id,
        scope = factor.scope.as_str(),
        category = %factor.category,
        "emission factor created"
    );
    Ok(factor)
}
