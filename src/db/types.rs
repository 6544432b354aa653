//! Row structs and column-conversion helpers for the emission ledger.

use std::str::FromStr;

use rust_decimal::Decimal;
use serde::Serialize;

use crate::types::{CalculationMethod, RecordStatus, Scope};

/// A row from the `organizations` table.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DbOrganization {
    pub id: String,
    pub name: String,
    pub industry: String,
    pub country: String,
    pub baseline_year: i32,
    pub fiscal_year_start: String,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
    pub deleted_at: Option<String>,
}

/// Input for creating an organization.
#[derive(Debug, Clone)]
pub struct NewOrganization {
    pub name: String,
    pub industry: String,
    pub country: String,
    pub baseline_year: i32,
    pub fiscal_year_start: String,
}

impl Default for NewOrganization {
    fn default() -> Self {
        NewOrganization {
            name: String::new(),
            industry: String::new(),
            country: String::new(),
            baseline_year: 2023,
            fiscal_year_start: "01-01".to_string(),
        }
    }
}

/// A row from the `facilities` table.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DbFacility {
    pub id: String,
    pub organization_id: String,
    pub name: String,
    pub facility_type: String,
    pub city: String,
    pub country: String,
    pub grid_region: String,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
    pub deleted_at: Option<String>,
}

/// Input for creating a facility.
#[derive(Debug, Clone, Default)]
pub struct NewFacility {
    pub name: String,
    pub facility_type: String,
    pub city: String,
    pub country: String,
    pub grid_region: String,
}

/// A row from the `emission_factors` table.
///
/// Reference data: seeded out-of-band, read-only during normal
/// operation, never mutated by transactional activity.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DbEmissionFactor {
    pub id: String,
    pub scope: Scope,
    pub category: String,
    /// Empty string means "no subcategory".
    pub subcategory: String,
    pub co2e_per_unit: Decimal,
    pub unit: String,
    pub region: String,
    pub source: String,
    pub valid_year: i32,
    pub created_at: String,
    pub updated_at: String,
    pub deleted_at: Option<String>,
}

/// Input for creating an emission factor.
#[derive(Debug, Clone)]
pub struct NewEmissionFactor {
    pub scope: Scope,
    pub category: String,
    pub subcategory: String,
    pub co2e_per_unit: Decimal,
    pub unit: String,
    pub region: String,
    pub source: String,
    pub valid_year: i32,
}

/// A row from the `emission_records` table: one transactional
/// activity event with its frozen factor snapshot and cached CO2e.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DbEmissionRecord {
    pub id: String,
    pub organization_id: String,
    pub facility_id: Option<String>,
    pub scope: Scope,
    pub category: String,
    pub subcategory: String,
    pub quantity: Decimal,
    pub unit: String,
    /// Frozen snapshot of the factor value used at entry time —
    /// independent of later edits to the referenced factor row.
    pub emission_factor_used: Decimal,
    pub emission_factor_id: Option<String>,
    pub calculation_method: CalculationMethod,
    /// Cached derived value: always calculate(quantity, factor, method)
    /// at creation time. Never independently edited.
    pub co2e_calculated: Decimal,
    pub activity_date: String,
    pub reporting_period: String,
    pub data_source: String,
    pub status: RecordStatus,
    pub notes: String,
    pub created_at: String,
    pub updated_at: String,
    pub deleted_at: Option<String>,
}

/// A row from the `emission_summary_monthly` table.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DbSummaryRow {
    pub id: String,
    pub organization_id: String,
    /// None means "organization-wide total" (stored as '' in SQLite).
    pub facility_id: Option<String>,
    pub reporting_period: String,
    /// Empty string means "total across scopes".
    pub scope: String,
    pub total_co2e: Decimal,
    pub record_count: i64,
    pub last_calculated_at: String,
}

// ---------------------------------------------------------------------------
// Column conversion helpers
// ---------------------------------------------------------------------------

fn conv_err(
    idx: usize,
    err: impl std::error::Error + Send + Sync + 'static,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(err))
}

/// Read a TEXT column holding a canonical decimal string.
pub(crate) fn decimal_col(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<Decimal> {
    let s: String = row.get(idx)?;
    Decimal::from_str(&s).map_err(|e| conv_err(idx, e))
}

pub(crate) fn scope_col(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<Scope> {
    let s: String = row.get(idx)?;
    Scope::parse(&s).map_err(|e| conv_err(idx, e))
}

pub(crate) fn status_col(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<RecordStatus> {
    let s: String = row.get(idx)?;
    RecordStatus::parse(&s).map_err(|e| conv_err(idx, e))
}

pub(crate) fn method_col(
    row: &rusqlite::Row,
    idx: usize,
) -> rusqlite::Result<CalculationMethod> {
    let s: String = row.get(idx)?;
    CalculationMethod::parse(&s).map_err(|e| conv_err(idx, e))
}

/// Map the summary table's '' facility sentinel back to None.
pub(crate) fn facility_sentinel_col(
    row: &rusqlite::Row,
    idx: usize,
) -> rusqlite::Result<Option<String>> {
    let s: String = row.get(idx)?;
    Ok(if s.is_empty() { None } else { Some(s) })
}
