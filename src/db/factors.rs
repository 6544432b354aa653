//! Emission factor rows: the reference library the calculation engine
//! draws its per-unit CO2e values from.
//!
//! Read-only during normal operation; rows are created by the seeding
//! or admin path and soft-deleted, never edited in place by
//! transactional activity.

use chrono::Utc;
use rusqlite::params;
use uuid::Uuid;

use super::{DbEmissionFactor, EmissionDb, NewEmissionFactor};
use crate::error::CoreError;
use crate::types::Scope;

const FACTOR_COLUMNS: &str = "id, scope, category, subcategory, co2e_per_unit, unit,
                    region, source, valid_year, created_at, updated_at, deleted_at";

fn factor_from_row(row: &rusqlite::Row) -> rusqlite::Result<DbEmissionFactor> {
    Ok(DbEmissionFactor {
        id: row.get(0)?,
        scope: super::types::scope_col(row, 1)?,
        category: row.get(2)?,
        subcategory: row.get(3)?,
        co2e_per_unit: super::types::decimal_col(row, 4)?,
        unit: row.get(5)?,
        region: row.get(6)?,
        source: row.get(7)?,
        valid_year: row.get(8)?,
        created_at: row.get(9)?,
        updated_at: row.get(10)?,
        deleted_at: row.get(11)?,
    })
}

impl EmissionDb {
    /// Insert an emission factor.
    ///
    /// At most one factor may exist per (scope, category, subcategory,
    /// region, valid_year); a second insert for the same key fails with
    /// a conflict error.
    pub fn insert_factor(
        &self,
        new: &NewEmissionFactor,
    ) -> Result<DbEmissionFactor, CoreError> {
        if new.category.trim().is_empty() {
            return Err(CoreError::Validation(
                "factor category is required".to_string(),
            ));
        }
        if new.unit.trim().is_empty() {
            return Err(CoreError::Validation("factor unit is required".to_string()));
        }
        let now = Utc::now().to_rfc3339();
        let factor = DbEmissionFactor {
            id: Uuid::new_v4().to_string(),
            scope: new.scope,
            category: new.category.clone(),
            subcategory: new.subcategory.clone(),
            co2e_per_unit: new.co2e_per_unit,
            unit: new.unit.clone(),
            region: new.region.clone(),
            source: new.source.clone(),
            valid_year: new.valid_year,
            created_at: now.clone(),
            updated_at: now,
            deleted_at: None,
        };
        self.conn
            .execute(
                "INSERT INTO emission_factors (
                    id, scope, category, subcategory, co2e_per_unit, unit,
                    region, source, valid_year, created_at, updated_at
                 ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                params![
                    factor.id,
                    factor.scope.as_str(),
                    factor.category,
                    factor.subcategory,
                    factor.co2e_per_unit.to_string(),
                    factor.unit,
                    factor.region,
                    factor.source,
                    factor.valid_year,
                    factor.created_at,
                    factor.updated_at,
                ],
            )
            .map_err(|e| map_unique_violation(e, &factor))?;
        Ok(factor)
    }

    /// Get an active factor by ID.
    pub fn get_factor(&self, id: &str) -> Result<Option<DbEmissionFactor>, CoreError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {FACTOR_COLUMNS}
             FROM emission_factors
             WHERE id = ?1 AND deleted_at IS NULL"
        ))?;
        let mut rows = stmt.query_map(params![id], factor_from_row)?;
        match rows.next() {
            Some(row) => Ok(Some(row?)),
            None => Ok(None),
        }
    }

    /// Find the factor for an exact uniqueness key, active rows only.
    pub fn find_factor(
        &self,
        scope: Scope,
        category: &str,
        subcategory: &str,
        region: &str,
        valid_year: i32,
    ) -> Result<Option<DbEmissionFactor>, CoreError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {FACTOR_COLUMNS}
             FROM emission_factors
             WHERE scope = ?1 AND category = ?2 AND subcategory = ?3
               AND region = ?4 AND valid_year = ?5
               AND deleted_at IS NULL"
        ))?;
        let mut rows = stmt.query_map(
            params![scope.as_str(), category, subcategory, region, valid_year],
            factor_from_row,
        )?;
        match rows.next() {
            Some(row) => Ok(Some(row?)),
            None => Ok(None),
        }
    }

    /// Search active factors by optional scope/category/region filters,
    /// ordered by (scope, category, subcategory).
    pub fn search_factors(
        &self,
        scope: Option<Scope>,
        category: Option<&str>,
        region: Option<&str>,
    ) -> Result<Vec<DbEmissionFactor>, CoreError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {FACTOR_COLUMNS}
             FROM emission_factors
             WHERE deleted_at IS NULL
               AND (?1 IS NULL OR scope = ?1)
               AND (?2 IS NULL OR category = ?2)
               AND (?3 IS NULL OR region = ?3)
             ORDER BY scope, category, subcategory"
        ))?;
        let rows = stmt.query_map(
            params![scope.map(|s| s.as_str()), category, region],
            factor_from_row,
        )?;

        let mut factors = Vec::new();
        for row in rows {
            factors.push(row?);
        }
        Ok(factors)
    }

    /// Soft-delete a factor. Existing records keep their frozen
    /// snapshot; only the explanatory reference goes stale.
    pub fn soft_delete_factor(&self, id: &str) -> Result<bool, CoreError> {
        let now = Utc::now().to_rfc3339();
        let changed = self.conn.execute(
            "UPDATE emission_factors SET deleted_at = ?1, updated_at = ?1
             WHERE id = ?2 AND deleted_at IS NULL",
            params![now, id],
        )?;
        Ok(changed > 0)
    }
}

fn map_unique_violation(err: rusqlite::Error, factor: &DbEmissionFactor) -> CoreError {
    if err.sqlite_error_code() == Some(rusqlite::ErrorCode::ConstraintViolation) {
        CoreError::Conflict(format!(
            "emission factor already exists for ({}, {}, {}, {}, {})",
            factor.scope.as_str(),
            factor.category,
            factor.subcategory,
            factor.region,
            factor.valid_year
        ))
    } else {
        CoreError::Storage(err)
    }
}
