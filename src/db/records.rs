//! Emission record rows: the append-mostly transactional ledger.
//!
//! Records are immutable once created, except for soft delete. The
//! optional detail payload lives in `scope_details` and is written
//! second, inside the same transaction as the record (ingestion owns
//! that transaction boundary).

use std::collections::BTreeMap;

use chrono::Utc;
use rusqlite::params;
use rust_decimal::Decimal;
use uuid::Uuid;

use super::{DbEmissionRecord, EmissionDb};
use crate::error::CoreError;
use crate::types::Scope;

const RECORD_COLUMNS: &str = "id, organization_id, facility_id, scope, category, subcategory,
                    quantity, unit, emission_factor_used, emission_factor_id,
                    calculation_method, co2e_calculated, activity_date, reporting_period,
                    data_source, status, notes, created_at, updated_at, deleted_at";

fn record_from_row(row: &rusqlite::Row) -> rusqlite::Result<DbEmissionRecord> {
    Ok(DbEmissionRecord {
        id: row.get(0)?,
        organization_id: row.get(1)?,
        facility_id: row.get(2)?,
        scope: super::types::scope_col(row, 3)?,
        category: row.get(4)?,
        subcategory: row.get(5)?,
        quantity: super::types::decimal_col(row, 6)?,
        unit: row.get(7)?,
        emission_factor_used: super::types::decimal_col(row, 8)?,
        emission_factor_id: row.get(9)?,
        calculation_method: super::types::method_col(row, 10)?,
        co2e_calculated: super::types::decimal_col(row, 11)?,
        activity_date: row.get(12)?,
        reporting_period: row.get(13)?,
        data_source: row.get(14)?,
        status: super::types::status_col(row, 15)?,
        notes: row.get(16)?,
        created_at: row.get(17)?,
        updated_at: row.get(18)?,
        deleted_at: row.get(19)?,
    })
}

impl EmissionDb {
    /// Insert an emission record and, if supplied, its detail payload.
    ///
    /// Writes are ordered record-first. This method does NOT open a
    /// transaction; the ingestion service wraps it in one so that both
    /// rows persist or neither does.
    pub fn insert_record(
        &self,
        record: &DbEmissionRecord,
        details: Option<&serde_json::Value>,
    ) -> Result<(), CoreError> {
        self.conn.execute(
            "INSERT INTO emission_records (
                id, organization_id, facility_id, scope, category, subcategory,
                quantity, unit, emission_factor_used, emission_factor_id,
                calculation_method, co2e_calculated, activity_date, reporting_period,
                data_source, status, notes, created_at, updated_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10,
                       ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19)",
            params![
                record.id,
                record.organization_id,
                record.facility_id,
                record.scope.as_str(),
                record.category,
                record.subcategory,
                record.quantity.to_string(),
                record.unit,
                record.emission_factor_used.to_string(),
                record.emission_factor_id,
                record.calculation_method.as_str(),
                record.co2e_calculated.to_string(),
                record.activity_date,
                record.reporting_period,
                record.data_source,
                record.status.as_str(),
                record.notes,
                record.created_at,
                record.updated_at,
            ],
        )?;

        if let Some(payload) = details {
            let details_json = serde_json::to_string(payload).map_err(|e| {
                CoreError::Validation(format!("details payload is not serializable: {e}"))
            })?;
            self.conn.execute(
                "INSERT INTO scope_details (id, emission_record_id, details)
                 VALUES (?1, ?2, ?3)",
                params![Uuid::new_v4().to_string(), record.id, details_json],
            )?;
        }

        Ok(())
    }

    /// Get a record by ID (active rows only).
    pub fn get_record(&self, id: &str) -> Result<Option<DbEmissionRecord>, CoreError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {RECORD_COLUMNS}
             FROM emission_records
             WHERE id = ?1 AND deleted_at IS NULL"
        ))?;
        let mut rows = stmt.query_map(params![id], record_from_row)?;
        match rows.next() {
            Some(row) => Ok(Some(row?)),
            None => Ok(None),
        }
    }

    /// Get the detail payload attached to a record, if any.
    pub fn get_record_details(
        &self,
        record_id: &str,
    ) -> Result<Option<serde_json::Value>, CoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT details FROM scope_details WHERE emission_record_id = ?1",
        )?;
        let mut rows = stmt.query_map(params![record_id], |row| row.get::<_, String>(0))?;
        match rows.next() {
            Some(row) => {
                let raw = row?;
                let value = serde_json::from_str(&raw).map_err(|e| {
                    CoreError::Validation(format!("stored details payload is corrupt: {e}"))
                })?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    /// List an organization's records, newest activity first, optionally
    /// restricted to one reporting period. Active rows only unless
    /// `include_deleted` is set (audit use).
    pub fn list_records(
        &self,
        organization_id: &str,
        period: Option<&str>,
        include_deleted: bool,
    ) -> Result<Vec<DbEmissionRecord>, CoreError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {RECORD_COLUMNS}
             FROM emission_records
             WHERE organization_id = ?1
               AND (?2 IS NULL OR reporting_period = ?2)
               AND (?3 OR deleted_at IS NULL)
             ORDER BY activity_date DESC, created_at DESC"
        ))?;
        let rows = stmt.query_map(
            params![organization_id, period, include_deleted],
            record_from_row,
        )?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row?);
        }
        Ok(records)
    }

    /// Soft-delete a record. The next recalculation drops it from the
    /// summaries. Returns false if no active row matched.
    pub fn soft_delete_record(&self, id: &str) -> Result<bool, CoreError> {
        let now = Utc::now().to_rfc3339();
        let changed = self.conn.execute(
            "UPDATE emission_records SET deleted_at = ?1, updated_at = ?1
             WHERE id = ?2 AND deleted_at IS NULL",
            params![now, id],
        )?;
        Ok(changed > 0)
    }

    /// Distinct reporting periods touched by an organization's active
    /// records, ascending. When a facility is given, only that
    /// facility's records count.
    pub fn distinct_periods(
        &self,
        organization_id: &str,
        facility_id: Option<&str>,
    ) -> Result<Vec<String>, CoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT DISTINCT reporting_period
             FROM emission_records
             WHERE organization_id = ?1
               AND (?2 IS NULL OR facility_id = ?2)
               AND deleted_at IS NULL
             ORDER BY reporting_period",
        )?;
        let rows = stmt.query_map(params![organization_id, facility_id], |row| {
            row.get::<_, String>(0)
        })?;

        let mut periods = Vec::new();
        for row in rows {
            periods.push(row?);
        }
        Ok(periods)
    }

    /// Per-scope CO2e sum and record count for (organization, facility,
    /// period) over active records, ordered by scope.
    ///
    /// Summation happens in exact decimal on this side of the SQL
    /// boundary; SQLite's SUM over the TEXT columns would fall back to
    /// binary floating point.
    pub fn scope_totals(
        &self,
        organization_id: &str,
        facility_id: Option<&str>,
        period: &str,
    ) -> Result<Vec<(Scope, Decimal, i64)>, CoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT scope, co2e_calculated
             FROM emission_records
             WHERE organization_id = ?1
               AND (?2 IS NULL OR facility_id = ?2)
               AND reporting_period = ?3
               AND deleted_at IS NULL",
        )?;
        let rows = stmt.query_map(params![organization_id, facility_id, period], |row| {
            Ok((
                super::types::scope_col(row, 0)?,
                super::types::decimal_col(row, 1)?,
            ))
        })?;

        let mut totals: BTreeMap<&'static str, (Scope, Decimal, i64)> = BTreeMap::new();
        for row in rows {
            let (scope, co2e) = row?;
            let entry = totals
                .entry(scope.as_str())
                .or_insert((scope, Decimal::ZERO, 0));
            entry.1 += co2e;
            entry.2 += 1;
        }
        Ok(totals.into_values().collect())
    }
}
