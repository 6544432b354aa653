//! Monthly summary rows: the pre-aggregated cache the dashboard reads.
//!
//! Every row is derivable from `emission_records`; the aggregation
//! service owns the rebuild. The facility column stores '' for the
//! organization-wide rollup and the scope column stores '' for the
//! cross-scope total, so the four-part uniqueness key never contains
//! NULL (SQLite treats NULLs as distinct in UNIQUE indexes).

use rusqlite::params;
use rust_decimal::Decimal;
use uuid::Uuid;

use super::{DbSummaryRow, EmissionDb};
use crate::error::CoreError;

/// Scope value of the cross-scope total row.
pub const SCOPE_TOTAL: &str = "";

fn facility_key(facility_id: Option<&str>) -> &str {
    facility_id.unwrap_or("")
}

impl EmissionDb {
    /// Insert or refresh one summary row, keyed by
    /// (organization, facility, period, scope).
    pub fn upsert_summary(
        &self,
        organization_id: &str,
        facility_id: Option<&str>,
        period: &str,
        scope: &str,
        total_co2e: Decimal,
        record_count: i64,
        calculated_at: &str,
    ) -> Result<(), CoreError> {
        self.conn.execute(
            "INSERT INTO emission_summary_monthly (
                id, organization_id, facility_id, reporting_period, scope,
                total_co2e, record_count, last_calculated_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
             ON CONFLICT(organization_id, facility_id, reporting_period, scope)
             DO UPDATE SET
                total_co2e = excluded.total_co2e,
                record_count = excluded.record_count,
                last_calculated_at = excluded.last_calculated_at",
            params![
                Uuid::new_v4().to_string(),
                organization_id,
                facility_key(facility_id),
                period,
                scope,
                total_co2e.to_string(),
                record_count,
                calculated_at,
            ],
        )?;
        Ok(())
    }

    /// Scope values currently present for one (organization, facility,
    /// period), including the '' total row if it exists.
    pub fn summary_scopes(
        &self,
        organization_id: &str,
        facility_id: Option<&str>,
        period: &str,
    ) -> Result<Vec<String>, CoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT scope FROM emission_summary_monthly
             WHERE organization_id = ?1 AND facility_id = ?2 AND reporting_period = ?3
             ORDER BY scope",
        )?;
        let rows = stmt.query_map(
            params![organization_id, facility_key(facility_id), period],
            |row| row.get::<_, String>(0),
        )?;

        let mut scopes = Vec::new();
        for row in rows {
            scopes.push(row?);
        }
        Ok(scopes)
    }

    /// Delete one summary row. Used to drop scopes whose last record
    /// disappeared.
    pub fn delete_summary_row(
        &self,
        organization_id: &str,
        facility_id: Option<&str>,
        period: &str,
        scope: &str,
    ) -> Result<(), CoreError> {
        self.conn.execute(
            "DELETE FROM emission_summary_monthly
             WHERE organization_id = ?1 AND facility_id = ?2
               AND reporting_period = ?3 AND scope = ?4",
            params![organization_id, facility_key(facility_id), period, scope],
        )?;
        Ok(())
    }

    /// Delete every summary row for one (organization, facility, period).
    /// Used when a period no longer has any active records.
    pub fn delete_period_summaries(
        &self,
        organization_id: &str,
        facility_id: Option<&str>,
        period: &str,
    ) -> Result<(), CoreError> {
        self.conn.execute(
            "DELETE FROM emission_summary_monthly
             WHERE organization_id = ?1 AND facility_id = ?2 AND reporting_period = ?3",
            params![organization_id, facility_key(facility_id), period],
        )?;
        Ok(())
    }

    /// Read summary rows for one (organization, facility) slice,
    /// optionally restricted to a period, ordered by (period, scope).
    pub fn get_summaries(
        &self,
        organization_id: &str,
        facility_id: Option<&str>,
        period: Option<&str>,
    ) -> Result<Vec<DbSummaryRow>, CoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, organization_id, facility_id, reporting_period, scope,
                    total_co2e, record_count, last_calculated_at
             FROM emission_summary_monthly
             WHERE organization_id = ?1 AND facility_id = ?2
               AND (?3 IS NULL OR reporting_period = ?3)
             ORDER BY reporting_period, scope",
        )?;
        let rows = stmt.query_map(
            params![organization_id, facility_key(facility_id), period],
            |row| {
                Ok(DbSummaryRow {
                    id: row.get(0)?,
                    organization_id: row.get(1)?,
                    facility_id: super::types::facility_sentinel_col(row, 2)?,
                    reporting_period: row.get(3)?,
                    scope: row.get(4)?,
                    total_co2e: super::types::decimal_col(row, 5)?,
                    record_count: row.get(6)?,
                    last_calculated_at: row.get(7)?,
                })
            },
        )?;

        let mut summaries = Vec::new();
        for row in rows {
            summaries.push(row?);
        }
        Ok(summaries)
    }

    /// Distinct periods present in the summary table for one
    /// (organization, facility) slice, ascending.
    pub fn summary_periods(
        &self,
        organization_id: &str,
        facility_id: Option<&str>,
    ) -> Result<Vec<String>, CoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT DISTINCT reporting_period FROM emission_summary_monthly
             WHERE organization_id = ?1 AND facility_id = ?2
             ORDER BY reporting_period",
        )?;
        let rows = stmt.query_map(
            params![organization_id, facility_key(facility_id)],
            |row| row.get::<_, String>(0),
        )?;

        let mut periods = Vec::new();
        for row in rows {
            periods.push(row?);
        }
        Ok(periods)
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use rust_decimal::Decimal;

    use crate::db::summaries::SCOPE_TOTAL;
    use crate::db::test_utils::test_db_with_org;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_upsert_is_idempotent_on_key() {
        let (db, org_id) = test_db_with_org();
        db.upsert_summary(&org_id, None, "2024-03", "scope1", dec("10"), 2, "t1")
            .expect("insert");
        db.upsert_summary(&org_id, None, "2024-03", "scope1", dec("12.5"), 3, "t2")
            .expect("update");

        let rows = db.get_summaries(&org_id, None, Some("2024-03")).expect("get");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].total_co2e, dec("12.5"));
        assert_eq!(rows[0].record_count, 3);
        assert_eq!(rows[0].last_calculated_at, "t2");
    }

    #[test]
    fn test_org_total_and_facility_rows_do_not_collide() {
        let (db, org_id) = test_db_with_org();
        db.upsert_summary(&org_id, None, "2024-03", SCOPE_TOTAL, dec("100"), 5, "t")
            .expect("org total");
        db.upsert_summary(&org_id, Some("fac-1"), "2024-03", SCOPE_TOTAL, dec("40"), 2, "t")
            .expect("facility total");

        let org_rows = db.get_summaries(&org_id, None, None).expect("org");
        assert_eq!(org_rows.len(), 1);
        assert!(org_rows[0].facility_id.is_none());
        assert_eq!(org_rows[0].total_co2e, dec("100"));

        let fac_rows = db.get_summaries(&org_id, Some("fac-1"), None).expect("fac");
        assert_eq!(fac_rows.len(), 1);
        assert_eq!(fac_rows[0].facility_id.as_deref(), Some("fac-1"));
        assert_eq!(fac_rows[0].total_co2e, dec("40"));
    }

    #[test]
    fn test_delete_period_summaries() {
        let (db, org_id) = test_db_with_org();
        db.upsert_summary(&org_id, None, "2024-01", "scope1", dec("1"), 1, "t")
            .expect("jan");
        db.upsert_summary(&org_id, None, "2024-01", SCOPE_TOTAL, dec("1"), 1, "t")
            .expect("jan total");
        db.upsert_summary(&org_id, None, "2024-02", "scope1", dec("2"), 1, "t")
            .expect("feb");

        db.delete_period_summaries(&org_id, None, "2024-01")
            .expect("delete");

        let periods = db.summary_periods(&org_id, None).expect("periods");
        assert_eq!(periods, vec!["2024-02".to_string()]);
    }

    #[test]
    fn test_summary_scopes_listing() {
        let (db, org_id) = test_db_with_org();
        db.upsert_summary(&org_id, None, "2024-03", "scope2", dec("3"), 1, "t")
            .expect("s2");
        db.upsert_summary(&org_id, None, "2024-03", SCOPE_TOTAL, dec("3"), 1, "t")
            .expect("total");

        let scopes = db.summary_scopes(&org_id, None, "2024-03").expect("scopes");
        assert_eq!(scopes, vec!["".to_string(), "scope2".to_string()]);

        db.delete_summary_row(&org_id, None, "2024-03", "scope2")
            .expect("drop scope2");
        let scopes = db.summary_scopes(&org_id, None, "2024-03").expect("scopes");
        assert_eq!(scopes, vec!["".to_string()]);
    }
}
