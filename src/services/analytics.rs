//! Aggregation engine and dashboard reads.
//!
//! `recalculate` is the only writer of the monthly summary table. It is
//! idempotent: re-running over unchanged records converges to the same
//! rows, and periods whose records have all been soft-deleted get their
//! stale rows removed. Dashboard reads never fall back to scanning the
//! records table — callers are expected to recalculate first.

use std::collections::BTreeSet;

use chrono::Utc;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::db::summaries::SCOPE_TOTAL;
use crate::db::EmissionDb;
use crate::error::CoreError;
use crate::period;
use crate::types::Scope;

/// Fixed-shape dashboard feed for one organization.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSnapshot {
    pub total_emissions: Decimal,
    pub scope1: Decimal,
    pub scope2: Decimal,
    pub scope3: Decimal,
    pub record_count: i64,
    /// The requested period, or "All-Time" when none was given.
    pub period: String,
}

/// One point of the month-over-month trend feed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodTotal {
    pub period: String,
    pub total_co2e: Decimal,
    pub record_count: i64,
}

/// Rebuild monthly summary rows for an organization.
///
/// With a period given, only that period is rebuilt; otherwise every
/// period that currently has records or stale summary rows is visited.
/// With a facility given, the facility-scoped rows are rebuilt instead
/// of the organization-wide ones.
pub fn recalculate(
    db: &EmissionDb,
    organization_id: &str,
    period: Option<&str>,
    facility_id: Option<&str>,
) -> Result<(), CoreError> {
    if db.get_organization(organization_id)?.is_none() {
        return Err(CoreError::not_found("Organization", organization_id));
    }
    if let Some(fid) = facility_id {
        let facility = db
            .get_facility(fid)?
            .ok_or_else(|| CoreError::not_found("Facility", fid))?;
        if facility.organization_id != organization_id {
            return Err(CoreError::Validation(format!(
                "facility {fid} does not belong to this organization"
            )));
        }
    }

    let periods: Vec<String> = match period {
        Some(p) => {
            period::validate_period(p)?;
            vec![p.to_string()]
        }
        None => {
            // Union of live record periods and already-summarized
            // periods, so summaries left behind by deletions get cleaned
            // up too.
            let mut set: BTreeSet<String> = db
                .distinct_periods(organization_id, facility_id)?
                .into_iter()
                .collect();
            set.extend(db.summary_periods(organization_id, facility_id)?);
            set.into_iter().collect()
        }
    };

    let calculated_at = Utc::now().to_rfc3339();
    for p in &periods {
        rebuild_period(db, organization_id, facility_id, p, &calculated_at)?;
    }
    tracing::info!(
        organization_id,
        periods = periods.len(),
        facility = facility_id.unwrap_or("<org>"),
        "summary recalculation complete"
    );
    Ok(())
}

/// Rebuild the summary rows of one period inside one transaction.
fn rebuild_period(
    db: &EmissionDb,
    organization_id: &str,
    facility_id: Option<&str>,
    period: &str,
    calculated_at: &str,
) -> Result<(), CoreError> {
    db.with_transaction(|db| {
        let totals = db.scope_totals(organization_id, facility_id, period)?;
        if totals.is_empty() {
            // Every record in this period is gone; the cache follows.
            db.delete_period_summaries(organization_id, facility_id, period)?;
            return Ok(());
        }

        let mut grand_total = Decimal::ZERO;
        let mut grand_count = 0i64;
        let mut kept: BTreeSet<&str> = BTreeSet::new();
        kept.insert(SCOPE_TOTAL);
        for (scope, total, count) in &totals {
            db.upsert_summary(
                organization_id,
                facility_id,
                period,
                scope.as_str(),
                *total,
                *count,
                calculated_at,
            )?;
            kept.insert(scope.as_str());
            grand_total += *total;
            grand_count += *count;
        }
        db.upsert_summary(
            organization_id,
            facility_id,
            period,
            SCOPE_TOTAL,
            grand_total,
            grand_count,
            calculated_at,
        )?;

        // Scopes whose last record disappeared since the previous run.
        for scope in db.summary_scopes(organization_id, facility_id, period)? {
            if !kept.contains(scope.as_str()) {
                db.delete_summary_row(organization_id, facility_id, period, &scope)?;
            }
        }
        Ok(())
    })
}

/// Read the dashboard feed from the summary cache.
///
/// Organization-wide rows only; one period, or summed across all
/// periods under the "All-Time" label. Missing scopes are zeros.
pub fn get_dashboard(
    db: &EmissionDb,
    organization_id: &str,
    period: Option<&str>,
) -> Result<DashboardSnapshot, CoreError> {
    if db.get_organization(organization_id)?.is_none() {
        return Err(CoreError::not_found("Organization", organization_id));
    }
    if let Some(p) = period {
        period::validate_period(p)?;
    }

    let mut snapshot = DashboardSnapshot {
        total_emissions: Decimal::ZERO,
        scope1: Decimal::ZERO,
        scope2: Decimal::ZERO,
        scope3: Decimal::ZERO,
        record_count: 0,
        period: period.unwrap_or("All-Time").to_string(),
    };

    for row in db.get_summaries(organization_id, None, period)? {
        if row.scope == SCOPE_TOTAL {
            snapshot.total_emissions += row.total_co2e;
            snapshot.record_count += row.record_count;
        } else {
            match Scope::parse(&row.scope)? {
                Scope::Scope1 => snapshot.scope1 += row.total_co2e,
                Scope::Scope2 => snapshot.scope2 += row.total_co2e,
                Scope::Scope3 => snapshot.scope3 += row.total_co2e,
            }
        }
    }
    Ok(snapshot)
}

/// Month-over-month org totals, oldest first, restricted to the most
/// recent `last_n` periods that have summary rows.
pub fn get_trend(
    db: &EmissionDb,
    organization_id: &str,
    last_n: usize,
) -> Result<Vec<PeriodTotal>, CoreError> {
    if db.get_organization(organization_id)?.is_none() {
        return Err(CoreError::not_found("Organization", organization_id));
    }

    let mut points: Vec<PeriodTotal> = db
        .get_summaries(organization_id, None, None)?
        .into_iter()
        .filter(|row| row.scope == SCOPE_TOTAL)
        .map(|row| PeriodTotal {
            period: row.reporting_period,
            total_co2e: row.total_co2e,
            record_count: row.record_count,
        })
        .collect();
    if points.len() > last_n {
        points.drain(..points.len() - last_n);
    }
    Ok(points)
}
