//! Record ingestion: validate, calculate, persist — atomically.
//!
//! Ingestion never touches the summary table; aggregation is a
//! separate, explicitly-triggered pass. That decoupling keeps single
//! and bulk entry paths identical in behavior.

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;

use crate::calc::{self, CalcOptions};
use crate::db::{DbEmissionRecord, EmissionDb};
use crate::error::CoreError;
use crate::period;
use crate::types::{CalculationMethod, RecordStatus, Scope};

/// Inbound payload for one emission record.
///
/// `calculation_method` is optional: when absent it is inferred from
/// the category text, which is only a migration aid for legacy callers.
/// `reporting_period` is likewise optional and derived from
/// `activity_date` when absent.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEmissionRecord {
    #[serde(default)]
    pub facility_id: Option<String>,
    pub scope: Scope,
    pub category: String,
    #[serde(default)]
    pub subcategory: String,
    pub quantity: Decimal,
    pub unit: String,
    /// Factor value frozen into the record at entry time.
    pub emission_factor_used: Decimal,
    /// Optional live reference to the factor row the value came from.
    #[serde(default)]
    pub emission_factor_id: Option<String>,
    #[serde(default)]
    pub calculation_method: Option<CalculationMethod>,
    pub activity_date: NaiveDate,
    #[serde(default)]
    pub reporting_period: Option<String>,
    #[serde(default)]
    pub data_source: Option<String>,
    #[serde(default)]
    pub status: Option<RecordStatus>,
    #[serde(default)]
    pub notes: String,
    /// Free-form detail payload, persisted alongside the record.
    #[serde(default)]
    pub details: Option<serde_json::Value>,
}

/// Create one emission record (plus its optional detail payload) in a
/// single transaction.
pub fn create_record(
    db: &EmissionDb,
    organization_id: &str,
    payload: NewEmissionRecord,
    options: &CalcOptions,
) -> Result<DbEmissionRecord, CoreError> {
    let (record, details) = build_record(db, organization_id, payload, options)?;
    db.with_transaction(|db| db.insert_record(&record, details.as_ref()))?;
    tracing::info!(
        record_id = %record.id,
        scope = record.scope.as_str(),
        period = %record.reporting_period,
        co2e = %record.co2e_calculated,
        "emission record created"
    );
    Ok(record)
}

/// Create a batch of emission records in ONE transaction.
///
/// All-or-nothing: any invalid row rolls back the entire batch, and the
/// error names the offending row index.
pub fn bulk_create(
    db: &EmissionDb,
    organization_id: &str,
    payloads: Vec<NewEmissionRecord>,
    options: &CalcOptions,
) -> Result<Vec<DbEmissionRecord>, CoreError> {
    let count = payloads.len();
    let records = db.with_transaction(|db| {
        let mut records = Vec::with_capacity(count);
        for (idx, payload) in payloads.into_iter().enumerate() {
            let (record, details) = build_record(db, organization_id, payload, options)
                .map_err(|e| prefix_row(idx, e))?;
            db.insert_record(&record, details.as_ref())
                .map_err(|e| prefix_row(idx, e))?;
            records.push(record);
        }
        Ok(records)
    })?;
    tracing::info!(count, organization_id, "bulk emission records created");
    Ok(records)
}

fn prefix_row(idx: usize, err: CoreError) -> CoreError {
    match err {
        CoreError::Validation(msg) => CoreError::Validation(format!("record {idx}: {msg}")),
        other => other,
    }
}

/// Validate a payload against the database and turn it into a row.
/// No writes happen here.
fn build_record(
    db: &EmissionDb,
    organization_id: &str,
    payload: NewEmissionRecord,
    options: &CalcOptions,
) -> Result<(DbEmissionRecord, Option<serde_json::Value>), CoreError> {
    if db.get_organization(organization_id)?.is_none() {
        return Err(CoreError::not_found("Organization", organization_id));
    }
    if let Some(facility_id) = payload.facility_id.as_deref() {
        let facility = db
            .get_facility(facility_id)?
            .ok_or_else(|| CoreError::not_found("Facility", facility_id))?;
        if facility.organization_id != organization_id {
            return Err(CoreError::Validation(format!(
                "facility {facility_id} does not belong to this organization"
            )));
        }
    }
    if payload.category.trim().is_empty() {
        return Err(CoreError::Validation("category is required".to_string()));
    }
    if payload.unit.trim().is_empty() {
        return Err(CoreError::Validation("unit is required".to_string()));
    }
    if payload.emission_factor_used < Decimal::ZERO {
        return Err(CoreError::Validation(
            "emission factor cannot be negative".to_string(),
        ));
    }
    if let Some(factor_id) = payload.emission_factor_id.as_deref() {
        if db.get_factor(factor_id)?.is_none() {
            return Err(CoreError::not_found("EmissionFactor", factor_id));
        }
    }

    let reporting_period = match payload.reporting_period {
        Some(p) => {
            period::validate_period(&p)?;
            p
        }
        None => period::period_from_date(payload.activity_date),
    };

    let method = payload
        .calculation_method
        .unwrap_or_else(|| CalculationMethod::infer(&payload.category));

    // Also rejects negative quantity.
    let co2e = calc::calculate(method, payload.quantity, payload.emission_factor_used, options)?;

    let now = Utc::now().to_rfc3339();
    let record = DbEmissionRecord {
        id: Uuid::new_v4().to_string(),
        organization_id: organization_id.to_string(),
        facility_id: payload.facility_id,
        scope: payload.scope,
        category: payload.category,
        subcategory: payload.subcategory,
        quantity: payload.quantity,
        unit: payload.unit,
        emission_factor_used: payload.emission_factor_used,
        emission_factor_id: payload.emission_factor_id,
        calculation_method: method,
        co2e_calculated: co2e,
        activity_date: payload.activity_date.to_string(),
        reporting_period,
        data_source: payload
            .data_source
            .unwrap_or_else(|| "manual_entry".to_string()),
        status: payload.status.unwrap_or_default(),
        notes: payload.notes,
        created_at: now.clone(),
        updated_at: now,
        deleted_at: None,
    };
    Ok((record, payload.details))
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    use super::{bulk_create, create_record, NewEmissionRecord};
    use crate::calc::CalcOptions;
    use crate::db::test_utils::test_db_with_org;
    use crate::error::CoreError;
    use crate::types::{CalculationMethod, RecordStatus, Scope};

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn diesel_payload(quantity: &str) -> NewEmissionRecord {
        NewEmissionRecord {
            facility_id: None,
            scope: Scope::Scope1,
            category: "Diesel".to_string(),
            subcategory: "Stationary".to_string(),
            quantity: dec(quantity),
            unit: "liter".to_string(),
            emission_factor_used: dec("2.68787"),
            emission_factor_id: None,
            calculation_method: None,
            activity_date: NaiveDate::from_ymd_opt(2024, 3, 17).unwrap(),
            reporting_period: None,
            data_source: None,
            status: None,
            notes: String::new(),
            details: None,
        }
    }

    #[test]
    fn test_create_record_derives_period_and_co2e() {
        let (db, org_id) = test_db_with_org();
        let record = create_record(&db, &org_id, diesel_payload("100"), &CalcOptions::default())
            .expect("create");

        assert_eq!(record.reporting_period, "2024-03");
        assert_eq!(record.co2e_calculated, dec("268.787"));
        assert_eq!(record.calculation_method, CalculationMethod::Standard);
        assert_eq!(record.status, RecordStatus::Draft);
        assert_eq!(record.data_source, "manual_entry");

        let stored = db.get_record(&record.id).expect("get").expect("persisted");
        assert_eq!(stored.co2e_calculated, record.co2e_calculated);
    }

    #[test]
    fn test_explicit_method_overrides_inference() {
        let (db, org_id) = test_db_with_org();
        let mut payload = diesel_payload("100");
        payload.category = "Business Air Travel".to_string();
        payload.calculation_method = Some(CalculationMethod::Standard);

        let record =
            create_record(&db, &org_id, payload, &CalcOptions::default()).expect("create");
        // Inference would have picked radiative forcing; explicit wins.
        assert_eq!(record.calculation_method, CalculationMethod::Standard);
        assert_eq!(record.co2e_calculated, dec("268.787"));
    }

    #[test]
    fn test_inferred_radiative_forcing() {
        let (db, org_id) = test_db_with_org();
        let mut payload = diesel_payload("1000");
        payload.category = "Flight - Long Haul (Economy)".to_string();
        payload.emission_factor_used = dec("0.147");

        let record =
            create_record(&db, &org_id, payload, &CalcOptions::default()).expect("create");
        assert_eq!(record.calculation_method, CalculationMethod::RadiativeForcing);
        assert_eq!(record.co2e_calculated, dec("279.3"));
    }

    #[test]
    fn test_invalid_supplied_period_rejected() {
        let (db, org_id) = test_db_with_org();
        let mut payload = diesel_payload("1");
        payload.reporting_period = Some("2024-13".to_string());

        let err = create_record(&db, &org_id, payload, &CalcOptions::default()).unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
    }

    #[test]
    fn test_unknown_organization() {
        let (db, _org_id) = test_db_with_org();
        let err = create_record(&db, "missing", diesel_payload("1"), &CalcOptions::default())
            .unwrap_err();
        assert!(matches!(err, CoreError::NotFound { .. }));
    }

    #[test]
    fn test_facility_must_belong_to_org() {
        let (db, org_id) = test_db_with_org();
        let other_org = db
            .create_organization(&crate::db::NewOrganization {
                name: "Other Corp".to_string(),
                ..Default::default()
            })
            .expect("other org");
        let foreign = db
            .create_facility(
                &other_org.id,
                &crate::db::NewFacility {
                    name: "Foreign Plant".to_string(),
                    ..Default::default()
                },
            )
            .expect("facility");

        let mut payload = diesel_payload("1");
        payload.facility_id = Some(foreign.id);
        let err = create_record(&db, &org_id, payload, &CalcOptions::default()).unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
    }

    #[test]
    fn test_details_persisted_with_record() {
        let (db, org_id) = test_db_with_org();
        let mut payload = diesel_payload("1");
        payload.details = Some(serde_json::json!({"vehicle": "FLT-042"}));

        let record =
            create_record(&db, &org_id, payload, &CalcOptions::default()).expect("create");
        let details = db
            .get_record_details(&record.id)
            .expect("get")
            .expect("stored");
        assert_eq!(details["vehicle"], "FLT-042");
    }

    #[test]
    fn test_bulk_create_all_or_nothing() {
        let (db, org_id) = test_db_with_org();

        // Bad row in the middle: negative quantity.
        let batch = vec![
            diesel_payload("10"),
            diesel_payload("-5"),
            diesel_payload("20"),
        ];
        let err = bulk_create(&db, &org_id, batch, &CalcOptions::default()).unwrap_err();
        match err {
            CoreError::Validation(msg) => assert!(msg.starts_with("record 1:"), "got {msg}"),
            other => panic!("expected validation error, got {other:?}"),
        }
        assert!(db.list_records(&org_id, None, false).expect("list").is_empty());

        // Bad row last.
        let batch = vec![diesel_payload("10"), diesel_payload("-1")];
        assert!(bulk_create(&db, &org_id, batch, &CalcOptions::default()).is_err());
        assert!(db.list_records(&org_id, None, false).expect("list").is_empty());

        // Clean batch commits.
        let batch = vec![diesel_payload("10"), diesel_payload("20")];
        let records = bulk_create(&db, &org_id, batch, &CalcOptions::default()).expect("bulk");
        assert_eq!(records.len(), 2);
        assert_eq!(db.list_records(&org_id, None, false).expect("list").len(), 2);
    }

    #[test]
    fn test_payload_deserializes_from_json() {
        let payload: NewEmissionRecord = serde_json::from_str(
            r#"{
                "scope": "scope3",
                "category": "Business Travel",
                "subcategory": "Taxis",
                "quantity": "12.5",
                "unit": "km",
                "emissionFactorUsed": "0.203",
                "activityDate": "2024-06-02",
                "calculationMethod": "standard"
            }"#,
        )
        .expect("deserialize");
        assert_eq!(payload.scope, Scope::Scope3);
        assert_eq!(payload.quantity, dec("12.5"));
        assert_eq!(payload.calculation_method, Some(CalculationMethod::Standard));
        assert!(payload.reporting_period.is_none());
    }
}
