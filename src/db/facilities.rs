//! Facility rows: physical locations that optionally scope emission
//! records and per-facility summaries.

use chrono::Utc;
use rusqlite::params;
use uuid::Uuid;

use super::{DbFacility, EmissionDb, NewFacility};
use crate::error::CoreError;

impl EmissionDb {
    /// Create a facility under an organization.
    pub fn create_facility(
        &self,
        organization_id: &str,
        new: &NewFacility,
    ) -> Result<DbFacility, CoreError> {
        if new.name.trim().is_empty() {
            return Err(CoreError::Validation(
                "facility name is required".to_string(),
            ));
        }
        if self.get_organization(organization_id)?.is_none() {
            return Err(CoreError::not_found("Organization", organization_id));
        }
        let now = Utc::now().to_rfc3339();
        let facility = DbFacility {
            id: Uuid::new_v4().to_string(),
            organization_id: organization_id.to_string(),
            name: new.name.clone(),
            facility_type: new.facility_type.clone(),
            city: new.city.clone(),
            country: new.country.clone(),
            grid_region: new.grid_region.clone(),
            is_active: true,
            created_at: now.clone(),
            updated_at: now,
            deleted_at: None,
        };
        self.conn.execute(
            "INSERT INTO facilities (
                id, organization_id, name, facility_type, city, country,
                grid_region, is_active, created_at, updated_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                facility.id,
                facility.organization_id,
                facility.name,
                facility.facility_type,
                facility.city,
                facility.country,
                facility.grid_region,
                facility.is_active,
                facility.created_at,
                facility.updated_at,
            ],
        )?;
        Ok(facility)
    }

    /// Get an active facility by ID.
    pub fn get_facility(&self, id: &str) -> Result<Option<DbFacility>, CoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, organization_id, name, facility_type, city, country,
                    grid_region, is_active, created_at, updated_at, deleted_at
             FROM facilities
             WHERE id = ?1 AND deleted_at IS NULL",
        )?;

        let mut rows = stmt.query_map(params![id], |row| {
            Ok(DbFacility {
                id: row.get(0)?,
                organization_id: row.get(1)?,
                name: row.get(2)?,
                facility_type: row.get(3)?,
                city: row.get(4)?,
                country: row.get(5)?,
                grid_region: row.get(6)?,
                is_active: row.get(7)?,
                created_at: row.get(8)?,
                updated_at: row.get(9)?,
                deleted_at: row.get(10)?,
            })
        })?;

        match rows.next() {
            Some(row) => Ok(Some(row?)),
            None => Ok(None),
        }
    }

    /// List active facilities for an organization, ordered by name.
    pub fn get_facilities_for_org(
        &self,
        organization_id: &str,
    ) -> Result<Vec<DbFacility>, CoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, organization_id, name, facility_type, city, country,
                    grid_region, is_active, created_at, updated_at, deleted_at
             FROM facilities
             WHERE organization_id = ?1 AND deleted_at IS NULL
             ORDER BY name",
        )?;

        let rows = stmt.query_map(params![organization_id], |row| {
            Ok(DbFacility {
                id: row.get(0)?,
                organization_id: row.get(1)?,
                name: row.get(2)?,
                facility_type: row.get(3)?,
                city: row.get(4)?,
                country: row.get(5)?,
                grid_region: row.get(6)?,
                is_active: row.get(7)?,
                created_at: row.get(8)?,
                updated_at: row.get(9)?,
                deleted_at: row.get(10)?,
            })
        })?;

        let mut facilities = Vec::new();
        for row in rows {
            facilities.push(row?);
        }
        Ok(facilities)
    }
}
