//! Organization rows: the owning entity for facilities, records and
//! summaries.

use chrono::Utc;
use rusqlite::params;
use uuid::Uuid;

use super::{DbOrganization, EmissionDb, NewOrganization};
use crate::error::CoreError;

impl EmissionDb {
    /// Create an organization.
    pub fn create_organization(
        &self,
        new: &NewOrganization,
    ) -> Result<DbOrganization, CoreError> {
        if new.name.trim().is_empty() {
            return Err(CoreError::Validation(
                "organization name is required".to_string(),
            ));
        }
        let now = Utc::now().to_rfc3339();
        let org = DbOrganization {
            id: Uuid::new_v4().to_string(),
            name: new.name.clone(),
            industry: new.industry.clone(),
            country: new.country.clone(),
            baseline_year: new.baseline_year,
            fiscal_year_start: new.fiscal_year_start.clone(),
            is_active: true,
            created_at: now.clone(),
            updated_at: now,
            deleted_at: None,
        };
        self.conn.execute(
            "INSERT INTO organizations (
                id, name, industry, country, baseline_year, fiscal_year_start,
                is_active, created_at, updated_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                org.id,
                org.name,
                org.industry,
                org.country,
                org.baseline_year,
                org.fiscal_year_start,
                org.is_active,
                org.created_at,
                org.updated_at,
            ],
        )?;
        Ok(org)
    }

    /// Get an active organization by ID.
    pub fn get_organization(&self, id: &str) -> Result<Option<DbOrganization>, CoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, industry, country, baseline_year, fiscal_year_start,
                    is_active, created_at, updated_at, deleted_at
             FROM organizations
             WHERE id = ?1 AND deleted_at IS NULL",
        )?;

        let mut rows = stmt.query_map(params![id], |row| {
            Ok(DbOrganization {
                id: row.get(0)?,
                name: row.get(1)?,
                industry: row.get(2)?,
                country: row.get(3)?,
                baseline_year: row.get(4)?,
                fiscal_year_start: row.get(5)?,
                is_active: row.get(6)?,
                created_at: row.get(7)?,
                updated_at: row.get(8)?,
                deleted_at: row.get(9)?,
            })
        })?;

        match rows.next() {
            Some(row) => Ok(Some(row?)),
            None => Ok(None),
        }
    }

    /// Soft-delete an organization. Returns false if no active row matched.
    pub fn soft_delete_organization(&self, id: &str) -> Result<bool, CoreError> {
        let now = Utc::now().to_rfc3339();
        let changed = self.conn.execute(
            "UPDATE organizations SET deleted_at = ?1, updated_at = ?1
             WHERE id = ?2 AND deleted_at IS NULL",
            params![now, id],
        )?;
        Ok(changed > 0)
    }
}

#[cfg(test)]
mod tests {
    use crate::db::test_utils::test_db;
    use crate::db::NewOrganization;

    #[test]
    fn test_create_and_get_organization() {
        let db = test_db();
        let org = db
            .create_organization(&NewOrganization {
                name: "Acme Manufacturing".to_string(),
                industry: "Manufacturing".to_string(),
                country: "US".to_string(),
                ..Default::default()
            })
            .expect("create");

        let fetched = db.get_organization(&org.id).expect("get").expect("exists");
        assert_eq!(fetched.name, "Acme Manufacturing");
        assert_eq!(fetched.baseline_year, 2023);
        assert_eq!(fetched.fiscal_year_start, "01-01");
        assert!(fetched.is_active);
    }

    #[test]
    fn test_create_organization_requires_name() {
        let db = test_db();
        let err = db
            .create_organization(&NewOrganization::default())
            .unwrap_err();
        assert!(matches!(err, crate::error::CoreError::Validation(_)));
    }

    #[test]
    fn test_soft_deleted_organization_hidden() {
        let db = test_db();
        let org = db
            .create_organization(&NewOrganization {
                name: "Gone Corp".to_string(),
                ..Default::default()
            })
            .expect("create");

        assert!(db.soft_delete_organization(&org.id).expect("delete"));
        assert!(db.get_organization(&org.id).expect("get").is_none());

        // Second delete is a no-op
        assert!(!db.soft_delete_organization(&org.id).expect("delete again"));
    }
}
