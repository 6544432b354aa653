//! Service layer: the operations external collaborators call.
//!
//! Each service is a thin orchestration over `EmissionDb` — validation,
//! calculation and transaction boundaries live here, SQL lives in the
//! db layer.

pub mod analytics;
pub mod factors;
pub mod ingestion;
