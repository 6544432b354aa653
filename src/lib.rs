//! CarbonLedger: GHG emission calculation and aggregation core.
//!
//! The crate turns activity data ("we burned 100 liters of diesel in
//! March") into auditable CO2e records and fast pre-aggregated monthly
//! summaries:
//!
//! - [`calc`] — pure, decimal-exact CO2e calculation with the
//!   standard, GWP and radiative-forcing strategies.
//! - [`db`] — SQLite storage: the emission-factor library, the
//!   transactional record ledger with frozen factor snapshots, and the
//!   rebuildable monthly summary cache.
//! - [`services`] — ingestion (single and atomic bulk entry),
//!   aggregation/dashboard/trend reads, and factor lookup.
//! - [`seed`] — the built-in DEFRA/EPA 2024 starter factor set.
//!
//! Summaries are a materialized view over the records, never a source
//! of truth: ingestion does not touch them, and
//! [`services::analytics::recalculate`] rebuilds them idempotently.

pub mod calc;
pub mod db;
pub mod error;
pub mod migrations;
pub mod period;
pub mod seed;
pub mod services;
pub mod types;
