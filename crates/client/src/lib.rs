//! Concilia Client - the dashboard's HTTP boundary.
//!
//! Every endpoint has an explicit wire schema; payloads are validated and
//! coerced here, so downstream views never touch duck-typed JSON. Failures
//! surface as the typed errors from `concilia-core::errors`.

pub mod client;
pub mod models;

pub use client::{ApiClient, DetailFetcher};
pub use models::{DetailPage, DetailQuery, ProcessRequest, ReconciliationOutcome};
