//! Concilia Core - Domain models, aggregation, and safe rendering.
//!
//! This crate contains the presentation-layer core for the reconciliation
//! dashboard. It is transport-agnostic: the HTTP boundary lives in the
//! `concilia-client` crate and the orchestration in `apps/dashboard`.

pub mod constants;
pub mod currency;
pub mod errors;
pub mod events;
pub mod kpi;
pub mod render;
pub mod snapshot;
pub mod upload;

// Re-export common types from the snapshot and KPI modules
pub use kpi::*;
pub use snapshot::*;

// Re-export error types
pub use errors::Error;
pub use errors::Result;
