//! Concilia Dashboard - orchestration of the data pipeline and rendering.
//!
//! Owns the explicit context object (no ambient globals), the poll scheduler,
//! the chart renderer, the drill-down modal, and the upload pipeline. The
//! binary in `main.rs` wires a logging event sink; embedders provide their
//! own sink to apply artifacts to a real surface.

pub mod actions;
pub mod charts;
pub mod config;
pub mod controller;
pub mod modal;
pub mod scheduler;
pub mod upload;
pub mod views;

pub use config::Config;
pub use controller::{build_context, init_tracing, DashboardContext};
