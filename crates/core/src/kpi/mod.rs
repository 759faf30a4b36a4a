//! KPI aggregation: grouped views derived from a snapshot.

mod kpi_model;
mod kpi_view;

pub use kpi_model::{AcquirerRow, AcquirerTag, KpiSummary};
pub use kpi_view::{classify, derive_acquirer_rows, detect_brand, filter_rows_by_acquirer, summary};
