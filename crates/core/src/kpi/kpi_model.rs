//! KPI view models.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::snapshot::AcquirerFigures;

/// One acquirer with its aggregate figures, in render order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AcquirerRow {
    pub name: String,
    pub figures: AcquirerFigures,
}

/// Best-effort display classification of an acquirer name.
///
/// Used for card styling and icons only, never as a business rule; any name
/// outside the known set tolerantly maps to `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AcquirerTag {
    Cielo,
    Rede,
    Stone,
    Getnet,
    PagSeguro,
    Other,
}

impl AcquirerTag {
    /// Stable identifier used in CSS class names.
    pub fn as_str(&self) -> &'static str {
        match self {
            AcquirerTag::Cielo => "cielo",
            AcquirerTag::Rede => "rede",
            AcquirerTag::Stone => "stone",
            AcquirerTag::Getnet => "getnet",
            AcquirerTag::PagSeguro => "pagseguro",
            AcquirerTag::Other => "other",
        }
    }
}

/// The four headline figures shown as KPI tiles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KpiSummary {
    pub total_sales: Decimal,
    pub total_received: Decimal,
    /// Signed variance: received minus sales.
    pub difference: Decimal,
    pub alert_count: u32,
}
