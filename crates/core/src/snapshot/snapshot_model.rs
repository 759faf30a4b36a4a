//! Snapshot domain models.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

use crate::constants::{DIFFERENCE_TOLERANCE, UNASSIGNED_ACQUIRER};

/// Reconciliation status of a sale row.
///
/// Derived server-side; the client only displays and color-codes it and
/// never recomputes it. Unknown wire values coerce to `Pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ReconciliationStatus {
    #[default]
    Pending,
    Partial,
    Reconciled,
}

impl ReconciliationStatus {
    /// Maps the wire status string, coercing anything unknown to `Pending`.
    pub fn from_wire(raw: &str) -> Self {
        match raw {
            "conciliado" => ReconciliationStatus::Reconciled,
            "parcial" => ReconciliationStatus::Partial,
            _ => ReconciliationStatus::Pending,
        }
    }

    /// CSS class used to color-code the status cell.
    pub fn css_class(&self) -> &'static str {
        match self {
            ReconciliationStatus::Reconciled => "status-ok",
            ReconciliationStatus::Partial => "status-parcial",
            ReconciliationStatus::Pending => "status-pendente",
        }
    }

    /// Display label in the dashboard's locale.
    pub fn label(&self) -> &'static str {
        match self {
            ReconciliationStatus::Reconciled => "conciliado",
            ReconciliationStatus::Partial => "parcial",
            ReconciliationStatus::Pending => "pendente",
        }
    }
}

/// Per-acquirer aggregate figures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AcquirerFigures {
    pub sales: Decimal,
    pub received: Decimal,
    pub difference: Decimal,
}

/// One sale-side transaction record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleRow {
    pub date: Option<NaiveDate>,
    pub acquirer: Option<String>,
    pub brand: Option<String>,
    #[serde(default)]
    pub description: String,
    pub gross_value: Decimal,
    pub net_value: Decimal,
    pub expected_settlement_date: Option<NaiveDate>,
    pub settled_value: Option<Decimal>,
    pub settlement_date: Option<NaiveDate>,
    pub bank: Option<String>,
    pub status: ReconciliationStatus,
}

impl SaleRow {
    /// Acquirer display name; rows without one fall into the unassigned
    /// category.
    pub fn acquirer_or_default(&self) -> &str {
        match self.acquirer.as_deref() {
            Some(name) if !name.is_empty() => name,
            _ => UNASSIGNED_ACQUIRER,
        }
    }

    /// Net value minus what was settled so far; positive means money is
    /// still owed.
    pub fn settlement_difference(&self) -> Decimal {
        self.net_value - self.settled_value.unwrap_or_default()
    }
}

/// One bank-side receipt record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptRow {
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub description: String,
    pub value: Decimal,
    pub reconciled_value: Option<Decimal>,
    pub bank: Option<String>,
    pub reconciled: bool,
}

/// Transaction-level detail attached to a snapshot, when present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotDetail {
    #[serde(default)]
    pub sales: Vec<SaleRow>,
    #[serde(default)]
    pub received: Vec<ReceiptRow>,
}

/// The most recently fetched aggregate payload.
///
/// Replaced wholesale on every successful fetch, never partially mutated;
/// consumers share it read-only behind an `Arc`. Absent optional fields mean
/// "not computed", never zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub total_sales: Decimal,
    pub total_received: Decimal,
    /// Signed: `total_received - total_sales`.
    pub difference: Decimal,
    pub alert_count: u32,
    /// Acquirer display name -> figures. `BTreeMap` keeps iteration in
    /// ascending ordinal order, so renders are deterministic.
    #[serde(default)]
    pub acquirers: BTreeMap<String, AcquirerFigures>,
    /// Sales total per card brand.
    pub brands: Option<BTreeMap<String, Decimal>>,
    pub detail: Option<SnapshotDetail>,
    pub fetched_at: DateTime<Utc>,
}

impl Snapshot {
    /// The difference the totals imply.
    pub fn expected_difference(&self) -> Decimal {
        self.total_received - self.total_sales
    }

    /// Whether the carried difference agrees with the totals within the
    /// display tolerance.
    pub fn difference_consistent(&self) -> bool {
        let tolerance = Decimal::from_str(DIFFERENCE_TOLERANCE).unwrap_or(Decimal::ZERO);
        (self.difference - self.expected_difference()).abs() <= tolerance
    }
}
