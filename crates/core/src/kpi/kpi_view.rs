//! Derivations over a snapshot: acquirer grouping, classification, and
//! drill-down filtering. All functions are pure reads; the snapshot is never
//! mutated.

use crate::snapshot::{SaleRow, Snapshot};

use super::{AcquirerRow, AcquirerTag, KpiSummary};

/// The headline KPI figures of a snapshot.
pub fn summary(snapshot: &Snapshot) -> KpiSummary {
    KpiSummary {
        total_sales: snapshot.total_sales,
        total_received: snapshot.total_received,
        difference: snapshot.difference,
        alert_count: snapshot.alert_count,
    }
}

/// Acquirer rows sorted ascending by name (stable, case-sensitive ordinal),
/// so successive renders and test comparisons are deterministic.
pub fn derive_acquirer_rows(snapshot: &Snapshot) -> Vec<AcquirerRow> {
    // BTreeMap iterates in ascending ordinal key order already.
    snapshot
        .acquirers
        .iter()
        .map(|(name, figures)| AcquirerRow {
            name: name.clone(),
            figures: figures.clone(),
        })
        .collect()
}

/// Classifies a free-text acquirer name by case-insensitive substring match.
pub fn classify(name: &str) -> AcquirerTag {
    let lowered = name.to_lowercase();
    if lowered.contains("cielo") {
        AcquirerTag::Cielo
    } else if lowered.contains("rede") {
        AcquirerTag::Rede
    } else if lowered.contains("stone") {
        AcquirerTag::Stone
    } else if lowered.contains("getnet") {
        AcquirerTag::Getnet
    } else if lowered.contains("pagseguro") || lowered.contains("pagbank") {
        AcquirerTag::PagSeguro
    } else {
        AcquirerTag::Other
    }
}

/// Detects the card brand from a transaction description by case-insensitive
/// substring match, defaulting to "Outros".
pub fn detect_brand(description: &str) -> &'static str {
    let desc = description.to_lowercase();
    if desc.contains("visa") {
        "Visa"
    } else if desc.contains("master") {
        "Mastercard"
    } else if desc.contains("elo") {
        "Elo"
    } else if desc.contains("hiper") {
        "Hipercard"
    } else if desc.contains("amex") || desc.contains("american express") {
        "Amex"
    } else if desc.contains("pix") {
        "Pix"
    } else {
        "Outros"
    }
}

/// Sale rows whose acquirer equals `name`.
///
/// Rows with a missing or empty acquirer belong to the literal "Outros"
/// category, so filtering by that name returns them.
pub fn filter_rows_by_acquirer(snapshot: &Snapshot, name: &str) -> Vec<SaleRow> {
    let Some(detail) = &snapshot.detail else {
        return Vec::new();
    };
    detail
        .sales
        .iter()
        .filter(|row| row.acquirer_or_default() == name)
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::{AcquirerFigures, ReconciliationStatus, SnapshotDetail};
    use chrono::Utc;
    use rust_decimal_macros::dec;
    use std::collections::BTreeMap;

    fn figures() -> AcquirerFigures {
        AcquirerFigures {
            sales: dec!(500),
            received: dec!(450),
            difference: dec!(-50),
        }
    }

    fn sale(acquirer: Option<&str>) -> SaleRow {
        SaleRow {
            date: None,
            acquirer: acquirer.map(str::to_string),
            brand: None,
            description: String::new(),
            gross_value: dec!(100),
            net_value: dec!(97),
            expected_settlement_date: None,
            settled_value: None,
            settlement_date: None,
            bank: None,
            status: ReconciliationStatus::Pending,
        }
    }

    fn snapshot_with(names: &[&str], sales: Vec<SaleRow>) -> Snapshot {
        let acquirers: BTreeMap<String, AcquirerFigures> = names
            .iter()
            .map(|name| (name.to_string(), figures()))
            .collect();
        Snapshot {
            total_sales: dec!(500),
            total_received: dec!(450),
            difference: dec!(-50),
            alert_count: 2,
            acquirers,
            brands: None,
            detail: Some(SnapshotDetail {
                sales,
                received: Vec::new(),
            }),
            fetched_at: Utc::now(),
        }
    }

    #[test]
    fn test_acquirer_rows_sorted_by_name() {
        let snap = snapshot_with(&["Stone", "Cielo"], Vec::new());
        let rows = derive_acquirer_rows(&snap);
        let names: Vec<&str> = rows.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Cielo", "Stone"]);
    }

    #[test]
    fn test_classify_is_case_insensitive_substring() {
        assert_eq!(classify("CIELO S.A."), AcquirerTag::Cielo);
        assert_eq!(classify("Rede Itaú"), AcquirerTag::Rede);
        assert_eq!(classify("stone pagamentos"), AcquirerTag::Stone);
        assert_eq!(classify("Banco XYZ"), AcquirerTag::Other);
    }

    #[test]
    fn test_detect_brand_matches_description() {
        assert_eq!(detect_brand("VENDA VISA CREDITO"), "Visa");
        assert_eq!(detect_brand("mastercard debito"), "Mastercard");
        assert_eq!(detect_brand("recebimento PIX qr"), "Pix");
        assert_eq!(detect_brand("venda balcão"), "Outros");
    }

    #[test]
    fn test_filter_rows_by_acquirer() {
        let snap = snapshot_with(
            &["Cielo"],
            vec![sale(Some("Cielo")), sale(Some("Stone")), sale(Some("Cielo"))],
        );
        let rows = filter_rows_by_acquirer(&snap, "Cielo");
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn test_missing_acquirer_is_outros_category() {
        let snap = snapshot_with(&[], vec![sale(None), sale(Some("")), sale(Some("Cielo"))]);
        let rows = filter_rows_by_acquirer(&snap, "Outros");
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn test_summary_carries_signed_difference() {
        let snap = snapshot_with(&[], Vec::new());
        let kpis = summary(&snap);
        assert_eq!(kpis.difference, dec!(-50));
        assert_eq!(kpis.alert_count, 2);
    }

    #[test]
    fn test_filter_without_detail_is_empty() {
        let mut snap = snapshot_with(&[], Vec::new());
        snap.detail = None;
        assert!(filter_rows_by_acquirer(&snap, "Cielo").is_empty());
    }
}
