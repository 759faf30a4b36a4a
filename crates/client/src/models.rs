//! Wire schemas for the dashboard API endpoints and their conversions into
//! domain types.
//!
//! The server speaks the original pt-BR field names (`total_vendas`,
//! `qtde_recebimentos`, ...). Conversion is lenient where the wire is loose
//! (date strings, unknown statuses) and strict where it matters (success
//! flags, difference consistency).

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use concilia_core::constants::DIFFERENCE_TOLERANCE;
use concilia_core::errors::{Error, Result};
use concilia_core::snapshot::{
    AcquirerFigures, ReceiptRow, ReconciliationStatus, SaleRow, Snapshot, SnapshotDetail,
};
use concilia_core::upload::UploadSummary;

use std::str::FromStr;

// ─────────────────────────────────────────────────────────────────────────────
// GET /api/v1/dashboard/kpis
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct KpisEnvelope {
    pub ok: bool,
    #[serde(default)]
    pub kpis: Option<KpisDto>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct KpisDto {
    pub total_vendas: Decimal,
    pub total_recebido: Decimal,
    #[serde(default)]
    pub diferenca: Option<Decimal>,
    #[serde(default)]
    pub alertas: u32,
    /// Keyed by acquirer display name (case-sensitive, unique).
    #[serde(default)]
    pub adquirentes: BTreeMap<String, AcquirerDto>,
    #[serde(default)]
    pub bandeiras: Option<BTreeMap<String, Decimal>>,
    #[serde(default)]
    pub detalhes: Option<DetailBlockDto>,
}

#[derive(Debug, Deserialize)]
pub struct AcquirerDto {
    #[serde(default)]
    pub vendas: Decimal,
    #[serde(default)]
    pub recebidos: Decimal,
    #[serde(default)]
    pub diferenca: Option<Decimal>,
}

#[derive(Debug, Deserialize)]
pub struct DetailBlockDto {
    #[serde(default)]
    pub vendas: Vec<SaleRowDto>,
    #[serde(default)]
    pub recebimentos: Vec<ReceiptRowDto>,
}

#[derive(Debug, Deserialize)]
pub struct SaleRowDto {
    #[serde(default)]
    pub data_venda: Option<String>,
    #[serde(default)]
    pub adquirente: Option<String>,
    #[serde(default)]
    pub bandeira: Option<String>,
    #[serde(default)]
    pub descricao: String,
    #[serde(default)]
    pub valor_bruto: Decimal,
    #[serde(default)]
    pub valor_liquido: Decimal,
    #[serde(default)]
    pub data_prevista: Option<String>,
    #[serde(default)]
    pub valor_conciliado: Option<Decimal>,
    #[serde(default)]
    pub data_conciliacao: Option<String>,
    #[serde(default)]
    pub banco: Option<String>,
    #[serde(default)]
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub struct ReceiptRowDto {
    #[serde(default)]
    pub data_movimento: Option<String>,
    #[serde(default)]
    pub historico: String,
    #[serde(default)]
    pub valor: Decimal,
    #[serde(default)]
    pub valor_conciliado: Option<Decimal>,
    #[serde(default)]
    pub origem: Option<String>,
    #[serde(default)]
    pub conciliado: bool,
}

/// Parses a wire date. The server stringifies dates, including absent ones,
/// so anything that is not `YYYY-MM-DD` coerces to `None`.
fn parse_wire_date(raw: Option<&str>) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw?, "%Y-%m-%d").ok()
}

impl From<SaleRowDto> for SaleRow {
    fn from(dto: SaleRowDto) -> Self {
        SaleRow {
            date: parse_wire_date(dto.data_venda.as_deref()),
            acquirer: dto.adquirente.filter(|a| !a.is_empty()),
            brand: dto.bandeira.filter(|b| !b.is_empty()),
            description: dto.descricao,
            gross_value: dto.valor_bruto,
            net_value: dto.valor_liquido,
            expected_settlement_date: parse_wire_date(dto.data_prevista.as_deref()),
            settled_value: dto.valor_conciliado,
            settlement_date: parse_wire_date(dto.data_conciliacao.as_deref()),
            bank: dto.banco,
            status: ReconciliationStatus::from_wire(&dto.status),
        }
    }
}

impl From<ReceiptRowDto> for ReceiptRow {
    fn from(dto: ReceiptRowDto) -> Self {
        ReceiptRow {
            date: parse_wire_date(dto.data_movimento.as_deref()),
            description: dto.historico,
            value: dto.valor,
            reconciled_value: dto.valor_conciliado,
            bank: dto.origem,
            reconciled: dto.conciliado,
        }
    }
}

impl KpisEnvelope {
    /// Validates the envelope and builds the domain snapshot.
    ///
    /// A missing `diferenca` is computed from the totals; a reported one
    /// that disagrees with the totals beyond the display tolerance fails
    /// fast instead of rendering inconsistent figures.
    pub fn into_snapshot(self, fetched_at: DateTime<Utc>) -> Result<Snapshot> {
        if !self.ok {
            return Err(Error::Business(
                self.error
                    .unwrap_or_else(|| "Erro ao carregar dashboard.".to_string()),
            ));
        }
        let kpis = self
            .kpis
            .ok_or_else(|| Error::BadPayload("kpis object missing".to_string()))?;

        let tolerance = Decimal::from_str(DIFFERENCE_TOLERANCE).unwrap_or(Decimal::ZERO);
        let expected = kpis.total_recebido - kpis.total_vendas;
        let difference = match kpis.diferenca {
            Some(reported) if (reported - expected).abs() <= tolerance => reported,
            Some(reported) => {
                return Err(Error::BadPayload(format!(
                    "reported difference {} disagrees with totals (expected {})",
                    reported, expected
                )));
            }
            None => expected,
        };

        let acquirers = kpis
            .adquirentes
            .into_iter()
            .map(|(name, dto)| {
                let figures = AcquirerFigures {
                    sales: dto.vendas,
                    received: dto.recebidos,
                    difference: dto.diferenca.unwrap_or(dto.recebidos - dto.vendas),
                };
                (name, figures)
            })
            .collect();

        let detail = kpis.detalhes.map(|block| SnapshotDetail {
            sales: block.vendas.into_iter().map(SaleRow::from).collect(),
            received: block.recebimentos.into_iter().map(ReceiptRow::from).collect(),
        });

        Ok(Snapshot {
            total_sales: kpis.total_vendas,
            total_received: kpis.total_recebido,
            difference,
            alert_count: kpis.alertas,
            acquirers,
            brands: kpis.bandeiras,
            detail,
            fetched_at,
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// GET /api/v1/conciliacao/detalhes
// ─────────────────────────────────────────────────────────────────────────────

/// Query parameters for the detail endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailQuery {
    pub empresa_id: String,
    pub data_inicio: Option<NaiveDate>,
    pub data_fim: Option<NaiveDate>,
    pub status: Option<String>,
    pub page: u32,
    pub per_page: u32,
}

impl DetailQuery {
    pub fn new(empresa_id: impl Into<String>) -> Self {
        Self {
            empresa_id: empresa_id.into(),
            data_inicio: None,
            data_fim: None,
            status: None,
            page: 1,
            per_page: 50,
        }
    }

    /// The same query pointed at another page.
    pub fn with_page(&self, page: u32) -> Self {
        let mut query = self.clone();
        query.page = page.max(1);
        query
    }

    /// Serializes to a query string, percent-encoding values.
    pub fn to_query_string(&self) -> String {
        let mut params = vec![format!(
            "empresa_id={}",
            urlencoding::encode(&self.empresa_id)
        )];
        if let Some(v) = self.data_inicio {
            params.push(format!("data_inicio={}", v.format("%Y-%m-%d")));
        }
        if let Some(v) = self.data_fim {
            params.push(format!("data_fim={}", v.format("%Y-%m-%d")));
        }
        if let Some(v) = &self.status {
            params.push(format!("status={}", urlencoding::encode(v)));
        }
        params.push(format!("page={}", self.page));
        params.push(format!("per_page={}", self.per_page));
        params.join("&")
    }
}

#[derive(Debug, Deserialize)]
pub struct DetailEnvelope {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub dados: Vec<SaleRowDto>,
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_per_page")]
    pub per_page: u32,
    #[serde(default)]
    pub total: u64,
    #[serde(default = "default_page")]
    pub pages: u32,
    #[serde(default)]
    pub message: Option<String>,
}

fn default_page() -> u32 {
    1
}

fn default_per_page() -> u32 {
    50
}

/// One page of detail rows with the endpoint's own pagination metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct DetailPage {
    pub rows: Vec<SaleRow>,
    pub page: u32,
    pub per_page: u32,
    pub total: u64,
    pub pages: u32,
}

impl DetailEnvelope {
    pub fn into_page(self) -> Result<DetailPage> {
        if self.status != "success" {
            return Err(Error::Business(
                self.message
                    .unwrap_or_else(|| "Erro ao carregar dados.".to_string()),
            ));
        }
        Ok(DetailPage {
            rows: self.dados.into_iter().map(SaleRow::from).collect(),
            page: self.page,
            per_page: self.per_page,
            total: self.total,
            pages: self.pages,
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// POST /operacoes/upload
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct UploadEnvelope {
    pub ok: bool,
    #[serde(default)]
    pub total_arquivos: u32,
    #[serde(default)]
    pub qtde_vendas: u32,
    #[serde(default)]
    pub qtde_recebimentos: u32,
    #[serde(default)]
    pub total_vendas: Decimal,
    #[serde(default)]
    pub total_recebimentos: Decimal,
    #[serde(default)]
    pub message: String,
}

impl UploadEnvelope {
    pub fn into_summary(self) -> Result<UploadSummary> {
        if !self.ok {
            let message = if self.message.is_empty() {
                "Erro ao processar arquivos.".to_string()
            } else {
                self.message
            };
            return Err(Error::Business(message));
        }
        Ok(UploadSummary {
            files_total: self.total_arquivos,
            sales_found: self.qtde_vendas,
            receipts_found: self.qtde_recebimentos,
            total_sales: self.total_vendas,
            total_received: self.total_recebimentos,
            message: self.message,
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// POST /api/v1/conciliacao/processar
// ─────────────────────────────────────────────────────────────────────────────

/// JSON body for the reconciliation trigger.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProcessRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub empresa_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ProcessEnvelope {
    pub ok: bool,
    #[serde(default)]
    pub resultado: Option<ReconciliationOutcome>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Per-category counts produced by a reconciliation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciliationOutcome {
    #[serde(default)]
    pub conciliados: u32,
    #[serde(default)]
    pub parciais: u32,
    #[serde(default)]
    pub multivendas: u32,
    #[serde(default)]
    pub nao_conciliados: u32,
    #[serde(default)]
    pub creditos_sem_origem: u32,
}

impl ProcessEnvelope {
    pub fn into_outcome(self) -> Result<ReconciliationOutcome> {
        if !self.ok {
            return Err(Error::Business(
                self.message
                    .unwrap_or_else(|| "Erro ao processar conciliação.".to_string()),
            ));
        }
        self.resultado
            .ok_or_else(|| Error::BadPayload("resultado object missing".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_kpis_scenario_payload_maps_to_snapshot() {
        let json = r#"{
            "ok": true,
            "kpis": {
                "total_vendas": 500.00,
                "total_recebido": 450.00,
                "diferenca": -50.00,
                "alertas": 2,
                "adquirentes": {
                    "Cielo": {"vendas": 500, "recebidos": 450, "diferenca": -50}
                }
            }
        }"#;
        let envelope: KpisEnvelope = serde_json::from_str(json).unwrap();
        let snapshot = envelope.into_snapshot(Utc::now()).unwrap();

        assert_eq!(snapshot.total_sales, dec!(500.00));
        assert_eq!(snapshot.total_received, dec!(450.00));
        assert_eq!(snapshot.difference, dec!(-50.00));
        assert_eq!(snapshot.alert_count, 2);
        let cielo = &snapshot.acquirers["Cielo"];
        assert_eq!(cielo.sales, dec!(500));
        assert_eq!(cielo.received, dec!(450));
        assert_eq!(cielo.difference, dec!(-50));
        assert!(snapshot.brands.is_none());
    }

    #[test]
    fn test_kpis_missing_difference_is_computed() {
        let json = r#"{"ok": true, "kpis": {"total_vendas": 1000.00, "total_recebido": 882.17}}"#;
        let envelope: KpisEnvelope = serde_json::from_str(json).unwrap();
        let snapshot = envelope.into_snapshot(Utc::now()).unwrap();
        assert_eq!(snapshot.difference, dec!(-117.83));
        assert!(snapshot.difference_consistent());
    }

    #[test]
    fn test_kpis_inconsistent_difference_is_rejected() {
        let json = r#"{"ok": true, "kpis": {"total_vendas": 1000, "total_recebido": 882.17, "diferenca": 117.83}}"#;
        let envelope: KpisEnvelope = serde_json::from_str(json).unwrap();
        let err = envelope.into_snapshot(Utc::now()).unwrap_err();
        assert_eq!(err.kind(), "bad_payload");
    }

    #[test]
    fn test_kpis_failure_flag_maps_to_business_error() {
        let json = r#"{"ok": false, "error": "Erro interno ao carregar dashboard"}"#;
        let envelope: KpisEnvelope = serde_json::from_str(json).unwrap();
        let err = envelope.into_snapshot(Utc::now()).unwrap_err();
        assert_eq!(err.kind(), "business");
        assert_eq!(err.user_message(), "Erro interno ao carregar dashboard");
    }

    #[test]
    fn test_detail_envelope_maps_rows_and_metadata() {
        let json = r#"{
            "status": "success",
            "dados": [{
                "data_venda": "2026-07-01",
                "adquirente": "Cielo",
                "bandeira": "Visa",
                "valor_bruto": 120.0,
                "valor_liquido": 117.5,
                "data_prevista": "2026-07-31",
                "valor_conciliado": 117.5,
                "status": "conciliado"
            }],
            "page": 2, "per_page": 50, "total": 120, "pages": 3
        }"#;
        let envelope: DetailEnvelope = serde_json::from_str(json).unwrap();
        let page = envelope.into_page().unwrap();

        assert_eq!(page.page, 2);
        assert_eq!(page.pages, 3);
        assert_eq!(page.rows.len(), 1);
        let row = &page.rows[0];
        assert_eq!(row.acquirer.as_deref(), Some("Cielo"));
        assert_eq!(row.status, ReconciliationStatus::Reconciled);
        assert_eq!(row.date, NaiveDate::from_ymd_opt(2026, 7, 1));
    }

    #[test]
    fn test_detail_envelope_error_status() {
        let json = r#"{"status": "error", "message": "empresa_id é obrigatório"}"#;
        let envelope: DetailEnvelope = serde_json::from_str(json).unwrap();
        let err = envelope.into_page().unwrap_err();
        assert_eq!(err.user_message(), "empresa_id é obrigatório");
    }

    #[test]
    fn test_unparseable_wire_date_coerces_to_none() {
        assert_eq!(parse_wire_date(Some("None")), None);
        assert_eq!(parse_wire_date(Some("")), None);
        assert_eq!(
            parse_wire_date(Some("2026-01-15")),
            NaiveDate::from_ymd_opt(2026, 1, 15)
        );
    }

    #[test]
    fn test_detail_query_string_includes_all_set_params() {
        let mut query = DetailQuery::new("42");
        query.status = Some("pendente".to_string());
        query.data_inicio = NaiveDate::from_ymd_opt(2026, 6, 1);
        let qs = query.with_page(2).to_query_string();
        assert_eq!(
            qs,
            "empresa_id=42&data_inicio=2026-06-01&status=pendente&page=2&per_page=50"
        );
    }

    #[test]
    fn test_upload_envelope_maps_to_summary() {
        let json = r#"{
            "ok": true,
            "total_arquivos": 3,
            "qtde_vendas": 2,
            "qtde_recebimentos": 1,
            "total_vendas": 1500.0,
            "total_recebimentos": 1400.0,
            "message": "Arquivos importados, analisados e salvos com sucesso."
        }"#;
        let envelope: UploadEnvelope = serde_json::from_str(json).unwrap();
        let summary = envelope.into_summary().unwrap();
        assert_eq!(summary.files_total, 3);
        assert_eq!(summary.sales_found, 2);
        assert_eq!(summary.total_sales, dec!(1500.0));
    }

    #[test]
    fn test_process_envelope_requires_resultado() {
        let json = r#"{"ok": true}"#;
        let envelope: ProcessEnvelope = serde_json::from_str(json).unwrap();
        assert_eq!(envelope.into_outcome().unwrap_err().kind(), "bad_payload");

        let json = r#"{"ok": true, "resultado": {"conciliados": 4, "parciais": 1}}"#;
        let envelope: ProcessEnvelope = serde_json::from_str(json).unwrap();
        let outcome = envelope.into_outcome().unwrap();
        assert_eq!(outcome.conciliados, 4);
        assert_eq!(outcome.nao_conciliados, 0);
    }
}
