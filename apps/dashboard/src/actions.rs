//! Typed UI actions.
//!
//! Interaction reaches the controller as one of these variants and is routed
//! through an explicit dispatch table, instead of ad hoc attribute-based
//! routing on the markup.

/// Which KPI tile was activated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KpiKind {
    TotalSales,
    TotalReceived,
    Difference,
    Alerts,
}

impl KpiKind {
    fn from_wire(raw: &str) -> Option<Self> {
        match raw {
            "vendas" => Some(KpiKind::TotalSales),
            "recebido" => Some(KpiKind::TotalReceived),
            "diferenca" => Some(KpiKind::Difference),
            "alertas" => Some(KpiKind::Alerts),
            _ => None,
        }
    }
}

/// Every interaction the dashboard reacts to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiAction {
    RefreshNow,
    OpenAcquirerDetail { name: String },
    OpenKpiDetail { kpi: KpiKind },
    OpenDetailView,
    ChangeDetailPage { page: u32 },
    CloseDrillDown,
    RunReconciliation,
}

impl UiAction {
    /// Adapter from the markup's `data-acao`/argument pairs to a typed
    /// action. Unknown identifiers map to `None` instead of silently doing
    /// the wrong thing.
    pub fn from_parts(action: &str, arg: Option<&str>) -> Option<Self> {
        match action {
            "atualizar" => Some(UiAction::RefreshNow),
            "abrir-adquirente" => arg.map(|name| UiAction::OpenAcquirerDetail {
                name: name.to_string(),
            }),
            "abrir-kpi" => arg
                .and_then(KpiKind::from_wire)
                .map(|kpi| UiAction::OpenKpiDetail { kpi }),
            "detalhado" => Some(UiAction::OpenDetailView),
            "pagina" => arg
                .and_then(|raw| raw.parse::<u32>().ok())
                .map(|page| UiAction::ChangeDetailPage { page }),
            "fechar-modal" => Some(UiAction::CloseDrillDown),
            "conciliar" => Some(UiAction::RunReconciliation),
            _ => None,
        }
    }
}
