//! Dashboard controller: the explicit context object owning every stateful
//! piece of the pipeline.
//!
//! Components never reach into ambient globals; the context is built once
//! and passed around. The fetch-success path is the cache's only writer.

use std::sync::{Arc, Mutex};

use log::{debug, warn};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use concilia_core::currency::CurrencyFormatter;
use concilia_core::errors::Error;
use concilia_core::events::{UiEvent, UiEventSink, Widget};
use concilia_core::kpi::{derive_acquirer_rows, filter_rows_by_acquirer, summary};
use concilia_core::snapshot::{
    ReconciliationStatus, ReplaceOutcome, SaleRow, Snapshot, SnapshotCache,
};

use concilia_client::{ApiClient, DetailQuery, ProcessRequest};

use crate::actions::{KpiKind, UiAction};
use crate::charts::{ChartRegistry, ChartSpec, SvgChartBackend, Viewport};
use crate::config::Config;
use crate::modal::{DrillDownModal, Key, KeyOutcome};
use crate::views;

/// Delay before the host should follow a login redirect.
const LOGIN_REDIRECT_DELAY_MS: u64 = 1000;

/// Everything the dashboard owns, in one place.
pub struct DashboardContext {
    pub config: Config,
    pub api: ApiClient,
    pub cache: SnapshotCache,
    pub formatter: CurrencyFormatter,
    pub events: Arc<dyn UiEventSink>,
    charts: ChartRegistry,
    /// Concrete backend handle, kept so tests can observe instance
    /// ownership; the registry holds its own reference.
    #[allow(dead_code)]
    backend: SvgChartBackend,
    modal: tokio::sync::Mutex<DrillDownModal>,
    viewport: Mutex<Viewport>,
}

impl DashboardContext {
    pub fn new(config: Config, events: Arc<dyn UiEventSink>) -> anyhow::Result<Arc<Self>> {
        let api = ApiClient::new(&config.base_url, &config.csrf_token)?;
        let formatter = CurrencyFormatter::brl();
        let backend = SvgChartBackend::new();
        let charts = ChartRegistry::new(Arc::new(backend.clone()));
        let modal = DrillDownModal::new(Arc::new(api.clone()), formatter.clone());

        Ok(Arc::new(Self {
            config,
            api,
            cache: SnapshotCache::new(),
            formatter,
            events,
            charts,
            backend,
            modal: tokio::sync::Mutex::new(modal),
            viewport: Mutex::new(Viewport::default()),
        }))
    }

    #[cfg(test)]
    pub(crate) fn chart_backend(&self) -> &SvgChartBackend {
        &self.backend
    }

    /// One fetch -> cache -> render pass.
    ///
    /// The sequence number is issued before dispatch; a response that lost
    /// the ordering race is discarded by the cache and only reported.
    pub async fn refresh(&self) {
        let seq = self.cache.next_seq();
        debug!("dashboard refresh dispatched (seq {})", seq);

        match self.api.fetch_kpis().await {
            Ok(snapshot) => match self.cache.replace(seq, snapshot) {
                ReplaceOutcome::Applied { seq } => {
                    self.events.emit(UiEvent::SnapshotApplied { seq });
                    self.render_all();
                }
                ReplaceOutcome::StaleDiscarded { seq, committed } => {
                    self.events
                        .emit(UiEvent::StaleSnapshotDiscarded { seq, committed });
                }
            },
            Err(err) => self.report_fetch_failure(Widget::KpiTiles, err),
        }
    }

    /// Renders every snapshot-driven widget from the cache.
    pub fn render_all(&self) {
        let Some(snapshot) = self.cache.get() else {
            self.events.emit(UiEvent::rendered(
                Widget::KpiTiles,
                views::render_loading().to_html(),
            ));
            return;
        };

        let kpis = summary(&snapshot);
        self.events.emit(UiEvent::rendered(
            Widget::KpiTiles,
            views::render_kpi_tiles(&kpis, &self.formatter).to_html(),
        ));

        let rows = derive_acquirer_rows(&snapshot);
        self.events.emit(UiEvent::rendered(
            Widget::AcquirerCards,
            views::render_acquirer_cards(&rows, &self.formatter).to_html(),
        ));

        let viewport = *self.viewport.lock().expect("viewport lock poisoned");
        self.render_charts(&snapshot, viewport);
    }

    /// Chart-only redraw from the cached snapshot, e.g. after a debounced
    /// viewport resize. Performs no network call.
    pub fn redraw_charts(&self, viewport: Viewport) {
        *self.viewport.lock().expect("viewport lock poisoned") = viewport;
        if let Some(snapshot) = self.cache.get() {
            self.render_charts(&snapshot, viewport);
        }
    }

    fn render_charts(&self, snapshot: &Snapshot, viewport: Viewport) {
        let comparison = ChartSpec::comparison(snapshot);
        if let Some(html) = self.charts.render(&comparison, viewport, &self.formatter) {
            self.events
                .emit(UiEvent::rendered(Widget::ComparisonChart, html));
        }

        let distribution = ChartSpec::distribution(snapshot);
        if let Some(html) = self.charts.render(&distribution, viewport, &self.formatter) {
            self.events.emit(UiEvent::rendered(Widget::BrandChart, html));
        }
    }

    /// The dispatch table: one typed action, one handler.
    pub async fn dispatch(&self, action: UiAction) {
        match action {
            UiAction::RefreshNow => self.refresh().await,
            UiAction::OpenAcquirerDetail { name } => self.open_acquirer_detail(&name).await,
            UiAction::OpenKpiDetail { kpi } => self.open_kpi_detail(kpi).await,
            UiAction::OpenDetailView => self.open_detail_view().await,
            UiAction::ChangeDetailPage { page } => self.change_detail_page(page).await,
            UiAction::CloseDrillDown => self.close_drilldown().await,
            UiAction::RunReconciliation => self.run_reconciliation().await,
        }
    }

    /// Routes a key press to the modal while it is open.
    pub async fn handle_modal_key(&self, key: Key) -> KeyOutcome {
        let outcome = self.modal.lock().await.handle_key(key);
        if outcome == KeyOutcome::Closed {
            self.events
                .emit(UiEvent::rendered(Widget::DrillDown, String::new()));
        }
        outcome
    }

    /// Destroys owned chart handles. Timers are cancelled by the scheduler.
    pub fn teardown(&self) {
        self.charts.teardown();
    }

    async fn open_acquirer_detail(&self, name: &str) {
        // Reads the cache only; drill-down from a card never refetches.
        let rows = self
            .cache
            .get()
            .map(|snapshot| filter_rows_by_acquirer(&snapshot, name))
            .unwrap_or_default();
        let html = self.modal.lock().await.open_with_rows(name, rows);
        self.events.emit(UiEvent::rendered(Widget::DrillDown, html));
    }

    async fn open_kpi_detail(&self, kpi: KpiKind) {
        let snapshot = self.cache.get();
        let sales: Vec<SaleRow> = snapshot
            .as_deref()
            .and_then(|s| s.detail.as_ref())
            .map(|detail| detail.sales.clone())
            .unwrap_or_default();

        let (title, rows): (&str, Vec<SaleRow>) = match kpi {
            KpiKind::TotalSales => ("Todas as vendas", sales),
            KpiKind::TotalReceived => (
                "Vendas conciliadas",
                sales
                    .into_iter()
                    .filter(|r| r.status == ReconciliationStatus::Reconciled)
                    .collect(),
            ),
            KpiKind::Difference | KpiKind::Alerts => (
                "Vendas pendentes",
                sales
                    .into_iter()
                    .filter(|r| r.status != ReconciliationStatus::Reconciled)
                    .collect(),
            ),
        };

        let html = self.modal.lock().await.open_with_rows(title, rows);
        self.events.emit(UiEvent::rendered(Widget::DrillDown, html));
    }

    async fn open_detail_view(&self) {
        let mut query = DetailQuery::new(self.config.empresa_id.clone());
        query.per_page = self.config.per_page;

        let result = self
            .modal
            .lock()
            .await
            .open_with_query("Detalhamento de conciliação", query)
            .await;
        match result {
            Ok(html) => self.events.emit(UiEvent::rendered(Widget::DrillDown, html)),
            Err(err) => self.report_fetch_failure(Widget::DrillDown, err),
        }
    }

    async fn change_detail_page(&self, page: u32) {
        let result = self.modal.lock().await.change_page(page).await;
        match result {
            Ok(Some(html)) => self.events.emit(UiEvent::rendered(Widget::DrillDown, html)),
            Ok(None) => {}
            Err(err) => self.report_fetch_failure(Widget::DrillDown, err),
        }
    }

    async fn close_drilldown(&self) {
        self.modal.lock().await.close();
        self.events
            .emit(UiEvent::rendered(Widget::DrillDown, String::new()));
    }

    async fn run_reconciliation(&self) {
        let body = ProcessRequest {
            empresa_id: Some(self.config.empresa_id.clone()),
        };
        let timeout = std::time::Duration::from_secs(60);

        match self.api.run_reconciliation(&body, timeout).await {
            Ok(outcome) => self.events.emit(UiEvent::rendered(
                Widget::ReconciliationPanel,
                views::render_reconciliation_summary(&outcome).to_html(),
            )),
            Err(err) => self.report_fetch_failure(Widget::ReconciliationPanel, err),
        }
    }

    /// Converts a failure into a widget-scoped event. An expired session
    /// becomes a scheduled login redirect instead.
    fn report_fetch_failure(&self, widget: Widget, err: Error) {
        if let Error::Unauthorized { login_path } = &err {
            self.events.emit(UiEvent::LoginRedirectScheduled {
                href: login_path.clone(),
                delay_ms: LOGIN_REDIRECT_DELAY_MS,
            });
            return;
        }
        warn!("{:?} failed: {} ({})", widget, err, err.kind());
        self.events.emit(UiEvent::failed(widget, &err));
    }
}

/// Sink used by the binary: logs every event through `tracing`.
pub struct TracingUiEventSink;

impl UiEventSink for TracingUiEventSink {
    fn emit(&self, event: UiEvent) {
        match &event {
            UiEvent::WidgetRendered { widget, html } => {
                tracing::info!(?widget, bytes = html.len(), "widget rendered");
            }
            UiEvent::WidgetFailed {
                widget,
                kind,
                message,
            } => {
                tracing::warn!(?widget, kind, message, "widget failed");
            }
            other => tracing::info!(event = ?other, "ui event"),
        }
    }
}

pub fn init_tracing() {
    let log_format = std::env::var("CONCILIA_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    if log_format.eq_ignore_ascii_case("json") {
        registry
            .with(fmt::layer().json().with_current_span(false))
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(true).with_line_number(true))
            .init();
    }
}

/// Builds the context the binary runs with.
pub fn build_context(config: Config) -> anyhow::Result<Arc<DashboardContext>> {
    DashboardContext::new(config, Arc::new(TracingUiEventSink))
}
