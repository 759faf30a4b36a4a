//! Chart rendering: per-slot state machine over a pluggable backend.

mod backend;
mod svg;

pub use backend::{ChartBackend, ChartHandle, ChartInstance};
pub use svg::SvgChartBackend;

use std::sync::{Arc, Mutex};

use log::warn;
use rust_decimal::Decimal;

use concilia_core::currency::CurrencyFormatter;
use concilia_core::render::Element;
use concilia_core::snapshot::Snapshot;

/// Measured size of a chart's container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// A container with no measurable area cannot host a chart.
    pub fn is_zero(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(640, 320)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartKind {
    ComparisonBar,
    BrandDonut,
}

/// One labeled value in a chart series.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartPoint {
    pub label: String,
    pub value: Decimal,
}

/// Backend-independent description of a chart to draw.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSpec {
    pub kind: ChartKind,
    pub title: String,
    pub points: Vec<ChartPoint>,
}

impl ChartSpec {
    /// Sales-versus-received comparison bars.
    pub fn comparison(snapshot: &Snapshot) -> Self {
        Self {
            kind: ChartKind::ComparisonBar,
            title: "Vendas x Recebido".to_string(),
            points: vec![
                ChartPoint {
                    label: "Vendas".to_string(),
                    value: snapshot.total_sales,
                },
                ChartPoint {
                    label: "Recebido".to_string(),
                    value: snapshot.total_received,
                },
            ],
        }
    }

    /// Sales distribution donut: by card brand when the snapshot carries
    /// brand totals, otherwise by acquirer.
    pub fn distribution(snapshot: &Snapshot) -> Self {
        let points: Vec<ChartPoint> = match &snapshot.brands {
            Some(brands) if !brands.is_empty() => brands
                .iter()
                .map(|(label, value)| ChartPoint {
                    label: label.clone(),
                    value: *value,
                })
                .collect(),
            _ => snapshot
                .acquirers
                .iter()
                .map(|(name, figures)| ChartPoint {
                    label: name.clone(),
                    value: figures.sales,
                })
                .collect(),
        };
        Self {
            kind: ChartKind::BrandDonut,
            title: "Distribuição de vendas".to_string(),
            points,
        }
    }
}

enum SlotState {
    Empty,
    Rendered(ChartHandle),
}

/// One chart slot: holds at most one live handle.
pub struct ChartSlot {
    name: &'static str,
    state: SlotState,
}

impl ChartSlot {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            state: SlotState::Empty,
        }
    }

    pub fn is_rendered(&self) -> bool {
        matches!(self.state, SlotState::Rendered(_))
    }

    /// Renders a spec into this slot, returning the artifact markup.
    ///
    /// Any existing handle is destroyed first. A zero-area viewport or an
    /// empty data set yields the textual empty state without invoking the
    /// backend, and a backend failure is caught and replaced with an inline
    /// error artifact.
    pub fn render(
        &mut self,
        backend: &dyn ChartBackend,
        spec: &ChartSpec,
        viewport: Viewport,
        formatter: &CurrencyFormatter,
    ) -> String {
        if let SlotState::Rendered(handle) = std::mem::replace(&mut self.state, SlotState::Empty) {
            handle.destroy();
        }

        if viewport.is_zero() || spec.points.is_empty() {
            return empty_state(&spec.title).to_html();
        }

        match backend.build(spec, viewport, formatter) {
            Ok(handle) => {
                let html = handle.html().to_string();
                self.state = SlotState::Rendered(handle);
                html
            }
            Err(err) => {
                warn!("chart slot {} failed to render: {}", self.name, err);
                error_state(&err.user_message()).to_html()
            }
        }
    }

    /// Destroys the held handle, if any.
    pub fn destroy(&mut self) {
        if let SlotState::Rendered(handle) = std::mem::replace(&mut self.state, SlotState::Empty) {
            handle.destroy();
        }
    }
}

fn empty_state(title: &str) -> Element {
    Element::new("div")
        .class("chart-empty-state")
        .attr("role", "status")
        .child(Element::new("h3").text(title))
        .child(Element::new("p").text("Sem dados para exibir."))
}

fn error_state(message: &str) -> Element {
    Element::new("div")
        .class("chart-error")
        .attr("role", "alert")
        .child(Element::new("p").text(message))
}

/// The dashboard's two chart slots, each owned by exactly one renderer.
///
/// Render calls for the same slot are serialized: a call that finds its slot
/// busy skips instead of racing the in-flight one.
pub struct ChartRegistry {
    backend: Arc<dyn ChartBackend>,
    comparison: Mutex<ChartSlot>,
    distribution: Mutex<ChartSlot>,
}

impl ChartRegistry {
    pub fn new(backend: Arc<dyn ChartBackend>) -> Self {
        Self {
            backend,
            comparison: Mutex::new(ChartSlot::new("comparison")),
            distribution: Mutex::new(ChartSlot::new("distribution")),
        }
    }

    /// Renders into the slot for `spec.kind`. Returns `None` when the slot
    /// already has a render in flight.
    pub fn render(
        &self,
        spec: &ChartSpec,
        viewport: Viewport,
        formatter: &CurrencyFormatter,
    ) -> Option<String> {
        let slot = match spec.kind {
            ChartKind::ComparisonBar => &self.comparison,
            ChartKind::BrandDonut => &self.distribution,
        };
        match slot.try_lock() {
            Ok(mut slot) => Some(slot.render(self.backend.as_ref(), spec, viewport, formatter)),
            Err(_) => {
                warn!("skipping chart render: slot busy");
                None
            }
        }
    }

    /// Destroys every held handle. Called on page teardown.
    pub fn teardown(&self) {
        if let Ok(mut slot) = self.comparison.lock() {
            slot.destroy();
        }
        if let Ok(mut slot) = self.distribution.lock() {
            slot.destroy();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use concilia_core::errors::Error;
    use rust_decimal_macros::dec;

    struct FailingBackend;

    impl ChartBackend for FailingBackend {
        fn build(
            &self,
            _spec: &ChartSpec,
            _viewport: Viewport,
            _formatter: &CurrencyFormatter,
        ) -> concilia_core::Result<ChartHandle> {
            Err(Error::Render("backend exploded".to_string()))
        }
    }

    fn spec() -> ChartSpec {
        ChartSpec {
            kind: ChartKind::ComparisonBar,
            title: "Vendas x Recebido".to_string(),
            points: vec![
                ChartPoint {
                    label: "Vendas".to_string(),
                    value: dec!(500),
                },
                ChartPoint {
                    label: "Recebido".to_string(),
                    value: dec!(450),
                },
            ],
        }
    }

    #[test]
    fn test_render_twice_leaves_one_live_instance() {
        let backend = SvgChartBackend::new();
        let mut slot = ChartSlot::new("comparison");
        let fmt = CurrencyFormatter::brl();

        slot.render(&backend, &spec(), Viewport::default(), &fmt);
        slot.render(&backend, &spec(), Viewport::default(), &fmt);

        assert_eq!(backend.live_instances(), 1);
        assert!(slot.is_rendered());
    }

    #[test]
    fn test_zero_viewport_renders_empty_state_without_backend() {
        let backend = SvgChartBackend::new();
        let mut slot = ChartSlot::new("comparison");
        let fmt = CurrencyFormatter::brl();

        let html = slot.render(&backend, &spec(), Viewport::new(0, 200), &fmt);
        assert!(html.contains("chart-empty-state"));
        assert!(html.contains("Sem dados para exibir."));
        assert_eq!(backend.live_instances(), 0);
        assert!(!slot.is_rendered());
    }

    #[test]
    fn test_empty_data_renders_empty_state() {
        let backend = SvgChartBackend::new();
        let mut slot = ChartSlot::new("distribution");
        let fmt = CurrencyFormatter::brl();
        let empty = ChartSpec {
            kind: ChartKind::BrandDonut,
            title: "Distribuição de vendas".to_string(),
            points: Vec::new(),
        };

        let html = slot.render(&backend, &empty, Viewport::default(), &fmt);
        assert!(html.contains("chart-empty-state"));
        assert_eq!(backend.live_instances(), 0);
    }

    #[test]
    fn test_backend_failure_becomes_inline_error() {
        let mut slot = ChartSlot::new("comparison");
        let fmt = CurrencyFormatter::brl();

        let html = slot.render(&FailingBackend, &spec(), Viewport::default(), &fmt);
        assert!(html.contains("chart-error"));
        assert!(!slot.is_rendered());
    }

    #[test]
    fn test_failure_after_render_destroys_old_handle() {
        let backend = SvgChartBackend::new();
        let mut slot = ChartSlot::new("comparison");
        let fmt = CurrencyFormatter::brl();

        slot.render(&backend, &spec(), Viewport::default(), &fmt);
        assert_eq!(backend.live_instances(), 1);

        slot.render(&FailingBackend, &spec(), Viewport::default(), &fmt);
        assert_eq!(backend.live_instances(), 0);
        assert!(!slot.is_rendered());
    }

    #[test]
    fn test_registry_teardown_destroys_handles() {
        let backend = SvgChartBackend::new();
        let shared = Arc::new(backend.clone());
        let registry = ChartRegistry::new(shared);
        let fmt = CurrencyFormatter::brl();

        registry.render(&spec(), Viewport::default(), &fmt);
        assert_eq!(backend.live_instances(), 1);

        registry.teardown();
        assert_eq!(backend.live_instances(), 0);
    }
}
