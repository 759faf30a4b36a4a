//! Default chart backend: inline SVG built through the safe element tree.
//!
//! Axis tick labels and the per-shape `<title>` tooltips all route through
//! the currency formatter. Instances are counted so slot ownership (one live
//! handle per slot) is observable in tests.

use std::f64::consts::PI;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use concilia_core::currency::CurrencyFormatter;
use concilia_core::errors::{Error, Result};
use concilia_core::render::Element;

use super::{ChartBackend, ChartHandle, ChartInstance, ChartKind, ChartSpec, Viewport};

const PALETTE: [&str; 6] = [
    "#1877f2", "#3cb371", "#f39c12", "#8b7ec8", "#d14d41", "#3aa99f",
];

struct SvgInstance {
    html: String,
    live: Arc<AtomicUsize>,
}

impl ChartInstance for SvgInstance {
    fn html(&self) -> &str {
        &self.html
    }
}

impl Drop for SvgInstance {
    fn drop(&mut self) {
        self.live.fetch_sub(1, Ordering::Relaxed);
    }
}

/// Backend that draws charts as inline SVG markup.
#[derive(Clone, Default)]
pub struct SvgChartBackend {
    live: Arc<AtomicUsize>,
}

impl SvgChartBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of chart instances currently alive.
    pub fn live_instances(&self) -> usize {
        self.live.load(Ordering::Relaxed)
    }
}

impl ChartBackend for SvgChartBackend {
    fn build(
        &self,
        spec: &ChartSpec,
        viewport: Viewport,
        formatter: &CurrencyFormatter,
    ) -> Result<ChartHandle> {
        let svg = match spec.kind {
            ChartKind::ComparisonBar => bar_chart(spec, viewport, formatter)?,
            ChartKind::BrandDonut => donut_chart(spec, viewport, formatter)?,
        };

        self.live.fetch_add(1, Ordering::Relaxed);
        Ok(ChartHandle::new(Box::new(SvgInstance {
            html: svg.to_html(),
            live: self.live.clone(),
        })))
    }
}

fn svg_root(width: f64, height: f64, title: &str) -> Element {
    Element::new("svg")
        .attr("xmlns", "http://www.w3.org/2000/svg")
        .attr("width", format!("{:.0}", width))
        .attr("height", format!("{:.0}", height))
        .attr("viewBox", format!("0 0 {:.0} {:.0}", width, height))
        .attr("role", "img")
        .attr("aria-label", title)
}

fn tooltip(label: &str, value: Decimal, formatter: &CurrencyFormatter) -> Element {
    Element::new("title").text(format!("{}: {}", label, formatter.format(value)))
}

fn bar_chart(spec: &ChartSpec, viewport: Viewport, formatter: &CurrencyFormatter) -> Result<Element> {
    let width = f64::from(viewport.width.max(240));
    let height = f64::from(viewport.height.max(160));
    let margin_left = 96.0;
    let margin_top = 16.0;
    let margin_bottom = 28.0;
    let plot_w = width - margin_left - 16.0;
    let plot_h = height - margin_top - margin_bottom;

    let max_value = spec
        .points
        .iter()
        .map(|p| p.value)
        .max()
        .unwrap_or(Decimal::ZERO);
    let scale = max_value.to_f64().unwrap_or(0.0).max(1.0);

    let mut svg = svg_root(width, height, &spec.title);

    // Axis ticks at 0, half, and the maximum, all currency-formatted.
    for step in 0..=2u32 {
        let tick = max_value * Decimal::from(step) / Decimal::TWO;
        let y = margin_top + plot_h * (1.0 - f64::from(step) / 2.0);
        svg = svg.child(
            Element::new("text")
                .class("axis-label")
                .attr("x", format!("{:.1}", margin_left - 8.0))
                .attr("y", format!("{:.1}", y + 4.0))
                .attr("text-anchor", "end")
                .text(formatter.format(tick)),
        );
    }

    let count = spec.points.len() as f64;
    let slot_w = plot_w / count;
    let bar_w = slot_w * 0.5;

    for (i, point) in spec.points.iter().enumerate() {
        let value = point.value.to_f64().unwrap_or(0.0).max(0.0);
        let bar_h = plot_h * (value / scale);
        let x = margin_left + slot_w * i as f64 + (slot_w - bar_w) / 2.0;
        let y = margin_top + plot_h - bar_h;
        let color = PALETTE[i % PALETTE.len()];

        svg = svg.child(
            Element::new("rect")
                .attr("x", format!("{:.1}", x))
                .attr("y", format!("{:.1}", y))
                .attr("width", format!("{:.1}", bar_w))
                .attr("height", format!("{:.1}", bar_h))
                .attr("rx", "6")
                .attr("fill", color)
                .child(tooltip(&point.label, point.value, formatter)),
        );
        svg = svg.child(
            Element::new("text")
                .class("bar-label")
                .attr("x", format!("{:.1}", x + bar_w / 2.0))
                .attr("y", format!("{:.1}", height - 8.0))
                .attr("text-anchor", "middle")
                .text(point.label.clone()),
        );
    }

    Ok(svg)
}

fn donut_chart(
    spec: &ChartSpec,
    viewport: Viewport,
    formatter: &CurrencyFormatter,
) -> Result<Element> {
    let side = f64::from(viewport.width.min(viewport.height).max(160));
    let center = side / 2.0;
    let radius = side * 0.34;
    let stroke_width = side * 0.12;
    let circumference = 2.0 * PI * radius;

    let total: Decimal = spec.points.iter().map(|p| p.value).sum();
    if total < Decimal::ZERO {
        return Err(Error::Render("negative distribution total".to_string()));
    }

    let mut svg = svg_root(side, side, &spec.title);
    let mut offset = 0.0;

    for (i, point) in spec.points.iter().enumerate() {
        let fraction = if total.is_zero() {
            0.0
        } else {
            (point.value / total).to_f64().unwrap_or(0.0).clamp(0.0, 1.0)
        };
        let segment = fraction * circumference;
        let color = PALETTE[i % PALETTE.len()];

        svg = svg.child(
            Element::new("circle")
                .attr("cx", format!("{:.1}", center))
                .attr("cy", format!("{:.1}", center))
                .attr("r", format!("{:.1}", radius))
                .attr("fill", "none")
                .attr("stroke", color)
                .attr("stroke-width", format!("{:.1}", stroke_width))
                .attr(
                    "stroke-dasharray",
                    format!("{:.2} {:.2}", segment, circumference - segment),
                )
                .attr("stroke-dashoffset", format!("{:.2}", -offset))
                .attr("transform", format!("rotate(-90 {:.1} {:.1})", center, center))
                .child(tooltip(&point.label, point.value, formatter)),
        );
        offset += segment;
    }

    svg = svg.child(
        Element::new("text")
            .class("donut-total")
            .attr("x", format!("{:.1}", center))
            .attr("y", format!("{:.1}", center + 4.0))
            .attr("text-anchor", "middle")
            .text(formatter.format(total)),
    );

    Ok(svg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::charts::ChartPoint;
    use rust_decimal_macros::dec;

    fn comparison_spec() -> ChartSpec {
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
    fn test_bar_chart_formats_axis_and_tooltips() {
        let backend = SvgChartBackend::new();
        let handle = backend
            .build(
                &comparison_spec(),
                Viewport::default(),
                &CurrencyFormatter::brl(),
            )
            .unwrap();
        let html = handle.html();

        assert!(html.contains("R$ 500,00"));
        assert!(html.contains("R$ 250,00"));
        assert!(html.contains("Vendas: R$ 500,00"));
        handle.destroy();
        assert_eq!(backend.live_instances(), 0);
    }

    #[test]
    fn test_donut_segments_sum_to_circumference() {
        let backend = SvgChartBackend::new();
        let spec = ChartSpec {
            kind: ChartKind::BrandDonut,
            title: "Distribuição de vendas".to_string(),
            points: vec![
                ChartPoint {
                    label: "Visa".to_string(),
                    value: dec!(300),
                },
                ChartPoint {
                    label: "Mastercard".to_string(),
                    value: dec!(100),
                },
            ],
        };
        let handle = backend
            .build(&spec, Viewport::new(320, 320), &CurrencyFormatter::brl())
            .unwrap();
        let html = handle.html();

        assert!(html.contains("Visa: R$ 300,00"));
        assert!(html.contains("R$ 400,00"));
        assert_eq!(backend.live_instances(), 1);
    }

    #[test]
    fn test_malicious_label_is_escaped() {
        let backend = SvgChartBackend::new();
        let spec = ChartSpec {
            kind: ChartKind::BrandDonut,
            title: "Distribuição de vendas".to_string(),
            points: vec![ChartPoint {
                label: "<script>alert(1)</script>".to_string(),
                value: dec!(10),
            }],
        };
        let handle = backend
            .build(&spec, Viewport::new(320, 320), &CurrencyFormatter::brl())
            .unwrap();
        assert!(!handle.html().contains("<script>"));
    }
}
