//! KPI tiles, acquirer cards, and result panels.
//!
//! Pure snapshot-to-markup functions; every server string passes through the
//! safe element tree and every monetary value through the formatter.

use rust_decimal::Decimal;

use concilia_core::currency::CurrencyFormatter;
use concilia_core::kpi::{classify, AcquirerRow, KpiSummary};
use concilia_core::render::Element;
use concilia_core::upload::UploadSummary;

use concilia_client::ReconciliationOutcome;

fn value_class(value: Decimal) -> &'static str {
    if value.is_sign_negative() && !value.is_zero() {
        "kpi-negative"
    } else {
        "kpi-positive"
    }
}

/// The four headline KPI tiles.
pub fn render_kpi_tiles(summary: &KpiSummary, formatter: &CurrencyFormatter) -> Element {
    let tile = |class: &str, label: &str, value: String| {
        Element::new("div")
            .class("kpi-tile")
            .class(class)
            .attr("tabindex", "0")
            .child(Element::new("span").class("kpi-label").text(label))
            .child(Element::new("span").class("kpi-value").text(value))
    };

    Element::new("section")
        .class("kpi-tiles")
        .child(tile(
            "kpi-vendas",
            "Total de Vendas",
            formatter.format(summary.total_sales),
        ))
        .child(tile(
            "kpi-recebido",
            "Total Recebido",
            formatter.format(summary.total_received),
        ))
        .child(
            tile(
                "kpi-diferenca",
                "Diferença",
                formatter.format(summary.difference),
            )
            .class(value_class(summary.difference)),
        )
        .child(tile(
            "kpi-alertas",
            "Alertas",
            summary.alert_count.to_string(),
        ))
}

/// One card per acquirer, in the rows' (already sorted) order.
pub fn render_acquirer_cards(rows: &[AcquirerRow], formatter: &CurrencyFormatter) -> Element {
    if rows.is_empty() {
        return Element::new("div")
            .class("acq-empty-state")
            .attr("role", "status")
            .child(Element::new("p").text("Nenhuma adquirente encontrada."));
    }

    let cards = rows.iter().map(|row| {
        let figure = |label: &str, value: Decimal| {
            Element::new("div")
                .class("acq-figure")
                .child(Element::new("span").class("acq-figure-label").text(label))
                .child(
                    Element::new("span")
                        .class("acq-figure-value")
                        .text(formatter.format(value)),
                )
        };

        Element::new("div")
            .class("acq-card")
            .class(format!("acq-{}", classify(&row.name).as_str()))
            .attr("tabindex", "0")
            .attr("data-acq", row.name.clone())
            .child(Element::new("h3").text(row.name.clone()))
            .child(figure("Vendas", row.figures.sales))
            .child(figure("Recebido", row.figures.received))
            .child(
                figure("Diferença", row.figures.difference).class(value_class(row.figures.difference)),
            )
    });

    Element::new("section").class("acq-cards").children(cards)
}

/// Result block shown after a successful upload.
pub fn render_upload_summary(summary: &UploadSummary, formatter: &CurrencyFormatter) -> Element {
    let line = |label: &str, value: String| {
        Element::new("p")
            .child(Element::new("strong").text(label))
            .text(format!(" {}", value))
    };

    Element::new("div")
        .class("upload-result")
        .attr("role", "status")
        .child(Element::new("h3").text("Arquivos processados"))
        .child(line("Total de arquivos:", summary.files_total.to_string()))
        .child(line("Vendas:", summary.sales_found.to_string()))
        .child(line("Recebimentos:", summary.receipts_found.to_string()))
        .child(line("Total Vendas:", formatter.format(summary.total_sales)))
        .child(line("Total Recebido:", formatter.format(summary.total_received)))
        .child(Element::new("p").text(summary.message.clone()))
}

/// Result block shown after a reconciliation run.
pub fn render_reconciliation_summary(outcome: &ReconciliationOutcome) -> Element {
    let line = |label: &str, value: u32| {
        Element::new("p")
            .child(Element::new("strong").text(label))
            .text(format!(" {}", value))
    };

    Element::new("div")
        .class("conciliacao-result")
        .attr("role", "status")
        .child(Element::new("h3").text("Conciliação concluída"))
        .child(line("Conciliadas:", outcome.conciliados))
        .child(line("Parciais:", outcome.parciais))
        .child(line("Multivendas:", outcome.multivendas))
        .child(line("Não conciliadas:", outcome.nao_conciliados))
        .child(line("Créditos sem origem:", outcome.creditos_sem_origem))
}

/// Placeholder while no snapshot has been fetched yet.
pub fn render_loading() -> Element {
    Element::new("div")
        .class("nc-loading")
        .attr("role", "status")
        .attr("aria-live", "polite")
        .child(Element::new("span").class("spinner").attr("aria-hidden", "true"))
        .child(Element::new("span").text("Carregando dados do dashboard..."))
}
