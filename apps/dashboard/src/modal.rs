//! Drill-down modal: paginated detail table with a keyboard focus trap.
//!
//! Two row sources: a subset filtered out of the cached snapshot (acquirer
//! and KPI-tile drill-downs, no fetch), or the detail endpoint via an
//! injected fetcher, where each page change re-invokes the fetch with the new
//! page number and replaces the rows wholesale.

use std::sync::Arc;

use log::debug;

use concilia_core::currency::CurrencyFormatter;
use concilia_core::errors::Result;
use concilia_core::render::Element;
use concilia_core::snapshot::SaleRow;

use concilia_client::{DetailFetcher, DetailPage, DetailQuery};

/// Fixed column set of the detail table.
const COLUMNS: [&str; 8] = [
    "Data Venda",
    "Adquirente",
    "Bandeira",
    "Valor Líquido",
    "Previsto",
    "Conciliado",
    "Diferença",
    "Status",
];

/// Focusable control ids inside the modal, in Tab order. The close control
/// comes first so it receives focus on open.
const CLOSE_CONTROL: &str = "modal-close";
const PREV_CONTROL: &str = "modal-prev";
const NEXT_CONTROL: &str = "modal-next";

/// Keyboard input the modal reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Tab { shift: bool },
    Escape,
}

/// What a key press did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyOutcome {
    /// Focus moved to the control with this id.
    FocusMoved(String),
    /// The modal closed and the trap was torn down.
    Closed,
    /// The key was not handled (modal closed or key irrelevant).
    Ignored,
}

/// Confines Tab/Shift+Tab cycling to the modal's focusable controls.
#[derive(Debug, Clone)]
struct FocusTrap {
    order: Vec<String>,
    index: usize,
}

impl FocusTrap {
    fn new(order: Vec<String>) -> Self {
        Self { order, index: 0 }
    }

    /// The id currently holding focus.
    fn focused(&self) -> &str {
        &self.order[self.index]
    }

    fn advance(&mut self, backwards: bool) -> String {
        let len = self.order.len();
        self.index = if backwards {
            (self.index + len - 1) % len
        } else {
            (self.index + 1) % len
        };
        self.order[self.index].clone()
    }
}

#[derive(Debug, Clone)]
struct Pagination {
    page: u32,
    pages: u32,
    total: u64,
}

struct OpenModal {
    title: String,
    rows: Vec<SaleRow>,
    /// Present only for fetcher-driven modals.
    pagination: Option<Pagination>,
    query: Option<DetailQuery>,
    trap: FocusTrap,
}

/// The drill-down modal. At most one is open at a time; closing drops the
/// focus trap, so repeated opens never stack key handlers.
pub struct DrillDownModal {
    fetcher: Arc<dyn DetailFetcher>,
    formatter: CurrencyFormatter,
    state: Option<OpenModal>,
}

impl DrillDownModal {
    pub fn new(fetcher: Arc<dyn DetailFetcher>, formatter: CurrencyFormatter) -> Self {
        Self {
            fetcher,
            formatter,
            state: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.state.is_some()
    }

    /// The control currently holding focus, if open.
    pub fn focused_control(&self) -> Option<&str> {
        self.state.as_ref().map(|open| open.trap.focused())
    }

    /// Opens over a row subset read from the cached snapshot. Single page,
    /// no fetch.
    pub fn open_with_rows(&mut self, title: impl Into<String>, rows: Vec<SaleRow>) -> String {
        let open = OpenModal {
            title: title.into(),
            rows,
            pagination: None,
            query: None,
            trap: FocusTrap::new(vec![CLOSE_CONTROL.to_string()]),
        };
        let html = self.render(&open);
        self.state = Some(open);
        html
    }

    /// Opens over the detail endpoint, fetching the query's page.
    pub async fn open_with_query(
        &mut self,
        title: impl Into<String>,
        query: DetailQuery,
    ) -> Result<String> {
        let page = self.fetcher.fetch_page(&query).await?;
        let open = self.build_fetched(title.into(), query, page);
        let html = self.render(&open);
        self.state = Some(open);
        Ok(html)
    }

    /// Re-fetches with the new page number and replaces the rows wholesale.
    /// No-op when the modal is closed or cache-sourced.
    pub async fn change_page(&mut self, page: u32) -> Result<Option<String>> {
        let Some(open) = &self.state else {
            return Ok(None);
        };
        let Some(query) = &open.query else {
            return Ok(None);
        };

        let query = query.with_page(page);
        debug!("drill-down page change -> {}", query.page);
        let fetched = self.fetcher.fetch_page(&query).await?;
        let title = open.title.clone();
        let open = self.build_fetched(title, query, fetched);
        let html = self.render(&open);
        self.state = Some(open);
        Ok(Some(html))
    }

    /// Handles a key press while open.
    pub fn handle_key(&mut self, key: Key) -> KeyOutcome {
        match key {
            Key::Tab { shift } => match &mut self.state {
                Some(open) => KeyOutcome::FocusMoved(open.trap.advance(shift)),
                None => KeyOutcome::Ignored,
            },
            Key::Escape => {
                if self.state.is_none() {
                    return KeyOutcome::Ignored;
                }
                self.close();
                KeyOutcome::Closed
            }
        }
    }

    /// Closes the modal and tears down the focus trap.
    pub fn close(&mut self) {
        self.state = None;
    }

    fn build_fetched(&self, title: String, query: DetailQuery, page: DetailPage) -> OpenModal {
        let mut order = vec![CLOSE_CONTROL.to_string()];
        if page.page > 1 {
            order.push(PREV_CONTROL.to_string());
        }
        if page.page < page.pages {
            order.push(NEXT_CONTROL.to_string());
        }
        OpenModal {
            title,
            rows: page.rows,
            pagination: Some(Pagination {
                page: page.page,
                pages: page.pages,
                total: page.total,
            }),
            query: Some(query),
            trap: FocusTrap::new(order),
        }
    }

    fn render(&self, open: &OpenModal) -> String {
        let close = Element::new("button")
            .class("modal-close")
            .attr("id", CLOSE_CONTROL)
            .attr("type", "button")
            .attr("aria-label", "Fechar")
            .text("×");

        let mut dialog = Element::new("div")
            .class("nc-modal")
            .attr("role", "dialog")
            .attr("aria-modal", "true")
            .attr("aria-label", open.title.clone())
            .child(close)
            .child(Element::new("h2").text(open.title.clone()));

        if open.rows.is_empty() {
            dialog = dialog.child(
                Element::new("div")
                    .class("nc-empty-state")
                    .attr("role", "status")
                    .child(Element::new("h3").text("Nenhum dado encontrado"))
                    .child(Element::new("p").text(
                        "Não há registros de conciliação para os filtros selecionados.",
                    )),
            );
        } else {
            dialog = dialog.child(self.render_table(&open.rows));
        }

        if let Some(pagination) = &open.pagination {
            if pagination.pages > 1 {
                dialog = dialog.child(self.render_pagination(pagination));
            }
        }

        dialog.to_html()
    }

    fn render_table(&self, rows: &[SaleRow]) -> Element {
        let header = Element::new("tr").children(
            COLUMNS
                .iter()
                .map(|label| Element::new("th").attr("scope", "col").text(*label)),
        );

        let body_rows = rows.iter().map(|row| {
            let date = |value: Option<chrono::NaiveDate>| {
                value
                    .map(|d| d.format("%d/%m/%Y").to_string())
                    .unwrap_or_else(|| "-".to_string())
            };
            let difference = row.settlement_difference();
            let diff_class = if difference.is_zero() {
                "diff-zero"
            } else {
                "diff-nonzero"
            };

            Element::new("tr")
                .child(Element::new("td").text(date(row.date)))
                .child(Element::new("td").text(row.acquirer_or_default()))
                .child(Element::new("td").text(row.brand.clone().unwrap_or_else(|| "-".to_string())))
                .child(Element::new("td").text(self.formatter.format(row.net_value)))
                .child(Element::new("td").text(date(row.expected_settlement_date)))
                .child(
                    Element::new("td").text(
                        row.settled_value
                            .map(|v| self.formatter.format(v))
                            .unwrap_or_else(|| "-".to_string()),
                    ),
                )
                .child(
                    Element::new("td")
                        .class(diff_class)
                        .text(self.formatter.format(difference)),
                )
                .child(
                    Element::new("td")
                        .class(row.status.css_class())
                        .text(row.status.label()),
                )
        });

        Element::new("table")
            .class("detalhado-table")
            .attr("aria-label", "Detalhamento de conciliação")
            .child(Element::new("thead").child(header))
            .child(Element::new("tbody").children(body_rows))
    }

    fn render_pagination(&self, pagination: &Pagination) -> Element {
        let mut nav = Element::new("nav")
            .class("nc-pagination")
            .attr("aria-label", "Paginação da tabela");

        if pagination.page > 1 {
            nav = nav.child(
                Element::new("button")
                    .attr("id", PREV_CONTROL)
                    .attr("type", "button")
                    .text("← Anterior"),
            );
        }
        nav = nav.child(
            Element::new("span")
                .class("nc-page-info")
                .attr("aria-current", "page")
                .text(format!(
                    "Página {} de {} ({} registros)",
                    pagination.page, pagination.pages, pagination.total
                )),
        );
        if pagination.page < pagination.pages {
            nav = nav.child(
                Element::new("button")
                    .attr("id", NEXT_CONTROL)
                    .attr("type", "button")
                    .text("Próxima →"),
            );
        }
        nav
    }
}
