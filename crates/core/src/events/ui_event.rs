//! UI event types.

use serde::{Deserialize, Serialize};

/// An independently failing render surface.
///
/// Failures are scoped to a widget so one failing fetch never blocks the
/// others.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Widget {
    KpiTiles,
    AcquirerCards,
    ComparisonChart,
    BrandChart,
    DrillDown,
    UploadPanel,
    ReconciliationPanel,
}

/// Events emitted by the dashboard pipeline.
///
/// The host surface (webview, SSR shell, test harness) subscribes through a
/// [`UiEventSink`](super::UiEventSink) and applies the rendered artifacts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum UiEvent {
    /// A fresh snapshot was committed to the cache.
    SnapshotApplied { seq: u64 },

    /// A response lost the ordering race and was dropped.
    StaleSnapshotDiscarded { seq: u64, committed: u64 },

    /// A widget re-rendered; `html` is already escaped and safe to insert.
    WidgetRendered { widget: Widget, html: String },

    /// A widget failed; `message` is user-readable and already escaped.
    WidgetFailed {
        widget: Widget,
        kind: String,
        message: String,
    },

    /// Upload transfer progress, 0-100.
    UploadProgress { batch_id: String, percent: u8 },

    /// The session expired; the host should navigate after `delay_ms`.
    LoginRedirectScheduled { href: String, delay_ms: u64 },
}

impl UiEvent {
    /// Creates a WidgetRendered event.
    pub fn rendered(widget: Widget, html: String) -> Self {
        Self::WidgetRendered { widget, html }
    }

    /// Creates a WidgetFailed event from an error, escaping the user message.
    pub fn failed(widget: Widget, error: &crate::errors::Error) -> Self {
        Self::WidgetFailed {
            widget,
            kind: error.kind(),
            message: crate::render::escape(&error.user_message()),
        }
    }

    /// Creates an UploadProgress event, clamped to 100.
    pub fn upload_progress(batch_id: String, percent: u8) -> Self {
        Self::UploadProgress {
            batch_id,
            percent: percent.min(100),
        }
    }
}
