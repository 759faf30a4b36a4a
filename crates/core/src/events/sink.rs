//! UI event sink trait and implementations.

use std::sync::{Arc, Mutex};

use super::UiEvent;

/// Trait for receiving UI events.
///
/// The pipeline emits events after renders, cache commits, and upload
/// progress checkpoints. Implementations apply them to the host surface.
///
/// `emit()` must be fast and non-blocking; failure to apply an event must
/// not affect the pipeline (best-effort).
pub trait UiEventSink: Send + Sync {
    /// Emit a single event.
    fn emit(&self, event: UiEvent);

    /// Emit multiple events, by default one at a time.
    fn emit_batch(&self, events: Vec<UiEvent>) {
        for event in events {
            self.emit(event);
        }
    }
}

/// No-op implementation for tests or headless contexts.
#[derive(Clone, Default)]
pub struct NoOpUiEventSink;

impl UiEventSink for NoOpUiEventSink {
    fn emit(&self, _event: UiEvent) {
        // Intentionally empty - events are discarded
    }
}

/// Mock sink for testing - collects emitted events.
#[derive(Clone, Default)]
pub struct MockUiEventSink {
    events: Arc<Mutex<Vec<UiEvent>>>,
}

impl MockUiEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all collected events.
    pub fn events(&self) -> Vec<UiEvent> {
        self.events.lock().unwrap().clone()
    }

    /// The most recently emitted event, if any.
    pub fn last(&self) -> Option<UiEvent> {
        self.events.lock().unwrap().last().cloned()
    }

    pub fn clear(&self) {
        self.events.lock().unwrap().clear();
    }

    pub fn len(&self) -> usize {
        self.events.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().unwrap().is_empty()
    }
}

impl UiEventSink for MockUiEventSink {
    fn emit(&self, event: UiEvent) {
        self.events.lock().unwrap().push(event);
    }
}
