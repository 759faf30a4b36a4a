//! UI events and the sink they flow through.

mod sink;
mod ui_event;

pub use sink::{MockUiEventSink, NoOpUiEventSink, UiEventSink};
pub use ui_event::{UiEvent, Widget};
