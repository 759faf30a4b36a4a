//! Chart backend trait and instance ownership.
//!
//! The renderer's contract (one handle per slot, destroy-before-replace)
//! is independent of the backend that actually draws; swapping the SVG
//! backend for a canvas- or library-backed one only means implementing
//! [`ChartBackend`].

use concilia_core::currency::CurrencyFormatter;
use concilia_core::errors::Result;

use super::{ChartSpec, Viewport};

/// A live chart produced by a backend.
///
/// Dropping the instance releases whatever the backend allocated for it.
pub trait ChartInstance: Send {
    /// The rendered markup, already escaped.
    fn html(&self) -> &str;
}

/// Ownership wrapper around a rendered chart instance.
///
/// At most one live handle exists per chart slot; the slot destroys the old
/// handle before a replacement is created.
pub struct ChartHandle {
    instance: Box<dyn ChartInstance>,
}

impl ChartHandle {
    pub fn new(instance: Box<dyn ChartInstance>) -> Self {
        Self { instance }
    }

    pub fn html(&self) -> &str {
        self.instance.html()
    }

    /// Explicitly tears the instance down.
    pub fn destroy(self) {
        drop(self.instance);
    }
}

/// Builds chart instances from specs.
///
/// Implementations must route every displayed number through the given
/// [`CurrencyFormatter`], tooltips and axis labels included.
pub trait ChartBackend: Send + Sync {
    fn build(
        &self,
        spec: &ChartSpec,
        viewport: Viewport,
        formatter: &CurrencyFormatter,
    ) -> Result<ChartHandle>;
}
