//! Safe markup construction.
//!
//! Every server-supplied string that reaches the page goes through this
//! module. Text and attribute values are escaped exactly once, at
//! serialization time; there is intentionally no API that accepts pre-built
//! markup.

mod element;
mod escape;

pub use element::{Element, Node};
pub use escape::{escape, escape_opt, escape_value};
