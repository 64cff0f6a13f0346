//! Page model: a read-only, queryable element tree with rendered text.
//!
//! Extractors never touch HTML or a browser directly; they query a
//! [`PageDocument`] built from an [`ElementSpec`] tree or from raw HTML.

pub mod address;
pub mod document;
pub mod html;
pub mod spec;

pub use address::PageAddress;
pub use document::{Element, NodeId, NodeKind, PageDocument};
pub use html::element_spec_from_html;
pub use spec::{ElementSpec, NodeSpec};
