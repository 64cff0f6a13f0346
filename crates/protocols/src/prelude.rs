//! Common imports for callers of the extraction layer.

pub use crate::error::{ExtractionError, ExtractionFailure};
pub use crate::extractor::{Extractor, PageView};
pub use crate::page::{ElementSpec, NodeKind, PageAddress, PageDocument};
pub use crate::registry::ProtocolRegistry;
