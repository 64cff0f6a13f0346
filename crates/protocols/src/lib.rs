//! Protocol page extraction.
//!
//! A captured page is indexed as a [`page::PageDocument`]; the
//! [`ProtocolRegistry`] picks the extractor for its host, and the extractor
//! turns it into a normalized [`Snapshot`](lp_watch_domain::Snapshot).

/// Lazily compiled static regex.
macro_rules! pattern {
    ($re:expr) => {
        ::once_cell::sync::Lazy::new(|| {
            ::regex::Regex::new($re).expect("static pattern must compile")
        })
    };
}

pub mod draft;
pub mod error;
pub mod extractor;
pub mod extractors;
pub mod heuristics;
pub mod normalize;
pub mod page;
pub mod prelude;
pub mod registry;

pub use error::{ExtractionError, ExtractionFailure};
pub use extractor::{Extractor, PageView};
pub use page::{ElementSpec, PageAddress, PageDocument};
pub use registry::ProtocolRegistry;
