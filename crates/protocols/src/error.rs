use lp_watch_domain::Protocol;
use thiserror::Error;

/// Errors raised while turning a page into a snapshot.
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// The page has no body or no visible text.
    #[error("page has no content to extract")]
    EmptyPage,

    /// No registered extractor recognises the page host.
    #[error("no extractor registered for host `{host}`")]
    Unsupported { host: String },

    #[error("invalid page address `{address}`: {source}")]
    InvalidAddress {
        address: String,
        #[source]
        source: url::ParseError,
    },
}

/// An extraction error tagged with the protocol whose extractor raised it.
#[derive(Debug, Error)]
#[error("{protocol} extraction failed: {error}")]
pub struct ExtractionFailure {
    pub protocol: Protocol,
    #[source]
    pub error: ExtractionError,
}

impl ExtractionFailure {
    pub fn new(protocol: Protocol, error: ExtractionError) -> Self {
        Self { protocol, error }
    }
}
