//! Page sources: where captured pages come from.

use async_trait::async_trait;
use lp_watch_protocols::{ElementSpec, ExtractionError, PageAddress, PageDocument};
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

/// Errors raised while loading a page.
#[derive(Debug, Error)]
pub enum PageSourceError {
    #[error("failed to read page `{location}`: {source}")]
    Io {
        location: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse page fixture: {0}")]
    Parse(#[from] serde_json::Error),

    #[error(transparent)]
    Address(#[from] ExtractionError),

    #[error("no page address known for `{0}`")]
    MissingAddress(String),
}

/// Supplies rendered pages for capture.
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn fetch(&self, location: &str) -> Result<PageDocument, PageSourceError>;
}

/// Serialized page: an element tree or raw HTML, plus the address it was taken from.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PageFixture {
    Tree {
        url: String,
        #[serde(default)]
        title: String,
        root: ElementSpec,
    },
    Html {
        url: String,
        html: String,
    },
}

/// Parses a JSON page fixture.
///
/// # Errors
/// Returns an error if the JSON is malformed or the address is not a URL.
pub fn parse_fixture(json: &str) -> Result<PageDocument, PageSourceError> {
    let fixture: PageFixture = serde_json::from_str(json)?;
    match fixture {
        PageFixture::Tree { url, title, root } => {
            Ok(PageDocument::new(PageAddress::parse(&url)?, title, &root))
        }
        PageFixture::Html { url, html } => {
            Ok(PageDocument::from_html(PageAddress::parse(&url)?, &html))
        }
    }
}

/// Loads pages saved to disk.
///
/// `.json` files are page fixtures carrying their own address. Any other
/// file is read as HTML and needs the address given to [`Self::with_address`].
#[derive(Debug, Clone, Default)]
pub struct FilePageSource {
    address: Option<String>,
}

impl FilePageSource {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }
}

#[async_trait]
impl PageSource for FilePageSource {
    async fn fetch(&self, location: &str) -> Result<PageDocument, PageSourceError> {
        let content =
            tokio::fs::read_to_string(location)
                .await
                .map_err(|source| PageSourceError::Io {
                    location: location.to_string(),
                    source,
                })?;

        let is_fixture = Path::new(location)
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        let page = if is_fixture {
            parse_fixture(&content)?
        } else {
            let address = self
                .address
                .as_deref()
                .ok_or_else(|| PageSourceError::MissingAddress(location.to_string()))?;
            PageDocument::from_html(PageAddress::parse(address)?, &content)
        };

        debug!(location, url = %page.address(), "Loaded page");
        Ok(page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_tree_fixture() {
        let json = r#"{
            "url": "https://app.cetus.zone/liquidity",
            "title": "Cetus",
            "root": {"tag": "body", "children": [
                {"tag": "div", "children": ["SUI - USDC"]}
            ]}
        }"#;
        let page = parse_fixture(json).unwrap();
        assert_eq!(page.title(), "Cetus");
        assert_eq!(page.address().host(), "app.cetus.zone");
        assert!(page.body_text().contains("SUI - USDC"));
    }

    #[test]
    fn test_parses_html_fixture() {
        let json = r#"{
            "url": "https://www.orca.so/portfolio",
            "html": "<html><head><title>Orca</title></head><body><p>Total Value $10.00</p></body></html>"
        }"#;
        let page = parse_fixture(json).unwrap();
        assert_eq!(page.title(), "Orca");
        assert!(page.body_text().contains("Total Value $10.00"));
    }

    #[test]
    fn test_rejects_bad_address() {
        let json = r#"{"url": "not a url", "root": {"tag": "body"}}"#;
        assert!(matches!(
            parse_fixture(json),
            Err(PageSourceError::Address(_))
        ));
    }

    #[tokio::test]
    async fn test_html_file_needs_an_address() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("page.html");
        std::fs::write(&path, "<body><p>Deposited $5</p></body>").unwrap();
        let location = path.to_string_lossy().to_string();

        let missing = FilePageSource::new().fetch(&location).await;
        assert!(matches!(missing, Err(PageSourceError::MissingAddress(_))));

        let page = FilePageSource::new()
            .with_address("https://app.beefy.com/dashboard")
            .fetch(&location)
            .await
            .unwrap();
        assert_eq!(page.address().host(), "app.beefy.com");
    }
}
