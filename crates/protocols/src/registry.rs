use crate::error::ExtractionError;
use crate::extractor::Extractor;
use crate::extractors::{
    AerodromeExtractor, BeefyExtractor, CetusExtractor, HyperionExtractor, OrcaExtractor,
    PancakeSwapExtractor, RaydiumExtractor,
};
use crate::page::{PageAddress, PageDocument};
use chrono::{DateTime, Utc};
use lp_watch_domain::{Protocol, Snapshot};
use tracing::debug;

/// Ordered table of extractors. The first one whose detector matches wins.
pub struct ProtocolRegistry {
    extractors: Vec<Box<dyn Extractor>>,
}

impl ProtocolRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self {
            extractors: Vec::new(),
        }
    }

    /// All supported protocols in detection order.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(OrcaExtractor));
        registry.register(Box::new(RaydiumExtractor));
        registry.register(Box::new(AerodromeExtractor));
        registry.register(Box::new(CetusExtractor));
        registry.register(Box::new(HyperionExtractor));
        registry.register(Box::new(PancakeSwapExtractor));
        registry.register(Box::new(BeefyExtractor));
        registry
    }

    /// Appends an extractor; earlier registrations take precedence.
    pub fn register(&mut self, extractor: Box<dyn Extractor>) {
        self.extractors.push(extractor);
    }

    pub fn detect(&self, address: &PageAddress) -> Option<&dyn Extractor> {
        self.extractors
            .iter()
            .find(|e| e.detect(address))
            .map(|e| &**e)
    }

    pub fn detect_protocol(&self, address: &PageAddress) -> Option<Protocol> {
        self.detect(address).map(|e| e.protocol())
    }

    pub fn protocols(&self) -> Vec<Protocol> {
        self.extractors.iter().map(|e| e.protocol()).collect()
    }

    /// Detects the protocol of `page` and extracts its snapshot.
    pub fn extract(
        &self,
        page: &PageDocument,
        captured_at: DateTime<Utc>,
    ) -> Result<(Protocol, Snapshot), ExtractionError> {
        let address = page.address();
        let extractor = self
            .detect(address)
            .ok_or_else(|| ExtractionError::Unsupported {
                host: address.host().to_string(),
            })?;
        let protocol = extractor.protocol();
        debug!(%protocol, view = ?extractor.view(address), url = %address, "Extracting page");
        let snapshot = extractor.extract(page, captured_at)?;
        Ok((protocol, snapshot))
    }
}

impl Default for ProtocolRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::ElementSpec;

    fn address(url: &str) -> PageAddress {
        PageAddress::parse(url).unwrap()
    }

    #[test]
    fn test_detects_every_protocol() {
        let registry = ProtocolRegistry::with_defaults();
        let cases = [
            ("https://www.orca.so/portfolio", Protocol::Orca),
            ("https://raydium.io/portfolio/", Protocol::Raydium),
            ("https://aerodrome.finance/dash", Protocol::Aerodrome),
            ("https://app.cetus.zone/liquidity", Protocol::Cetus),
            ("https://app.hyperion.xyz/portfolio", Protocol::Hyperion),
            ("https://pancakeswap.finance/liquidity/positions", Protocol::PancakeSwap),
            ("https://app.beefy.com/dashboard", Protocol::Beefy),
        ];
        for (url, expected) in cases {
            assert_eq!(registry.detect_protocol(&address(url)), Some(expected), "{url}");
        }
        assert_eq!(registry.protocols(), Protocol::ALL.to_vec());
    }

    #[test]
    fn test_unknown_host_is_unsupported() {
        let registry = ProtocolRegistry::with_defaults();
        let page = PageDocument::new(
            address("https://example.com/"),
            "Example",
            &ElementSpec::with_text("body", "Hello"),
        );
        assert!(matches!(
            registry.extract(&page, Utc::now()),
            Err(ExtractionError::Unsupported { host }) if host == "example.com"
        ));
    }

    #[test]
    fn test_empty_registry_detects_nothing() {
        let registry = ProtocolRegistry::new();
        assert!(registry.detect(&address("https://www.orca.so/")).is_none());
    }
}
