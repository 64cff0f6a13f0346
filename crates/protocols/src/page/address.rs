use crate::error::ExtractionError;
use std::fmt;
use url::Url;

/// Parsed URL of a captured page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageAddress {
    url: Url,
}

impl PageAddress {
    pub fn parse(address: &str) -> Result<Self, ExtractionError> {
        let url = Url::parse(address.trim()).map_err(|source| ExtractionError::InvalidAddress {
            address: address.to_string(),
            source,
        })?;
        Ok(Self { url })
    }

    /// Lowercased host name, empty for hostless URLs.
    pub fn host(&self) -> &str {
        self.url.host_str().unwrap_or_default()
    }

    pub fn path(&self) -> &str {
        self.url.path()
    }

    /// First value of a query parameter.
    pub fn query_param(&self, name: &str) -> Option<String> {
        self.url
            .query_pairs()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.into_owned())
    }

    pub fn host_contains(&self, marker: &str) -> bool {
        self.host().contains(marker)
    }

    pub fn path_contains(&self, marker: &str) -> bool {
        self.path().contains(marker)
    }

    pub fn as_str(&self) -> &str {
        self.url.as_str()
    }
}

impl fmt::Display for PageAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_exposes_host_path_and_query() {
        let address = PageAddress::parse(
            "https://app.hyperion.xyz/position/42?currencyA=0x1::aptos_coin::AptosCoin",
        )
        .unwrap();
        assert_eq!(address.host(), "app.hyperion.xyz");
        assert!(address.path_contains("/position/"));
        assert_eq!(
            address.query_param("currencyA").as_deref(),
            Some("0x1::aptos_coin::AptosCoin")
        );
        assert_eq!(address.query_param("currencyB"), None);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(
            PageAddress::parse("not a url"),
            Err(ExtractionError::InvalidAddress { .. })
        ));
    }
}
