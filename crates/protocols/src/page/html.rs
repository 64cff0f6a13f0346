//! Adapter from raw HTML to the page model.

use super::address::PageAddress;
use super::document::PageDocument;
use super::spec::{ElementSpec, NodeSpec};
use scraper::{ElementRef, Html, Node};

/// Elements that never contribute rendered text.
const SKIPPED_TAGS: [&str; 6] = ["script", "style", "noscript", "template", "head", "svg"];

impl PageDocument {
    /// Parses an HTML page. The document root is `<body>` when present.
    pub fn from_html(address: PageAddress, html: &str) -> Self {
        let (title, root) = element_spec_from_html(html);
        Self::new(address, title, &root)
    }
}

/// Converts HTML into an element tree and the page `<title>`.
pub fn element_spec_from_html(html: &str) -> (String, ElementSpec) {
    let parsed = Html::parse_document(html);
    let root = parsed.root_element();

    let title = root
        .descendants()
        .filter_map(ElementRef::wrap)
        .find(|e| e.value().name() == "title")
        .map(|e| e.text().collect::<String>().trim().to_string())
        .unwrap_or_default();

    let body = root
        .children()
        .filter_map(ElementRef::wrap)
        .find(|e| e.value().name() == "body")
        .unwrap_or(root);

    (title, convert(body))
}

fn convert(element: ElementRef<'_>) -> ElementSpec {
    let value = element.value();
    let mut spec = ElementSpec::new(value.name());
    for (name, attr) in value.attrs() {
        spec.attrs.insert(name.to_string(), attr.to_string());
    }

    for child in element.children() {
        match child.value() {
            Node::Text(text) => {
                let text: &str = text;
                if !text.is_empty() {
                    spec.children.push(NodeSpec::Text(text.to_string()));
                }
            }
            Node::Element(inner) if SKIPPED_TAGS.contains(&inner.name()) => {}
            Node::Element(_) => {
                if let Some(child) = ElementRef::wrap(child) {
                    spec.children.push(NodeSpec::Element(convert(child)));
                }
            }
            _ => {}
        }
    }
    spec
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::NodeKind;

    #[test]
    fn test_from_html_reads_body_and_title() {
        let html = r#"<html><head><title> Orca | Portfolio </title><style>.x{}</style></head>
            <body>
              <script>var ignored = 1;</script>
              <div>Total Value <span>$1,234.56</span></div>
              <table><tbody><tr><td>SOL/USDC 0.25%</td><td>$500.00</td></tr></tbody></table>
            </body></html>"#;
        let address = PageAddress::parse("https://www.orca.so/portfolio").unwrap();
        let doc = PageDocument::from_html(address, html);

        assert_eq!(doc.title(), "Orca | Portfolio");
        assert_eq!(doc.body_text(), "Total Value $1,234.56\nSOL/USDC 0.25%\t$500.00");
        assert_eq!(doc.elements_of(&[NodeKind::Row]).count(), 1);
    }
}
