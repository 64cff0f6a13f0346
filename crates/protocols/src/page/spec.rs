use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A child of an [`ElementSpec`]: either a text run or a nested element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NodeSpec {
    Text(String),
    Element(ElementSpec),
}

/// Serialisable description of an element tree.
///
/// This is the interchange format for captured pages: a host (browser
/// bridge, fixture file, HTML adapter) describes the page as nested
/// elements and [`PageDocument`](super::PageDocument) indexes it.
///
/// ```json
/// { "tag": "tr", "attrs": { "class": "position-row" },
///   "children": [ { "tag": "td", "children": ["SOL/USDC 0.25%"] } ] }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementSpec {
    pub tag: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attrs: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NodeSpec>,
}

impl ElementSpec {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attrs: BTreeMap::new(),
            children: Vec::new(),
        }
    }

    /// Element holding a single text run.
    pub fn with_text(tag: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(tag).text(text)
    }

    #[must_use]
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.insert(name.into(), value.into());
        self
    }

    #[must_use]
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.children.push(NodeSpec::Text(text.into()));
        self
    }

    #[must_use]
    pub fn child(mut self, child: ElementSpec) -> Self {
        self.children.push(NodeSpec::Element(child));
        self
    }

    #[must_use]
    pub fn children(mut self, children: impl IntoIterator<Item = ElementSpec>) -> Self {
        self.children
            .extend(children.into_iter().map(NodeSpec::Element));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_accepts_text_and_element_children() {
        let json = r#"{"tag":"div","children":["Total Value",{"tag":"span","children":["$10"]}]}"#;
        let spec: ElementSpec = serde_json::from_str(json).unwrap();
        assert_eq!(
            spec,
            ElementSpec::new("div")
                .text("Total Value")
                .child(ElementSpec::with_text("span", "$10"))
        );
    }
}
