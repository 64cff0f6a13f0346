use super::address::PageAddress;
use super::spec::{ElementSpec, NodeSpec};
use std::collections::BTreeMap;
use std::fmt;

/// Index of a node in a [`PageDocument`]. Nodes are stored in document order.
pub type NodeId = usize;

/// Structural role of an element, derived from its tag and attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Body,
    Block,
    Inline,
    Paragraph,
    Heading,
    Table,
    TableSection,
    Row,
    Cell,
    Link,
    Other,
}

impl NodeKind {
    /// Row-like markers win over the tag, so `<div role="row">` is a row.
    pub fn classify(tag: &str, attrs: &BTreeMap<String, String>) -> Self {
        match attrs.get("role").map(String::as_str) {
            Some("row") => return Self::Row,
            Some("cell" | "gridcell") => return Self::Cell,
            _ => {}
        }
        if attrs.contains_key("data-position") || has_class(attrs, "position-row") {
            return Self::Row;
        }
        if has_class(attrs, "cell") {
            return Self::Cell;
        }

        match tag.to_ascii_lowercase().as_str() {
            "html" | "body" => Self::Body,
            "div" | "section" | "article" | "main" | "aside" | "header" | "footer" | "nav"
            | "ul" | "ol" | "li" | "form" | "dl" | "dt" | "dd" => Self::Block,
            "span" | "strong" | "b" | "em" | "i" | "small" | "label" | "sup" | "sub"
            | "button" | "code" => Self::Inline,
            "p" => Self::Paragraph,
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => Self::Heading,
            "table" => Self::Table,
            "thead" | "tbody" | "tfoot" => Self::TableSection,
            "tr" => Self::Row,
            "td" | "th" => Self::Cell,
            "a" => Self::Link,
            _ => Self::Other,
        }
    }

    fn flows_inline(self) -> bool {
        matches!(self, Self::Inline | Self::Link | Self::Other)
    }
}

fn has_class(attrs: &BTreeMap<String, String>, class: &str) -> bool {
    attrs
        .get("class")
        .is_some_and(|classes| classes.split_whitespace().any(|c| c == class))
}

#[derive(Debug, Clone)]
struct PageNode {
    kind: NodeKind,
    tag: String,
    attrs: BTreeMap<String, String>,
    /// Rendered text of the subtree.
    text: String,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    /// One past the last descendant.
    end: NodeId,
}

/// Read-only, indexed view of a captured page.
///
/// Text follows rendered-text conventions: whitespace runs collapse to a
/// single space, adjacent inline content shares a line, block elements
/// start new lines and cells of a row are separated by tabs.
#[derive(Debug, Clone)]
pub struct PageDocument {
    address: PageAddress,
    title: String,
    nodes: Vec<PageNode>,
}

impl PageDocument {
    pub fn new(address: PageAddress, title: impl Into<String>, root: &ElementSpec) -> Self {
        let mut document = Self {
            address,
            title: title.into(),
            nodes: Vec::new(),
        };
        document.insert(root, None);
        document
    }

    fn insert(&mut self, spec: &ElementSpec, parent: Option<NodeId>) -> NodeId {
        let id = self.nodes.len();
        let kind = NodeKind::classify(&spec.tag, &spec.attrs);
        self.nodes.push(PageNode {
            kind,
            tag: spec.tag.to_ascii_lowercase(),
            attrs: spec.attrs.clone(),
            text: String::new(),
            parent,
            children: Vec::new(),
            end: id + 1,
        });

        let mut parts = Vec::with_capacity(spec.children.len());
        for child in &spec.children {
            match child {
                NodeSpec::Text(text) => parts.push(TextPart::Inline(collapse_whitespace(text))),
                NodeSpec::Element(element) => {
                    let child_id = self.insert(element, Some(id));
                    self.nodes[id].children.push(child_id);
                    let child = &self.nodes[child_id];
                    parts.push(TextPart::new(kind, child.kind, child.text.clone()));
                }
            }
        }

        let end = self.nodes.len();
        let node = &mut self.nodes[id];
        node.end = end;
        node.text = compose_text(parts);
        id
    }

    pub fn address(&self) -> &PageAddress {
        &self.address
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn root(&self) -> Element<'_> {
        Element { doc: self, id: 0 }
    }

    pub fn body_text(&self) -> &str {
        self.root().text()
    }

    /// True when the page renders no visible text at all.
    pub fn is_blank(&self) -> bool {
        self.body_text().trim().is_empty()
    }

    /// All elements in document order.
    pub fn elements(&self) -> impl Iterator<Item = Element<'_>> {
        (0..self.nodes.len()).map(move |id| Element { doc: self, id })
    }

    pub fn elements_of<'a>(
        &'a self,
        kinds: &'a [NodeKind],
    ) -> impl Iterator<Item = Element<'a>> + 'a {
        self.elements().filter(move |e| kinds.contains(&e.kind()))
    }

    /// Links whose `href` contains `fragment`, in document order.
    pub fn links_with_href(&self, fragment: &str) -> Vec<Element<'_>> {
        self.root().links_with_href(fragment)
    }

    /// Elements of the given kinds that satisfy `predicate` while none of
    /// their descendants does: the smallest regions carrying all markers.
    pub fn innermost<'a, F>(&'a self, kinds: &[NodeKind], predicate: F) -> Vec<Element<'a>>
    where
        F: Fn(&Element<'a>) -> bool,
    {
        let matched: Vec<NodeId> = self
            .elements()
            .filter(|e| kinds.contains(&e.kind()) && predicate(e))
            .map(|e| e.id)
            .collect();

        matched
            .iter()
            .enumerate()
            .filter(|(index, id)| {
                let end = self.nodes[**id].end;
                matched.get(index + 1).is_none_or(|next| *next >= end)
            })
            .map(|(_, id)| Element { doc: self, id: *id })
            .collect()
    }
}

/// Borrowed handle to one element of a [`PageDocument`].
#[derive(Clone, Copy)]
pub struct Element<'a> {
    doc: &'a PageDocument,
    id: NodeId,
}

impl<'a> Element<'a> {
    fn node(&self) -> &'a PageNode {
        &self.doc.nodes[self.id]
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn kind(&self) -> NodeKind {
        self.node().kind
    }

    pub fn tag(&self) -> &'a str {
        &self.node().tag
    }

    pub fn attr(&self, name: &str) -> Option<&'a str> {
        self.node().attrs.get(name).map(String::as_str)
    }

    pub fn text(&self) -> &'a str {
        &self.node().text
    }

    /// Text length in characters.
    pub fn text_len(&self) -> usize {
        self.text().chars().count()
    }

    pub fn parent(&self) -> Option<Element<'a>> {
        let doc = self.doc;
        self.node().parent.map(|id| Element { doc, id })
    }

    /// Parent, grandparent and so on up to the root.
    pub fn ancestors(&self) -> impl Iterator<Item = Element<'a>> {
        std::iter::successors(self.parent(), |e| e.parent())
    }

    pub fn children(&self) -> impl Iterator<Item = Element<'a>> {
        let doc = self.doc;
        self.node()
            .children
            .iter()
            .map(move |id| Element { doc, id: *id })
    }

    /// Descendants in document order, excluding `self`.
    pub fn descendants(&self) -> impl Iterator<Item = Element<'a>> {
        let doc = self.doc;
        (self.id + 1..self.node().end).map(move |id| Element { doc, id })
    }

    pub fn find_all(&self, kinds: &[NodeKind]) -> Vec<Element<'a>> {
        self.descendants()
            .filter(|e| kinds.contains(&e.kind()))
            .collect()
    }

    pub fn links_with_href(&self, fragment: &str) -> Vec<Element<'a>> {
        self.descendants()
            .filter(|e| e.kind() == NodeKind::Link)
            .filter(|e| e.attr("href").is_some_and(|href| href.contains(fragment)))
            .collect()
    }

    pub fn contains(&self, other: &Element<'_>) -> bool {
        other.id > self.id && other.id < self.node().end
    }
}

impl fmt::Debug for Element<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Element")
            .field("id", &self.id)
            .field("tag", &self.tag())
            .field("kind", &self.kind())
            .finish()
    }
}

enum TextPart {
    Inline(String),
    Cell(String),
    Block(String),
}

impl TextPart {
    fn new(parent: NodeKind, child: NodeKind, text: String) -> Self {
        if parent == NodeKind::Row && child == NodeKind::Cell {
            Self::Cell(text)
        } else if child.flows_inline() {
            Self::Inline(text)
        } else {
            Self::Block(text)
        }
    }
}

fn compose_text(parts: Vec<TextPart>) -> String {
    let mut out = String::new();
    let mut line = String::new();
    for part in parts {
        match part {
            TextPart::Inline(text) => line.push_str(&text),
            TextPart::Cell(text) => {
                if !line.trim().is_empty() {
                    line.push('\t');
                }
                line.push_str(&text);
            }
            TextPart::Block(text) => {
                out.push_str(&line);
                out.push('\n');
                out.push_str(&text);
                out.push('\n');
                line.clear();
            }
        }
    }
    out.push_str(&line);
    tidy_lines(&out)
}

/// Collapses spaces within each tab-separated field and drops blank lines.
fn tidy_lines(text: &str) -> String {
    text.lines()
        .map(|line| {
            line.split('\t')
                .map(|field| field.split_whitespace().collect::<Vec<_>>().join(" "))
                .collect::<Vec<_>>()
                .join("\t")
        })
        .map(|line| line.trim_matches('\t').to_string())
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn collapse_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_space = false;
    for ch in text.chars() {
        if ch.is_whitespace() {
            if !in_space {
                out.push(' ');
            }
            in_space = true;
        } else {
            out.push(ch);
            in_space = false;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn document(root: ElementSpec) -> PageDocument {
        let address = PageAddress::parse("https://www.orca.so/portfolio").unwrap();
        PageDocument::new(address, "Portfolio", &root)
    }

    #[test]
    fn test_text_follows_rendering_rules() {
        let doc = document(
            ElementSpec::new("body")
                .child(
                    ElementSpec::new("div")
                        .child(ElementSpec::with_text("span", "$"))
                        .child(ElementSpec::with_text("span", "1,234.56")),
                )
                .child(ElementSpec::with_text("div", "  Total \n  Value  "))
                .child(
                    ElementSpec::new("table").child(
                        ElementSpec::new("tr")
                            .child(ElementSpec::with_text("td", "SOL/USDC"))
                            .child(ElementSpec::with_text("td", "$10")),
                    ),
                ),
        );
        assert_eq!(doc.body_text(), "$1,234.56\nTotal Value\nSOL/USDC\t$10");
        assert!(!doc.is_blank());
    }

    #[test]
    fn test_classify_row_markers() {
        let doc = document(
            ElementSpec::new("body")
                .child(ElementSpec::new("div").attr("role", "row"))
                .child(ElementSpec::new("div").attr("class", "card position-row"))
                .child(ElementSpec::new("li").attr("data-position", "1")),
        );
        assert_eq!(doc.elements_of(&[NodeKind::Row]).count(), 3);
    }

    #[test]
    fn test_innermost_prefers_smallest_region() {
        let doc = document(
            ElementSpec::new("body").child(
                ElementSpec::new("div")
                    .child(
                        ElementSpec::new("div")
                            .child(ElementSpec::with_text("span", "Total Value"))
                            .child(ElementSpec::with_text("span", " $5.00")),
                    )
                    .child(
                        ElementSpec::new("div")
                            .child(ElementSpec::with_text("span", "Total Value"))
                            .child(ElementSpec::with_text("span", " $7.00")),
                    ),
            ),
        );
        let found = doc.innermost(&[NodeKind::Block, NodeKind::Inline], |e| {
            e.text().contains("Total Value") && e.text().contains('$')
        });
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].text(), "Total Value $5.00");
        assert_eq!(found[1].text(), "Total Value $7.00");
        assert!(found[0].ancestors().any(|a| a.contains(&found[1])));
    }

    #[test]
    fn test_links_and_blank_pages() {
        let doc = document(
            ElementSpec::new("body").child(
                ElementSpec::new("a")
                    .attr("href", "/deposit?token0=0xabc")
                    .text("Deposit"),
            ),
        );
        assert_eq!(doc.links_with_href("/deposit?").len(), 1);
        assert!(doc.links_with_href("/vault/").is_empty());

        let blank = document(ElementSpec::new("body").text("   "));
        assert!(blank.is_blank());
    }
}
