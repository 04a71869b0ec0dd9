//! Structured markup tree with escaping on output.
//!
//! Nodes have no raw-markup constructor. Text and attribute values are
//! escaped by [`Node::to_html`]; style and script bodies ([`Node::RawText`])
//! only have closing-tag sequences neutralized.

use std::fmt::Write as _;

/// A node in the widget tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    Text(String),
    /// Body of a `<style>` or `<script>` element.
    RawText(String),
}

/// An element with ordered attributes and children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub tag: String,
    pub attrs: Vec<(String, String)>,
    pub children: Vec<Node>,
}

const VOID_TAGS: [&str; 4] = ["input", "img", "br", "meta"];

impl Element {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.push((name.into(), value.into()));
        self
    }

    pub fn class(self, class: impl Into<String>) -> Self {
        self.attr("class", class)
    }

    pub fn child(mut self, node: impl Into<Node>) -> Self {
        self.children.push(node.into());
        self
    }

    pub fn children(mut self, nodes: impl IntoIterator<Item = Node>) -> Self {
        self.children.extend(nodes);
        self
    }

    pub fn text(self, text: impl Into<String>) -> Self {
        self.child(Node::Text(text.into()))
    }

    pub fn get_attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.get_attr("class")
            .map(|c| c.split_whitespace().any(|c| c == class))
            .unwrap_or(false)
    }
}

impl From<Element> for Node {
    fn from(element: Element) -> Self {
        Node::Element(element)
    }
}

impl Node {
    pub fn text(text: impl Into<String>) -> Self {
        Node::Text(text.into())
    }

    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(el) => Some(el),
            Node::Text(_) | Node::RawText(_) => None,
        }
    }

    /// Serialize to HTML, escaping all text and attribute values.
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        self.write_html(&mut out);
        out
    }

    fn write_html(&self, out: &mut String) {
        match self {
            Node::Text(text) => out.push_str(&escape_html(text)),
            Node::RawText(text) => out.push_str(&neutralize_raw_text(text)),
            Node::Element(el) => {
                let _ = write!(out, "<{}", el.tag);
                for (name, value) in &el.attrs {
                    let _ = write!(out, " {}=\"{}\"", name, escape_html(value));
                }
                out.push('>');
                if VOID_TAGS.contains(&el.tag.as_str()) {
                    return;
                }
                for child in &el.children {
                    child.write_html(out);
                }
                let _ = write!(out, "</{}>", el.tag);
            }
        }
    }

    /// Concatenated text of this subtree, unescaped.
    pub fn text_content(&self) -> String {
        match self {
            Node::Text(text) | Node::RawText(text) => text.clone(),
            Node::Element(el) => el.children.iter().map(Node::text_content).collect(),
        }
    }

    /// Depth-first walk over all elements in the subtree.
    pub fn elements(&self) -> Vec<&Element> {
        let mut out = Vec::new();
        self.collect_elements(&mut out);
        out
    }

    fn collect_elements<'a>(&'a self, out: &mut Vec<&'a Element>) {
        if let Node::Element(el) = self {
            out.push(el);
            for child in &el.children {
                child.collect_elements(out);
            }
        }
    }

    /// Elements carrying the given class, depth-first.
    pub fn find_by_class(&self, class: &str) -> Vec<&Element> {
        self.elements()
            .into_iter()
            .filter(|el| el.has_class(class))
            .collect()
    }
}

/// Keep raw text from closing its enclosing element early.
pub fn neutralize_raw_text(input: &str) -> String {
    input.replace("</", "<\\/")
}

/// Escape text for HTML element content and quoted attribute values.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_and_attributes_are_escaped() {
        let node: Node = Element::new("div")
            .attr("title", "\"><script>")
            .text("<b>hi</b> & 'bye'")
            .into();
        assert_eq!(
            node.to_html(),
            "<div title=\"&quot;&gt;&lt;script&gt;\">&lt;b&gt;hi&lt;/b&gt; &amp; &#39;bye&#39;</div>"
        );
    }

    #[test]
    fn raw_text_cannot_close_its_element() {
        let node: Node = Element::new("script")
            .child(Node::RawText("var s = \"</script><b>\";".into()))
            .into();
        assert_eq!(
            node.to_html(),
            "<script>var s = \"<\\/script><b>\";</script>"
        );
    }

    #[test]
    fn void_elements_have_no_closing_tag() {
        let node: Node = Element::new("input").attr("type", "text").into();
        assert_eq!(node.to_html(), "<input type=\"text\">");
    }

    #[test]
    fn find_by_class_matches_whole_tokens() {
        let node: Node = Element::new("div")
            .child(Element::new("span").class("ec-a ec-b"))
            .child(Element::new("span").class("ec-ab"))
            .into();
        assert_eq!(node.find_by_class("ec-a").len(), 1);
        assert_eq!(node.text_content(), "");
    }
}
