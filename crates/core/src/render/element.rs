//! Owned HTML/SVG element tree.
//!
//! Text nodes and attribute values are stored raw and escaped when the tree
//! is serialized, so a value is never escaped twice and never inserted
//! unescaped.

use super::escape::escape;

/// Tags serialized without a closing pair.
const VOID_TAGS: [&str; 6] = ["br", "hr", "img", "input", "meta", "link"];

/// A node in the element tree: either a child element or a text run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    Text(String),
}

/// An owned markup element.
///
/// Built fluently and serialized with [`Element::to_html`]:
///
/// ```
/// use concilia_core::render::Element;
///
/// let card = Element::new("div")
///     .class("acq-card")
///     .attr("data-acq", "Cielo")
///     .child(Element::new("h3").text("Cielo"));
/// assert_eq!(
///     card.to_html(),
///     r#"<div class="acq-card" data-acq="Cielo"><h3>Cielo</h3></div>"#
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    tag: String,
    classes: Vec<String>,
    attrs: Vec<(String, String)>,
    children: Vec<Node>,
}

impl Element {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            classes: Vec::new(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Appends a CSS class.
    pub fn class(mut self, class: impl Into<String>) -> Self {
        self.classes.push(class.into());
        self
    }

    /// Sets an attribute. The value is escaped at serialization.
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.push((name.into(), value.into()));
        self
    }

    /// Appends a text node. The text is escaped at serialization; there is
    /// no way to append raw markup.
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.children.push(Node::Text(text.into()));
        self
    }

    /// Appends a child element.
    pub fn child(mut self, child: Element) -> Self {
        self.children.push(Node::Element(child));
        self
    }

    /// Appends every element from an iterator.
    pub fn children(mut self, children: impl IntoIterator<Item = Element>) -> Self {
        self.children
            .extend(children.into_iter().map(Node::Element));
        self
    }

    /// Serializes the tree, escaping all text and attribute values.
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        self.write(&mut out);
        out
    }

    fn write(&self, out: &mut String) {
        out.push('<');
        out.push_str(&self.tag);
        if !self.classes.is_empty() {
            out.push_str(" class=\"");
            out.push_str(&escape(&self.classes.join(" ")));
            out.push('"');
        }
        for (name, value) in &self.attrs {
            out.push(' ');
            out.push_str(name);
            out.push_str("=\"");
            out.push_str(&escape(value));
            out.push('"');
        }
        if VOID_TAGS.contains(&self.tag.as_str()) && self.children.is_empty() {
            out.push_str("/>");
            return;
        }
        out.push('>');
        for child in &self.children {
            match child {
                Node::Element(el) => el.write(out),
                Node::Text(text) => out.push_str(&escape(text)),
            }
        }
        out.push_str("</");
        out.push_str(&self.tag);
        out.push('>');
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_is_escaped_on_write() {
        let el = Element::new("td").text("<img src=x onerror=alert(1)>");
        let html = el.to_html();
        assert_eq!(html, "<td>&lt;img src=x onerror=alert(1)&gt;</td>");
    }

    #[test]
    fn test_attr_value_is_escaped() {
        let el = Element::new("div").attr("data-acq", "\"><script>");
        assert_eq!(
            el.to_html(),
            "<div data-acq=\"&quot;&gt;&lt;script&gt;\"></div>"
        );
    }

    #[test]
    fn test_nested_children_serialize_in_order() {
        let table = Element::new("table")
            .class("detail-table")
            .child(
                Element::new("tr")
                    .child(Element::new("td").text("a"))
                    .child(Element::new("td").text("b")),
            );
        assert_eq!(
            table.to_html(),
            "<table class=\"detail-table\"><tr><td>a</td><td>b</td></tr></table>"
        );
    }

    #[test]
    fn test_void_tag_self_closes() {
        assert_eq!(Element::new("br").to_html(), "<br/>");
    }

    #[test]
    fn test_classes_join_with_spaces() {
        let el = Element::new("span").class("status").class("status-ok");
        assert_eq!(el.to_html(), "<span class=\"status status-ok\"></span>");
    }
}
