//! Minimal element tree used as the mount point for rendered guides and forms.
//!
//! Nodes serialize to HTML and can estimate their natural height, which the
//! accordion uses to size open panels.

use std::fmt::Write as _;

const LINE_HEIGHT: u32 = 24;
const CONTROL_HEIGHT: u32 = 40;
const TEXTAREA_PADDING: u32 = 16;
const VOID_TAGS: &[&str] = &["br", "input", "hr", "img", "meta", "link"];

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(Element),
    /// Escaped on output.
    Text(String),
    /// Trusted markup, written verbatim.
    Markup(String),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Element {
    tag: String,
    id: Option<String>,
    classes: Vec<String>,
    attrs: Vec<(String, String)>,
    children: Vec<Node>,
    value: Option<String>,
    hidden: bool,
}

impl Element {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Self::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.add_class(class);
        self
    }

    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attr(name, value);
        self
    }

    pub fn with_child(mut self, child: Element) -> Self {
        self.children.push(Node::Element(child));
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.children.push(Node::Text(text.into()));
        self
    }

    pub fn with_markup(mut self, markup: impl Into<String>) -> Self {
        self.children.push(Node::Markup(markup.into()));
        self
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn hidden(mut self, hidden: bool) -> Self {
        self.hidden = hidden;
        self
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn set_tag(&mut self, tag: impl Into<String>) {
        self.tag = tag.into();
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    pub fn add_class(&mut self, class: impl Into<String>) {
        let class = class.into();
        if !self.has_class(&class) {
            self.classes.push(class);
        }
    }

    pub fn remove_class(&mut self, class: &str) {
        self.classes.retain(|c| c != class);
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn set_attr(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.attrs.iter_mut().find(|(key, _)| *key == name) {
            Some(slot) => slot.1 = value,
            None => self.attrs.push((name, value)),
        }
    }

    pub fn remove_attr(&mut self, name: &str) {
        self.attrs.retain(|(key, _)| key != name);
    }

    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    pub fn set_value(&mut self, value: impl Into<String>) {
        self.value = Some(value.into());
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    pub fn set_hidden(&mut self, hidden: bool) {
        self.hidden = hidden;
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }

    pub fn push(&mut self, child: Element) {
        self.children.push(Node::Element(child));
    }

    pub fn push_markup(&mut self, markup: impl Into<String>) {
        self.children.push(Node::Markup(markup.into()));
    }

    pub fn clear(&mut self) {
        self.children.clear();
    }

    /// Replace all children with a single text node.
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.children = vec![Node::Text(text.into())];
    }

    pub fn text_content(&self) -> String {
        let mut out = String::new();
        collect_text(&self.children, &mut out);
        out
    }

    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|node| match node {
            Node::Element(el) => Some(el),
            _ => None,
        })
    }

    pub fn find(&self, pred: &dyn Fn(&Element) -> bool) -> Option<&Element> {
        if pred(self) {
            return Some(self);
        }
        self.elements().find_map(|child| child.find(pred))
    }

    pub fn find_mut(&mut self, pred: &dyn Fn(&Element) -> bool) -> Option<&mut Element> {
        if pred(self) {
            return Some(self);
        }
        self.children.iter_mut().find_map(|node| match node {
            Node::Element(child) => child.find_mut(pred),
            _ => None,
        })
    }

    pub fn find_by_id(&self, id: &str) -> Option<&Element> {
        self.find(&|el| el.id() == Some(id))
    }

    pub fn find_by_id_mut(&mut self, id: &str) -> Option<&mut Element> {
        self.find_mut(&|el| el.id() == Some(id))
    }

    pub fn find_by_attr(&self, name: &str, value: &str) -> Option<&Element> {
        self.find(&|el| el.attr(name) == Some(value))
    }

    pub fn find_by_attr_mut(&mut self, name: &str, value: &str) -> Option<&mut Element> {
        self.find_mut(&|el| el.attr(name) == Some(value))
    }

    pub fn find_by_class_mut(&mut self, class: &str) -> Option<&mut Element> {
        self.find_mut(&|el| el.has_class(class))
    }

    /// Visit this element and every descendant, parents first.
    pub fn walk_mut(&mut self, visit: &mut dyn FnMut(&mut Element)) {
        visit(self);
        for node in &mut self.children {
            if let Node::Element(child) = node {
                child.walk_mut(visit);
            }
        }
    }

    /// Rough layout height in pixels. Hidden subtrees take no space.
    pub fn natural_height(&self) -> u32 {
        if self.hidden {
            return 0;
        }
        match self.tag.as_str() {
            "input" | "select" | "button" => CONTROL_HEIGHT,
            "textarea" => {
                let lines = self.value.as_deref().map(line_count).unwrap_or(1);
                lines * LINE_HEIGHT + TEXTAREA_PADDING
            }
            "br" => LINE_HEIGHT,
            _ => self.children.iter().map(node_height).sum(),
        }
    }

    pub fn to_html(&self) -> String {
        let mut out = String::with_capacity(1024);
        self.write_html(&mut out);
        out
    }

    fn write_html(&self, out: &mut String) {
        out.push('<');
        out.push_str(&self.tag);
        if let Some(id) = &self.id {
            let _ = write!(out, r#" id="{}""#, escape_html(id));
        }
        if !self.classes.is_empty() {
            let _ = write!(out, r#" class="{}""#, escape_html(&self.classes.join(" ")));
        }
        for (name, value) in &self.attrs {
            let _ = write!(out, r#" {}="{}""#, name, escape_html(value));
        }
        if self.tag == "input" {
            if let Some(value) = &self.value {
                let _ = write!(out, r#" value="{}""#, escape_html(value));
            }
        }
        if self.hidden {
            out.push_str(" hidden");
        }
        out.push('>');
        if VOID_TAGS.contains(&self.tag.as_str()) {
            return;
        }
        if self.tag == "textarea" {
            out.push_str(&escape_html(self.value.as_deref().unwrap_or_default()));
        } else if self.tag == "select" {
            self.write_options(out);
        } else {
            for node in &self.children {
                match node {
                    Node::Element(child) => child.write_html(out),
                    Node::Text(text) => out.push_str(&escape_html(text)),
                    Node::Markup(markup) => out.push_str(markup),
                }
            }
        }
        let _ = write!(out, "</{}>", self.tag);
    }

    fn write_options(&self, out: &mut String) {
        for option in self.elements() {
            let mut option = option.clone();
            if self.value.is_some() && option.attr("value") == self.value.as_deref() {
                option.set_attr("selected", "selected");
            }
            option.write_html(out);
        }
    }
}

fn node_height(node: &Node) -> u32 {
    match node {
        Node::Element(el) => el.natural_height(),
        Node::Text(text) => line_count(text) * LINE_HEIGHT,
        Node::Markup(markup) => (markup.matches("<br>").count() as u32 + 1) * LINE_HEIGHT,
    }
}

fn line_count(text: &str) -> u32 {
    text.split('\n').count().max(1) as u32
}

fn collect_text(nodes: &[Node], out: &mut String) {
    for node in nodes {
        match node {
            Node::Element(el) => collect_text(&el.children, out),
            Node::Text(text) | Node::Markup(text) => out.push_str(text),
        }
    }
}

pub fn escape_html(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_nested_elements_with_escaping() {
        let el = Element::new("div")
            .with_id("box")
            .with_class("a")
            .with_class("b")
            .with_attr("data-x", "1\"2")
            .with_text("<hi>")
            .with_markup("<br>")
            .with_child(Element::new("input").with_attr("type", "text").with_value("v&"));
        assert_eq!(
            el.to_html(),
            r#"<div id="box" class="a b" data-x="1&quot;2">&lt;hi&gt;<br><input type="text" value="v&amp;"></div>"#
        );
    }

    #[test]
    fn select_marks_current_value() {
        let el = Element::new("select")
            .with_value("2")
            .with_child(Element::new("option").with_attr("value", "1").with_text("One"))
            .with_child(Element::new("option").with_attr("value", "2").with_text("Two"));
        let html = el.to_html();
        assert!(html.contains(r#"<option value="2" selected="selected">Two</option>"#));
        assert!(html.contains(r#"<option value="1">One</option>"#));
    }

    #[test]
    fn hidden_subtrees_have_no_height() {
        let mut el = Element::new("div")
            .with_text("line")
            .with_child(Element::new("div").with_id("extra").with_text("a\nb").hidden(true));
        assert_eq!(el.natural_height(), LINE_HEIGHT);
        el.find_by_id_mut("extra").unwrap().set_hidden(false);
        assert_eq!(el.natural_height(), 3 * LINE_HEIGHT);
        assert!(el.to_html().contains("<div id=\"extra\">"));
    }

    #[test]
    fn find_by_attr_and_class() {
        let mut root = Element::new("div").with_child(
            Element::new("button")
                .with_class("copy")
                .with_attr("data-copy-target", "plans"),
        );
        assert!(root.find_by_attr("data-copy-target", "plans").is_some());
        root.find_by_class_mut("copy").unwrap().add_class("copied");
        assert!(root.find_by_attr("data-copy-target", "plans").unwrap().has_class("copied"));
    }
}
