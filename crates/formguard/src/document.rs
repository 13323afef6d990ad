// File: src/document.rs
// Purpose: In-memory document tree implementing FormHost

use crate::host::{FormHost, FormRef};
use std::collections::BTreeMap;

/// Handle to a node of a [`MemoryDocument`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

#[derive(Debug, Clone, Default)]
struct NodeData {
    tag: String,
    attrs: BTreeMap<String, String>,
    classes: Vec<String>,
    text: String,
    value: String,
    default_value: String,
    checked: bool,
    default_checked: bool,
    selected: Vec<String>,
    default_selected: Vec<String>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// Element description used to build a [`MemoryDocument`]
#[derive(Debug, Clone, Default)]
pub struct Element {
    tag: String,
    attrs: Vec<(String, String)>,
    classes: Vec<String>,
    text: String,
    value: String,
    checked: bool,
    selected: Vec<String>,
}

impl Element {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            ..Self::default()
        }
    }

    /// `<input type="...">`
    pub fn input(input_type: &str) -> Self {
        Self::new("input").attr("type", input_type)
    }

    pub fn id(self, id: &str) -> Self {
        self.attr("id", id)
    }

    pub fn name(self, name: &str) -> Self {
        self.attr("name", name)
    }

    pub fn class(mut self, class: &str) -> Self {
        self.classes.extend(class.split_whitespace().map(str::to_string));
        self
    }

    /// Set an attribute; `class` is split into the class list
    pub fn attr(mut self, name: &str, value: &str) -> Self {
        if name.eq_ignore_ascii_case("class") {
            return self.class(value);
        }
        self.attrs.push((name.to_ascii_lowercase(), value.to_string()));
        self
    }

    /// Initial value; also what a form reset restores
    pub fn value(mut self, value: &str) -> Self {
        self.value = value.to_string();
        self
    }

    /// Initially checked; also what a form reset restores
    pub fn checked(mut self) -> Self {
        self.checked = true;
        self
    }

    /// Initially selected options of a select
    pub fn selected(mut self, values: &[&str]) -> Self {
        self.selected = values.iter().map(|v| v.to_string()).collect();
        self
    }

    pub fn text(mut self, text: &str) -> Self {
        self.text = text.to_string();
        self
    }
}

/// A small DOM: elements with attributes, classes, control state, focus and
/// scroll bookkeeping.
#[derive(Debug, Clone)]
pub struct MemoryDocument {
    nodes: Vec<NodeData>,
    // Slots of removed nodes, reused by `append`
    free: Vec<NodeId>,
    focused: Option<NodeId>,
    scrolled: Vec<NodeId>,
}

impl Default for MemoryDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDocument {
    /// A document with an empty `body` root
    pub fn new() -> Self {
        Self {
            nodes: vec![NodeData {
                tag: "body".to_string(),
                ..NodeData::default()
            }],
            free: Vec::new(),
            focused: None,
            scrolled: Vec::new(),
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Append a new element as the last child of `parent`
    pub fn append(&mut self, parent: NodeId, element: Element) -> NodeId {
        let Element {
            tag,
            attrs,
            classes,
            text,
            value,
            checked,
            selected,
        } = element;

        let data = NodeData {
            tag,
            attrs: attrs.into_iter().collect(),
            classes,
            text,
            default_value: value.clone(),
            value,
            default_checked: checked,
            checked,
            default_selected: selected.clone(),
            selected,
            parent: Some(parent),
            children: Vec::new(),
        };

        let id = match self.free.pop() {
            Some(id) => {
                self.nodes[id.0] = data;
                id
            }
            None => {
                self.nodes.push(data);
                NodeId(self.nodes.len() - 1)
            }
        };
        self.nodes[parent.0].children.push(id);
        id
    }

    /// Remove a node and its subtree.
    ///
    /// Their handles become invalid; later appends reuse the slots. Removing
    /// the root or an already removed node does nothing.
    pub fn remove(&mut self, node: NodeId) {
        let Some(parent) = self.nodes[node.0].parent.take() else {
            return;
        };
        self.nodes[parent.0].children.retain(|&child| child != node);

        let mut stack = vec![node];
        while let Some(id) = stack.pop() {
            let data = std::mem::take(&mut self.nodes[id.0]);
            stack.extend(data.children);
            if self.focused == Some(id) {
                self.focused = None;
            }
            self.free.push(id);
        }
    }

    /// Nodes currently in the tree, root included
    pub fn node_count(&self) -> usize {
        self.nodes.len() - self.free.len()
    }

    /// Change what the user typed
    pub fn set_value(&mut self, node: NodeId, value: &str) {
        self.nodes[node.0].value = value.to_string();
    }

    pub fn set_checked(&mut self, node: NodeId, checked: bool) {
        self.nodes[node.0].checked = checked;
    }

    pub fn set_selected(&mut self, node: NodeId, values: &[&str]) {
        self.nodes[node.0].selected = values.iter().map(|v| v.to_string()).collect();
    }

    pub fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) {
        self.nodes[node.0]
            .attrs
            .insert(name.to_ascii_lowercase(), value.to_string());
    }

    pub fn remove_attribute(&mut self, node: NodeId, name: &str) {
        self.nodes[node.0].attrs.remove(&name.to_ascii_lowercase());
    }

    pub fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.nodes[node.0].classes.iter().any(|c| c == class)
    }

    pub fn text(&self, node: NodeId) -> &str {
        &self.nodes[node.0].text
    }

    pub fn children(&self, node: NodeId) -> &[NodeId] {
        &self.nodes[node.0].children
    }

    pub fn focused(&self) -> Option<NodeId> {
        self.focused
    }

    /// Nodes scrolled into view, oldest first
    pub fn scrolled_into_view(&self) -> &[NodeId] {
        &self.scrolled
    }

    /// Attached elements matching `selector`, in document order
    pub fn query_all(&self, selector: &str) -> Vec<NodeId> {
        let Some(selector) = Selector::parse(selector) else {
            tracing::debug!("Unsupported selector: {:?}", selector);
            return Vec::new();
        };
        self.descendants(self.root())
            .into_iter()
            .filter(|&node| selector.matches(&self.nodes[node.0]))
            .collect()
    }

    pub fn query(&self, selector: &str) -> Option<NodeId> {
        self.query_all(selector).into_iter().next()
    }

    pub fn get_element_by_id(&self, id: &str) -> Option<NodeId> {
        self.descendants(self.root())
            .into_iter()
            .find(|&node| self.nodes[node.0].attrs.get("id").map(String::as_str) == Some(id))
    }

    // Pre-order, excluding `node` itself
    fn descendants(&self, node: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.nodes[node.0].children.iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.nodes[next.0].children.iter().rev().copied());
        }
        out
    }

    fn is_control(&self, node: NodeId) -> bool {
        matches!(self.nodes[node.0].tag.as_str(), "input" | "select" | "textarea")
    }
}

impl FormHost for MemoryDocument {
    type Node = NodeId;

    fn find_form(&self, target: &FormRef<NodeId>) -> Option<NodeId> {
        let node = match target {
            FormRef::Node(node) => Some(*node).filter(|n| n.0 < self.nodes.len()),
            FormRef::Selector(selector) => self.locate(selector),
        }?;
        (self.nodes[node.0].tag == "form").then_some(node)
    }

    fn controls(&self, form: &NodeId) -> Vec<NodeId> {
        self.descendants(*form)
            .into_iter()
            .filter(|&node| self.is_control(node))
            .collect()
    }

    fn tag_name(&self, node: &NodeId) -> String {
        self.nodes[node.0].tag.clone()
    }

    fn attribute(&self, node: &NodeId, name: &str) -> Option<String> {
        let data = &self.nodes[node.0];
        if name == "class" {
            return (!data.classes.is_empty()).then(|| data.classes.join(" "));
        }
        data.attrs.get(name).cloned()
    }

    fn value(&self, node: &NodeId) -> String {
        self.nodes[node.0].value.clone()
    }

    fn is_checked(&self, node: &NodeId) -> bool {
        self.nodes[node.0].checked
    }

    fn is_disabled(&self, node: &NodeId) -> bool {
        self.nodes[node.0].attrs.contains_key("disabled")
    }

    fn selected_values(&self, node: &NodeId) -> Vec<String> {
        let data = &self.nodes[node.0];
        if data.tag != "select" {
            return Vec::new();
        }
        if data.selected.is_empty() && !data.value.is_empty() {
            return vec![data.value.clone()];
        }
        data.selected.clone()
    }

    fn locate(&self, target: &str) -> Option<NodeId> {
        let id = target.strip_prefix('#').unwrap_or(target);
        self.get_element_by_id(id).or_else(|| self.query(target))
    }

    fn has_class(&self, node: &NodeId, class: &str) -> bool {
        MemoryDocument::has_class(self, *node, class)
    }

    fn parent(&self, node: &NodeId) -> Option<NodeId> {
        self.nodes[node.0].parent
    }

    fn add_class(&mut self, node: &NodeId, class: &str) {
        let classes = &mut self.nodes[node.0].classes;
        if !classes.iter().any(|c| c == class) {
            classes.push(class.to_string());
        }
    }

    fn remove_class(&mut self, node: &NodeId, class: &str) {
        self.nodes[node.0].classes.retain(|c| c != class);
    }

    fn remove_error_messages(&mut self, form: &NodeId, key: &str) {
        let stale: Vec<NodeId> = self
            .descendants(*form)
            .into_iter()
            .filter(|node| self.nodes[node.0].attrs.get("data-error-for").map(String::as_str) == Some(key))
            .collect();
        for node in stale {
            self.remove(node);
        }
    }

    fn insert_error_message(&mut self, container: &NodeId, key: &str, class: &str, text: &str) {
        self.append(
            *container,
            Element::new("div").class(class).attr("data-error-for", key).text(text),
        );
    }

    fn focus(&mut self, node: &NodeId) {
        self.focused = Some(*node);
    }

    fn scroll_into_view(&mut self, node: &NodeId) {
        self.scrolled.push(*node);
    }

    fn reset_form(&mut self, form: &NodeId) {
        for node in self.controls(form) {
            let data = &mut self.nodes[node.0];
            data.value = data.default_value.clone();
            data.checked = data.default_checked;
            data.selected = data.default_selected.clone();
        }
    }
}

/// Comma-separated list of compound selectors: `tag`, `#id`, `.class`,
/// `[attr]`, `[attr=value]`. No combinators.
#[derive(Debug)]
struct Selector(Vec<Vec<Simple>>);

#[derive(Debug)]
enum Simple {
    Tag(String),
    Id(String),
    Class(String),
    Attr(String, Option<String>),
}

impl Selector {
    fn parse(source: &str) -> Option<Self> {
        source
            .split(',')
            .map(|compound| parse_compound(compound.trim()))
            .collect::<Option<Vec<_>>>()
            .map(Selector)
    }

    fn matches(&self, node: &NodeData) -> bool {
        self.0
            .iter()
            .any(|compound| compound.iter().all(|simple| simple.matches(node)))
    }
}

impl Simple {
    fn matches(&self, node: &NodeData) -> bool {
        match self {
            Simple::Tag(tag) => node.tag == *tag,
            Simple::Id(id) => node.attrs.get("id") == Some(id),
            Simple::Class(class) => node.classes.contains(class),
            Simple::Attr(name, None) => node.attrs.contains_key(name),
            Simple::Attr(name, Some(value)) => node.attrs.get(name) == Some(value),
        }
    }
}

fn parse_compound(mut rest: &str) -> Option<Vec<Simple>> {
    let mut parts = Vec::new();
    if rest.is_empty() {
        return None;
    }

    while let Some(first) = rest.chars().next() {
        match first {
            '#' => {
                let (ident, tail) = take_ident(&rest[1..])?;
                parts.push(Simple::Id(ident.to_string()));
                rest = tail;
            }
            '.' => {
                let (ident, tail) = take_ident(&rest[1..])?;
                parts.push(Simple::Class(ident.to_string()));
                rest = tail;
            }
            '[' => {
                let close = rest.find(']')?;
                let inner = &rest[1..close];
                let attr = match inner.split_once('=') {
                    Some((name, value)) => {
                        let value = value.trim().trim_matches(|c| c == '"' || c == '\'');
                        Simple::Attr(name.trim().to_ascii_lowercase(), Some(value.to_string()))
                    }
                    None => Simple::Attr(inner.trim().to_ascii_lowercase(), None),
                };
                parts.push(attr);
                rest = &rest[close + 1..];
            }
            c if c.is_ascii_alphabetic() && parts.is_empty() => {
                let (ident, tail) = take_ident(rest)?;
                parts.push(Simple::Tag(ident.to_ascii_lowercase()));
                rest = tail;
            }
            _ => return None,
        }
    }

    Some(parts)
}

fn take_ident(s: &str) -> Option<(&str, &str)> {
    let end = s
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '-' || c == '_'))
        .unwrap_or(s.len());
    (end > 0).then(|| s.split_at(end))
}
