//! Document abstraction the engine runs against.
//!
//! The engine never touches a concrete DOM. A browser binding implements
//! [`FormHost`] over real elements; [`crate::MemoryDocument`] implements it
//! over an in-memory tree for servers and tests.

use std::fmt;

/// How a validator finds its form
#[derive(Debug, Clone, PartialEq)]
pub enum FormRef<N> {
    /// A node handle the caller already holds
    Node(N),
    /// An element id (with or without `#`) or a selector
    Selector(String),
}

impl<N> From<&str> for FormRef<N> {
    fn from(selector: &str) -> Self {
        FormRef::Selector(selector.to_string())
    }
}

/// Attribute names read from markup
pub mod attr {
    pub const NAME: &str = "name";
    pub const ID: &str = "id";
    pub const TYPE: &str = "type";
    pub const REQUIRED: &str = "required";
    pub const MIN: &str = "min";
    pub const MAX: &str = "max";
    pub const MIN_LENGTH: &str = "minlength";
    pub const MAX_LENGTH: &str = "maxlength";
    pub const PATTERN: &str = "pattern";
    pub const MULTIPLE: &str = "multiple";
    /// Declarative rule list, e.g. `required|minlength:8`
    pub const VALIDATE: &str = "data-validate";
    /// Marks an injected message node with the key of its field
    pub const ERROR_FOR: &str = "data-error-for";

    /// Per-rule message attribute, e.g. `data-minlength-message`
    pub fn rule_message(rule: &str) -> String {
        format!("data-{}-message", rule)
    }
}

/// Everything the engine needs from a document.
///
/// Read methods take `&self`; methods that change presentation take
/// `&mut self`. Implementations must return controls in document order.
pub trait FormHost {
    /// Non-owning handle to an element
    type Node: Clone + PartialEq + fmt::Debug;

    /// Resolve a form reference; `None` if it is not a form element
    fn find_form(&self, target: &FormRef<Self::Node>) -> Option<Self::Node>;

    /// All input, select and textarea elements inside the form
    fn controls(&self, form: &Self::Node) -> Vec<Self::Node>;

    /// Lowercase tag name
    fn tag_name(&self, node: &Self::Node) -> String;

    fn attribute(&self, node: &Self::Node, name: &str) -> Option<String>;

    fn has_attribute(&self, node: &Self::Node, name: &str) -> bool {
        self.attribute(node, name).is_some()
    }

    /// Current value of a control
    fn value(&self, node: &Self::Node) -> String;

    fn is_checked(&self, node: &Self::Node) -> bool;

    fn is_disabled(&self, node: &Self::Node) -> bool;

    /// Values of the selected options of a select; empty for other controls
    fn selected_values(&self, node: &Self::Node) -> Vec<String>;

    /// Any element in the document by id, falling back to a selector
    fn locate(&self, target: &str) -> Option<Self::Node>;

    fn has_class(&self, node: &Self::Node, class: &str) -> bool;

    fn parent(&self, node: &Self::Node) -> Option<Self::Node>;

    fn add_class(&mut self, node: &Self::Node, class: &str);

    fn remove_class(&mut self, node: &Self::Node, class: &str);

    /// Remove every message node inside the form tagged with `key`
    fn remove_error_messages(&mut self, form: &Self::Node, key: &str);

    /// Append a message node tagged with `key` to `container`
    fn insert_error_message(&mut self, container: &Self::Node, key: &str, class: &str, text: &str);

    fn focus(&mut self, node: &Self::Node);

    fn scroll_into_view(&mut self, node: &Self::Node);

    /// Restore every control of the form to its default state
    fn reset_form(&mut self, form: &Self::Node);
}

/// What kind of control a field is, as far as value extraction cares
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlKind {
    Checkbox,
    Radio,
    Select,
    TextArea,
    /// Submit and button inputs; never validated
    Button,
    Input,
}

impl ControlKind {
    pub fn of<H: FormHost + ?Sized>(host: &H, node: &H::Node) -> Self {
        match host.tag_name(node).as_str() {
            "select" => return ControlKind::Select,
            "textarea" => return ControlKind::TextArea,
            _ => {}
        }
        match input_type(host, node).as_str() {
            "checkbox" => ControlKind::Checkbox,
            "radio" => ControlKind::Radio,
            "submit" | "button" => ControlKind::Button,
            _ => ControlKind::Input,
        }
    }
}

/// Lowercase `type` attribute, `text` when absent
pub fn input_type<H: FormHost + ?Sized>(host: &H, node: &H::Node) -> String {
    host.attribute(node, attr::TYPE)
        .map(|t| t.trim().to_ascii_lowercase())
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| "text".to_string())
}

/// The key a field is reported under: its name, else its id
pub fn field_key<H: FormHost + ?Sized>(host: &H, node: &H::Node) -> Option<String> {
    host.attribute(node, attr::NAME)
        .filter(|n| !n.is_empty())
        .or_else(|| host.attribute(node, attr::ID).filter(|id| !id.is_empty()))
}
