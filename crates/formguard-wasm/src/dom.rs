//! [`FormHost`] over the live browser DOM.

use formguard::{FormHost, FormRef};
use wasm_bindgen::JsCast;
use web_sys::{
    Document, Element, HtmlElement, HtmlFormElement, HtmlInputElement, HtmlOptionElement,
    HtmlSelectElement, HtmlTextAreaElement, ScrollBehavior, ScrollIntoViewOptions,
    ScrollLogicalPosition,
};

const CONTROLS: &str = "input, select, textarea";

/// Document handle the engine reads and decorates
#[derive(Debug, Clone)]
pub struct DomHost {
    document: Document,
}

impl DomHost {
    pub fn new(document: Document) -> Self {
        Self { document }
    }

    /// The current window's document
    pub fn current() -> Option<Self> {
        web_sys::window()?.document().map(Self::new)
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    fn query_all(&self, scope: &Element, selector: &str) -> Vec<Element> {
        let Ok(list) = scope.query_selector_all(selector) else {
            tracing::debug!("Invalid selector: {:?}", selector);
            return Vec::new();
        };
        (0..list.length())
            .filter_map(|i| list.item(i))
            .filter_map(|node| node.dyn_into::<Element>().ok())
            .collect()
    }
}

impl FormHost for DomHost {
    type Node = Element;

    fn find_form(&self, target: &FormRef<Element>) -> Option<Element> {
        let element = match target {
            FormRef::Node(element) => Some(element.clone()),
            FormRef::Selector(selector) => self.locate(selector),
        }?;
        element.is_instance_of::<HtmlFormElement>().then_some(element)
    }

    fn controls(&self, form: &Element) -> Vec<Element> {
        self.query_all(form, CONTROLS)
    }

    fn tag_name(&self, node: &Element) -> String {
        node.tag_name().to_ascii_lowercase()
    }

    fn attribute(&self, node: &Element, name: &str) -> Option<String> {
        node.get_attribute(name)
    }

    fn has_attribute(&self, node: &Element, name: &str) -> bool {
        node.has_attribute(name)
    }

    fn value(&self, node: &Element) -> String {
        if let Some(input) = node.dyn_ref::<HtmlInputElement>() {
            input.value()
        } else if let Some(select) = node.dyn_ref::<HtmlSelectElement>() {
            select.value()
        } else if let Some(textarea) = node.dyn_ref::<HtmlTextAreaElement>() {
            textarea.value()
        } else {
            node.get_attribute("value").unwrap_or_default()
        }
    }

    fn is_checked(&self, node: &Element) -> bool {
        node.dyn_ref::<HtmlInputElement>()
            .is_some_and(HtmlInputElement::checked)
    }

    // Covers controls inside a disabled fieldset too
    fn is_disabled(&self, node: &Element) -> bool {
        node.matches(":disabled").unwrap_or_else(|_| node.has_attribute("disabled"))
    }

    fn selected_values(&self, node: &Element) -> Vec<String> {
        let Some(select) = node.dyn_ref::<HtmlSelectElement>() else {
            return Vec::new();
        };
        let options = select.selected_options();
        (0..options.length())
            .filter_map(|i| options.item(i))
            .filter_map(|option| option.dyn_into::<HtmlOptionElement>().ok())
            .map(|option| option.value())
            .collect()
    }

    fn locate(&self, target: &str) -> Option<Element> {
        let id = target.strip_prefix('#').unwrap_or(target);
        self.document
            .get_element_by_id(id)
            .or_else(|| self.document.query_selector(target).ok().flatten())
    }

    fn has_class(&self, node: &Element, class: &str) -> bool {
        node.class_list().contains(class)
    }

    fn parent(&self, node: &Element) -> Option<Element> {
        node.parent_element()
    }

    fn add_class(&mut self, node: &Element, class: &str) {
        if let Err(e) = node.class_list().add_1(class) {
            tracing::debug!("Failed to add class {:?}: {:?}", class, e);
        }
    }

    fn remove_class(&mut self, node: &Element, class: &str) {
        if let Err(e) = node.class_list().remove_1(class) {
            tracing::debug!("Failed to remove class {:?}: {:?}", class, e);
        }
    }

    fn remove_error_messages(&mut self, form: &Element, key: &str) {
        let selector = format!("[data-error-for=\"{}\"]", escape_css_string(key));
        for node in self.query_all(form, &selector) {
            node.remove();
        }
    }

    fn insert_error_message(&mut self, container: &Element, key: &str, class: &str, text: &str) {
        let message = match self.document.create_element("div") {
            Ok(message) => message,
            Err(e) => {
                tracing::warn!("Failed to create message element: {:?}", e);
                return;
            }
        };
        message.set_class_name(class);
        message.set_text_content(Some(text));
        if let Err(e) = message.set_attribute("data-error-for", key) {
            tracing::debug!("Failed to tag message for {:?}: {:?}", key, e);
        }
        if let Err(e) = container.append_child(&message) {
            tracing::warn!("Failed to insert message for {:?}: {:?}", key, e);
        }
    }

    fn focus(&mut self, node: &Element) {
        if let Some(element) = node.dyn_ref::<HtmlElement>() {
            if let Err(e) = element.focus() {
                tracing::debug!("Failed to focus: {:?}", e);
            }
        }
    }

    fn scroll_into_view(&mut self, node: &Element) {
        let options = ScrollIntoViewOptions::new();
        options.set_behavior(ScrollBehavior::Smooth);
        options.set_block(ScrollLogicalPosition::Center);
        node.scroll_into_view_with_scroll_into_view_options(&options);
    }

    fn reset_form(&mut self, form: &Element) {
        if let Some(form) = form.dyn_ref::<HtmlFormElement>() {
            form.reset();
        }
    }
}

// Quote-safe value for an attribute selector
fn escape_css_string(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_css_string() {
        assert_eq!(escape_css_string("email"), "email");
        assert_eq!(escape_css_string("a\"b"), "a\\\"b");
        assert_eq!(escape_css_string("a\\b"), "a\\\\b");
    }
}
