// File: src/synchronizer.rs
// Purpose: Reflect a field's validity onto the document

use crate::host::FormHost;
use crate::options::ValidatorOptions;
use crate::value::FieldValue;

/// Presentation state computed from a field's evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldState<'a> {
    Invalid { message: &'a str },
    Valid { value: &'a FieldValue },
}

/// Update one field's classes and injected message.
///
/// Always starts from a clean slate (both state classes removed, the field's
/// old message nodes removed), so calling it repeatedly with the same state
/// leaves the document unchanged after the first call.
pub fn sync_field<H: FormHost + ?Sized>(
    host: &mut H,
    form: &H::Node,
    field: &H::Node,
    key: &str,
    state: FieldState<'_>,
    options: &ValidatorOptions,
) {
    clear_field(host, form, field, key, options);

    match state {
        FieldState::Invalid { message } => {
            host.add_class(field, &options.error_class);

            let container = group_of(&*host, form, field, &options.group_class)
                .or_else(|| host.parent(field));
            match container {
                Some(container) => {
                    host.insert_error_message(&container, key, &options.error_message_class, message)
                }
                None => tracing::debug!("No container for error message of {:?}", key),
            }
        }
        // An empty optional field stays unstyled rather than "successful"
        FieldState::Valid { value } => {
            if holds_value(value) {
                host.add_class(field, &options.success_class);
            }
        }
    }
}

/// Remove every trace of validation from one field
pub fn clear_field<H: FormHost + ?Sized>(
    host: &mut H,
    form: &H::Node,
    field: &H::Node,
    key: &str,
    options: &ValidatorOptions,
) {
    host.remove_class(field, &options.error_class);
    host.remove_class(field, &options.success_class);
    host.remove_error_messages(form, key);
}

// Closest ancestor-or-self carrying `class`, searching no higher than the form
fn group_of<H: FormHost + ?Sized>(host: &H, form: &H::Node, field: &H::Node, class: &str) -> Option<H::Node> {
    let mut current = Some(field.clone());
    while let Some(node) = current {
        if host.has_class(&node, class) {
            return Some(node);
        }
        if node == *form {
            return None;
        }
        current = host.parent(&node);
    }
    None
}

fn holds_value(value: &FieldValue) -> bool {
    match value {
        FieldValue::Text(s) => !s.is_empty(),
        FieldValue::Checked(checked) => *checked,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Element, MemoryDocument, NodeId};

    fn setup() -> (MemoryDocument, NodeId, NodeId, NodeId) {
        let mut doc = MemoryDocument::new();
        let form = doc.append(doc.root(), Element::new("form"));
        let group = doc.append(form, Element::new("div").class("form-group"));
        let wrapper = doc.append(group, Element::new("span"));
        let field = doc.append(wrapper, Element::input("text").name("city"));
        (doc, form, group, field)
    }

    #[test]
    fn test_invalid_state_is_idempotent() {
        let (mut doc, form, group, field) = setup();
        let options = ValidatorOptions::default();
        let state = FieldState::Invalid { message: "This field is required." };

        sync_field(&mut doc, &form, &field, "city", state, &options);
        sync_field(&mut doc, &form, &field, "city", state, &options);

        let messages = doc.query_all(".invalid-feedback");
        assert_eq!(messages.len(), 1);
        assert_eq!(doc.text(messages[0]), "This field is required.");
        assert_eq!(doc.parent(&messages[0]), Some(group));
        assert!(doc.has_class(field, "is-invalid"));
        assert!(!doc.has_class(field, "is-valid"));
    }

    #[test]
    fn test_message_falls_back_to_parent() {
        let mut doc = MemoryDocument::new();
        let form = doc.append(doc.root(), Element::new("form"));
        let field = doc.append(form, Element::input("text").name("city"));
        let options = ValidatorOptions::default();

        sync_field(&mut doc, &form, &field, "city", FieldState::Invalid { message: "Bad" }, &options);

        let messages = doc.query_all(".invalid-feedback");
        assert_eq!(doc.parent(&messages[0]), Some(form));
    }

    #[test]
    fn test_group_outside_form_is_not_used() {
        let mut doc = MemoryDocument::new();
        let outer = doc.append(doc.root(), Element::new("div").class("form-group"));
        let form = doc.append(outer, Element::new("form"));
        let field = doc.append(form, Element::input("text").name("city"));
        let options = ValidatorOptions::default();
        let state = FieldState::Invalid { message: "Bad" };

        for _ in 0..3 {
            sync_field(&mut doc, &form, &field, "city", state, &options);
        }

        let messages = doc.query_all("[data-error-for=\"city\"]");
        assert_eq!(messages.len(), 1);
        assert_eq!(doc.parent(&messages[0]), Some(form));
    }

    #[test]
    fn test_valid_state_clears_error() {
        let (mut doc, form, _, field) = setup();
        let options = ValidatorOptions::default();
        sync_field(&mut doc, &form, &field, "city", FieldState::Invalid { message: "Bad" }, &options);

        let value = FieldValue::from("Lisbon");
        sync_field(&mut doc, &form, &field, "city", FieldState::Valid { value: &value }, &options);

        assert!(doc.query_all(".invalid-feedback").is_empty());
        assert!(!doc.has_class(field, "is-invalid"));
        assert!(doc.has_class(field, "is-valid"));
    }

    #[test]
    fn test_empty_valid_field_stays_unstyled() {
        let (mut doc, form, _, field) = setup();
        let options = ValidatorOptions::default();
        let value = FieldValue::from("");

        sync_field(&mut doc, &form, &field, "city", FieldState::Valid { value: &value }, &options);

        assert!(!doc.has_class(field, "is-valid"));
        assert!(!doc.has_class(field, "is-invalid"));
    }
}
