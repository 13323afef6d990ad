// File: src/value.rs
// Purpose: Field values seen by rules and values collected into form data

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The current value of one field, as extracted for rule evaluation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    /// Raw text of an input, select or textarea (or the checked radio's value)
    Text(String),
    /// Checked state of a checkbox
    Checked(bool),
}

impl FieldValue {
    /// Empty means an empty string. A checkbox state is never empty.
    pub fn is_empty(&self) -> bool {
        match self {
            FieldValue::Text(s) => s.is_empty(),
            FieldValue::Checked(_) => false,
        }
    }

    /// Text representation used by string-based rules
    pub fn as_text(&self) -> String {
        match self {
            FieldValue::Text(s) => s.clone(),
            FieldValue::Checked(b) => b.to_string(),
        }
    }
}

impl Default for FieldValue {
    fn default() -> Self {
        FieldValue::Text(String::new())
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Text(s)
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        FieldValue::Checked(b)
    }
}

/// One entry of the form data mapping
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FormValue {
    Single(String),
    /// A name that appeared more than once, values in document order
    Multiple(Vec<String>),
}

impl FormValue {
    /// Add another value under the same name, collapsing into a list
    pub fn push(&mut self, value: String) {
        match self {
            FormValue::Single(first) => {
                let first = std::mem::take(first);
                *self = FormValue::Multiple(vec![first, value]);
            }
            FormValue::Multiple(values) => values.push(value),
        }
    }

    /// All values in order
    pub fn values(&self) -> Vec<&str> {
        match self {
            FormValue::Single(s) => vec![s.as_str()],
            FormValue::Multiple(values) => values.iter().map(String::as_str).collect(),
        }
    }
}

impl From<&str> for FormValue {
    fn from(s: &str) -> Self {
        FormValue::Single(s.to_string())
    }
}

impl From<Vec<&str>> for FormValue {
    fn from(values: Vec<&str>) -> Self {
        FormValue::Multiple(values.into_iter().map(str::to_string).collect())
    }
}

/// Plain key → value mapping of a form's named fields
pub type FormData = BTreeMap<String, FormValue>;

/// Insert a value, collapsing repeated names
pub(crate) fn append_form_value(data: &mut FormData, name: &str, value: String) {
    match data.get_mut(name) {
        Some(existing) => existing.push(value),
        None => {
            data.insert(name.to_string(), FormValue::Single(value));
        }
    }
}
