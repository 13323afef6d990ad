// File: src/options.rs
// Purpose: Validator options and their loading from TOML

use crate::registry::{CustomRules, RuleContext};
use crate::value::FieldValue;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Configuration captured when a validator is constructed.
///
/// Keys are camelCase so the same document works from TOML and from a
/// JavaScript options object.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidatorOptions {
    /// Validate a field when it loses focus
    #[serde(default = "default_true")]
    pub validate_on_blur: bool,

    /// Validate a field on every input event
    #[serde(default = "default_false")]
    pub validate_on_input: bool,

    /// Intercept submit, prevent the browser submission, validate the form
    #[serde(default = "default_true")]
    pub validate_on_submit: bool,

    /// Reflect validity onto the document (classes and message nodes)
    #[serde(default = "default_true")]
    pub show_errors: bool,

    #[serde(default = "default_error_class")]
    pub error_class: String,

    #[serde(default = "default_success_class")]
    pub success_class: String,

    #[serde(default = "default_error_message_class")]
    pub error_message_class: String,

    /// Class of the container a field's error message is placed in
    #[serde(default = "default_group_class")]
    pub group_class: String,

    #[serde(default = "default_true")]
    pub scroll_to_error: bool,

    #[serde(default = "default_true")]
    pub focus_on_error: bool,

    /// Rule name -> message template, merged over the built-in messages
    #[serde(default)]
    pub custom_messages: HashMap<String, String>,

    /// Field key -> message template, overriding any rule's message for that field
    #[serde(default)]
    pub field_messages: HashMap<String, String>,

    /// Rule name -> validator, merged over the built-in rules
    #[serde(skip)]
    pub custom_rules: CustomRules,
}

// Default values
fn default_true() -> bool {
    true
}

fn default_false() -> bool {
    false
}

fn default_error_class() -> String {
    "is-invalid".to_string()
}

fn default_success_class() -> String {
    "is-valid".to_string()
}

fn default_error_message_class() -> String {
    "invalid-feedback".to_string()
}

fn default_group_class() -> String {
    "form-group".to_string()
}

impl Default for ValidatorOptions {
    fn default() -> Self {
        Self {
            validate_on_blur: true,
            validate_on_input: false,
            validate_on_submit: true,
            show_errors: true,
            error_class: default_error_class(),
            success_class: default_success_class(),
            error_message_class: default_error_message_class(),
            group_class: default_group_class(),
            scroll_to_error: true,
            focus_on_error: true,
            custom_messages: HashMap::new(),
            field_messages: HashMap::new(),
            custom_rules: CustomRules::new(),
        }
    }
}

impl ValidatorOptions {
    /// Load options from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        // A missing file means defaults
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read validator options: {:?}", path))?;

        Self::from_toml_str(&content)
            .with_context(|| format!("Failed to parse validator options: {:?}", path))
    }

    /// Parse options from TOML text; empty text means defaults
    pub fn from_toml_str(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let options = toml::from_str(content)?;
        Ok(options)
    }

    /// Add a custom rule, applied when the validator is constructed
    pub fn with_rule<F>(mut self, name: impl Into<String>, check: F) -> Self
    where
        F: Fn(&FieldValue, Option<&str>, &RuleContext<'_>) -> bool + 'static,
    {
        self.custom_rules.insert(name, check);
        self
    }

    /// Override the message template for a rule
    pub fn with_message(mut self, rule: impl Into<String>, template: impl Into<String>) -> Self {
        self.custom_messages.insert(rule.into(), template.into());
        self
    }

    /// Override the message for every rule failing on one field
    pub fn with_field_message(mut self, field: impl Into<String>, template: impl Into<String>) -> Self {
        self.field_messages.insert(field.into(), template.into());
        self
    }
}
