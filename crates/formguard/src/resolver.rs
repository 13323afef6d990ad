// File: src/resolver.rs
// Purpose: Turn a field's markup into the ordered list of rules to run

use crate::host::{attr, input_type, FormHost};

/// A rule bound to one field, with its parameter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRule {
    pub name: String,
    pub param: Option<String>,
}

impl ResolvedRule {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            param: None,
        }
    }

    pub fn with_param(name: impl Into<String>, param: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            param: Some(param.into()),
        }
    }
}

/// Parse a declarative rule list such as `required|minlength:8|match:#password`.
///
/// Tokens are separated by `|`; a token splits on its first `:` into name
/// and parameter, both trimmed. Empty tokens are dropped.
pub fn parse_rule_list(source: &str) -> Vec<ResolvedRule> {
    source
        .split('|')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .filter_map(|token| match token.split_once(':') {
            Some((name, param)) => {
                let name = name.trim();
                (!name.is_empty()).then(|| ResolvedRule::with_param(name, param.trim()))
            }
            None => Some(ResolvedRule::new(token)),
        })
        .collect()
}

/// Rule implied by an input type, if any
pub fn type_rule(input_type: &str) -> Option<&'static str> {
    match input_type {
        "email" => Some("email"),
        "url" => Some("url"),
        "number" => Some("number"),
        "tel" => Some("phone"),
        "date" => Some("date"),
        _ => None,
    }
}

/// Ordered rules for one field.
///
/// Intrinsic constraints come first (required, type, value bounds, length
/// bounds, pattern), then the declarative list in written order. Evaluation
/// stops at the first failure, so `required` always reports before anything
/// more specific.
pub fn resolve_rules<H: FormHost + ?Sized>(host: &H, field: &H::Node) -> Vec<ResolvedRule> {
    let mut rules = Vec::new();

    if host.has_attribute(field, attr::REQUIRED) {
        rules.push(ResolvedRule::new("required"));
    }

    if let Some(rule) = type_rule(&input_type(host, field)) {
        rules.push(ResolvedRule::new(rule));
    }

    for (attribute, rule) in [
        (attr::MIN, "min"),
        (attr::MAX, "max"),
        (attr::MIN_LENGTH, "minlength"),
        (attr::MAX_LENGTH, "maxlength"),
        (attr::PATTERN, "pattern"),
    ] {
        if let Some(value) = host.attribute(field, attribute) {
            rules.push(ResolvedRule::with_param(rule, value));
        }
    }

    if let Some(list) = host.attribute(field, attr::VALIDATE) {
        rules.extend(parse_rule_list(&list));
    }

    rules
}
