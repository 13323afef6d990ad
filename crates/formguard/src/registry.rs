// File: src/registry.rs
// Purpose: Rule registry - rule name to validator function and message template

use crate::value::FieldValue;
use formguard_rules as rules;
use futures::future::{FutureExt, LocalBoxFuture};
use regex::Regex;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::rc::Rc;

/// Message rendered when neither the field nor the registry supplies one
pub const FALLBACK_MESSAGE: &str = "Invalid value";

/// Compiled `pattern` sources a registry keeps before starting over
const PATTERN_CACHE_LIMIT: usize = 128;

/// Synchronous rule: `(value, param, context) -> passes`
pub type RuleFn = Rc<dyn Fn(&FieldValue, Option<&str>, &RuleContext<'_>) -> bool>;

/// Asynchronous rule, e.g. a server-side uniqueness lookup
pub type AsyncRuleFn = Rc<dyn Fn(FieldValue, Option<String>) -> LocalBoxFuture<'static, bool>>;

/// A registered validator, tagged by how its result becomes available
#[derive(Clone)]
pub enum RuleCheck {
    Sync(RuleFn),
    Async(AsyncRuleFn),
}

impl fmt::Debug for RuleCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleCheck::Sync(_) => f.write_str("RuleCheck::Sync(..)"),
            RuleCheck::Async(_) => f.write_str("RuleCheck::Async(..)"),
        }
    }
}

/// Looks up the current value of another field by id or selector.
///
/// Implemented by every document host, and by plain maps so rules can be
/// exercised without a document at all.
pub trait FieldLocator {
    fn locate_value(&self, target: &str) -> Option<FieldValue>;
}

impl FieldLocator for () {
    fn locate_value(&self, _target: &str) -> Option<FieldValue> {
        None
    }
}

impl FieldLocator for HashMap<String, String> {
    fn locate_value(&self, target: &str) -> Option<FieldValue> {
        let key = target.strip_prefix('#').unwrap_or(target);
        self.get(key).map(|v| FieldValue::Text(v.clone()))
    }
}

/// What a rule can see besides the value: the field it runs on and the rest
/// of the document through a locator.
pub struct RuleContext<'a> {
    pub field_key: &'a str,
    locator: &'a dyn FieldLocator,
}

impl<'a> RuleContext<'a> {
    pub fn new(field_key: &'a str, locator: &'a dyn FieldLocator) -> Self {
        Self { field_key, locator }
    }

    /// Value of another field, `None` if nothing matches `target`
    pub fn lookup(&self, target: &str) -> Option<FieldValue> {
        self.locator.locate_value(target)
    }
}

/// Rules supplied by the caller at construction time, in insertion order
#[derive(Clone, Default)]
pub struct CustomRules(Vec<(String, RuleFn)>);

impl CustomRules {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert<F>(&mut self, name: impl Into<String>, check: F)
    where
        F: Fn(&FieldValue, Option<&str>, &RuleContext<'_>) -> bool + 'static,
    {
        self.0.push((name.into(), Rc::new(check)));
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &RuleFn)> {
        self.0.iter().map(|(name, check)| (name.as_str(), check))
    }
}

impl fmt::Debug for CustomRules {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.0.iter().map(|(name, _)| name)).finish()
    }
}

/// Mapping from rule name to validator and default message template.
///
/// Owned by a single validator; there is no removal operation.
#[derive(Clone, Default)]
pub struct RuleRegistry {
    checks: HashMap<String, RuleCheck>,
    messages: HashMap<String, String>,
    patterns: Rc<RefCell<PatternCache>>,
}

// Compiled `pattern` sources of one registry
#[derive(Default)]
struct PatternCache {
    compiled: HashMap<String, Regex>,
}

impl PatternCache {
    fn matches(&mut self, value: &str, source: &str) -> Result<bool, regex::Error> {
        if let Some(regex) = self.compiled.get(source) {
            return Ok(regex.is_match(value));
        }

        let regex = rules::compile_pattern(source)?;
        let matched = regex.is_match(value);
        if self.compiled.len() >= PATTERN_CACHE_LIMIT {
            self.compiled.clear();
        }
        self.compiled.insert(source.to_string(), regex);
        Ok(matched)
    }
}

impl RuleRegistry {
    /// An empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry seeded with every built-in rule
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();

        registry.builtin("required", "This field is required.", required);
        registry.builtin("email", "Please enter a valid email address.", optional(|v, _| rules::is_valid_email(v)));
        registry.builtin("url", "Please enter a valid URL.", optional(|v, _| rules::is_valid_url(v)));
        registry.builtin("number", "Please enter a valid number.", optional(|v, _| rules::is_number(v)));
        registry.builtin("integer", "Please enter a whole number.", optional(|v, _| rules::is_integer(v)));
        registry.builtin(
            "min",
            "Please enter a value greater than or equal to {0}.",
            optional(|v, p| {
                p.is_some_and(|min| rules::is_at_least(v, min) || rules::is_date_on_or_after(v, min))
            }),
        );
        registry.builtin(
            "max",
            "Please enter a value less than or equal to {0}.",
            optional(|v, p| {
                p.is_some_and(|max| rules::is_at_most(v, max) || rules::is_date_on_or_before(v, max))
            }),
        );
        registry.builtin(
            "minlength",
            "Please enter at least {0} characters.",
            optional(|v, p| p.is_some_and(|min| rules::has_min_length(v, min))),
        );
        registry.builtin(
            "maxlength",
            "Please enter no more than {0} characters.",
            optional(|v, p| p.is_some_and(|max| rules::has_max_length(v, max))),
        );
        let patterns = Rc::clone(&registry.patterns);
        registry.builtin(
            "pattern",
            "Please match the requested format.",
            optional(move |v, p| pattern(&patterns, v, p)),
        );
        registry.builtin("phone", "Please enter a valid phone number.", optional(|v, _| rules::is_valid_phone(v)));
        registry.builtin(
            "alphanumeric",
            "Please use only letters and numbers.",
            optional(|v, _| rules::is_alphanumeric(v)),
        );
        registry.builtin("alpha", "Please use only letters.", optional(|v, _| rules::is_alpha(v)));
        registry.builtin("date", "Please enter a valid date.", optional(|v, _| rules::is_valid_date(v)));
        registry.builtin("match", "Fields do not match.", matches_field);

        registry
    }

    fn builtin<F>(&mut self, name: &str, message: &str, check: F)
    where
        F: Fn(&FieldValue, Option<&str>, &RuleContext<'_>) -> bool + 'static,
    {
        self.checks.insert(name.to_string(), RuleCheck::Sync(Rc::new(check)));
        self.messages.insert(name.to_string(), message.to_string());
    }

    /// Merge caller-supplied rules and messages; caller entries win
    pub fn extend(&mut self, custom_rules: &CustomRules, custom_messages: &HashMap<String, String>) {
        for (name, check) in custom_rules.iter() {
            self.checks.insert(name.to_string(), RuleCheck::Sync(Rc::clone(check)));
        }
        for (name, message) in custom_messages {
            self.messages.insert(name.clone(), message.clone());
        }
    }

    /// Insert or overwrite a synchronous rule.
    ///
    /// Without a message, a message registered earlier under the same name
    /// is kept.
    pub fn add_rule<F>(&mut self, name: impl Into<String>, check: F, message: Option<&str>)
    where
        F: Fn(&FieldValue, Option<&str>, &RuleContext<'_>) -> bool + 'static,
    {
        self.insert(name.into(), RuleCheck::Sync(Rc::new(check)), message);
    }

    /// Insert or overwrite an asynchronous rule.
    ///
    /// Async rules only run in the async validation pass; see
    /// [`crate::Validator::validate_async`].
    pub fn add_async_rule<F, Fut>(&mut self, name: impl Into<String>, check: F, message: Option<&str>)
    where
        F: Fn(FieldValue, Option<String>) -> Fut + 'static,
        Fut: Future<Output = bool> + 'static,
    {
        let check: AsyncRuleFn = Rc::new(move |value, param| check(value, param).boxed_local());
        self.insert(name.into(), RuleCheck::Async(check), message);
    }

    fn insert(&mut self, name: String, check: RuleCheck, message: Option<&str>) {
        if let Some(message) = message {
            self.messages.insert(name.clone(), message.to_string());
        }
        self.checks.insert(name, check);
    }

    pub fn get(&self, name: &str) -> Option<&RuleCheck> {
        self.checks.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.checks.contains_key(name)
    }

    /// Number of compiled `pattern` sources held by this registry
    pub fn cached_patterns(&self) -> usize {
        self.patterns.borrow().compiled.len()
    }

    /// Registered template for a rule, or the generic fallback
    pub fn message_for(&self, name: &str) -> &str {
        self.messages
            .get(name)
            .map(String::as_str)
            .unwrap_or(FALLBACK_MESSAGE)
    }
}

impl fmt::Debug for RuleRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.checks.keys().collect();
        names.sort();
        f.debug_struct("RuleRegistry").field("rules", &names).finish()
    }
}

/// Substitute the `{0}` placeholder with the rule parameter
pub fn render_message(template: &str, param: Option<&str>) -> String {
    match param {
        Some(param) => template.replace("{0}", param),
        None => template.to_string(),
    }
}

// Wraps a text check so that an empty value passes
fn optional<F>(check: F) -> impl Fn(&FieldValue, Option<&str>, &RuleContext<'_>) -> bool
where
    F: Fn(&str, Option<&str>) -> bool,
{
    move |value, param, _ctx| value.is_empty() || check(&value.as_text(), param)
}

fn required(value: &FieldValue, _param: Option<&str>, _ctx: &RuleContext<'_>) -> bool {
    match value {
        FieldValue::Text(s) => !s.trim().is_empty(),
        FieldValue::Checked(checked) => *checked,
    }
}

fn pattern(cache: &RefCell<PatternCache>, value: &str, param: Option<&str>) -> bool {
    let Some(source) = param else {
        return true;
    };
    match cache.borrow_mut().matches(value, source) {
        Ok(matched) => matched,
        Err(e) => {
            tracing::warn!("Invalid pattern {:?}: {}", source, e);
            false
        }
    }
}

// A missing target passes; the rule cannot fail on markup it cannot see
fn matches_field(value: &FieldValue, param: Option<&str>, ctx: &RuleContext<'_>) -> bool {
    let Some(target) = param else {
        return true;
    };
    match ctx.lookup(target) {
        Some(other) => other.as_text() == value.as_text(),
        None => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn check(registry: &RuleRegistry, name: &str, value: &str, param: Option<&str>) -> bool {
        let ctx = RuleContext::new("field", &());
        match registry.get(name) {
            Some(RuleCheck::Sync(f)) => f(&FieldValue::from(value), param, &ctx),
            other => panic!("expected sync rule {name}, got {other:?}"),
        }
    }

    #[rstest]
    #[case("email", None)]
    #[case("url", None)]
    #[case("number", None)]
    #[case("integer", None)]
    #[case("min", Some("5"))]
    #[case("max", Some("5"))]
    #[case("minlength", Some("8"))]
    #[case("maxlength", Some("2"))]
    #[case("pattern", Some("[0-9]+"))]
    #[case("phone", None)]
    #[case("alphanumeric", None)]
    #[case("alpha", None)]
    #[case("date", None)]
    fn test_empty_value_passes_optional_rules(#[case] name: &str, #[case] param: Option<&str>) {
        let registry = RuleRegistry::with_builtins();
        assert!(check(&registry, name, "", param));
    }

    #[test]
    fn test_required() {
        let registry = RuleRegistry::with_builtins();
        assert!(!check(&registry, "required", "", None));
        assert!(!check(&registry, "required", "   ", None));
        assert!(check(&registry, "required", "x", None));

        let ctx = RuleContext::new("terms", &());
        let Some(RuleCheck::Sync(required)) = registry.get("required") else {
            panic!("required is a sync rule");
        };
        assert!(!required(&FieldValue::Checked(false), None, &ctx));
        assert!(required(&FieldValue::Checked(true), None, &ctx));
    }

    #[test]
    fn test_bound_rules_use_param() {
        let registry = RuleRegistry::with_builtins();
        assert!(check(&registry, "min", "18", Some("18")));
        assert!(!check(&registry, "min", "17", Some("18")));
        assert!(!check(&registry, "max", "121", Some("120")));
        assert!(!check(&registry, "minlength", "1234567", Some("8")));
        assert!(check(&registry, "minlength", "12345678", Some("8")));
        assert!(!check(&registry, "min", "5", None));
    }

    #[test]
    fn test_invalid_pattern_fails() {
        let registry = RuleRegistry::with_builtins();
        assert!(!check(&registry, "pattern", "abc", Some("[a-")));
        assert_eq!(registry.cached_patterns(), 0);
    }

    #[test]
    fn test_pattern_cache_is_per_registry() {
        let first = RuleRegistry::with_builtins();
        let second = RuleRegistry::with_builtins();

        assert!(check(&first, "pattern", "123", Some("[0-9]+")));
        assert!(!check(&first, "pattern", "12a", Some("[0-9]+")));
        assert_eq!(first.cached_patterns(), 1);
        assert_eq!(second.cached_patterns(), 0);
    }

    #[test]
    fn test_pattern_cache_is_bounded() {
        let registry = RuleRegistry::with_builtins();
        for n in 0..PATTERN_CACHE_LIMIT * 2 + 5 {
            let source = format!("x{{{}}}", n + 1);
            assert!(check(&registry, "pattern", &"x".repeat(n + 1), Some(&source)));
        }
        assert!(registry.cached_patterns() <= PATTERN_CACHE_LIMIT);
        assert!(registry.cached_patterns() > 0);
    }

    #[test]
    fn test_match_rule() {
        let registry = RuleRegistry::with_builtins();
        let mut fields = HashMap::new();
        fields.insert("password".to_string(), "s3cret!".to_string());

        let Some(RuleCheck::Sync(matcher)) = registry.get("match") else {
            panic!("match is a sync rule");
        };
        let ctx = RuleContext::new("confirm", &fields);
        assert!(matcher(&FieldValue::from("s3cret!"), Some("password"), &ctx));
        assert!(matcher(&FieldValue::from("s3cret!"), Some("#password"), &ctx));
        assert!(!matcher(&FieldValue::from("other"), Some("password"), &ctx));
        // Missing target fails open
        assert!(matcher(&FieldValue::from("other"), Some("missing"), &ctx));
    }

    #[test]
    fn test_add_rule_keeps_existing_message() {
        let mut registry = RuleRegistry::with_builtins();
        registry.add_rule("email", |_, _, _| true, None);
        assert_eq!(registry.message_for("email"), "Please enter a valid email address.");

        registry.add_rule("uppercase", |v, _, _| v.as_text().chars().any(char::is_uppercase), None);
        assert_eq!(registry.message_for("uppercase"), FALLBACK_MESSAGE);

        registry.add_rule("uppercase", |_, _, _| true, Some("Needs an uppercase letter"));
        assert_eq!(registry.message_for("uppercase"), "Needs an uppercase letter");
    }

    #[test]
    fn test_custom_entries_take_precedence() {
        let mut registry = RuleRegistry::with_builtins();
        let mut custom = CustomRules::new();
        custom.insert("required", |_, _, _| true);
        let mut messages = HashMap::new();
        messages.insert("email".to_string(), "Bad email".to_string());

        registry.extend(&custom, &messages);

        assert!(check(&registry, "required", "", None));
        assert_eq!(registry.message_for("email"), "Bad email");
    }

    #[test]
    fn test_render_message() {
        assert_eq!(
            render_message("Please enter at least {0} characters.", Some("8")),
            "Please enter at least 8 characters."
        );
        assert_eq!(render_message("Required", None), "Required");
    }
}
