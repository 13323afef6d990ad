// File: src/validator.rs
// Purpose: Field and form evaluation, error map, event handling

use crate::error::{Result, ValidatorError};
use crate::host::{attr, field_key, ControlKind, FormHost, FormRef};
use crate::options::ValidatorOptions;
use crate::pending::{AsyncOutcomes, PendingChecks};
use crate::registry::{render_message, FieldLocator, RuleCheck, RuleContext, RuleRegistry};
use crate::resolver::{resolve_rules, ResolvedRule};
use crate::synchronizer::{clear_field, sync_field, FieldState};
use crate::value::{append_form_value, FieldValue, FormData};
use std::collections::HashMap;
use std::fmt;
use std::future::Future;

/// The failure currently recorded for one field
#[derive(Debug, Clone, PartialEq)]
pub struct FieldError<N> {
    /// The field that failed; the document owns it
    pub field: N,
    /// Name of the rule that failed
    pub rule: String,
    /// Rendered message
    pub message: String,
}

/// Field key -> current failure
pub type ErrorMap<N> = HashMap<String, FieldError<N>>;

/// Document events a validator reacts to
#[derive(Debug, Clone, PartialEq)]
pub enum FormEvent<N> {
    Blur(N),
    Input(N),
    Submit,
}

/// What the host should do after dispatching an event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EventOutcome {
    /// Cancel the browser's default action (form submission)
    pub prevent_default: bool,
    /// Validation result, if the event triggered validation
    pub valid: Option<bool>,
}

/// Rule-based validator bound to one form.
///
/// The validator owns its rule registry and error map; the document is
/// borrowed per call, so several validators can work on one document.
pub struct Validator<H: FormHost> {
    form: H::Node,
    options: ValidatorOptions,
    registry: RuleRegistry,
    errors: ErrorMap<H::Node>,
    validated: bool,
}

impl<H: FormHost> fmt::Debug for Validator<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Validator")
            .field("form", &self.form)
            .field("registry", &self.registry)
            .field("errors", &self.errors)
            .field("validated", &self.validated)
            .finish()
    }
}

impl<H: FormHost> Validator<H> {
    /// Bind a validator to a form.
    ///
    /// Fails with [`ValidatorError::FormNotFound`] when `target` does not
    /// resolve to a form element.
    pub fn new(host: &H, target: FormRef<H::Node>, options: ValidatorOptions) -> Result<Self> {
        let form = host.find_form(&target).ok_or_else(|| {
            ValidatorError::FormNotFound(match &target {
                FormRef::Selector(selector) => selector.clone(),
                FormRef::Node(node) => format!("{:?}", node),
            })
        })?;

        let mut registry = RuleRegistry::with_builtins();
        registry.extend(&options.custom_rules, &options.custom_messages);

        tracing::debug!("Validator bound to form {:?}", form);

        Ok(Self {
            form,
            options,
            registry,
            errors: HashMap::new(),
            validated: false,
        })
    }

    pub fn form(&self) -> &H::Node {
        &self.form
    }

    pub fn options(&self) -> &ValidatorOptions {
        &self.options
    }

    pub fn registry(&self) -> &RuleRegistry {
        &self.registry
    }

    /// Register or replace a synchronous rule
    pub fn add_rule<F>(&mut self, name: impl Into<String>, check: F, message: Option<&str>)
    where
        F: Fn(&FieldValue, Option<&str>, &RuleContext<'_>) -> bool + 'static,
    {
        self.registry.add_rule(name, check, message);
    }

    /// Register or replace an asynchronous rule (async pass only)
    pub fn add_async_rule<F, Fut>(&mut self, name: impl Into<String>, check: F, message: Option<&str>)
    where
        F: Fn(FieldValue, Option<String>) -> Fut + 'static,
        Fut: Future<Output = bool> + 'static,
    {
        self.registry.add_async_rule(name, check, message);
    }

    /// Current failures; does not evaluate anything
    pub fn errors(&self) -> &ErrorMap<H::Node> {
        &self.errors
    }

    /// `true` only after a full pass found no errors.
    ///
    /// A validator that has never run `validate` (or was just reset) reports
    /// `false`, even though its error map is empty.
    pub fn is_valid(&self) -> bool {
        self.validated && self.errors.is_empty()
    }

    /// Fields a full pass evaluates: every control except submit/button
    /// inputs and disabled controls, in document order
    pub fn fields(&self, host: &H) -> Vec<H::Node> {
        host.controls(&self.form)
            .into_iter()
            .filter(|field| ControlKind::of(host, field) != ControlKind::Button)
            .filter(|field| !host.is_disabled(field))
            .collect()
    }

    /// Evaluate one field and update its error map entry.
    ///
    /// Rules run in resolution order and stop at the first failure. Async
    /// rules are not run here; they count as passing until the async pass.
    pub fn validate_field(&mut self, host: &mut H, field: &H::Node) -> bool {
        self.validate_field_with_outcomes(host, field, &AsyncOutcomes::default())
    }

    /// Evaluate one field, taking async rule results from `outcomes`.
    ///
    /// An async rule without a result for the field's current value is
    /// skipped.
    pub fn validate_field_with_outcomes(&mut self, host: &mut H, field: &H::Node, outcomes: &AsyncOutcomes) -> bool {
        let Some(key) = field_key(&*host, field) else {
            tracing::trace!("Skipping field without name or id: {:?}", field);
            return true;
        };

        let value = extract_value(&*host, &self.form, field);
        self.errors.remove(&key);

        let failure = self.first_failure(&*host, field, &key, &value, outcomes);
        self.record(host, field, key, &value, failure)
    }

    /// Validate the whole form.
    ///
    /// The result reflects synchronous rules only; use
    /// [`Validator::validate_async`] when async rules are registered.
    pub fn validate(&mut self, host: &mut H) -> bool {
        self.validate_with(host, |_, _, _| {})
    }

    /// Validate the whole form, then hand the outcome, error map and form
    /// data to `callback`.
    ///
    /// Fields sharing a key (a radio group) are evaluated until one of them
    /// fails; that failure is the key's entry for the pass.
    pub fn validate_with<F>(&mut self, host: &mut H, callback: F) -> bool
    where
        F: FnOnce(bool, &ErrorMap<H::Node>, &FormData),
    {
        self.validate_with_outcomes(host, &AsyncOutcomes::default(), callback)
    }

    /// Full pass using resolved async results; see [`Validator::start_async_checks`]
    pub fn validate_with_outcomes<F>(&mut self, host: &mut H, outcomes: &AsyncOutcomes, callback: F) -> bool
    where
        F: FnOnce(bool, &ErrorMap<H::Node>, &FormData),
    {
        self.errors.clear();

        let fields = self.fields(&*host);
        for field in &fields {
            if !self.failed_in_pass(&*host, field) {
                self.validate_field_with_outcomes(host, field, outcomes);
            }
        }

        self.finish_pass(host, &fields, callback)
    }

    /// Start the async rules of every field.
    ///
    /// Synchronous rules are evaluated to find which async rules the pass
    /// would reach; a field stops queueing at its first synchronous failure.
    /// The returned checks own their futures and borrow nothing, so the
    /// host is free while they are awaited.
    pub fn start_async_checks(&self, host: &H) -> PendingChecks {
        let mut pending = PendingChecks::default();
        for field in self.fields(host) {
            self.queue_async_checks(host, &field, &mut pending);
        }
        pending
    }

    /// Start the async rules of one field
    pub fn start_async_field_checks(&self, host: &H, field: &H::Node) -> PendingChecks {
        let mut pending = PendingChecks::default();
        self.queue_async_checks(host, field, &mut pending);
        pending
    }

    /// Evaluate one field, awaiting async rules in their place in the order
    pub async fn validate_field_async(&mut self, host: &mut H, field: &H::Node) -> bool {
        let outcomes = self.start_async_field_checks(&*host, field).resolve().await;
        self.validate_field_with_outcomes(host, field, &outcomes)
    }

    /// Validate the whole form including async rules
    pub async fn validate_async(&mut self, host: &mut H) -> bool {
        self.validate_async_with(host, |_, _, _| {}).await
    }

    /// Async pass; `callback` runs once every field has resolved
    pub async fn validate_async_with<F>(&mut self, host: &mut H, callback: F) -> bool
    where
        F: FnOnce(bool, &ErrorMap<H::Node>, &FormData),
    {
        let outcomes = self.start_async_checks(&*host).resolve().await;
        self.validate_with_outcomes(host, &outcomes, callback)
    }

    /// Named field values; repeated names collapse into a list
    pub fn form_data(&self, host: &H) -> FormData {
        let mut data = FormData::new();

        for field in host.controls(&self.form) {
            if host.is_disabled(&field) {
                continue;
            }
            let Some(name) = host.attribute(&field, attr::NAME).filter(|n| !n.is_empty()) else {
                continue;
            };

            match ControlKind::of(host, &field) {
                ControlKind::Button => {}
                ControlKind::Checkbox | ControlKind::Radio => {
                    if host.is_checked(&field) {
                        let value = host.value(&field);
                        let value = if value.is_empty() { "on".to_string() } else { value };
                        append_form_value(&mut data, &name, value);
                    }
                }
                ControlKind::Select if host.has_attribute(&field, attr::MULTIPLE) => {
                    for value in host.selected_values(&field) {
                        append_form_value(&mut data, &name, value);
                    }
                }
                _ => append_form_value(&mut data, &name, host.value(&field)),
            }
        }

        data
    }

    /// Restore the form's defaults and remove every validation artifact
    pub fn reset(&mut self, host: &mut H) {
        host.reset_form(&self.form);
        self.errors.clear();
        self.validated = false;

        for field in host.controls(&self.form) {
            if let Some(key) = field_key(&*host, &field) {
                clear_field(host, &self.form, &field, &key, &self.options);
            }
        }
    }

    /// Dispatch a document event according to the validate-on options
    pub fn handle_event(&mut self, host: &mut H, event: &FormEvent<H::Node>) -> EventOutcome {
        match event {
            FormEvent::Blur(field) if self.options.validate_on_blur => self.field_event(host, field),
            FormEvent::Input(field) if self.options.validate_on_input => self.field_event(host, field),
            FormEvent::Submit if self.options.validate_on_submit => EventOutcome {
                prevent_default: true,
                valid: Some(self.validate(host)),
            },
            _ => EventOutcome::default(),
        }
    }

    fn field_event(&mut self, host: &mut H, field: &H::Node) -> EventOutcome {
        if ControlKind::of(&*host, field) == ControlKind::Button {
            return EventOutcome::default();
        }
        EventOutcome {
            prevent_default: false,
            valid: Some(self.validate_field(host, field)),
        }
    }

    fn first_failure(
        &self,
        host: &H,
        field: &H::Node,
        key: &str,
        value: &FieldValue,
        outcomes: &AsyncOutcomes,
    ) -> Option<ResolvedRule> {
        let locator = HostLocator { host, form: &self.form };
        let ctx = RuleContext::new(key, &locator);

        for rule in resolve_rules(host, field) {
            match self.registry.get(&rule.name) {
                None => {
                    tracing::warn!("Unknown rule {:?} on field {:?}, skipping", rule.name, key);
                }
                Some(RuleCheck::Async(_)) => match outcomes.get(key, &rule.name, value) {
                    Some(true) => {}
                    Some(false) => return Some(rule),
                    None => {
                        tracing::debug!("No async result for rule {:?} on field {:?}, skipping", rule.name, key);
                    }
                },
                Some(RuleCheck::Sync(check)) => {
                    if !check(value, rule.param.as_deref(), &ctx) {
                        return Some(rule);
                    }
                }
            }
        }

        None
    }

    fn queue_async_checks(&self, host: &H, field: &H::Node, pending: &mut PendingChecks) {
        let Some(key) = field_key(host, field) else {
            return;
        };

        let value = extract_value(host, &self.form, field);
        let locator = HostLocator { host, form: &self.form };
        let ctx = RuleContext::new(&key, &locator);

        for rule in resolve_rules(host, field) {
            match self.registry.get(&rule.name) {
                None => {}
                Some(RuleCheck::Sync(check)) => {
                    if !check(&value, rule.param.as_deref(), &ctx) {
                        return;
                    }
                }
                Some(RuleCheck::Async(check)) => {
                    // Radio groups share a key and a value
                    if !pending.contains(&key, &rule.name) {
                        let future = check(value.clone(), rule.param.clone());
                        pending.push(&key, &rule.name, value.clone(), future);
                    }
                }
            }
        }
    }

    // Message priority: field attribute, per-field option, registry, fallback
    fn message_for(&self, host: &H, field: &H::Node, key: &str, rule: &ResolvedRule) -> String {
        let template = host
            .attribute(field, &attr::rule_message(&rule.name))
            .or_else(|| self.options.field_messages.get(key).cloned())
            .unwrap_or_else(|| self.registry.message_for(&rule.name).to_string());
        render_message(&template, rule.param.as_deref())
    }

    fn record(
        &mut self,
        host: &mut H,
        field: &H::Node,
        key: String,
        value: &FieldValue,
        failure: Option<ResolvedRule>,
    ) -> bool {
        let error = failure.map(|rule| FieldError {
            field: field.clone(),
            message: self.message_for(&*host, field, &key, &rule),
            rule: rule.name,
        });

        if self.options.show_errors {
            let state = match &error {
                Some(error) => FieldState::Invalid { message: &error.message },
                None => FieldState::Valid { value },
            };
            sync_field(host, &self.form, field, &key, state, &self.options);
        }

        match error {
            Some(error) => {
                tracing::debug!("Field {:?} failed rule {:?}", key, error.rule);
                self.errors.insert(key, error);
                false
            }
            None => true,
        }
    }

    fn finish_pass<F>(&mut self, host: &mut H, fields: &[H::Node], callback: F) -> bool
    where
        F: FnOnce(bool, &ErrorMap<H::Node>, &FormData),
    {
        self.validated = true;
        let valid = self.errors.is_empty();

        if !valid && self.options.focus_on_error {
            if let Some(first) = self.first_invalid(&*host, fields) {
                host.focus(&first);
                if self.options.scroll_to_error {
                    host.scroll_into_view(&first);
                }
            }
        }

        let data = self.form_data(&*host);
        callback(valid, &self.errors, &data);
        valid
    }

    // The error map is cleared when a pass starts
    fn failed_in_pass(&self, host: &H, field: &H::Node) -> bool {
        field_key(host, field).is_some_and(|key| self.errors.contains_key(&key))
    }

    // First field in document order whose own evaluation is the recorded failure
    fn first_invalid(&self, host: &H, fields: &[H::Node]) -> Option<H::Node> {
        fields
            .iter()
            .find(|field| {
                field_key(host, *field)
                    .and_then(|key| self.errors.get(&key))
                    .is_some_and(|error| error.field == **field)
            })
            .cloned()
    }
}

/// Value a rule sees: checkbox state, the checked radio of a group, or raw text
pub fn extract_value<H: FormHost + ?Sized>(host: &H, form: &H::Node, field: &H::Node) -> FieldValue {
    match ControlKind::of(host, field) {
        ControlKind::Checkbox => FieldValue::Checked(host.is_checked(field)),
        ControlKind::Radio => {
            let Some(name) = host.attribute(field, attr::NAME) else {
                let value = if host.is_checked(field) { host.value(field) } else { String::new() };
                return FieldValue::Text(value);
            };
            let checked = host.controls(form).into_iter().find(|other| {
                ControlKind::of(host, other) == ControlKind::Radio
                    && host.attribute(other, attr::NAME).as_deref() == Some(name.as_str())
                    && host.is_checked(other)
            });
            FieldValue::Text(checked.map(|radio| host.value(&radio)).unwrap_or_default())
        }
        _ => FieldValue::Text(host.value(field)),
    }
}

// Resolves `match` targets against the whole document
struct HostLocator<'a, H: FormHost + ?Sized> {
    host: &'a H,
    form: &'a H::Node,
}

impl<H: FormHost + ?Sized> FieldLocator for HostLocator<'_, H> {
    fn locate_value(&self, target: &str) -> Option<FieldValue> {
        let node = self.host.locate(target)?;
        Some(extract_value(self.host, self.form, &node))
    }
}
