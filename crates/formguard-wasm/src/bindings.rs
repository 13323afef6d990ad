//! The `FormValidator` class exported to JavaScript.

use crate::dom::DomHost;
use formguard::{
    ErrorMap, FieldValue, FormData, FormEvent, FormRef, RuleContext, Validator, ValidatorOptions,
};
use js_sys::{Function, Object, Promise, Reflect};
use serde::Serialize;
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::{future_to_promise, JsFuture};
use web_sys::{Element, Event, EventTarget};

struct Bound {
    host: DomHost,
    validator: Validator<DomHost>,
}

struct Listener {
    target: EventTarget,
    event: &'static str,
    callback: Closure<dyn FnMut(Event)>,
}

/// Validator bound to one form element.
///
/// ```javascript
/// const validator = new FormValidator('#signup', {
///     validateOnInput: true,
///     customRules: { uppercase: (value) => /[A-Z]/.test(value) },
///     customMessages: { uppercase: 'Needs an uppercase letter' },
/// });
/// validator.validate((valid, errors, data) => console.log(valid, errors, data));
/// ```
#[wasm_bindgen]
pub struct FormValidator {
    inner: Rc<RefCell<Bound>>,
    listeners: Vec<Listener>,
}

#[wasm_bindgen]
impl FormValidator {
    /// `form` is a form element, an element id, or a selector
    #[wasm_bindgen(constructor)]
    pub fn new(form: JsValue, options: Option<Object>) -> Result<FormValidator, JsValue> {
        let host = DomHost::current().ok_or_else(|| JsValue::from_str("no document available"))?;

        let target = match form.as_string() {
            Some(selector) => FormRef::Selector(selector),
            None => FormRef::Node(
                form.dyn_into::<Element>()
                    .map_err(|_| JsValue::from_str("form must be an element or a selector"))?,
            ),
        };

        let options = match options {
            Some(options) => read_options(&options)?,
            None => ValidatorOptions::default(),
        };

        let validator = Validator::new(&host, target, options).map_err(|e| JsValue::from_str(&e.to_string()))?;

        let mut this = FormValidator {
            inner: Rc::new(RefCell::new(Bound { host, validator })),
            listeners: Vec::new(),
        };
        this.attach_listeners()?;
        Ok(this)
    }

    /// Validate every field; `callback(valid, errors, data)` runs after the pass.
    ///
    /// Async rules are not awaited here; use `validateAsync`.
    pub fn validate(&self, callback: Option<Function>) -> Result<bool, JsValue> {
        let mut snapshot = Ok(None);
        let valid = {
            let mut bound = self.borrow()?;
            let Bound { host, validator } = &mut *bound;
            validator.validate_with(host, |_, errors, data| {
                if callback.is_some() {
                    snapshot = Snapshot::take(errors, data).map(Some);
                }
            })
        };

        // The callback may call back into this validator
        if let (Some(callback), Some(snapshot)) = (&callback, snapshot?) {
            snapshot.deliver(callback, valid)?;
        }
        Ok(valid)
    }

    /// Validate every field, awaiting async rules; resolves to the validity.
    ///
    /// The validator is only borrowed to start the rules and to apply their
    /// results, so events and other calls keep working in between.
    #[wasm_bindgen(js_name = validateAsync)]
    pub fn validate_async(&self, callback: Option<Function>) -> Promise {
        let inner = Rc::clone(&self.inner);
        future_to_promise(async move {
            let pending = {
                let bound = inner.try_borrow().map_err(|_| busy())?;
                bound.validator.start_async_checks(&bound.host)
            };

            let outcomes = pending.resolve().await;

            let mut snapshot = Ok(None);
            let valid = {
                let mut bound = inner.try_borrow_mut().map_err(|_| busy())?;
                let Bound { host, validator } = &mut *bound;
                validator.validate_with_outcomes(host, &outcomes, |_, errors, data| {
                    if callback.is_some() {
                        snapshot = Snapshot::take(errors, data).map(Some);
                    }
                })
            };

            if let (Some(callback), Some(snapshot)) = (&callback, snapshot?) {
                snapshot.deliver(callback, valid)?;
            }
            Ok(JsValue::from_bool(valid))
        })
    }

    #[wasm_bindgen(js_name = validateField)]
    pub fn validate_field(&self, field: Element) -> Result<bool, JsValue> {
        let mut bound = self.borrow()?;
        let Bound { host, validator } = &mut *bound;
        Ok(validator.validate_field(host, &field))
    }

    /// Register or replace a rule. `check(value, param, fieldKey)` must
    /// return synchronously; a returned Promise only counts as truthy.
    #[wasm_bindgen(js_name = addRule)]
    pub fn add_rule(&self, name: String, check: Function, message: Option<String>) -> Result<(), JsValue> {
        let mut bound = self.borrow()?;
        bound.validator.add_rule(name.clone(), js_rule(name, check), message.as_deref());
        Ok(())
    }

    /// Register or replace a rule whose result may be a Promise; it runs in
    /// `validateAsync` only
    #[wasm_bindgen(js_name = addAsyncRule)]
    pub fn add_async_rule(&self, name: String, check: Function, message: Option<String>) -> Result<(), JsValue> {
        let mut bound = self.borrow()?;
        let rule = name.clone();
        bound.validator.add_async_rule(
            name,
            move |value, param| {
                let result = call_rule(&check, &value, param.as_deref(), None);
                let rule = rule.clone();
                async move {
                    let result = match result {
                        Ok(result) => result,
                        Err(e) => {
                            tracing::warn!("Rule {:?} threw: {:?}", rule, e);
                            return false;
                        }
                    };
                    match result.dyn_into::<Promise>() {
                        Ok(promise) => match JsFuture::from(promise).await {
                            Ok(resolved) => resolved.is_truthy(),
                            Err(e) => {
                                tracing::warn!("Rule {:?} rejected: {:?}", rule, e);
                                false
                            }
                        },
                        Err(value) => value.is_truthy(),
                    }
                }
            },
            message.as_deref(),
        );
        Ok(())
    }

    /// `{ key: { field, rule, message } }`
    #[wasm_bindgen(js_name = getErrors)]
    pub fn get_errors(&self) -> Result<JsValue, JsValue> {
        let bound = self.inner.try_borrow().map_err(|_| busy())?;
        errors_to_js(bound.validator.errors())
    }

    /// `{ name: value | [values] }`
    #[wasm_bindgen(js_name = getFormData)]
    pub fn get_form_data(&self) -> Result<JsValue, JsValue> {
        let bound = self.inner.try_borrow().map_err(|_| busy())?;
        form_data_to_js(&bound.validator.form_data(&bound.host))
    }

    pub fn reset(&self) -> Result<(), JsValue> {
        let mut bound = self.borrow()?;
        let Bound { host, validator } = &mut *bound;
        validator.reset(host);
        Ok(())
    }

    #[wasm_bindgen(js_name = isValid)]
    pub fn is_valid(&self) -> Result<bool, JsValue> {
        let bound = self.inner.try_borrow().map_err(|_| busy())?;
        Ok(bound.validator.is_valid())
    }

    /// Detach every listener this validator installed
    pub fn destroy(&mut self) {
        self.detach_listeners();
    }
}

impl FormValidator {
    fn borrow(&self) -> Result<std::cell::RefMut<'_, Bound>, JsValue> {
        self.inner.try_borrow_mut().map_err(|_| busy())
    }

    fn attach_listeners(&mut self) -> Result<(), JsValue> {
        let (form, fields, options) = {
            let bound = self.borrow()?;
            (
                bound.validator.form().clone(),
                bound.validator.fields(&bound.host),
                bound.validator.options().clone(),
            )
        };

        for field in fields {
            if options.validate_on_blur {
                let event = FormEvent::Blur(field.clone());
                self.listen(field.clone().into(), "blur", self.forward(event))?;
            }
            if options.validate_on_input {
                let event = FormEvent::Input(field.clone());
                self.listen(field.clone().into(), "input", self.forward(event))?;
            }
        }

        if options.validate_on_submit {
            let callback = self.forward(FormEvent::Submit);
            self.listen(form.into(), "submit", callback)?;
        }

        Ok(())
    }

    fn forward(&self, event: FormEvent<Element>) -> Closure<dyn FnMut(Event)> {
        let inner = Rc::clone(&self.inner);
        Closure::new(move |dom_event: Event| {
            let Ok(mut bound) = inner.try_borrow_mut() else {
                tracing::warn!("Validator busy, {} event ignored", dom_event.type_());
                // Submit listeners only exist when validateOnSubmit is set
                if matches!(event, FormEvent::Submit) {
                    dom_event.prevent_default();
                }
                return;
            };
            let Bound { host, validator } = &mut *bound;
            let outcome = validator.handle_event(host, &event);
            if outcome.prevent_default {
                dom_event.prevent_default();
            }
        })
    }

    fn listen(
        &mut self,
        target: EventTarget,
        event: &'static str,
        callback: Closure<dyn FnMut(Event)>,
    ) -> Result<(), JsValue> {
        target.add_event_listener_with_callback(event, callback.as_ref().unchecked_ref())?;
        self.listeners.push(Listener {
            target,
            event,
            callback,
        });
        Ok(())
    }

    fn detach_listeners(&mut self) {
        for listener in self.listeners.drain(..) {
            let removed = listener
                .target
                .remove_event_listener_with_callback(listener.event, listener.callback.as_ref().unchecked_ref());
            if let Err(e) = removed {
                tracing::debug!("Failed to remove {} listener: {:?}", listener.event, e);
            }
        }
    }
}

impl Drop for FormValidator {
    fn drop(&mut self) {
        self.detach_listeners();
    }
}

fn busy() -> JsValue {
    JsValue::from_str("validator is busy")
}

fn read_options(source: &Object) -> Result<ValidatorOptions, JsValue> {
    let mut options: ValidatorOptions = serde_wasm_bindgen::from_value(source.clone().into())
        .map_err(|e| JsValue::from_str(&format!("Failed to parse options: {}", e)))?;

    let rules = Reflect::get(source, &JsValue::from_str("customRules"))?;
    if let Some(rules) = rules.dyn_ref::<Object>() {
        for name in Object::keys(rules).iter().filter_map(|key| key.as_string()) {
            let check = Reflect::get(rules, &JsValue::from_str(&name))?;
            match check.dyn_into::<Function>() {
                Ok(check) => options.custom_rules.insert(name.clone(), js_rule(name, check)),
                Err(_) => tracing::warn!("Custom rule {:?} is not a function, ignored", name),
            }
        }
    }

    Ok(options)
}

// Wraps a JS function as a synchronous rule
fn js_rule(name: String, check: Function) -> impl Fn(&FieldValue, Option<&str>, &RuleContext<'_>) -> bool {
    move |value: &FieldValue, param: Option<&str>, ctx: &RuleContext<'_>| match call_rule(&check, value, param, Some(ctx.field_key)) {
        Ok(result) => {
            if result.is_instance_of::<Promise>() {
                tracing::warn!("Rule {:?} returned a Promise; register it with addAsyncRule", name);
            }
            result.is_truthy()
        }
        Err(e) => {
            tracing::warn!("Rule {:?} threw: {:?}", name, e);
            false
        }
    }
}

fn call_rule(check: &Function, value: &FieldValue, param: Option<&str>, key: Option<&str>) -> Result<JsValue, JsValue> {
    let value = match value {
        FieldValue::Text(text) => JsValue::from_str(text),
        FieldValue::Checked(checked) => JsValue::from_bool(*checked),
    };
    let param = param.map_or(JsValue::UNDEFINED, JsValue::from_str);
    let key = key.map_or(JsValue::UNDEFINED, JsValue::from_str);
    check.call3(&JsValue::NULL, &value, &param, &key)
}

// JS copies of a pass's results, taken while the validator is borrowed
struct Snapshot {
    errors: JsValue,
    data: JsValue,
}

impl Snapshot {
    fn take(errors: &ErrorMap<Element>, data: &FormData) -> Result<Self, JsValue> {
        Ok(Self {
            errors: errors_to_js(errors)?,
            data: form_data_to_js(data)?,
        })
    }

    fn deliver(self, callback: &Function, valid: bool) -> Result<(), JsValue> {
        callback.call3(&JsValue::NULL, &JsValue::from_bool(valid), &self.errors, &self.data)?;
        Ok(())
    }
}

fn errors_to_js(errors: &ErrorMap<Element>) -> Result<JsValue, JsValue> {
    let map = Object::new();
    for (key, error) in errors {
        let entry = Object::new();
        Reflect::set(&entry, &"field".into(), &error.field)?;
        Reflect::set(&entry, &"rule".into(), &JsValue::from_str(&error.rule))?;
        Reflect::set(&entry, &"message".into(), &JsValue::from_str(&error.message))?;
        Reflect::set(&map, &JsValue::from_str(key), &entry)?;
    }
    Ok(map.into())
}

fn form_data_to_js(data: &FormData) -> Result<JsValue, JsValue> {
    data.serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(|e| JsValue::from_str(&format!("Failed to convert form data: {}", e)))
}

#[cfg(all(test, target_arch = "wasm32"))]
mod tests {
    use super::*;
    use std::cell::Cell;
    use wasm_bindgen_test::*;
    use web_sys::{EventInit, HtmlInputElement};

    wasm_bindgen_test_configure!(run_in_browser);

    fn mount(id: &str, markup: &str) -> Element {
        let document = web_sys::window().unwrap().document().unwrap();
        let form = document.create_element("form").unwrap();
        form.set_id(id);
        form.set_inner_html(markup);
        document.body().unwrap().append_child(&form).unwrap();
        form
    }

    fn submit_event() -> Event {
        let init = EventInit::new();
        init.set_cancelable(true);
        Event::new_with_event_init_dict("submit", &init).unwrap()
    }

    async fn next_tick() {
        JsFuture::from(Promise::resolve(&JsValue::NULL)).await.unwrap();
    }

    #[wasm_bindgen_test]
    fn test_validate_callback_can_reenter() {
        mount("reenter", r#"<input name="code" required>"#);
        let validator = FormValidator::new(JsValue::from_str("reenter"), None).unwrap();

        let inner = Rc::clone(&validator.inner);
        let reentered = Rc::new(Cell::new(false));
        let seen = Rc::clone(&reentered);
        let callback = Closure::<dyn FnMut(JsValue, JsValue, JsValue)>::new(move |_, _, _| {
            seen.set(inner.try_borrow_mut().is_ok());
        });

        assert!(!validator.validate(Some(callback.as_ref().unchecked_ref::<Function>().clone())).unwrap());
        assert!(reentered.get());
    }

    #[wasm_bindgen_test]
    async fn test_validator_usable_while_async_rule_pending() {
        let form = mount("pending", r#"<input name="user" data-validate="available">"#);
        let field: HtmlInputElement = form.query_selector("[name=user]").unwrap().unwrap().dyn_into().unwrap();
        field.set_value("admin");

        let validator = FormValidator::new(JsValue::from_str("pending"), None).unwrap();

        let mut settle = None;
        let answer = Promise::new(&mut |resolve: Function, _reject: Function| settle = Some(resolve));
        let rule = Closure::<dyn Fn(JsValue) -> JsValue>::new(move |_| answer.clone().into());
        validator
            .add_async_rule("available".to_string(), rule.as_ref().unchecked_ref::<Function>().clone(), None)
            .unwrap();

        let pass = validator.validate_async(None);
        next_tick().await;

        // The async rule is in flight
        assert!(validator.validate(None).unwrap());
        let submit = submit_event();
        form.dispatch_event(&submit).unwrap();
        assert!(submit.default_prevented());

        settle.unwrap().call1(&JsValue::NULL, &JsValue::FALSE).unwrap();
        let valid = JsFuture::from(pass).await.unwrap();
        assert_eq!(valid.as_bool(), Some(false));
        assert!(!validator.is_valid().unwrap());
    }
}
