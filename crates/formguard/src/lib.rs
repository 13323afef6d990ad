//! formguard
//!
//! Rule-based form validation. Rules come from markup (`required`, input
//! types, `min`/`max`, `minlength`/`maxlength`, `pattern` and a
//! `data-validate="rule|rule:param"` list), are evaluated per field with
//! first-failure short-circuit, and their outcome is mirrored onto the
//! document as CSS classes and injected message elements.
//!
//! The engine works against any [`FormHost`]. [`MemoryDocument`] is an
//! in-memory host; the `formguard-wasm` crate provides the browser one.
//!
//! ```
//! use formguard::{Element, FormRef, MemoryDocument, Validator, ValidatorOptions};
//!
//! let mut doc = MemoryDocument::new();
//! let form = doc.append(doc.root(), Element::new("form").id("signup"));
//! let email = doc.append(form, Element::input("email").name("email").attr("required", ""));
//!
//! let mut validator = Validator::new(&doc, FormRef::from("#signup"), ValidatorOptions::default()).unwrap();
//! assert!(!validator.validate(&mut doc));
//!
//! doc.set_value(email, "a@b.co");
//! assert!(validator.validate(&mut doc));
//! ```

pub mod document;
pub mod error;
pub mod host;
pub mod options;
pub mod pending;
pub mod registry;
pub mod resolver;
pub mod synchronizer;
pub mod validator;
pub mod value;

pub use document::{Element, MemoryDocument, NodeId};
pub use error::{Result, ValidatorError};
pub use host::{ControlKind, FormHost, FormRef};
pub use options::ValidatorOptions;
pub use pending::{AsyncOutcomes, PendingChecks};
pub use registry::{AsyncRuleFn, CustomRules, FieldLocator, RuleCheck, RuleContext, RuleFn, RuleRegistry};
pub use resolver::{parse_rule_list, resolve_rules, ResolvedRule};
pub use validator::{ErrorMap, EventOutcome, FieldError, FormEvent, Validator};
pub use value::{FieldValue, FormData, FormValue};
