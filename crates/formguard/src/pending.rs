// File: src/pending.rs
// Purpose: Async rule results gathered apart from the validator

use crate::value::FieldValue;
use futures::future::{join_all, LocalBoxFuture};
use std::collections::HashMap;
use std::fmt;

/// Async rule calls started for a pass, not yet awaited.
///
/// Owns its futures outright, so a host can await them without holding on
/// to the validator or the document.
#[derive(Default)]
pub struct PendingChecks {
    checks: Vec<PendingCheck>,
}

struct PendingCheck {
    key: String,
    rule: String,
    value: FieldValue,
    future: LocalBoxFuture<'static, bool>,
}

impl PendingChecks {
    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }

    pub fn len(&self) -> usize {
        self.checks.len()
    }

    pub(crate) fn contains(&self, key: &str, rule: &str) -> bool {
        self.checks.iter().any(|c| c.key == key && c.rule == rule)
    }

    pub(crate) fn push(&mut self, key: &str, rule: &str, value: FieldValue, future: LocalBoxFuture<'static, bool>) {
        self.checks.push(PendingCheck {
            key: key.to_string(),
            rule: rule.to_string(),
            value,
            future,
        });
    }

    /// Await every check concurrently
    pub async fn resolve(self) -> AsyncOutcomes {
        let (labels, futures): (Vec<_>, Vec<_>) = self
            .checks
            .into_iter()
            .map(|c| ((c.key, c.rule, c.value), c.future))
            .unzip();

        let results = join_all(futures).await;

        let outcomes = labels
            .into_iter()
            .zip(results)
            .map(|((key, rule, value), passed)| ((key, rule), (value, passed)))
            .collect();
        AsyncOutcomes(outcomes)
    }
}

impl fmt::Debug for PendingChecks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.checks.iter().map(|c| (&c.key, &c.rule)))
            .finish()
    }
}

/// Resolved async rule results, keyed by field key and rule name
#[derive(Debug, Clone, Default)]
pub struct AsyncOutcomes(HashMap<(String, String), (FieldValue, bool)>);

impl AsyncOutcomes {
    /// Result for `rule` on `key`, provided it was computed for `value`.
    ///
    /// A field edited while its check was in flight gets `None`.
    pub fn get(&self, key: &str, rule: &str, value: &FieldValue) -> Option<bool> {
        self.0
            .get(&(key.to_string(), rule.to_string()))
            .filter(|(checked, _)| checked == value)
            .map(|(_, passed)| *passed)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;
    use futures::FutureExt;

    #[test]
    fn test_resolve_keeps_value_it_ran_for() {
        let mut pending = PendingChecks::default();
        pending.push("user", "available", FieldValue::from("admin"), async { false }.boxed_local());
        pending.push("email", "unique", FieldValue::from("a@b.co"), async { true }.boxed_local());
        assert!(pending.contains("user", "available"));
        assert_eq!(pending.len(), 2);

        let outcomes = block_on(pending.resolve());

        assert_eq!(outcomes.get("user", "available", &FieldValue::from("admin")), Some(false));
        assert_eq!(outcomes.get("email", "unique", &FieldValue::from("a@b.co")), Some(true));
        // Edited since the check started
        assert_eq!(outcomes.get("user", "available", &FieldValue::from("ada")), None);
        assert_eq!(outcomes.get("user", "other", &FieldValue::from("admin")), None);
    }
}
