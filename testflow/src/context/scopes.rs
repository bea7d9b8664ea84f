//! Test-scoped and stage-scoped variable stores.

use super::path;
use super::Variables;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Variables visible to every stage of one running test.
///
/// Created fresh for each test execution and owned by it; mutated by the
/// save step of each stage and never shared across tests.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TestContext {
    data: Variables,
}

impl TestContext {
    /// Creates a new empty test context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a test context from existing data.
    #[must_use]
    pub fn from_data(data: Variables) -> Self {
        Self { data }
    }

    /// Gets a top-level value.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    /// Looks up a dotted path.
    #[must_use]
    pub fn lookup(&self, path: &str) -> Option<&Value> {
        path::lookup(&self.data, path)
    }

    /// Checks if a top-level key exists.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    /// Sets a top-level value, replacing any previous one.
    pub fn set(&mut self, key: impl Into<String>, value: Value) {
        self.data.insert(key.into(), value);
    }

    /// Saves a value at a dotted path.
    ///
    /// `a.b.c` creates intermediate objects as needed and merges into an
    /// existing object at `a` instead of replacing it.
    pub fn save(&mut self, path: &str, value: Value) {
        path::write(&mut self.data, path, value);
    }

    /// Removes a top-level value.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.data.remove(key)
    }

    /// Returns a copy of all data.
    #[must_use]
    pub fn to_dict(&self) -> Variables {
        self.data.clone()
    }

    /// Borrows the underlying variables.
    #[must_use]
    pub fn as_variables(&self) -> &Variables {
        &self.data
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if the context is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns all top-level keys.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        self.data.keys().cloned().collect()
    }
}

/// Variables local to one stage invocation.
///
/// Each foreach iteration gets its own derived instance; the context is
/// dropped when the invocation returns.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StageContext {
    data: Variables,
}

impl StageContext {
    /// Creates a new empty stage context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a stage context from existing data.
    #[must_use]
    pub fn from_data(data: Variables) -> Self {
        Self { data }
    }

    /// Derives a child context: the parent's entries overlaid with `entries`.
    #[must_use]
    pub fn derive(&self, entries: impl IntoIterator<Item = (String, Value)>) -> Self {
        let mut data = self.data.clone();
        data.extend(entries);
        Self { data }
    }

    /// Gets a top-level value.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    /// Looks up a dotted path.
    #[must_use]
    pub fn lookup(&self, path: &str) -> Option<&Value> {
        path::lookup(&self.data, path)
    }

    /// Checks if a top-level key exists.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    /// Sets a top-level value, replacing any previous one.
    pub fn set(&mut self, key: impl Into<String>, value: Value) {
        self.data.insert(key.into(), value);
    }

    /// Returns a copy of all data.
    #[must_use]
    pub fn to_dict(&self) -> Variables {
        self.data.clone()
    }

    /// Borrows the underlying variables.
    #[must_use]
    pub fn as_variables(&self) -> &Variables {
        &self.data
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if the context is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_test_context_set_and_get() {
        let mut ctx = TestContext::new();
        ctx.set("key", json!("value"));

        assert_eq!(ctx.get("key"), Some(&json!("value")));
        assert!(ctx.contains_key("key"));
        assert!(!ctx.contains_key("other"));
        assert_eq!(ctx.len(), 1);
    }

    #[test]
    fn test_test_context_save_merges() {
        let mut ctx = TestContext::new();
        ctx.save("a.b", json!(1));
        ctx.save("a.c", json!(2));

        assert_eq!(ctx.get("a"), Some(&json!({"b": 1, "c": 2})));
        assert_eq!(ctx.lookup("a.c"), Some(&json!(2)));
    }

    #[test]
    fn test_test_context_remove() {
        let mut ctx = TestContext::new();
        ctx.set("gone", json!(true));

        assert_eq!(ctx.remove("gone"), Some(json!(true)));
        assert!(ctx.is_empty());
    }

    #[test]
    fn test_stage_context_derive_inherits_parent() {
        let mut parent = StageContext::new();
        parent.set("outer", json!("o"));
        parent.set("shadowed", json!(1));

        let child = parent.derive([
            ("shadowed".to_string(), json!(2)),
            ("x".to_string(), json!(10)),
        ]);

        assert_eq!(child.get("outer"), Some(&json!("o")));
        assert_eq!(child.get("shadowed"), Some(&json!(2)));
        assert_eq!(child.get("x"), Some(&json!(10)));
        // the parent is untouched
        assert_eq!(parent.get("shadowed"), Some(&json!(1)));
        assert!(!parent.contains_key("x"));
    }

    #[test]
    fn test_context_serializes_transparently() {
        let mut ctx = TestContext::new();
        ctx.set("a", json!(1));

        let json = serde_json::to_string(&ctx).unwrap();
        assert_eq!(json, r#"{"a":1}"#);

        let back: TestContext = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ctx);
    }
}
