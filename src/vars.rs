//! Named variable bindings threaded through a pipeline run.
//!
//! Each step reads its inputs through the [`VariableStore`] and writes its
//! processed results back into it, making earlier answers available to
//! later prompts by name.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A value bound to a variable name.
///
/// Most bindings are plain text, but a list-extracting step binds the
/// ordered items it found. A list binding used as a step input becomes a
/// branch set, so one listed answer can fan a later prompt out into one
/// message per item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// A single text value.
    Text(String),
    /// An ordered list of text values.
    List(Vec<String>),
}

impl Value {
    /// Flatten this value into individual strings, appending them to `out`.
    pub(crate) fn flatten_into(&self, out: &mut Vec<String>) {
        match self {
            Value::Text(s) => out.push(s.clone()),
            Value::List(items) => out.extend(items.iter().cloned()),
        }
    }

    /// View this value as a single string, if it is one.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            Value::List(_) => None,
        }
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<Vec<String>> for Value {
    fn from(items: Vec<String>) -> Self {
        Value::List(items)
    }
}

/// Mapping from variable name to bound value for one pipeline run.
///
/// Lookups are "variable-name or literal passthrough": a string that does
/// not name a binding is used verbatim as literal prompt text, never an
/// error. Later steps may overwrite earlier bindings.
///
/// # Example
///
/// ```rust
/// use promptgen::{Value, VariableStore};
///
/// let mut vars = VariableStore::seeded("How do I make coffee?");
/// assert_eq!(
///     vars.resolve("prompt"),
///     Value::Text("How do I make coffee?".to_string())
/// );
/// // Unbound names pass through as literals.
/// assert_eq!(vars.resolve("Answer:"), Value::Text("Answer:".to_string()));
///
/// vars.bind("ideas", Value::List(vec!["one".into(), "two".into()]));
/// assert!(matches!(vars.resolve("ideas"), Value::List(_)));
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VariableStore {
    bindings: HashMap<String, Value>,
}

impl VariableStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store seeded with the conventional `prompt` binding.
    #[must_use]
    pub fn seeded(prompt: impl Into<String>) -> Self {
        let mut store = Self::new();
        store.bind("prompt", Value::Text(prompt.into()));
        store
    }

    /// Bind `name` to `value`, replacing any previous binding.
    pub fn bind(&mut self, name: impl Into<String>, value: Value) {
        self.bindings.insert(name.into(), value);
    }

    /// Look up a binding by name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.bindings.get(name)
    }

    /// Resolve a string to its binding, or pass it through as a literal.
    #[must_use]
    pub fn resolve(&self, text: &str) -> Value {
        self.bindings
            .get(text)
            .cloned()
            .unwrap_or_else(|| Value::Text(text.to_string()))
    }

    /// Number of bindings currently held.
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Whether the store holds no bindings.
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}
