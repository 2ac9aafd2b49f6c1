//! Slot values collected over a conversation

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Named values extracted from user text, keyed by slot name.
///
/// Values stay as JSON because the LLM returns arbitrary shapes (strings,
/// numbers, lists of drug names).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Slots(BTreeMap<String, Value>);

/// Whether a slot value counts as provided.
///
/// Null, blank strings, zero, `false` and empty collections are all treated
/// as missing.
pub fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.trim().is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

/// Compare two present slot values, ignoring case and surrounding
/// whitespace for strings.
pub fn same_value(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::String(a), Value::String(b)) => a.trim().eq_ignore_ascii_case(b.trim()),
        _ => a == b,
    }
}

impl Slots {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    /// The slot's value when present (see [`is_present`])
    pub fn present(&self, name: &str) -> Option<&Value> {
        self.0.get(name).filter(|v| is_present(v))
    }

    pub fn has(&self, name: &str) -> bool {
        self.present(name).is_some()
    }

    /// Present slot rendered as text; strings unquoted, other values as JSON
    pub fn text(&self, name: &str) -> Option<String> {
        self.present(name).map(|v| match v {
            Value::String(s) => s.trim().to_string(),
            other => other.to_string(),
        })
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(name.into(), value.into());
    }

    /// Shallow merge: every entry of `other` overwrites ours
    pub fn extend(&mut self, other: Slots) {
        self.0.extend(other.0);
    }

    /// Names of slots with present values, in key order
    pub fn present_names(&self) -> Vec<String> {
        self.0
            .iter()
            .filter(|(_, v)| is_present(v))
            .map(|(k, _)| k.clone())
            .collect()
    }

    /// Copy without missing values
    pub fn without_empty(&self) -> Slots {
        Slots(
            self.0
                .iter()
                .filter(|(_, v)| is_present(v))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        )
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl FromIterator<(String, Value)> for Slots {
    fn from_iter<T: IntoIterator<Item = (String, Value)>>(iter: T) -> Self {
        Slots(iter.into_iter().collect())
    }
}

impl From<serde_json::Map<String, Value>> for Slots {
    fn from(map: serde_json::Map<String, Value>) -> Self {
        map.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_presence_rules() {
        assert!(!is_present(&Value::Null));
        assert!(!is_present(&json!("")));
        assert!(!is_present(&json!("   ")));
        assert!(!is_present(&json!(0)));
        assert!(!is_present(&json!(false)));
        assert!(!is_present(&json!([])));
        assert!(is_present(&json!("Lipitor")));
        assert!(is_present(&json!(10)));
        assert!(is_present(&json!(["a"])));
    }

    #[test]
    fn test_present_names_skips_empty() {
        let mut slots = Slots::new();
        slots.insert("drug_name", "Lipitor");
        slots.insert("dosage", "");
        slots.insert("frequency", Value::Null);
        assert_eq!(slots.present_names(), vec!["drug_name".to_string()]);
        assert!(!slots.has("dosage"));
    }

    #[test]
    fn test_text_rendering() {
        let mut slots = Slots::new();
        slots.insert("drug_name", " Lipitor ");
        slots.insert("quantity", 30);
        assert_eq!(slots.text("drug_name").as_deref(), Some("Lipitor"));
        assert_eq!(slots.text("quantity").as_deref(), Some("30"));
        assert_eq!(slots.text("missing"), None);
    }

    #[test]
    fn test_same_value_ignores_case() {
        assert!(same_value(&json!("Lipitor"), &json!(" lipitor")));
        assert!(!same_value(&json!("Lipitor"), &json!("Zocor")));
        assert!(same_value(&json!(10), &json!(10)));
    }
}
