//! Tolerant accessors over `serde_json::Value`
//!
//! Provider payloads mix string and integer ids, integer and boolean flags,
//! and occasionally numeric strings. Every accessor returns `None` instead of
//! failing so that parsing stays total.

use serde_json::{Map, Value};

pub trait ValueExt {
    /// Walk nested object keys
    fn path(&self, keys: &[&str]) -> Option<&Value>;
    fn str_at(&self, key: &str) -> Option<&str>;
    /// String or number coerced to a string id
    fn id_at(&self, key: &str) -> Option<String>;
    fn f64_at(&self, key: &str) -> Option<f64>;
    fn i64_at(&self, key: &str) -> Option<i64>;
    /// Boolean, or 0/1 integer
    fn bool_at(&self, key: &str) -> Option<bool>;
    fn array_at(&self, key: &str) -> Option<&Vec<Value>>;
    fn object_at(&self, key: &str) -> Option<&Map<String, Value>>;
    /// Array of strings, skipping non-string entries
    fn strings_at(&self, key: &str) -> Vec<String>;
    fn as_id(&self) -> Option<String>;
    fn as_lenient_f64(&self) -> Option<f64>;
}

impl ValueExt for Value {
    fn path(&self, keys: &[&str]) -> Option<&Value> {
        keys.iter().try_fold(self, |current, key| current.get(*key))
    }

    fn str_at(&self, key: &str) -> Option<&str> {
        self.get(key)?.as_str()
    }

    fn id_at(&self, key: &str) -> Option<String> {
        self.get(key)?.as_id()
    }

    fn f64_at(&self, key: &str) -> Option<f64> {
        self.get(key)?.as_lenient_f64()
    }

    fn i64_at(&self, key: &str) -> Option<i64> {
        match self.get(key)? {
            Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    fn bool_at(&self, key: &str) -> Option<bool> {
        match self.get(key)? {
            Value::Bool(b) => Some(*b),
            Value::Number(n) => n.as_i64().map(|v| v == 1),
            Value::String(s) => match s.as_str() {
                "true" | "1" => Some(true),
                "false" | "0" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }

    fn array_at(&self, key: &str) -> Option<&Vec<Value>> {
        self.get(key)?.as_array()
    }

    fn object_at(&self, key: &str) -> Option<&Map<String, Value>> {
        self.get(key)?.as_object()
    }

    fn strings_at(&self, key: &str) -> Vec<String> {
        self.array_at(key)
            .map(|items| {
                items
                    .iter()
                    .filter_map(|v| v.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn as_id(&self) -> Option<String> {
        match self {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    fn as_lenient_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}
