//! Lenient field readers for untrusted JSON records.
//!
//! Every reader returns a value of the expected type; wrong types and
//! missing keys fall back to the caller's default.

use serde_json::{Map, Value};

pub(crate) struct Fields<'a> {
    map: &'a Map<String, Value>,
}

impl<'a> Fields<'a> {
    pub(crate) fn new(map: &'a Map<String, Value>) -> Self {
        Self { map }
    }

    pub(crate) fn raw(&self, key: &str) -> Option<&'a Value> {
        self.map.get(key).filter(|value| !value.is_null())
    }

    /// Strings as-is; numbers and booleans are stringified.
    pub(crate) fn opt_string(&self, key: &str) -> Option<String> {
        match self.raw(key)? {
            Value::String(value) => Some(value.clone()),
            Value::Number(value) => Some(value.to_string()),
            Value::Bool(value) => Some(value.to_string()),
            _ => None,
        }
    }

    pub(crate) fn string(&self, key: &str) -> String {
        self.opt_string(key).unwrap_or_default()
    }

    /// Non-blank string, trimmed.
    pub(crate) fn id(&self, key: &str) -> Option<String> {
        self.opt_string(key)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    }

    pub(crate) fn opt_f64(&self, key: &str) -> Option<f64> {
        let value = match self.raw(key)? {
            Value::Number(number) => number.as_f64()?,
            Value::String(text) => text.trim().parse::<f64>().ok()?,
            _ => return None,
        };
        value.is_finite().then_some(value)
    }

    pub(crate) fn f64_or(&self, key: &str, default: f64) -> f64 {
        self.opt_f64(key).unwrap_or(default)
    }

    pub(crate) fn i32_or(&self, key: &str, default: i32) -> i32 {
        self.opt_f64(key)
            .map(|value| value.trunc().clamp(f64::from(i32::MIN), f64::from(i32::MAX)) as i32)
            .unwrap_or(default)
    }

    /// Non-negative whole numbers; negatives are treated as absent.
    pub(crate) fn opt_u32(&self, key: &str) -> Option<u32> {
        let value = self.opt_f64(key)?;
        (value >= 0.0).then(|| value.trunc().min(f64::from(u32::MAX)) as u32)
    }

    pub(crate) fn bool_or(&self, key: &str, default: bool) -> bool {
        match self.raw(key) {
            Some(Value::Bool(value)) => *value,
            Some(Value::String(text)) => match text.trim().to_ascii_lowercase().as_str() {
                "true" | "yes" | "1" => true,
                "false" | "no" | "0" => false,
                _ => default,
            },
            Some(Value::Number(number)) => number.as_f64().map_or(default, |n| n != 0.0),
            _ => default,
        }
    }

    /// String arrays; a bare string becomes a one-element list.
    pub(crate) fn strings(&self, key: &str) -> Vec<String> {
        match self.raw(key) {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|item| match item {
                    Value::String(value) => Some(value.clone()),
                    Value::Number(value) => Some(value.to_string()),
                    _ => None,
                })
                .collect(),
            Some(Value::String(value)) if !value.trim().is_empty() => vec![value.clone()],
            _ => Vec::new(),
        }
    }

    pub(crate) fn object(&self, key: &str) -> Option<&'a Map<String, Value>> {
        self.raw(key)?.as_object()
    }

    pub(crate) fn array(&self, key: &str) -> &'a [Value] {
        self.raw(key)
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}
