//! Small structural validator over `serde_json::Value`.
//!
//! Blueprint files and save requests arrive as loosely typed documents
//! (YAML or JSON). Each schema is written as plain code against the helpers
//! here, which coerce scalars the way the UI expects and collect *every*
//! field error with its dotted path instead of stopping at the first one.

use serde_json::{Map, Value};

use crate::error::{FieldError, Result, SwmError};

/// Accumulates field errors while a document is walked.
#[derive(Debug, Default)]
pub struct Validator {
    errors: Vec<FieldError>,
}

impl Validator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an error at `path`.
    pub fn error(&mut self, path: &str, message: impl Into<String>) {
        self.errors.push(FieldError::new(path, message));
    }

    /// Number of errors collected so far.
    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    /// Returns `value` if nothing was reported, otherwise a validation error
    /// carrying every collected field error.
    pub fn finish<T>(self, context: impl Into<String>, value: Option<T>) -> Result<T> {
        match value {
            Some(v) if self.errors.is_empty() => Ok(v),
            _ => {
                let mut errors = self.errors;
                if errors.is_empty() {
                    errors.push(FieldError::new("", "invalid document"));
                }
                Err(SwmError::validation(context, errors))
            }
        }
    }

    /// Requires `value` to be a mapping.
    pub fn object<'a>(&mut self, value: &'a Value, path: &str) -> Option<&'a Map<String, Value>> {
        if let Value::Object(map) = value {
            Some(map)
        } else {
            self.error(path, "expected a dictionary");
            None
        }
    }

    /// Rejects keys of `map` that are not listed in `allowed`.
    pub fn reject_extra(&mut self, map: &Map<String, Value>, allowed: &[&str], path: &str) {
        for key in map.keys() {
            if !allowed.contains(&key.as_str()) {
                self.error(&join(path, key), "extra keys not allowed");
            }
        }
    }

    /// Required string field; numbers and booleans are coerced.
    pub fn required_string(
        &mut self,
        map: &Map<String, Value>,
        key: &str,
        path: &str,
    ) -> Option<String> {
        let field = join(path, key);
        match map.get(key) {
            None => {
                self.error(&field, "required key not provided");
                None
            }
            Some(value) => self.string_value(value, &field),
        }
    }

    /// Optional string field; absent and `null` both yield `None`.
    pub fn optional_string(
        &mut self,
        map: &Map<String, Value>,
        key: &str,
        path: &str,
    ) -> Option<String> {
        match map.get(key) {
            None | Some(Value::Null) => None,
            Some(value) => self.string_value(value, &join(path, key)),
        }
    }

    fn string_value(&mut self, value: &Value, path: &str) -> Option<String> {
        let coerced = coerce_string(value);
        if coerced.is_none() {
            self.error(path, "expected str");
        }
        coerced
    }

    /// Optional non-negative integer. Fractional numbers are truncated and
    /// numeric strings are accepted.
    pub fn optional_uint(&mut self, map: &Map<String, Value>, key: &str, path: &str) -> Option<u32> {
        let value = map.get(key)?;
        let parsed = match value {
            Value::Number(n) => match n.as_u64() {
                Some(n) => u32::try_from(n).ok(),
                None => n.as_f64().and_then(truncate_uint),
            },
            Value::String(s) => {
                let s = s.trim();
                s.parse::<u32>()
                    .ok()
                    .or_else(|| s.parse::<f64>().ok().and_then(truncate_uint))
            }
            _ => None,
        };
        if parsed.is_none() {
            self.error(&join(path, key), "expected a non-negative integer");
        }
        parsed
    }

    /// Strict boolean field with a default for absent keys.
    pub fn bool_or(&mut self, map: &Map<String, Value>, key: &str, path: &str, default: bool) -> bool {
        match map.get(key) {
            None => default,
            Some(Value::Bool(b)) => *b,
            Some(_) => {
                self.error(&join(path, key), "expected bool");
                default
            }
        }
    }

    /// Required strict boolean field.
    pub fn required_bool(&mut self, map: &Map<String, Value>, key: &str, path: &str) -> Option<bool> {
        let field = join(path, key);
        match map.get(key) {
            Some(Value::Bool(b)) => Some(*b),
            Some(_) => {
                self.error(&field, "expected bool");
                None
            }
            None => {
                self.error(&field, "required key not provided");
                None
            }
        }
    }

    /// String field restricted to `choices`, with a default for absent keys.
    pub fn one_of(
        &mut self,
        map: &Map<String, Value>,
        key: &str,
        path: &str,
        choices: &[&str],
        default: &str,
    ) -> Option<String> {
        let Some(value) = map.get(key) else {
            return Some(default.to_string());
        };
        let field = join(path, key);
        match value.as_str() {
            Some(s) if choices.contains(&s) => Some(s.to_string()),
            _ => {
                self.error(&field, format!("value must be one of {}", choices.join(", ")));
                None
            }
        }
    }

    /// Required list field (see [`ensure_list`]).
    pub fn required_list<'a>(
        &mut self,
        map: &'a Map<String, Value>,
        key: &str,
        path: &str,
    ) -> Option<Vec<&'a Value>> {
        if let Some(value) = map.get(key) {
            Some(ensure_list(value))
        } else {
            self.error(&join(path, key), "required key not provided");
            None
        }
    }

    /// Optional list field; absent yields an empty list.
    pub fn optional_list<'a>(&mut self, map: &'a Map<String, Value>, key: &str) -> Vec<&'a Value> {
        map.get(key).map(ensure_list).unwrap_or_default()
    }
}

fn truncate_uint(n: f64) -> Option<u32> {
    let n = n.trunc();
    if n.is_finite() && (0.0..=f64::from(u32::MAX)).contains(&n) {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        Some(n as u32)
    } else {
        None
    }
}

/// Folds the field errors of a nested validation failure into `v`, with
/// their paths prefixed by `prefix`. Other errors are recorded at `prefix`.
pub fn absorb(v: &mut Validator, prefix: &str, error: SwmError) {
    match error {
        SwmError::Validation { errors, .. } => {
            for field in errors {
                let path = if field.path.is_empty() {
                    prefix.to_string()
                } else {
                    join(prefix, &field.path)
                };
                v.error(&path, field.message);
            }
        }
        other => v.error(prefix, other.to_string()),
    }
}

/// Joins a parent path and a key or index with a dot.
pub fn join(path: &str, key: impl std::fmt::Display) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{path}.{key}")
    }
}

/// Coerces scalar JSON values to a string. Lists, mappings and `null` fail.
pub fn coerce_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Treats `null` as empty, a list as itself, and anything else as a
/// single-element list.
pub fn ensure_list(value: &Value) -> Vec<&Value> {
    match value {
        Value::Null => Vec::new(),
        Value::Array(items) => items.iter().collect(),
        other => vec![other],
    }
}
