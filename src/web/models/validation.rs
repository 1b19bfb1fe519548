//! Per-field validation of JSON request bodies.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::services::epoch;

pub const REQUIRED: &str = "This field is required.";

/// Field name → messages, rendered as a JSON object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0.entry(field.to_string()).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    pub fn into_result<T>(self, value: T) -> Result<T, FieldErrors> {
        if self.is_empty() { Ok(value) } else { Err(self) }
    }
}

/// Wraps a JSON object and collects errors while fields are read from it.
pub struct FieldReader<'a> {
    object: &'a Map<String, Value>,
    pub errors: FieldErrors,
}

impl<'a> FieldReader<'a> {
    pub fn new(body: &'a Value) -> Result<Self, FieldErrors> {
        match body.as_object() {
            Some(object) => Ok(Self {
                object,
                errors: FieldErrors::default(),
            }),
            None => {
                let mut errors = FieldErrors::default();
                errors.add("non_field_errors", "Expected a JSON object.");
                Err(errors)
            }
        }
    }

    fn present(&self, field: &str) -> Option<&'a Value> {
        self.object.get(field)
    }

    pub fn optional_string(&mut self, field: &str) -> Option<String> {
        match self.present(field)? {
            Value::String(s) => Some(s.clone()),
            _ => {
                self.errors.add(field, "Not a valid string.");
                None
            }
        }
    }

    pub fn optional_bool(&mut self, field: &str) -> Option<bool> {
        match self.present(field)? {
            Value::Bool(b) => Some(*b),
            _ => {
                self.errors.add(field, "Must be a valid boolean.");
                None
            }
        }
    }

    pub fn required_bool(&mut self, field: &str) -> Option<bool> {
        if self.present(field).is_none() {
            self.errors.add(field, REQUIRED);
            return None;
        }
        self.optional_bool(field)
    }

    pub fn optional_epoch(&mut self, field: &str) -> Option<DateTime<Utc>> {
        match epoch::parse_epoch_value(self.present(field)?) {
            Ok(instant) => Some(instant),
            Err(e) => {
                self.errors.add(field, e.to_string());
                None
            }
        }
    }

    pub fn required_epoch(&mut self, field: &str) -> Option<DateTime<Utc>> {
        if self.present(field).is_none() {
            self.errors.add(field, REQUIRED);
            return None;
        }
        self.optional_epoch(field)
    }

    /// Reads a `{name: limit}` object with non-negative integer limits.
    pub fn required_limits(&mut self, field: &str) -> Option<Vec<(String, i32)>> {
        let Some(value) = self.present(field) else {
            self.errors.add(field, REQUIRED);
            return None;
        };
        let Some(entries) = value.as_object() else {
            self.errors.add(field, "Expected a mapping of tag name to limit.");
            return None;
        };

        let mut limits = Vec::with_capacity(entries.len());
        let mut valid = true;
        for (name, limit) in entries {
            match limit.as_u64().and_then(|l| i32::try_from(l).ok()) {
                Some(limit) => limits.push((name.clone(), limit)),
                None => {
                    self.errors.add(
                        field,
                        format!("Limit for tag '{name}' must be a non-negative integer."),
                    );
                    valid = false;
                }
            }
        }
        valid.then_some(limits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_non_object_body() {
        let errors = FieldReader::new(&json!([1, 2])).err().unwrap();
        assert_eq!(errors.get("non_field_errors"), Some(&["Expected a JSON object.".to_string()][..]));
    }

    #[test]
    fn test_limits() {
        let body = json!({ "slots": { "speaker": 3, "volunteer": -1, "usher": "2" } });
        let mut reader = FieldReader::new(&body).unwrap();
        assert_eq!(reader.required_limits("slots"), None);
        assert_eq!(reader.errors.get("slots").map(|m| m.len()), Some(2));
    }

    #[test]
    fn test_errors_serialize_as_object() {
        let mut errors = FieldErrors::default();
        errors.add("is_public", REQUIRED);
        assert_eq!(serde_json::to_value(&errors).unwrap(), json!({ "is_public": [REQUIRED] }));
    }
}
