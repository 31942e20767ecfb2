//! Response normalisation and structural validation.
//!
//! The backend speaks snake_case JSON, but some deployments proxy through
//! gateways that re-case bodies to camelCase. Every body is first normalised to
//! snake_case keys and then checked against a fixed JSON schema, so a shape
//! mismatch is a hard error instead of a half-filled struct.

use jsonschema::JSONSchema;
use once_cell::sync::Lazy;
use serde_json::{json, Map, Value};

use crate::errors::ApiError;
use crate::models::NotificationType;

/// Keys whose values are opaque to us; their contents are never re-cased.
const OPAQUE_KEYS: &[&str] = &["metadata"];

fn notification_schema() -> Value {
    let types: Vec<&str> = NotificationType::ALL.iter().map(|t| t.as_str()).collect();
    json!({
        "type": "object",
        "required": ["id", "user_id", "content", "notification_type", "read", "created_at"],
        "properties": {
            "id": { "type": "string", "minLength": 1 },
            "user_id": { "type": "string" },
            "content": { "type": "string" },
            "notification_type": { "enum": types },
            "metadata": { "type": ["object", "null"] },
            "read": { "type": "boolean" },
            "read_at": { "type": ["string", "null"] },
            "created_at": { "type": "string" },
            "updated_at": { "type": ["string", "null"] }
        }
    })
}

fn page_schema() -> Value {
    json!({
        "type": "object",
        "required": ["page", "page_size", "total", "items"],
        "properties": {
            "page": { "type": "integer", "minimum": 1 },
            "page_size": { "type": "integer", "minimum": 0 },
            "total": { "type": "integer", "minimum": 0 },
            "items": { "type": "array", "items": notification_schema() }
        }
    })
}

static NOTIFICATION: Lazy<JSONSchema> = Lazy::new(|| {
    JSONSchema::compile(&notification_schema()).expect("notification schema is valid")
});

static PAGE: Lazy<JSONSchema> =
    Lazy::new(|| JSONSchema::compile(&page_schema()).expect("page schema is valid"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    Notification,
    Page,
}

impl Shape {
    fn schema(&self) -> &'static JSONSchema {
        match self {
            Shape::Notification => &NOTIFICATION,
            Shape::Page => &PAGE,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Shape::Notification => "notification",
            Shape::Page => "notification page",
        }
    }
}

/// Normalise keys and validate `body` as `shape`. Returns the normalised value.
pub fn validate(shape: Shape, body: Value) -> Result<Value, ApiError> {
    let body = normalize_keys(body);
    let errors: Vec<String> = match shape.schema().validate(&body) {
        Ok(()) => Vec::new(),
        Err(errors) => errors
            .map(|e| {
                let path = e.instance_path.to_string();
                if path.is_empty() {
                    e.to_string()
                } else {
                    format!("{}: {}", path, e)
                }
            })
            .collect(),
    };
    if errors.is_empty() {
        return Ok(body);
    }
    Err(ApiError::Schema(format!("{}: {}", shape.name(), errors.join("; "))))
}

/// Recursively re-case object keys to snake_case, leaving opaque values untouched.
pub fn normalize_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut out = Map::with_capacity(map.len());
            for (key, val) in map {
                let key = to_snake_case(&key);
                let val = if OPAQUE_KEYS.contains(&key.as_str()) {
                    val
                } else {
                    normalize_keys(val)
                };
                out.insert(key, val);
            }
            Value::Object(out)
        }
        Value::Array(items) => Value::Array(items.into_iter().map(normalize_keys).collect()),
        other => other,
    }
}

fn to_snake_case(key: &str) -> String {
    let mut out = String::with_capacity(key.len() + 4);
    let mut prev_lower = false;
    for ch in key.chars() {
        if ch.is_ascii_uppercase() {
            if prev_lower {
                out.push('_');
            }
            out.push(ch.to_ascii_lowercase());
            prev_lower = false;
        } else {
            out.push(ch);
            prev_lower = ch.is_ascii_lowercase() || ch.is_ascii_digit();
        }
    }
    out
}
