//! Declarative response shapes.
//!
//! A [`Shape`] describes what the AI must return. It renders to a JSON
//! Schema fragment for prompt embedding and validates parsed responses,
//! producing a [`Violation`] per mismatch rather than failing on the first.

use serde_json::{json, Value};
use std::fmt;

// ---------------------------------------------------------------------------
// Shape / Field
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub enum Shape {
    String,
    Integer,
    Boolean,
    /// Exactly this string value.
    Literal(String),
    /// One of a closed set of string values.
    Enum(Vec<String>),
    Array(Box<Shape>),
    Object(Vec<Field>),
}

#[derive(Debug, Clone)]
pub struct Field {
    pub name: String,
    pub shape: Shape,
    pub required: bool,
}

impl Field {
    pub fn required(name: impl Into<String>, shape: Shape) -> Self {
        Self {
            name: name.into(),
            shape,
            required: true,
        }
    }

    pub fn optional(name: impl Into<String>, shape: Shape) -> Self {
        Self {
            name: name.into(),
            shape,
            required: false,
        }
    }
}

impl Shape {
    pub fn array(inner: Shape) -> Self {
        Shape::Array(Box::new(inner))
    }

    pub fn literal(value: impl Into<String>) -> Self {
        Shape::Literal(value.into())
    }

    /// Render as a JSON Schema fragment for embedding in prompts.
    pub fn to_schema(&self) -> Value {
        match self {
            Shape::String => json!({ "type": "string" }),
            Shape::Integer => json!({ "type": "integer" }),
            Shape::Boolean => json!({ "type": "boolean" }),
            Shape::Literal(v) => json!({ "const": v }),
            Shape::Enum(vs) => json!({ "enum": vs }),
            Shape::Array(inner) => json!({ "type": "array", "items": inner.to_schema() }),
            Shape::Object(fields) => {
                let mut properties = serde_json::Map::new();
                let mut required = Vec::new();
                for field in fields {
                    properties.insert(field.name.clone(), field.shape.to_schema());
                    if field.required {
                        required.push(Value::String(field.name.clone()));
                    }
                }
                json!({ "type": "object", "properties": properties, "required": required })
            }
        }
    }

    /// Validate `value` against this shape. Empty result means conforming.
    pub fn validate(&self, value: &Value) -> Vec<Violation> {
        let mut violations = Vec::new();
        self.check(value, "root", &mut violations);
        violations
    }

    fn check(&self, value: &Value, path: &str, out: &mut Vec<Violation>) {
        match self {
            Shape::String => {
                if !value.is_string() {
                    out.push(Violation::new(path, format!("expected string, got {}", kind(value))));
                }
            }
            Shape::Integer => {
                if !value.is_i64() && !value.is_u64() {
                    out.push(Violation::new(path, format!("expected integer, got {}", kind(value))));
                }
            }
            Shape::Boolean => {
                if !value.is_boolean() {
                    out.push(Violation::new(path, format!("expected boolean, got {}", kind(value))));
                }
            }
            Shape::Literal(expected) => {
                if value.as_str() != Some(expected.as_str()) {
                    out.push(Violation::new(path, format!("expected literal \"{expected}\"")));
                }
            }
            Shape::Enum(allowed) => match value.as_str() {
                Some(s) if allowed.iter().any(|a| a == s) => {}
                _ => out.push(Violation::new(
                    path,
                    format!("expected one of [{}]", allowed.join(", ")),
                )),
            },
            Shape::Array(inner) => match value.as_array() {
                Some(items) => {
                    for (i, item) in items.iter().enumerate() {
                        inner.check(item, &format!("{path}[{i}]"), out);
                    }
                }
                None => out.push(Violation::new(path, format!("expected array, got {}", kind(value)))),
            },
            Shape::Object(fields) => match value.as_object() {
                Some(map) => {
                    for field in fields {
                        let child_path = format!("{path}.{}", field.name);
                        match map.get(&field.name) {
                            Some(v) => field.shape.check(v, &child_path, out),
                            None if field.required => {
                                out.push(Violation::new(child_path, "missing required field"))
                            }
                            None => {}
                        }
                    }
                }
                None => out.push(Violation::new(path, format!("expected object, got {}", kind(value)))),
            },
        }
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// ---------------------------------------------------------------------------
// Violation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub path: String,
    pub message: String,
}

impl Violation {
    fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
