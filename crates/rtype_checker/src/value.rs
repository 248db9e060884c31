//! Literal values checked against declared types.

use indexmap::IndexMap;
use std::fmt;

/// A concrete literal.
///
/// Arrays double as tuple literals: `[109, "Ballycrochan Road"]` is
/// checked position by position against a tuple type and element by
/// element against an array type.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    String(String),
    Number(f64),
    Array(Vec<Value>),
    Record(IndexMap<String, Value>),
}

impl Value {
    pub fn record<K: Into<String>>(fields: impl IntoIterator<Item = (K, Value)>) -> Self {
        Value::Record(fields.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    pub fn array(items: impl IntoIterator<Item = Value>) -> Self {
        Value::Array(items.into_iter().collect())
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(f64::from(n))
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => write!(f, "{:?}", s),
            Value::Number(n) => write!(f, "{}", n),
            Value::Array(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str("]")
            }
            Value::Record(fields) => {
                if fields.is_empty() {
                    return f.write_str("{}");
                }
                f.write_str("{ ")?;
                for (i, (name, value)) in fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}: {}", name, value)?;
                }
                f.write_str(" }")
            }
        }
    }
}

/// Render the type a value would be reported as in a mismatch.
///
/// A top-level string keeps its literal type (`"abc"`); everything nested
/// is widened (`number`, `string`), matching how an initializer's type is
/// inferred for a mutable binding.
pub(crate) fn describe(value: &Value) -> String {
    match value {
        Value::String(s) => format!("{:?}", s),
        _ => {
            let mut out = String::new();
            describe_widened(value, &mut out);
            out
        }
    }
}

fn describe_widened(value: &Value, out: &mut String) {
    match value {
        Value::String(_) => out.push_str("string"),
        Value::Number(_) => out.push_str("number"),
        Value::Array(items) => {
            let mut elements: Vec<String> = Vec::new();
            for item in items {
                let mut s = String::new();
                describe_widened(item, &mut s);
                if !elements.contains(&s) {
                    elements.push(s);
                }
            }
            match elements.len() {
                0 => out.push_str("any[]"),
                1 => {
                    out.push_str(&elements[0]);
                    out.push_str("[]");
                }
                _ => {
                    out.push('(');
                    out.push_str(&elements.join(" | "));
                    out.push_str(")[]");
                }
            }
        }
        Value::Record(fields) => {
            if fields.is_empty() {
                out.push_str("{}");
                return;
            }
            out.push_str("{ ");
            for (i, (name, value)) in fields.iter().enumerate() {
                if i > 0 {
                    out.push_str("; ");
                }
                out.push_str(name);
                out.push_str(": ");
                describe_widened(value, out);
            }
            out.push_str(" }");
        }
    }
}
