use std::fmt;

use serde::{Deserialize, Serialize};

/// A single-select filter value as the list endpoints accept it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl FilterValue {
    /// Interpret free-form input: `true`/`false`, integers and floats keep
    /// their type, anything else is text.
    pub fn parse(input: &str) -> Self {
        let trimmed = input.trim();
        match trimmed {
            "true" => return FilterValue::Bool(true),
            "false" => return FilterValue::Bool(false),
            _ => {}
        }
        if let Ok(n) = trimmed.parse::<i64>() {
            return FilterValue::Int(n);
        }
        if let Ok(f) = trimmed.parse::<f64>() {
            if f.is_finite() {
                return FilterValue::Float(f);
            }
        }
        FilterValue::Text(trimmed.to_string())
    }

    /// An unset value means "no constraint" and is never sent.
    pub fn is_unset(&self) -> bool {
        match self {
            FilterValue::Text(s) => s.trim().is_empty(),
            FilterValue::Float(f) => !f.is_finite(),
            FilterValue::Bool(_) | FilterValue::Int(_) => false,
        }
    }

    pub fn to_param(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for FilterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterValue::Bool(b) => write!(f, "{b}"),
            FilterValue::Int(n) => write!(f, "{n}"),
            FilterValue::Float(x) => write!(f, "{x}"),
            FilterValue::Text(s) => f.write_str(s.trim()),
        }
    }
}

impl From<&str> for FilterValue {
    fn from(s: &str) -> Self {
        FilterValue::Text(s.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(s: String) -> Self {
        FilterValue::Text(s)
    }
}

impl From<bool> for FilterValue {
    fn from(b: bool) -> Self {
        FilterValue::Bool(b)
    }
}

impl From<i64> for FilterValue {
    fn from(n: i64) -> Self {
        FilterValue::Int(n)
    }
}

impl From<i32> for FilterValue {
    fn from(n: i32) -> Self {
        FilterValue::Int(n.into())
    }
}

impl From<f64> for FilterValue {
    fn from(x: f64) -> Self {
        FilterValue::Float(x)
    }
}
