//! Sampled values and the typed context conditional rules are evaluated against.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A single value drawn from a distribution.
///
/// Numeric families produce `Float` (or `Int` when integer sampling is
/// requested); categorical families produce `Text`; explicit value lists
/// may produce any variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SampleValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

/// Named values visible to conditional rules (e.g. `severity`).
pub type SampleContext = BTreeMap<String, SampleValue>;

impl SampleValue {
    /// Returns the numeric value, if this is a number.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            SampleValue::Int(v) => Some(*v as f64),
            SampleValue::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the string value, if this is text.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            SampleValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Truthiness used by bare operands in condition expressions.
    pub fn is_truthy(&self) -> bool {
        match self {
            SampleValue::Bool(b) => *b,
            SampleValue::Int(v) => *v != 0,
            SampleValue::Float(v) => *v != 0.0,
            SampleValue::Text(s) => !s.is_empty(),
        }
    }

    /// Returns true for `Int` and `Float`.
    pub fn is_numeric(&self) -> bool {
        matches!(self, SampleValue::Int(_) | SampleValue::Float(_))
    }
}

impl fmt::Display for SampleValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SampleValue::Bool(b) => write!(f, "{}", b),
            SampleValue::Int(v) => write!(f, "{}", v),
            SampleValue::Float(v) => write!(f, "{}", v),
            SampleValue::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<f64> for SampleValue {
    fn from(v: f64) -> Self {
        SampleValue::Float(v)
    }
}

impl From<i64> for SampleValue {
    fn from(v: i64) -> Self {
        SampleValue::Int(v)
    }
}

impl From<bool> for SampleValue {
    fn from(v: bool) -> Self {
        SampleValue::Bool(v)
    }
}

impl From<&str> for SampleValue {
    fn from(v: &str) -> Self {
        SampleValue::Text(v.to_string())
    }
}

impl From<String> for SampleValue {
    fn from(v: String) -> Self {
        SampleValue::Text(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_untagged_decoding() {
        let values: Vec<SampleValue> = serde_json::from_str(r#"[true, 3, 2.5, "severe"]"#).unwrap();
        assert_eq!(
            values,
            vec![
                SampleValue::Bool(true),
                SampleValue::Int(3),
                SampleValue::Float(2.5),
                SampleValue::Text("severe".into()),
            ]
        );
    }

    #[test]
    fn test_truthiness() {
        assert!(SampleValue::Int(1).is_truthy());
        assert!(!SampleValue::Float(0.0).is_truthy());
        assert!(!SampleValue::Text(String::new()).is_truthy());
        assert!(SampleValue::from("x").is_truthy());
    }
}
