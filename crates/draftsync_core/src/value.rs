//! Dynamic field value type.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A dynamic field value.
///
/// This type represents any value a document field can hold: scalars,
/// ordered arrays (test-result rows, inspection items, observations), and
/// nested sub-records. The engine never interprets field semantics; values
/// exist only to be stored, compared, and replayed verbatim.
///
/// The untagged serde representation keeps encoded snapshots shaped like the
/// plain JSON/CBOR documents the remote store speaks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// Null value.
    Null,
    /// Boolean value.
    Bool(bool),
    /// Signed integer (full i64 range).
    Integer(i64),
    /// Floating-point number (measured readings, e.g. loop impedance).
    Number(f64),
    /// Text string (UTF-8).
    Text(String),
    /// Ordered array of values.
    ///
    /// Named array fields are replaced wholesale when a remote snapshot
    /// supersedes a local one; elements from two replicas never interleave.
    Array(Vec<FieldValue>),
    /// Nested sub-record.
    Record(BTreeMap<String, FieldValue>),
}

impl FieldValue {
    /// Returns true if this value is null.
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    /// Returns the boolean value, if this is a boolean.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the integer value, if this is an integer.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            FieldValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Returns the numeric value, widening integers.
    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Integer(i) => Some(*i as f64),
            FieldValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the text value, if this is text.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the array elements, if this is an array.
    pub fn as_array(&self) -> Option<&[FieldValue]> {
        match self {
            FieldValue::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Returns the sub-record fields, if this is a record.
    pub fn as_record(&self) -> Option<&BTreeMap<String, FieldValue>> {
        match self {
            FieldValue::Record(fields) => Some(fields),
            _ => None,
        }
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Integer(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Number(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<Vec<FieldValue>> for FieldValue {
    fn from(items: Vec<FieldValue>) -> Self {
        FieldValue::Array(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accessors_match_variants() {
        assert!(FieldValue::Null.is_null());
        assert_eq!(FieldValue::Bool(true).as_bool(), Some(true));
        assert_eq!(FieldValue::Integer(42).as_i64(), Some(42));
        assert_eq!(FieldValue::Number(0.35).as_f64(), Some(0.35));
        assert_eq!(FieldValue::from("230V").as_str(), Some("230V"));
        assert_eq!(FieldValue::Text("x".into()).as_i64(), None);
    }

    #[test]
    fn integer_widens_to_f64() {
        assert_eq!(FieldValue::Integer(3).as_f64(), Some(3.0));
    }

    #[test]
    fn json_round_trip_is_untagged() {
        let value = FieldValue::Array(vec![
            FieldValue::Record(BTreeMap::from([
                ("circuit".to_string(), FieldValue::from("ring final")),
                ("zs".to_string(), FieldValue::Number(0.8)),
            ])),
            FieldValue::from("spare"),
        ]);

        let json = serde_json::to_string(&value).unwrap();
        assert_eq!(json, r#"[{"circuit":"ring final","zs":0.8},"spare"]"#);

        let back: FieldValue = serde_json::from_str(&json).unwrap();
        assert_eq!(back, value);
    }

    #[test]
    fn whole_numbers_deserialize_as_integer() {
        let back: FieldValue = serde_json::from_str("7").unwrap();
        assert_eq!(back, FieldValue::Integer(7));
    }
}
