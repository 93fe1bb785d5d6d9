//! Purpose: Turn single lines of delimited text into ordered field records.
//! Exports: `Parser`, `DelimitedParser`, `Record`, `FieldValue`, delimiter defaults.
//! Role: Collaborator typically driven by a `Sequence` of lines; owns no resources.
//! Invariants: Field names are fixed once set (explicitly, from a header, or inferred).
//! Invariants: Parse failures are logged with the offending input and returned, never dropped.
mod delimited;
mod utils;

use serde::Serialize;
use serde::ser::{SerializeMap, Serializer};

use crate::core::error::Error;

pub use delimited::{DEFAULT_DELIMITER, DEFAULT_LIST_DELIMITER, DelimitedParser};
pub use utils::{generate_field_names, validate_field_names};

pub trait Parser {
    fn parse(&mut self, input: &str) -> Result<Record, Error>;

    /// `None` until names are set or inferred from the first parsed line.
    fn field_names(&self) -> Option<&[String]>;

    fn set_field_names(&mut self, names: Vec<String>) -> Result<(), Error>;
}

/// One parsed field: absent/empty text, a single value, or a list.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Null,
    Scalar(String),
    List(Vec<Option<String>>),
}

impl FieldValue {
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Scalar(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Option<String>]> {
        match self {
            FieldValue::List(values) => Some(values),
            _ => None,
        }
    }
}

/// Field name to value mapping in field order.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Record {
    fields: Vec<(String, FieldValue)>,
}

impl Record {
    pub(crate) fn from_fields(fields: Vec<(String, FieldValue)>) -> Self {
        Self { fields }
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields
            .iter()
            .map(|(name, value)| (name.as_str(), value))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }
}

impl Serialize for Record {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::{FieldValue, Record};

    #[test]
    fn record_serializes_in_field_order() {
        let record = Record::from_fields(vec![
            ("z".to_string(), FieldValue::Scalar("1".to_string())),
            ("a".to_string(), FieldValue::Null),
            (
                "m".to_string(),
                FieldValue::List(vec![Some("x".to_string()), None]),
            ),
        ]);
        let json = serde_json::to_string(&record).expect("json");
        assert_eq!(json, r#"{"z":"1","a":null,"m":["x",null]}"#);
    }

    #[test]
    fn record_lookup_by_name() {
        let value = FieldValue::Scalar("1".to_string());
        let record = Record::from_fields(vec![("a".to_string(), value)]);
        assert_eq!(record.get("a").and_then(FieldValue::as_str), Some("1"));
        assert!(!record.contains("b"));
        assert_eq!(record.names().collect::<Vec<_>>(), vec!["a"]);
    }

    #[test]
    fn record_iterates_pairs_in_field_order() {
        let record = Record::from_fields(vec![
            ("b".to_string(), FieldValue::Null),
            ("a".to_string(), FieldValue::Scalar("x".to_string())),
        ]);
        let pairs: Vec<(&str, Option<&str>)> = record
            .iter()
            .map(|(name, value)| (name, value.as_str()))
            .collect();
        assert_eq!(pairs, vec![("b", None), ("a", Some("x"))]);
        assert!(Record::default().is_empty());
    }
}
