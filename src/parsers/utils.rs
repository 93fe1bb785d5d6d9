use std::collections::HashSet;

use crate::core::error::{Error, ErrorKind};
use crate::parsers::{FieldValue, Record};

/// Rejects field-name lists containing duplicates, naming each duplicate once.
pub fn validate_field_names(names: &[String]) -> Result<(), Error> {
    let mut seen = HashSet::with_capacity(names.len());
    let mut duplicates: Vec<&str> = Vec::new();
    for name in names {
        if !seen.insert(name.as_str()) && !duplicates.contains(&name.as_str()) {
            duplicates.push(name);
        }
    }
    if duplicates.is_empty() {
        return Ok(());
    }
    Err(Error::new(ErrorKind::Usage)
        .with_message(format!("duplicate field names: {}", duplicates.join(", ")))
        .with_hint("Field names must be unique."))
}

/// Positional names `column_0` .. `column_{count - 1}`.
pub fn generate_field_names(count: usize) -> Vec<String> {
    (0..count).map(|index| format!("column_{index}")).collect()
}

pub(crate) fn null_if_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Pairs names with values positionally, stopping at the shorter side.
pub(crate) fn zip_partial<I>(names: &[String], values: I) -> Record
where
    I: IntoIterator<Item = FieldValue>,
{
    let fields = names
        .iter()
        .cloned()
        .zip(values)
        .collect::<Vec<(String, FieldValue)>>();
    Record::from_fields(fields)
}

#[cfg(test)]
mod tests {
    use super::{generate_field_names, null_if_empty, validate_field_names, zip_partial};
    use crate::core::error::ErrorKind;
    use crate::parsers::FieldValue;

    fn names(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    #[test]
    fn unique_names_pass() {
        validate_field_names(&names(&["a", "b", ""])).expect("valid");
    }

    #[test]
    fn duplicates_are_reported_once() {
        let err = validate_field_names(&names(&["a", "b", "a", "a", "b"])).expect_err("dupes");
        assert_eq!(err.kind(), ErrorKind::Usage);
        assert_eq!(err.message(), Some("duplicate field names: a, b"));
    }

    #[test]
    fn generated_names_are_positional() {
        assert_eq!(
            generate_field_names(3),
            names(&["column_0", "column_1", "column_2"])
        );
        assert!(generate_field_names(0).is_empty());
    }

    #[test]
    fn empty_string_becomes_none() {
        assert_eq!(null_if_empty(""), None);
        assert_eq!(null_if_empty(" "), Some(" ".to_string()));
    }

    #[test]
    fn zip_stops_at_shorter_side() {
        let record = zip_partial(
            &names(&["a", "b", "c"]),
            vec![FieldValue::Null, FieldValue::Scalar("2".to_string())],
        );
        assert_eq!(record.len(), 2);
        assert!(!record.contains("c"));

        let record = zip_partial(
            &names(&["a"]),
            vec![FieldValue::Null, FieldValue::Scalar("extra".to_string())],
        );
        assert_eq!(record.len(), 1);
    }
}
