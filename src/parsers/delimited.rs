use bstr::ByteSlice;

use crate::core::error::{Error, ErrorKind};
use crate::parsers::utils::{
    generate_field_names, null_if_empty, validate_field_names, zip_partial,
};
use crate::parsers::{FieldValue, Parser, Record};

pub const DEFAULT_DELIMITER: &str = "\t";
/// Ctrl-A; splits a single field into a list value.
pub const DEFAULT_LIST_DELIMITER: &str = "\u{1}";

/// Two-level delimited text parser: the field delimiter splits a line into
/// fields, the list delimiter splits one field into a list.
#[derive(Clone, Debug)]
pub struct DelimitedParser {
    delimiter: String,
    list_delimiter: String,
    field_names: Option<Vec<String>>,
}

impl Default for DelimitedParser {
    fn default() -> Self {
        Self {
            delimiter: DEFAULT_DELIMITER.to_string(),
            list_delimiter: DEFAULT_LIST_DELIMITER.to_string(),
            field_names: None,
        }
    }
}

impl DelimitedParser {
    pub fn new(delimiter: Option<&str>, list_delimiter: Option<&str>) -> Result<Self, Error> {
        let delimiter = delimiter.unwrap_or(DEFAULT_DELIMITER);
        let list_delimiter = list_delimiter.unwrap_or(DEFAULT_LIST_DELIMITER);
        if delimiter.is_empty() || list_delimiter.is_empty() {
            return Err(Error::new(ErrorKind::Usage).with_message("delimiters must not be empty"));
        }
        if delimiter == list_delimiter {
            return Err(Error::new(ErrorKind::Usage)
                .with_message("field and list delimiters must differ")
                .with_hint("Pick a list delimiter that never appears as a field separator."));
        }
        Ok(Self {
            delimiter: delimiter.to_string(),
            list_delimiter: list_delimiter.to_string(),
            field_names: None,
        })
    }

    pub fn with_field_names<I, N>(mut self, names: I) -> Result<Self, Error>
    where
        I: IntoIterator<Item = N>,
        N: Into<String>,
    {
        self.set_field_names(names.into_iter().map(Into::into).collect())?;
        Ok(self)
    }

    pub fn with_header(mut self, header: &str) -> Result<Self, Error> {
        self.set_header(header)?;
        Ok(self)
    }

    pub fn delimiter(&self) -> &str {
        &self.delimiter
    }

    pub fn list_delimiter(&self) -> &str {
        &self.list_delimiter
    }

    /// Sets field names from a header line split on the field delimiter.
    pub fn set_header(&mut self, header: &str) -> Result<(), Error> {
        let names = header
            .split(self.delimiter.as_str())
            .map(str::to_string)
            .collect();
        self.set_field_names(names).inspect_err(|err| {
            tracing::error!(header = %header, error = %err, "unable to parse header");
        })
    }

    /// `set_header` for raw line bytes; a header that is not UTF-8 is a parse fault.
    pub fn set_header_bytes(&mut self, header: &[u8]) -> Result<(), Error> {
        match header.to_str() {
            Ok(text) => self.set_header(text),
            Err(err) => {
                tracing::error!(header = %header.to_str_lossy(), error = %err, "unable to parse header");
                Err(Error::new(ErrorKind::Parse)
                    .with_message("header is not valid UTF-8")
                    .with_source(err))
            }
        }
    }

    /// Parses raw line bytes; input that is not UTF-8 is a parse fault.
    pub fn parse_bytes(&mut self, line: &[u8]) -> Result<Record, Error> {
        match line.to_str() {
            Ok(text) => self.parse(text),
            Err(err) => {
                tracing::error!(line = %line.to_str_lossy(), error = %err, "unable to parse row");
                Err(Error::new(ErrorKind::Parse)
                    .with_message("row is not valid UTF-8")
                    .with_source(err))
            }
        }
    }

    fn parse_row(&mut self, line: &str) -> Result<Record, Error> {
        let tokens: Vec<&str> = line.split(self.delimiter.as_str()).collect();
        if self.field_names.is_none() {
            self.set_field_names(generate_field_names(tokens.len()))?;
        }
        let Some(names) = self.field_names.as_deref() else {
            return Err(Error::new(ErrorKind::Internal).with_message("field names missing"));
        };
        let values = tokens.into_iter().map(|token| self.field_value(token));
        Ok(zip_partial(names, values))
    }

    fn field_value(&self, token: &str) -> FieldValue {
        if token.contains(self.list_delimiter.as_str()) {
            FieldValue::List(
                token
                    .split(self.list_delimiter.as_str())
                    .map(null_if_empty)
                    .collect(),
            )
        } else {
            match null_if_empty(token) {
                Some(value) => FieldValue::Scalar(value),
                None => FieldValue::Null,
            }
        }
    }
}

impl Parser for DelimitedParser {
    fn parse(&mut self, input: &str) -> Result<Record, Error> {
        self.parse_row(input).inspect_err(|err| {
            tracing::error!(line = %input, error = %err, "unable to parse row");
        })
    }

    fn field_names(&self) -> Option<&[String]> {
        self.field_names.as_deref()
    }

    fn set_field_names(&mut self, names: Vec<String>) -> Result<(), Error> {
        if self.field_names.is_some() {
            return Err(Error::new(ErrorKind::Usage)
                .with_message("field names are already set")
                .with_hint("Create a new parser to use different field names."));
        }
        validate_field_names(&names)?;
        self.field_names = Some(names);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{DEFAULT_DELIMITER, DEFAULT_LIST_DELIMITER, DelimitedParser};
    use crate::core::error::ErrorKind;
    use crate::parsers::{FieldValue, Parser};

    fn scalar(value: &str) -> FieldValue {
        FieldValue::Scalar(value.to_string())
    }

    #[test]
    fn defaults_are_tab_and_ctrl_a() {
        let parser = DelimitedParser::default();
        assert_eq!(parser.delimiter(), DEFAULT_DELIMITER);
        assert_eq!(parser.list_delimiter(), DEFAULT_LIST_DELIMITER);
        assert!(parser.field_names().is_none());
    }

    #[test]
    fn header_then_row() {
        let mut parser = DelimitedParser::default()
            .with_header("a\tb\tc")
            .expect("header");
        let record = parser.parse("1\t2\t3").expect("parse");
        assert_eq!(record.get("a"), Some(&scalar("1")));
        assert_eq!(record.get("b"), Some(&scalar("2")));
        assert_eq!(record.get("c"), Some(&scalar("3")));
        assert_eq!(record.names().collect::<Vec<_>>(), vec!["a", "b", "c"]);
    }

    #[test]
    fn list_values_split_on_list_delimiter() {
        let mut parser = DelimitedParser::new(None, Some(","))
            .expect("parser")
            .with_field_names(["a", "b"])
            .expect("names");
        let record = parser.parse("x\t1,2,3").expect("parse");
        assert_eq!(record.get("a"), Some(&scalar("x")));
        assert_eq!(
            record.get("b").and_then(FieldValue::as_list),
            Some(
                &[
                    Some("1".to_string()),
                    Some("2".to_string()),
                    Some("3".to_string())
                ][..]
            )
        );
    }

    #[test]
    fn empty_list_items_become_null() {
        let mut parser = DelimitedParser::new(None, Some(","))
            .expect("parser")
            .with_field_names(["a"])
            .expect("names");
        let record = parser.parse(",x,").expect("parse");
        assert_eq!(
            record.get("a"),
            Some(&FieldValue::List(vec![None, Some("x".to_string()), None]))
        );
    }

    #[test]
    fn empty_field_is_null() {
        let mut parser = DelimitedParser::default()
            .with_field_names(["a", "b"])
            .expect("names");
        let record = parser.parse("\tval").expect("parse");
        assert!(record.get("a").is_some_and(FieldValue::is_null));
        assert_eq!(record.get("b"), Some(&scalar("val")));
    }

    #[test]
    fn duplicate_names_fail_at_set_time() {
        let err = DelimitedParser::default()
            .with_field_names(["a", "a"])
            .expect_err("duplicates");
        assert_eq!(err.kind(), ErrorKind::Usage);

        let err = DelimitedParser::default()
            .with_header("a\tb\ta")
            .expect_err("duplicates");
        assert_eq!(err.kind(), ErrorKind::Usage);
    }

    #[test]
    fn short_rows_zip_partially() {
        let mut parser = DelimitedParser::default()
            .with_field_names(["a", "b", "c"])
            .expect("names");
        let record = parser.parse("1\t2").expect("parse");
        assert_eq!(record.len(), 2);
        assert!(record.contains("a"));
        assert!(record.contains("b"));
        assert!(!record.contains("c"));
    }

    #[test]
    fn long_rows_drop_extra_tokens() {
        let mut parser = DelimitedParser::default()
            .with_field_names(["a"])
            .expect("names");
        let record = parser.parse("1\t2\t3").expect("parse");
        assert_eq!(record.len(), 1);
        assert_eq!(record.get("a"), Some(&scalar("1")));
    }

    #[test]
    fn first_row_fixes_generated_names() {
        let mut parser = DelimitedParser::default();
        let record = parser.parse("x\ty").expect("parse");
        assert_eq!(
            record.names().collect::<Vec<_>>(),
            vec!["column_0", "column_1"]
        );

        let record = parser.parse("1\t2\t3").expect("parse");
        assert_eq!(record.len(), 2);
        assert_eq!(parser.field_names().map(<[String]>::len), Some(2));
    }

    #[test]
    fn names_cannot_be_replaced() {
        let mut parser = DelimitedParser::default()
            .with_field_names(["a"])
            .expect("names");
        let err = parser
            .set_field_names(vec!["b".to_string()])
            .expect_err("already set");
        assert_eq!(err.kind(), ErrorKind::Usage);
        assert_eq!(parser.field_names(), Some(&["a".to_string()][..]));
    }

    #[test]
    fn custom_multi_char_delimiter() {
        let mut parser = DelimitedParser::new(Some("||"), Some("|"))
            .expect("parser")
            .with_field_names(["a", "b"])
            .expect("names");
        let record = parser.parse("1||x|y").expect("parse");
        assert_eq!(record.get("a"), Some(&scalar("1")));
        assert_eq!(
            record.get("b"),
            Some(&FieldValue::List(vec![
                Some("x".to_string()),
                Some("y".to_string())
            ]))
        );
    }

    #[test]
    fn invalid_delimiters_are_rejected() {
        let err = DelimitedParser::new(Some(""), None).expect_err("empty");
        assert_eq!(err.kind(), ErrorKind::Usage);
        let err = DelimitedParser::new(Some(","), Some(",")).expect_err("same");
        assert_eq!(err.kind(), ErrorKind::Usage);
    }

    #[test]
    fn invalid_utf8_is_parse_fault() {
        let mut parser = DelimitedParser::default();
        let err = parser.parse_bytes(b"ok\t\xff\xfe").expect_err("utf8");
        assert_eq!(err.kind(), ErrorKind::Parse);
        assert!(parser.field_names().is_none());
    }

    #[test]
    fn invalid_utf8_header_leaves_names_unset() {
        let mut parser = DelimitedParser::default();
        let err = parser.set_header_bytes(b"a\t\xffb").expect_err("utf8");
        assert_eq!(err.kind(), ErrorKind::Parse);
        assert!(parser.field_names().is_none());

        parser.set_header_bytes(b"a\tb").expect("header");
        assert_eq!(
            parser.field_names(),
            Some(&["a".to_string(), "b".to_string()][..])
        );
    }

    #[test]
    fn bytes_path_matches_str_path() {
        let mut parser = DelimitedParser::default();
        let record = parser.parse_bytes(b"a\t\tc").expect("parse");
        assert_eq!(record.len(), 3);
        assert!(record.get("column_1").is_some_and(FieldValue::is_null));
    }
}
