//! Schema - The fixed, ordered column list every input file must carry

use crate::error::{LoadError, Result};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Column holding the raw file identifier inside each dataset
pub const FILE_NAME_COLUMN: &str = "FileName";
/// Categorical column replaced by its encoded value
pub const LABEL_COLUMN: &str = "Label";
/// Autogenerated primary key of the target table
pub const ID_COLUMN: &str = "id";
/// Per-row reference to the provenance index
pub const SOURCE_COLUMN: &str = "source";

/// Minimum normalized similarity for a "did you mean" hint
const SUGGESTION_THRESHOLD: f64 = 0.8;

/// Ordered column names, fixed for a whole run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct Schema {
    columns: Vec<String>,
}

impl Schema {
    pub fn new<I, S>(columns: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let columns: Vec<String> = columns.into_iter().map(|c| c.into().trim().to_string()).collect();

        if columns.is_empty() {
            return Err(LoadError::InvalidSchema("schema has no columns".to_string()));
        }

        let mut seen = HashSet::new();
        for column in &columns {
            if column.is_empty() {
                return Err(LoadError::InvalidSchema("schema contains an empty column name".to_string()));
            }
            if column.eq_ignore_ascii_case(ID_COLUMN) || column.eq_ignore_ascii_case(SOURCE_COLUMN) {
                return Err(LoadError::InvalidSchema(format!(
                    "'{}' is reserved for the generated table columns",
                    column
                )));
            }
            if !seen.insert(column.to_lowercase()) {
                return Err(LoadError::InvalidSchema(format!("duplicate column '{}'", column)));
            }
        }

        Ok(Self { columns })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn position(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }

    pub fn label_position(&self) -> Option<usize> {
        self.position(LABEL_COLUMN)
    }
}

impl TryFrom<Vec<String>> for Schema {
    type Error = LoadError;

    fn try_from(columns: Vec<String>) -> Result<Self> {
        Schema::new(columns)
    }
}

impl From<Schema> for Vec<String> {
    fn from(schema: Schema) -> Self {
        schema.columns
    }
}

/// Order-sensitive header check against the expected schema
pub struct SchemaValidator<'a> {
    schema: &'a Schema,
}

impl<'a> SchemaValidator<'a> {
    pub fn new(schema: &'a Schema) -> Self {
        Self { schema }
    }

    pub fn validate(&self, file: &str, headers: &[String]) -> Result<()> {
        if headers == self.schema.columns() {
            return Ok(());
        }

        Err(LoadError::SchemaMismatch {
            file: file.to_string(),
            expected: self.schema.columns().to_vec(),
            found: headers.to_vec(),
            detail: self.describe_mismatch(headers),
        })
    }

    fn describe_mismatch(&self, headers: &[String]) -> String {
        let expected = self.schema.columns();
        let mut parts = Vec::new();

        if let Some(pos) = expected.iter().zip(headers).position(|(e, h)| e != h) {
            parts.push(format!(
                "column {} is '{}', expected '{}'",
                pos + 1,
                headers[pos],
                expected[pos]
            ));
        } else if headers.len() != expected.len() {
            parts.push(format!("expected {} columns, found {}", expected.len(), headers.len()));
        }

        let missing: Vec<&String> = expected.iter().filter(|c| !headers.contains(c)).collect();
        if !missing.is_empty() {
            parts.push(format!("missing [{}]", missing.iter().join(", ")));
        }

        let unexpected: Vec<&String> = headers.iter().filter(|h| !expected.contains(h)).collect();
        if !unexpected.is_empty() {
            let described = unexpected
                .iter()
                .map(|h| match self.closest_expected(h) {
                    Some(candidate) => format!("{} (did you mean '{}'?)", h, candidate),
                    None => h.to_string(),
                })
                .join(", ");
            parts.push(format!("unexpected [{}]", described));
        }

        if missing.is_empty() && unexpected.is_empty() && headers.len() == expected.len() {
            parts.push("columns are out of order".to_string());
        }

        parts.join("; ")
    }

    fn closest_expected(&self, header: &str) -> Option<&str> {
        self.schema
            .columns()
            .iter()
            .map(|c| (c, strsim::normalized_levenshtein(c, header)))
            .filter(|(_, score)| *score >= SUGGESTION_THRESHOLD)
            .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
            .map(|(c, _)| c.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(cols: &[&str]) -> Vec<String> {
        cols.iter().map(|c| c.to_string()).collect()
    }

    fn schema() -> Schema {
        Schema::new(["FileName", "Label", "f1", "f2"]).unwrap()
    }

    #[test]
    fn test_exact_match_passes() {
        let schema = schema();
        let validator = SchemaValidator::new(&schema);
        assert!(validator.validate("a.csv", &headers(&["FileName", "Label", "f1", "f2"])).is_ok());
    }

    #[test]
    fn test_order_matters() {
        let schema = schema();
        let validator = SchemaValidator::new(&schema);
        let err = validator
            .validate("a.csv", &headers(&["FileName", "Label", "f2", "f1"]))
            .unwrap_err();
        match err {
            LoadError::SchemaMismatch { detail, found, .. } => {
                assert!(detail.contains("column 3 is 'f2', expected 'f1'"));
                assert!(detail.contains("out of order"));
                assert_eq!(found, headers(&["FileName", "Label", "f2", "f1"]));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_typo_gets_suggestion() {
        let schema = Schema::new(["FileName", "Label", "Flow Duration"]).unwrap();
        let validator = SchemaValidator::new(&schema);
        let err = validator
            .validate("b.csv", &headers(&["FileName", "Label", "Flow Duratoin"]))
            .unwrap_err();
        let message = err.to_string();
        assert!(message.contains("missing [Flow Duration]"));
        assert!(message.contains("did you mean 'Flow Duration'?"));
    }

    #[test]
    fn test_extra_column_rejected() {
        let schema = schema();
        let validator = SchemaValidator::new(&schema);
        let err = validator
            .validate("c.csv", &headers(&["FileName", "Label", "f1", "f2", "f3"]))
            .unwrap_err();
        assert!(err.to_string().contains("expected 4 columns, found 5"));
    }

    #[test]
    fn test_invalid_schemas() {
        assert!(Schema::new(Vec::<String>::new()).is_err());
        assert!(Schema::new(["a", "a"]).is_err());
        assert!(Schema::new(["a", "source"]).is_err());
        assert!(Schema::new(["ID", "a"]).is_err());
        assert!(Schema::new(["a", " "]).is_err());
    }

    #[test]
    fn test_schema_deserializes_from_list() {
        let schema: Schema = serde_json::from_str(r#"["FileName", "Label", "f1"]"#).unwrap();
        assert_eq!(schema.label_position(), Some(1));
        assert!(serde_json::from_str::<Schema>(r#"["x", "x"]"#).is_err());
    }
}
