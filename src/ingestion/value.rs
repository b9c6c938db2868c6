//! Cell values as read from CSV and written to the store

use crate::db::store::SqlType;
use rusqlite::types::{ToSql, ToSqlOutput, Value};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Markers treated as a missing value when a CSV cell is read.
const MISSING_MARKERS: &[&str] = &[
    "", "NA", "N/A", "n/a", "NaN", "nan", "-NaN", "-nan", "NULL", "null", "None", "#N/A", "<NA>",
];

/// A single parsed cell
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum CellValue {
    Null,
    Integer(i64),
    Float(f64),
    Text(String),
}

impl CellValue {
    /// Coerce a raw CSV cell. Integers win over floats; `inf`/`-inf` parse as
    /// non-finite floats and are left for the sanitizer.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if MISSING_MARKERS.contains(&trimmed) {
            return CellValue::Null;
        }

        if let Ok(i) = trimmed.parse::<i64>() {
            return CellValue::Integer(i);
        }

        if let Ok(f) = trimmed.parse::<f64>() {
            if f.is_nan() {
                return CellValue::Null;
            }
            return CellValue::Float(f);
        }

        CellValue::Text(trimmed.to_string())
    }

    /// Coerce a raw cell for a column of the given type. Text columns keep the
    /// cell verbatim apart from missing markers.
    pub fn parse_as(raw: &str, sql_type: SqlType) -> Self {
        match sql_type {
            SqlType::VarChar(_) => {
                let trimmed = raw.trim();
                if MISSING_MARKERS.contains(&trimmed) {
                    CellValue::Null
                } else {
                    CellValue::Text(trimmed.to_string())
                }
            }
            SqlType::Integer | SqlType::Float => Self::parse(raw),
        }
    }

    /// Missing, NaN or infinite
    pub fn is_invalid(&self) -> bool {
        match self {
            CellValue::Null => true,
            CellValue::Float(f) => !f.is_finite(),
            _ => false,
        }
    }

    /// Text used to look this value up in a label mapping.
    /// `None` for missing or non-finite values.
    pub fn label_key(&self) -> Option<String> {
        match self {
            CellValue::Null => None,
            CellValue::Integer(i) => Some(i.to_string()),
            CellValue::Float(f) if !f.is_finite() => None,
            CellValue::Float(f) => Some(f.to_string()),
            CellValue::Text(s) => Some(s.clone()),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Null => write!(f, "NULL"),
            CellValue::Integer(i) => write!(f, "{}", i),
            CellValue::Float(v) => write!(f, "{}", v),
            CellValue::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<i64> for CellValue {
    fn from(i: i64) -> Self {
        CellValue::Integer(i)
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::Text(s)
    }
}

impl ToSql for CellValue {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        let value = match self {
            CellValue::Null => Value::Null,
            CellValue::Integer(i) => Value::Integer(*i),
            CellValue::Float(f) => Value::Real(*f),
            CellValue::Text(s) => Value::Text(s.clone()),
        };
        Ok(ToSqlOutput::Owned(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_coerces_numbers_and_text() {
        assert_eq!(CellValue::parse(" 42 "), CellValue::Integer(42));
        assert_eq!(CellValue::parse("0.5"), CellValue::Float(0.5));
        assert_eq!(CellValue::parse("flow_01.pcap"), CellValue::Text("flow_01.pcap".to_string()));
    }

    #[test]
    fn test_parse_as_text_column_keeps_cell() {
        let text = SqlType::VarChar(255);
        assert_eq!(CellValue::parse_as(" 00123 ", text), CellValue::Text("00123".to_string()));
        assert_eq!(CellValue::parse_as("-inf", text), CellValue::Text("-inf".to_string()));
        assert_eq!(CellValue::parse_as("N/A", text), CellValue::Null);
        assert_eq!(CellValue::parse_as("00123", SqlType::Float), CellValue::Integer(123));
    }

    #[test]
    fn test_parse_missing_markers() {
        for raw in ["", "  ", "NaN", "nan", "NULL", "N/A", "None"] {
            assert_eq!(CellValue::parse(raw), CellValue::Null, "marker {:?}", raw);
        }
    }

    #[test]
    fn test_parse_infinities_are_invalid() {
        let pos = CellValue::parse("inf");
        let neg = CellValue::parse("-inf");
        assert!(matches!(pos, CellValue::Float(f) if f.is_infinite() && f > 0.0));
        assert!(matches!(neg, CellValue::Float(f) if f.is_infinite() && f < 0.0));
        assert!(pos.is_invalid());
        assert!(CellValue::Null.is_invalid());
        assert!(!CellValue::Integer(0).is_invalid());
    }

    #[test]
    fn test_label_key() {
        assert_eq!(CellValue::Text("A".to_string()).label_key().as_deref(), Some("A"));
        assert_eq!(CellValue::Integer(3).label_key().as_deref(), Some("3"));
        assert_eq!(CellValue::Float(3.0).label_key().as_deref(), Some("3"));
        assert_eq!(CellValue::Null.label_key(), None);
    }
}
