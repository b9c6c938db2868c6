//! Label Encoder - Maps raw categorical labels to integer codes

use crate::error::{LoadError, Result};
use crate::ingestion::value::CellValue;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// What to do with a label that has no entry in the mapping
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnmappedLabelPolicy {
    /// Reject the file before any of its rows are written
    #[default]
    Fail,
    /// Store NULL for the encoded value and keep going
    Null,
}

/// Raw label → encoded integer, in the order the caller supplied it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LabelMapping {
    entries: Vec<(String, i64)>,
    index: HashMap<String, i64>,
}

impl LabelMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Later duplicates overwrite the code but keep the first position.
    pub fn insert(&mut self, label: impl Into<String>, code: i64) {
        let label = label.into();
        if let Some(entry) = self.entries.iter_mut().find(|(l, _)| *l == label) {
            entry.1 = code;
        } else {
            self.entries.push((label.clone(), code));
        }
        self.index.insert(label, code);
    }

    pub fn get(&self, label: &str) -> Option<i64> {
        self.index.get(label).copied()
    }

    pub fn entries(&self) -> &[(String, i64)] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<S: Into<String>> FromIterator<(S, i64)> for LabelMapping {
    fn from_iter<T: IntoIterator<Item = (S, i64)>>(iter: T) -> Self {
        let mut mapping = LabelMapping::new();
        for (label, code) in iter {
            mapping.insert(label, code);
        }
        mapping
    }
}

impl Serialize for LabelMapping {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (label, code) in &self.entries {
            map.serialize_entry(label, code)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for LabelMapping {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        // serde_json is built with preserve_order, so object order survives here
        let map = serde_json::Map::<String, serde_json::Value>::deserialize(deserializer)?;
        let mut mapping = LabelMapping::new();
        for (label, value) in map {
            let code = value.as_i64().ok_or_else(|| {
                serde::de::Error::custom(format!("label '{}' must map to an integer, got {}", label, value))
            })?;
            mapping.insert(label, code);
        }
        Ok(mapping)
    }
}

/// Outcome of encoding one file's rows
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EncodingStats {
    pub encoded: usize,
    pub unmapped: usize,
}

pub struct LabelEncoder<'a> {
    mapping: &'a LabelMapping,
    policy: UnmappedLabelPolicy,
}

impl<'a> LabelEncoder<'a> {
    pub fn new(mapping: &'a LabelMapping, policy: UnmappedLabelPolicy) -> Self {
        Self { mapping, policy }
    }

    /// Rewrites the label column in place. Under `Fail` the rows are only
    /// touched once every label has resolved.
    pub fn encode(
        &self,
        file: &str,
        label_position: usize,
        rows: &mut [Vec<CellValue>],
    ) -> Result<EncodingStats> {
        let mut codes = Vec::with_capacity(rows.len());
        let mut stats = EncodingStats::default();

        for (idx, row) in rows.iter().enumerate() {
            let raw = row.get(label_position).cloned().unwrap_or(CellValue::Null);
            let code = raw.label_key().and_then(|key| self.mapping.get(&key));
            match code {
                Some(code) => {
                    stats.encoded += 1;
                    codes.push(CellValue::Integer(code));
                }
                None if self.policy == UnmappedLabelPolicy::Fail => {
                    return Err(LoadError::UnmappedLabel {
                        file: file.to_string(),
                        row: idx + 1,
                        label: raw.to_string(),
                    });
                }
                None => {
                    stats.unmapped += 1;
                    codes.push(CellValue::Null);
                }
            }
        }

        for (row, code) in rows.iter_mut().zip(codes) {
            if let Some(cell) = row.get_mut(label_position) {
                *cell = code;
            }
        }

        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapping() -> LabelMapping {
        [("BENIGN", 0), ("DDoS", 1), ("PortScan", 2)].into_iter().collect()
    }

    fn rows(labels: &[CellValue]) -> Vec<Vec<CellValue>> {
        labels
            .iter()
            .map(|l| vec![CellValue::Text("f.pcap".into()), l.clone()])
            .collect()
    }

    #[test]
    fn test_encodes_known_labels() {
        let mapping = mapping();
        let mut rows = rows(&["DDoS".into(), "BENIGN".into()]);
        let stats = LabelEncoder::new(&mapping, UnmappedLabelPolicy::Fail)
            .encode("a.csv", 1, &mut rows)
            .unwrap();
        assert_eq!(stats, EncodingStats { encoded: 2, unmapped: 0 });
        assert_eq!(rows[0][1], CellValue::Integer(1));
        assert_eq!(rows[1][1], CellValue::Integer(0));
    }

    #[test]
    fn test_fail_policy_leaves_rows_untouched() {
        let mapping = mapping();
        let mut rows = rows(&["DDoS".into(), "Heartbleed".into()]);
        let err = LabelEncoder::new(&mapping, UnmappedLabelPolicy::Fail)
            .encode("a.csv", 1, &mut rows)
            .unwrap_err();
        assert!(matches!(err, LoadError::UnmappedLabel { row: 2, ref label, .. } if label == "Heartbleed"));
        assert_eq!(rows[0][1], CellValue::Text("DDoS".into()));
    }

    #[test]
    fn test_null_policy_writes_null() {
        let mapping = mapping();
        let mut rows = rows(&["Heartbleed".into(), "PortScan".into()]);
        let stats = LabelEncoder::new(&mapping, UnmappedLabelPolicy::Null)
            .encode("a.csv", 1, &mut rows)
            .unwrap();
        assert_eq!(stats.unmapped, 1);
        assert_eq!(rows[0][1], CellValue::Null);
        assert_eq!(rows[1][1], CellValue::Integer(2));
    }

    #[test]
    fn test_numeric_labels_use_text_form() {
        let mapping: LabelMapping = [("0", 10), ("1", 11)].into_iter().collect();
        let mut rows = rows(&[CellValue::Integer(1), CellValue::Integer(0)]);
        LabelEncoder::new(&mapping, UnmappedLabelPolicy::Fail)
            .encode("a.csv", 1, &mut rows)
            .unwrap();
        assert_eq!(rows[0][1], CellValue::Integer(11));
        assert_eq!(rows[1][1], CellValue::Integer(10));
    }

    #[test]
    fn test_mapping_keeps_json_order() {
        let mapping: LabelMapping = serde_json::from_str(r#"{"Zeta": 2, "Alpha": 0, "Mid": 1}"#).unwrap();
        let labels: Vec<&str> = mapping.entries().iter().map(|(l, _)| l.as_str()).collect();
        assert_eq!(labels, vec!["Zeta", "Alpha", "Mid"]);
        assert!(serde_json::from_str::<LabelMapping>(r#"{"A": "x"}"#).is_err());
    }
}
