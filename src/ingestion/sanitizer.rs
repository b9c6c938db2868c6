//! Value Sanitizer - Zeroes missing and non-finite cells

use crate::ingestion::value::CellValue;

/// Replaces every missing, NaN or infinite cell with zero, in any column.
/// Column semantics are ignored, so a missing `FileName` becomes `0` as well.
#[derive(Clone, Debug, Default)]
pub struct ValueSanitizer;

impl ValueSanitizer {
    pub fn new() -> Self {
        Self
    }

    /// Returns the number of cells replaced.
    pub fn sanitize(&self, rows: &mut [Vec<CellValue>]) -> usize {
        let mut replaced = 0;
        for cell in rows.iter_mut().flat_map(|row| row.iter_mut()) {
            if let Some(zero) = Self::replacement(cell) {
                *cell = zero;
                replaced += 1;
            }
        }
        replaced
    }

    fn replacement(cell: &CellValue) -> Option<CellValue> {
        match cell {
            CellValue::Null => Some(CellValue::Integer(0)),
            CellValue::Float(f) if !f.is_finite() => Some(CellValue::Float(0.0)),
            _ => None,
        }
    }
}
