//! Lazy reader over a transient simulation CSV

use crate::config::ColumnConfig;
use crate::error::ExportResult;
use csv::{ReaderBuilder, StringRecordsIntoIter};
use std::fs::File;
use std::path::Path;

/// A raw field as it should land in a worksheet cell
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Number(f64),
    Text(String),
    Blank,
}

impl CellValue {
    pub fn parse(field: &str) -> Self {
        let field = field.trim();
        if field.is_empty() {
            return CellValue::Blank;
        }
        match field.parse::<f64>() {
            Ok(n) if n.is_finite() => CellValue::Number(n),
            _ => CellValue::Text(field.to_string()),
        }
    }
}

/// The two fields of a CSV row the export keeps
#[derive(Debug, Clone, PartialEq)]
pub struct RawRow {
    pub time: CellValue,
    pub signal: CellValue,
    /// False when the row was too short to hold the signal field
    pub has_signal: bool,
}

pub struct RawCsvReader {
    records: StringRecordsIntoIter<File>,
    time_column: usize,
    signal_column: usize,
}

impl RawCsvReader {
    pub fn open(path: &Path, columns: &ColumnConfig) -> ExportResult<Self> {
        let reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_path(path)?;
        Ok(Self {
            records: reader.into_records(),
            time_column: columns.time,
            signal_column: columns.signal,
        })
    }
}

impl Iterator for RawCsvReader {
    type Item = ExportResult<RawRow>;

    fn next(&mut self) -> Option<Self::Item> {
        let record = match self.records.next()? {
            Ok(record) => record,
            Err(e) => return Some(Err(e.into())),
        };
        let field = |idx: usize| record.get(idx).map(CellValue::parse);
        let signal = field(self.signal_column);
        Some(Ok(RawRow {
            time: field(self.time_column).unwrap_or(CellValue::Blank),
            has_signal: signal.is_some(),
            signal: signal.unwrap_or(CellValue::Blank),
        }))
    }
}
