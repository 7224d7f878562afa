//! Workbook output
//!
//! - Per-file sheets: raw time/signal columns plus difference, integral and sum formulas
//! - Aggregate sheet: stacked device tables of cross-sheet references and normalized values
//! - Charts on the aggregate sheet and a transposed density sheet

mod exporter;
mod sheet_names;

pub use exporter::{ExportSummary, WorkbookExporter};
pub use sheet_names::{sanitize_sheet_name, SheetNames, MAX_SHEET_NAME_LEN};
