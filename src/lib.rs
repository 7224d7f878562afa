//! Charge Sheet - transient simulation CSVs to a live Excel workbook
//!
//! Each CSV of an experiment becomes a data sheet with difference, integral and
//! sum formulas. An aggregate sheet stacks one table per device over a shared
//! `(voltage, lifetime) x density` grid, cross-references every sum, and adds a
//! normalized table plus charts.
//!
//! # Example
//!
//! ```no_run
//! use chargesheet::config::ExportConfig;
//! use chargesheet::diagnostics::ConsoleSink;
//! use chargesheet::excel::WorkbookExporter;
//! use std::path::Path;
//!
//! let exporter = WorkbookExporter::new(ExportConfig::default());
//! let summary = exporter.export(Path::new("data/run1"), &mut ConsoleSink::new(false))?;
//!
//! println!("Sheets: {}", summary.sheets);
//! # Ok::<(), chargesheet::error::ExportError>(())
//! ```

pub mod cli;
pub mod config;
pub mod core;
pub mod diagnostics;
pub mod error;
pub mod excel;
pub mod parser;
pub mod types;

// Re-export commonly used types
pub use config::ExportConfig;
pub use error::{ExportError, ExportResult};
pub use types::{DeviceName, ExperimentKey, Tag, TagStyle};
