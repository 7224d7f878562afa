//! Export configuration
//!
//! Every key is optional; a missing key falls back to the values the lab's
//! transient simulations have always been exported with.

use crate::error::ExportResult;
use crate::types::TagStyle;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Directory bare experiment names are resolved against
    pub data_dir: PathBuf,
    /// Output workbook path
    pub output: PathBuf,
    /// Device names searched for in file name tokens, in priority order
    pub devices: Vec<String>,
    pub tokens: TokenConfig,
    pub columns: ColumnConfig,
    pub tag_style: TagStyle,
    /// Reference (unnormalized) device
    pub baseline_device: String,
    /// Device divided by the baseline in the normalized band
    pub numerator_device: String,
    /// Label of the synthetic normalized band
    pub normalized_label: String,
    pub aggregate_sheet: String,
    pub charts: ChartConfig,
    pub transpose: TransposeConfig,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("../data"),
            output: PathBuf::from("Charge Data.xlsx"),
            devices: vec!["PC".to_string(), "Diode".to_string()],
            tokens: TokenConfig::default(),
            columns: ColumnConfig::default(),
            tag_style: TagStyle::Fixed,
            baseline_device: "Diode".to_string(),
            numerator_device: "PC".to_string(),
            normalized_label: "PC Normalized".to_string(),
            aggregate_sheet: "All Charge Integrals".to_string(),
            charts: ChartConfig::default(),
            transpose: TransposeConfig::default(),
        }
    }
}

impl ExportConfig {
    /// Load a YAML config file, or the defaults when no file is given
    pub fn load(path: Option<&Path>) -> ExportResult<Self> {
        match path {
            Some(path) => {
                let content = fs::read_to_string(path)?;
                Self::from_yaml(&content)
            }
            None => Ok(Self::default()),
        }
    }

    pub fn from_yaml(content: &str) -> ExportResult<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }

    /// Device whose table is transposed into the density-as-category sheet
    pub fn transpose_device(&self) -> &str {
        self.transpose
            .device
            .as_deref()
            .unwrap_or(&self.baseline_device)
    }

    pub fn transpose_sheet_name(&self) -> String {
        self.transpose
            .sheet_name
            .clone()
            .unwrap_or_else(|| format!("{} Charge Integral Analysis", self.transpose_device()))
    }
}

/// Substrings identifying each numeric field in a file name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenConfig {
    pub voltage: String,
    pub lifetime: String,
    pub density: String,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            voltage: "voltage".to_string(),
            lifetime: "lifetime".to_string(),
            density: "ehpdensity".to_string(),
        }
    }
}

/// Zero-based raw CSV field indices
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnConfig {
    pub time: usize,
    pub signal: usize,
}

impl Default for ColumnConfig {
    fn default() -> Self {
        Self { time: 0, signal: 6 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartConfig {
    /// Trailing pool rows left out of lifetime charts (outlier configurations)
    pub excluded_trailing_rows: u32,
    /// Height of one chart in worksheet rows
    pub rows_per_chart: u32,
    /// 1-based anchor column of the left chart in a pair
    pub left_column: u16,
    /// 1-based anchor column of the right chart in a pair
    pub right_column: u16,
    /// Pixels
    pub width: u32,
    pub height: u32,
    pub style: u8,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            excluded_trailing_rows: 0,
            rows_per_chart: 13,
            left_column: 1,
            right_column: 6,
            width: 480,
            height: 264,
            style: 38,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransposeConfig {
    pub enabled: bool,
    /// Defaults to the baseline device
    pub device: Option<String>,
    /// The single lifetime slice that is transposed
    pub lifetime: f64,
    pub sheet_name: Option<String>,
}

impl Default for TransposeConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            device: None,
            lifetime: 1e-7,
            sheet_name: None,
        }
    }
}
