//! Input side of an export: finding measurement files, turning their names into
//! experiment keys and reading their raw rows.

mod raw_csv;

pub use raw_csv::{CellValue, RawCsvReader, RawRow};

use crate::config::ExportConfig;
use crate::error::ExportResult;
use crate::types::{natural_cmp, DeviceName, ExperimentKey, KeyField, Tag, TagStyle};
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Why a file name could not be turned into an [`ExperimentKey`]
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseKeyError {
    #[error("{field} could not be extracted (looked for \"{looked_for}\")")]
    Missing { field: KeyField, looked_for: String },

    #[error("{field} token \"{token}\" does not hold a number")]
    InvalidValue { field: KeyField, token: String },
}

impl ParseKeyError {
    pub fn field(&self) -> KeyField {
        match self {
            ParseKeyError::Missing { field, .. } | ParseKeyError::InvalidValue { field, .. } => {
                *field
            }
        }
    }
}

/// Extracts `(device, voltage, lifetime, density)` from names like
/// `PC_voltage5_lifetime0.001_ehpdensity0.0001_time.csv`.
#[derive(Debug, Clone)]
pub struct KeyExtractor {
    devices: Vec<String>,
    voltage_token: String,
    lifetime_token: String,
    density_token: String,
    tag_style: TagStyle,
    number: Regex,
}

impl KeyExtractor {
    pub fn new(config: &ExportConfig) -> ExportResult<Self> {
        Ok(Self {
            devices: config.devices.clone(),
            voltage_token: config.tokens.voltage.clone(),
            lifetime_token: config.tokens.lifetime.clone(),
            density_token: config.tokens.density.clone(),
            tag_style: config.tag_style,
            number: Regex::new(r"^[-+]?(?:\d+\.?\d*|\.\d+)(?:[eE][-+]?\d+)?$")?,
        })
    }

    pub fn extract(&self, path: &Path) -> Result<ExperimentKey, ParseKeyError> {
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let stem = strip_csv_extension(&file_name);
        let tokens: Vec<&str> = stem.split('_').filter(|t| !t.is_empty()).collect();

        let device = self
            .devices
            .iter()
            .find_map(|device| tokens.iter().find(|t| t.contains(device.as_str())))
            .map(|token| DeviceName::new(*token))
            .ok_or_else(|| ParseKeyError::Missing {
                field: KeyField::Device,
                looked_for: self.devices.join("\" or \""),
            })?;

        let voltage = self.field_value(&tokens, KeyField::Voltage, &self.voltage_token)?;
        let lifetime = self.field_value(&tokens, KeyField::Lifetime, &self.lifetime_token)?;
        let density = self.field_value(&tokens, KeyField::Density, &self.density_token)?;

        Ok(ExperimentKey::new(
            device,
            Tag::voltage(voltage),
            Tag::lifetime(lifetime, self.tag_style),
            Tag::density(density, self.tag_style),
        ))
    }

    fn field_value(
        &self,
        tokens: &[&str],
        field: KeyField,
        marker: &str,
    ) -> Result<f64, ParseKeyError> {
        let token = tokens
            .iter()
            .find(|t| t.contains(marker))
            .ok_or_else(|| ParseKeyError::Missing {
                field,
                looked_for: marker.to_string(),
            })?;

        let literal = token.replacen(marker, "", 1);
        let invalid = || ParseKeyError::InvalidValue {
            field,
            token: token.to_string(),
        };
        if !self.number.is_match(&literal) {
            return Err(invalid());
        }
        literal.parse::<f64>().map_err(|_| invalid())
    }
}

fn strip_csv_extension(file_name: &str) -> &str {
    let split = file_name.len().saturating_sub(4);
    match file_name.get(split..) {
        Some(ext) if ext.eq_ignore_ascii_case(".csv") => &file_name[..split],
        _ => file_name,
    }
}

fn is_csv(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.to_string_lossy().eq_ignore_ascii_case("csv"))
}

/// All `*.csv` files below `root`, sorted by path
pub fn discover_csv_files(root: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = walkdir::WalkDir::new(root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| is_csv(e.path()))
        .map(|e| e.into_path())
        .collect();
    files.sort();
    files
}

/// Names of the child directories of `dir` that contain CSV files, naturally sorted
pub fn list_experiments(dir: &Path) -> ExportResult<Vec<String>> {
    let mut experiments = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.is_dir() && !discover_csv_files(&path).is_empty() {
            experiments.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    experiments.sort_by(|a, b| natural_cmp(a, b).then_with(|| a.cmp(b)));
    Ok(experiments)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extractor() -> KeyExtractor {
        KeyExtractor::new(&ExportConfig::default()).unwrap()
    }

    #[test]
    fn test_extract_full_key() {
        let key = extractor()
            .extract(Path::new(
                "data/run1/PC_voltage5_lifetime0.001_ehpdensity0.0001_time.csv",
            ))
            .unwrap();
        assert_eq!(key.device.as_str(), "PC");
        assert_eq!(key.voltage.display(), "5V");
        assert_eq!(key.lifetime.display(), "τ=1.00e-3");
        assert_eq!(key.density.display(), "D=1.00e-4");
    }

    #[test]
    fn test_extract_token_order_does_not_matter() {
        let key = extractor()
            .extract(Path::new("ehpdensity1e-5_lifetime1e-7_Diode_voltage100.csv"))
            .unwrap();
        assert_eq!(key.device.as_str(), "Diode");
        assert_eq!(key.voltage.value(), 100.0);
        assert_eq!(key.density.display(), "D=1.00e-5");
    }

    #[test]
    fn test_device_priority_follows_config() {
        // "PC" is searched before "Diode"
        let key = extractor()
            .extract(Path::new("Diode_PCB_voltage5_lifetime1e-3_ehpdensity1e-4.csv"))
            .unwrap();
        assert_eq!(key.device.as_str(), "PCB");
    }

    #[test]
    fn test_missing_device() {
        let err = extractor()
            .extract(Path::new("Cap_voltage5_lifetime0.001_ehpdensity0.0001.csv"))
            .unwrap_err();
        assert_eq!(err.field(), KeyField::Device);
        assert!(err.to_string().contains("\"PC\" or \"Diode\""));
    }

    #[test]
    fn test_missing_lifetime() {
        let err = extractor()
            .extract(Path::new("PC_voltage5_ehpdensity0.0001.csv"))
            .unwrap_err();
        assert_eq!(
            err,
            ParseKeyError::Missing {
                field: KeyField::Lifetime,
                looked_for: "lifetime".to_string()
            }
        );
    }

    #[test]
    fn test_invalid_number() {
        let err = extractor()
            .extract(Path::new("PC_voltageX_lifetime0.001_ehpdensity0.0001.csv"))
            .unwrap_err();
        assert_eq!(
            err,
            ParseKeyError::InvalidValue {
                field: KeyField::Voltage,
                token: "voltageX".to_string()
            }
        );
    }

    #[test]
    fn test_infinity_is_not_a_number_token() {
        let err = extractor()
            .extract(Path::new("PC_voltage5_lifetimeinf_ehpdensity0.0001.csv"))
            .unwrap_err();
        assert_eq!(err.field(), KeyField::Lifetime);
    }

    #[test]
    fn test_strip_csv_extension() {
        assert_eq!(strip_csv_extension("a_b.csv"), "a_b");
        assert_eq!(strip_csv_extension("a_b.CSV"), "a_b");
        assert_eq!(strip_csv_extension("a_b"), "a_b");
        assert_eq!(strip_csv_extension("τ.csv"), "τ");
    }
}
