use std::path::PathBuf;
use thiserror::Error;

pub type ExportResult<T> = Result<T, ExportError>;

/// Fatal conditions of an export run. Anything here aborts the run with exit status 1.
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config parsing error: {0}")]
    Config(#[from] serde_yaml::Error),

    #[error("Pattern error: {0}")]
    Pattern(#[from] regex::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Workbook error: {0}")]
    Workbook(String),

    #[error("Experiment \"{0}\" not found")]
    ExperimentNotFound(String),

    #[error("No experiments with CSV files found in {}", .0.display())]
    NoExperiments(PathBuf),

    #[error("No CSV files found in {}", .0.display())]
    NoInputFiles(PathBuf),

    #[error("No usable CSV files: every file name was unrecognized")]
    EmptyHierarchy,

    #[error("Unable to find {role} device \"{device}\" in the experiment")]
    MissingDevice { role: &'static str, device: String },

    #[error("Invalid sheet name \"{0}\"")]
    SheetName(String),
}
