//! Ordered device → voltage → lifetime → density table of source files

use crate::diagnostics::DiagnosticSink;
use crate::parser::KeyExtractor;
use crate::types::{DeviceName, ExperimentKey};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Flat, ordered map from experiment key to its CSV file.
///
/// Iteration follows the key ordering: devices naturally, then voltage,
/// lifetime and density by numeric value.
#[derive(Debug, Clone, Default)]
pub struct Hierarchy {
    files: BTreeMap<ExperimentKey, PathBuf>,
    skipped: usize,
}

impl Hierarchy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a list of files, skipping (and reporting) names without a full key.
    /// Two files with the same key: the later one wins, with a warning.
    pub fn build(paths: &[PathBuf], extractor: &KeyExtractor, sink: &mut dyn DiagnosticSink) -> Self {
        let mut hierarchy = Self::new();

        for path in paths {
            sink.detail(&path.display().to_string());
            match extractor.extract(path) {
                Ok(key) => {
                    let sheet = key.sheet_name();
                    if let Some(previous) = hierarchy.insert(key, path.clone()) {
                        sink.warn(&format!(
                            "\"{}\" and \"{}\" both map to \"{}\". Keeping \"{}\".",
                            previous.display(),
                            path.display(),
                            sheet,
                            path.display()
                        ));
                    }
                }
                Err(e) => {
                    hierarchy.skipped += 1;
                    sink.warn(&format!(
                        "From file \"{}\": {}. Skipping this file.",
                        path.display(),
                        e
                    ));
                }
            }
        }

        hierarchy
    }

    /// Insert a file, returning the path it replaced
    pub fn insert(&mut self, key: ExperimentKey, path: PathBuf) -> Option<PathBuf> {
        self.files.insert(key, path)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Number of files `build` could not key
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    pub fn keys(&self) -> impl Iterator<Item = &ExperimentKey> {
        self.files.keys()
    }

    pub fn files(&self) -> impl Iterator<Item = (&ExperimentKey, &Path)> {
        self.files.iter().map(|(key, path)| (key, path.as_path()))
    }

    /// Distinct devices in hierarchy order
    pub fn devices(&self) -> Vec<&DeviceName> {
        let mut devices: Vec<&DeviceName> = Vec::new();
        for key in self.files.keys() {
            if devices.last() != Some(&&key.device) {
                devices.push(&key.device);
            }
        }
        devices
    }
}
