use crate::config::ExportConfig;
use crate::diagnostics::{ConsoleSink, DiagnosticSink};
use crate::error::{ExportError, ExportResult};
use crate::excel::{ExportSummary, WorkbookExporter};
use crate::parser;
use colored::Colorize;
use std::path::{Path, PathBuf};

/// Turn an experiment argument into a directory: an existing path is used as is,
/// anything else is looked up under `data_dir`.
pub fn resolve_experiment(experiment: &str, data_dir: &Path) -> ExportResult<PathBuf> {
    let direct = PathBuf::from(experiment);
    if direct.is_dir() {
        return Ok(direct);
    }
    let named = data_dir.join(experiment);
    if named.is_dir() {
        return Ok(named);
    }
    Err(ExportError::ExperimentNotFound(experiment.to_string()))
}

/// Execute the export command
pub fn export(experiment: String, config: ExportConfig, verbose: bool) -> ExportResult<ExportSummary> {
    let mut sink = ConsoleSink::new(verbose);

    println!("{}", "⚡ Charge Sheet - Export".bold().green());
    println!("   Experiment: {}", experiment);
    println!("   Output:     {}\n", config.output.display());

    let result = resolve_experiment(&experiment, &config.data_dir).and_then(|root| {
        let exporter = WorkbookExporter::new(config);
        exporter.export(&root, &mut sink)
    });

    match result {
        Ok(summary) => {
            println!("\n{}", "✅ Export Complete!".bold().green());
            println!("   Data sheets: {}", summary.files);
            if summary.skipped > 0 {
                println!("   Skipped:     {}", summary.skipped.to_string().yellow());
            }
            println!("   Devices:     {}", summary.devices.join(", "));
            println!("   Charts:      {}", summary.charts);
            println!("   Workbook:    {}\n", summary.output.display());
            Ok(summary)
        }
        Err(e) => {
            sink.error(&e.to_string());
            Err(e)
        }
    }
}

/// Execute the ls command
pub fn ls(dir: PathBuf) -> ExportResult<Vec<String>> {
    let mut sink = ConsoleSink::new(false);

    let experiments = match parser::list_experiments(&dir) {
        Ok(found) if found.is_empty() => Err(ExportError::NoExperiments(dir.clone())),
        other => other,
    };

    match experiments {
        Ok(experiments) => {
            println!("{}", format!("📂 Experiments in {}", dir.display()).bold().cyan());
            for name in &experiments {
                println!("   {}", name);
            }
            Ok(experiments)
        }
        Err(e) => {
            sink.error(&e.to_string());
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_resolve_experiment_under_data_dir() {
        let data = tempfile::tempdir().unwrap();
        fs::create_dir(data.path().join("run1")).unwrap();

        let resolved = resolve_experiment("run1", data.path()).unwrap();
        assert_eq!(resolved, data.path().join("run1"));
    }

    #[test]
    fn test_resolve_experiment_accepts_direct_path() {
        let data = tempfile::tempdir().unwrap();
        let direct = data.path().to_string_lossy().into_owned();
        assert_eq!(
            resolve_experiment(&direct, Path::new("/nonexistent")).unwrap(),
            data.path()
        );
    }

    #[test]
    fn test_resolve_experiment_not_found() {
        let data = tempfile::tempdir().unwrap();
        let err = resolve_experiment("missing-run", data.path()).unwrap_err();
        assert!(matches!(err, ExportError::ExperimentNotFound(name) if name == "missing-run"));
    }

    #[test]
    fn test_ls_without_experiments_fails() {
        let data = tempfile::tempdir().unwrap();
        fs::create_dir(data.path().join("empty")).unwrap();
        assert!(matches!(
            ls(data.path().to_path_buf()),
            Err(ExportError::NoExperiments(_))
        ));
    }
}
