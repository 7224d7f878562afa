//! Diagnostics reported while an export runs
//!
//! The export pipeline never prints. It hands `(severity, message)` pairs to a
//! [`DiagnosticSink`]; the CLI plugs in [`ConsoleSink`], tests use [`MemorySink`].

use colored::Colorize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// Per-file listings, shown only in verbose mode
    Detail,
    /// Stage announcements and headings
    Info,
    Success,
    /// Recoverable problems: the run continues
    Warning,
    /// Fatal problems: the run is aborted
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Severity::Detail => "detail",
            Severity::Info => "info",
            Severity::Success => "success",
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        f.write_str(name)
    }
}

pub trait DiagnosticSink {
    fn report(&mut self, severity: Severity, message: &str);

    fn detail(&mut self, message: &str) {
        self.report(Severity::Detail, message);
    }

    fn info(&mut self, message: &str) {
        self.report(Severity::Info, message);
    }

    fn success(&mut self, message: &str) {
        self.report(Severity::Success, message);
    }

    fn warn(&mut self, message: &str) {
        self.report(Severity::Warning, message);
    }

    fn error(&mut self, message: &str) {
        self.report(Severity::Error, message);
    }
}

/// Colored terminal output, mirrored into `tracing`
#[derive(Debug, Default)]
pub struct ConsoleSink {
    verbose: bool,
}

impl ConsoleSink {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }
}

impl DiagnosticSink for ConsoleSink {
    fn report(&mut self, severity: Severity, message: &str) {
        match severity {
            Severity::Detail => {
                tracing::debug!(target: "chargesheet::diagnostics", "{}", message);
                if self.verbose {
                    println!("{}", message.white());
                }
            }
            Severity::Info => {
                tracing::info!(target: "chargesheet::diagnostics", "{}", message);
                println!("{}", message.cyan());
            }
            Severity::Success => {
                tracing::info!(target: "chargesheet::diagnostics", "{}", message);
                println!("{}", message.green());
            }
            Severity::Warning => {
                tracing::warn!(target: "chargesheet::diagnostics", "{}", message);
                println!("{}", format!("⚠️  {}", message).yellow());
            }
            Severity::Error => {
                tracing::error!(target: "chargesheet::diagnostics", "{}", message);
                eprintln!("{}", format!("❌ {}", message).red().bold());
            }
        }
    }
}

/// Collects diagnostics in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    pub entries: Vec<(Severity, String)>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages reported with exactly `severity`
    pub fn messages(&self, severity: Severity) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|(s, _)| *s == severity)
            .map(|(_, m)| m.as_str())
            .collect()
    }

    pub fn warnings(&self) -> Vec<&str> {
        self.messages(Severity::Warning)
    }
}

impl DiagnosticSink for MemorySink {
    fn report(&mut self, severity: Severity, message: &str) {
        self.entries.push((severity, message.to_string()));
    }
}
