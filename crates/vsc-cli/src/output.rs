//! Output formatting for CLI
//!
//! Provides consistent output formatting across all commands:
//! - Human-readable default output
//! - JSON output (--json flag)
//! - Quiet mode for scripting (--quiet flag)

use serde_json::json;

use vsc_core::{ErrorCategory, PullReport, PushReport, RepositoryList};

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable output (default)
    Human,
    /// JSON output
    Json,
    /// Quiet mode - minimal output
    Quiet,
}

impl OutputFormat {
    /// Create format from CLI flags
    pub fn from_flags(json: bool, quiet: bool) -> Self {
        if quiet {
            OutputFormat::Quiet
        } else if json {
            OutputFormat::Json
        } else {
            OutputFormat::Human
        }
    }
}

/// Output helper for consistent formatting
pub struct Output {
    /// The output format
    pub format: OutputFormat,
}

impl Output {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Print the directory names known to the server, in received order
    pub fn print_repositories(&self, list: &RepositoryList) {
        match self.format {
            OutputFormat::Human => {
                println!("Repositories:");
                for name in &list.names {
                    println!("{}", name);
                }
            }
            OutputFormat::Json => {
                println!("{}", json!({ "repositoriesNames": list.names }));
            }
            OutputFormat::Quiet => {
                for name in &list.names {
                    println!("{}", name);
                }
            }
        }
    }

    /// Print the outcome of a push
    pub fn print_push_report(&self, report: &PushReport) {
        match self.format {
            OutputFormat::Human => {
                for failure in &report.failures {
                    eprintln!("✗ {}: {}", failure.directory, failure.error);
                }
                if report.is_success() {
                    self.success(&format!(
                        "The folder {} has been sent to the server",
                        report.root_name
                    ));
                } else {
                    eprintln!("{}", push_failure_summary(report));
                    if report.aborted {
                        eprintln!("Push stopped after the first failure");
                    }
                }
            }
            OutputFormat::Json => {
                let failures: Vec<_> = report
                    .failures
                    .iter()
                    .map(|f| json!({ "directory": f.directory, "error": f.error.to_string() }))
                    .collect();
                println!(
                    "{}",
                    json!({
                        "status": status(report.is_success()),
                        "root": report.root_name,
                        "batches_sent": report.batches_sent,
                        "files_sent": report.files_sent,
                        "aborted": report.aborted,
                        "failures": failures,
                    })
                );
            }
            OutputFormat::Quiet => {
                for failure in &report.failures {
                    eprintln!("{}: {}", failure.directory, failure.error);
                }
            }
        }
    }

    /// Print the outcome of a pull into `destination_name`
    pub fn print_pull_report(&self, report: &PullReport, destination_name: &str) {
        match self.format {
            OutputFormat::Human => {
                for failure in &report.failures {
                    eprintln!("✗ {}: {}", failure.name, failure.error);
                }
                if report.is_success() {
                    self.success(&format!(
                        "The folder {} recorded in {}",
                        report.directory_name, destination_name
                    ));
                } else {
                    eprintln!(
                        "{} of {} file(s) could not be written",
                        report.failures.len(),
                        report.failures.len() + report.written.len()
                    );
                }
            }
            OutputFormat::Json => {
                let failures: Vec<_> = report
                    .failures
                    .iter()
                    .map(|f| json!({ "name": f.name, "error": f.error.to_string() }))
                    .collect();
                let written: Vec<_> = report
                    .written
                    .iter()
                    .map(|p| p.display().to_string())
                    .collect();
                println!(
                    "{}",
                    json!({
                        "status": status(report.is_success()),
                        "directory": report.directory_name,
                        "written": written,
                        "failures": failures,
                    })
                );
            }
            OutputFormat::Quiet => {
                for failure in &report.failures {
                    eprintln!("{}: {}", failure.name, failure.error);
                }
            }
        }
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        match self.format {
            OutputFormat::Human => println!("✓ {}", message),
            OutputFormat::Json => {
                println!("{}", json!({"status": "success", "message": message}));
            }
            OutputFormat::Quiet => {}
        }
    }

    /// Print a progress line; human mode only, so JSON output stays one document
    pub fn progress(&self, msg: &str) {
        if self.shows_progress() {
            println!("{}", msg);
        }
    }

    fn shows_progress(&self) -> bool {
        self.format == OutputFormat::Human
    }

    /// Print an error, with an optional hint; shown in every mode
    pub fn error(&self, msg: &str, hint: Option<&str>) {
        match self.format {
            OutputFormat::Json => {
                println!(
                    "{}",
                    json!({"status": "error", "message": msg, "hint": hint})
                );
            }
            OutputFormat::Human | OutputFormat::Quiet => {
                eprintln!("Error: {}", msg);
                if let Some(hint) = hint {
                    eprintln!("{}", hint);
                }
            }
        }
    }
}

/// What went wrong with a push, from the kinds of failures it saw
fn push_failure_summary(report: &PushReport) -> &'static str {
    let has = |category| report.failures.iter().any(|f| f.error.category() == category);
    match (has(ErrorCategory::Transfer), has(ErrorCategory::Filesystem)) {
        (true, false) => "Problems with the server address",
        (false, true) => "Some local files could not be read",
        _ => "Problems with the server address, and some local files could not be read",
    }
}

fn status(success: bool) -> &'static str {
    if success {
        "success"
    } else {
        "failed"
    }
}
