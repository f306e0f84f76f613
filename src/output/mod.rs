//! Output reporters
//!
//! Reports are printed as text to the terminal and written as one JSON file
//! per analyzer. JSON report files can be read back for later rendering.

use crate::protocol::Report;
use std::path::PathBuf;
use thiserror::Error;

pub mod json;
pub mod text;

pub use json::{JsonReporter, ReportFile, read_report_files, report_file_name};
pub use text::{TextReporter, format_diagnostic, render};

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("IO error writing report: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid report file {path}: {source}")]
    InvalidReportFile {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Trait for output format reporters.
pub trait Reporter {
    /// Emit the reports one analyzer produced.
    fn emit(&self, analyzer: &str, reports: &[Report]) -> Result<(), ReportError>;
}
