//! JSON report files
//!
//! Each analyzer's reports are written to `report.<analyzer>.json` in the
//! output directory, using the same report shape as the analyzer protocol.

use crate::output::{ReportError, Reporter};
use crate::protocol::Report;
use std::path::{Path, PathBuf};

const FILE_PREFIX: &str = "report.";
const FILE_SUFFIX: &str = ".json";

/// Writes one JSON file per analyzer into `output_dir`.
#[derive(Debug, Clone)]
pub struct JsonReporter {
    pub output_dir: PathBuf,
}

impl JsonReporter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn path_for(&self, analyzer: &str) -> PathBuf {
        self.output_dir.join(report_file_name(analyzer))
    }
}

/// `report.<basename>.json`, where an external analyzer given as a path is
/// reduced to its file name.
pub fn report_file_name(analyzer: &str) -> String {
    let base = Path::new(analyzer)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| analyzer.to_string());
    format!("{FILE_PREFIX}{base}{FILE_SUFFIX}")
}

impl Reporter for JsonReporter {
    /// Creates the output directory if needed and overwrites any previous
    /// report file for the same analyzer.
    fn emit(&self, analyzer: &str, reports: &[Report]) -> Result<(), ReportError> {
        std::fs::create_dir_all(&self.output_dir)?;
        let json = serde_json::to_string_pretty(reports)?;
        std::fs::write(self.path_for(analyzer), json)?;
        Ok(())
    }
}

/// Reports read back from one `report.<analyzer>.json` file.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportFile {
    pub analyzer: String,
    pub path: PathBuf,
    pub reports: Vec<Report>,
}

/// Read every `report.*.json` file in `dir`, sorted by file name.
///
/// Files are decoded strictly; one malformed file fails the whole read.
pub fn read_report_files(dir: &Path) -> Result<Vec<ReportFile>, ReportError> {
    let mut paths = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.len() > FILE_PREFIX.len() + FILE_SUFFIX.len()
            && name.starts_with(FILE_PREFIX)
            && name.ends_with(FILE_SUFFIX)
            && entry.file_type()?.is_file()
        {
            paths.push((name, entry.path()));
        }
    }
    paths.sort();

    paths
        .into_iter()
        .map(|(name, path)| {
            let contents = std::fs::read(&path)?;
            let reports: Vec<Report> = serde_json::from_slice(&contents).map_err(|source| {
                ReportError::InvalidReportFile {
                    path: path.clone(),
                    source,
                }
            })?;
            let analyzer = name[FILE_PREFIX.len()..name.len() - FILE_SUFFIX.len()].to_string();
            Ok(ReportFile {
                analyzer,
                path,
                reports,
            })
        })
        .collect()
}
