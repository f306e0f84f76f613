//! Analyzer execution
//!
//! An [`Analyzer`] turns one migration text into diagnostics. The runner feeds
//! it the up text and the padded down text of every migration and gathers the
//! results into reports.

use crate::input::MigrationOptions;
use crate::protocol::{Diagnostic, Report, RunConfig};

pub mod padding;
pub mod runner;

pub use padding::pad_down_migration;
pub use runner::{analyze_migration, analyze_request, run};

/// A rule check over a single migration direction.
///
/// Internal failures (unparseable input, bad configuration) are reported as a
/// single fatal diagnostic at [`crate::position::TextLocation::UNKNOWN`]
/// rather than as an error; callers treat them as ordinary findings.
pub trait Analyzer {
    /// Stable identifier, used to name report files.
    fn name(&self) -> &str;

    /// Summary copied into every report this analyzer produces.
    fn report_text(&self) -> &str;

    /// Follow-up action identifiers attached to every report.
    fn actions(&self) -> Vec<String> {
        Vec::new()
    }

    /// Diagnostics for `text`, located relative to the start of `text`.
    fn analyze(
        &self,
        text: &str,
        options: &MigrationOptions,
        config: &RunConfig,
    ) -> Vec<Diagnostic>;
}

/// True iff any diagnostic in any report is fatal.
pub fn is_fatal(reports: &[Report]) -> bool {
    reports.iter().any(Report::is_fatal)
}
