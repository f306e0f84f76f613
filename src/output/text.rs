//! Human-readable text output reporter
//!
//! One line per diagnostic:
//! ```text
//! [WARNING]: 20240101_add_index.sql:3:1: (IND-001) CREATE INDEX statement missing CONCURRENTLY option
//! ```
//! Verbose mode adds a `[analyzer]: file: summary` header per report and a
//! blank line after it.

use crate::output::{ReportError, Reporter};
use crate::protocol::{Diagnostic, Report};
use std::fmt::Write as FmtWrite;
use std::io::Write;

/// Writes rendered reports to stdout.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextReporter {
    pub verbose: bool,
}

impl TextReporter {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }
}

/// Format one diagnostic of a report for `file`.
///
/// The `line:pos:` part is only printed for a real location. Position 0
/// (the newline right before a line) is shown as column 1.
pub fn format_diagnostic(file: &str, diagnostic: &Diagnostic) -> String {
    let mut buf = format!("[{}]: {}:", diagnostic.level, file);
    if diagnostic.line_number > 0 && diagnostic.line_position >= 0 {
        let _ = write!(
            buf,
            "{}:{}:",
            diagnostic.line_number,
            diagnostic.line_position.max(1)
        );
    }
    let _ = write!(buf, " ({}) {}", diagnostic.code, diagnostic.message);
    buf
}

/// Render every report of `analyzer` as text.
pub fn render(analyzer: &str, reports: &[Report], verbose: bool) -> String {
    let mut output = String::new();
    for report in reports {
        if verbose {
            let _ = writeln!(
                output,
                "[{}]: {}: {}",
                analyzer, report.migration.file_name, report.text
            );
        }
        for diagnostic in &report.diagnostics {
            output.push_str(&format_diagnostic(
                &report.migration.relative_file_path,
                diagnostic,
            ));
            output.push('\n');
        }
        if verbose {
            output.push('\n');
        }
    }
    output
}

impl Reporter for TextReporter {
    fn emit(&self, analyzer: &str, reports: &[Report]) -> Result<(), ReportError> {
        let text = render(analyzer, reports, self.verbose);
        if text.is_empty() {
            return Ok(());
        }
        let stdout = std::io::stdout();
        let mut handle = stdout.lock();
        handle.write_all(text.as_bytes())?;
        handle.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::Migration;
    use crate::position::TextLocation;
    use crate::protocol::{Level, RunConfig};

    fn diagnostic(line: i64, pos: i64) -> Diagnostic {
        Diagnostic::new(
            "IND-001",
            Level::Warning,
            TextLocation::new(line, pos),
            "CREATE INDEX statement missing CONCURRENTLY option",
        )
    }

    fn report(diagnostics: Vec<Diagnostic>) -> Report {
        Report {
            migration: Migration {
                file_name: "001_idx.sql".to_string(),
                relative_file_path: "001_idx.sql".to_string(),
                ..Migration::default()
            },
            text: "summary".to_string(),
            diagnostics,
            actions: vec![],
            config: RunConfig::new(),
        }
    }

    #[test]
    fn test_format_located_diagnostic() {
        assert_eq!(
            format_diagnostic("001_idx.sql", &diagnostic(3, 1)),
            "[WARNING]: 001_idx.sql:3:1: (IND-001) CREATE INDEX statement missing CONCURRENTLY option"
        );
    }

    #[test]
    fn test_position_zero_renders_as_one() {
        assert!(format_diagnostic("f.sql", &diagnostic(4, 0)).contains("f.sql:4:1:"));
    }

    #[test]
    fn test_unlocated_diagnostic_has_no_coordinates() {
        let fatal = Diagnostic::unlocated_fatal("NMC-000", "bad regex");
        assert_eq!(
            format_diagnostic("f.sql", &fatal),
            "[FATAL]: f.sql: (NMC-000) bad regex"
        );
    }

    #[test]
    fn test_render_plain() {
        let text = render("a", &[report(vec![diagnostic(3, 1), diagnostic(7, 5)])], false);
        assert_eq!(text.lines().count(), 2);
        assert!(text.lines().nth(1).unwrap().contains(":7:5:"));
    }

    #[test]
    fn test_render_verbose() {
        let text = render(
            "analyzer-create-index-concurrently",
            &[report(vec![diagnostic(3, 1)])],
            true,
        );
        assert_eq!(
            text,
            "[analyzer-create-index-concurrently]: 001_idx.sql: summary\n\
             [WARNING]: 001_idx.sql:3:1: (IND-001) CREATE INDEX statement missing CONCURRENTLY option\n\
             \n"
        );
    }

    #[test]
    fn test_render_nothing_for_no_reports() {
        assert_eq!(render("a", &[], true), "");
    }
}
