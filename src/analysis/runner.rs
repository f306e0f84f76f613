//! Runs one analyzer over a batch of migrations.

use tracing::debug;

use crate::analysis::{Analyzer, pad_down_migration};
use crate::input::Migration;
use crate::protocol::{AnalysisRequest, AnalysisResponse, Report, RunConfig};

/// Analyze every migration in order and return one report per migration
/// that produced at least one diagnostic.
pub fn run<A: Analyzer + ?Sized>(
    migrations: &[Migration],
    config: &RunConfig,
    analyzer: &A,
) -> Vec<Report> {
    migrations
        .iter()
        .filter_map(|migration| analyze_migration(migration, config, analyzer))
        .collect()
}

/// Analyze the up block, then the padded down block, of one migration.
///
/// Up diagnostics precede down diagnostics. Returns `None` when neither
/// direction produced anything.
pub fn analyze_migration<A: Analyzer + ?Sized>(
    migration: &Migration,
    config: &RunConfig,
    analyzer: &A,
) -> Option<Report> {
    let mut diagnostics = analyzer.analyze(&migration.up, &migration.up_options, config);

    let padded_down = pad_down_migration(&migration.up, &migration.down);
    diagnostics.extend(analyzer.analyze(&padded_down, &migration.down_options, config));

    debug!(
        analyzer = analyzer.name(),
        migration = %migration.file_name,
        diagnostics = diagnostics.len(),
        "analyzed migration"
    );

    if diagnostics.is_empty() {
        return None;
    }

    Some(Report {
        migration: migration.clone(),
        text: analyzer.report_text().to_string(),
        diagnostics,
        actions: analyzer.actions(),
        config: config.clone(),
    })
}

/// Run `analyzer` over a decoded request envelope.
///
/// The run config is taken from the request metadata.
pub fn analyze_request<A: Analyzer + ?Sized>(
    request: &AnalysisRequest,
    analyzer: &A,
) -> AnalysisResponse {
    AnalysisResponse {
        reports: run(&request.migrations, &request.metadata.config, analyzer),
    }
}
