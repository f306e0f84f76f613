//! Shared test helpers for analyzer unit tests.

use crate::analysis::Analyzer;
use crate::input::MigrationOptions;
use crate::position::TextLocation;
use crate::protocol::{Diagnostic, RunConfig};
use crate::rules::AnalyzerId;

/// Run `id` over `text` inside a transaction with an empty config.
pub fn analyze(id: AnalyzerId, text: &str) -> Vec<Diagnostic> {
    id.analyze(text, &MigrationOptions::with_transaction(true), &RunConfig::new())
}

/// Run `id` over `text` outside a transaction.
pub fn analyze_without_transaction(id: AnalyzerId, text: &str) -> Vec<Diagnostic> {
    id.analyze(text, &MigrationOptions::with_transaction(false), &RunConfig::new())
}

/// Code and location of each diagnostic, for compact assertions.
pub fn codes_at(diagnostics: &[Diagnostic]) -> Vec<(&str, TextLocation)> {
    diagnostics
        .iter()
        .map(|d| (d.code.as_str(), d.location()))
        .collect()
}
