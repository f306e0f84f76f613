use strum::IntoEnumIterator;
use strum_macros::{EnumIter, EnumString, IntoStaticStr};
use thiserror::Error;

use crate::analysis::Analyzer;
use crate::input::MigrationOptions;
use crate::protocol::{Diagnostic, RunConfig};

/// Identifier of a built-in analyzer.
///
/// The string form is the name used in configuration, on the command line
/// and in report file names.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, EnumIter, EnumString, IntoStaticStr,
)]
pub enum AnalyzerId {
    /// `CREATE INDEX` without `CONCURRENTLY`.
    #[strum(serialize = "analyzer-create-index-concurrently")]
    CreateIndexConcurrently,
    /// `DROP INDEX` without `CONCURRENTLY`.
    #[strum(serialize = "analyzer-drop-index-concurrently")]
    DropIndexConcurrently,
    /// Concurrent index operations inside a transaction block.
    #[strum(serialize = "analyzer-index-concurrently-within-transaction")]
    IndexConcurrentlyWithinTransaction,
    /// New object names must match a configurable pattern.
    #[strum(serialize = "analyzer-naming-convention")]
    NamingConvention,
}

/// Error returned when a name is not a built-in analyzer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown analyzer '{0}'")]
pub struct UnknownAnalyzerError(pub String);

impl AnalyzerId {
    pub fn as_str(&self) -> &'static str {
        self.into()
    }

    /// All built-in analyzers, in their default run order.
    pub fn all() -> impl Iterator<Item = Self> {
        Self::iter()
    }

    /// Look up a built-in analyzer by name.
    pub fn lookup(name: &str) -> Result<Self, UnknownAnalyzerError> {
        name.parse()
            .map_err(|_| UnknownAnalyzerError(name.to_string()))
    }

    /// Diagnostic codes this analyzer can emit.
    pub fn codes(&self) -> &'static [&'static str] {
        match self {
            Self::CreateIndexConcurrently => &[super::create_index_concurrently::CODE],
            Self::DropIndexConcurrently => &[super::drop_index_concurrently::CODE],
            Self::IndexConcurrentlyWithinTransaction => {
                &[super::index_concurrently_in_transaction::CODE]
            }
            Self::NamingConvention => super::naming_convention::CODES,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::CreateIndexConcurrently => super::create_index_concurrently::DESCRIPTION,
            Self::DropIndexConcurrently => super::drop_index_concurrently::DESCRIPTION,
            Self::IndexConcurrentlyWithinTransaction => {
                super::index_concurrently_in_transaction::DESCRIPTION
            }
            Self::NamingConvention => super::naming_convention::DESCRIPTION,
        }
    }

    pub fn explain(&self) -> &'static str {
        match self {
            Self::CreateIndexConcurrently => super::create_index_concurrently::EXPLAIN,
            Self::DropIndexConcurrently => super::drop_index_concurrently::EXPLAIN,
            Self::IndexConcurrentlyWithinTransaction => {
                super::index_concurrently_in_transaction::EXPLAIN
            }
            Self::NamingConvention => super::naming_convention::EXPLAIN,
        }
    }
}

impl std::fmt::Display for AnalyzerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Analyzer for AnalyzerId {
    fn name(&self) -> &str {
        self.as_str()
    }

    fn report_text(&self) -> &str {
        match self {
            Self::CreateIndexConcurrently => super::create_index_concurrently::REPORT_TEXT,
            Self::DropIndexConcurrently => super::drop_index_concurrently::REPORT_TEXT,
            Self::IndexConcurrentlyWithinTransaction => {
                super::index_concurrently_in_transaction::REPORT_TEXT
            }
            Self::NamingConvention => super::naming_convention::REPORT_TEXT,
        }
    }

    fn analyze(
        &self,
        text: &str,
        options: &MigrationOptions,
        config: &RunConfig,
    ) -> Vec<Diagnostic> {
        match self {
            Self::CreateIndexConcurrently => super::create_index_concurrently::analyze(text),
            Self::DropIndexConcurrently => super::drop_index_concurrently::analyze(text),
            Self::IndexConcurrentlyWithinTransaction => {
                super::index_concurrently_in_transaction::analyze(text, options)
            }
            Self::NamingConvention => super::naming_convention::analyze(text, config),
        }
    }
}
