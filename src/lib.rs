//! derisk-sql: risk linter for dbmate PostgreSQL migrations
//!
//! Migrations are parsed with pg_query and checked by independent analyzers.
//! Each analyzer sees the up block and a padded down block of every migration
//! and reports diagnostics with editor-style line and column positions.
//! Analyzers run in process or as child processes speaking a JSON protocol.

pub mod analysis;
pub mod capability;
pub mod config;
pub mod input;
pub mod output;
pub mod parser;
pub mod pipeline;
pub mod position;
pub mod protocol;
pub mod rules;

// Re-export commonly used types
pub use analysis::{Analyzer, is_fatal};
pub use capability::{Capability, ProtocolError};
pub use config::Config;
pub use input::{Migration, MigrationOptions};
pub use pipeline::{CheckPipeline, RunSummary};
pub use position::TextLocation;
pub use protocol::{AnalysisRequest, AnalysisResponse, Diagnostic, Level, Report, RunConfig};
pub use rules::AnalyzerId;
