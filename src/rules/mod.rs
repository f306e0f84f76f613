//! Built-in analyzers
//!
//! Each analyzer lives in its own module exposing its diagnostic codes, the
//! report summary, a description, an explanation and an `analyze` function.
//! [`AnalyzerId`] dispatches to them and implements [`crate::Analyzer`].

use crate::parser::{IrNode, Located, parse_sql};
use crate::protocol::Diagnostic;

#[cfg(test)]
pub mod test_helpers;

mod analyzer_id;
mod create_index_concurrently;
mod drop_index_concurrently;
mod index_concurrently_in_transaction;
mod naming_convention;

pub use analyzer_id::{AnalyzerId, UnknownAnalyzerError};
pub use naming_convention::{DEFAULT_NAMING_PATTERN, NAMING_REGEX_KEY};

/// Parse `text` for an analyzer emitting `code`.
///
/// A parse failure becomes the single fatal diagnostic the analyzer should
/// return.
fn parse_statements(text: &str, code: &str) -> Result<Vec<Located<IrNode>>, Diagnostic> {
    parse_sql(text).map_err(|err| {
        Diagnostic::unlocated_fatal(code, format!("error parsing migration: `{text}`: {err}"))
    })
}
