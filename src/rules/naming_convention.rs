//! NMC-000..NMC-004: Naming convention for new database objects
//!
//! Every schema, table, column and index name introduced by a migration must
//! match the pattern configured under [`NAMING_REGEX_KEY`].

use regex::Regex;

use crate::parser::{IrNode, ObjectKind};
use crate::position::{TextLocation, locate_statement};
use crate::protocol::{Diagnostic, Level, RunConfig};

/// Config key holding the naming pattern.
pub const NAMING_REGEX_KEY: &str = "naming_regex";

/// Pattern used when [`NAMING_REGEX_KEY`] is not configured.
pub const DEFAULT_NAMING_PATTERN: &str = "^[a-zA-Z_]+$";

/// Configuration and unsupported-input failures.
const FAILURE_CODE: &str = "NMC-000";
const SCHEMA_CODE: &str = "NMC-001";
const TABLE_CODE: &str = "NMC-002";
const INDEX_CODE: &str = "NMC-003";
const COLUMN_CODE: &str = "NMC-004";

pub(super) const CODES: &[&str] = &[FAILURE_CODE, SCHEMA_CODE, TABLE_CODE, INDEX_CODE, COLUMN_CODE];

pub(super) const REPORT_TEXT: &str =
    "Errors occurred around enforcing naming convention for database objects";

pub(super) const DESCRIPTION: &str = "New object name does not match the naming convention";

pub(super) const EXPLAIN: &str = "analyzer-naming-convention (NMC-000..NMC-004): New object name does not match the naming convention\n\
     \n\
     What it detects:\n\
     A schema (NMC-001), table (NMC-002), index (NMC-003) or column (NMC-004)\n\
     created or renamed with a name that does not match the configured regex.\n\
     Names introduced by CREATE SCHEMA, CREATE TABLE (including its columns),\n\
     ALTER TABLE ADD COLUMN, CREATE INDEX and RENAME are checked.\n\
     \n\
     Configuration:\n\
     Set naming_regex under [rules] (default ^[a-zA-Z_]+$).\n\
     \n\
     Example (bad, with the default pattern):\n\
       CREATE TABLE order_items_v2 (id int);\n\
     \n\
     NMC-000 reports an invalid naming_regex, or a RENAME of an object kind\n\
     this analyzer does not model to a name that fails the pattern.";

fn code_for(kind: &ObjectKind) -> &'static str {
    match kind {
        ObjectKind::Schema => SCHEMA_CODE,
        ObjectKind::Table => TABLE_CODE,
        ObjectKind::Index => INDEX_CODE,
        ObjectKind::Column => COLUMN_CODE,
        ObjectKind::Other { .. } => FAILURE_CODE,
    }
}

pub(super) fn analyze(text: &str, config: &RunConfig) -> Vec<Diagnostic> {
    let pattern = config.get(NAMING_REGEX_KEY).unwrap_or(DEFAULT_NAMING_PATTERN);
    let regex = match Regex::new(pattern) {
        Ok(regex) => regex,
        Err(err) => {
            return vec![Diagnostic::unlocated_fatal(
                FAILURE_CODE,
                format!("error compiling regex string {pattern:?}: {err}"),
            )];
        }
    };

    let statements = match super::parse_statements(text, FAILURE_CODE) {
        Ok(statements) => statements,
        Err(fatal) => return vec![fatal],
    };

    let mut checker = NameChecker {
        regex: &regex,
        diagnostics: Vec::new(),
    };
    for stmt in &statements {
        let location = locate_statement(text, stmt.location);
        match &stmt.node {
            IrNode::CreateSchema(cs) => checker.check(&ObjectKind::Schema, &cs.name, location),
            IrNode::CreateTable(ct) => {
                checker.check(&ObjectKind::Table, &ct.name, location);
                for column in &ct.columns {
                    checker.check(&ObjectKind::Column, column, location);
                }
            }
            IrNode::AlterTable(at) => {
                for column in &at.added_columns {
                    checker.check(&ObjectKind::Column, column, location);
                }
            }
            IrNode::CreateIndex(ci) => {
                if let Some(name) = &ci.index_name {
                    checker.check(&ObjectKind::Index, name, location);
                }
            }
            IrNode::Rename(rename) => checker.check(&rename.kind, &rename.new_name, location),
            IrNode::DropIndex(_) | IrNode::Ignored => {}
        }
    }
    checker.diagnostics
}

struct NameChecker<'a> {
    regex: &'a Regex,
    diagnostics: Vec<Diagnostic>,
}

impl NameChecker<'_> {
    /// Empty names (`CREATE SCHEMA AUTHORIZATION role`) are generated by the
    /// server and not checked. A failing name of an unmodelled kind is an
    /// unlocated NMC-000.
    fn check(&mut self, kind: &ObjectKind, name: &str, location: TextLocation) {
        if name.is_empty() || self.regex.is_match(name) {
            return;
        }
        let diagnostic = match kind {
            ObjectKind::Other { code, label } => Diagnostic::unlocated_fatal(
                FAILURE_CODE,
                format!(
                    "FAILURE to validate naming for unsupported object type {label} (code {code})"
                ),
            ),
            _ => Diagnostic::new(
                code_for(kind),
                Level::Fatal,
                location,
                format!(
                    "New {:?} name {:?} does not meet naming requirement regex {:?}",
                    kind.as_str(),
                    name,
                    self.regex.as_str()
                ),
            ),
        };
        self.diagnostics.push(diagnostic);
    }
}
