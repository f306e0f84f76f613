//! IND-001: `CREATE INDEX` without `CONCURRENTLY`
//!
//! A plain `CREATE INDEX` holds a lock that blocks writes to the table for
//! the whole index build.

use crate::parser::IrNode;
use crate::position::locate_statement;
use crate::protocol::{Diagnostic, Level};

pub(super) const CODE: &str = "IND-001";

pub(super) const REPORT_TEXT: &str =
    "Errors occurred around CREATE INDEX statement(s) with missing CONCURRENTLY option";

pub(super) const DESCRIPTION: &str = "Missing CONCURRENTLY on CREATE INDEX";

pub(super) const EXPLAIN: &str = "analyzer-create-index-concurrently (IND-001): Missing CONCURRENTLY on CREATE INDEX\n\
     \n\
     What it detects:\n\
     A CREATE INDEX statement that does not use the CONCURRENTLY option.\n\
     \n\
     Why it's dangerous:\n\
     Without CONCURRENTLY, PostgreSQL takes a SHARE lock on the table for the\n\
     entire index build. Inserts, updates and deletes block until the build\n\
     finishes, which can take minutes on large tables.\n\
     \n\
     Example (bad):\n\
       CREATE INDEX idx_orders_status ON orders (status);\n\
     \n\
     Fix:\n\
       CREATE INDEX CONCURRENTLY idx_orders_status ON orders (status);\n\
     \n\
     Note: CONCURRENTLY cannot run inside a transaction block. Mark the\n\
     migration direction with transaction:false (see\n\
     analyzer-index-concurrently-within-transaction).";

const MESSAGE: &str = "CREATE INDEX statement missing CONCURRENTLY option";

pub(super) fn analyze(text: &str) -> Vec<Diagnostic> {
    let statements = match super::parse_statements(text, CODE) {
        Ok(statements) => statements,
        Err(fatal) => return vec![fatal],
    };

    statements
        .iter()
        .filter_map(|stmt| match &stmt.node {
            IrNode::CreateIndex(ci) if !ci.concurrent => Some(Diagnostic::new(
                CODE,
                Level::Warning,
                locate_statement(text, stmt.location),
                MESSAGE,
            )),
            _ => None,
        })
        .collect()
}
