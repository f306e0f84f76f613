//! IND-002: `DROP INDEX` without `CONCURRENTLY`

use crate::parser::IrNode;
use crate::position::locate_statement;
use crate::protocol::{Diagnostic, Level};

pub(super) const CODE: &str = "IND-002";

pub(super) const REPORT_TEXT: &str =
    "Errors occurred around DROP INDEX statement(s) with missing CONCURRENTLY option";

pub(super) const DESCRIPTION: &str = "Missing CONCURRENTLY on DROP INDEX";

pub(super) const EXPLAIN: &str = "analyzer-drop-index-concurrently (IND-002): Missing CONCURRENTLY on DROP INDEX\n\
     \n\
     What it detects:\n\
     A DROP INDEX statement that does not use the CONCURRENTLY option.\n\
     \n\
     Why it's dangerous:\n\
     A plain DROP INDEX takes an ACCESS EXCLUSIVE lock on the index's table,\n\
     blocking reads and writes until every running query on the table ends.\n\
     \n\
     Example (bad):\n\
       DROP INDEX idx_orders_status;\n\
     \n\
     Fix:\n\
       DROP INDEX CONCURRENTLY idx_orders_status;";

const MESSAGE: &str = "DROP INDEX statement missing CONCURRENTLY option";

pub(super) fn analyze(text: &str) -> Vec<Diagnostic> {
    let statements = match super::parse_statements(text, CODE) {
        Ok(statements) => statements,
        Err(fatal) => return vec![fatal],
    };

    statements
        .iter()
        .filter_map(|stmt| match &stmt.node {
            IrNode::DropIndex(di) if !di.concurrent => Some(Diagnostic::new(
                CODE,
                Level::Warning,
                locate_statement(text, stmt.location),
                MESSAGE,
            )),
            _ => None,
        })
        .collect()
}
