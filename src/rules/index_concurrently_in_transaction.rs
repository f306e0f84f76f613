//! IND-003: Concurrent index operations inside a transaction block
//!
//! PostgreSQL rejects `CREATE INDEX CONCURRENTLY` and `DROP INDEX
//! CONCURRENTLY` inside a transaction, and dbmate wraps every migration
//! direction in one unless it is marked `transaction:false`.

use crate::input::MigrationOptions;
use crate::parser::IrNode;
use crate::position::locate_statement;
use crate::protocol::{Diagnostic, Level};

pub(super) const CODE: &str = "IND-003";

pub(super) const REPORT_TEXT: &str = "Errors occurred around CREATE INDEX or DROP INDEX statement with CONCURRENTLY option happening inside a transaction block";

pub(super) const DESCRIPTION: &str = "CONCURRENTLY index operation inside a transaction";

pub(super) const EXPLAIN: &str = "analyzer-index-concurrently-within-transaction (IND-003): CONCURRENTLY index operation inside a transaction\n\
     \n\
     What it detects:\n\
     CREATE INDEX CONCURRENTLY or DROP INDEX CONCURRENTLY in a migration\n\
     direction that runs inside a transaction block.\n\
     \n\
     Why it's dangerous:\n\
     PostgreSQL refuses to run either statement inside a transaction, so the\n\
     migration fails when it is applied.\n\
     \n\
     Example (bad):\n\
       -- migrate:up\n\
       CREATE INDEX CONCURRENTLY idx_orders_status ON orders (status);\n\
     \n\
     Fix:\n\
       -- migrate:up transaction:false\n\
       CREATE INDEX CONCURRENTLY idx_orders_status ON orders (status);";

const CREATE_MESSAGE: &str =
    "CREATE INDEX CONCURRENTLY statement is happening within a transaction block! This is prohibited";
const DROP_MESSAGE: &str =
    "DROP INDEX CONCURRENTLY statement is happening within a transaction block! This is prohibited";

/// A direction running outside a transaction is not parsed at all.
pub(super) fn analyze(text: &str, options: &MigrationOptions) -> Vec<Diagnostic> {
    if !options.runs_in_transaction() {
        return Vec::new();
    }

    let statements = match super::parse_statements(text, CODE) {
        Ok(statements) => statements,
        Err(fatal) => return vec![fatal],
    };

    statements
        .iter()
        .filter_map(|stmt| {
            let message = match &stmt.node {
                IrNode::CreateIndex(ci) if ci.concurrent => CREATE_MESSAGE,
                IrNode::DropIndex(di) if di.concurrent => DROP_MESSAGE,
                _ => return None,
            };
            Some(Diagnostic::new(
                CODE,
                Level::Fatal,
                locate_statement(text, stmt.location),
                message,
            ))
        })
        .collect()
}
