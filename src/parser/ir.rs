//! Intermediate Representation (IR) for SQL statements
//!
//! Only the statement kinds the analyzers look at are modelled. Everything
//! else parses to [`IrNode::Ignored`].

#[derive(Debug, Clone, PartialEq)]
pub enum IrNode {
    CreateSchema(CreateSchema),
    CreateTable(CreateTable),
    AlterTable(AlterTable),
    CreateIndex(CreateIndex),
    DropIndex(DropIndex),
    Rename(Rename),
    /// SQL that parsed successfully but has no IR mapping (e.g., GRANT, INSERT).
    Ignored,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreateSchema {
    /// Empty for `CREATE SCHEMA AUTHORIZATION role`.
    pub name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreateTable {
    /// Unqualified table name.
    pub name: String,
    pub columns: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AlterTable {
    pub added_columns: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreateIndex {
    pub index_name: Option<String>,
    pub concurrent: bool,
}

/// One `DROP INDEX` statement, whatever the number of targets.
#[derive(Debug, Clone, PartialEq)]
pub struct DropIndex {
    pub concurrent: bool,
}

/// `ALTER ... RENAME [COLUMN] ... TO new_name`.
#[derive(Debug, Clone, PartialEq)]
pub struct Rename {
    pub kind: ObjectKind,
    pub new_name: String,
}

/// Object kinds a rename can target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObjectKind {
    Schema,
    Table,
    Index,
    Column,
    /// Any other kind, with the raw pg_query object type code and its name.
    Other { code: i32, label: String },
}

impl ObjectKind {
    pub fn as_str(&self) -> &str {
        match self {
            ObjectKind::Schema => "schema",
            ObjectKind::Table => "table",
            ObjectKind::Index => "index",
            ObjectKind::Column => "column",
            ObjectKind::Other { label, .. } => label,
        }
    }
}

/// A parsed statement with the raw byte offset pg_query reported for it.
///
/// `location` usually points at trivia before the first token (the newline
/// after the previous statement, or a comment). Use
/// [`crate::position::locate_statement`] to turn it into a line and column.
#[derive(Debug, Clone)]
pub struct Located<T> {
    pub node: T,
    pub location: usize,
}
