//! SQL parsing and IR generation

pub mod ir;
pub(crate) mod pg_query;

pub use ir::{
    AlterTable, CreateIndex, CreateSchema, CreateTable, DropIndex, IrNode, Located, ObjectKind,
    Rename,
};
pub use pg_query::{ParseError, parse_sql};
