//! pg_query AST to IR conversion
//!
//! Converts the pg_query crate's PostgreSQL AST into the IR consumed by the
//! analyzers, keeping each statement's raw byte location.

use crate::parser::ir::{
    AlterTable, CreateIndex, CreateSchema, CreateTable, DropIndex, IrNode, Located, ObjectKind,
    Rename,
};
use pg_query::NodeEnum;
use pg_query::protobuf::{AlterTableType, ObjectType};
use thiserror::Error;


/// The grammar provider rejected the input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ParseError {
    pub message: String,
}

/// Parse a SQL source string into a list of located IR nodes.
///
/// Each statement yields exactly one node. Statements that parse but have no
/// IR mapping are returned as `Ignored`.
pub fn parse_sql(source: &str) -> Result<Vec<Located<IrNode>>, ParseError> {
    let result = pg_query::parse(source).map_err(|err| ParseError {
        message: err.to_string(),
    })?;

    let mut nodes = Vec::new();
    for raw_stmt in &result.protobuf.stmts {
        let location = usize::try_from(raw_stmt.stmt_location).unwrap_or(0);
        let node = match raw_stmt.stmt.as_ref().and_then(|s| s.node.as_ref()) {
            Some(node_enum) => convert_node(node_enum),
            None => IrNode::Ignored,
        };
        nodes.push(Located { node, location });
    }
    Ok(nodes)
}

fn convert_node(node: &NodeEnum) -> IrNode {
    match node {
        NodeEnum::CreateSchemaStmt(schema) => IrNode::CreateSchema(CreateSchema {
            name: schema.schemaname.clone(),
        }),
        NodeEnum::CreateStmt(create) => convert_create_table(create),
        NodeEnum::AlterTableStmt(alter) if alter.objtype() == ObjectType::ObjectTable => {
            convert_alter_table(alter)
        }
        NodeEnum::IndexStmt(idx) => convert_create_index(idx),
        NodeEnum::DropStmt(drop) if drop.remove_type() == ObjectType::ObjectIndex => {
            IrNode::DropIndex(DropIndex {
                concurrent: drop.concurrent,
            })
        }
        NodeEnum::RenameStmt(rename) => convert_rename_stmt(rename),
        _ => IrNode::Ignored,
    }
}

// ---------------------------------------------------------------------------
// CREATE TABLE / ALTER TABLE
// ---------------------------------------------------------------------------

fn convert_create_table(create: &pg_query::protobuf::CreateStmt) -> IrNode {
    let columns = create
        .table_elts
        .iter()
        .filter_map(|elt| match elt.node.as_ref() {
            Some(NodeEnum::ColumnDef(col)) => Some(col.colname.clone()),
            _ => None,
        })
        .collect();

    IrNode::CreateTable(CreateTable {
        name: create
            .relation
            .as_ref()
            .map(|rel| rel.relname.clone())
            .unwrap_or_default(),
        columns,
    })
}

/// Only `ADD COLUMN` subcommands are modelled.
fn convert_alter_table(alter: &pg_query::protobuf::AlterTableStmt) -> IrNode {
    let added_columns = alter
        .cmds
        .iter()
        .filter_map(|cmd_node| match cmd_node.node.as_ref() {
            Some(NodeEnum::AlterTableCmd(cmd)) if cmd.subtype() == AlterTableType::AtAddColumn => {
                cmd.def.as_ref().and_then(|d| match d.node.as_ref() {
                    Some(NodeEnum::ColumnDef(col)) => Some(col.colname.clone()),
                    _ => None,
                })
            }
            _ => None,
        })
        .collect();

    IrNode::AlterTable(AlterTable { added_columns })
}

// ---------------------------------------------------------------------------
// Indexes
// ---------------------------------------------------------------------------

fn convert_create_index(idx: &pg_query::protobuf::IndexStmt) -> IrNode {
    let index_name = if idx.idxname.is_empty() {
        None
    } else {
        Some(idx.idxname.clone())
    };

    IrNode::CreateIndex(CreateIndex {
        index_name,
        concurrent: idx.concurrent,
    })
}

// ---------------------------------------------------------------------------
// RENAME
// ---------------------------------------------------------------------------

fn convert_rename_stmt(rename: &pg_query::protobuf::RenameStmt) -> IrNode {
    let kind = match rename.rename_type() {
        ObjectType::ObjectSchema => ObjectKind::Schema,
        ObjectType::ObjectTable => ObjectKind::Table,
        ObjectType::ObjectIndex => ObjectKind::Index,
        ObjectType::ObjectColumn => ObjectKind::Column,
        other => ObjectKind::Other {
            code: rename.rename_type,
            label: format!("{:?}", other),
        },
    };

    IrNode::Rename(Rename {
        kind,
        new_name: rename.newname.clone(),
    })
}
