//! Query engine: rows, evaluation contexts, expressions and lazy row sets.

pub mod expression;
pub mod row_set;

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::EvalError;
use crate::types::{ColumnDef, ColumnType, Scalar};

pub use expression::Expression;
pub use row_set::{
    CrossJoinRowSet, EmptyRowSet, FilteredRowSet, InnerJoinRowSet, MockRowSet, ProjectionRowSet,
    RenameTableRowSet, ResultColumn, RowIter, RowSet, TableRowSet,
};

/// A column of a row set's schema, tagged with the table it came from.
///
/// The tag is empty for computed columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub table: String,
    pub name: String,
    pub ty: ColumnType,
}

impl Column {
    pub fn new(table: impl Into<String>, name: impl Into<String>, ty: ColumnType) -> Self {
        Self {
            table: table.into(),
            name: name.into(),
            ty,
        }
    }

    /// Tag a stored column definition with its table name.
    pub fn from_def(table: &str, def: &ColumnDef) -> Self {
        Self::new(table, def.name.clone(), def.ty)
    }

    /// Whether this column answers the reference `[table.]name`.
    pub fn matches(&self, table: Option<&str>, name: &str) -> bool {
        self.name == name && table.is_none_or(|t| t == self.table)
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.table.is_empty() {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{}.{}", self.table, self.name)
        }
    }
}

/// One row produced by a row set.
///
/// `id` is the record index the row was read from, or `None` for rows that
/// do not map onto a single stored record (joins).
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub columns: Arc<[Column]>,
    pub values: Vec<Scalar>,
    pub id: Option<u32>,
}

impl Row {
    pub fn new(columns: Arc<[Column]>, values: Vec<Scalar>, id: Option<u32>) -> Self {
        debug_assert_eq!(columns.len(), values.len());
        Self {
            columns,
            values,
            id,
        }
    }

    /// Value of the column answering `[table.]name`.
    pub fn get(&self, table: Option<&str>, name: &str) -> Result<&Scalar, EvalError> {
        let mut found = None;
        for (column, value) in self.columns.iter().zip(&self.values) {
            if column.matches(table, name) {
                if found.is_some() {
                    return Err(EvalError::AmbiguousColumn(reference(table, name)));
                }
                found = Some(value);
            }
        }
        found.ok_or_else(|| EvalError::UnknownColumn(reference(table, name)))
    }
}

/// Everything an expression may look at while being evaluated.
#[derive(Debug, Clone, Copy)]
pub struct Context<'a> {
    pub row: &'a Row,
    pub args: &'a [Scalar],
}

impl<'a> Context<'a> {
    pub fn new(row: &'a Row, args: &'a [Scalar]) -> Self {
        Self { row, args }
    }

    /// Resolve a column reference against the current row.
    pub fn resolve(&self, table: Option<&str>, name: &str) -> Result<&'a Scalar, EvalError> {
        self.row.get(table, name)
    }

    /// Positional argument `?index`, counted from 1.
    pub fn arg(&self, index: usize) -> Result<&'a Scalar, EvalError> {
        index
            .checked_sub(1)
            .and_then(|i| self.args.get(i))
            .ok_or(EvalError::MissingArgument {
                index,
                count: self.args.len(),
            })
    }
}

pub(crate) fn reference(table: Option<&str>, name: &str) -> String {
    match table {
        Some(t) => format!("{t}.{name}"),
        None => name.to_string(),
    }
}
