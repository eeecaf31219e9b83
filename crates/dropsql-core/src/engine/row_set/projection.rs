use std::sync::Arc;

use super::{RowIter, RowSet, stop_on_error};
use crate::engine::{Column, Context, Expression, Row};
use crate::error::Result;
use crate::types::{ColumnType, Scalar};

/// One output column of a projection.
pub enum ResultColumn<'a> {
    /// Every column of the input, in order.
    Star,
    /// A computed column, named by its alias or else by its SQL text.
    Expression {
        expr: &'a dyn Expression,
        alias: Option<String>,
    },
}

impl<'a> ResultColumn<'a> {
    pub fn expr(expr: &'a dyn Expression) -> Self {
        ResultColumn::Expression { expr, alias: None }
    }

    pub fn aliased(expr: &'a dyn Expression, alias: impl Into<String>) -> Self {
        ResultColumn::Expression {
            expr,
            alias: Some(alias.into()),
        }
    }
}

/// Evaluates a list of result columns against every input row.
///
/// Output columns carry an empty table tag. Star columns keep the input
/// type; computed columns take the derived type of their expression, and
/// `integer` when none can be derived.
pub struct ProjectionRowSet<'a> {
    inner: Box<dyn RowSet + 'a>,
    outputs: Vec<ResultColumn<'a>>,
    args: &'a [Scalar],
    columns: Arc<[Column]>,
}

impl<'a> ProjectionRowSet<'a> {
    pub fn new(
        inner: Box<dyn RowSet + 'a>,
        outputs: Vec<ResultColumn<'a>>,
        args: &'a [Scalar],
    ) -> Self {
        let input = inner.columns();
        let mut columns = Vec::new();
        for output in &outputs {
            match output {
                ResultColumn::Star => {
                    columns.extend(input.iter().map(|c| Column::new("", c.name.clone(), c.ty)));
                }
                ResultColumn::Expression { expr, alias } => {
                    let name = alias.clone().unwrap_or_else(|| expr.to_sql());
                    let ty = expr.derive_type(&input).unwrap_or(ColumnType::Integer);
                    columns.push(Column::new("", name, ty));
                }
            }
        }
        Self {
            inner,
            outputs,
            args,
            columns: columns.into(),
        }
    }

    fn project(&self, row: Row) -> Result<Row> {
        let ctx = Context::new(&row, self.args);
        let mut values = Vec::with_capacity(self.columns.len());
        for output in &self.outputs {
            match output {
                ResultColumn::Star => values.extend(row.values.iter().cloned()),
                ResultColumn::Expression { expr, .. } => values.push(expr.evaluate(&ctx)?),
            }
        }
        Ok(Row::new(self.columns.clone(), values, row.id))
    }
}

impl RowSet for ProjectionRowSet<'_> {
    fn columns(&self) -> Arc<[Column]> {
        self.columns.clone()
    }

    fn iter(&self) -> RowIter<'_> {
        stop_on_error(self.inner.iter().map(move |row| self.project(row?)))
    }
}
