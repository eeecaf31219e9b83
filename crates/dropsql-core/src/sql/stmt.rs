//! Statement objects and their execution against a [`DBFile`].

use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::api::{DBFile, ExecutionResult, Statement};
use crate::encoding::record::validate_values;
use crate::engine::{
    Context, CrossJoinRowSet, Expression, FilteredRowSet, InnerJoinRowSet, ProjectionRowSet,
    RenameTableRowSet, ResultColumn, Row, RowSet, TableRowSet,
};
use crate::error::{Error, Result, SchemaError};
use crate::table::Table;
use crate::types::{ColumnDef, ColumnType, MASTER_TABLE_NAME, Scalar};

use super::expr::Expr;

/// A table reference in `from` or `join`, optionally aliased.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AliasedTable {
    pub name: String,
    pub alias: Option<String>,
}

impl AliasedTable {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            alias: None,
        }
    }

    pub fn aliased(name: impl Into<String>, alias: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            alias: Some(alias.into()),
        }
    }

    fn row_set<'a>(&self, db: &'a DBFile) -> Result<Box<dyn RowSet + 'a>> {
        let rows = db.row_set(&self.name)?;
        Ok(match &self.alias {
            Some(alias) => Box::new(RenameTableRowSet::new(rows, alias)),
            None => rows,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Join {
    /// `from a, b`
    Cross(AliasedTable),
    /// `join b on ...`; without a constraint it is a cross join.
    Inner {
        table: AliasedTable,
        on: Option<Expr>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SelectColumn {
    Star,
    Expr { expr: Expr, alias: Option<String> },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateTable {
    pub if_not_exists: bool,
    pub name: String,
    pub columns: Vec<ColumnDef>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DropTable {
    pub if_exists: bool,
    pub name: String,
}

/// `insert into t [(columns)] values (...), ...`
///
/// An explicit column list must name every column of the table exactly
/// once; values are reordered into declaration order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsertInto {
    pub table: String,
    pub columns: Vec<String>,
    pub values: Vec<Vec<Expr>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectFrom {
    pub columns: Vec<SelectColumn>,
    pub table: AliasedTable,
    pub joins: Vec<Join>,
    pub where_clause: Option<Expr>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateSet {
    pub table: String,
    pub assignments: Vec<(String, Expr)>,
    pub where_clause: Option<Expr>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeleteFrom {
    pub table: String,
    pub where_clause: Option<Expr>,
}

/// Any statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Stmt {
    CreateTable(CreateTable),
    DropTable(DropTable),
    InsertInto(InsertInto),
    SelectFrom(SelectFrom),
    UpdateSet(UpdateSet),
    DeleteFrom(DeleteFrom),
}

impl Statement for Stmt {
    fn execute<'a>(&'a self, db: &'a DBFile, args: &'a [Scalar]) -> Result<ExecutionResult<'a>> {
        match self {
            Stmt::CreateTable(s) => s.execute(db, args),
            Stmt::DropTable(s) => s.execute(db, args),
            Stmt::InsertInto(s) => s.execute(db, args),
            Stmt::SelectFrom(s) => s.execute(db, args),
            Stmt::UpdateSet(s) => s.execute(db, args),
            Stmt::DeleteFrom(s) => s.execute(db, args),
        }
    }
}

impl Statement for CreateTable {
    fn execute<'a>(&'a self, db: &'a DBFile, _args: &'a [Scalar]) -> Result<ExecutionResult<'a>> {
        match db.create_table(&self.name, self.columns.clone()) {
            Ok(_) => Ok(ExecutionResult::Done),
            Err(Error::Schema(SchemaError::TableAlreadyExists(_))) if self.if_not_exists => {
                Ok(ExecutionResult::Done)
            }
            Err(e) => Err(e),
        }
    }
}

impl Statement for DropTable {
    fn execute<'a>(&'a self, db: &'a DBFile, _args: &'a [Scalar]) -> Result<ExecutionResult<'a>> {
        match db.drop_table(&self.name) {
            Ok(()) => Ok(ExecutionResult::Done),
            Err(Error::Schema(SchemaError::TableNotFound(_))) if self.if_exists => {
                Ok(ExecutionResult::Done)
            }
            Err(e) => Err(e),
        }
    }
}

impl InsertInto {
    /// Position in the table of every listed column, in list order.
    fn positions(&self, table: &Table<'_>) -> Result<Vec<usize>> {
        let declared = table.columns().len();
        if self.columns.is_empty() {
            return Ok((0..declared).collect());
        }

        let mut seen = HashSet::new();
        let mut positions = Vec::with_capacity(self.columns.len());
        for name in &self.columns {
            let index = table
                .descriptor()
                .column_index(name)
                .ok_or_else(|| SchemaError::UnknownColumn(name.clone()))?;
            if !seen.insert(index) {
                return Err(SchemaError::DuplicateColumn(name.clone()).into());
            }
            positions.push(index);
        }
        if positions.len() != declared {
            return Err(SchemaError::ArityMismatch {
                expected: declared,
                actual: positions.len(),
            }
            .into());
        }
        Ok(positions)
    }
}

impl Statement for InsertInto {
    fn execute<'a>(&'a self, db: &'a DBFile, args: &'a [Scalar]) -> Result<ExecutionResult<'a>> {
        let mut table = writable(db, &self.table)?;
        let positions = self.positions(&table)?;
        let empty = Row::new(Arc::from(Vec::new()), Vec::new(), None);
        let ctx = Context::new(&empty, args);

        // evaluate and validate every tuple before writing any of them
        let mut records = Vec::with_capacity(self.values.len());
        for tuple in &self.values {
            if tuple.len() != positions.len() {
                return Err(SchemaError::ArityMismatch {
                    expected: positions.len(),
                    actual: tuple.len(),
                }
                .into());
            }
            let mut record = tuple
                .iter()
                .map(|expr| expr.evaluate(&ctx))
                .collect::<Result<Vec<_>>>()?;
            let mut ordered = vec![Scalar::Integer(0); positions.len()];
            for (&position, value) in positions.iter().zip(record.drain(..)) {
                ordered[position] = value;
            }
            let ordered = widen(table.columns(), ordered);
            validate_values(table.columns(), &ordered)?;
            records.push(ordered);
        }

        for record in &records {
            table.insert(record)?;
        }
        debug!(table = %self.table, rows = records.len(), "inserted");
        Ok(ExecutionResult::Affected(records.len()))
    }
}

impl Statement for SelectFrom {
    fn execute<'a>(&'a self, db: &'a DBFile, args: &'a [Scalar]) -> Result<ExecutionResult<'a>> {
        let mut rows = self.table.row_set(db)?;
        for join in &self.joins {
            rows = match join {
                Join::Cross(table) | Join::Inner { table, on: None } => {
                    Box::new(CrossJoinRowSet::new(rows, table.row_set(db)?))
                }
                Join::Inner {
                    table,
                    on: Some(on),
                } => Box::new(InnerJoinRowSet::new(rows, table.row_set(db)?, on, args)),
            };
        }
        if let Some(predicate) = &self.where_clause {
            rows = Box::new(FilteredRowSet::new(rows, predicate, args));
        }

        let outputs = self
            .columns
            .iter()
            .map(|column| match column {
                SelectColumn::Star => ResultColumn::Star,
                SelectColumn::Expr { expr, alias } => ResultColumn::Expression {
                    expr,
                    alias: alias.clone(),
                },
            })
            .collect();
        Ok(ExecutionResult::RowSet(Box::new(ProjectionRowSet::new(
            rows, outputs, args,
        ))))
    }
}

impl Statement for UpdateSet {
    fn execute<'a>(&'a self, db: &'a DBFile, args: &'a [Scalar]) -> Result<ExecutionResult<'a>> {
        let mut table = writable(db, &self.table)?;
        let mut targets = Vec::with_capacity(self.assignments.len());
        for (name, expr) in &self.assignments {
            let index = table
                .descriptor()
                .column_index(name)
                .ok_or_else(|| SchemaError::UnknownColumn(name.clone()))?;
            targets.push((index, expr));
        }

        let mut updates = Vec::new();
        for row in matching_rows(db, &table, self.where_clause.as_ref(), args)? {
            let ctx = Context::new(&row, args);
            let mut values = row.values.clone();
            for (index, expr) in &targets {
                values[*index] = expr.evaluate(&ctx)?;
            }
            let values = widen(table.columns(), values);
            validate_values(table.columns(), &values)?;
            if let Some(id) = row.id {
                updates.push((id, values));
            }
        }

        for (id, values) in &updates {
            table.update(*id, values)?;
        }
        Ok(ExecutionResult::Affected(updates.len()))
    }
}

impl Statement for DeleteFrom {
    fn execute<'a>(&'a self, db: &'a DBFile, args: &'a [Scalar]) -> Result<ExecutionResult<'a>> {
        let mut table = writable(db, &self.table)?;
        let ids: Vec<u32> = matching_rows(db, &table, self.where_clause.as_ref(), args)?
            .into_iter()
            .filter_map(|row| row.id)
            .collect();
        for &id in &ids {
            table.delete(id)?;
        }
        Ok(ExecutionResult::Affected(ids.len()))
    }
}

/// Open a table that statements may modify.
fn writable<'a>(db: &'a DBFile, name: &str) -> Result<Table<'a>> {
    if name == MASTER_TABLE_NAME {
        return Err(SchemaError::ReadOnlyTable(name.to_string()).into());
    }
    db.table(name)
}

/// Live rows of `table` matching the predicate, collected before any write.
fn matching_rows(
    db: &DBFile,
    table: &Table<'_>,
    predicate: Option<&Expr>,
    args: &[Scalar],
) -> Result<Vec<Row>> {
    let scan = TableRowSet::new(Table::open(db, table.slot())?);
    match predicate {
        Some(predicate) => FilteredRowSet::new(Box::new(scan), predicate, args).collect_rows(),
        None => scan.collect_rows(),
    }
}

/// Integers assigned to float columns become floats.
fn widen(columns: &[ColumnDef], values: Vec<Scalar>) -> Vec<Scalar> {
    columns
        .iter()
        .zip(values)
        .map(|(column, value)| match (column.ty, value) {
            (ColumnType::Float, Scalar::Integer(v)) => Scalar::Float(v as f32),
            (_, value) => value,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::sql::BinaryOp;

    fn db_with_pets() -> DBFile {
        let db = DBFile::memory().unwrap();
        let create = CreateTable {
            if_not_exists: false,
            name: "pets".into(),
            columns: vec![
                ColumnDef::new("id", ColumnType::Integer).primary_key(),
                ColumnDef::new("name", ColumnType::VarChar(16)),
                ColumnDef::new("weight", ColumnType::Float),
            ],
        };
        db.execute(&create, &[]).unwrap();

        let insert = InsertInto {
            table: "pets".into(),
            columns: vec![],
            values: vec![
                vec![Expr::literal(1), Expr::literal("cat"), Expr::literal(4.5f32)],
                vec![Expr::literal(2), Expr::literal("dog"), Expr::literal(20)],
                vec![Expr::literal(3), Expr::literal("eel"), Expr::Placeholder(1)],
            ],
        };
        match db.execute(&insert, &[Scalar::Float(1.25)]).unwrap() {
            ExecutionResult::Affected(3) => {}
            other => panic!("expected Affected(3), got {other:?}"),
        }
        db
    }

    fn select_all(db: &DBFile, where_clause: Option<Expr>) -> Vec<Vec<Scalar>> {
        let select = SelectFrom {
            columns: vec![SelectColumn::Star],
            table: AliasedTable::new("pets"),
            joins: vec![],
            where_clause,
        };
        match db.execute(&select, &[]).unwrap() {
            ExecutionResult::RowSet(rows) => rows
                .collect_rows()
                .unwrap()
                .into_iter()
                .map(|r| r.values)
                .collect(),
            other => panic!("expected RowSet, got {other:?}"),
        }
    }

    #[test]
    fn test_insert_widens_integers_for_float_columns() {
        let db = db_with_pets();
        let rows = select_all(&db, None);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[1][2], Scalar::Float(20.0));
        assert_eq!(rows[2][2], Scalar::Float(1.25));
    }

    #[test]
    fn test_insert_with_column_list() {
        let db = db_with_pets();
        let insert = InsertInto {
            table: "pets".into(),
            columns: vec!["weight".into(), "id".into(), "name".into()],
            values: vec![vec![
                Expr::literal(0.5f32),
                Expr::literal(4),
                Expr::literal("ant"),
            ]],
        };
        db.execute(&insert, &[]).unwrap();
        let rows = select_all(&db, None);
        assert_eq!(
            rows[3],
            vec![Scalar::Integer(4), Scalar::from("ant"), Scalar::Float(0.5)]
        );
    }

    #[test]
    fn test_insert_column_list_errors() {
        let db = db_with_pets();
        let partial = InsertInto {
            table: "pets".into(),
            columns: vec!["id".into()],
            values: vec![vec![Expr::literal(9)]],
        };
        let err = db.execute(&partial, &[]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SchemaViolation);

        let unknown = InsertInto {
            table: "pets".into(),
            columns: vec!["id".into(), "name".into(), "colour".into()],
            values: vec![],
        };
        match db.execute(&unknown, &[]) {
            Err(Error::Schema(SchemaError::UnknownColumn(name))) => assert_eq!(name, "colour"),
            other => panic!("expected UnknownColumn, got {other:?}"),
        }

        let twice = InsertInto {
            table: "pets".into(),
            columns: vec!["id".into(), "id".into(), "name".into()],
            values: vec![],
        };
        assert!(matches!(
            db.execute(&twice, &[]),
            Err(Error::Schema(SchemaError::DuplicateColumn(_)))
        ));
    }

    #[test]
    fn test_insert_is_all_or_nothing() {
        let db = db_with_pets();
        let insert = InsertInto {
            table: "pets".into(),
            columns: vec![],
            values: vec![
                vec![Expr::literal(5), Expr::literal("ok"), Expr::literal(1.0f32)],
                vec![Expr::literal("bad"), Expr::literal("x"), Expr::literal(1.0f32)],
            ],
        };
        let err = db.execute(&insert, &[]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TypeMismatch);
        assert_eq!(db.table("pets").unwrap().record_count(), 3);
    }

    #[test]
    fn test_select_where_and_projection() {
        let db = db_with_pets();
        let select = SelectFrom {
            columns: vec![
                SelectColumn::Expr {
                    expr: Expr::column("name"),
                    alias: None,
                },
                SelectColumn::Expr {
                    expr: Expr::binary(BinaryOp::Mul, Expr::column("weight"), Expr::literal(2)),
                    alias: Some("double".into()),
                },
            ],
            table: AliasedTable::aliased("pets", "p"),
            joins: vec![],
            where_clause: Some(Expr::binary(
                BinaryOp::Gt,
                Expr::qualified("p", "weight"),
                Expr::Placeholder(1),
            )),
        };
        let args = [Scalar::Float(2.0)];
        let ExecutionResult::RowSet(rows) = db.execute(&select, &args).unwrap() else {
            panic!("expected a row set");
        };
        let columns = rows.columns();
        assert_eq!(columns[0].name, "name");
        assert_eq!(columns[0].ty, ColumnType::VarChar(16));
        assert_eq!(columns[1].name, "double");
        assert_eq!(columns[1].ty, ColumnType::Float);

        let values: Vec<_> = rows
            .collect_rows()
            .unwrap()
            .into_iter()
            .map(|r| r.values)
            .collect();
        assert_eq!(
            values,
            vec![
                vec![Scalar::from("cat"), Scalar::Float(9.0)],
                vec![Scalar::from("dog"), Scalar::Float(40.0)],
            ]
        );
    }

    #[test]
    fn test_self_join_with_aliases() {
        let db = db_with_pets();
        let select = SelectFrom {
            columns: vec![
                SelectColumn::Expr {
                    expr: Expr::qualified("a", "name"),
                    alias: None,
                },
                SelectColumn::Expr {
                    expr: Expr::qualified("b", "name"),
                    alias: None,
                },
            ],
            table: AliasedTable::aliased("pets", "a"),
            joins: vec![Join::Inner {
                table: AliasedTable::aliased("pets", "b"),
                on: Some(Expr::binary(
                    BinaryOp::Eq,
                    Expr::qualified("b", "id"),
                    Expr::binary(BinaryOp::Add, Expr::qualified("a", "id"), Expr::literal(1)),
                )),
            }],
            where_clause: None,
        };
        let ExecutionResult::RowSet(rows) = db.execute(&select, &[]).unwrap() else {
            panic!("expected a row set");
        };
        let pairs: Vec<_> = rows
            .collect_rows()
            .unwrap()
            .into_iter()
            .map(|r| (r.values[0].to_string(), r.values[1].to_string()))
            .collect();
        assert_eq!(
            pairs,
            vec![("cat".into(), "dog".into()), ("dog".into(), "eel".into())]
        );
    }

    #[test]
    fn test_update_and_delete() {
        let db = db_with_pets();
        let update = UpdateSet {
            table: "pets".into(),
            assignments: vec![(
                "weight".into(),
                Expr::binary(BinaryOp::Add, Expr::column("weight"), Expr::literal(1)),
            )],
            where_clause: Some(Expr::binary(
                BinaryOp::Ne,
                Expr::column("name"),
                Expr::literal("dog"),
            )),
        };
        match db.execute(&update, &[]).unwrap() {
            ExecutionResult::Affected(2) => {}
            other => panic!("expected Affected(2), got {other:?}"),
        }
        let rows = select_all(&db, None);
        assert_eq!(rows[0][2], Scalar::Float(5.5));
        assert_eq!(rows[1][2], Scalar::Float(20.0));
        assert_eq!(rows[2][2], Scalar::Float(2.25));

        let delete = DeleteFrom {
            table: "pets".into(),
            where_clause: Some(Expr::binary(
                BinaryOp::Lt,
                Expr::column("id"),
                Expr::literal(3),
            )),
        };
        match db.execute(&delete, &[]).unwrap() {
            ExecutionResult::Affected(2) => {}
            other => panic!("expected Affected(2), got {other:?}"),
        }
        let rows = select_all(&db, None);
        assert_eq!(rows, vec![vec![
            Scalar::Integer(3),
            Scalar::from("eel"),
            Scalar::Float(2.25)
        ]]);
        assert_eq!(db.table("pets").unwrap().record_count(), 3);
    }

    #[test]
    fn test_update_unknown_column() {
        let db = db_with_pets();
        let update = UpdateSet {
            table: "pets".into(),
            assignments: vec![("colour".into(), Expr::literal("red"))],
            where_clause: None,
        };
        assert!(matches!(
            db.execute(&update, &[]),
            Err(Error::Schema(SchemaError::UnknownColumn(_)))
        ));
    }

    #[test]
    fn test_master_table_rejects_writes() {
        let db = db_with_pets();
        let delete = DeleteFrom {
            table: MASTER_TABLE_NAME.into(),
            where_clause: None,
        };
        assert!(matches!(
            db.execute(&delete, &[]),
            Err(Error::Schema(SchemaError::ReadOnlyTable(_)))
        ));

        let select = SelectFrom {
            columns: vec![SelectColumn::Expr {
                expr: Expr::column("name"),
                alias: None,
            }],
            table: AliasedTable::new(MASTER_TABLE_NAME),
            joins: vec![],
            where_clause: None,
        };
        let ExecutionResult::RowSet(rows) = db.execute(&select, &[]).unwrap() else {
            panic!("expected a row set");
        };
        let rows = rows.collect_rows().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].values[0], Scalar::from("pets"));
    }

    #[test]
    fn test_existence_clauses() {
        let db = db_with_pets();
        let again = CreateTable {
            if_not_exists: true,
            name: "pets".into(),
            columns: vec![ColumnDef::new("x", ColumnType::Integer)],
        };
        assert!(matches!(db.execute(&again, &[]), Ok(ExecutionResult::Done)));
        let strict = CreateTable {
            if_not_exists: false,
            ..again
        };
        assert!(db.execute(&strict, &[]).is_err());

        let drop_missing = DropTable {
            if_exists: true,
            name: "ghost".into(),
        };
        assert!(matches!(db.execute(&drop_missing, &[]), Ok(ExecutionResult::Done)));

        let drop = Stmt::DropTable(DropTable {
            if_exists: false,
            name: "pets".into(),
        });
        db.execute(&drop, &[]).unwrap();
        assert!(db.execute(&drop, &[]).is_err());
    }
}
