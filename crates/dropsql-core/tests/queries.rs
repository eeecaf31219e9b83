//! Row set composition over stored tables and statement execution.

use dropsql_core::api::{DBFile, ExecutionResult};
use dropsql_core::engine::{
    Column, CrossJoinRowSet, EmptyRowSet, FilteredRowSet, InnerJoinRowSet, MockRowSet,
    ProjectionRowSet, RenameTableRowSet, ResultColumn, Row, RowSet, TableRowSet,
};
use dropsql_core::error::{Error, SchemaError};
use dropsql_core::sql::{
    AliasedTable, BinaryOp, CreateTable, DeleteFrom, Expr, InsertInto, Join, SelectColumn,
    SelectFrom, Stmt,
};
use dropsql_core::types::{ColumnDef, ColumnType, MASTER_TABLE_NAME, Scalar};

fn values(rows: Vec<Row>) -> Vec<Vec<Scalar>> {
    rows.into_iter().map(|r| r.values).collect()
}

fn letters(table: &str, items: &[&str]) -> Box<MockRowSet> {
    Box::new(MockRowSet::new(
        vec![Column::new(table, "v", ColumnType::VarChar(4))],
        items.iter().map(|s| vec![Scalar::from(*s)]).collect(),
    ))
}

#[test]
fn test_cross_join_order() {
    let cross = CrossJoinRowSet::new(letters("a", &["a1", "a2"]), letters("b", &["b1", "b2"]));
    assert_eq!(
        values(cross.collect_rows().unwrap()),
        vec![
            vec![Scalar::from("a1"), Scalar::from("b1")],
            vec![Scalar::from("a1"), Scalar::from("b2")],
            vec![Scalar::from("a2"), Scalar::from("b1")],
            vec![Scalar::from("a2"), Scalar::from("b2")],
        ]
    );
    // restartable
    assert_eq!(cross.iter().count(), 4);
}

#[test]
fn test_inner_join_true_and_false() {
    let cross = CrossJoinRowSet::new(letters("a", &["a1", "a2"]), letters("b", &["b1", "b2"]));
    let expected = values(cross.collect_rows().unwrap());

    let yes = Expr::literal(1);
    let all = InnerJoinRowSet::new(
        letters("a", &["a1", "a2"]),
        letters("b", &["b1", "b2"]),
        &yes,
        &[],
    );
    assert_eq!(values(all.collect_rows().unwrap()), expected);

    let no = Expr::literal(0);
    let none = InnerJoinRowSet::new(
        letters("a", &["a1", "a2"]),
        letters("b", &["b1", "b2"]),
        &no,
        &[],
    );
    assert!(none.collect_rows().unwrap().is_empty());
}

#[test]
fn test_filter_idempotence() {
    let db = DBFile::memory().unwrap();
    let mut table = db
        .create_table("nums", vec![ColumnDef::new("n", ColumnType::Integer)])
        .unwrap();
    for n in 0..50 {
        table.insert(&[Scalar::Integer(n)]).unwrap();
    }
    table.delete(10).unwrap();

    let predicate = Expr::binary(
        BinaryOp::Or,
        Expr::binary(BinaryOp::Lt, Expr::column("n"), Expr::Placeholder(1)),
        Expr::binary(BinaryOp::Ge, Expr::column("n"), Expr::literal(45)),
    );
    let args = [Scalar::Integer(20)];

    let once = FilteredRowSet::new(db.row_set("nums").unwrap(), &predicate, &args);
    let twice = FilteredRowSet::new(
        Box::new(FilteredRowSet::new(db.row_set("nums").unwrap(), &predicate, &args)),
        &predicate,
        &args,
    );
    let once = once.collect_rows().unwrap();
    assert_eq!(once.len(), 19 + 5);
    assert_eq!(once, twice.collect_rows().unwrap());
}

#[test]
fn test_master_table_lists_live_tables() {
    let db = DBFile::memory().unwrap();
    db.create_table("t1", vec![ColumnDef::new("a", ColumnType::Integer)])
        .unwrap();
    db.create_table("t2", vec![ColumnDef::new("b", ColumnType::VarChar(9))])
        .unwrap();
    db.create_table("gone", vec![ColumnDef::new("c", ColumnType::Float)])
        .unwrap();
    db.drop_table("gone").unwrap();

    let master = db.row_set(MASTER_TABLE_NAME).unwrap();
    let columns: Vec<_> = master.columns().iter().map(|c| c.name.clone()).collect();
    assert_eq!(columns, vec!["type", "name", "sql"]);

    let rows = master.collect_rows().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].values[1], Scalar::from("t1"));
    assert_eq!(rows[1].values[1], Scalar::from("t2"));
    assert_eq!(
        rows[1].values[2],
        Scalar::from("/create table t2 ( b varchar(9) ) /drop")
    );
}

#[test]
fn test_manual_pipeline_over_tables() {
    let db = DBFile::memory().unwrap();
    let mut owners = db
        .create_table(
            "owners",
            vec![
                ColumnDef::new("id", ColumnType::Integer),
                ColumnDef::new("name", ColumnType::VarChar(10)),
            ],
        )
        .unwrap();
    let mut pets = db
        .create_table(
            "pets",
            vec![
                ColumnDef::new("owner", ColumnType::Integer),
                ColumnDef::new("name", ColumnType::VarChar(10)),
            ],
        )
        .unwrap();
    owners.insert(&[Scalar::Integer(1), Scalar::from("ann")]).unwrap();
    owners.insert(&[Scalar::Integer(2), Scalar::from("ben")]).unwrap();
    pets.insert(&[Scalar::Integer(2), Scalar::from("rex")]).unwrap();
    pets.insert(&[Scalar::Integer(1), Scalar::from("tom")]).unwrap();
    pets.insert(&[Scalar::Integer(2), Scalar::from("kit")]).unwrap();

    let on = Expr::binary(BinaryOp::Eq, Expr::qualified("o", "id"), Expr::qualified("p", "owner"));
    let owner_name = Expr::qualified("o", "name");
    let pet_name = Expr::qualified("p", "name");

    let joined = InnerJoinRowSet::new(
        Box::new(RenameTableRowSet::new(
            Box::new(TableRowSet::new(db.table("owners").unwrap())),
            "o",
        )),
        Box::new(RenameTableRowSet::new(
            Box::new(TableRowSet::new(db.table("pets").unwrap())),
            "p",
        )),
        &on,
        &[],
    );
    let projection = ProjectionRowSet::new(
        Box::new(joined),
        vec![
            ResultColumn::aliased(&owner_name, "owner"),
            ResultColumn::aliased(&pet_name, "pet"),
        ],
        &[],
    );

    assert_eq!(
        values(projection.collect_rows().unwrap()),
        vec![
            vec![Scalar::from("ann"), Scalar::from("tom")],
            vec![Scalar::from("ben"), Scalar::from("rex")],
            vec![Scalar::from("ben"), Scalar::from("kit")],
        ]
    );
}

#[test]
fn test_empty_row_set_in_joins() {
    let cross = CrossJoinRowSet::new(Box::new(EmptyRowSet), letters("b", &["b1"]));
    assert_eq!(cross.columns().len(), 1);
    assert!(cross.collect_rows().unwrap().is_empty());
}

#[test]
fn test_statements_on_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("statements.db");

    {
        let db = DBFile::open(&path).unwrap();
        let script = vec![
            Stmt::CreateTable(CreateTable {
                if_not_exists: false,
                name: "kv".into(),
                columns: vec![
                    ColumnDef::new("k", ColumnType::VarChar(8)),
                    ColumnDef::new("v", ColumnType::Integer),
                ],
            }),
            Stmt::InsertInto(InsertInto {
                table: "kv".into(),
                columns: vec![],
                values: vec![
                    vec![Expr::literal("a"), Expr::Placeholder(1)],
                    vec![Expr::literal("b"), Expr::Placeholder(2)],
                    vec![Expr::literal("c"), Expr::literal(3)],
                ],
            }),
            Stmt::DeleteFrom(DeleteFrom {
                table: "kv".into(),
                where_clause: Some(Expr::binary(
                    BinaryOp::Eq,
                    Expr::column("k"),
                    Expr::literal("b"),
                )),
            }),
        ];
        let args = [Scalar::Integer(10), Scalar::Integer(20)];
        for stmt in &script {
            db.execute(stmt, &args).unwrap();
        }
        db.close().unwrap();
    }

    let db = DBFile::open(&path).unwrap();
    let select = SelectFrom {
        columns: vec![
            SelectColumn::Star,
            SelectColumn::Expr {
                expr: Expr::binary(BinaryOp::Add, Expr::column("k"), Expr::literal("!")),
                alias: None,
            },
        ],
        table: AliasedTable::new("kv"),
        joins: vec![Join::Cross(AliasedTable::new(MASTER_TABLE_NAME))],
        where_clause: None,
    };
    let ExecutionResult::RowSet(rows) = db.execute(&select, &[]).unwrap() else {
        panic!("expected a row set");
    };
    let names: Vec<_> = rows.columns().iter().map(|c| c.name.clone()).collect();
    assert_eq!(names, vec!["k", "v", "type", "name", "sql", "k + '!'"]);

    let rows = rows.collect_rows().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].values[0], Scalar::from("a"));
    assert_eq!(rows[0].values[1], Scalar::Integer(10));
    assert_eq!(rows[1].values[5], Scalar::from("c!"));

    let insert_master = InsertInto {
        table: MASTER_TABLE_NAME.into(),
        columns: vec![],
        values: vec![],
    };
    assert!(matches!(
        db.execute(&insert_master, &[]),
        Err(Error::Schema(SchemaError::ReadOnlyTable(_)))
    ));
}
