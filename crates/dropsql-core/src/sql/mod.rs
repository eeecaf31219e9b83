//! Expressions and statements: the objects a dropSQL front end produces.

pub mod expr;
pub mod stmt;

pub use expr::{BinaryOp, Expr};
pub use stmt::{
    AliasedTable, CreateTable, DeleteFrom, DropTable, InsertInto, Join, SelectColumn, SelectFrom,
    Stmt, UpdateSet,
};
