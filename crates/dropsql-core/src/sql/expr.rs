//! Expression trees evaluated against rows.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::engine::{Column, Context, Expression};
use crate::error::{EvalError, Result};
use crate::types::{ColumnType, Scalar};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
    And,
    Or,
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::Eq => "=",
            BinaryOp::Ne => "!=",
            BinaryOp::And => "and",
            BinaryOp::Or => "or",
        }
    }

    fn is_arithmetic(self) -> bool {
        matches!(
            self,
            BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div
        )
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// An expression tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    Literal(Scalar),
    /// Positional argument `?N`, counted from 1.
    Placeholder(usize),
    /// Column reference, optionally qualified by table name or alias.
    Reference {
        table: Option<String>,
        column: String,
    },
    Paren(Box<Expr>),
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
}

impl Expr {
    pub fn literal(value: impl Into<Scalar>) -> Self {
        Expr::Literal(value.into())
    }

    pub fn column(column: impl Into<String>) -> Self {
        Expr::Reference {
            table: None,
            column: column.into(),
        }
    }

    pub fn qualified(table: impl Into<String>, column: impl Into<String>) -> Self {
        Expr::Reference {
            table: Some(table.into()),
            column: column.into(),
        }
    }

    pub fn paren(inner: Expr) -> Self {
        Expr::Paren(Box::new(inner))
    }

    pub fn binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> Self {
        Expr::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    fn eval(&self, ctx: &Context<'_>) -> std::result::Result<Scalar, EvalError> {
        match self {
            Expr::Literal(value) => Ok(value.clone()),
            Expr::Placeholder(index) => ctx.arg(*index).cloned(),
            Expr::Reference { table, column } => ctx.resolve(table.as_deref(), column).cloned(),
            Expr::Paren(inner) => inner.eval(ctx),
            Expr::Binary { op, lhs, rhs } => {
                let left = lhs.eval(ctx)?;
                match op {
                    BinaryOp::And if !left.is_truthy() => Ok(Scalar::Integer(0)),
                    BinaryOp::Or if left.is_truthy() => Ok(Scalar::Integer(1)),
                    BinaryOp::And | BinaryOp::Or => {
                        Ok(boolean(rhs.eval(ctx)?.is_truthy()))
                    }
                    _ => apply(*op, &left, &rhs.eval(ctx)?),
                }
            }
        }
    }
}

impl Expression for Expr {
    fn evaluate(&self, ctx: &Context<'_>) -> Result<Scalar> {
        Ok(self.eval(ctx)?)
    }

    fn to_sql(&self) -> String {
        match self {
            Expr::Literal(Scalar::VarChar(s)) => {
                format!("'{}'", s.replace('\\', "\\\\").replace('\'', "\\'"))
            }
            Expr::Literal(value) => value.to_string(),
            Expr::Placeholder(index) => format!("?{index}"),
            Expr::Reference {
                table: Some(table),
                column,
            } => format!("{table}.{column}"),
            Expr::Reference { table: None, column } => column.clone(),
            Expr::Paren(inner) => format!("({})", inner.to_sql()),
            Expr::Binary { op, lhs, rhs } => {
                format!("{} {op} {}", lhs.to_sql(), rhs.to_sql())
            }
        }
    }

    fn derive_type(&self, schema: &[Column]) -> Option<ColumnType> {
        match self {
            Expr::Literal(Scalar::Integer(_)) => Some(ColumnType::Integer),
            Expr::Literal(Scalar::Float(_)) => Some(ColumnType::Float),
            Expr::Literal(Scalar::VarChar(s)) => Some(varchar(s.len())),
            Expr::Placeholder(_) => None,
            Expr::Reference { table, column } => {
                let mut matching = schema.iter().filter(|c| c.matches(table.as_deref(), column));
                match (matching.next(), matching.next()) {
                    (Some(c), None) => Some(c.ty),
                    _ => None,
                }
            }
            Expr::Paren(inner) => inner.derive_type(schema),
            Expr::Binary { op, lhs, rhs } if op.is_arithmetic() => {
                match (lhs.derive_type(schema), rhs.derive_type(schema)) {
                    (Some(ColumnType::VarChar(a)), Some(ColumnType::VarChar(b))) => {
                        Some(varchar(a as usize + b as usize))
                    }
                    (Some(ColumnType::Float), _) | (_, Some(ColumnType::Float)) => {
                        Some(ColumnType::Float)
                    }
                    _ => Some(ColumnType::Integer),
                }
            }
            Expr::Binary { .. } => Some(ColumnType::Integer),
        }
    }
}

/// A VarChar type wide enough for `len` bytes, kept within the encodable range.
fn varchar(len: usize) -> ColumnType {
    ColumnType::VarChar(len.clamp(1, u16::MAX as usize - 1) as u16)
}

fn boolean(value: bool) -> Scalar {
    Scalar::Integer(value as i32)
}

fn apply(op: BinaryOp, lhs: &Scalar, rhs: &Scalar) -> std::result::Result<Scalar, EvalError> {
    let invalid = || EvalError::InvalidOperands {
        op: op.symbol(),
        lhs: lhs.type_name(),
        rhs: rhs.type_name(),
    };

    if op.is_arithmetic() {
        return match (lhs, rhs) {
            (Scalar::Integer(a), Scalar::Integer(b)) => integer_arithmetic(op, *a, *b),
            (Scalar::VarChar(a), Scalar::VarChar(b)) if op == BinaryOp::Add => {
                Ok(Scalar::VarChar(format!("{a}{b}")))
            }
            _ => match (as_float(lhs), as_float(rhs)) {
                (Some(a), Some(b)) => float_arithmetic(op, a, b),
                _ => Err(invalid()),
            },
        };
    }

    let ordering = compare(lhs, rhs).ok_or_else(invalid)?;
    let verdict = match op {
        BinaryOp::Lt => ordering == Some(Ordering::Less),
        BinaryOp::Le => matches!(ordering, Some(Ordering::Less | Ordering::Equal)),
        BinaryOp::Gt => ordering == Some(Ordering::Greater),
        BinaryOp::Ge => matches!(ordering, Some(Ordering::Greater | Ordering::Equal)),
        BinaryOp::Eq => ordering == Some(Ordering::Equal),
        BinaryOp::Ne => ordering != Some(Ordering::Equal),
        _ => return Err(invalid()),
    };
    Ok(boolean(verdict))
}

fn integer_arithmetic(op: BinaryOp, a: i32, b: i32) -> std::result::Result<Scalar, EvalError> {
    let result = match op {
        BinaryOp::Add => a.checked_add(b),
        BinaryOp::Sub => a.checked_sub(b),
        BinaryOp::Mul => a.checked_mul(b),
        BinaryOp::Div if b == 0 => return Err(EvalError::DivisionByZero),
        BinaryOp::Div => a.checked_div(b),
        _ => None,
    };
    result.map(Scalar::Integer).ok_or(EvalError::Overflow)
}

fn float_arithmetic(op: BinaryOp, a: f32, b: f32) -> std::result::Result<Scalar, EvalError> {
    let result = match op {
        BinaryOp::Add => a + b,
        BinaryOp::Sub => a - b,
        BinaryOp::Mul => a * b,
        BinaryOp::Div if b == 0.0 => return Err(EvalError::DivisionByZero),
        BinaryOp::Div => a / b,
        _ => return Err(EvalError::Overflow),
    };
    Ok(Scalar::Float(result))
}

fn as_float(value: &Scalar) -> Option<f32> {
    match value {
        Scalar::Integer(v) => Some(*v as f32),
        Scalar::Float(v) => Some(*v),
        Scalar::VarChar(_) => None,
    }
}

/// Order two scalars. The outer `None` means the types are not comparable;
/// the inner `None` means they are but the values are unordered (NaN).
fn compare(lhs: &Scalar, rhs: &Scalar) -> Option<Option<Ordering>> {
    match (lhs, rhs) {
        (Scalar::Integer(a), Scalar::Integer(b)) => Some(Some(a.cmp(b))),
        (Scalar::VarChar(a), Scalar::VarChar(b)) => Some(Some(a.cmp(b))),
        _ => {
            let (a, b) = (as_float(lhs)?, as_float(rhs)?);
            Some(a.partial_cmp(&b))
        }
    }
}
