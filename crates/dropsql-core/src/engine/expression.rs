use crate::error::Result;
use crate::types::{ColumnType, Scalar};

use super::{Column, Context};

/// Something that evaluates to a scalar for one row.
pub trait Expression {
    fn evaluate(&self, ctx: &Context<'_>) -> Result<Scalar>;

    /// Textual form, used as the column name of an unaliased projection.
    fn to_sql(&self) -> String;

    /// Best-effort static type against an input schema, if one can be derived.
    fn derive_type(&self, _schema: &[Column]) -> Option<ColumnType> {
        None
    }
}

impl<E: Expression + ?Sized> Expression for &E {
    fn evaluate(&self, ctx: &Context<'_>) -> Result<Scalar> {
        (**self).evaluate(ctx)
    }

    fn to_sql(&self) -> String {
        (**self).to_sql()
    }

    fn derive_type(&self, schema: &[Column]) -> Option<ColumnType> {
        (**self).derive_type(schema)
    }
}

impl<E: Expression + ?Sized> Expression for Box<E> {
    fn evaluate(&self, ctx: &Context<'_>) -> Result<Scalar> {
        (**self).evaluate(ctx)
    }

    fn to_sql(&self) -> String {
        (**self).to_sql()
    }

    fn derive_type(&self, schema: &[Column]) -> Option<ColumnType> {
        (**self).derive_type(schema)
    }
}
