//! Standard operator dispatch.
//!
//! Each operand family handles its own operators and falls back to a
//! narrower family: string to comparable, comparable to equality, boolean
//! to equality. An operator no family in the chain handles fails with
//! [`Error::UnsupportedOperator`] naming the family it was dispatched to.

use critq_proto::{CaseSensitivity, Operator, Value};

use crate::backend::{QueryBackend, QueryContext};
use crate::error::Error;

fn unsupported(operator: Operator, operand: &'static str) -> Error {
    Error::UnsupportedOperator { operator, operand }
}

fn equality_for<B: QueryBackend>(
    ctx: &QueryContext<'_, B>,
    op: Operator,
    value: Value,
    operand: &'static str,
) -> Result<B::Predicate, Error> {
    let backend = ctx.backend();
    match op {
        Operator::Eq => Ok(backend.eq(ctx.path(), value)),
        Operator::Ne => Ok(backend.ne(ctx.path(), value)),
        _ => Err(unsupported(op, operand)),
    }
}

fn comparable_for<B: QueryBackend>(
    ctx: &QueryContext<'_, B>,
    op: Operator,
    value: Value,
    operand: &'static str,
) -> Result<B::Predicate, Error> {
    let backend = ctx.backend();
    match op {
        Operator::Gt => Ok(backend.gt(ctx.path(), value)),
        Operator::Lt => Ok(backend.lt(ctx.path(), value)),
        Operator::Gte => Ok(backend.ge(ctx.path(), value)),
        Operator::Lte => Ok(backend.le(ctx.path(), value)),
        _ => equality_for(ctx, op, value, operand),
    }
}

/// `Eq` and `Ne`.
pub fn equality<B: QueryBackend>(
    ctx: &QueryContext<'_, B>,
    op: Operator,
    value: Value,
) -> Result<B::Predicate, Error> {
    equality_for(ctx, op, value, "equality")
}

/// Ordering comparisons, then equality.
pub fn comparable<B: QueryBackend>(
    ctx: &QueryContext<'_, B>,
    op: Operator,
    value: Value,
) -> Result<B::Predicate, Error> {
    comparable_for(ctx, op, value, "comparable")
}

/// Pattern matches, then comparable.
pub fn string<B: QueryBackend>(
    ctx: &QueryContext<'_, B>,
    op: Operator,
    value: &str,
) -> Result<B::Predicate, Error> {
    let backend = ctx.backend();
    let path = ctx.path();
    match op {
        Operator::Like => Ok(backend.like(path, value.to_string(), CaseSensitivity::Sensitive)),
        Operator::StartsWith => Ok(backend.like(
            path,
            format!("{}%", value),
            CaseSensitivity::Sensitive,
        )),
        Operator::Contains => Ok(backend.like(
            path,
            format!("%{}%", value),
            CaseSensitivity::Sensitive,
        )),
        Operator::StartsWithCi => Ok(backend.like(
            path,
            format!("{}%", value.to_lowercase()),
            CaseSensitivity::Insensitive,
        )),
        Operator::ContainsCi => Ok(backend.like(
            path,
            format!("%{}%", value.to_lowercase()),
            CaseSensitivity::Insensitive,
        )),
        _ => comparable_for(ctx, op, Value::from(value), "string"),
    }
}

/// Null checks, then equality.
///
/// `Null` with `true` asserts the column is null and with `false` that it is
/// not; `NotNull` is the reverse.
pub fn boolean<B: QueryBackend>(
    ctx: &QueryContext<'_, B>,
    op: Operator,
    value: bool,
) -> Result<B::Predicate, Error> {
    let backend = ctx.backend();
    let path = ctx.path();
    match (op, value) {
        (Operator::Null, true) | (Operator::NotNull, false) => Ok(backend.is_null(path)),
        (Operator::Null, false) | (Operator::NotNull, true) => Ok(backend.is_not_null(path)),
        _ => equality_for(ctx, op, Value::Bool(value), "boolean"),
    }
}
