//! Stock predicate builders.
//!
//! Plain builders take the raw criteria value; `*_field` builders take a
//! [`CriteriaField`] and dispatch on its operator through [`crate::operation`].

use critq_proto::{CaseSensitivity, CriteriaField, Operator, Value};

use crate::backend::{QueryBackend, QueryContext};
use crate::error::Error;
use crate::operation;
use crate::restriction::{predicate_builder, PredicateBuilder};

fn operand<V>(field: &CriteriaField<V>) -> Result<&V, Error> {
    field
        .value()
        .ok_or_else(|| Error::Configuration(format!("criteria field {} has no value", field.op)))
}

/// `column = value`
pub fn eq<B, V>() -> PredicateBuilder<B, V>
where
    B: QueryBackend + 'static,
    V: Into<Value> + Clone + 'static,
{
    predicate_builder(|ctx: &QueryContext<'_, B>, value: &V| {
        Ok(ctx.backend().eq(ctx.path(), value.clone().into()))
    })
}

/// `column <> value`
pub fn ne<B, V>() -> PredicateBuilder<B, V>
where
    B: QueryBackend + 'static,
    V: Into<Value> + Clone + 'static,
{
    predicate_builder(|ctx: &QueryContext<'_, B>, value: &V| {
        Ok(ctx.backend().ne(ctx.path(), value.clone().into()))
    })
}

/// `column > value`
pub fn gt<B, V>() -> PredicateBuilder<B, V>
where
    B: QueryBackend + 'static,
    V: Into<Value> + Clone + 'static,
{
    predicate_builder(|ctx: &QueryContext<'_, B>, value: &V| {
        Ok(ctx.backend().gt(ctx.path(), value.clone().into()))
    })
}

/// `column >= value`
pub fn ge<B, V>() -> PredicateBuilder<B, V>
where
    B: QueryBackend + 'static,
    V: Into<Value> + Clone + 'static,
{
    predicate_builder(|ctx: &QueryContext<'_, B>, value: &V| {
        Ok(ctx.backend().ge(ctx.path(), value.clone().into()))
    })
}

/// `column < value`
pub fn lt<B, V>() -> PredicateBuilder<B, V>
where
    B: QueryBackend + 'static,
    V: Into<Value> + Clone + 'static,
{
    predicate_builder(|ctx: &QueryContext<'_, B>, value: &V| {
        Ok(ctx.backend().lt(ctx.path(), value.clone().into()))
    })
}

/// `column <= value`
pub fn le<B, V>() -> PredicateBuilder<B, V>
where
    B: QueryBackend + 'static,
    V: Into<Value> + Clone + 'static,
{
    predicate_builder(|ctx: &QueryContext<'_, B>, value: &V| {
        Ok(ctx.backend().le(ctx.path(), value.clone().into()))
    })
}

/// `true`: column is null. `false`: column is not null.
pub fn is_null<B: QueryBackend + 'static>() -> PredicateBuilder<B, bool> {
    predicate_builder(|ctx: &QueryContext<'_, B>, value: &bool| {
        operation::boolean(ctx, Operator::Null, *value)
    })
}

/// `true`: column is not null. `false`: column is null.
pub fn not_null<B: QueryBackend + 'static>() -> PredicateBuilder<B, bool> {
    predicate_builder(|ctx: &QueryContext<'_, B>, value: &bool| {
        operation::boolean(ctx, Operator::NotNull, *value)
    })
}

/// Column matches the value as a LIKE pattern.
pub fn like<B: QueryBackend + 'static>() -> PredicateBuilder<B, String> {
    predicate_builder(|ctx: &QueryContext<'_, B>, value: &String| {
        Ok(ctx
            .backend()
            .like(ctx.path(), value.clone(), CaseSensitivity::Sensitive))
    })
}

/// Column contains the value.
pub fn contains<B: QueryBackend + 'static>() -> PredicateBuilder<B, String> {
    predicate_builder(|ctx: &QueryContext<'_, B>, value: &String| {
        operation::string(ctx, Operator::Contains, value)
    })
}

/// Column starts with the value.
pub fn starts_with<B: QueryBackend + 'static>() -> PredicateBuilder<B, String> {
    predicate_builder(|ctx: &QueryContext<'_, B>, value: &String| {
        operation::string(ctx, Operator::StartsWith, value)
    })
}

/// Column contains the value, ignoring case.
pub fn contains_ci<B: QueryBackend + 'static>() -> PredicateBuilder<B, String> {
    predicate_builder(|ctx: &QueryContext<'_, B>, value: &String| {
        operation::string(ctx, Operator::ContainsCi, value)
    })
}

/// Column starts with the value, ignoring case.
pub fn starts_with_ci<B: QueryBackend + 'static>() -> PredicateBuilder<B, String> {
    predicate_builder(|ctx: &QueryContext<'_, B>, value: &String| {
        operation::string(ctx, Operator::StartsWithCi, value)
    })
}

/// String field with any string, comparable or equality operator.
pub fn string_field<B: QueryBackend + 'static>() -> PredicateBuilder<B, CriteriaField<String>> {
    predicate_builder(|ctx: &QueryContext<'_, B>, field: &CriteriaField<String>| {
        operation::string(ctx, field.op, operand(field)?)
    })
}

/// Boolean field with a null check or equality operator.
pub fn boolean_field<B: QueryBackend + 'static>() -> PredicateBuilder<B, CriteriaField<bool>> {
    predicate_builder(|ctx: &QueryContext<'_, B>, field: &CriteriaField<bool>| {
        operation::boolean(ctx, field.op, *operand(field)?)
    })
}

/// Ordered field with a comparison or equality operator.
pub fn comparable_field<B, V>() -> PredicateBuilder<B, CriteriaField<V>>
where
    B: QueryBackend + 'static,
    V: Into<Value> + Clone + 'static,
{
    predicate_builder(|ctx: &QueryContext<'_, B>, field: &CriteriaField<V>| {
        operation::comparable(ctx, field.op, operand(field)?.clone().into())
    })
}

/// Field with an equality operator.
pub fn simple_field<B, V>() -> PredicateBuilder<B, CriteriaField<V>>
where
    B: QueryBackend + 'static,
    V: Into<Value> + Clone + 'static,
{
    predicate_builder(|ctx: &QueryContext<'_, B>, field: &CriteriaField<V>| {
        operation::equality(ctx, field.op, operand(field)?.clone().into())
    })
}
