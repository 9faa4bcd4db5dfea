//! Criteria operators and operator/value pairs.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Standard criteria operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Operator {
    /// Equal.
    Eq,
    /// Not equal.
    Ne,
    /// Greater than.
    Gt,
    /// Less than.
    Lt,
    /// Greater than or equal to.
    Gte,
    /// Less than or equal to.
    Lte,
    /// Is null.
    Null,
    /// Is not null.
    NotNull,
    /// Like (string).
    Like,
    /// Starts-with (string).
    StartsWith,
    /// Contains (string).
    Contains,
    /// Starts-with, case-insensitive (string).
    StartsWithCi,
    /// Contains, case-insensitive (string).
    ContainsCi,
}

impl Operator {
    /// Every operator, in declaration order.
    pub const ALL: [Operator; 13] = [
        Operator::Eq,
        Operator::Ne,
        Operator::Gt,
        Operator::Lt,
        Operator::Gte,
        Operator::Lte,
        Operator::Null,
        Operator::NotNull,
        Operator::Like,
        Operator::StartsWith,
        Operator::Contains,
        Operator::StartsWithCi,
        Operator::ContainsCi,
    ];

    /// Name of the operator as it appears in serialized criteria.
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Eq => "EQ",
            Operator::Ne => "NE",
            Operator::Gt => "GT",
            Operator::Lt => "LT",
            Operator::Gte => "GTE",
            Operator::Lte => "LTE",
            Operator::Null => "NULL",
            Operator::NotNull => "NOT_NULL",
            Operator::Like => "LIKE",
            Operator::StartsWith => "STARTS_WITH",
            Operator::Contains => "CONTAINS",
            Operator::StartsWithCi => "STARTS_WITH_CI",
            Operator::ContainsCi => "CONTAINS_CI",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Combines an operation with a value.
///
/// A field whose value is `None` is treated exactly like a field that was
/// never set: no restriction is applied for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriteriaField<V> {
    /// Operation to perform with the value.
    pub op: Operator,
    /// The operand, if any.
    pub value: Option<V>,
}

impl<V> CriteriaField<V> {
    /// Create a field with the given operation and value.
    pub fn new(op: Operator, value: impl Into<Option<V>>) -> Self {
        Self {
            op,
            value: value.into(),
        }
    }

    /// Create an equality field.
    pub fn eq(value: V) -> Self {
        Self::new(Operator::Eq, value)
    }

    /// Create a not-equal field.
    pub fn ne(value: V) -> Self {
        Self::new(Operator::Ne, value)
    }

    /// Returns whether the value is set.
    pub fn has_value(&self) -> bool {
        self.value.is_some()
    }

    /// Returns the operand, if set.
    pub fn value(&self) -> Option<&V> {
        self.value.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operator_names_match_serde() {
        for op in Operator::ALL {
            let json = serde_json::to_string(&op).unwrap();
            assert_eq!(json, format!("\"{}\"", op.as_str()));
        }
    }

    #[test]
    fn test_null_value_is_absent() {
        let field: CriteriaField<String> = CriteriaField::new(Operator::Eq, None);
        assert!(!field.has_value());

        let field = CriteriaField::eq("Smith".to_string());
        assert!(field.has_value());
        assert_eq!(field.value().map(String::as_str), Some("Smith"));
    }

    #[test]
    fn test_missing_value_deserializes_as_absent() {
        let field: CriteriaField<String> = serde_json::from_str(r#"{"op":"EQ"}"#).unwrap();
        assert_eq!(field.op, Operator::Eq);
        assert!(!field.has_value());
    }
}
