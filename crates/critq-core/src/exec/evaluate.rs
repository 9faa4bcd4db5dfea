//! Predicate evaluation over joined rows.

use std::cmp::Ordering;
use std::collections::HashMap;

use critq_proto::{
    CaseSensitivity, ColumnRef, PredicateExpr, ScalarExpr, SelectPlan, SortDirection, Value,
};

use super::store::EntityRow;
use crate::error::Error;

/// One joined row: each plan alias bound to a row, or to nothing after an
/// unmatched left join.
#[derive(Debug, Clone, Default)]
pub struct RowBinding<'r> {
    slots: Vec<(&'r str, Option<&'r EntityRow>)>,
}

impl<'r> RowBinding<'r> {
    /// Bind the root alias.
    pub fn root(alias: &'r str, row: &'r EntityRow) -> Self {
        Self {
            slots: vec![(alias, Some(row))],
        }
    }

    /// Extend the binding with one more alias.
    pub fn bind(&self, alias: &'r str, row: Option<&'r EntityRow>) -> Self {
        let mut slots = self.slots.clone();
        slots.push((alias, row));
        Self { slots }
    }

    /// Row bound to an alias; `Ok(None)` after an unmatched left join.
    pub fn row(&self, alias: &str) -> Result<Option<&'r EntityRow>, Error> {
        self.slots
            .iter()
            .find(|(a, _)| *a == alias)
            .map(|(_, row)| *row)
            .ok_or_else(|| Error::Execution(format!("unknown alias {}", alias)))
    }

    /// Value of a column; null when the alias is unbound or the field is missing.
    pub fn value(&self, column: &ColumnRef) -> Result<Value, Error> {
        Ok(self
            .row(&column.alias)?
            .and_then(|row| row.get(&column.column))
            .cloned()
            .unwrap_or(Value::Null))
    }

    /// Evaluate a scalar expression.
    pub fn scalar(&self, expr: &ScalarExpr) -> Result<Value, Error> {
        match expr {
            ScalarExpr::Column(column) => self.value(column),
            ScalarExpr::Count { .. } => Err(Error::Execution(
                "COUNT is only valid as a selection".to_string(),
            )),
        }
    }
}

/// Member sets of `IN` subqueries, loaded once per plan.
///
/// Membership subqueries are uncorrelated, so one result serves every
/// binding. Entries are keyed by the subquery's address, which is stable
/// while the outer plan is borrowed.
pub struct SubqueryMembers<F> {
    load: F,
    members: HashMap<*const SelectPlan, Vec<Value>>,
}

impl<F> SubqueryMembers<F>
where
    F: FnMut(&SelectPlan) -> Result<Vec<Value>, Error>,
{
    /// Create an empty cache over a loader returning a subquery's selected values.
    pub fn new(load: F) -> Self {
        Self {
            load,
            members: HashMap::new(),
        }
    }

    /// Check whether `value` is among the subquery's values.
    pub fn contains(&mut self, plan: &SelectPlan, value: &Value) -> Result<bool, Error> {
        let key = plan as *const SelectPlan;
        let members = match self.members.entry(key) {
            std::collections::hash_map::Entry::Occupied(entry) => entry.into_mut(),
            std::collections::hash_map::Entry::Vacant(entry) => entry.insert((self.load)(plan)?),
        };
        Ok(members
            .iter()
            .any(|m| PredicateEvaluator::values_equal(value, m)))
    }

    /// Number of subqueries loaded so far.
    pub fn loaded(&self) -> usize {
        self.members.len()
    }
}

/// Evaluates filter predicates against row bindings.
///
/// Comparisons involving null are false, as in SQL. Subqueries are resolved
/// through [`SubqueryMembers`].
pub struct PredicateEvaluator;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LikeToken {
    Many,
    One,
    Char(char),
}

impl PredicateEvaluator {
    /// Evaluate a predicate against a binding.
    pub fn evaluate<F>(
        predicate: &PredicateExpr,
        binding: &RowBinding<'_>,
        subquery: &mut SubqueryMembers<F>,
    ) -> Result<bool, Error>
    where
        F: FnMut(&SelectPlan) -> Result<Vec<Value>, Error>,
    {
        match predicate {
            PredicateExpr::Eq { expr, value } => {
                Self::compare(binding, expr, value, |a, b| Self::values_equal(a, b))
            }
            PredicateExpr::Ne { expr, value } => {
                Self::compare(binding, expr, value, |a, b| !Self::values_equal(a, b))
            }
            PredicateExpr::Lt { expr, value } => Self::compare(binding, expr, value, |a, b| {
                Self::compare_values(a, b).is_some_and(Ordering::is_lt)
            }),
            PredicateExpr::Le { expr, value } => Self::compare(binding, expr, value, |a, b| {
                Self::compare_values(a, b).is_some_and(Ordering::is_le)
            }),
            PredicateExpr::Gt { expr, value } => Self::compare(binding, expr, value, |a, b| {
                Self::compare_values(a, b).is_some_and(Ordering::is_gt)
            }),
            PredicateExpr::Ge { expr, value } => Self::compare(binding, expr, value, |a, b| {
                Self::compare_values(a, b).is_some_and(Ordering::is_ge)
            }),
            PredicateExpr::IsNull { expr } => Ok(binding.scalar(expr)?.is_null()),
            PredicateExpr::IsNotNull { expr } => Ok(!binding.scalar(expr)?.is_null()),
            PredicateExpr::Like {
                expr,
                pattern,
                case,
            } => match binding.scalar(expr)? {
                Value::String(s) => Ok(match case {
                    CaseSensitivity::Sensitive => Self::like_match(&s, pattern),
                    CaseSensitivity::Insensitive => Self::like_match(&s.to_lowercase(), pattern),
                }),
                _ => Ok(false),
            },
            PredicateExpr::InSubquery { expr, subquery: plan } => {
                let value = binding.scalar(expr)?;
                if value.is_null() {
                    return Ok(false);
                }
                subquery.contains(plan, &value)
            }
            PredicateExpr::Not(inner) => Ok(!Self::evaluate(inner, binding, subquery)?),
            PredicateExpr::And(predicates) => {
                for p in predicates {
                    if !Self::evaluate(p, binding, subquery)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
        }
    }

    fn compare<F>(
        binding: &RowBinding<'_>,
        expr: &ScalarExpr,
        value: &Value,
        comparator: F,
    ) -> Result<bool, Error>
    where
        F: FnOnce(&Value, &Value) -> bool,
    {
        let left = binding.scalar(expr)?;
        if left.is_null() || value.is_null() {
            return Ok(false);
        }
        Ok(comparator(&left, value))
    }

    /// Check if two non-null values are equal, widening numeric types.
    pub fn values_equal(a: &Value, b: &Value) -> bool {
        match (a, b) {
            (Value::Int32(_) | Value::Int64(_), Value::Int32(_) | Value::Int64(_)) => {
                a.as_i64() == b.as_i64()
            }
            (Value::Float64(_), _) | (_, Value::Float64(_)) => match (a.as_f64(), b.as_f64()) {
                (Some(x), Some(y)) => x == y,
                _ => false,
            },
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Date(a), Value::Date(b)) => a == b,
            _ => false,
        }
    }

    /// Compare two values, returning their ordering if comparable.
    pub fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
        match (a, b) {
            (Value::Int32(_) | Value::Int64(_), Value::Int32(_) | Value::Int64(_)) => {
                Some(a.as_i64()?.cmp(&b.as_i64()?))
            }
            (Value::Float64(_), _) | (_, Value::Float64(_)) => a.as_f64()?.partial_cmp(&b.as_f64()?),
            (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
            (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
            (Value::Date(a), Value::Date(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }

    /// Ordering for ORDER BY: nulls first ascending, last descending.
    pub fn sort_order(a: &Value, b: &Value, direction: SortDirection) -> Ordering {
        let ordering = match (a.is_null(), b.is_null()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Less,
            (false, true) => Ordering::Greater,
            (false, false) => Self::compare_values(a, b).unwrap_or(Ordering::Equal),
        };
        match direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    }

    /// Match a string against a SQL LIKE pattern.
    ///
    /// Supports:
    /// - `%` matches zero or more characters
    /// - `_` matches exactly one character
    /// - `\%`, `\_` and `\\` match the literal character
    pub fn like_match(value: &str, pattern: &str) -> bool {
        let Some(tokens) = Self::like_tokens(pattern) else {
            return false;
        };
        let value: Vec<char> = value.chars().collect();

        // Greedy scan that retries from the most recent `%` on mismatch.
        let (mut v, mut p) = (0, 0);
        let mut star: Option<(usize, usize)> = None;
        while v < value.len() {
            match tokens.get(p) {
                Some(LikeToken::Many) => {
                    star = Some((p, v));
                    p += 1;
                }
                Some(LikeToken::One) => {
                    v += 1;
                    p += 1;
                }
                Some(LikeToken::Char(c)) if *c == value[v] => {
                    v += 1;
                    p += 1;
                }
                _ => match star {
                    Some((star_p, star_v)) => {
                        star = Some((star_p, star_v + 1));
                        p = star_p + 1;
                        v = star_v + 1;
                    }
                    None => return false,
                },
            }
        }
        tokens[p..].iter().all(|t| *t == LikeToken::Many)
    }

    /// Tokenize a LIKE pattern; `None` when it ends in a lone escape.
    fn like_tokens(pattern: &str) -> Option<Vec<LikeToken>> {
        let mut tokens = Vec::with_capacity(pattern.len());
        let mut chars = pattern.chars();
        while let Some(c) = chars.next() {
            tokens.push(match c {
                '%' => LikeToken::Many,
                '_' => LikeToken::One,
                '\\' => LikeToken::Char(chars.next()?),
                c => LikeToken::Char(c),
            });
        }
        Some(tokens)
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn no_subquery() -> SubqueryMembers<fn(&SelectPlan) -> Result<Vec<Value>, Error>> {
        SubqueryMembers::new(|_| Ok(Vec::new()))
    }

    fn person() -> EntityRow {
        EntityRow::new()
            .with("id", 1i64)
            .with("firstName", "Bob")
            .with("employerId", Value::Null)
    }

    #[test]
    fn test_like_match() {
        assert!(PredicateEvaluator::like_match("Bill", "%ill%"));
        assert!(PredicateEvaluator::like_match("Bill", "B_ll"));
        assert!(PredicateEvaluator::like_match("Acme", "Acme"));
        assert!(PredicateEvaluator::like_match("", "%"));
        assert!(!PredicateEvaluator::like_match("Bob", "%ill%"));
        assert!(!PredicateEvaluator::like_match("Bo", "B_b"));
        assert!(PredicateEvaluator::like_match("50%", "50\\%"));
        assert!(!PredicateEvaluator::like_match("500", "50\\%"));
        assert!(PredicateEvaluator::like_match("Tree Corp", "%Corp"));
        assert!(PredicateEvaluator::like_match("a\\b", "a\\\\b"));
        assert!(!PredicateEvaluator::like_match("a", "a\\"));
        assert!(PredicateEvaluator::like_match("abcbxd", "%b_d"));
        assert!(!PredicateEvaluator::like_match("Bill", "%ill_"));
    }

    #[test]
    fn test_like_match_many_wildcards_on_long_values() {
        let long = "a".repeat(5000);
        assert!(!PredicateEvaluator::like_match(&long, "%a%a%a%a%a%a%b"));
        assert!(PredicateEvaluator::like_match(&long, "%a%a%a%a%a%a%"));
        assert!(PredicateEvaluator::like_match(&format!("{}b", long), "%a%a%a%a%a%a%b"));
        assert!(!PredicateEvaluator::like_match(&long, "%_%_%b%"));
    }

    #[test]
    fn test_null_comparisons_are_false() {
        let row = person();
        let binding = RowBinding::root("t0", &row);
        let employer = ScalarExpr::column("t0", "employerId");
        let mut sub = no_subquery();

        for predicate in [
            PredicateExpr::Eq {
                expr: employer.clone(),
                value: Value::Int64(1),
            },
            PredicateExpr::Ne {
                expr: employer.clone(),
                value: Value::Int64(1),
            },
            PredicateExpr::Eq {
                expr: ScalarExpr::column("t0", "id"),
                value: Value::Null,
            },
        ] {
            assert!(!PredicateEvaluator::evaluate(&predicate, &binding, &mut sub).unwrap());
        }

        let is_null = PredicateExpr::IsNull { expr: employer };
        assert!(PredicateEvaluator::evaluate(&is_null, &binding, &mut sub).unwrap());
    }

    #[test]
    fn test_unbound_alias_is_null_and_unknown_alias_errors() {
        let row = person();
        let binding = RowBinding::root("t0", &row).bind("t1", None);
        let mut sub = no_subquery();

        let unbound = PredicateExpr::IsNull {
            expr: ScalarExpr::column("t1", "name"),
        };
        assert!(PredicateEvaluator::evaluate(&unbound, &binding, &mut sub).unwrap());

        let unknown = PredicateExpr::IsNull {
            expr: ScalarExpr::column("t7", "name"),
        };
        assert!(matches!(
            PredicateEvaluator::evaluate(&unknown, &binding, &mut sub),
            Err(Error::Execution(_))
        ));
    }

    #[test]
    fn test_case_insensitive_like_and_not() {
        let row = person();
        let binding = RowBinding::root("t0", &row);
        let mut sub = no_subquery();

        let like = PredicateExpr::Like {
            expr: ScalarExpr::column("t0", "firstName"),
            pattern: "bo%".into(),
            case: CaseSensitivity::Insensitive,
        };
        assert!(PredicateEvaluator::evaluate(&like, &binding, &mut sub).unwrap());

        let negated = PredicateExpr::Not(Box::new(like));
        assert!(!PredicateEvaluator::evaluate(&negated, &binding, &mut sub).unwrap());
    }

    #[test]
    fn test_in_subquery_uses_members() {
        let row = person();
        let binding = RowBinding::root("t0", &row);
        let mut members =
            SubqueryMembers::new(|_: &SelectPlan| Ok(vec![Value::Int32(1), Value::Int64(5)]));

        let predicate = PredicateExpr::InSubquery {
            expr: ScalarExpr::column("t0", "id"),
            subquery: Box::new(SelectPlan::new("Person", "tq0_0")),
        };
        assert!(PredicateEvaluator::evaluate(&predicate, &binding, &mut members).unwrap());
    }

    #[test]
    fn test_in_subquery_loads_once_per_plan() {
        let rows: Vec<EntityRow> = (0..50i64).map(|id| EntityRow::new().with("id", id)).collect();
        let mut calls = 0;
        let mut members = SubqueryMembers::new(|_: &SelectPlan| {
            calls += 1;
            Ok(vec![Value::Int64(7), Value::Int64(21)])
        });

        let first = PredicateExpr::InSubquery {
            expr: ScalarExpr::column("t0", "id"),
            subquery: Box::new(SelectPlan::new("Person", "tq0_0")),
        };
        let second = PredicateExpr::Not(Box::new(PredicateExpr::InSubquery {
            expr: ScalarExpr::column("t0", "id"),
            subquery: Box::new(SelectPlan::new("Person", "tq1_0")),
        }));
        let predicate = PredicateExpr::And(vec![first, second]);

        let mut matched = 0;
        for row in &rows {
            let binding = RowBinding::root("t0", row);
            if PredicateEvaluator::evaluate(&predicate, &binding, &mut members).unwrap() {
                matched += 1;
            }
        }
        assert_eq!(matched, 0);
        assert_eq!(members.loaded(), 2);
        drop(members);
        assert_eq!(calls, 2);
    }

    #[test]
    fn test_empty_conjunction_is_true() {
        let row = person();
        let binding = RowBinding::root("t0", &row);
        let mut sub = no_subquery();
        let empty = PredicateExpr::And(Vec::new());
        assert!(PredicateEvaluator::evaluate(&empty, &binding, &mut sub).unwrap());
    }

    #[test]
    fn test_value_ordering() {
        let d1 = Value::Date(NaiveDate::from_ymd_opt(1980, 1, 1).unwrap());
        let d2 = Value::Date(NaiveDate::from_ymd_opt(2010, 1, 1).unwrap());

        assert_eq!(PredicateEvaluator::compare_values(&d1, &d2), Some(Ordering::Less));
        assert_eq!(
            PredicateEvaluator::compare_values(&Value::Int32(3), &Value::Int64(2)),
            Some(Ordering::Greater)
        );
        assert_eq!(PredicateEvaluator::compare_values(&Value::from("a"), &Value::Int64(1)), None);

        assert_eq!(
            PredicateEvaluator::sort_order(&Value::Null, &Value::from("a"), SortDirection::Asc),
            Ordering::Less
        );
        assert_eq!(
            PredicateEvaluator::sort_order(&Value::Null, &Value::from("a"), SortDirection::Desc),
            Ordering::Greater
        );
    }
}
