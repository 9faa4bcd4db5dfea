//! Logical query plan IR.
//!
//! A [`SelectPlan`] is the backend-neutral shape of a compiled query: a root
//! scan, a list of joins hanging off previously introduced aliases, an
//! optional conjunctive filter and an ordered list of sort keys. Plans
//! display as a JPQL-like statement for logging and explain output.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::sort::SortDirection;
use crate::value::Value;

/// A column resolved against a scan alias.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ColumnRef {
    /// Alias of the scan or join the column belongs to.
    pub alias: String,
    /// Column (attribute) name.
    pub column: String,
}

impl ColumnRef {
    /// Create a column reference.
    pub fn new(alias: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            alias: alias.into(),
            column: column.into(),
        }
    }
}

/// A scalar expression usable in selections, predicates and sort keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ScalarExpr {
    /// A column of a scan.
    Column(ColumnRef),
    /// Number of rows bound to a scan alias.
    Count { alias: String },
}

impl ScalarExpr {
    /// Create a column expression.
    pub fn column(alias: impl Into<String>, column: impl Into<String>) -> Self {
        ScalarExpr::Column(ColumnRef::new(alias, column))
    }
}

/// What a query returns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Selection {
    /// Whole rows of the scan with this alias.
    Entity { alias: String },
    /// A single scalar expression.
    Expr(ScalarExpr),
}

/// Join strength.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JoinType {
    /// Rows without a match are dropped.
    Inner,
    /// Rows without a match are kept with null columns.
    Left,
}

/// A join from an existing alias to a related entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JoinClause {
    /// Alias introduced by this join.
    pub alias: String,
    /// Alias the join navigates from.
    pub parent_alias: String,
    /// Relation name on the parent entity.
    pub relation: String,
    /// Entity reached by the join.
    pub entity: String,
    /// Join strength.
    pub join_type: JoinType,
    /// Whether the related rows are fetched along with the parent.
    pub fetch: bool,
}

/// Case handling for pattern matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CaseSensitivity {
    /// Match characters exactly.
    Sensitive,
    /// Lower-case the column before matching.
    Insensitive,
}

/// Filter predicate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PredicateExpr {
    /// Expression equals value.
    Eq { expr: ScalarExpr, value: Value },
    /// Expression not equals value.
    Ne { expr: ScalarExpr, value: Value },
    /// Expression less than value.
    Lt { expr: ScalarExpr, value: Value },
    /// Expression less than or equal to value.
    Le { expr: ScalarExpr, value: Value },
    /// Expression greater than value.
    Gt { expr: ScalarExpr, value: Value },
    /// Expression greater than or equal to value.
    Ge { expr: ScalarExpr, value: Value },
    /// Expression is null.
    IsNull { expr: ScalarExpr },
    /// Expression is not null.
    IsNotNull { expr: ScalarExpr },
    /// Expression matches a LIKE pattern.
    Like {
        expr: ScalarExpr,
        pattern: String,
        case: CaseSensitivity,
    },
    /// Expression is a member of the subquery's result set.
    InSubquery {
        expr: ScalarExpr,
        subquery: Box<SelectPlan>,
    },
    /// Negation.
    Not(Box<PredicateExpr>),
    /// All predicates must hold. Empty means always true.
    And(Vec<PredicateExpr>),
}

/// A sort key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderClause {
    /// Expression to order by.
    pub expr: ScalarExpr,
    /// Sort direction.
    pub direction: SortDirection,
}

/// A compiled query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectPlan {
    /// Entity scanned by the root.
    pub root_entity: String,
    /// Alias of the root scan.
    pub root_alias: String,
    /// What the query returns.
    pub selection: Selection,
    /// Joins in the order they were introduced; parents precede children.
    pub joins: Vec<JoinClause>,
    /// Filter applied to the joined rows.
    pub filter: Option<PredicateExpr>,
    /// Sort keys, primary first.
    pub order_by: Vec<OrderClause>,
}

impl SelectPlan {
    /// Create a plan returning whole rows of the root entity.
    pub fn new(root_entity: impl Into<String>, root_alias: impl Into<String>) -> Self {
        let root_alias = root_alias.into();
        Self {
            root_entity: root_entity.into(),
            selection: Selection::Entity {
                alias: root_alias.clone(),
            },
            root_alias,
            joins: Vec::new(),
            filter: None,
            order_by: Vec::new(),
        }
    }

    /// Find the join that introduced an alias.
    pub fn join(&self, alias: &str) -> Option<&JoinClause> {
        self.joins.iter().find(|j| j.alias == alias)
    }

    /// Whether the selection is a row count.
    pub fn is_count(&self) -> bool {
        matches!(self.selection, Selection::Expr(ScalarExpr::Count { .. }))
    }
}

impl fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.alias, self.column)
    }
}

impl fmt::Display for ScalarExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScalarExpr::Column(c) => write!(f, "{}", c),
            ScalarExpr::Count { alias } => write!(f, "COUNT({})", alias),
        }
    }
}

impl fmt::Display for PredicateExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PredicateExpr::Eq { expr, value } => write!(f, "{} = {}", expr, value),
            PredicateExpr::Ne { expr, value } => write!(f, "{} <> {}", expr, value),
            PredicateExpr::Lt { expr, value } => write!(f, "{} < {}", expr, value),
            PredicateExpr::Le { expr, value } => write!(f, "{} <= {}", expr, value),
            PredicateExpr::Gt { expr, value } => write!(f, "{} > {}", expr, value),
            PredicateExpr::Ge { expr, value } => write!(f, "{} >= {}", expr, value),
            PredicateExpr::IsNull { expr } => write!(f, "{} IS NULL", expr),
            PredicateExpr::IsNotNull { expr } => write!(f, "{} IS NOT NULL", expr),
            PredicateExpr::Like {
                expr,
                pattern,
                case: CaseSensitivity::Sensitive,
            } => write!(f, "{} LIKE {}", expr, Value::String(pattern.clone())),
            PredicateExpr::Like {
                expr,
                pattern,
                case: CaseSensitivity::Insensitive,
            } => write!(f, "LOWER({}) LIKE {}", expr, Value::String(pattern.clone())),
            PredicateExpr::InSubquery { expr, subquery } => {
                write!(f, "{} IN ({})", expr, subquery)
            }
            PredicateExpr::Not(inner) => write!(f, "NOT ({})", inner),
            PredicateExpr::And(preds) if preds.is_empty() => f.write_str("TRUE"),
            PredicateExpr::And(preds) => {
                for (i, p) in preds.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" AND ")?;
                    }
                    match p {
                        PredicateExpr::And(_) => write!(f, "({})", p)?,
                        _ => write!(f, "{}", p)?,
                    }
                }
                Ok(())
            }
        }
    }
}

impl fmt::Display for SelectPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.selection {
            Selection::Entity { alias } => write!(f, "SELECT {}", alias)?,
            Selection::Expr(expr) => write!(f, "SELECT {}", expr)?,
        }
        write!(f, " FROM {} {}", self.root_entity, self.root_alias)?;
        for join in &self.joins {
            let kind = match join.join_type {
                JoinType::Inner => "JOIN",
                JoinType::Left => "LEFT JOIN",
            };
            let fetch = if join.fetch { " FETCH" } else { "" };
            write!(
                f,
                " {}{} {}.{} {}",
                kind, fetch, join.parent_alias, join.relation, join.alias
            )?;
        }
        if let Some(filter) = &self.filter {
            write!(f, " WHERE {}", filter)?;
        }
        if !self.order_by.is_empty() {
            f.write_str(" ORDER BY ")?;
            for (i, order) in self.order_by.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                let dir = if order.direction.is_ascending() {
                    "ASC"
                } else {
                    "DESC"
                };
                write!(f, "{} {}", order.expr, dir)?;
            }
        }
        Ok(())
    }
}
