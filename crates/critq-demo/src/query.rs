//! Person search: criteria record, sort identifiers and handler wiring.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use chrono::NaiveDate;
use critq_core::proto::CriteriaField;
use critq_core::{
    handlers, predicate_builder, Catalog, CriteriaQueryHandler, Error, HandlerConfig, PlanBackend,
    QueryBackend, QueryContext, RestrictionDefinition, RestrictionMapping, SortDefinition,
};
use serde::{Deserialize, Serialize};

use crate::fixture::years_before;
use crate::model::PersonJoins;

/// Age below which a child counts as underage.
pub const ADULT_AGE: u32 = 18;

/// What to search people by. Unset fields do not restrict the search.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PersonCriteria {
    /// Substring of the first name.
    pub first_name: Option<String>,
    pub last_name: Option<CriteriaField<String>>,
    /// LIKE pattern on the employer's name.
    pub company_name: Option<String>,
    /// LIKE pattern on the employer's address.
    pub company_address: Option<String>,
    /// LIKE pattern on the last name of the employer's owner.
    pub owner_name: Option<String>,
    /// LIKE pattern on a child's first name.
    pub child_name: Option<String>,
    /// `true`: has a child younger than 18. `false`: has a child of 18 or older.
    pub underage_children: Option<bool>,
    /// `true`: has an employer. `false`: has none.
    pub employed: Option<bool>,
    /// `true`: is somebody's parent. `false`: is nobody's parent.
    pub has_children: Option<bool>,
    /// Accepted but not searchable.
    pub not_mapped: Option<String>,
}

impl PersonCriteria {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_first_name(mut self, first_name: impl Into<String>) -> Self {
        self.first_name = Some(first_name.into());
        self
    }

    pub fn with_last_name(mut self, last_name: CriteriaField<String>) -> Self {
        self.last_name = Some(last_name);
        self
    }

    pub fn with_company_name(mut self, company_name: impl Into<String>) -> Self {
        self.company_name = Some(company_name.into());
        self
    }

    pub fn with_company_address(mut self, company_address: impl Into<String>) -> Self {
        self.company_address = Some(company_address.into());
        self
    }

    pub fn with_owner_name(mut self, owner_name: impl Into<String>) -> Self {
        self.owner_name = Some(owner_name.into());
        self
    }

    pub fn with_child_name(mut self, child_name: impl Into<String>) -> Self {
        self.child_name = Some(child_name.into());
        self
    }

    pub fn with_underage_children(mut self, underage_children: bool) -> Self {
        self.underage_children = Some(underage_children);
        self
    }

    pub fn with_employed(mut self, employed: bool) -> Self {
        self.employed = Some(employed);
        self
    }

    pub fn with_has_children(mut self, has_children: bool) -> Self {
        self.has_children = Some(has_children);
        self
    }

    pub fn with_not_mapped(mut self, not_mapped: impl Into<String>) -> Self {
        self.not_mapped = Some(not_mapped.into());
        self
    }
}

/// Sort keys for person searches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PersonSort {
    FirstName,
    LastName,
    BusinessName,
    OwnerLastName,
    /// Never configured; requesting it leaves the order unchanged.
    NoMapping,
}

impl PersonSort {
    pub const ALL: [PersonSort; 5] = [
        PersonSort::FirstName,
        PersonSort::LastName,
        PersonSort::BusinessName,
        PersonSort::OwnerLastName,
        PersonSort::NoMapping,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PersonSort::FirstName => "first-name",
            PersonSort::LastName => "last-name",
            PersonSort::BusinessName => "business-name",
            PersonSort::OwnerLastName => "owner-last-name",
            PersonSort::NoMapping => "no-mapping",
        }
    }
}

impl fmt::Display for PersonSort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PersonSort {
    type Err = String;

    /// Accepts `first-name`, `first_name` and `FIRST_NAME` spellings.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('_', "-");
        PersonSort::ALL
            .into_iter()
            .find(|sort| sort.as_str() == normalized)
            .ok_or_else(|| format!("unknown sort '{}'", s))
    }
}

pub type PersonQueryHandler = CriteriaQueryHandler<PersonCriteria, PersonSort, PlanBackend>;

/// Handler configuration for person searches.
///
/// `today` anchors the underage cutoff.
pub fn person_config(
    joins: &PersonJoins,
    today: NaiveDate,
) -> HandlerConfig<PersonCriteria, PersonSort, PlanBackend> {
    let cutoff = years_before(today, ADULT_AGE);

    HandlerConfig::new(&joins.person, "id")
        .restrict(RestrictionMapping::new(
            |c: &PersonCriteria| c.first_name.clone(),
            RestrictionDefinition::new(&joins.person, "firstName", handlers::contains()),
        ))
        .restrict(RestrictionMapping::criteria_field(
            |c: &PersonCriteria| c.last_name.clone(),
            RestrictionDefinition::new(&joins.person, "lastName", handlers::string_field()),
        ))
        .restrict(RestrictionMapping::new(
            |c: &PersonCriteria| c.company_name.clone(),
            RestrictionDefinition::new(&joins.business, "name", handlers::like()),
        ))
        .restrict(RestrictionMapping::new(
            |c: &PersonCriteria| c.company_address.clone(),
            RestrictionDefinition::new(&joins.business, "address", handlers::like()),
        ))
        .restrict(RestrictionMapping::new(
            |c: &PersonCriteria| c.owner_name.clone(),
            RestrictionDefinition::new(&joins.owner, "lastName", handlers::like()),
        ))
        .restrict(RestrictionMapping::new(
            |c: &PersonCriteria| c.child_name.clone(),
            RestrictionDefinition::new(&joins.child, "firstName", handlers::like()),
        ))
        .restrict(RestrictionMapping::new(
            |c: &PersonCriteria| c.employed,
            RestrictionDefinition::new(&joins.person, "employerId", handlers::not_null()),
        ))
        .restrict(RestrictionMapping::new(
            |c: &PersonCriteria| c.has_children,
            RestrictionDefinition::new(
                &joins.person,
                "id",
                predicate_builder(|ctx: &QueryContext<'_, PlanBackend>, value: &bool| {
                    is_parent(ctx, *value)
                }),
            ),
        ))
        .restrict(RestrictionMapping::new(
            |c: &PersonCriteria| c.underage_children,
            RestrictionDefinition::new(
                &joins.child,
                "birthdate",
                predicate_builder(move |ctx: &QueryContext<'_, PlanBackend>, value: &bool| {
                    let backend = ctx.backend();
                    Ok(if *value {
                        backend.gt(ctx.path(), cutoff.into())
                    } else {
                        backend.lt(ctx.path(), cutoff.into())
                    })
                }),
            ),
        ))
        .sort(SortDefinition::new(PersonSort::FirstName, &joins.person, "firstName"))
        .sort(SortDefinition::new(PersonSort::LastName, &joins.person, "lastName"))
        .sort(SortDefinition::new(PersonSort::BusinessName, &joins.business, "name"))
        .sort(SortDefinition::new(PersonSort::OwnerLastName, &joins.owner, "lastName"))
}

/// `id IN (SELECT parentId FROM Person WHERE parentId IS NOT NULL)`, negated
/// when `parent` is false.
fn is_parent<B: QueryBackend>(ctx: &QueryContext<'_, B>, parent: bool) -> Result<B::Predicate, Error> {
    let backend = ctx.backend();
    let (mut subquery, root) = backend.create_subquery(ctx.query(), "Person")?;
    let parent_id = backend.column(&root, "parentId")?;
    backend.filter(&mut subquery, backend.is_not_null(&parent_id));
    backend.select(&mut subquery, parent_id);

    let member = backend.in_subquery(ctx.path(), subquery);
    Ok(if parent { member } else { backend.not(member) })
}

/// Build the person query handler over `catalog`.
pub fn person_handler(catalog: Arc<Catalog>, today: NaiveDate) -> Result<PersonQueryHandler, Error> {
    let joins = PersonJoins::new();
    CriteriaQueryHandler::new(PlanBackend::new(catalog), person_config(&joins, today))
}
