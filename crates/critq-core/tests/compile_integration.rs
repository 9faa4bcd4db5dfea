//! Compiles criteria queries over an author/book catalog and executes the
//! resulting plans in memory.

use std::sync::Arc;

use critq_core::handlers;
use critq_core::proto::{CriteriaField, Operator, QueryDefinition, SortInfo, Value};
use critq_core::{
    Catalog, CriteriaQueryHandler, EntityDef, EntityRow, FieldDef, HandlerConfig, JoinNode,
    MemoryStore, PlanBackend, PlanExecutor, QueryHandler, RelationDef, Relationship,
    RestrictionDefinition, RestrictionMapping, ScalarType, SortDefinition,
};

#[derive(Debug, Default)]
struct AuthorCriteria {
    name: Option<CriteriaField<String>>,
    book_title: Option<String>,
    min_pages: Option<i64>,
    publisher: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum AuthorSort {
    Name,
    Publisher,
    BookTitle,
}

fn catalog() -> Catalog {
    Catalog::new()
        .with_entity(EntityDef::new("Author", "id").with_fields([
            FieldDef::new("id", ScalarType::Int64),
            FieldDef::new("name", ScalarType::String),
            FieldDef::optional("publisherId", ScalarType::Int64),
        ]))
        .with_entity(EntityDef::new("Book", "id").with_fields([
            FieldDef::new("id", ScalarType::Int64),
            FieldDef::new("title", ScalarType::String),
            FieldDef::new("pages", ScalarType::Int64),
            FieldDef::new("authorId", ScalarType::Int64),
        ]))
        .with_entity(EntityDef::new("Publisher", "id").with_fields([
            FieldDef::new("id", ScalarType::Int64),
            FieldDef::new("name", ScalarType::String),
        ]))
        .with_relation(RelationDef::one_to_many("books", "Author", "id", "Book", "authorId"))
        .with_relation(RelationDef::many_to_one(
            "publisher",
            "Author",
            "publisherId",
            "Publisher",
            "id",
        ))
}

fn store() -> MemoryStore {
    let author = |id: i64, name: &str, publisher: Option<i64>| {
        EntityRow::new()
            .with("id", id)
            .with("name", name)
            .with("publisherId", publisher)
    };
    let book = |id: i64, title: &str, pages: i64, author: i64| {
        EntityRow::new()
            .with("id", id)
            .with("title", title)
            .with("pages", pages)
            .with("authorId", author)
    };
    MemoryStore::new()
        .with_rows(
            "Author",
            [
                author(1, "Le Guin", Some(1)),
                author(2, "Herbert", Some(2)),
                author(3, "Tiptree", None),
            ],
        )
        .with_rows(
            "Book",
            [
                book(1, "The Dispossessed", 387, 1),
                book(2, "The Lathe of Heaven", 184, 1),
                book(3, "The Left Hand of Darkness", 304, 1),
                book(4, "Dune", 412, 2),
            ],
        )
        .with_rows(
            "Publisher",
            [
                EntityRow::new().with("id", 1i64).with("name", "Harper"),
                EntityRow::new().with("id", 2i64).with("name", "Chilton"),
            ],
        )
}

fn handler() -> CriteriaQueryHandler<AuthorCriteria, AuthorSort, PlanBackend> {
    let author = JoinNode::root("author", "Author");
    let book = author.join("book", "Book", Relationship::list("books"));
    let publisher = author.join("publisher", "Publisher", Relationship::single("publisher"));

    let config = HandlerConfig::new(&author, "id")
        .restrict(RestrictionMapping::criteria_field(
            |c: &AuthorCriteria| c.name.clone(),
            RestrictionDefinition::new(&author, "name", handlers::string_field()),
        ))
        .restrict(RestrictionMapping::new(
            |c: &AuthorCriteria| c.book_title.clone(),
            RestrictionDefinition::new(&book, "title", handlers::contains()),
        ))
        .restrict(RestrictionMapping::new(
            |c: &AuthorCriteria| c.min_pages,
            RestrictionDefinition::new(&book, "pages", handlers::ge()),
        ))
        .restrict(RestrictionMapping::new(
            |c: &AuthorCriteria| c.publisher.clone(),
            RestrictionDefinition::new(&publisher, "name", handlers::eq()),
        ))
        .sort(SortDefinition::new(AuthorSort::Name, &author, "name"))
        .sort(SortDefinition::new(AuthorSort::Publisher, &publisher, "name"))
        .sort(SortDefinition::new(AuthorSort::BookTitle, &book, "title"));

    CriteriaQueryHandler::new(PlanBackend::new(Arc::new(catalog())), config)
        .expect("valid configuration")
}

fn count(definition: &QueryDefinition<AuthorCriteria, AuthorSort>) -> u64 {
    let catalog = catalog();
    let store = store();
    let plan = handler().compile_count_query(definition).unwrap().into_plan();
    PlanExecutor::new(&catalog, &store).count(&plan).unwrap()
}

fn names(definition: &QueryDefinition<AuthorCriteria, AuthorSort>) -> Vec<String> {
    let catalog = catalog();
    let store = store();
    let plan = handler().compile_entity_query(definition).unwrap().into_plan();
    PlanExecutor::new(&catalog, &store)
        .entities(&plan)
        .unwrap()
        .iter()
        .filter_map(|row| row.get("name").and_then(Value::as_str).map(String::from))
        .collect()
}

#[test]
fn unfiltered_count_covers_every_author() {
    assert_eq!(count(&QueryDefinition::new(AuthorCriteria::default())), 3);
}

#[test]
fn collection_restriction_does_not_multiply_roots() {
    let criteria = AuthorCriteria {
        book_title: Some("The".into()),
        ..Default::default()
    };
    // Le Guin has three matching books but is counted once.
    assert_eq!(count(&QueryDefinition::new(criteria)), 1);
}

#[test]
fn restrictions_on_one_collection_node_share_a_subquery() {
    let criteria = AuthorCriteria {
        book_title: Some("e".into()),
        min_pages: Some(400),
        ..Default::default()
    };
    let definition = QueryDefinition::new(criteria);
    assert_eq!(names(&definition), vec!["Herbert"]);

    let plan = handler().compile_entity_query(&definition).unwrap().into_plan();
    assert!(plan.joins.is_empty());
    assert_eq!(
        plan.to_string(),
        "SELECT t0 FROM Author t0 WHERE t0.id IN (SELECT tq0_0.id FROM Author tq0_0 \
         JOIN tq0_0.books tq0_1 WHERE tq0_1.title LIKE '%e%' AND tq0_1.pages >= 400)"
    );
}

#[test]
fn sort_only_join_keeps_unrelated_roots() {
    let definition = QueryDefinition::new(AuthorCriteria::default())
        .with_sort_info(SortInfo::desc(AuthorSort::Publisher));
    assert_eq!(names(&definition), vec!["Le Guin", "Herbert", "Tiptree"]);
}

#[test]
fn restriction_join_drops_unrelated_roots() {
    let criteria = AuthorCriteria {
        publisher: Some("Harper".into()),
        ..Default::default()
    };
    assert_eq!(names(&QueryDefinition::new(criteria)), vec!["Le Guin"]);
}

#[test]
fn restriction_and_sort_on_one_join() {
    let criteria = AuthorCriteria {
        name: Some(CriteriaField::new(Operator::Ne, "Herbert".to_string())),
        publisher: Some("Harper".into()),
        ..Default::default()
    };
    let definition = QueryDefinition::new(criteria).with_sort(AuthorSort::Publisher);
    let plan = handler().compile_entity_query(&definition).unwrap().into_plan();
    assert_eq!(
        plan.to_string(),
        "SELECT t0 FROM Author t0 LEFT JOIN FETCH t0.publisher t1 \
         WHERE t0.name <> 'Herbert' AND t1.name = 'Harper' ORDER BY t1.name ASC"
    );
    assert_eq!(names(&definition), vec!["Le Guin"]);
}

#[test]
fn sort_across_collection_repeats_roots() {
    let definition = QueryDefinition::new(AuthorCriteria::default())
        .with_sort(AuthorSort::BookTitle)
        .with_sort(AuthorSort::Name);
    assert_eq!(
        names(&definition),
        vec!["Tiptree", "Herbert", "Le Guin", "Le Guin", "Le Guin"]
    );
}
