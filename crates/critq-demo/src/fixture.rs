//! Sample data: three businesses and eight people across three families.

use chrono::{Months, NaiveDate};
use critq_core::{EntityRow, MemoryStore};

pub const ACME: i64 = 1;
pub const HAL: i64 = 2;
pub const TREE_CORP: i64 = 3;

pub const BOB: i64 = 1;
pub const MOLLY: i64 = 2;
pub const BRIAN: i64 = 3;
pub const SUZY: i64 = 4;
pub const BILL: i64 = 5;
pub const BERT: i64 = 6;
pub const WENDY: i64 = 7;
pub const ERNIE: i64 = 8;

/// The date `years` before `today`, clamped to the earliest representable date.
pub fn years_before(today: NaiveDate, years: u32) -> NaiveDate {
    today
        .checked_sub_months(Months::new(years.saturating_mul(12)))
        .unwrap_or(NaiveDate::MIN)
}

fn business(id: i64, name: &str, address: Option<&str>, owner: Option<i64>) -> EntityRow {
    EntityRow::new()
        .with("id", id)
        .with("name", name)
        .with("address", address)
        .with("ownerId", owner)
}

fn person(
    today: NaiveDate,
    id: i64,
    (first, last): (&str, &str),
    age: u32,
    employer: Option<i64>,
    parent: Option<i64>,
) -> EntityRow {
    EntityRow::new()
        .with("id", id)
        .with("firstName", first)
        .with("lastName", last)
        .with("birthdate", years_before(today, age))
        .with("employerId", employer)
        .with("parentId", parent)
}

/// Build the store with birthdates relative to `today`.
///
/// | id | person       | age | employer  | parent |
/// |----|--------------|-----|-----------|--------|
/// | 1  | Bob Smith    | 40  | Acme      |        |
/// | 2  | Molly Smith  | 15  |           | Bob    |
/// | 3  | Brian Smith  | 17  |           | Bob    |
/// | 4  | Suzy Johnson | 62  | Acme      |        |
/// | 5  | Bill Johnson | 5   |           | Suzy   |
/// | 6  | Bert Apple   | 65  | Tree Corp |        |
/// | 7  | Wendy Apple  | 42  | Tree Corp | Bert   |
/// | 8  | Ernie Banana | 58  | HAL       |        |
///
/// Suzy owns Acme, Wendy owns Tree Corp and HAL has no owner on record.
pub fn people(today: NaiveDate) -> MemoryStore {
    MemoryStore::new()
        .with_rows(
            "Business",
            [
                business(ACME, "Acme", Some("NY"), Some(SUZY)),
                business(HAL, "HAL", Some("CA"), None),
                business(TREE_CORP, "Tree Corp", None, Some(WENDY)),
            ],
        )
        .with_rows(
            "Person",
            [
                person(today, BOB, ("Bob", "Smith"), 40, Some(ACME), None),
                person(today, MOLLY, ("Molly", "Smith"), 15, None, Some(BOB)),
                person(today, BRIAN, ("Brian", "Smith"), 17, None, Some(BOB)),
                person(today, SUZY, ("Suzy", "Johnson"), 62, Some(ACME), None),
                person(today, BILL, ("Bill", "Johnson"), 5, None, Some(SUZY)),
                person(today, BERT, ("Bert", "Apple"), 65, Some(TREE_CORP), None),
                person(today, WENDY, ("Wendy", "Apple"), 42, Some(TREE_CORP), Some(BERT)),
                person(today, ERNIE, ("Ernie", "Banana"), 58, Some(HAL), None),
            ],
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_birthdates_follow_today() {
        let today = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        assert_eq!(
            years_before(today, 18),
            NaiveDate::from_ymd_opt(2006, 2, 28).unwrap()
        );

        let store = people(today);
        assert_eq!(store.len("Person"), 8);
        assert_eq!(store.len("Business"), 3);
        let bill = &store.rows("Person")[4];
        assert_eq!(
            bill.get("birthdate").and_then(|v| v.as_date()),
            Some(NaiveDate::from_ymd_opt(2019, 2, 28).unwrap())
        );
    }
}
