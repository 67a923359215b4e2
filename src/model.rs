//! Plain data records for the four entity kinds.
//!
//! Records are what the store hands back. Rows that reference other kinds carry the
//! referenced row's display fields as well, so presenting a record never needs a second
//! lookup.

use std::collections::HashMap;

use chrono::NaiveDate;
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row};

use crate::{EntityKind, Magnitude};

/// Raw, untrusted form values keyed by field name.
pub type FormData = HashMap<String, String>;

/////////////////////////////////////////////// Records ////////////////////////////////////////////////

/// An office location.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct Office {
    /// Store-assigned key.
    pub id: i64,
    /// City the office is in.
    pub city: String,
    /// Country the office is in.
    pub country: String,
}

/// A person and the office they work at.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct Person {
    /// Store-assigned key.
    pub id: i64,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Contact address.
    pub email: String,
    /// Key of the office.
    pub office_id: i64,
    /// City of the office, for display.
    pub office_city: String,
}

/// A unit of measurement.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct Unit {
    /// Store-assigned key.
    pub id: i64,
    /// Label such as `km` or `steps`.
    pub symbol: String,
}

/// A logged distance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Distance {
    /// Store-assigned key.
    pub id: i64,
    /// Day the distance was covered.
    pub date: NaiveDate,
    /// Key of the person who logged it.
    pub person_id: i64,
    /// First name of that person, for display.
    pub person_first_name: String,
    /// Last name of that person, for display.
    pub person_last_name: String,
    /// How far.
    pub magnitude: Magnitude,
    /// Key of the unit.
    pub unit_id: i64,
    /// Symbol of the unit, for display.
    pub unit_symbol: String,
}

impl<'r> FromRow<'r, SqliteRow> for Distance {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Distance {
            id: row.try_get("id")?,
            date: row.try_get("date")?,
            person_id: row.try_get("person_id")?,
            person_first_name: row.try_get("person_first_name")?,
            person_last_name: row.try_get("person_last_name")?,
            magnitude: Magnitude::from_hundredths(row.try_get("magnitude")?),
            unit_id: row.try_get("unit_id")?,
            unit_symbol: row.try_get("unit_symbol")?,
        })
    }
}

/////////////////////////////////////////////// Record /////////////////////////////////////////////////

/// A stored row of any kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Record {
    /// An office row.
    Office(Office),
    /// A person row.
    Person(Person),
    /// A unit row.
    Unit(Unit),
    /// A distance row.
    Distance(Distance),
}

impl Record {
    /// The kind of this row.
    pub fn kind(&self) -> EntityKind {
        match self {
            Record::Office(_) => EntityKind::Office,
            Record::Person(_) => EntityKind::Person,
            Record::Unit(_) => EntityKind::Unit,
            Record::Distance(_) => EntityKind::Distance,
        }
    }

    /// The store-assigned key.
    pub fn id(&self) -> i64 {
        match self {
            Record::Office(office) => office.id,
            Record::Person(person) => person.id,
            Record::Unit(unit) => unit.id,
            Record::Distance(distance) => distance.id,
        }
    }

    /// Short text identifying the row in lists and selects.
    pub fn label(&self) -> String {
        match self {
            Record::Office(office) => office.city.clone(),
            Record::Person(person) => format!("{}, {}", person.first_name, person.last_name),
            Record::Unit(unit) => unit.symbol.clone(),
            Record::Distance(distance) => format!(
                "{}: {}, {}",
                distance.date, distance.person_last_name, distance.person_first_name
            ),
        }
    }

    /// Labelled values for the detail page.
    pub fn display_fields(&self) -> Vec<(&'static str, String)> {
        match self {
            Record::Office(office) => vec![
                ("City", office.city.clone()),
                ("Country", office.country.clone()),
            ],
            Record::Person(person) => vec![
                ("First name", person.first_name.clone()),
                ("Last name", person.last_name.clone()),
                ("Email", person.email.clone()),
                ("Office", person.office_city.clone()),
            ],
            Record::Unit(unit) => vec![("Unit of measurement", unit.symbol.clone())],
            Record::Distance(distance) => vec![
                ("Date", distance.date.to_string()),
                (
                    "Person",
                    format!("{}, {}", distance.person_first_name, distance.person_last_name),
                ),
                (
                    "Distance",
                    format!("{} {}", distance.magnitude, distance.unit_symbol),
                ),
            ],
        }
    }

    /// The row as raw form values, for pre-populating an edit form.
    pub fn form_values(&self) -> FormData {
        let pairs: Vec<(&str, String)> = match self {
            Record::Office(office) => vec![
                ("city", office.city.clone()),
                ("country", office.country.clone()),
            ],
            Record::Person(person) => vec![
                ("first_name", person.first_name.clone()),
                ("last_name", person.last_name.clone()),
                ("email", person.email.clone()),
                ("office", person.office_id.to_string()),
            ],
            Record::Unit(unit) => vec![("symbol", unit.symbol.clone())],
            Record::Distance(distance) => vec![
                ("date", distance.date.format("%Y-%m-%d").to_string()),
                ("person", distance.person_id.to_string()),
                ("magnitude", distance.magnitude.to_string()),
                ("unit", distance.unit_id.to_string()),
            ],
        };
        pairs
            .into_iter()
            .map(|(name, value)| (name.to_string(), value))
            .collect()
    }
}
