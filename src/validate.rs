//! # Form Validation
//!
//! This module turns raw form values into a [`Draft`] the store can write, or into a set of
//! per-field error messages to show next to the submitted input.
//!
//! Validation is driven entirely by the declarative tables in [`crate::schema`]. Each field
//! is checked in isolation first (required, type, length, precision); reference fields are
//! then resolved against the store inside the caller's transaction, so a dangling reference
//! is reported as a field error rather than surfacing as a constraint violation on write.
//!
//! Only the first failing rule is reported for a field.
//!
//! ```rust
//! use distance_counter::{EntityKind, FormData, validate::check_fields};
//!
//! let mut form = FormData::new();
//! form.insert("city".to_string(), "Manchester".to_string());
//! form.insert("country".to_string(), String::new());
//!
//! let (_values, errors) = check_fields(EntityKind::Office, &form);
//! assert_eq!(errors.get("country"), Some("This field is required."));
//! assert_eq!(errors.get("city"), None);
//! ```

use std::collections::BTreeMap;
use std::sync::LazyLock;

use chrono::{Datelike, NaiveDate};
use regex::Regex;
use sqlx::{Sqlite, Transaction};

use crate::schema::{self, FieldSpec, FieldType};
use crate::{EntityKind, FormData, Magnitude, StoreError, sql};

/// Message for a missing required value.
pub const REQUIRED: &str = "This field is required.";
/// Message for a malformed email address.
pub const INVALID_EMAIL: &str = "Enter a valid email address.";
/// Message for an unparseable date.
pub const INVALID_DATE: &str = "Enter a valid date.";
/// Message for a reference that does not resolve.
pub const INVALID_CHOICE: &str =
    "Select a valid choice. That choice is not one of the available choices.";

const DATE_INPUT_FORMATS: [&str; 3] = ["%Y-%m-%d", "%m/%d/%Y", "%m/%d/%y"];

static EMAIL_USER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[-!#$%&'*+/=?^_`{}|~0-9A-Za-z]+(\.[-!#$%&'*+/=?^_`{}|~0-9A-Za-z]+)*$")
        .expect("email user pattern compiles")
});

static EMAIL_DOMAIN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?:[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?\.)+(?:[A-Za-z]{2,63}|xn--[A-Za-z0-9]{1,59})$",
    )
    .expect("email domain pattern compiles")
});

////////////////////////////////////////////// FieldValue //////////////////////////////////////////////

/// A typed, checked value for one column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    /// Trimmed text.
    Text(String),
    /// A calendar date.
    Date(NaiveDate),
    /// A fixed-point magnitude.
    Decimal(Magnitude),
    /// The key of a row of the given kind.
    Reference(EntityKind, i64),
}

////////////////////////////////////////////// FieldErrors /////////////////////////////////////////////

/// Error messages keyed by field name, at most one per field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors(BTreeMap<&'static str, String>);

impl FieldErrors {
    /// An empty error set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `message` for `field` unless the field already has an error.
    pub fn insert(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.entry(field).or_insert_with(|| message.into());
    }

    /// The error for `field`, if any.
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    /// True when no field has an error.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of fields with an error.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterates over `(field, message)` pairs in field-name order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.0.iter().map(|(field, message)| (*field, message.as_str()))
    }
}

/////////////////////////////////////////////// Draft //////////////////////////////////////////////////

/// A fully validated set of values for one row of `kind`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Draft {
    kind: EntityKind,
    values: Vec<(&'static FieldSpec, FieldValue)>,
}

impl Draft {
    /// The kind this draft belongs to.
    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    /// Column names paired with their values, in schema order.
    pub fn columns(&self) -> impl Iterator<Item = (&'static str, &FieldValue)> {
        self.values.iter().map(|(field, value)| (field.column, value))
    }

    /// The value for the named form field.
    pub fn value(&self, name: &str) -> Option<&FieldValue> {
        self.values
            .iter()
            .find(|(field, _)| field.name == name)
            .map(|(_, value)| value)
    }
}

/// Outcome of validating a submitted form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Validation {
    /// Every field passed; the draft may be written.
    Valid(Draft),
    /// At least one field failed.
    Invalid(FieldErrors),
}

////////////////////////////////////////////// Checking ////////////////////////////////////////////////

/// Checks text against a maximum length after trimming.
pub fn check_length(value: &str, max_length: usize) -> Result<(), String> {
    let length = value.chars().count();
    if length > max_length {
        Err(format!(
            "Ensure this value has at most {} characters (it has {}).",
            max_length, length
        ))
    } else {
        Ok(())
    }
}

/// True if `value` looks like a deliverable email address.
pub fn is_valid_email(value: &str) -> bool {
    let Some((user, domain)) = value.rsplit_once('@') else {
        return false;
    };
    EMAIL_USER.is_match(user) && (domain == "localhost" || EMAIL_DOMAIN.is_match(domain))
}

/// Checks one raw value against its field spec.
///
/// Returns `Ok(None)` for an optional field left empty.
pub fn check_field(field: &FieldSpec, raw: Option<&str>) -> Result<Option<FieldValue>, String> {
    let value = raw.map(str::trim).unwrap_or("");
    if value.is_empty() {
        return match (field.required, field.field_type) {
            (true, _) => Err(REQUIRED.to_string()),
            (false, FieldType::Text { .. } | FieldType::Email { .. }) => {
                Ok(Some(FieldValue::Text(String::new())))
            }
            (false, _) => Ok(None),
        };
    }

    match field.field_type {
        FieldType::Text { max_length } => {
            check_length(value, max_length)?;
            Ok(Some(FieldValue::Text(value.to_string())))
        }
        FieldType::Email { max_length } => {
            if !is_valid_email(value) {
                return Err(INVALID_EMAIL.to_string());
            }
            check_length(value, max_length)?;
            Ok(Some(FieldValue::Text(value.to_string())))
        }
        FieldType::Date => DATE_INPUT_FORMATS
            .iter()
            .find_map(|format| NaiveDate::parse_from_str(value, format).ok())
            .filter(|date| (1..=9999).contains(&date.year()))
            .map(|date| Some(FieldValue::Date(date)))
            .ok_or_else(|| INVALID_DATE.to_string()),
        FieldType::Decimal => Magnitude::parse(value)
            .map(|magnitude| Some(FieldValue::Decimal(magnitude)))
            .map_err(|e| e.to_string()),
        FieldType::Reference(target) => value
            .parse::<i64>()
            .map(|id| Some(FieldValue::Reference(target, id)))
            .map_err(|_| INVALID_CHOICE.to_string()),
    }
}

/// Checks every field of `kind` without touching the store.
///
/// References are parsed but not resolved; see [`validate`].
pub fn check_fields(
    kind: EntityKind,
    form: &FormData,
) -> (Vec<(&'static FieldSpec, FieldValue)>, FieldErrors) {
    let mut values = Vec::new();
    let mut errors = FieldErrors::new();
    for field in schema::fields(kind) {
        match check_field(field, form.get(field.name).map(String::as_str)) {
            Ok(Some(value)) => values.push((field, value)),
            Ok(None) => {}
            Err(message) => errors.insert(field.name, message),
        }
    }
    (values, errors)
}

/// Validates a submitted form for `kind`, resolving references inside `tx`.
///
/// Never writes to the store.
pub async fn validate(
    tx: &mut Transaction<'_, Sqlite>,
    kind: EntityKind,
    form: &FormData,
) -> Result<Validation, StoreError> {
    let (values, mut errors) = check_fields(kind, form);
    for (field, value) in &values {
        if let FieldValue::Reference(target, id) = value {
            if !sql::record::exists(tx, *target, *id).await? {
                errors.insert(field.name, INVALID_CHOICE);
            }
        }
    }
    if errors.is_empty() {
        Ok(Validation::Valid(Draft { kind, values }))
    } else {
        Ok(Validation::Invalid(errors))
    }
}
