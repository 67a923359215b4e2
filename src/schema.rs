//! Declarative field schemas for every entity kind.
//!
//! The validation layer and the store both interpret these tables; neither carries
//! per-kind field logic of its own.

use crate::EntityKind;

/// The type and constraints of one form field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    /// Free text of bounded length.
    Text {
        /// Maximum number of characters.
        max_length: usize,
    },
    /// An email address of bounded length.
    Email {
        /// Maximum number of characters.
        max_length: usize,
    },
    /// A calendar date written `YYYY-MM-DD`.
    Date,
    /// A fixed-point [`Magnitude`](crate::Magnitude).
    Decimal,
    /// The key of an existing record of another kind.
    Reference(EntityKind),
}

/// One field of an entity kind's schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    /// Name of the form field.
    pub name: &'static str,
    /// Label shown next to the field.
    pub label: &'static str,
    /// Column the value is stored in.
    pub column: &'static str,
    /// Type and constraints.
    pub field_type: FieldType,
    /// Whether an empty value is rejected.
    pub required: bool,
}

impl FieldSpec {
    const fn new(
        name: &'static str,
        label: &'static str,
        column: &'static str,
        field_type: FieldType,
    ) -> Self {
        Self {
            name,
            label,
            column,
            field_type,
            required: true,
        }
    }
}

const OFFICE: [FieldSpec; 2] = [
    FieldSpec::new("city", "City", "city", FieldType::Text { max_length: 100 }),
    FieldSpec::new("country", "Country", "country", FieldType::Text { max_length: 100 }),
];

const PERSON: [FieldSpec; 4] = [
    FieldSpec::new("first_name", "First name", "first_name", FieldType::Text { max_length: 20 }),
    FieldSpec::new("last_name", "Last name", "last_name", FieldType::Text { max_length: 30 }),
    FieldSpec::new("email", "Email", "email", FieldType::Email { max_length: 100 }),
    FieldSpec::new(
        "office",
        "Office",
        "office_id",
        FieldType::Reference(EntityKind::Office),
    ),
];

const UNIT: [FieldSpec; 1] = [FieldSpec::new(
    "symbol",
    "Unit of measurement",
    "symbol",
    FieldType::Text { max_length: 10 },
)];

const DISTANCE: [FieldSpec; 4] = [
    FieldSpec::new("date", "Date", "date", FieldType::Date),
    FieldSpec::new(
        "person",
        "Person",
        "person_id",
        FieldType::Reference(EntityKind::Person),
    ),
    FieldSpec::new("magnitude", "Distance", "magnitude", FieldType::Decimal),
    FieldSpec::new("unit", "Unit", "unit_id", FieldType::Reference(EntityKind::Unit)),
];

/// The fields of `kind`, in form order.
pub fn fields(kind: EntityKind) -> &'static [FieldSpec] {
    match kind {
        EntityKind::Office => &OFFICE,
        EntityKind::Person => &PERSON,
        EntityKind::Unit => &UNIT,
        EntityKind::Distance => &DISTANCE,
    }
}

/// The kinds `kind` holds references to.
pub fn referenced_kinds(kind: EntityKind) -> impl Iterator<Item = EntityKind> {
    fields(kind).iter().filter_map(|field| match field.field_type {
        FieldType::Reference(target) => Some(target),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn references_point_at_earlier_kinds() {
        for kind in EntityKind::ALL {
            let position = EntityKind::ALL.iter().position(|k| *k == kind).unwrap();
            for target in referenced_kinds(kind) {
                let target_position = EntityKind::ALL.iter().position(|k| *k == target).unwrap();
                assert!(target_position < position, "{kind} references {target}");
            }
        }
    }

    #[test]
    fn field_names_are_unique_per_kind() {
        for kind in EntityKind::ALL {
            let mut names: Vec<_> = fields(kind).iter().map(|f| f.name).collect();
            names.sort_unstable();
            names.dedup();
            assert_eq!(names.len(), fields(kind).len());
        }
    }

    #[test]
    fn every_field_is_required() {
        assert!(
            EntityKind::ALL
                .into_iter()
                .flat_map(fields)
                .all(|field| field.required)
        );
    }

    #[test]
    fn distance_references() {
        let targets: Vec<_> = referenced_kinds(EntityKind::Distance).collect();
        assert_eq!(targets, vec![EntityKind::Person, EntityKind::Unit]);
    }
}
