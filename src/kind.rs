use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

////////////////////////////////////////////// EntityKind //////////////////////////////////////////////

/// The four kinds of record the application stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    /// An office location.
    Office,
    /// A person who works at an office.
    Person,
    /// A unit of measurement.
    Unit,
    /// A distance logged by a person.
    Distance,
}

impl EntityKind {
    /// Every kind, in dependency order (referenced kinds first).
    pub const ALL: [EntityKind; 4] = [
        EntityKind::Office,
        EntityKind::Person,
        EntityKind::Unit,
        EntityKind::Distance,
    ];

    /// Lowercase singular name, used for template names and log fields.
    pub fn name(self) -> &'static str {
        match self {
            EntityKind::Office => "office",
            EntityKind::Person => "person",
            EntityKind::Unit => "unit",
            EntityKind::Distance => "distance",
        }
    }

    /// Human-readable singular title.
    pub fn title(self) -> &'static str {
        match self {
            EntityKind::Office => "Office",
            EntityKind::Person => "Person",
            EntityKind::Unit => "Unit",
            EntityKind::Distance => "Distance",
        }
    }

    /// Human-readable plural title.
    pub fn plural_title(self) -> &'static str {
        match self {
            EntityKind::Office => "Offices",
            EntityKind::Person => "People",
            EntityKind::Unit => "Units",
            EntityKind::Distance => "Distances",
        }
    }

    /// The table holding rows of this kind.
    pub fn table(self) -> &'static str {
        match self {
            EntityKind::Office => "offices",
            EntityKind::Person => "people",
            EntityKind::Unit => "units",
            EntityKind::Distance => "distances",
        }
    }

    /// Logical template identifier for one page of this kind, e.g. `office/list.html`.
    pub fn template(self, page: &str) -> String {
        format!("{}/{}.html", self.name(), page)
    }
}

impl Display for EntityKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.name())
    }
}

/// Error returned when parsing an unknown entity kind.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown entity kind {0:?}")]
pub struct EntityKindParseError(String);

impl FromStr for EntityKind {
    type Err = EntityKindParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EntityKind::ALL
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| EntityKindParseError(s.to_string()))
    }
}
