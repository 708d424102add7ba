//! Typed identifiers for genogram entities.
//!
//! # Responsibility
//! - Keep person/relationship/household/text-box ids distinct at the type level.
//! - Generate fresh ids for entities created in this session.
//!
//! # Invariants
//! - Ids are opaque strings and are never reused for another entity.
//! - Ids loaded from files are preserved verbatim (no re-keying).

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use uuid::Uuid;

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Prefix used for freshly generated ids.
            pub const PREFIX: &'static str = $prefix;

            /// Generates a new unique id (`<prefix>-<uuid v4>`).
            pub fn generate() -> Self {
                Self(format!("{}-{}", $prefix, Uuid::new_v4()))
            }

            /// Wraps an externally supplied id.
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                self.0.as_str()
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }
    };
}

entity_id!(
    /// Stable identifier of a Person node.
    PersonId,
    "person"
);
entity_id!(
    /// Stable identifier of a Relationship edge.
    RelationshipId,
    "rel"
);
entity_id!(
    /// Stable identifier of a Household polygon.
    HouseholdId,
    "household"
);
entity_id!(
    /// Stable identifier of a free-floating text box.
    TextBoxId,
    "textbox"
);

/// Reference to any entity on the canvas.
///
/// Used by selection, context-menu and clipboard state.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EntityRef {
    Person(PersonId),
    Relationship(RelationshipId),
    Household(HouseholdId),
    TextBox(TextBoxId),
}
