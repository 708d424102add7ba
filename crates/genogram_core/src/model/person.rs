//! Person node model.
//!
//! # Responsibility
//! - Define the canonical record for every node drawn on the genogram.
//! - Carry case-management metadata (network membership, contact lists,
//!   merge provenance) next to demographic fields.
//!
//! # Invariants
//! - `id` is stable and never reused for another person.
//! - `generation` is an integer layout tier; derived tiers come from
//!   `service::layout::derive_generations`.
//! - `(x, y)` is the centre of the node symbol and is always finite.
//! - An archived person keeps its record but carries `merged_into`.

use crate::model::geometry::Point;
use crate::model::ids::PersonId;
use serde_json::{Map, Value};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Display gender; drives the default symbol shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Gender {
    Male,
    Female,
    Nonbinary,
    #[default]
    Unknown,
}

impl Gender {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Male => "male",
            Self::Female => "female",
            Self::Nonbinary => "nonbinary",
            Self::Unknown => "unknown",
        }
    }

    /// Lenient parse; unrecognised values map to `Unknown`.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "male" | "m" => Self::Male,
            "female" | "f" => Self::Female,
            "nonbinary" | "non-binary" | "other" => Self::Nonbinary,
            _ => Self::Unknown,
        }
    }

    /// Default partner gender used by compound creation operations.
    pub fn opposite(self) -> Self {
        match self {
            Self::Male => Self::Female,
            Self::Female => Self::Male,
            Self::Nonbinary | Self::Unknown => Self::Unknown,
        }
    }
}

/// Special placement status of a child in its family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SpecialStatus {
    #[default]
    None,
    Adopted,
    Foster,
    Stepchild,
}

impl SpecialStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Adopted => "adopted",
            Self::Foster => "foster",
            Self::Stepchild => "stepchild",
        }
    }

    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "adopted" => Self::Adopted,
            "foster" => Self::Foster,
            "stepchild" | "step" => Self::Stepchild,
            _ => Self::None,
        }
    }
}

/// Lifecycle of a member record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MemberStatus {
    #[default]
    Active,
    /// Folded into another member by a merge; kept for the audit trail.
    Archived,
}

impl MemberStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Archived => "archived",
        }
    }

    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "archived" => Self::Archived,
            _ => Self::Active,
        }
    }
}

/// Node type with its type-specific payload.
///
/// Serialized as wire `type` + `typeData`.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum NodeKind {
    /// A family or network member.
    #[default]
    Person,
    Organization {
        org_type: String,
        contact_person: String,
    },
    /// Service or resource provider (wire tags `service` and `resource`).
    Service {
        service_type: String,
        provider: String,
    },
    Place {
        address: String,
    },
    /// User-defined node type; unknown payload keys are kept as-is.
    Custom {
        label: String,
        fields: Map<String, Value>,
    },
}

impl NodeKind {
    /// Wire `type` tag.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Person => "person",
            Self::Organization { .. } => "organization",
            Self::Service { .. } => "service",
            Self::Place { .. } => "place",
            Self::Custom { .. } => "custom",
        }
    }

    pub fn is_person(&self) -> bool {
        matches!(self, Self::Person)
    }
}

/// Canonical person/node record.
#[derive(Debug, Clone, PartialEq)]
pub struct Person {
    pub id: PersonId,
    pub name: String,
    pub gender: Gender,
    pub age: Option<u32>,
    /// Free-form date text as entered by the caseworker.
    pub birth_date: Option<String>,
    pub death_date: Option<String>,
    pub is_deceased: bool,
    /// Optional override of the deceased marker glyph.
    pub deceased_symbol: Option<String>,
    pub is_pregnant: bool,
    pub pregnancy_weeks: Option<u32>,
    pub generation: i32,
    pub x: f64,
    pub y: f64,
    /// Member of the case's support network (case-management semantics).
    pub network_member: bool,
    pub notes: String,
    pub special_status: SpecialStatus,
    pub kind: NodeKind,
    pub phones: Vec<String>,
    pub emails: Vec<String>,
    /// Provenance labels (intake source, referral, import batch).
    pub sources: Vec<String>,
    pub status: MemberStatus,
    pub merged_into: Option<PersonId>,
}

/// Validation failures for person records.
#[derive(Debug, Clone, PartialEq)]
pub enum PersonValidationError {
    EmptyId,
    NonFinitePosition { x: f64, y: f64 },
}

impl Display for PersonValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyId => write!(f, "person id must not be empty"),
            Self::NonFinitePosition { x, y } => {
                write!(f, "person position must be finite, got ({x}, {y})")
            }
        }
    }
}

impl Error for PersonValidationError {}

impl Person {
    /// Creates a person with a generated id at the origin.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_id(PersonId::generate(), name)
    }

    /// Creates a person with a caller-provided id.
    ///
    /// Used by import paths where identity already exists externally.
    pub fn with_id(id: PersonId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            gender: Gender::Unknown,
            age: None,
            birth_date: None,
            death_date: None,
            is_deceased: false,
            deceased_symbol: None,
            is_pregnant: false,
            pregnancy_weeks: None,
            generation: 0,
            x: 0.0,
            y: 0.0,
            network_member: false,
            notes: String::new(),
            special_status: SpecialStatus::None,
            kind: NodeKind::Person,
            phones: Vec::new(),
            emails: Vec::new(),
            sources: Vec::new(),
            status: MemberStatus::Active,
            merged_into: None,
        }
    }

    pub fn with_gender(mut self, gender: Gender) -> Self {
        self.gender = gender;
        self
    }

    pub fn at(mut self, x: f64, y: f64) -> Self {
        self.x = x;
        self.y = y;
        self
    }

    pub fn in_generation(mut self, generation: i32) -> Self {
        self.generation = generation;
        self
    }

    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn set_position(&mut self, point: Point) {
        self.x = point.x;
        self.y = point.y;
    }

    /// Whether this member is drawn and exported.
    pub fn is_active(&self) -> bool {
        self.status == MemberStatus::Active
    }

    /// Marks this record as merged into `target`.
    pub fn archive_into(&mut self, target: PersonId) {
        self.status = MemberStatus::Archived;
        self.merged_into = Some(target);
    }

    pub fn validate(&self) -> Result<(), PersonValidationError> {
        if self.id.as_str().trim().is_empty() {
            return Err(PersonValidationError::EmptyId);
        }
        if !(self.x.is_finite() && self.y.is_finite()) {
            return Err(PersonValidationError::NonFinitePosition {
                x: self.x,
                y: self.y,
            });
        }
        Ok(())
    }
}

/// Partial update for person fields; `None` leaves a field untouched.
///
/// Position is intentionally absent: it only changes through drag and layout.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PersonPatch {
    pub name: Option<String>,
    pub gender: Option<Gender>,
    pub age: Option<Option<u32>>,
    pub birth_date: Option<Option<String>>,
    pub death_date: Option<Option<String>>,
    pub is_deceased: Option<bool>,
    pub deceased_symbol: Option<Option<String>>,
    pub is_pregnant: Option<bool>,
    pub pregnancy_weeks: Option<Option<u32>>,
    pub generation: Option<i32>,
    pub network_member: Option<bool>,
    pub notes: Option<String>,
    pub special_status: Option<SpecialStatus>,
    pub kind: Option<NodeKind>,
    pub phones: Option<Vec<String>>,
    pub emails: Option<Vec<String>>,
}

impl PersonPatch {
    pub fn apply_to(self, person: &mut Person) {
        if let Some(value) = self.name {
            person.name = value;
        }
        if let Some(value) = self.gender {
            person.gender = value;
        }
        if let Some(value) = self.age {
            person.age = value;
        }
        if let Some(value) = self.birth_date {
            person.birth_date = value;
        }
        if let Some(value) = self.death_date {
            person.death_date = value;
        }
        if let Some(value) = self.is_deceased {
            person.is_deceased = value;
        }
        if let Some(value) = self.deceased_symbol {
            person.deceased_symbol = value;
        }
        if let Some(value) = self.is_pregnant {
            person.is_pregnant = value;
        }
        if let Some(value) = self.pregnancy_weeks {
            person.pregnancy_weeks = value;
        }
        if let Some(value) = self.generation {
            person.generation = value;
        }
        if let Some(value) = self.network_member {
            person.network_member = value;
        }
        if let Some(value) = self.notes {
            person.notes = value;
        }
        if let Some(value) = self.special_status {
            person.special_status = value;
        }
        if let Some(value) = self.kind {
            person.kind = value;
        }
        if let Some(value) = self.phones {
            person.phones = value;
        }
        if let Some(value) = self.emails {
            person.emails = value;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Gender, MemberStatus, Person, PersonPatch, PersonValidationError};
    use crate::model::ids::PersonId;

    #[test]
    fn new_person_defaults_to_active_generation_zero() {
        let person = Person::new("Ada");
        assert_eq!(person.generation, 0);
        assert!(person.is_active());
        assert!(person.kind.is_person());
        assert_eq!(person.gender, Gender::Unknown);
    }

    #[test]
    fn opposite_gender_heuristic() {
        assert_eq!(Gender::Male.opposite(), Gender::Female);
        assert_eq!(Gender::Female.opposite(), Gender::Male);
        assert_eq!(Gender::Nonbinary.opposite(), Gender::Unknown);
    }

    #[test]
    fn archive_records_merge_target() {
        let mut person = Person::new("Dup");
        person.archive_into(PersonId::new("keep"));
        assert_eq!(person.status, MemberStatus::Archived);
        assert_eq!(person.merged_into, Some(PersonId::new("keep")));
        assert!(!person.is_active());
    }

    #[test]
    fn validate_rejects_non_finite_position() {
        let person = Person::new("Lost").at(f64::NAN, 0.0);
        assert!(matches!(
            person.validate(),
            Err(PersonValidationError::NonFinitePosition { .. })
        ));
    }

    #[test]
    fn patch_only_touches_provided_fields() {
        let mut person = Person::new("Before").at(10.0, 20.0);
        PersonPatch {
            name: Some("After".to_string()),
            age: Some(Some(42)),
            ..PersonPatch::default()
        }
        .apply_to(&mut person);
        assert_eq!(person.name, "After");
        assert_eq!(person.age, Some(42));
        assert_eq!((person.x, person.y), (10.0, 20.0));
    }
}
