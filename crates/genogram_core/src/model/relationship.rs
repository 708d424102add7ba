//! Relationship edge model.
//!
//! # Responsibility
//! - Define the typed edge connecting people, unions and children.
//! - Keep the three endpoint shapes (union, child, single-parent adoption)
//!   apart so the invariants are checked against the shape, not by convention.
//!
//! # Invariants
//! - `Union` endpoints are two distinct people.
//! - `Child` edges hang off a union relationship, never off two parents.
//! - `SingleParent` is the only self-referential shape and is always `adoption`.
//! - `bubble_position` is kept inside `[0, 1]`.

use crate::model::ids::{PersonId, RelationshipId};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Default colour for new relationship lines.
pub const DEFAULT_RELATIONSHIP_COLOR: &str = "#455a64";
/// Neutral colour used for "unknown co-parent" unions.
pub const NEUTRAL_RELATIONSHIP_COLOR: &str = "#9e9e9e";
/// Default bubble position (segment midpoint).
pub const DEFAULT_BUBBLE_POSITION: f64 = 0.5;

/// Relationship type shown on the line.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RelationshipType {
    Marriage,
    Partner,
    Cohabitation,
    Engagement,
    Dating,
    Divorce,
    Separation,
    Widowed,
    Complicated,
    Affair,
    Adoption,
    Step,
    Sibling,
    Twins,
    Close,
    Distant,
    Conflict,
    Hostile,
    Cutoff,
    Abuse,
    Friendship,
    Professional,
    Child,
    /// Type tag not known to this build; kept verbatim.
    Custom(String),
}

impl RelationshipType {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Marriage => "marriage",
            Self::Partner => "partner",
            Self::Cohabitation => "cohabitation",
            Self::Engagement => "engagement",
            Self::Dating => "dating",
            Self::Divorce => "divorce",
            Self::Separation => "separation",
            Self::Widowed => "widowed",
            Self::Complicated => "complicated",
            Self::Affair => "affair",
            Self::Adoption => "adoption",
            Self::Step => "step",
            Self::Sibling => "sibling",
            Self::Twins => "twins",
            Self::Close => "close",
            Self::Distant => "distant",
            Self::Conflict => "conflict",
            Self::Hostile => "hostile",
            Self::Cutoff => "cutoff",
            Self::Abuse => "abuse",
            Self::Friendship => "friendship",
            Self::Professional => "professional",
            Self::Child => "child",
            Self::Custom(value) => value.as_str(),
        }
    }

    /// Lenient parse; a blank tag is read as `partner`.
    pub fn parse(value: &str) -> Self {
        match value.trim() {
            "" => Self::Partner,
            "marriage" | "married" => Self::Marriage,
            "partner" | "partnership" => Self::Partner,
            "cohabitation" | "cohabiting" => Self::Cohabitation,
            "engagement" | "engaged" => Self::Engagement,
            "dating" => Self::Dating,
            "divorce" | "divorced" => Self::Divorce,
            "separation" | "separated" => Self::Separation,
            "widowed" => Self::Widowed,
            "complicated" => Self::Complicated,
            "affair" => Self::Affair,
            "adoption" => Self::Adoption,
            "step" | "step-relationship" | "stepRelationship" => Self::Step,
            "sibling" => Self::Sibling,
            "twins" => Self::Twins,
            "close" => Self::Close,
            "distant" => Self::Distant,
            "conflict" => Self::Conflict,
            "hostile" => Self::Hostile,
            "cutoff" => Self::Cutoff,
            "abuse" => Self::Abuse,
            "friendship" => Self::Friendship,
            "professional" => Self::Professional,
            "child" => Self::Child,
            other => Self::Custom(other.to_string()),
        }
    }

    /// Whether a union of this type can have children attached to it.
    pub fn is_parent_capable(&self) -> bool {
        matches!(
            self,
            Self::Marriage
                | Self::Partner
                | Self::Cohabitation
                | Self::Engagement
                | Self::Dating
                | Self::Divorce
                | Self::Separation
                | Self::Widowed
                | Self::Complicated
                | Self::Affair
                | Self::Adoption
                | Self::Step
        )
    }
}

/// Stroke pattern of a relationship line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LineStyle {
    #[default]
    Solid,
    Dashed,
    Dotted,
    Double,
    Zigzag,
}

impl LineStyle {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Solid => "solid",
            Self::Dashed => "dashed",
            Self::Dotted => "dotted",
            Self::Double => "double",
            Self::Zigzag => "zigzag",
        }
    }

    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "dashed" => Self::Dashed,
            "dotted" => Self::Dotted,
            "double" => Self::Double,
            "zigzag" => Self::Zigzag,
            _ => Self::Solid,
        }
    }
}

/// Endpoint shape of a relationship.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RelationshipLink {
    /// Edge between two distinct people.
    Union { from: PersonId, to: PersonId },
    /// Child attached to a union (or single-parent adoption) relationship.
    Child {
        union: RelationshipId,
        child: PersonId,
    },
    /// Self-referential single-parent adoption anchor.
    SingleParent { parent: PersonId },
}

impl RelationshipLink {
    /// Whether the relationship names `person` as any endpoint.
    pub fn involves(&self, person: &PersonId) -> bool {
        match self {
            Self::Union { from, to } => from == person || to == person,
            Self::Child { child, .. } => child == person,
            Self::SingleParent { parent } => parent == person,
        }
    }

    /// People that act as parents when children hang off this link.
    pub fn parents(&self) -> Vec<&PersonId> {
        match self {
            Self::Union { from, to } => vec![from, to],
            Self::SingleParent { parent } => vec![parent],
            Self::Child { .. } => Vec::new(),
        }
    }

    pub fn is_child(&self) -> bool {
        matches!(self, Self::Child { .. })
    }
}

/// Canonical relationship record.
#[derive(Debug, Clone, PartialEq)]
pub struct Relationship {
    pub id: RelationshipId,
    pub link: RelationshipLink,
    pub kind: RelationshipType,
    pub color: String,
    pub line_style: LineStyle,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub is_active: bool,
    /// Parametric position of the bubble along the union line.
    pub bubble_position: f64,
    pub notes: String,
}

/// Shape/type mismatches refused before a relationship is stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelationshipValidationError {
    EmptyId,
    /// A union may not connect a person to itself.
    SelfUnion(PersonId),
    /// `Child` links must carry the `child` type and vice versa.
    ChildTypeMismatch(RelationshipId),
    /// Single-parent links must carry the `adoption` type.
    SingleParentNotAdoption(RelationshipId),
    /// Custom tag that would read back as a different type (blank, padded,
    /// or the name of a built-in type).
    InvalidCustomType(RelationshipId),
}

impl Display for RelationshipValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyId => write!(f, "relationship id must not be empty"),
            Self::SelfUnion(id) => write!(f, "union relationship cannot link {id} to itself"),
            Self::ChildTypeMismatch(id) => {
                write!(f, "relationship {id}: child links require type `child`")
            }
            Self::SingleParentNotAdoption(id) => {
                write!(f, "relationship {id}: self-referential links require type `adoption`")
            }
            Self::InvalidCustomType(id) => {
                write!(f, "relationship {id}: custom type must be a non-blank, unreserved tag")
            }
        }
    }
}

impl Error for RelationshipValidationError {}

/// Clamps a bubble position to `[0, 1]`; NaN falls back to the midpoint.
pub fn clamp_bubble_position(value: f64) -> f64 {
    if value.is_nan() {
        return DEFAULT_BUBBLE_POSITION;
    }
    value.clamp(0.0, 1.0)
}

impl Relationship {
    fn with_link(link: RelationshipLink, kind: RelationshipType) -> Self {
        Self {
            id: RelationshipId::generate(),
            link,
            kind,
            color: DEFAULT_RELATIONSHIP_COLOR.to_string(),
            line_style: LineStyle::Solid,
            start_date: None,
            end_date: None,
            is_active: true,
            bubble_position: DEFAULT_BUBBLE_POSITION,
            notes: String::new(),
        }
    }

    /// Creates an edge between two people.
    pub fn union(kind: RelationshipType, from: PersonId, to: PersonId) -> Self {
        Self::with_link(RelationshipLink::Union { from, to }, kind)
    }

    /// Creates a child edge hanging off `union`.
    pub fn child(union: RelationshipId, child: PersonId) -> Self {
        Self::with_link(
            RelationshipLink::Child { union, child },
            RelationshipType::Child,
        )
    }

    /// Creates the self-referential single-parent adoption anchor.
    pub fn single_parent_adoption(parent: PersonId) -> Self {
        Self::with_link(
            RelationshipLink::SingleParent { parent },
            RelationshipType::Adoption,
        )
    }

    pub fn colored(mut self, color: impl Into<String>) -> Self {
        self.color = color.into();
        self
    }

    pub fn styled(mut self, line_style: LineStyle) -> Self {
        self.line_style = line_style;
        self
    }

    /// Whether children may attach to this relationship.
    pub fn accepts_children(&self) -> bool {
        match &self.link {
            RelationshipLink::Union { .. } => self.kind.is_parent_capable(),
            RelationshipLink::SingleParent { .. } => true,
            RelationshipLink::Child { .. } => false,
        }
    }

    pub fn validate(&self) -> Result<(), RelationshipValidationError> {
        if self.id.as_str().trim().is_empty() {
            return Err(RelationshipValidationError::EmptyId);
        }
        if let RelationshipType::Custom(tag) = &self.kind {
            if RelationshipType::parse(tag) != self.kind {
                return Err(RelationshipValidationError::InvalidCustomType(
                    self.id.clone(),
                ));
            }
        }
        match &self.link {
            RelationshipLink::Union { from, to } => {
                if from == to {
                    return Err(RelationshipValidationError::SelfUnion(from.clone()));
                }
                if self.kind == RelationshipType::Child {
                    return Err(RelationshipValidationError::ChildTypeMismatch(
                        self.id.clone(),
                    ));
                }
            }
            RelationshipLink::Child { .. } => {
                if self.kind != RelationshipType::Child {
                    return Err(RelationshipValidationError::ChildTypeMismatch(
                        self.id.clone(),
                    ));
                }
            }
            RelationshipLink::SingleParent { .. } => {
                if self.kind != RelationshipType::Adoption {
                    return Err(RelationshipValidationError::SingleParentNotAdoption(
                        self.id.clone(),
                    ));
                }
            }
        }
        Ok(())
    }
}

/// Partial update for relationship attributes.
///
/// Endpoints are not patchable; re-pointing goes through the merge service.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RelationshipPatch {
    pub kind: Option<RelationshipType>,
    pub color: Option<String>,
    pub line_style: Option<LineStyle>,
    pub start_date: Option<Option<String>>,
    pub end_date: Option<Option<String>>,
    pub is_active: Option<bool>,
    pub bubble_position: Option<f64>,
    pub notes: Option<String>,
}

impl RelationshipPatch {
    pub fn apply_to(self, relationship: &mut Relationship) {
        if let Some(value) = self.kind {
            relationship.kind = value;
        }
        if let Some(value) = self.color {
            relationship.color = value;
        }
        if let Some(value) = self.line_style {
            relationship.line_style = value;
        }
        if let Some(value) = self.start_date {
            relationship.start_date = value;
        }
        if let Some(value) = self.end_date {
            relationship.end_date = value;
        }
        if let Some(value) = self.is_active {
            relationship.is_active = value;
        }
        if let Some(value) = self.bubble_position {
            relationship.bubble_position = clamp_bubble_position(value);
        }
        if let Some(value) = self.notes {
            relationship.notes = value;
        }
    }
}
