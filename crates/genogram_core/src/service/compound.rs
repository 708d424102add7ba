//! Compound creation operations.
//!
//! # Responsibility
//! - Create several linked entities (people + relationships) as one unit.
//! - Place new people relative to their relatives using editor settings.
//!
//! # Invariants
//! - Every operation runs inside `GraphStore::atomically`: either all of its
//!   entities exist afterwards or none do.
//! - Child generation is always `max(parent generations) + 1`.
//!
//! # See also
//! - crate::service::editor records one history entry per operation.

use crate::model::geometry::Point;
use crate::model::ids::{PersonId, RelationshipId};
use crate::model::person::{Gender, Person, SpecialStatus};
use crate::model::relationship::{
    LineStyle, Relationship, RelationshipLink, RelationshipType, NEUTRAL_RELATIONSHIP_COLOR,
};
use crate::settings::EditorSettings;
use crate::store::{GraphStore, StoreError, StoreResult};
use log::info;

/// Round-robin colours for new marriages, keyed by relationship count.
pub const PALETTE: [&str; 8] = [
    "#e91e63", "#3f51b5", "#009688", "#ff9800", "#9c27b0", "#795548", "#607d8b", "#8bc34a",
];

/// Display name of placeholder co-parents.
pub const UNKNOWN_PARENT_NAME: &str = "Unknown";

/// Entities created by a compound operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FamilyCreated {
    /// New co-parent (spouse or placeholder), when one was created.
    pub partner: Option<PersonId>,
    /// Union (or single-parent anchor) the child hangs off.
    pub union: RelationshipId,
    pub child: PersonId,
    pub child_edge: RelationshipId,
}

/// How a new child should find its parent union.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PartnerResolution {
    /// No parent-capable union: offer unknown co-parent / new partner / adoption.
    None,
    Single(RelationshipId),
    /// Caller must pick one; listed in creation order.
    Ambiguous(Vec<RelationshipId>),
}

/// Resolves which union a new child of `person` should attach to.
pub fn resolve_partner_union(store: &GraphStore, person: &PersonId) -> PartnerResolution {
    let mut unions: Vec<RelationshipId> = store
        .partner_relationships(person)
        .into_iter()
        .map(|rel| rel.id.clone())
        .collect();
    match unions.len() {
        0 => PartnerResolution::None,
        1 => PartnerResolution::Single(unions.remove(0)),
        _ => PartnerResolution::Ambiguous(unions),
    }
}

/// Adds a placeholder co-parent, a dashed `partner` union and a child below
/// the pair.
pub fn create_child_with_unknown_parent(
    store: &mut GraphStore,
    settings: &EditorSettings,
    person: &PersonId,
) -> StoreResult<FamilyCreated> {
    let created = store.atomically(|store| {
        let anchor = existing(store, person)?.clone();
        let unknown = Person::new(UNKNOWN_PARENT_NAME)
            .with_gender(Gender::Unknown)
            .at(anchor.x + settings.partner_spacing, anchor.y)
            .in_generation(anchor.generation);
        let unknown_position = unknown.position();
        let partner = store.add_person(unknown)?;

        let union = store.add_relationship(
            Relationship::union(RelationshipType::Partner, anchor.id.clone(), partner.clone())
                .colored(NEUTRAL_RELATIONSHIP_COLOR)
                .styled(LineStyle::Dashed),
        )?;
        let below = anchor.position().midpoint(unknown_position);
        let (child, child_edge) = add_child_at(
            store,
            &union,
            Person::new("Child"),
            Point::new(below.x, below.y + settings.generation_gap),
            anchor.generation + 1,
        )?;
        Ok(FamilyCreated {
            partner: Some(partner),
            union,
            child,
            child_edge,
        })
    })?;
    info!("event=compound_unknown_parent module=service status=ok");
    Ok(created)
}

/// Adds a single-parent adoption anchor and an adopted child below `person`.
pub fn create_single_parent_adoption(
    store: &mut GraphStore,
    settings: &EditorSettings,
    person: &PersonId,
) -> StoreResult<FamilyCreated> {
    let created = store.atomically(|store| {
        let parent = existing(store, person)?.clone();
        let union = store.add_relationship(Relationship::single_parent_adoption(parent.id.clone()))?;
        let mut adopted = Person::new("Adopted child");
        adopted.special_status = SpecialStatus::Adopted;
        let (child, child_edge) = add_child_at(
            store,
            &union,
            adopted,
            Point::new(parent.x, parent.y + settings.generation_gap),
            parent.generation + 1,
        )?;
        Ok(FamilyCreated {
            partner: None,
            union,
            child,
            child_edge,
        })
    })?;
    info!("event=compound_adoption module=service status=ok");
    Ok(created)
}

/// Adds a spouse, a `marriage` union and a child centred below the pair.
pub fn create_spouse_and_child(
    store: &mut GraphStore,
    settings: &EditorSettings,
    person: &PersonId,
) -> StoreResult<FamilyCreated> {
    let created = store.atomically(|store| {
        let anchor = existing(store, person)?.clone();
        let color = PALETTE[store.relationships().len() % PALETTE.len()];
        let spouse = Person::new("Spouse")
            .with_gender(anchor.gender.opposite())
            .at(anchor.x + settings.partner_spacing, anchor.y)
            .in_generation(anchor.generation);
        let spouse_position = spouse.position();
        let spouse_generation = spouse.generation;
        let partner = store.add_person(spouse)?;

        let union = store.add_relationship(
            Relationship::union(RelationshipType::Marriage, anchor.id.clone(), partner.clone())
                .colored(color),
        )?;
        let below = anchor.position().midpoint(spouse_position);
        let (child, child_edge) = add_child_at(
            store,
            &union,
            Person::new("Child"),
            Point::new(below.x, below.y + settings.generation_gap),
            anchor.generation.max(spouse_generation) + 1,
        )?;
        Ok(FamilyCreated {
            partner: Some(partner),
            union,
            child,
            child_edge,
        })
    })?;
    info!("event=compound_spouse_child module=service status=ok");
    Ok(created)
}

/// Adds a new child to an existing parent-capable union.
///
/// The child lands one `sibling_spacing` right of the right-most existing
/// child, or under the union midpoint for a first child.
pub fn add_child_to_relationship(
    store: &mut GraphStore,
    settings: &EditorSettings,
    union: &RelationshipId,
) -> StoreResult<FamilyCreated> {
    let created = store.atomically(|store| {
        let rel = store
            .relationship(union)
            .ok_or_else(|| StoreError::RelationshipNotFound(union.clone()))?;
        if !rel.accepts_children() {
            return Err(StoreError::InvalidLink {
                relationship: union.clone(),
                reason: "children attach only to parent-capable unions",
            });
        }
        let parents: Vec<Person> = rel
            .link
            .parents()
            .into_iter()
            .filter_map(|id| store.person(id).cloned())
            .collect();
        let (Some(first), Some(lowest)) = (
            parents.first(),
            parents.iter().max_by(|a, b| a.y.total_cmp(&b.y)),
        ) else {
            return Err(StoreError::DanglingReference {
                relationship: union.clone(),
                missing: "parent".to_string(),
            });
        };

        let x = match store
            .children_of_union(union)
            .iter()
            .map(|child| child.x)
            .max_by(f64::total_cmp)
        {
            Some(right_most) => right_most + settings.sibling_spacing,
            None => match &rel.link {
                RelationshipLink::Union { .. } => parents
                    .iter()
                    .map(|parent| parent.x)
                    .sum::<f64>()
                    / parents.len() as f64,
                _ => first.x,
            },
        };
        let generation = parents.iter().map(|parent| parent.generation).max().unwrap_or(0) + 1;
        let y = lowest.y + settings.generation_gap;

        let (child, child_edge) =
            add_child_at(store, union, Person::new("Child"), Point::new(x, y), generation)?;
        Ok(FamilyCreated {
            partner: None,
            union: union.clone(),
            child,
            child_edge,
        })
    })?;
    info!("event=compound_add_child module=service status=ok");
    Ok(created)
}

fn existing<'a>(store: &'a GraphStore, id: &PersonId) -> StoreResult<&'a Person> {
    store
        .person(id)
        .ok_or_else(|| StoreError::PersonNotFound(id.clone()))
}

fn add_child_at(
    store: &mut GraphStore,
    union: &RelationshipId,
    child: Person,
    position: Point,
    generation: i32,
) -> StoreResult<(PersonId, RelationshipId)> {
    let child = child.at(position.x, position.y).in_generation(generation);
    let child_id = store.add_person(child)?;
    let edge = store.add_relationship(Relationship::child(union.clone(), child_id.clone()))?;
    Ok((child_id, edge))
}
