//! Graph store: canonical collections and referential invariants.
//!
//! # Responsibility
//! - Own people, relationships, households and text boxes for one session.
//! - Refuse every mutation that would leave a dangling or malformed edge.
//! - Cascade deletes in the same call that removes the primary entity.
//!
//! # Invariants
//! - Child edges resolve to an existing union that accepts children.
//! - Union and single-parent edges resolve to existing people.
//! - A person is the child of at most one union.
//! - Every mutation marks the store dirty; nothing else has side effects.
//!
//! # See also
//! - crate::history for snapshot-based undo/redo.

mod snapshot;

pub use snapshot::{repair, GraphSnapshot};

use crate::model::annotation::{TextBox, TextBoxPatch};
use crate::model::geometry::Point;
use crate::model::household::{Household, HouseholdPatch, MIN_HOUSEHOLD_POINTS};
use crate::model::ids::{HouseholdId, PersonId, RelationshipId, TextBoxId};
use crate::model::person::{Person, PersonPatch, PersonValidationError};
use crate::model::relationship::{
    clamp_bubble_position, Relationship, RelationshipLink, RelationshipPatch,
    RelationshipValidationError,
};
use log::{debug, info, warn};
use std::collections::{HashSet, VecDeque};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

pub type StoreResult<T> = Result<T, StoreError>;

/// Errors from graph store mutations.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreError {
    InvalidPerson(PersonValidationError),
    InvalidRelationship(RelationshipValidationError),
    PersonNotFound(PersonId),
    RelationshipNotFound(RelationshipId),
    HouseholdNotFound(HouseholdId),
    TextBoxNotFound(TextBoxId),
    /// Id already used by another entity of the same collection.
    DuplicateId(String),
    /// Edge endpoint does not resolve to an existing entity.
    DanglingReference {
        relationship: RelationshipId,
        missing: String,
    },
    /// Edge shape is valid on its own but not against the current graph.
    InvalidLink {
        relationship: RelationshipId,
        reason: &'static str,
    },
    /// The child already hangs off another union.
    ChildAlreadyAttached(PersonId),
    VertexOutOfRange {
        household: HouseholdId,
        index: usize,
    },
    /// Removing a vertex would leave fewer than three points.
    HouseholdTooSmall(HouseholdId),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidPerson(err) => write!(f, "{err}"),
            Self::InvalidRelationship(err) => write!(f, "{err}"),
            Self::PersonNotFound(id) => write!(f, "person not found: {id}"),
            Self::RelationshipNotFound(id) => write!(f, "relationship not found: {id}"),
            Self::HouseholdNotFound(id) => write!(f, "household not found: {id}"),
            Self::TextBoxNotFound(id) => write!(f, "text box not found: {id}"),
            Self::DuplicateId(id) => write!(f, "id already in use: {id}"),
            Self::DanglingReference {
                relationship,
                missing,
            } => write!(f, "relationship {relationship} references missing {missing}"),
            Self::InvalidLink {
                relationship,
                reason,
            } => write!(f, "relationship {relationship} rejected: {reason}"),
            Self::ChildAlreadyAttached(id) => {
                write!(f, "person {id} already belongs to a parent union")
            }
            Self::VertexOutOfRange { household, index } => {
                write!(f, "household {household} has no vertex {index}")
            }
            Self::HouseholdTooSmall(id) => {
                write!(f, "household {id} must keep at least {MIN_HOUSEHOLD_POINTS} points")
            }
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidPerson(err) => Some(err),
            Self::InvalidRelationship(err) => Some(err),
            _ => None,
        }
    }
}

impl From<PersonValidationError> for StoreError {
    fn from(value: PersonValidationError) -> Self {
        Self::InvalidPerson(value)
    }
}

impl From<RelationshipValidationError> for StoreError {
    fn from(value: RelationshipValidationError) -> Self {
        Self::InvalidRelationship(value)
    }
}

/// Relationships removed together with a primary entity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeleteReport {
    pub removed_relationships: Vec<RelationshipId>,
}

/// Outcome of folding one person's edges into another.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepointReport {
    pub repointed: Vec<RelationshipId>,
    /// Edges deleted because re-pointing would break an invariant.
    pub dropped: Vec<RelationshipId>,
}

/// Single-session, in-memory graph store.
#[derive(Debug, Clone, Default)]
pub struct GraphStore {
    data: GraphSnapshot,
    dirty: bool,
}

impl GraphStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a store from externally supplied collections, repairing them.
    pub fn from_snapshot(snapshot: GraphSnapshot) -> (Self, Vec<String>) {
        let mut store = Self::new();
        let notes = store.load_data(snapshot);
        store.dirty = false;
        (store, notes)
    }

    // ----- snapshots -------------------------------------------------------

    /// Cheap immutable copy of the current state.
    pub fn snapshot(&self) -> GraphSnapshot {
        self.data.clone()
    }

    /// Replaces live collections wholesale (undo/redo path).
    pub fn restore(&mut self, snapshot: GraphSnapshot) {
        self.data = snapshot;
        self.dirty = true;
    }

    /// Replaces live collections with repaired external data.
    ///
    /// Returns one note per record that had to be dropped or fixed.
    pub fn load_data(&mut self, snapshot: GraphSnapshot) -> Vec<String> {
        let (repaired, notes) = repair(snapshot);
        if !notes.is_empty() {
            warn!(
                "event=store_load module=store status=repaired repairs={}",
                notes.len()
            );
        }
        info!(
            "event=store_load module=store status=ok people={} relationships={} households={} text_boxes={}",
            repaired.people.len(),
            repaired.relationships.len(),
            repaired.households.len(),
            repaired.text_boxes.len()
        );
        self.data = repaired;
        self.dirty = true;
        notes
    }

    /// Resets to an empty genogram.
    pub fn new_genogram(&mut self) {
        self.data = GraphSnapshot::default();
        self.dirty = false;
        info!("event=store_reset module=store status=ok");
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_clean(&mut self) {
        self.dirty = false;
    }

    /// Runs `op` as one transaction: on error the store is rolled back.
    pub fn atomically<T>(
        &mut self,
        op: impl FnOnce(&mut GraphStore) -> StoreResult<T>,
    ) -> StoreResult<T> {
        let before = self.data.clone();
        let dirty_before = self.dirty;
        match op(self) {
            Ok(value) => Ok(value),
            Err(err) => {
                self.data = before;
                self.dirty = dirty_before;
                debug!("event=store_rollback module=store status=ok error={err}");
                Err(err)
            }
        }
    }

    // ----- queries ---------------------------------------------------------

    pub fn people(&self) -> &[Person] {
        &self.data.people
    }

    pub fn relationships(&self) -> &[Relationship] {
        &self.data.relationships
    }

    pub fn households(&self) -> &[Household] {
        &self.data.households
    }

    pub fn text_boxes(&self) -> &[TextBox] {
        &self.data.text_boxes
    }

    pub fn person(&self, id: &PersonId) -> Option<&Person> {
        self.data.person(id)
    }

    pub fn relationship(&self, id: &RelationshipId) -> Option<&Relationship> {
        self.data.relationship(id)
    }

    pub fn household(&self, id: &HouseholdId) -> Option<&Household> {
        self.data.households.iter().find(|household| &household.id == id)
    }

    pub fn text_box(&self, id: &TextBoxId) -> Option<&TextBox> {
        self.data.text_boxes.iter().find(|text_box| &text_box.id == id)
    }

    /// Child edges hanging off `union`, in creation order.
    pub fn child_edges_of(&self, union: &RelationshipId) -> Vec<&Relationship> {
        self.relationships()
            .iter()
            .filter(|rel| matches!(&rel.link, RelationshipLink::Child { union: u, .. } if u == union))
            .collect()
    }

    /// Children of `union`, in creation order.
    pub fn children_of_union(&self, union: &RelationshipId) -> Vec<&Person> {
        self.child_edges_of(union)
            .into_iter()
            .filter_map(|rel| match &rel.link {
                RelationshipLink::Child { child, .. } => self.person(child),
                _ => None,
            })
            .collect()
    }

    /// The union whose child edge leads to `child`, if any.
    pub fn parent_union_of(&self, child: &PersonId) -> Option<&Relationship> {
        self.relationships().iter().find_map(|rel| match &rel.link {
            RelationshipLink::Child { union, child: c } if c == child => self.relationship(union),
            _ => None,
        })
    }

    /// Union and single-parent edges naming `person`, in creation order.
    pub fn unions_of_person(&self, person: &PersonId) -> Vec<&Relationship> {
        self.relationships()
            .iter()
            .filter(|rel| !rel.link.is_child() && rel.link.involves(person))
            .collect()
    }

    /// Parent-capable unions of `person`, in creation order.
    pub fn partner_relationships(&self, person: &PersonId) -> Vec<&Relationship> {
        self.unions_of_person(person)
            .into_iter()
            .filter(|rel| rel.accepts_children())
            .collect()
    }

    /// Endpoint centres of a union line; single-parent links repeat the parent.
    pub fn union_endpoints(&self, union: &RelationshipId) -> Option<(Point, Point)> {
        let rel = self.relationship(union)?;
        match &rel.link {
            RelationshipLink::Union { from, to } => {
                Some((self.person(from)?.position(), self.person(to)?.position()))
            }
            RelationshipLink::SingleParent { parent } => {
                let point = self.person(parent)?.position();
                Some((point, point))
            }
            RelationshipLink::Child { .. } => None,
        }
    }

    // ----- people ----------------------------------------------------------

    pub fn add_person(&mut self, person: Person) -> StoreResult<PersonId> {
        person.validate()?;
        if self.person(&person.id).is_some() {
            return Err(StoreError::DuplicateId(person.id.to_string()));
        }
        let id = person.id.clone();
        Arc::make_mut(&mut self.data.people).push(person);
        self.dirty = true;
        debug!("event=person_add module=store status=ok");
        Ok(id)
    }

    pub fn update_person(&mut self, id: &PersonId, patch: PersonPatch) -> StoreResult<()> {
        let person = self.person_mut(id)?;
        patch.apply_to(person);
        self.dirty = true;
        Ok(())
    }

    /// Moves a person; positions must be finite.
    pub fn set_person_position(&mut self, id: &PersonId, point: Point) -> StoreResult<()> {
        if !(point.x.is_finite() && point.y.is_finite()) {
            return Err(PersonValidationError::NonFinitePosition {
                x: point.x,
                y: point.y,
            }
            .into());
        }
        let person = self.person_mut(id)?;
        person.set_position(point);
        self.dirty = true;
        Ok(())
    }

    /// Removes a person and every relationship that names it.
    ///
    /// Child edges hanging off removed unions are removed in the same call.
    pub fn delete_person(&mut self, id: &PersonId) -> StoreResult<DeleteReport> {
        if self.person(id).is_none() {
            return Err(StoreError::PersonNotFound(id.clone()));
        }
        let direct: HashSet<RelationshipId> = self
            .relationships()
            .iter()
            .filter(|rel| rel.link.involves(id))
            .map(|rel| rel.id.clone())
            .collect();
        let removed = self.remove_relationships_cascading(direct);
        Arc::make_mut(&mut self.data.people).retain(|person| &person.id != id);
        self.dirty = true;
        info!(
            "event=person_delete module=store status=ok cascaded={}",
            removed.len()
        );
        Ok(DeleteReport {
            removed_relationships: removed,
        })
    }

    // ----- relationships ---------------------------------------------------

    pub fn add_relationship(&mut self, relationship: Relationship) -> StoreResult<RelationshipId> {
        relationship.validate()?;
        if self.relationship(&relationship.id).is_some() {
            return Err(StoreError::DuplicateId(relationship.id.to_string()));
        }
        self.check_link(&relationship)?;
        let mut relationship = relationship;
        relationship.bubble_position = clamp_bubble_position(relationship.bubble_position);
        let id = relationship.id.clone();
        Arc::make_mut(&mut self.data.relationships).push(relationship);
        self.dirty = true;
        debug!("event=relationship_add module=store status=ok");
        Ok(id)
    }

    pub fn update_relationship(
        &mut self,
        id: &RelationshipId,
        patch: RelationshipPatch,
    ) -> StoreResult<()> {
        let current = self
            .relationship(id)
            .ok_or_else(|| StoreError::RelationshipNotFound(id.clone()))?;
        let mut updated = current.clone();
        patch.apply_to(&mut updated);
        updated.validate()?;
        if !updated.accepts_children() && !self.child_edges_of(id).is_empty() {
            return Err(StoreError::InvalidLink {
                relationship: id.clone(),
                reason: "relationship has children and must stay parent-capable",
            });
        }
        *self.relationship_mut(id)? = updated;
        self.dirty = true;
        Ok(())
    }

    pub fn set_bubble_position(&mut self, id: &RelationshipId, t: f64) -> StoreResult<()> {
        let rel = self.relationship_mut(id)?;
        rel.bubble_position = clamp_bubble_position(t);
        self.dirty = true;
        Ok(())
    }

    /// Removes a relationship and every child edge hanging off it.
    pub fn delete_relationship(&mut self, id: &RelationshipId) -> StoreResult<DeleteReport> {
        if self.relationship(id).is_none() {
            return Err(StoreError::RelationshipNotFound(id.clone()));
        }
        let removed = self.remove_relationships_cascading(HashSet::from([id.clone()]));
        self.dirty = true;
        info!(
            "event=relationship_delete module=store status=ok cascaded={}",
            removed.len().saturating_sub(1)
        );
        Ok(DeleteReport {
            removed_relationships: removed,
        })
    }

    /// Re-points every edge naming `source` to `target`.
    ///
    /// Unions that would collapse into a self-loop, and child edges that would
    /// give `target` a second parent union, are deleted (with cascade) instead.
    pub(crate) fn repoint_person(
        &mut self,
        source: &PersonId,
        target: &PersonId,
    ) -> StoreResult<RepointReport> {
        if self.person(source).is_none() {
            return Err(StoreError::PersonNotFound(source.clone()));
        }
        if self.person(target).is_none() {
            return Err(StoreError::PersonNotFound(target.clone()));
        }

        let mut report = RepointReport::default();
        let mut doomed: HashSet<RelationshipId> = HashSet::new();
        let target_has_parents = self.parent_union_of(target).is_some();

        for rel in Arc::make_mut(&mut self.data.relationships).iter_mut() {
            if !rel.link.involves(source) {
                continue;
            }
            match &mut rel.link {
                RelationshipLink::Union { from, to } => {
                    let other = if from == source { to.clone() } else { from.clone() };
                    if &other == target {
                        doomed.insert(rel.id.clone());
                        continue;
                    }
                    if from == source {
                        *from = target.clone();
                    }
                    if to == source {
                        *to = target.clone();
                    }
                }
                RelationshipLink::Child { child, .. } => {
                    if target_has_parents {
                        doomed.insert(rel.id.clone());
                        continue;
                    }
                    *child = target.clone();
                }
                RelationshipLink::SingleParent { parent } => {
                    *parent = target.clone();
                }
            }
            report.repointed.push(rel.id.clone());
        }

        // A re-pointed child edge may now hang off a union that includes the
        // target as a parent.
        for rel in self.relationships() {
            if let RelationshipLink::Child { union, child } = &rel.link {
                if child == target
                    && self
                        .relationship(union)
                        .is_some_and(|parent| parent.link.involves(target))
                {
                    doomed.insert(rel.id.clone());
                }
            }
        }

        if !doomed.is_empty() {
            let dropped = self.remove_relationships_cascading(doomed);
            report.repointed.retain(|id| !dropped.contains(id));
            report.dropped = dropped;
        }
        self.dirty = true;
        Ok(report)
    }

    /// Whether `ancestor` is reachable from `person` by walking up parent
    /// unions (any depth, `person` itself excluded).
    pub fn is_ancestor_of(&self, ancestor: &PersonId, person: &PersonId) -> bool {
        let mut seen: HashSet<&PersonId> = HashSet::new();
        let mut queue: VecDeque<&PersonId> = VecDeque::from([person]);
        while let Some(current) = queue.pop_front() {
            let Some(union) = self.parent_union_of(current) else {
                continue;
            };
            for parent in union.link.parents() {
                if parent == ancestor {
                    return true;
                }
                if seen.insert(parent) {
                    queue.push_back(parent);
                }
            }
        }
        false
    }

    /// Raises `child` to one below its deepest parent, then pushes the change
    /// down to its descendants. Returns how many people changed generation.
    pub(crate) fn lift_generations(&mut self, child: &PersonId) -> StoreResult<usize> {
        let mut lifted = 0;
        let mut seen: HashSet<PersonId> = HashSet::new();
        let mut queue: VecDeque<PersonId> = VecDeque::from([child.clone()]);
        while let Some(current) = queue.pop_front() {
            if !seen.insert(current.clone()) {
                continue;
            }
            let Some(floor) = self.parent_union_of(&current).and_then(|union| {
                union
                    .link
                    .parents()
                    .into_iter()
                    .filter_map(|parent| self.person(parent).map(|person| person.generation))
                    .max()
                    .map(|deepest| deepest + 1)
            }) else {
                continue;
            };
            let generation = self
                .person(&current)
                .ok_or_else(|| StoreError::PersonNotFound(current.clone()))?
                .generation;
            if generation >= floor {
                continue;
            }
            self.edit_person(&current, |person| person.generation = floor)?;
            lifted += 1;
            let children: Vec<PersonId> = self
                .unions_of_person(&current)
                .into_iter()
                .flat_map(|union| self.children_of_union(&union.id))
                .map(|person| person.id.clone())
                .collect();
            queue.extend(children);
        }
        Ok(lifted)
    }

    // ----- households ------------------------------------------------------

    pub fn add_household(&mut self, household: Household) -> StoreResult<HouseholdId> {
        if self.household(&household.id).is_some() {
            return Err(StoreError::DuplicateId(household.id.to_string()));
        }
        let id = household.id.clone();
        Arc::make_mut(&mut self.data.households).push(household);
        self.dirty = true;
        Ok(id)
    }

    pub fn update_household(&mut self, id: &HouseholdId, patch: HouseholdPatch) -> StoreResult<()> {
        patch.apply_to(self.household_mut(id)?);
        self.dirty = true;
        Ok(())
    }

    pub fn delete_household(&mut self, id: &HouseholdId) -> StoreResult<()> {
        if self.household(id).is_none() {
            return Err(StoreError::HouseholdNotFound(id.clone()));
        }
        Arc::make_mut(&mut self.data.households).retain(|household| &household.id != id);
        self.dirty = true;
        Ok(())
    }

    pub fn set_household_point(
        &mut self,
        id: &HouseholdId,
        index: usize,
        point: Point,
    ) -> StoreResult<()> {
        let household = self.household_mut(id)?;
        let Some(vertex) = household.points.get_mut(index) else {
            return Err(StoreError::VertexOutOfRange {
                household: id.clone(),
                index,
            });
        };
        *vertex = point;
        self.dirty = true;
        Ok(())
    }

    /// Inserts a vertex on the nearest polygon edge; returns its index.
    pub fn insert_household_point(&mut self, id: &HouseholdId, point: Point) -> StoreResult<usize> {
        let index = self.household_mut(id)?.insert_point(point);
        self.dirty = true;
        Ok(index)
    }

    pub fn remove_household_point(&mut self, id: &HouseholdId, index: usize) -> StoreResult<()> {
        let household = self.household_mut(id)?;
        if index >= household.points.len() {
            return Err(StoreError::VertexOutOfRange {
                household: id.clone(),
                index,
            });
        }
        if household.points.len() <= MIN_HOUSEHOLD_POINTS {
            return Err(StoreError::HouseholdTooSmall(id.clone()));
        }
        household.points.remove(index);
        self.dirty = true;
        Ok(())
    }

    /// Active people whose centre lies inside the household polygon.
    pub fn household_members(&self, id: &HouseholdId) -> StoreResult<Vec<&Person>> {
        let household = self
            .household(id)
            .ok_or_else(|| StoreError::HouseholdNotFound(id.clone()))?;
        Ok(self
            .people()
            .iter()
            .filter(|person| person.is_active() && household.contains(person.position()))
            .collect())
    }

    // ----- text boxes ------------------------------------------------------

    pub fn add_text_box(&mut self, text_box: TextBox) -> StoreResult<TextBoxId> {
        if self.text_box(&text_box.id).is_some() {
            return Err(StoreError::DuplicateId(text_box.id.to_string()));
        }
        let id = text_box.id.clone();
        Arc::make_mut(&mut self.data.text_boxes).push(text_box);
        self.dirty = true;
        Ok(id)
    }

    pub fn update_text_box(&mut self, id: &TextBoxId, patch: TextBoxPatch) -> StoreResult<()> {
        patch.apply_to(self.text_box_mut(id)?);
        self.dirty = true;
        Ok(())
    }

    pub fn set_text_box_position(&mut self, id: &TextBoxId, point: Point) -> StoreResult<()> {
        self.text_box_mut(id)?.set_position(point);
        self.dirty = true;
        Ok(())
    }

    pub fn delete_text_box(&mut self, id: &TextBoxId) -> StoreResult<()> {
        if self.text_box(id).is_none() {
            return Err(StoreError::TextBoxNotFound(id.clone()));
        }
        Arc::make_mut(&mut self.data.text_boxes).retain(|text_box| &text_box.id != id);
        self.dirty = true;
        Ok(())
    }

    // ----- internals -------------------------------------------------------

    fn person_mut(&mut self, id: &PersonId) -> StoreResult<&mut Person> {
        Arc::make_mut(&mut self.data.people)
            .iter_mut()
            .find(|person| &person.id == id)
            .ok_or_else(|| StoreError::PersonNotFound(id.clone()))
    }

    /// Applies a multi-field edit that `PersonPatch` cannot express
    /// (contact-list unions, archiving).
    pub(crate) fn edit_person(
        &mut self,
        id: &PersonId,
        edit: impl FnOnce(&mut Person),
    ) -> StoreResult<()> {
        edit(self.person_mut(id)?);
        self.dirty = true;
        Ok(())
    }

    fn relationship_mut(&mut self, id: &RelationshipId) -> StoreResult<&mut Relationship> {
        Arc::make_mut(&mut self.data.relationships)
            .iter_mut()
            .find(|rel| &rel.id == id)
            .ok_or_else(|| StoreError::RelationshipNotFound(id.clone()))
    }

    fn household_mut(&mut self, id: &HouseholdId) -> StoreResult<&mut Household> {
        Arc::make_mut(&mut self.data.households)
            .iter_mut()
            .find(|household| &household.id == id)
            .ok_or_else(|| StoreError::HouseholdNotFound(id.clone()))
    }

    fn text_box_mut(&mut self, id: &TextBoxId) -> StoreResult<&mut TextBox> {
        Arc::make_mut(&mut self.data.text_boxes)
            .iter_mut()
            .find(|text_box| &text_box.id == id)
            .ok_or_else(|| StoreError::TextBoxNotFound(id.clone()))
    }

    /// Validates edge endpoints against current collections.
    fn check_link(&self, relationship: &Relationship) -> StoreResult<()> {
        let dangling = |missing: String| StoreError::DanglingReference {
            relationship: relationship.id.clone(),
            missing,
        };
        match &relationship.link {
            RelationshipLink::Union { from, to } => {
                for endpoint in [from, to] {
                    if self.person(endpoint).is_none() {
                        return Err(dangling(format!("person {endpoint}")));
                    }
                }
            }
            RelationshipLink::SingleParent { parent } => {
                if self.person(parent).is_none() {
                    return Err(dangling(format!("person {parent}")));
                }
            }
            RelationshipLink::Child { union, child } => {
                let parent_rel = self
                    .relationship(union)
                    .ok_or_else(|| dangling(format!("relationship {union}")))?;
                if self.person(child).is_none() {
                    return Err(dangling(format!("person {child}")));
                }
                if !parent_rel.accepts_children() {
                    return Err(StoreError::InvalidLink {
                        relationship: relationship.id.clone(),
                        reason: "children attach only to parent-capable unions",
                    });
                }
                if parent_rel.link.involves(child) {
                    return Err(StoreError::InvalidLink {
                        relationship: relationship.id.clone(),
                        reason: "a parent cannot be a child of its own union",
                    });
                }
                if self.parent_union_of(child).is_some() {
                    return Err(StoreError::ChildAlreadyAttached(child.clone()));
                }
            }
        }
        Ok(())
    }

    /// Removes `seed` plus every child edge hanging off a removed union.
    ///
    /// Returns removed ids in collection order.
    fn remove_relationships_cascading(
        &mut self,
        seed: HashSet<RelationshipId>,
    ) -> Vec<RelationshipId> {
        let mut doomed = seed;
        for rel in self.relationships() {
            if let RelationshipLink::Child { union, .. } = &rel.link {
                if doomed.contains(union) {
                    doomed.insert(rel.id.clone());
                }
            }
        }
        let mut removed = Vec::new();
        Arc::make_mut(&mut self.data.relationships).retain(|rel| {
            if doomed.contains(&rel.id) {
                removed.push(rel.id.clone());
                false
            } else {
                true
            }
        });
        removed
    }
}
