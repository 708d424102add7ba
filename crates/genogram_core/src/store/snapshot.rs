//! Immutable, structurally shared view of the graph collections.
//!
//! # Responsibility
//! - Provide the value stored by history entries and handed to exporters.
//! - Repair externally supplied collections before they become live state.
//!
//! # Invariants
//! - Cloning a snapshot never deep-copies entities; collections are shared
//!   through `Arc` and copied only when a store mutates them.
//! - `repair` output satisfies every store invariant.

use crate::model::annotation::TextBox;
use crate::model::household::Household;
use crate::model::ids::{PersonId, RelationshipId};
use crate::model::person::Person;
use crate::model::relationship::{clamp_bubble_position, Relationship, RelationshipLink};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Full-state value of the four canonical collections.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GraphSnapshot {
    pub people: Arc<Vec<Person>>,
    pub relationships: Arc<Vec<Relationship>>,
    pub households: Arc<Vec<Household>>,
    pub text_boxes: Arc<Vec<TextBox>>,
}

impl GraphSnapshot {
    pub fn new(
        people: Vec<Person>,
        relationships: Vec<Relationship>,
        households: Vec<Household>,
        text_boxes: Vec<TextBox>,
    ) -> Self {
        Self {
            people: Arc::new(people),
            relationships: Arc::new(relationships),
            households: Arc::new(households),
            text_boxes: Arc::new(text_boxes),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.people.is_empty()
            && self.relationships.is_empty()
            && self.households.is_empty()
            && self.text_boxes.is_empty()
    }

    pub fn person(&self, id: &PersonId) -> Option<&Person> {
        self.people.iter().find(|person| &person.id == id)
    }

    pub fn relationship(&self, id: &RelationshipId) -> Option<&Relationship> {
        self.relationships.iter().find(|rel| &rel.id == id)
    }

    /// Whether two snapshots share every collection allocation.
    pub fn shares_storage_with(&self, other: &GraphSnapshot) -> bool {
        Arc::ptr_eq(&self.people, &other.people)
            && Arc::ptr_eq(&self.relationships, &other.relationships)
            && Arc::ptr_eq(&self.households, &other.households)
            && Arc::ptr_eq(&self.text_boxes, &other.text_boxes)
    }
}

/// Drops or fixes every record that would break a store invariant.
///
/// Returns the repaired snapshot plus one human-readable note per repair.
pub fn repair(snapshot: GraphSnapshot) -> (GraphSnapshot, Vec<String>) {
    let mut notes = Vec::new();

    let mut people: Vec<Person> = Vec::with_capacity(snapshot.people.len());
    let mut person_ids: HashSet<PersonId> = HashSet::new();
    for person in snapshot.people.iter() {
        if person.id.as_str().trim().is_empty() {
            notes.push("dropped person with empty id".to_string());
            continue;
        }
        if !person_ids.insert(person.id.clone()) {
            notes.push(format!("dropped duplicate person {}", person.id));
            continue;
        }
        let mut person = person.clone();
        if !(person.x.is_finite() && person.y.is_finite()) {
            notes.push(format!("reset non-finite position of person {}", person.id));
            person.x = 0.0;
            person.y = 0.0;
        }
        people.push(person);
    }

    let mut seen_rel_ids: HashSet<RelationshipId> = HashSet::new();
    let mut parent_links: HashMap<RelationshipId, Relationship> = HashMap::new();
    let mut ordered: Vec<(usize, Relationship)> = Vec::new();
    let mut pending_children: Vec<(usize, Relationship)> = Vec::new();

    for (index, rel) in snapshot.relationships.iter().enumerate() {
        if !seen_rel_ids.insert(rel.id.clone()) {
            notes.push(format!("dropped duplicate relationship {}", rel.id));
            continue;
        }
        if let Err(err) = rel.validate() {
            notes.push(format!("dropped relationship {}: {err}", rel.id));
            continue;
        }
        let mut rel = rel.clone();
        rel.bubble_position = clamp_bubble_position(rel.bubble_position);
        match &rel.link {
            RelationshipLink::Union { from, to } => {
                if !person_ids.contains(from) || !person_ids.contains(to) {
                    notes.push(format!("dropped dangling relationship {}", rel.id));
                    continue;
                }
            }
            RelationshipLink::SingleParent { parent } => {
                if !person_ids.contains(parent) {
                    notes.push(format!("dropped dangling relationship {}", rel.id));
                    continue;
                }
            }
            RelationshipLink::Child { .. } => {
                pending_children.push((index, rel));
                continue;
            }
        }
        parent_links.insert(rel.id.clone(), rel.clone());
        ordered.push((index, rel));
    }

    let mut attached_children: HashSet<PersonId> = HashSet::new();
    for (index, rel) in pending_children {
        let RelationshipLink::Child { union, child } = &rel.link else {
            continue;
        };
        let Some(parent_rel) = parent_links.get(union) else {
            notes.push(format!("dropped child edge {} with missing union", rel.id));
            continue;
        };
        if !parent_rel.accepts_children() {
            notes.push(format!(
                "dropped child edge {} on non parent-capable union",
                rel.id
            ));
            continue;
        }
        if !person_ids.contains(child) {
            notes.push(format!("dropped child edge {} with missing child", rel.id));
            continue;
        }
        if parent_rel.link.involves(child) {
            notes.push(format!("dropped child edge {} naming a parent as child", rel.id));
            continue;
        }
        if !attached_children.insert(child.clone()) {
            notes.push(format!(
                "dropped child edge {}: {child} already has a parent union",
                rel.id
            ));
            continue;
        }
        ordered.push((index, rel));
    }
    ordered.sort_by_key(|(index, _)| *index);
    let relationships = ordered.into_iter().map(|(_, rel)| rel).collect::<Vec<_>>();

    let mut household_ids = HashSet::new();
    let households = snapshot
        .households
        .iter()
        .filter(|household| {
            let fresh = household_ids.insert(household.id.clone());
            if !fresh {
                notes.push(format!("dropped duplicate household {}", household.id));
            }
            fresh
        })
        .cloned()
        .collect::<Vec<_>>();

    let mut text_box_ids = HashSet::new();
    let text_boxes = snapshot
        .text_boxes
        .iter()
        .filter(|text_box| {
            let fresh = text_box_ids.insert(text_box.id.clone());
            if !fresh {
                notes.push(format!("dropped duplicate text box {}", text_box.id));
            }
            fresh
        })
        .cloned()
        .collect::<Vec<_>>();

    (
        GraphSnapshot::new(people, relationships, households, text_boxes),
        notes,
    )
}

#[cfg(test)]
mod tests {
    use super::{repair, GraphSnapshot};
    use crate::model::ids::{PersonId, RelationshipId};
    use crate::model::person::Person;
    use crate::model::relationship::{Relationship, RelationshipType};

    #[test]
    fn clone_shares_collections() {
        let snapshot = GraphSnapshot::new(vec![Person::new("A")], vec![], vec![], vec![]);
        let copy = snapshot.clone();
        assert!(copy.shares_storage_with(&snapshot));
        assert_eq!(copy, snapshot);
    }

    #[test]
    fn repair_drops_dangling_edges_and_orphaned_children() {
        let a = Person::new("A");
        let c = Person::new("C");
        let union = Relationship::union(
            RelationshipType::Marriage,
            a.id.clone(),
            PersonId::new("missing"),
        );
        let child = Relationship::child(union.id.clone(), c.id.clone());
        let stray = Relationship::child(RelationshipId::new("nowhere"), c.id.clone());
        let snapshot = GraphSnapshot::new(vec![a, c], vec![union, child, stray], vec![], vec![]);

        let (repaired, notes) = repair(snapshot);
        assert!(repaired.relationships.is_empty());
        assert_eq!(notes.len(), 3);
    }

    #[test]
    fn repair_keeps_relationship_order_and_clamps_bubbles() {
        let a = Person::new("A");
        let b = Person::new("B");
        let c = Person::new("C");
        let mut union = Relationship::union(RelationshipType::Marriage, a.id.clone(), b.id.clone());
        union.bubble_position = 4.0;
        let child = Relationship::child(union.id.clone(), c.id.clone());
        let child_id = child.id.clone();
        let snapshot = GraphSnapshot::new(vec![a, b, c], vec![child, union], vec![], vec![]);

        let (repaired, notes) = repair(snapshot);
        assert!(notes.is_empty(), "{notes:?}");
        assert_eq!(repaired.relationships[0].id, child_id);
        assert_eq!(repaired.relationships[1].bubble_position, 1.0);
    }
}
