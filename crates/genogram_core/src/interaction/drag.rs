//! Pointer-drag engine.
//!
//! # Responsibility
//! - Decide which entities move together for a given drag target.
//! - Apply intermediate pointer positions to the store without recording
//!   history; the editor records one snapshot when the gesture ends.
//!
//! # Invariants
//! - Positions are recomputed from the gesture's start state on every move,
//!   so intermediate frames never accumulate drift.
//! - Bubble drags only change `bubble_position` and keep it in `[0, 1]`.
//! - Cancelling restores every start position.

use crate::model::geometry::{project_onto_segment, snap_to_grid, Point};
use crate::model::ids::{HouseholdId, PersonId, RelationshipId, TextBoxId};
use crate::model::relationship::RelationshipLink;
use crate::settings::EditorSettings;
use crate::store::{GraphStore, StoreResult};
use log::debug;
use std::collections::{HashSet, VecDeque};

/// Entity grabbed at pointer-down.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DragTarget {
    Person(PersonId),
    /// The union line itself: moves the family subtree.
    RelationshipLine(RelationshipId),
    /// The union's bubble handle: slides along the line.
    Bubble(RelationshipId),
    HouseholdVertex {
        household: HouseholdId,
        index: usize,
    },
    TextBox(TextBoxId),
}

/// Modifier keys held during a pointer move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Modifiers {
    /// Pins vertical movement for relationship-line drags.
    pub shift: bool,
}

/// Start state captured at pointer-down.
#[derive(Debug, Clone, PartialEq)]
enum Origin {
    People(Vec<(PersonId, Point)>),
    Bubble(f64),
    Vertex(Point),
    TextBox(Point),
}

/// One in-progress drag gesture.
#[derive(Debug, Clone, PartialEq)]
pub struct DragSession {
    target: DragTarget,
    pointer_start: Point,
    origin: Origin,
    moved: bool,
}

impl DragSession {
    /// Captures the start state for `target`.
    ///
    /// Returns `None` when the target does not exist (gesture ignored).
    pub fn begin(store: &GraphStore, target: DragTarget, pointer: Point) -> Option<Self> {
        let origin = match &target {
            DragTarget::Person(id) => {
                let person = store.person(id)?;
                Origin::People(vec![(id.clone(), person.position())])
            }
            DragTarget::RelationshipLine(id) => {
                let rel = store.relationship(id)?;
                if rel.link.is_child() {
                    return None;
                }
                let people = family_subtree(store, id)
                    .into_iter()
                    .filter_map(|person_id| {
                        let position = store.person(&person_id)?.position();
                        Some((person_id, position))
                    })
                    .collect();
                Origin::People(people)
            }
            DragTarget::Bubble(id) => {
                let rel = store.relationship(id)?;
                if !matches!(rel.link, RelationshipLink::Union { .. }) {
                    return None;
                }
                Origin::Bubble(rel.bubble_position)
            }
            DragTarget::HouseholdVertex { household, index } => {
                let point = *store.household(household)?.points.get(*index)?;
                Origin::Vertex(point)
            }
            DragTarget::TextBox(id) => Origin::TextBox(store.text_box(id)?.position()),
        };
        debug!("event=drag_begin module=interaction status=ok");
        Some(Self {
            target,
            pointer_start: pointer,
            origin,
            moved: false,
        })
    }

    pub fn target(&self) -> &DragTarget {
        &self.target
    }

    /// Whether any entity changed since pointer-down.
    pub fn has_moved(&self) -> bool {
        self.moved
    }

    /// Applies the pointer position to the store.
    pub fn update(
        &mut self,
        store: &mut GraphStore,
        pointer: Point,
        modifiers: Modifiers,
        settings: &EditorSettings,
    ) -> StoreResult<()> {
        let dx = pointer.x - self.pointer_start.x;
        let dy = pointer.y - self.pointer_start.y;
        let snap = |point: Point| {
            if settings.snap_to_grid {
                Point::new(
                    snap_to_grid(point.x, settings.grid_size),
                    snap_to_grid(point.y, settings.grid_size),
                )
            } else {
                point
            }
        };

        match (&self.target, &self.origin) {
            (DragTarget::Person(id), Origin::People(start)) => {
                let Some((_, from)) = start.first() else {
                    return Ok(());
                };
                let next = snap(from.offset(dx, dy));
                let moved = next != *from;
                store.set_person_position(id, next)?;
                self.track(moved);
            }
            (DragTarget::RelationshipLine(_), Origin::People(start)) => {
                let dy = if modifiers.shift { 0.0 } else { dy };
                store.atomically(|store| {
                    for (id, from) in start {
                        store.set_person_position(id, from.offset(dx, dy))?;
                    }
                    Ok(())
                })?;
                self.track(dx != 0.0 || dy != 0.0);
            }
            (DragTarget::Bubble(id), Origin::Bubble(start)) => {
                let Some((a, b)) = store.union_endpoints(id) else {
                    return Ok(());
                };
                let t = project_onto_segment(pointer, a, b).unwrap_or(*start);
                let moved = t != *start;
                store.set_bubble_position(id, t)?;
                self.track(moved);
            }
            (DragTarget::HouseholdVertex { household, index }, Origin::Vertex(from)) => {
                let next = snap(from.offset(dx, dy));
                let moved = next != *from;
                store.set_household_point(household, *index, next)?;
                self.track(moved);
            }
            (DragTarget::TextBox(id), Origin::TextBox(from)) => {
                let next = snap(from.offset(dx, dy));
                let moved = next != *from;
                store.set_text_box_position(id, next)?;
                self.track(moved);
            }
            _ => {}
        }
        Ok(())
    }

    /// Puts every dragged entity back where it started.
    pub fn revert(&self, store: &mut GraphStore) -> StoreResult<()> {
        match (&self.target, &self.origin) {
            (_, Origin::People(start)) => {
                for (id, from) in start {
                    store.set_person_position(id, *from)?;
                }
            }
            (DragTarget::Bubble(id), Origin::Bubble(start)) => {
                store.set_bubble_position(id, *start)?;
            }
            (DragTarget::HouseholdVertex { household, index }, Origin::Vertex(from)) => {
                store.set_household_point(household, *index, *from)?;
            }
            (DragTarget::TextBox(id), Origin::TextBox(from)) => {
                store.set_text_box_position(id, *from)?;
            }
            _ => {}
        }
        debug!("event=drag_cancel module=interaction status=ok");
        Ok(())
    }

    // Once moved, a gesture stays "moved" even if the pointer returns to the
    // start; the final positions are compared by the editor.
    fn track(&mut self, changed: bool) {
        self.moved |= changed;
    }
}

/// People that move with a union line: both endpoints, every child of the
/// union, and transitively each child's partners and their descendants.
///
/// Returned in discovery order without duplicates.
pub fn family_subtree(store: &GraphStore, union: &RelationshipId) -> Vec<PersonId> {
    let mut people: Vec<PersonId> = Vec::new();
    let mut seen_people: HashSet<PersonId> = HashSet::new();
    let mut seen_unions: HashSet<RelationshipId> = HashSet::new();
    let mut queue: VecDeque<RelationshipId> = VecDeque::from([union.clone()]);

    let mut push = |id: &PersonId, people: &mut Vec<PersonId>| {
        if seen_people.insert(id.clone()) {
            people.push(id.clone());
            true
        } else {
            false
        }
    };

    while let Some(current) = queue.pop_front() {
        if !seen_unions.insert(current.clone()) {
            continue;
        }
        let Some(rel) = store.relationship(&current) else {
            continue;
        };
        for parent in rel.link.parents() {
            push(parent, &mut people);
        }
        for child in store.children_of_union(&current) {
            if !push(&child.id, &mut people) {
                continue;
            }
            for child_union in store.unions_of_person(&child.id) {
                if child_union.accepts_children() {
                    queue.push_back(child_union.id.clone());
                }
            }
        }
    }
    people
}

#[cfg(test)]
mod tests {
    use super::{family_subtree, DragSession, DragTarget, Modifiers};
    use crate::model::annotation::TextBox;
    use crate::model::geometry::Point;
    use crate::model::household::Household;
    use crate::model::person::Person;
    use crate::model::relationship::{Relationship, RelationshipType};
    use crate::settings::EditorSettings;
    use crate::store::GraphStore;

    #[test]
    fn subtree_includes_child_spouse_and_grandchildren() {
        let mut store = GraphStore::new();
        let a = store.add_person(Person::new("A")).unwrap();
        let b = store.add_person(Person::new("B")).unwrap();
        let c = store.add_person(Person::new("C")).unwrap();
        let spouse = store.add_person(Person::new("S")).unwrap();
        let grandchild = store.add_person(Person::new("G")).unwrap();
        let outsider = store.add_person(Person::new("O")).unwrap();
        let union = store
            .add_relationship(Relationship::union(RelationshipType::Marriage, a.clone(), b.clone()))
            .unwrap();
        store
            .add_relationship(Relationship::child(union.clone(), c.clone()))
            .unwrap();
        let second = store
            .add_relationship(Relationship::union(
                RelationshipType::Partner,
                c.clone(),
                spouse.clone(),
            ))
            .unwrap();
        store
            .add_relationship(Relationship::child(second, grandchild.clone()))
            .unwrap();
        store
            .add_relationship(Relationship::union(
                RelationshipType::Conflict,
                c.clone(),
                outsider.clone(),
            ))
            .unwrap();

        let subtree = family_subtree(&store, &union);
        assert_eq!(subtree, vec![a, b, c, spouse, grandchild]);
        assert!(!subtree.contains(&outsider));
    }

    #[test]
    fn person_drag_snaps_when_enabled() {
        let mut store = GraphStore::new();
        let a = store.add_person(Person::new("A").at(0.0, 0.0)).unwrap();
        let settings = EditorSettings {
            snap_to_grid: true,
            ..EditorSettings::default()
        };
        let mut drag =
            DragSession::begin(&store, DragTarget::Person(a.clone()), Point::new(0.0, 0.0))
                .unwrap();
        drag.update(&mut store, Point::new(33.0, 9.0), Modifiers::default(), &settings)
            .unwrap();
        assert_eq!(store.person(&a).unwrap().position(), Point::new(40.0, 0.0));
        assert!(drag.has_moved());
    }

    #[test]
    fn begin_ignores_missing_targets() {
        let store = GraphStore::new();
        assert!(DragSession::begin(
            &store,
            DragTarget::Person("ghost".into()),
            Point::default()
        )
        .is_none());
    }

    #[test]
    fn revert_restores_start_positions() {
        let mut store = GraphStore::new();
        let a = store.add_person(Person::new("A").at(10.0, 10.0)).unwrap();
        let mut drag =
            DragSession::begin(&store, DragTarget::Person(a.clone()), Point::new(10.0, 10.0))
                .unwrap();
        drag.update(
            &mut store,
            Point::new(70.0, 90.0),
            Modifiers::default(),
            &EditorSettings::default(),
        )
        .unwrap();
        drag.revert(&mut store).unwrap();
        assert_eq!(store.person(&a).unwrap().position(), Point::new(10.0, 10.0));
    }

    #[test]
    fn non_finite_line_drag_moves_nobody() {
        let mut store = GraphStore::new();
        let a = store.add_person(Person::new("A").at(0.0, 0.0)).unwrap();
        let b = store.add_person(Person::new("B").at(150.0, 0.0)).unwrap();
        let union = store
            .add_relationship(Relationship::union(RelationshipType::Marriage, a.clone(), b.clone()))
            .unwrap();
        let mut drag = DragSession::begin(
            &store,
            DragTarget::RelationshipLine(union),
            Point::new(75.0, 0.0),
        )
        .unwrap();

        let result = drag.update(
            &mut store,
            Point::new(f64::NAN, 0.0),
            Modifiers::default(),
            &EditorSettings::default(),
        );

        assert!(result.is_err());
        assert!(!drag.has_moved());
        assert_eq!(store.person(&a).unwrap().position(), Point::new(0.0, 0.0));
        assert_eq!(store.person(&b).unwrap().position(), Point::new(150.0, 0.0));
    }

    #[test]
    fn vertex_and_text_box_drags_track_movement() {
        let mut store = GraphStore::new();
        let household = store
            .add_household(Household::new(
                "Home",
                vec![
                    Point::new(0.0, 0.0),
                    Point::new(100.0, 0.0),
                    Point::new(50.0, 80.0),
                ],
            ))
            .unwrap();
        let note = store
            .add_text_box(TextBox::new(0.0, 0.0, 100.0, 40.0, "note"))
            .unwrap();
        let settings = EditorSettings::default();

        let mut vertex = DragSession::begin(
            &store,
            DragTarget::HouseholdVertex {
                household: household.clone(),
                index: 2,
            },
            Point::new(50.0, 80.0),
        )
        .unwrap();
        vertex
            .update(&mut store, Point::new(60.0, 100.0), Modifiers::default(), &settings)
            .unwrap();
        assert!(vertex.has_moved());
        assert_eq!(
            store.household(&household).unwrap().points[2],
            Point::new(60.0, 100.0)
        );

        let mut text = DragSession::begin(&store, DragTarget::TextBox(note.clone()), Point::new(5.0, 5.0))
            .unwrap();
        text.update(&mut store, Point::new(5.0, 5.0), Modifiers::default(), &settings)
            .unwrap();
        assert!(!text.has_moved());
        text.update(&mut store, Point::new(25.0, 15.0), Modifiers::default(), &settings)
            .unwrap();
        assert!(text.has_moved());
        assert_eq!(store.text_box(&note).unwrap().position(), Point::new(20.0, 10.0));
    }
}
