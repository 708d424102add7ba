use genogram_core::{
    Gender, GraphStore, Household, Person, PersonId, Point, Relationship, RelationshipId,
    RelationshipLink, RelationshipType, StoreError, TextBox,
};
use std::collections::HashSet;

fn family(store: &mut GraphStore) -> (PersonId, PersonId, RelationshipId, PersonId, RelationshipId) {
    let mother = store
        .add_person(Person::new("Mother").with_gender(Gender::Female))
        .unwrap();
    let father = store
        .add_person(Person::new("Father").with_gender(Gender::Male).at(150.0, 0.0))
        .unwrap();
    let union = store
        .add_relationship(Relationship::union(
            RelationshipType::Marriage,
            mother.clone(),
            father.clone(),
        ))
        .unwrap();
    let child = store.add_person(Person::new("Child").at(75.0, 150.0)).unwrap();
    let edge = store
        .add_relationship(Relationship::child(union.clone(), child.clone()))
        .unwrap();
    (mother, father, union, child, edge)
}

fn assert_referentially_sound(store: &GraphStore) {
    let people: HashSet<&PersonId> = store.people().iter().map(|person| &person.id).collect();
    let relationships: HashSet<&RelationshipId> =
        store.relationships().iter().map(|rel| &rel.id).collect();
    for rel in store.relationships() {
        match &rel.link {
            RelationshipLink::Union { from, to } => {
                assert!(people.contains(from) && people.contains(to));
            }
            RelationshipLink::SingleParent { parent } => assert!(people.contains(parent)),
            RelationshipLink::Child { union, child } => {
                assert!(relationships.contains(union));
                assert!(people.contains(child));
            }
        }
    }
}

#[test]
fn deleting_a_parent_cascades_to_union_and_child_edges() {
    let mut store = GraphStore::new();
    let (mother, _father, union, child, edge) = family(&mut store);

    let report = store.delete_person(&mother).unwrap();

    assert_eq!(report.removed_relationships, vec![union, edge]);
    assert!(store.relationships().is_empty());
    assert!(store.person(&child).is_some());
    assert_referentially_sound(&store);
}

#[test]
fn deleting_a_child_removes_only_its_edge() {
    let mut store = GraphStore::new();
    let (_mother, _father, union, child, edge) = family(&mut store);

    let report = store.delete_person(&child).unwrap();

    assert_eq!(report.removed_relationships, vec![edge]);
    assert!(store.relationship(&union).is_some());
    assert_referentially_sound(&store);
}

#[test]
fn dangling_relationships_are_refused() {
    let mut store = GraphStore::new();
    let a = store.add_person(Person::new("A")).unwrap();
    let err = store
        .add_relationship(Relationship::union(
            RelationshipType::Partner,
            a,
            PersonId::new("ghost"),
        ))
        .unwrap_err();
    assert!(matches!(err, StoreError::DanglingReference { .. }));
    assert!(store.relationships().is_empty());
}

#[test]
fn a_child_belongs_to_at_most_one_union() {
    let mut store = GraphStore::new();
    let (mother, _father, _union, child, _edge) = family(&mut store);
    let other = store.add_person(Person::new("Other")).unwrap();
    let second = store
        .add_relationship(Relationship::union(RelationshipType::Partner, mother, other))
        .unwrap();

    let err = store
        .add_relationship(Relationship::child(second, child.clone()))
        .unwrap_err();
    assert_eq!(err, StoreError::ChildAlreadyAttached(child));
}

#[test]
fn children_cannot_hang_off_emotional_lines() {
    let mut store = GraphStore::new();
    let a = store.add_person(Person::new("A")).unwrap();
    let b = store.add_person(Person::new("B")).unwrap();
    let c = store.add_person(Person::new("C")).unwrap();
    let conflict = store
        .add_relationship(Relationship::union(RelationshipType::Conflict, a, b))
        .unwrap();

    let err = store
        .add_relationship(Relationship::child(conflict, c))
        .unwrap_err();
    assert!(matches!(err, StoreError::InvalidLink { .. }));
}

#[test]
fn atomically_rolls_back_partial_work() {
    let mut store = GraphStore::new();
    let before = store.snapshot();

    let result = store.atomically(|store| {
        store.add_person(Person::new("Kept only on success"))?;
        store.delete_person(&PersonId::new("ghost"))?;
        Ok(())
    });

    assert!(result.is_err());
    assert_eq!(store.snapshot(), before);
}

#[test]
fn queries_follow_union_structure() {
    let mut store = GraphStore::new();
    let (mother, father, union, child, _edge) = family(&mut store);

    assert_eq!(
        store.parent_union_of(&child).map(|rel| rel.id.clone()),
        Some(union.clone())
    );
    assert_eq!(store.children_of_union(&union).len(), 1);
    assert_eq!(store.partner_relationships(&mother).len(), 1);
    assert_eq!(
        store.union_endpoints(&union),
        Some((Point::new(0.0, 0.0), Point::new(150.0, 0.0)))
    );
    assert!(store.unions_of_person(&father).iter().any(|rel| rel.id == union));
}

#[test]
fn household_members_are_people_inside_the_polygon() {
    let mut store = GraphStore::new();
    let inside = store.add_person(Person::new("In").at(50.0, 50.0)).unwrap();
    store.add_person(Person::new("Out").at(500.0, 500.0)).unwrap();
    let household = store
        .add_household(Household::new(
            "Home",
            vec![
                Point::new(0.0, 0.0),
                Point::new(100.0, 0.0),
                Point::new(100.0, 100.0),
                Point::new(0.0, 100.0),
            ],
        ))
        .unwrap();

    let members: Vec<PersonId> = store
        .household_members(&household)
        .unwrap()
        .into_iter()
        .map(|person| person.id.clone())
        .collect();
    assert_eq!(members, vec![inside]);
}

#[test]
fn household_keeps_at_least_three_vertices() {
    let mut store = GraphStore::new();
    let household = store
        .add_household(Household::new(
            "Triangle",
            vec![
                Point::new(0.0, 0.0),
                Point::new(100.0, 0.0),
                Point::new(50.0, 80.0),
            ],
        ))
        .unwrap();

    let err = store.remove_household_point(&household, 0).unwrap_err();
    assert_eq!(err, StoreError::HouseholdTooSmall(household.clone()));

    let index = store
        .insert_household_point(&household, Point::new(50.0, -5.0))
        .unwrap();
    assert_eq!(index, 1);
    assert_eq!(store.household(&household).unwrap().points.len(), 4);
    store.remove_household_point(&household, index).unwrap();
}

#[test]
fn text_boxes_are_independent_of_the_graph() {
    let mut store = GraphStore::new();
    let id = store
        .add_text_box(TextBox::new(10.0, 10.0, 120.0, 40.0, "<p>Intake notes</p>"))
        .unwrap();
    store.set_text_box_position(&id, Point::new(30.0, 40.0)).unwrap();
    assert_eq!(store.text_box(&id).unwrap().position(), Point::new(30.0, 40.0));
    store.delete_text_box(&id).unwrap();
    assert!(store.text_boxes().is_empty());
}

#[test]
fn custom_types_that_would_not_read_back_are_refused() {
    let mut store = GraphStore::new();
    let a = store.add_person(Person::new("A")).unwrap();
    let b = store.add_person(Person::new("B")).unwrap();

    let err = store
        .add_relationship(Relationship::union(
            RelationshipType::Custom(String::new()),
            a.clone(),
            b.clone(),
        ))
        .unwrap_err();
    assert!(matches!(err, StoreError::InvalidRelationship(_)));

    let mentor = store
        .add_relationship(Relationship::union(
            RelationshipType::Custom("mentor".to_string()),
            a,
            b,
        ))
        .unwrap();
    let raw = genogram_core::to_file(&store.snapshot(), &Default::default()).unwrap();
    let loaded = genogram_core::from_file(&raw).unwrap();
    assert_eq!(
        loaded.snapshot.relationship(&mentor).unwrap().kind,
        RelationshipType::Custom("mentor".to_string())
    );
}
