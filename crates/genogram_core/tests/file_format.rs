use genogram_core::file::{from_value, to_document_at, FORMAT_VERSION};
use genogram_core::{
    from_file, to_file, FileError, Gender, GenogramMetadata, GraphSnapshot, Household, LineStyle,
    NodeKind, Person, Point, Relationship, RelationshipLink, RelationshipType, TextBox,
};
use serde_json::{json, Map, Value};

fn sample_snapshot() -> GraphSnapshot {
    let mut mother = Person::new("Maria").with_gender(Gender::Female).at(0.5, 0.25);
    mother.age = Some(41);
    mother.phones = vec!["555-0101".to_string()];
    let father = Person::new("Jon").with_gender(Gender::Male).at(150.125, 0.25);
    let mut agency = Person::new("Family services").at(400.0, -200.0);
    agency.kind = NodeKind::Service {
        service_type: "counselling".to_string(),
        provider: "County".to_string(),
    };
    let mut fields = Map::new();
    fields.insert("since".to_string(), json!(2019));
    let mut coach = Person::new("Coach").at(-200.0, 40.0);
    coach.kind = NodeKind::Custom {
        label: "Mentor".to_string(),
        fields,
    };
    let child = Person::new("Ana").at(75.0, 150.0).in_generation(1);

    let union = Relationship::union(
        RelationshipType::Marriage,
        mother.id.clone(),
        father.id.clone(),
    )
    .styled(LineStyle::Double);
    let edge = Relationship::child(union.id.clone(), child.id.clone());
    let adoption = Relationship::single_parent_adoption(agency.id.clone());

    GraphSnapshot::new(
        vec![mother, father, agency, coach, child],
        vec![union, edge, adoption],
        vec![Household::new(
            "Home",
            vec![
                Point::new(-50.0, -50.0),
                Point::new(250.0, -50.0),
                Point::new(250.0, 250.0),
            ],
        )],
        vec![TextBox::new(300.0, 300.0, 160.0, 60.0, "<b>Intake</b>")],
    )
}

#[test]
fn saved_documents_load_back_identically() {
    let snapshot = sample_snapshot();
    let metadata = GenogramMetadata {
        title: Some("Case 42".to_string()),
        ..GenogramMetadata::default()
    };

    let raw = to_file(&snapshot, &metadata).unwrap();
    let loaded = from_file(&raw).unwrap();

    assert_eq!(loaded.snapshot, snapshot);
    assert_eq!(loaded.metadata, metadata);
    assert_eq!(loaded.version.as_deref(), Some(FORMAT_VERSION));
    assert!(loaded.report.is_clean(), "{:?}", loaded.report);
}

#[test]
fn document_uses_camel_case_wire_names() {
    let document = to_document_at(
        &sample_snapshot(),
        &GenogramMetadata::default(),
        chrono::DateTime::from_timestamp(0, 0).unwrap(),
    );
    let value = serde_json::to_value(&document).unwrap();

    assert_eq!(value["savedAt"], "1970-01-01T00:00:00.000Z");
    assert!(value["textBoxes"].is_array());
    assert_eq!(value["people"][2]["type"], "service");
    assert_eq!(value["people"][2]["typeData"]["serviceType"], "counselling");
    assert_eq!(value["people"][3]["typeData"]["label"], "Mentor");
    assert_eq!(value["relationships"][1]["type"], "child");
    assert_eq!(value["relationships"][2]["from"], value["relationships"][2]["to"]);
}

#[test]
fn only_non_json_and_non_objects_are_rejected() {
    assert!(matches!(from_file("{oops"), Err(FileError::NotJson(_))));
    assert!(matches!(from_file("[1, 2]"), Err(FileError::NotObject)));
    let empty = from_file("{}").unwrap();
    assert!(empty.snapshot.is_empty());
}

#[test]
fn malformed_fields_are_coerced_and_reported() {
    let value = json!({
        "people": [
            {"id": "p1", "name": 7, "x": "12.5", "y": null, "age": -4, "type": "robot"},
            {"name": "No id"},
            "not a record"
        ],
        "relationships": [
            {"id": "r1", "from": "p1", "to": "missing", "type": "marriage"},
            {"id": "r2", "from": "p1", "to": "p1", "bubblePosition": 3}
        ],
        "households": [
            {"id": "h1", "points": [{"x": 0, "y": 0}, {"x": "bad"}, {"x": 5, "y": 5}, {"x": 0, "y": 9}]}
        ]
    });

    let loaded = from_value(&value).unwrap();
    let people = &loaded.snapshot.people;

    assert_eq!(people.len(), 2);
    assert_eq!(people[0].name, "7");
    assert_eq!(people[0].position(), Point::new(12.5, 0.0));
    assert_eq!(people[0].age, None);
    assert_eq!(people[0].kind, NodeKind::Person);
    assert!(!people[1].id.as_str().is_empty());
    assert_eq!(loaded.snapshot.households[0].points.len(), 3);

    // r1 dangles; r2 is a partner self-loop.
    assert!(loaded.snapshot.relationships.is_empty());
    assert!(!loaded.report.repaired.is_empty());

    let coerced = loaded.report.coerced.join("\n");
    assert!(coerced.contains("unknown node type `robot`"));
    assert!(coerced.contains("people[1]: missing id"));
    assert!(coerced.contains("people[2]: not an object"));
    assert!(coerced.contains("missing type, loaded as partner"));
    assert!(coerced.contains("bubblePosition clamped"));
    assert!(coerced.contains("dropped 1 malformed points"));
}

#[test]
fn wire_shapes_become_typed_links() {
    let value = json!({
        "people": [{"id": "a"}, {"id": "b"}, {"id": "c"}],
        "relationships": [
            {"id": "u", "from": "a", "to": "b", "type": "divorce"},
            {"id": "k", "from": "u", "to": "c", "type": "child"},
            {"id": "s", "from": "a", "to": "a", "type": "adoption"}
        ]
    });

    let loaded = from_value(&value).unwrap();
    let links: Vec<&RelationshipLink> = loaded
        .snapshot
        .relationships
        .iter()
        .map(|rel| &rel.link)
        .collect();

    assert!(matches!(links[0], RelationshipLink::Union { .. }));
    assert!(matches!(links[1], RelationshipLink::Child { union, .. } if union.as_str() == "u"));
    assert!(matches!(links[2], RelationshipLink::SingleParent { parent } if parent.as_str() == "a"));
    assert_eq!(loaded.snapshot.relationships[0].kind, RelationshipType::Divorce);
}

#[test]
fn unknown_metadata_keys_survive_a_round_trip() {
    let value = json!({
        "metadata": {"title": "Case", "agency": {"code": "X1"}},
        "people": []
    });
    let loaded = from_value(&value).unwrap();
    assert_eq!(loaded.metadata.title.as_deref(), Some("Case"));

    let raw = to_file(&loaded.snapshot, &loaded.metadata).unwrap();
    let reparsed: Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(reparsed["metadata"]["agency"]["code"], "X1");
}
