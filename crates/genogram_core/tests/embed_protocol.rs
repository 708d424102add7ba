use genogram_core::{EditorSettings, EmbedSession, EngineMessage, OriginPolicy, Theme};
use serde_json::{json, Value};

const HOST: &str = "https://records.example.org";

fn open() -> EmbedSession {
    EmbedSession::new(OriginPolicy::new([HOST]), EditorSettings::default())
}

fn send(session: &mut EmbedSession, message: Value) -> Option<Value> {
    session
        .handle(HOST, &message.to_string())
        .map(|reply| serde_json::from_str(&reply.to_json().unwrap()).unwrap())
}

#[test]
fn deny_all_policy_ignores_every_message() {
    let mut session = EmbedSession::new(OriginPolicy::deny_all(), EditorSettings::default());
    let load = json!({"type": "LOAD_GENOGRAM", "data": {"people": [{"id": "p"}]}});
    assert!(session.handle(HOST, &load.to_string()).is_none());
    assert!(session.editor().store().people().is_empty());
}

#[test]
fn ready_message_announces_version() {
    let session = open();
    let json: Value = serde_json::from_str(&session.ready_message().to_json().unwrap()).unwrap();
    assert_eq!(json["type"], "GENOGRAM_READY");
    assert_eq!(json["version"], genogram_core::core_version());
}

#[test]
fn load_save_and_export_flow() {
    let mut session = open();
    let document = json!({
        "version": "2.0",
        "people": [
            {"id": "m", "name": "Maria", "gender": "female", "x": 0, "y": 0},
            {"id": "j", "name": "Jon", "gender": "male", "x": 150, "y": 0}
        ],
        "relationships": [{"id": "u", "from": "m", "to": "j", "type": "marriage"}]
    });

    let ready = send(&mut session, json!({"type": "LOAD_GENOGRAM", "data": document})).unwrap();
    assert_eq!(ready["type"], "GENOGRAM_READY");

    let saved = send(&mut session, json!({"type": "REQUEST_SAVE"})).unwrap();
    assert_eq!(saved["type"], "GENOGRAM_SAVE");
    assert_eq!(saved["data"]["relationships"][0]["id"], "u");
    assert!(saved["svg"].as_str().unwrap().starts_with("<svg"));

    let svg = send(&mut session, json!({"type": "REQUEST_EXPORT_SVG"})).unwrap();
    assert_eq!(svg["type"], "GENOGRAM_EXPORT_SVG");
    assert_eq!(svg["width"], 290.0);

    let png = send(
        &mut session,
        json!({"type": "REQUEST_EXPORT_PNG", "transparentBackground": true}),
    )
    .unwrap();
    assert_eq!(png["type"], "GENOGRAM_EXPORT_PNG");
    assert_eq!(png["width"], 580);
    assert_eq!(png["height"], 280);
}

#[test]
fn theme_and_settings_messages_update_the_editor_silently() {
    let mut session = open();
    assert!(send(&mut session, json!({"type": "SET_THEME", "theme": "dark"})).is_none());
    assert!(send(
        &mut session,
        json!({"type": "UPDATE_SETTINGS", "settings": {"snapToGrid": true, "gridSize": 25}})
    )
    .is_none());

    let settings = session.editor().settings();
    assert_eq!(settings.theme, Theme::Dark);
    assert!(settings.snap_to_grid);
    assert_eq!(settings.grid_size, 25.0);
}

#[test]
fn focus_person_reports_unknown_ids() {
    let mut session = open();
    send(
        &mut session,
        json!({"type": "LOAD_GENOGRAM", "data": {"people": [{"id": "p1", "x": 300, "y": 200}]}}),
    );

    assert!(send(&mut session, json!({"type": "FOCUS_PERSON", "personId": "p1"})).is_none());
    assert!(session.editor().selection().is_some());

    let reply = send(&mut session, json!({"type": "FOCUS_PERSON", "personId": "nobody"})).unwrap();
    assert_eq!(reply["type"], "GENOGRAM_ERROR");
}

#[test]
fn rejected_load_keeps_current_graph() {
    let mut session = open();
    send(
        &mut session,
        json!({"type": "LOAD_GENOGRAM", "data": {"people": [{"id": "keep"}]}}),
    );

    let reply = send(&mut session, json!({"type": "LOAD_GENOGRAM", "data": [1, 2, 3]})).unwrap();

    assert_eq!(reply["type"], "GENOGRAM_ERROR");
    assert_eq!(session.editor().store().people()[0].id.as_str(), "keep");
}

#[test]
fn engine_message_variants_serialize_flat() {
    let message = EngineMessage::GenogramExportPng {
        svg: "<svg/>".to_string(),
        width: 10,
        height: 20,
        scale: 2.0,
    };
    let json: Value = serde_json::from_str(&message.to_json().unwrap()).unwrap();
    assert_eq!(
        json,
        json!({"type": "GENOGRAM_EXPORT_PNG", "svg": "<svg/>", "width": 10, "height": 20, "scale": 2.0})
    );
}
