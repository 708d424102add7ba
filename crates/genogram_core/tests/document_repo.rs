use genogram_core::service::Editor;
use genogram_core::{
    FileGenogramRepository, GenogramMetadata, GenogramRepository, MemoryGenogramRepository, Person,
    RepoError,
};

#[test]
fn file_repository_saves_lists_loads_and_deletes() {
    let dir = tempfile::tempdir().unwrap();
    let repo = FileGenogramRepository::open(dir.path().join("documents")).unwrap();

    let mut editor = Editor::default();
    let ada = editor.add_person(Person::new("Ada").at(10.0, 20.0)).unwrap();
    editor.create_spouse_and_child(&ada).unwrap();
    editor.set_metadata(GenogramMetadata {
        case_id: Some("C-17".to_string()),
        ..GenogramMetadata::default()
    });
    assert!(editor.is_dirty());

    editor.save_to(&repo, "case-17").unwrap();
    assert!(!editor.is_dirty());
    assert!(repo.root().join("case-17.genogram.json").exists());
    assert_eq!(repo.list().unwrap(), vec!["case-17"]);

    let mut reopened = Editor::default();
    let report = reopened.load_from(&repo, "case-17").unwrap();
    assert!(report.is_clean());
    assert_eq!(reopened.snapshot(), editor.snapshot());
    assert_eq!(reopened.metadata().case_id.as_deref(), Some("C-17"));

    repo.delete("case-17").unwrap();
    assert!(repo.list().unwrap().is_empty());
    assert!(matches!(
        repo.load("case-17"),
        Err(RepoError::NotFound(_))
    ));
}

#[test]
fn file_repository_refuses_path_like_names() {
    let dir = tempfile::tempdir().unwrap();
    let repo = FileGenogramRepository::open(dir.path()).unwrap();
    let editor = Editor::default();

    let err = repo
        .save("../escape", &editor.snapshot(), editor.metadata())
        .unwrap_err();
    assert!(matches!(err, RepoError::InvalidName(_)));
    assert!(std::fs::read_dir(dir.path()).unwrap().next().is_none());
}

#[test]
fn stored_documents_are_sanitized_on_load() {
    let dir = tempfile::tempdir().unwrap();
    let repo = FileGenogramRepository::open(dir.path()).unwrap();
    std::fs::write(
        dir.path().join("legacy.genogram.json"),
        r#"{"people":[{"id":"a","name":"A"}],"relationships":[{"id":"r","from":"a","to":"gone","type":"marriage"}]}"#,
    )
    .unwrap();

    let loaded = repo.load("legacy").unwrap();
    assert_eq!(loaded.snapshot.people.len(), 1);
    assert!(loaded.snapshot.relationships.is_empty());
    assert!(!loaded.report.repaired.is_empty());
}

#[test]
fn editor_works_through_a_trait_object() {
    let repo: Box<dyn GenogramRepository> = Box::new(MemoryGenogramRepository::new());
    let mut editor = Editor::default();
    editor.add_person(Person::new("A")).unwrap();

    editor.save_to(repo.as_ref(), "draft").unwrap();
    editor.new_genogram();
    assert!(editor.store().people().is_empty());

    editor.load_from(repo.as_ref(), "draft").unwrap();
    assert_eq!(editor.store().people().len(), 1);
    assert!(!editor.can_undo());
}
