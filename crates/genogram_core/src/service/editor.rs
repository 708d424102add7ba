//! Editing session controller.
//!
//! # Responsibility
//! - Own the graph store, undo history, settings and transient gesture state
//!   of one editing session.
//! - Turn every completed edit into exactly one history entry.
//! - Bridge documents in and out (file text, repositories, exports).
//!
//! # Invariants
//! - After any public mutator returns, `history.current()` equals the store.
//! - Failed edits record nothing and leave the store untouched.
//! - Loading or resetting a document starts a fresh history.
//! - Selection and context targets never point at deleted entities.
//!
//! # See also
//! - crate::store for the invariants enforced below this layer.

use crate::export::{self, ExportResult, PngExport, Scene, SceneOptions, SvgExport};
use crate::file::{
    self, FileResult, GenogramDocument, GenogramMetadata, LoadReport, LoadedGenogram,
};
use crate::history::History;
use crate::interaction::{
    ConnectionOutcome, ConnectionSource, ConnectionState, ConnectionTarget, DragSession,
    DragTarget, Modifiers, PanSession, RejectReason, Viewport,
};
use crate::model::annotation::{TextBox, TextBoxPatch};
use crate::model::geometry::Point;
use crate::model::household::{Household, HouseholdPatch};
use crate::model::ids::{
    EntityRef, HouseholdId, PersonId, RelationshipId, TextBoxId,
};
use crate::model::person::{Person, PersonPatch};
use crate::model::relationship::{Relationship, RelationshipPatch, RelationshipType};
use crate::repo::{GenogramRepository, RepoResult};
use crate::service::compound::{self, FamilyCreated, PartnerResolution};
use crate::service::layout::{self, ArrangeReport};
use crate::service::merge::{self, MergeReport};
use crate::settings::{EditorSettings, SettingsError, SettingsPatch, Theme};
use crate::store::{DeleteReport, GraphSnapshot, GraphStore, StoreResult};
use log::{debug, info};
use serde_json::Value;

/// Entity held by the clipboard.
#[derive(Debug, Clone, PartialEq)]
pub enum ClipboardEntry {
    Person(Person),
    TextBox(TextBox),
    Household(Household),
}

/// Single-user editing session.
#[derive(Debug, Clone)]
pub struct Editor {
    store: GraphStore,
    history: History,
    settings: EditorSettings,
    metadata: GenogramMetadata,
    connection: ConnectionState,
    drag: Option<DragSession>,
    pan: Option<PanSession>,
    viewport: Viewport,
    selection: Option<EntityRef>,
    context_target: Option<EntityRef>,
    clipboard: Option<ClipboardEntry>,
}

impl Default for Editor {
    fn default() -> Self {
        Self::new(EditorSettings::default())
    }
}

impl Editor {
    pub fn new(settings: EditorSettings) -> Self {
        let store = GraphStore::new();
        let history = History::new(store.snapshot(), settings.history_limit);
        Self {
            store,
            history,
            settings,
            metadata: GenogramMetadata::default(),
            connection: ConnectionState::default(),
            drag: None,
            pan: None,
            viewport: Viewport::default(),
            selection: None,
            context_target: None,
            clipboard: None,
        }
    }

    // ----- accessors -------------------------------------------------------

    pub fn store(&self) -> &GraphStore {
        &self.store
    }

    pub fn snapshot(&self) -> GraphSnapshot {
        self.store.snapshot()
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn settings(&self) -> &EditorSettings {
        &self.settings
    }

    pub fn metadata(&self) -> &GenogramMetadata {
        &self.metadata
    }

    pub fn set_metadata(&mut self, metadata: GenogramMetadata) {
        self.metadata = metadata;
    }

    pub fn connection(&self) -> &ConnectionState {
        &self.connection
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn selection(&self) -> Option<&EntityRef> {
        self.selection.as_ref()
    }

    pub fn context_target(&self) -> Option<&EntityRef> {
        self.context_target.as_ref()
    }

    pub fn clipboard(&self) -> Option<&ClipboardEntry> {
        self.clipboard.as_ref()
    }

    pub fn is_dirty(&self) -> bool {
        self.store.is_dirty()
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    // ----- history ---------------------------------------------------------

    fn commit(&mut self) {
        self.history.save(self.store.snapshot());
        self.prune_references();
    }

    /// Runs a store edit and records it when it succeeds.
    fn record<T>(&mut self, edit: impl FnOnce(&mut GraphStore) -> StoreResult<T>) -> StoreResult<T> {
        let value = edit(&mut self.store)?;
        self.commit();
        Ok(value)
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Steps back one edit; pending gestures are cancelled first.
    pub fn undo(&mut self) -> bool {
        self.cancel_gestures();
        let Some(snapshot) = self.history.undo() else {
            return false;
        };
        self.store.restore(snapshot);
        self.prune_references();
        debug!("event=undo module=editor status=ok index={}", self.history.index());
        true
    }

    pub fn redo(&mut self) -> bool {
        self.cancel_gestures();
        let Some(snapshot) = self.history.redo() else {
            return false;
        };
        self.store.restore(snapshot);
        self.prune_references();
        debug!("event=redo module=editor status=ok index={}", self.history.index());
        true
    }

    fn cancel_gestures(&mut self) {
        self.connection.cancel();
        self.cancel_drag();
        self.pan = None;
    }

    fn prune_references(&mut self) {
        let store = &self.store;
        let exists = |entity: &EntityRef| match entity {
            EntityRef::Person(id) => store.person(id).is_some_and(Person::is_active),
            EntityRef::Relationship(id) => store.relationship(id).is_some(),
            EntityRef::Household(id) => store.household(id).is_some(),
            EntityRef::TextBox(id) => store.text_box(id).is_some(),
        };
        if self.selection.as_ref().is_some_and(|entity| !exists(entity)) {
            self.selection = None;
        }
        if self.context_target.as_ref().is_some_and(|entity| !exists(entity)) {
            self.context_target = None;
        }
    }

    // ----- selection and context menu -------------------------------------

    pub fn select(&mut self, entity: Option<EntityRef>) {
        self.selection = entity;
        self.prune_references();
    }

    pub fn open_context_menu(&mut self, entity: EntityRef) {
        self.context_target = Some(entity);
        self.prune_references();
    }

    pub fn close_context_menu(&mut self) {
        self.context_target = None;
    }

    /// Selects `person` and centres the viewport on it.
    pub fn focus_person(&mut self, person: &PersonId) -> bool {
        let Some(position) = self
            .store
            .person(person)
            .filter(|candidate| candidate.is_active())
            .map(Person::position)
        else {
            return false;
        };
        self.viewport.center_on(position);
        self.selection = Some(EntityRef::Person(person.clone()));
        true
    }

    // ----- direct edits ----------------------------------------------------

    pub fn add_person(&mut self, person: Person) -> StoreResult<PersonId> {
        let id = self.record(|store| store.add_person(person))?;
        self.selection = Some(EntityRef::Person(id.clone()));
        Ok(id)
    }

    pub fn update_person(&mut self, id: &PersonId, patch: PersonPatch) -> StoreResult<()> {
        self.record(|store| store.update_person(id, patch))
    }

    pub fn delete_person(&mut self, id: &PersonId) -> StoreResult<DeleteReport> {
        self.record(|store| store.delete_person(id))
    }

    pub fn add_relationship(&mut self, relationship: Relationship) -> StoreResult<RelationshipId> {
        self.record(|store| store.add_relationship(relationship))
    }

    pub fn update_relationship(
        &mut self,
        id: &RelationshipId,
        patch: RelationshipPatch,
    ) -> StoreResult<()> {
        self.record(|store| store.update_relationship(id, patch))
    }

    pub fn delete_relationship(&mut self, id: &RelationshipId) -> StoreResult<DeleteReport> {
        self.record(|store| store.delete_relationship(id))
    }

    pub fn add_household(&mut self, household: Household) -> StoreResult<HouseholdId> {
        self.record(|store| store.add_household(household))
    }

    pub fn update_household(&mut self, id: &HouseholdId, patch: HouseholdPatch) -> StoreResult<()> {
        self.record(|store| store.update_household(id, patch))
    }

    pub fn delete_household(&mut self, id: &HouseholdId) -> StoreResult<()> {
        self.record(|store| store.delete_household(id))
    }

    /// Inserts a vertex on the edge nearest to `point`; returns its index.
    pub fn insert_household_point(&mut self, id: &HouseholdId, point: Point) -> StoreResult<usize> {
        self.record(|store| store.insert_household_point(id, point))
    }

    pub fn remove_household_point(&mut self, id: &HouseholdId, index: usize) -> StoreResult<()> {
        self.record(|store| store.remove_household_point(id, index))
    }

    pub fn household_members(&self, id: &HouseholdId) -> StoreResult<Vec<&Person>> {
        self.store.household_members(id)
    }

    pub fn add_text_box(&mut self, text_box: TextBox) -> StoreResult<TextBoxId> {
        self.record(|store| store.add_text_box(text_box))
    }

    pub fn update_text_box(&mut self, id: &TextBoxId, patch: TextBoxPatch) -> StoreResult<()> {
        self.record(|store| store.update_text_box(id, patch))
    }

    pub fn delete_text_box(&mut self, id: &TextBoxId) -> StoreResult<()> {
        self.record(|store| store.delete_text_box(id))
    }

    // ----- compound operations --------------------------------------------

    pub fn create_child_with_unknown_parent(
        &mut self,
        person: &PersonId,
    ) -> StoreResult<FamilyCreated> {
        let settings = self.settings.clone();
        let created =
            self.record(|store| compound::create_child_with_unknown_parent(store, &settings, person))?;
        self.selection = Some(EntityRef::Person(created.child.clone()));
        Ok(created)
    }

    pub fn create_single_parent_adoption(&mut self, person: &PersonId) -> StoreResult<FamilyCreated> {
        let settings = self.settings.clone();
        let created =
            self.record(|store| compound::create_single_parent_adoption(store, &settings, person))?;
        self.selection = Some(EntityRef::Person(created.child.clone()));
        Ok(created)
    }

    pub fn create_spouse_and_child(&mut self, person: &PersonId) -> StoreResult<FamilyCreated> {
        let settings = self.settings.clone();
        let created =
            self.record(|store| compound::create_spouse_and_child(store, &settings, person))?;
        self.selection = Some(EntityRef::Person(created.child.clone()));
        Ok(created)
    }

    pub fn add_child_to_relationship(
        &mut self,
        union: &RelationshipId,
    ) -> StoreResult<FamilyCreated> {
        let settings = self.settings.clone();
        let created =
            self.record(|store| compound::add_child_to_relationship(store, &settings, union))?;
        self.selection = Some(EntityRef::Person(created.child.clone()));
        Ok(created)
    }

    pub fn partner_relationships(&self, person: &PersonId) -> Vec<&Relationship> {
        self.store.partner_relationships(person)
    }

    pub fn resolve_partner_union(&self, person: &PersonId) -> PartnerResolution {
        compound::resolve_partner_union(&self.store, person)
    }

    pub fn merge_members(
        &mut self,
        target: &PersonId,
        sources: &[PersonId],
    ) -> StoreResult<MergeReport> {
        let report = merge::merge_members(&mut self.store, target, sources)?;
        if !report.merged.is_empty() {
            self.commit();
        }
        Ok(report)
    }

    pub fn auto_arrange(&mut self) -> StoreResult<ArrangeReport> {
        let settings = self.settings.clone();
        self.record(|store| layout::auto_arrange(store, &settings))
    }

    // ----- connection gesture ---------------------------------------------

    pub fn start_connection(
        &mut self,
        source: ConnectionSource,
        kind: RelationshipType,
    ) -> Result<(), RejectReason> {
        self.connection.start(&self.store, source, kind)
    }

    pub fn complete_connection(&mut self, target: ConnectionTarget) -> ConnectionOutcome {
        let outcome = self.connection.complete(&mut self.store, target);
        if let ConnectionOutcome::Created(id) = &outcome {
            self.selection = Some(EntityRef::Relationship(id.clone()));
            self.commit();
        }
        outcome
    }

    pub fn cancel_connection(&mut self) {
        self.connection.cancel();
    }

    // ----- drag gesture ----------------------------------------------------

    /// Starts a drag at world position `pointer`; unknown targets are ignored.
    pub fn begin_drag(&mut self, target: DragTarget, pointer: Point) -> bool {
        self.cancel_drag();
        self.drag = DragSession::begin(&self.store, target, pointer);
        self.drag.is_some()
    }

    pub fn update_drag(&mut self, pointer: Point, modifiers: Modifiers) -> StoreResult<()> {
        let Some(drag) = self.drag.as_mut() else {
            return Ok(());
        };
        drag.update(&mut self.store, pointer, modifiers, &self.settings)
    }

    /// Finishes the drag; records one history entry iff anything moved.
    pub fn end_drag(&mut self) -> bool {
        let Some(drag) = self.drag.take() else {
            return false;
        };
        let changed = drag.has_moved() && self.store.snapshot() != *self.history.current();
        if changed {
            self.commit();
        }
        debug!("event=drag_end module=editor status=ok moved={changed}");
        changed
    }

    /// Abandons the drag and restores start positions; records nothing.
    pub fn cancel_drag(&mut self) {
        if let Some(drag) = self.drag.take() {
            if let Err(err) = drag.revert(&mut self.store) {
                debug!("event=drag_cancel module=editor status=error error={err}");
            }
        }
    }

    // ----- viewport --------------------------------------------------------

    pub fn begin_pan(&mut self, screen: Point) {
        self.pan = Some(self.viewport.begin_pan(screen));
    }

    pub fn update_pan(&mut self, screen: Point) {
        if let Some(pan) = &self.pan {
            self.viewport.update_pan(pan, screen);
        }
    }

    pub fn end_pan(&mut self) {
        self.pan = None;
    }

    pub fn zoom_at(&mut self, screen: Point, factor: f64) {
        self.viewport.zoom_at(screen, factor);
    }

    pub fn resize_viewport(&mut self, width: f64, height: f64) {
        self.viewport.resize(width, height);
    }

    pub fn screen_to_world(&self, screen: Point) -> Point {
        self.viewport.screen_to_world(screen)
    }

    // ----- clipboard -------------------------------------------------------

    /// Copies the selected person, text box or household.
    pub fn copy_selection(&mut self) -> bool {
        let entry = match &self.selection {
            Some(EntityRef::Person(id)) => self
                .store
                .person(id)
                .filter(|person| person.is_active())
                .cloned()
                .map(ClipboardEntry::Person),
            Some(EntityRef::TextBox(id)) => {
                self.store.text_box(id).cloned().map(ClipboardEntry::TextBox)
            }
            Some(EntityRef::Household(id)) => {
                self.store.household(id).cloned().map(ClipboardEntry::Household)
            }
            Some(EntityRef::Relationship(_)) | None => None,
        };
        let copied = entry.is_some();
        if copied {
            self.clipboard = entry;
        }
        copied
    }

    /// Inserts a copy of the clipboard entry one grid cell down-right.
    pub fn paste(&mut self) -> StoreResult<Option<EntityRef>> {
        let Some(entry) = self.clipboard.clone() else {
            return Ok(None);
        };
        let offset = self.settings.grid_size;
        let pasted = self.record(|store| {
            Ok(match entry {
                ClipboardEntry::Person(source) => {
                    let mut copy = source.clone();
                    copy.id = PersonId::generate();
                    copy.set_position(source.position().offset(offset, offset));
                    EntityRef::Person(store.add_person(copy)?)
                }
                ClipboardEntry::TextBox(source) => {
                    let mut copy = source.clone();
                    copy.id = TextBoxId::generate();
                    copy.set_position(source.position().offset(offset, offset));
                    EntityRef::TextBox(store.add_text_box(copy)?)
                }
                ClipboardEntry::Household(source) => {
                    let mut copy = source.clone();
                    copy.id = HouseholdId::generate();
                    for point in copy.points.iter_mut() {
                        *point = point.offset(offset, offset);
                    }
                    EntityRef::Household(store.add_household(copy)?)
                }
            })
        })?;
        self.selection = Some(pasted.clone());
        Ok(Some(pasted))
    }

    // ----- settings --------------------------------------------------------

    pub fn apply_settings(&mut self, patch: SettingsPatch) -> Result<(), SettingsError> {
        self.settings.apply(patch)?;
        self.history.set_limit(self.settings.history_limit);
        info!("event=settings_update module=editor status=ok");
        Ok(())
    }

    pub fn set_theme(&mut self, theme: Theme) {
        self.settings.theme = theme;
    }

    // ----- documents -------------------------------------------------------

    /// Resets to an empty genogram with a fresh history.
    pub fn new_genogram(&mut self) {
        self.cancel_gestures();
        self.store.new_genogram();
        self.metadata = GenogramMetadata::default();
        self.reset_session();
    }

    /// Replaces the session with a loaded document.
    pub fn load(&mut self, loaded: LoadedGenogram) -> LoadReport {
        self.cancel_gestures();
        // Already repaired by the loader; the second pass is a no-op.
        self.store.load_data(loaded.snapshot);
        self.store.mark_clean();
        self.metadata = loaded.metadata;
        self.reset_session();
        loaded.report
    }

    pub fn load_file(&mut self, raw: &str) -> FileResult<LoadReport> {
        Ok(self.load(file::from_file(raw)?))
    }

    pub fn load_value(&mut self, value: &Value) -> FileResult<LoadReport> {
        Ok(self.load(file::from_value(value)?))
    }

    fn reset_session(&mut self) {
        self.history.reset(self.store.snapshot());
        self.selection = None;
        self.context_target = None;
    }

    pub fn document(&self) -> GenogramDocument {
        file::to_document(&self.store.snapshot(), &self.metadata)
    }

    pub fn to_file(&self) -> FileResult<String> {
        file::to_file(&self.store.snapshot(), &self.metadata)
    }

    pub fn save_to<R: GenogramRepository + ?Sized>(&mut self, repo: &R, name: &str) -> RepoResult<()> {
        repo.save(name, &self.store.snapshot(), &self.metadata)?;
        self.store.mark_clean();
        Ok(())
    }

    pub fn load_from<R: GenogramRepository + ?Sized>(
        &mut self,
        repo: &R,
        name: &str,
    ) -> RepoResult<LoadReport> {
        let loaded = repo.load(name)?;
        Ok(self.load(loaded))
    }

    // ----- rendering -------------------------------------------------------

    /// Live scene with grid, bubbles and selection handles.
    pub fn scene(&self) -> Scene {
        export::build_scene(
            &self.store.snapshot(),
            &self.settings,
            &SceneOptions {
                show_grid: self.settings.snap_to_grid,
                show_bubbles: true,
                selection: self.selection.clone(),
            },
        )
    }

    pub fn export_svg(&self, transparent_background: bool) -> ExportResult<SvgExport> {
        export::export_svg(&self.store.snapshot(), &self.settings, transparent_background)
    }

    pub fn export_png(&self, transparent_background: bool) -> ExportResult<PngExport> {
        export::export_png(&self.store.snapshot(), &self.settings, transparent_background)
    }
}

#[cfg(test)]
mod tests {
    use super::{ClipboardEntry, Editor};
    use crate::interaction::{ConnectionSource, ConnectionTarget, DragTarget, Modifiers};
    use crate::model::geometry::Point;
    use crate::model::ids::EntityRef;
    use crate::model::person::Person;
    use crate::model::relationship::RelationshipType;

    #[test]
    fn every_edit_is_one_history_entry() {
        let mut editor = Editor::default();
        let a = editor.add_person(Person::new("A")).unwrap();
        editor.create_spouse_and_child(&a).unwrap();
        assert_eq!(editor.history().len(), 3);
        assert_eq!(editor.store().people().len(), 3);

        assert!(editor.undo());
        assert_eq!(editor.store().people().len(), 1);
        assert!(editor.redo());
        assert_eq!(editor.store().people().len(), 3);
    }

    #[test]
    fn failed_edit_records_nothing() {
        let mut editor = Editor::default();
        assert!(editor.delete_person(&"ghost".into()).is_err());
        assert_eq!(editor.history().len(), 1);
    }

    #[test]
    fn drag_end_records_only_when_moved() {
        let mut editor = Editor::default();
        let a = editor.add_person(Person::new("A")).unwrap();
        assert!(editor.begin_drag(DragTarget::Person(a.clone()), Point::new(0.0, 0.0)));
        assert!(!editor.end_drag());
        assert_eq!(editor.history().len(), 2);

        editor.begin_drag(DragTarget::Person(a.clone()), Point::new(0.0, 0.0));
        editor
            .update_drag(Point::new(15.0, 5.0), Modifiers::default())
            .unwrap();
        assert!(editor.end_drag());
        assert_eq!(editor.history().len(), 3);
    }

    #[test]
    fn cancel_drag_restores_position() {
        let mut editor = Editor::default();
        let a = editor.add_person(Person::new("A").at(10.0, 10.0)).unwrap();
        editor.begin_drag(DragTarget::Person(a.clone()), Point::new(10.0, 10.0));
        editor
            .update_drag(Point::new(90.0, 90.0), Modifiers::default())
            .unwrap();
        editor.cancel_drag();
        assert_eq!(editor.store().person(&a).unwrap().position(), Point::new(10.0, 10.0));
        assert_eq!(editor.history().len(), 2);
    }

    #[test]
    fn connection_completion_is_recorded() {
        let mut editor = Editor::default();
        let a = editor.add_person(Person::new("A")).unwrap();
        let b = editor.add_person(Person::new("B")).unwrap();
        editor
            .start_connection(ConnectionSource::Person(a), RelationshipType::Sibling)
            .unwrap();
        editor.complete_connection(ConnectionTarget::Person(b));
        assert_eq!(editor.store().relationships().len(), 1);
        assert_eq!(editor.history().len(), 4);
        assert!(!editor.connection().is_connecting());
    }

    #[test]
    fn paste_inserts_offset_copy_with_fresh_id() {
        let mut editor = Editor::default();
        let a = editor.add_person(Person::new("A").at(0.0, 0.0)).unwrap();
        assert!(editor.copy_selection());
        assert!(matches!(editor.clipboard(), Some(ClipboardEntry::Person(_))));

        let pasted = editor.paste().unwrap().unwrap();
        let EntityRef::Person(copy) = pasted else {
            panic!("expected a person");
        };
        assert_ne!(copy, a);
        assert_eq!(
            editor.store().person(&copy).unwrap().position(),
            Point::new(20.0, 20.0)
        );
    }

    #[test]
    fn undo_clears_selection_of_vanished_entity() {
        let mut editor = Editor::default();
        editor.add_person(Person::new("A")).unwrap();
        assert!(editor.selection().is_some());
        editor.undo();
        assert!(editor.selection().is_none());
    }
}
