//! Genogram graph engine.
//! This crate is the single source of truth for family-graph invariants.

pub mod embed;
pub mod export;
pub mod file;
pub mod history;
pub mod interaction;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod settings;
pub mod store;

pub use embed::{EmbedError, EmbedSession, EngineMessage, HostMessage, OriginPolicy};
pub use export::{ExportError, ExportResult, PngExport, SvgExport};
pub use file::{
    from_file, to_file, FileError, FileResult, GenogramDocument, GenogramMetadata, LoadReport,
    LoadedGenogram,
};
pub use history::History;
pub use logging::{
    default_log_level, init_logging, init_stderr_logging, logging_status, LogTarget,
};
pub use model::annotation::{TextBox, TextBoxPatch};
pub use model::geometry::{Point, Rect};
pub use model::household::{Household, HouseholdPatch};
pub use model::ids::{EntityRef, HouseholdId, PersonId, RelationshipId, TextBoxId};
pub use model::person::{Gender, MemberStatus, NodeKind, Person, PersonPatch, SpecialStatus};
pub use model::relationship::{
    LineStyle, Relationship, RelationshipLink, RelationshipPatch, RelationshipType,
};
pub use repo::{
    FileGenogramRepository, GenogramRepository, MemoryGenogramRepository, RepoError, RepoResult,
};
pub use service::Editor;
pub use settings::{EditorSettings, SettingsError, SettingsPatch, Theme};
pub use store::{GraphSnapshot, GraphStore, StoreError, StoreResult};

/// Minimal health-check API for host integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
