//! Document persistence abstractions.
//!
//! # Responsibility
//! - Define the storage contract the editor saves and loads through.
//! - Isolate filesystem details from editing logic.
//!
//! # Invariants
//! - Repositories store whole documents; there is no partial update.
//! - Every load is sanitized by `file::from_file`.

pub mod document_repo;

pub use document_repo::{
    validate_document_name, FileGenogramRepository, GenogramRepository,
    MemoryGenogramRepository, RepoError, RepoResult,
};
