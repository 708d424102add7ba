//! Genogram document repository contracts and implementations.
//!
//! # Responsibility
//! - Persist named genogram documents (graph + metadata).
//! - Keep on-disk layout and encoding details out of the editor.
//!
//! # Invariants
//! - Document names are validated before touching storage.
//! - Loads go through `file::from_file`, so stored documents are sanitized
//!   exactly like user-supplied files.
//! - File writes replace the previous document atomically (temp + rename).

use crate::file::{from_file, to_file, FileError, GenogramMetadata, LoadedGenogram};
use crate::store::GraphSnapshot;
use log::{info, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

const DOCUMENT_EXTENSION: &str = "genogram.json";

static DOCUMENT_NAME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_\-]{0,127}$").expect("valid document name regex")
});

pub type RepoResult<T> = Result<T, RepoError>;

#[derive(Debug)]
pub enum RepoError {
    /// Name is empty or contains characters outside `[A-Za-z0-9_-]`.
    InvalidName(String),
    NotFound(String),
    Io { path: PathBuf, source: std::io::Error },
    File(FileError),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidName(name) => write!(f, "invalid document name: `{name}`"),
            Self::NotFound(name) => write!(f, "document not found: {name}"),
            Self::Io { path, source } => write!(f, "i/o error at `{}`: {source}", path.display()),
            Self::File(err) => write!(f, "{err}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::File(err) => Some(err),
            Self::InvalidName(_) | Self::NotFound(_) => None,
        }
    }
}

impl From<FileError> for RepoError {
    fn from(value: FileError) -> Self {
        Self::File(value)
    }
}

/// Validates a document name.
pub fn validate_document_name(name: &str) -> RepoResult<&str> {
    if DOCUMENT_NAME_RE.is_match(name) {
        Ok(name)
    } else {
        Err(RepoError::InvalidName(name.to_string()))
    }
}

/// Repository interface for named genogram documents.
pub trait GenogramRepository {
    fn save(
        &self,
        name: &str,
        snapshot: &GraphSnapshot,
        metadata: &GenogramMetadata,
    ) -> RepoResult<()>;
    fn load(&self, name: &str) -> RepoResult<LoadedGenogram>;
    /// Stored document names, sorted.
    fn list(&self) -> RepoResult<Vec<String>>;
    fn delete(&self, name: &str) -> RepoResult<()>;
}

/// One JSON file per document under a root directory.
pub struct FileGenogramRepository {
    root: PathBuf,
}

impl FileGenogramRepository {
    /// Opens (and creates when missing) the repository directory.
    pub fn open(root: impl AsRef<Path>) -> RepoResult<Self> {
        let root = root.as_ref().to_path_buf();
        std::fs::create_dir_all(&root).map_err(|source| RepoError::Io {
            path: root.clone(),
            source,
        })?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn document_path(&self, name: &str) -> RepoResult<PathBuf> {
        let name = validate_document_name(name)?;
        Ok(self.root.join(format!("{name}.{DOCUMENT_EXTENSION}")))
    }
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> RepoError + '_ {
    move |source| RepoError::Io {
        path: path.to_path_buf(),
        source,
    }
}

impl GenogramRepository for FileGenogramRepository {
    fn save(
        &self,
        name: &str,
        snapshot: &GraphSnapshot,
        metadata: &GenogramMetadata,
    ) -> RepoResult<()> {
        let path = self.document_path(name)?;
        let raw = to_file(snapshot, metadata)?;
        let temp = path.with_extension("json.tmp");
        std::fs::write(&temp, raw.as_bytes()).map_err(io_error(&temp))?;
        std::fs::rename(&temp, &path).map_err(io_error(&path))?;
        info!(
            "event=document_save module=repo status=ok bytes={}",
            raw.len()
        );
        Ok(())
    }

    fn load(&self, name: &str) -> RepoResult<LoadedGenogram> {
        let path = self.document_path(name)?;
        let raw = match std::fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                return Err(RepoError::NotFound(name.to_string()));
            }
            Err(err) => return Err(io_error(&path)(err)),
        };
        let loaded = from_file(&raw)?;
        if !loaded.report.is_clean() {
            warn!("event=document_load module=repo status=repaired");
        }
        Ok(loaded)
    }

    fn list(&self) -> RepoResult<Vec<String>> {
        let suffix = format!(".{DOCUMENT_EXTENSION}");
        let entries = std::fs::read_dir(&self.root).map_err(io_error(&self.root))?;
        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(io_error(&self.root))?;
            let file_name = entry.file_name();
            let Some(name) = file_name
                .to_str()
                .and_then(|file_name| file_name.strip_suffix(&suffix))
            else {
                continue;
            };
            if validate_document_name(name).is_ok() {
                names.push(name.to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    fn delete(&self, name: &str) -> RepoResult<()> {
        let path = self.document_path(name)?;
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => {
                Err(RepoError::NotFound(name.to_string()))
            }
            Err(err) => Err(io_error(&path)(err)),
        }
    }
}

/// In-process repository holding encoded documents.
#[derive(Debug, Default)]
pub struct MemoryGenogramRepository {
    documents: RefCell<BTreeMap<String, String>>,
}

impl MemoryGenogramRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw encoded document, as a file repository would store it.
    pub fn raw(&self, name: &str) -> Option<String> {
        self.documents.borrow().get(name).cloned()
    }
}

impl GenogramRepository for MemoryGenogramRepository {
    fn save(
        &self,
        name: &str,
        snapshot: &GraphSnapshot,
        metadata: &GenogramMetadata,
    ) -> RepoResult<()> {
        let name = validate_document_name(name)?;
        let raw = to_file(snapshot, metadata)?;
        self.documents.borrow_mut().insert(name.to_string(), raw);
        Ok(())
    }

    fn load(&self, name: &str) -> RepoResult<LoadedGenogram> {
        let name = validate_document_name(name)?;
        let documents = self.documents.borrow();
        let raw = documents
            .get(name)
            .ok_or_else(|| RepoError::NotFound(name.to_string()))?;
        Ok(from_file(raw)?)
    }

    fn list(&self) -> RepoResult<Vec<String>> {
        Ok(self.documents.borrow().keys().cloned().collect())
    }

    fn delete(&self, name: &str) -> RepoResult<()> {
        let name = validate_document_name(name)?;
        self.documents
            .borrow_mut()
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| RepoError::NotFound(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::{validate_document_name, GenogramRepository, MemoryGenogramRepository, RepoError};
    use crate::file::GenogramMetadata;
    use crate::model::person::Person;
    use crate::store::GraphSnapshot;

    #[test]
    fn names_reject_paths_and_blanks() {
        assert!(validate_document_name("case-42_a").is_ok());
        for bad in ["", "../etc", "a/b", ".hidden", "with space"] {
            assert!(matches!(
                validate_document_name(bad),
                Err(RepoError::InvalidName(_))
            ));
        }
    }

    #[test]
    fn memory_repo_round_trips_documents() {
        let repo = MemoryGenogramRepository::new();
        let snapshot =
            GraphSnapshot::new(vec![Person::new("A").at(1.5, 2.5)], vec![], vec![], vec![]);
        repo.save("case", &snapshot, &GenogramMetadata::default())
            .unwrap();

        assert_eq!(repo.list().unwrap(), vec!["case"]);
        assert_eq!(repo.load("case").unwrap().snapshot, snapshot);
        repo.delete("case").unwrap();
        assert!(matches!(repo.load("case"), Err(RepoError::NotFound(_))));
    }
}
