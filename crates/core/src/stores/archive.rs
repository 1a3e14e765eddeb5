//! File-backed response archive.
//!
//! Each document lives at `<root>/<s1>/<s2>/<query_id>/response.yaml`, where `s1`/`s2` are the
//! first two pairs of hex characters of the query id. The query id is the directory name, so
//! there is at most one document per query.

use super::{ResponseArchive, ResponseDocument};
use crate::constants::RESPONSE_DOCUMENT_FILENAME;
use crate::error::ArchiveError;
use quackhub_uuid::RecordId;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

#[derive(Clone, Debug)]
pub struct FileResponseArchive {
    root: PathBuf,
}

impl FileResponseArchive {
    /// Creates an archive rooted at `root`. The directory is created on first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn document_path(&self, query_id: &RecordId) -> PathBuf {
        query_id
            .sharded_dir(&self.root)
            .join(RESPONSE_DOCUMENT_FILENAME)
    }

    /// Creates the document directory for `query_id`.
    ///
    /// A directory left behind without a document (for example by an interrupted write) is
    /// reused.
    fn create_document_dir(&self, query_id: &RecordId) -> Result<PathBuf, ArchiveError> {
        let dir = query_id.sharded_dir(&self.root);

        if let Some(parent) = dir.parent() {
            fs::create_dir_all(parent).map_err(ArchiveError::StorageDirCreation)?;
        }

        match fs::create_dir(&dir) {
            Ok(()) => Ok(dir),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                if dir.join(RESPONSE_DOCUMENT_FILENAME).exists() {
                    Err(ArchiveError::DuplicateDocument(*query_id))
                } else {
                    Ok(dir)
                }
            }
            Err(e) => Err(ArchiveError::StorageDirCreation(e)),
        }
    }

    fn write_document(dir: &Path, document: &ResponseDocument) -> Result<(), ArchiveError> {
        let yaml = serde_yaml::to_string(document).map_err(ArchiveError::YamlSerialization)?;

        let tmp = dir.join(format!("{RESPONSE_DOCUMENT_FILENAME}.tmp"));
        fs::write(&tmp, yaml).map_err(ArchiveError::FileWrite)?;
        fs::rename(&tmp, dir.join(RESPONSE_DOCUMENT_FILENAME)).map_err(ArchiveError::FileWrite)
    }
}

/// Lists subdirectories of `dir`. A missing directory has none.
fn subdirs(dir: &Path) -> Result<Vec<PathBuf>, ArchiveError> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(ArchiveError::FileRead(e)),
    };

    let mut dirs = Vec::new();
    for entry in entries {
        let entry = entry.map_err(ArchiveError::FileRead)?;
        if entry.file_type().map_err(ArchiveError::FileRead)?.is_dir() {
            dirs.push(entry.path());
        }
    }
    Ok(dirs)
}

impl ResponseArchive for FileResponseArchive {
    fn insert(&self, document: &ResponseDocument) -> Result<(), ArchiveError> {
        let dir = self.create_document_dir(&document.query_id)?;

        if let Err(write_error) = Self::write_document(&dir, document) {
            if let Err(cleanup_error) = fs::remove_dir_all(&dir) {
                return Err(ArchiveError::CleanupAfterWriteFailed {
                    path: dir,
                    write_error: Box::new(write_error),
                    cleanup_error,
                });
            }
            return Err(write_error);
        }

        Ok(())
    }

    fn find_by_query(&self, query_id: &RecordId) -> Result<Option<ResponseDocument>, ArchiveError> {
        let raw = match fs::read_to_string(self.document_path(query_id)) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(ArchiveError::FileRead(e)),
        };

        serde_yaml::from_str(&raw)
            .map(Some)
            .map_err(ArchiveError::YamlDeserialization)
    }

    fn count(&self) -> Result<u64, ArchiveError> {
        let mut count = 0;
        for s1 in subdirs(&self.root)? {
            for s2 in subdirs(&s1)? {
                for doc_dir in subdirs(&s2)? {
                    if doc_dir.join(RESPONSE_DOCUMENT_FILENAME).is_file() {
                        count += 1;
                    }
                }
            }
        }
        Ok(count)
    }
}
