//! Lock-guarded document with write-through persistence.
//!
//! # Invariants
//! - `append_note` holds the write lock across topic lookup, append and the
//!   full-file rewrite, so concurrent saves never interleave.
//! - Readers take the read lock and never observe a half-applied mutation.
//! - The file is replaced by rename; a crash mid-write keeps the old file.

use super::{xml, StoreError, StoreResult};
use crate::model::document::{Document, Note, Topic};
use log::{error, info, warn};
use parking_lot::RwLock;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tempfile::NamedTempFile;

/// Single owner of the document tree and its backing file.
#[derive(Debug)]
pub struct DocumentStore {
    path: PathBuf,
    document: RwLock<Document>,
}

impl DocumentStore {
    /// Loads the backing file, replacing it with an empty document when it
    /// is missing or malformed.
    ///
    /// # Errors
    /// - Returns `StoreError::Io` when the file cannot be read for reasons
    ///   other than absence, or when the replacement cannot be written.
    pub fn load(path: impl AsRef<Path>) -> StoreResult<Self> {
        let started_at = Instant::now();
        let path = path.as_ref().to_path_buf();
        info!(
            "event=store_load module=store status=start path={}",
            path.display()
        );

        let document = match read_document(&path) {
            Ok(Some(document)) => document,
            Ok(None) => {
                info!(
                    "event=store_load module=store status=recreate reason=missing path={}",
                    path.display()
                );
                recreate(&path)?
            }
            Err(StoreError::Decode(message)) => {
                warn!(
                    "event=store_load module=store status=recreate reason=malformed path={} error={}",
                    path.display(),
                    message
                );
                recreate(&path)?
            }
            Err(err) => {
                error!(
                    "event=store_load module=store status=error duration_ms={} path={} error={}",
                    started_at.elapsed().as_millis(),
                    path.display(),
                    err
                );
                return Err(err);
            }
        };

        info!(
            "event=store_load module=store status=ok duration_ms={} topics={} notes={}",
            started_at.elapsed().as_millis(),
            document.topics().len(),
            document.note_count()
        );

        Ok(Self {
            path,
            document: RwLock::new(document),
        })
    }

    /// Backing file location.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns a copy of the first topic named exactly `name`.
    pub fn find_topic(&self, name: &str) -> Option<Topic> {
        self.document.read().find_topic(name).cloned()
    }

    /// Finds or creates a topic, persisting when it was created.
    pub fn upsert_topic(&self, name: &str) -> StoreResult<Topic> {
        let mut document = self.document.write();
        let (index, created) = document.upsert_topic(name);
        if created {
            if let Err(err) = persist(&self.path, &document) {
                document.remove_last_topic();
                return Err(err);
            }
        }
        document
            .topics()
            .get(index)
            .cloned()
            .ok_or_else(|| StoreError::Encode(format!("topic `{name}` vanished after upsert")))
    }

    /// Appends one note under `topic` (created on demand) and rewrites the file.
    pub fn append_note(&self, topic: &str, note: Note) -> StoreResult<()> {
        let started_at = Instant::now();
        let mut document = self.document.write();
        let (index, created) = document.upsert_topic(topic);
        match document.topic_mut(index) {
            Some(entry) => entry.append_note(note),
            None => {
                return Err(StoreError::Encode(format!(
                    "topic index {index} out of range after upsert"
                )))
            }
        }

        if let Err(err) = persist(&self.path, &document) {
            document.revert_append(index, created);
            error!(
                "event=note_append module=store status=error duration_ms={} error={}",
                started_at.elapsed().as_millis(),
                err
            );
            return Err(err);
        }

        info!(
            "event=note_append module=store status=ok duration_ms={} created_topic={}",
            started_at.elapsed().as_millis(),
            created
        );
        Ok(())
    }

    /// Notes under `topic` in insertion order; `None` when the topic is unknown.
    pub fn list_notes(&self, topic: &str) -> Option<Vec<Note>> {
        self.document
            .read()
            .find_topic(topic)
            .map(|entry| entry.notes().to_vec())
    }

    /// Topic names in insertion order.
    pub fn list_topics(&self) -> Vec<String> {
        self.document.read().topic_names()
    }

    /// Consistent copy of the whole document.
    pub fn snapshot(&self) -> Document {
        self.document.read().clone()
    }
}

fn read_document(path: &Path) -> StoreResult<Option<Document>> {
    match fs::read_to_string(path) {
        Ok(source) => xml::decode(&source).map(Some),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
        Err(err) if err.kind() == ErrorKind::InvalidData => {
            Err(StoreError::Decode(format!("file is not valid UTF-8: {err}")))
        }
        Err(err) => Err(err.into()),
    }
}

fn recreate(path: &Path) -> StoreResult<Document> {
    if let Some(parent) = parent_dir(path) {
        fs::create_dir_all(parent)?;
    }
    let document = Document::new();
    persist(path, &document)?;
    Ok(document)
}

fn persist(path: &Path, document: &Document) -> StoreResult<()> {
    let encoded = xml::encode(document)?;
    let dir = parent_dir(path).unwrap_or_else(|| Path::new("."));
    let mut file = NamedTempFile::new_in(dir)?;
    file.write_all(encoded.as_bytes())?;
    file.as_file().sync_all()?;
    file.persist(path).map_err(|err| StoreError::Io(err.error))?;
    Ok(())
}

fn parent_dir(path: &Path) -> Option<&Path> {
    path.parent().filter(|parent| !parent.as_os_str().is_empty())
}

#[cfg(test)]
mod tests {
    use super::DocumentStore;
    use crate::model::document::Note;
    use std::fs;

    #[test]
    fn load_creates_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("database.xml");

        let store = DocumentStore::load(&path).unwrap();

        assert!(path.exists());
        assert!(store.list_topics().is_empty());
    }

    #[test]
    fn load_replaces_corrupt_file_with_empty_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("database.xml");
        fs::write(&path, "<data><topic name=\"broken\">").unwrap();

        let store = DocumentStore::load(&path).unwrap();

        assert!(store.list_topics().is_empty());
        let rewritten = fs::read_to_string(&path).unwrap();
        assert!(!rewritten.contains("broken"));
    }

    #[test]
    fn load_replaces_non_utf8_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("database.xml");
        fs::write(&path, [0xff, 0xfe, 0x00, 0x80]).unwrap();

        let store = DocumentStore::load(&path).unwrap();
        assert!(store.list_topics().is_empty());
    }

    #[test]
    fn upsert_topic_persists_only_new_topics() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("database.xml");
        let store = DocumentStore::load(&path).unwrap();

        store.upsert_topic("alpha").unwrap();
        store.upsert_topic("alpha").unwrap();

        assert_eq!(store.list_topics(), vec!["alpha".to_string()]);
        let reloaded = DocumentStore::load(&path).unwrap();
        assert_eq!(reloaded.list_topics(), vec!["alpha".to_string()]);
    }

    #[test]
    fn failed_persist_rolls_back_append() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("database.xml");
        let store = DocumentStore::load(&path).unwrap();
        store
            .append_note("kept", Note::new("n", "t", "01/01/2024 00:00:00"))
            .unwrap();

        // Removing the directory makes the temp file creation fail.
        drop(dir);

        let result = store.append_note("lost", Note::new("n", "t", "01/01/2024 00:00:00"));
        assert!(result.is_err());
        assert_eq!(store.list_topics(), vec!["kept".to_string()]);
        assert!(store.find_topic("lost").is_none());
    }
}
