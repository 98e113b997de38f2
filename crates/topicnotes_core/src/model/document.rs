//! Topic/note document tree.
//!
//! # Responsibility
//! - Hold the ordered topic collection and each topic's ordered notes.
//! - Provide lookup and find-or-create primitives used by the store.
//!
//! # Invariants
//! - `upsert_topic` never creates a second topic with an existing name.
//! - Topic and note order is insertion order; nothing is ever sorted.
//!
//! The serde attributes describe the XML shape written to disk:
//! `<data><topic name=".."><note name=".."><text/><timestamp/></note></topic></data>`.

use serde::{Deserialize, Serialize};

/// Root of the persisted store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename = "data")]
pub struct Document {
    #[serde(rename = "topic", default)]
    topics: Vec<Topic>,
}

/// Named group of notes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topic {
    #[serde(rename = "@name")]
    name: String,
    #[serde(rename = "note", default)]
    notes: Vec<Note>,
}

/// One saved record under a topic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    /// Label only; several notes may share it.
    #[serde(rename = "@name")]
    pub name: String,
    pub text: String,
    /// Formatted as `DD/MM/YYYY HH:MM:SS`.
    pub timestamp: String,
}

impl Note {
    pub fn new(
        name: impl Into<String>,
        text: impl Into<String>,
        timestamp: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
            timestamp: timestamp.into(),
        }
    }
}

impl Topic {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            notes: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Notes in the order they were saved.
    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn append_note(&mut self, note: Note) {
        self.notes.push(note);
    }

    fn pop_note(&mut self) -> Option<Note> {
        self.notes.pop()
    }
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn topics(&self) -> &[Topic] {
        &self.topics
    }

    pub fn topic_names(&self) -> Vec<String> {
        self.topics.iter().map(|topic| topic.name.clone()).collect()
    }

    /// Linear scan by exact name; returns the first match.
    pub fn find_topic(&self, name: &str) -> Option<&Topic> {
        self.topics.iter().find(|topic| topic.name == name)
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.topics.iter().position(|topic| topic.name == name)
    }

    /// Finds a topic or appends a new one at the end.
    ///
    /// Returns the topic index and whether it was created by this call.
    pub fn upsert_topic(&mut self, name: &str) -> (usize, bool) {
        match self.position(name) {
            Some(index) => (index, false),
            None => {
                self.topics.push(Topic::new(name));
                (self.topics.len() - 1, true)
            }
        }
    }

    pub fn topic_mut(&mut self, index: usize) -> Option<&mut Topic> {
        self.topics.get_mut(index)
    }

    /// Undoes an `upsert_topic` + `append_note` pair whose persistence failed.
    pub(crate) fn revert_append(&mut self, index: usize, created_topic: bool) {
        if created_topic && index + 1 == self.topics.len() {
            self.topics.pop();
        } else if let Some(topic) = self.topics.get_mut(index) {
            topic.pop_note();
        }
    }

    pub(crate) fn remove_last_topic(&mut self) {
        self.topics.pop();
    }

    pub fn note_count(&self) -> usize {
        self.topics.iter().map(|topic| topic.notes.len()).sum()
    }
}
