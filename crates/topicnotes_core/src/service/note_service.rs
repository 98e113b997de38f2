//! Note use-case service.
//!
//! # Responsibility
//! - Validate caller input for the four note operations.
//! - Route all document access through `DocumentStore`.
//! - Couple the encyclopedia lookup to an internal `save_note` call.
//!
//! # Invariants
//! - Validation order is fixed; the first failing rule decides the error.
//! - Every failure is a `NoteServiceError` whose `Display` is the exact
//!   caller-facing message; nothing panics across the service boundary.
//! - Enrichment goes through `save_note`, sharing its validation and
//!   persistence path.

use crate::enrich::EncyclopediaProvider;
use crate::model::document::Note;
use crate::model::param::Param;
use crate::model::timestamp::{is_valid_timestamp, now_timestamp};
use crate::store::DocumentStore;
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

/// Body stored for notes created by the Wikipedia enrichment.
///
/// Wikimedia disables opensearch descriptions, so only the URL is useful.
pub const ENRICHMENT_NOTE_TEXT: &str = "description is disabled by wikimedia";

pub type ServiceResult<T> = Result<T, NoteServiceError>;

/// Rejected caller input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    EmptyNoteFields,
    NonTextNoteFields,
    /// Characters XML 1.0 cannot represent, so the saved file would not reload.
    ControlCharacters,
    InvalidDate,
    EmptyTopic,
    NonTextTopic,
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let message = match self {
            Self::EmptyNoteFields => "Topic, Note or Text cannot be empty",
            Self::NonTextNoteFields => "Topic, Note and Text should be strings",
            Self::ControlCharacters => "Topic, Note and Text cannot contain control characters",
            Self::InvalidDate => "Incorrect date format, should be DD/MM/YYYY HH:MM:SS",
            Self::EmptyTopic => "Topic cannot be empty",
            Self::NonTextTopic => "Topic should be a string",
        };
        f.write_str(message)
    }
}

impl Error for ValidationError {}

/// Service operation, used to prefix internal failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    SaveNote,
    GetNotes,
    GetTopics,
    GetWikipedia,
}

impl Operation {
    fn activity(self) -> &'static str {
        match self {
            Self::SaveNote => "saving note",
            Self::GetNotes => "getting notes",
            Self::GetTopics => "getting topics",
            Self::GetWikipedia => "getting wikipedia information",
        }
    }
}

/// Typed outcome of a failed note operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoteServiceError {
    Invalid(ValidationError),
    /// `get_notes` on a topic that was never saved.
    NoNotesFound,
    /// The encyclopedia had no page for the topic.
    NoWikipediaPage,
    /// Unexpected failure while performing `operation`.
    Internal { operation: Operation, detail: String },
}

impl NoteServiceError {
    pub fn internal(operation: Operation, detail: impl Display) -> Self {
        Self::Internal {
            operation,
            detail: detail.to_string(),
        }
    }

    /// Stable label for log lines.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Invalid(_) => "validation",
            Self::NoNotesFound | Self::NoWikipediaPage => "not_found",
            Self::Internal { .. } => "internal",
        }
    }
}

impl Display for NoteServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Invalid(err) => write!(f, "{err}"),
            Self::NoNotesFound => f.write_str("No notes found"),
            Self::NoWikipediaPage => f.write_str("No Wikipedia information found"),
            Self::Internal { operation, detail } => {
                write!(f, "Error {}: {detail}", operation.activity())
            }
        }
    }
}

impl Error for NoteServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Invalid(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ValidationError> for NoteServiceError {
    fn from(value: ValidationError) -> Self {
        Self::Invalid(value)
    }
}

/// Note service facade over the shared document store.
pub struct NoteService<P: EncyclopediaProvider> {
    store: Arc<DocumentStore>,
    provider: P,
}

impl<P: EncyclopediaProvider> NoteService<P> {
    pub fn new(store: Arc<DocumentStore>, provider: P) -> Self {
        Self { store, provider }
    }

    /// Saves one note, creating its topic on first use.
    ///
    /// Topic, note name and text are stored trimmed.
    pub fn save_note(
        &self,
        topic: impl Into<Param>,
        note: impl Into<Param>,
        text: impl Into<Param>,
        date: impl Into<Param>,
    ) -> ServiceResult<Note> {
        let (topic, note, text, date) = (topic.into(), note.into(), text.into(), date.into());
        let result = self.save_note_inner(&topic, &note, &text, &date);
        log_outcome("note_save", &result);
        result
    }

    fn save_note_inner(
        &self,
        topic: &Param,
        note: &Param,
        text: &Param,
        date: &Param,
    ) -> ServiceResult<Note> {
        if topic.is_blank() || note.is_blank() || text.is_blank() {
            return Err(ValidationError::EmptyNoteFields.into());
        }
        let (Some(topic), Some(note), Some(text)) = (topic.as_text(), note.as_text(), text.as_text())
        else {
            return Err(ValidationError::NonTextNoteFields.into());
        };
        if [topic, note, text].iter().any(|value| has_forbidden_control(value)) {
            return Err(ValidationError::ControlCharacters.into());
        }
        let date = date
            .as_text()
            .filter(|value| is_valid_timestamp(value))
            .ok_or(ValidationError::InvalidDate)?;

        let record = Note::new(note.trim(), text.trim(), date);
        self.store
            .append_note(topic.trim(), record.clone())
            .map_err(|err| NoteServiceError::internal(Operation::SaveNote, err))?;
        Ok(record)
    }

    /// Lists the notes of one topic in the order they were saved.
    pub fn get_notes(&self, topic: impl Into<Param>) -> ServiceResult<Vec<Note>> {
        let topic = topic.into();
        let result = validate_topic(&topic).and_then(|topic| {
            self.store
                .list_notes(topic.trim())
                .ok_or(NoteServiceError::NoNotesFound)
        });
        log_outcome("notes_get", &result);
        result
    }

    /// Lists every topic name; an empty store yields an empty list.
    pub fn get_topics(&self) -> ServiceResult<Vec<String>> {
        Ok(self.store.list_topics())
    }

    /// Looks up `topic` in the encyclopedia and records the page as a note.
    ///
    /// Returns the page URL. The internal save is best-effort: its outcome
    /// is logged, not returned. The save blocks on the store; async servers
    /// should call `find_wikipedia_page` and `record_wikipedia_page`
    /// separately and run the second one on a blocking thread.
    pub async fn get_wikipedia_info(&self, topic: impl Into<Param>) -> ServiceResult<String> {
        let page = self.find_wikipedia_page(topic).await?;
        Ok(self.record_wikipedia_page(page))
    }

    /// Validates `topic` and resolves its page URL without touching the store.
    pub async fn find_wikipedia_page(
        &self,
        topic: impl Into<Param>,
    ) -> ServiceResult<WikipediaPage> {
        let topic = topic.into();
        let result = self.find_wikipedia_page_inner(&topic).await;
        if result.is_err() {
            log_outcome("wikipedia_get", &result);
        }
        result
    }

    async fn find_wikipedia_page_inner(&self, topic: &Param) -> ServiceResult<WikipediaPage> {
        let topic = validate_topic(topic)?;
        let url = self
            .provider
            .lookup(topic)
            .await
            .map_err(|err| NoteServiceError::internal(Operation::GetWikipedia, err))?
            .ok_or(NoteServiceError::NoWikipediaPage)?;
        Ok(WikipediaPage {
            topic: topic.to_string(),
            url,
        })
    }

    /// Saves `page` as a note through `save_note` and returns its URL.
    pub fn record_wikipedia_page(&self, page: WikipediaPage) -> String {
        let WikipediaPage { topic, url } = page;
        if let Err(err) =
            self.save_note(topic, url.as_str(), ENRICHMENT_NOTE_TEXT, now_timestamp())
        {
            warn!(
                "event=wikipedia_note module=service status=error kind={} error={}",
                err.kind(),
                err
            );
        }
        info!("event=wikipedia_get module=service status=ok");
        url
    }
}

/// Encyclopedia page found for a topic, not yet recorded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WikipediaPage {
    pub topic: String,
    pub url: String,
}

// XML 1.0 allows only tab, line feed and carriage return below U+0020.
fn has_forbidden_control(value: &str) -> bool {
    value
        .chars()
        .any(|c| {
            (c < ' ' && !matches!(c, '\t' | '\n' | '\r')) || matches!(c, '\u{FFFE}' | '\u{FFFF}')
        })
}

fn validate_topic(topic: &Param) -> ServiceResult<&str> {
    if topic.is_blank() {
        return Err(ValidationError::EmptyTopic.into());
    }
    topic
        .as_text()
        .ok_or(NoteServiceError::Invalid(ValidationError::NonTextTopic))
}

fn log_outcome<T>(event: &str, result: &ServiceResult<T>) {
    match result {
        Ok(_) => info!("event={event} module=service status=ok"),
        Err(err) => info!(
            "event={event} module=service status=rejected kind={}",
            err.kind()
        ),
    }
}
