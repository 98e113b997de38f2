//! Core domain logic for topicnotes.
//! This crate owns the document model, its file store and the note operations.

pub mod enrich;
pub mod logging;
pub mod model;
pub mod service;
pub mod store;

pub use enrich::{EncyclopediaProvider, LookupError, WikipediaClient, DEFAULT_WIKIPEDIA_ENDPOINT};
pub use logging::{default_log_level, init_logging, LogSink, LoggingError};
pub use model::document::{Document, Note, Topic};
pub use model::param::Param;
pub use model::timestamp::{is_valid_timestamp, now_timestamp, TIMESTAMP_FORMAT};
pub use service::note_service::{
    NoteService, NoteServiceError, Operation, ServiceResult, ValidationError, WikipediaPage,
    ENRICHMENT_NOTE_TEXT,
};
pub use store::{DocumentStore, StoreError, StoreResult};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
