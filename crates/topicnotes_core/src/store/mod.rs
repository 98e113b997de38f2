//! File-backed document store.
//!
//! # Responsibility
//! - Own the in-memory `Document` and its backing XML file.
//! - Serialize every read and write through one reader/writer lock.
//!
//! # Invariants
//! - The backing file exists after a successful `DocumentStore::load`.
//! - Every successful mutation is fully persisted before the lock is released.
//! - A failed persist leaves memory identical to the file on disk.

use std::error::Error;
use std::fmt::{Display, Formatter};

mod document_store;
pub mod xml;

pub use document_store::DocumentStore;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug)]
pub enum StoreError {
    Io(std::io::Error),
    Encode(String),
    Decode(String),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "{err}"),
            Self::Encode(message) => write!(f, "failed to encode document: {message}"),
            Self::Decode(message) => write!(f, "failed to decode document: {message}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Encode(_) | Self::Decode(_) => None,
        }
    }
}

impl From<std::io::Error> for StoreError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}
