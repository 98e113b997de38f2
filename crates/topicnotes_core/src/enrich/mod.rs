//! External encyclopedia lookups used to enrich topics.
//!
//! # Responsibility
//! - Define the provider seam the note service depends on.
//! - Ship the Wikipedia opensearch implementation.
//!
//! # Invariants
//! - Lookups are bounded by a request timeout; a hang surfaces as an error.
//! - "Nothing found" is `Ok(None)`, never an error.

use async_trait::async_trait;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod wikipedia;

pub use wikipedia::{WikipediaClient, DEFAULT_WIKIPEDIA_ENDPOINT};

/// Source of a single reference URL for a topic.
#[async_trait]
pub trait EncyclopediaProvider: Send + Sync {
    /// Returns the best matching page URL, if any.
    async fn lookup(&self, topic: &str) -> Result<Option<String>, LookupError>;
}

#[derive(Debug)]
pub enum LookupError {
    /// Transport failure, including timeouts.
    Http(reqwest::Error),
    /// Provider answered with a non-success status.
    Status(u16),
    /// Response body did not have the expected shape.
    Malformed(String),
}

impl Display for LookupError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Http(err) if err.is_timeout() => write!(f, "lookup timed out: {err}"),
            Self::Http(err) => write!(f, "{err}"),
            Self::Status(code) => write!(f, "provider returned HTTP {code}"),
            Self::Malformed(message) => write!(f, "malformed provider response: {message}"),
        }
    }
}

impl Error for LookupError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Http(err) => Some(err),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for LookupError {
    fn from(value: reqwest::Error) -> Self {
        Self::Http(value)
    }
}
