//! Document model for topic/note records.
//!
//! # Responsibility
//! - Define the in-memory tree persisted by the document store.
//! - Define the loosely-typed argument shape received from RPC callers.
//! - Own the fixed `DD/MM/YYYY HH:MM:SS` timestamp format.
//!
//! # Invariants
//! - Topic names are unique within a document; first match wins.
//! - Notes are append-only and keep insertion order.

pub mod document;
pub mod param;
pub mod timestamp;
