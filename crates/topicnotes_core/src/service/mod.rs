//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate store and provider calls into note operations.
//! - Keep the RPC layer decoupled from storage details.

pub mod note_service;
