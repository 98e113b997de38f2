//! Remote call surface for topicnotes.
//!
//! # Responsibility
//! - Define the JSON request/response envelope shared by server and client.
//! - Serve the four note operations over HTTP, one task per request.
//! - Provide a client that retries transient transport failures.
//!
//! # Invariants
//! - Service errors travel as plain result strings, never as faults.
//! - Faults are reserved for dispatch problems (unknown method, arity,
//!   unparsable body) and are never retried by the client.

pub mod client;
pub mod server;
pub mod wire;

pub use client::{CallError, Reply, RetryError, RetryPolicy, Retryable, RpcClient};
pub use server::{router, serve, DEFAULT_RPC_PATH};
pub use wire::{
    Fault, RpcRequest, RpcResponse, METHOD_GET_NOTES, METHOD_GET_TOPICS, METHOD_GET_WIKIPEDIA,
    METHOD_SAVE_NOTE,
};
