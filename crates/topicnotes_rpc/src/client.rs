//! Typed RPC client with a reusable retry policy.
//!
//! # Invariants
//! - Only transient transport failures are retried.
//! - A fault or an unparsable reply is a final answer.
//! - At most `RetryPolicy::max_attempts` requests are sent per call.

use crate::wire::{
    Fault, RpcRequest, RpcResponse, METHOD_GET_NOTES, METHOD_GET_TOPICS, METHOD_GET_WIKIPEDIA,
    METHOD_SAVE_NOTE,
};
use log::warn;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::future::Future;
use std::time::Duration;

const DEFAULT_MAX_ATTEMPTS: u32 = 3;
const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(500);
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Classifies an error for `RetryPolicy`.
pub trait Retryable {
    fn is_transient(&self) -> bool;
}

/// Bounded retry with linearly increasing backoff (`base_delay * attempt`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay: DEFAULT_BASE_DELAY,
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum RetryError<E> {
    /// Every attempt failed transiently; holds the last error.
    Exhausted { attempts: u32, last: E },
    /// A non-retryable error ended the loop early.
    Final(E),
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    /// Delay slept after failed attempt number `attempt` (1-based).
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.base_delay * attempt
    }

    /// Runs `op` until it succeeds, fails permanently, or attempts run out.
    ///
    /// `op` receives the 1-based attempt number.
    pub async fn run<T, E, F, Fut>(&self, mut op: F) -> Result<T, RetryError<E>>
    where
        E: Retryable + Display,
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match op(attempt).await {
                Ok(value) => return Ok(value),
                Err(err) if !err.is_transient() => return Err(RetryError::Final(err)),
                Err(err) if attempt >= max_attempts => {
                    return Err(RetryError::Exhausted {
                        attempts: attempt,
                        last: err,
                    })
                }
                Err(err) => {
                    warn!(
                        "event=rpc_retry module=client status=retry attempt={}/{} error={}",
                        attempt, max_attempts, err
                    );
                    tokio::time::sleep(self.delay_after(attempt)).await;
                    attempt += 1;
                }
            }
        }
    }
}

/// Failure of one remote call.
#[derive(Debug)]
pub enum CallError {
    /// Could not reach the server or it did not answer in time.
    Transport(reqwest::Error),
    /// Server answered with a non-success HTTP status.
    Status(u16),
    /// Server-raised fault; never retried.
    Fault(Fault),
    /// Reply did not match the expected shape.
    Protocol(String),
    /// All attempts failed transiently.
    Exhausted { attempts: u32, last: Box<CallError> },
}

impl Retryable for CallError {
    fn is_transient(&self) -> bool {
        match self {
            Self::Transport(err) => err.is_connect() || err.is_timeout() || err.is_request(),
            Self::Status(code) => matches!(*code, 502..=504),
            Self::Fault(_) | Self::Protocol(_) | Self::Exhausted { .. } => false,
        }
    }
}

impl Display for CallError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Transport(err) => write!(f, "transport error: {err}"),
            Self::Status(code) => write!(f, "server returned HTTP {code}"),
            Self::Fault(fault) => write!(f, "Server error: {fault}"),
            Self::Protocol(message) => write!(f, "protocol error: {message}"),
            Self::Exhausted { attempts, .. } => write!(f, "Failed after {attempts} attempts"),
        }
    }
}

impl Error for CallError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Transport(err) => Some(err),
            Self::Exhausted { last, .. } => Some(last.as_ref()),
            _ => None,
        }
    }
}

impl From<RetryError<CallError>> for CallError {
    fn from(value: RetryError<CallError>) -> Self {
        match value {
            RetryError::Exhausted { attempts, last } => Self::Exhausted {
                attempts,
                last: Box::new(last),
            },
            RetryError::Final(err) => err,
        }
    }
}

/// A list result, or the message the server sent instead.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum Reply<T> {
    Items(T),
    Message(String),
}

/// One `[name, text, timestamp]` row from `getnotes`.
pub type NoteRow = (String, String, String);

pub struct RpcClient {
    url: String,
    client: reqwest::Client,
    policy: RetryPolicy,
}

impl RpcClient {
    /// Creates a client for `url` (e.g. `http://127.0.0.1:3000/RPC2`).
    pub fn new(url: &str) -> Result<Self, CallError> {
        Self::with_policy(url, RetryPolicy::default())
    }

    pub fn with_policy(url: &str, policy: RetryPolicy) -> Result<Self, CallError> {
        // No idle pooling: every attempt opens a fresh connection.
        let client = reqwest::Client::builder()
            .timeout(DEFAULT_REQUEST_TIMEOUT)
            .pool_max_idle_per_host(0)
            .build()
            .map_err(CallError::Transport)?;
        Ok(Self {
            url: url.to_string(),
            client,
            policy,
        })
    }

    /// Invokes `method` with positional `params`, retrying transient failures.
    pub async fn call(&self, method: &str, params: Vec<Value>) -> Result<Value, CallError> {
        let request = RpcRequest::new(method, params);
        let request = &request;
        let client = self;
        self.policy
            .run(move |_attempt| client.send_once(request))
            .await
            .map_err(CallError::from)
    }

    async fn send_once(&self, request: &RpcRequest) -> Result<Value, CallError> {
        let resp = self
            .client
            .post(&self.url)
            .json(request)
            .send()
            .await
            .map_err(CallError::Transport)?;

        if !resp.status().is_success() {
            return Err(CallError::Status(resp.status().as_u16()));
        }

        let body: RpcResponse = resp
            .json()
            .await
            .map_err(|e| CallError::Protocol(format!("unreadable reply: {e}")))?;
        match body {
            RpcResponse::Result(value) => Ok(value),
            RpcResponse::Fault(fault) => Err(CallError::Fault(fault)),
        }
    }

    async fn call_typed<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Vec<Value>,
    ) -> Result<T, CallError> {
        let value = self.call(method, params).await?;
        serde_json::from_value(value)
            .map_err(|e| CallError::Protocol(format!("unexpected {method} result: {e}")))
    }

    pub async fn save_note(
        &self,
        topic: &str,
        note: &str,
        text: &str,
        date: &str,
    ) -> Result<String, CallError> {
        let params = [topic, note, text, date]
            .into_iter()
            .map(|value| Value::String(value.to_string()))
            .collect();
        self.call_typed(METHOD_SAVE_NOTE, params).await
    }

    pub async fn get_notes(&self, topic: &str) -> Result<Reply<Vec<NoteRow>>, CallError> {
        self.call_typed(METHOD_GET_NOTES, vec![Value::String(topic.to_string())])
            .await
    }

    pub async fn get_topics(&self) -> Result<Reply<Vec<String>>, CallError> {
        self.call_typed(METHOD_GET_TOPICS, Vec::new()).await
    }

    pub async fn get_wikipedia(&self, topic: &str) -> Result<String, CallError> {
        self.call_typed(METHOD_GET_WIKIPEDIA, vec![Value::String(topic.to_string())])
            .await
    }
}
