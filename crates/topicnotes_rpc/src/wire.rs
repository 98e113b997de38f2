//! JSON envelope and result rendering.
//!
//! Request: `{"method": "saveNote", "params": ["topic", "note", "text", "date"]}`.
//! Response: `{"result": <value>}` or `{"fault": {"code": -32601, "message": "..."}}`.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt::{Display, Formatter};
use topicnotes_core::{Note, ServiceResult};

pub const METHOD_SAVE_NOTE: &str = "saveNote";
pub const METHOD_GET_NOTES: &str = "getnotes";
pub const METHOD_GET_TOPICS: &str = "getTopics";
pub const METHOD_GET_WIKIPEDIA: &str = "getwikipedia";

pub const SAVE_OK_MESSAGE: &str = "Note saved successfully";
pub const WIKIPEDIA_PAGE_PREFIX: &str = "Topics wikipedia page ";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcRequest {
    pub method: String,
    #[serde(default)]
    pub params: Vec<Value>,
}

impl RpcRequest {
    pub fn new(method: impl Into<String>, params: Vec<Value>) -> Self {
        Self {
            method: method.into(),
            params,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RpcResponse {
    Result(Value),
    Fault(Fault),
}

/// Dispatch-level failure raised by the server itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fault {
    pub code: i32,
    pub message: String,
}

impl Fault {
    pub const PARSE_ERROR: i32 = -32700;
    pub const METHOD_NOT_FOUND: i32 = -32601;
    pub const INVALID_PARAMS: i32 = -32602;

    pub fn parse_error(detail: impl Display) -> Self {
        Self {
            code: Self::PARSE_ERROR,
            message: format!("request body is not a valid call: {detail}"),
        }
    }

    pub fn method_not_found(method: &str) -> Self {
        Self {
            code: Self::METHOD_NOT_FOUND,
            message: format!("method \"{method}\" is not supported"),
        }
    }

    pub fn invalid_params(method: &str, expected: usize, got: usize) -> Self {
        Self {
            code: Self::INVALID_PARAMS,
            message: format!("{method}() takes {expected} positional arguments but {got} were given"),
        }
    }
}

impl Display for Fault {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "<Fault {}: {}>", self.code, self.message)
    }
}

pub fn render_save(result: ServiceResult<Note>) -> Value {
    match result {
        Ok(_) => Value::String(SAVE_OK_MESSAGE.to_string()),
        Err(err) => Value::String(err.to_string()),
    }
}

/// Notes render as `[name, text, timestamp]` triples.
pub fn render_notes(result: ServiceResult<Vec<Note>>) -> Value {
    match result {
        Ok(notes) => Value::Array(
            notes
                .into_iter()
                .map(|note| {
                    Value::Array(vec![
                        Value::String(note.name),
                        Value::String(note.text),
                        Value::String(note.timestamp),
                    ])
                })
                .collect(),
        ),
        Err(err) => Value::String(err.to_string()),
    }
}

pub fn render_topics(result: ServiceResult<Vec<String>>) -> Value {
    match result {
        Ok(topics) => Value::Array(topics.into_iter().map(Value::String).collect()),
        Err(err) => Value::String(err.to_string()),
    }
}

pub fn render_wikipedia(result: ServiceResult<String>) -> Value {
    match result {
        Ok(url) => Value::String(format!("{WIKIPEDIA_PAGE_PREFIX}{url}")),
        Err(err) => Value::String(err.to_string()),
    }
}
