//! Wikipedia opensearch client.

use super::{EncyclopediaProvider, LookupError};
use async_trait::async_trait;
use log::debug;
use serde_json::Value;
use std::time::Duration;

pub const DEFAULT_WIKIPEDIA_ENDPOINT: &str = "https://en.wikipedia.org/w/api.php";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
const USER_AGENT: &str = concat!("topicnotes/", env!("CARGO_PKG_VERSION"));
const URLS_INDEX: usize = 3;

/// Typed HTTP client for the MediaWiki `opensearch` action.
#[derive(Debug, Clone)]
pub struct WikipediaClient {
    endpoint: String,
    client: reqwest::Client,
}

impl WikipediaClient {
    pub fn new(endpoint: &str) -> Result<Self, LookupError> {
        Self::with_timeout(endpoint, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(endpoint: &str, timeout: Duration) -> Result<Self, LookupError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            client,
        })
    }
}

#[async_trait]
impl EncyclopediaProvider for WikipediaClient {
    async fn lookup(&self, topic: &str) -> Result<Option<String>, LookupError> {
        let resp = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("action", "opensearch"),
                ("namespace", "0"),
                ("search", topic),
                ("limit", "1"),
                ("format", "json"),
            ])
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(LookupError::Status(resp.status().as_u16()));
        }

        let body: Value = resp
            .json()
            .await
            .map_err(|e| LookupError::Malformed(e.to_string()))?;
        let url = first_url(&body)?;
        debug!(
            "event=wikipedia_lookup module=enrich status=ok found={}",
            url.is_some()
        );
        Ok(url)
    }
}

/// Reads `urls[0]` from an opensearch `[query, titles, descriptions, urls]` reply.
pub fn first_url(body: &Value) -> Result<Option<String>, LookupError> {
    let urls = body
        .as_array()
        .and_then(|parts| parts.get(URLS_INDEX))
        .and_then(Value::as_array)
        .ok_or_else(|| LookupError::Malformed(format!("expected 4-element array, got {body}")))?;

    match urls.first() {
        None => Ok(None),
        Some(Value::String(url)) if url.trim().is_empty() => Ok(None),
        Some(Value::String(url)) => Ok(Some(url.clone())),
        Some(other) => Err(LookupError::Malformed(format!(
            "expected url string, got {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::first_url;
    use serde_json::json;

    #[test]
    fn reads_first_url() {
        let body = json!([
            "Rust",
            ["Rust (programming language)"],
            [""],
            ["https://en.wikipedia.org/wiki/Rust_(programming_language)"]
        ]);
        assert_eq!(
            first_url(&body).unwrap().as_deref(),
            Some("https://en.wikipedia.org/wiki/Rust_(programming_language)")
        );
    }

    #[test]
    fn empty_url_list_is_not_found() {
        let body = json!(["zzzz", [], [], []]);
        assert_eq!(first_url(&body).unwrap(), None);
    }

    #[test]
    fn unexpected_shape_is_malformed() {
        assert!(first_url(&json!({"error": "x"})).is_err());
        assert!(first_url(&json!(["q", [], []])).is_err());
        assert!(first_url(&json!(["q", [], [], [42]])).is_err());
    }
}
