use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use trail_core::ErrorRecord;
use trail_session::Session;

/// A prior fix for a matching error, as returned by the resolution index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resolution {
    pub solution: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code_snippet: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_session: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Suggestion {
    pub suggestion: String,
    /// Free-form entries; the service returns either strings or objects.
    #[serde(default)]
    pub related_issues: Vec<Value>,
}

impl Suggestion {
    /// One display line per related issue.
    pub fn related_lines(&self) -> Vec<String> {
        self.related_issues
            .iter()
            .map(|issue| match issue {
                Value::String(s) => s.clone(),
                Value::Object(map) => ["title", "solution", "error", "id"]
                    .iter()
                    .find_map(|key| map.get(*key).and_then(Value::as_str))
                    .map(ToOwned::to_owned)
                    .unwrap_or_else(|| issue.to_string()),
                other => other.to_string(),
            })
            .collect()
    }
}

/// Transport to the remote service. Every call carries the bearer token.
///
/// Errors are `anyhow` chains wrapping [`trail_core::AppError`]:
/// `AuthError`, `NetworkError`, `SessionNotFound` or `ParseFailure`.
#[async_trait]
pub trait RemoteApi: Send + Sync {
    async fn lookup(&self, error: &ErrorRecord, token: &str) -> Result<Vec<Resolution>>;

    async fn fetch_session(&self, id: &str, token: &str) -> Result<Session>;

    /// Upload a session. Returns the id the remote reports, if any.
    async fn push_session(&self, session: &Session, token: &str) -> Result<Option<String>>;

    async fn suggest(&self, prompt: &str, error: Option<&str>, token: &str) -> Result<Suggestion>;
}
