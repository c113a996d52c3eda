//! reqwest implementation of [`RemoteApi`].

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Response, StatusCode, Url};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::time::Duration;
use trail_config::RemoteSettings;
use trail_core::{AppError, ErrorRecord};
use trail_session::Session;

use crate::api::{RemoteApi, Resolution, Suggestion};

#[derive(Debug, Clone)]
pub struct HttpRemote {
    base_url: String,
    client: reqwest::Client,
    /// Separate client: AI suggestions get a longer deadline.
    ai_client: reqwest::Client,
}

impl HttpRemote {
    pub fn new(base_url: &str, timeout: Duration, ai_timeout: Duration) -> Result<Self> {
        let build = |timeout: Duration| {
            reqwest::Client::builder()
                .timeout(timeout)
                .build()
                .context("Failed to build HTTP client")
        };
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: build(timeout)?,
            ai_client: build(ai_timeout)?,
        })
    }

    pub fn from_settings(settings: &RemoteSettings) -> Result<Self> {
        Self::new(
            &settings.api_url,
            Duration::from_secs(settings.timeout_secs),
            Duration::from_secs(settings.ai_timeout_secs),
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

fn transport_error(err: reqwest::Error) -> anyhow::Error {
    let message = if err.is_timeout() {
        "request timed out".to_string()
    } else if err.is_connect() {
        format!("could not connect: {err}")
    } else {
        err.to_string()
    };
    AppError::NetworkError(message).into()
}

/// Map non-success statuses onto the error taxonomy.
async fn check_status(response: Response, what: &str) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let detail = body.trim();
    tracing::debug!(%status, what, body = detail, "Remote request rejected");
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(AppError::AuthError(format!(
            "remote rejected the token ({status})"
        ))
        .into()),
        _ => Err(AppError::NetworkError(format!("{what} failed with status {status}")).into()),
    }
}

async fn read_json<T: DeserializeOwned>(response: Response, what: &str) -> Result<T> {
    let body = response.text().await.map_err(transport_error)?;
    serde_json::from_str(&body).map_err(|e| {
        AppError::ParseFailure {
            tool: what.to_string(),
            reason: e.to_string(),
        }
        .into()
    })
}

#[derive(Deserialize)]
#[serde(untagged)]
enum LookupBody {
    List(Vec<Resolution>),
    Wrapped { resolutions: Vec<Resolution> },
}

/// Session id from a push response: `{"id"}` or `{"session": {"id"}}`.
fn pushed_id(body: &Value) -> Option<String> {
    body.get("id")
        .or_else(|| body.get("session").and_then(|s| s.get("id")))
        .and_then(Value::as_str)
        .map(ToOwned::to_owned)
}

#[async_trait]
impl RemoteApi for HttpRemote {
    async fn lookup(&self, error: &ErrorRecord, token: &str) -> Result<Vec<Resolution>> {
        let params = [
            ("error", error.message.clone()),
            ("file", error.location.file_path.clone()),
            ("line", error.location.line.to_string()),
            ("column", error.location.column.to_string()),
        ];
        let url = Url::parse_with_params(&self.endpoint("/api/resolutions/lookup"), &params)
            .with_context(|| format!("Invalid API URL: {}", self.base_url))?;

        let response = self
            .client
            .get(url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(transport_error)?;
        let response = check_status(response, "resolution lookup").await?;

        let resolutions = match read_json::<LookupBody>(response, "resolution lookup").await? {
            LookupBody::List(list) => list,
            LookupBody::Wrapped { resolutions } => resolutions,
        };
        Ok(resolutions)
    }

    async fn fetch_session(&self, id: &str, token: &str) -> Result<Session> {
        let response = self
            .client
            .get(self.endpoint(&format!("/api/sessions/{id}")))
            .bearer_auth(token)
            .send()
            .await
            .map_err(transport_error)?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(AppError::SessionNotFound(id.to_string()).into());
        }
        let response = check_status(response, "session fetch").await?;
        read_json(response, "session fetch").await
    }

    async fn push_session(&self, session: &Session, token: &str) -> Result<Option<String>> {
        let response = self
            .client
            .post(self.endpoint("/api/sessions"))
            .bearer_auth(token)
            .json(session)
            .send()
            .await
            .map_err(transport_error)?;
        let response = check_status(response, "session push").await?;

        // The body is informational; an empty or non-JSON reply still counts as success.
        let body = response.text().await.unwrap_or_default();
        Ok(serde_json::from_str::<Value>(&body)
            .ok()
            .as_ref()
            .and_then(pushed_id))
    }

    async fn suggest(&self, prompt: &str, error: Option<&str>, token: &str) -> Result<Suggestion> {
        let response = self
            .ai_client
            .post(self.endpoint("/api/ai/suggest"))
            .bearer_auth(token)
            .json(&json!({ "prompt": prompt, "error": error }))
            .send()
            .await
            .map_err(transport_error)?;
        let response = check_status(response, "AI suggestion").await?;
        read_json(response, "AI suggestion").await
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
