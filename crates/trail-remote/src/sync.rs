//! Reconciliation between local sessions and the remote service.
//!
//! Sessions are only ever written through [`SessionStore`]; the remote never
//! assigns identity, so the local id is authoritative.

use anyhow::Result;
use std::sync::Arc;
use trail_config::paths::APP_NAME;
use trail_config::user::TOKEN_ENV;
use trail_core::{AppError, ErrorRecord};
use trail_session::{Session, SessionStore, validate_session_id};

use crate::api::{RemoteApi, Resolution, Suggestion};

#[derive(Clone)]
pub struct RemoteSync {
    api: Arc<dyn RemoteApi>,
}

fn require_token(token: Option<&str>) -> Result<&str> {
    token.filter(|t| !t.trim().is_empty()).ok_or_else(|| {
        AppError::AuthError(format!(
            "no token configured; set {TOKEN_ENV} or run `{APP_NAME} config set-token`"
        ))
        .into()
    })
}

impl RemoteSync {
    pub fn new(api: Arc<dyn RemoteApi>) -> Self {
        Self { api }
    }

    /// Prior resolutions for `error`, in the remote's order.
    pub async fn lookup_resolutions(
        &self,
        error: &ErrorRecord,
        token: Option<&str>,
    ) -> Result<Vec<Resolution>> {
        let token = require_token(token)?;
        let resolutions = self.api.lookup(error, token).await?;
        tracing::debug!(count = resolutions.len(), "Resolution lookup finished");
        Ok(resolutions)
    }

    /// Return the local session `id`, downloading it first if it only exists remotely.
    ///
    /// An existing local file always wins and is never overwritten. Without a
    /// token no remote call is made and a missing session is `SessionNotFound`.
    pub async fn fetch_session_if_missing(
        &self,
        store: &SessionStore,
        id: &str,
        token: Option<&str>,
    ) -> Result<Session> {
        validate_session_id(id)?;
        if store.exists(id) {
            return store.load(id);
        }
        let Ok(token) = require_token(token) else {
            return Err(AppError::SessionNotFound(id.to_string()).into());
        };

        let mut session = self.api.fetch_session(id, token).await?;
        if session.id != id {
            tracing::warn!(requested = %id, returned = %session.id, "Remote returned a different session id");
            session.id = id.to_string();
        }
        store.save(&session)?;
        tracing::info!(session_id = %id, "Fetched session from remote");
        Ok(session)
    }

    /// Upload `session` and, on success only, persist it locally.
    pub async fn push(
        &self,
        store: &SessionStore,
        session: &Session,
        token: Option<&str>,
    ) -> Result<String> {
        if session.commands.is_empty() {
            return Err(AppError::EmptySession(session.id.clone()).into());
        }
        let token = require_token(token)?;

        let remote_id = self.api.push_session(session, token).await?;
        if let Some(remote_id) = remote_id.filter(|r| *r != session.id) {
            tracing::warn!(local = %session.id, remote = %remote_id, "Remote reported a different id; keeping local id");
        }
        store.save(session)?;
        Ok(session.id.clone())
    }

    pub async fn suggest(
        &self,
        prompt: &str,
        error: Option<&str>,
        token: Option<&str>,
    ) -> Result<Suggestion> {
        let token = require_token(token)?;
        self.api.suggest(prompt, error, token).await
    }
}
