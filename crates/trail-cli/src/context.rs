use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use trail_config::{Settings, UserConfig};
use trail_detect::DetectionPipeline;
use trail_remote::{HttpRemote, RemoteApi, RemoteSync};
use trail_session::{SessionLifecycle, SessionStore};

/// Everything one invocation needs, loaded once up front.
pub(crate) struct AppContext {
    pub settings: Settings,
    pub lifecycle: SessionLifecycle,
    /// Invocation root: paths in error records are relative to it.
    pub root: PathBuf,
    pub debug: bool,
}

impl AppContext {
    pub fn load() -> Result<Self> {
        let config_path = trail_config::paths::user_config_path()?;
        let config = UserConfig::load_from(&config_path)?;
        let store = SessionStore::open_default()?;
        let settings = Settings::load()?;
        let root = std::env::current_dir().context("Failed to determine current directory")?;
        Ok(Self {
            settings,
            lifecycle: SessionLifecycle::new(store, config, config_path),
            root,
            debug: trail_config::debug_enabled(),
        })
    }

    pub fn store(&self) -> &SessionStore {
        self.lifecycle.store()
    }

    pub fn token(&self) -> Option<String> {
        self.lifecycle.config().resolve_token()
    }

    pub fn pipeline(&self) -> DetectionPipeline {
        DetectionPipeline::from_settings(&self.settings.detection, &self.root).with_debug(self.debug)
    }

    pub fn remote(&self) -> Result<RemoteSync> {
        let api: Arc<dyn RemoteApi> = Arc::new(HttpRemote::from_settings(&self.settings.remote)?);
        Ok(RemoteSync::new(api))
    }

    /// Deadline for git queries and other short helper tools.
    pub fn tool_timeout(&self) -> Duration {
        Duration::from_secs(self.settings.detection.timeout_secs)
    }
}
