use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// XDG app name used for config and state directories.
pub const APP_NAME: &str = "trail";
/// Overrides both the config and the state directory when set.
pub const HOME_ENV: &str = "TRAIL_HOME";

pub const USER_CONFIG_FILE: &str = "config.json";
pub const SETTINGS_FILE: &str = "settings.toml";
pub const SESSIONS_DIR: &str = "sessions";

fn home_override() -> Option<PathBuf> {
    std::env::var_os(HOME_ENV)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

fn project_dirs() -> Result<directories::ProjectDirs> {
    directories::ProjectDirs::from("", "", APP_NAME)
        .context("Failed to determine project directories")
}

/// Directory holding `config.json` and `settings.toml`.
pub fn config_dir() -> Result<PathBuf> {
    if let Some(home) = home_override() {
        return Ok(home);
    }
    Ok(project_dirs()?.config_dir().to_path_buf())
}

/// Directory holding session files.
pub fn state_dir() -> Result<PathBuf> {
    if let Some(home) = home_override() {
        return Ok(home);
    }
    let dirs = project_dirs()?;
    // state_dir() is Linux-only; fall back to data_local_dir() on macOS/Windows.
    Ok(dirs
        .state_dir()
        .unwrap_or_else(|| dirs.data_local_dir())
        .to_path_buf())
}

pub fn user_config_path() -> Result<PathBuf> {
    Ok(user_config_path_in(&config_dir()?))
}

pub fn settings_path() -> Result<PathBuf> {
    Ok(settings_path_in(&config_dir()?))
}

pub fn sessions_dir() -> Result<PathBuf> {
    Ok(sessions_dir_in(&state_dir()?))
}

pub fn user_config_path_in(config_dir: &Path) -> PathBuf {
    config_dir.join(USER_CONFIG_FILE)
}

pub fn settings_path_in(config_dir: &Path) -> PathBuf {
    config_dir.join(SETTINGS_FILE)
}

pub fn sessions_dir_in(state_dir: &Path) -> PathBuf {
    state_dir.join(SESSIONS_DIR)
}
