use anyhow::Result;
use serde_json::json;
use std::path::Path;
use trail_config::{Settings, UserConfig, atomic_write, paths};
use trail_core::OutputFormat;

pub(crate) fn handle_config_show(format: OutputFormat) -> Result<()> {
    let config_path = paths::user_config_path()?;
    let settings_path = paths::settings_path()?;
    let config = UserConfig::load_from(&config_path)?;
    let settings = Settings::load()?;
    let token_state = token_state(&config);

    match format {
        OutputFormat::Json => {
            let value = json!({
                "configFile": config_path,
                "settingsFile": settings_path,
                "sessionsDir": paths::sessions_dir()?,
                "activeSession": config.active_session,
                "token": token_state,
                "settings": settings,
            });
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
        OutputFormat::Text => {
            println!("config file:    {}", config_path.display());
            println!("settings file:  {}", settings_path.display());
            println!("sessions dir:   {}", paths::sessions_dir()?.display());
            println!(
                "active session: {}",
                config.active_session.as_deref().unwrap_or("(none)")
            );
            println!("token:          {token_state}");
            println!();
            print!("{}", toml::to_string_pretty(&settings)?);
        }
    }
    Ok(())
}

fn token_state(config: &UserConfig) -> &'static str {
    match (std::env::var(trail_config::user::TOKEN_ENV).is_ok(), config.token.is_some()) {
        (true, _) => "set (from TRAIL_TOKEN)",
        (false, true) => "set (config file)",
        (false, false) => "not set",
    }
}

pub(crate) fn handle_set_token(token: String) -> Result<()> {
    let token = token.trim();
    if token.is_empty() {
        anyhow::bail!("Token must not be empty");
    }
    set_token_in(&paths::user_config_path()?, Some(token.to_string()))?;
    eprintln!("Token saved.");
    Ok(())
}

pub(crate) fn handle_clear_token() -> Result<()> {
    set_token_in(&paths::user_config_path()?, None)?;
    eprintln!("Token cleared.");
    Ok(())
}

fn set_token_in(config_path: &Path, token: Option<String>) -> Result<()> {
    let mut config = UserConfig::load_from(config_path)?;
    config.token = token;
    config.save_to(config_path)
}

pub(crate) fn handle_config_init() -> Result<()> {
    let path = paths::settings_path()?;
    if path.exists() {
        eprintln!("Settings already exist at {}", path.display());
        return Ok(());
    }
    atomic_write(&path, Settings::default_template().as_bytes())?;
    eprintln!("Wrote settings template to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_set_and_clear_token_keeps_active_session() {
        let td = tempdir().unwrap();
        let path = td.path().join("config.json");
        UserConfig {
            active_session: Some("abc".into()),
            token: None,
        }
        .save_to(&path)
        .unwrap();

        set_token_in(&path, Some("secret".into())).unwrap();
        let config = UserConfig::load_from(&path).unwrap();
        assert_eq!(config.token.as_deref(), Some("secret"));
        assert_eq!(config.active_session.as_deref(), Some("abc"));

        set_token_in(&path, None).unwrap();
        let config = UserConfig::load_from(&path).unwrap();
        assert_eq!(config.token, None);
        assert_eq!(config.active_session.as_deref(), Some("abc"));
    }
}
