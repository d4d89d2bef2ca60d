use std::{env, fs, io};

use serde::Deserialize;
use thiserror::Error;

use crate::services::{storage_service::UploadSettings, token_service::settings::TokenSettings};

pub const DEFAULT_SETTINGS_PATH: &str = "./settings.json";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Could not read settings file: {0}")]
    Io(#[from] io::Error),
    #[error("Could not parse settings file: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("`jwt_secret` must be set, either in the settings file or through JWT_SECRET")]
    MissingSecret,
}

#[derive(Clone, Deserialize)]
pub struct Settings {
    /// Overridden by `BIND_ADDR`
    pub addr: String,
    /// Overridden by `DATABASE_URL`
    pub database_url: String,
    pub resources_path: String,
    #[serde(default)]
    pub cap_xp_at_max_level: bool,
    pub token: TokenSettings,
    pub uploads: UploadSettings,
}

impl Settings {
    ///
    /// Reads the settings file at `path`, then applies any overrides found in
    /// the environment (after loading `.env`, if present)
    ///
    pub fn load(path: &str) -> Result<Self, SettingsError> {
        dotenvy::dotenv().ok();
        Self::parse(&fs::read_to_string(path)?, |key| env::var(key).ok())
    }

    fn parse(contents: &str, var: impl Fn(&str) -> Option<String>) -> Result<Self, SettingsError> {
        let mut settings: Settings = serde_json::from_str(contents)?;
        settings.apply_overrides(var);

        // settings.json ships without a secret; JWT_SECRET must provide one
        if settings.token.jwt_secret.trim().is_empty() {
            return Err(SettingsError::MissingSecret);
        }
        Ok(settings)
    }

    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(url) = var("DATABASE_URL") {
            self.database_url = url;
        }
        if let Some(secret) = var("JWT_SECRET") {
            self.token.jwt_secret = secret;
        }
        if let Some(addr) = var("BIND_ADDR") {
            self.addr = addr;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    const SETTINGS: &str = r#"{
        "addr": "127.0.0.1:3005",
        "database_url": "sqlite::memory:",
        "resources_path": "./res",
        "token": { "jwt_lifetime_s": 60, "refr_token_lifetime_s": 120, "jwt_secret": "file-secret" },
        "uploads": { "dir": "./uploads", "public_base_url": "/uploads" }
    }"#;

    #[test]
    fn test_load_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, SETTINGS).unwrap();

        let settings = Settings::load(path.to_str().unwrap()).unwrap();
        assert_eq!(settings.resources_path, "./res");
        assert_eq!(settings.token.jwt_lifetime_s, 60);
        assert!(!settings.cap_xp_at_max_level);
    }

    #[test]
    fn test_overrides_replace_file_values() {
        let mut settings: Settings = serde_json::from_str(SETTINGS).unwrap();
        let vars = HashMap::from([
            ("DATABASE_URL", "sqlite://other.db"),
            ("JWT_SECRET", "env-secret"),
        ]);

        settings.apply_overrides(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(settings.database_url, "sqlite://other.db");
        assert_eq!(settings.token.jwt_secret, "env-secret");
        assert_eq!(settings.addr, "127.0.0.1:3005");
    }

    #[test]
    fn test_shipped_settings_require_a_secret() {
        let shipped = include_str!("../settings.json");

        assert!(matches!(Settings::parse(shipped, |_| None), Err(SettingsError::MissingSecret)));

        let settings = Settings::parse(shipped, |key| (key == "JWT_SECRET").then(|| "env-secret".to_string())).unwrap();
        assert_eq!(settings.token.jwt_secret, "env-secret");
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(Settings::load("./does/not/exist.json"), Err(SettingsError::Io(_))));
    }
}
