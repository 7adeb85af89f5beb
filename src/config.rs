//! Application Configuration
//!
//! Loaded from a JSON file; every field has a default so an empty object (or
//! no file at all) is a valid configuration.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Environment variable that overrides `db_path`
pub const DB_PATH_ENV: &str = "SHOPLIST_DB_PATH";

/// How a bulk item-set merge treats the bound item's unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UnitPolicy {
    /// The entry's unit replaces the item's unit
    #[default]
    Overwrite,
    /// The item keeps its current unit
    Preserve,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserConfig {
    pub username: String,
    pub token: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub db_path: PathBuf,
    pub log_dir: Option<PathBuf>,
    pub attachments_dir: PathBuf,
    pub bulk_merge_unit: UnitPolicy,
    /// Enables the scheduled repair task when set
    pub repair_interval_secs: Option<u64>,
    /// Items younger than this are never treated as orphans
    pub orphan_grace_secs: u64,
    pub users: Vec<UserConfig>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("shoplist.db"),
            log_dir: None,
            attachments_dir: PathBuf::from("attachments"),
            bulk_merge_unit: UnitPolicy::Overwrite,
            repair_interval_secs: None,
            orphan_grace_secs: 300,
            users: Vec::new(),
        }
    }
}

impl AppConfig {
    /// Load from `path` (defaults when `None`), then apply env overrides
    pub fn load(path: Option<&Path>) -> Result<Self, String> {
        let mut config = match path {
            Some(path) => {
                let text = std::fs::read_to_string(path)
                    .map_err(|e| format!("Failed to read config {}: {}", path.display(), e))?;
                Self::from_json(&text)?
            }
            None => Self::default(),
        };

        if let Ok(db_path) = std::env::var(DB_PATH_ENV) {
            if !db_path.is_empty() {
                config.db_path = PathBuf::from(db_path);
            }
        }
        Ok(config)
    }

    pub fn from_json(text: &str) -> Result<Self, String> {
        let config: Self =
            serde_json::from_str(text).map_err(|e| format!("Invalid config: {}", e))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), String> {
        let mut seen = HashMap::new();
        for user in &self.users {
            if user.username.trim().is_empty() || user.token.trim().is_empty() {
                return Err("Config users need a username and a token".to_string());
            }
            if let Some(other) = seen.insert(user.token.as_str(), user.username.as_str()) {
                return Err(format!("Token shared by users '{}' and '{}'", other, user.username));
            }
        }
        if self.repair_interval_secs == Some(0) {
            return Err("repair_interval_secs must be positive".to_string());
        }
        Ok(())
    }

    /// Token -> username map for the identity provider
    pub fn token_map(&self) -> HashMap<String, String> {
        self.users
            .iter()
            .map(|u| (u.token.clone(), u.username.clone()))
            .collect()
    }
}
