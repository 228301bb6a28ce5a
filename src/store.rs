//! Session token persistence

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::error::{PqError, Result};

/// Bearer token as written to disk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredToken {
    pub access_token: String,
    pub token_type: String,
    pub stored_at: DateTime<Utc>,
}

/// On-disk layout: a single `token` key, `null` when logged out
#[derive(Debug, Default, Serialize, Deserialize)]
struct SessionFile {
    #[serde(default)]
    token: Option<StoredToken>,
}

/// Token storage configuration
#[derive(Debug, Clone, Default)]
pub struct TokenStoreConfig {
    pub enabled: bool,
    pub storage_path: Option<PathBuf>,
}

/// Token storage manager
#[derive(Debug)]
pub struct TokenStore {
    config: TokenStoreConfig,
    token: Option<StoredToken>,
}

impl TokenStore {
    pub fn new(config: TokenStoreConfig) -> Result<Self> {
        let mut store = Self {
            config,
            token: None,
        };

        if store.config.enabled {
            store.load_token()?;
        }

        Ok(store)
    }

    pub fn store_token(&mut self, token: StoredToken) -> Result<()> {
        if !self.config.enabled {
            return Ok(());
        }

        self.token = Some(token);
        self.save_token()
    }

    pub fn get_token(&self) -> Option<StoredToken> {
        if !self.config.enabled {
            return None;
        }
        self.token.clone()
    }

    pub fn remove_token(&mut self) -> Result<()> {
        if !self.config.enabled {
            return Ok(());
        }

        self.token = None;
        self.save_token()
    }

    fn get_storage_path(&self) -> Result<PathBuf> {
        self.config
            .storage_path
            .clone()
            .ok_or_else(|| PqError::invalid_input("Token storage path not configured"))
    }

    fn load_token(&mut self) -> Result<()> {
        let path = self.get_storage_path()?;

        if !path.exists() {
            return Ok(());
        }

        let content = fs::read_to_string(&path)
            .map_err(|e| PqError::io_from_error("Failed to read session file", e))?;

        if content.trim().is_empty() {
            return Ok(());
        }

        let file: SessionFile = serde_json::from_str(&content)
            .map_err(|e| PqError::internal(format!("Failed to parse session file: {}", e)))?;
        self.token = file.token;

        Ok(())
    }

    fn save_token(&self) -> Result<()> {
        let path = self.get_storage_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| PqError::io_from_error("Failed to create storage directory", e))?;
        }

        let file = SessionFile {
            token: self.token.clone(),
        };
        let content = serde_json::to_string_pretty(&file)?;

        fs::write(&path, content)
            .map_err(|e| PqError::io_from_error("Failed to write session file", e))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::utils::test_helpers::create_temp_dir;

    fn token(value: &str) -> StoredToken {
        StoredToken {
            access_token: value.to_string(),
            token_type: "bearer".to_string(),
            stored_at: Utc::now(),
        }
    }

    fn enabled_config(path: PathBuf) -> TokenStoreConfig {
        TokenStoreConfig {
            enabled: true,
            storage_path: Some(path),
        }
    }

    #[test]
    fn test_token_survives_reload() {
        let dir = create_temp_dir();
        let path = dir.path().join("printquote").join("session.json");

        let mut store = TokenStore::new(enabled_config(path.clone())).unwrap();
        assert!(store.get_token().is_none());
        store.store_token(token("abc")).unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["token"]["access_token"], "abc");

        let reloaded = TokenStore::new(enabled_config(path)).unwrap();
        assert_eq!(reloaded.get_token().unwrap().access_token, "abc");
    }

    #[test]
    fn test_remove_token_writes_null() {
        let dir = create_temp_dir();
        let path = dir.path().join("session.json");

        let mut store = TokenStore::new(enabled_config(path.clone())).unwrap();
        store.store_token(token("abc")).unwrap();
        store.remove_token().unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert!(raw["token"].is_null());
        assert!(TokenStore::new(enabled_config(path)).unwrap().get_token().is_none());
    }

    #[test]
    fn test_disabled_store_keeps_nothing() {
        let mut store = TokenStore::new(TokenStoreConfig::default()).unwrap();
        store.store_token(token("abc")).unwrap();
        assert!(store.get_token().is_none());
    }

    #[test]
    fn test_empty_file_is_logged_out() {
        let dir = create_temp_dir();
        let path = dir.path().join("session.json");
        fs::write(&path, "  ").unwrap();

        let store = TokenStore::new(enabled_config(path)).unwrap();
        assert!(store.get_token().is_none());
    }
}
