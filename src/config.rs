//! Configuration management for the printquote CLI and client

use config::Environment;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;
use url::Url;

use crate::error::{PqError, Result};
use crate::ui::UI;
use crate::ConfigCommand;

pub const DEFAULT_ENDPOINT: &str = "http://localhost:8000";
pub const DEFAULT_API_PREFIX: &str = "/api";
const DEFAULT_TIMEOUT: u64 = 30;

/// Settings persisted in `config.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub endpoint: String,
    #[serde(default = "default_api_prefix")]
    pub api_prefix: String,
    pub timeout: u64,
    pub verbose: bool,
    pub storage_dir: PathBuf,
    pub token_storage_enabled: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            api_prefix: default_api_prefix(),
            timeout: DEFAULT_TIMEOUT,
            verbose: false,
            storage_dir: default_storage_dir(),
            token_storage_enabled: true,
        }
    }
}

impl Config {
    pub async fn load() -> Result<Self> {
        Self::load_from(&default_config_path()).await
    }

    /// Read the file, writing defaults when it is missing or unreadable
    pub async fn load_from(config_file: &Path) -> Result<Self> {
        if config_file.exists() {
            let content = fs::read_to_string(config_file).await?;
            match serde_json::from_str::<Self>(&content) {
                Ok(config) => return Ok(config),
                Err(e) => debug!("Ignoring malformed config {}: {}", config_file.display(), e),
            }
        }

        let config = Self::default();
        config.save(config_file).await?;
        Ok(config)
    }

    pub async fn save(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let content = serde_json::to_string_pretty(self)?;
        fs::write(config_path, content).await?;
        Ok(())
    }

    pub fn session_path(&self) -> PathBuf {
        self.storage_dir.join("session.json")
    }

    /// Client settings: these values, then `PRINTQUOTE_*` variables on top
    pub fn to_client_config(&self) -> Result<ClientConfig> {
        self.client_builder().build()
    }

    fn client_builder(&self) -> ClientConfigBuilder {
        let mut builder = ClientConfigBuilder::new()
            .base_url(&self.endpoint)
            .api_prefix(&self.api_prefix)
            .timeout(self.timeout)
            .verbose(self.verbose);

        if self.token_storage_enabled {
            builder = builder.token_storage(TokenStorageConfig {
                enabled: true,
                storage_path: Some(self.session_path().to_string_lossy().to_string()),
            });
        }
        builder
    }
}

pub fn default_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("printquote")
}

pub fn default_config_path() -> PathBuf {
    default_config_dir().join("config.json")
}

pub fn default_storage_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("printquote")
}

fn default_api_prefix() -> String {
    DEFAULT_API_PREFIX.to_string()
}

fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT
}

/// Token storage configuration
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct TokenStorageConfig {
    #[serde(default)]
    pub enabled: bool,
    pub storage_path: Option<String>,
}

impl From<TokenStorageConfig> for crate::store::TokenStoreConfig {
    fn from(config: TokenStorageConfig) -> Self {
        Self {
            enabled: config.enabled,
            storage_path: config.storage_path.map(PathBuf::from),
        }
    }
}

/// Client configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ClientConfig {
    pub base_url: String,
    #[serde(default = "default_api_prefix")]
    pub api_prefix: String,
    #[serde(default = "default_timeout")]
    pub timeout: u64,
    #[serde(default)]
    pub verbose: bool,
    #[serde(default)]
    pub token_storage: TokenStorageConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_ENDPOINT.to_string(),
            api_prefix: default_api_prefix(),
            timeout: default_timeout(),
            verbose: false,
            token_storage: TokenStorageConfig::default(),
        }
    }
}

/// Builder for ClientConfig
#[derive(Debug, Default)]
pub struct ClientConfigBuilder {
    base_url: Option<String>,
    api_prefix: Option<String>,
    timeout: Option<u64>,
    verbose: Option<bool>,
    token_storage: Option<TokenStorageConfig>,
}

impl ClientConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn base_url<S: Into<String>>(mut self, base_url: S) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn api_prefix<S: Into<String>>(mut self, api_prefix: S) -> Self {
        self.api_prefix = Some(api_prefix.into());
        self
    }

    pub fn timeout(mut self, timeout: u64) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = Some(verbose);
        self
    }

    pub fn token_storage(mut self, token_storage: TokenStorageConfig) -> Self {
        self.token_storage = Some(token_storage);
        self
    }

    pub fn build(self) -> Result<ClientConfig> {
        self.build_with(Environment::with_prefix("PRINTQUOTE").try_parsing(true))
    }

    /// Builder values form the base layer; `env` is applied over them
    fn build_with(self, env: Environment) -> Result<ClientConfig> {
        let settings = config::Config::builder()
            .set_default(
                "base_url",
                self.base_url.unwrap_or_else(|| DEFAULT_ENDPOINT.to_string()),
            )?
            .set_default(
                "api_prefix",
                self.api_prefix.unwrap_or_else(default_api_prefix),
            )?
            .set_default("timeout", self.timeout.unwrap_or(DEFAULT_TIMEOUT))?
            .set_default("verbose", self.verbose.unwrap_or(false))?
            .add_source(env)
            .build()?;

        let config = ClientConfig {
            base_url: settings.get_string("base_url")?,
            api_prefix: settings.get_string("api_prefix")?,
            timeout: settings.get::<u64>("timeout")?,
            verbose: settings.get_bool("verbose")?,
            token_storage: self.token_storage.unwrap_or_default(),
        };
        debug!("Client endpoint {}", config.base_url);

        config.validate()?;
        Ok(config)
    }
}

impl ClientConfig {
    pub fn validate(&self) -> Result<()> {
        if self.base_url.trim().is_empty() {
            return Err(PqError::invalid_endpoint("Base URL cannot be empty"));
        }
        let url = Url::parse(&self.base_url)?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(PqError::invalid_endpoint(format!(
                "Unsupported scheme '{}', expected http or https",
                url.scheme()
            )));
        }
        if self.timeout == 0 {
            return Err(PqError::config("Timeout must be greater than zero"));
        }
        Ok(())
    }

    /// URL of a route relative to the server root, e.g. `/auth/token`
    pub fn endpoint_url(&self, endpoint: &str) -> String {
        let endpoint = endpoint.strip_prefix('/').unwrap_or(endpoint);
        format!("{}/{}", self.base_url.trim_end_matches('/'), endpoint)
    }

    /// URL of a route under the API prefix, e.g. `/quotes/`
    pub fn api_url(&self, endpoint: &str) -> String {
        let prefix = self.api_prefix.trim_matches('/');
        let endpoint = endpoint.strip_prefix('/').unwrap_or(endpoint);
        if prefix.is_empty() {
            self.endpoint_url(endpoint)
        } else {
            self.endpoint_url(&format!("{}/{}", prefix, endpoint))
        }
    }
}

/// Handles `printquote config ...`
pub struct ConfigService {
    config: Config,
    config_path: PathBuf,
    ui: UI,
}

impl ConfigService {
    pub fn new(config: Config) -> Self {
        Self::with_config_path(config, default_config_path())
    }

    pub fn with_config_path(config: Config, config_path: PathBuf) -> Self {
        Self {
            config,
            config_path,
            ui: UI::new(),
        }
    }

    pub async fn handle_config(&mut self, command: ConfigCommand) -> Result<()> {
        match command {
            ConfigCommand::Show => {
                self.show();
                return Ok(());
            }
            ConfigCommand::SetEndpoint { url } => self.set_endpoint(&url)?,
            ConfigCommand::SetApiPrefix { prefix } => self.set_api_prefix(&prefix),
            ConfigCommand::SetTimeout { seconds } => self.set_timeout(seconds)?,
            ConfigCommand::SetVerbose { enabled } => self.set_verbose(&enabled)?,
            ConfigCommand::Reset => self.config = Config::default(),
        }
        self.config.save(&self.config_path).await?;
        self.ui.success("Configuration saved");
        Ok(())
    }

    fn show(&self) {
        let c = &self.config;
        self.ui.card(
            "Configuration",
            vec![
                ("Endpoint", c.endpoint.clone()),
                ("API prefix", c.api_prefix.clone()),
                ("Timeout", format!("{}s", c.timeout)),
                ("Verbose", c.verbose.to_string()),
                ("Storage", c.storage_dir.display().to_string()),
                ("Token storage", c.token_storage_enabled.to_string()),
                ("Config file", self.config_path.display().to_string()),
            ],
        );
    }

    pub fn set_endpoint(&mut self, url: &str) -> Result<()> {
        let candidate = ClientConfig {
            base_url: url.trim().to_string(),
            ..ClientConfig::default()
        };
        candidate.validate()?;
        self.config.endpoint = candidate.base_url;
        Ok(())
    }

    pub fn set_api_prefix(&mut self, prefix: &str) {
        let trimmed = prefix.trim().trim_matches('/');
        self.config.api_prefix = if trimmed.is_empty() {
            String::new()
        } else {
            format!("/{}", trimmed)
        };
    }

    pub fn set_timeout(&mut self, seconds: u64) -> Result<()> {
        if seconds == 0 {
            return Err(PqError::config("Timeout must be greater than zero"));
        }
        self.config.timeout = seconds;
        Ok(())
    }

    pub fn set_verbose(&mut self, enabled: &str) -> Result<()> {
        self.config.verbose = match enabled.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "on" | "1" => true,
            "false" | "no" | "off" | "0" => false,
            other => {
                return Err(PqError::invalid_input(format!(
                    "Expected true or false, got '{}'",
                    other
                )))
            }
        };
        Ok(())
    }
}
