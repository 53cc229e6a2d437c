use serde::Deserialize;
use std::fs;
use std::path::Path;
use url::Url;

const ENV_CONFIG_PATH: &str = "CONTRACT_AGENT_CONFIG_PATH";
const ENV_MODEL: &str = "CONTRACT_AGENT_MODEL";
const DEFAULT_CONFIG_PATH: &str = "config.yaml";

const DEFAULT_MODEL: &str = "gemini-2.5-flash";
const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_MAX_EXTRACTED_BYTES: u64 = 64 * 1024 * 1024;

/// Model service configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Model used for every call
    pub name: String,
    /// Base URL of the generateContent API
    pub base_url: Url,
    pub classification_temperature: f32,
    pub analysis_temperature: f32,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_MODEL.to_string(),
            base_url: Url::parse(DEFAULT_BASE_URL).expect("default base URL is valid"),
            classification_temperature: 0.1,
            analysis_temperature: 0.3,
            timeout_secs: 120,
        }
    }
}

/// In-memory session registry limits
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Sessions untouched for this long are discarded
    pub idle_timeout_minutes: i64,
    pub max_sessions: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            idle_timeout_minutes: 60,
            max_sessions: 1000,
        }
    }
}

/// Input limits
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Largest accepted upload after base64 decoding
    pub max_upload_bytes: usize,
    /// Largest DOCX body read after decompression
    pub max_extracted_bytes: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_upload_bytes: 20 * 1024 * 1024,
            max_extracted_bytes: DEFAULT_MAX_EXTRACTED_BYTES,
        }
    }
}

/// YAML configuration file structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub sessions: SessionConfig,
    #[serde(default)]
    pub limits: LimitsConfig,
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub model: ModelConfig,
    pub sessions: SessionConfig,
    pub limits: LimitsConfig,
    pub port: u16,
    pub host: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model: ModelConfig::default(),
            sessions: SessionConfig::default(),
            limits: LimitsConfig::default(),
            port: 8080,
            host: "127.0.0.1".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from environment and config file
    pub fn from_env() -> Self {
        let port = std::env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(8080);

        let host = std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());

        let config_path = std::env::var(ENV_CONFIG_PATH)
            .unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());

        let mut file = Self::load_config_file(&config_path).unwrap_or_default();

        if let Ok(model) = std::env::var(ENV_MODEL)
            && !model.trim().is_empty()
        {
            file.model.name = model;
        }

        Self {
            model: file.model,
            sessions: file.sessions,
            limits: file.limits,
            port,
            host,
        }
    }

    /// Load configuration from YAML file
    fn load_config_file(path: &str) -> Option<ConfigFile> {
        let path = Path::new(path);

        if !path.exists() {
            tracing::debug!(path = %path.display(), "Config file not found, using defaults");
            return None;
        }

        match fs::read_to_string(path) {
            Ok(contents) => Self::parse_config(&contents, path),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Failed to read config file, using defaults");
                None
            }
        }
    }

    fn parse_config(contents: &str, path: &Path) -> Option<ConfigFile> {
        let contents = contents.trim();
        if contents.is_empty() {
            tracing::debug!(path = %path.display(), "Config file is empty, using defaults");
            return Some(ConfigFile::default());
        }

        match serde_yaml::from_str(contents) {
            Ok(config) => {
                tracing::info!(path = %path.display(), "Loaded configuration from file");
                Some(config)
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Failed to parse config file, using defaults");
                None
            }
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
