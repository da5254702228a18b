use serde::{Deserialize, Serialize, Serializer};
use std::path::PathBuf;
use std::time::Duration;

use meetnotes_core::{HttpMeetingStore, PersistError, SessionToken, DEFAULT_SAVE_DELAY};

/// Source of a configuration value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigSource {
    Default,
    File,
    Environment,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::Default => write!(f, "default"),
            ConfigSource::File => write!(f, "file"),
            ConfigSource::Environment => write!(f, "environment"),
        }
    }
}

/// A configuration value with its source
#[derive(Debug, Clone, Serialize)]
pub struct ConfigValue<T> {
    pub value: T,
    pub source: ConfigSource,
}

impl<T> ConfigValue<T> {
    pub fn new(value: T, source: ConfigSource) -> Self {
        Self { value, source }
    }
}

/// Application configuration with source tracking
#[derive(Debug, Clone, Serialize)]
pub struct Config {
    /// Meetnotes server URL (e.g., "http://localhost:8080")
    pub server_url: ConfigValue<Option<String>>,
    /// Bearer token sent with every request
    #[serde(serialize_with = "redact_token")]
    pub api_token: ConfigValue<Option<String>>,
    /// Quiet period before edited notes are saved
    pub save_delay_ms: ConfigValue<u64>,
    /// Config file path used (if any)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_file: Option<PathBuf>,
}

/// Internal struct for deserializing config file
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct ConfigFile {
    server_url: Option<String>,
    api_token: Option<String>,
    save_delay_ms: Option<u64>,
}

impl Config {
    /// Load configuration with priority: env vars > config file > defaults
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let mut server_url = ConfigValue::new(None, ConfigSource::Default);
        let mut api_token = ConfigValue::new(None, ConfigSource::Default);
        let mut save_delay_ms = ConfigValue::new(
            DEFAULT_SAVE_DELAY.as_millis() as u64,
            ConfigSource::Default,
        );
        let mut config_file = None;

        // Try to load from config file
        let path = config_path.unwrap_or_else(Self::default_config_path);
        if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .map_err(|e| ConfigError::ReadError(path.clone(), e))?;
            let file_config: ConfigFile = serde_yaml::from_str(&contents)
                .map_err(|e| ConfigError::ParseError(path.clone(), e))?;

            config_file = Some(path.clone());

            if let Some(url) = file_config.server_url {
                server_url = ConfigValue::new(Some(url), ConfigSource::File);
            }
            if let Some(token) = file_config.api_token {
                api_token = ConfigValue::new(Some(token), ConfigSource::File);
            }
            if let Some(delay) = file_config.save_delay_ms {
                save_delay_ms = ConfigValue::new(delay, ConfigSource::File);
            }
        }

        // Apply environment variable overrides
        if let Ok(url) = std::env::var("MEETNOTES_SERVER_URL") {
            server_url = ConfigValue::new(Some(url), ConfigSource::Environment);
        }
        if let Ok(token) = std::env::var("MEETNOTES_API_TOKEN") {
            api_token = ConfigValue::new(Some(token), ConfigSource::Environment);
        }
        if let Ok(delay) = std::env::var("MEETNOTES_SAVE_DELAY_MS") {
            let delay = delay.parse().map_err(|_| {
                ConfigError::InvalidValue("MEETNOTES_SAVE_DELAY_MS".to_string(), delay.clone())
            })?;
            save_delay_ms = ConfigValue::new(delay, ConfigSource::Environment);
        }

        Ok(Self {
            server_url,
            api_token,
            save_delay_ms,
            config_file,
        })
    }

    /// Returns true if a server is configured (has both server_url and api_token)
    pub fn is_configured(&self) -> bool {
        self.server_url.value.is_some() && self.api_token.value.is_some()
    }

    /// Client for the configured server.
    pub fn meeting_store(&self) -> Result<HttpMeetingStore, PersistError> {
        self.server_url
            .value
            .as_ref()
            .map(HttpMeetingStore::new)
            .ok_or(PersistError::NotConfigured)
    }

    /// Token for the configured server.
    pub fn session_token(&self) -> Result<SessionToken, PersistError> {
        self.api_token
            .value
            .as_ref()
            .map(SessionToken::new)
            .ok_or(PersistError::NotConfigured)
    }

    pub fn save_delay(&self) -> Duration {
        Duration::from_millis(self.save_delay_ms.value)
    }

    /// Default config directory (platform-specific):
    /// - Linux: ~/.config/meetnotes/
    /// - macOS: ~/Library/Application Support/meetnotes/
    /// - Windows: %APPDATA%/meetnotes/
    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("meetnotes")
    }

    /// Default config file path (platform-specific config dir + config.yaml)
    pub fn default_config_path() -> PathBuf {
        Self::default_config_dir().join("config.yaml")
    }
}

fn redact_token<S: Serializer>(
    token: &ConfigValue<Option<String>>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    let redacted = ConfigValue::new(
        token.value.as_ref().map(|_| "********"),
        token.source.clone(),
    );
    redacted.serialize(serializer)
}

#[derive(Debug)]
pub enum ConfigError {
    ReadError(PathBuf, std::io::Error),
    ParseError(PathBuf, serde_yaml::Error),
    InvalidValue(String, String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::ReadError(path, e) => {
                write!(f, "Failed to read config file '{}': {}", path.display(), e)
            }
            ConfigError::ParseError(path, e) => {
                write!(f, "Failed to parse config file '{}': {}", path.display(), e)
            }
            ConfigError::InvalidValue(name, value) => {
                write!(f, "Invalid value for {}: '{}'", name, value)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("nonexistent.yaml");

        let config = Config::load(Some(config_path)).unwrap();
        assert_eq!(config.save_delay_ms.value, 500);
        assert_eq!(config.save_delay_ms.source, ConfigSource::Default);
        assert_eq!(config.save_delay(), Duration::from_millis(500));
        assert!(config.config_file.is_none());
    }

    #[test]
    fn test_load_from_file() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.yaml");

        let mut file = std::fs::File::create(&config_path).unwrap();
        writeln!(file, "server_url: http://notes.local:8080").unwrap();
        writeln!(file, "api_token: secret").unwrap();
        writeln!(file, "save_delay_ms: 250").unwrap();

        let config = Config::load(Some(config_path.clone())).unwrap();
        assert_eq!(
            config.server_url.value.as_deref(),
            Some("http://notes.local:8080")
        );
        assert_eq!(config.server_url.source, ConfigSource::File);
        assert_eq!(config.save_delay_ms.value, 250);
        assert_eq!(config.config_file, Some(config_path));
        assert!(config.is_configured());
        assert_eq!(config.session_token().unwrap().as_str(), "secret");
        assert_eq!(
            config.meeting_store().unwrap().server_url(),
            "http://notes.local:8080"
        );
    }

    #[test]
    #[ignore] // Run with --ignored; env vars can pollute parallel tests
    fn test_env_var_overrides_file() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.yaml");

        let mut file = std::fs::File::create(&config_path).unwrap();
        writeln!(file, "save_delay_ms: 250").unwrap();

        std::env::set_var("MEETNOTES_SAVE_DELAY_MS", "1000");

        let config = Config::load(Some(config_path)).unwrap();
        assert_eq!(config.save_delay_ms.value, 1000);
        assert_eq!(config.save_delay_ms.source, ConfigSource::Environment);

        std::env::remove_var("MEETNOTES_SAVE_DELAY_MS");
    }

    #[test]
    fn test_invalid_yaml_error() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.yaml");

        let mut file = std::fs::File::create(&config_path).unwrap();
        writeln!(file, "invalid: yaml: content: [").unwrap();

        let result = Config::load(Some(config_path));
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }

    #[test]
    fn test_unconfigured_server() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.yaml");

        let mut file = std::fs::File::create(&config_path).unwrap();
        writeln!(file, "save_delay_ms: 100").unwrap();

        let config = Config::load(Some(config_path)).unwrap();
        assert!(!config.is_configured());
        assert!(matches!(
            config.meeting_store(),
            Err(PersistError::NotConfigured)
        ));
        assert!(matches!(
            config.session_token(),
            Err(PersistError::NotConfigured)
        ));
    }

    #[test]
    fn test_json_output_redacts_token() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.yaml");

        let mut file = std::fs::File::create(&config_path).unwrap();
        writeln!(file, "api_token: very-secret").unwrap();

        let config = Config::load(Some(config_path)).unwrap();
        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("very-secret"));
        assert!(json.contains("********"));
    }
}
