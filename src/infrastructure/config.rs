use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("invalid value for {name}: {value}")]
    InvalidEnv { name: &'static str, value: String },
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub retrieval: RetrievalConfig,
    pub cors: CorsConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Field name under which document identifiers are returned.
    pub key_field: String,
    /// Documents scored per batch.
    pub batch_size: usize,
    /// Results per query when a request does not say; `None` returns all.
    pub default_k: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            key_field: "id".to_string(),
            batch_size: 32,
            default_k: None,
        }
    }
}

impl Config {
    /// Loads `CONFIG_PATH` (YAML) when set, then applies environment
    /// overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let config = match std::env::var("CONFIG_PATH") {
            Ok(path) => Self::from_file(&path)?,
            Err(_) => Self::default(),
        };
        config.with_overrides(|name| std::env::var(name).ok())
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml(&raw)
    }

    pub fn from_yaml(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    fn with_overrides(
        mut self,
        lookup: impl Fn(&'static str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        if let Some(host) = lookup("SERVER_HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("SERVER_PORT") {
            self.server.port = port.parse().map_err(|_| ConfigError::InvalidEnv {
                name: "SERVER_PORT",
                value: port,
            })?;
        }
        if let Some(size) = lookup("RETRIEVAL_BATCH_SIZE") {
            self.retrieval.batch_size = size.parse().map_err(|_| ConfigError::InvalidEnv {
                name: "RETRIEVAL_BATCH_SIZE",
                value: size,
            })?;
        }
        if let Some(key_field) = lookup("RETRIEVAL_KEY_FIELD") {
            self.retrieval.key_field = key_field;
        }
        self.validate()?;
        Ok(self)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.retrieval.batch_size == 0 {
            return Err(ConfigError::Invalid(
                "retrieval.batch_size must be positive".into(),
            ));
        }
        if self.retrieval.key_field.is_empty() {
            return Err(ConfigError::Invalid(
                "retrieval.key_field must not be empty".into(),
            ));
        }
        if matches!(self.retrieval.default_k, Some(k) if k < 0) {
            return Err(ConfigError::Invalid(
                "retrieval.default_k must not be negative".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.retrieval.key_field, "id");
        assert_eq!(config.retrieval.batch_size, 32);
        assert_eq!(config.retrieval.default_k, None);
        assert!(config.cors.allowed_origins.is_empty());
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = Config::from_yaml(
            "retrieval:\n  batch_size: 8\n  default_k: 10\ncors:\n  allowed_origins: [\"*\"]\n",
        )
        .unwrap();

        assert_eq!(config.retrieval.batch_size, 8);
        assert_eq!(config.retrieval.default_k, Some(10));
        assert_eq!(config.retrieval.key_field, "id");
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.cors.allowed_origins, vec!["*"]);
    }

    #[test]
    fn test_rejects_zero_batch_size() {
        let err = Config::from_yaml("retrieval:\n  batch_size: 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("SERVER_PORT", "9000"),
            ("RETRIEVAL_BATCH_SIZE", "4"),
            ("RETRIEVAL_KEY_FIELD", "doc_id"),
        ]
        .into_iter()
        .collect();

        let config = Config::default()
            .with_overrides(|name| env.get(name).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.retrieval.batch_size, 4);
        assert_eq!(config.retrieval.key_field, "doc_id");
    }

    #[test]
    fn test_invalid_env_value() {
        let err = Config::default()
            .with_overrides(|name| (name == "SERVER_PORT").then(|| "http".to_string()))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnv { name: "SERVER_PORT", .. }));
    }
}
