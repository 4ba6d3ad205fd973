use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub model: ModelConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors_permissive: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub format: LogFormat,
    /// `EnvFilter` directives, used when `RUST_LOG` is unset
    pub filter: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty, // Human-readable, for local runs
    Json,   // One JSON object per line, for log shippers
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub backend: ModelBackend,
    /// Base URL of the NER inference server (remote backend)
    pub url: String,
    pub model_name: String,
    /// Label -> phrases JSON file (gazetteer backend)
    pub gazetteer_path: PathBuf,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum ModelBackend {
    Remote,
    Gazetteer,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            cors_permissive: false,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::Pretty,
            filter: "info,tower_http=info".to_string(),
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            backend: ModelBackend::Remote,
            url: "http://localhost:8080".to_string(),
            model_name: "en_core_web_lg".to_string(),
            gazetteer_path: PathBuf::from("data/gazetteer.json"),
            timeout_secs: 30,
        }
    }
}

impl AppConfig {
    /// Defaults, then the JSON file named by `NER_CONFIG`, then `NER_*` variables.
    pub fn load() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = match lookup("NER_CONFIG") {
            Some(path) => {
                let content = std::fs::read_to_string(&path)
                    .context(format!("Failed to read config file: {}", path))?;
                serde_json::from_str(&content)
                    .context(format!("Invalid config file: {}", path))?
            }
            None => Self::default(),
        };

        if let Some(host) = lookup("NER_HOST") {
            config.server.host = host;
        }
        if let Some(port) = lookup("NER_PORT") {
            config.server.port = port
                .parse()
                .context(format!("NER_PORT is not a port number: {}", port))?;
        }
        if let Some(format) = lookup("NER_LOG_FORMAT") {
            config.logging.format = parse_enum("NER_LOG_FORMAT", &format)?;
        }
        if let Some(backend) = lookup("NER_MODEL_BACKEND") {
            config.model.backend = parse_enum("NER_MODEL_BACKEND", &backend)?;
        }
        if let Some(url) = lookup("NER_MODEL_URL") {
            config.model.url = url;
        }
        if let Some(name) = lookup("NER_MODEL_NAME") {
            config.model.model_name = name;
        }
        if let Some(path) = lookup("NER_GAZETTEER_PATH") {
            config.model.gazetteer_path = PathBuf::from(path);
        }

        Ok(config)
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

fn parse_enum<T: serde::de::DeserializeOwned>(key: &str, value: &str) -> Result<T> {
    serde_json::from_value(serde_json::Value::String(value.to_lowercase()))
        .context(format!("{} has unsupported value: {}", key, value))
}
