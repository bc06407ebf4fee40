use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::errors::StartupError;
use crate::prompt::llm_integration::LlmProvider;

/// Default config file name, looked up in the working directory first
pub const DEFAULT_CONFIG_FILE: &str = "config.toml";

/// Environment variable naming an explicit config path
pub const CONFIG_PATH_ENV: &str = "CATAN_RAG_CONFIG";

/// Environment variable that overrides `model_api.api_key`
pub const API_KEY_ENV: &str = "CATAN_RAG_API_KEY";

/// Application configuration loaded from TOML
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub model_api: ModelApiConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
}

/// Neo4j connection settings
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub endpoint: String,
    pub username: String,
    pub password: String,
    pub database_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModelApiConfig {
    #[serde(default)]
    pub api_key: String,

    #[serde(default)]
    pub provider: LlmProvider,

    /// Overrides the provider's default chat-completions base URL
    #[serde(default)]
    pub base_url: Option<String>,

    #[serde(default = "default_model")]
    pub query_model: String,

    #[serde(default = "default_model")]
    pub answer_model: String,

    #[serde(default = "default_query_temperature")]
    pub query_temperature: f32,

    #[serde(default = "default_query_max_tokens")]
    pub query_max_tokens: u32,

    #[serde(default = "default_answer_temperature")]
    pub answer_temperature: f32,

    #[serde(default = "default_answer_max_tokens")]
    pub answer_max_tokens: u32,

    /// Request timeout in seconds, applied by the HTTP client
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    /// Maximum number of generate/execute attempts per question
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Number of recent conversation turns shown to the query generator
    #[serde(default = "default_history_window")]
    pub history_window: usize,

    #[serde(default = "default_max_evidence_records")]
    pub max_evidence_records: usize,

    #[serde(default = "default_schema_path")]
    pub schema_path: PathBuf,
}

fn default_model() -> String {
    "qwen/qwen3-coder:free".to_string()
}

fn default_query_temperature() -> f32 {
    0.1
}

fn default_query_max_tokens() -> u32 {
    256
}

fn default_answer_temperature() -> f32 {
    0.3
}

fn default_answer_max_tokens() -> u32 {
    512
}

fn default_timeout_secs() -> u64 {
    120
}

fn default_max_retries() -> u32 {
    3
}

fn default_history_window() -> usize {
    6
}

fn default_max_evidence_records() -> usize {
    50
}

fn default_schema_path() -> PathBuf {
    PathBuf::from("schema.txt")
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            history_window: default_history_window(),
            max_evidence_records: default_max_evidence_records(),
            schema_path: default_schema_path(),
        }
    }
}

impl AppConfig {
    /// Parse and validate configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self, StartupError> {
        let mut config: Self = toml::from_str(content)?;

        if let Ok(key) = std::env::var(API_KEY_ENV) {
            if !key.trim().is_empty() {
                config.model_api.api_key = key;
            }
        }

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, StartupError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => StartupError::ConfigNotFound(path.to_path_buf()),
            _ => StartupError::Read {
                path: path.to_path_buf(),
                source: e,
            },
        })?;
        Self::from_toml_str(&content)
    }

    /// Load configuration from the explicit path, `CATAN_RAG_CONFIG`, or
    /// `config.toml` in the working directory or next to the executable
    pub fn load(explicit: Option<&Path>) -> Result<Self, StartupError> {
        let path = resolve_config_path(explicit)?;
        tracing::info!("Loading configuration from {}", path.display());
        Self::from_file(path)
    }

    fn validate(&self) -> Result<(), StartupError> {
        let db = &self.database;
        let required = [
            ("database.endpoint", &db.endpoint),
            ("database.username", &db.username),
            ("database.database_name", &db.database_name),
        ];
        for (key, value) in required {
            if value.trim().is_empty() {
                return Err(StartupError::MissingKey(key));
            }
        }

        if self.model_api.provider.requires_api_key() && self.model_api.api_key.trim().is_empty()
        {
            return Err(StartupError::MissingKey("model_api.api_key"));
        }

        if self.pipeline.max_retries == 0 {
            return Err(StartupError::InvalidValue {
                key: "pipeline.max_retries",
                reason: "must be at least 1".to_string(),
            });
        }

        Ok(())
    }
}

fn resolve_config_path(explicit: Option<&Path>) -> Result<PathBuf, StartupError> {
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }

    if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
        return Ok(PathBuf::from(path));
    }

    let local = PathBuf::from(DEFAULT_CONFIG_FILE);
    if local.exists() {
        return Ok(local);
    }

    let beside_exe = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join(DEFAULT_CONFIG_FILE)));
    match beside_exe {
        Some(path) if path.exists() => Ok(path),
        _ => Err(StartupError::ConfigNotFound(local)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const FULL_CONFIG: &str = r#"
[database]
endpoint = "bolt://localhost:7687"
username = "neo4j"
password = "secret"
database_name = "catan"

[model_api]
api_key = "sk-test"
provider = "openrouter"
query_model = "kwaipilot/kat-coder-pro:free"

[pipeline]
max_retries = 5
history_window = 4
"#;

    #[test]
    fn test_parse_full_config() {
        let config = AppConfig::from_toml_str(FULL_CONFIG).unwrap();

        assert_eq!(config.database.endpoint, "bolt://localhost:7687");
        assert_eq!(config.database.database_name, "catan");
        assert_eq!(config.model_api.query_model, "kwaipilot/kat-coder-pro:free");
        assert_eq!(config.model_api.answer_model, "qwen/qwen3-coder:free");
        assert_eq!(config.pipeline.max_retries, 5);
        assert_eq!(config.pipeline.history_window, 4);
        assert_eq!(config.pipeline.max_evidence_records, 50);
        assert_eq!(config.pipeline.schema_path, PathBuf::from("schema.txt"));
    }

    #[test]
    fn test_pipeline_section_defaults() {
        let content = r#"
[database]
endpoint = "bolt://db:7687"
username = "neo4j"
password = "pw"
database_name = "neo4j"

[model_api]
api_key = "key"
"#;
        let config = AppConfig::from_toml_str(content).unwrap();
        assert_eq!(config.pipeline.max_retries, 3);
        assert_eq!(config.model_api.timeout_secs, 120);
        assert!((config.model_api.query_temperature - 0.1).abs() < f32::EPSILON);
    }

    #[test]
    fn test_missing_database_section_is_fatal() {
        let content = r#"
[model_api]
api_key = "key"
"#;
        let result = AppConfig::from_toml_str(content);
        assert!(matches!(result, Err(StartupError::ConfigParse(_))));
    }

    #[test]
    fn test_blank_required_key_is_fatal() {
        let content = FULL_CONFIG.replace("endpoint = \"bolt://localhost:7687\"", "endpoint = \"\"");
        let result = AppConfig::from_toml_str(&content);
        assert!(matches!(
            result,
            Err(StartupError::MissingKey("database.endpoint"))
        ));
    }

    #[test]
    fn test_zero_retries_rejected() {
        let content = FULL_CONFIG.replace("max_retries = 5", "max_retries = 0");
        let result = AppConfig::from_toml_str(&content);
        assert!(matches!(
            result,
            Err(StartupError::InvalidValue {
                key: "pipeline.max_retries",
                ..
            })
        ));
    }

    #[test]
    fn test_local_provider_needs_no_key() {
        let content = r#"
[database]
endpoint = "bolt://db:7687"
username = "neo4j"
password = "pw"
database_name = "neo4j"

[model_api]
provider = "local"
base_url = "http://localhost:11434/v1"
"#;
        let config = AppConfig::from_toml_str(content).unwrap();
        assert_eq!(config.model_api.provider, LlmProvider::Local);
    }

    #[test]
    fn test_from_file_roundtrip() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(FULL_CONFIG.as_bytes()).unwrap();

        let config = AppConfig::from_file(file.path()).unwrap();
        assert_eq!(config.database.username, "neo4j");
    }

    #[test]
    fn test_from_file_missing() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");

        let result = AppConfig::from_file(&missing);
        assert!(matches!(result, Err(StartupError::ConfigNotFound(p)) if p == missing));
    }
}
