use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::agent::pipeline::{PipelineOptions, RagPipeline};
use crate::agent::responder::{AnswerGenerator, AnswerSettings};
use crate::config::AppConfig;
use crate::errors::StartupError;
use crate::prompt::llm_integration::{ChatCompletionsClient, LlmConfig};
use crate::query::db_executor::Neo4jExecutor;
use crate::query::nl_translator::{CypherTranslator, GenerationSettings};
use crate::schema::Schema;

/// Process-wide resources, built once at startup and shared by handle
pub struct AppContext {
    pub config: AppConfig,
    pub schema: Arc<Schema>,
    pub pipeline: Arc<RagPipeline>,
}

impl AppContext {
    /// Load config and schema, and wire the model clients and executor.
    /// `schema_override` takes precedence over `pipeline.schema_path`.
    pub fn init(
        config_path: Option<&Path>,
        schema_override: Option<&Path>,
    ) -> Result<Self, StartupError> {
        let config = AppConfig::load(config_path)?;
        let schema_path = schema_override.unwrap_or(config.pipeline.schema_path.as_path());
        let schema = Arc::new(Schema::load(schema_path)?);
        Self::from_parts(config, schema)
    }

    pub fn from_parts(config: AppConfig, schema: Arc<Schema>) -> Result<Self, StartupError> {
        let api = &config.model_api;
        let timeout = Duration::from_secs(api.timeout_secs);

        let query_model = Arc::new(ChatCompletionsClient::new(
            LlmConfig::for_queries(api),
            timeout,
        )?);
        let answer_model = Arc::new(ChatCompletionsClient::new(
            LlmConfig::for_answers(api),
            timeout,
        )?);
        tracing::info!(
            "Using {:?} models: query={}, answer={}",
            api.provider,
            query_model.model(),
            answer_model.model()
        );

        let translator = CypherTranslator::new(
            query_model,
            schema.clone(),
            GenerationSettings {
                temperature: api.query_temperature,
                max_tokens: api.query_max_tokens,
            },
        );
        let responder = AnswerGenerator::new(
            answer_model,
            schema.clone(),
            AnswerSettings {
                temperature: api.answer_temperature,
                max_tokens: api.answer_max_tokens,
            },
        );
        let executor = Arc::new(Neo4jExecutor::new(config.database.clone()));

        let pipeline = RagPipeline::new(
            translator,
            executor,
            responder,
            PipelineOptions::from(&config.pipeline),
        );

        Ok(Self {
            config,
            schema,
            pipeline: Arc::new(pipeline),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_init_missing_schema_is_fatal() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.toml");
        let mut file = std::fs::File::create(&config_path).unwrap();
        write!(
            file,
            r#"
[database]
endpoint = "bolt://localhost:7687"
username = "neo4j"
password = "pw"
database_name = "neo4j"

[model_api]
api_key = "key"

[pipeline]
schema_path = "{}"
"#,
            dir.path().join("missing.txt").display()
        )
        .unwrap();

        let result = AppContext::init(Some(&config_path), None);
        assert!(matches!(result, Err(StartupError::SchemaNotFound(_))));
    }

    #[test]
    fn test_init_with_schema_override() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.toml");
        std::fs::write(
            &config_path,
            r#"
[database]
endpoint = "bolt://localhost:7687"
username = "neo4j"
password = "pw"
database_name = "neo4j"

[model_api]
api_key = "key"

[pipeline]
max_retries = 2
"#,
        )
        .unwrap();
        let schema_path = dir.path().join("catan_schema.txt");
        std::fs::write(&schema_path, "Player {name: STRING}\n").unwrap();

        let ctx = AppContext::init(Some(&config_path), Some(&schema_path)).unwrap();
        assert_eq!(ctx.schema.as_str(), "Player {name: STRING}");
        assert_eq!(ctx.pipeline.options().max_retries, 2);
    }
}
