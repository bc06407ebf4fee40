use std::path::PathBuf;

use thiserror::Error;

/// Fatal conditions detected before any question is served
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("Config file not found: {0}")]
    ConfigNotFound(PathBuf),

    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Missing required config key: {0}")]
    MissingKey(&'static str),

    #[error("Invalid value for {key}: {reason}")]
    InvalidValue { key: &'static str, reason: String },

    #[error("Schema file not found: {0}")]
    SchemaNotFound(PathBuf),

    #[error("Schema file is empty: {0}")]
    EmptySchema(PathBuf),

    #[error("Failed to build model client: {0}")]
    ModelClient(String),
}

/// Failures at the language-model boundary
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("HTTP error {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("API error: {0}")]
    Api(String),

    #[error("Invalid response format from model API")]
    InvalidResponse,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TemplateError {
    #[error("Unknown placeholder: {{{{{0}}}}}")]
    UnknownPlaceholder(String),

    #[error("No binding supplied for placeholder: {0}")]
    MissingBinding(&'static str),

    #[error("Unterminated placeholder at byte {0}")]
    Unterminated(usize),
}

/// The query-generation model call failed; not retried by the pipeline
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("Question is empty")]
    EmptyQuestion,

    #[error("Query model call failed: {0}")]
    Model(#[from] ModelError),

    #[error("Query model returned no Cypher statement")]
    EmptyOutput,

    #[error("Failed to build query prompt: {0}")]
    Template(#[from] TemplateError),
}

/// The database rejected a query or could not be reached
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ExecutionError {
    #[error("Database connection failed: {0}")]
    Connection(String),

    #[error("Query failed: {0}")]
    Query(String),
}

impl ExecutionError {
    /// Text fed back to the query generator on the next attempt
    pub fn detail(&self) -> String {
        self.to_string()
    }
}

#[derive(Debug, Error)]
pub enum AnswerError {
    #[error("Answer model call failed: {0}")]
    Model(#[from] ModelError),

    #[error("Answer model returned an empty response")]
    EmptyAnswer,

    #[error("Failed to build answer prompt: {0}")]
    Template(#[from] TemplateError),
}

/// A failed turn, surfaced at the session boundary
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Generation(#[from] GenerationError),

    #[error(transparent)]
    Answer(#[from] AnswerError),
}
