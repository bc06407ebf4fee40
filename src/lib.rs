// Expose modules as public for use by the binary and integration code
pub mod agent;
pub mod config;
pub mod context;
pub mod errors;
pub mod prompt;
pub mod query;
pub mod schema;

#[cfg(feature = "http")]
pub mod server;

#[cfg(test)]
pub(crate) mod testing;

// Re-export core types for convenience
pub use agent::pipeline::{PipelineEvent, PipelineObserver, RagPipeline, TurnOutcome};
pub use agent::session::ChatSession;
pub use config::AppConfig;
pub use context::AppContext;
