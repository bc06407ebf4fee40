pub mod llm_integration;
pub mod template;

pub use llm_integration::{ChatCompletionsClient, CompletionRequest, LanguageModel, LlmConfig};
pub use template::{render, Bindings, Placeholder, PromptTemplate};
