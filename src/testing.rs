//! Scripted stand-ins for the model and database boundaries, used by unit tests

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

use crate::errors::{ExecutionError, ModelError};
use crate::prompt::llm_integration::{CompletionRequest, LanguageModel};
use crate::query::db_executor::QueryExecutor;
use crate::query::Record;

/// Language model that replays canned completions in order
pub struct ScriptedModel {
    responses: Mutex<VecDeque<Result<String, ModelError>>>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedModel {
    pub fn new(responses: Vec<&str>) -> Self {
        Self::from_results(responses.into_iter().map(|r| Ok(r.to_string())).collect())
    }

    pub fn failing(error: ModelError) -> Self {
        Self::from_results(vec![Err(error)])
    }

    pub fn from_results(responses: Vec<Result<String, ModelError>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn request(&self, index: usize) -> CompletionRequest {
        self.requests.lock().unwrap()[index].clone()
    }
}

#[async_trait]
impl LanguageModel for ScriptedModel {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, ModelError> {
        self.requests.lock().unwrap().push(request.clone());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ModelError::Api("script exhausted".to_string())))
    }
}

/// Executor that replays canned outcomes and records the statements it ran
pub struct ScriptedExecutor {
    outcomes: Mutex<VecDeque<Result<Vec<Record>, ExecutionError>>>,
    executed: Mutex<Vec<String>>,
}

impl ScriptedExecutor {
    pub fn new(outcomes: Vec<Result<Vec<Record>, ExecutionError>>) -> Self {
        Self {
            outcomes: Mutex::new(outcomes.into()),
            executed: Mutex::new(Vec::new()),
        }
    }

    pub fn executed(&self) -> Vec<String> {
        self.executed.lock().unwrap().clone()
    }
}

#[async_trait]
impl QueryExecutor for ScriptedExecutor {
    async fn execute(&self, query: &str) -> Result<Vec<Record>, ExecutionError> {
        self.executed.lock().unwrap().push(query.to_string());
        self.outcomes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ExecutionError::Connection("script exhausted".to_string())))
    }
}

/// Build a record from a JSON object literal
pub fn record(value: serde_json::Value) -> Record {
    value.as_object().cloned().unwrap_or_default()
}
