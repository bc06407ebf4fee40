pub mod db_executor;
pub mod formatter;
pub mod nl_translator;
pub mod postprocess;

pub use db_executor::{Neo4jExecutor, QueryExecutor};
pub use formatter::{Evidence, EvidenceState};
pub use nl_translator::{CypherTranslator, GenerationSettings};

use serde::Serialize;

/// One result row: field name to value
pub type Record = serde_json::Map<String, serde_json::Value>;

/// The Cypher statements generated for one attempt, in execution order.
/// Always holds at least one statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CandidateQueries(Vec<String>);

impl CandidateQueries {
    /// Returns `None` when there is no non-blank statement
    pub fn new(statements: Vec<String>) -> Option<Self> {
        let statements: Vec<String> = statements
            .into_iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        if statements.is_empty() {
            None
        } else {
            Some(Self(statements))
        }
    }

    pub fn statements(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &String> {
        self.0.iter()
    }

    /// All statements as one display string
    pub fn joined(&self) -> String {
        self.0.join(";\n")
    }
}
