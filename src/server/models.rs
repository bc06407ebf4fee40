use serde::{Deserialize, Serialize};

use crate::agent::pipeline::{PipelineEvent, TurnOutcome};
use crate::agent::session::ConversationTurn;
use crate::query::formatter::EvidenceState;
use crate::query::CandidateQueries;

#[derive(Debug, Deserialize)]
pub struct AskRequest {
    pub question: String,
    /// Earlier turns, oldest first
    #[serde(default)]
    pub history: Vec<ConversationTurn>,
}

#[derive(Debug, Serialize)]
pub struct AskResponse {
    pub answer: String,
    pub queries: CandidateQueries,
    pub attempts: u32,
    pub evidence_state: EvidenceState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
    pub events: Vec<PipelineEvent>,
}

impl AskResponse {
    pub fn new(outcome: TurnOutcome, events: Vec<PipelineEvent>) -> Self {
        Self {
            attempts: outcome.retry.attempts(),
            last_error: outcome.retry.last_error,
            answer: outcome.answer,
            queries: outcome.queries,
            evidence_state: outcome.evidence_state,
            events,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CypherRequest {
    pub question: String,
}

#[derive(Debug, Serialize)]
pub struct CypherResponse {
    pub queries: CandidateQueries,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}
