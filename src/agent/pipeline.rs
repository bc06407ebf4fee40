use serde::Serialize;
use std::sync::{Arc, Mutex};
use tracing::{info, warn};

use crate::config::PipelineConfig;
use crate::errors::PipelineError;
use crate::query::db_executor::QueryExecutor;
use crate::query::formatter::{Evidence, EvidenceState};
use crate::query::nl_translator::CypherTranslator;
use crate::query::{CandidateQueries, Record};

use super::responder::AnswerGenerator;
use super::session::{recent, ConversationTurn};

/// Progress reported while a question is processed
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum PipelineEvent {
    Generating {
        attempt: u32,
        max_attempts: u32,
    },
    QueryGenerated {
        attempt: u32,
        queries: CandidateQueries,
    },
    Executed {
        attempt: u32,
        record_count: usize,
    },
    ExecutionFailed {
        attempt: u32,
        detail: String,
        will_retry: bool,
    },
    Answering {
        state: EvidenceState,
    },
    Done,
}

/// Receives pipeline status updates (CLI status lines, HTTP trace, ...)
pub trait PipelineObserver: Send + Sync {
    fn on_event(&self, event: &PipelineEvent);
}

/// Observer that keeps every event, in order
#[derive(Debug, Default)]
pub struct EventLog {
    events: Mutex<Vec<PipelineEvent>>,
}

impl EventLog {
    pub fn events(&self) -> Vec<PipelineEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    pub fn into_events(self) -> Vec<PipelineEvent> {
        self.events.into_inner().unwrap_or_default()
    }
}

impl PipelineObserver for EventLog {
    fn on_event(&self, event: &PipelineEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}

/// Per-question retry bookkeeping. `attempt` is zero-based.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RetryState {
    pub attempt: u32,
    pub last_error: Option<String>,
    pub succeeded: bool,
}

impl RetryState {
    /// Number of generate/execute attempts made so far
    pub fn attempts(&self) -> u32 {
        self.attempt + 1
    }
}

/// Result of one answered question
#[derive(Debug, Clone, Serialize)]
pub struct TurnOutcome {
    pub answer: String,
    /// Statements of the final attempt
    pub queries: CandidateQueries,
    pub records: Vec<Record>,
    pub evidence_state: EvidenceState,
    pub retry: RetryState,
}

#[derive(Debug, Clone, Copy)]
pub struct PipelineOptions {
    pub max_retries: u32,
    pub history_window: usize,
    pub max_evidence_records: usize,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self::from(&PipelineConfig::default())
    }
}

impl From<&PipelineConfig> for PipelineOptions {
    fn from(config: &PipelineConfig) -> Self {
        Self {
            max_retries: config.max_retries.max(1),
            history_window: config.history_window,
            max_evidence_records: config.max_evidence_records,
        }
    }
}

enum PipelineState {
    Generating,
    Executing(CandidateQueries),
    Success {
        queries: CandidateQueries,
        records: Vec<Record>,
    },
    Retry(String),
    Exhausted {
        queries: CandidateQueries,
        detail: String,
    },
    Answering {
        queries: CandidateQueries,
        records: Vec<Record>,
        evidence: Evidence,
    },
    Done(TurnOutcome),
}

/// Question → Cypher → records → answer, retrying query generation when
/// execution fails
pub struct RagPipeline {
    translator: CypherTranslator,
    executor: Arc<dyn QueryExecutor>,
    responder: AnswerGenerator,
    options: PipelineOptions,
}

impl RagPipeline {
    pub fn new(
        translator: CypherTranslator,
        executor: Arc<dyn QueryExecutor>,
        responder: AnswerGenerator,
        options: PipelineOptions,
    ) -> Self {
        Self {
            translator,
            executor,
            responder,
            options,
        }
    }

    pub fn translator(&self) -> &CypherTranslator {
        &self.translator
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    /// Answer one question. The answer generator runs exactly once,
    /// whether the query succeeded on the first attempt or never did.
    pub async fn run(
        &self,
        question: &str,
        history: &[ConversationTurn],
        observer: &dyn PipelineObserver,
    ) -> Result<TurnOutcome, PipelineError> {
        let history = recent(history, self.options.history_window);
        let max_attempts = self.options.max_retries;
        let mut retry = RetryState::default();
        let mut state = PipelineState::Generating;

        loop {
            state = match state {
                PipelineState::Generating => {
                    observer.on_event(&PipelineEvent::Generating {
                        attempt: retry.attempts(),
                        max_attempts,
                    });
                    let queries = self
                        .translator
                        .generate(question, history, retry.last_error.as_deref())
                        .await?;
                    info!(
                        "Attempt {}/{}: generated {} statement(s)",
                        retry.attempts(),
                        max_attempts,
                        queries.len()
                    );
                    observer.on_event(&PipelineEvent::QueryGenerated {
                        attempt: retry.attempts(),
                        queries: queries.clone(),
                    });
                    PipelineState::Executing(queries)
                }
                PipelineState::Executing(queries) => match self.execute_batch(&queries).await {
                    Ok(records) => {
                        retry.succeeded = true;
                        observer.on_event(&PipelineEvent::Executed {
                            attempt: retry.attempts(),
                            record_count: records.len(),
                        });
                        PipelineState::Success { queries, records }
                    }
                    Err(detail) => {
                        let will_retry = retry.attempt + 1 < max_attempts;
                        warn!(
                            "Attempt {}/{} failed: {}",
                            retry.attempts(),
                            max_attempts,
                            detail
                        );
                        observer.on_event(&PipelineEvent::ExecutionFailed {
                            attempt: retry.attempts(),
                            detail: detail.clone(),
                            will_retry,
                        });
                        if will_retry {
                            PipelineState::Retry(detail)
                        } else {
                            PipelineState::Exhausted { queries, detail }
                        }
                    }
                },
                PipelineState::Retry(detail) => {
                    retry.last_error = Some(detail);
                    retry.attempt += 1;
                    PipelineState::Generating
                }
                PipelineState::Success { queries, records } => {
                    let evidence =
                        Evidence::from_records(&records, self.options.max_evidence_records);
                    PipelineState::Answering {
                        queries,
                        records,
                        evidence,
                    }
                }
                PipelineState::Exhausted { queries, detail } => {
                    let evidence = Evidence::error(&detail);
                    retry.last_error = Some(detail);
                    PipelineState::Answering {
                        queries,
                        records: Vec::new(),
                        evidence,
                    }
                }
                PipelineState::Answering {
                    queries,
                    records,
                    evidence,
                } => {
                    let evidence_state = evidence.state();
                    observer.on_event(&PipelineEvent::Answering {
                        state: evidence_state,
                    });
                    let answer = self
                        .responder
                        .answer(question, &queries.joined(), &evidence)
                        .await?;
                    PipelineState::Done(TurnOutcome {
                        answer,
                        queries,
                        records,
                        evidence_state,
                        retry: retry.clone(),
                    })
                }
                PipelineState::Done(outcome) => {
                    info!(
                        "Answered after {} attempt(s), evidence {}",
                        outcome.retry.attempts(),
                        outcome.evidence_state
                    );
                    observer.on_event(&PipelineEvent::Done);
                    return Ok(outcome);
                }
            };
        }
    }

    /// Run every statement in order, concatenating their records. The first
    /// failure ends the batch and its detail is returned.
    async fn execute_batch(&self, queries: &CandidateQueries) -> Result<Vec<Record>, String> {
        let mut records = Vec::new();
        for (i, query) in queries.iter().enumerate() {
            match self.executor.execute(query).await {
                Ok(mut rows) => records.append(&mut rows),
                Err(e) if queries.len() > 1 => {
                    return Err(format!("statement {}: {}", i + 1, e.detail()))
                }
                Err(e) => return Err(e.detail()),
            }
        }
        Ok(records)
    }
}
