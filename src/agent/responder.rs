use indoc::indoc;
use std::sync::Arc;

use crate::errors::AnswerError;
use crate::prompt::llm_integration::{CompletionRequest, LanguageModel};
use crate::prompt::template::{Bindings, Placeholder, PromptTemplate};
use crate::query::formatter::{Evidence, EvidenceState};
use crate::schema::Schema;

pub const DOMAIN_NAME: &str = "Catan Base Game Rules & Strategy";

/// Returned without a model call when the query matched nothing
pub const NOT_FOUND_APOLOGY: &str =
    "I'm sorry, I couldn't find that information in the database.";

/// Returned without a model call when every query attempt failed
pub const ERROR_APOLOGY: &str =
    "I'm sorry, I wasn't able to retrieve that information because the database query failed.";

const ROLE_DESCRIPTION: &str = indoc! {"
    You are a smart and friendly assistant specialized in analyzing Catan game data.
    Answer user questions based strictly on the data found in the database.
    Use a helpful, professional, yet conversational tone."};

const ANSWER_TEMPLATE: &str = indoc! {"
    ### System
    {{role_description}}

    IMPORTANT RULES:
    1. Answer ONLY from the information in the Evidence section.
    2. Do NOT use outside knowledge, and do NOT invent facts that are not in the Evidence.
    3. If the data is technical, explain it in simple terms.

    ### Context
    Domain: {{domain}}
    Schema:
    {{schema}}

    ### User Question
    {{question}}

    ### Generated Cypher Query
    {{query}}

    ### Evidence
    {{evidence}}
    ({{evidence_status}})

    ### Answer
"};

#[derive(Debug, Clone, Copy)]
pub struct AnswerSettings {
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for AnswerSettings {
    fn default() -> Self {
        Self {
            temperature: 0.3,
            max_tokens: 512,
        }
    }
}

/// Turns query evidence into a natural-language answer grounded in it
pub struct AnswerGenerator {
    model: Arc<dyn LanguageModel>,
    schema: Arc<Schema>,
    settings: AnswerSettings,
}

impl AnswerGenerator {
    pub fn new(model: Arc<dyn LanguageModel>, schema: Arc<Schema>, settings: AnswerSettings) -> Self {
        Self {
            model,
            schema,
            settings,
        }
    }

    /// Produce the final answer. Empty and error evidence are answered with
    /// a fixed apology and never reach the model.
    pub async fn answer(
        &self,
        question: &str,
        query: &str,
        evidence: &Evidence,
    ) -> Result<String, AnswerError> {
        let state = evidence.state();
        match state {
            EvidenceState::Empty => {
                tracing::info!("No data for question, answering with apology");
                Ok(NOT_FOUND_APOLOGY.to_string())
            }
            EvidenceState::Error => {
                tracing::info!("Query failed for question, answering with error apology");
                Ok(match evidence.error_detail() {
                    Some(detail) => format!("{}\n\nError detail: {}", ERROR_APOLOGY, detail),
                    None => ERROR_APOLOGY.to_string(),
                })
            }
            EvidenceState::Populated => {
                let request = self.build_request(question, query, evidence, state)?;
                let raw = self.model.complete(&request).await?;
                tracing::debug!("Raw answer text: {}", raw);

                let answer = clean_answer(&raw);
                if answer.is_empty() {
                    return Err(AnswerError::EmptyAnswer);
                }
                Ok(answer)
            }
        }
    }

    fn build_request(
        &self,
        question: &str,
        query: &str,
        evidence: &Evidence,
        state: EvidenceState,
    ) -> Result<CompletionRequest, AnswerError> {
        let bindings = Bindings::from([
            (Placeholder::RoleDescription, ROLE_DESCRIPTION),
            (Placeholder::Domain, DOMAIN_NAME),
            (Placeholder::Schema, self.schema.as_str()),
            (Placeholder::Question, question.trim()),
            (Placeholder::Query, query),
            (Placeholder::Evidence, evidence.as_str()),
            (Placeholder::EvidenceStatus, state.status_line()),
        ]);
        let content = PromptTemplate::parse(ANSWER_TEMPLATE)?.render(&bindings)?;

        let mut request = CompletionRequest::new(
            format!("You are a helpful assistant for {}.", DOMAIN_NAME),
            content,
        );
        request.temperature = Some(self.settings.temperature);
        request.max_tokens = Some(self.settings.max_tokens);
        Ok(request)
    }
}

/// Keep only the answer section of a raw completion
fn clean_answer(raw: &str) -> String {
    let text = raw.trim_start();
    let text = text.strip_prefix("### Answer").unwrap_or(text);
    let text = match text.find("###") {
        Some(idx) => &text[..idx],
        None => text,
    };
    text.trim().to_string()
}
