use indoc::indoc;
use std::sync::Arc;

use crate::agent::session::ConversationTurn;
use crate::errors::GenerationError;
use crate::prompt::llm_integration::{CompletionRequest, LanguageModel};
use crate::prompt::template::{Bindings, Placeholder, PromptTemplate};
use crate::schema::Schema;

use super::postprocess::{clean_cypher, split_statements};
use super::CandidateQueries;

const SYSTEM_INSTRUCTION: &str = "You are a strict Cypher query generator. \
Respond with ONLY valid Cypher for Neo4j. \
Do not add explanations, comments, or markdown fences.";

const TRANSLATION_TEMPLATE: &str = indoc! {"
    You are an expert Neo4j Cypher generator.
    Convert the user's natural language question into Cypher.

    Rules:
    1. Use ONLY the node labels, relationship types, and properties listed in the Schema.
    2. Do NOT invent labels, relationships, or properties.
    3. Do NOT add any explanation or conversational text.
    4. Return ONLY Cypher, without markdown fences or comments.
    5. For string matching, ALWAYS use `toLower()` with `CONTAINS` so matching is case-insensitive.
       Example: `toLower(t.resource) CONTAINS \"lumber\"` instead of `t.resource = \"Lumber\"`.
    6. Prefer a single statement. If several are required, separate them with `;`.

    Examples:
    {{examples}}

    Schema:
    {{schema}}

    {{history}}Question: {{question}}
    {{previous_error}}Cypher:"};

const FEW_SHOT_EXAMPLES: &str = indoc! {r#"
    Question: List all players and their total victory points.
    Cypher: MATCH (p:Player)-[:HAS_PIECE]->(piece:Piece)
            RETURN p.name AS playerName, SUM(piece.vp) AS totalVP
            ORDER BY totalVP DESC

    Question: Find all settlements owned by the player whose name contains 'mesach'.
    Cypher: MATCH (p:Player)-[:OWNS]->(s:Settlement)
            WHERE toLower(p.name) CONTAINS "mesach"
            RETURN s

    Question: Get all tiles that produce lumber and their dice numbers.
    Cypher: MATCH (t:Tile)
            WHERE toLower(t.resource) CONTAINS "lumber"
            RETURN t.name AS tileName, t.diceNumber AS diceNumber

    Question: List all roads built by players whose name contains 'ivan'.
    Cypher: MATCH (p:Player)-[:BUILDS]->(r:Road)
            WHERE toLower(p.name) CONTAINS "ivan"
            RETURN p.name AS playerName, r

    Question: Find all harbor nodes and the players connected to them.
    Cypher: MATCH (h:Harbor)<-[:ADJACENT_TO]-(i:Intersection)<-[:OWNS]-(p:Player)
            RETURN h, p"#};

/// Sampling settings for query generation
#[derive(Debug, Clone, Copy)]
pub struct GenerationSettings {
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            temperature: 0.1,
            max_tokens: 256,
        }
    }
}

/// Translates natural language questions into Cypher via a language model
pub struct CypherTranslator {
    model: Arc<dyn LanguageModel>,
    schema: Arc<Schema>,
    settings: GenerationSettings,
}

impl CypherTranslator {
    pub fn new(
        model: Arc<dyn LanguageModel>,
        schema: Arc<Schema>,
        settings: GenerationSettings,
    ) -> Self {
        Self {
            model,
            schema,
            settings,
        }
    }

    /// Generate the candidate statements for one attempt.
    ///
    /// `history` is read in chronological order (oldest first).
    /// `last_error` is the failure detail of the previous attempt, if any.
    pub async fn generate(
        &self,
        question: &str,
        history: &[ConversationTurn],
        last_error: Option<&str>,
    ) -> Result<CandidateQueries, GenerationError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(GenerationError::EmptyQuestion);
        }

        let request = self.build_request(question, history, last_error)?;
        let raw = self.model.complete(&request).await?;
        tracing::debug!("Raw generated text: {}", raw);

        let cleaned = clean_cypher(&raw);
        let queries =
            CandidateQueries::new(split_statements(&cleaned)).ok_or(GenerationError::EmptyOutput)?;
        tracing::debug!("Post-processed Cypher: {}", queries.joined());

        Ok(queries)
    }

    fn build_request(
        &self,
        question: &str,
        history: &[ConversationTurn],
        last_error: Option<&str>,
    ) -> Result<CompletionRequest, GenerationError> {
        let history_block = format_history(history);
        let error_block = last_error
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .map(|e| {
                format!(
                    "Your previous query for this question failed with this database error:\n{}\nReturn a corrected query that avoids it.\n",
                    e
                )
            })
            .unwrap_or_default();

        let bindings = Bindings::from([
            (Placeholder::Examples, FEW_SHOT_EXAMPLES),
            (Placeholder::Schema, self.schema.as_str()),
            (Placeholder::History, history_block.as_str()),
            (Placeholder::Question, question),
            (Placeholder::PreviousError, error_block.as_str()),
        ]);
        let content = PromptTemplate::parse(TRANSLATION_TEMPLATE)?.render(&bindings)?;

        let mut request = CompletionRequest::new(SYSTEM_INSTRUCTION, content);
        request.temperature = Some(self.settings.temperature);
        request.max_tokens = Some(self.settings.max_tokens);
        Ok(request)
    }
}

fn format_history(history: &[ConversationTurn]) -> String {
    if history.is_empty() {
        return String::new();
    }

    let mut block = String::from("Conversation so far (oldest first):\n");
    for turn in history {
        block.push_str(&format!("{}: {}\n", turn.role, turn.content.trim()));
    }
    block.push('\n');
    block
}
