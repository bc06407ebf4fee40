use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::PipelineError;

use super::pipeline::{PipelineObserver, RagPipeline, TurnOutcome};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::User => write!(f, "User"),
            Role::Assistant => write!(f, "Assistant"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: Role,
    pub content: String,
    #[serde(default = "Utc::now")]
    pub at: DateTime<Utc>,
}

impl ConversationTurn {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            at: Utc::now(),
        }
    }
}

/// The last `window` turns of `history`, oldest first
pub fn recent(history: &[ConversationTurn], window: usize) -> &[ConversationTurn] {
    let start = history.len().saturating_sub(window);
    &history[start..]
}

/// One interactive conversation. Turns are append-only and a turn is
/// committed only once it has produced an answer.
#[derive(Debug, Default)]
pub struct ChatSession {
    turns: Vec<ConversationTurn>,
}

impl ChatSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn turns(&self) -> &[ConversationTurn] {
        &self.turns
    }

    pub fn recent(&self, window: usize) -> &[ConversationTurn] {
        recent(&self.turns, window)
    }

    pub fn clear(&mut self) {
        self.turns.clear();
    }

    /// Answer a question in the context of this session
    pub async fn ask(
        &mut self,
        pipeline: &RagPipeline,
        question: &str,
        observer: &dyn PipelineObserver,
    ) -> Result<TurnOutcome, PipelineError> {
        let outcome = pipeline.run(question, &self.turns, observer).await?;

        self.turns.push(ConversationTurn::new(Role::User, question.trim()));
        self.turns
            .push(ConversationTurn::new(Role::Assistant, outcome.answer.clone()));

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn turns(n: usize) -> Vec<ConversationTurn> {
        (0..n)
            .map(|i| ConversationTurn::new(Role::User, format!("q{}", i)))
            .collect()
    }

    #[test]
    fn test_recent_window() {
        let history = turns(5);
        let window = recent(&history, 2);
        assert_eq!(window.len(), 2);
        assert_eq!(window[0].content, "q3");
        assert_eq!(window[1].content, "q4");

        assert_eq!(recent(&history, 10).len(), 5);
        assert!(recent(&history, 0).is_empty());
    }

    #[test]
    fn test_session_recent_and_clear() {
        let mut session = ChatSession::new();
        session.turns = turns(4);
        assert_eq!(session.recent(3).len(), 3);
        assert_eq!(session.recent(3)[0].content, "q1");

        session.clear();
        assert!(session.turns().is_empty());
        assert!(session.recent(3).is_empty());
    }

    #[test]
    fn test_role_serde() {
        let turn: ConversationTurn =
            serde_json::from_str(r#"{"role": "assistant", "content": "hi"}"#).unwrap();
        assert_eq!(turn.role, Role::Assistant);
        assert_eq!(turn.role.to_string(), "Assistant");
    }
}
