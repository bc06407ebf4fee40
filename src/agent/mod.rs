pub mod pipeline;
pub mod responder;
pub mod session;


pub use pipeline::{
    EventLog, PipelineEvent, PipelineObserver, PipelineOptions, RagPipeline, RetryState,
    TurnOutcome,
};
pub use responder::{AnswerGenerator, AnswerSettings};
pub use session::{ChatSession, ConversationTurn, Role};
