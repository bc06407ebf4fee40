pub mod ask;
pub mod chat;
pub mod cypher;
#[cfg(feature = "http")]
pub mod serve;

use catan_rag::{PipelineEvent, PipelineObserver};

/// Prints pipeline progress to stderr, keeping stdout for answers
pub struct StatusLine;

impl PipelineObserver for StatusLine {
    fn on_event(&self, event: &PipelineEvent) {
        match event {
            PipelineEvent::Generating {
                attempt,
                max_attempts,
            } => eprintln!("Generating Cypher (attempt {}/{})...", attempt, max_attempts),
            PipelineEvent::QueryGenerated { queries, .. } => {
                eprintln!("Generated query:\n{}", queries.joined())
            }
            PipelineEvent::Executed { record_count, .. } => {
                eprintln!("Query returned {} record(s)", record_count)
            }
            PipelineEvent::ExecutionFailed {
                detail, will_retry, ..
            } => {
                if *will_retry {
                    eprintln!("Query failed, retrying: {}", detail)
                } else {
                    eprintln!("Query failed, giving up: {}", detail)
                }
            }
            PipelineEvent::Answering { state } => eprintln!("Answering ({} evidence)...", state),
            PipelineEvent::Done => {}
        }
    }
}
