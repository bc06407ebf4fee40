use anyhow::Result;

use catan_rag::AppContext;

use super::StatusLine;

/// Answer one question without conversation history
pub async fn run(ctx: &AppContext, question: &str, show_query: bool) -> Result<()> {
    tracing::info!("Answering: {}", question);

    let outcome = ctx.pipeline.run(question, &[], &StatusLine).await?;

    if show_query {
        println!("Cypher:\n{}\n", outcome.queries.joined());
    }
    println!("{}", outcome.answer);

    Ok(())
}
