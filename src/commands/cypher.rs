use anyhow::Result;

use catan_rag::AppContext;

/// Print the candidate statements for a question without touching the database
pub async fn run(ctx: &AppContext, question: &str) -> Result<()> {
    let queries = ctx.pipeline.translator().generate(question, &[], None).await?;

    for statement in queries.iter() {
        println!("{};", statement);
    }

    Ok(())
}
