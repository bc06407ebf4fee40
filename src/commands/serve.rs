use anyhow::Result;
use tracing::info;

use catan_rag::AppContext;

/// Serve the pipeline over HTTP until the process is stopped
pub async fn run(ctx: AppContext, host: &str, port: u16) -> Result<()> {
    info!("Starting catan-rag HTTP server");
    catan_rag::server::run_server(ctx.pipeline, host, port).await
}
