mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use catan_rag::AppContext;

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so stdout carries only answers and queries
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = cli::Cli::parse();

    let ctx = AppContext::init(cli.config.as_deref(), cli.schema.as_deref())?;

    match cli.command {
        cli::Commands::Ask {
            question,
            show_query,
        } => commands::ask::run(&ctx, &question, show_query).await?,
        cli::Commands::Chat => commands::chat::run(&ctx).await?,
        cli::Commands::Cypher { question } => commands::cypher::run(&ctx, &question).await?,
        #[cfg(feature = "http")]
        cli::Commands::Serve { host, port } => commands::serve::run(ctx, &host, port).await?,
    }

    Ok(())
}
