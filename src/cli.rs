use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// catan-rag: answers Catan questions from a Neo4j knowledge graph
#[derive(Parser)]
#[command(
    author,
    version,
    about = "Answer Catan rules and strategy questions from a Neo4j knowledge graph"
)]
pub struct Cli {
    /// Path to the TOML config file (defaults to $CATAN_RAG_CONFIG, then ./config.toml)
    #[arg(long, short, global = true)]
    pub config: Option<PathBuf>,

    /// Path to the graph schema description, overriding pipeline.schema_path
    #[arg(long, short, global = true)]
    pub schema: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Ask a single question and print the answer
    Ask {
        /// Natural language question (e.g., "How many victory points does Alice have?")
        question: String,

        /// Also print the Cypher that produced the evidence
        #[arg(long, short = 'q')]
        show_query: bool,
    },

    /// Start an interactive conversation (/history, /clear, /exit)
    Chat,

    /// Generate Cypher for a question without running it
    Cypher {
        /// Natural language question
        question: String,
    },

    /// Serve the pipeline over HTTP
    #[cfg(feature = "http")]
    Serve {
        /// Address to bind
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port to listen on
        #[arg(long, short, default_value = "8080")]
        port: u16,
    },
}
