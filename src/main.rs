use anyhow::Context;
use clap::{Parser, Subcommand};
use doc_query::Result;
use doc_query::commands::{ask, embed_collection, query, show_status};
use doc_query::config::{Config, get_config_dir, run_interactive_config, show_config};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "doc-query")]
#[command(about = "Run structured and semantic queries against a document collection")]
#[command(version)]
struct Cli {
    /// Configuration directory (defaults to ~/.doc-query)
    #[arg(long, global = true)]
    config_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Configure the collection, search and Ollama settings
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,
    },
    /// Run a structured query, given as JSON or @file
    Query {
        /// e.g. '{"mode": "distinct", "distinctField": "telecallerName"}'
        spec: String,
        /// Print rows as JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Answer a free-text question with the most similar documents
    Ask {
        question: String,
        /// Number of documents to return
        #[arg(short, long)]
        k: Option<usize>,
        /// Print rows as JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Compute embeddings for documents that lack one
    Embed,
    /// Show collection and Ollama status
    Status,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config_dir = match cli.config_dir {
        Some(dir) => dir,
        None => get_config_dir()?,
    };

    if let Commands::Config { show } = cli.command {
        if show {
            show_config(&config_dir)?;
        } else {
            run_interactive_config(&config_dir)?;
        }
        return Ok(());
    }

    let config = Config::load(&config_dir)
        .with_context(|| format!("Failed to load configuration from {}", config_dir.display()))?;

    match cli.command {
        Commands::Query { spec, json } => query(&config, &spec, json)?,
        Commands::Ask { question, k, json } => ask(&config, &question, k, json)?,
        Commands::Embed => {
            embed_collection(&config)?;
        }
        Commands::Status => show_status(&config)?,
        Commands::Config { .. } => {}
    }

    Ok(())
}
