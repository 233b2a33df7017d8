use anyhow::{Context, Result};
use itertools::Itertools;
use std::fs;
use tracing::{debug, info};

use crate::config::Config;
use crate::embeddings::OllamaClient;
use crate::query::{ResultTable, execute, flatten};
use crate::rag::{VectorSearch, embed_documents, semantic_search};
use crate::request::QueryRequest;
use crate::store::path::get_path;
use crate::store::{ID_FIELD, MemoryStore};

/// Counts reported by `status`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionStatus {
    pub documents: usize,
    pub embedded: usize,
    pub columns: Vec<String>,
}

/// Open the configured collection file.
#[inline]
pub fn open_store(config: &Config) -> Result<MemoryStore> {
    let path = config.collection_path();
    debug!("Opening collection {}", path.display());
    MemoryStore::load(&path)
        .with_context(|| format!("Failed to open collection: {}", path.display()))
}

/// Inline JSON, or `@path` to read the request from a file.
#[inline]
pub fn read_request_argument(argument: &str) -> Result<String> {
    match argument.strip_prefix('@') {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("Failed to read query file: {}", path)),
        None => Ok(argument.to_string()),
    }
}

/// Parse, validate and execute a JSON query request against `store`.
#[inline]
pub fn run_query(config: &Config, store: &MemoryStore, request: &str) -> Result<ResultTable> {
    let spec = QueryRequest::parse(request)
        .and_then(|request| request.into_spec(&config.field_policy()))
        .context("Invalid query")?;

    let table = execute(&spec, store).context("Query failed")?;
    info!("Query returned {} rows", table.len());
    Ok(table)
}

/// `query` command
#[inline]
pub fn query(config: &Config, argument: &str, json: bool) -> Result<()> {
    let request = read_request_argument(argument)?;
    let store = open_store(config)?;
    let table = run_query(config, &store, &request)?;
    print_table(&table, json)
}

/// `ask` command: semantic search for a free-text question
#[inline]
pub fn ask(config: &Config, question: &str, k: Option<usize>, json: bool) -> Result<()> {
    if !config.search.enabled {
        anyhow::bail!("Semantic search is disabled; enable it with 'doc-query config'");
    }

    let mut search_config = config.search.clone();
    if let Some(k) = k {
        search_config.set_k(k)?;
    }

    let store = open_store(config)?;
    let embedder = OllamaClient::new(&config.ollama).context("Failed to create Ollama client")?;
    let search = VectorSearch::new(&search_config);

    let table = semantic_search(&search, &store, &embedder, question, search_config.k)?;
    if table.is_empty() {
        eprintln!(
            "No documents carry a '{}' vector yet. Run 'doc-query embed' first.",
            search.embedding_field()
        );
    }
    print_table(&table, json)
}

/// `embed` command: compute missing embeddings and save the collection.
#[inline]
pub fn embed_collection(config: &Config) -> Result<usize> {
    let path = config.collection_path();
    let mut store = open_store(config)?;
    let embedder = OllamaClient::new(&config.ollama).context("Failed to create Ollama client")?;

    embedder
        .health_check()
        .context("Ollama is not ready for embedding")?;

    let embedded = embed_documents(&mut store, &embedder, &config.search)?;
    if embedded > 0 {
        store
            .save(&path)
            .with_context(|| format!("Failed to save collection: {}", path.display()))?;
    }

    println!("Embedded {} documents ({} total)", embedded, store.len());
    Ok(embedded)
}

/// Document, embedding and column counts for `store`.
#[inline]
pub fn collection_status(store: &MemoryStore, embedding_field: &str) -> CollectionStatus {
    let embedded = store
        .documents()
        .iter()
        .filter(|document| get_path(document, embedding_field).is_some_and(|v| v.is_array()))
        .count();

    let columns = store
        .documents()
        .iter()
        .flat_map(|document| flatten(document).into_iter().map(|(key, _)| key))
        .filter(|key| key != ID_FIELD)
        .unique()
        .collect();

    CollectionStatus {
        documents: store.len(),
        embedded,
        columns,
    }
}

/// `status` command
#[inline]
pub fn show_status(config: &Config) -> Result<()> {
    println!("📊 Doc-Query Status Report");
    println!("{}", "=".repeat(50));
    println!();

    println!("🗄️  Collection Status:");
    println!(
        "   📁 {}.{} ({})",
        config.store.database,
        config.store.collection,
        config.collection_path().display()
    );
    match open_store(config) {
        Ok(store) => {
            let status = collection_status(&store, &config.search.embedding_field);
            println!("   ✅ Documents: {}", status.documents);
            println!(
                "   🔢 Embedded: {} / {}",
                status.embedded, status.documents
            );
            if !status.columns.is_empty() {
                println!("   📋 Columns: {}", status.columns.iter().join(", "));
            }
        }
        Err(e) => {
            println!("   ❌ Collection: {:#}", e);
        }
    }

    println!();
    println!("🤖 Ollama Status:");
    if !config.search.enabled {
        println!("   ⏸️  Semantic search disabled");
        return Ok(());
    }

    match OllamaClient::new(&config.ollama) {
        Ok(client) => match client.health_check() {
            Ok(()) => {
                println!(
                    "   ✅ Ollama: Connected ({}:{})",
                    config.ollama.host, config.ollama.port
                );
                println!("   📋 Model: {}", config.ollama.model);
                println!("   🔢 Batch Size: {}", config.ollama.batch_size);
            }
            Err(e) => {
                println!("   ⚠️  Ollama: Connected but unhealthy - {}", e);
            }
        },
        Err(e) => {
            println!("   ❌ Ollama: Failed to connect - {}", e);
        }
    }

    Ok(())
}

/// Print `table` as a text grid, or as a JSON array of rows.
#[inline]
pub fn print_table(table: &ResultTable, json: bool) -> Result<()> {
    if json {
        let rendered =
            serde_json::to_string_pretty(table).context("Failed to serialize results")?;
        println!("{}", rendered);
    } else {
        print!("{}", table);
        eprintln!("({} rows)", table.len());
    }
    Ok(())
}
