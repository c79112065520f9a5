use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use search_core::{process_queries, DocId, DocumentStatus, Execution, Rating, SearchConfig, SearchServer, StopWords};
use serde::Deserialize;
use tracing_subscriber::{fmt, EnvFilter};
use walkdir::WalkDir;

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize)]
struct InputDoc {
    id: DocId,
    text: String,
    #[serde(default)]
    status: DocumentStatus,
    #[serde(default)]
    ratings: Vec<Rating>,
}

#[derive(Parser)]
#[command(name = "indexer")]
#[command(about = "Load documents into an in-memory TF-IDF index and query it", long_about = None)]
struct Cli {
    /// Input path (JSON/JSONL file or directory of them)
    #[arg(long)]
    input: String,
    /// Space-separated stop words
    #[arg(long, default_value = "")]
    stop_words: String,
    /// JSON file with search settings
    #[arg(long)]
    config: Option<PathBuf>,
    /// Use the rayon pool for searches and removals
    #[arg(long, default_value_t = false)]
    parallel: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the top documents for each query
    Search {
        /// Queries; `-word` excludes documents containing word
        #[arg(required = true)]
        queries: Vec<String>,
        /// Only return documents with this status
        #[arg(long, value_parser = parse_status, default_value = "actual")]
        status: DocumentStatus,
    },
    /// Print the query words found in one document
    Match {
        #[arg(long)]
        id: DocId,
        query: String,
    },
    /// Remove documents whose word sets duplicate a lower id
    Dedup,
    /// Print document and word counts
    Stats,
}

fn parse_status(s: &str) -> std::result::Result<DocumentStatus, String> {
    serde_json::from_value(serde_json::Value::String(s.to_lowercase())).map_err(|e| e.to_string())
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => SearchConfig::load(path)?,
        None => SearchConfig::default(),
    };
    let server = SearchServer::with_config(StopWords::parse(&cli.stop_words)?, config);
    let loaded = load_documents(Path::new(&cli.input), &server)?;
    tracing::info!(loaded, input = %cli.input, "documents indexed");

    let mode = if cli.parallel { Execution::Parallel } else { Execution::Sequential };
    match cli.command {
        Commands::Search { queries, status } => search(&server, mode, &queries, status),
        Commands::Match { id, query } => {
            let (words, status) = server.match_document(mode, &query, id)?;
            println!("{}", serde_json::json!({ "document_id": id, "status": status, "words": words }));
            Ok(())
        }
        Commands::Dedup => {
            let removed = server.remove_duplicates();
            println!("{}", serde_json::json!({ "removed": removed, "remaining": server.document_count() }));
            Ok(())
        }
        Commands::Stats => {
            for id in &server {
                let words = server.word_frequencies(id);
                println!("{}", serde_json::json!({ "document_id": id, "words": words.len() }));
            }
            println!(
                "{}",
                serde_json::json!({
                    "documents": server.document_count(),
                    "stop_words": server.stop_words().len(),
                    "max_results": server.config().max_results,
                })
            );
            Ok(())
        }
    }
}

fn search(server: &SearchServer, mode: Execution, queries: &[String], status: DocumentStatus) -> Result<()> {
    // Default status over several queries goes through the batch path.
    let results = if status == DocumentStatus::Actual && mode == Execution::Parallel {
        process_queries(server, queries)?
    } else {
        queries
            .iter()
            .map(|q| server.find_top_documents_with_status(mode, q, status))
            .collect::<search_core::Result<Vec<_>>>()?
    };
    for (query, documents) in queries.iter().zip(results) {
        println!("{}", serde_json::json!({ "query": query, "results": documents }));
    }
    Ok(())
}

fn load_documents(input: &Path, server: &SearchServer) -> Result<usize> {
    let mut files: Vec<PathBuf> = Vec::new();
    if input.is_dir() {
        for entry in WalkDir::new(input).sort_by_file_name().into_iter().filter_map(|e| e.ok()) {
            let p = entry.path();
            if p.is_file() && matches!(p.extension().and_then(|s| s.to_str()), Some("json" | "jsonl")) {
                files.push(p.to_path_buf());
            }
        }
    } else if input.is_file() {
        files.push(input.to_path_buf());
    } else {
        anyhow::bail!("input {} does not exist", input.display());
    }

    let mut loaded = 0;
    for file in files {
        let docs = if file.extension().and_then(|s| s.to_str()) == Some("jsonl") {
            read_jsonl(&file)?
        } else {
            read_json(&file)?
        };
        for doc in docs {
            // Malformed documents are reported and skipped; the rest of the batch still loads.
            match server.add_document(doc.id, &doc.text, doc.status, &doc.ratings) {
                Ok(()) => loaded += 1,
                Err(e) => tracing::warn!(id = doc.id, file = %file.display(), error = %e, "skipping document"),
            }
        }
    }
    Ok(loaded)
}

fn read_jsonl(file: &Path) -> Result<Vec<InputDoc>> {
    let reader = BufReader::new(File::open(file).with_context(|| format!("opening {}", file.display()))?);
    let mut docs = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() { continue; }
        docs.push(serde_json::from_str(&line).with_context(|| format!("parsing {}", file.display()))?);
    }
    Ok(docs)
}

fn read_json(file: &Path) -> Result<Vec<InputDoc>> {
    let reader = BufReader::new(File::open(file).with_context(|| format!("opening {}", file.display()))?);
    let json: serde_json::Value = serde_json::from_reader(reader)?;
    let docs = match json {
        serde_json::Value::Array(arr) => arr.into_iter().map(serde_json::from_value).collect::<Result<Vec<_>, _>>()?,
        obj @ serde_json::Value::Object(_) => vec![serde_json::from_value(obj)?],
        _ => Vec::new(),
    };
    Ok(docs)
}
