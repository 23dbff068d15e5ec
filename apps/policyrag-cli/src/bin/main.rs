use std::env;
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use policyrag_core::chunker::ChunkPolicy;
use policyrag_core::config::AppConfig;
use policyrag_core::error::RagError;
use policyrag_core::loader::load_documents;
use policyrag_core::types::DocumentSummary;
use policyrag_ollama::{default_embedding_provider, OllamaGenerator};
use policyrag_query::{
    CaseAssistant, ChatEngine, QueryEngine, QueryResponse, ResponseSynthesizer, Retriever,
};
use policyrag_vector::{IndexConfig, IndexHandle, IndexManager};

const SAMPLE_AI_OVERVIEW: &str = "\
Artificial Intelligence and Machine Learning

Artificial Intelligence (AI) is a branch of computer science that aims to create
intelligent machines that can simulate human thinking capability and behavior.
Machine Learning (ML) is a subset of AI that enables systems to learn and improve
from experience without being explicitly programmed.

Applications of AI and ML include:
- Healthcare: disease diagnosis, drug discovery, personalized medicine
- Finance: fraud detection, algorithmic trading, risk assessment
- Retail: recommendation systems, inventory management
";

const SAMPLE_NLP_BASICS: &str = "\
Natural Language Processing

Natural Language Processing (NLP) is a branch of artificial intelligence, and NLP
helps computers understand, interpret and manipulate human language.
NLP draws from computational linguistics; NLP fills the gap between human
communication and computer understanding.

Key NLP tasks include text classification, and NLP also covers named entity
recognition, sentiment analysis and machine translation.
Modern NLP heavily relies on transformer models, and NLP benchmarks show strong
performance across many NLP tasks.
";

fn parse_args() -> (String, Vec<String>) {
    let mut args: Vec<String> = env::args().collect();
    let prog = args.remove(0);
    if args.is_empty() {
        eprintln!("Usage: {prog} <ingest|query|case|chat|suggest|rebuild|stats|seed> [args...]");
        std::process::exit(1);
    }
    let cmd = args.remove(0);
    (cmd, args)
}

fn build_manager(config: &AppConfig) -> anyhow::Result<IndexManager> {
    let policy = ChunkPolicy::new(config.chunking.chunk_size, config.chunking.chunk_overlap)?;
    let embedder = default_embedding_provider(&config.ollama)?;
    Ok(IndexManager::new(
        IndexConfig::from_app(config),
        policy,
        embedder,
    ))
}

/// Load the persisted index, or build one when none exists yet.
async fn load_or_build(
    manager: &IndexManager,
    config: &AppConfig,
) -> anyhow::Result<Option<IndexHandle>> {
    match manager.load().await {
        Ok(handle) => Ok(Some(handle)),
        Err(RagError::IndexNotFound { .. }) => {
            println!("No existing index found. Building a new one...");
            Ok(manager.build(&config.documents_dir(), true, true).await?)
        }
        Err(err) => Err(err.into()),
    }
}

fn make_engine(
    handle: IndexHandle,
    manager: &IndexManager,
    config: &AppConfig,
) -> anyhow::Result<QueryEngine> {
    let retriever = Retriever::new(
        handle.store,
        manager.embedder(),
        config.query.top_k,
        config.query.similarity_cutoff,
    );
    let llm = Arc::new(OllamaGenerator::from_settings(&config.ollama)?);
    let synthesizer = ResponseSynthesizer::new(llm, config.query.response_mode);
    Ok(QueryEngine::new(retriever, synthesizer))
}

fn print_response(response: &QueryResponse) {
    println!("\n**Answer:** {}\n", response.answer);
    if !response.sources.is_empty() {
        println!("**Sources:**");
        for (i, source) in response.sources.iter().enumerate() {
            println!("{}. {}", i + 1, source.preview);
            println!("   Path: {}", source.doc_path);
            println!("   Score: {:.4}", source.score);
        }
    }
}

fn seed_sample_documents(dir: &Path) -> anyhow::Result<()> {
    fs::create_dir_all(dir)?;
    fs::write(dir.join("ai_overview.txt"), SAMPLE_AI_OVERVIEW)?;
    fs::write(dir.join("nlp_basics.txt"), SAMPLE_NLP_BASICS)?;
    println!("Sample documents created in {}", dir.display());
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::load().map_err(|e| {
        eprintln!("Error loading config: {e}");
        e
    })?;
    let (cmd, args) = parse_args();
    match cmd.as_str() {
        "ingest" => {
            let data_dir = args
                .first()
                .map(PathBuf::from)
                .unwrap_or_else(|| config.documents_dir());
            println!("Ingesting from {}", data_dir.display());
            let documents = load_documents(&data_dir, true)?;
            if documents.is_empty() {
                println!("No documents found. Run `policyrag seed` to create samples.");
                return Ok(());
            }
            let summary = DocumentSummary::of(&documents);
            println!(
                "Loaded {} documents ({} words, {} characters)",
                summary.total_documents, summary.total_words, summary.total_characters
            );
            for (ext, count) in &summary.by_extension {
                println!("  .{ext}: {count}");
            }
            let manager = build_manager(&config)?;
            match manager.build_from_documents(&documents, true).await? {
                Some(handle) => {
                    let stats = manager.stats(&handle).await;
                    println!(
                        "Ingest complete: {} chunks in {} backend at {}",
                        stats.total_chunks, stats.backend, stats.location
                    );
                }
                None => println!("Documents produced no chunks; nothing indexed."),
            }
        }
        "query" => {
            let question = args.first().cloned().unwrap_or_else(|| {
                eprintln!("Usage: policyrag query \"<question>\"");
                std::process::exit(1)
            });
            let manager = build_manager(&config)?;
            let Some(handle) = load_or_build(&manager, &config).await? else {
                println!("No documents to index. Run `policyrag seed` first.");
                return Ok(());
            };
            let engine = make_engine(handle, &manager, &config)?;
            let response = engine.query(&question).await?;
            print_response(&response);
        }
        "case" => {
            let question = args.first().cloned().unwrap_or_else(|| {
                eprintln!("Usage: policyrag case \"<question>\" [decision.json]");
                std::process::exit(1)
            });
            let decision_json = match args.get(1) {
                Some(path) => serde_json::from_str(&fs::read_to_string(path)?)?,
                // Stand-in payload; production callers pass the decision
                // service output.
                None => serde_json::json!({
                    "decision": {"final": "review", "confidence": "medium"},
                    "model": {"approval_prob": 0.62, "model_decision": "review"},
                    "rules": {"hard_fail": false, "checks": []}
                }),
            };
            let manager = build_manager(&config)?;
            let Some(handle) = load_or_build(&manager, &config).await? else {
                println!("No documents to index. Run `policyrag seed` first.");
                return Ok(());
            };
            let assistant = CaseAssistant::new(make_engine(handle, &manager, &config)?);
            let explanation = assistant.explain_case(&question, &decision_json).await?;
            println!("{}", serde_json::to_string_pretty(&explanation.answer)?);
            if !explanation.sources.is_empty() {
                println!("\nSources:");
                for source in &explanation.sources {
                    println!("- {} (score {:.4})", source.doc_path, source.score);
                }
            }
        }
        "chat" => {
            let mode = args.first().map(String::as_str).unwrap_or("condense_question");
            let llm = Arc::new(OllamaGenerator::from_settings(&config.ollama)?);
            let mut chat = match mode {
                "simple" => ChatEngine::simple(llm),
                _ => {
                    let manager = build_manager(&config)?;
                    let Some(handle) = load_or_build(&manager, &config).await? else {
                        println!("No documents to index. Run `policyrag seed` first.");
                        return Ok(());
                    };
                    ChatEngine::condense_question(llm, make_engine(handle, &manager, &config)?)
                }
            };
            let history_path = PathBuf::from("chat_history.json");
            chat.load_history(&history_path)?;

            println!("Chat session ({mode}). Type 'quit' or 'exit' to end.");
            let stdin = io::stdin();
            loop {
                print!("\nYou: ");
                io::stdout().flush()?;
                let mut line = String::new();
                if stdin.lock().read_line(&mut line)? == 0 {
                    break;
                }
                let message = line.trim();
                if message.is_empty() {
                    continue;
                }
                if message.eq_ignore_ascii_case("quit") || message.eq_ignore_ascii_case("exit") {
                    break;
                }
                match chat.chat(message).await {
                    Ok(response) => {
                        println!("\nAssistant: {}", response.answer);
                        for source in &response.sources {
                            println!("  [source] {} (score {:.4})", source.doc_path, source.score);
                        }
                    }
                    Err(err) => println!("Error: {err}"),
                }
            }
            chat.save_history(&history_path)?;
            println!("Chat history saved to {}", history_path.display());
        }
        "rebuild" => {
            let manager = build_manager(&config)?;
            match manager.rebuild(&config.documents_dir(), true).await? {
                Some(handle) => {
                    let stats = manager.stats(&handle).await;
                    println!("Rebuilt index: {} chunks", stats.total_chunks);
                }
                None => println!("No documents found; the old index was removed."),
            }
        }
        "stats" => {
            let manager = build_manager(&config)?;
            match manager.load().await {
                Ok(handle) => {
                    let stats = manager.stats(&handle).await;
                    println!("Total chunks: {}", stats.total_chunks);
                    println!("Backend:      {}", stats.backend);
                    println!("Location:     {}", stats.location);
                }
                Err(RagError::IndexNotFound { .. }) => {
                    println!("No index found. Run `policyrag ingest` first.");
                }
                Err(err) => return Err(err.into()),
            }
        }
        "suggest" => {
            let topic = args.first().cloned().unwrap_or_else(|| {
                eprintln!("Usage: policyrag suggest \"<topic>\"");
                std::process::exit(1)
            });
            let llm = OllamaGenerator::from_settings(&config.ollama)?;
            let suggestions = policyrag_query::suggest::query_suggestions(&llm, &topic, 5).await;
            if suggestions.is_empty() {
                println!("No suggestions available.");
            } else {
                println!("Query suggestions for '{topic}':");
                for (i, suggestion) in suggestions.iter().enumerate() {
                    println!("{}. {suggestion}", i + 1);
                }
            }
        }
        "seed" => {
            seed_sample_documents(&config.documents_dir())?;
        }
        _ => {
            eprintln!("Unknown command: {cmd}");
            std::process::exit(1);
        }
    }
    Ok(())
}
