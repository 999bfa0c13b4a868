use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::*;
use std::path::PathBuf;
use std::sync::Arc;

use folio_core::PipelineConfig;
use folio_providers::{create_chat_provider, create_embedding_provider};
use folio_rag::{create_vector_store, Ingestor, RagChat};
use folio_server::{AppState, RateLimiter, RequestLimits};

#[derive(Parser)]
#[command(name = "folio")]
#[command(about = "Portfolio site chat backend", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP chat server
    Serve,
    /// Load, chunk, embed, and store a document directory
    Ingest {
        /// Directory holding the site content
        #[arg(long, default_value = "content")]
        dir: PathBuf,
        /// Descend into subdirectories
        #[arg(long)]
        recursive: bool,
    },
    /// Run a similarity search against the stored corpus
    Search {
        query: String,
        #[arg(long)]
        top_k: Option<usize>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();
    let config = PipelineConfig::from_env();

    match cli.command {
        Commands::Serve => serve(config).await,
        Commands::Ingest { dir, recursive } => ingest(config, &dir, recursive).await,
        Commands::Search { query, top_k } => search(config, &query, top_k).await,
    }
}

async fn serve(config: PipelineConfig) -> Result<()> {
    let embeddings = create_embedding_provider(&config.embedding)?;
    let store = create_vector_store(&config.vector_store)?;
    let chat = create_chat_provider(&config.chat, &config.embedding.ollama_base_url)?;

    if store.ping().await {
        println!("✅ Vector store ({}) reachable", store.name());
    } else {
        println!(
            "{}",
            format!(
                "⚠️  Vector store ({}) not reachable, chat will degrade",
                store.name()
            )
            .yellow()
        );
    }

    let engine = Arc::new(RagChat::new(
        embeddings.clone(),
        store.clone(),
        chat,
        config.vector_store.top_k,
        config.chat.site_owner.clone(),
    ));
    let ingestor = Arc::new(Ingestor::new(embeddings, store, config.chunking.clone()));

    let state = AppState {
        engine,
        ingestor,
        limiter: Arc::new(RateLimiter::new(&config.rate_limit)),
        limits: RequestLimits::from(&config.chat),
    };

    println!(
        "🚀 folio listening on {} (chat: {}, store: {})",
        config.server.bind_addr.cyan(),
        config.chat.provider,
        config.vector_store.provider
    );
    folio_server::serve(state, &config.server).await?;
    Ok(())
}

async fn ingest(config: PipelineConfig, dir: &PathBuf, recursive: bool) -> Result<()> {
    let embeddings = create_embedding_provider(&config.embedding)?;
    let store = create_vector_store(&config.vector_store)?;
    let ingestor = Ingestor::new(embeddings, store, config.chunking.clone());

    println!(
        "📚 Ingesting {} into the {} store...",
        dir.display().to_string().cyan(),
        config.vector_store.provider
    );

    let on_progress = |current: usize, total: usize| {
        println!("   embedded {}/{}", current, total);
    };
    let report = ingestor
        .ingest_directory(dir, recursive, Some(&on_progress))
        .await?;

    for doc in &report.documents {
        println!("✅ {} → {} chunks", doc.filename, doc.chunks);
    }
    println!(
        "{}",
        format!(
            "Done: {} documents, {} records, ~{} KiB",
            report.documents.len(),
            report.records,
            report.approx_bytes / 1024
        )
        .green()
    );
    Ok(())
}

async fn search(config: PipelineConfig, query: &str, top_k: Option<usize>) -> Result<()> {
    let embeddings = create_embedding_provider(&config.embedding)?;
    let store = create_vector_store(&config.vector_store)?;
    let top_k = top_k.unwrap_or(config.vector_store.top_k);

    let embedding = embeddings.embed(query).await?;
    let results = store.search(&embedding, top_k).await?;

    if results.is_empty() {
        println!("{}", "No matches above the similarity threshold.".yellow());
        return Ok(());
    }
    for (i, result) in results.iter().enumerate() {
        println!(
            "{} {} {}",
            format!("{}.", i + 1).cyan(),
            format!("[{:.3}]", result.score).green(),
            result.id
        );
        println!("   {}", result.text.replace('\n', " "));
    }
    Ok(())
}
