//! # docqa
//!
//! Ask questions about a folder of documents.
//!
//! ## Commands
//!
//! - `docqa ingest [--input DIR]`: extract, chunk, embed and index every
//!   supported file, then save the index snapshot
//! - `docqa ask <QUESTION> [--max-images N]`: answer one question and print
//!   its references
//! - `docqa chat`: interactive console
//!
//! Settings come from `config.json` (or `--config PATH`). The OpenAI API key
//! is read from `OPENAI_API_KEY`, optionally set in a `.env` file.

mod config;
mod console;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use docqa_extract::default_extractors;
use docqa_model::OpenAIClient;
use docqa_rag::{
    Answer, EmbeddingProvider, InMemoryIndex, IngestionPipeline, OpenAIEmbeddingProvider,
    QueryPipeline, RagConfig, RagError,
};
use tracing::info;

use config::AppConfig;

#[derive(Parser)]
#[command(name = "docqa")]
#[command(about = "Question answering over your documents, with page citations")]
#[command(version)]
struct Cli {
    /// Path to the JSON config file (default: ./config.json)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log as JSON lines instead of plain text
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ingest every supported file in a folder and save the index
    Ingest {
        /// Folder to ingest (default: settings.input_folder)
        #[arg(short, long)]
        input: Option<PathBuf>,
    },

    /// Answer a single question
    Ask {
        /// The question
        question: String,

        /// Maximum number of images sent to the model
        #[arg(short, long)]
        max_images: Option<usize>,
    },

    /// Interactive question console
    Chat {
        /// Maximum number of images sent to the model
        #[arg(short, long)]
        max_images: Option<usize>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let telemetry = if cli.json_logs {
        docqa_telemetry::init_json_telemetry("docqa")
    } else {
        docqa_telemetry::init_telemetry("docqa")
    };
    telemetry.context("failed to initialise logging")?;

    let app = AppConfig::load(cli.config.as_deref())?;
    let rag = app.rag_config().context("invalid configuration")?;

    match cli.command {
        Commands::Ingest { input } => {
            let folder = input.unwrap_or_else(|| app.settings.input_folder.clone());
            ingest(&app, rag, folder).await
        }
        Commands::Ask { question, max_images } => {
            let max_images = max_images.unwrap_or(rag.max_images);
            let pipeline = query_pipeline(&app, rag).await?;
            let answer = pipeline.answer_question(&question, max_images).await?;
            print_answer(&answer);
            Ok(())
        }
        Commands::Chat { max_images } => {
            let max_images = max_images.unwrap_or(rag.max_images);
            let pipeline = query_pipeline(&app, rag).await?;
            console::run(&pipeline, max_images).await
        }
    }
}

fn embedder(app: &AppConfig) -> Result<Arc<dyn EmbeddingProvider>> {
    let mut provider =
        OpenAIEmbeddingProvider::from_env()?.with_model(&app.openai.embedding_model);
    if let Some(dims) = app.openai.embedding_dimensions {
        provider = provider.with_dimensions(dims);
    }
    Ok(Arc::new(provider))
}

async fn ingest(app: &AppConfig, rag: RagConfig, folder: PathBuf) -> Result<()> {
    let index = Arc::new(
        InMemoryIndex::new(embedder(app)?).with_similarity_threshold(rag.similarity_threshold),
    );
    let pipeline = IngestionPipeline::builder()
        .config(rag)
        .index(index.clone())
        .extractors(default_extractors())
        .image_summarizer(Arc::new(OpenAIClient::from_env()?))
        .image_dir(&app.settings.output_folder)
        .build()?;

    let summary = pipeline
        .ingest_directory(&folder)
        .await
        .with_context(|| format!("cannot ingest {}", folder.display()))?;
    index.save(&app.settings.index_path).await?;

    info!(index = %app.settings.index_path.display(), "index saved");
    println!(
        "Ingested {} file(s) into {} record(s); {} skipped, {} failed.",
        summary.files_ingested, summary.records_indexed, summary.files_skipped, summary.files_failed
    );
    Ok(())
}

async fn query_pipeline(app: &AppConfig, rag: RagConfig) -> Result<QueryPipeline> {
    let index_path = &app.settings.index_path;
    let index = match InMemoryIndex::load(index_path, embedder(app)?).await {
        Ok(index) => index.with_similarity_threshold(rag.similarity_threshold),
        Err(RagError::NotFound(path)) => {
            anyhow::bail!("no index at {}; run `docqa ingest` first", path.display())
        }
        Err(e) => return Err(e.into()),
    };

    let pipeline = QueryPipeline::builder()
        .config(rag)
        .index(Arc::new(index))
        .model(Arc::new(OpenAIClient::from_env()?))
        .build()?;
    Ok(pipeline)
}

pub(crate) fn print_answer(answer: &Answer) {
    println!("{}", answer.answer);
    if !answer.references.is_empty() {
        println!("\n{}", answer.references);
    }
}
