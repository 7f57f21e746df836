use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::*;
use tracing::Level;

use splice_core::{Settings, VectorStore};
use splice_openai::OpenAiClient;
use splice_rag::{chunk_pages, extract_text, LocalVectorStore, SpliceEngine};

#[derive(Parser)]
#[command(name = "datasplice")]
#[command(about = "Retrieval-augmented document QA with cited evidence", long_about = None)]
struct Cli {
    /// Enable verbose pipeline logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Preview how a document would be chunked (no API calls)
    Chunk {
        /// Document to chunk (.txt or .md)
        file: PathBuf,

        /// Target tokens per chunk
        #[arg(long)]
        chunk_size: Option<usize>,

        /// Overlap tokens between chunks
        #[arg(long)]
        chunk_overlap: Option<usize>,
    },
    /// Ingest documents and answer a question against them
    Ask {
        /// The question to answer
        query: String,

        /// Documents to ingest (.txt or .md)
        #[arg(short, long, required = true, num_args = 1..)]
        files: Vec<PathBuf>,

        /// Number of chunks to retrieve
        #[arg(short = 'k', long)]
        top_k: Option<usize>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let level = if cli.verbose { Level::INFO } else { Level::WARN };
    tracing_subscriber::fmt().with_max_level(level).init();

    match cli.command {
        Commands::Chunk {
            file,
            chunk_size,
            chunk_overlap,
        } => chunk_preview(&file, chunk_size, chunk_overlap),
        Commands::Ask {
            query,
            files,
            top_k,
        } => ask(&query, &files, top_k).await,
    }
}

fn chunk_preview(
    file: &PathBuf,
    chunk_size: Option<usize>,
    chunk_overlap: Option<usize>,
) -> Result<()> {
    let settings = Settings::from_env();
    let chunk_size = chunk_size.unwrap_or(settings.chunk_size);
    let chunk_overlap = chunk_overlap.unwrap_or(settings.chunk_overlap);

    let pages = extract_text(file)?;
    let file_name = file
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("document");
    let chunks = chunk_pages(&pages, file_name, chunk_size, chunk_overlap);

    println!(
        "{} {} chunk(s) from {} page(s)",
        "Created".green().bold(),
        chunks.len(),
        pages.len()
    );

    for chunk in &chunks {
        let preview: String = chunk.text.chars().take(60).collect();
        println!(
            "  {} {:>4} tokens  {}",
            chunk.chunk_id().dimmed(),
            chunk.metadata.token_estimate,
            preview
        );
    }

    Ok(())
}

async fn ask(query: &str, files: &[PathBuf], top_k: Option<usize>) -> Result<()> {
    let settings = Settings::from_env();

    let openai = Arc::new(OpenAiClient::from_env()?);
    let mut store = LocalVectorStore::new();
    store.connect().await?;
    let store = Arc::new(store);

    let engine = SpliceEngine::new(openai.clone(), store, openai, settings);

    // Ingest requested documents, collecting per-file failures without
    // aborting the whole run
    let mut errors = Vec::new();
    for file in files {
        match engine.ingest_file(file).await {
            Ok(report) if report.ok => {
                println!(
                    "{} {} ({} chunks)",
                    "Ingested".green().bold(),
                    file.display(),
                    report.added_chunks
                );
            }
            Ok(report) => {
                errors.extend(report.errors);
            }
            Err(e) => {
                errors.push(format!("{}: {}", file.display(), e));
            }
        }
    }

    for error in &errors {
        eprintln!("{} {}", "Warning:".yellow().bold(), error);
    }

    let stats = engine.stats().await?;
    if stats.chunk_count == 0 {
        anyhow::bail!("no documents could be ingested");
    }
    println!(
        "{} {} chunks from {} file(s)\n",
        "Corpus:".bold(),
        stats.chunk_count,
        stats.file_count
    );

    let response = engine.query(query, top_k).await?;

    println!("{}", "Answer".bold().underline());
    println!("{}\n", response.summary);

    for subtopic in &response.subtopics {
        println!("{}", subtopic.title.cyan().bold());
        for bullet in &subtopic.bullets {
            println!("  - {}", bullet);
        }
        for citation in &subtopic.citations {
            println!(
                "    {} {} (page {})",
                "src:".dimmed(),
                citation.file.dimmed(),
                citation.page
            );
        }
        println!();
    }

    let label = response.confidence_label.as_str();
    let label_colored = match label {
        "High" => label.green().bold(),
        "Medium" => label.yellow().bold(),
        _ => label.red().bold(),
    };
    println!(
        "{} {:.2} ({}) from {} citation(s)",
        "Confidence:".bold(),
        response.confidence,
        label_colored,
        response.citations_flat.len()
    );

    Ok(())
}
