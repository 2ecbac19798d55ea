use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use lawqa_cli::{ai_health_check, load_config, App};
use lawqa_core::error::AppError;
use tracing_subscriber::{layer::SubscriberExt as _, util::SubscriberInitExt as _};

#[derive(Parser)]
#[command(name = "lawqa")]
#[command(about = "Question answering over Decree 168 with a local Ollama", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "lawqa.toml", help = "Config file")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Rebuild the chunk cache and vector index from the documents directory")]
    Build,

    #[command(about = "Show the chunks nearest to a query")]
    Search {
        query: String,

        #[arg(short = 'k', long, help = "Number of chunks to return (overrides config)")]
        top_k: Option<usize>,
    },

    #[command(about = "Answer a question from the retrieved chunks")]
    Ask {
        question: String,

        #[arg(short = 'k', long, help = "Number of chunks to retrieve (overrides config)")]
        top_k: Option<usize>,
    },

    #[command(about = "Show the loaded knowledge base")]
    Status,

    #[command(about = "Check that Ollama is reachable")]
    Health,
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lawqa=info,lawqa_rag=info,lawqa_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e.describe());
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), AppError> {
    let config = load_config(&cli.config)?;

    match cli.command {
        Commands::Health => print_json(&ai_health_check(&config)?),
        Commands::Build => {
            let (_app, report) = App::rebuild(config)?;
            print_json(&report)
        }
        Commands::Search { query, top_k } => {
            let app = App::open(config)?;
            print_json(&app.search(&query, top_k)?)
        }
        Commands::Ask { question, top_k } => {
            let app = App::open(config)?;
            let resp = app.ask(&question, top_k)?;
            tracing::debug!(sources = resp.sources.len(), "answer received");
            println!("{}", resp.answer.trim_end());
            Ok(())
        }
        Commands::Status => {
            let app = App::open(config)?;
            print_json(&app.status())
        }
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<(), AppError> {
    let out = serde_json::to_string_pretty(value).map_err(|e| {
        AppError::new("CLI_OUTPUT_FAILED", "Failed to encode output").with_details(e.to_string())
    })?;
    println!("{out}");
    Ok(())
}
