//! docrule - check documents against natural-language rules.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use docrule_cli::{AppState, CheckReport, HttpServer, OutputFormat, PdftotextExtractor, ServerConfig, TextExtractor};
use docrule_core::{Document, RuleSet};
use docrule_runtime::{provider_from_env, RuntimeConfig, RuntimeOrchestrator, RuntimeOrchestratorBuilder};

#[derive(Debug, Parser)]
#[command(
    name = "docrule",
    about = "Check documents against natural-language rules",
    version
)]
struct Cli {
    /// Debug logging (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Evaluate rules against a PDF or plain-text file
    Check(CheckArgs),

    /// Serve the HTTP API
    Serve {
        /// Port to bind (overrides PORT)
        #[arg(long)]
        port: Option<u16>,

        /// Host to bind (overrides DOCRULE_HOST)
        #[arg(long)]
        host: Option<String>,
    },
}

#[derive(Debug, Args)]
struct CheckArgs {
    /// Document to check
    document: PathBuf,

    /// Rule to evaluate; repeat for several
    #[arg(
        short,
        long = "rule",
        value_name = "RULE",
        required_unless_present = "rules_file",
        conflicts_with = "rules_file"
    )]
    rules: Vec<String>,

    /// YAML or JSON file with the rules
    #[arg(long, value_name = "FILE")]
    rules_file: Option<PathBuf>,

    /// Never call the LLM, even when GEMINI_API_KEY is set
    #[arg(long)]
    heuristic_only: bool,

    /// Seed for reproducible heuristic confidence (overrides DOCRULE_JITTER_SEED)
    #[arg(long)]
    seed: Option<u64>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env is optional
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Check(args) => run_check(args).await,
        Commands::Serve { port, host } => run_serve(port, host).await,
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

async fn run_check(args: CheckArgs) -> anyhow::Result<()> {
    let rules = match &args.rules_file {
        Some(path) => RuleSet::from_file(path)
            .with_context(|| format!("Failed to load rules from {}", path.display()))?,
        None => RuleSet::new(&args.rules)?,
    };

    let bytes = std::fs::read(&args.document)
        .with_context(|| format!("Failed to read {}", args.document.display()))?;
    let extracted = PdftotextExtractor::new()
        .extract(&bytes)
        .with_context(|| format!("Failed to extract text from {}", args.document.display()))?;
    let document = Document::new(extracted.text)
        .context("Unable to extract text from the document")?
        .with_pages(extracted.pages);

    let mut config = RuntimeConfig::from_env()?;
    if let Some(seed) = args.seed {
        config.jitter_seed = Some(seed);
    }
    let provider = if args.heuristic_only {
        None
    } else {
        provider_from_env(&config)?
    };

    let orchestrator = RuntimeOrchestratorBuilder::new()
        .maybe_provider(provider)
        .config(config)
        .build()?;

    let outcome = orchestrator.evaluate_detailed(&rules, &document).await;
    let report = CheckReport::new(document.pages(), &outcome);
    println!("{}", report.render(args.format)?);

    Ok(())
}

async fn run_serve(port: Option<u16>, host: Option<String>) -> anyhow::Result<()> {
    let mut config = ServerConfig::from_env()?;
    if let Some(port) = port {
        config.port = port;
    }
    if let Some(host) = host {
        config.host = host;
    }

    if !PdftotextExtractor::available() {
        tracing::warn!("pdftotext not found on PATH; PDF uploads will fail");
    }

    let orchestrator = RuntimeOrchestrator::from_env()?;
    let state = AppState::new(orchestrator, Arc::new(PdftotextExtractor::new()));

    HttpServer::new(config, state).start().await
}
