//! VitalSwarm - Multi-Agent Health Data Analyzer
//!
//! A CLI tool that fans a roster of specialist LLM agents out over
//! personal health exports or clinical waiting lists and merges their
//! findings into a single report or priority recommendation.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (connection, config, import failure, etc.)

mod analysis;
mod cli;
mod config;
mod coordinator;
mod gateway;
mod import;
mod models;
mod profiles;
mod report;
mod server;
mod store;

use anyhow::{Context, Result};
use chrono::Utc;
use cli::{Args, Command, OutputFormat};
use config::Config;
use coordinator::{HealthCoordinator, HealthTrends, TriageCoordinator};
use gateway::OllamaClient;
use models::{ReportMetadata, WaitingList};
use server::AppState;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use store::RetentionStore;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        if let Err(e) = handle_init_config() {
            eprintln!("❌ Error: {}", e);
            std::process::exit(1);
        }
        return;
    }

    // Initialize logging
    init_logging(&args);

    info!("VitalSwarm v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    if let Err(e) = run(args).await {
        error!("Run failed: {}", e);
        eprintln!("\n❌ Error: {}", e);
        std::process::exit(1);
    }
}

/// Handle --init-config: generate a default .vitalswarm.toml.
fn handle_init_config() -> Result<()> {
    let path = std::path::Path::new(".vitalswarm.toml");

    if path.exists() {
        anyhow::bail!(".vitalswarm.toml already exists. Remove it first or edit it manually.");
    }

    let content = Config::default_toml();
    std::fs::write(path, &content).context("Failed to write .vitalswarm.toml")?;

    println!("✅ Created .vitalswarm.toml with default settings.");
    println!("   Edit it to customize model, import path, server port, and more.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args) {
    let level = args.log_level();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

/// Load configuration, merge CLI flags, and dispatch the subcommand.
async fn run(args: Args) -> Result<()> {
    let mut config = load_config(&args)?;
    config.merge_with_args(&args);

    let command = match args.command.clone() {
        Some(command) => command,
        None => anyhow::bail!("A subcommand is required"),
    };

    match command {
        Command::Analyze {
            input,
            format,
            output,
        } => run_analyze(&args, &config, input, format, output).await,
        Command::Serve { port } => run_serve(&config, port).await,
        Command::Triage {
            waiting_list,
            trends,
            output,
        } => run_triage(&args, &config, waiting_list, trends, output).await,
    }
}

/// Run the one-shot health analysis workflow.
async fn run_analyze(
    args: &Args,
    config: &Config,
    input: Option<PathBuf>,
    format: OutputFormat,
    output: Option<PathBuf>,
) -> Result<()> {
    let start_time = Instant::now();
    let csv_path = input.unwrap_or_else(|| PathBuf::from(&config.import.csv_path));

    println!("📥 Importing health export: {}", csv_path.display());
    let payload = import::parse_health_export(&csv_path)?;

    let client = OllamaClient::new(config.gateway_config());

    println!("🧠 Ingesting into retention store...");
    let mut store = RetentionStore::new();
    store.ingest(&client, payload, Utc::now()).await?;
    let context = store
        .current_context()
        .cloned()
        .context("No health documents ingested")?;

    println!("🤖 Running specialist analyses...");
    println!("   Model: {}", config.model.name);
    println!("   Ollama: {}", config.model.ollama_url);
    println!("   Timeout: {}s per call", config.model.timeout_seconds);

    let profiles = profiles::health_profiles();
    let coordinator = HealthCoordinator::new(&profiles, &client);
    let report = coordinator.run_analyses(&context).await?;

    println!("\n📝 Generating report...");
    let duration = start_time.elapsed().as_secs_f64();
    let metadata = ReportMetadata {
        analysis_date: Utc::now(),
        model_used: config.model.name.clone(),
        categories_analyzed: report.per_specialty.len(),
        duration_seconds: duration,
    };

    let rendered = match format {
        OutputFormat::Json => report::generate_json_report(&report)?,
        OutputFormat::Markdown => report::generate_markdown_report(&report, &metadata),
    };

    match output {
        Some(path) => {
            std::fs::write(&path, &rendered)
                .with_context(|| format!("Failed to write report to {}", path.display()))?;
            println!("\n✅ Analysis complete! Report saved to: {}", path.display());
        }
        None => {
            println!("\n{}", rendered);
        }
    }

    if !args.quiet {
        println!("📊 {} categories analyzed in {:.1}s", metadata.categories_analyzed, duration);
    }

    Ok(())
}

/// Serve the single analysis endpoint over HTTP.
async fn run_serve(config: &Config, port: Option<u16>) -> Result<()> {
    let port = port.unwrap_or(config.server.port);
    let client = OllamaClient::new(config.gateway_config());

    let state = AppState {
        model: Arc::new(client),
        store: Arc::new(Mutex::new(RetentionStore::new())),
        profiles: Arc::new(profiles::health_profiles()),
        csv_path: PathBuf::from(&config.import.csv_path),
    };

    println!("🌐 Serving health analysis endpoint");
    println!("   POST http://localhost:{}/analyze-health-data", port);
    println!("   Export: {}", state.csv_path.display());
    println!("   Model: {}", config.model.name);

    server::serve(state, port).await
}

/// Run the waiting-list batch assessment workflow.
async fn run_triage(
    args: &Args,
    config: &Config,
    waiting_list_path: PathBuf,
    trends_path: Option<PathBuf>,
    output: Option<PathBuf>,
) -> Result<()> {
    println!("📥 Loading waiting list: {}", waiting_list_path.display());
    let waiting_list: WaitingList = serde_json::from_str(
        &std::fs::read_to_string(&waiting_list_path).with_context(|| {
            format!("Failed to read waiting list: {}", waiting_list_path.display())
        })?,
    )
    .with_context(|| format!("Failed to parse waiting list: {}", waiting_list_path.display()))?;

    let health_trends: HealthTrends = match trends_path {
        Some(path) => serde_json::from_str(
            &std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read health trends: {}", path.display()))?,
        )
        .with_context(|| format!("Failed to parse health trends: {}", path.display()))?,
        None => HealthTrends::new(),
    };

    let client = OllamaClient::new(config.gateway_config());

    println!("🤖 Starting priority assessment...");
    println!("   Patients: {}", waiting_list.waiting_list_data.len());
    println!("   Model: {}", config.model.name);

    let profiles = profiles::triage_profiles();
    let coordinator = TriageCoordinator::new(&profiles, &client);
    let results = coordinator
        .process_batch(&waiting_list, &health_trends, !args.quiet)
        .await?;

    let json = serde_json::to_string_pretty(&results)
        .context("Failed to serialize assessment results")?;

    let output_path = output.unwrap_or_else(|| PathBuf::from(&config.triage.output));
    std::fs::write(&output_path, &json)
        .with_context(|| format!("Failed to write results to {}", output_path.display()))?;

    println!("\n=== Priority Assessment Results ===\n");
    println!("{}", json);

    let changes = results.iter().filter(|r| r.change_required).count();
    println!(
        "\n✅ Assessed {} patients ({} priority changes). Results saved to: {}",
        results.len(),
        changes,
        output_path.display()
    );

    Ok(())
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from .vitalswarm.toml");
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {}", e);
            Ok(Config::default())
        }
    }
}
