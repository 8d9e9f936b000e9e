use anyhow::Context;
use behavior::BehaviorEngine;
use cache::{Cache, MemoryCache, NoCache};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use configuration::{Config, LogFormat, LoggingSettings, load_config, load_config_from};
use database::{DbRepository, MemoryStore, RecordStore, connect, run_migrations};
use engine::{
    AnalysisQueue, AnalyticsService, BehaviorAnalyzer, ReportAssembler, TradeJournal,
    weekly_period,
};
use narrator::{NarrativeGenerator, OpenAiNarrator};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;
use web_server::AppState;

/// The main entry point for the EdgeIQ analytics engine.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine; the environment may already be set.
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let mut config = match &cli.config {
        Some(path) => load_config_from(path)?,
        None => load_config()?,
    };
    if let Some(format) = cli.log_format {
        config.logging.format = format;
    }
    let _guard = init_logging(&config.logging)?;

    let store = open_store(&config, cli.in_memory).await?;

    match cli.command {
        Commands::Serve(args) => handle_serve(args, config, store).await,
        Commands::Analyze(args) => handle_analyze(args, config, store).await,
        Commands::Report(args) => handle_report(args, config, store).await,
    }
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// Trading performance and behavior analytics for a trade journal.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the configuration file (defaults to ./config.toml).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Overrides `logging.format`.
    #[arg(long, global = true, value_enum)]
    log_format: Option<LogFormat>,

    /// Keep all records in process memory instead of PostgreSQL.
    #[arg(long, global = true)]
    in_memory: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API.
    Serve(ServeArgs),
    /// Run a behavior analysis for one trader and print it.
    Analyze(AnalyzeArgs),
    /// Generate a period report for one trader and print it.
    Report(ReportArgs),
}

#[derive(Parser)]
struct ServeArgs {
    /// Overrides `server.host`.
    #[arg(long)]
    host: Option<String>,

    /// Overrides `server.port`.
    #[arg(long)]
    port: Option<u16>,
}

#[derive(Parser)]
struct AnalyzeArgs {
    /// The trader to analyze.
    #[arg(long)]
    owner: Uuid,
}

#[derive(Parser)]
struct ReportArgs {
    /// The trader to report on.
    #[arg(long)]
    owner: Uuid,

    /// Period start (RFC 3339). Defaults to Monday of the current week.
    #[arg(long)]
    start: Option<DateTime<Utc>>,

    /// Period end (RFC 3339). Defaults to Sunday of the current week.
    #[arg(long)]
    end: Option<DateTime<Utc>>,
}

// ==============================================================================
// Bootstrap
// ==============================================================================

/// Installs the global subscriber. `RUST_LOG` takes precedence over `logging.level`.
///
/// The returned guard flushes the file writer and must live until exit.
fn init_logging(settings: &LoggingSettings) -> anyhow::Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.level))
        .context("invalid logging.level directive")?;

    let (file_layer, guard) = match &settings.directory {
        Some(directory) => {
            let appender = tracing_appender::rolling::daily(directory, "edgeiq.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().json().with_ansi(false).with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    let registry = tracing_subscriber::registry().with(filter).with(file_layer);
    match settings.format {
        LogFormat::Json => registry.with(fmt::layer().json()).try_init()?,
        LogFormat::Pretty => registry.with(fmt::layer()).try_init()?,
    }

    Ok(guard)
}

async fn open_store(config: &Config, in_memory: bool) -> anyhow::Result<Arc<dyn RecordStore>> {
    if in_memory {
        tracing::warn!("Using the in-memory record store; nothing will be persisted.");
        return Ok(Arc::new(MemoryStore::new()));
    }

    let pool = connect(&config.database)
        .await
        .context("Failed to connect to the database")?;
    run_migrations(&pool)
        .await
        .context("Failed to run database migrations")?;
    Ok(Arc::new(DbRepository::new(pool)))
}

fn build_cache(config: &Config) -> Arc<dyn Cache> {
    if config.cache.enabled {
        Arc::new(MemoryCache::new())
    } else {
        Arc::new(NoCache)
    }
}

fn build_narrator(config: &Config) -> Option<Arc<dyn NarrativeGenerator>> {
    OpenAiNarrator::new(&config.narrator).map(|n| Arc::new(n) as Arc<dyn NarrativeGenerator>)
}

fn build_analyzer(config: &Config, store: Arc<dyn RecordStore>) -> Arc<BehaviorAnalyzer> {
    Arc::new(BehaviorAnalyzer::new(
        store,
        BehaviorEngine::new(config.behavior.clone()),
    ))
}

// ==============================================================================
// Command Handlers
// ==============================================================================

async fn handle_serve(
    args: ServeArgs,
    config: Config,
    store: Arc<dyn RecordStore>,
) -> anyhow::Result<()> {
    let host = args.host.unwrap_or_else(|| config.server.host.clone());
    let port = args.port.unwrap_or(config.server.port);
    let addr: SocketAddr = format!("{host}:{port}")
        .parse()
        .with_context(|| format!("invalid listen address {host}:{port}"))?;

    let cache = build_cache(&config);
    let analyzer = build_analyzer(&config, store.clone());
    let queue = AnalysisQueue::spawn(analyzer.clone(), config.behavior.queue_capacity);

    let state = Arc::new(AppState {
        analytics: AnalyticsService::new(store.clone(), cache.clone(), config.cache.clone()),
        journal: TradeJournal::new(
            store.clone(),
            cache,
            config.cache.clone(),
            Some(queue.handle()),
        ),
        analyzer,
        reports: ReportAssembler::new(store, build_narrator(&config)),
    });

    let served = web_server::run_server(addr, state).await;
    queue.shutdown().await;
    served
}

async fn handle_analyze(
    args: AnalyzeArgs,
    config: Config,
    store: Arc<dyn RecordStore>,
) -> anyhow::Result<()> {
    let analyzer = build_analyzer(&config, store);
    match analyzer.analyze(args.owner, Utc::now()).await? {
        Some(analysis) => println!("{}", serde_json::to_string_pretty(&analysis)?),
        None => println!(
            "No trades in the last {} hours.",
            config.behavior.lookback_hours
        ),
    }
    Ok(())
}

async fn handle_report(
    args: ReportArgs,
    config: Config,
    store: Arc<dyn RecordStore>,
) -> anyhow::Result<()> {
    let now = Utc::now();
    let (week_start, week_end) = weekly_period(now);
    let start = args.start.unwrap_or(week_start);
    let end = args.end.unwrap_or(week_end);

    let reports = ReportAssembler::new(store, build_narrator(&config));
    match reports.generate(args.owner, start, end, now).await? {
        Some(generated) => println!("{}", serde_json::to_string_pretty(&generated)?),
        None => println!("No closed trades between {start} and {end}."),
    }
    Ok(())
}
