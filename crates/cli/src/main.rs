mod metrics;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use spreadit_core::{
    build_adapters, load_config, load_config_from_env, validate_config, Config, Converter,
    FfmpegConverter, FormatRegistry, HistoryFilter, ImageClassifier, ModerationGate, Platform,
    PublishRequest, Publisher, RateLimitStore, SanitizedConfig, SqliteRateLimitStore,
    VisionClassifier,
};

/// Config file picked up from the working directory when no path is given.
const DEFAULT_CONFIG_FILE: &str = "spreadit.toml";

/// Exit code for a batch where at least one platform failed.
const EXIT_PARTIAL: i32 = 2;

#[derive(Debug, Parser)]
#[command(name = "spreadit", version, about = "Adapt media and publish it across social platforms")]
struct Cli {
    /// Path to the configuration file.
    #[arg(short, long, env = "SPREADIT_CONFIG")]
    config: Option<PathBuf>,

    /// Print Prometheus metrics to stderr when the command finishes.
    #[arg(long)]
    metrics: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Publish a batch described by a JSON request file.
    Publish {
        /// Request file ("-" reads stdin).
        request: PathBuf,
    },
    /// Probe a media file and print its description.
    Probe { path: PathBuf },
    /// Show format constraints, optionally for one platform.
    Formats { platform: Option<Platform> },
    /// List recorded publish attempts, newest first.
    History {
        #[arg(long)]
        platform: Option<Platform>,
        /// Only attempts from the last N hours.
        #[arg(long)]
        since_hours: Option<i64>,
        #[arg(long, value_enum)]
        status: Option<StatusFilter>,
        #[arg(long, default_value_t = 50)]
        limit: usize,
    },
    /// Print the effective configuration with secrets removed.
    Config,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum StatusFilter {
    Succeeded,
    Failed,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging();

    let code = match run(&cli).await {
        Ok(code) => code,
        Err(e) => {
            error!("Fatal error: {:#}", e);
            1
        }
    };

    if cli.metrics {
        match metrics::encode_metrics() {
            Ok(text) => eprintln!("{}", text),
            Err(e) => warn!("Failed to encode metrics: {}", e),
        }
    }

    std::process::exit(code);
}

/// Logs go to stderr; stdout carries command output only.
/// `SPREADIT_LOG_FORMAT=json` switches to JSON lines.
fn init_logging() {
    let json = std::env::var("SPREADIT_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(json.then(|| tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr)))
        .with((!json).then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr)))
        .init();
}

async fn run(cli: &Cli) -> Result<i32> {
    metrics::init();

    let config = load(cli.config.as_deref())?;
    validate_config(&config).context("Configuration validation failed")?;

    match &cli.command {
        Command::Publish { request } => publish(&config, request).await,
        Command::Probe { path } => probe(&config, path).await,
        Command::Formats { platform } => formats(*platform),
        Command::History {
            platform,
            since_hours,
            status,
            limit,
        } => history(&config, *platform, *since_hours, *status, *limit),
        Command::Config => {
            print_json(&SanitizedConfig::from(&config))?;
            Ok(0)
        }
    }
}

fn load(path: Option<&Path>) -> Result<Config> {
    if let Some(path) = path {
        info!("Loading configuration from {:?}", path);
        return load_config(path).with_context(|| format!("Failed to load config from {:?}", path));
    }

    let default = Path::new(DEFAULT_CONFIG_FILE);
    if default.exists() {
        info!("Loading configuration from {:?}", default);
        return load_config(default)
            .with_context(|| format!("Failed to load config from {:?}", default));
    }

    info!("No configuration file, using defaults and environment");
    load_config_from_env().context("Failed to load config from environment")
}

async fn publish(config: &Config, request_path: &Path) -> Result<i32> {
    let raw = if request_path == Path::new("-") {
        let mut buf = String::new();
        std::io::Read::read_to_string(&mut std::io::stdin(), &mut buf)
            .context("Failed to read request from stdin")?;
        buf
    } else {
        tokio::fs::read_to_string(request_path)
            .await
            .with_context(|| format!("Failed to read request {:?}", request_path))?
    };
    let request: PublishRequest =
        serde_json::from_str(&raw).context("Failed to parse publish request")?;

    let converter = Arc::new(FfmpegConverter::new(config.converter.clone()));
    if request.media.is_some() {
        converter
            .validate()
            .await
            .context("FFmpeg is not available")?;
    }

    let store = Arc::new(
        SqliteRateLimitStore::new(&config.database.path)
            .context("Failed to open publish history")?,
    );
    info!("Publish history at {:?}", config.database.path);

    let adapters = build_adapters(&config.platforms).context("Failed to create platform adapters")?;
    info!("Configured platforms: {:?}", adapters.platforms());
    for platform in &request.platforms {
        if !config.platforms.is_configured(*platform) {
            warn!("{} is requested but not configured", platform);
        }
    }

    let classifier: Option<Arc<dyn ImageClassifier>> = match &config.moderation.vision {
        Some(vision) => Some(Arc::new(
            VisionClassifier::new(vision.clone()).context("Failed to create image classifier")?,
        )),
        None => {
            info!("No image classifier configured, image moderation disabled");
            None
        }
    };
    let gate = ModerationGate::new(config.moderation.clone(), classifier);

    let publisher = Arc::new(
        Publisher::new(config.publisher.clone(), converter, adapters, store, gate)
            .context("Failed to create publisher")?,
    );

    let runner = Arc::clone(&publisher);
    let mut batch = tokio::spawn(async move { runner.publish_batch(&request).await });

    let outcome = tokio::select! {
        joined = &mut batch => joined,
        _ = shutdown_signal() => {
            warn!("Shutdown signal received, cancelling batch");
            publisher.cancel();
            batch.await
        }
    };
    let result = outcome
        .context("Publish task panicked")?
        .context("Publish batch failed")?;

    print_json(&result)?;
    Ok(if result.overall_success { 0 } else { EXIT_PARTIAL })
}

async fn probe(config: &Config, path: &Path) -> Result<i32> {
    let converter = FfmpegConverter::new(config.converter.clone());
    let descriptor = converter
        .probe(path)
        .await
        .with_context(|| format!("Failed to probe {:?}", path))?;
    print_json(&descriptor)?;
    Ok(0)
}

fn formats(platform: Option<Platform>) -> Result<i32> {
    let registry = FormatRegistry::builtin();
    let specs: Vec<_> = match platform {
        Some(p) => registry.formats_for(p).collect(),
        None => Platform::ALL
            .iter()
            .flat_map(|p| registry.formats_for(*p))
            .collect(),
    };
    print_json(&specs)?;
    Ok(0)
}

fn history(
    config: &Config,
    platform: Option<Platform>,
    since_hours: Option<i64>,
    status: Option<StatusFilter>,
    limit: usize,
) -> Result<i32> {
    let store = SqliteRateLimitStore::new(&config.database.path)
        .context("Failed to open publish history")?;

    let since = since_hours
        .and_then(Duration::try_hours)
        .and_then(|window| Utc::now().checked_sub_signed(window));
    let filter = HistoryFilter {
        platform,
        since,
        success: status.map(|s| matches!(s, StatusFilter::Succeeded)),
        limit,
    };

    let records = store.list(&filter).context("Failed to list history")?;
    print_json(&records)?;
    Ok(0)
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
