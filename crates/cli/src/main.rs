mod display;
mod watch;

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use attendance_core::Credential;
use clap::{Parser, Subcommand};
use colored::Colorize;
use server::config::AppConfig;
use server::state::AppState;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use display::AttemptDisplay;
use watch::WatchClient;

#[derive(Parser)]
#[command(name = "attendance-scraper")]
#[command(about = "Look up a student's attendance from the college portal", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Config file; defaults to <config_dir>/attendance-scraper/config.toml
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default config file
    Init {
        #[arg(long)]
        force: bool,
    },
    /// Serve the SSE API
    Serve {
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Run one lookup locally
    Scrape { username: String },
    /// Follow a lookup on a running server
    Watch {
        username: String,

        #[arg(long, default_value = "http://localhost:3001")]
        url: String,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let config_path = cli.config.as_deref();

    match cli.command {
        Some(Commands::Init { force }) => init_config(config_path, force),
        Some(Commands::Serve { port }) => serve(config_path, port).await,
        Some(Commands::Scrape { username }) => scrape(config_path, &username).await,
        Some(Commands::Watch { username, url }) => watch(&url, &username).await,
        None => serve(config_path, None).await,
    }
}

fn resolve_config_path(path: Option<&Path>) -> Result<PathBuf> {
    path.map(Path::to_path_buf)
        .or_else(AppConfig::default_path)
        .context("Could not determine a config directory; pass --config")
}

fn init_config(path: Option<&Path>, force: bool) -> Result<ExitCode> {
    let config_path = resolve_config_path(path)?;

    if config_path.exists() && !force {
        println!("Config already exists at {}", config_path.display());
        println!("Use --force to overwrite it.");
        return Ok(ExitCode::SUCCESS);
    }

    AppConfig::default()
        .write(&config_path)
        .with_context(|| format!("Failed to write {}", config_path.display()))?;

    println!();
    println!("Wrote default config to {}", config_path.display());
    println!();
    println!("Next steps:");
    println!("  1. Set [portal] base_url if the portal has moved");
    println!("  2. Run 'attendance-scraper serve' to start the server");

    Ok(ExitCode::SUCCESS)
}

async fn serve(path: Option<&Path>, port: Option<u16>) -> Result<ExitCode> {
    init_tracing(SERVE_LOG_FILTER);

    let mut config = AppConfig::load(path);
    if let Some(port) = port {
        config.server.port = port;
    }

    println!();
    println!("Attendance Scraper");
    println!("════════════════════════════════════════");
    println!();
    println!("  API Server:  http://localhost:{}", config.server.port);
    println!("  Swagger UI:  http://localhost:{}/swagger-ui", config.server.port);
    println!("  Portal:      {}", config.portal.base_url);
    println!();
    println!("Press Ctrl+C to stop");
    println!();

    server::serve(config).await?;
    Ok(ExitCode::SUCCESS)
}

async fn scrape(path: Option<&Path>, username: &str) -> Result<ExitCode> {
    init_tracing(SCRAPE_LOG_FILTER);

    let credential = Credential::parse(username)?;
    let config = AppConfig::load(path);
    let state = AppState::from_config(&config).context("Invalid portal configuration")?;

    let display = AttemptDisplay::new(credential.username());
    let mut receiver = orchestrator::spawn_attempt(Arc::clone(&state.orchestrator), credential);

    while let Some(record) = receiver.recv().await {
        if let Some(success) = display.show(&record.message) {
            return Ok(exit_code(success));
        }
    }

    display.abandon();
    anyhow::bail!("Attempt ended without a result")
}

async fn watch(url: &str, username: &str) -> Result<ExitCode> {
    println!("{} {}", "Watching".cyan().bold(), url);

    let display = AttemptDisplay::new(username);
    let terminal = WatchClient::new(url)
        .watch(username, |message| {
            display.show(message);
        })
        .await;

    match terminal {
        Ok(message) => Ok(exit_code(is_success(&message))),
        Err(e) => {
            display.abandon();
            Err(e)
        }
    }
}

fn is_success(message: &events::WireMessage) -> bool {
    matches!(
        message,
        events::WireMessage::Result {
            result: events::ResultPayload::Success { .. }
        }
    )
}

fn exit_code(success: bool) -> ExitCode {
    if success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

const SERVE_LOG_FILTER: &str = "attendance_scraper=info,server=info,orchestrator=info,tower_http=info";
/// Quiet enough not to fight the spinner; failures and release problems still show.
const SCRAPE_LOG_FILTER: &str = "warn";

fn init_tracing(default_filter: &str) {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .init();
}
