use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use fleet_api::Config;
use slog::Drain;
use tracing_subscriber::prelude::*;

mod cmd_serve;
mod cmd_snapshot;
mod cmd_validate;

/// Poll Formlabs printers and serve their state.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(name = "fleet-api")]
struct Cli {
    /// Config file to use
    #[arg(long, short, default_value = "fleet-api.toml")]
    config: PathBuf,

    /// Print debug info
    #[arg(long, short, global = true)]
    debug: bool,

    /// Print logs as json
    #[arg(long, short, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug, Clone)]
enum Commands {
    /// Poll every configured installation and serve the results over
    /// HTTP.
    Serve {
        /// `host:port` to bind to on the host system. Overrides the
        /// config file.
        #[arg(long, short)]
        bind: Option<String>,
    },

    /// Check every installation's credentials with a full round trip.
    Validate,

    /// Poll one installation once and print what came back, with
    /// credentials scrubbed.
    Snapshot {
        /// Installation name, as configured.
        installation: String,
    },
}

impl Cli {
    /// Setup our logger.
    fn create_logger(&self, app: &str) -> slog::Logger {
        if self.json {
            let drain = slog_json::Json::default(std::io::stderr()).fuse();
            self.async_root_logger(drain, app)
        } else {
            let decorator = slog_term::TermDecorator::new().build();
            let drain = slog_term::FullFormat::new(decorator).build().fuse();
            self.async_root_logger(drain, app)
        }
    }

    fn async_root_logger<T>(&self, drain: T, app: &str) -> slog::Logger
    where
        T: slog::Drain + Send + 'static,
        <T as slog::Drain>::Err: std::fmt::Debug,
    {
        let level = if self.debug {
            slog::Level::Debug
        } else {
            slog::Level::Info
        };

        let level_drain = slog::LevelFilter(drain, level).fuse();
        let async_drain = slog_async::Async::new(level_drain).build().fuse();
        slog::Logger::root(async_drain, slog::slog_o!("app" => app.to_owned()))
    }
}

async fn handle_signals() -> Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigint = signal(SignalKind::interrupt()).map_err(|e| {
            tracing::error!(error = format!("{:?}", e), "Failed to set up SIGINT handler");
            e
        })?;
        let mut sigterm = signal(SignalKind::terminate()).map_err(|e| {
            tracing::error!(error = format!("{:?}", e), "Failed to set up SIGTERM handler");
            e
        })?;

        tokio::select! {
            _ = sigint.recv() => {
                tracing::info!("received SIGINT");
            }
            _ = sigterm.recv() => {
                tracing::info!("received SIGTERM");
            }
        }
    }

    #[cfg(windows)]
    {
        tokio::signal::ctrl_c().await.map_err(|e| {
            tracing::error!(error = format!("{:?}", e), "Failed to set up Ctrl+C handler");
            anyhow::Error::new(e)
        })?;

        tracing::info!("received Ctrl+C (SIGINT)");
    }

    tracing::info!("all clean, exiting!");
    std::process::exit(0);
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tokio::spawn(async { handle_signals().await });

    let default_level = if cli.debug { "debug" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    let (json, plain) = if cli.json {
        (Some(tracing_subscriber::fmt::layer().json()), None)
    } else {
        (None, Some(tracing_subscriber::fmt::layer().pretty()))
    };

    // Initialize tracing.
    tracing_subscriber::registry()
        .with(filter)
        .with(json)
        .with(plain)
        .init();

    let cfg = Config::from_file(&cli.config)?;

    match cli.command {
        Commands::Serve { ref bind } => cmd_serve::main(&cli, &cfg, bind.as_deref()).await,
        Commands::Validate => cmd_validate::main(&cli, &cfg).await,
        Commands::Snapshot { ref installation } => cmd_snapshot::main(&cli, &cfg, installation).await,
    }
}
