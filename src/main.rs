//! Background worker pool host (v1)
//!
//! # Architecture Overview
//!
//! ```text
//!   bgpool run
//!       │
//!       ├─ config (TOML) ──▶ validation ──▶ SharedSettings
//!       │
//!       ├─ startup: LocalHost (preload) ─▶ static pool registered ─▶ start()
//!       │                                         │
//!       │                      ┌──────────────────┼──────────────────┐
//!       │                      ▼                  ▼                  ▼
//!       │                  worker_1           worker_2    ...    worker_N
//!       │                  (control loop: wait → reload? → terminate? → cycle)
//!       │
//!       ├─ --launch INDEX ──▶ LaunchCoordinator ──▶ Started(pid) | error + hint
//!       │
//!       └─ signals: SIGHUP → reload all, SIGTERM/SIGINT → terminate all, join, exit
//! ```

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use bgpool::config::loader::load_config;
use bgpool::config::validation::validate_config;
use bgpool::config::watcher::ConfigWatcher;
use bgpool::config::{BgpoolConfig, ConfigError, PoolSettings};
use bgpool::host::{LocalHost, MaintenanceFactory};
use bgpool::lifecycle::signals::{HostSignal, OsSignals};
use bgpool::lifecycle::startup::boot;
use bgpool::observability::{logging, metrics};
use bgpool::pool::LaunchCoordinator;

#[derive(Parser)]
#[command(name = "bgpool")]
#[command(about = "Host for a pool of periodic background workers", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the host and its static worker pool
    Run {
        /// Path to the TOML configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Launch an extra worker with this index once the host is running
        #[arg(short, long = "launch")]
        launch: Vec<i64>,
    },
    /// Validate a configuration file and print the effective settings
    CheckConfig {
        #[arg(short, long)]
        config: PathBuf,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run { config, launch } => run(config.as_deref(), &launch).await,
        Commands::CheckConfig { config } => check_config(&config),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn check_config(path: &Path) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let config = load_config(path)?;
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(ExitCode::SUCCESS)
}

fn read_config(path: Option<&Path>) -> Result<BgpoolConfig, ConfigError> {
    match path {
        Some(path) => load_config(path),
        None => {
            let config = BgpoolConfig::default();
            validate_config(&config).map_err(ConfigError::Validation)?;
            Ok(config)
        }
    }
}

async fn run(path: Option<&Path>, launches: &[i64]) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let config = read_config(path)?;
    logging::init(&config.observability.log_level);

    tracing::info!(
        sleep_time_ms = config.pool.sleep_time_ms,
        static_worker_count = config.pool.static_worker_count,
        max_workers = config.host.max_workers,
        "Configuration loaded"
    );

    if let Some(addr) = &config.observability.metrics_address {
        match addr.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(metrics_address = %addr, "Failed to parse metrics address"),
        }
    }

    let mut signals = OsSignals::install()?;
    let host = boot(&config, Arc::new(MaintenanceFactory))?;

    let coordinator = LaunchCoordinator::new(Arc::new(host.clone()), Arc::new(host.settings()));
    for &index in launches {
        match coordinator.launch_worker(index).await {
            Ok(pid) => tracing::info!(index, pid = %pid, "Launched worker"),
            Err(e) => tracing::error!(index, error = %e, hint = e.hint().unwrap_or(""), "Launch failed"),
        }
    }

    // Keep the watcher alive for the lifetime of the host.
    let (mut updates, _watcher) = match path {
        Some(path) => {
            let (watcher, updates) = ConfigWatcher::new(path, &config);
            match watcher.run() {
                Ok(watcher) => (updates, Some(watcher)),
                Err(e) => {
                    tracing::warn!(error = %e, "Config watcher unavailable, reload with SIGHUP only");
                    (updates, None)
                }
            }
        }
        None => (tokio::sync::mpsc::unbounded_channel().1, None),
    };

    loop {
        tokio::select! {
            signal = signals.recv() => match signal {
                HostSignal::Reload => reload(&host, path, &config),
                HostSignal::Terminate => break,
            },
            Some(pool) = updates.recv() => apply(&host, pool),
        }
    }

    host.terminate_all();
    let exits = host.join_all().await;
    for exit in &exits {
        tracing::info!(pid = %exit.pid, name = %exit.name, code = exit.exit.code(), "Worker joined");
    }
    tracing::info!(workers = exits.len(), "Shutdown complete");

    if exits.iter().all(|e| e.exit.is_clean()) {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}

fn reload(host: &LocalHost, path: Option<&Path>, running: &BgpoolConfig) {
    let Some(path) = path else {
        let signalled = host.reload_all();
        tracing::info!(workers = signalled, "Reload requested");
        return;
    };
    match load_config(path) {
        Ok(config) => {
            for field in running.restart_only_changes(&config) {
                tracing::warn!(field, "Changed setting needs a host restart to take effect");
            }
            apply(host, config.pool);
        }
        Err(e) => tracing::error!(error = %e, "Failed to reload config. Keeping current configuration."),
    }
}

fn apply(host: &LocalHost, pool: PoolSettings) {
    match host.apply_settings(pool) {
        Ok(signalled) => tracing::info!(
            workers = signalled,
            sleep_time_ms = pool.sleep_time_ms,
            "Settings applied"
        ),
        Err(e) => tracing::error!(error = %e, "Rejected settings update"),
    }
}
