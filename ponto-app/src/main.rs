use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use ponto_checkin::run_checkin;
use ponto_common::observability::{init_logging, LogConfig};
use ponto_config::{CheckinConfig, CheckinConfigLoader};

mod server;
mod summary;

#[derive(Parser)]
#[command(name = "ponto", about = "Automated web time-clock check-in")]
struct Cli {
    /// Configuration file; `PONTO_`-prefixed env vars override its values.
    #[arg(long, env = "PONTO_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Perform the check-in once and print the run log.
    Run,
    /// Expose the check-in as `GET /run`.
    Serve {
        #[arg(long, default_value = "0.0.0.0:8080")]
        addr: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(LogConfig {
        emit_stderr: true,
        ..LogConfig::default()
    })?;

    let config = load_config(cli.config.as_deref())?;

    match cli.command.unwrap_or(Command::Run) {
        Command::Run => run_once(&config).await,
        Command::Serve { addr } => server::serve(config, &addr).await,
    }
}

fn load_config(path: Option<&std::path::Path>) -> Result<CheckinConfig> {
    let loader = match path {
        // an explicitly named file must exist
        Some(path) => CheckinConfigLoader::new().with_file(path),
        None => CheckinConfigLoader::new().with_optional_file("ponto.yaml"),
    };
    Ok(loader.load()?)
}

async fn run_once(config: &CheckinConfig) -> Result<()> {
    match run_checkin(config).await {
        Ok(log) => {
            println!("{log}");
            println!("OK: check-in completed.");
            summary::write_success(&log);
            Ok(())
        }
        Err(err) => {
            summary::write_failure(&err.to_string());
            Err(err.into())
        }
    }
}
