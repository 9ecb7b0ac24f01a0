//! `provisor` command line entry point

use anyhow::Context;
use clap::Parser;
use provisor_core::{Dialect, Outcome, Sequencer, WriterReporter};
use provisor_shared::{init_logging, log_startup, ProvisorConfig};
use provisor_sqlx::MySqlConnector;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "provisor", version)]
#[command(about = "Recreates a database admin account and grants it elevated roles", long_about = None)]
struct Args {
    /// Configuration file (defaults to provisor.toml when present)
    #[arg(long, short, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log format: json, pretty or compact
    #[arg(long, value_name = "FORMAT")]
    log_format: Option<String>,
}

fn load_config(args: &Args) -> anyhow::Result<ProvisorConfig> {
    let mut config = match &args.config {
        Some(path) => ProvisorConfig::load_from_file(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => ProvisorConfig::load().context("Failed to load configuration")?,
    };
    if let Some(format) = &args.log_format {
        config.observability.logging.format = format.clone();
    }
    Ok(config)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = Args::parse();

    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            let _ = init_logging(&ProvisorConfig::default().observability.logging);
            error!(stage = "config", error = ?e, "Provisioning aborted");
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = init_logging(&config.observability.logging) {
        eprintln!("{e:#}");
        return ExitCode::FAILURE;
    }
    log_startup();

    if config.connection.dialect != Dialect::Mysql {
        error!(
            stage = "config",
            dialect = ?config.connection.dialect,
            "Only the mysql dialect has a session driver in this build"
        );
        return ExitCode::FAILURE;
    }

    let request = match config.to_request() {
        Ok(request) => request,
        Err(e) => {
            error!(stage = e.stage(), error = %e, "Provisioning aborted");
            return ExitCode::FAILURE;
        }
    };

    let reporter = WriterReporter::stdout(config.report.redact_credentials);
    let mut sequencer = Sequencer::new(MySqlConnector::new(), reporter, request);

    // the sequencer logs its own failures
    match sequencer.run().await {
        Ok(Outcome::Provisioned { account }) => {
            info!(account = %account, "Account provisioned");
            ExitCode::SUCCESS
        }
        Ok(Outcome::AlreadyProvisioned { account }) => {
            info!(account = %account, "Account already provisioned");
            ExitCode::SUCCESS
        }
        Err(_) => ExitCode::FAILURE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use std::io::Write;

    #[test]
    fn test_cli_definition() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_log_format_override() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[observability.logging]\nlevel = \"debug\"").unwrap();
        let path = file.path().to_string_lossy().into_owned();

        let args = Args::parse_from(["provisor", "--config", path.as_str(), "--log-format", "json"]);
        let config = load_config(&args).unwrap();
        assert_eq!(config.observability.logging.format, "json");
        assert_eq!(config.observability.logging.level, "debug");
    }

    #[test]
    fn test_missing_config_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("provisro.toml");
        let path = missing.to_string_lossy().into_owned();

        let args = Args::parse_from(["provisor", "--config", path.as_str()]);
        let err = load_config(&args).unwrap_err();
        assert!(err.to_string().contains("provisro.toml"));
    }
}
