//! Metagraph CLI
//!
//! Operator front end for the metadata store: schema bootstrap, model
//! registry, graph queries, record linking and package-rooted lookups.

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use metagraph_core::MetagraphError;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod config;
mod output;

use commands::Cli;

/// Initialize tracing on stderr, plus a plain-text file layer with `--log-file`.
///
/// The returned guard flushes the file writer and must outlive the command.
fn init_tracing(log_file: Option<&std::path::Path>, verbose: bool) -> Result<Option<WorkerGuard>> {
    let default_filter = if verbose {
        "metagraph=debug,metagraph_graph=debug,metagraph_db=debug"
    } else {
        "metagraph=info,metagraph_graph=info"
    };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());

    let console = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    let Some(path) = log_file else {
        tracing_subscriber::registry().with(env_filter).with(console).init();
        return Ok(None);
    };

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => std::path::Path::new("."),
    };
    std::fs::create_dir_all(dir).with_context(|| format!("Failed to create log directory {}", dir.display()))?;
    let file_name = path
        .file_name()
        .with_context(|| format!("Log file path has no file name: {}", path.display()))?;

    let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::never(dir, file_name));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(console)
        .with(tracing_subscriber::fmt::layer().with_writer(writer).with_ansi(false))
        .init();

    Ok(Some(guard))
}

/// Exit status for a failed command: 2 for rejected input, 75 (`EX_TEMPFAIL`)
/// when a retry may succeed, 1 otherwise.
fn exit_code(err: &anyhow::Error) -> i32 {
    match err.downcast_ref::<MetagraphError>() {
        Some(e) if e.is_validation() => 2,
        Some(e) if e.is_transient() => 75,
        _ => 1,
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let guard = init_tracing(cli.log_file.as_deref(), cli.verbose)?;

    if let Err(err) = cli.execute().await {
        eprintln!("{} {:#}", "error:".red().bold(), err);
        drop(guard);
        std::process::exit(exit_code(&err));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        let invalid = anyhow::Error::new(MetagraphError::UnsupportedOperator("LIKE".into()));
        assert_eq!(exit_code(&invalid), 2);

        let timeout = anyhow::Error::new(MetagraphError::EngineTimeout(std::time::Duration::from_secs(30)))
            .context("Query failed");
        assert_eq!(exit_code(&timeout), 75);

        let missing = anyhow::Error::new(MetagraphError::RecordNotFound("v9".into()));
        assert_eq!(exit_code(&missing), 1);
        assert_eq!(exit_code(&anyhow::anyhow!("No dataset given")), 1);
    }
}
