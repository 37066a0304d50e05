//! `mailsift` - inspect email policies and ingest fetched notification mail
//!
//! Diagnostic front end for `mailsift-core`: validates and prints policies,
//! tests detection, prints upstream queries and stores filtered messages.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod cli;
mod commands;

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cli::Cli;
use mailsift_core::Policy;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Logs go to stderr so stdout stays machine-readable
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mailsift=info,mailsift_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = cli.config_path();
    debug!(config = %config.display(), "Starting mailsift");

    if cli.validate {
        let valid = commands::validate(&config)?;
        return Ok(if valid {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        });
    }

    if cli.stats {
        commands::stats(&cli.db_path()).await?;
        return Ok(ExitCode::SUCCESS);
    }

    let policy = Policy::load(&config)
        .with_context(|| format!("Failed to load policy {}", config.display()))?;
    let account = commands::select_account(&policy, cli.account.as_deref(), cli.provider)?;

    let mut acted = false;

    if cli.show {
        commands::show(&policy, account.as_ref())?;
        acted = true;
    }
    if let Some(sender) = &cli.test_sender {
        commands::test_sender(&policy, sender);
        acted = true;
    }
    if let Some(subject) = &cli.test_subject {
        commands::test_subject(&policy, subject);
        acted = true;
    }
    if cli.query {
        commands::query(&policy, account.as_ref())?;
        acted = true;
    }
    if let (Some(records), Some(key)) = (&cli.ingest, &account) {
        commands::ingest(&policy, key, records, &cli.db_path(), cli.dry_run).await?;
        acted = true;
    }

    if !acted {
        commands::list_accounts(&policy)?;
    }

    Ok(ExitCode::SUCCESS)
}
