//! Command-line arguments.

use std::path::PathBuf;

use clap::Parser;
use mailsift_core::Provider;

/// mailsift - filter and enrich social-notification email by policy
#[derive(Debug, Parser)]
#[command(name = "mailsift")]
#[command(about = "Inspect email policies and ingest fetched messages")]
#[command(version)]
#[allow(clippy::struct_excessive_bools)] // One flag per action mirrors the command line
pub struct Cli {
    /// Policy document path
    #[arg(long, short)]
    pub config: Option<PathBuf>,

    /// Account to operate on (looked up under every provider unless --provider is set)
    #[arg(long, short)]
    pub account: Option<String>,

    /// Provider the account belongs to (gmail or microsoft)
    #[arg(long, short)]
    pub provider: Option<Provider>,

    /// Print the resolved policy as JSON
    #[arg(long)]
    pub show: bool,

    /// Validate the policy document and list every issue (exit code 1 if any)
    #[arg(long)]
    pub validate: bool,

    /// Print the platform detected for a sender address
    #[arg(long, value_name = "ADDRESS")]
    pub test_sender: Option<String>,

    /// Print the notification type detected for a subject line
    #[arg(long, value_name = "SUBJECT")]
    pub test_subject: Option<String>,

    /// Print the upstream fetch query for the account (every account if none is given)
    #[arg(long)]
    pub query: bool,

    /// Filter, enrich and store a JSON array of fetched messages
    #[arg(long, value_name = "RECORDS", requires = "account")]
    pub ingest: Option<PathBuf>,

    /// Message database path
    #[arg(long)]
    pub db: Option<PathBuf>,

    /// Process messages without writing to the database
    #[arg(long)]
    pub dry_run: bool,

    /// Print stored message counts
    #[arg(long)]
    pub stats: bool,
}

impl Cli {
    /// Policy path, falling back to the user's config directory.
    pub fn config_path(&self) -> PathBuf {
        self.config.clone().unwrap_or_else(|| {
            dirs::config_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("mailsift")
                .join("email_policy.json")
        })
    }

    /// Database path, falling back to the user's data directory.
    pub fn db_path(&self) -> PathBuf {
        self.db.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("mailsift")
                .join("emails.db")
        })
    }
}
