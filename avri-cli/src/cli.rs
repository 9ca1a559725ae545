use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "avri", version, about = "Show upcoming Avri waste pickups for an address")]
pub(crate) struct Cli {
    /// Postal code, spaces are ignored (e.g. "4001 AB")
    pub(crate) postal_code: String,

    /// House number
    pub(crate) house_number: String,

    /// TOML file overriding endpoint, tenant, and cache settings
    #[arg(long, value_name = "FILE")]
    pub(crate) config: Option<PathBuf>,

    /// Retry once without certificate verification when TLS verification fails
    #[arg(long)]
    pub(crate) insecure_tls_fallback: bool,

    #[command(subcommand)]
    pub(crate) command: Option<Command>,
}

#[derive(Debug, Clone, Subcommand)]
pub(crate) enum Command {
    /// Next pickup of any waste type
    Next {
        /// Only consider pickups on or after this day
        #[arg(long, value_name = "YYYY-MM-DD")]
        after: Option<NaiveDate>,
    },
    /// Next pickup of every waste type
    Each {
        /// Only consider pickups on or after this day
        #[arg(long, value_name = "YYYY-MM-DD")]
        after: Option<NaiveDate>,
    },
    /// Every remaining pickup
    All,
}

impl Default for Command {
    fn default() -> Self {
        Command::Each { after: None }
    }
}
