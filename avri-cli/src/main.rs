//! Command line tool printing upcoming Avri waste pickups for one address.

mod cli;

use std::{fs, io, path::Path, sync::Arc};

use anyhow::{Context, Result};
use avri_core::{AvriClient, AvriConfig, PickupRecord, ports::Transport};
use avri_transport_http::HttpTransport;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use clap::Parser;
use tracing::debug;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::cli::{Cli, Command};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let mut config = match cli.config.as_deref() {
        Some(path) => load_config(path)?,
        None => AvriConfig::default(),
    };
    if cli.insecure_tls_fallback {
        config.insecure_tls_fallback = true;
    }
    debug!(?config, "using configuration");

    let transport: Arc<dyn Transport> =
        Arc::new(HttpTransport::new().context("failed to build HTTP client")?);
    let mut client = AvriClient::with_config(&cli.postal_code, &cli.house_number, transport, config);

    let pickups = match cli.command.unwrap_or_default() {
        Command::Next { after } => client
            .upcoming(after.map(start_of))
            .await?
            .into_iter()
            .collect(),
        Command::Each { after } => client.upcoming_of_each(after.map(start_of)).await?,
        Command::All => client.all_upcoming().await?,
    };

    print_pickups(&client, &pickups);
    Ok(())
}

fn load_config(path: &Path) -> Result<AvriConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    toml::from_str(&content).with_context(|| format!("invalid config file {}", path.display()))
}

fn start_of(day: NaiveDate) -> NaiveDateTime {
    day.and_time(NaiveTime::MIN)
}

#[expect(clippy::print_stdout, reason = "printing pickups is the purpose of the binary")]
fn print_pickups(client: &AvriClient, pickups: &[PickupRecord]) {
    if pickups.is_empty() {
        println!("No upcoming pickups for {}", client.identity());
        return;
    }

    for pickup in pickups {
        println!("{}  {}", pickup.day.format("%a %Y-%m-%d"), pickup.name);
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, NaiveDate};
    use clap::Parser;

    use super::start_of;
    use crate::cli::{Cli, Command};

    #[test]
    fn each_is_the_default_command() {
        let cli = Cli::try_parse_from(["avri", "4001 AB", "12"]).expect("valid arguments");
        assert_eq!(cli.postal_code, "4001 AB");
        assert!(matches!(
            cli.command.unwrap_or_default(),
            Command::Each { after: None }
        ));
    }

    #[test]
    fn next_accepts_a_day() {
        let cli = Cli::try_parse_from(["avri", "4001AB", "12", "next", "--after", "2021-02-03"])
            .expect("valid arguments");
        let Some(Command::Next { after: Some(after) }) = cli.command else {
            panic!("expected next with a day, got {:?}", cli.command);
        };
        assert_eq!(after, NaiveDate::from_ymd_opt(2021, 2, 3).expect("valid date"));
    }

    #[test]
    fn invalid_day_is_rejected() {
        assert!(Cli::try_parse_from(["avri", "4001AB", "12", "next", "--after", "03-02-2021"]).is_err());
    }

    #[test]
    fn config_file_fields_are_optional() {
        let config: avri_core::AvriConfig =
            toml::from_str("cache_ttl_days = 14\ninsecure_tls_fallback = true\n").expect("valid toml");
        assert_eq!(config.cache_ttl(), Duration::days(14));
        assert!(config.insecure_tls_fallback);
        assert_eq!(config.community, "Avri");
    }

    #[test]
    fn start_of_is_midnight() {
        let day = NaiveDate::from_ymd_opt(2021, 2, 3).expect("valid date");
        assert_eq!(start_of(day).to_string(), "2021-02-03 00:00:00");
    }
}
