use std::sync::Arc;

use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use gttwatch::analysis::{Interval, TrendAnalyzer};
use gttwatch::cache::FileStore;
use gttwatch::config::{AppConfig, fetch_config};
use gttwatch::credentials::{self, CredentialKey};
use gttwatch::kite::KiteClient;
use gttwatch::market::YahooClient;
use gttwatch::portfolio::Dashboard;
use gttwatch::session::Session;
use gttwatch::{GttError, auth};

#[derive(Parser)]
#[command(name = "gttwatch")]
#[command(about = "Risk and trend dashboard for Kite holdings protected by GTT orders")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Stop-loss risk of every protected holding
    Risk,
    /// EMA trend health of symbols with active GTTs
    Technical,
    /// EMA trend health of the NSE indices
    Market,
    /// Relative rotation of the sector indices against Nifty 50
    Rotation {
        /// Use weekly bars instead of daily
        #[arg(long)]
        weekly: bool,
    },
    /// Where each holding trades between its stop and target
    Proximity,
    /// Current holdings with P&L
    Holdings,
    /// Active GTT orders
    Orders,
    /// Whether a brokerage session is available
    Status,
    /// Exchange a login request token for a new access token
    Refresh {
        #[arg(long)]
        request_token: String,
    },
    /// Delete cached price history older than the given age
    Prune {
        #[arg(long, default_value_t = 7)]
        days: u32,
    },
    /// Save a credential to the OS keychain
    StoreCredential {
        /// kite_api_key, kite_api_secret or kite_access_token
        key: CredentialKey,
        value: String,
    },
}

fn print_json<T: Serialize>(value: &T) -> Result<(), GttError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn open_session(config: &AppConfig) -> Result<Session<KiteClient>, GttError> {
    match (&config.kite.api_key, &config.kite.access_token) {
        (Some(key), Some(token)) => Ok(Session::with_handle(KiteClient::new(
            &config.kite,
            key,
            token,
        )?)),
        _ => {
            warn!("no Kite access token configured; broker views will fail until refresh");
            Ok(Session::empty())
        }
    }
}

fn main() -> Result<(), GttError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .compact()
        .init();

    start(Cli::parse())
}

/// Runs one command. Must be called before any other thread exists: it
/// writes keychain credentials into the environment, then starts the
/// tokio runtime the command runs on.
fn start(cli: Cli) -> Result<(), GttError> {
    if let Commands::StoreCredential { key, value } = &cli.command {
        credentials::save(*key, value)?;
        info!(key = key.keyring_id(), "credential stored");
        return Ok(());
    }

    credentials::populate_env_from_keychain();
    let config = fetch_config()?;
    info!(cache = %config.cache_dir.display(), "configuration loaded");
    debug!("{}", config.trend.describe());

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(run(cli.command, config))
}

async fn run(command: Commands, config: AppConfig) -> Result<(), GttError> {
    let today = chrono::Local::now().date_naive();
    let session = Arc::new(open_session(&config)?);
    let dashboard = Dashboard::new(
        Arc::clone(&session),
        YahooClient::new(&config.market)?,
        FileStore::new(&config.cache_dir),
        TrendAnalyzer::new(config.trend.clone()),
    );

    match command {
        Commands::Risk => print_json(&dashboard.risk_analytics().await?),
        Commands::Technical => print_json(&dashboard.technical_health(today).await?),
        Commands::Market => print_json(&dashboard.market_health(today).await),
        Commands::Rotation { weekly } => {
            let interval = if weekly { Interval::Weekly } else { Interval::Daily };
            print_json(&dashboard.sector_rotation(today, interval).await?)
        }
        Commands::Proximity => print_json(&dashboard.proximity().await?),
        Commands::Holdings => print_json(&dashboard.holdings().await?),
        Commands::Orders => print_json(&dashboard.active_orders().await?),
        Commands::Status => print_json(&dashboard.status().await),
        Commands::Refresh { request_token } => {
            let (Some(api_key), Some(api_secret)) = (&config.kite.api_key, &config.kite.api_secret)
            else {
                return Err(GttError::Config(
                    "KITE_API_KEY and KITE_API_SECRET are required to refresh".to_string(),
                ));
            };

            let client = reqwest::Client::builder()
                .timeout(config.kite.timeout)
                .build()?;
            let access_token = auth::exchange_request_token(
                &client,
                &config.kite.base_url,
                api_key,
                api_secret,
                &request_token,
            )
            .await?;

            if let Err(e) = credentials::save(CredentialKey::KiteAccessToken, &access_token) {
                warn!(error = %e, "access token not persisted to keychain");
            }
            session
                .replace(KiteClient::new(&config.kite, api_key, &access_token)?)
                .await;
            print_json(&dashboard.status().await)
        }
        Commands::Prune { days } => {
            let removed = dashboard.store().prune(days, today)?;
            print_json(&serde_json::json!({ "removed": removed }))
        }
        Commands::StoreCredential { .. } => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_is_well_formed() {
        Cli::command().debug_assert();

        let cli = Cli::try_parse_from(["gttwatch", "rotation", "--weekly"]).unwrap();
        assert!(matches!(cli.command, Commands::Rotation { weekly: true }));
        let cli = Cli::try_parse_from(["gttwatch", "prune"]).unwrap();
        assert!(matches!(cli.command, Commands::Prune { days: 7 }));
    }

    #[test]
    fn start_builds_its_own_runtime() {
        let dir = tempfile::tempdir().unwrap();
        // SAFETY: the only test in this binary that touches the environment.
        unsafe {
            for key in CredentialKey::ALL {
                std::env::remove_var(key.env_var());
            }
            std::env::set_var("GTTWATCH_CACHE_DIR", dir.path());
        }

        // Called from a plain thread, with no runtime already running.
        let cli = Cli::try_parse_from(["gttwatch", "prune", "--days", "1"]).unwrap();
        start(cli).unwrap();
    }
}
