//! Application configuration loaded from environment variables.
//!
//! Brokerage credentials come from:
//! - `KITE_API_KEY`: Kite Connect app key
//! - `KITE_API_SECRET`: Kite Connect app secret (only needed to exchange
//!   a request token for an access token)
//! - `KITE_ACCESS_TOKEN`: access token of the current login session
//!
//! Optional overrides: `KITE_BASE_URL`, `YAHOO_CHART_URL`,
//! `GTTWATCH_CACHE_DIR`, `GTTWATCH_HISTORY_RANGE`,
//! `GTTWATCH_HTTP_TIMEOUT_SECS` and `GTTWATCH_TREND_CONFIG` (path to a
//! JSON [`TrendConfig`](crate::analysis::config::TrendConfig)).

use std::path::PathBuf;
use std::time::Duration;

use crate::analysis::config::TrendConfig;

/// Default Kite Connect REST endpoint.
const DEFAULT_KITE_BASE_URL: &str = "https://api.kite.trade";

/// Default Yahoo Finance chart endpoint.
const DEFAULT_YAHOO_CHART_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";

/// Default directory for the daily price cache.
const DEFAULT_CACHE_DIR: &str = "./stock_data";

/// One year of daily bars covers the 200-day EMA with room to spare.
const DEFAULT_HISTORY_RANGE: &str = "1y";

const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Top-level application configuration.
#[derive(Debug)]
pub struct AppConfig {
    pub kite: KiteConfig,
    pub market: MarketConfig,
    pub cache_dir: PathBuf,
    pub trend: TrendConfig,
}

/// Kite Connect configuration values.
#[derive(Debug)]
pub struct KiteConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub api_secret: Option<String>,
    pub access_token: Option<String>,
    pub timeout: Duration,
}

/// Market data provider configuration values.
#[derive(Debug)]
pub struct MarketConfig {
    pub chart_url: String,
    /// Provider history range, e.g. `1y` or `2y`.
    pub range: String,
    pub timeout: Duration,
}

/// Loads the application configuration from environment variables.
///
/// Every value has a default except the credentials, which stay `None`
/// until provided. An access token without an API key is rejected since
/// it could never be used.
///
/// # Errors
///
/// Returns [`GttError::Config`](crate::GttError::Config) on inconsistent
/// credentials, an unparsable timeout, or an unreadable trend config file.
pub fn fetch_config() -> crate::Result<AppConfig> {
    let api_key = non_empty_var("KITE_API_KEY");
    let api_secret = non_empty_var("KITE_API_SECRET");
    let access_token = non_empty_var("KITE_ACCESS_TOKEN");

    if api_key.is_none() {
        if api_secret.is_some() {
            return Err(crate::GttError::Config(
                "KITE_API_SECRET is set but KITE_API_KEY is missing".to_string(),
            ));
        }
        if access_token.is_some() {
            return Err(crate::GttError::Config(
                "KITE_ACCESS_TOKEN is set but KITE_API_KEY is missing".to_string(),
            ));
        }
    }

    let timeout = match non_empty_var("GTTWATCH_HTTP_TIMEOUT_SECS") {
        Some(raw) => Duration::from_secs(raw.parse().map_err(|e| {
            crate::GttError::Config(format!("invalid GTTWATCH_HTTP_TIMEOUT_SECS {raw:?}: {e}"))
        })?),
        None => Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
    };

    let trend = match non_empty_var("GTTWATCH_TREND_CONFIG") {
        Some(path) => TrendConfig::load(std::path::Path::new(&path))?,
        None => TrendConfig::default(),
    };

    Ok(AppConfig {
        kite: KiteConfig {
            base_url: non_empty_var("KITE_BASE_URL")
                .unwrap_or_else(|| DEFAULT_KITE_BASE_URL.to_string()),
            api_key,
            api_secret,
            access_token,
            timeout,
        },
        market: MarketConfig {
            chart_url: non_empty_var("YAHOO_CHART_URL")
                .unwrap_or_else(|| DEFAULT_YAHOO_CHART_URL.to_string()),
            range: non_empty_var("GTTWATCH_HISTORY_RANGE")
                .unwrap_or_else(|| DEFAULT_HISTORY_RANGE.to_string()),
            timeout,
        },
        cache_dir: non_empty_var("GTTWATCH_CACHE_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CACHE_DIR)),
        trend,
    })
}

/// Returns the value of an environment variable if it exists and is non-empty.
fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_VARS: [&str; 9] = [
        "KITE_API_KEY",
        "KITE_API_SECRET",
        "KITE_ACCESS_TOKEN",
        "KITE_BASE_URL",
        "YAHOO_CHART_URL",
        "GTTWATCH_CACHE_DIR",
        "GTTWATCH_HISTORY_RANGE",
        "GTTWATCH_HTTP_TIMEOUT_SECS",
        "GTTWATCH_TREND_CONFIG",
    ];

    /// Serializes tests that touch the process environment.
    static ENV_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());

    /// Helper that clears every config var, applies `vars`, runs `f`, then
    /// restores the originals.
    fn with_env<F: FnOnce()>(vars: &[(&str, &str)], f: F) {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let originals: Vec<(&str, Option<String>)> = ALL_VARS
            .iter()
            .map(|k| (*k, std::env::var(k).ok()))
            .collect();

        // SAFETY: every test touching these vars holds ENV_LOCK.
        unsafe {
            for k in ALL_VARS {
                std::env::remove_var(k);
            }
            for (k, v) in vars {
                std::env::set_var(k, v);
            }
        }

        f();

        for (k, original) in originals {
            // SAFETY: restoring original values under the same lock.
            unsafe {
                match original {
                    Some(val) => std::env::set_var(k, val),
                    None => std::env::remove_var(k),
                }
            }
        }
    }

    #[test]
    fn defaults_without_env_vars() {
        with_env(&[], || {
            let config = fetch_config().unwrap();
            assert_eq!(config.kite.base_url, DEFAULT_KITE_BASE_URL);
            assert_eq!(config.market.chart_url, DEFAULT_YAHOO_CHART_URL);
            assert_eq!(config.market.range, "1y");
            assert_eq!(config.cache_dir, PathBuf::from("./stock_data"));
            assert_eq!(config.kite.timeout, Duration::from_secs(30));
            assert!(config.kite.api_key.is_none());
            assert!(config.kite.access_token.is_none());
        });
    }

    #[test]
    fn loads_credentials_from_env() {
        with_env(
            &[
                ("KITE_API_KEY", "key"),
                ("KITE_API_SECRET", "secret"),
                ("KITE_ACCESS_TOKEN", "token"),
            ],
            || {
                let config = fetch_config().unwrap();
                assert_eq!(config.kite.api_key.as_deref(), Some("key"));
                assert_eq!(config.kite.api_secret.as_deref(), Some("secret"));
                assert_eq!(config.kite.access_token.as_deref(), Some("token"));
            },
        );
    }

    #[test]
    fn rejects_secret_without_key() {
        with_env(&[("KITE_API_SECRET", "secret-only")], || {
            let err = fetch_config().unwrap_err();
            assert!(err.to_string().contains("KITE_API_KEY is missing"));
        });
    }

    #[test]
    fn rejects_token_without_key() {
        with_env(&[("KITE_ACCESS_TOKEN", "token-only")], || {
            let err = fetch_config().unwrap_err();
            assert!(err.to_string().contains("KITE_ACCESS_TOKEN is set"));
        });
    }

    #[test]
    fn rejects_bad_timeout() {
        with_env(&[("GTTWATCH_HTTP_TIMEOUT_SECS", "soon")], || {
            let err = fetch_config().unwrap_err();
            assert!(err.to_string().contains("GTTWATCH_HTTP_TIMEOUT_SECS"));
        });
    }

    #[test]
    fn overrides_paths_and_range() {
        with_env(
            &[
                ("GTTWATCH_CACHE_DIR", "/tmp/prices"),
                ("GTTWATCH_HISTORY_RANGE", "2y"),
                ("GTTWATCH_HTTP_TIMEOUT_SECS", "5"),
            ],
            || {
                let config = fetch_config().unwrap();
                assert_eq!(config.cache_dir, PathBuf::from("/tmp/prices"));
                assert_eq!(config.market.range, "2y");
                assert_eq!(config.market.timeout, Duration::from_secs(5));
            },
        );
    }

    #[test]
    fn empty_values_treated_as_absent() {
        with_env(
            &[("KITE_API_KEY", ""), ("KITE_BASE_URL", ""), ("GTTWATCH_CACHE_DIR", "")],
            || {
                let config = fetch_config().unwrap();
                assert_eq!(config.kite.base_url, DEFAULT_KITE_BASE_URL);
                assert!(config.kite.api_key.is_none());
                assert_eq!(config.cache_dir, PathBuf::from(DEFAULT_CACHE_DIR));
            },
        );
    }
}
