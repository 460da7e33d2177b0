//! Kite Connect v3 REST client.

use std::sync::Mutex;
use std::time::{Duration, Instant};

use reqwest::StatusCode;
use reqwest::header::{HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use crate::config::KiteConfig;
use crate::models::{Holding, KiteEnvelope, ProtectiveOrder, RawGtt, RawHolding};
use crate::session::BrokerApi;
use crate::{GttError, Result};

/// How long a GTT listing is reused before asking the broker again.
pub const GTT_CACHE_TTL: Duration = Duration::from_secs(60);

/// Authenticated client for one Kite login session.
#[derive(Debug)]
pub struct KiteClient {
    client: reqwest::Client,
    base_url: String,
    gtt_ttl: Duration,
    gtt_cache: Mutex<Option<(Instant, Vec<ProtectiveOrder>)>>,
}

impl KiteClient {
    /// Builds a client that authenticates with `api_key` and `access_token`.
    ///
    /// # Errors
    ///
    /// Returns [`GttError::Config`] if the credentials cannot form a header
    /// and [`GttError::Http`] if the HTTP client cannot be built.
    pub fn new(config: &KiteConfig, api_key: &str, access_token: &str) -> Result<Self> {
        let mut auth = HeaderValue::from_str(&format!("token {api_key}:{access_token}"))
            .map_err(|e| GttError::Config(format!("invalid Kite credentials: {e}")))?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(reqwest::header::AUTHORIZATION, auth);
        headers.insert("X-Kite-Version", HeaderValue::from_static("3"));

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            gtt_ttl: GTT_CACHE_TTL,
            gtt_cache: Mutex::new(None),
        })
    }

    /// Overrides how long GTT listings are reused.
    pub fn with_gtt_ttl(mut self, ttl: Duration) -> Self {
        self.gtt_ttl = ttl;
        self
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = format!("{}{path}", self.base_url);
        let response = self.client.get(&url).send().await?;

        let status = response.status();
        if status == StatusCode::FORBIDDEN || status == StatusCode::UNAUTHORIZED {
            warn!(%status, path, "Kite rejected the access token");
            return Err(GttError::SessionExpired);
        }

        let envelope: KiteEnvelope<T> = response.json().await?;
        envelope.into_data()
    }

    fn cached_gtts(&self) -> Option<Vec<ProtectiveOrder>> {
        let cache = self.gtt_cache.lock().unwrap_or_else(|e| e.into_inner());
        cache
            .as_ref()
            .filter(|(at, _)| at.elapsed() < self.gtt_ttl)
            .map(|(_, orders)| orders.clone())
    }
}

impl BrokerApi for KiteClient {
    async fn holdings(&self) -> Result<Vec<Holding>> {
        let raw: Vec<RawHolding> = self.get("/portfolio/holdings").await?;
        let holdings: Vec<Holding> = raw.into_iter().filter_map(RawHolding::normalize).collect();
        info!(count = holdings.len(), "Fetched holdings");
        Ok(holdings)
    }

    async fn gtt_orders(&self) -> Result<Vec<ProtectiveOrder>> {
        if let Some(orders) = self.cached_gtts() {
            debug!(count = orders.len(), "Reusing GTT listing");
            return Ok(orders);
        }

        let raw: Vec<RawGtt> = self.get("/gtt/triggers").await?;
        let orders: Vec<ProtectiveOrder> = raw
            .into_iter()
            .flat_map(RawGtt::into_protective_orders)
            .collect();
        info!(count = orders.len(), "Fetched active GTT legs");

        *self.gtt_cache.lock().unwrap_or_else(|e| e.into_inner()) =
            Some((Instant::now(), orders.clone()));
        Ok(orders)
    }
}
