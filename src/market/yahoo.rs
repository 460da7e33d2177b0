//! Yahoo Finance chart API client.
//!
//! `GET <chart_url>/<ticker>?range=1y&interval=1d` returns parallel arrays
//! of timestamps and OHLCV values in which any entry may be `null`
//! (holidays, halted sessions). [`normalize`] turns them into a clean,
//! date-ordered series.

use chrono::{DateTime, NaiveDate};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{debug, warn};

use super::PriceSource;
use crate::config::MarketConfig;
use crate::models::{Instrument, PricePoint};
use crate::{GttError, Result};

/// Some Yahoo edges refuse requests without a browser-like agent.
const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) gttwatch/0.1";

/// Top-level chart response.
#[derive(Debug, Deserialize)]
pub struct ChartResponse {
    pub chart: Chart,
}

#[derive(Debug, Deserialize)]
pub struct Chart {
    #[serde(default)]
    pub result: Option<Vec<ChartResult>>,
    #[serde(default)]
    pub error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
pub struct ChartError {
    pub code: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Deserialize)]
pub struct ChartResult {
    #[serde(default)]
    pub meta: ChartMeta,
    #[serde(default)]
    pub timestamp: Vec<i64>,
    pub indicators: Indicators,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartMeta {
    #[serde(default)]
    pub symbol: String,
    /// Exchange offset from UTC in seconds; bars are dated in exchange time.
    #[serde(default)]
    pub gmtoffset: i64,
}

#[derive(Debug, Deserialize)]
pub struct Indicators {
    #[serde(default)]
    pub quote: Vec<Quote>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Quote {
    #[serde(default)]
    pub open: Vec<Option<f64>>,
    #[serde(default)]
    pub high: Vec<Option<f64>>,
    #[serde(default)]
    pub low: Vec<Option<f64>>,
    #[serde(default)]
    pub close: Vec<Option<f64>>,
    #[serde(default)]
    pub volume: Vec<Option<u64>>,
}

/// Converts a provider float to a price rounded to the paisa.
fn price(value: Option<f64>) -> Option<Decimal> {
    value
        .filter(|v| v.is_finite())
        .and_then(|v| Decimal::try_from(v).ok())
        .map(|d| d.round_dp(2))
}

/// Turns one chart result into an ordered series.
///
/// Bars without a close are dropped; a missing open/high/low falls back
/// to the close. When several bars land on one date the last one wins.
pub fn normalize(result: &ChartResult) -> Vec<PricePoint> {
    let empty = Quote::default();
    let quote = result.indicators.quote.first().unwrap_or(&empty);

    let mut points: Vec<PricePoint> = result
        .timestamp
        .iter()
        .enumerate()
        .filter_map(|(i, &ts)| {
            let close = price(at(&quote.close, i))?;
            let date = exchange_date(ts, result.meta.gmtoffset)?;
            Some(PricePoint {
                date,
                open: price(at(&quote.open, i)).unwrap_or(close),
                high: price(at(&quote.high, i)).unwrap_or(close),
                low: price(at(&quote.low, i)).unwrap_or(close),
                close,
                volume: quote.volume.get(i).copied().flatten(),
            })
        })
        .collect();

    // Stable sort keeps provider order within a date, so the later bar wins below.
    points.sort_by_key(|p| p.date);
    let mut deduped: Vec<PricePoint> = Vec::with_capacity(points.len());
    for point in points {
        match deduped.last_mut() {
            Some(last) if last.date == point.date => *last = point,
            _ => deduped.push(point),
        }
    }
    deduped
}

fn at(values: &[Option<f64>], i: usize) -> Option<f64> {
    values.get(i).copied().flatten()
}

fn exchange_date(timestamp: i64, gmtoffset: i64) -> Option<NaiveDate> {
    DateTime::from_timestamp(timestamp + gmtoffset, 0).map(|dt| dt.date_naive())
}

/// Extracts the series from a decoded response.
///
/// # Errors
///
/// Returns [`GttError::DataUnavailable`] when the provider reports an
/// error or the result holds no usable bars.
pub fn parse_chart(symbol: &str, response: ChartResponse) -> Result<Vec<PricePoint>> {
    if let Some(err) = response.chart.error {
        return Err(GttError::unavailable(
            symbol,
            format!("{}: {}", err.code, err.description),
        ));
    }
    let result = response
        .chart
        .result
        .and_then(|mut r| if r.is_empty() { None } else { Some(r.swap_remove(0)) })
        .ok_or_else(|| GttError::unavailable(symbol, "empty chart result"))?;

    let points = normalize(&result);
    if points.is_empty() {
        return Err(GttError::unavailable(symbol, "no bars with a close price"));
    }
    Ok(points)
}

/// HTTP client for the chart endpoint.
#[derive(Debug, Clone)]
pub struct YahooClient {
    client: reqwest::Client,
    chart_url: String,
    range: String,
}

impl YahooClient {
    /// Builds a client from the market section of the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`GttError::Http`] if the HTTP client cannot be built.
    pub fn new(config: &MarketConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self {
            client,
            chart_url: config.chart_url.trim_end_matches('/').to_string(),
            range: config.range.clone(),
        })
    }

    async fn download(&self, ticker: &str) -> std::result::Result<ChartResponse, reqwest::Error> {
        let url = format!("{}/{ticker}", self.chart_url);
        // Yahoo answers unknown tickers with 404 and the same JSON error body.
        let response = self
            .client
            .get(&url)
            .query(&[("range", self.range.as_str()), ("interval", "1d")])
            .send()
            .await?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return response.json().await;
        }
        response.error_for_status()?.json().await
    }
}

impl PriceSource for YahooClient {
    async fn fetch(&self, instrument: &Instrument) -> Result<Vec<PricePoint>> {
        let ticker = instrument.provider_ticker();
        debug!(%instrument, %ticker, range = %self.range, "requesting chart");

        let response = self.download(&ticker).await.map_err(|e| {
            warn!(%instrument, error = %e, "chart request failed");
            GttError::unavailable(&instrument.symbol, e.to_string())
        })?;
        let points = parse_chart(&instrument.symbol, response)?;
        debug!(%instrument, points = points.len(), "chart normalized");
        Ok(points)
    }
}
