//! Daily price series models.

use std::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One trading day's OHLC bar.
///
/// Field names are part of the on-disk cache format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume: Option<u64>,
}

/// Whether a symbol is an equity or a market index.
///
/// The two kinds share the series shape but use different provider
/// tickers and cache file names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstrumentKind {
    Stock,
    Index,
}

impl InstrumentKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Stock => "stock",
            Self::Index => "index",
        }
    }
}

/// Something a price series can be fetched and cached for.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Instrument {
    /// Brokerage trading symbol for stocks, provider symbol for indices.
    pub symbol: String,
    pub kind: InstrumentKind,
    /// Listing exchange (`NSE`, `BSE`); empty for indices.
    pub exchange: String,
    /// Human-readable label used in logs and index payloads.
    pub name: String,
}

impl Instrument {
    pub fn stock(symbol: impl Into<String>, exchange: impl Into<String>) -> Self {
        let symbol = symbol.into();
        Self {
            name: symbol.clone(),
            symbol,
            kind: InstrumentKind::Stock,
            exchange: exchange.into(),
        }
    }

    pub fn index(symbol: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            kind: InstrumentKind::Index,
            exchange: String::new(),
            name: name.into(),
        }
    }

    /// Ticker understood by the market data provider.
    ///
    /// NSE stocks get `.NS`, BSE stocks `.BO`; indices and anything else
    /// pass through unchanged.
    pub fn provider_ticker(&self) -> String {
        match (self.kind, self.exchange.as_str()) {
            (InstrumentKind::Stock, "NSE") => format!("{}.NS", self.symbol),
            (InstrumentKind::Stock, "BSE") => format!("{}.BO", self.symbol),
            _ => self.symbol.clone(),
        }
    }

    /// Filename stem of this instrument's cache files.
    ///
    /// Indices are prefixed with `INDEX_` and stripped of `^`, with `.`
    /// replaced by `_`, so they never collide with equity symbols.
    pub fn cache_stem(&self) -> String {
        match self.kind {
            InstrumentKind::Stock => self.symbol.clone(),
            InstrumentKind::Index => {
                format!("INDEX_{}", self.symbol.replace('^', "").replace('.', "_"))
            }
        }
    }
}

impl fmt::Display for Instrument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            InstrumentKind::Stock => write!(f, "{}:{}", self.exchange, self.symbol),
            InstrumentKind::Index => write!(f, "{} ({})", self.name, self.symbol),
        }
    }
}

/// Closing prices of a series, oldest first.
pub fn closes(series: &[PricePoint]) -> Vec<Decimal> {
    series.iter().map(|p| p.close).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_tickers() {
        assert_eq!(Instrument::stock("RELIANCE", "NSE").provider_ticker(), "RELIANCE.NS");
        assert_eq!(Instrument::stock("SBIN", "BSE").provider_ticker(), "SBIN.BO");
        assert_eq!(Instrument::index("^NSEI", "Nifty 50").provider_ticker(), "^NSEI");
    }

    #[test]
    fn cache_stems_separate_kinds() {
        assert_eq!(Instrument::stock("RELIANCE", "NSE").cache_stem(), "RELIANCE");
        assert_eq!(Instrument::index("^NSEI", "Nifty 50").cache_stem(), "INDEX_NSEI");
        assert_eq!(
            Instrument::index("^CNX.TEST", "Dotted").cache_stem(),
            "INDEX_CNX_TEST"
        );
    }

    #[test]
    fn price_point_field_names_are_stable() {
        let point = PricePoint {
            date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            open: "10.5".parse().unwrap(),
            high: "11".parse().unwrap(),
            low: "10".parse().unwrap(),
            close: "10.75".parse().unwrap(),
            volume: Some(1200),
        };
        let json: serde_json::Value = serde_json::to_value(&point).unwrap();
        assert_eq!(json["date"], "2024-03-01");
        assert_eq!(json["close"], "10.75");
        assert_eq!(json["volume"], 1200);
    }
}
