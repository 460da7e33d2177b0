//! Shared fakes and builders for integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::{Days, NaiveDate};
use rust_decimal::Decimal;

use gttwatch::market::PriceSource;
use gttwatch::models::{Holding, Instrument, PricePoint, ProtectiveOrder, TriggerKind};
use gttwatch::session::BrokerApi;
use gttwatch::{GttError, Result};

pub fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 14).unwrap()
}

/// Daily bars ending the day before `today()`, one per close.
pub fn series(closes: &[Decimal]) -> Vec<PricePoint> {
    let start = today() - Days::new(closes.len() as u64);
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| PricePoint {
            date: start + Days::new(i as u64),
            open: close,
            high: close,
            low: close,
            close,
            volume: Some(1_000),
        })
        .collect()
}

/// `n` closes rising by one from `from`.
pub fn rising(from: i64, n: usize) -> Vec<PricePoint> {
    let closes: Vec<Decimal> = (0..n as i64).map(|i| Decimal::from(from + i)).collect();
    series(&closes)
}

/// `n` closes falling by one from `from`.
pub fn falling(from: i64, n: usize) -> Vec<PricePoint> {
    let closes: Vec<Decimal> = (0..n as i64).map(|i| Decimal::from(from - i)).collect();
    series(&closes)
}

pub fn holding(symbol: &str, quantity: i64, average: Decimal, last: Decimal) -> Holding {
    Holding {
        symbol: symbol.into(),
        exchange: "NSE".into(),
        quantity,
        mtf_quantity: 0,
        average_price: average,
        last_price: last,
        broker_pnl: (last - average) * Decimal::from(quantity),
        day_change: Decimal::ZERO,
        day_change_percent: Decimal::ZERO,
    }
}

pub fn leg(gtt_id: u64, symbol: &str, kind: TriggerKind, trigger: Decimal) -> ProtectiveOrder {
    ProtectiveOrder {
        gtt_id,
        symbol: symbol.into(),
        exchange: "NSE".into(),
        kind,
        trigger_price: trigger,
        quantity: 100,
        transaction_type: "SELL".into(),
        limit_price: trigger,
    }
}

/// Broker returning canned data, or `SessionExpired` once expired.
#[derive(Debug, Default)]
pub struct FakeBroker {
    pub holdings: Vec<Holding>,
    pub orders: Vec<ProtectiveOrder>,
    pub expired: bool,
}

impl FakeBroker {
    pub fn new(holdings: Vec<Holding>, orders: Vec<ProtectiveOrder>) -> Self {
        Self {
            holdings,
            orders,
            expired: false,
        }
    }

    pub fn expired() -> Self {
        Self {
            expired: true,
            ..Self::default()
        }
    }
}

impl BrokerApi for FakeBroker {
    async fn holdings(&self) -> Result<Vec<Holding>> {
        if self.expired {
            return Err(GttError::SessionExpired);
        }
        Ok(self.holdings.clone())
    }

    async fn gtt_orders(&self) -> Result<Vec<ProtectiveOrder>> {
        if self.expired {
            return Err(GttError::SessionExpired);
        }
        Ok(self.orders.clone())
    }
}

/// Price source serving fixed series by symbol and counting fetches.
#[derive(Debug, Default)]
pub struct FakeSource {
    series: Mutex<HashMap<String, Vec<PricePoint>>>,
    fetches: AtomicUsize,
}

impl FakeSource {
    pub fn with(self, symbol: &str, points: Vec<PricePoint>) -> Self {
        self.series
            .lock()
            .unwrap()
            .insert(symbol.to_string(), points);
        self
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

impl PriceSource for FakeSource {
    async fn fetch(&self, instrument: &Instrument) -> Result<Vec<PricePoint>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.series
            .lock()
            .unwrap()
            .get(&instrument.symbol)
            .cloned()
            .ok_or_else(|| GttError::unavailable(&instrument.symbol, "no data found"))
    }
}

impl PriceSource for &FakeSource {
    async fn fetch(&self, instrument: &Instrument) -> Result<Vec<PricePoint>> {
        (**self).fetch(instrument).await
    }
}
