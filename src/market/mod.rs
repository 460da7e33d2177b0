//! Historical price data retrieval.

pub mod yahoo;

use std::future::Future;

use crate::Result;
use crate::models::{Instrument, PricePoint};

pub use yahoo::YahooClient;

/// A provider of daily OHLC history.
pub trait PriceSource {
    /// Fetches the daily bars for `instrument`, oldest first, without
    /// duplicate dates.
    ///
    /// Implementations report every failure (transport, empty result,
    /// unknown symbol) as
    /// [`GttError::DataUnavailable`](crate::GttError::DataUnavailable).
    fn fetch(&self, instrument: &Instrument) -> impl Future<Output = Result<Vec<PricePoint>>> + Send;
}
