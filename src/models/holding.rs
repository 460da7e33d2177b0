//! Portfolio holding models.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A holding as returned by `GET /portfolio/holdings`.
#[derive(Debug, Clone, Deserialize)]
pub struct RawHolding {
    pub tradingsymbol: String,
    pub exchange: String,
    #[serde(default)]
    pub quantity: i64,
    /// Bought but not yet settled (T+1).
    #[serde(default)]
    pub t1_quantity: i64,
    pub average_price: Decimal,
    pub last_price: Decimal,
    /// Broker-reported P&L, including realised gains.
    #[serde(default)]
    pub pnl: Decimal,
    #[serde(default)]
    pub day_change: Decimal,
    #[serde(default)]
    pub day_change_percentage: Decimal,
    /// Margin trading facility position, when the broker reports one.
    #[serde(default)]
    pub mtf: Option<RawMtf>,
}

/// Margin-funded part of a holding.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawMtf {
    #[serde(default)]
    pub quantity: i64,
}

impl RawHolding {
    /// Normalizes into a [`Holding`], or `None` when nothing is held.
    pub fn normalize(self) -> Option<Holding> {
        let regular_quantity = self.quantity + self.t1_quantity;
        let mtf_quantity = self.mtf.as_ref().map_or(0, |m| m.quantity);
        let quantity = regular_quantity + mtf_quantity;
        if quantity == 0 {
            return None;
        }

        Some(Holding {
            symbol: self.tradingsymbol,
            exchange: self.exchange,
            quantity,
            mtf_quantity,
            average_price: self.average_price,
            last_price: self.last_price,
            broker_pnl: self.pnl,
            day_change: self.day_change,
            day_change_percent: self.day_change_percentage,
        })
    }
}

/// A position snapshot, including margin-funded quantity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Holding {
    pub symbol: String,
    pub exchange: String,
    /// Total quantity: settled + T1 + MTF.
    pub quantity: i64,
    pub mtf_quantity: i64,
    pub average_price: Decimal,
    pub last_price: Decimal,
    /// P&L as the broker reports it; may differ from [`profit`](Self::profit)
    /// after partial sales.
    #[serde(default)]
    pub broker_pnl: Decimal,
    #[serde(default)]
    pub day_change: Decimal,
    #[serde(default)]
    pub day_change_percent: Decimal,
}

impl Holding {
    /// Cost basis: average price × total quantity.
    pub fn investment(&self) -> Decimal {
        self.average_price * Decimal::from(self.quantity)
    }

    /// Unrealized profit: (last − average) × total quantity.
    pub fn profit(&self) -> Decimal {
        (self.last_price - self.average_price) * Decimal::from(self.quantity)
    }

    /// Unrealized profit as a percentage of the cost basis, zero without one.
    pub fn profit_percent(&self) -> Decimal {
        let investment = self.investment();
        if investment > Decimal::ZERO {
            self.profit() / investment * Decimal::ONE_HUNDRED
        } else {
            Decimal::ZERO
        }
    }
}
