//! JSON payloads returned by the [`Dashboard`](super::Dashboard).
//!
//! Money figures are rounded to two decimals when a payload is built;
//! totals are summed before rounding.

use rust_decimal::Decimal;
use serde::Serialize;

use crate::analysis::{Interval, Quadrant, RiskMetrics, RrgReading, TrendResult};
use crate::models::{Holding, ProtectiveOrder};

pub(crate) const MONEY_DP: u32 = 2;

/// Rounds a money figure for a payload. Trailing zeros are stripped so
/// equal amounts always print the same.
pub(crate) fn money(value: Decimal) -> Decimal {
    value.round_dp(MONEY_DP).normalize()
}

/// Risk analytics for the whole portfolio.
#[derive(Debug, Clone, Serialize)]
pub struct RiskReport {
    pub summary: RiskSummary,
    pub positions: Vec<RiskPosition>,
    pub unprotected: Vec<UnprotectedHolding>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RiskSummary {
    /// Holdings with at least one stop-loss.
    pub total_stocks: usize,
    /// Summed over every holding, protected or not.
    pub total_investment: Decimal,
    pub total_profit: Decimal,
    pub protected_investment: Decimal,
    pub protected_profit: Decimal,
    pub total_capital_risk: Decimal,
    /// Capital-at-risk summed over positions whose stop is still below cost.
    pub positive_capital_risk: Decimal,
    pub total_open_risk: Decimal,
    pub unprotected_count: usize,
    pub unprotected_profit: Decimal,
}

/// One protected holding against its chosen stop-loss.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskPosition {
    #[serde(flatten)]
    pub metrics: RiskMetrics,
    pub exchange: String,
    pub quantity: i64,
    pub average_price: Decimal,
    pub last_price: Decimal,
    pub investment: Decimal,
    pub profit: Decimal,
    pub profit_percent: Decimal,
    pub gtt_id: u64,
    pub stop_loss: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<Decimal>,
    /// Distance from last price to target, in percent of last price.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_percent: Option<Decimal>,
    /// Active GTTs with a stop-loss on this symbol.
    pub gtt_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnprotectedHolding {
    pub symbol: String,
    pub exchange: String,
    pub quantity: i64,
    pub investment: Decimal,
    pub profit: Decimal,
    pub profit_percent: Decimal,
}

impl From<&Holding> for UnprotectedHolding {
    fn from(h: &Holding) -> Self {
        Self {
            symbol: h.symbol.clone(),
            exchange: h.exchange.clone(),
            quantity: h.quantity,
            investment: money(h.investment()),
            profit: money(h.profit()),
            profit_percent: money(h.profit_percent()),
        }
    }
}

/// EMA health of a set of instruments.
#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub summary: HealthSummary,
    pub entries: Vec<HealthEntry>,
    pub skipped: Vec<SkippedSymbol>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HealthSummary {
    /// Instruments analyzed, skipped ones excluded.
    pub total: usize,
    pub bullish: usize,
    pub bearish: usize,
    pub skipped: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthEntry {
    #[serde(flatten)]
    pub trend: TrendResult,
    pub name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub exchange: String,
    pub bullish: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedSymbol {
    pub symbol: String,
    pub reason: String,
}

/// Where each protected holding trades between its stop and target.
#[derive(Debug, Clone, Serialize)]
pub struct ProximityReport {
    pub entries: Vec<ProximityEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProximityEntry {
    pub symbol: String,
    pub last_price: Decimal,
    pub stop_loss: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<Decimal>,
    /// 0 at the stop, 1 at the target; unclamped. Absent without a target.
    pub position: Option<Decimal>,
    pub below_stop: bool,
    pub beyond_target: bool,
}

/// Sector indices placed on the relative rotation graph.
#[derive(Debug, Clone, Serialize)]
pub struct RotationReport {
    pub benchmark: String,
    pub interval: Interval,
    pub summary: RotationSummary,
    pub entries: Vec<RotationEntry>,
    pub skipped: Vec<SkippedSymbol>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RotationSummary {
    pub total: usize,
    pub leading: usize,
    pub weakening: usize,
    pub lagging: usize,
    pub improving: usize,
    pub skipped: usize,
}

impl RotationSummary {
    pub(crate) fn count(&mut self, quadrant: Quadrant) {
        self.total += 1;
        match quadrant {
            Quadrant::Leading => self.leading += 1,
            Quadrant::Weakening => self.weakening += 1,
            Quadrant::Lagging => self.lagging += 1,
            Quadrant::Improving => self.improving += 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RotationEntry {
    #[serde(flatten)]
    pub reading: RrgReading,
    pub name: String,
}

/// A holding with its derived P&L figures.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HoldingView {
    #[serde(flatten)]
    pub holding: Holding,
    pub investment: Decimal,
    pub profit: Decimal,
    pub profit_percent: Decimal,
}

impl From<Holding> for HoldingView {
    fn from(holding: Holding) -> Self {
        Self {
            investment: money(holding.investment()),
            profit: money(holding.profit()),
            profit_percent: money(holding.profit_percent()),
            holding,
        }
    }
}

/// One active GTT with its legs folded together.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GttView {
    pub id: u64,
    pub symbol: String,
    pub exchange: String,
    pub transaction_type: String,
    pub quantity: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_loss: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<Decimal>,
}

impl GttView {
    /// Groups legs by GTT id, keeping the listing order of first appearance.
    pub fn group(orders: &[ProtectiveOrder]) -> Vec<Self> {
        let mut views: Vec<Self> = Vec::new();
        for leg in orders {
            let index = match views.iter().position(|v| v.id == leg.gtt_id) {
                Some(index) => index,
                None => {
                    views.push(Self {
                        id: leg.gtt_id,
                        symbol: leg.symbol.clone(),
                        exchange: leg.exchange.clone(),
                        transaction_type: leg.transaction_type.clone(),
                        quantity: leg.quantity,
                        stop_loss: None,
                        target: None,
                    });
                    views.len() - 1
                }
            };
            let view = &mut views[index];
            if leg.is_stop_loss() {
                view.stop_loss = Some(leg.trigger_price);
            } else {
                view.target = Some(leg.trigger_price);
            }
        }
        views
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusReport {
    pub status: &'static str,
    pub session_active: bool,
}
