//! Portfolio aggregation.
//!
//! [`Dashboard`] joins holdings with their protective GTTs and drives the
//! risk and trend analysis behind each dashboard view. Every call fetches
//! what it needs from the shared [`Session`] and resolves price history
//! symbol by symbol through the daily cache.

pub mod indices;
pub mod report;

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::{info, warn};

use crate::analysis::{Interval, RotationConfig, TrendAnalyzer, risk, rrg};
use crate::cache::{self, SeriesStore};
use crate::market::PriceSource;
use crate::models::{Holding, Instrument, ProtectiveOrder};
use crate::session::{BrokerApi, Session};
use crate::{GttError, Result};

pub use indices::{
    MARKET_INDICES, ROTATION_BENCHMARK, SECTOR_INDICES, market_indices, rotation_benchmark,
    sector_indices,
};
pub use report::{
    GttView, HealthEntry, HealthReport, HealthSummary, HoldingView, ProximityEntry,
    ProximityReport, RiskPosition, RiskReport, RiskSummary, RotationEntry, RotationReport,
    RotationSummary, SkippedSymbol, StatusReport, UnprotectedHolding,
};
use report::{MONEY_DP, money};

/// The stop-loss chosen for a symbol, with its sibling target leg.
#[derive(Debug, Clone, Copy)]
struct Protection<'a> {
    stop: &'a ProtectiveOrder,
    target: Option<&'a ProtectiveOrder>,
    gtt_count: usize,
}

/// Protective legs grouped by symbol.
struct ProtectionIndex<'a> {
    by_symbol: HashMap<&'a str, Vec<&'a ProtectiveOrder>>,
}

impl<'a> ProtectionIndex<'a> {
    fn new(orders: &'a [ProtectiveOrder]) -> Self {
        let mut by_symbol: HashMap<&str, Vec<&ProtectiveOrder>> = HashMap::new();
        for order in orders {
            by_symbol.entry(order.symbol.as_str()).or_default().push(order);
        }
        Self { by_symbol }
    }

    /// Highest stop-loss trigger wins: it is the first to fire as price
    /// falls. Ties go to the lower GTT id.
    fn protection(&self, symbol: &str) -> Option<Protection<'a>> {
        let legs = self.by_symbol.get(symbol)?;
        let stops = legs.iter().copied().filter(|o| o.is_stop_loss());

        let stop = stops.clone().max_by(|a, b| {
            a.trigger_price
                .cmp(&b.trigger_price)
                .then(b.gtt_id.cmp(&a.gtt_id))
        })?;
        let target = legs
            .iter()
            .copied()
            .find(|o| o.gtt_id == stop.gtt_id && !o.is_stop_loss());

        let mut ids: Vec<u64> = stops.map(|o| o.gtt_id).collect();
        ids.sort_unstable();
        ids.dedup();

        Some(Protection {
            stop,
            target,
            gtt_count: ids.len(),
        })
    }
}

/// Request-scoped orchestrator over a broker session, a price source and
/// a series store.
pub struct Dashboard<B, P, S> {
    session: Arc<Session<B>>,
    source: P,
    store: S,
    analyzer: TrendAnalyzer,
    indices: Vec<Instrument>,
    benchmark: Instrument,
    sectors: Vec<Instrument>,
    rotation: RotationConfig,
}

impl<B, P, S> Dashboard<B, P, S>
where
    B: BrokerApi,
    P: PriceSource,
    S: SeriesStore,
{
    pub fn new(session: Arc<Session<B>>, source: P, store: S, analyzer: TrendAnalyzer) -> Self {
        Self {
            session,
            source,
            store,
            analyzer,
            indices: market_indices(),
            benchmark: rotation_benchmark(),
            sectors: sector_indices(),
            rotation: RotationConfig::default(),
        }
    }

    /// Replaces the index list used by [`market_health`](Self::market_health).
    pub fn with_indices(mut self, indices: Vec<Instrument>) -> Self {
        self.indices = indices;
        self
    }

    /// Replaces the benchmark and sectors used by
    /// [`sector_rotation`](Self::sector_rotation).
    pub fn with_sectors(mut self, benchmark: Instrument, sectors: Vec<Instrument>) -> Self {
        self.benchmark = benchmark;
        self.sectors = sectors;
        self
    }

    pub fn session(&self) -> &Arc<Session<B>> {
        &self.session
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Drops `broker` from the session when `result` says its token is dead.
    async fn checked<T>(&self, broker: &Arc<B>, result: Result<T>) -> Result<T> {
        if matches!(result, Err(GttError::SessionExpired)) {
            self.session.invalidate_if_current(broker).await;
        }
        result
    }

    async fn fetch_holdings(&self) -> Result<Vec<Holding>> {
        let broker = self.session.current().await?;
        let holdings = broker.holdings().await;
        self.checked(&broker, holdings).await
    }

    async fn fetch_orders(&self) -> Result<Vec<ProtectiveOrder>> {
        let broker = self.session.current().await?;
        let orders = broker.gtt_orders().await;
        self.checked(&broker, orders).await
    }

    /// Risk figures for every protected holding plus portfolio totals.
    ///
    /// # Errors
    ///
    /// Returns [`GttError::SessionExpired`] without a valid session, or any
    /// broker error.
    pub async fn risk_analytics(&self) -> Result<RiskReport> {
        let holdings = self.fetch_holdings().await?;
        let orders = self.fetch_orders().await?;
        let index = ProtectionIndex::new(&orders);

        let mut totals = RiskSummary::default();
        let mut positions = Vec::new();
        let mut unprotected = Vec::new();

        for holding in &holdings {
            totals.total_investment += holding.investment();
            totals.total_profit += holding.profit();

            let Some(protection) = index.protection(&holding.symbol) else {
                totals.unprotected_profit += holding.profit();
                unprotected.push(UnprotectedHolding::from(holding));
                continue;
            };

            let metrics = risk::compute(holding, protection.stop)?;
            totals.protected_investment += holding.investment();
            totals.protected_profit += holding.profit();
            totals.total_capital_risk += metrics.capital_at_risk;
            totals.total_open_risk += metrics.open_pnl_at_risk;
            if metrics.capital_at_risk > Decimal::ZERO {
                totals.positive_capital_risk += metrics.capital_at_risk;
            }

            let target = protection.target.map(|t| t.trigger_price);
            positions.push(RiskPosition {
                metrics: metrics.round_dp(MONEY_DP),
                exchange: holding.exchange.clone(),
                quantity: holding.quantity,
                average_price: holding.average_price,
                last_price: holding.last_price,
                investment: money(holding.investment()),
                profit: money(holding.profit()),
                profit_percent: money(holding.profit_percent()),
                gtt_id: protection.stop.gtt_id,
                stop_loss: protection.stop.trigger_price,
                target,
                target_percent: target
                    .and_then(|t| risk::target_percent(holding.last_price, t))
                    .map(money),
                gtt_count: protection.gtt_count,
            });
        }

        let summary = RiskSummary {
            total_stocks: positions.len(),
            total_investment: money(totals.total_investment),
            total_profit: money(totals.total_profit),
            protected_investment: money(totals.protected_investment),
            protected_profit: money(totals.protected_profit),
            total_capital_risk: money(totals.total_capital_risk),
            positive_capital_risk: money(totals.positive_capital_risk),
            total_open_risk: money(totals.total_open_risk),
            unprotected_count: unprotected.len(),
            unprotected_profit: money(totals.unprotected_profit),
        };
        info!(
            protected = summary.total_stocks,
            unprotected = summary.unprotected_count,
            "Computed risk analytics"
        );

        Ok(RiskReport {
            summary,
            positions,
            unprotected,
        })
    }

    /// EMA health of every symbol with an active GTT, sorted by symbol.
    ///
    /// # Errors
    ///
    /// Returns [`GttError::SessionExpired`] without a valid session.
    /// Symbols without usable history are skipped, not failed.
    pub async fn technical_health(&self, today: NaiveDate) -> Result<HealthReport> {
        let orders = self.fetch_orders().await?;

        let symbols: BTreeMap<&str, &str> = orders
            .iter()
            .map(|o| (o.symbol.as_str(), o.exchange.as_str()))
            .collect();
        let instruments: Vec<Instrument> = symbols
            .into_iter()
            .map(|(symbol, exchange)| Instrument::stock(symbol, exchange))
            .collect();

        Ok(self.health(&instruments, today).await)
    }

    /// EMA health of the tracked market indices, in list order.
    pub async fn market_health(&self, today: NaiveDate) -> HealthReport {
        self.health(&self.indices, today).await
    }

    async fn health(&self, instruments: &[Instrument], today: NaiveDate) -> HealthReport {
        let mut summary = HealthSummary::default();
        let mut entries = Vec::with_capacity(instruments.len());
        let mut skipped = Vec::new();

        for instrument in instruments {
            let series = match cache::resolve(&self.store, &self.source, instrument, today).await
            {
                Ok(series) => series,
                Err(e) => {
                    skipped.push(skip(instrument, e));
                    continue;
                }
            };

            let Some(trend) = self.analyzer.analyze_series(&instrument.symbol, &series.points)
            else {
                skipped.push(SkippedSymbol {
                    symbol: instrument.symbol.clone(),
                    reason: "empty series".into(),
                });
                continue;
            };

            let bullish = self.analyzer.is_bullish(&trend);
            if bullish {
                summary.bullish += 1;
            } else {
                summary.bearish += 1;
            }
            entries.push(HealthEntry {
                trend,
                name: instrument.name.clone(),
                exchange: instrument.exchange.clone(),
                bullish,
            });
        }

        summary.total = entries.len();
        summary.skipped = skipped.len();
        info!(
            analyzed = summary.total,
            bullish = summary.bullish,
            skipped = summary.skipped,
            "Computed trend health"
        );

        HealthReport {
            summary,
            entries,
            skipped,
        }
    }

    /// Relative rotation of the sector indices against the benchmark.
    ///
    /// # Errors
    ///
    /// Returns [`GttError::DataUnavailable`] when the benchmark history
    /// cannot be resolved. Sectors without enough history are skipped.
    pub async fn sector_rotation(
        &self,
        today: NaiveDate,
        interval: Interval,
    ) -> Result<RotationReport> {
        let benchmark = cache::resolve(&self.store, &self.source, &self.benchmark, today).await?;
        let benchmark_points = interval.apply(&benchmark.points);

        let mut summary = RotationSummary::default();
        let mut entries = Vec::with_capacity(self.sectors.len());
        let mut skipped = Vec::new();

        for sector in &self.sectors {
            let series = match cache::resolve(&self.store, &self.source, sector, today).await {
                Ok(series) => series,
                Err(e) => {
                    skipped.push(skip(sector, e));
                    continue;
                }
            };

            let points = interval.apply(&series.points);
            let Some(reading) =
                rrg::rotation(&sector.symbol, &points, &benchmark_points, &self.rotation)
            else {
                warn!(%sector, bars = points.len(), "too little aligned history for rotation");
                skipped.push(SkippedSymbol {
                    symbol: sector.symbol.clone(),
                    reason: format!(
                        "needs {} bars aligned with {}",
                        self.rotation.min_points(),
                        self.benchmark.symbol
                    ),
                });
                continue;
            };

            summary.count(reading.quadrant);
            entries.push(RotationEntry {
                reading,
                name: sector.name.clone(),
            });
        }

        summary.skipped = skipped.len();
        info!(
            sectors = summary.total,
            leading = summary.leading,
            skipped = summary.skipped,
            "Computed sector rotation"
        );

        Ok(RotationReport {
            benchmark: self.benchmark.symbol.clone(),
            interval,
            summary,
            entries,
            skipped,
        })
    }

    /// Position of each protected holding between its stop and target.
    ///
    /// # Errors
    ///
    /// Returns [`GttError::SessionExpired`] without a valid session.
    pub async fn proximity(&self) -> Result<ProximityReport> {
        let holdings = self.fetch_holdings().await?;
        let orders = self.fetch_orders().await?;
        let index = ProtectionIndex::new(&orders);

        let entries = holdings
            .iter()
            .filter_map(|holding| {
                let protection = index.protection(&holding.symbol)?;
                let stop = protection.stop.trigger_price;
                let target = protection.target.map(|t| t.trigger_price);
                let position = target
                    .and_then(|t| risk::proximity(holding.last_price, stop, t))
                    .map(|p| p.round_dp(3).normalize());

                Some(ProximityEntry {
                    symbol: holding.symbol.clone(),
                    last_price: holding.last_price,
                    stop_loss: stop,
                    target,
                    position,
                    below_stop: holding.last_price < stop,
                    beyond_target: target.is_some_and(|t| holding.last_price > t),
                })
            })
            .collect();

        Ok(ProximityReport { entries })
    }

    /// Holdings with non-zero quantity and their P&L.
    ///
    /// # Errors
    ///
    /// Returns [`GttError::SessionExpired`] without a valid session.
    pub async fn holdings(&self) -> Result<Vec<HoldingView>> {
        let holdings = self.fetch_holdings().await?;
        Ok(holdings.into_iter().map(HoldingView::from).collect())
    }

    /// Active GTTs with their legs folded together.
    ///
    /// # Errors
    ///
    /// Returns [`GttError::SessionExpired`] without a valid session.
    pub async fn active_orders(&self) -> Result<Vec<GttView>> {
        let orders = self.fetch_orders().await?;
        Ok(GttView::group(&orders))
    }

    pub async fn status(&self) -> StatusReport {
        StatusReport {
            status: "healthy",
            session_active: self.session.is_active().await,
        }
    }
}

fn skip(instrument: &Instrument, e: GttError) -> SkippedSymbol {
    warn!(%instrument, error = %e, "skipping symbol");
    SkippedSymbol {
        symbol: instrument.symbol.clone(),
        reason: match e {
            GttError::DataUnavailable { reason, .. } => reason,
            other => other.to_string(),
        },
    }
}
