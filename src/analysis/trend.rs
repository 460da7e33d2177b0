//! EMA trend health.
//!
//! Each configured window produces an EMA of the closing prices, or
//! nothing when the series is shorter than the window. The reference
//! price is compared against every available EMA and the share of EMAs it
//! sits above becomes the trend strength.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::Serialize;

use super::config::{LabelThresholds, TrendConfig};
use crate::models::PricePoint;
use crate::models::price::closes;

/// Exponential moving average of `closes` over `window` periods.
///
/// Seeded with the simple average of the first `window` closes, then
/// smoothed with `α = 2 / (window + 1)` through every remaining close.
/// Returns `None` when the series is shorter than the window or the window
/// is zero.
pub fn ema(closes: &[Decimal], window: usize) -> Option<Decimal> {
    if window == 0 || closes.len() < window {
        return None;
    }

    let seed = closes[..window].iter().sum::<Decimal>() / Decimal::from(window);
    let alpha = Decimal::TWO / Decimal::from(window + 1);

    Some(
        closes[window..]
            .iter()
            .fold(seed, |prev, close| prev + alpha * (close - prev)),
    )
}

/// Where the reference price sits relative to one EMA.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EmaStatus {
    Above,
    Below,
    NotAvailable,
}

/// Overall trend derived from the strength score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendLabel {
    StrongBullish,
    ModeratelyBullish,
    WeakBullish,
    Bearish,
    /// No window had enough history.
    NoData,
}

impl TrendLabel {
    /// Classifies a strength score against the configured cut points.
    pub fn classify(strength: Decimal, available: usize, thresholds: &LabelThresholds) -> Self {
        if available == 0 {
            Self::NoData
        } else if strength >= thresholds.strong {
            Self::StrongBullish
        } else if strength >= thresholds.moderate {
            Self::ModeratelyBullish
        } else if strength > Decimal::ZERO {
            Self::WeakBullish
        } else {
            Self::Bearish
        }
    }
}

/// One window's EMA and the reference price's position against it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmaReading {
    pub value: Option<Decimal>,
    pub status: EmaStatus,
}

/// Trend health of one symbol.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendResult {
    pub symbol: String,
    pub reference_price: Decimal,
    /// Keyed by window length in trading days.
    pub emas: BTreeMap<usize, EmaReading>,
    pub above_count: usize,
    pub available_count: usize,
    /// `above_count / available_count`, zero when nothing is available.
    pub strength: Decimal,
    pub label: TrendLabel,
}

impl TrendResult {
    pub fn ema(&self, window: usize) -> Option<Decimal> {
        self.emas.get(&window).and_then(|r| r.value)
    }

    pub fn status(&self, window: usize) -> EmaStatus {
        self.emas
            .get(&window)
            .map_or(EmaStatus::NotAvailable, |r| r.status)
    }
}

/// Computes [`TrendResult`]s with a fixed [`TrendConfig`].
#[derive(Debug, Clone, Default)]
pub struct TrendAnalyzer {
    config: TrendConfig,
}

impl TrendAnalyzer {
    pub fn new(config: TrendConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TrendConfig {
        &self.config
    }

    /// Analyzes `series` against its own latest close.
    ///
    /// Returns `None` for an empty series.
    pub fn analyze_series(&self, symbol: &str, series: &[PricePoint]) -> Option<TrendResult> {
        let reference = series.last()?.close;
        Some(self.analyze(symbol, series, reference))
    }

    /// Analyzes `series` against an explicit reference price.
    pub fn analyze(
        &self,
        symbol: &str,
        series: &[PricePoint],
        reference_price: Decimal,
    ) -> TrendResult {
        let closes = closes(series);

        let emas: BTreeMap<usize, EmaReading> = self
            .config
            .windows
            .iter()
            .map(|&window| {
                let value = ema(&closes, window).map(|v| v.round_dp(2));
                let status = match value {
                    None => EmaStatus::NotAvailable,
                    Some(v) if reference_price > v => EmaStatus::Above,
                    Some(_) => EmaStatus::Below,
                };
                (window, EmaReading { value, status })
            })
            .collect();

        let available_count = emas.values().filter(|r| r.value.is_some()).count();
        let above_count = emas
            .values()
            .filter(|r| r.status == EmaStatus::Above)
            .count();
        let strength = if available_count == 0 {
            Decimal::ZERO
        } else {
            Decimal::from(above_count) / Decimal::from(available_count)
        };

        TrendResult {
            symbol: symbol.to_string(),
            reference_price,
            label: TrendLabel::classify(strength, available_count, &self.config.labels),
            emas,
            above_count,
            available_count,
            strength,
        }
    }

    /// Whether a result counts as bullish in health summaries.
    pub fn is_bullish(&self, result: &TrendResult) -> bool {
        result.available_count > 0 && result.strength >= self.config.bullish_cutoff
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Days, NaiveDate};
    use rust_decimal_macros::dec;

    fn series(closes: &[Decimal]) -> Vec<PricePoint> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        closes
            .iter()
            .enumerate()
            .map(|(i, &close)| PricePoint {
                date: start + Days::new(i as u64),
                open: close,
                high: close,
                low: close,
                close,
                volume: None,
            })
            .collect()
    }

    fn rising(len: usize) -> Vec<Decimal> {
        (1..=len).map(|i| Decimal::from(100 + i)).collect()
    }

    #[test]
    fn ema_of_constant_series_is_the_constant() {
        let closes = vec![dec!(42); 30];
        assert_eq!(ema(&closes, 10), Some(dec!(42)));
    }

    #[test]
    fn ema_with_exact_window_is_simple_average() {
        let closes = vec![dec!(1), dec!(2), dec!(3), dec!(4)];
        assert_eq!(ema(&closes, 4), Some(dec!(2.5)));
    }

    #[test]
    fn ema_matches_hand_calculation() {
        // seed = (2 + 4 + 6) / 3 = 4, alpha = 0.5
        // 8  -> 4 + 0.5 * (8 - 4)  = 6
        // 10 -> 6 + 0.5 * (10 - 6) = 8
        let closes = vec![dec!(2), dec!(4), dec!(6), dec!(8), dec!(10)];
        assert_eq!(ema(&closes, 3), Some(dec!(8)));
    }

    #[test]
    fn ema_short_series_is_none() {
        assert_eq!(ema(&[dec!(1), dec!(2)], 3), None);
        assert_eq!(ema(&[dec!(1)], 0), None);
    }

    #[test]
    fn sixty_closes_skip_the_200_window() {
        let analyzer = TrendAnalyzer::default();
        let result = analyzer.analyze_series("X", &series(&rising(60))).unwrap();

        assert!(result.ema(10).is_some());
        assert!(result.ema(20).is_some());
        assert!(result.ema(50).is_some());
        assert_eq!(result.ema(200), None);
        assert_eq!(result.status(200), EmaStatus::NotAvailable);
        assert_eq!(result.available_count, 3);
        // A steadily rising series closes above every trailing EMA.
        assert_eq!(result.above_count, 3);
        assert_eq!(result.strength, Decimal::ONE);
        assert_eq!(result.label, TrendLabel::StrongBullish);
    }

    #[test]
    fn falling_series_is_bearish() {
        let closes: Vec<Decimal> = rising(250).into_iter().rev().collect();
        let analyzer = TrendAnalyzer::default();
        let result = analyzer.analyze_series("Y", &series(&closes)).unwrap();
        assert_eq!(result.available_count, 4);
        assert_eq!(result.strength, Decimal::ZERO);
        assert_eq!(result.label, TrendLabel::Bearish);
        assert!(!analyzer.is_bullish(&result));
    }

    #[test]
    fn no_available_window_has_zero_strength() {
        let analyzer = TrendAnalyzer::default();
        let result = analyzer.analyze_series("Z", &series(&rising(5))).unwrap();
        assert_eq!(result.available_count, 0);
        assert_eq!(result.strength, Decimal::ZERO);
        assert_eq!(result.label, TrendLabel::NoData);
        assert!(!analyzer.is_bullish(&result));
    }

    #[test]
    fn reference_equal_to_ema_counts_as_below() {
        let analyzer = TrendAnalyzer::default();
        let result = analyzer.analyze("C", &series(&[dec!(50); 20]), dec!(50));
        assert_eq!(result.status(10), EmaStatus::Below);
        assert_eq!(result.status(20), EmaStatus::Below);
        assert_eq!(result.strength, Decimal::ZERO);
    }

    #[test]
    fn mixed_signals_use_configured_labels() {
        let analyzer = TrendAnalyzer::default();
        // Long decline then a sharp bounce: price clears the fast EMAs only.
        let mut closes: Vec<Decimal> = (0..240).map(|i| Decimal::from(400 - i)).collect();
        closes.extend((0..10).map(|i| Decimal::from(170 + i * 4)));
        let result = analyzer.analyze_series("M", &series(&closes)).unwrap();

        assert_eq!(result.available_count, 4);
        assert_eq!(result.status(10), EmaStatus::Above);
        assert_eq!(result.status(200), EmaStatus::Below);
        assert!(result.strength > Decimal::ZERO && result.strength < Decimal::ONE);
        assert_ne!(result.label, TrendLabel::Bearish);
        assert_ne!(result.label, TrendLabel::NoData);
    }

    #[test]
    fn classify_boundaries() {
        let t = LabelThresholds::default();
        assert_eq!(TrendLabel::classify(dec!(0.75), 4, &t), TrendLabel::StrongBullish);
        assert_eq!(TrendLabel::classify(dec!(0.5), 4, &t), TrendLabel::ModeratelyBullish);
        assert_eq!(TrendLabel::classify(dec!(0.25), 4, &t), TrendLabel::WeakBullish);
        assert_eq!(TrendLabel::classify(dec!(0), 4, &t), TrendLabel::Bearish);
        assert_eq!(TrendLabel::classify(dec!(0), 0, &t), TrendLabel::NoData);
    }
}
