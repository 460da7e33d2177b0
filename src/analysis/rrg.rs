//! Relative rotation of sector indices against a benchmark.
//!
//! Relative strength is the sector close divided by the benchmark close on
//! the same date. The RS-ratio expresses it against its own simple moving
//! average, centred on 100, and the RS-momentum does the same for the
//! ratio. Together they place a sector in one of four quadrants.

use std::collections::HashMap;

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::models::PricePoint;

/// Bar spacing the rotation is computed on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Interval {
    #[default]
    Daily,
    /// Last close of each ISO week.
    Weekly,
}

impl Interval {
    pub fn apply(self, points: &[PricePoint]) -> Vec<PricePoint> {
        match self {
            Self::Daily => points.to_vec(),
            Self::Weekly => weekly(points),
        }
    }
}

/// Keeps the last bar of every ISO week. Input must be sorted by date.
pub fn weekly(points: &[PricePoint]) -> Vec<PricePoint> {
    let mut out: Vec<PricePoint> = Vec::new();
    for point in points {
        match out.last_mut() {
            Some(last) if last.date.iso_week() == point.date.iso_week() => *last = point.clone(),
            _ => out.push(point.clone()),
        }
    }
    out
}

/// Smoothing window and tail length of a rotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RotationConfig {
    pub window: usize,
    /// Most recent readings kept as the tail.
    pub tail: usize,
}

impl Default for RotationConfig {
    fn default() -> Self {
        Self {
            window: 14,
            tail: 10,
        }
    }
}

impl RotationConfig {
    /// Aligned bars needed before the first momentum value exists.
    pub fn min_points(&self) -> usize {
        (2 * self.window).saturating_sub(1).max(1)
    }
}

/// RRG quadrant, split at 100 on both axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Quadrant {
    Leading,
    Weakening,
    Lagging,
    Improving,
}

impl Quadrant {
    /// A value of exactly 100 counts as the upper side.
    pub fn classify(ratio: Decimal, momentum: Decimal) -> Self {
        match (ratio >= Decimal::ONE_HUNDRED, momentum >= Decimal::ONE_HUNDRED) {
            (true, true) => Self::Leading,
            (true, false) => Self::Weakening,
            (false, false) => Self::Lagging,
            (false, true) => Self::Improving,
        }
    }
}

/// RS-ratio and RS-momentum on one date.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RrgPoint {
    pub date: NaiveDate,
    pub ratio: Decimal,
    pub momentum: Decimal,
}

/// Latest rotation reading of one sector, with its recent path.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RrgReading {
    pub symbol: String,
    pub date: NaiveDate,
    pub ratio: Decimal,
    pub momentum: Decimal,
    pub quadrant: Quadrant,
    /// Oldest first, ending with the latest reading.
    pub tail: Vec<RrgPoint>,
}

/// Sector and benchmark closes on the dates both series share, in date
/// order. Dates where the benchmark closed at zero are dropped.
pub fn align(sector: &[PricePoint], benchmark: &[PricePoint]) -> Vec<(NaiveDate, Decimal, Decimal)> {
    let bench: HashMap<NaiveDate, Decimal> = benchmark.iter().map(|p| (p.date, p.close)).collect();
    let mut aligned: Vec<_> = sector
        .iter()
        .filter_map(|p| {
            let b = *bench.get(&p.date)?;
            (!b.is_zero()).then_some((p.date, p.close, b))
        })
        .collect();
    aligned.sort_by_key(|(date, ..)| *date);
    aligned.dedup_by_key(|(date, ..)| *date);
    aligned
}

/// `100 × value / SMA(window)` at every index where the average exists.
fn relative_to_average(values: &[Decimal], window: usize) -> Vec<Option<Decimal>> {
    let mut out = vec![None; values.len()];
    if window == 0 {
        return out;
    }
    for end in window..=values.len() {
        let slice = &values[end - window..end];
        let mean = slice.iter().sum::<Decimal>() / Decimal::from(window);
        out[end - 1] = values[end - 1]
            .checked_div(mean)
            .map(|r| r * Decimal::ONE_HUNDRED);
    }
    out
}

/// Full RS-ratio / RS-momentum path, unrounded, for the dates where both
/// are defined.
pub fn rotation_path(
    sector: &[PricePoint],
    benchmark: &[PricePoint],
    window: usize,
) -> Vec<RrgPoint> {
    let aligned = align(sector, benchmark);
    let strength: Vec<Decimal> = aligned.iter().map(|(_, s, b)| s / b).collect();

    // Momentum is only averaged over the defined part of the ratio.
    let ratio = relative_to_average(&strength, window);
    let first = ratio.iter().position(Option::is_some).unwrap_or(ratio.len());
    let defined: Vec<Decimal> = ratio[first..].iter().map_while(|r| *r).collect();
    let momentum = relative_to_average(&defined, window);

    defined
        .iter()
        .zip(momentum)
        .enumerate()
        .filter_map(|(i, (&ratio, momentum))| {
            Some(RrgPoint {
                date: aligned[first + i].0,
                ratio,
                momentum: momentum?,
            })
        })
        .collect()
}

/// Latest rotation reading for `symbol`, or `None` when the aligned
/// history is too short for one momentum value.
pub fn rotation(
    symbol: &str,
    sector: &[PricePoint],
    benchmark: &[PricePoint],
    config: &RotationConfig,
) -> Option<RrgReading> {
    let path = rotation_path(sector, benchmark, config.window);
    let start = path.len().saturating_sub(config.tail.max(1));
    let tail: Vec<RrgPoint> = path[start..]
        .iter()
        .map(|p| RrgPoint {
            date: p.date,
            ratio: p.ratio.round_dp(2).normalize(),
            momentum: p.momentum.round_dp(2).normalize(),
        })
        .collect();
    let head = tail.last()?.clone();

    Some(RrgReading {
        symbol: symbol.to_string(),
        date: head.date,
        ratio: head.ratio,
        momentum: head.momentum,
        quadrant: Quadrant::classify(head.ratio, head.momentum),
        tail,
    })
}
