//! Per-position analytics: EMA trend health, stop-loss risk and sector
//! rotation.

pub mod config;
pub mod risk;
pub mod rrg;
pub mod trend;

pub use config::TrendConfig;
pub use risk::{RiskMetrics, RiskReward};
pub use rrg::{Interval, Quadrant, RotationConfig, RrgReading};
pub use trend::{EmaStatus, TrendAnalyzer, TrendLabel, TrendResult};
