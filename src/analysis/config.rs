//! Trend classification configuration types and loading.

use std::fmt::Write;
use std::path::Path;

use rust_decimal::Decimal;
use serde::Deserialize;

/// EMA windows evaluated by default, in trading days.
pub const DEFAULT_WINDOWS: [usize; 4] = [10, 20, 50, 200];

/// Trend settings, optionally loaded from a JSON file.
///
/// Every field is optional in the file; missing ones take the defaults.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct TrendConfig {
    /// EMA windows to evaluate.
    pub windows: Vec<usize>,
    /// Strength cut points for the trend label.
    pub labels: LabelThresholds,
    /// Minimum strength for a symbol to count as bullish in health summaries.
    pub bullish_cutoff: Decimal,
}

/// Strength thresholds for [`TrendLabel`](super::trend::TrendLabel).
///
/// Strength at or above `strong` is strong-bullish, at or above `moderate`
/// moderately-bullish, anything above zero weak-bullish, zero bearish.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LabelThresholds {
    pub strong: Decimal,
    pub moderate: Decimal,
}

impl Default for TrendConfig {
    fn default() -> Self {
        Self {
            windows: DEFAULT_WINDOWS.to_vec(),
            labels: LabelThresholds::default(),
            bullish_cutoff: Decimal::new(5, 1),
        }
    }
}

impl Default for LabelThresholds {
    fn default() -> Self {
        Self {
            strong: Decimal::new(75, 2),
            moderate: Decimal::new(5, 1),
        }
    }
}

impl TrendConfig {
    /// Loads trend configuration from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, cannot be parsed, or
    /// holds inconsistent values (see [`validate`](Self::validate)).
    pub fn load(path: &Path) -> crate::Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            crate::GttError::Config(format!("failed to read {}: {e}", path.display()))
        })?;
        let config: Self = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks that windows are non-empty and positive and that the
    /// thresholds are ordered within `(0, 1]`.
    ///
    /// # Errors
    ///
    /// Returns [`GttError::Config`](crate::GttError::Config) describing the
    /// first violation found.
    pub fn validate(&self) -> crate::Result<()> {
        if self.windows.is_empty() || self.windows.contains(&0) {
            return Err(crate::GttError::Config(
                "trend windows must be non-empty and positive".to_string(),
            ));
        }
        let in_unit = |d: Decimal| d > Decimal::ZERO && d <= Decimal::ONE;
        if !in_unit(self.labels.moderate) || !in_unit(self.labels.strong) {
            return Err(crate::GttError::Config(
                "label thresholds must lie in (0, 1]".to_string(),
            ));
        }
        if self.labels.moderate > self.labels.strong {
            return Err(crate::GttError::Config(format!(
                "moderate threshold {} exceeds strong threshold {}",
                self.labels.moderate, self.labels.strong
            )));
        }
        if !in_unit(self.bullish_cutoff) {
            return Err(crate::GttError::Config(
                "bullish_cutoff must lie in (0, 1]".to_string(),
            ));
        }
        Ok(())
    }

    /// Returns a human-readable description of the active settings.
    pub fn describe(&self) -> String {
        let mut out = String::from("Trend settings:\n");
        let windows: Vec<String> = self.windows.iter().map(|w| w.to_string()).collect();
        let _ = writeln!(out, "  windows: {}", windows.join(", "));
        let _ = writeln!(out, "  strong_bullish: >= {}", self.labels.strong);
        let _ = writeln!(out, "  moderately_bullish: >= {}", self.labels.moderate);
        let _ = writeln!(out, "  bullish_cutoff: {}", self.bullish_cutoff);
        out
    }
}
