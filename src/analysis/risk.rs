//! Stop-loss risk arithmetic for one (holding, protective order) pair.

use rust_decimal::Decimal;
use serde::{Serialize, Serializer};

use crate::models::{Holding, ProtectiveOrder};

/// Risk/reward ratio, or a marker that it has no finite value.
///
/// Serializes as the ratio itself or as the string `"undefined"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskReward {
    Ratio(Decimal),
    /// The stop-loss sits exactly at the average price.
    Undefined,
}

impl RiskReward {
    pub fn ratio(self) -> Option<Decimal> {
        match self {
            Self::Ratio(r) => Some(r),
            Self::Undefined => None,
        }
    }
}

impl Serialize for RiskReward {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Ratio(r) => Serialize::serialize(r, serializer),
            Self::Undefined => serializer.serialize_str("undefined"),
        }
    }
}

/// Risk figures for a holding against one stop-loss.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskMetrics {
    pub symbol: String,
    /// `(average − stop) × quantity`; negative once the stop is above cost.
    pub capital_at_risk: Decimal,
    /// `(last − stop) × quantity`: open profit given back if the stop fires.
    pub open_pnl_at_risk: Decimal,
    /// `(last − average) / (average − stop)`.
    pub risk_reward: RiskReward,
    /// Stop distance below average price, in percent of the average.
    pub stop_loss_percent: Decimal,
    /// Set when the stop is above the average price (a locked-in gain).
    pub stop_above_cost: bool,
}

impl RiskMetrics {
    /// Copy with every figure rounded to `dp` decimal places, trailing
    /// zeros stripped.
    pub fn round_dp(&self, dp: u32) -> Self {
        Self {
            symbol: self.symbol.clone(),
            capital_at_risk: self.capital_at_risk.round_dp(dp).normalize(),
            open_pnl_at_risk: self.open_pnl_at_risk.round_dp(dp).normalize(),
            risk_reward: match self.risk_reward {
                RiskReward::Ratio(r) => RiskReward::Ratio(r.round_dp(dp).normalize()),
                RiskReward::Undefined => RiskReward::Undefined,
            },
            stop_loss_percent: self.stop_loss_percent.round_dp(dp).normalize(),
            stop_above_cost: self.stop_above_cost,
        }
    }
}

/// Computes [`RiskMetrics`] for `holding` protected by `order`.
///
/// # Errors
///
/// Returns [`GttError::InvalidOrder`](crate::GttError::InvalidOrder) when
/// `order` is a target leg or belongs to a different symbol.
pub fn compute(holding: &Holding, order: &ProtectiveOrder) -> crate::Result<RiskMetrics> {
    if !order.is_stop_loss() {
        return Err(crate::GttError::InvalidOrder(format!(
            "GTT {} for {} is a target leg, not a stop-loss",
            order.gtt_id, order.symbol
        )));
    }
    if order.symbol != holding.symbol {
        return Err(crate::GttError::InvalidOrder(format!(
            "GTT {} protects {}, not {}",
            order.gtt_id, order.symbol, holding.symbol
        )));
    }

    let quantity = Decimal::from(holding.quantity);
    let stop = order.trigger_price;
    let risk_per_share = holding.average_price - stop;
    let reward_per_share = holding.last_price - holding.average_price;

    let risk_reward = if risk_per_share.is_zero() {
        RiskReward::Undefined
    } else {
        RiskReward::Ratio(reward_per_share / risk_per_share)
    };

    let stop_loss_percent = if holding.average_price.is_zero() {
        Decimal::ZERO
    } else {
        risk_per_share / holding.average_price * Decimal::ONE_HUNDRED
    };

    Ok(RiskMetrics {
        symbol: holding.symbol.clone(),
        capital_at_risk: risk_per_share * quantity,
        open_pnl_at_risk: (holding.last_price - stop) * quantity,
        risk_reward,
        stop_loss_percent,
        stop_above_cost: risk_per_share < Decimal::ZERO,
    })
}

/// Normalized position of `last` between `stop` (0) and `target` (1).
///
/// Not clamped: below the stop is negative, beyond the target exceeds 1.
/// `None` when stop and target coincide.
pub fn proximity(last: Decimal, stop: Decimal, target: Decimal) -> Option<Decimal> {
    let span = target - stop;
    if span.is_zero() {
        None
    } else {
        Some((last - stop) / span)
    }
}

/// Distance from `last` up to `target`, in percent of `last`.
pub fn target_percent(last: Decimal, target: Decimal) -> Option<Decimal> {
    if last.is_zero() {
        None
    } else {
        Some((target - last) / last * Decimal::ONE_HUNDRED)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::GttError;
    use crate::models::TriggerKind;
    use rust_decimal_macros::dec;

    fn holding(quantity: i64, average: Decimal, last: Decimal) -> Holding {
        Holding {
            symbol: "HDFCBANK".into(),
            exchange: "NSE".into(),
            quantity,
            mtf_quantity: 0,
            average_price: average,
            last_price: last,
            broker_pnl: Decimal::ZERO,
            day_change: Decimal::ZERO,
            day_change_percent: Decimal::ZERO,
        }
    }

    fn order(kind: TriggerKind, trigger: Decimal) -> ProtectiveOrder {
        ProtectiveOrder {
            gtt_id: 1,
            symbol: "HDFCBANK".into(),
            exchange: "NSE".into(),
            kind,
            trigger_price: trigger,
            quantity: 100,
            transaction_type: "SELL".into(),
            limit_price: trigger,
        }
    }

    #[test]
    fn reference_scenario() {
        let h = holding(100, dec!(200), dec!(250));
        let m = compute(&h, &order(TriggerKind::StopLoss, dec!(180))).unwrap();
        assert_eq!(m.capital_at_risk, dec!(2000));
        assert_eq!(m.open_pnl_at_risk, dec!(7000));
        assert_eq!(m.risk_reward, RiskReward::Ratio(dec!(2.5)));
        assert_eq!(m.stop_loss_percent, dec!(10));
        assert!(!m.stop_above_cost);

        let p = proximity(dec!(250), dec!(180), dec!(300)).unwrap();
        assert_eq!(p.round_dp(3), dec!(0.583));
    }

    #[test]
    fn rounding_keeps_undefined_sentinel() {
        let h = holding(3, dec!(300), dec!(310));
        let m = compute(&h, &order(TriggerKind::StopLoss, dec!(270))).unwrap();
        assert_eq!(m.risk_reward, RiskReward::Ratio(dec!(10) / dec!(30)));
        assert_eq!(m.round_dp(2).risk_reward, RiskReward::Ratio(dec!(0.33)));

        let flat = compute(&h, &order(TriggerKind::StopLoss, dec!(300))).unwrap();
        assert_eq!(flat.round_dp(2).risk_reward, RiskReward::Undefined);
    }

    #[test]
    fn stop_at_average_is_undefined() {
        let h = holding(10, dec!(200), dec!(220));
        let m = compute(&h, &order(TriggerKind::StopLoss, dec!(200))).unwrap();
        assert_eq!(m.risk_reward, RiskReward::Undefined);
        assert_eq!(m.risk_reward.ratio(), None);
        assert_eq!(m.capital_at_risk, Decimal::ZERO);
        assert_eq!(
            serde_json::to_value(m.risk_reward).unwrap(),
            serde_json::json!("undefined")
        );
    }

    #[test]
    fn trailed_stop_gives_negative_capital_risk() {
        let h = holding(10, dec!(200), dec!(260));
        let m = compute(&h, &order(TriggerKind::StopLoss, dec!(230))).unwrap();
        assert_eq!(m.capital_at_risk, dec!(-300));
        assert_eq!(m.open_pnl_at_risk, dec!(300));
        assert!(m.stop_above_cost);
        assert_eq!(m.risk_reward, RiskReward::Ratio(dec!(-2)));
    }

    #[test]
    fn target_leg_is_rejected() {
        let h = holding(10, dec!(200), dec!(220));
        let err = compute(&h, &order(TriggerKind::Target, dec!(300))).unwrap_err();
        assert!(matches!(err, GttError::InvalidOrder(_)));
    }

    #[test]
    fn mismatched_symbol_is_rejected() {
        let h = holding(10, dec!(200), dec!(220));
        let mut o = order(TriggerKind::StopLoss, dec!(180));
        o.symbol = "ICICIBANK".into();
        assert!(compute(&h, &o).is_err());
    }

    #[test]
    fn proximity_is_not_clamped() {
        assert_eq!(proximity(dec!(170), dec!(180), dec!(300)).unwrap().round_dp(3), dec!(-0.083));
        assert_eq!(proximity(dec!(330), dec!(180), dec!(300)).unwrap(), dec!(1.25));
        assert_eq!(proximity(dec!(250), dec!(180), dec!(180)), None);
    }

    #[test]
    fn ratio_serializes_as_decimal_string() {
        assert_eq!(
            serde_json::to_value(RiskReward::Ratio(dec!(2.5))).unwrap(),
            serde_json::json!("2.5")
        );
        assert_eq!(
            serde_json::to_value(RiskReward::Undefined).unwrap(),
            serde_json::json!("undefined")
        );
    }

    #[test]
    fn rounded_metrics_drop_trailing_zeros() {
        let h = holding(100, dec!(200.00), dec!(250.00));
        let m = compute(&h, &order(TriggerKind::StopLoss, dec!(180.00)))
            .unwrap()
            .round_dp(2);

        let json = serde_json::to_value(&m).unwrap();
        assert_eq!(json["risk_reward"], "2.5");
        assert_eq!(json["capital_at_risk"], "2000");
        assert_eq!(json["stop_loss_percent"], "10");
    }

    #[test]
    fn target_percent_from_last() {
        assert_eq!(target_percent(dec!(250), dec!(300)), Some(dec!(20)));
        assert_eq!(target_percent(dec!(0), dec!(300)), None);
    }
}
