//! Good-till-triggered (GTT) order models.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A GTT trigger as returned by `GET /gtt/triggers`.
#[derive(Debug, Clone, Deserialize)]
pub struct RawGtt {
    pub id: u64,
    pub status: String,
    pub condition: RawCondition,
    #[serde(default)]
    pub orders: Vec<RawGttOrder>,
}

/// Instrument and trigger prices of a GTT.
#[derive(Debug, Clone, Deserialize)]
pub struct RawCondition {
    pub exchange: String,
    pub tradingsymbol: String,
    pub trigger_values: Vec<Decimal>,
}

/// Order placed when a GTT leg fires.
#[derive(Debug, Clone, Deserialize)]
pub struct RawGttOrder {
    pub transaction_type: String,
    pub quantity: i64,
    #[serde(default)]
    pub price: Decimal,
}

impl RawGtt {
    pub fn is_active(&self) -> bool {
        self.status == "active"
    }

    /// Splits an active GTT into its protective legs.
    ///
    /// The first trigger value is the stop-loss; a second one, when
    /// present, is the target. Inactive or trigger-less GTTs yield nothing.
    pub fn into_protective_orders(self) -> Vec<ProtectiveOrder> {
        if !self.is_active() {
            return Vec::new();
        }

        let mut triggers = self.condition.trigger_values.iter().copied();
        let Some(stop) = triggers.next() else {
            return Vec::new();
        };
        let target = triggers.next();

        let leg = |index: usize| self.orders.get(index).or_else(|| self.orders.first());
        let make = |kind: TriggerKind, trigger_price: Decimal, index: usize| {
            let order = leg(index);
            ProtectiveOrder {
                gtt_id: self.id,
                symbol: self.condition.tradingsymbol.clone(),
                exchange: self.condition.exchange.clone(),
                kind,
                trigger_price,
                quantity: order.map_or(0, |o| o.quantity),
                transaction_type: order
                    .map(|o| o.transaction_type.clone())
                    .unwrap_or_default(),
                limit_price: order.map_or(Decimal::ZERO, |o| o.price),
            }
        };

        let mut legs = vec![make(TriggerKind::StopLoss, stop, 0)];
        if let Some(target) = target {
            legs.push(make(TriggerKind::Target, target, 1));
        }
        legs
    }
}

/// Which side of a protective GTT a leg represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerKind {
    StopLoss,
    Target,
}

/// One leg of an active GTT protecting a holding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProtectiveOrder {
    /// Legs of the same two-leg GTT share this id.
    pub gtt_id: u64,
    pub symbol: String,
    pub exchange: String,
    pub kind: TriggerKind,
    pub trigger_price: Decimal,
    pub quantity: i64,
    pub transaction_type: String,
    pub limit_price: Decimal,
}

impl ProtectiveOrder {
    pub fn is_stop_loss(&self) -> bool {
        self.kind == TriggerKind::StopLoss
    }
}
