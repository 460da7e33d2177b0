//! Shared models for the Kite Connect REST API and the dashboard core.
//!
//! Wire types (`Raw*`) mirror the brokerage JSON and are normalized into
//! the request-scoped value objects the rest of the crate works with:
//! [`Holding`](holding::Holding), [`ProtectiveOrder`](gtt::ProtectiveOrder)
//! and [`PricePoint`](price::PricePoint).

pub mod gtt;
pub mod holding;
pub mod price;

use serde::Deserialize;

pub use gtt::{ProtectiveOrder, RawGtt, TriggerKind};
pub use holding::{Holding, RawHolding};
pub use price::{Instrument, InstrumentKind, PricePoint};

/// Envelope wrapping every Kite Connect v3 response.
///
/// Success: `{"status": "success", "data": ...}`.
/// Failure: `{"status": "error", "error_type": "...", "message": "..."}`.
#[derive(Debug, Deserialize)]
pub struct KiteEnvelope<T> {
    pub status: String,
    pub data: Option<T>,
    #[serde(default)]
    pub error_type: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl<T> KiteEnvelope<T> {
    /// Returns `true` when the API reported a token/session problem.
    pub fn is_token_error(&self) -> bool {
        matches!(
            self.error_type.as_deref(),
            Some("TokenException") | Some("PermissionException")
        )
    }

    /// Unwraps the payload, converting API-level failures into errors.
    ///
    /// # Errors
    ///
    /// Returns [`GttError::SessionExpired`](crate::GttError::SessionExpired)
    /// for token errors and [`GttError::Broker`](crate::GttError::Broker)
    /// for any other failure or a success envelope without data.
    pub fn into_data(self) -> crate::Result<T> {
        if self.is_token_error() {
            return Err(crate::GttError::SessionExpired);
        }
        if self.status != "success" {
            return Err(crate::GttError::Broker(format!(
                "{}: {}",
                self.error_type.as_deref().unwrap_or("UnknownError"),
                self.message.as_deref().unwrap_or("no message")
            )));
        }
        self.data
            .ok_or_else(|| crate::GttError::Broker("success response without data".into()))
    }
}
