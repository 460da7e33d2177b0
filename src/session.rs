//! Shared brokerage session.
//!
//! At most one authenticated [`BrokerApi`] handle is live per process.
//! Re-authentication swaps the whole handle, so a request that already
//! holds the previous `Arc` finishes against it while later requests see
//! the new one.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::info;

use crate::models::{Holding, ProtectiveOrder};
use crate::{GttError, Result};

/// Read-only view of a brokerage account.
pub trait BrokerApi {
    /// Current holdings with a non-zero quantity.
    ///
    /// Fails with [`GttError::SessionExpired`] when the handle is invalid.
    fn holdings(&self) -> impl Future<Output = Result<Vec<Holding>>> + Send;

    /// Legs of every active GTT.
    ///
    /// Fails with [`GttError::SessionExpired`] when the handle is invalid.
    fn gtt_orders(&self) -> impl Future<Output = Result<Vec<ProtectiveOrder>>> + Send;
}

/// Slot holding the current broker handle, if any.
#[derive(Debug)]
pub struct Session<B> {
    handle: RwLock<Option<Arc<B>>>,
}

impl<B> Default for Session<B> {
    fn default() -> Self {
        Self {
            handle: RwLock::new(None),
        }
    }
}

impl<B> Session<B> {
    /// An empty session; every call fails until [`replace`](Self::replace).
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_handle(handle: B) -> Self {
        Self {
            handle: RwLock::new(Some(Arc::new(handle))),
        }
    }

    /// Returns the current handle.
    ///
    /// # Errors
    ///
    /// Returns [`GttError::SessionExpired`] when no handle is installed.
    pub async fn current(&self) -> Result<Arc<B>> {
        self.handle
            .read()
            .await
            .as_ref()
            .map(Arc::clone)
            .ok_or(GttError::SessionExpired)
    }

    /// Installs `handle`, returning the one it replaced.
    pub async fn replace(&self, handle: B) -> Option<Arc<B>> {
        let previous = self.handle.write().await.replace(Arc::new(handle));
        info!(replaced = previous.is_some(), "brokerage session installed");
        previous
    }

    /// Drops the current handle, e.g. after the broker rejected its token.
    pub async fn invalidate(&self) -> Option<Arc<B>> {
        let previous = self.handle.write().await.take();
        if previous.is_some() {
            info!("brokerage session invalidated");
        }
        previous
    }

    /// Drops the current handle only if it is still `stale`.
    ///
    /// Used after a call on `stale` failed with an expired token, so a
    /// handle installed by a concurrent re-login is left in place.
    pub async fn invalidate_if_current(&self, stale: &Arc<B>) -> bool {
        let mut handle = self.handle.write().await;
        if handle.as_ref().is_some_and(|h| Arc::ptr_eq(h, stale)) {
            *handle = None;
            info!("brokerage session invalidated after token rejection");
            true
        } else {
            false
        }
    }

    pub async fn is_active(&self) -> bool {
        self.handle.read().await.is_some()
    }
}
