//! GTT risk and trend dashboard core.
//!
//! Joins Kite Connect holdings with their protective GTT orders, computes
//! stop-loss risk per position, and scores EMA trend health for held
//! stocks and NSE indices from a daily cache of Yahoo price history.

pub mod analysis;
pub mod auth;
pub mod cache;
pub mod config;
pub mod credentials;
pub mod error;
pub mod kite;
pub mod market;
pub mod models;
pub mod portfolio;
pub mod session;

pub use error::{GttError, Result};
