use crate::Symbol;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors produced by [`VirtualAccount`](crate::account::VirtualAccount) mutations.
///
/// Callers that the run contract requires to be silent no-ops (eg/ a close on a
/// symbol without a position) map these to logged skips rather than propagating.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, Error)]
pub enum AccountError {
    #[error("no open position for symbol: {0}")]
    PositionNotFound(Symbol),

    #[error("position size must be positive, got: {0}")]
    NonPositiveSize(Decimal),

    #[error("insufficient balance: required margin {required}, available {available}")]
    InsufficientMargin {
        required: Decimal,
        available: Decimal,
    },
}

/// Errors surfaced by [`MarketDataStore`](crate::data::MarketDataStore)
/// implementations. Absence of data is modelled as `None`/empty, never as an
/// error, so this only covers host-side failures.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, Error)]
pub enum DataError {
    #[error("market data store: {0}")]
    Store(String),
}

/// Top-level error for a backtest run. Only configuration errors and unexpected
/// engine failures reach the caller; everything recoverable is absorbed by the
/// event loop.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, Error)]
pub enum BacktestError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("no trigger events generated, check signal pools and time range")]
    NoTriggerEvents,

    #[error("account: {0}")]
    Account(#[from] AccountError),

    #[error("market data: {0}")]
    Data(#[from] DataError),

    #[error("engine: {0}")]
    Engine(String),
}
