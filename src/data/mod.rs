use crate::{Symbol, TimestampMs, config::Interval};
use chrono::{DateTime, Utc};
use derive_more::Constructor;
use indexmap::IndexMap;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

/// [`HistoricalDataProvider`] time-cursored view over a [`MarketDataStore`].
pub mod provider;

/// [`InMemoryMarketData`] store backed by sorted candle vectors.
pub mod in_memory;

pub use in_memory::InMemoryMarketData;
pub use provider::{HistoricalDataProvider, QueryRecord};

/// Normalised OHLCV candle. `close_time` is the candle's close instant in
/// milliseconds.
#[derive(
    Copy, Clone, PartialEq, PartialOrd, Debug, Default, Deserialize, Serialize, Constructor,
)]
pub struct Candle {
    pub close_time: TimestampMs,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: Decimal,
}

impl Candle {
    pub fn close_time_utc(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.close_time as i64)
    }
}

/// Technical indicators a [`MarketDataStore`] may serve.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum IndicatorKind {
    Rsi14,
    Rsi7,
    Ma5,
    Ma10,
    Ma20,
    Ema20,
    Ema50,
    Ema100,
    Macd,
    Boll,
    Atr14,
    Vwap,
    Stoch,
    Obv,
}

/// Latest value(s) of an indicator. Single-line indicators (RSI, MA, …) are
/// scalar; multi-line indicators (MACD, BOLL, STOCH) carry a named component
/// map.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum IndicatorValue {
    Scalar(Decimal),
    Multi(IndexMap<SmolStr, Decimal>),
}

/// Market microstructure flow metrics a [`MarketDataStore`] may serve.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FlowMetric {
    Cvd,
    Oi,
    OiDelta,
    Taker,
    Funding,
    Depth,
    Imbalance,
}

/// Flow metric snapshot. The payload shape depends on the metric and is not
/// interpreted by the core; strategies consume it as-is.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct FlowRecord {
    pub metric: FlowMetric,
    pub interval: Interval,
    pub data: serde_json::Value,
}

/// Read-only historical market data access.
///
/// Queries are pure functions of `&self`, so independent backtest runs may
/// share one store behind an `Arc` without locking. Absence of data is always
/// `None`/empty, never an error.
pub trait MarketDataStore: Send + Sync {
    /// Candles whose close time lies in `(t0, t1]`, strictly ordered by close
    /// time ascending.
    fn ohlc(&self, symbol: &Symbol, interval: Interval, t0: TimestampMs, t1: TimestampMs)
    -> Vec<Candle>;

    /// Latest close price at or before the provided instant.
    fn latest_close(&self, symbol: &Symbol, at_or_before: TimestampMs) -> Option<Decimal>;

    /// Latest indicator value(s) at or before the provided instant.
    fn indicator(
        &self,
        symbol: &Symbol,
        kind: IndicatorKind,
        interval: Interval,
        at_or_before: TimestampMs,
    ) -> Option<IndicatorValue>;

    /// Latest flow record at or before the provided instant.
    fn flow(
        &self,
        symbol: &Symbol,
        metric: FlowMetric,
        interval: Interval,
        at_or_before: TimestampMs,
    ) -> Option<FlowRecord>;
}
