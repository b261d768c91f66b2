use crate::{Symbol, TimestampMs, config::Interval};
use indexmap::IndexMap;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

/// How the conditions of a signal pool combine into one trigger.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default, Deserialize, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PoolLogic {
    And,
    #[default]
    Or,
}

/// One satisfied condition inside a fired signal pool.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SignalRecord {
    pub name: SmolStr,
    pub metric: SmolStr,
    pub operator: SmolStr,
    pub threshold: Decimal,
    pub value: Decimal,
    pub direction: SmolStr,
}

/// One instant at which a signal pool fired for a symbol.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PoolTriggerEvent {
    pub timestamp: TimestampMs,
    pub signals: Vec<SignalRecord>,
}

/// Precomputed trigger history of one signal pool over one symbol and window.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PoolTriggers {
    pub pool_name: SmolStr,
    pub logic: PoolLogic,
    pub events: Vec<PoolTriggerEvent>,
}

/// Precomputes the instants at which a signal pool fires for a symbol within a
/// window. Implemented by the host; may return millions of events for long
/// windows, so the engine consumes the result lazily.
pub trait SignalBacktester {
    fn triggers(
        &self,
        pool_id: &SmolStr,
        symbol: &Symbol,
        t0: TimestampMs,
        t1: TimestampMs,
    ) -> Vec<PoolTriggers>;
}

/// Labelled market microstructure state.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Regime {
    Breakout,
    Absorption,
    StopHunt,
    Exhaustion,
    Trap,
    Continuation,
    #[default]
    Noise,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RegimeDirection {
    Bullish,
    Bearish,
    #[default]
    Neutral,
}

/// Market regime classification at one `(symbol, interval, instant)`.
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
pub struct RegimeSnapshot {
    pub regime: Regime,
    /// Classification confidence in `[0, 1]`.
    pub confidence: f64,
    pub direction: RegimeDirection,
    pub reason: String,
    pub indicators: IndexMap<SmolStr, f64>,
}

/// Classifies the market regime at a historical instant. Implemented by the
/// host; queries must be pure so providers can share one classifier.
pub trait RegimeClassifier: Send + Sync {
    fn classify(
        &self,
        symbol: &Symbol,
        interval: Interval,
        t: TimestampMs,
    ) -> Option<RegimeSnapshot>;
}
