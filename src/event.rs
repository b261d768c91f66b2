use crate::{
    Symbol, TimestampMs,
    signal::{PoolLogic, RegimeSnapshot, SignalRecord},
};
use derive_more::Constructor;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

/// Why the engine reconsidered strategy state at an instant.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TriggerKind {
    /// A precomputed signal-pool trigger.
    Signal,
    /// A periodic trigger generated by the engine's scheduled clock.
    Scheduled,
}

/// An instant at which the engine evaluates the strategy. Either a precomputed
/// signal trigger carrying its pool context, or a bare scheduled tick.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TriggerEvent {
    pub timestamp: TimestampMs,
    pub kind: TriggerKind,

    /// Originating symbol. Empty for scheduled triggers.
    pub symbol: Symbol,

    /// Signal-trigger context; all `None`/empty for scheduled triggers.
    pub pool_id: Option<SmolStr>,
    pub pool_name: Option<SmolStr>,
    pub pool_logic: Option<PoolLogic>,
    pub triggered_signals: Vec<SignalRecord>,
    pub market_regime: Option<RegimeSnapshot>,
}

impl TriggerEvent {
    /// A bare periodic tick at the provided instant.
    pub fn scheduled(timestamp: TimestampMs) -> Self {
        Self {
            timestamp,
            kind: TriggerKind::Scheduled,
            symbol: Symbol::default(),
            pool_id: None,
            pool_name: None,
            pool_logic: None,
            triggered_signals: Vec::new(),
            market_regime: None,
        }
    }
}

/// Account equity sampled after a trigger finished processing.
#[derive(Debug, Copy, Clone, PartialEq, Deserialize, Serialize, Constructor)]
pub struct EquityPoint {
    pub timestamp: TimestampMs,
    pub equity: Decimal,
    pub balance: Decimal,
    /// Running maximum drawdown at this instant.
    pub max_drawdown: Decimal,
}
