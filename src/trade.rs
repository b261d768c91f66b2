use crate::{Symbol, TimestampMs, account::PositionSide, event::TriggerKind};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

/// What the simulator did to the account.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TradeOperation {
    Buy,
    Sell,
    Close,
    AddPosition,
}

/// Why a position (or tranche) was closed.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Deserialize, Serialize)]
pub enum ExitReason {
    /// The strategy decided to close.
    #[serde(rename = "decision")]
    Decision,
    /// A take-profit order fired.
    #[serde(rename = "tp")]
    TakeProfit,
    /// A stop-loss order fired.
    #[serde(rename = "sl")]
    StopLoss,
    /// Closed to reverse into the opposite side.
    #[serde(rename = "reverse")]
    Reverse,
}

/// One ledger entry: an open, add, or close performed by the simulator.
///
/// Exit fields stay `None` while the trade represents an entry that has not
/// been closed by this record.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TradeRecord {
    /// Entry instant for opens/adds; the originating entry instant for closes.
    pub time: TimestampMs,
    pub trigger_kind: Option<TriggerKind>,
    pub symbol: Symbol,
    pub operation: TradeOperation,
    pub side: PositionSide,
    pub entry_price: Decimal,
    pub size: Decimal,
    pub leverage: u32,

    pub exit_price: Option<Decimal>,
    pub exit_time: Option<TimestampMs>,
    pub exit_reason: Option<ExitReason>,

    /// Realised PnL before fee deduction. Zero while open.
    pub pnl: Decimal,
    /// Realised PnL as a percentage of the entry notional.
    pub pnl_percent: Decimal,
    pub fee: Decimal,

    /// Account equity immediately after this close, when the fill instant is
    /// known (TP/SL fills mark equity at the candle close).
    pub equity_after: Option<Decimal>,

    pub reason: String,
    pub pool_name: Option<SmolStr>,
    pub triggered_signals: Vec<SmolStr>,
}

impl TradeRecord {
    /// Whether this record represents a completed (closed) trade.
    pub fn is_closed(&self) -> bool {
        self.exit_price.is_some()
    }
}
