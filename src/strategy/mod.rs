use crate::{
    Symbol,
    account::Position,
    config::Interval,
    data::{
        Candle, FlowMetric, FlowRecord, HistoricalDataProvider, IndicatorKind, IndicatorValue,
        MarketDataStore,
    },
    event::{TriggerEvent, TriggerKind},
    signal::{PoolLogic, RegimeSnapshot, SignalRecord},
};
use indexmap::IndexMap;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

/// Opaque key-value parameters forwarded to the strategy runner.
pub type StrategyParams = serde_json::Map<String, serde_json::Value>;

/// Operation requested by a strategy decision.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DecisionOp {
    Buy,
    Sell,
    Close,
    #[default]
    Hold,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Default, Deserialize, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TimeInForce {
    #[default]
    Ioc,
    Gtc,
    Alo,
}

/// How a TP/SL trigger is executed once it fires.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TriggerExecution {
    Market,
    #[default]
    Limit,
}

/// Strategy output, validated by the simulator before any account mutation.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Decision {
    pub operation: DecisionOp,
    pub symbol: Symbol,

    /// Fraction of available balance to deploy, in `[0.1, 1.0]`. Required for
    /// buy/sell/close.
    #[serde(default)]
    pub target_portion_of_balance: Decimal,

    /// Leverage in `[1, 50]`.
    #[serde(default = "default_leverage")]
    pub leverage: u32,

    /// Worst acceptable price. Required for buy or closing a short.
    pub max_price: Option<Decimal>,
    /// Worst acceptable price. Required for sell or closing a long.
    pub min_price: Option<Decimal>,

    pub take_profit_price: Option<Decimal>,
    pub stop_loss_price: Option<Decimal>,

    #[serde(default)]
    pub time_in_force: TimeInForce,
    #[serde(default)]
    pub tp_execution: TriggerExecution,
    #[serde(default)]
    pub sl_execution: TriggerExecution,

    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub trading_strategy: String,
}

fn default_leverage() -> u32 {
    1
}

impl Default for Decision {
    fn default() -> Self {
        Self {
            operation: DecisionOp::Hold,
            symbol: Symbol::default(),
            target_portion_of_balance: Decimal::ZERO,
            leverage: 1,
            max_price: None,
            min_price: None,
            take_profit_price: None,
            stop_loss_price: None,
            time_in_force: TimeInForce::default(),
            tp_execution: TriggerExecution::default(),
            sl_execution: TriggerExecution::default(),
            reason: String::new(),
            trading_strategy: String::new(),
        }
    }
}

impl Decision {
    pub fn hold() -> Self {
        Self::default()
    }
}

/// Output of one strategy invocation inside the host's sandbox.
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
pub struct RunnerOutput {
    pub success: bool,
    pub decision: Option<Decision>,
    pub error: Option<String>,
    pub logs: Vec<String>,
}

impl RunnerOutput {
    pub fn decision(decision: Decision) -> Self {
        Self {
            success: true,
            decision: Some(decision),
            error: None,
            logs: Vec::new(),
        }
    }

    pub fn hold() -> Self {
        Self::decision(Decision::hold())
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            decision: None,
            error: Some(error.into()),
            logs: Vec::new(),
        }
    }
}

/// Snapshot of account and trigger context handed to the strategy, together
/// with a read handle on the cursor-bounded data provider so the strategy can
/// pull klines, indicators, flows, and regimes at the trigger instant.
pub struct MarketView<'a, Store> {
    pub available_balance: Decimal,
    pub total_equity: Decimal,

    /// Symbol that produced the trigger, or the first configured symbol for
    /// scheduled triggers.
    pub trigger_symbol: Symbol,
    pub trigger_kind: TriggerKind,

    pub positions: IndexMap<Symbol, Position>,

    pub pool_name: Option<SmolStr>,
    pub pool_logic: PoolLogic,
    pub triggered_signals: &'a [SignalRecord],
    pub market_regime: Option<&'a RegimeSnapshot>,

    provider: &'a HistoricalDataProvider<Store>,
}

impl<'a, Store> MarketView<'a, Store>
where
    Store: MarketDataStore,
{
    pub fn new(
        available_balance: Decimal,
        total_equity: Decimal,
        positions: IndexMap<Symbol, Position>,
        trigger: &'a TriggerEvent,
        trigger_symbol: Symbol,
        provider: &'a HistoricalDataProvider<Store>,
    ) -> Self {
        Self {
            available_balance,
            total_equity,
            trigger_symbol,
            trigger_kind: trigger.kind,
            positions,
            pool_name: trigger.pool_name.clone(),
            pool_logic: trigger.pool_logic.unwrap_or_default(),
            triggered_signals: &trigger.triggered_signals,
            market_regime: trigger.market_regime.as_ref(),
            provider,
        }
    }

    /// Latest observable price for a symbol, if any.
    pub fn price(&self, symbol: &Symbol) -> Option<Decimal> {
        self.provider
            .current_prices(std::slice::from_ref(symbol))
            .shift_remove(symbol)
    }

    pub fn klines(&self, symbol: &Symbol, interval: Interval, count: usize) -> Vec<Candle> {
        self.provider.klines(symbol, interval, count)
    }

    pub fn indicator(
        &self,
        symbol: &Symbol,
        kind: IndicatorKind,
        interval: Interval,
    ) -> Option<IndicatorValue> {
        self.provider.indicator(symbol, kind, interval)
    }

    pub fn flow(
        &self,
        symbol: &Symbol,
        metric: FlowMetric,
        interval: Interval,
    ) -> Option<FlowRecord> {
        self.provider.flow(symbol, metric, interval)
    }

    pub fn regime(&self, symbol: &Symbol, interval: Interval) -> Option<RegimeSnapshot> {
        self.provider.regime(symbol, interval)
    }
}

/// The strategy sandbox seam.
///
/// Given opaque strategy source and the [`MarketView`] at a trigger instant,
/// produces a [`RunnerOutput`]. Isolation, timeouts, and language surface are
/// the implementor's concern; a call that exceeds its internal timeout returns
/// `RunnerOutput::failure`, which the engine records and skips.
pub trait StrategyRunner<Store: MarketDataStore> {
    fn execute(
        &mut self,
        code: &str,
        view: &MarketView<'_, Store>,
        params: &StrategyParams,
    ) -> RunnerOutput;
}

/// Blanket implementation so plain closures can act as runners in tests and
/// simple hosts.
impl<Store, F> StrategyRunner<Store> for F
where
    Store: MarketDataStore,
    F: FnMut(&str, &MarketView<'_, Store>, &StrategyParams) -> RunnerOutput,
{
    fn execute(
        &mut self,
        code: &str,
        view: &MarketView<'_, Store>,
        params: &StrategyParams,
    ) -> RunnerOutput {
        self(code, view, params)
    }
}
