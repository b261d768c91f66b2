use crate::{
    Symbol, TimestampMs,
    account::VirtualAccount,
    config::{BacktestConfig, Interval},
    data::{HistoricalDataProvider, MarketDataStore, QueryRecord},
    error::BacktestError,
    event::{EquityPoint, TriggerEvent, TriggerKind},
    execution::ExecutionSimulator,
    signal::{RegimeClassifier, SignalBacktester},
    statistic::summary::BacktestSummary,
    strategy::{DecisionOp, MarketView, RunnerOutput, StrategyParams, StrategyRunner},
    trade::TradeRecord,
};
use indexmap::IndexMap;
use itertools::Itertools;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Instant,
};
use tracing::{debug, error, info, warn};

pub mod trigger;

pub use trigger::TriggerStream;

/// Cooperative cancellation for the streaming form. Checked between triggers;
/// partial results remain valid after cancellation.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Everything that happened while processing one trigger. Yielded by the
/// streaming form so a UI can render progress trade-by-trade.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TriggerExecutionResult {
    pub trigger: TriggerEvent,
    pub trigger_symbol: Symbol,
    pub prices: IndexMap<Symbol, Decimal>,

    /// `None` when no price was observable and the strategy was skipped.
    pub runner_output: Option<RunnerOutput>,

    /// Trades produced by the strategy's decision: empty, one open/add/close,
    /// or a close-then-open pair for a reverse.
    pub decision_trades: Vec<TradeRecord>,

    /// TP/SL fills detected since the previous trigger, in chronological
    /// order.
    pub tp_sl_trades: Vec<TradeRecord>,

    pub equity_before: Decimal,
    /// Equity after the TP/SL scan, before the strategy ran.
    pub equity_after_tp_sl: Decimal,
    pub equity_after: Decimal,
    pub unrealized_pnl: Decimal,

    /// Strategy-visible data reads during this trigger.
    pub data_queries: Vec<QueryRecord>,
}

/// Full output of a backtest run.
///
/// The shape is stable; hosts must not rely on field ordering. On failure,
/// `success` is false and the partial ledgers remain self-consistent.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct BacktestResult {
    pub success: bool,
    pub error: Option<String>,

    pub summary: BacktestSummary,

    pub trades: Vec<TradeRecord>,
    pub equity_curve: Vec<EquityPoint>,
    pub trigger_log: Vec<TriggerEvent>,

    pub execution_time_ms: u64,
    pub start_time: TimestampMs,
    pub end_time: TimestampMs,
}

impl BacktestResult {
    fn failure(
        error: BacktestError,
        execution_time_ms: u64,
        start_time: TimestampMs,
        end_time: TimestampMs,
    ) -> Self {
        Self {
            success: false,
            error: Some(error.to_string()),
            summary: BacktestSummary::default(),
            trades: Vec::new(),
            equity_curve: Vec::new(),
            trigger_log: Vec::new(),
            execution_time_ms,
            start_time,
            end_time,
        }
    }
}

/// Event-driven backtest engine.
///
/// Owns one run's [`VirtualAccount`], [`ExecutionSimulator`], and
/// [`HistoricalDataProvider`]; the [`MarketDataStore`] behind the provider is
/// shared read-only across runs. A single run is strictly single-threaded:
/// every mutation happens in trigger order.
pub struct BacktestEngine<Store, Runner> {
    config: BacktestConfig,
    provider: HistoricalDataProvider<Store>,
    account: VirtualAccount,
    simulator: ExecutionSimulator,
    runner: Runner,
    params: StrategyParams,
}

impl<Store, Runner> BacktestEngine<Store, Runner>
where
    Store: MarketDataStore,
    Runner: StrategyRunner<Store>,
{
    /// Build an engine for one run, validating the configuration up front.
    pub fn new(
        config: BacktestConfig,
        store: Arc<Store>,
        runner: Runner,
    ) -> Result<Self, BacktestError> {
        config.validate()?;

        let provider =
            HistoricalDataProvider::new(store, config.symbols.clone(), config.start_time);
        let account = VirtualAccount::new(config.initial_balance);
        let simulator = ExecutionSimulator::new(config.slippage_percent, config.fee_rate);

        Ok(Self {
            config,
            provider,
            account,
            simulator,
            runner,
            params: StrategyParams::new(),
        })
    }

    /// Attach a regime classifier, exposed to strategies via the provider.
    pub fn with_regime_classifier(mut self, regimes: Arc<dyn RegimeClassifier>) -> Self {
        self.provider = self.provider.with_regime_classifier(regimes);
        self
    }

    /// Attach opaque parameters forwarded to every strategy invocation.
    pub fn with_params(mut self, params: StrategyParams) -> Self {
        self.params = params;
        self
    }

    pub fn account(&self) -> &VirtualAccount {
        &self.account
    }

    pub fn config(&self) -> &BacktestConfig {
        &self.config
    }

    /// Precompute the signal trigger events for every configured
    /// `(pool, symbol)` pair, attaching a market regime snapshot at the 5m
    /// timeframe when a classifier is provided. Per-pool failures are logged
    /// and skipped, never fatal.
    pub fn load_signal_triggers(
        &self,
        signals: &impl SignalBacktester,
        regimes: Option<&dyn RegimeClassifier>,
    ) -> Vec<TriggerEvent> {
        let mut events = Vec::new();

        for pool_id in &self.config.signal_pool_ids {
            for symbol in &self.config.symbols {
                for pool in signals.triggers(
                    pool_id,
                    symbol,
                    self.config.start_time,
                    self.config.end_time,
                ) {
                    for event in pool.events {
                        let market_regime = regimes.and_then(|classifier| {
                            classifier.classify(symbol, Interval::M5, event.timestamp)
                        });

                        events.push(TriggerEvent {
                            timestamp: event.timestamp,
                            kind: TriggerKind::Signal,
                            symbol: symbol.clone(),
                            pool_id: Some(pool_id.clone()),
                            pool_name: Some(pool.pool_name.clone()),
                            pool_logic: Some(pool.logic),
                            triggered_signals: event.signals,
                            market_regime,
                        });
                    }
                }
            }
        }

        events.sort_by_key(|event| event.timestamp);
        info!(count = events.len(), "generated signal trigger events");
        events
    }

    /// Estimate the total trigger count (signal plus dynamically scheduled)
    /// without executing anything. Used for progress reporting.
    pub fn estimate_total_triggers(&self, signal_triggers: &[TriggerEvent]) -> usize {
        TriggerStream::count(
            signal_triggers.iter().map(|event| event.timestamp),
            self.config.scheduled_interval,
            self.config.start_time,
            self.config.end_time,
        )
    }

    /// Run the backtest to completion, returning the full result. A failure
    /// mid-run returns the partial result with `success` unset.
    pub fn run(self, signal_triggers: Vec<TriggerEvent>) -> BacktestResult {
        let started = Instant::now();
        let (start_time, end_time) = (self.config.start_time, self.config.end_time);

        match self.stream(signal_triggers, CancelToken::new()) {
            Ok(mut stream) => {
                while stream.next().is_some() {}
                stream.finalize()
            }
            Err(err) => {
                error!(%err, "backtest failed before the event loop");
                BacktestResult::failure(
                    err,
                    started.elapsed().as_millis() as u64,
                    start_time,
                    end_time,
                )
            }
        }
    }

    /// Start the streaming form: an iterator yielding one
    /// [`TriggerExecutionResult`] per trigger, cancellable between triggers
    /// via the token. Call [`BacktestStream::finalize`] to obtain the
    /// [`BacktestResult`] over whatever was processed.
    pub fn stream(
        self,
        signal_triggers: Vec<TriggerEvent>,
        cancel: CancelToken,
    ) -> Result<BacktestStream<Store, Runner>, BacktestError> {
        if signal_triggers.is_empty() && self.config.scheduled_interval.is_none() {
            return Err(BacktestError::NoTriggerEvents);
        }

        let triggers = TriggerStream::new(
            signal_triggers,
            self.config.scheduled_interval,
            self.config.start_time,
            self.config.end_time,
        );

        Ok(BacktestStream {
            prev_time: self.config.start_time,
            engine: self,
            triggers,
            cancel,
            trades: Vec::new(),
            equity_curve: Vec::new(),
            trigger_log: Vec::new(),
            error: None,
            started: Instant::now(),
        })
    }

    /// Per-trigger execution contract, shared by both forms.
    fn execute_trigger(
        &mut self,
        trigger: TriggerEvent,
        prev_time: TimestampMs,
    ) -> Result<TriggerExecutionResult, BacktestError> {
        let equity_before = self.account.equity;

        self.provider.set_current_time(trigger.timestamp);
        self.provider.clear_query_log();

        let prices = self.provider.current_prices(&self.config.symbols);
        let trigger_symbol = if trigger.symbol.is_empty() {
            self.config.symbols[0].clone()
        } else {
            trigger.symbol.clone()
        };

        if prices.is_empty() {
            warn!(
                timestamp = trigger.timestamp,
                "no observable prices at trigger, skipping strategy call"
            );
            return Ok(TriggerExecutionResult {
                trigger,
                trigger_symbol,
                prices,
                runner_output: None,
                decision_trades: Vec::new(),
                tp_sl_trades: Vec::new(),
                equity_before,
                equity_after_tp_sl: equity_before,
                equity_after: equity_before,
                unrealized_pnl: self.account.unrealized_pnl_total,
                data_queries: Vec::new(),
            });
        }

        // TP/SL detection against the candles since the previous trigger,
        // per symbol with an open position.
        let mut tp_sl_trades = Vec::new();
        for symbol in &self.config.symbols {
            if !self.account.has_position(symbol) {
                continue;
            }
            let candles =
                self.provider
                    .ohlc_between(symbol, prev_time, trigger.timestamp, Interval::M5);
            if candles.is_empty() {
                continue;
            }
            tp_sl_trades.extend(self.simulator.check_pending_orders(
                &mut self.account,
                symbol,
                &candles,
                &self.provider,
            )?);
        }
        let tp_sl_trades: Vec<TradeRecord> = tp_sl_trades
            .into_iter()
            .sorted_by_key(|trade| trade.exit_time.unwrap_or_default())
            .collect();

        self.account.mark_equity(&prices);
        let equity_after_tp_sl = self.account.equity;

        // The strategy runs even when TP/SL just fired; it observes the
        // post-fill state through the view.
        let view = MarketView::new(
            self.account.balance,
            self.account.equity,
            self.account.positions().clone(),
            &trigger,
            trigger_symbol.clone(),
            &self.provider,
        );
        let runner_output = self.runner.execute(&self.config.code, &view, &self.params);
        drop(view);

        let mut decision_trades = Vec::new();
        if runner_output.success
            && let Some(decision) = &runner_output.decision
            && decision.operation != DecisionOp::Hold
        {
            let symbol = if decision.symbol.is_empty() {
                trigger_symbol.clone()
            } else {
                decision.symbol.clone()
            };

            match prices.get(&symbol).copied() {
                Some(price) if price > Decimal::ZERO => {
                    let mut dispatched = decision.clone();
                    dispatched.symbol = symbol;
                    decision_trades = self.simulator.execute_decision(
                        &dispatched,
                        &mut self.account,
                        price,
                        trigger.timestamp,
                        &trigger,
                    )?;
                }
                _ => {
                    debug!(%symbol, "decision symbol has no observable price, skipping dispatch");
                }
            }
        } else if let Some(runner_error) = &runner_output.error {
            warn!(
                timestamp = trigger.timestamp,
                error = %runner_error,
                "strategy runner failed, continuing without a decision"
            );
        }

        // Second mark so a freshly opened position's unrealised PnL is
        // reflected in this trigger's equity point.
        self.account.mark_equity(&prices);

        Ok(TriggerExecutionResult {
            trigger,
            trigger_symbol,
            prices,
            runner_output: Some(runner_output),
            decision_trades,
            tp_sl_trades,
            equity_before,
            equity_after_tp_sl,
            equity_after: self.account.equity,
            unrealized_pnl: self.account.unrealized_pnl_total,
            data_queries: self.provider.query_log(),
        })
    }
}

/// The streaming form of a run: pull one [`TriggerExecutionResult`] at a
/// time, then [`Self::finalize`] into a [`BacktestResult`].
pub struct BacktestStream<Store, Runner> {
    engine: BacktestEngine<Store, Runner>,
    triggers: TriggerStream,
    cancel: CancelToken,
    trades: Vec<TradeRecord>,
    equity_curve: Vec<EquityPoint>,
    trigger_log: Vec<TriggerEvent>,
    prev_time: TimestampMs,
    error: Option<BacktestError>,
    started: Instant,
}

impl<Store, Runner> Iterator for BacktestStream<Store, Runner>
where
    Store: MarketDataStore,
    Runner: StrategyRunner<Store>,
{
    type Item = TriggerExecutionResult;

    fn next(&mut self) -> Option<TriggerExecutionResult> {
        if self.error.is_some() || self.cancel.is_cancelled() {
            return None;
        }

        let trigger = self.triggers.next()?;
        self.trigger_log.push(trigger.clone());

        let prev_time = self.prev_time;
        self.prev_time = trigger.timestamp;

        match self.engine.execute_trigger(trigger, prev_time) {
            Ok(result) => {
                // TP/SL fills are ledgered before the decision trades.
                self.trades.extend(result.tp_sl_trades.iter().cloned());
                self.trades.extend(result.decision_trades.iter().cloned());

                if !result.prices.is_empty() {
                    self.equity_curve.push(EquityPoint {
                        timestamp: result.trigger.timestamp,
                        equity: self.engine.account.equity,
                        balance: self.engine.account.balance,
                        max_drawdown: self.engine.account.max_drawdown(),
                    });
                }

                Some(result)
            }
            Err(err) => {
                error!(%err, "event loop failed, returning partial result");
                self.error = Some(err);
                None
            }
        }
    }
}

impl<Store, Runner> BacktestStream<Store, Runner>
where
    Store: MarketDataStore,
    Runner: StrategyRunner<Store>,
{
    /// A clone of the cancellation token driving this stream.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn account(&self) -> &VirtualAccount {
        &self.engine.account
    }

    /// Assemble the result over everything processed so far. Partial runs
    /// (cancelled or failed) produce a self-consistent ledger and statistics.
    pub fn finalize(self) -> BacktestResult {
        let summary = BacktestSummary::generate(
            &self.trades,
            &self.equity_curve,
            &self.trigger_log,
            self.engine.config.initial_balance,
            self.engine.account.max_drawdown(),
            self.engine.account.max_drawdown_percent(),
        );

        info!(
            triggers = self.trigger_log.len(),
            trades = self.trades.len(),
            success = self.error.is_none(),
            "backtest finished"
        );

        BacktestResult {
            success: self.error.is_none(),
            error: self.error.map(|err| err.to_string()),
            summary,
            trades: self.trades,
            equity_curve: self.equity_curve,
            trigger_log: self.trigger_log,
            execution_time_ms: self.started.elapsed().as_millis() as u64,
            start_time: self.engine.config.start_time,
            end_time: self.engine.config.end_time,
        }
    }
}
