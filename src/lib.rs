//! # Perpsim
//! Perpsim is an **event-driven backtesting core** for perpetual futures trading
//! strategies. It replays user strategies over historical market data and produces
//! the same trade-by-trade ledger the strategy would have produced in live
//! execution, modulo the configured slippage and fee models.
//!
//! ## Overview
//! A backtest run is orchestrated by several de-coupled components:
//!
//! * **Data**: A [`HistoricalDataProvider`](data::HistoricalDataProvider) presents a
//!   time-cursored, read-only view over a host-provided
//!   [`MarketDataStore`](data::MarketDataStore). Strategies can never observe data
//!   from after the cursor.
//! * **Account**: A [`VirtualAccount`](account::VirtualAccount) is a margined,
//!   multi-symbol perpetuals ledger tracking balance, positions, independent
//!   take-profit/stop-loss orders, and running drawdown. Its fundamental invariant
//!   is the equity identity `equity = initial + realised - fees + unrealised`.
//! * **Execution**: An [`ExecutionSimulator`](execution::ExecutionSimulator)
//!   translates strategy [`Decision`](strategy::Decision)s into account mutations,
//!   applying deterministic slippage and fees, and detects TP/SL fills against
//!   intra-interval OHLC ranges.
//! * **Triggers**: A [`TriggerStream`](engine::TriggerStream) interleaves
//!   pre-computed signal triggers with dynamically generated periodic triggers
//!   under the "any trigger resets the periodic clock" rule of the live runtime.
//! * **Engine**: A [`BacktestEngine`](engine::BacktestEngine) drives the loop,
//!   invokes the host's [`StrategyRunner`](strategy::StrategyRunner), and emits a
//!   [`BacktestResult`](engine::BacktestResult) or a stream of per-trigger
//!   progress records.
//! * **Statistic**: One-pass metrics (Sharpe Ratio, Profit Factor, Win Rate, Max
//!   Drawdown) summarise the run in a [`BacktestSummary`](statistic::summary::BacktestSummary).
//!
//! All monetary values are exact [`rust_decimal::Decimal`]s; binary floating point
//! never touches balances, sizes, prices, or fees.

use smol_str::SmolStr;

/// Time-windowed read-only market data access: the [`data::MarketDataStore`]
/// interface, the [`data::HistoricalDataProvider`] cursor, and an in-memory store
/// implementation for tests and simple hosts.
pub mod data;

/// The [`account::VirtualAccount`] ledger together with its owned
/// [`account::Position`]s and pending [`account::PendingOrder`]s.
pub mod account;

/// The [`execution::ExecutionSimulator`]: slippage/fee models, the decision
/// dispatcher, and TP/SL trigger detection against OHLC candles.
pub mod execution;

/// Strategy-facing types: the [`strategy::Decision`] a strategy emits, the
/// [`strategy::MarketView`] snapshot it receives, and the
/// [`strategy::StrategyRunner`] seam the host implements.
pub mod strategy;

/// Collaborator interfaces for signal-pool trigger precomputation and market
/// regime classification.
pub mod signal;

/// The [`engine::BacktestEngine`] event loop, the [`engine::TriggerStream`], and
/// the [`engine::BacktestResult`] output model.
pub mod engine;

/// Iterative statistical methods and the end-of-run
/// [`statistic::summary::BacktestSummary`].
pub mod statistic;

/// Run configuration and the scheduled-trigger [`config::Interval`] grid.
pub mod config;

/// Trigger events and per-trigger equity points.
pub mod event;

/// The trade ledger record emitted for every open, add, and close.
pub mod trade;

/// Error taxonomy for the backtest core.
pub mod error;

/// `tracing` subscriber construction and initialisation helpers.
pub mod logging;

/// Unsigned milliseconds since the Unix epoch. All engine-visible instants use
/// this representation; conversion to [`chrono::DateTime`] happens only at
/// reporting boundaries.
pub type TimestampMs = u64;

/// Communicates a string is a unique identifier for a traded symbol (eg/ "BTC").
pub type Symbol = SmolStr;
