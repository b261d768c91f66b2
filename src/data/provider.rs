use crate::{
    Symbol, TimestampMs,
    config::Interval,
    data::{Candle, FlowMetric, FlowRecord, IndicatorKind, IndicatorValue, MarketDataStore},
    signal::{RegimeClassifier, RegimeSnapshot},
};
use indexmap::IndexMap;
use parking_lot::Mutex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use std::sync::Arc;
use tracing::trace;

/// One strategy-visible data read, captured for debugging and replay.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct QueryRecord {
    pub method: SmolStr,
    pub symbol: Symbol,
    pub detail: String,
    /// Provider cursor at the time of the read.
    pub cursor: TimestampMs,
}

/// Time-cursored, read-only view over a [`MarketDataStore`].
///
/// Every query is bounded by the internal cursor, enforcing the strict
/// "no future data" rule: strategies can never observe data with a timestamp
/// after the trigger instant currently being replayed.
///
/// The store sits behind an `Arc` so independent runs share it without
/// locking; each run owns its own provider, cursor, and query log.
pub struct HistoricalDataProvider<Store> {
    store: Arc<Store>,
    regimes: Option<Arc<dyn RegimeClassifier>>,
    symbols: Vec<Symbol>,
    cursor: TimestampMs,
    query_log: Mutex<Vec<QueryRecord>>,
}

impl<Store> HistoricalDataProvider<Store>
where
    Store: MarketDataStore,
{
    pub fn new(store: Arc<Store>, symbols: Vec<Symbol>, start_time: TimestampMs) -> Self {
        Self {
            store,
            regimes: None,
            symbols,
            cursor: start_time,
            query_log: Mutex::new(Vec::new()),
        }
    }

    /// Attach a market regime classifier, enabling [`Self::regime`] queries.
    pub fn with_regime_classifier(mut self, regimes: Arc<dyn RegimeClassifier>) -> Self {
        self.regimes = Some(regimes);
        self
    }

    /// Move the cursor. All subsequent queries observe data at or before `t`.
    pub fn set_current_time(&mut self, t: TimestampMs) {
        self.cursor = t;
    }

    pub fn current_time(&self) -> TimestampMs {
        self.cursor
    }

    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }

    /// Latest close at or before the cursor for each requested symbol.
    /// Symbols without any observable price are omitted.
    pub fn current_prices(&self, symbols: &[Symbol]) -> IndexMap<Symbol, Decimal> {
        symbols
            .iter()
            .filter_map(|symbol| {
                self.store
                    .latest_close(symbol, self.cursor)
                    .map(|price| (symbol.clone(), price))
            })
            .collect()
    }

    /// Latest close at or before an arbitrary historical instant. Used by the
    /// simulator to mark equity at intra-interval fill times; still bounded by
    /// the cursor.
    pub fn price_at(&self, symbol: &Symbol, t: TimestampMs) -> Option<Decimal> {
        self.store.latest_close(symbol, t.min(self.cursor))
    }

    /// Candles with close time in `(t0, t1]`, additionally clamped at the
    /// cursor.
    pub fn ohlc_between(
        &self,
        symbol: &Symbol,
        t0: TimestampMs,
        t1: TimestampMs,
        interval: Interval,
    ) -> Vec<Candle> {
        self.store.ohlc(symbol, interval, t0, t1.min(self.cursor))
    }

    /// The most recent `count` candles at or before the cursor. Strategy-visible.
    pub fn klines(&self, symbol: &Symbol, interval: Interval, count: usize) -> Vec<Candle> {
        let mut candles = self.store.ohlc(symbol, interval, 0, self.cursor);
        if candles.len() > count {
            candles.drain(..candles.len() - count);
        }
        self.log_query("klines", symbol, format!("{interval} x{count}"));
        candles
    }

    /// Latest indicator value(s) at the cursor. Strategy-visible.
    pub fn indicator(
        &self,
        symbol: &Symbol,
        kind: IndicatorKind,
        interval: Interval,
    ) -> Option<IndicatorValue> {
        let value = self.store.indicator(symbol, kind, interval, self.cursor);
        self.log_query("indicator", symbol, format!("{kind:?} {interval}"));
        value
    }

    /// Latest flow record at the cursor. Strategy-visible.
    pub fn flow(&self, symbol: &Symbol, metric: FlowMetric, interval: Interval) -> Option<FlowRecord> {
        let record = self.store.flow(symbol, metric, interval, self.cursor);
        self.log_query("flow", symbol, format!("{metric:?} {interval}"));
        record
    }

    /// Market regime classification at the cursor, if a classifier is attached.
    /// Strategy-visible.
    pub fn regime(&self, symbol: &Symbol, interval: Interval) -> Option<RegimeSnapshot> {
        let snapshot = self
            .regimes
            .as_ref()
            .and_then(|regimes| regimes.classify(symbol, interval, self.cursor));
        self.log_query("regime", symbol, interval.to_string());
        snapshot
    }

    /// Drop all recorded queries. Called by the engine at the start of each
    /// trigger.
    pub fn clear_query_log(&self) {
        self.query_log.lock().clear();
    }

    /// Snapshot of the queries recorded since the last clear.
    pub fn query_log(&self) -> Vec<QueryRecord> {
        self.query_log.lock().clone()
    }

    fn log_query(&self, method: &'static str, symbol: &Symbol, detail: String) {
        trace!(method, %symbol, %detail, cursor = self.cursor, "strategy data query");
        self.query_log.lock().push(QueryRecord {
            method: SmolStr::new_static(method),
            symbol: symbol.clone(),
            detail,
            cursor: self.cursor,
        });
    }
}
