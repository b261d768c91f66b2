use crate::{
    Symbol, TimestampMs,
    config::Interval,
    data::{Candle, FlowMetric, FlowRecord, IndicatorKind, IndicatorValue, MarketDataStore},
};
use indexmap::IndexMap;
use rust_decimal::Decimal;
use tracing::warn;

/// In-memory [`MarketDataStore`].
///
/// Holds candle series per `(symbol, interval)` sorted by close time, plus
/// optional indicator and flow fixtures. Intended for tests and hosts whose
/// full dataset fits in memory; lookups are binary searches over the sorted
/// series.
#[derive(Debug, Clone, Default)]
pub struct InMemoryMarketData {
    candles: IndexMap<(Symbol, Interval), Vec<Candle>>,
    indicators: IndexMap<(Symbol, IndicatorKind, Interval), Vec<(TimestampMs, IndicatorValue)>>,
    flows: IndexMap<(Symbol, FlowMetric, Interval), Vec<(TimestampMs, FlowRecord)>>,
}

impl InMemoryMarketData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a candle series for `(symbol, interval)`, sorting it by close
    /// time. Replaces any previously registered series for the same key.
    pub fn with_candles(
        mut self,
        symbol: impl Into<Symbol>,
        interval: Interval,
        mut candles: Vec<Candle>,
    ) -> Self {
        candles.sort_by_key(|candle| candle.close_time);
        self.candles.insert((symbol.into(), interval), candles);
        self
    }

    /// Register a timestamped indicator series, sorted ascending.
    pub fn with_indicator(
        mut self,
        symbol: impl Into<Symbol>,
        kind: IndicatorKind,
        interval: Interval,
        mut series: Vec<(TimestampMs, IndicatorValue)>,
    ) -> Self {
        series.sort_by_key(|(time, _)| *time);
        self.indicators
            .insert((symbol.into(), kind, interval), series);
        self
    }

    /// Register a timestamped flow series, sorted ascending.
    pub fn with_flow(
        mut self,
        symbol: impl Into<Symbol>,
        metric: FlowMetric,
        interval: Interval,
        mut series: Vec<(TimestampMs, FlowRecord)>,
    ) -> Self {
        series.sort_by_key(|(time, _)| *time);
        self.flows.insert((symbol.into(), metric, interval), series);
        self
    }

    fn series(&self, symbol: &Symbol, interval: Interval) -> Option<&[Candle]> {
        self.candles
            .get(&(symbol.clone(), interval))
            .map(Vec::as_slice)
    }
}

/// Find the latest entry of a sorted timestamped series at or before `instant`.
fn latest_at_or_before<T>(series: &[(TimestampMs, T)], instant: TimestampMs) -> Option<&T> {
    let end = series.partition_point(|(time, _)| *time <= instant);
    series[..end].last().map(|(_, value)| value)
}

impl MarketDataStore for InMemoryMarketData {
    fn ohlc(
        &self,
        symbol: &Symbol,
        interval: Interval,
        t0: TimestampMs,
        t1: TimestampMs,
    ) -> Vec<Candle> {
        let Some(series) = self.series(symbol, interval) else {
            warn!(%symbol, %interval, "no candle series registered");
            return vec![];
        };

        let start = series.partition_point(|candle| candle.close_time <= t0);
        let end = series.partition_point(|candle| candle.close_time <= t1);
        series[start..end].to_vec()
    }

    fn latest_close(&self, symbol: &Symbol, at_or_before: TimestampMs) -> Option<Decimal> {
        // Any registered interval works; prefer the finest so the price is the
        // most recent observable close.
        let mut best: Option<&Candle> = None;
        for ((series_symbol, _), series) in &self.candles {
            if series_symbol != symbol {
                continue;
            }
            let end = series.partition_point(|candle| candle.close_time <= at_or_before);
            if let Some(candle) = series[..end].last()
                && best.is_none_or(|current| candle.close_time > current.close_time)
            {
                best = Some(candle);
            }
        }
        best.map(|candle| candle.close)
    }

    fn indicator(
        &self,
        symbol: &Symbol,
        kind: IndicatorKind,
        interval: Interval,
        at_or_before: TimestampMs,
    ) -> Option<IndicatorValue> {
        self.indicators
            .get(&(symbol.clone(), kind, interval))
            .and_then(|series| latest_at_or_before(series, at_or_before))
            .cloned()
    }

    fn flow(
        &self,
        symbol: &Symbol,
        metric: FlowMetric,
        interval: Interval,
        at_or_before: TimestampMs,
    ) -> Option<FlowRecord> {
        self.flows
            .get(&(symbol.clone(), metric, interval))
            .and_then(|series| latest_at_or_before(series, at_or_before))
            .cloned()
    }
}
