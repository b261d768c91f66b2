/// [Welford Online](https://en.wikipedia.org/wiki/Algorithms_for_calculating_variance#Welford's_online_algorithm)
/// helpers for one-pass mean and variance.
pub mod algorithm;

/// Individual performance metrics (Sharpe Ratio, Profit Factor, Win Rate,
/// drawdown tracking).
pub mod metric;

/// End-of-run [`BacktestSummary`](summary::BacktestSummary) aggregation.
pub mod summary;
