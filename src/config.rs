use crate::{Symbol, TimestampMs, error::BacktestError};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use std::{fmt, str::FromStr};

/// Candle / scheduled-trigger interval grid supported by the engine.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize, Serialize)]
pub enum Interval {
    #[serde(rename = "1m")]
    M1,
    #[serde(rename = "5m")]
    M5,
    #[serde(rename = "15m")]
    M15,
    #[serde(rename = "30m")]
    M30,
    #[serde(rename = "1h")]
    H1,
    #[serde(rename = "4h")]
    H4,
    #[serde(rename = "1d")]
    D1,
}

impl Interval {
    /// Interval duration in milliseconds.
    pub fn as_millis(&self) -> u64 {
        match self {
            Interval::M1 => 60 * 1000,
            Interval::M5 => 5 * 60 * 1000,
            Interval::M15 => 15 * 60 * 1000,
            Interval::M30 => 30 * 60 * 1000,
            Interval::H1 => 60 * 60 * 1000,
            Interval::H4 => 4 * 60 * 60 * 1000,
            Interval::D1 => 24 * 60 * 60 * 1000,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Interval::M1 => "1m",
            Interval::M5 => "5m",
            Interval::M15 => "15m",
            Interval::M30 => "30m",
            Interval::H1 => "1h",
            Interval::H4 => "4h",
            Interval::D1 => "1d",
        }
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Interval {
    type Err = BacktestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "1m" => Ok(Interval::M1),
            "5m" => Ok(Interval::M5),
            "15m" => Ok(Interval::M15),
            "30m" => Ok(Interval::M30),
            "1h" => Ok(Interval::H1),
            "4h" => Ok(Interval::H4),
            "1d" => Ok(Interval::D1),
            other => Err(BacktestError::InvalidConfig(format!(
                "unrecognised interval: {other}"
            ))),
        }
    }
}

/// Which candle price the simulator treats as "current" when executing a
/// decision at a trigger instant.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionPriceMode {
    #[default]
    Close,
    Open,
    Vwap,
}

/// Immutable input configuration for one backtest run.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct BacktestConfig {
    /// Strategy source code, passed through opaquely to the
    /// [`StrategyRunner`](crate::strategy::StrategyRunner).
    pub code: String,

    /// Signal pools whose precomputed triggers drive the run. May be empty if a
    /// `scheduled_interval` is configured.
    pub signal_pool_ids: Vec<SmolStr>,

    /// Ordered set of traded symbols. Must be non-empty.
    pub symbols: Vec<Symbol>,

    /// Run window, inclusive, in milliseconds.
    pub start_time: TimestampMs,
    pub end_time: TimestampMs,

    /// Periodic trigger interval. `None` disables scheduled triggers entirely.
    pub scheduled_interval: Option<Interval>,

    /// Starting account balance. Must be positive.
    pub initial_balance: Decimal,

    /// Slippage applied to every execution, in percent (0.05 = 0.05%).
    pub slippage_percent: Decimal,

    /// Fee rate applied to every execution notional, in percent.
    pub fee_rate: Decimal,

    /// Execution price assumption.
    #[serde(default)]
    pub execution_price: ExecutionPriceMode,
}

impl BacktestConfig {
    /// Validate the configuration before any work is done.
    pub fn validate(&self) -> Result<(), BacktestError> {
        if self.start_time >= self.end_time {
            return Err(BacktestError::InvalidConfig(format!(
                "start_time {} must precede end_time {}",
                self.start_time, self.end_time
            )));
        }
        if self.symbols.is_empty() {
            return Err(BacktestError::InvalidConfig(
                "symbols must contain at least one entry".to_string(),
            ));
        }
        if self.initial_balance <= Decimal::ZERO {
            return Err(BacktestError::InvalidConfig(format!(
                "initial_balance must be positive, got {}",
                self.initial_balance
            )));
        }
        if self.slippage_percent < Decimal::ZERO {
            return Err(BacktestError::InvalidConfig(format!(
                "slippage_percent must be non-negative, got {}",
                self.slippage_percent
            )));
        }
        if self.fee_rate < Decimal::ZERO {
            return Err(BacktestError::InvalidConfig(format!(
                "fee_rate must be non-negative, got {}",
                self.fee_rate
            )));
        }
        Ok(())
    }

    pub fn start_time_utc(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.start_time as i64)
    }

    pub fn end_time_utc(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.end_time as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn config() -> BacktestConfig {
        BacktestConfig {
            code: String::new(),
            signal_pool_ids: vec![],
            symbols: vec![Symbol::new("BTC")],
            start_time: 0,
            end_time: 3_600_000,
            scheduled_interval: Some(Interval::H1),
            initial_balance: dec!(10000),
            slippage_percent: Decimal::ZERO,
            fee_rate: Decimal::ZERO,
            execution_price: ExecutionPriceMode::Close,
        }
    }

    #[test]
    fn test_interval_round_trip() {
        for (input, expected_ms) in [
            ("1m", 60_000),
            ("5m", 300_000),
            ("15m", 900_000),
            ("30m", 1_800_000),
            ("1h", 3_600_000),
            ("4h", 14_400_000),
            ("1d", 86_400_000),
        ] {
            let interval = Interval::from_str(input).unwrap();
            assert_eq!(interval.as_millis(), expected_ms);
            assert_eq!(interval.to_string(), input);
        }

        assert!(Interval::from_str("2h").is_err());
    }

    #[test]
    fn test_config_validate() {
        assert!(config().validate().is_ok());

        let mut inverted = config();
        inverted.start_time = inverted.end_time;
        assert!(inverted.validate().is_err());

        let mut no_symbols = config();
        no_symbols.symbols.clear();
        assert!(no_symbols.validate().is_err());

        let mut broke = config();
        broke.initial_balance = Decimal::ZERO;
        assert!(broke.validate().is_err());

        let mut negative_slippage = config();
        negative_slippage.slippage_percent = dec!(-0.01);
        assert!(negative_slippage.validate().is_err());
    }
}
