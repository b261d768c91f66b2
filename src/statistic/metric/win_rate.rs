use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Fraction of closed trades that realised a positive PnL. Zero when no trades
/// closed.
#[derive(Debug, Clone, PartialEq, PartialOrd, Default, Deserialize, Serialize)]
pub struct WinRate {
    pub value: Decimal,
}

impl WinRate {
    pub fn calculate(wins: Decimal, total: Decimal) -> Self {
        if total.is_zero() {
            Self::default()
        } else {
            Self {
                value: wins.abs().checked_div(total.abs()).unwrap_or(Decimal::ZERO),
            }
        }
    }
}
