use crate::{Symbol, TimestampMs, account::order::OrderSide};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Direction of an open [`Position`].
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PositionSide {
    Long,
    Short,
}

impl PositionSide {
    /// The order side that reduces or closes a position on this side.
    pub fn close_side(&self) -> OrderSide {
        match self {
            PositionSide::Long => OrderSide::Sell,
            PositionSide::Short => OrderSide::Buy,
        }
    }
}

/// An open perpetuals position. At most one exists per symbol; repeated entries
/// in the same direction average into it.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Position {
    pub symbol: Symbol,
    pub side: PositionSide,

    /// Position quantity in units of the traded symbol. Always positive.
    pub size: Decimal,

    /// Size-weighted average entry price across all entries.
    pub entry_price: Decimal,

    pub leverage: u32,
    pub entry_time: TimestampMs,

    /// Margin locked against this position: `size * entry_price / leverage`.
    pub margin_used: Decimal,

    /// Unrealised PnL at the last marked price.
    pub unrealized_pnl: Decimal,
}

impl Position {
    /// Re-mark unrealised PnL at the provided price and return it.
    pub fn update_pnl(&mut self, current_price: Decimal) -> Decimal {
        self.unrealized_pnl = match self.side {
            PositionSide::Long => (current_price - self.entry_price) * self.size,
            PositionSide::Short => (self.entry_price - current_price) * self.size,
        };
        self.unrealized_pnl
    }

    /// Notional value of the position at the provided price.
    pub fn notional(&self, current_price: Decimal) -> Decimal {
        self.size * current_price
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn position(side: PositionSide) -> Position {
        Position {
            symbol: Symbol::new("BTC"),
            side,
            size: dec!(2),
            entry_price: dec!(100),
            leverage: 1,
            entry_time: 0,
            margin_used: dec!(200),
            unrealized_pnl: Decimal::ZERO,
        }
    }

    #[test]
    fn test_update_pnl_long_and_short() {
        let mut long = position(PositionSide::Long);
        assert_eq!(long.update_pnl(dec!(110)), dec!(20));
        assert_eq!(long.update_pnl(dec!(90)), dec!(-20));

        let mut short = position(PositionSide::Short);
        assert_eq!(short.update_pnl(dec!(110)), dec!(-20));
        assert_eq!(short.update_pnl(dec!(90)), dec!(20));
    }

    #[test]
    fn test_close_side() {
        assert_eq!(PositionSide::Long.close_side(), OrderSide::Sell);
        assert_eq!(PositionSide::Short.close_side(), OrderSide::Buy);
    }
}
