use crate::{Symbol, TimestampMs, account::position::PositionSide};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Side of an order as sent to the venue.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderSide {
    Buy,
    Sell,
}

/// Conditional order type.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PendingOrderKind {
    TakeProfit,
    StopLoss,
}

/// A reduce-only conditional order attached to one entry tranche of a
/// position.
///
/// Each tranche (open or add) spawns its own TP/SL orders controlling exactly
/// the size that tranche contributed, tagged with that tranche's fill price so
/// a partial trigger attributes PnL to the right entry. Orders on other
/// tranches are unaffected when one fires.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PendingOrder {
    /// Monotonically increasing id issued by the owning account.
    pub id: u64,
    pub symbol: Symbol,

    /// The closing side (sell closes long, buy closes short).
    pub side: OrderSide,
    pub kind: PendingOrderKind,

    pub trigger_price: Decimal,

    /// The portion of the position this order controls.
    pub size: Decimal,

    /// Fill price of the entry that spawned this order.
    pub entry_price: Decimal,

    pub created_at: TimestampMs,
}

impl PendingOrder {
    /// Whether the candle range `[low, high]` crosses this order's trigger
    /// price, given the side of the position it reduces.
    pub fn triggers_within(
        &self,
        position_side: PositionSide,
        high: Decimal,
        low: Decimal,
    ) -> bool {
        match (self.kind, position_side) {
            (PendingOrderKind::TakeProfit, PositionSide::Long) => high >= self.trigger_price,
            (PendingOrderKind::TakeProfit, PositionSide::Short) => low <= self.trigger_price,
            (PendingOrderKind::StopLoss, PositionSide::Long) => low <= self.trigger_price,
            (PendingOrderKind::StopLoss, PositionSide::Short) => high >= self.trigger_price,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn order(kind: PendingOrderKind, trigger_price: Decimal) -> PendingOrder {
        PendingOrder {
            id: 1,
            symbol: Symbol::new("BTC"),
            side: OrderSide::Sell,
            kind,
            trigger_price,
            size: dec!(1),
            entry_price: dec!(100),
            created_at: 0,
        }
    }

    #[test]
    fn test_triggers_within_ohlc_range() {
        struct TestCase {
            kind: PendingOrderKind,
            position_side: PositionSide,
            trigger_price: Decimal,
            high: Decimal,
            low: Decimal,
            expected: bool,
        }

        let cases = vec![
            // TC0: long TP reached by the high
            TestCase {
                kind: PendingOrderKind::TakeProfit,
                position_side: PositionSide::Long,
                trigger_price: dec!(110),
                high: dec!(115),
                low: dec!(99),
                expected: true,
            },
            // TC1: long TP untouched
            TestCase {
                kind: PendingOrderKind::TakeProfit,
                position_side: PositionSide::Long,
                trigger_price: dec!(120),
                high: dec!(115),
                low: dec!(99),
                expected: false,
            },
            // TC2: long SL reached by the low
            TestCase {
                kind: PendingOrderKind::StopLoss,
                position_side: PositionSide::Long,
                trigger_price: dec!(99),
                high: dec!(115),
                low: dec!(98),
                expected: true,
            },
            // TC3: short TP reached by the low
            TestCase {
                kind: PendingOrderKind::TakeProfit,
                position_side: PositionSide::Short,
                trigger_price: dec!(95),
                high: dec!(100),
                low: dec!(94),
                expected: true,
            },
            // TC4: short SL reached by the high
            TestCase {
                kind: PendingOrderKind::StopLoss,
                position_side: PositionSide::Short,
                trigger_price: dec!(105),
                high: dec!(106),
                low: dec!(94),
                expected: true,
            },
            // TC5: exact touch counts
            TestCase {
                kind: PendingOrderKind::TakeProfit,
                position_side: PositionSide::Long,
                trigger_price: dec!(115),
                high: dec!(115),
                low: dec!(99),
                expected: true,
            },
        ];

        for (index, test) in cases.into_iter().enumerate() {
            let order = order(test.kind, test.trigger_price);
            assert_eq!(
                order.triggers_within(test.position_side, test.high, test.low),
                test.expected,
                "TC{index} failed"
            );
        }
    }
}
