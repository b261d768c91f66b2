use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Gross profits divided by the absolute value of gross losses. A value above
/// one indicates a profitable strategy.
///
/// Special cases:
/// - No wins at all: 0, whatever the losses.
/// - Wins but no losses: `Decimal::MAX`, standing in for +∞.
///
/// See docs: <https://www.investopedia.com/articles/fundamental-analysis/10/strategy-performance-reports.asp#toc-profit-factor>
#[derive(Debug, Clone, PartialEq, PartialOrd, Default, Deserialize, Serialize)]
pub struct ProfitFactor {
    pub value: Decimal,
}

impl ProfitFactor {
    /// Calculate the [`ProfitFactor`] from gross profits and gross losses.
    /// Losses may be passed signed or absolute.
    pub fn calculate(profits_gross: Decimal, losses_gross: Decimal) -> Self {
        let profits = profits_gross.abs();
        let losses = losses_gross.abs();

        let value = if profits.is_zero() {
            Decimal::ZERO
        } else if losses.is_zero() {
            Decimal::MAX
        } else {
            profits.checked_div(losses).unwrap_or(Decimal::MAX)
        };

        Self { value }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_profit_factor_calculate() {
        // no trades at all
        assert_eq!(
            ProfitFactor::calculate(dec!(0), dec!(0)).value,
            Decimal::ZERO
        );

        // no wins, some losses
        assert_eq!(
            ProfitFactor::calculate(dec!(0), dec!(50)).value,
            Decimal::ZERO
        );

        // wins and no losses stands in for +infinity
        assert_eq!(
            ProfitFactor::calculate(dec!(25), dec!(0)).value,
            Decimal::MAX
        );

        // both present
        assert_eq!(
            ProfitFactor::calculate(dec!(10), dec!(5)).value,
            dec!(2.0)
        );

        // signed losses are normalised
        assert_eq!(
            ProfitFactor::calculate(dec!(10), dec!(-5)).value,
            dec!(2.0)
        );
    }
}
