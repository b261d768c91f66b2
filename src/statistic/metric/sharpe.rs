use crate::statistic::algorithm::welford_online;
use rust_decimal::{Decimal, MathematicalOps};
use serde::{Deserialize, Serialize};

/// Annualised Sharpe Ratio of an equity curve.
///
/// Per-bar returns `r_i = (E_i - E_{i-1}) / E_{i-1}` are derived from
/// consecutive equity marks, then annualised with a √252 scaling of
/// `mean / sample_std_dev`. Fewer than two returns, or a zero standard
/// deviation, yield a ratio of zero.
///
/// See docs: <https://www.investopedia.com/articles/07/sharpe_ratio.asp>
#[derive(Debug, Clone, PartialEq, PartialOrd, Default, Deserialize, Serialize)]
pub struct SharpeRatio {
    pub value: Decimal,
}

impl SharpeRatio {
    /// Calculate the annualised [`SharpeRatio`] over consecutive equity marks.
    pub fn from_equity_curve<Equities>(equities: Equities) -> Self
    where
        Equities: IntoIterator<Item = Decimal>,
    {
        let mut previous: Option<Decimal> = None;
        let mut mean = Decimal::ZERO;
        let mut recurrence_m = Decimal::ZERO;
        let mut count = Decimal::ZERO;

        for equity in equities {
            if let Some(prev_equity) = previous
                && prev_equity > Decimal::ZERO
            {
                let bar_return = (equity - prev_equity) / prev_equity;

                count += Decimal::ONE;
                let prev_mean = mean;
                mean = welford_online::calculate_mean(prev_mean, bar_return, count);
                recurrence_m = welford_online::calculate_recurrence_relation_m(
                    recurrence_m,
                    prev_mean,
                    bar_return,
                    mean,
                );
            }
            previous = Some(equity);
        }

        if count < Decimal::TWO {
            return Self::default();
        }

        let variance = welford_online::calculate_sample_variance(recurrence_m, count);
        let std_dev = variance.abs().sqrt().unwrap_or(Decimal::ZERO);
        if std_dev.is_zero() {
            return Self::default();
        }

        let annualisation = Decimal::from(252).sqrt().expect("252 is positive");
        Self {
            value: (mean / std_dev) * annualisation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_sharpe_zero_for_constant_equity() {
        let curve = vec![dec!(10000), dec!(10000), dec!(10000), dec!(10000)];
        assert_eq!(SharpeRatio::from_equity_curve(curve).value, Decimal::ZERO);
    }

    #[test]
    fn test_sharpe_zero_below_two_returns() {
        assert_eq!(
            SharpeRatio::from_equity_curve(vec![dec!(10000)]).value,
            Decimal::ZERO
        );
        assert_eq!(
            SharpeRatio::from_equity_curve(vec![dec!(10000), dec!(10100)]).value,
            Decimal::ZERO
        );
        assert_eq!(SharpeRatio::from_equity_curve(vec![]).value, Decimal::ZERO);
    }

    #[test]
    fn test_sharpe_positive_for_steady_gains() {
        // Returns: 1%, ~0.99%, ~0.98% -> small positive dispersion
        let curve = vec![dec!(10000), dec!(10100), dec!(10200), dec!(10300)];
        let sharpe = SharpeRatio::from_equity_curve(curve);
        assert!(sharpe.value > Decimal::ZERO);
    }

    #[test]
    fn test_sharpe_negative_for_steady_losses() {
        let curve = vec![dec!(10000), dec!(9900), dec!(9790), dec!(9700)];
        let sharpe = SharpeRatio::from_equity_curve(curve);
        assert!(sharpe.value < Decimal::ZERO);
    }

    #[test]
    fn test_sharpe_skips_non_positive_previous_equity() {
        // A zero mark cannot produce a return; the curve still yields a value
        // from the remaining pairs without dividing by zero.
        let curve = vec![dec!(0), dec!(10000), dec!(10100), dec!(10050), dec!(10200)];
        let sharpe = SharpeRatio::from_equity_curve(curve);
        assert!(sharpe.value > Decimal::ZERO);
    }
}
