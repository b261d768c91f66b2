use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Running peak-to-trough equity decline tracker.
///
/// `max_drawdown` is the largest absolute equity decline from any previous
/// peak; `max_drawdown_percent` is that decline as a fraction of the peak it
/// fell from. Both are non-decreasing for the lifetime of the tracker, and the
/// percentage always corresponds to the recorded absolute maximum.
///
/// See documentation: <https://www.investopedia.com/terms/m/maximum-drawdown-mdd.asp>
#[derive(Debug, Clone, PartialEq, PartialOrd, Deserialize, Serialize)]
pub struct DrawdownTracker {
    pub peak: Decimal,
    pub max_drawdown: Decimal,
    pub max_drawdown_percent: Decimal,
}

impl DrawdownTracker {
    /// Initialise the tracker at the starting equity.
    pub fn init(initial_equity: Decimal) -> Self {
        Self {
            peak: initial_equity,
            max_drawdown: Decimal::ZERO,
            max_drawdown_percent: Decimal::ZERO,
        }
    }

    /// Update the tracker with the latest marked equity.
    pub fn update(&mut self, equity: Decimal) {
        if equity > self.peak {
            self.peak = equity;
        }

        if self.peak > Decimal::ZERO {
            let drawdown = self.peak - equity;
            if drawdown > self.max_drawdown {
                self.max_drawdown = drawdown;
                self.max_drawdown_percent = drawdown / self.peak;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_drawdown_tracker_update() {
        struct TestCase {
            input: Decimal,
            expected: DrawdownTracker,
        }

        let mut tracker = DrawdownTracker::init(dec!(100));

        let cases = vec![
            // TC0: equity rises, no drawdown
            TestCase {
                input: dec!(110),
                expected: DrawdownTracker {
                    peak: dec!(110),
                    max_drawdown: dec!(0),
                    max_drawdown_percent: dec!(0),
                },
            },
            // TC1: first decline from the 110 peak
            TestCase {
                input: dec!(99),
                expected: DrawdownTracker {
                    peak: dec!(110),
                    max_drawdown: dec!(11),
                    max_drawdown_percent: dec!(0.1),
                },
            },
            // TC2: deeper decline extends the maximum
            TestCase {
                input: dec!(88),
                expected: DrawdownTracker {
                    peak: dec!(110),
                    max_drawdown: dec!(22),
                    max_drawdown_percent: dec!(0.2),
                },
            },
            // TC3: partial recovery leaves the maximum untouched
            TestCase {
                input: dec!(95),
                expected: DrawdownTracker {
                    peak: dec!(110),
                    max_drawdown: dec!(22),
                    max_drawdown_percent: dec!(0.2),
                },
            },
            // TC4: new peak, recorded maximum is monotone
            TestCase {
                input: dec!(120),
                expected: DrawdownTracker {
                    peak: dec!(120),
                    max_drawdown: dec!(22),
                    max_drawdown_percent: dec!(0.2),
                },
            },
            // TC5: smaller decline from the higher peak does not supersede
            TestCase {
                input: dec!(110),
                expected: DrawdownTracker {
                    peak: dec!(120),
                    max_drawdown: dec!(22),
                    max_drawdown_percent: dec!(0.2),
                },
            },
        ];

        for (index, test) in cases.into_iter().enumerate() {
            tracker.update(test.input);
            assert_eq!(tracker, test.expected, "TC{index} failed");
        }
    }

    #[test]
    fn test_drawdown_monotonicity_over_noisy_curve() {
        let mut tracker = DrawdownTracker::init(dec!(10000));
        let mut previous = tracker.clone();

        for equity in [
            dec!(10100),
            dec!(9800),
            dec!(10200),
            dec!(9500),
            dec!(9900),
            dec!(10500),
            dec!(10000),
        ] {
            tracker.update(equity);
            assert!(tracker.max_drawdown >= previous.max_drawdown);
            assert!(tracker.max_drawdown_percent >= previous.max_drawdown_percent);
            previous = tracker.clone();
        }
    }
}
