/// Welford Online algorithms for computing running mean and variance in one
/// pass over a dataset.
pub mod welford_online {
    use rust_decimal::Decimal;

    /// Next mean, given the previous mean, the new value, and the dataset count
    /// including the new value.
    pub fn calculate_mean(prev_mean: Decimal, new_value: Decimal, count: Decimal) -> Decimal {
        prev_mean + (new_value - prev_mean) / count
    }

    /// Next recurrence relation M, the running sum of squared deviations.
    pub fn calculate_recurrence_relation_m(
        prev_m: Decimal,
        prev_mean: Decimal,
        new_value: Decimal,
        new_mean: Decimal,
    ) -> Decimal {
        prev_m + ((new_value - prev_mean) * (new_value - new_mean))
    }

    /// Unbiased sample variance using Bessel's correction (count - 1). Zero for
    /// datasets smaller than two.
    pub fn calculate_sample_variance(recurrence_relation_m: Decimal, count: Decimal) -> Decimal {
        if count < Decimal::TWO {
            Decimal::ZERO
        } else {
            recurrence_relation_m / (count - Decimal::ONE)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::welford_online::*;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    #[test]
    fn test_calculate_mean() {
        // Dataset = [10, 20, 60]; running means = [10, 15, 30]
        let mean_1 = calculate_mean(Decimal::ZERO, dec!(10), dec!(1));
        assert_eq!(mean_1, dec!(10));

        let mean_2 = calculate_mean(mean_1, dec!(20), dec!(2));
        assert_eq!(mean_2, dec!(15));

        let mean_3 = calculate_mean(mean_2, dec!(60), dec!(3));
        assert_eq!(mean_3, dec!(30));
    }

    #[test]
    fn test_sample_variance_over_dataset() {
        // Dataset = [2, 4, 4, 4, 5, 5, 7, 9]; sample variance = 32/7
        let dataset = [
            dec!(2),
            dec!(4),
            dec!(4),
            dec!(4),
            dec!(5),
            dec!(5),
            dec!(7),
            dec!(9),
        ];

        let mut mean = Decimal::ZERO;
        let mut recurrence_m = Decimal::ZERO;
        let mut count = Decimal::ZERO;

        for value in dataset {
            count += Decimal::ONE;
            let prev_mean = mean;
            mean = calculate_mean(prev_mean, value, count);
            recurrence_m = calculate_recurrence_relation_m(recurrence_m, prev_mean, value, mean);
        }

        assert_eq!(mean, dec!(5));
        assert_eq!(
            calculate_sample_variance(recurrence_m, count),
            dec!(32) / dec!(7)
        );
    }

    #[test]
    fn test_sample_variance_of_singleton_is_zero() {
        assert_eq!(
            calculate_sample_variance(dec!(123), Decimal::ONE),
            Decimal::ZERO
        );
    }
}
