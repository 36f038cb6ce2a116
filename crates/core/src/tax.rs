use rust_decimal::Decimal;
use thiserror::Error;

use crate::types::{JobDetails, TaxRegime};

/// Stateless calculator for job tax liabilities.
#[derive(Debug, Default, Clone, Copy)]
pub struct TaxCalculator;

impl TaxCalculator {
    pub fn new() -> Self {
        Self
    }

    /// Country codes of every tax record on the job, in record order.
    ///
    /// Records referencing the same regime yield the code once per record.
    pub fn tax_liabilities(&self, job: &JobDetails) -> Vec<String> {
        job.tax_information
            .iter()
            .map(|info| info.regime.country_code.clone())
            .collect()
    }

    /// Blended marginal rate: the sum over regimes of the amount above each
    /// threshold times its rate, divided by `reference_value`.
    pub fn indicative_tax_percentage<'a, I>(
        &self,
        reference_value: Decimal,
        regimes: I,
    ) -> Result<Decimal, TaxError>
    where
        I: IntoIterator<Item = &'a TaxRegime>,
    {
        if reference_value.is_zero() {
            return Err(TaxError::ZeroReferenceValue);
        }

        let mut total = Decimal::ZERO;
        for regime in regimes {
            let taxable = reference_value
                .checked_sub(regime.minimum_threshold)
                .ok_or(TaxError::Overflow)?
                .max(Decimal::ZERO);
            let due = taxable
                .checked_mul(regime.tax_rate)
                .ok_or(TaxError::Overflow)?;
            total = total.checked_add(due).ok_or(TaxError::Overflow)?;
        }

        total
            .checked_div(reference_value)
            .ok_or(TaxError::Overflow)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TaxError {
    #[error("reference value must not be zero")]
    ZeroReferenceValue,
    #[error("tax calculation overflowed")]
    Overflow,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{JobCategory, TaxInformation};
    use rust_decimal_macros::dec;

    fn regime(id: i64, code: &str, threshold: Decimal, rate: Decimal) -> TaxRegime {
        TaxRegime {
            id,
            country_code: code.to_string(),
            description: code.to_string(),
            minimum_threshold: threshold,
            tax_rate: rate,
        }
    }

    fn job_with(regimes: Vec<TaxRegime>) -> JobDetails {
        JobDetails {
            id: 1,
            description: "Desc".into(),
            category: JobCategory {
                id: 1,
                description: "Category".into(),
            },
            tax_information: regimes
                .into_iter()
                .enumerate()
                .map(|(idx, regime)| TaxInformation {
                    id: idx as i64 + 1,
                    description: "Desc".into(),
                    job_id: 1,
                    regime,
                })
                .collect(),
            employees: Vec::new(),
        }
    }

    #[test]
    fn liabilities_follow_record_order() {
        let job = job_with(vec![
            regime(1, "GBR", dec!(10000), dec!(0.2)),
            regime(2, "USA", dec!(2000), dec!(0.1)),
        ]);

        let codes = TaxCalculator::new().tax_liabilities(&job);
        assert_eq!(codes, vec!["GBR".to_string(), "USA".to_string()]);
    }

    #[test]
    fn liabilities_keep_duplicates() {
        let gbr = regime(1, "GBR", dec!(10000), dec!(0.2));
        let job = job_with(vec![gbr.clone(), regime(2, "USA", dec!(1), dec!(0.1)), gbr]);

        let codes = TaxCalculator::new().tax_liabilities(&job);
        assert_eq!(codes.len(), 3);
        assert_eq!(codes, vec!["GBR", "USA", "GBR"]);
    }

    #[test]
    fn liabilities_empty_for_job_without_records() {
        let job = job_with(Vec::new());
        assert!(TaxCalculator::new().tax_liabilities(&job).is_empty());
    }

    #[test]
    fn single_regime_above_threshold() {
        let regimes = [regime(1, "GBR", dec!(10000), dec!(0.2))];
        let actual = TaxCalculator::new()
            .indicative_tax_percentage(dec!(20000), &regimes)
            .expect("percentage");
        assert_eq!(actual, dec!(0.1));
    }

    #[test]
    fn single_regime_below_threshold_is_zero() {
        let regimes = [regime(1, "GBR", dec!(10000), dec!(0.2))];
        let actual = TaxCalculator::new()
            .indicative_tax_percentage(dec!(5000), &regimes)
            .expect("percentage");
        assert!(actual.is_zero());
    }

    #[test]
    fn multiple_regimes_above_threshold() {
        let regimes = [
            regime(1, "GBR", dec!(10000), dec!(0.2)),
            regime(2, "USA", dec!(5000), dec!(0.1)),
        ];
        let actual = TaxCalculator::new()
            .indicative_tax_percentage(dec!(20000), &regimes)
            .expect("percentage");
        assert_eq!(actual, dec!(3500) / dec!(20000));
    }

    #[test]
    fn multiple_regimes_one_below_threshold() {
        let regimes = [
            regime(1, "GBR", dec!(10000), dec!(0.2)),
            regime(2, "USA", dec!(5000), dec!(0.1)),
        ];
        let actual = TaxCalculator::new()
            .indicative_tax_percentage(dec!(9000), &regimes)
            .expect("percentage");
        assert_eq!(actual, dec!(400) / dec!(9000));
    }

    #[test]
    fn all_regimes_below_threshold_is_zero() {
        let regimes = [
            regime(1, "GBR", dec!(10000), dec!(0.2)),
            regime(2, "USA", dec!(5000), dec!(0.1)),
        ];
        let actual = TaxCalculator::new()
            .indicative_tax_percentage(dec!(4000), &regimes)
            .expect("percentage");
        assert!(actual.is_zero());
    }

    #[test]
    fn reference_equal_to_threshold_is_zero() {
        let regimes = [regime(1, "GBR", dec!(10000), dec!(0.2))];
        let actual = TaxCalculator::new()
            .indicative_tax_percentage(dec!(10000), &regimes)
            .expect("percentage");
        assert!(actual.is_zero());
    }

    #[test]
    fn no_regimes_is_zero() {
        let none: [TaxRegime; 0] = [];
        let actual = TaxCalculator::new()
            .indicative_tax_percentage(dec!(1000), &none)
            .expect("percentage");
        assert!(actual.is_zero());
    }

    #[test]
    fn zero_reference_value_is_rejected() {
        let regimes = [regime(1, "GBR", dec!(10000), dec!(0.2))];
        let err = TaxCalculator::new()
            .indicative_tax_percentage(Decimal::ZERO, &regimes)
            .expect_err("zero reference");
        assert_eq!(err, TaxError::ZeroReferenceValue);

        let none: [TaxRegime; 0] = [];
        let err = TaxCalculator::new()
            .indicative_tax_percentage(Decimal::ZERO, &none)
            .expect_err("zero reference without regimes");
        assert_eq!(err, TaxError::ZeroReferenceValue);
    }
}
