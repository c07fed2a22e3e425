//! Mean and standard deviation over the trials of one measurement.
//! Deliberately nothing more: no percentiles, no resampling.

use num_traits::{Pow, Zero};

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum StatsError {
    #[error("no inputs given")]
    NoInputs,
    #[error("non-finite input value {0}")]
    NonFinite(f64),
}

#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Stats {
    pub num_values: usize,
    pub sum: f64,
    pub average: f64,
    /// Mean squared difference from the mean (population variance,
    /// i.e. dividing by `num_values`, as numpy's `std` does by
    /// default)
    pub variance: f64,
}

impl Stats {
    pub fn standard_deviation(&self) -> f64 {
        self.variance.sqrt()
    }

    /// Values are summed in the given order, so the same input
    /// sequence always gives bit-identical results.
    pub fn from_values(vals: &[f64]) -> Result<Self, StatsError> {
        let num_values = vals.len();
        if num_values.is_zero() {
            return Err(StatsError::NoInputs);
        }
        if let Some(v) = vals.iter().find(|v| !v.is_finite()) {
            return Err(StatsError::NonFinite(*v));
        }
        let sum: f64 = vals.iter().sum();
        let average = sum / num_values as f64;
        let variance = {
            let sum: f64 = vals.iter().map(|v| (*v - average).pow(2)).sum();
            sum / num_values as f64
        };
        Ok(Stats {
            num_values,
            sum,
            average,
            variance,
        })
    }
}

/// Mean of `vals`, `None` if empty.
pub fn mean(vals: &[f64]) -> Option<f64> {
    Stats::from_values(vals).ok().map(|s| s.average)
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn t_average_and_deviation() -> Result<()> {
        let stats = Stats::from_values(&[23., 4., 8., 30., 7.])?;
        assert_eq!(stats.num_values, 5);
        assert_relative_eq!(stats.average, 14.4);
        assert_relative_eq!(stats.variance, 104.24, epsilon = 1e-9);
        assert_relative_eq!(stats.standard_deviation(), 10.2097992144802, epsilon = 1e-9);

        let stats = Stats::from_values(&[5.0])?;
        assert_eq!(stats.average, 5.0);
        assert_eq!(stats.standard_deviation(), 0.0);
        Ok(())
    }

    #[test]
    fn t_errors() {
        assert_eq!(Stats::from_values(&[]), Err(StatsError::NoInputs));
        assert!(matches!(
            Stats::from_values(&[1.0, f64::NAN]),
            Err(StatsError::NonFinite(_))
        ));
        assert_eq!(mean(&[]), None);
        assert_eq!(mean(&[5.0, 7.0]), Some(6.0));
    }
}
