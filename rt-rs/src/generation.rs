use statrs::distribution::{ContinuousCDF, Gamma};

use crate::error::{Error, Result};

/// Hard cap on the discrete support, far beyond any plausible generation time.
const MAX_TRUNCATION: usize = 1000;

/// A generation-time distribution discretized onto integer lags 1..=L.
///
/// Built from the mean and standard deviation of a continuous gamma
/// distribution; weights sum to one after renormalization. Immutable once
/// constructed, and shared read-only across all per-region computations.
#[derive(Debug, Clone)]
pub struct GenerationTime {
    mean: f64,
    sd: f64,
    weights: Vec<f64>,
}

impl GenerationTime {
    /// Discretizes gamma(mean, sd) onto lags 1..=`truncate` by integrating
    /// the density over unit intervals centered on each lag, then
    /// renormalizes.
    pub fn discretize(mean: f64, sd: f64, truncate: usize) -> Result<Self> {
        let gamma = gamma_from_moments(mean, sd)?;
        let mut weights: Vec<f64> = (1..=truncate)
            .map(|lag| gamma.cdf(lag as f64 + 0.5) - gamma.cdf(lag as f64 - 0.5))
            .collect();
        let total: f64 = weights.iter().sum();
        if !(total > 0.0) {
            return Err(Error::InvalidParameters { mean, sd });
        }
        for w in &mut weights {
            *w /= total;
        }
        Ok(Self { mean, sd, weights })
    }

    /// Discretizes with the smallest truncation that captures more than 99%
    /// of the continuous mass.
    pub fn discretize_auto(mean: f64, sd: f64) -> Result<Self> {
        let gamma = gamma_from_moments(mean, sd)?;
        let mut truncate = 1;
        while truncate < MAX_TRUNCATION && gamma.cdf(truncate as f64 + 0.5) < 0.99 {
            truncate += 1;
        }
        Self::discretize(mean, sd, truncate)
    }

    pub fn mean(&self) -> f64 {
        self.mean
    }

    pub fn sd(&self) -> f64 {
        self.sd
    }

    /// Largest lag with non-zero weight.
    pub fn support(&self) -> usize {
        self.weights.len()
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    /// Probability of a generation interval of exactly `lag` days.
    pub fn weight(&self, lag: usize) -> f64 {
        if (1..=self.weights.len()).contains(&lag) {
            self.weights[lag - 1]
        } else {
            0.0
        }
    }

    /// Probability of a generation interval of at most `lag` days.
    pub fn cumulative(&self, lag: usize) -> f64 {
        self.weights.iter().take(lag).sum()
    }

    /// Moment-generating function over the discrete support,
    /// M(theta) = sum_k p_k * exp(theta * k).
    pub fn mgf(&self, theta: f64) -> f64 {
        self.weights
            .iter()
            .enumerate()
            .map(|(i, w)| w * f64::exp(theta * (i + 1) as f64))
            .sum()
    }
}

fn gamma_from_moments(mean: f64, sd: f64) -> Result<Gamma> {
    if !(mean > 0.0) || !(sd > 0.0) {
        return Err(Error::InvalidParameters { mean, sd });
    }
    let shape = (mean / sd).powi(2);
    let rate = mean / (sd * sd);
    Gamma::new(shape, rate).map_err(|_| Error::InvalidParameters { mean, sd })
}
