use nalgebra::{DMatrix, DVector};
use serde::Serialize;

use crate::error::{Error, Result};
use crate::generation::GenerationTime;
use crate::series::DailySeries;

/// Offset added to counts before taking logs, so zero-count days stay finite.
const LOG_OFFSET: f64 = 0.5;

/// Standard normal quantile for a two-sided 95% interval.
const Z_95: f64 = 1.959963984540054;

/// An inclusive index window into a daily series.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: usize,
    pub end: usize,
}

impl TimeWindow {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Window length in days spanned between the endpoints.
    pub fn length(&self) -> usize {
        self.end - self.start
    }
}

/// A fitted exponential-growth model over one window.
#[derive(Debug, Clone, Serialize)]
pub struct GrowthFit {
    /// Daily exponential growth rate.
    pub rate: f64,
    /// Standard error of the growth rate.
    pub rate_se: f64,
    /// Goodness of fit of the log-linear regression.
    pub r_squared: f64,
    /// Reproduction number implied by the rate.
    pub r: f64,
    pub r_lower: f64,
    pub r_upper: f64,
}

/// Fits log(count + 0.5) ~ a + r*t over the window and converts the rate to
/// a reproduction number through the generation-time distribution.
///
/// Fails with [`Error::DegenerateWindow`] when the window holds fewer than
/// two distinct non-zero counts, leaving the growth rate undefined.
pub fn fit(series: &DailySeries, window: TimeWindow, gt: &GenerationTime) -> Result<GrowthFit> {
    let degenerate = || Error::DegenerateWindow {
        start: series.date_at(window.start),
        end: series.date_at(window.end),
    };

    let counts = &series.counts()[window.start..=window.end];
    let mut distinct: Vec<u32> = counts.iter().copied().filter(|&c| c > 0).collect();
    distinct.sort_unstable();
    distinct.dedup();
    if distinct.len() < 2 {
        return Err(degenerate());
    }

    let n = counts.len();
    let x = DMatrix::from_fn(n, 2, |i, j| if j == 0 { 1.0 } else { i as f64 });
    let y = DVector::from_iterator(n, counts.iter().map(|&c| (c as f64 + LOG_OFFSET).ln()));

    let beta = x
        .clone()
        .svd(true, true)
        .solve(&y, f64::EPSILON)
        .map_err(|_| degenerate())?;
    let rate = beta[1];

    let residuals = &y - &x * &beta;
    let sse: f64 = residuals.iter().map(|e| e * e).sum();
    let y_mean = y.mean();
    let sst: f64 = y.iter().map(|v| (v - y_mean).powi(2)).sum();
    let r_squared = if sst > 0.0 { 1.0 - sse / sst } else { 1.0 };

    // Simple-regression slope variance: sigma^2 / sum (t - mean t)^2. Two
    // points determine the line exactly, so the residual variance is zero.
    let t_mean = (n as f64 - 1.0) / 2.0;
    let sxx: f64 = (0..n).map(|i| (i as f64 - t_mean).powi(2)).sum();
    let rate_se = if n > 2 {
        (sse / (n as f64 - 2.0) / sxx).sqrt()
    } else {
        0.0
    };

    Ok(GrowthFit {
        rate,
        rate_se,
        r_squared,
        r: reproduction_number(rate, gt),
        r_lower: reproduction_number(rate - Z_95 * rate_se, gt),
        r_upper: reproduction_number(rate + Z_95 * rate_se, gt),
    })
}

/// R = 1 / M(-r): the renewal-equation link between an exponential growth
/// rate and the reproduction number (Wallinga & Lipsitch). Monotonic in r,
/// so confidence-interval endpoints map through directly.
fn reproduction_number(rate: f64, gt: &GenerationTime) -> f64 {
    1.0 / gt.mgf(-rate)
}

#[cfg(test)]
mod test {
    use super::*;
    use chrono::NaiveDate;

    fn series(counts: Vec<u32>) -> DailySeries {
        DailySeries::from_counts("BW", NaiveDate::from_ymd_opt(2020, 3, 1).unwrap(), counts)
    }

    fn gt() -> GenerationTime {
        GenerationTime::discretize(4.7, 2.9, 40).unwrap()
    }

    #[test]
    fn recovers_synthetic_growth_rate() {
        let rate = 0.11;
        let counts: Vec<u32> = (0..30)
            .map(|t| (200.0 * f64::exp(rate * t as f64)).round() as u32)
            .collect();
        let s = series(counts);
        let fit = fit(&s, TimeWindow::new(0, 29), &gt()).unwrap();
        assert!((fit.rate - rate).abs() < 0.01, "rate {}", fit.rate);
        assert!(fit.r_squared > 0.999);
        assert!(fit.r > 1.0);
        assert!(fit.r_lower < fit.r && fit.r < fit.r_upper);
    }

    #[test]
    fn negative_rate_maps_below_one() {
        let counts: Vec<u32> = (0..20)
            .map(|t| (400.0 * f64::exp(-0.08 * t as f64)).round() as u32)
            .collect();
        let s = series(counts);
        let fit = fit(&s, TimeWindow::new(0, 19), &gt()).unwrap();
        assert!(fit.rate < 0.0);
        assert!(fit.r < 1.0);
    }

    #[test]
    fn rejects_degenerate_windows() {
        // All zero, and constant: one distinct non-zero value at most.
        for counts in [vec![0, 0, 0, 0], vec![3, 3, 3, 3]] {
            let s = series(counts);
            assert!(matches!(
                fit(&s, TimeWindow::new(0, 3), &gt()),
                Err(Error::DegenerateWindow { .. })
            ));
        }
    }

    #[test]
    fn window_length_is_span() {
        assert_eq!(TimeWindow::new(2, 5).length(), 3);
        assert_eq!(TimeWindow::new(4, 5).length(), 1);
    }
}
