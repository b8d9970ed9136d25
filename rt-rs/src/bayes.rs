use chrono::Days;
use rand::{SeedableRng, distr::Distribution, rngs::StdRng};
use rand_distr::Normal;
use statrs::distribution::{ContinuousCDF, Gamma};

use crate::config::BayesConfig;
use crate::error::{Error, Result};
use crate::generation::GenerationTime;
use crate::output::TimeVaryingEstimate;
use crate::renewal::total_infectiousness;
use crate::series::DailySeries;

/// Days between a window's end and the date its estimate is reported under,
/// approximating the window midpoint.
const MIDPOINT_LAG: u64 = 4;

/// Floor applied to sampled serial-interval parameters.
const PARAM_FLOOR: f64 = 0.1;

/// Sliding-window Bayesian estimate of R with serial-interval uncertainty.
///
/// Within each window ending at day t, incident cases are Poisson with rate
/// R * Lambda, so a Gamma prior on R is conjugate: posterior shape is the
/// prior shape plus the window's cases, posterior rate the prior rate plus
/// the window's total infectiousness. Serial-interval uncertainty enters by
/// resampling (mean, sd) n1 x n2 times, rebuilding the discretized
/// distribution for each pair and averaging the posterior summaries
/// incrementally, so the resampled distributions are never held at once.
pub fn estimate(
    series: &DailySeries,
    mean_si: f64,
    sd_si: f64,
    config: &BayesConfig,
) -> Result<Vec<TimeVaryingEstimate>> {
    let counts = series.counts();
    let window = config.window;
    if counts.len() <= window {
        return Ok(Vec::new());
    }

    let prior_shape = (config.prior_mean / config.prior_sd).powi(2);
    let prior_rate = config.prior_mean / (config.prior_sd * config.prior_sd);

    let mut rng = StdRng::seed_from_u64(config.seed);
    let means = sample_truncated(
        mean_si,
        config.mean_sd,
        config.mean_halfwidth,
        config.n_mean_samples,
        &mut rng,
    )?;
    let sds = sample_truncated(
        sd_si,
        config.sd_sd,
        config.sd_halfwidth,
        config.n_sd_samples,
        &mut rng,
    )?;

    // One accumulator per window end; posterior summaries are averaged over
    // the n1 x n2 resampled distributions.
    let ends: Vec<usize> = (window..counts.len()).collect();
    let mut acc_r = vec![0.0; ends.len()];
    let mut acc_lower = vec![0.0; ends.len()];
    let mut acc_upper = vec![0.0; ends.len()];
    let mut sampled = 0usize;

    for &mean in &means {
        for &sd in &sds {
            let gt = GenerationTime::discretize_auto(mean, sd)?;
            let lambda: Vec<f64> = (0..counts.len())
                .map(|t| total_infectiousness(counts, t, &gt))
                .collect();

            for (slot, &t) in ends.iter().enumerate() {
                let window_cases: u32 = counts[t + 1 - window..=t].iter().sum();
                let window_lambda: f64 = lambda[t + 1 - window..=t].iter().sum();
                let shape = prior_shape + window_cases as f64;
                let rate = prior_rate + window_lambda;
                acc_r[slot] += shape / rate;
                if let Ok(posterior) = Gamma::new(shape, rate) {
                    acc_lower[slot] += posterior.inverse_cdf(0.025);
                    acc_upper[slot] += posterior.inverse_cdf(0.975);
                }
            }
            sampled += 1;
        }
    }
    if sampled == 0 {
        return Ok(Vec::new());
    }

    let mut cumulative = 0u64;
    let mut cumulative_at = Vec::with_capacity(counts.len());
    for &c in counts {
        cumulative += c as u64;
        cumulative_at.push(cumulative);
    }

    let scale = 1.0 / sampled as f64;
    Ok(ends
        .iter()
        .enumerate()
        .map(|(slot, &t)| TimeVaryingEstimate {
            date: series.date_at(t) - Days::new(MIDPOINT_LAG),
            r: acc_r[slot] * scale,
            lower: acc_lower[slot] * scale,
            upper: acc_upper[slot] * scale,
            early: cumulative_at[t] < config.min_cases as u64,
        })
        .collect())
}

/// Draws `n` values from Normal(center, sd) truncated to the half-width
/// around `center`, falling back to the clamped center when rejection runs
/// dry.
fn sample_truncated(
    center: f64,
    sd: f64,
    halfwidth: f64,
    n: usize,
    rng: &mut StdRng,
) -> Result<Vec<f64>> {
    let lower = (center - halfwidth).max(PARAM_FLOOR);
    let upper = (center + halfwidth).max(PARAM_FLOOR);
    let normal = Normal::new(center, sd).map_err(|_| Error::InvalidParameters {
        mean: center,
        sd,
    })?;
    Ok((0..n)
        .map(|_| {
            for _ in 0..100 {
                let x = normal.sample(rng);
                if (lower..=upper).contains(&x) {
                    return x;
                }
            }
            center.clamp(lower, upper)
        })
        .collect())
}

#[cfg(test)]
mod test {
    use super::*;
    use chrono::NaiveDate;

    fn series(counts: Vec<u32>) -> DailySeries {
        DailySeries::from_counts("BW", NaiveDate::from_ymd_opt(2020, 3, 1).unwrap(), counts)
    }

    fn config() -> BayesConfig {
        BayesConfig {
            n_mean_samples: 4,
            n_sd_samples: 4,
            ..BayesConfig::default()
        }
    }

    #[test]
    fn flat_series_is_near_one() {
        let s = series(vec![50; 40]);
        let estimates = estimate(&s, 4.7, 2.9, &config()).unwrap();
        assert!(!estimates.is_empty());
        let last = estimates.last().unwrap();
        assert!((last.r - 1.0).abs() < 0.1, "r {}", last.r);
        assert!(last.lower < last.r && last.r < last.upper);
        assert!(!last.early);
    }

    #[test]
    fn growing_series_is_above_one() {
        let counts: Vec<u32> = (0..40)
            .map(|t| (10.0 * f64::exp(0.08 * t as f64)).round() as u32)
            .collect();
        let s = series(counts);
        let estimates = estimate(&s, 4.7, 2.9, &config()).unwrap();
        let last = estimates.last().unwrap();
        assert!(last.r > 1.0, "r {}", last.r);
    }

    #[test]
    fn sparse_series_is_flagged_early() {
        let mut counts = vec![1, 0, 1, 0, 0, 1, 0, 0, 0, 1];
        counts.extend(vec![30; 20]);
        let s = series(counts);
        let estimates = estimate(&s, 4.7, 2.9, &config()).unwrap();
        assert!(estimates.first().unwrap().early);
        assert!(!estimates.last().unwrap().early);
    }

    #[test]
    fn reported_dates_trail_window_ends() {
        let s = series(vec![20; 20]);
        let config = config();
        let estimates = estimate(&s, 4.7, 2.9, &config).unwrap();
        // First window ends at index `window`; its estimate is dated four
        // days earlier.
        assert_eq!(
            estimates[0].date,
            s.date_at(config.window) - Days::new(MIDPOINT_LAG)
        );
        let dates: Vec<_> = estimates.iter().map(|e| e.date).collect();
        let mut sorted = dates.clone();
        sorted.sort();
        assert_eq!(dates, sorted);
    }

    #[test]
    fn same_seed_is_deterministic() {
        let counts: Vec<u32> = (0..30).map(|t| 5 + t as u32).collect();
        let s = series(counts);
        let a = estimate(&s, 3.96, 4.75, &config()).unwrap();
        let b = estimate(&s, 3.96, 4.75, &config()).unwrap();
        for (x, y) in a.iter().zip(&b) {
            assert_eq!(x.r, y.r);
        }
    }

    #[test]
    fn short_series_yields_nothing() {
        let s = series(vec![3, 4, 5]);
        assert!(estimate(&s, 4.7, 2.9, &config()).unwrap().is_empty());
    }
}
