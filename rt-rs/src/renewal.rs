use statrs::distribution::{ContinuousCDF, Gamma};

use crate::generation::GenerationTime;
use crate::output::TimeVaryingEstimate;
use crate::series::DailySeries;

/// Total infectiousness bearing on day `t`: past incidence weighted by the
/// generation-time distribution.
pub(crate) fn total_infectiousness(counts: &[u32], t: usize, gt: &GenerationTime) -> f64 {
    let mut lambda = 0.0;
    for lag in 1..=usize::min(t, gt.support()) {
        lambda += counts[t - lag] as f64 * gt.weight(lag);
    }
    lambda
}

/// Time-varying renewal-equation estimate of R, one value per day.
///
/// R(t) = cases(t) / sum_{k>=1} cases(t-k) * p(k). Days before any trailing
/// history exists, and days whose denominator is zero, produce no estimate.
///
/// With `correct` set, each estimate is divided by the generation-time mass
/// still observable before the series ends, inflating R near the present to
/// compensate for secondary cases not yet reported. Corrected values differ
/// noticeably from uncorrected ones over the final days and must be labeled
/// as such downstream.
pub fn estimate(
    series: &DailySeries,
    gt: &GenerationTime,
    correct: bool,
) -> Vec<TimeVaryingEstimate> {
    let counts = series.counts();
    let horizon = counts.len() - 1;
    let mut estimates = Vec::new();

    for t in 1..counts.len() {
        let lambda = total_infectiousness(counts, t, gt);
        if lambda <= 0.0 {
            continue;
        }
        let (numerator_lower, numerator_upper) = poisson_bounds(counts[t]);
        let mut r = counts[t] as f64 / lambda;
        let mut lower = numerator_lower / lambda;
        let mut upper = numerator_upper / lambda;

        if correct {
            let observable = gt.cumulative(horizon - t);
            if observable <= 0.0 {
                continue;
            }
            r /= observable;
            lower /= observable;
            upper /= observable;
        }

        estimates.push(TimeVaryingEstimate {
            date: series.date_at(t),
            r,
            lower,
            upper,
            early: false,
        });
    }
    estimates
}

/// Exact two-sided 95% Poisson bounds on an observed count, through the
/// gamma quantile link.
fn poisson_bounds(count: u32) -> (f64, f64) {
    let lower = if count == 0 {
        0.0
    } else {
        Gamma::new(count as f64, 1.0)
            .map(|g| g.inverse_cdf(0.025))
            .unwrap_or(0.0)
    };
    let upper = Gamma::new(count as f64 + 1.0, 1.0)
        .map(|g| g.inverse_cdf(0.975))
        .unwrap_or(f64::INFINITY);
    (lower, upper)
}
