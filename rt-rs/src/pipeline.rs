use chrono::Days;
use rayon::prelude::*;
use tracing::{info, warn};

use crate::bayes;
use crate::config::AnalysisConfig;
use crate::error::{Error, Result};
use crate::generation::GenerationTime;
use crate::output::{BayesRow, GrowthRow, RenewalRow, RunOutput, SkippedRegion};
use crate::records::CaseRecord;
use crate::renewal;
use crate::series::{self, DailySeries};
use crate::window;

struct Assumption {
    label: String,
    gt: GenerationTime,
    mean: f64,
    sd: f64,
}

/// Runs the full estimation pipeline over a set of case records.
///
/// Regions are independent, as are generation-time assumptions, so the
/// per-region work fans out across worker threads; the generation-time
/// distributions are built once and shared read-only. A region whose window
/// search fails is excluded from the growth table with a warning and listed
/// in [`RunOutput::skipped`]; its time-varying estimates still run.
pub fn run(records: &[CaseRecord], config: &AnalysisConfig) -> Result<RunOutput> {
    let by_region = series::build(records)?;

    let assumptions: Vec<Assumption> = config
        .generation_time
        .iter()
        .map(|p| {
            Ok(Assumption {
                label: p.label.clone(),
                gt: GenerationTime::discretize_auto(p.mean, p.sd)?,
                mean: p.mean,
                sd: p.sd,
            })
        })
        .collect::<Result<_>>()?;

    info!(
        regions = by_region.len(),
        assumptions = assumptions.len(),
        "estimating reproduction numbers"
    );

    let regional: Vec<RunOutput> = by_region
        .par_iter()
        .map(|(_, series)| estimate_region(series, &assumptions, config))
        .collect::<Result<_>>()?;

    let mut output = RunOutput::default();
    for mut region in regional {
        output.growth.append(&mut region.growth);
        output.renewal.append(&mut region.renewal);
        output.bayes.append(&mut region.bayes);
        output.skipped.append(&mut region.skipped);
    }
    Ok(output)
}

fn estimate_region(
    series: &DailySeries,
    assumptions: &[Assumption],
    config: &AnalysisConfig,
) -> Result<RunOutput> {
    // Trailing days are still filling in; estimates there are artifacts.
    let cutoff = series.end() - Days::new(config.reporting_lag as u64);
    let region = series.region();
    let mut output = RunOutput::default();

    for assumption in assumptions {
        match window::select(
            series,
            &assumption.gt,
            config.hard_end_date,
            config.min_window_length,
        ) {
            Ok(selected) => output.growth.push(GrowthRow {
                region: region.to_string(),
                assumption: assumption.label.clone(),
                r: selected.fit.r,
                lower: selected.fit.r_lower,
                upper: selected.fit.r_upper,
                r_squared: selected.fit.r_squared,
                rate: selected.fit.rate,
                window_start: series.date_at(selected.window.start),
                window_end: series.date_at(selected.window.end),
            }),
            Err(e @ (Error::NoValidWindow { .. } | Error::DegenerateWindow { .. })) => {
                warn!(region, assumption = %assumption.label, error = %e, "growth fit skipped");
                output.skipped.push(SkippedRegion {
                    region: region.to_string(),
                    assumption: assumption.label.clone(),
                    reason: e.to_string(),
                });
            }
            Err(e) => return Err(e),
        }

        for corrected in [false, true] {
            for est in renewal::estimate(series, &assumption.gt, corrected) {
                if est.date <= cutoff {
                    output.renewal.push(RenewalRow {
                        region: region.to_string(),
                        assumption: assumption.label.clone(),
                        date: est.date,
                        r: est.r,
                        lower: est.lower,
                        upper: est.upper,
                        corrected,
                    });
                }
            }
        }

        for est in bayes::estimate(series, assumption.mean, assumption.sd, &config.bayes)? {
            if est.date <= cutoff {
                output.bayes.push(BayesRow {
                    region: region.to_string(),
                    assumption: assumption.label.clone(),
                    date: est.date,
                    r: est.r,
                    lower: est.lower,
                    upper: est.upper,
                    early: est.early,
                });
            }
        }
    }
    Ok(output)
}
