use chrono::NaiveDate;
use serde::Serialize;

/// One dated estimate as produced by a time-varying estimator.
#[derive(Debug, Clone, Serialize)]
pub struct TimeVaryingEstimate {
    pub date: NaiveDate,
    pub r: f64,
    pub lower: f64,
    pub upper: f64,
    /// Fewer cases than the configured minimum had accumulated by this
    /// date; the estimate stands but is low-confidence.
    pub early: bool,
}

/// Per-region best exponential-growth fit.
#[derive(Debug, Clone, Serialize)]
pub struct GrowthRow {
    pub region: String,
    pub assumption: String,
    pub r: f64,
    pub lower: f64,
    pub upper: f64,
    pub r_squared: f64,
    pub rate: f64,
    pub window_start: NaiveDate,
    pub window_end: NaiveDate,
}

/// Per-region per-date renewal-equation estimate.
#[derive(Debug, Clone, Serialize)]
pub struct RenewalRow {
    pub region: String,
    pub assumption: String,
    pub date: NaiveDate,
    pub r: f64,
    pub lower: f64,
    pub upper: f64,
    /// Whether the right-censoring correction was applied.
    pub corrected: bool,
}

/// Per-region per-date Bayesian sliding-window estimate.
#[derive(Debug, Clone, Serialize)]
pub struct BayesRow {
    pub region: String,
    pub assumption: String,
    pub date: NaiveDate,
    pub r: f64,
    pub lower: f64,
    pub upper: f64,
    pub early: bool,
}

/// A (region, assumption) pair excluded from the growth table.
#[derive(Debug, Clone, Serialize)]
pub struct SkippedRegion {
    pub region: String,
    pub assumption: String,
    pub reason: String,
}

/// The three result tables of one pipeline run.
#[derive(Debug, Default, Clone, Serialize)]
pub struct RunOutput {
    pub growth: Vec<GrowthRow>,
    pub renewal: Vec<RenewalRow>,
    pub bayes: Vec<BayesRow>,
    pub skipped: Vec<SkippedRegion>,
}
