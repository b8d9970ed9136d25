use chrono::NaiveDate;
use serde::Deserialize;

/// One named generation-time parameterization.
#[derive(Debug, Clone, Deserialize)]
pub struct GenerationTimeParams {
    pub label: String,
    pub mean: f64,
    pub sd: f64,
}

/// Settings for the Bayesian sliding-window estimator.
///
/// Serial-interval uncertainty is expressed relative to each assumption's
/// central mean/sd: samples are drawn from normals with the given spreads
/// and truncated to the half-width around the central value.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BayesConfig {
    /// Sliding window length in days.
    pub window: usize,
    /// Mean of the Gamma prior on R.
    pub prior_mean: f64,
    /// Standard deviation of the Gamma prior on R.
    pub prior_sd: f64,
    /// Sampling spread of the serial-interval mean.
    pub mean_sd: f64,
    /// Truncation half-width around the central serial-interval mean.
    pub mean_halfwidth: f64,
    /// Sampling spread of the serial-interval standard deviation.
    pub sd_sd: f64,
    /// Truncation half-width around the central standard deviation.
    pub sd_halfwidth: f64,
    /// Number of sampled serial-interval means (n1).
    pub n_mean_samples: usize,
    /// Number of sampled serial-interval standard deviations (n2).
    pub n_sd_samples: usize,
    /// Minimum cumulative cases before an estimate counts as trustworthy.
    pub min_cases: u32,
    pub seed: u64,
}

impl Default for BayesConfig {
    fn default() -> Self {
        Self {
            window: 7,
            prior_mean: 5.0,
            prior_sd: 5.0,
            mean_sd: 0.5,
            mean_halfwidth: 1.0,
            sd_sd: 0.5,
            sd_halfwidth: 1.0,
            n_mean_samples: 8,
            n_sd_samples: 8,
            min_cases: 12,
            seed: 8675309,
        }
    }
}

/// Recognized pipeline options, loadable from TOML.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Last date still considered unaffected by interventions; bounds the
    /// growth-window search.
    pub hard_end_date: NaiveDate,
    /// Soft minimum growth-window span in days.
    pub min_window_length: usize,
    /// Days trimmed from the end of the time-varying tables to avoid
    /// right-censoring artifacts.
    pub reporting_lag: usize,
    /// Unknown-location records tolerated before ingestion fails.
    pub unknown_location_limit: usize,
    /// Truncation used when a capped distribution is requested for display.
    pub display_truncation: usize,
    pub generation_time: Vec<GenerationTimeParams>,
    pub bayes: BayesConfig,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            hard_end_date: NaiveDate::from_ymd_opt(2020, 3, 21).unwrap(),
            min_window_length: 7,
            reporting_lag: 3,
            unknown_location_limit: 5,
            display_truncation: 40,
            generation_time: vec![
                GenerationTimeParams {
                    label: "A".to_string(),
                    mean: 3.96,
                    sd: 4.75,
                },
                GenerationTimeParams {
                    label: "B".to_string(),
                    mean: 4.70,
                    sd: 2.90,
                },
            ],
            bayes: BayesConfig::default(),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn defaults_from_empty_toml() {
        let config: AnalysisConfig = toml::from_str("").unwrap();
        assert_eq!(config.min_window_length, 7);
        assert_eq!(config.reporting_lag, 3);
        assert_eq!(config.unknown_location_limit, 5);
        assert_eq!(config.generation_time.len(), 2);
        assert_eq!(config.generation_time[0].label, "A");
        assert_eq!(config.bayes.window, 7);
    }

    #[test]
    fn overrides_apply() {
        let config: AnalysisConfig = toml::from_str(
            r#"
            hard_end_date = "2020-04-01"
            min_window_length = 10

            [[generation_time]]
            label = "C"
            mean = 5.0
            sd = 2.0

            [bayes]
            n_mean_samples = 3
            "#,
        )
        .unwrap();
        assert_eq!(
            config.hard_end_date,
            NaiveDate::from_ymd_opt(2020, 4, 1).unwrap()
        );
        assert_eq!(config.min_window_length, 10);
        assert_eq!(config.generation_time.len(), 1);
        assert_eq!(config.bayes.n_mean_samples, 3);
        // Unset bayes fields fall back to defaults.
        assert_eq!(config.bayes.window, 7);
    }
}
