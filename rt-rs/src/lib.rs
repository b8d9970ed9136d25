//! Estimation of time-varying effective reproduction numbers from regional
//! case-report line lists.
//!
//! The pipeline reshapes irregular (region, date, count) records into dense
//! daily series, then runs three estimator families against each region and
//! each generation-time assumption:
//!
//! - an exponential-growth fit over a heuristically selected pre-intervention
//!   window ([`window`] + [`growth`]),
//! - a renewal-equation estimator with an optional right-censoring
//!   correction ([`renewal`]),
//! - a sliding-window Bayesian (Gamma-Poisson) estimator with uncertainty in
//!   the serial interval itself ([`bayes`]).
//!
//! [`pipeline::run`] ties these together and produces the three result
//! tables; everything upstream (data acquisition) and downstream (reports,
//! plots) lives with the caller.

pub mod bayes;
pub mod config;
pub mod error;
pub mod generation;
pub mod growth;
pub mod output;
pub mod pipeline;
pub mod records;
pub mod renewal;
pub mod series;
pub mod window;

pub use config::AnalysisConfig;
pub use error::{Error, Result};
pub use generation::GenerationTime;
pub use output::RunOutput;
