use chrono::NaiveDate;
use thiserror::Error;

/// Result type alias using [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the estimation pipeline.
///
/// The data-integrity and parameter variants abort a run; the per-window and
/// per-region variants are isolated by the pipeline so that other regions
/// still produce results.
#[derive(Debug, Error)]
pub enum Error {
    /// Two reports carry the same date for the same region.
    #[error("duplicate report date {date} for region {region}")]
    DuplicateDate { region: String, date: NaiveDate },

    /// A report date could not be parsed as a calendar date.
    #[error("malformed report date: {value:?}")]
    MalformedDate { value: String },

    /// More unassignable reports than the provider contract allows.
    #[error("{count} unknown-location records exceed the limit of {limit}")]
    TooManyUnknownLocations { count: usize, limit: usize },

    /// Generation-time mean or standard deviation is not positive.
    #[error("invalid generation time parameters: mean={mean}, sd={sd}")]
    InvalidParameters { mean: f64, sd: f64 },

    /// A growth window with fewer than two distinct non-zero counts; the
    /// growth rate is undefined on it.
    #[error("window {start}..{end} has fewer than two distinct non-zero counts")]
    DegenerateWindow { start: NaiveDate, end: NaiveDate },

    /// The window search produced no fittable candidate for the region.
    #[error("no valid growth window for region {region}")]
    NoValidWindow { region: String },
}
