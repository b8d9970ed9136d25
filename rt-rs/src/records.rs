use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{Error, Result};

/// Region label the provider assigns to reports it could not geolocate.
pub const UNKNOWN_REGION: &str = "unknown";

/// A line-list row as delivered by the data provider, before clamping.
#[derive(Debug, Clone, Deserialize)]
pub struct RawCaseRecord {
    pub region: String,
    pub date: NaiveDate,
    pub cases: i64,
    pub deaths: i64,
}

/// A single reported observation, immutable once ingested.
#[derive(Debug, Clone, Serialize)]
pub struct CaseRecord {
    pub region: String,
    pub date: NaiveDate,
    pub cases: u32,
    pub deaths: u32,
}

/// Turns raw provider rows into [`CaseRecord`]s.
///
/// Negative case and death counts are clamped to zero (the feed back-posts
/// corrections as negative rows). Unknown-location rows are dropped with a
/// warning as long as there are at most `unknown_limit` of them; above that
/// the feed is considered unreliable and ingestion fails.
pub fn ingest(raw: Vec<RawCaseRecord>, unknown_limit: usize) -> Result<Vec<CaseRecord>> {
    let unknown = raw
        .iter()
        .filter(|r| r.region.eq_ignore_ascii_case(UNKNOWN_REGION))
        .count();
    if unknown > unknown_limit {
        return Err(Error::TooManyUnknownLocations {
            count: unknown,
            limit: unknown_limit,
        });
    }
    if unknown > 0 {
        warn!(count = unknown, "dropping unknown-location records");
    }

    Ok(raw
        .into_iter()
        .filter(|r| !r.region.eq_ignore_ascii_case(UNKNOWN_REGION))
        .map(|r| CaseRecord {
            region: r.region,
            date: r.date,
            cases: r.cases.max(0) as u32,
            deaths: r.deaths.max(0) as u32,
        })
        .collect())
}
