use std::fs;
use std::path::Path;

use anyhow::Context;
use cfa_rt::records::RawCaseRecord;
use chrono::NaiveDate;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use tracing::{debug, info};

/// One line-list row as published by the feed. Dates arrive as strings and
/// are validated here; the deaths column is absent from some snapshots.
#[derive(Debug, Deserialize)]
struct FeedRow {
    region: String,
    date: String,
    cases: i64,
    #[serde(default)]
    deaths: i64,
}

/// Loads the raw line list from a local CSV path or an http(s) URL.
///
/// Downloads are cached under `cache_dir`, keyed by the SHA-256 of the URL,
/// so repeated runs against the same snapshot stay offline.
pub fn load(input: &str, cache_dir: &Path) -> anyhow::Result<Vec<RawCaseRecord>> {
    let raw = if input.starts_with("http://") || input.starts_with("https://") {
        fetch_cached(input, cache_dir)?
    } else {
        fs::read_to_string(input).with_context(|| format!("reading {input}"))?
    };
    parse(&raw)
}

fn fetch_cached(url: &str, cache_dir: &Path) -> anyhow::Result<String> {
    let digest = Sha256::digest(url.as_bytes());
    let cached = cache_dir.join(format!("{}.csv", hex::encode(&digest[..8])));
    if cached.exists() {
        debug!(path = %cached.display(), "using cached line list");
        return Ok(fs::read_to_string(&cached)?);
    }

    info!(url, "fetching line list");
    let mut response = ureq::get(url).call()?;
    let body = response.body_mut().read_to_string()?;
    fs::create_dir_all(cache_dir)?;
    fs::write(&cached, &body)
        .with_context(|| format!("caching {}", cached.display()))?;
    Ok(body)
}

fn parse(raw: &str) -> anyhow::Result<Vec<RawCaseRecord>> {
    let mut reader = csv::Reader::from_reader(raw.as_bytes());
    let mut records = Vec::new();
    for row in reader.deserialize::<FeedRow>() {
        let row = row?;
        let date = NaiveDate::parse_from_str(&row.date, "%Y-%m-%d").map_err(|_| {
            cfa_rt::Error::MalformedDate {
                value: row.date.clone(),
            }
        })?;
        records.push(RawCaseRecord {
            region: row.region,
            date,
            cases: row.cases,
            deaths: row.deaths,
        });
    }
    Ok(records)
}
