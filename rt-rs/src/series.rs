use std::collections::BTreeMap;

use chrono::{Days, NaiveDate};

use crate::error::{Error, Result};
use crate::records::CaseRecord;

/// Dense daily case counts for one region.
///
/// Holds one slot per calendar day from the first to the last observed report
/// date; days without a report are zero. Dates therefore increase by exactly
/// one day per index step.
#[derive(Debug, Clone)]
pub struct DailySeries {
    region: String,
    start: NaiveDate,
    counts: Vec<u32>,
}

impl DailySeries {
    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.start + Days::new(self.counts.len() as u64 - 1)
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn counts(&self) -> &[u32] {
        &self.counts
    }

    pub fn date_at(&self, index: usize) -> NaiveDate {
        self.start + Days::new(index as u64)
    }

    /// Index of `date` in the series, if it falls within the span.
    pub fn index_of(&self, date: NaiveDate) -> Option<usize> {
        let offset = (date - self.start).num_days();
        (offset >= 0 && (offset as usize) < self.counts.len()).then_some(offset as usize)
    }

    #[cfg(test)]
    pub fn from_counts(region: &str, start: NaiveDate, counts: Vec<u32>) -> Self {
        Self {
            region: region.to_string(),
            start,
            counts,
        }
    }
}

/// Reshapes irregular case records into one dense [`DailySeries`] per region.
///
/// Fails with [`Error::DuplicateDate`] when a region reports the same date
/// twice; the provider contract guarantees counts are already non-negative.
pub fn build(records: &[CaseRecord]) -> Result<BTreeMap<String, DailySeries>> {
    let mut by_region: BTreeMap<String, BTreeMap<NaiveDate, u32>> = BTreeMap::new();
    for record in records {
        let observed = by_region.entry(record.region.clone()).or_default();
        if observed.insert(record.date, record.cases).is_some() {
            return Err(Error::DuplicateDate {
                region: record.region.clone(),
                date: record.date,
            });
        }
    }

    let mut series = BTreeMap::new();
    for (region, observed) in by_region {
        let Some((&first, _)) = observed.first_key_value() else {
            continue;
        };
        let Some((&last, _)) = observed.last_key_value() else {
            continue;
        };
        let len = (last - first).num_days() as usize + 1;
        let mut counts = vec![0u32; len];
        for (date, cases) in &observed {
            counts[(*date - first).num_days() as usize] = *cases;
        }
        series.insert(
            region.clone(),
            DailySeries {
                region,
                start: first,
                counts,
            },
        );
    }
    Ok(series)
}
