use chrono::NaiveDate;

use crate::error::{Error, Result};
use crate::generation::GenerationTime;
use crate::growth::{self, GrowthFit, TimeWindow};
use crate::series::DailySeries;

/// Candidate offsets tried on each side of the search grid.
const GRID: usize = 4;

/// The winning window of the grid search together with its fit.
#[derive(Debug, Clone)]
pub struct SelectedWindow {
    pub window: TimeWindow,
    pub fit: GrowthFit,
}

/// Searches a small grid of (start, end) windows and keeps the best fit.
///
/// Starts are the day after the last zero-count day at or before `hard_end`
/// plus the next three days; ends are `hard_end` and the three days before
/// it. Pairs with start >= end are discarded and degenerate fits skipped.
/// Windows shorter than `min_length` days are only eligible when no longer
/// candidate exists (a deliberate soft constraint); among the eligible set
/// the highest R-squared wins, ties going to the earliest start.
pub fn select(
    series: &DailySeries,
    gt: &GenerationTime,
    hard_end: NaiveDate,
    min_length: usize,
) -> Result<SelectedWindow> {
    let no_window = || Error::NoValidWindow {
        region: series.region().to_string(),
    };

    let hard_end_idx = match series.index_of(hard_end) {
        Some(idx) => idx,
        // The intervention cutoff lies beyond the data: use what is observed.
        None if hard_end > series.end() => series.len() - 1,
        None => return Err(no_window()),
    };

    // Earliest admissible start: the day after the last zero-count day
    // observed up to the hard end, or the series start if none.
    let base_start = series.counts()[..=hard_end_idx]
        .iter()
        .rposition(|&c| c == 0)
        .map(|i| i + 1)
        .unwrap_or(0);

    let mut candidates: Vec<SelectedWindow> = Vec::new();
    for start in base_start..base_start + GRID {
        for end in (hard_end_idx + 1).saturating_sub(GRID)..=hard_end_idx {
            if start >= end {
                continue;
            }
            let window = TimeWindow::new(start, end);
            match growth::fit(series, window, gt) {
                Ok(fit) => candidates.push(SelectedWindow { window, fit }),
                Err(Error::DegenerateWindow { .. }) => continue,
                Err(e) => return Err(e),
            }
        }
    }
    if candidates.is_empty() {
        return Err(no_window());
    }

    let longest = candidates
        .iter()
        .map(|c| c.window.length())
        .max()
        .unwrap_or(0);
    let threshold = if candidates.iter().any(|c| c.window.length() >= min_length) {
        min_length
    } else {
        longest
    };

    candidates
        .into_iter()
        .filter(|c| c.window.length() >= threshold)
        .reduce(|best, c| {
            if c.fit.r_squared > best.fit.r_squared {
                c
            } else {
                best
            }
        })
        .ok_or_else(no_window)
}

#[cfg(test)]
mod test {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2020, 3, d).unwrap()
    }

    fn series(counts: Vec<u32>) -> DailySeries {
        DailySeries::from_counts("BW", day(1), counts)
    }

    fn gt_a() -> GenerationTime {
        GenerationTime::discretize(3.96, 4.75, 40).unwrap()
    }

    #[test]
    fn selects_the_admissible_window() {
        // Days 1..=8, leading zeros, growth up to the hard end, noise after.
        let s = series(vec![0, 0, 3, 5, 9, 15, 0, 0]);
        let selected = select(&s, &gt_a(), day(6), 3).unwrap();
        assert_eq!(s.date_at(selected.window.start), day(3));
        assert_eq!(s.date_at(selected.window.end), day(6));
        assert!(selected.fit.rate > 0.0);
        assert!(selected.fit.r > 1.0);
    }

    #[test]
    fn never_returns_inverted_or_short_windows() {
        let s = series(vec![0, 2, 3, 6, 11, 19, 33, 58, 99, 170]);
        let selected = select(&s, &gt_a(), day(10), 5).unwrap();
        assert!(selected.window.start < selected.window.end);
        assert!(selected.window.length() >= 5);
    }

    #[test]
    fn relaxes_length_when_no_window_is_long_enough() {
        // Only five non-zero days before the hard end: longest span is 4.
        let s = series(vec![0, 2, 5, 9, 17, 30]);
        let selected = select(&s, &gt_a(), day(6), 7).unwrap();
        assert_eq!(selected.window.length(), 4);
    }

    #[test]
    fn fails_when_nothing_is_fittable() {
        let s = series(vec![0, 0, 0, 0, 0]);
        assert!(matches!(
            select(&s, &gt_a(), day(5), 3),
            Err(Error::NoValidWindow { .. })
        ));
    }

    #[test]
    fn fails_when_hard_end_precedes_series() {
        let s = series(vec![1, 2, 4]);
        let early = NaiveDate::from_ymd_opt(2020, 2, 1).unwrap();
        assert!(matches!(
            select(&s, &gt_a(), early, 3),
            Err(Error::NoValidWindow { .. })
        ));
    }

    #[test]
    fn hard_end_beyond_series_clamps_to_last_day() {
        let s = series(vec![0, 2, 3, 6, 11, 19, 33]);
        let selected = select(&s, &gt_a(), day(20), 3).unwrap();
        assert_eq!(selected.window.end, s.len() - 1);
    }
}
