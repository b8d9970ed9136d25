use std::fs;
use std::path::Path;

use anyhow::Context;
use cfa_rt::{AnalysisConfig, GenerationTime, RunOutput};
use serde::Serialize;
use serde_json::json;
use tracing::info;

/// One lag of a generation-time distribution, capped for display.
#[derive(Debug, Serialize)]
struct GenerationTimeRow {
    assumption: String,
    lag: usize,
    weight: f64,
}

/// Writes the three result tables, the capped generation-time
/// distributions, and a run manifest into `dir`.
pub fn write(dir: &Path, output: &RunOutput, config: &AnalysisConfig) -> anyhow::Result<()> {
    fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;

    write_table(&dir.join("growth.csv"), &output.growth)?;
    write_table(&dir.join("renewal.csv"), &output.renewal)?;
    write_table(&dir.join("bayes.csv"), &output.bayes)?;

    let mut gt_rows = Vec::new();
    for params in &config.generation_time {
        let gt = GenerationTime::discretize(params.mean, params.sd, config.display_truncation)?;
        gt_rows.extend(gt.weights().iter().enumerate().map(|(i, &w)| {
            GenerationTimeRow {
                assumption: params.label.clone(),
                lag: i + 1,
                weight: w,
            }
        }));
    }
    write_table(&dir.join("generation_time.csv"), &gt_rows)?;

    let manifest = json!({
        "tables": {
            "growth": output.growth.len(),
            "renewal": output.renewal.len(),
            "bayes": output.bayes.len(),
        },
        "skipped": &output.skipped,
        "hard_end_date": config.hard_end_date,
        "min_window_length": config.min_window_length,
        "reporting_lag": config.reporting_lag,
        "generation_time": config.generation_time.iter()
            .map(|p| json!({"label": &p.label, "mean": p.mean, "sd": p.sd}))
            .collect::<Vec<_>>(),
    });
    fs::write(
        dir.join("manifest.json"),
        serde_json::to_string_pretty(&manifest)?,
    )?;

    info!(dir = %dir.display(), "results written");
    Ok(())
}

fn write_table<T: Serialize>(path: &Path, rows: &[T]) -> anyhow::Result<()> {
    let mut writer =
        csv::Writer::from_path(path).with_context(|| format!("creating {}", path.display()))?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use cfa_rt::output::GrowthRow;
    use chrono::NaiveDate;

    #[test]
    fn writes_tables_and_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let output = RunOutput {
            growth: vec![GrowthRow {
                region: "BW".to_string(),
                assumption: "A".to_string(),
                r: 2.4,
                lower: 2.1,
                upper: 2.8,
                r_squared: 0.99,
                rate: 0.21,
                window_start: NaiveDate::from_ymd_opt(2020, 3, 3).unwrap(),
                window_end: NaiveDate::from_ymd_opt(2020, 3, 18).unwrap(),
            }],
            ..RunOutput::default()
        };
        write(dir.path(), &output, &AnalysisConfig::default()).unwrap();

        let growth = fs::read_to_string(dir.path().join("growth.csv")).unwrap();
        assert!(growth.starts_with("region,assumption,"));
        assert!(growth.contains("BW,A,2.4,"));

        // Two assumptions, each capped at the display truncation.
        let gt = fs::read_to_string(dir.path().join("generation_time.csv")).unwrap();
        assert_eq!(gt.lines().count(), 1 + 2 * 40);

        let manifest: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(dir.path().join("manifest.json")).unwrap())
                .unwrap();
        assert_eq!(manifest["tables"]["growth"], 1);
        assert_eq!(manifest["tables"]["renewal"], 0);
    }
}
