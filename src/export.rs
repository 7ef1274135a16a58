use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use tracing::info;

use crate::parser::{CoinIssue, CoinSeries};

/// Distinct grades seen across a series, ascending; the export column set.
fn grade_columns(series: &CoinSeries) -> Vec<u32> {
    let mut grades: Vec<u32> = Vec::new();
    for issue in &series.issues {
        for price in &issue.prices {
            if !grades.contains(&price.grade) {
                grades.push(price.grade);
            }
        }
    }
    grades.sort_unstable();
    grades
}

fn issue_record(issue: &CoinIssue, grades: &[u32]) -> Vec<String> {
    let mut row = vec![
        issue.name.clone(),
        issue.variety.clone().unwrap_or_default(),
    ];
    for grade in grades {
        let cell = issue
            .prices
            .iter()
            .find(|p| p.grade == *grade)
            .map(|p| p.price.to_string())
            .unwrap_or_default();
        row.push(cell);
    }
    row
}

/// Render one series as CSV: header row (Year, Variety, one column per
/// grade), then one row per issue with blank cells where an issue has no
/// price at that grade.
pub fn to_csv(series: &CoinSeries) -> Result<String> {
    let grades = grade_columns(series);

    let mut writer = csv::Writer::from_writer(Vec::new());
    let mut header = vec!["Year".to_string(), "Variety".to_string()];
    header.extend(grades.iter().map(u32::to_string));
    writer.write_record(&header)?;

    for issue in &series.issues {
        writer.write_record(issue_record(issue, &grades))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| anyhow!("flushing csv writer: {e}"))?;
    String::from_utf8(bytes).context("csv output was not utf-8")
}

/// Write one CSV per series under `exports/<week-start>/`.
pub fn save_exports(
    data_dir: &Path,
    week_key: &str,
    all: &[CoinSeries],
) -> Result<Vec<PathBuf>> {
    let dir = data_dir.join("exports").join(week_key);
    fs::create_dir_all(&dir).with_context(|| format!("creating {}", dir.display()))?;

    let mut written = Vec::with_capacity(all.len());
    for series in all {
        let path = dir.join(format!("{}.csv", series.name));
        fs::write(&path, to_csv(series)?)
            .with_context(|| format!("writing {}", path.display()))?;
        written.push(path);
    }

    info!(count = written.len(), week = week_key, "exports saved");
    Ok(written)
}
