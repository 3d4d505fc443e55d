use std::collections::BTreeSet;
use std::path::Path;

use anyhow::{Context, Result};
use rust_xlsxwriter::{Workbook, Worksheet};

use crate::analysis::{MatchAnalysis, comparison_table};

pub struct ExportReport {
    pub comparison_rows: usize,
    pub stat_rows: usize,
}

pub fn export_analysis(path: &Path, analysis: &MatchAnalysis) -> Result<ExportReport> {
    let comparison = comparison_rows(analysis);
    let stats = stat_rows(analysis);
    let verdict = verdict_rows(analysis);

    let mut workbook = Workbook::new();
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Comparison")?;
        write_rows(sheet, &comparison)?;
    }
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Stats")?;
        write_rows(sheet, &stats)?;
    }
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Verdict")?;
        write_rows(sheet, &verdict)?;
    }

    workbook
        .save(path)
        .with_context(|| format!("failed writing workbook to {}", path.display()))?;

    Ok(ExportReport {
        comparison_rows: comparison.len().saturating_sub(1),
        stat_rows: stats.len().saturating_sub(1),
    })
}

pub fn comparison_rows(analysis: &MatchAnalysis) -> Vec<Vec<String>> {
    let info = &analysis.match_info;
    let mut rows = vec![vec![
        "Metric".to_string(),
        info.home_team.clone(),
        info.away_team.clone(),
    ]];
    rows.extend(comparison_table(analysis).into_iter().map(|row| {
        vec![
            row.metric.to_string(),
            row.home.map(fmt_num).unwrap_or_default(),
            row.away.map(fmt_num).unwrap_or_default(),
        ]
    }));
    rows
}

/// Every stat either side reported, in name order.
pub fn stat_rows(analysis: &MatchAnalysis) -> Vec<Vec<String>> {
    let home = &analysis.stats.home;
    let away = &analysis.stats.away;
    let names: BTreeSet<&String> = home.values.keys().chain(away.values.keys()).collect();

    let mut rows = vec![vec![
        "Stat".to_string(),
        analysis.match_info.home_team.clone(),
        analysis.match_info.away_team.clone(),
    ]];
    for name in names {
        rows.push(vec![
            name.clone(),
            fmt_num(home.value(name)),
            fmt_num(away.value(name)),
        ]);
    }
    rows
}

fn verdict_rows(analysis: &MatchAnalysis) -> Vec<Vec<String>> {
    let info = &analysis.match_info;
    let cmp = &analysis.comparison;
    let dominance = if cmp.dominance.is_empty() {
        "none".to_string()
    } else {
        cmp.dominance.clone()
    };
    [
        ("Fixture", info.fixture_id.to_string()),
        ("Date", info.date.clone()),
        ("Venue", info.venue.clone()),
        ("Result", info.scoreline()),
        ("Better team", cmp.better_team.clone()),
        ("CPS difference", fmt_num(cmp.difference)),
        ("Dominance", dominance),
        ("Verdict", analysis.verdict.clone()),
    ]
    .into_iter()
    .map(|(k, v)| vec![k.to_string(), v])
    .collect()
}

fn fmt_num(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        format!("{value:.2}")
    }
}

fn write_rows(worksheet: &mut Worksheet, rows: &[Vec<String>]) -> Result<()> {
    for (row_idx, row) in rows.iter().enumerate() {
        for (col_idx, value) in row.iter().enumerate() {
            worksheet
                .write_string(row_idx as u32, col_idx as u16, value)
                .with_context(|| format!("write cell ({row_idx},{col_idx})"))?;
        }
    }
    Ok(())
}
