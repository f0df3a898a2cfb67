use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use rust_xlsxwriter::{Workbook, Worksheet};
use serde::Serialize;
use tracing::info;

use crate::model::{PlayerRating, ScoredPlayer, TeamRating};
use crate::profile::Comparison;

/// Tables to write out. Empty tables are skipped.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ExportBundle {
    pub league: String,
    pub season: String,
    pub ratings: Vec<PlayerRating>,
    pub teams: Vec<TeamRating>,
    pub search: Vec<ScoredPlayer>,
    pub comparisons: Vec<Comparison>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportReport {
    pub sheets: Vec<String>,
    pub ratings: usize,
    pub teams: usize,
    pub search: usize,
    pub comparison_rows: usize,
}

pub fn ratings_rows(ratings: &[PlayerRating]) -> Vec<Vec<String>> {
    let mut rows = vec![vec![
        "Player".to_string(),
        "Team".to_string(),
        "Position".to_string(),
        "Minutes".to_string(),
        "Actions".to_string(),
        "VAEP/90".to_string(),
        "Offensive/90".to_string(),
        "Defensive/90".to_string(),
        "VAEP".to_string(),
        "Success/90".to_string(),
        "Fail/90".to_string(),
    ]];
    for r in ratings {
        rows.push(vec![
            r.player_name.clone(),
            r.team_name.clone(),
            r.most_common_position.clone(),
            r.minutes_played.to_string(),
            r.actions.to_string(),
            fmt_num(r.vaep_rating),
            fmt_num(r.offensive_rating),
            fmt_num(r.defensive_rating),
            fmt_num(r.vaep_value),
            fmt_num(r.success),
            fmt_num(r.fail),
        ]);
    }
    rows
}

pub fn team_rows(teams: &[TeamRating]) -> Vec<Vec<String>> {
    let mut rows = vec![vec![
        "Team".to_string(),
        "Players".to_string(),
        "VAEP".to_string(),
        "Offensive".to_string(),
        "Defensive".to_string(),
        "VAEP/90 (sum)".to_string(),
    ]];
    rows.extend(teams.iter().map(|t| {
        vec![
            t.team_name.clone(),
            t.players.to_string(),
            fmt_num(t.vaep_value),
            fmt_num(t.offensive_value),
            fmt_num(t.defensive_value),
            fmt_num(t.vaep_rating),
        ]
    }));
    rows
}

pub fn search_rows(scored: &[ScoredPlayer]) -> Vec<Vec<String>> {
    let mut rows = vec![vec![
        "Rank".to_string(),
        "Player".to_string(),
        "Team".to_string(),
        "Position".to_string(),
        "Minutes".to_string(),
        "Score".to_string(),
    ]];
    rows.extend(scored.iter().map(|s| {
        vec![
            s.rank.to_string(),
            s.player_name.clone(),
            s.team_name.clone(),
            s.position.clone(),
            s.minutes_played.to_string(),
            fmt_num(s.score),
        ]
    }));
    rows
}

/// Highlighted rows only; the full pool is in the JSON output.
pub fn comparison_rows(comparisons: &[Comparison]) -> Vec<Vec<String>> {
    let mut rows = vec![vec![
        "Position".to_string(),
        "Attribute".to_string(),
        "Player".to_string(),
        "Team".to_string(),
        "Value".to_string(),
        "Level".to_string(),
        "Rank".to_string(),
    ]];
    for c in comparisons {
        for p in &c.highlighted {
            rows.push(vec![
                c.position.label().to_string(),
                p.label.to_string(),
                p.player_name.clone(),
                p.team_name.clone(),
                fmt_num(p.value),
                p.level().label().to_string(),
                p.rank_display(),
            ]);
        }
    }
    rows
}

fn fmt_num(value: f64) -> String {
    if value.is_finite() {
        format!("{value:.4}")
    } else {
        String::new()
    }
}

pub fn export_xlsx(path: &Path, bundle: &ExportBundle) -> Result<ExportReport> {
    let mut report = ExportReport::default();
    let mut workbook = Workbook::new();

    let tables = [
        ("Ranking", ratings_rows(&bundle.ratings)),
        ("Teams", team_rows(&bundle.teams)),
        ("Search", search_rows(&bundle.search)),
        ("Profile", comparison_rows(&bundle.comparisons)),
    ];
    for (name, rows) in &tables {
        if rows.len() <= 1 {
            continue;
        }
        let sheet = workbook.add_worksheet();
        sheet.set_name(*name)?;
        write_rows(sheet, rows)?;
        report.sheets.push(name.to_string());
    }
    if report.sheets.is_empty() {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Empty")?;
        report.sheets.push("Empty".to_string());
    }

    workbook
        .save(path)
        .with_context(|| format!("failed writing workbook to {}", path.display()))?;

    report.ratings = bundle.ratings.len();
    report.teams = bundle.teams.len();
    report.search = bundle.search.len();
    report.comparison_rows = bundle.comparisons.iter().map(|c| c.highlighted.len()).sum();
    info!(path = %path.display(), sheets = report.sheets.len(), "workbook written");
    Ok(report)
}

pub fn export_json(path: &Path, bundle: &ExportBundle) -> Result<()> {
    let json = serde_json::to_string_pretty(bundle).context("serialize export")?;
    fs::write(path, json).with_context(|| format!("failed writing {}", path.display()))?;
    info!(path = %path.display(), "json written");
    Ok(())
}

/// Picks the format from the extension: `.json` or anything else as xlsx.
pub fn export(path: &Path, bundle: &ExportBundle) -> Result<()> {
    let is_json = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"));
    if is_json {
        export_json(path, bundle)
    } else {
        export_xlsx(path, bundle).map(|_| ())
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
