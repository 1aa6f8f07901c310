use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use rust_xlsxwriter::{Workbook, Worksheet};
use serde::Serialize;

use crate::schedule::GameRecord;
use crate::table::{Cell, StatTable};

pub fn schedule_rows(games: &[GameRecord]) -> Vec<Vec<String>> {
    let mut rows = vec![vec![
        "Team".to_string(),
        "Date".to_string(),
        "Opponent".to_string(),
        "Location".to_string(),
        "Result".to_string(),
        "home_team".to_string(),
        "away_team".to_string(),
        "home_score".to_string(),
        "away_score".to_string(),
        "home_elo".to_string(),
        "away_elo".to_string(),
    ]];
    rows.extend(games.iter().map(schedule_row));
    rows
}

fn schedule_row(game: &GameRecord) -> Vec<String> {
    vec![
        game.team.clone(),
        game.date.clone(),
        game.opponent.clone(),
        game.location.label().to_string(),
        game.result.clone(),
        game.home_team.clone(),
        game.away_team.clone(),
        game.home_score.clone(),
        game.away_score.clone(),
        opt_to_string(game.home_elo),
        opt_to_string(game.away_elo),
    ]
}

/// Writes one worksheet per table. Numeric cells stay numeric.
pub fn export_tables_xlsx(path: &Path, tables: &[&StatTable]) -> Result<()> {
    let mut workbook = Workbook::new();
    for table in tables {
        let worksheet = workbook.add_worksheet();
        worksheet
            .set_name(sheet_name(&table.name))
            .with_context(|| format!("name sheet {}", table.name))?;
        write_table(worksheet, table)?;
    }
    workbook
        .save(path)
        .with_context(|| format!("save {}", path.display()))?;
    Ok(())
}

pub fn export_schedule_xlsx(path: &Path, games: &[GameRecord]) -> Result<()> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name("Schedule").context("name sheet")?;
    write_rows(worksheet, &schedule_rows(games))?;
    workbook
        .save(path)
        .with_context(|| format!("save {}", path.display()))?;
    Ok(())
}

#[derive(Serialize)]
struct Envelope<'a, T: Serialize> {
    generated_at: String,
    data: &'a T,
}

pub fn export_json<T: Serialize>(path: &Path, data: &T) -> Result<()> {
    let envelope = Envelope {
        generated_at: Utc::now().to_rfc3339(),
        data,
    };
    let json = serde_json::to_string_pretty(&envelope).context("serialize export")?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, json).with_context(|| format!("write {}", tmp.display()))?;
    fs::rename(&tmp, path).with_context(|| format!("swap {}", path.display()))?;
    Ok(())
}

fn write_table(worksheet: &mut Worksheet, table: &StatTable) -> Result<()> {
    for (col_idx, name) in table.columns.iter().enumerate() {
        worksheet
            .write_string(0, col_idx as u16, name)
            .with_context(|| format!("write header {name}"))?;
    }
    for (row_idx, row) in table.rows.iter().enumerate() {
        let r = row_idx as u32 + 1;
        for (col_idx, cell) in row.iter().enumerate() {
            let c = col_idx as u16;
            let written = match cell {
                Cell::Int(v) => worksheet.write_number(r, c, *v as f64),
                Cell::Float(v) if v.is_finite() => worksheet.write_number(r, c, *v),
                Cell::Text(v) => worksheet.write_string(r, c, v),
                Cell::Float(_) | Cell::Missing => continue,
            };
            written.with_context(|| format!("write cell ({r},{c})"))?;
        }
    }
    Ok(())
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

/// Excel sheet names: at most 31 chars, none of `[]:*?/\`.
fn sheet_name(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .map(|c| if "[]:*?/\\".contains(c) { '_' } else { c })
        .take(31)
        .collect();
    if cleaned.trim().is_empty() {
        "Sheet".to_string()
    } else {
        cleaned
    }
}

fn opt_to_string<T: std::fmt::Display>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::{opt_to_string, sheet_name};

    #[test]
    fn sheet_names_are_sanitized() {
        assert_eq!(sheet_name("Game Log: Arkansas"), "Game Log_ Arkansas");
        assert_eq!(sheet_name("a/b\\c[d]*e?"), "a_b_c_d__e_");
        assert_eq!(sheet_name("   "), "Sheet");
        let long = "Walks Allowed Per Nine Innings Extended";
        assert_eq!(sheet_name(long).chars().count(), 31);
        assert!(long.starts_with(&sheet_name(long)));
    }

    #[test]
    fn absent_values_export_blank() {
        assert_eq!(opt_to_string::<f64>(None), "");
        assert_eq!(opt_to_string(Some(1712.4)), "1712.4");
    }
}
