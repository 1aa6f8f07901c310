use std::collections::{BTreeMap, HashMap, HashSet};

use crate::names::{self, Resolver};
use crate::table::{Cell, StatTable, TEAM_COLUMN, Vocabulary};
use crate::transform::{EvalError, NamedTransform, TextCleanup};

/// Cleans a raw table according to `transform`, resolving ratings-site team
/// names through the process-wide alias table.
pub fn normalize(table: &StatTable, transform: &NamedTransform) -> StatTable {
    let resolver = Resolver::new(names::name_map());
    normalize_with(table, transform, &resolver)
}

/// Steps, in order: renames onto the team key, team-key cleanup and
/// first-wins dedup, numeric coercion, text cleanup, derived columns, the
/// remaining renames, drops. Running it again over its own output changes
/// nothing.
pub fn normalize_with(table: &StatTable, transform: &NamedTransform, resolver: &Resolver) -> StatTable {
    let mut out = table.clone();
    for (from, _) in transform.rename.iter().filter(|(_, to)| *to == TEAM_COLUMN) {
        out.rename_column(from, TEAM_COLUMN);
    }
    clean_team_column(&mut out, resolver);
    if out.has_column(TEAM_COLUMN) {
        out = dedup_first_wins(&out, TEAM_COLUMN);
    }
    coerce_numeric(&mut out, transform);
    for (column, cleanup) in &transform.text_cleanup {
        clean_text_column(&mut out, column, *cleanup);
    }
    apply_derived(&mut out, transform);
    for (from, to) in &transform.rename {
        out.rename_column(from, to);
    }
    for column in &transform.drop {
        out.drop_column(column);
    }
    out
}

fn clean_team_column(table: &mut StatTable, resolver: &Resolver) {
    let Some(idx) = table.column_index(TEAM_COLUMN) else {
        return;
    };
    let vocabulary = table.vocabulary;
    for row in &mut table.rows {
        let raw = row[idx].to_string();
        let name = match vocabulary {
            Vocabulary::Ncaa => raw.trim().to_string(),
            Vocabulary::Ratings => resolver.resolve(&raw),
        };
        row[idx] = Cell::Text(name);
    }
    // Once resolved, every name is in canonical spelling.
    table.vocabulary = Vocabulary::Ncaa;
}

/// Keeps the first row seen for each value of `column`.
pub fn dedup_first_wins(table: &StatTable, column: &str) -> StatTable {
    let mut out = StatTable::new(table.name.clone(), table.vocabulary, table.columns.clone());
    let Some(idx) = table.column_index(column) else {
        out.rows = table.rows.clone();
        return out;
    };
    let mut seen = HashSet::new();
    for row in &table.rows {
        let key = row[idx].to_string();
        if seen.insert(key.clone()) {
            out.rows.push(row.clone());
        } else {
            log::debug!("{}: dropping duplicate row for {key:?}", table.name);
        }
    }
    out
}

/// Among rows sharing a `group_col` value, keeps only the one with the
/// smallest `min_col`. Rows with a unique group pass through untouched and
/// come first, in their original order; the kept duplicates follow, ordered
/// by group value.
pub fn clean_duplicates(table: &StatTable, group_col: &str, min_col: &str) -> StatTable {
    let mut out = StatTable::new(table.name.clone(), table.vocabulary, table.columns.clone());
    let (Some(group_idx), Some(min_idx)) = (table.column_index(group_col), table.column_index(min_col))
    else {
        out.rows = table.rows.clone();
        return out;
    };

    let mut counts: HashMap<String, usize> = HashMap::new();
    for row in &table.rows {
        *counts.entry(row[group_idx].to_string()).or_insert(0) += 1;
    }

    let mut best: BTreeMap<String, &Vec<Cell>> = BTreeMap::new();
    for row in &table.rows {
        let key = row[group_idx].to_string();
        if counts.get(&key).copied().unwrap_or(0) < 2 {
            out.rows.push(row.clone());
            continue;
        }
        let candidate = row[min_idx].as_f64();
        match best.get(&key) {
            None => {
                best.insert(key, row);
            }
            Some(current) => {
                let current_val = current[min_idx].as_f64();
                let better = match (candidate, current_val) {
                    (Some(c), Some(v)) => c < v,
                    (Some(_), None) => true,
                    _ => false,
                };
                if better {
                    best.insert(key, row);
                }
            }
        }
    }
    out.rows.extend(best.into_values().cloned());
    out
}

/// Strips page artefacts around a number: thousands separators and the
/// trailing `/` some game logs put on counting stats.
pub fn clean_numeric_text(raw: &str) -> String {
    raw.trim().trim_end_matches('/').trim().replace(',', "")
}

pub fn parse_number(raw: &str) -> Option<Cell> {
    let cleaned = clean_numeric_text(raw);
    if cleaned.is_empty() {
        return None;
    }
    if let Ok(v) = cleaned.parse::<i64>() {
        return Some(Cell::Int(v));
    }
    match cleaned.parse::<f64>() {
        Ok(v) if v.is_finite() => Some(Cell::Float(v)),
        _ => None,
    }
}

fn coerce_cell(cell: &Cell) -> Option<Cell> {
    match cell {
        Cell::Int(_) | Cell::Float(_) => Some(cell.clone()),
        Cell::Text(raw) => parse_number(raw),
        Cell::Missing => None,
    }
}

/// A column counts as numeric when at least one of its cells parses. In a
/// numeric column unparsable cells become `Missing`, or 0 when the column
/// feeds a derived field. Columns where nothing parses stay text.
fn coerce_numeric(table: &mut StatTable, transform: &NamedTransform) {
    let zero_columns = transform.zero_fallback_columns();
    let text_columns: Vec<&str> = transform.text_cleanup.iter().map(|(c, _)| c.as_str()).collect();

    for idx in 0..table.columns.len() {
        let column = table.columns[idx].clone();
        if column == TEAM_COLUMN || text_columns.contains(&column.as_str()) {
            continue;
        }
        let zero_fallback = zero_columns.iter().any(|c| *c == column);
        let numeric = table.rows.iter().any(|row| coerce_cell(&row[idx]).is_some());
        if !numeric && !zero_fallback {
            continue;
        }
        for row in &mut table.rows {
            row[idx] = match coerce_cell(&row[idx]) {
                Some(cell) => cell,
                None if zero_fallback => Cell::Int(0),
                None => Cell::Missing,
            };
        }
    }
}

fn clean_text_column(table: &mut StatTable, column: &str, cleanup: TextCleanup) {
    let Some(idx) = table.column_index(column) else {
        return;
    };
    for row in &mut table.rows {
        let raw = row[idx].to_string();
        let cleaned = match cleanup {
            TextCleanup::DoubleheaderSuffix => strip_game_number(&raw),
            TextCleanup::OpponentName => clean_opponent(&raw),
        };
        row[idx] = Cell::Text(cleaned);
    }
}

fn apply_derived(table: &mut StatTable, transform: &NamedTransform) {
    for (column, expr) in &transform.derive {
        let inputs = expr.columns();
        if let Some(absent) = inputs.iter().find(|c| !table.has_column(c)) {
            log::debug!("{}: skipping {column}, no {absent} column", table.name);
            continue;
        }
        let indices: HashMap<&str, usize> = inputs
            .iter()
            .filter_map(|c| table.column_index(c).map(|idx| (*c, idx)))
            .collect();

        let mut values = Vec::with_capacity(table.rows.len());
        for row in &table.rows {
            let lookup = |name: &str| indices.get(name).and_then(|idx| row[*idx].as_f64());
            let value = match expr.eval(&lookup) {
                Ok(v) => Cell::Float(v),
                Err(EvalError::MissingValue) => Cell::Missing,
                Err(EvalError::DivideByZero) => {
                    log::warn!("{}: {column} divides by zero for {:?}", table.name, row_label(table, row));
                    Cell::Float(f64::NAN)
                }
            };
            values.push(value);
        }
        table.set_column(column, values);
    }
}

fn row_label(table: &StatTable, row: &[Cell]) -> String {
    table
        .column_index(TEAM_COLUMN)
        .and_then(|idx| row.get(idx))
        .map(Cell::to_string)
        .unwrap_or_default()
}

/// Removes a trailing `(n)` game-number marker: `"02/14/2025(2)"` -> `"02/14/2025"`.
pub fn strip_game_number(raw: &str) -> String {
    let trimmed = raw.trim();
    if let Some(body) = trimmed.strip_suffix(')')
        && let Some(open) = body.rfind('(')
    {
        let inner = &body[open + 1..];
        if !inner.is_empty() && inner.chars().all(|c| c.is_ascii_digit()) {
            return body[..open].trim().to_string();
        }
    }
    trimmed.to_string()
}

/// Drops a leading `#n ` ranking, a leading `@`, and a trailing neutral-site
/// `@ location`.
pub fn clean_opponent(raw: &str) -> String {
    let mut name = strip_rank_prefix(raw.trim());
    if let Some(rest) = name.strip_prefix('@') {
        name = rest;
    }
    let name = match neutral_site_start(name) {
        Some(idx) => &name[..idx],
        None => name,
    };
    name.trim().to_string()
}

/// `"#6 Arkansas"` -> `"Arkansas"`. Requires whitespace after the digits.
pub fn strip_rank_prefix(raw: &str) -> &str {
    let Some(rest) = raw.strip_prefix('#') else {
        return raw;
    };
    let digits = rest.len() - rest.trim_start_matches(|c: char| c.is_ascii_digit()).len();
    if digits == 0 {
        return raw;
    }
    let after = &rest[digits..];
    let stripped = after.trim_start();
    if stripped.len() == after.len() {
        return raw;
    }
    stripped
}

fn neutral_site_start(name: &str) -> Option<usize> {
    let at = name.find('@')?;
    let before = &name[..at];
    if before.ends_with(char::is_whitespace) {
        Some(before.trim_end().len())
    } else {
        None
    }
}
