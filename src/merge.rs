use std::collections::{HashMap, HashSet};

use crate::config::{DEFAULT_PYTHAG_EXPONENT, JoinPolicy};
use crate::table::{Cell, StatTable, TEAM_COLUMN, Vocabulary};

pub const MERGED_TABLE: &str = "Merged";

#[derive(Debug, Clone, Copy)]
pub struct MergeOptions {
    pub policy: JoinPolicy,
    pub pythag_exponent: f64,
}

impl Default for MergeOptions {
    fn default() -> Self {
        Self {
            policy: JoinPolicy::Inner,
            pythag_exponent: DEFAULT_PYTHAG_EXPONENT,
        }
    }
}

/// Joins normalized tables on `key`, then adds league-wide derived columns
/// and sorts by team.
///
/// Under [`JoinPolicy::Inner`] a team missing from any table is dropped
/// without error. Under [`JoinPolicy::Outer`] it is kept and the absent
/// columns read as `Missing`. A column name seen twice keeps its first
/// occurrence.
pub fn merge(tables: &[StatTable], key: &str, options: MergeOptions) -> StatTable {
    let mut iter = tables.iter().filter(|t| t.has_column(key));
    let Some(first) = iter.next() else {
        return StatTable::new(MERGED_TABLE, Vocabulary::Ncaa, vec![key.to_string()]);
    };

    let mut acc = first.clone();
    acc.name = MERGED_TABLE.to_string();
    for table in iter {
        acc = join_pair(&acc, table, key, options.policy);
        log::debug!("joined {} -> {} rows", table.name, acc.len());
    }

    add_league_fields(&mut acc, options.pythag_exponent);
    sort_by_column(&mut acc, key);
    log::info!("merged {} tables into {} rows", tables.len(), acc.len());
    acc
}

pub fn merge_teams(tables: &[StatTable], options: MergeOptions) -> StatTable {
    merge(tables, TEAM_COLUMN, options)
}

fn join_pair(left: &StatTable, right: &StatTable, key: &str, policy: JoinPolicy) -> StatTable {
    let (Some(left_key), Some(right_key)) = (left.column_index(key), right.column_index(key)) else {
        return left.clone();
    };

    // Right-side columns not already present, with their source index.
    let extra: Vec<(usize, String)> = right
        .columns
        .iter()
        .enumerate()
        .filter(|(_, c)| !left.has_column(c))
        .map(|(idx, c)| (idx, c.clone()))
        .collect();

    let mut right_rows: HashMap<String, &Vec<Cell>> = HashMap::new();
    for row in &right.rows {
        right_rows.entry(row[right_key].to_string()).or_insert(row);
    }

    let mut columns = left.columns.clone();
    columns.extend(extra.iter().map(|(_, c)| c.clone()));
    let mut out = StatTable::new(left.name.clone(), left.vocabulary, columns);

    let mut matched = HashSet::new();
    for row in &left.rows {
        let team = row[left_key].to_string();
        match right_rows.get(&team) {
            Some(other) => {
                matched.insert(team);
                let mut merged = row.clone();
                merged.extend(extra.iter().map(|(idx, _)| other[*idx].clone()));
                out.rows.push(merged);
            }
            None if policy == JoinPolicy::Outer => {
                let mut merged = row.clone();
                merged.extend(extra.iter().map(|_| Cell::Missing));
                out.rows.push(merged);
            }
            None => {}
        }
    }

    if policy == JoinPolicy::Outer {
        for row in &right.rows {
            let team = row[right_key].to_string();
            if !matched.insert(team.clone()) {
                continue;
            }
            let mut merged = vec![Cell::Missing; out.columns.len()];
            for (idx, column) in left.columns.iter().enumerate() {
                if let Some(src) = right.column_index(column) {
                    merged[idx] = row[src].clone();
                }
            }
            merged[left_key] = Cell::Text(team);
            for (offset, (src, _)) in extra.iter().enumerate() {
                merged[left.columns.len() + offset] = row[*src].clone();
            }
            out.rows.push(merged);
        }
    }
    out
}

/// `OPS = SLG + OBP` and `PYTHAG = round3(RS^p / (RS^p + RA^p))`, each only
/// when its input columns exist.
pub fn add_league_fields(table: &mut StatTable, exponent: f64) {
    if let (Some(slg), Some(obp)) = (table.column_index("SLG"), table.column_index("OBP")) {
        let values = table
            .rows
            .iter()
            .map(|row| match (row[slg].as_f64(), row[obp].as_f64()) {
                (Some(s), Some(o)) => Cell::Float(s + o),
                _ => Cell::Missing,
            })
            .collect();
        table.set_column("OPS", values);
    }

    if let (Some(rs), Some(ra)) = (table.column_index("RS"), table.column_index("RA")) {
        let values = table
            .rows
            .iter()
            .map(|row| match (row[rs].as_f64(), row[ra].as_f64()) {
                (Some(scored), Some(allowed)) => Cell::Float(pythag(scored, allowed, exponent)),
                _ => Cell::Missing,
            })
            .collect();
        table.set_column("PYTHAG", values);
    }
}

/// Pythagorean win expectation rounded to three decimals. NaN when both run
/// totals are zero.
pub fn pythag(runs_scored: f64, runs_allowed: f64, exponent: f64) -> f64 {
    let rs = runs_scored.powf(exponent);
    let ra = runs_allowed.powf(exponent);
    let denom = rs + ra;
    if denom == 0.0 {
        return f64::NAN;
    }
    round_to(rs / denom, 3)
}

/// Rounds to `places` decimals, ties to even (`0.125` -> `0.12`).
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round_ties_even() / factor
}

fn sort_by_column(table: &mut StatTable, column: &str) {
    let Some(idx) = table.column_index(column) else {
        return;
    };
    table
        .rows
        .sort_by(|a, b| a[idx].to_string().cmp(&b[idx].to_string()));
}
