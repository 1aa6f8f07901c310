//! Per-game batting logs. The page needs a browser to render, so callers
//! hand over the rendered table markup; this module only cleans it.

use crate::error::ScrapeError;
use crate::html;
use crate::normalize::normalize;
use crate::table::{StatTable, Vocabulary};
use crate::transform::{GAME_LOG, game_log_transform};

pub fn game_log_from_html(team: &str, table_html: &str) -> Result<StatTable, ScrapeError> {
    let raw = html::parse_first_table(table_html)?.ok_or_else(|| ScrapeError::MissingTable {
        url: format!("{team} game log"),
    })?;
    let table = StatTable::from_raw(format!("{GAME_LOG}: {team}"), Vocabulary::Ncaa, raw.headers, raw.rows);
    Ok(normalize_game_log(&table))
}

/// Cleans dates and opponents, zero-fills counting stats, and adds `PA` and
/// `1B`.
pub fn normalize_game_log(table: &StatTable) -> StatTable {
    normalize(table, &game_log_transform())
}
