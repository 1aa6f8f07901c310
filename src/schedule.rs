//! Per-team schedule pages from the ratings site.

use std::collections::HashMap;

use chrono::NaiveDate;
use rayon::prelude::*;
use scraper::{ElementRef, Html};
use serde::Serialize;

use crate::error::ScrapeError;
use crate::fetch::with_fetch_pool;
use crate::html::{element_text, selector};
use crate::http_client::PageSource;
use crate::names::Resolver;
use crate::normalize::{clean_opponent, strip_game_number};
use crate::table::{StatTable, TEAM_COLUMN};

pub const NOT_AVAILABLE: &str = "N/A";
const SKIPPED_RESULTS: &[&str] = &["Canceled", "Postponed"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Location {
    Home,
    Away,
    Neutral,
}

impl Location {
    /// `VS` marks a neutral site, `AT` a road game, anything else is home.
    pub fn classify(raw: &str) -> Self {
        if raw.contains("VS") {
            Self::Neutral
        } else if raw.contains("AT") {
            Self::Away
        } else {
            Self::Home
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Home => "Home",
            Self::Away => "Away",
            Self::Neutral => "Neutral",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GameRecord {
    pub team: String,
    pub date: String,
    pub opponent: String,
    pub location: Location,
    pub result: String,
    pub home_team: String,
    pub away_team: String,
    pub home_score: String,
    pub away_score: String,
    pub home_elo: Option<f64>,
    pub away_elo: Option<f64>,
}

impl GameRecord {
    pub fn home_runs(&self) -> Option<u32> {
        self.home_score.trim().parse().ok()
    }

    pub fn away_runs(&self) -> Option<u32> {
        self.away_score.trim().parse().ok()
    }

    /// Calendar date, given the season year. Schedule dates read like
    /// `"Feb 14 (FRI)"`.
    pub fn game_date(&self, season: u16) -> Option<NaiveDate> {
        let mut parts = self.date.split_whitespace();
        let month = parts.next()?;
        let day = parts.next()?;
        NaiveDate::parse_from_str(&format!("{month} {day} {season}"), "%b %d %Y").ok()
    }

    pub fn is_played(&self) -> bool {
        self.home_runs().is_some() && self.away_runs().is_some()
    }
}

#[derive(Debug, Default)]
pub struct ScheduleParse {
    pub games: Vec<GameRecord>,
    pub errors: Vec<String>,
}

#[derive(Debug, Default)]
pub struct ScheduleBatch {
    pub games: Vec<GameRecord>,
    pub failures: Vec<(String, String)>,
}

/// Reads every game entry of the first schedule list. Entries that fail to
/// parse are logged and skipped.
pub fn parse_schedule_html(team: &str, html: &str) -> Result<ScheduleParse, ScrapeError> {
    let document = Html::parse_document(html);
    let list_sel = selector("ul.team-schedule")?;
    let game_sel = selector("li.team-schedule")?;

    let mut out = ScheduleParse::default();
    let Some(list) = document.select(&list_sel).next() else {
        return Ok(out);
    };
    let parser = EntryParser::new()?;
    for (idx, entry) in list.select(&game_sel).enumerate() {
        match parser.parse(team, &entry) {
            Ok(game) => out.games.push(game),
            Err(err) => {
                log::warn!("{team}: skipping schedule entry {idx}: {err}");
                out.errors.push(format!("entry {idx}: {err}"));
            }
        }
    }
    Ok(out)
}

struct EntryParser {
    month: scraper::Selector,
    day: scraper::Selector,
    dow: scraper::Selector,
    opponent: scraper::Selector,
    location: scraper::Selector,
    result: scraper::Selector,
    box_score: scraper::Selector,
    tr: scraper::Selector,
    td: scraper::Selector,
}

impl EntryParser {
    fn new() -> Result<Self, ScrapeError> {
        Ok(Self {
            month: selector("span.team-schedule__game-date--month")?,
            day: selector("span.team-schedule__game-date--day")?,
            dow: selector("span.team-schedule__game-date--dow")?,
            opponent: selector(".team-schedule__opp-line-link")?,
            location: selector("div.team-schedule__location")?,
            result: selector("div.team-schedule__result")?,
            box_score: selector("table.team-schedule-bottom__box-score")?,
            tr: selector("tr")?,
            td: selector("td")?,
        })
    }

    fn parse(&self, team: &str, entry: &ElementRef) -> Result<GameRecord, ScrapeError> {
        let month = self.required_text(entry, &self.month, "month")?;
        let day = self.required_text(entry, &self.day, "day")?;
        let dow = self.required_text(entry, &self.dow, "day of week")?;
        let date = strip_game_number(&format!("{month} {day} ({dow})"));

        let opponent = self.text(entry, &self.opponent).unwrap_or_default();
        let location = Location::classify(&self.text(entry, &self.location).unwrap_or_default());
        let result = self
            .text(entry, &self.result)
            .unwrap_or_else(|| NOT_AVAILABLE.to_string());

        let mut home_team = NOT_AVAILABLE.to_string();
        let mut away_team = NOT_AVAILABLE.to_string();
        let mut home_score = NOT_AVAILABLE.to_string();
        let mut away_score = NOT_AVAILABLE.to_string();
        if let Some(table) = entry.select(&self.box_score).next() {
            let rows: Vec<ElementRef> = table.select(&self.tr).collect();
            if rows.len() >= 3 {
                let away: Vec<String> = rows[1].select(&self.td).map(|td| element_text(&td)).collect();
                let home: Vec<String> = rows[2].select(&self.td).map(|td| element_text(&td)).collect();
                let (away_name, away_runs) = box_score_line(&away)?;
                let (home_name, home_runs) = box_score_line(&home)?;
                away_team = away_name;
                away_score = away_runs;
                home_team = home_name;
                home_score = home_runs;
            }
        }

        Ok(GameRecord {
            team: team.to_string(),
            date,
            opponent: clean_opponent(&opponent),
            location,
            result,
            home_team,
            away_team,
            home_score,
            away_score,
            home_elo: None,
            away_elo: None,
        })
    }

    fn text(&self, entry: &ElementRef, sel: &scraper::Selector) -> Option<String> {
        entry.select(sel).next().map(|el| element_text(&el))
    }

    fn required_text(
        &self,
        entry: &ElementRef,
        sel: &scraper::Selector,
        what: &str,
    ) -> Result<String, ScrapeError> {
        self.text(entry, sel)
            .ok_or_else(|| ScrapeError::parse(format!("missing {what}")))
    }
}

/// Team name is the first cell, runs the third from the end (runs, hits,
/// errors close out a line score).
fn box_score_line(cells: &[String]) -> Result<(String, String), ScrapeError> {
    if cells.len() < 3 {
        return Err(ScrapeError::parse(format!(
            "box score line has {} cells",
            cells.len()
        )));
    }
    Ok((cells[0].clone(), cells[cells.len() - 3].clone()))
}

/// One team's schedule page. Transport failures propagate; bad entries are
/// skipped.
pub fn extract_schedule(
    source: &dyn PageSource,
    team: &str,
    url: &str,
) -> Result<Vec<GameRecord>, ScrapeError> {
    let html = source.fetch_page(url)?;
    let parsed = parse_schedule_html(team, &html)?;
    Ok(parsed.games)
}

/// Schedules for many teams on a bounded pool. `teams` holds
/// `(name, link)` pairs where a relative link is joined onto `base_url`.
/// A team whose page fails contributes no games and one failure entry.
pub fn extract_all(
    source: &dyn PageSource,
    base_url: &str,
    teams: &[(String, String)],
    parallelism: usize,
) -> ScheduleBatch {
    let results: Vec<(String, Result<Vec<GameRecord>, ScrapeError>)> =
        with_fetch_pool(parallelism, || {
            teams
                .par_iter()
                .map(|(team, link)| {
                    let url = team_url(base_url, link);
                    (team.clone(), extract_schedule(source, team, &url))
                })
                .collect()
        });

    let mut out = ScheduleBatch::default();
    for (team, result) in results {
        match result {
            Ok(games) => out.games.extend(games),
            Err(err) => {
                log::warn!("schedule for {team} failed: {err}");
                out.failures.push((team, err.to_string()));
            }
        }
    }
    log::info!(
        "loaded {} games for {}/{} teams",
        out.games.len(),
        teams.len() - out.failures.len(),
        teams.len()
    );
    out
}

fn team_url(base_url: &str, link: &str) -> String {
    if link.starts_with("http") {
        link.to_string()
    } else {
        format!("{}{}", base_url.trim_end_matches('/'), link)
    }
}

/// Drops canceled and postponed games, moves every team name into canonical
/// spelling, and attaches each side's rating from `ratings` (a normalized
/// table with `Team` and `ELO` columns) when given.
pub fn finalize_schedule(
    games: Vec<GameRecord>,
    resolver: &Resolver,
    ratings: Option<&StatTable>,
) -> Vec<GameRecord> {
    let elo = ratings.map(elo_lookup).unwrap_or_default();
    games
        .into_iter()
        .filter(|game| !SKIPPED_RESULTS.contains(&game.result.as_str()))
        .map(|mut game| {
            game.team = resolve_name(resolver, &game.team);
            game.opponent = resolve_name(resolver, &game.opponent);
            game.home_team = resolve_name(resolver, &game.home_team);
            game.away_team = resolve_name(resolver, &game.away_team);
            game.home_elo = elo.get(&game.home_team).copied();
            game.away_elo = elo.get(&game.away_team).copied();
            game
        })
        .collect()
}

/// Blank names and the `"N/A"` sentinel are not team names and stay as-is.
fn resolve_name(resolver: &Resolver, name: &str) -> String {
    if name.trim().is_empty() || name == NOT_AVAILABLE {
        return name.to_string();
    }
    resolver.resolve(name)
}

fn elo_lookup(table: &StatTable) -> HashMap<String, f64> {
    let (Some(team), Some(elo)) = (table.column_index(TEAM_COLUMN), table.column_index("ELO")) else {
        return HashMap::new();
    };
    table
        .rows
        .iter()
        .filter_map(|row| Some((row[team].as_str()?.to_string(), row[elo].as_f64()?)))
        .collect()
}
