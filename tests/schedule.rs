use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use chrono::NaiveDate;

use cbb_stats::error::ScrapeError;
use cbb_stats::http_client::PageSource;
use cbb_stats::names::{NameMap, Resolver};
use cbb_stats::schedule::{
    GameRecord, Location, NOT_AVAILABLE, extract_all, extract_schedule, finalize_schedule,
    parse_schedule_html,
};
use cbb_stats::table::{Cell, StatTable, Vocabulary};

fn read_fixture(name: &str) -> String {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    fs::read_to_string(path).expect("fixture file should be readable")
}

struct MapSource(HashMap<String, String>);

impl PageSource for MapSource {
    fn fetch_page(&self, url: &str) -> Result<String, ScrapeError> {
        self.0
            .get(url)
            .cloned()
            .ok_or_else(|| ScrapeError::transport(url, "connection refused"))
    }
}

#[test]
fn location_tokens_classify() {
    assert_eq!(Location::classify("VS (Arlington, TX)"), Location::Neutral);
    assert_eq!(Location::classify("AT"), Location::Away);
    assert_eq!(Location::classify("HOME"), Location::Home);
    assert_eq!(Location::classify(""), Location::Home);
}

#[test]
fn schedule_fixture_parses_with_bad_entry_skipped() {
    let parsed = parse_schedule_html("Arkansas", &read_fixture("schedule_arkansas.html"))
        .expect("schedule should parse");
    assert_eq!(parsed.games.len(), 4, "entry without a date is skipped");
    assert_eq!(parsed.errors.len(), 1);

    let first = &parsed.games[0];
    assert_eq!(first.team, "Arkansas");
    assert_eq!(first.date, "FEB 14 (FRI)");
    assert_eq!(first.opponent, "Southern Miss");
    assert_eq!(first.location, Location::Home);
    assert_eq!(first.result, "W 5-3");
    assert_eq!(first.away_team, "Southern Miss");
    assert_eq!(first.home_team, "Arkansas");
    assert_eq!(first.away_score, "3");
    assert_eq!(first.home_score, "5");
    assert_eq!(first.home_runs(), Some(5));
    assert!(first.is_played());
    assert_eq!(
        first.game_date(2025),
        NaiveDate::from_ymd_opt(2025, 2, 14)
    );
}

#[test]
fn short_box_score_defaults_to_sentinel() {
    let parsed = parse_schedule_html("Arkansas", &read_fixture("schedule_arkansas.html"))
        .expect("schedule should parse");
    let neutral = &parsed.games[1];
    assert_eq!(neutral.location, Location::Neutral);
    assert_eq!(neutral.home_team, NOT_AVAILABLE);
    assert_eq!(neutral.away_score, NOT_AVAILABLE);
    assert_eq!(neutral.home_runs(), None);
    assert!(!neutral.is_played());

    let canceled = &parsed.games[2];
    assert_eq!(canceled.location, Location::Away);
    assert_eq!(canceled.result, "Canceled");
}

#[test]
fn page_without_schedule_list_is_empty() {
    let parsed = parse_schedule_html("Arkansas", "<html><body></body></html>").expect("parse");
    assert!(parsed.games.is_empty());
    assert!(parsed.errors.is_empty());
}

#[test]
fn finalize_drops_canceled_resolves_names_and_attaches_elo() {
    let parsed = parse_schedule_html("Arkansas", &read_fixture("schedule_arkansas.html"))
        .expect("schedule should parse");
    let map = NameMap::bundled().expect("aliases");
    let resolver = Resolver::new(&map);
    let elo = StatTable {
        name: "ELO".to_string(),
        vocabulary: Vocabulary::Ncaa,
        columns: vec!["Team".to_string(), "ELO".to_string()],
        rows: vec![
            vec![Cell::text("Arkansas"), Cell::Float(1712.4)],
            vec![Cell::text("Southern Miss."), Cell::Float(1600.5)],
            vec![Cell::text("DBU"), Cell::Int(1580)],
        ],
    };

    let games = finalize_schedule(parsed.games, &resolver, Some(&elo));
    assert_eq!(games.len(), 3);
    assert!(games.iter().all(|g| g.result != "Canceled"));

    assert_eq!(games[0].opponent, "Southern Miss.");
    assert_eq!(games[0].away_team, "Southern Miss.");
    assert_eq!(games[0].home_elo, Some(1712.4));
    assert_eq!(games[0].away_elo, Some(1600.5));

    assert_eq!(games[1].opponent, "NC State");
    assert_eq!(games[1].home_team, NOT_AVAILABLE);
    assert_eq!(games[1].home_elo, None);

    assert_eq!(games[2].opponent, "DBU");
    assert_eq!(games[2].home_team, "DBU");
    assert_eq!(games[2].home_elo, Some(1580.0));
}

#[test]
fn extract_all_isolates_team_failures() {
    let base = "https://ratings.test";
    let mut pages = HashMap::new();
    pages.insert(
        format!("{base}/baseball/2025/team-clubhouse?team=Arkansas"),
        read_fixture("schedule_arkansas.html"),
    );
    let source = MapSource(pages);
    let teams = vec![
        (
            "Arkansas".to_string(),
            "/baseball/2025/team-clubhouse?team=Arkansas".to_string(),
        ),
        (
            "Nowhere".to_string(),
            "/baseball/2025/team-clubhouse?team=Nowhere".to_string(),
        ),
    ];

    let batch = extract_all(&source, base, &teams, 2);
    assert_eq!(batch.games.len(), 4);
    assert!(batch.games.iter().all(|g: &GameRecord| g.team == "Arkansas"));
    assert_eq!(batch.failures.len(), 1);
    assert_eq!(batch.failures[0].0, "Nowhere");

    let err = extract_schedule(&source, "Nowhere", "https://ratings.test/missing").expect_err("fails");
    assert!(matches!(err, ScrapeError::Transport { .. }));
}

#[test]
fn blank_and_sentinel_names_are_not_resolved() {
    let map = NameMap::bundled().expect("aliases");
    let resolver = Resolver::with_known(&map, ["Arkansas".to_string()].into_iter().collect());
    let game = GameRecord {
        team: "Arkansas".to_string(),
        date: "MAR 01 (SAT)".to_string(),
        opponent: String::new(),
        location: Location::Home,
        result: "TBA".to_string(),
        home_team: NOT_AVAILABLE.to_string(),
        away_team: NOT_AVAILABLE.to_string(),
        home_score: NOT_AVAILABLE.to_string(),
        away_score: NOT_AVAILABLE.to_string(),
        home_elo: None,
        away_elo: None,
    };

    let games = finalize_schedule(vec![game], &resolver, None);
    assert_eq!(games.len(), 1);
    assert_eq!(games[0].opponent, "");
    assert_eq!(games[0].home_team, NOT_AVAILABLE);
    assert!(resolver.unresolved().is_empty());
}
