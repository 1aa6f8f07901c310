use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;

use cbb_stats::merge::{MergeOptions, merge_teams};
use cbb_stats::names::NameMap;
use cbb_stats::normalize::normalize;
use cbb_stats::schedule::parse_schedule_html;
use cbb_stats::table::{StatTable, Vocabulary};
use cbb_stats::transform::{BATTING_AVERAGE, EARNED_RUN_AVERAGE, RUNS, transform_for};

const TEAMS: usize = 300;

fn raw_table(name: &str, columns: &[&str], seed: usize) -> StatTable {
    let rows = (0..TEAMS)
        .map(|idx| {
            let mut row = vec![format!("Team {idx}")];
            row.extend(
                columns
                    .iter()
                    .enumerate()
                    .map(|(col, _)| format!("{}", (idx * 7 + col * 13 + seed) % 900 + 1)),
            );
            row
        })
        .collect();
    let mut headers = vec!["Team".to_string()];
    headers.extend(columns.iter().map(|c| c.to_string()));
    StatTable::from_raw(name, Vocabulary::Ncaa, headers, rows)
}

fn normalized_tables() -> Vec<StatTable> {
    let specs: [(&str, &[&str]); 3] = [
        (BATTING_AVERAGE, &["Rank", "G", "AB", "H", "BA"]),
        (RUNS, &["Rank", "G", "R"]),
        (EARNED_RUN_AVERAGE, &["Rank", "G", "IP", "R", "ER", "ERA"]),
    ];
    specs
        .iter()
        .enumerate()
        .filter_map(|(seed, (name, cols))| {
            let transform = transform_for(name)?;
            Some(normalize(&raw_table(name, cols, seed), &transform))
        })
        .collect()
}

fn bench_normalize_batting(c: &mut Criterion) {
    let raw = raw_table(BATTING_AVERAGE, &["Rank", "G", "AB", "H", "BA"], 3);
    let transform = transform_for(BATTING_AVERAGE).expect("batting transform");
    c.bench_function("normalize_batting", |b| {
        b.iter(|| {
            let table = normalize(black_box(&raw), &transform);
            black_box(table.len());
        })
    });
}

fn bench_merge_teams(c: &mut Criterion) {
    let tables = normalized_tables();
    c.bench_function("merge_teams", |b| {
        b.iter(|| {
            let merged = merge_teams(black_box(&tables), MergeOptions::default());
            black_box(merged.columns.len());
        })
    });
}

fn bench_resolve_names(c: &mut Criterion) {
    let map = NameMap::bundled().expect("bundled aliases");
    let names: Vec<String> = map
        .iter()
        .map(|(raw, _)| raw.to_string())
        .chain((0..200).map(|idx| format!("Somewhere State {idx}")))
        .collect();
    c.bench_function("resolve_names", |b| {
        b.iter(|| {
            let resolved = names.iter().filter(|n| map.resolve_detailed(n).is_mapped()).count();
            black_box(resolved);
        })
    });
}

fn bench_schedule_parse(c: &mut Criterion) {
    c.bench_function("schedule_parse", |b| {
        b.iter(|| {
            let parsed = parse_schedule_html("Arkansas", black_box(SCHEDULE_HTML)).unwrap();
            black_box(parsed.games.len());
        })
    });
}

criterion_group!(
    perf,
    bench_normalize_batting,
    bench_merge_teams,
    bench_resolve_names,
    bench_schedule_parse
);
criterion_main!(perf);

static SCHEDULE_HTML: &str = include_str!("../tests/fixtures/schedule_arkansas.html");
