use cbb_stats::config::JoinPolicy;
use cbb_stats::merge::{MergeOptions, merge, merge_teams, pythag, round_to};
use cbb_stats::table::{Cell, StatTable, TEAM_COLUMN, Vocabulary};

fn table(name: &str, columns: &[&str], rows: Vec<Vec<Cell>>) -> StatTable {
    StatTable {
        name: name.to_string(),
        vocabulary: Vocabulary::Ncaa,
        columns: columns.iter().map(|c| c.to_string()).collect(),
        rows,
    }
}

fn row(team: &str, values: &[f64]) -> Vec<Cell> {
    let mut out = vec![Cell::text(team)];
    out.extend(values.iter().map(|v| Cell::Float(*v)));
    out
}

fn outer() -> MergeOptions {
    MergeOptions {
        policy: JoinPolicy::Outer,
        ..MergeOptions::default()
    }
}

#[test]
fn inner_join_keeps_only_common_teams() {
    let a = table("A", &["Team", "x"], vec![row("X", &[1.0]), row("Y", &[2.0])]);
    let b = table("B", &["Team", "y"], vec![row("Y", &[3.0]), row("Z", &[4.0])]);
    let merged = merge_teams(&[a, b], MergeOptions::default());
    assert_eq!(merged.teams(), vec!["Y".to_string()]);
    assert_eq!(merged.columns, vec!["Team", "x", "y"]);
    assert_eq!(merged.value("Y", "y"), Some(&Cell::Float(3.0)));
}

#[test]
fn three_way_join_is_intersection() {
    let a = table("A", &["Team", "a"], vec![row("P", &[1.0]), row("Q", &[1.0]), row("R", &[1.0])]);
    let b = table("B", &["Team", "b"], vec![row("R", &[2.0]), row("Q", &[2.0])]);
    let c = table("C", &["Team", "c"], vec![row("Q", &[3.0]), row("S", &[3.0])]);
    let merged = merge_teams(&[a, b, c], MergeOptions::default());
    assert_eq!(merged.teams(), vec!["Q".to_string()]);
}

#[test]
fn repeated_columns_keep_first_occurrence() {
    let a = table("A", &["Team", "G", "H"], vec![row("Y", &[60.0, 600.0])]);
    let b = table("B", &["Team", "G", "BB"], vec![row("Y", &[59.0, 250.0])]);
    let merged = merge_teams(&[a, b], MergeOptions::default());
    assert_eq!(merged.columns, vec!["Team", "G", "H", "BB"]);
    assert_eq!(merged.value("Y", "G"), Some(&Cell::Float(60.0)));
}

#[test]
fn output_is_sorted_by_team() {
    let a = table(
        "A",
        &["Team", "x"],
        vec![row("Wake Forest", &[1.0]), row("Arkansas", &[2.0]), row("LSU", &[3.0])],
    );
    let merged = merge_teams(&[a], MergeOptions::default());
    assert_eq!(merged.teams(), vec!["Arkansas", "LSU", "Wake Forest"]);
}

#[test]
fn pythag_matches_rounded_formula() {
    let expected = {
        let rs = 50f64.powf(1.83);
        let ra = 30f64.powf(1.83);
        ((rs / (rs + ra)) * 1000.0).round_ties_even() / 1000.0
    };
    assert_eq!(pythag(50.0, 30.0, 1.83), expected);
    assert_eq!(pythag(50.0, 30.0, 1.83), 0.718);
    assert!(pythag(0.0, 0.0, 1.83).is_nan());
}

#[test]
fn rounding_ties_go_to_even() {
    assert_eq!(round_to(0.125, 2), 0.12);
    assert_eq!(round_to(0.375, 2), 0.38);
    assert_eq!(round_to(2.5, 0), 2.0);
    assert_eq!(pythag(1.0, 1999.0, 1.0), 0.0);
    assert_eq!(pythag(3.0, 1.0, 1.0), 0.75);
}

#[test]
fn league_fields_computed_after_merge() {
    let runs = table("Runs", &["Team", "RS"], vec![row("Y", &[50.0]), row("Z", &[40.0])]);
    let era = table("ERA", &["Team", "RA"], vec![row("Y", &[30.0]), row("Z", &[40.0])]);
    let obp = table("OBP", &["Team", "OBP"], vec![row("Y", &[0.4]), row("Z", &[0.35])]);
    let slg = table("SLG", &["Team", "SLG"], vec![row("Y", &[0.5]), row("Z", &[0.45])]);
    let merged = merge_teams(&[runs, era, obp, slg], MergeOptions::default());
    assert_eq!(merged.value("Y", "PYTHAG"), Some(&Cell::Float(0.718)));
    assert_eq!(merged.value("Z", "PYTHAG"), Some(&Cell::Float(0.5)));
    let ops = merged.value("Y", "OPS").and_then(Cell::as_f64).expect("ops");
    assert!((ops - 0.9).abs() < 1e-12);
}

#[test]
fn league_fields_skipped_without_inputs() {
    let a = table("A", &["Team", "RS"], vec![row("Y", &[50.0])]);
    let merged = merge_teams(&[a], MergeOptions::default());
    assert!(!merged.has_column("PYTHAG"));
    assert!(!merged.has_column("OPS"));
}

#[test]
fn outer_join_keeps_everyone_with_missing_cells() {
    let a = table("A", &["Team", "RS"], vec![row("X", &[50.0]), row("Y", &[45.0])]);
    let b = table("B", &["Team", "RA"], vec![row("Y", &[30.0]), row("Z", &[20.0])]);
    let merged = merge(&[a, b], TEAM_COLUMN, outer());
    assert_eq!(merged.teams(), vec!["X", "Y", "Z"]);
    assert_eq!(merged.value("X", "RA"), Some(&Cell::Missing));
    assert_eq!(merged.value("Z", "RS"), Some(&Cell::Missing));
    assert_eq!(merged.value("Z", "RA"), Some(&Cell::Float(20.0)));
    assert_eq!(merged.value("X", "PYTHAG"), Some(&Cell::Missing));
    assert!(merged.value("Y", "PYTHAG").and_then(Cell::as_f64).is_some());
}

#[test]
fn empty_input_gives_empty_table() {
    let merged = merge_teams(&[], MergeOptions::default());
    assert!(merged.is_empty());
    assert_eq!(merged.columns, vec![TEAM_COLUMN]);
}
