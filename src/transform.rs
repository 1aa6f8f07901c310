//! Declarative per-stat cleanup rules, interpreted by [`crate::normalize`].

use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Col(String),
    Const(f64),
    Add(Box<Expr>, Box<Expr>),
    Sub(Box<Expr>, Box<Expr>),
    Mul(Box<Expr>, Box<Expr>),
    Div(Box<Expr>, Box<Expr>),
    Pow(Box<Expr>, Box<Expr>),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EvalError {
    MissingValue,
    DivideByZero,
}

impl Expr {
    pub fn col(name: &str) -> Self {
        Self::Col(name.to_string())
    }

    pub fn ratio(num: &str, den: &str) -> Self {
        Self::Div(Box::new(Self::col(num)), Box::new(Self::col(den)))
    }

    pub fn sum(cols: &[&str]) -> Self {
        let mut iter = cols.iter().map(|c| Self::col(c));
        let first = iter.next().unwrap_or(Self::Const(0.0));
        iter.fold(first, |acc, next| Self::Add(Box::new(acc), Box::new(next)))
    }

    /// `first - rest[0] - rest[1] - ...`
    pub fn difference(first: &str, rest: &[&str]) -> Self {
        rest.iter().fold(Self::col(first), |acc, next| {
            Self::Sub(Box::new(acc), Box::new(Self::col(next)))
        })
    }

    pub fn columns(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_columns(&mut out);
        out
    }

    fn collect_columns<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Self::Col(name) => {
                if !out.contains(&name.as_str()) {
                    out.push(name);
                }
            }
            Self::Const(_) => {}
            Self::Add(a, b) | Self::Sub(a, b) | Self::Mul(a, b) | Self::Div(a, b) | Self::Pow(a, b) => {
                a.collect_columns(out);
                b.collect_columns(out);
            }
        }
    }

    pub fn eval(&self, lookup: &dyn Fn(&str) -> Option<f64>) -> Result<f64, EvalError> {
        match self {
            Self::Col(name) => lookup(name).ok_or(EvalError::MissingValue),
            Self::Const(v) => Ok(*v),
            Self::Add(a, b) => Ok(a.eval(lookup)? + b.eval(lookup)?),
            Self::Sub(a, b) => Ok(a.eval(lookup)? - b.eval(lookup)?),
            Self::Mul(a, b) => Ok(a.eval(lookup)? * b.eval(lookup)?),
            Self::Div(a, b) => {
                let num = a.eval(lookup)?;
                let den = b.eval(lookup)?;
                if den == 0.0 {
                    return Err(EvalError::DivideByZero);
                }
                Ok(num / den)
            }
            Self::Pow(a, b) => Ok(a.eval(lookup)?.powf(b.eval(lookup)?)),
        }
    }
}

/// Text cleanups for non-numeric columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextCleanup {
    /// `"02/14/2025(1)"` -> `"02/14/2025"`
    DoubleheaderSuffix,
    /// `"#6 Arkansas"`, `"@Arkansas"`, `"Arkansas @ Arlington, TX"` -> `"Arkansas"`
    OpponentName,
}

#[derive(Debug, Clone, Default)]
pub struct NamedTransform {
    pub name: String,
    /// Applied after `derive`, so derive expressions use source column names.
    /// A rename onto the team column is the exception and runs first, so
    /// the key is cleaned and deduplicated like any other table's.
    pub rename: BTreeMap<String, String>,
    /// Derived columns, evaluated in order.
    pub derive: Vec<(String, Expr)>,
    pub drop: Vec<String>,
    /// Columns whose unparsable or empty values become 0 regardless of use.
    pub zero_fill: Vec<String>,
    pub text_cleanup: Vec<(String, TextCleanup)>,
}

impl NamedTransform {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    pub fn rename(mut self, from: &str, to: &str) -> Self {
        self.rename.insert(from.to_string(), to.to_string());
        self
    }

    pub fn derive(mut self, column: &str, expr: Expr) -> Self {
        self.derive.push((column.to_string(), expr));
        self
    }

    pub fn drop(mut self, columns: &[&str]) -> Self {
        self.drop.extend(columns.iter().map(|c| c.to_string()));
        self
    }

    pub fn zero_fill(mut self, columns: &[&str]) -> Self {
        self.zero_fill.extend(columns.iter().map(|c| c.to_string()));
        self
    }

    pub fn clean_text(mut self, column: &str, cleanup: TextCleanup) -> Self {
        self.text_cleanup.push((column.to_string(), cleanup));
        self
    }

    /// Columns that must read as 0 rather than absent when unparsable.
    pub fn zero_fallback_columns(&self) -> Vec<String> {
        let mut out: Vec<String> = self.zero_fill.clone();
        for (_, expr) in &self.derive {
            for col in expr.columns() {
                if !out.iter().any(|c| c == col) {
                    out.push(col.to_string());
                }
            }
        }
        out
    }
}

pub const BATTING_AVERAGE: &str = "Batting Average";
pub const BASE_ON_BALLS: &str = "Base on Balls";
pub const EARNED_RUN_AVERAGE: &str = "Earned Run Average";
pub const FIELDING_PERCENTAGE: &str = "Fielding Percentage";
pub const ON_BASE_PERCENTAGE: &str = "On Base Percentage";
pub const RUNS: &str = "Runs";
pub const SLUGGING_PERCENTAGE: &str = "Slugging Percentage";
pub const STRIKEOUTS_PER_NINE: &str = "Strikeouts Per Nine Innings";
pub const WALKS_PER_NINE: &str = "Walks Allowed Per Nine Innings";
pub const WHIP: &str = "WHIP";

pub const ELO: &str = "ELO";
pub const PROJECTED_RPI: &str = "Projected RPI";
pub const LIVE_RPI: &str = "Live RPI";
pub const NCAA_RPI: &str = "NCAA RPI";
pub const GAME_LOG: &str = "Game Log";

/// Season team-stat categories merged into the per-team record.
pub fn season_transforms() -> Vec<NamedTransform> {
    vec![
        NamedTransform::new(BATTING_AVERAGE)
            .derive("HPG", Expr::ratio("H", "G"))
            .derive("ABPG", Expr::ratio("AB", "G"))
            .derive("HPAB", Expr::ratio("H", "AB"))
            .drop(&["Rank"]),
        NamedTransform::new(BASE_ON_BALLS)
            .derive("BBPG", Expr::ratio("BB", "G"))
            .drop(&["Rank", "G"]),
        NamedTransform::new(EARNED_RUN_AVERAGE)
            .rename("R", "RA")
            .drop(&["Rank", "G"]),
        NamedTransform::new(FIELDING_PERCENTAGE)
            .derive("APG", Expr::ratio("A", "G"))
            .derive("EPG", Expr::ratio("E", "G"))
            .drop(&["Rank", "G"]),
        NamedTransform::new(ON_BASE_PERCENTAGE)
            .rename("PCT", "OBP")
            .derive("HBPPG", Expr::ratio("HBP", "G"))
            .drop(&["Rank", "G", "AB", "H", "BB", "SF", "SH"]),
        NamedTransform::new(RUNS)
            .derive("RPG", Expr::ratio("R", "G"))
            .rename("R", "RS")
            .drop(&["Rank", "G"]),
        NamedTransform::new(SLUGGING_PERCENTAGE)
            .rename("SLG PCT", "SLG")
            .drop(&["Rank", "G", "AB"]),
        NamedTransform::new(STRIKEOUTS_PER_NINE)
            .rename("K/9", "KP9")
            .drop(&["Rank", "G", "IP", "SO"]),
        NamedTransform::new(WALKS_PER_NINE)
            .rename("PG", "WP9")
            .drop(&["Rank", "G", "IP", "BB"]),
        NamedTransform::new(WHIP).drop(&["Rank", "HA", "IP", "BB"]),
    ]
}

/// Ratings-site tables, merged as extra categories when requested.
pub fn ratings_transforms() -> Vec<NamedTransform> {
    vec![
        NamedTransform::new(ELO)
            .rename("Rank", "ELO_Rank")
            .drop(&["Team Link"]),
        NamedTransform::new(PROJECTED_RPI).drop(&["Conference"]),
        NamedTransform::new(LIVE_RPI).drop(&["Conference"]),
    ]
}

/// NCAA rankings-page RPI. Already in canonical spelling.
pub fn ncaa_rpi_transform() -> NamedTransform {
    NamedTransform::new(NCAA_RPI)
        .rename("School", "Team")
        .drop(&["Previous"])
}

/// Per-game batting log of one team.
pub fn game_log_transform() -> NamedTransform {
    NamedTransform::new(GAME_LOG)
        .clean_text("Date", TextCleanup::DoubleheaderSuffix)
        .clean_text("Opponent", TextCleanup::OpponentName)
        .zero_fill(&["AB", "BB", "HBP", "SF", "SH", "H", "2B", "3B", "HR", "R"])
        .derive("PA", Expr::sum(&["AB", "BB", "HBP", "SF", "SH"]))
        .derive("1B", Expr::difference("H", &["2B", "3B", "HR"]))
}

pub fn transform_for(name: &str) -> Option<NamedTransform> {
    season_transforms()
        .into_iter()
        .chain(ratings_transforms())
        .chain(std::iter::once(ncaa_rpi_transform()))
        .chain(std::iter::once(game_log_transform()))
        .find(|t| t.name == name)
}
