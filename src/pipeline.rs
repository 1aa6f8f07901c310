//! Explicit pipeline stages. Each stage takes the context plus the previous
//! stage's output and returns a fresh value.

use std::collections::{BTreeMap, BTreeSet};

use anyhow::{Context, Result};
use serde::Serialize;

use crate::config::PipelineConfig;
use crate::error::ScrapeError;
use crate::fetch::{self, FetchMany};
use crate::html;
use crate::http_client::PageSource;
use crate::merge::{self, MergeOptions};
use crate::names::{NameMap, Resolver};
use crate::normalize::normalize_with;
use crate::ratings;
use crate::schedule::{self, GameRecord};
use crate::table::{StatTable, TEAM_COLUMN};
use crate::transform::{self, NamedTransform};

pub struct PipelineContext<'a> {
    pub config: PipelineConfig,
    pub source: &'a dyn PageSource,
    pub names: &'a NameMap,
}

#[derive(Debug, Serialize)]
pub struct SeasonReport {
    pub merged: StatTable,
    pub failures: Vec<(String, String)>,
    pub unresolved: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct ScheduleReport {
    pub games: Vec<GameRecord>,
    pub failures: Vec<(String, String)>,
    pub unresolved: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct SeasonRequest {
    /// Stat categories to merge; empty means every known season category.
    pub stats: Vec<String>,
    /// Adds the NCAA rankings-page RPI as a merge category.
    pub with_ncaa_rpi: bool,
    pub with_ratings: bool,
}

impl<'a> PipelineContext<'a> {
    pub fn new(config: PipelineConfig, source: &'a dyn PageSource, names: &'a NameMap) -> Self {
        Self {
            config,
            source,
            names,
        }
    }

    pub fn merge_options(&self) -> MergeOptions {
        MergeOptions {
            policy: self.config.join_policy,
            pythag_exponent: self.config.pythag_exponent,
        }
    }

    /// Stat name -> listing URL, read from the stats landing page.
    pub fn stat_links(&self) -> Result<BTreeMap<String, String>> {
        let url = self.config.ncaa_stats_url();
        let body = self.source.fetch_page(&url).context("stats landing page")?;
        let links = html::parse_stat_links(&body, &self.config.ncaa_base_url)
            .context("stats dropdown")?;
        log::info!("found {} stat listings", links.len());
        Ok(links)
    }

    pub fn fetch_stats(&self, links: &BTreeMap<String, String>, names: &[String]) -> FetchMany {
        fetch::fetch_many(
            self.source,
            links,
            names,
            self.config.max_pages,
            self.config.fetch_parallelism,
        )
    }

    /// Normalizes every fetched table that has a transform, in `transforms`
    /// order.
    pub fn normalize_all(
        &self,
        raw: &BTreeMap<String, StatTable>,
        transforms: &[NamedTransform],
        resolver: &Resolver,
    ) -> Vec<StatTable> {
        transforms
            .iter()
            .filter_map(|t| raw.get(&t.name).map(|table| normalize_with(table, t, resolver)))
            .collect()
    }

    pub fn merge(&self, tables: &[StatTable]) -> StatTable {
        merge::merge(tables, TEAM_COLUMN, self.merge_options())
    }

    pub fn run_season(&self, request: &SeasonRequest) -> Result<SeasonReport> {
        let catalogue = transform::season_transforms();
        let (transforms, mut failures) = select_transforms(&catalogue, &request.stats);
        let names: Vec<String> = transforms.iter().map(|t| t.name.clone()).collect();

        let links = self.stat_links()?;
        let fetched = self.fetch_stats(&links, &names);
        failures.extend(fetched.failures);

        let plain = Resolver::new(self.names);
        let mut tables = self.normalize_all(&fetched.tables, &transforms, &plain);
        if tables.is_empty() {
            anyhow::bail!("no stat tables fetched ({} failures)", failures.len());
        }

        if request.with_ncaa_rpi {
            match self.ncaa_rpi() {
                Ok(table) => tables.push(table),
                Err(err) => failures.push((transform::NCAA_RPI.to_string(), err.to_string())),
            }
        }

        let mut known = self.names.canonical_names();
        known.extend(tables.iter().flat_map(StatTable::teams));
        let resolver = Resolver::with_known(self.names, known);
        if request.with_ratings {
            let (rating_tables, rating_failures) = self.fetch_ratings();
            failures.extend(rating_failures);
            tables.extend(self.normalize_all(&rating_tables, &transform::ratings_transforms(), &resolver));
        }

        let merged = self.merge(&tables);
        Ok(SeasonReport {
            merged,
            failures,
            unresolved: resolver.unresolved(),
        })
    }

    /// The NCAA RPI table, normalized. Its names are canonical and only get
    /// trimmed.
    pub fn ncaa_rpi(&self) -> Result<StatTable, ScrapeError> {
        let raw = ratings::fetch_ncaa_rpi(self.source, &self.config).inspect_err(|err| {
            log::warn!("{} unavailable: {err}", transform::NCAA_RPI);
        })?;
        let resolver = Resolver::new(self.names);
        Ok(normalize_with(&raw, &transform::ncaa_rpi_transform(), &resolver))
    }

    /// Canonical spellings: the alias table's targets plus the NCAA RPI team
    /// list when it can be fetched.
    fn known_teams(&self, failures: &mut Vec<(String, String)>) -> BTreeSet<String> {
        let mut known = self.names.canonical_names();
        match self.ncaa_rpi() {
            Ok(table) => known.extend(table.teams()),
            Err(err) => failures.push((transform::NCAA_RPI.to_string(), err.to_string())),
        }
        known
    }

    fn fetch_ratings(&self) -> (BTreeMap<String, StatTable>, Vec<(String, String)>) {
        let attempts = [
            (transform::ELO, ratings::fetch_elo(self.source, &self.config)),
            (
                transform::PROJECTED_RPI,
                ratings::fetch_projected_rpi(self.source, &self.config),
            ),
            (transform::LIVE_RPI, ratings::fetch_live_rpi(self.source, &self.config)),
        ];
        let mut tables = BTreeMap::new();
        let mut failures = Vec::new();
        for (name, result) in attempts {
            match result {
                Ok(table) => {
                    tables.insert(name.to_string(), table);
                }
                Err(err) => {
                    log::warn!("{name} unavailable: {err}");
                    failures.push((name.to_string(), err.to_string()));
                }
            }
        }
        (tables, failures)
    }

    /// Every team's schedule from the ratings site, names canonicalized and
    /// ELO attached. `limit` caps how many teams are visited. Only names
    /// outside the known canonical set are reported as unresolved.
    pub fn load_schedules(&self, limit: Option<usize>) -> Result<ScheduleReport> {
        let raw_elo = ratings::fetch_elo(self.source, &self.config).context("elo table")?;
        let mut teams = ratings::schedule_links(&raw_elo);
        if let Some(limit) = limit {
            teams.truncate(limit);
        }

        let batch = schedule::extract_all(
            self.source,
            &self.config.ratings_base_url,
            &teams,
            self.config.schedule_parallelism,
        );

        let mut failures = batch.failures;
        let resolver = Resolver::with_known(self.names, self.known_teams(&mut failures));
        let elo_transform = transform::ratings_transforms()
            .into_iter()
            .find(|t| t.name == transform::ELO)
            .unwrap_or_else(|| NamedTransform::new(transform::ELO));
        let elo = normalize_with(&raw_elo, &elo_transform, &resolver);
        let games = schedule::finalize_schedule(batch.games, &resolver, Some(&elo));
        Ok(ScheduleReport {
            games,
            failures,
            unresolved: resolver.unresolved(),
        })
    }
}

/// Picks the requested transforms out of `catalogue`; names without one are
/// reported as failures.
pub fn select_transforms(
    catalogue: &[NamedTransform],
    requested: &[String],
) -> (Vec<NamedTransform>, Vec<(String, String)>) {
    if requested.is_empty() {
        return (catalogue.to_vec(), Vec::new());
    }
    let mut picked = Vec::new();
    let mut failures = Vec::new();
    for name in requested {
        match catalogue.iter().find(|t| t.name.eq_ignore_ascii_case(name.trim())) {
            Some(t) => picked.push(t.clone()),
            None => failures.push((name.clone(), "no transform for stat".to_string())),
        }
    }
    (picked, failures)
}
