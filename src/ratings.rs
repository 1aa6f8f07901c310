use std::collections::HashSet;

use crate::config::PipelineConfig;
use crate::error::ScrapeError;
use crate::fetch::fetch_paginated;
use crate::html::{self, TEAM_LINK_COLUMN};
use crate::http_client::PageSource;
use crate::table::{StatTable, TEAM_COLUMN, Vocabulary};
use crate::transform::{ELO, LIVE_RPI, NCAA_RPI, PROJECTED_RPI};

/// ELO ratings, one row per team with its schedule link.
pub fn fetch_elo(source: &dyn PageSource, config: &PipelineConfig) -> Result<StatTable, ScrapeError> {
    let url = config.ratings_url("elo");
    fetch_paginated(source, ELO, &url, 1, Vocabulary::Ratings, html::parse_linked_table)
}

pub fn fetch_projected_rpi(
    source: &dyn PageSource,
    config: &PipelineConfig,
) -> Result<StatTable, ScrapeError> {
    let url = config.ratings_url("rpi-predict");
    fetch_paginated(source, PROJECTED_RPI, &url, 1, Vocabulary::Ratings, |body| {
        html::parse_ranked_list(body, "RPI")
    })
}

pub fn fetch_live_rpi(source: &dyn PageSource, config: &PipelineConfig) -> Result<StatTable, ScrapeError> {
    let url = config.ratings_url("rpi-live");
    fetch_paginated(source, LIVE_RPI, &url, 1, Vocabulary::Ratings, |body| {
        html::parse_ranked_list(body, "Live_RPI")
    })
}

/// RPI rankings from the NCAA site. Names are already canonical, so the team
/// list doubles as the set of known spellings.
pub fn fetch_ncaa_rpi(source: &dyn PageSource, config: &PipelineConfig) -> Result<StatTable, ScrapeError> {
    let url = config.ncaa_rpi_url();
    fetch_paginated(source, NCAA_RPI, &url, 1, Vocabulary::Ncaa, html::parse_rankings_table)
}

/// `(team, schedule link)` pairs from a raw ELO table, in ratings-site
/// spelling, first occurrence per team.
pub fn schedule_links(elo: &StatTable) -> Vec<(String, String)> {
    let (Some(team), Some(link)) = (elo.column_index(TEAM_COLUMN), elo.column_index(TEAM_LINK_COLUMN))
    else {
        return Vec::new();
    };
    let mut seen = HashSet::new();
    elo.rows
        .iter()
        .filter_map(|row| {
            let name = row[team].to_string().trim().to_string();
            let href = row[link].to_string();
            if name.is_empty() || href.trim().is_empty() || !seen.insert(name.clone()) {
                return None;
            }
            Some((name, href))
        })
        .collect()
}
