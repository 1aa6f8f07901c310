use std::collections::BTreeMap;

use rayon::prelude::*;

use crate::error::ScrapeError;
use crate::html::{self, RawTable};
use crate::http_client::PageSource;
use crate::table::{StatTable, Vocabulary};

/// Successes keyed by unit of work, plus `(key, message)` for every unit that
/// failed. Failed keys never appear in `tables`.
#[derive(Debug, Default)]
pub struct FetchMany {
    pub tables: BTreeMap<String, StatTable>,
    pub failures: Vec<(String, String)>,
}

pub fn page_url(base_url: &str, page: usize) -> String {
    if page <= 1 {
        base_url.to_string()
    } else {
        format!("{}/p{page}", base_url.trim_end_matches('/'))
    }
}

/// Walks `/p2`, `/p3`, ... until a page has no table, a request fails, or
/// `max_pages` is reached. Rows of every page share the page-1 header.
///
/// Fails only when page 1 itself yields nothing; later failures end the walk
/// and keep what was collected.
pub fn fetch_table(
    source: &dyn PageSource,
    name: &str,
    base_url: &str,
    max_pages: usize,
) -> Result<StatTable, ScrapeError> {
    fetch_paginated(source, name, base_url, max_pages, Vocabulary::Ncaa, html::parse_first_table)
}

pub fn fetch_paginated(
    source: &dyn PageSource,
    name: &str,
    base_url: &str,
    max_pages: usize,
    vocabulary: Vocabulary,
    parse: impl Fn(&str) -> Result<Option<RawTable>, ScrapeError>,
) -> Result<StatTable, ScrapeError> {
    let mut headers: Option<Vec<String>> = None;
    let mut rows = Vec::new();

    for page in 1..=max_pages.max(1) {
        let url = page_url(base_url, page);
        let parsed = source
            .fetch_page(&url)
            .and_then(|body| parse(&body))
            .and_then(|table| table.ok_or_else(|| ScrapeError::MissingTable { url: url.clone() }));
        let table = match parsed {
            Ok(table) => table,
            Err(err) if page == 1 => return Err(err),
            Err(err) if err.is_missing_table() => {
                log::debug!("{name}: no table on page {page}, stopping");
                break;
            }
            Err(err) => {
                log::warn!("{name}: page {page} failed, keeping {} rows: {err}", rows.len());
                break;
            }
        };
        log::debug!("{name}: page {page} -> {} rows", table.rows.len());
        if headers.is_none() {
            headers = Some(table.headers);
        }
        rows.extend(table.rows);
    }

    let headers = headers.unwrap_or_default();
    if rows.is_empty() {
        return Err(ScrapeError::MissingTable {
            url: base_url.to_string(),
        });
    }
    Ok(StatTable::from_raw(name, vocabulary, headers, rows))
}

/// One paginated fetch per stat name, run on a bounded pool. A name without
/// a link, or whose fetch fails, lands in `failures` and never disturbs the
/// others.
pub fn fetch_many(
    source: &dyn PageSource,
    links: &BTreeMap<String, String>,
    names: &[String],
    max_pages: usize,
    parallelism: usize,
) -> FetchMany {
    let results: Vec<(String, Result<StatTable, String>)> = with_fetch_pool(parallelism, || {
        names
            .par_iter()
            .map(|name| {
                let Some(url) = links.get(name) else {
                    return (name.clone(), Err(format!("unknown stat {name:?}")));
                };
                let result = fetch_table(source, name, url, max_pages).map_err(|err| err.to_string());
                (name.clone(), result)
            })
            .collect()
    });

    let mut out = FetchMany::default();
    for (name, result) in results {
        match result {
            Ok(table) => {
                out.tables.insert(name, table);
            }
            Err(err) => {
                log::warn!("failed to fetch {name}: {err}");
                out.failures.push((name, err));
            }
        }
    }
    log::info!(
        "fetched {}/{} stat tables",
        out.tables.len(),
        out.tables.len() + out.failures.len()
    );
    out
}

pub(crate) fn with_fetch_pool<T>(threads: usize, action: impl FnOnce() -> T + Send) -> T
where
    T: Send,
{
    match rayon::ThreadPoolBuilder::new()
        .num_threads(threads.max(1))
        .build()
    {
        Ok(pool) => pool.install(action),
        Err(_) => action(),
    }
}
