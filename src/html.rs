//! Page-level HTML extraction. Turns fetched documents into header + row
//! text so the rest of the pipeline never touches markup.

use std::collections::BTreeMap;

use scraper::{ElementRef, Html, Selector};

use crate::error::ScrapeError;

pub const TEAM_LINK_COLUMN: &str = "Team Link";
pub const CONFERENCE_COLUMN: &str = "Conference";

const RATINGS_TABLE: &str = "table.normal-grid.alternating-rows.stats-table";
const RATINGS_NAME: &str = "div.name-subcontainer";
const NCAA_RANKINGS_TABLE: &str = "table.sticky";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

pub fn selector(css: &str) -> Result<Selector, ScrapeError> {
    Selector::parse(css).map_err(|err| ScrapeError::parse(format!("invalid selector {css:?}: {err}")))
}

/// Whitespace-collapsed text of an element.
pub fn element_text(el: &ElementRef) -> String {
    el.text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Non-empty trimmed lines of an element's text.
pub fn element_lines(el: &ElementRef) -> Vec<String> {
    el.text()
        .collect::<String>()
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// First `<table>` on the page: every `<th>` is a header, every later `<tr>`
/// a row of `<td>` text. `Ok(None)` when the page has no table.
pub fn parse_first_table(html: &str) -> Result<Option<RawTable>, ScrapeError> {
    parse_table_matching(html, "table")
}

/// NCAA rankings page (RPI): the `table.sticky` grid, read like
/// [`parse_first_table`].
pub fn parse_rankings_table(html: &str) -> Result<Option<RawTable>, ScrapeError> {
    parse_table_matching(html, NCAA_RANKINGS_TABLE)
}

fn parse_table_matching(html: &str, table_css: &str) -> Result<Option<RawTable>, ScrapeError> {
    let document = Html::parse_document(html);
    let table_sel = selector(table_css)?;
    let th_sel = selector("th")?;
    let tr_sel = selector("tr")?;
    let td_sel = selector("td")?;

    let Some(table) = document.select(&table_sel).next() else {
        return Ok(None);
    };
    let headers = table.select(&th_sel).map(|th| element_text(&th)).collect();
    let rows = table
        .select(&tr_sel)
        .skip(1)
        .map(|tr| tr.select(&td_sel).map(|td| element_text(&td)).collect::<Vec<_>>())
        .filter(|row| !row.is_empty())
        .collect();
    Ok(Some(RawTable { headers, rows }))
}

/// Stat name -> absolute URL, read from the team-stat dropdown.
pub fn parse_stat_links(html: &str, base_url: &str) -> Result<BTreeMap<String, String>, ScrapeError> {
    let document = Html::parse_document(html);
    let option_sel = selector("select#select-container-team option")?;
    let mut links = BTreeMap::new();
    for option in document.select(&option_sel) {
        let Some(value) = option.value().attr("value").filter(|v| !v.trim().is_empty()) else {
            continue;
        };
        let name = element_text(&option);
        if name.is_empty() {
            continue;
        }
        let url = if value.starts_with("http") {
            value.to_string()
        } else {
            format!("{}{}", base_url.trim_end_matches('/'), value)
        };
        links.insert(name, url);
    }
    Ok(links)
}

/// Ratings-site ranking list (RPI style): rank cell, then a name cell whose
/// second line carries the conference and record.
pub fn parse_ranked_list(html: &str, rank_column: &str) -> Result<Option<RawTable>, ScrapeError> {
    let document = Html::parse_document(html);
    let table_sel = selector(RATINGS_TABLE)?;
    let row_sel = selector("tbody tr")?;
    let td_sel = selector("td")?;
    let name_sel = selector(RATINGS_NAME)?;

    let Some(table) = document.select(&table_sel).next() else {
        return Ok(None);
    };
    let mut rows = Vec::new();
    for tr in table.select(&row_sel) {
        let cells: Vec<ElementRef> = tr.select(&td_sel).collect();
        if cells.len() < 2 {
            continue;
        }
        let lines = match cells[1].select(&name_sel).next() {
            Some(div) => element_lines(&div),
            None => element_lines(&cells[1]),
        };
        let team = lines.first().cloned().unwrap_or_default();
        let conference = lines
            .get(1)
            .and_then(|line| line.split('(').next())
            .map(|s| s.trim().to_string())
            .unwrap_or_default();
        rows.push(vec![element_text(&cells[0]), team, conference]);
    }
    Ok(Some(RawTable {
        headers: vec![
            rank_column.to_string(),
            "Team".to_string(),
            CONFERENCE_COLUMN.to_string(),
        ],
        rows,
    }))
}

/// Ratings-site ELO table: header row from `<thead>`, first cell holds the
/// team name and its schedule link, which becomes an extra column.
pub fn parse_linked_table(html: &str) -> Result<Option<RawTable>, ScrapeError> {
    let document = Html::parse_document(html);
    let table_sel = selector(RATINGS_TABLE)?;
    let th_sel = selector("thead th")?;
    let row_sel = selector("tbody tr")?;
    let td_sel = selector("td")?;
    let name_sel = selector(RATINGS_NAME)?;
    let link_sel = selector("a")?;

    let Some(table) = document.select(&table_sel).next() else {
        return Ok(None);
    };
    let mut headers: Vec<String> = table.select(&th_sel).map(|th| element_text(&th)).collect();
    headers.insert(1.min(headers.len()), TEAM_LINK_COLUMN.to_string());

    let mut rows = Vec::new();
    for tr in table.select(&row_sel) {
        let mut row = Vec::new();
        for (idx, td) in tr.select(&td_sel).enumerate() {
            if idx > 0 {
                row.push(element_text(&td));
                continue;
            }
            match td.select(&name_sel).next() {
                Some(div) => {
                    let name = element_lines(&div).into_iter().next().unwrap_or_default();
                    let link = div
                        .select(&link_sel)
                        .next()
                        .and_then(|a| a.value().attr("href"))
                        .unwrap_or_default()
                        .to_string();
                    row.push(name);
                    row.push(link);
                }
                None => {
                    row.push(element_text(&td));
                    row.push(String::new());
                }
            }
        }
        if !row.is_empty() {
            rows.push(row);
        }
    }
    Ok(Some(RawTable { headers, rows }))
}
