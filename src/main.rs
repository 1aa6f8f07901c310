use std::path::PathBuf;

use anyhow::{Context, Result};

use cbb_stats::config::PipelineConfig;
use cbb_stats::export;
use cbb_stats::http_client::HttpSource;
use cbb_stats::names;
use cbb_stats::pipeline::{PipelineContext, SeasonRequest};

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = PipelineConfig::from_env();
    let name_map = names::init_name_map(config.team_aliases_path.as_deref())?;
    let source = HttpSource::new(&config)?;
    let ctx = PipelineContext::new(config, &source, name_map);

    let request = SeasonRequest {
        stats: parse_list_arg("--stats").unwrap_or_default(),
        with_ncaa_rpi: has_flag("--with-ncaa-rpi"),
        with_ratings: has_flag("--with-ratings"),
    };
    let report = ctx.run_season(&request)?;

    println!("Season stats merged");
    println!("Teams: {}", report.merged.len());
    println!("Columns: {}", report.merged.columns.join(", "));
    if !report.failures.is_empty() {
        println!("Failures: {}", report.failures.len());
        for (name, err) in report.failures.iter().take(10) {
            println!("   - {name}: {err}");
        }
    }
    if !report.unresolved.is_empty() {
        println!("Unresolved team names: {}", report.unresolved.len());
        for name in report.unresolved.iter().take(20) {
            println!("   - {name}");
        }
    }

    if let Some(path) = parse_path_arg("--out") {
        let is_json = path.extension().is_some_and(|ext| ext == "json");
        if is_json {
            export::export_json(&path, &report).context("json export")?;
        } else {
            export::export_tables_xlsx(&path, &[&report.merged]).context("xlsx export")?;
        }
        println!("Wrote {}", path.display());
    }
    Ok(())
}

fn has_flag(flag: &str) -> bool {
    std::env::args().skip(1).any(|arg| arg == flag)
}

fn arg_value(flag: &str) -> Option<String> {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let prefix = format!("{flag}=");
    for (idx, arg) in args.iter().enumerate() {
        if let Some(value) = arg.strip_prefix(&prefix) {
            return Some(value.trim().to_string()).filter(|v| !v.is_empty());
        }
        if arg == flag {
            return args
                .get(idx + 1)
                .map(|next| next.trim().to_string())
                .filter(|v| !v.is_empty());
        }
    }
    None
}

fn parse_path_arg(flag: &str) -> Option<PathBuf> {
    arg_value(flag).map(PathBuf::from)
}

fn parse_list_arg(flag: &str) -> Option<Vec<String>> {
    let raw = arg_value(flag)?;
    let items = raw
        .split([',', ';'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect::<Vec<_>>();
    Some(items).filter(|items| !items.is_empty())
}
