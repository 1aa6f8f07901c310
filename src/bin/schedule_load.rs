use std::path::PathBuf;

use anyhow::{Context, Result};

use cbb_stats::config::PipelineConfig;
use cbb_stats::export;
use cbb_stats::http_client::HttpSource;
use cbb_stats::names;
use cbb_stats::pipeline::PipelineContext;

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = PipelineConfig::from_env();
    let name_map = names::init_name_map(config.team_aliases_path.as_deref())?;
    let source = HttpSource::new(&config)?;
    let ctx = PipelineContext::new(config, &source, name_map);

    let report = ctx.load_schedules(parse_limit_arg())?;

    println!("Schedule load complete");
    println!("Games: {}", report.games.len());
    if !report.failures.is_empty() {
        println!("Failures: {}", report.failures.len());
        for (team, err) in report.failures.iter().take(6) {
            println!("   - {team}: {err}");
        }
    }
    if !report.unresolved.is_empty() {
        println!("Unmapped names: {}", report.unresolved.len());
    }

    if let Some(path) = parse_out_arg() {
        if path.extension().is_some_and(|ext| ext == "json") {
            export::export_json(&path, &report).context("json export")?;
        } else {
            export::export_schedule_xlsx(&path, &report.games).context("xlsx export")?;
        }
        println!("Wrote {}", path.display());
    }
    Ok(())
}

fn parse_out_arg() -> Option<PathBuf> {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    for (idx, arg) in args.iter().enumerate() {
        if let Some(path) = arg.strip_prefix("--out=") {
            let trimmed = path.trim();
            if !trimmed.is_empty() {
                return Some(PathBuf::from(trimmed));
            }
        }
        if arg == "--out"
            && let Some(next) = args.get(idx + 1)
            && !next.trim().is_empty()
        {
            return Some(PathBuf::from(next));
        }
    }
    None
}

fn parse_limit_arg() -> Option<usize> {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    for (idx, arg) in args.iter().enumerate() {
        if let Some(raw) = arg.strip_prefix("--limit=") {
            return raw.trim().parse().ok();
        }
        if arg == "--limit" {
            return args.get(idx + 1).and_then(|next| next.trim().parse().ok());
        }
    }
    None
}
