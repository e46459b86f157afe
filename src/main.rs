use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use chrono::{Local, NaiveDateTime};
use serde_json::{Value, json};

use cat5::config::Settings;
use cat5::handler::handle_process_event;
use cat5::provider::SnapshotDir;
use cat5::store::open_store;

fn main() -> Result<()> {
    cat5::init_logging();

    let mut settings = Settings::from_env();
    if let Some(dir) = parse_string_arg("--snapshot-dir") {
        settings.snapshot_dir = PathBuf::from(dir);
    }
    if let Some(seed) = parse_string_arg("--seed") {
        settings.seed = Some(seed.parse().with_context(|| format!("invalid --seed {seed}"))?);
    }

    let event = match parse_string_arg("--event") {
        Some(path) => {
            let raw = fs::read_to_string(&path).with_context(|| format!("read event {path}"))?;
            serde_json::from_str::<Value>(&raw).with_context(|| format!("parse event {path}"))?
        }
        None => event_from_args()?,
    };

    let now = match parse_string_arg("--now") {
        Some(raw) => parse_now(&raw)?,
        None => Local::now().naive_local(),
    };

    let source = SnapshotDir::new(&settings.snapshot_dir);
    let mut store = open_store(&settings, settings.write_mode)?;
    let resp = handle_process_event(&event, &source, store.as_mut(), &settings, now)?;
    println!("{}", serde_json::to_string_pretty(&resp)?);
    Ok(())
}

fn event_from_args() -> Result<Value> {
    let tag = parse_string_arg("--tag").ok_or_else(|| anyhow!("missing --tag"))?;
    let league_id = parse_string_arg("--league-id").ok_or_else(|| anyhow!("missing --league-id"))?;
    let year = parse_string_arg("--year").ok_or_else(|| anyhow!("missing --year"))?;
    let year: i32 = year.parse().with_context(|| format!("invalid --year {year}"))?;

    let mut event = json!({ "tag": tag, "leagueId": league_id, "year": year });
    if let Some(iter) = parse_string_arg("--iter") {
        let iter: usize = iter.parse().with_context(|| format!("invalid --iter {iter}"))?;
        event["iter"] = json!(iter);
    }
    Ok(event)
}

fn parse_now(raw: &str) -> Result<NaiveDateTime> {
    let raw = raw.trim();
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S")
        .or_else(|_| {
            chrono::NaiveDate::parse_from_str(raw, "%Y-%m-%d").map(|d| d.and_time(Default::default()))
        })
        .with_context(|| format!("invalid --now {raw}"))
}

fn parse_string_arg(name: &str) -> Option<String> {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    for (idx, arg) in args.iter().enumerate() {
        if let Some(raw) = arg.strip_prefix(&format!("{name}="))
            && !raw.trim().is_empty()
        {
            return Some(raw.trim().to_string());
        }
        if arg == name
            && let Some(next) = args.get(idx + 1)
            && !next.trim().is_empty()
        {
            return Some(next.trim().to_string());
        }
    }
    None
}
