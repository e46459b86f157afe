use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDateTime};

use cat5::config::Settings;
use cat5::matchup::Matchup;
use cat5::output::Forecast;
use cat5::period::MatchupPeriod;
use cat5::provider::load_league_snapshot;

fn main() -> Result<()> {
    cat5::init_logging();

    let path = std::env::args()
        .nth(1)
        .filter(|arg| !arg.starts_with("--"))
        .map(PathBuf::from)
        .context("usage: forecast <snapshot.json> [--now YYYY-MM-DDTHH:MM:SS]")?;
    let now = parse_now_arg()?.unwrap_or_else(|| Local::now().naive_local());

    let settings = Settings::from_env();
    let calendar = settings.period_calendar()?;
    let league = load_league_snapshot(&path)?;
    let period = MatchupPeriod::new(&league, &calendar, settings.starts_per_gameday)?;
    println!("{period}");

    for box_score in &league.box_scores {
        if box_score.is_bye() {
            continue;
        }
        let mut matchup = Matchup::new(&league, box_score, &period, now)?;
        matchup.set_probable();
        let forecast = Forecast::from_model(&matchup.get_model())?;

        println!(
            "{} @ {}: home win {:.1}%",
            matchup.away_team().abbrev,
            matchup.home_team().abbrev,
            forecast.win * 100.0
        );
        for (cat, p) in &forecast.cat_win {
            println!("  {cat:<4} {:.1}%", p * 100.0);
        }
    }
    Ok(())
}

fn parse_now_arg() -> Result<Option<NaiveDateTime>> {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    for (idx, arg) in args.iter().enumerate() {
        let raw = if let Some(raw) = arg.strip_prefix("--now=") {
            raw
        } else if arg == "--now"
            && let Some(next) = args.get(idx + 1)
        {
            next.as_str()
        } else {
            continue;
        };
        let now = NaiveDateTime::parse_from_str(raw.trim(), "%Y-%m-%dT%H:%M:%S")
            .with_context(|| format!("invalid --now {raw}"))?;
        return Ok(Some(now));
    }
    Ok(None)
}
