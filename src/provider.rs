use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::info;

use crate::league::LeagueSnapshot;

/// Where league snapshots come from. The statistical core only ever sees a
/// [`LeagueSnapshot`]; adapters for a particular provider live behind this.
pub trait LeagueSource {
    fn fetch(&self, league_id: &str, year: i32) -> Result<LeagueSnapshot>;
}

/// Snapshots already fetched to disk as `<dir>/<league_id>_<year>.json`.
#[derive(Debug, Clone)]
pub struct SnapshotDir {
    dir: PathBuf,
}

impl SnapshotDir {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, league_id: &str, year: i32) -> PathBuf {
        self.dir.join(format!("{league_id}_{year}.json"))
    }
}

impl LeagueSource for SnapshotDir {
    fn fetch(&self, league_id: &str, year: i32) -> Result<LeagueSnapshot> {
        let path = self.path_for(league_id, year);
        let snapshot = load_league_snapshot(&path)?;
        if snapshot.league_id != league_id || snapshot.year != year {
            anyhow::bail!(
                "snapshot {} holds league {} ({}), expected {league_id} ({year})",
                path.display(),
                snapshot.league_id,
                snapshot.year
            );
        }
        Ok(snapshot)
    }
}

pub fn load_league_snapshot(path: &Path) -> Result<LeagueSnapshot> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("read league snapshot {}", path.display()))?;
    let snapshot = parse_league_snapshot_json(&raw)
        .with_context(|| format!("parse league snapshot {}", path.display()))?;
    info!(
        league = snapshot.league_id.as_str(),
        year = snapshot.year,
        teams = snapshot.teams.len(),
        box_scores = snapshot.box_scores.len(),
        "league snapshot loaded"
    );
    Ok(snapshot)
}

pub fn parse_league_snapshot_json(raw: &str) -> Result<LeagueSnapshot> {
    Ok(serde_json::from_str(raw)?)
}
