use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::error::Cat5Error;

pub type GameDayId = u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Stat {
    FgPct,
    FtPct,
    ThreePm,
    Reb,
    Ast,
    Stl,
    Blk,
    To,
    Pts,
    Fgm,
    Fga,
    Ftm,
    Fta,
    Gp,
}

impl Stat {
    pub const ALL: [Stat; 14] = [
        Stat::FgPct,
        Stat::FtPct,
        Stat::ThreePm,
        Stat::Reb,
        Stat::Ast,
        Stat::Stl,
        Stat::Blk,
        Stat::To,
        Stat::Pts,
        Stat::Fgm,
        Stat::Fga,
        Stat::Ftm,
        Stat::Fta,
        Stat::Gp,
    ];

    pub const SCORED: [Stat; 9] = [
        Stat::FgPct,
        Stat::FtPct,
        Stat::ThreePm,
        Stat::Reb,
        Stat::Ast,
        Stat::Stl,
        Stat::Blk,
        Stat::To,
        Stat::Pts,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Stat::FgPct => "FG%",
            Stat::FtPct => "FT%",
            Stat::ThreePm => "3PM",
            Stat::Reb => "REB",
            Stat::Ast => "AST",
            Stat::Stl => "STL",
            Stat::Blk => "BLK",
            Stat::To => "TO",
            Stat::Pts => "PTS",
            Stat::Fgm => "FGM",
            Stat::Fga => "FGA",
            Stat::Ftm => "FTM",
            Stat::Fta => "FTA",
            Stat::Gp => "GP",
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn is_count(self) -> bool {
        matches!(
            self,
            Stat::ThreePm | Stat::Reb | Stat::Ast | Stat::Stl | Stat::Blk | Stat::To | Stat::Pts
        )
    }

    pub fn is_ratio(self) -> bool {
        matches!(self, Stat::FgPct | Stat::FtPct)
    }

    pub fn is_negative(self) -> bool {
        matches!(self, Stat::To)
    }

    /// `(attempts, makes)` for ratio categories.
    pub fn ratio_parts(self) -> Option<(Stat, Stat)> {
        match self {
            Stat::FgPct => Some((Stat::Fga, Stat::Fgm)),
            Stat::FtPct => Some((Stat::Fta, Stat::Ftm)),
            _ => None,
        }
    }
}

impl fmt::Display for Stat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Stat {
    type Err = Cat5Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim();
        Stat::ALL
            .iter()
            .copied()
            .find(|stat| stat.as_str().eq_ignore_ascii_case(key))
            .ok_or_else(|| Cat5Error::InvalidCategory(s.to_string()))
    }
}

/// Category name -> value. Absent categories read as zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatLine(BTreeMap<String, f64>);

impl StatLine {
    pub fn value(&self, stat: Stat) -> f64 {
        self.get(stat).unwrap_or(0.0)
    }

    pub fn get(&self, stat: Stat) -> Option<f64> {
        self.0.get(stat.as_str()).copied()
    }

    pub fn set(&mut self, stat: Stat, value: f64) {
        self.0.insert(stat.as_str().to_string(), value);
    }

    pub fn with(mut self, stat: Stat, value: f64) -> Self {
        self.set(stat, value);
        self
    }
}

impl FromIterator<(Stat, f64)> for StatLine {
    fn from_iter<I: IntoIterator<Item = (Stat, f64)>>(iter: I) -> Self {
        let mut line = StatLine::default();
        for (stat, value) in iter {
            line.set(stat, value);
        }
        line
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatBlock {
    #[serde(default)]
    pub avg: StatLine,
    #[serde(default)]
    pub total: StatLine,
}

impl StatBlock {
    pub fn games_played(&self) -> f64 {
        self.total.value(Stat::Gp).max(0.0)
    }

    /// Cumulative total for `stat`, falling back to `avg * GP` when only the
    /// average was reported.
    pub fn cumulative(&self, stat: Stat) -> f64 {
        self.total
            .get(stat)
            .unwrap_or_else(|| self.avg.value(stat) * self.games_played())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerStats {
    #[serde(default)]
    pub projected: Option<StatBlock>,
    #[serde(default)]
    pub last_7: Option<StatBlock>,
    #[serde(default)]
    pub last_15: Option<StatBlock>,
    #[serde(default)]
    pub last_30: Option<StatBlock>,
    #[serde(default)]
    pub season: Option<StatBlock>,
}

impl PlayerStats {
    /// Recency windows from narrowest to widest.
    pub fn windows(&self) -> [Option<&StatBlock>; 4] {
        [
            self.last_7.as_ref(),
            self.last_15.as_ref(),
            self.last_30.as_ref(),
            self.season.as_ref(),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledGame {
    pub date: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub player_id: u32,
    pub name: String,
    #[serde(default)]
    pub position: String,
    #[serde(default)]
    pub pro_team: String,
    #[serde(default)]
    pub percent_owned: f64,
    #[serde(default)]
    pub injured: bool,
    #[serde(default = "default_injury_status")]
    pub injury_status: String,
    #[serde(default)]
    pub schedule: BTreeMap<GameDayId, ScheduledGame>,
    #[serde(default)]
    pub stats: PlayerStats,
}

fn default_injury_status() -> String {
    "ACTIVE".to_string()
}

impl Player {
    pub fn is_suspended(&self) -> bool {
        self.injury_status.eq_ignore_ascii_case("SUSPENSION")
    }

    pub fn is_available(&self) -> bool {
        !self.injured && !self.is_suspended()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Team {
    pub team_id: u32,
    pub abbrev: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub manager: String,
    #[serde(default)]
    pub logo_url: String,
    #[serde(default)]
    pub wins: u32,
    #[serde(default)]
    pub losses: u32,
    #[serde(default)]
    pub ties: u32,
    #[serde(default)]
    pub standing: u32,
    #[serde(default)]
    pub roster: Vec<Player>,
}

impl Team {
    pub fn record(&self) -> String {
        format!("{}-{}-{}", self.wins, self.losses, self.ties)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineupEntry {
    pub player_id: u32,
    #[serde(default)]
    pub games_played: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Home,
    Away,
}

impl Side {
    pub fn label(self) -> &'static str {
        match self {
            Side::Home => "home",
            Side::Away => "away",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoxScore {
    pub home_team: u32,
    #[serde(default)]
    pub away_team: Option<u32>,
    #[serde(default)]
    pub home_stats: StatLine,
    #[serde(default)]
    pub away_stats: StatLine,
    #[serde(default)]
    pub home_lineup: Vec<LineupEntry>,
    #[serde(default)]
    pub away_lineup: Vec<LineupEntry>,
}

impl BoxScore {
    pub fn side_of(&self, team_id: u32) -> Option<Side> {
        if team_id == self.home_team {
            Some(Side::Home)
        } else if self.away_team == Some(team_id) {
            Some(Side::Away)
        } else {
            None
        }
    }

    pub fn stats(&self, side: Side) -> &StatLine {
        match side {
            Side::Home => &self.home_stats,
            Side::Away => &self.away_stats,
        }
    }

    pub fn lineup(&self, side: Side) -> &[LineupEntry] {
        match side {
            Side::Home => &self.home_lineup,
            Side::Away => &self.away_lineup,
        }
    }

    pub fn is_bye(&self) -> bool {
        self.away_team.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeagueSnapshot {
    pub league_id: String,
    pub year: i32,
    pub current_matchup_period: u32,
    #[serde(default)]
    pub teams: Vec<Team>,
    #[serde(default)]
    pub box_scores: Vec<BoxScore>,
}

impl LeagueSnapshot {
    pub fn team(&self, team_id: u32) -> Option<&Team> {
        self.teams.iter().find(|t| t.team_id == team_id)
    }

    pub fn players(&self) -> impl Iterator<Item = &Player> {
        self.teams.iter().flat_map(|t| t.roster.iter())
    }
}
