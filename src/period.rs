use std::collections::BTreeSet;
use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};

use crate::config::PeriodCalendar;
use crate::error::Result;
use crate::league::{GameDayId, LeagueSnapshot};

/// The active scoring period: its date window, the game days that fall in it
/// and the per-team cap on games played.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchupPeriod {
    pub period: u32,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub game_day_ids: BTreeSet<GameDayId>,
    pub max_gp: u32,
}

impl MatchupPeriod {
    pub fn new(
        league: &LeagueSnapshot,
        calendar: &PeriodCalendar,
        starts_per_gameday: u32,
    ) -> Result<Self> {
        let period = league.current_matchup_period;
        let (start_date, end_date) = calendar.bounds(league.year, period)?;

        let mut game_day_ids = BTreeSet::new();
        for player in league.players() {
            for (gid, game) in &player.schedule {
                let day = game.date.date();
                if day >= start_date && day < end_date {
                    game_day_ids.insert(*gid);
                }
            }
        }

        let max_gp = game_day_ids.len() as u32 * starts_per_gameday;
        Ok(Self {
            period,
            start_date,
            end_date,
            game_day_ids,
            max_gp,
        })
    }

    pub fn contains_game_day(&self, gid: GameDayId) -> bool {
        self.game_day_ids.contains(&gid)
    }

    pub fn contains(&self, when: NaiveDateTime) -> bool {
        let day = when.date();
        day >= self.start_date && day < self.end_date
    }
}

impl fmt::Display for MatchupPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "MatchupPeriod(period={}, start={}, end={}, max_gp={})",
            self.period, self.start_date, self.end_date, self.max_gp
        )
    }
}
