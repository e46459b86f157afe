use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use tracing::{debug, info};

use crate::config::{PeriodCalendar, Settings};
use crate::league::{BoxScore, LeagueSnapshot, Side, Stat};
use crate::matchup::{Matchup, SearchOptions};
use crate::output::{self, Cat5Instance, Forecast, MatchupForecasts};
use crate::period::MatchupPeriod;

/// Turns one league snapshot into the full set of forecasts for its current
/// matchup period.
#[derive(Debug)]
pub struct Processor<'a> {
    league: &'a LeagueSnapshot,
    period: MatchupPeriod,
    now: NaiveDateTime,
    settings: Settings,
    pub n_iter: usize,
    pub seed: u64,
}

impl<'a> Processor<'a> {
    pub fn new(
        league: &'a LeagueSnapshot,
        calendar: &PeriodCalendar,
        settings: &Settings,
        now: NaiveDateTime,
    ) -> Result<Self> {
        let period = MatchupPeriod::new(league, calendar, settings.starts_per_gameday)
            .with_context(|| format!("matchup period for league {}", league.league_id))?;
        info!(
            period = period.period,
            start = %period.start_date,
            end = %period.end_date,
            game_days = period.game_day_ids.len(),
            max_gp = period.max_gp,
            "matchup period computed"
        );
        Ok(Self {
            league,
            period,
            now,
            settings: settings.clone(),
            n_iter: settings.iterations,
            seed: settings.seed.unwrap_or_else(|| rand::thread_rng().next_u64()),
        })
    }

    pub fn period(&self) -> &MatchupPeriod {
        &self.period
    }

    pub fn build(&self) -> Result<Cat5Instance> {
        let mut seeds = StdRng::seed_from_u64(self.seed);
        let mut matchups = Vec::new();
        for box_score in &self.league.box_scores {
            if box_score.is_bye() {
                info!(team = box_score.home_team, "bye week, skipping");
                continue;
            }
            let home_seed = seeds.next_u64();
            let away_seed = seeds.next_u64();
            matchups.push(self.build_matchup(box_score, home_seed, away_seed)?);
        }

        Ok(Cat5Instance {
            league_id: self.league.league_id.clone(),
            matchup_period: self.period.period,
            update_timestamp: self.now.and_utc().timestamp(),
            max_gp: self.period.max_gp,
            matchups,
            teams: self
                .league
                .teams
                .iter()
                .map(|t| (t.team_id, output::Team::from(t)))
                .collect(),
            players: self
                .league
                .players()
                .map(|p| (p.player_id, output::Player::from(p)))
                .collect(),
        })
    }

    fn build_matchup(
        &self,
        box_score: &BoxScore,
        home_seed: u64,
        away_seed: u64,
    ) -> Result<output::Matchup> {
        let mut matchup = Matchup::new(self.league, box_score, &self.period, self.now)
            .with_context(|| format!("matchup for home team {}", box_score.home_team))?;
        debug!(%matchup, "forecasting");

        matchup.set_probable();
        let default = Forecast::from_model(&matchup.get_model())?;

        matchup.set_probable();
        let home_values =
            matchup.optimize_lineup(Side::Home, &self.search_options(home_seed))?;
        let home_optimized = Forecast::from_model(&matchup.get_model())?;
        let home_gp = self.games_played(&matchup, Side::Home);

        matchup.set_probable();
        let away_values =
            matchup.optimize_lineup(Side::Away, &self.search_options(away_seed))?;
        let away_optimized = Forecast::from_model(&matchup.get_model())?;
        let away_gp = self.games_played(&matchup, Side::Away);

        let home_team = matchup.home_team();
        let away_team = matchup.away_team();
        Ok(output::Matchup {
            desc: format!(
                "({}) {} @ {}",
                self.period.period, away_team.abbrev, home_team.abbrev
            ),
            home_team: home_team.team_id.to_string(),
            away_team: away_team.team_id.to_string(),
            forecasts: MatchupForecasts {
                default,
                home_optimized,
                away_optimized,
            },
            home_player_value: home_values.iter().map(output::PlayerValue::from).collect(),
            away_player_value: away_values.iter().map(output::PlayerValue::from).collect(),
            home_gp,
            away_gp,
        })
    }

    fn search_options(&self, seed: u64) -> SearchOptions {
        SearchOptions::from_settings(&self.settings, self.n_iter, seed)
    }

    fn games_played(&self, matchup: &Matchup<'_>, side: Side) -> u32 {
        let played = matchup.box_score().stats(side).value(Stat::Gp).max(0.0).round() as u32;
        played + matchup.lineup(side).len() as u32
    }
}
