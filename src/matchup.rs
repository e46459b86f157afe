use std::collections::HashMap;
use std::fmt;

use chrono::NaiveDateTime;
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use rayon::prelude::*;
use tracing::debug;

use crate::config::Settings;
use crate::error::{Cat5Error, Result};
use crate::league::{BoxScore, LeagueSnapshot, Player, Side, Team};
use crate::lineup::Lineup;
use crate::model::Model;
use crate::period::MatchupPeriod;
use crate::start::PlayerStart;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayerValue<'a> {
    pub player: &'a Player,
    pub value: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchOptions {
    pub trials: usize,
    pub seed: u64,
    pub min_weight: f64,
    pub max_weight: f64,
    pub parallelism: usize,
}

impl SearchOptions {
    pub fn new(trials: usize, seed: u64) -> Self {
        Self {
            trials,
            seed,
            min_weight: 20.0,
            max_weight: 80.0,
            parallelism: 4,
        }
    }

    pub fn from_settings(settings: &Settings, trials: usize, seed: u64) -> Self {
        Self {
            min_weight: settings.min_weight,
            max_weight: settings.max_weight,
            parallelism: settings.parallelism,
            ..Self::new(trials, seed)
        }
    }
}

#[derive(Debug)]
struct Trial {
    picks: Vec<usize>,
    value: f64,
}

#[derive(Debug, Clone)]
pub struct Matchup<'a> {
    box_score: &'a BoxScore,
    home: Lineup<'a>,
    away: Lineup<'a>,
}

impl<'a> Matchup<'a> {
    pub fn new(
        league: &'a LeagueSnapshot,
        box_score: &'a BoxScore,
        period: &'a MatchupPeriod,
        from_date: NaiveDateTime,
    ) -> Result<Self> {
        let away_id = box_score.away_team.ok_or(Cat5Error::MissingOpponent {
            team_id: box_score.home_team,
        })?;
        let home_team = league
            .team(box_score.home_team)
            .ok_or(Cat5Error::UnknownTeam(box_score.home_team))?;
        let away_team = league
            .team(away_id)
            .ok_or(Cat5Error::UnknownTeam(away_id))?;
        Self::from_teams(home_team, away_team, box_score, period, from_date)
    }

    pub fn from_teams(
        home_team: &'a Team,
        away_team: &'a Team,
        box_score: &'a BoxScore,
        period: &'a MatchupPeriod,
        from_date: NaiveDateTime,
    ) -> Result<Self> {
        let home = Lineup::new(home_team, box_score, period, from_date)?;
        let away = Lineup::new(away_team, box_score, period, from_date)?;
        if home.side() != Side::Home || away.side() != Side::Away {
            return Err(Cat5Error::TeamNotInMatchup {
                team_id: if home.side() != Side::Home {
                    home_team.team_id
                } else {
                    away_team.team_id
                },
            });
        }
        Ok(Self {
            box_score,
            home,
            away,
        })
    }

    pub fn box_score(&self) -> &'a BoxScore {
        self.box_score
    }

    pub fn home_team(&self) -> &'a Team {
        self.home.team()
    }

    pub fn away_team(&self) -> &'a Team {
        self.away.team()
    }

    pub fn home_lineup(&self) -> &Lineup<'a> {
        &self.home
    }

    pub fn away_lineup(&self) -> &Lineup<'a> {
        &self.away
    }

    pub fn lineup(&self, side: Side) -> &Lineup<'a> {
        match side {
            Side::Home => &self.home,
            Side::Away => &self.away,
        }
    }

    pub fn lineup_mut(&mut self, side: Side) -> &mut Lineup<'a> {
        match side {
            Side::Home => &mut self.home,
            Side::Away => &mut self.away,
        }
    }

    pub fn set_probable(&mut self) {
        self.home.set_probable();
        self.away.set_probable();
    }

    pub fn get_model(&self) -> Model<'_, PlayerStart<'a>> {
        Model::from_box_score(
            self.box_score,
            self.home.selected_starts(),
            self.away.selected_starts(),
        )
    }

    pub fn optimize_home_lineup(&mut self, n: usize, seed: u64) -> Result<Vec<PlayerValue<'a>>> {
        self.optimize_lineup(Side::Home, &SearchOptions::new(n, seed))
    }

    pub fn optimize_away_lineup(&mut self, n: usize, seed: u64) -> Result<Vec<PlayerValue<'a>>> {
        self.optimize_lineup(Side::Away, &SearchOptions::new(n, seed))
    }

    /// Monte Carlo search over `side`'s selection with the opponent held
    /// fixed. Each trial draws a weighted random lineup and scores it by the
    /// side's own win probability. The side ends up on the members of the
    /// best trial (first seen on ties), ordered by average player value.
    /// Returns every sampled player ranked by that average value.
    pub fn optimize_lineup(
        &mut self,
        side: Side,
        opts: &SearchOptions,
    ) -> Result<Vec<PlayerValue<'a>>> {
        let trials = self.run_trials(side, opts)?;
        let target = self.lineup(side);

        let mut totals: HashMap<u32, (&'a Player, f64, usize)> = HashMap::new();
        let mut best: Option<&Trial> = None;
        for trial in &trials {
            for idx in &trial.picks {
                let player = target.eligible_starts()[*idx].start.player();
                let entry = totals.entry(player.player_id).or_insert((player, 0.0, 0));
                entry.1 += trial.value;
                entry.2 += 1;
            }
            if best.is_none_or(|b| trial.value > b.value) {
                best = Some(trial);
            }
        }

        let mut ranking: Vec<PlayerValue<'a>> = totals
            .values()
            .map(|&(player, sum, count)| PlayerValue {
                player,
                value: sum / count as f64,
            })
            .collect();
        ranking.sort_by(|a, b| {
            b.value
                .total_cmp(&a.value)
                .then(a.player.player_id.cmp(&b.player.player_id))
        });

        let Some(best) = best else {
            return Ok(ranking);
        };
        debug!(
            side = side.label(),
            team = target.team().abbrev.as_str(),
            trials = trials.len(),
            best = best.value,
            "lineup search finished"
        );

        let value_of = |idx: &usize| {
            let pid = target.eligible_starts()[*idx].start.player_id();
            totals
                .get(&pid)
                .map_or(0.0, |&(_, sum, count)| sum / count as f64)
        };
        let mut picks = best.picks.clone();
        picks.sort_by(|a, b| value_of(b).total_cmp(&value_of(a)));
        self.lineup_mut(side).set_selection(picks);

        Ok(ranking)
    }

    fn run_trials(&self, side: Side, opts: &SearchOptions) -> Result<Vec<Trial>> {
        let mut master = StdRng::seed_from_u64(opts.seed);
        let seeds: Vec<u64> = (0..opts.trials).map(|_| master.next_u64()).collect();

        let target = self.lineup(side);
        let other = match side {
            Side::Home => &self.away,
            Side::Away => &self.home,
        };
        let box_score = self.box_score;

        with_trial_pool(opts.parallelism, || {
            seeds
                .par_iter()
                .map(|seed| -> Result<Trial> {
                    let mut rng = StdRng::seed_from_u64(*seed);
                    let picks =
                        target.draw_random(false, opts.min_weight, opts.max_weight, &mut rng)?;
                    let picked = picks.iter().map(|i| &target.eligible_starts()[*i].start);
                    let model = match side {
                        Side::Home => Model::from_box_score(box_score, picked, other.selected_starts()),
                        Side::Away => Model::from_box_score(box_score, other.selected_starts(), picked),
                    };
                    let home_win = model.predict_win()?;
                    let value = match side {
                        Side::Home => home_win,
                        Side::Away => 1.0 - home_win,
                    };
                    Ok(Trial { picks, value })
                })
                .collect::<Result<Vec<_>>>()
        })
    }
}

impl fmt::Display for Matchup<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Cat5Matchup(H:{}, A:{})",
            self.home.team().abbrev,
            self.away.team().abbrev
        )
    }
}

fn with_trial_pool<T>(threads: usize, action: impl FnOnce() -> T + Send) -> T
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
