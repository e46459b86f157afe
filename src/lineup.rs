use std::collections::HashMap;
use std::fmt;

use chrono::NaiveDateTime;
use rand::Rng;

use crate::error::{Cat5Error, Result};
use crate::league::{BoxScore, Side, Stat, Team};
use crate::period::MatchupPeriod;
use crate::sample::{clip_weights, normalize, sample_indices};
use crate::start::PlayerStart;

#[derive(Debug, Clone)]
pub struct EligibleStart<'a> {
    pub start: PlayerStart<'a>,
    pub std_weight: f64,
    pub probable_weight: f64,
}

#[derive(Debug, Clone)]
pub struct Lineup<'a> {
    team: &'a Team,
    side: Side,
    eligible: Vec<EligibleStart<'a>>,
    remaining_gp: usize,
    selected: Vec<usize>,
}

impl<'a> Lineup<'a> {
    pub fn new(
        team: &'a Team,
        box_score: &BoxScore,
        period: &MatchupPeriod,
        from_date: NaiveDateTime,
    ) -> Result<Self> {
        let side = box_score
            .side_of(team.team_id)
            .ok_or(Cat5Error::TeamNotInMatchup {
                team_id: team.team_id,
            })?;

        let player_gp: HashMap<u32, f64> = box_score
            .lineup(side)
            .iter()
            .map(|entry| (entry.player_id, entry.games_played.max(0.0)))
            .collect();

        let mut eligible = Vec::new();
        for player in &team.roster {
            if !player.is_available() {
                continue;
            }
            let gp = player_gp.get(&player.player_id).copied().unwrap_or(0.0);
            for (gid, game) in &player.schedule {
                if !period.contains_game_day(*gid) || game.date < from_date {
                    continue;
                }
                eligible.push(EligibleStart {
                    start: PlayerStart::new(player, *gid, game.date),
                    std_weight: player.percent_owned,
                    probable_weight: probable_weight(player.percent_owned, gp),
                });
            }
        }

        let used = box_score.stats(side).value(Stat::Gp).max(0.0);
        let remaining_gp = (f64::from(period.max_gp) - used).max(0.0).round() as usize;

        let mut lineup = Self {
            team,
            side,
            eligible,
            remaining_gp,
            selected: Vec::new(),
        };
        lineup.set_default();
        Ok(lineup)
    }

    pub fn team(&self) -> &'a Team {
        self.team
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn remaining_gp(&self) -> usize {
        self.remaining_gp
    }

    pub fn eligible_starts(&self) -> &[EligibleStart<'a>] {
        &self.eligible
    }

    pub fn selected(&self) -> &[usize] {
        &self.selected
    }

    pub fn selected_starts(&self) -> impl Iterator<Item = &PlayerStart<'a>> + '_ {
        self.selected.iter().map(|i| &self.eligible[*i].start)
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    pub fn set_default(&mut self) {
        self.selected = self.top_by(|e| e.std_weight);
    }

    pub fn set_probable(&mut self) {
        self.selected = self.top_by(|e| e.probable_weight);
    }

    pub fn set_randomly<R: Rng + ?Sized>(
        &mut self,
        probable: bool,
        min_w: f64,
        max_w: f64,
        rng: &mut R,
    ) -> Result<()> {
        self.selected = self.draw_random(probable, min_w, max_w, rng)?;
        Ok(())
    }

    pub fn draw_random<R: Rng + ?Sized>(
        &self,
        probable: bool,
        min_w: f64,
        max_w: f64,
        rng: &mut R,
    ) -> Result<Vec<usize>> {
        // everything fits, nothing to sample
        if self.eligible.len() <= self.remaining_gp {
            return Ok((0..self.eligible.len()).collect());
        }
        let weights: Vec<f64> = self
            .eligible
            .iter()
            .map(|e| if probable { e.probable_weight } else { e.std_weight })
            .collect();
        let probs = normalize(&clip_weights(&weights, min_w, max_w));
        sample_indices(&probs, self.remaining_gp, rng)
    }

    pub(crate) fn set_selection(&mut self, selected: Vec<usize>) {
        self.selected = selected;
    }

    fn top_by(&self, weight: impl Fn(&EligibleStart<'a>) -> f64) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.eligible.len()).collect();
        order.sort_by(|a, b| weight(&self.eligible[*b]).total_cmp(&weight(&self.eligible[*a])));
        order.truncate(self.remaining_gp);
        order
    }
}

impl fmt::Display for Lineup<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Lineup(")?;
        for (n, start) in self.selected_starts().enumerate() {
            if n > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{start}")?;
        }
        write!(f, ")")
    }
}

/// `(percent_owned + 100 * gp) / (1 + gp)`: each game already played counts
/// as one fully-owned observation.
pub fn probable_weight(percent_owned: f64, gp: f64) -> f64 {
    let gp = gp.max(0.0);
    (percent_owned + 100.0 * gp) / (1.0 + gp)
}
