use std::fmt;

use chrono::NaiveDateTime;
use once_cell::sync::OnceCell;

use crate::league::{GameDayId, Player, PlayerStats, Stat, StatBlock};

pub const PROJECTION_HORIZON: usize = 30;

pub trait Projector {
    fn projection(&self, stat: Stat) -> f64;
}

#[derive(Debug, Clone)]
pub struct PlayerStart<'a> {
    player: &'a Player,
    game_day_id: GameDayId,
    game_time: NaiveDateTime,
    injured: bool,
    horizon: usize,
    projections: [OnceCell<f64>; Stat::ALL.len()],
}

impl<'a> PlayerStart<'a> {
    pub fn new(player: &'a Player, game_day_id: GameDayId, game_time: NaiveDateTime) -> Self {
        Self::with_horizon(player, game_day_id, game_time, PROJECTION_HORIZON)
    }

    pub fn with_horizon(
        player: &'a Player,
        game_day_id: GameDayId,
        game_time: NaiveDateTime,
        horizon: usize,
    ) -> Self {
        Self {
            player,
            game_day_id,
            game_time,
            injured: player.injured,
            horizon: horizon.max(1),
            projections: std::array::from_fn(|_| OnceCell::new()),
        }
    }

    pub fn player(&self) -> &'a Player {
        self.player
    }

    pub fn player_id(&self) -> u32 {
        self.player.player_id
    }

    pub fn game_day_id(&self) -> GameDayId {
        self.game_day_id
    }

    pub fn game_time(&self) -> NaiveDateTime {
        self.game_time
    }

    pub fn injured(&self) -> bool {
        self.injured
    }
}

impl Projector for PlayerStart<'_> {
    fn projection(&self, stat: Stat) -> f64 {
        *self.projections[stat.index()]
            .get_or_init(|| project(&self.player.stats, stat, self.horizon))
    }
}

impl fmt::Display for PlayerStart<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Start({}, Date({}))",
            self.player.name,
            self.game_time.date()
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Window {
    value: f64,
    games: usize,
}

#[derive(Debug, Clone, Copy, Default)]
struct Cumulative {
    amount: f64,
    attempts: f64,
}

/// Recency-weighted estimate for one game: the nested recency windows are
/// expanded into a per-game series (newest first), cut at `horizon`, padded on
/// the old end with the preseason average and folded oldest-first through an
/// exponential moving average.
fn project(stats: &PlayerStats, stat: Stat, horizon: usize) -> f64 {
    let preseason = preseason_value(stats.projected.as_ref(), stat);

    let mut series = Vec::with_capacity(horizon);
    for window in recency_windows(stats, stat, preseason) {
        let room = horizon - series.len();
        series.extend(std::iter::repeat_n(window.value, window.games.min(room)));
        if series.len() >= horizon {
            break;
        }
    }
    series.resize(horizon, preseason);
    series.reverse();
    ema(&series)
}

fn recency_windows(stats: &PlayerStats, stat: Stat, fallback: f64) -> Vec<Window> {
    let mut out = Vec::new();
    let mut prev_gp = 0.0;
    let mut prev = Cumulative::default();

    for block in stats.windows().into_iter().flatten() {
        let gp = block.games_played();
        if gp < prev_gp {
            continue;
        }
        let cur = cumulative(block, stat);
        let games = (gp - prev_gp).round() as usize;
        if games > 0 {
            let value = if stat.is_ratio() {
                let attempts = cur.attempts - prev.attempts;
                if attempts > 0.0 {
                    ((cur.amount - prev.amount) / attempts).clamp(0.0, 1.0)
                } else {
                    fallback
                }
            } else {
                ((cur.amount - prev.amount) / (gp - prev_gp).max(1.0)).max(0.0)
            };
            out.push(Window { value, games });
        }
        prev_gp = gp;
        prev = cur;
    }
    out
}

fn cumulative(block: &StatBlock, stat: Stat) -> Cumulative {
    match stat.ratio_parts() {
        Some((attempts, makes)) => Cumulative {
            amount: block.cumulative(makes),
            attempts: block.cumulative(attempts),
        },
        None => Cumulative {
            amount: block.cumulative(stat),
            attempts: 0.0,
        },
    }
}

fn preseason_value(block: Option<&StatBlock>, stat: Stat) -> f64 {
    let Some(block) = block else {
        return 0.0;
    };
    if let Some((attempts, makes)) = stat.ratio_parts()
        && block.avg.get(stat).is_none()
    {
        let att = block.avg.value(attempts);
        return if att > 0.0 {
            (block.avg.value(makes) / att).clamp(0.0, 1.0)
        } else {
            0.0
        };
    }
    block.avg.value(stat)
}

fn ema(values: &[f64]) -> f64 {
    let Some((&first, rest)) = values.split_first() else {
        return 0.0;
    };
    let alpha = 2.0 / (values.len() as f64 + 1.0);
    rest.iter().fold(first, |acc, &v| alpha * v + (1.0 - alpha) * acc)
}
