use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;
use crate::league;
use crate::matchup::PlayerValue as RankedPlayer;
use crate::model::Model;
use crate::start::Projector;

pub const OUTPUT_PRECISION: u32 = 4;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Forecast {
    pub win: f64,
    pub cat_win: BTreeMap<String, f64>,
}

impl Forecast {
    pub fn from_model<S: Projector>(model: &Model<'_, S>) -> Result<Self> {
        let cat_win = model
            .predict_cats()?
            .into_iter()
            .map(|(stat, p)| (stat.as_str().to_string(), p))
            .collect();
        Ok(Self {
            win: model.predict_win()?,
            cat_win,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchupForecasts {
    pub default: Forecast,
    pub home_optimized: Forecast,
    pub away_optimized: Forecast,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerValue {
    pub player: String,
    pub value: f64,
}

impl From<&RankedPlayer<'_>> for PlayerValue {
    fn from(pv: &RankedPlayer<'_>) -> Self {
        Self {
            player: pv.player.player_id.to_string(),
            value: pv.value,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Matchup {
    pub desc: String,
    pub home_team: String,
    pub away_team: String,
    pub forecasts: MatchupForecasts,
    pub home_player_value: Vec<PlayerValue>,
    pub away_player_value: Vec<PlayerValue>,
    #[serde(rename = "homeGP")]
    pub home_gp: u32,
    #[serde(rename = "awayGP")]
    pub away_gp: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Team {
    pub abbrev: String,
    pub name: String,
    pub manager: String,
    pub logo_url: String,
    pub record: String,
    pub seed: u32,
}

impl From<&league::Team> for Team {
    fn from(team: &league::Team) -> Self {
        Self {
            abbrev: team.abbrev.clone(),
            name: team.name.clone(),
            manager: team.manager.clone(),
            logo_url: team.logo_url.clone(),
            record: team.record(),
            seed: team.standing,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub name: String,
    pub pos: String,
    pub pro_team: String,
}

impl From<&league::Player> for Player {
    fn from(player: &league::Player) -> Self {
        Self {
            name: player.name.clone(),
            pos: player.position.clone(),
            pro_team: player.pro_team.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cat5Instance {
    pub league_id: String,
    pub matchup_period: u32,
    pub update_timestamp: i64,
    #[serde(rename = "maxGP")]
    pub max_gp: u32,
    pub matchups: Vec<Matchup>,
    pub teams: BTreeMap<u32, Team>,
    pub players: BTreeMap<u32, Player>,
}

impl Cat5Instance {
    pub fn to_rounded_json(&self) -> serde_json::Result<Value> {
        let mut value = serde_json::to_value(self)?;
        round_floats(&mut value, OUTPUT_PRECISION);
        Ok(value)
    }
}

/// Round every floating-point number in a JSON tree in place. Integers and
/// non-numeric values are left alone.
pub fn round_floats(value: &mut Value, ndigits: u32) {
    match value {
        Value::Array(items) => items.iter_mut().for_each(|v| round_floats(v, ndigits)),
        Value::Object(map) => map.values_mut().for_each(|v| round_floats(v, ndigits)),
        Value::Number(n) if n.is_f64() => {
            if let Some(rounded) = n
                .as_f64()
                .map(|x| round_to(x, ndigits))
                .and_then(serde_json::Number::from_f64)
            {
                *n = rounded;
            }
        }
        _ => {}
    }
}

pub fn round_to(x: f64, ndigits: u32) -> f64 {
    let scale = 10f64.powi(ndigits as i32);
    (x * scale).round() / scale
}
