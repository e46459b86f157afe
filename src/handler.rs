use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::config::Settings;
use crate::processor::Processor;
use crate::provider::LeagueSource;
use crate::store::ResultStore;

pub const STATUS_SUCCESS: &str = "SUCCESS";
pub const STATUS_ERROR: &str = "ERROR";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessPayload {
    pub tag: String,
    #[serde(deserialize_with = "string_or_number")]
    pub league_id: String,
    pub year: i32,
    #[serde(default)]
    pub iter: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessResponse {
    pub status: String,
    pub msg: String,
    pub tag: String,
}

pub fn parse_payload(event: &Value) -> Result<ProcessPayload> {
    let payload = match event.get("detail-type").and_then(Value::as_str) {
        Some("Scheduled Event") => event.get("detail").cloned().unwrap_or(Value::Null),
        _ => event.clone(),
    };
    Ok(serde_json::from_value(payload)?)
}

/// Fetch, process and persist one league. An invalid payload is reported in
/// the response; failures after that propagate.
pub fn handle_process_event(
    event: &Value,
    source: &dyn LeagueSource,
    store: &mut dyn ResultStore,
    settings: &Settings,
    now: NaiveDateTime,
) -> Result<ProcessResponse> {
    let payload = match parse_payload(event) {
        Ok(payload) => payload,
        Err(err) => {
            warn!(error = %err, "invalid payload");
            return Ok(ProcessResponse {
                status: STATUS_ERROR.to_string(),
                msg: format!("invalid payload: {err}"),
                tag: String::new(),
            });
        }
    };

    info!(
        tag = payload.tag.as_str(),
        league = payload.league_id.as_str(),
        year = payload.year,
        "fetching league"
    );
    let league = source.fetch(&payload.league_id, payload.year)?;

    let calendar = settings.period_calendar()?;
    let mut processor = Processor::new(&league, &calendar, settings, now)?;
    if let Some(n) = payload.iter.filter(|n| *n > 0) {
        processor.n_iter = n;
    }
    info!(iterations = processor.n_iter, seed = processor.seed, "running processor");
    let instance = processor.build()?;

    let data = instance
        .to_rounded_json()
        .context("serialize processor output")?;
    store.write(&payload.tag, &data)?;
    info!(tag = payload.tag.as_str(), "update saved to db");

    Ok(ProcessResponse {
        status: STATUS_SUCCESS.to_string(),
        msg: "update saved to db".to_string(),
        tag: payload.tag,
    })
}

fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Int(i64),
    }
    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(s) => s,
        Raw::Int(n) => n.to_string(),
    })
}
