use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{debug, warn};

use crate::store::ResultStore;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse {
    pub status_code: u16,
    pub headers: BTreeMap<String, String>,
    pub body: String,
}

impl ApiResponse {
    fn new(status_code: u16, body: &Value) -> Self {
        let headers = [
            ("Content-Type", "application/json"),
            ("Access-Control-Allow-Origin", "*"),
            ("Access-Control-Allow-Headers", "application/json"),
            ("Access-Control-Allow-Methods", "GET"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        Self {
            status_code,
            headers,
            body: body.to_string(),
        }
    }

    fn error(status_code: u16, msg: impl Into<String>) -> Self {
        Self::new(status_code, &json!({ "error": msg.into() }))
    }

    pub fn body_json(&self) -> serde_json::Result<Value> {
        serde_json::from_str(&self.body)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiEvent {
    path: String,
    http_method: String,
    #[serde(default)]
    query_string_parameters: Option<HashMap<String, String>>,
}

#[derive(Debug, Clone)]
struct CacheItem {
    data: Value,
    expires_at: DateTime<Utc>,
}

pub struct DataApi<S> {
    store: S,
    ttl: Duration,
    cache: HashMap<String, CacheItem>,
}

impl<S: ResultStore> DataApi<S> {
    pub fn new(store: S, ttl_secs: u64) -> Self {
        let ttl_secs = i64::try_from(ttl_secs)
            .unwrap_or(i64::MAX)
            .min(i64::MAX / 1000);
        Self {
            store,
            ttl: Duration::seconds(ttl_secs),
            cache: HashMap::new(),
        }
    }

    pub fn handle(&mut self, event: &Value) -> ApiResponse {
        self.handle_at(event, Utc::now())
    }

    pub fn handle_at(&mut self, event: &Value, now: DateTime<Utc>) -> ApiResponse {
        let (event, tag, cache_param) = match parse_event(event) {
            Ok(parsed) => parsed,
            Err(err) => return ApiResponse::error(400, format!("bad request: {err}")),
        };

        if event.path != "/data" {
            return ApiResponse::error(404, "invalid path");
        }
        if event.http_method != "GET" {
            return ApiResponse::error(405, "method not allowed");
        }

        if cache_param != "none"
            && let Some(item) = self.cache.get(&tag)
        {
            if item.expires_at > now {
                debug!(tag = tag.as_str(), "api cache hit");
                return ApiResponse::new(200, &item.data);
            }
            self.cache.remove(&tag);
        }
        debug!(tag = tag.as_str(), "api cache miss");

        match self.store.read(&tag) {
            Ok(Some(data)) => {
                let resp = ApiResponse::new(200, &data);
                self.cache.insert(
                    tag,
                    CacheItem {
                        data,
                        expires_at: now
                            .checked_add_signed(self.ttl)
                            .unwrap_or(DateTime::<Utc>::MAX_UTC),
                    },
                );
                resp
            }
            Ok(None) => ApiResponse::error(404, format!("not found: {tag}")),
            Err(err) => {
                warn!(tag = tag.as_str(), error = %err, "store read failed");
                ApiResponse::error(500, format!("unexpected error: {err:#}"))
            }
        }
    }
}

fn parse_event(raw: &Value) -> anyhow::Result<(ApiEvent, String, String)> {
    let event: ApiEvent = serde_json::from_value(raw.clone())?;
    let params = event.query_string_parameters.clone().unwrap_or_default();
    let tag = params
        .get("tag")
        .cloned()
        .ok_or_else(|| anyhow::anyhow!("missing query parameter 'tag'"))?;
    let cache = params.get("cache").cloned().unwrap_or_default();
    Ok((event, tag, cache))
}
