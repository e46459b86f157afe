use chrono::{Duration, TimeZone, Utc};
use serde_json::{Value, json};

use cat5::api::DataApi;
use cat5::store::{MockStore, ResultStore};

fn get(tag: &str) -> Value {
    json!({
        "path": "/data",
        "httpMethod": "GET",
        "queryStringParameters": {"tag": tag}
    })
}

fn api_with(data: &[(&str, Value)]) -> (tempfile::TempDir, DataApi<MockStore>) {
    let dir = tempfile::tempdir().unwrap();
    let mut store = MockStore::new(dir.path(), "Cat5Table");
    for (key, value) in data {
        store.write(key, value).unwrap();
    }
    (dir, DataApi::new(store, 300))
}

#[test]
fn serves_stored_result_with_cors_headers() {
    let (_dir, mut api) = api_with(&[("w12", json!({"leagueId": "98765"}))]);
    let resp = api.handle(&get("w12"));
    assert_eq!(resp.status_code, 200);
    assert_eq!(resp.body_json().unwrap(), json!({"leagueId": "98765"}));
    assert_eq!(resp.headers["Content-Type"], "application/json");
    assert_eq!(resp.headers["Access-Control-Allow-Origin"], "*");
    assert_eq!(resp.headers["Access-Control-Allow-Methods"], "GET");
}

#[test]
fn rejects_bad_requests() {
    let (_dir, mut api) = api_with(&[]);

    let missing_tag = json!({"path": "/data", "httpMethod": "GET", "queryStringParameters": {}});
    let resp = api.handle(&missing_tag);
    assert_eq!(resp.status_code, 400);
    let no_params = json!({"path": "/data", "httpMethod": "GET", "queryStringParameters": null});
    assert_eq!(api.handle(&no_params).status_code, 400);
    assert_eq!(api.handle(&json!({"httpMethod": "GET"})).status_code, 400);

    let mut wrong_path = get("w12");
    wrong_path["path"] = json!("/other");
    let resp = api.handle(&wrong_path);
    assert_eq!(resp.status_code, 404);
    assert_eq!(resp.body_json().unwrap(), json!({"error": "invalid path"}));

    let mut post = get("w12");
    post["httpMethod"] = json!("POST");
    assert_eq!(api.handle(&post).status_code, 405);
}

#[test]
fn unknown_tag_is_not_found() {
    let (_dir, mut api) = api_with(&[]);
    let resp = api.handle(&get("nope"));
    assert_eq!(resp.status_code, 404);
    assert_eq!(resp.body_json().unwrap(), json!({"error": "not found: nope"}));
}

#[test]
fn cache_holds_responses_until_ttl() {
    let dir = tempfile::tempdir().unwrap();
    let mut writer = MockStore::new(dir.path(), "Cat5Table");
    writer.write("w12", &json!({"v": 1})).unwrap();
    let mut api = DataApi::new(MockStore::new(dir.path(), "Cat5Table"), 300);

    let t0 = Utc.with_ymd_and_hms(2025, 1, 9, 12, 0, 0).unwrap();
    assert_eq!(api.handle_at(&get("w12"), t0).body_json().unwrap(), json!({"v": 1}));

    writer.write("w12", &json!({"v": 2})).unwrap();
    let cached = api.handle_at(&get("w12"), t0 + Duration::seconds(120));
    assert_eq!(cached.body_json().unwrap(), json!({"v": 1}));

    let mut bypass = get("w12");
    bypass["queryStringParameters"]["cache"] = json!("none");
    let fresh = api.handle_at(&bypass, t0 + Duration::seconds(130));
    assert_eq!(fresh.body_json().unwrap(), json!({"v": 2}));

    writer.write("w12", &json!({"v": 3})).unwrap();
    let expired = api.handle_at(&get("w12"), t0 + Duration::seconds(131 + 300));
    assert_eq!(expired.body_json().unwrap(), json!({"v": 3}));
}
