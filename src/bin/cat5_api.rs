use std::collections::HashMap;

use anyhow::{Result, anyhow};
use serde_json::json;

use cat5::api::DataApi;
use cat5::config::Settings;
use cat5::store::open_store;

fn main() -> Result<()> {
    cat5::init_logging();

    let settings = Settings::from_env();
    let tag = parse_string_arg("--tag").ok_or_else(|| anyhow!("missing --tag"))?;
    let path = parse_string_arg("--path").unwrap_or_else(|| "/data".to_string());
    let method = parse_string_arg("--method").unwrap_or_else(|| "GET".to_string());

    let mut params = HashMap::from([("tag".to_string(), tag)]);
    if has_flag("--no-cache") {
        params.insert("cache".to_string(), "none".to_string());
    }
    let event = json!({
        "path": path,
        "httpMethod": method,
        "queryStringParameters": params,
    });

    let store = open_store(&settings, settings.read_mode)?;
    let mut api = DataApi::new(store, settings.cache_ttl_secs);
    let resp = api.handle(&event);
    println!("{}", serde_json::to_string_pretty(&resp)?);
    Ok(())
}

fn parse_string_arg(name: &str) -> Option<String> {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    for (idx, arg) in args.iter().enumerate() {
        if let Some(raw) = arg.strip_prefix(&format!("{name}="))
            && !raw.trim().is_empty()
        {
            return Some(raw.trim().to_string());
        }
        if arg == name
            && let Some(next) = args.get(idx + 1)
            && !next.trim().is_empty()
        {
            return Some(next.trim().to_string());
        }
    }
    None
}

fn has_flag(name: &str) -> bool {
    std::env::args().skip(1).any(|arg| arg == name)
}
