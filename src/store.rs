use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, params};
use serde_json::Value;
use tracing::{debug, info};

use crate::config::{Settings, StoreMode};

pub trait ResultStore {
    fn write(&mut self, key: &str, data: &Value) -> Result<()>;
    /// `Ok(None)` when nothing has been written under `key`.
    fn read(&self, key: &str) -> Result<Option<Value>>;
}

impl<S: ResultStore + ?Sized> ResultStore for Box<S> {
    fn write(&mut self, key: &str, data: &Value) -> Result<()> {
        (**self).write(key, data)
    }

    fn read(&self, key: &str) -> Result<Option<Value>> {
        (**self).read(key)
    }
}

/// One pretty-printed JSON file per key under `<root>/<table>/`.
#[derive(Debug, Clone)]
pub struct MockStore {
    dir: PathBuf,
}

impl MockStore {
    pub fn new(root: &Path, table: &str) -> Self {
        Self {
            dir: root.join(table),
        }
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl ResultStore for MockStore {
    fn write(&mut self, key: &str, data: &Value) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("create mock db dir {}", self.dir.display()))?;
        let path = self.path_for(key);
        let raw = serde_json::to_string_pretty(data)?;
        fs::write(&path, raw).with_context(|| format!("write {}", path.display()))?;
        debug!(path = %path.display(), "mock db write");
        Ok(())
    }

    fn read(&self, key: &str) -> Result<Option<Value>> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }
        let raw = fs::read_to_string(&path).with_context(|| format!("read {}", path.display()))?;
        let value = serde_json::from_str(&raw).with_context(|| format!("parse {}", path.display()))?;
        debug!(path = %path.display(), "mock db read");
        Ok(Some(value))
    }
}

#[derive(Debug)]
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("create sqlite dir {}", parent.display()))?;
        }
        let conn =
            Connection::open(path).with_context(|| format!("open sqlite db {}", path.display()))?;
        Self::with_connection(conn)
    }

    pub fn in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory().context("open in-memory sqlite db")?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS results (
                key TEXT PRIMARY KEY,
                data TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            "#,
        )
        .context("create sqlite schema")?;
        Ok(Self { conn })
    }
}

impl ResultStore for SqliteStore {
    fn write(&mut self, key: &str, data: &Value) -> Result<()> {
        let raw = serde_json::to_string(data)?;
        self.conn
            .execute(
                r#"
                INSERT INTO results (key, data, updated_at) VALUES (?1, ?2, ?3)
                ON CONFLICT(key) DO UPDATE SET
                    data = excluded.data,
                    updated_at = excluded.updated_at
                "#,
                params![key, raw, Utc::now().to_rfc3339()],
            )
            .with_context(|| format!("upsert result {key}"))?;
        debug!(key, "prod db write");
        Ok(())
    }

    fn read(&self, key: &str) -> Result<Option<Value>> {
        let raw: Option<String> = self
            .conn
            .query_row(
                "SELECT data FROM results WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()
            .with_context(|| format!("select result {key}"))?;
        let Some(raw) = raw else {
            return Ok(None);
        };
        let value = serde_json::from_str(&raw).with_context(|| format!("decode result {key}"))?;
        debug!(key, "prod db read");
        Ok(Some(value))
    }
}

pub fn open_store(settings: &Settings, mode: StoreMode) -> Result<Box<dyn ResultStore>> {
    info!(mode = mode.label(), table = settings.table.as_str(), "db initialized");
    Ok(match mode {
        StoreMode::Mock => Box::new(MockStore::new(&settings.mock_db_dir, &settings.table)),
        StoreMode::Prod => Box::new(SqliteStore::open(&settings.sqlite_path)?),
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn sqlite_upserts_by_key() {
        let mut store = SqliteStore::in_memory().unwrap();
        assert_eq!(store.read("w1").unwrap(), None);
        store.write("w1", &json!({"win": 0.5})).unwrap();
        store.write("w1", &json!({"win": 0.75})).unwrap();
        assert_eq!(store.read("w1").unwrap(), Some(json!({"win": 0.75})));
    }

    #[test]
    fn sqlite_open_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("db").join("cat5.sqlite");
        let mut store = SqliteStore::open(&path).unwrap();
        store.write("w2", &json!({"ok": true})).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn sqlite_open_reports_unusable_parent() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not_a_dir");
        fs::write(&blocker, "x").unwrap();
        let err = SqliteStore::open(&blocker.join("cat5.sqlite")).unwrap_err();
        assert!(format!("{err:#}").contains("create sqlite dir"), "{err:#}");
    }
}
