//! SQLite-backed persistent cache for API query results.
//!
//! This module provides:
//! - Database initialization with schema versioning
//! - Query-result caching keyed by cache key, with TTL-based expiry
//! - Concurrent access support via WAL mode and lock retry

use std::env;
use std::fs;
use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, params};

/// Default TTL for cached API responses, in seconds
pub const DEFAULT_CACHE_TTL_SECONDS: i64 = 300;

/// TTL for cached API responses
///
/// Reads `CLOUDREPORT_CACHE_TTL` (seconds), falls back to the default.
pub fn cache_ttl_seconds() -> i64 {
    env::var("CLOUDREPORT_CACHE_TTL")
        .ok()
        .and_then(|s| s.trim().parse::<i64>().ok())
        .unwrap_or(DEFAULT_CACHE_TTL_SECONDS)
}

/// Get the database file path
///
/// Checks `CLOUDREPORT_DB_PATH` environment variable first,
/// falls back to the platform cache directory.
fn get_db_path() -> Result<PathBuf> {
    if let Ok(custom_path) = env::var("CLOUDREPORT_DB_PATH") {
        return Ok(PathBuf::from(custom_path));
    }

    let base_dirs = directories::BaseDirs::new().context("Failed to find home directory")?;
    let cache_dir = base_dirs.cache_dir().join("cloudreport");

    if !cache_dir.exists() {
        fs::create_dir_all(&cache_dir)?;
    }

    Ok(cache_dir.join("cloudreport.db"))
}

/// Open database connection with WAL mode and retry logic
///
/// Retries "database locked" errors with backoff and sets a busy timeout
/// so concurrent invocations don't trip over each other.
fn open_db() -> Result<Connection> {
    let db_path = get_db_path()?;

    let mut attempts = 0;
    let max_attempts = 3;

    loop {
        match Connection::open(&db_path) {
            Ok(conn) => {
                conn.pragma_update(None, "journal_mode", "WAL")?;
                conn.pragma_update(None, "busy_timeout", 5000)?;
                init_schema(&conn)?;
                return Ok(conn);
            }
            Err(e) if e.to_string().contains("locked") && attempts < max_attempts => {
                attempts += 1;
                thread::sleep(Duration::from_millis(100 * attempts));
            }
            Err(e) => return Err(e.into()),
        }
    }
}

fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS api_cache (
            cache_key TEXT PRIMARY KEY,
            data TEXT NOT NULL,
            fetched_at INTEGER NOT NULL,
            expires_at INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_expires_at ON api_cache(expires_at);
        CREATE TABLE IF NOT EXISTS metadata (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL,
            updated_at INTEGER
        );
        INSERT OR IGNORE INTO metadata (key, value) VALUES ('schema_version', '1');",
    )?;

    Ok(())
}

/// Get cached API data if still valid
///
/// Returns cached data if it exists and hasn't expired.
pub fn get_api_cache(cache_key: &str) -> Result<Option<String>> {
    let conn = open_db()?;
    let now = Utc::now().timestamp();

    let result = conn
        .query_row(
            "SELECT data FROM api_cache WHERE cache_key = ? AND expires_at > ?",
            params![cache_key, now],
            |row| row.get::<_, String>(0),
        )
        .optional()?;

    Ok(result)
}

/// Store API response in cache with expiration
///
/// Stores the data and opportunistically cleans up expired entries.
pub fn set_api_cache(cache_key: &str, data: &str, ttl_seconds: i64) -> Result<()> {
    let conn = open_db()?;
    let now = Utc::now().timestamp();
    let expires_at = now + ttl_seconds;

    conn.execute(
        "INSERT INTO api_cache (cache_key, data, fetched_at, expires_at)
         VALUES (?, ?, ?, ?)
         ON CONFLICT(cache_key) DO UPDATE SET
             data = excluded.data,
             fetched_at = excluded.fetched_at,
             expires_at = excluded.expires_at",
        params![cache_key, data, now, expires_at],
    )?;

    conn.execute("DELETE FROM api_cache WHERE expires_at <= ?", params![now])?;

    Ok(())
}

/// Drop one cached entry regardless of expiry (explicit refetch path)
pub fn invalidate_api_cache(cache_key: &str) -> Result<()> {
    let conn = open_db()?;
    conn.execute(
        "DELETE FROM api_cache WHERE cache_key = ?",
        params![cache_key],
    )?;
    Ok(())
}

/// Drop every cached entry
pub fn clear_api_cache() -> Result<()> {
    let conn = open_db()?;
    conn.execute("DELETE FROM api_cache", [])?;
    Ok(())
}
