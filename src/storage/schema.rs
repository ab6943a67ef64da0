//! Database schema definitions
//!
//! This module contains all SQL schema definitions for the Kydao-Harvest database.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- Track crawl runs
CREATE TABLE IF NOT EXISTS runs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    started_at TEXT NOT NULL,
    finished_at TEXT,
    config_hash TEXT NOT NULL,
    seed_url TEXT NOT NULL,
    status TEXT NOT NULL,
    players_visited INTEGER NOT NULL DEFAULT 0,
    pages_walked INTEGER NOT NULL DEFAULT 0,
    stubs_seen INTEGER NOT NULL DEFAULT 0,
    games_recorded INTEGER NOT NULL DEFAULT 0,
    enrichment_failures INTEGER NOT NULL DEFAULT 0
);

-- Players, keyed by display name
CREATE TABLE IF NOT EXISTS players (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE,
    url TEXT NOT NULL DEFAULT '',
    created_at TEXT NOT NULL
);

-- Events (tournaments), keyed by name
CREATE TABLE IF NOT EXISTS events (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE,
    created_at TEXT NOT NULL
);

-- Games, keyed by detail page URL
CREATE TABLE IF NOT EXISTS games (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    url TEXT NOT NULL UNIQUE,
    red_player TEXT NOT NULL,
    black_player TEXT NOT NULL,
    event TEXT NOT NULL,
    red_player_id INTEGER REFERENCES players(id),
    black_player_id INTEGER REFERENCES players(id),
    event_id INTEGER REFERENCES events(id),
    result TEXT NOT NULL,
    move_list TEXT,
    begin_fen TEXT,
    start_color TEXT,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_games_red ON games(red_player_id);
CREATE INDEX IF NOT EXISTS idx_games_black ON games(black_player_id);
CREATE INDEX IF NOT EXISTS idx_games_event ON games(event_id);
"#;

/// Initializes the database schema
///
/// # Arguments
///
/// * `conn` - The database connection
///
/// # Returns
///
/// * `Ok(())` - Schema initialized successfully
/// * `Err(rusqlite::Error)` - Failed to initialize schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
