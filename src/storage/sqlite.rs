//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the GameStore trait.

use crate::model::Game;
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{GameStore, StorageError, StorageResult};
use crate::storage::{EventRecord, GameRecord, PlayerRecord, RunRecord, RunStatus, RunSummary};
use crate::HarvestError;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;

const GAME_COLUMNS: &str = "id, url, red_player, black_player, event, red_player_id,
     black_player_id, event_id, result, move_list, begin_fen, start_color, updated_at";

const RUN_COLUMNS: &str = "id, started_at, finished_at, config_hash, seed_url, status,
     players_visited, pages_walked, stubs_seen, games_recorded, enrichment_failures";

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Creates a new SqliteStorage instance
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStorage)` - Successfully opened/created database
    /// * `Err(HarvestError)` - Failed to open database
    pub fn new(path: &Path) -> Result<Self, HarvestError> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database
    pub fn new_in_memory() -> Result<Self, HarvestError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    fn count(&self, sql: &str) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(sql, [], |row| row.get(0))?;
        Ok(count as u64)
    }
}

fn game_from_row(row: &Row) -> rusqlite::Result<GameRecord> {
    Ok(GameRecord {
        id: row.get(0)?,
        url: row.get(1)?,
        red_player: row.get(2)?,
        black_player: row.get(3)?,
        event: row.get(4)?,
        red_player_id: row.get(5)?,
        black_player_id: row.get(6)?,
        event_id: row.get(7)?,
        result: row.get(8)?,
        move_list: row.get(9)?,
        begin_fen: row.get(10)?,
        start_color: row.get(11)?,
        updated_at: row.get(12)?,
    })
}

fn run_from_row(row: &Row) -> rusqlite::Result<RunRecord> {
    Ok(RunRecord {
        id: row.get(0)?,
        started_at: row.get(1)?,
        finished_at: row.get(2)?,
        config_hash: row.get(3)?,
        seed_url: row.get(4)?,
        status: RunStatus::from_db_string(&row.get::<_, String>(5)?).unwrap_or(RunStatus::Failed),
        summary: RunSummary {
            players_visited: row.get::<_, i64>(6)? as u64,
            pages_walked: row.get::<_, i64>(7)? as u64,
            stubs_seen: row.get::<_, i64>(8)? as u64,
            games_recorded: row.get::<_, i64>(9)? as u64,
            enrichment_failures: row.get::<_, i64>(10)? as u64,
        },
    })
}

impl GameStore for SqliteStorage {
    // ===== Upserts =====

    fn upsert_player(&mut self, name: &str, url: &str) -> StorageResult<i64> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO players (name, url, created_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(name) DO UPDATE SET url = excluded.url
             WHERE players.url = '' AND excluded.url != ''",
            params![name, url, now],
        )?;

        let id = self.conn.query_row(
            "SELECT id FROM players WHERE name = ?1",
            params![name],
            |row| row.get(0),
        )?;
        Ok(id)
    }

    fn upsert_event(&mut self, name: &str) -> StorageResult<i64> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO events (name, created_at) VALUES (?1, ?2)
             ON CONFLICT(name) DO NOTHING",
            params![name, now],
        )?;

        let id = self.conn.query_row(
            "SELECT id FROM events WHERE name = ?1",
            params![name],
            |row| row.get(0),
        )?;
        Ok(id)
    }

    fn upsert_game(&mut self, game: &Game) -> StorageResult<i64> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO games (url, red_player, black_player, event, red_player_id,
             black_player_id, event_id, result, move_list, begin_fen, start_color, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
             ON CONFLICT(url) DO UPDATE SET
                red_player = excluded.red_player,
                black_player = excluded.black_player,
                event = excluded.event,
                red_player_id = excluded.red_player_id,
                black_player_id = excluded.black_player_id,
                event_id = excluded.event_id,
                result = excluded.result,
                move_list = excluded.move_list,
                begin_fen = excluded.begin_fen,
                start_color = excluded.start_color,
                updated_at = excluded.updated_at",
            params![
                game.url,
                game.red_player,
                game.black_player,
                game.event,
                game.red_player_id,
                game.black_player_id,
                game.event_id,
                game.result,
                game.move_list,
                game.begin_fen,
                game.start_color,
                now
            ],
        )?;

        let id = self.conn.query_row(
            "SELECT id FROM games WHERE url = ?1",
            params![game.url],
            |row| row.get(0),
        )?;
        Ok(id)
    }

    // ===== Queries =====

    fn get_game_by_url(&self, url: &str) -> StorageResult<Option<GameRecord>> {
        let sql = format!("SELECT {} FROM games WHERE url = ?1", GAME_COLUMNS);
        let game = self
            .conn
            .query_row(&sql, params![url], game_from_row)
            .optional()?;
        Ok(game)
    }

    fn list_players(&self) -> StorageResult<Vec<PlayerRecord>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, url, created_at FROM players ORDER BY name")?;

        let players = stmt
            .query_map([], |row| {
                Ok(PlayerRecord {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    url: row.get(2)?,
                    created_at: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(players)
    }

    fn list_events(&self) -> StorageResult<Vec<EventRecord>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, created_at FROM events ORDER BY name")?;

        let events = stmt
            .query_map([], |row| {
                Ok(EventRecord {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    created_at: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(events)
    }

    fn list_games(&self) -> StorageResult<Vec<GameRecord>> {
        let sql = format!("SELECT {} FROM games ORDER BY id", GAME_COLUMNS);
        let mut stmt = self.conn.prepare(&sql)?;
        let games = stmt
            .query_map([], game_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(games)
    }

    fn count_players(&self) -> StorageResult<u64> {
        self.count("SELECT COUNT(*) FROM players")
    }

    fn count_events(&self) -> StorageResult<u64> {
        self.count("SELECT COUNT(*) FROM events")
    }

    fn count_games(&self) -> StorageResult<u64> {
        self.count("SELECT COUNT(*) FROM games")
    }

    fn count_games_with_moves(&self) -> StorageResult<u64> {
        self.count("SELECT COUNT(*) FROM games WHERE move_list IS NOT NULL")
    }

    // ===== Run Management =====

    fn create_run(&mut self, config_hash: &str, seed_url: &str) -> StorageResult<i64> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO runs (started_at, config_hash, seed_url, status) VALUES (?1, ?2, ?3, ?4)",
            params![now, config_hash, seed_url, RunStatus::Running.to_db_string()],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn finish_run(
        &mut self,
        run_id: i64,
        status: RunStatus,
        summary: &RunSummary,
    ) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        let updated = self.conn.execute(
            "UPDATE runs SET status = ?1, finished_at = ?2, players_visited = ?3,
             pages_walked = ?4, stubs_seen = ?5, games_recorded = ?6, enrichment_failures = ?7
             WHERE id = ?8",
            params![
                status.to_db_string(),
                now,
                summary.players_visited as i64,
                summary.pages_walked as i64,
                summary.stubs_seen as i64,
                summary.games_recorded as i64,
                summary.enrichment_failures as i64,
                run_id
            ],
        )?;

        if updated == 0 {
            return Err(StorageError::RunNotFound(run_id));
        }
        Ok(())
    }

    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>> {
        let sql = format!("SELECT {} FROM runs ORDER BY id DESC LIMIT 1", RUN_COLUMNS);
        let run = self.conn.query_row(&sql, [], run_from_row).optional()?;
        Ok(run)
    }
}
