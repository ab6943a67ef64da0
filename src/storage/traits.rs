//! Storage traits and error types
//!
//! This module defines the trait interface for storage backends and
//! associated error types.

use crate::model::Game;
use crate::storage::{EventRecord, GameRecord, PlayerRecord, RunRecord, RunStatus, RunSummary};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Run not found: {0}")]
    RunNotFound(i64),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for storage backend implementations
///
/// Writes are upserts keyed on natural keys: player and event `name`, game
/// `url`. Calling them repeatedly with the same key never creates a second
/// record.
pub trait GameStore: Send {
    // ===== Upserts =====

    /// Inserts a player if no player with this name exists
    ///
    /// The stored URL is the first non-empty one given; once set, later calls
    /// do not change it.
    ///
    /// # Returns
    ///
    /// The player ID (either newly created or existing)
    fn upsert_player(&mut self, name: &str, url: &str) -> StorageResult<i64>;

    /// Inserts an event if no event with this name exists
    fn upsert_event(&mut self, name: &str) -> StorageResult<i64>;

    /// Inserts a game or replaces every non-key field of the game with this URL
    fn upsert_game(&mut self, game: &Game) -> StorageResult<i64>;

    // ===== Queries =====

    /// Gets a game by its detail page URL
    fn get_game_by_url(&self, url: &str) -> StorageResult<Option<GameRecord>>;

    /// Lists all players ordered by name
    fn list_players(&self) -> StorageResult<Vec<PlayerRecord>>;

    /// Lists all events ordered by name
    fn list_events(&self) -> StorageResult<Vec<EventRecord>>;

    /// Lists all games ordered by ID
    fn list_games(&self) -> StorageResult<Vec<GameRecord>>;

    fn count_players(&self) -> StorageResult<u64>;

    fn count_events(&self) -> StorageResult<u64>;

    fn count_games(&self) -> StorageResult<u64>;

    /// Counts games whose move list was captured
    fn count_games_with_moves(&self) -> StorageResult<u64>;

    // ===== Run Management =====

    /// Creates a new crawl run in the `Running` state
    ///
    /// # Returns
    ///
    /// The ID of the newly created run
    fn create_run(&mut self, config_hash: &str, seed_url: &str) -> StorageResult<i64>;

    /// Records the outcome and counters of a run
    fn finish_run(
        &mut self,
        run_id: i64,
        status: RunStatus,
        summary: &RunSummary,
    ) -> StorageResult<()>;

    /// Gets the most recent run
    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>>;
}
