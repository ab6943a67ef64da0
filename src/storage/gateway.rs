//! Persistence gateway used by the crawler
//!
//! Wraps an optional [`GameStore`]. When no store is configured or the store
//! could not be opened, every write is a logged no-op and the crawl carries on.
//! Store errors are logged at warn level and never propagate into the crawl.

use crate::config::StorageConfig;
use crate::model::Game;
use crate::storage::traits::GameStore;
use crate::storage::{RunStatus, RunSummary, SqliteStorage};
use std::path::Path;

/// Capability-checked handle to the backing store
pub struct Persistence {
    store: Option<Box<dyn GameStore>>,
}

impl Persistence {
    /// Opens the SQLite store named by the storage configuration
    ///
    /// A missing path or a store that fails to open yields a disabled gateway.
    pub fn open(config: &StorageConfig) -> Self {
        let Some(path) = config.database_path.as_deref() else {
            tracing::warn!("No database configured, games will not be persisted");
            return Self::disabled();
        };

        match SqliteStorage::new(Path::new(path)) {
            Ok(storage) => {
                tracing::info!("Using database {}", path);
                Self::with_store(Box::new(storage))
            }
            Err(e) => {
                tracing::warn!("Failed to open database {}: {}", path, e);
                Self::disabled()
            }
        }
    }

    pub fn with_store(store: Box<dyn GameStore>) -> Self {
        Self { store: Some(store) }
    }

    pub fn disabled() -> Self {
        Self { store: None }
    }

    pub fn is_available(&self) -> bool {
        self.store.is_some()
    }

    /// Read access to the backing store, if any
    pub fn store(&self) -> Option<&dyn GameStore> {
        self.store.as_deref()
    }

    pub fn upsert_player(&mut self, name: &str, url: &str) -> Option<i64> {
        let store = self.store.as_mut()?;
        match store.upsert_player(name, url) {
            Ok(id) => Some(id),
            Err(e) => {
                tracing::warn!("Failed to save player {}: {}", name, e);
                None
            }
        }
    }

    pub fn upsert_event(&mut self, name: &str) -> Option<i64> {
        let store = self.store.as_mut()?;
        match store.upsert_event(name) {
            Ok(id) => Some(id),
            Err(e) => {
                tracing::warn!("Failed to save event {}: {}", name, e);
                None
            }
        }
    }

    pub fn upsert_game(&mut self, game: &Game) -> Option<i64> {
        let store = self.store.as_mut()?;
        match store.upsert_game(game) {
            Ok(id) => Some(id),
            Err(e) => {
                tracing::warn!("Failed to save game {}: {}", game.url, e);
                None
            }
        }
    }

    /// Upserts both players, the event and the game, recording each id on `game`
    ///
    /// Stops at the first failed write; ids resolved before the failure stay set.
    /// Returns the game id when every write succeeded.
    pub fn save_game(&mut self, game: &mut Game) -> Option<i64> {
        if !self.is_available() {
            tracing::debug!("Persistence unavailable, skipping game {}", game.url);
            return None;
        }

        game.red_player_id = Some(self.upsert_player(&game.red_player, &game.red_url)?);
        game.black_player_id = Some(self.upsert_player(&game.black_player, &game.black_url)?);
        game.event_id = Some(self.upsert_event(&game.event)?);

        let id = self.upsert_game(game)?;
        game.id = Some(id);
        tracing::debug!("Saved game {}", id);
        Some(id)
    }

    /// Records the start of a crawl run
    pub fn begin_run(&mut self, config_hash: &str, seed_url: &str) -> Option<i64> {
        let store = self.store.as_mut()?;
        match store.create_run(config_hash, seed_url) {
            Ok(id) => {
                tracing::debug!("Started run {}", id);
                Some(id)
            }
            Err(e) => {
                tracing::warn!("Failed to record run start: {}", e);
                None
            }
        }
    }

    /// Records the outcome of a crawl run
    pub fn finish_run(&mut self, run_id: i64, status: RunStatus, summary: &RunSummary) {
        let Some(store) = self.store.as_mut() else {
            return;
        };
        if let Err(e) = store.finish_run(run_id, status, summary) {
            tracing::warn!("Failed to record outcome of run {}: {}", run_id, e);
        }
    }
}

impl std::fmt::Debug for Persistence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Persistence")
            .field("available", &self.is_available())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{
        EventRecord, GameRecord, MemoryStore, PlayerRecord, RunRecord, StorageError,
        StorageResult,
    };

    fn game() -> Game {
        Game {
            red_player: "A".to_string(),
            red_url: "https://kydao.net/ky-thu/A/1".to_string(),
            black_player: "B".to_string(),
            black_url: String::new(),
            event: "Open Cup".to_string(),
            url: "https://kydao.net/van-co/1".to_string(),
            result: "1-0".to_string(),
            ..Game::default()
        }
    }

    /// Accepts players but rejects everything else
    struct FailingStore;

    impl GameStore for FailingStore {
        fn upsert_player(&mut self, _name: &str, _url: &str) -> StorageResult<i64> {
            Ok(7)
        }
        fn upsert_event(&mut self, _name: &str) -> StorageResult<i64> {
            Err(StorageError::Database("event table locked".to_string()))
        }
        fn upsert_game(&mut self, _game: &Game) -> StorageResult<i64> {
            Err(StorageError::Database("game table locked".to_string()))
        }
        fn get_game_by_url(&self, _url: &str) -> StorageResult<Option<GameRecord>> {
            Ok(None)
        }
        fn list_players(&self) -> StorageResult<Vec<PlayerRecord>> {
            Ok(Vec::new())
        }
        fn list_events(&self) -> StorageResult<Vec<EventRecord>> {
            Ok(Vec::new())
        }
        fn list_games(&self) -> StorageResult<Vec<GameRecord>> {
            Ok(Vec::new())
        }
        fn count_players(&self) -> StorageResult<u64> {
            Ok(0)
        }
        fn count_events(&self) -> StorageResult<u64> {
            Ok(0)
        }
        fn count_games(&self) -> StorageResult<u64> {
            Ok(0)
        }
        fn count_games_with_moves(&self) -> StorageResult<u64> {
            Ok(0)
        }
        fn create_run(&mut self, _config_hash: &str, _seed_url: &str) -> StorageResult<i64> {
            Err(StorageError::Database("read only".to_string()))
        }
        fn finish_run(
            &mut self,
            run_id: i64,
            _status: RunStatus,
            _summary: &RunSummary,
        ) -> StorageResult<()> {
            Err(StorageError::RunNotFound(run_id))
        }
        fn get_latest_run(&self) -> StorageResult<Option<RunRecord>> {
            Ok(None)
        }
    }

    #[test]
    fn test_disabled_gateway_is_a_no_op() {
        let mut persistence = Persistence::disabled();
        let mut game = game();

        assert!(!persistence.is_available());
        assert!(persistence.store().is_none());
        assert_eq!(persistence.save_game(&mut game), None);
        assert_eq!(persistence.upsert_player("A", ""), None);
        assert_eq!(persistence.begin_run("hash", "https://kydao.net"), None);
        persistence.finish_run(1, RunStatus::Completed, &RunSummary::default());
        assert!(game.red_player_id.is_none());
    }

    #[test]
    fn test_open_without_path_is_disabled() {
        let persistence = Persistence::open(&StorageConfig {
            database_path: None,
        });
        assert!(!persistence.is_available());
    }

    #[test]
    fn test_save_game_sets_ids() {
        let mut persistence = Persistence::with_store(Box::new(MemoryStore::new()));
        let mut game = game();

        let id = persistence.save_game(&mut game);

        assert!(id.is_some());
        assert_eq!(game.id, id);
        assert!(game.red_player_id.is_some());
        assert!(game.black_player_id.is_some());
        assert_ne!(game.red_player_id, game.black_player_id);
        assert!(game.event_id.is_some());

        let store = persistence.store().unwrap();
        assert_eq!(store.count_players().unwrap(), 2);
        assert_eq!(store.count_events().unwrap(), 1);
        let stored = store.get_game_by_url(&game.url).unwrap().unwrap();
        assert_eq!(stored.red_player_id, game.red_player_id);
    }

    #[test]
    fn test_save_game_twice_is_idempotent() {
        let mut persistence = Persistence::with_store(Box::new(MemoryStore::new()));
        let mut first = game();
        let mut second = game();
        second.move_list = Some("7747".to_string());

        let id1 = persistence.save_game(&mut first);
        let id2 = persistence.save_game(&mut second);

        assert_eq!(id1, id2);
        let store = persistence.store().unwrap();
        assert_eq!(store.count_games().unwrap(), 1);
        assert_eq!(store.count_games_with_moves().unwrap(), 1);
    }

    #[test]
    fn test_save_game_stops_at_first_failure() {
        let mut persistence = Persistence::with_store(Box::new(FailingStore));
        let mut game = game();

        assert_eq!(persistence.save_game(&mut game), None);
        assert_eq!(game.red_player_id, Some(7));
        assert_eq!(game.black_player_id, Some(7));
        assert!(game.event_id.is_none());
        assert!(game.id.is_none());
    }

    #[test]
    fn test_run_errors_are_swallowed() {
        let mut persistence = Persistence::with_store(Box::new(FailingStore));
        assert_eq!(persistence.begin_run("hash", "https://kydao.net"), None);
        persistence.finish_run(3, RunStatus::Failed, &RunSummary::default());
    }
}
