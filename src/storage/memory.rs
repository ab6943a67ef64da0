//! In-memory storage backend
//!
//! Implements the same upsert contract as [`SqliteStorage`](super::SqliteStorage)
//! without touching disk. Used by tests and anywhere a throwaway store is enough.

use crate::model::Game;
use crate::storage::traits::{GameStore, StorageError, StorageResult};
use crate::storage::{EventRecord, GameRecord, PlayerRecord, RunRecord, RunStatus, RunSummary};
use chrono::Utc;
use std::collections::HashMap;

/// Store keeping every record in process memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    players: Vec<PlayerRecord>,
    player_ids: HashMap<String, usize>,
    events: Vec<EventRecord>,
    event_ids: HashMap<String, usize>,
    games: Vec<GameRecord>,
    game_ids: HashMap<String, usize>,
    runs: Vec<RunRecord>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

/// IDs start at 1 like SQLite rowids
fn id_for(index: usize) -> i64 {
    index as i64 + 1
}

impl GameStore for MemoryStore {
    fn upsert_player(&mut self, name: &str, url: &str) -> StorageResult<i64> {
        if let Some(&index) = self.player_ids.get(name) {
            let record = &mut self.players[index];
            if record.url.is_empty() && !url.is_empty() {
                record.url = url.to_string();
            }
            return Ok(id_for(index));
        }
        let index = self.players.len();
        self.players.push(PlayerRecord {
            id: id_for(index),
            name: name.to_string(),
            url: url.to_string(),
            created_at: Utc::now().to_rfc3339(),
        });
        self.player_ids.insert(name.to_string(), index);
        Ok(id_for(index))
    }

    fn upsert_event(&mut self, name: &str) -> StorageResult<i64> {
        if let Some(&index) = self.event_ids.get(name) {
            return Ok(id_for(index));
        }
        let index = self.events.len();
        self.events.push(EventRecord {
            id: id_for(index),
            name: name.to_string(),
            created_at: Utc::now().to_rfc3339(),
        });
        self.event_ids.insert(name.to_string(), index);
        Ok(id_for(index))
    }

    fn upsert_game(&mut self, game: &Game) -> StorageResult<i64> {
        let index = match self.game_ids.get(&game.url) {
            Some(&index) => index,
            None => {
                let index = self.games.len();
                self.game_ids.insert(game.url.clone(), index);
                self.games.push(GameRecord {
                    id: id_for(index),
                    url: game.url.clone(),
                    red_player: String::new(),
                    black_player: String::new(),
                    event: String::new(),
                    red_player_id: None,
                    black_player_id: None,
                    event_id: None,
                    result: String::new(),
                    move_list: None,
                    begin_fen: None,
                    start_color: None,
                    updated_at: String::new(),
                });
                index
            }
        };

        let record = &mut self.games[index];
        record.red_player = game.red_player.clone();
        record.black_player = game.black_player.clone();
        record.event = game.event.clone();
        record.red_player_id = game.red_player_id;
        record.black_player_id = game.black_player_id;
        record.event_id = game.event_id;
        record.result = game.result.clone();
        record.move_list = game.move_list.clone();
        record.begin_fen = game.begin_fen.clone();
        record.start_color = game.start_color.clone();
        record.updated_at = Utc::now().to_rfc3339();

        Ok(record.id)
    }

    fn get_game_by_url(&self, url: &str) -> StorageResult<Option<GameRecord>> {
        Ok(self
            .game_ids
            .get(url)
            .map(|&index| self.games[index].clone()))
    }

    fn list_players(&self) -> StorageResult<Vec<PlayerRecord>> {
        let mut players = self.players.clone();
        players.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(players)
    }

    fn list_events(&self) -> StorageResult<Vec<EventRecord>> {
        let mut events = self.events.clone();
        events.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(events)
    }

    fn list_games(&self) -> StorageResult<Vec<GameRecord>> {
        Ok(self.games.clone())
    }

    fn count_players(&self) -> StorageResult<u64> {
        Ok(self.players.len() as u64)
    }

    fn count_events(&self) -> StorageResult<u64> {
        Ok(self.events.len() as u64)
    }

    fn count_games(&self) -> StorageResult<u64> {
        Ok(self.games.len() as u64)
    }

    fn count_games_with_moves(&self) -> StorageResult<u64> {
        Ok(self.games.iter().filter(|g| g.move_list.is_some()).count() as u64)
    }

    fn create_run(&mut self, config_hash: &str, seed_url: &str) -> StorageResult<i64> {
        let id = id_for(self.runs.len());
        self.runs.push(RunRecord {
            id,
            started_at: Utc::now().to_rfc3339(),
            finished_at: None,
            config_hash: config_hash.to_string(),
            seed_url: seed_url.to_string(),
            status: RunStatus::Running,
            summary: RunSummary::default(),
        });
        Ok(id)
    }

    fn finish_run(
        &mut self,
        run_id: i64,
        status: RunStatus,
        summary: &RunSummary,
    ) -> StorageResult<()> {
        let run = self
            .runs
            .iter_mut()
            .find(|run| run.id == run_id)
            .ok_or(StorageError::RunNotFound(run_id))?;
        run.status = status;
        run.finished_at = Some(Utc::now().to_rfc3339());
        run.summary = *summary;
        Ok(())
    }

    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>> {
        Ok(self.runs.last().cloned())
    }
}
