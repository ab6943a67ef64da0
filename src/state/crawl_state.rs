//! In-memory registries for one crawl run
//!
//! `CrawlState` owns the player and event registries, the discovery queue
//! and the game dedup index. It is owned by the coordinator and touched only
//! from the traversal loop.

use crate::model::{Event, Game, Player};
use crate::state::dedup::DedupIndex;
use crate::state::player_state::PlayerState;
use std::collections::{HashMap, VecDeque};

#[derive(Debug)]
struct PlayerEntry {
    player: Player,
    state: PlayerState,
}

/// Registries, discovery queue and dedup index for one run
#[derive(Debug, Default)]
pub struct CrawlState {
    players: HashMap<String, PlayerEntry>,
    events: HashMap<String, Event>,
    queue: VecDeque<String>,
    games: DedupIndex,
}

impl CrawlState {
    pub fn new() -> Self {
        Self::default()
    }

    // ===== Players =====

    /// Registers a player seen on a page and queues it if it is new
    ///
    /// Returns true if the player was undiscovered. A known player that is
    /// still queued with an empty URL adopts a non-empty `url`; no second
    /// queue entry is ever created.
    pub fn discover_player(&mut self, name: &str, url: &str) -> bool {
        if name.is_empty() {
            return false;
        }

        if let Some(entry) = self.players.get_mut(name) {
            if entry.state == PlayerState::Queued && entry.player.url.is_empty() && !url.is_empty()
            {
                tracing::debug!("Player {} now has URL {}", name, url);
                entry.player.url = url.to_string();
            }
            return false;
        }

        tracing::info!("Add player {}", name);
        self.players.insert(
            name.to_string(),
            PlayerEntry {
                player: Player::new(name, url),
                state: PlayerState::Queued,
            },
        );
        self.queue.push_back(name.to_string());
        true
    }

    /// Pops the next queued player (FIFO) and marks it visited
    pub fn next_player(&mut self) -> Option<Player> {
        while let Some(name) = self.queue.pop_front() {
            if let Some(entry) = self.players.get_mut(&name) {
                if entry.state.can_transition_to(PlayerState::Visited) {
                    entry.state = PlayerState::Visited;
                    return Some(entry.player.clone());
                }
            }
        }
        None
    }

    pub fn player_state(&self, name: &str) -> PlayerState {
        self.players
            .get(name)
            .map(|entry| entry.state)
            .unwrap_or_default()
    }

    pub fn player(&self, name: &str) -> Option<&Player> {
        self.players.get(name).map(|entry| &entry.player)
    }

    /// Best known URL for a player, empty if unknown
    pub fn player_url(&self, name: &str) -> &str {
        self.player(name).map(|p| p.url.as_str()).unwrap_or("")
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    pub fn visited_count(&self) -> usize {
        self.players
            .values()
            .filter(|entry| entry.state.is_visited())
            .count()
    }

    // ===== Events =====

    /// Registers an event; returns true if it was not known before
    pub fn discover_event(&mut self, name: &str) -> bool {
        if name.is_empty() || self.events.contains_key(name) {
            return false;
        }
        tracing::info!("Add event {}", name);
        self.events.insert(name.to_string(), Event::new(name));
        true
    }

    pub fn event(&self, name: &str) -> Option<&Event> {
        self.events.get(name)
    }

    pub fn event_count(&self) -> usize {
        self.events.len()
    }

    // ===== Games =====

    pub fn games(&self) -> &DedupIndex {
        &self.games
    }

    pub fn games_mut(&mut self) -> &mut DedupIndex {
        &mut self.games
    }

    /// Copies store ids resolved for a game onto the registered players and event
    pub fn record_ids(&mut self, game: &Game) {
        if let (Some(id), Some(entry)) = (game.red_player_id, self.players.get_mut(&game.red_player))
        {
            entry.player.id = Some(id);
        }
        if let (Some(id), Some(entry)) =
            (game.black_player_id, self.players.get_mut(&game.black_player))
        {
            entry.player.id = Some(id);
        }
        if let Some(id) = game.event_id {
            self.events
                .entry(game.event.clone())
                .or_insert_with(|| Event::new(game.event.clone()))
                .id = Some(id);
        }
    }
}
