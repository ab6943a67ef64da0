//! Storage module for persisting crawl data
//!
//! This module handles all database operations for the crawler, including:
//! - SQLite database initialization and schema management
//! - Idempotent upserts of players, events and games
//! - Read-only queries over stored records
//! - Run tracking
//!
//! The crawler itself only talks to [`Persistence`], which may hold no store
//! at all; the concrete backends are [`SqliteStorage`] and the in-memory
//! [`MemoryStore`].

mod gateway;
mod memory;
mod schema;
mod sqlite;
mod traits;

pub use gateway::Persistence;
pub use memory::MemoryStore;
pub use sqlite::SqliteStorage;
pub use traits::{GameStore, StorageError, StorageResult};

use crate::HarvestError;
use std::path::Path;

/// Initializes or opens a storage database
///
/// # Arguments
///
/// * `path` - Path to the SQLite database file
///
/// # Returns
///
/// * `Ok(SqliteStorage)` - Successfully initialized storage
/// * `Err(HarvestError)` - Failed to initialize storage
pub fn open_storage(path: &Path) -> Result<SqliteStorage, HarvestError> {
    SqliteStorage::new(path)
}

/// A stored player
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerRecord {
    pub id: i64,
    pub name: String,
    pub url: String,
    pub created_at: String,
}

/// A stored event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventRecord {
    pub id: i64,
    pub name: String,
    pub created_at: String,
}

/// A stored game
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameRecord {
    pub id: i64,
    pub url: String,
    pub red_player: String,
    pub black_player: String,
    pub event: String,
    pub red_player_id: Option<i64>,
    pub black_player_id: Option<i64>,
    pub event_id: Option<i64>,
    pub result: String,
    pub move_list: Option<String>,
    pub begin_fen: Option<String>,
    pub start_color: Option<String>,
    pub updated_at: String,
}

/// Represents a crawl run
#[derive(Debug, Clone)]
pub struct RunRecord {
    pub id: i64,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub config_hash: String,
    pub seed_url: String,
    pub status: RunStatus,
    pub summary: RunSummary,
}

/// Counters collected by the traversal driver over one run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub players_visited: u64,
    pub pages_walked: u64,
    /// Stubs parsed from listing pages, duplicates included
    pub stubs_seen: u64,
    /// Distinct games recorded in this run
    pub games_recorded: u64,
    pub enrichment_failures: u64,
}

/// Status of a crawl run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Running,
    Completed,
    Failed,
}

impl RunStatus {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "running" => Some(Self::Running),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}
