//! Statistics generation from the game store
//!
//! This module provides functionality for extracting and displaying
//! store statistics and the outcome of the latest run.

use crate::storage::{GameStore, RunRecord};
use crate::HarvestError;

/// Store statistics summary
#[derive(Debug, Clone)]
pub struct StoreStatistics {
    pub players: u64,
    pub events: u64,
    pub games: u64,

    /// Games whose move list was captured
    pub games_with_moves: u64,

    /// Most recent crawl run, if any was recorded
    pub latest_run: Option<RunRecord>,
}

impl StoreStatistics {
    /// Percentage of games with a move list
    pub fn move_coverage(&self) -> f64 {
        if self.games > 0 {
            (self.games_with_moves as f64 / self.games as f64) * 100.0
        } else {
            0.0
        }
    }
}

/// Loads statistics from storage
///
/// # Arguments
///
/// * `store` - The storage backend to query
///
/// # Returns
///
/// * `Ok(StoreStatistics)` - Successfully loaded statistics
/// * `Err(HarvestError)` - Failed to query statistics
pub fn load_statistics(store: &dyn GameStore) -> Result<StoreStatistics, HarvestError> {
    Ok(StoreStatistics {
        players: store.count_players()?,
        events: store.count_events()?,
        games: store.count_games()?,
        games_with_moves: store.count_games_with_moves()?,
        latest_run: store.get_latest_run()?,
    })
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &StoreStatistics) {
    println!("=== Store Statistics ===\n");

    println!("Overview:");
    println!("  Players: {}", stats.players);
    println!("  Events: {}", stats.events);
    println!("  Games: {}", stats.games);
    println!(
        "  Games with moves: {} ({:.1}%)",
        stats.games_with_moves,
        stats.move_coverage()
    );
    println!();

    match &stats.latest_run {
        Some(run) => {
            println!("Latest Run:");
            println!("  ID: {}", run.id);
            println!("  Status: {}", run.status.to_db_string());
            println!("  Seed: {}", run.seed_url);
            println!("  Started: {}", run.started_at);
            if let Some(finished) = &run.finished_at {
                println!("  Finished: {}", finished);
            }
            println!("  Config hash: {}", run.config_hash);
            println!("  Players visited: {}", run.summary.players_visited);
            println!("  Pages walked: {}", run.summary.pages_walked);
            println!("  Stubs seen: {}", run.summary.stubs_seen);
            println!("  Games recorded: {}", run.summary.games_recorded);
            println!(
                "  Enrichment failures: {}",
                run.summary.enrichment_failures
            );
        }
        None => println!("No crawl runs recorded"),
    }
}
