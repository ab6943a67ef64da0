//! Output module for reporting on stored crawl data
//!
//! This module handles:
//! - Store statistics and the latest run summary
//! - Plain-text listings of players, events and games

pub mod stats;

pub use stats::{load_statistics, print_statistics, StoreStatistics};

use crate::storage::GameStore;
use crate::HarvestError;
use std::fmt;
use std::str::FromStr;

/// Record kinds that can be listed from the store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListKind {
    Players,
    Events,
    Games,
}

impl FromStr for ListKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "players" => Ok(Self::Players),
            "events" => Ok(Self::Events),
            "games" => Ok(Self::Games),
            other => Err(format!(
                "unknown record kind '{}', expected players, events or games",
                other
            )),
        }
    }
}

impl fmt::Display for ListKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Players => write!(f, "players"),
            Self::Events => write!(f, "events"),
            Self::Games => write!(f, "games"),
        }
    }
}

/// Renders one line per stored record of the given kind
pub fn format_listing(store: &dyn GameStore, kind: ListKind) -> Result<Vec<String>, HarvestError> {
    let lines = match kind {
        ListKind::Players => store
            .list_players()?
            .into_iter()
            .map(|p| format!("{}\t{}\t{}", p.id, p.name, p.url))
            .collect(),
        ListKind::Events => store
            .list_events()?
            .into_iter()
            .map(|e| format!("{}\t{}", e.id, e.name))
            .collect(),
        ListKind::Games => store
            .list_games()?
            .into_iter()
            .map(|g| {
                format!(
                    "{}\t{} vs {}\t{}\t{}\t{}\t{}",
                    g.id,
                    g.red_player,
                    g.black_player,
                    g.result,
                    g.event,
                    if g.move_list.is_some() { "moves" } else { "-" },
                    g.url
                )
            })
            .collect(),
    };
    Ok(lines)
}

/// Prints a listing to stdout
pub fn print_listing(store: &dyn GameStore, kind: ListKind) -> Result<(), HarvestError> {
    let lines = format_listing(store, kind)?;
    for line in &lines {
        println!("{}", line);
    }
    println!("\n{} {}", lines.len(), kind);
    Ok(())
}
