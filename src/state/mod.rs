//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `PlayerState`: visitation state of one player (undiscovered, queued, visited)
//! - `DedupIndex`: game identities already processed in this run
//! - `CrawlState`: player/event registries, discovery queue and dedup index

mod crawl_state;
mod dedup;
mod player_state;

// Re-export main types
pub use crawl_state::CrawlState;
pub use dedup::DedupIndex;
pub use player_state::PlayerState;
