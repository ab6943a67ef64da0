//! Crawler module for page fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with retry logic and charset decoding
//! - Listing page parsing (game stubs and player links)
//! - Game detail extraction from the board frame
//! - Pagination over a player's listing
//! - Overall crawl coordination

mod coordinator;
mod detail;
mod fetcher;
mod pagination;
mod parser;

pub use coordinator::{run_crawl, Coordinator};
pub use detail::{find_frame_url, DetailFields, DetailParser};
pub use fetcher::{
    backoff_delay, build_http_client, charset_from_content_type, decode_body,
    sniff_meta_charset, Fetcher,
};
pub use pagination::{find_next_page, PageWalker};
pub use parser::{parse_game_stubs, parse_player_links};

use crate::config::Config;
use crate::storage::RunSummary;
use crate::HarvestError;

/// Runs a complete crawl operation
///
/// This is the main entry point for starting a crawl. It will:
/// 1. Open the configured store, or continue without one
/// 2. Build the HTTP client
/// 3. Seed the discovery queue from the seed page
/// 4. Visit every reachable player and record their games
///
/// The configuration hash recorded with the run is taken from `config_hash`;
/// use [`crate::config::compute_content_hash`] when the configuration did not
/// come from a file.
///
/// # Arguments
///
/// * `config` - The crawler configuration
/// * `config_hash` - Hash recorded with the run
///
/// # Returns
///
/// * `Ok(RunSummary)` - Crawl completed successfully
/// * `Err(HarvestError)` - Crawl failed
pub async fn crawl(config: Config, config_hash: &str) -> Result<RunSummary, HarvestError> {
    run_crawl(config, config_hash).await
}
