//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the traversal driver:
//! - Seeding the discovery queue from the seed page
//! - Draining the queue breadth-first, one player at a time
//! - Walking each player's listing pages and processing every game stub
//! - Recording the run in the store

use crate::config::Config;
use crate::crawler::detail::DetailParser;
use crate::crawler::fetcher::Fetcher;
use crate::crawler::pagination::PageWalker;
use crate::crawler::parser::{parse_game_stubs, parse_player_links};
use crate::model::{Game, GameStub, PageCapture, Player};
use crate::state::CrawlState;
use crate::storage::{Persistence, RunStatus, RunSummary};
use crate::HarvestError;
use std::time::Instant;
use url::Url;

/// Main crawler coordinator structure
pub struct Coordinator {
    config: Config,
    fetcher: Fetcher,
    detail: DetailParser,
    persistence: Persistence,
    state: CrawlState,
    summary: RunSummary,
    config_hash: String,
}

impl Coordinator {
    /// Creates a new coordinator instance
    ///
    /// # Arguments
    ///
    /// * `config` - The crawler configuration
    /// * `persistence` - Store gateway, possibly disabled
    /// * `config_hash` - Hash of the configuration, recorded with the run
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Successfully created coordinator
    /// * `Err(HarvestError)` - The HTTP client or extraction patterns could not be built
    pub fn new(
        config: Config,
        persistence: Persistence,
        config_hash: impl Into<String>,
    ) -> Result<Self, HarvestError> {
        let fetcher = Fetcher::new(&config.fetcher)?;
        let detail = DetailParser::new(config.detail.nonce_placeholder.clone())?;

        Ok(Self {
            config,
            fetcher,
            detail,
            persistence,
            state: CrawlState::new(),
            summary: RunSummary::default(),
            config_hash: config_hash.into(),
        })
    }

    pub fn state(&self) -> &CrawlState {
        &self.state
    }

    pub fn persistence(&self) -> &Persistence {
        &self.persistence
    }

    pub fn summary(&self) -> RunSummary {
        self.summary
    }

    /// Fetches the seed page and queues every player linked from it
    ///
    /// Returns the number of players newly queued. A seed page that cannot
    /// be fetched is an error for the whole run.
    pub async fn seed(&mut self, seed_url: &Url) -> Result<usize, HarvestError> {
        tracing::info!("Seeding from {}", seed_url);
        let html = self.fetcher.fetch(seed_url.as_str()).await?;

        let mut queued = 0;
        for link in parse_player_links(&html, seed_url)? {
            if self.state.discover_player(&link.name, &link.url) {
                queued += 1;
            }
        }

        tracing::info!("Seed page queued {} players", queued);
        Ok(queued)
    }

    /// Runs the main crawl loop
    ///
    /// This is the core crawling logic that:
    /// 1. Seeds the queue from the configured seed URL
    /// 2. Pops players in FIFO order until the queue is empty
    /// 3. Walks each player's listing pages
    /// 4. Enriches, deduplicates and persists every game found
    /// 5. Queues newly seen players and registers new events
    pub async fn run(&mut self) -> Result<RunSummary, HarvestError> {
        let seed_url = Url::parse(&self.config.crawler.seed_url)?;
        let run_id = self
            .persistence
            .begin_run(&self.config_hash, seed_url.as_str());
        if let Some(id) = run_id {
            tracing::info!("Starting crawl run {}", id);
        }

        let start_time = Instant::now();

        if let Err(e) = self.seed(&seed_url).await {
            tracing::error!("Failed to seed crawl from {}: {}", seed_url, e);
            if let Some(id) = run_id {
                self.persistence
                    .finish_run(id, RunStatus::Failed, &self.summary);
            }
            return Err(e);
        }

        while let Some(player) = self.state.next_player() {
            self.summary.players_visited += 1;
            self.visit_player(&player).await;

            // Progress reporting every 10 players
            if self.summary.players_visited % 10 == 0 {
                tracing::info!(
                    "Progress: {} players visited, {} queued, {} games recorded",
                    self.summary.players_visited,
                    self.state.queue_len(),
                    self.summary.games_recorded
                );
            }
        }

        if let Some(id) = run_id {
            self.persistence
                .finish_run(id, RunStatus::Completed, &self.summary);
        }

        tracing::info!(
            "Crawl completed: {} players, {} pages, {} games ({} enrichment failures) in {:?}",
            self.summary.players_visited,
            self.summary.pages_walked,
            self.summary.games_recorded,
            self.summary.enrichment_failures,
            start_time.elapsed()
        );

        Ok(self.summary)
    }

    /// Walks one player's listing and processes every stub on it
    async fn visit_player(&mut self, player: &Player) {
        if player.url.is_empty() {
            tracing::debug!("Player {} has no URL, nothing to walk", player.name);
            return;
        }

        let start_url = match Url::parse(&player.url) {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!("Invalid URL for player {}: {} ({})", player.name, player.url, e);
                return;
            }
        };

        tracing::info!("Visiting player {} at {}", player.name, start_url);

        let fetcher = self.fetcher.clone();
        let max_pages = self.config.crawler.max_pages as usize;
        let mut walker = PageWalker::new(&fetcher, start_url, max_pages);

        loop {
            let page = match walker.next_page().await {
                Ok(Some(page)) => page,
                Ok(None) => break,
                Err(e) => {
                    tracing::warn!("Skipping player {}: {}", player.name, e);
                    break;
                }
            };

            self.summary.pages_walked += 1;
            self.process_page(&page).await;
        }

        tracing::debug!(
            "Finished player {} after {} pages",
            player.name,
            walker.pages_yielded()
        );
    }

    async fn process_page(&mut self, page: &PageCapture) {
        let stubs = match parse_game_stubs(&page.html, &page.url) {
            Ok(stubs) => stubs,
            Err(e) => {
                tracing::warn!("Failed to parse listing {}: {}", page.url, e);
                return;
            }
        };

        tracing::debug!("Found {} games on {}", stubs.len(), page.url);
        for stub in stubs {
            self.process_stub(stub).await;
        }
    }

    /// Enriches a stub, records it once per run, and discovers its players and event
    async fn process_stub(&mut self, stub: GameStub) {
        self.summary.stubs_seen += 1;
        let mut game = Game::from(stub);
        self.fill_player_urls(&mut game);

        if let Err(e) = self
            .detail
            .enrich(&self.fetcher, &mut self.persistence, &mut game)
            .await
        {
            tracing::warn!("Failed to parse game {}: {}", game.url, e);
            self.summary.enrichment_failures += 1;
        }

        if self.state.games_mut().mark(game.identity()) {
            tracing::info!(
                "Found game {} vs {} ({}) {}",
                game.red_player,
                game.black_player,
                game.event,
                game.url
            );
            self.persistence.save_game(&mut game);
            self.summary.games_recorded += 1;
        }

        self.state.discover_player(&game.red_player, &game.red_url);
        self.state.discover_player(&game.black_player, &game.black_url);
        self.state.discover_event(&game.event);
        self.state.record_ids(&game);
    }

    /// Listings often link only the listed player, so a missing href falls
    /// back to the URL the registry already holds for that name
    fn fill_player_urls(&self, game: &mut Game) {
        if game.red_url.is_empty() {
            game.red_url = self.state.player_url(&game.red_player).to_string();
        }
        if game.black_url.is_empty() {
            game.black_url = self.state.player_url(&game.black_player).to_string();
        }
    }
}

/// Runs the main crawl operation
///
/// Opens the configured store (or runs without one), builds the coordinator
/// and drains the discovery queue.
///
/// # Arguments
///
/// * `config` - The crawler configuration
/// * `config_hash` - Hash of the configuration, recorded with the run
///
/// # Returns
///
/// * `Ok(RunSummary)` - Crawl completed
/// * `Err(HarvestError)` - The seed page could not be fetched or setup failed
///
/// # Example
///
/// ```no_run
/// use kydao_harvest::config::load_config_with_hash;
/// use kydao_harvest::crawler::run_crawl;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let (config, hash) = load_config_with_hash(Path::new("harvest.toml"))?;
/// let summary = run_crawl(config, hash).await?;
/// println!("{} games recorded", summary.games_recorded);
/// # Ok(())
/// # }
/// ```
pub async fn run_crawl(
    config: Config,
    config_hash: impl Into<String>,
) -> Result<RunSummary, HarvestError> {
    let persistence = Persistence::open(&config.storage);
    let mut coordinator = Coordinator::new(config, persistence, config_hash)?;
    coordinator.run().await
}
