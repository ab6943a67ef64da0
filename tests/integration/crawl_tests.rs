//! Integration tests for the crawler
//!
//! These tests use wiremock to serve a small kydao.net-shaped site and
//! exercise fetching, pagination, enrichment and the full crawl cycle
//! end-to-end.

use kydao_harvest::config::{Config, FetcherConfig};
use kydao_harvest::crawler::{run_crawl, Coordinator, DetailParser, Fetcher, PageWalker};
use kydao_harvest::storage::{
    GameStore, MemoryStore, Persistence, RunStatus, RunSummary, SqliteStorage,
};
use kydao_harvest::{FetchError, Game, HarvestError, PlayerState};
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Fetcher settings with a short timeout and minimal backoff
fn test_fetcher_config(max_retries: u32) -> FetcherConfig {
    FetcherConfig {
        timeout_secs: 5,
        max_retries,
        backoff_factor: 0.0,
        ..FetcherConfig::default()
    }
}

fn test_config(seed_url: &str) -> Config {
    let mut config = Config::default();
    config.crawler.seed_url = seed_url.to_string();
    config.fetcher = test_fetcher_config(1);
    config
}

fn html(body: impl Into<String>) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body.into().into_bytes(), "text/html; charset=utf-8")
}

async fn mount_page(server: &MockServer, at: &str, body: impl Into<String>) {
    Mock::given(method("GET"))
        .and(path(at))
        .respond_with(html(body))
        .mount(server)
        .await;
}

/// One game entry as it appears on a listing page
fn entry(red: (&str, &str), black: (&str, &str), game: &str, event: &str) -> String {
    format!(
        r#"<div class="game">
            <div class="red"><a href="{}">{}</a></div>
            <div class="black"><a href="{}">{}</a></div>
            <div class="result"><a href="{}">1-0</a></div>
            <div class="event"><a href="/giai/{}">{}</a></div>
        </div>"#,
        red.1, red.0, black.1, black.0, game, event, event
    )
}

fn next_link(href: &str) -> String {
    format!(r#"<span id="Content_pager_lblnext"><a href="{}">Sau</a></span>"#, href)
}

fn listing(parts: &[String]) -> String {
    format!("<html><body>{}</body></html>", parts.concat())
}

fn detail_page(frame_src: &str) -> String {
    format!(
        r#"<html><body><iframe id="game" src="{}"></iframe></body></html>"#,
        frame_src
    )
}

fn frame_page(n: u32) -> String {
    format!(
        r#"<html><script>
            var strMoveList = '77{{nonce}}4{n}';
            var beginFEN = "rnbakabnr/9/1c5c1/p1p1p1p1p/9/9/P1P1P1P1P/1C5C1/9/RNBAKABNR w";
            var startColor = 'red';
            StartBoard('zz', 1);
        </script></html>"#
    )
}

/// Mounts a site where
/// - the seed page lists game 1 (A vs B)
/// - A's listing spans two pages whose pager links back to the first
/// - B's listing repeats game 1
/// - C's listing repeats game 2 and adds game 4 against D, who has no link
/// - game 4's detail page has no board frame
///
/// Detail page fetch expectations are for `runs` full crawls.
async fn mount_site(server: &MockServer, runs: u64) {
    let a = ("A", "/p/A");
    let b = ("B", "/p/B");
    let c = ("C", "/p/C");
    let d = ("D", "");

    mount_page(server, "/", listing(&[entry(a, b, "/g/1", "Open Cup")])).await;
    mount_page(
        server,
        "/p/A",
        listing(&[
            entry(a, b, "/g/1", "Open Cup"),
            entry(a, c, "/g/2", "Open Cup"),
            next_link("/p/A/2"),
        ]),
    )
    .await;
    mount_page(
        server,
        "/p/A/2",
        listing(&[entry(c, a, "/g/3", "Open Cup"), next_link("/p/A")]),
    )
    .await;
    mount_page(server, "/p/B", listing(&[entry(a, b, "/g/1", "Open Cup")])).await;
    mount_page(
        server,
        "/p/C",
        listing(&[
            entry(a, c, "/g/2", "Open Cup"),
            entry(c, d, "/g/4", "Winter Cup"),
        ]),
    )
    .await;

    for n in 1..=3u32 {
        let expected_fetches = if n == 3 { runs } else { 2 * runs };
        Mock::given(method("GET"))
            .and(path(format!("/g/{}", n)))
            .respond_with(html(detail_page(&format!("/f/{}", n))))
            .expect(expected_fetches)
            .mount(server)
            .await;
        mount_page(server, &format!("/f/{}", n), frame_page(n)).await;
    }
    mount_page(server, "/g/4", "<html><body><p>Board unavailable</p></body></html>").await;
}

// ===== Fetcher =====

#[tokio::test]
async fn test_fetch_gives_up_after_max_retries() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&server)
        .await;

    let fetcher = Fetcher::new(&test_fetcher_config(3)).unwrap();
    let result = fetcher.fetch(&format!("{}/flaky", server.uri())).await;

    match result {
        Err(FetchError::Exhausted { attempts, ref source, .. }) => {
            assert_eq!(attempts, 3);
            assert!(matches!(**source, FetchError::Status { status, .. } if status.as_u16() == 503));
        }
        other => panic!("expected Exhausted, got {:?}", other),
    }
}

#[tokio::test]
async fn test_fetch_recovers_after_transient_failures() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/recovering"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    mount_page(&server, "/recovering", "<p>ok</p>").await;

    let fetcher = Fetcher::new(&test_fetcher_config(3)).unwrap();
    let body = fetcher
        .fetch(&format!("{}/recovering", server.uri()))
        .await
        .unwrap();

    assert_eq!(body, "<p>ok</p>");
}

#[tokio::test]
async fn test_fetch_decodes_declared_charset() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/legacy"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(b"<p>caf\xe9</p>".to_vec(), "text/html; charset=windows-1252"),
        )
        .mount(&server)
        .await;

    let fetcher = Fetcher::new(&test_fetcher_config(1)).unwrap();
    let body = fetcher.fetch(&format!("{}/legacy", server.uri())).await.unwrap();

    assert_eq!(body, "<p>café</p>");
}

#[tokio::test]
async fn test_fetch_decodes_meta_charset() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/meta"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            b"<html><head><meta charset=\"windows-1252\"></head><p>caf\xe9</p></html>".to_vec(),
            "text/html",
        ))
        .mount(&server)
        .await;

    let fetcher = Fetcher::new(&test_fetcher_config(1)).unwrap();
    let body = fetcher.fetch(&format!("{}/meta", server.uri())).await.unwrap();

    assert!(body.contains("<p>café</p>"));
}

// ===== Pagination =====

#[tokio::test]
async fn test_walker_stops_on_cycle() {
    let server = MockServer::start().await;
    for (at, next) in [("/w/1", "/w/2"), ("/w/2", "/w/3"), ("/w/3", "/w/1")] {
        Mock::given(method("GET"))
            .and(path(at))
            .respond_with(html(listing(&[next_link(next)])))
            .expect(1)
            .mount(&server)
            .await;
    }

    let fetcher = Fetcher::new(&test_fetcher_config(1)).unwrap();
    let start = Url::parse(&format!("{}/w/1", server.uri())).unwrap();
    let mut walker = PageWalker::new(&fetcher, start, 100);

    let mut paths = Vec::new();
    while let Some(page) = walker.next_page().await.unwrap() {
        paths.push(page.url.path().to_string());
    }

    assert_eq!(paths, vec!["/w/1", "/w/2", "/w/3"]);
    assert_eq!(walker.pages_yielded(), 3);
    assert!(walker.next_page().await.unwrap().is_none());
}

#[tokio::test]
async fn test_walker_respects_max_pages() {
    let server = MockServer::start().await;
    for n in 1..=2 {
        mount_page(
            &server,
            &format!("/c/{}", n),
            listing(&[next_link(&format!("/c/{}", n + 1))]),
        )
        .await;
    }
    Mock::given(method("GET"))
        .and(path("/c/3"))
        .respond_with(html("<html></html>"))
        .expect(0)
        .mount(&server)
        .await;

    let fetcher = Fetcher::new(&test_fetcher_config(1)).unwrap();
    let start = Url::parse(&format!("{}/c/1", server.uri())).unwrap();
    let mut walker = PageWalker::new(&fetcher, start, 2);

    let mut count = 0;
    while walker.next_page().await.unwrap().is_some() {
        count += 1;
    }
    assert_eq!(count, 2);
}

#[tokio::test]
async fn test_walker_ends_on_later_page_failure() {
    let server = MockServer::start().await;
    mount_page(&server, "/m/1", listing(&[next_link("/m/2")])).await;
    Mock::given(method("GET"))
        .and(path("/m/2"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let fetcher = Fetcher::new(&test_fetcher_config(1)).unwrap();
    let start = Url::parse(&format!("{}/m/1", server.uri())).unwrap();
    let mut walker = PageWalker::new(&fetcher, start, 10);

    assert!(walker.next_page().await.unwrap().is_some());
    assert!(walker.next_page().await.unwrap().is_none());
    assert_eq!(walker.pages_yielded(), 1);
}

#[tokio::test]
async fn test_walker_start_page_failure_is_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/gone"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let fetcher = Fetcher::new(&test_fetcher_config(1)).unwrap();
    let start = Url::parse(&format!("{}/gone", server.uri())).unwrap();
    let mut walker = PageWalker::new(&fetcher, start, 10);

    assert!(walker.next_page().await.is_err());
    assert!(walker.next_page().await.unwrap().is_none());
}

// ===== Enrichment =====

fn stub_game(server: &MockServer, game_path: &str) -> Game {
    Game {
        red_player: "A".to_string(),
        black_player: "B".to_string(),
        event: "Open Cup".to_string(),
        url: format!("{}{}", server.uri(), game_path),
        result: "1-0".to_string(),
        ..Game::default()
    }
}

#[tokio::test]
async fn test_enrich_with_partial_fields() {
    let server = MockServer::start().await;
    mount_page(&server, "/g/7", detail_page("/f/7")).await;
    mount_page(&server, "/f/7", "<script>var strMoveList = ' 7747 ';</script>").await;

    let fetcher = Fetcher::new(&test_fetcher_config(1)).unwrap();
    let parser = DetailParser::new("{nonce}").unwrap();
    let mut persistence = Persistence::with_store(Box::new(MemoryStore::new()));
    let mut game = stub_game(&server, "/g/7");

    parser
        .enrich(&fetcher, &mut persistence, &mut game)
        .await
        .unwrap();

    assert_eq!(game.move_list.as_deref(), Some("7747"));
    assert!(game.begin_fen.is_none());
    assert!(game.start_color.is_none());
    assert!(game.id.is_some());

    let stored = persistence
        .store()
        .unwrap()
        .get_game_by_url(&game.url)
        .unwrap()
        .unwrap();
    assert_eq!(stored.move_list.as_deref(), Some("7747"));
    assert_eq!(stored.red_player_id, game.red_player_id);
}

#[tokio::test]
async fn test_enrich_without_frame_fails_that_game_only() {
    let server = MockServer::start().await;
    mount_page(&server, "/g/8", "<html><body>No board</body></html>").await;

    let fetcher = Fetcher::new(&test_fetcher_config(1)).unwrap();
    let parser = DetailParser::new("{nonce}").unwrap();
    let mut persistence = Persistence::with_store(Box::new(MemoryStore::new()));
    let mut game = stub_game(&server, "/g/8");
    let before = game.clone();

    let result = parser.enrich(&fetcher, &mut persistence, &mut game).await;

    assert!(matches!(result, Err(HarvestError::DetailNotFound { .. })));
    assert_eq!(game, before);
    assert_eq!(persistence.store().unwrap().count_games().unwrap(), 0);
}

// ===== Full crawl =====

fn expected_summary() -> RunSummary {
    RunSummary {
        players_visited: 4,
        pages_walked: 4,
        stubs_seen: 6,
        games_recorded: 4,
        enrichment_failures: 1,
    }
}

#[tokio::test]
async fn test_full_crawl_into_memory_store() {
    let server = MockServer::start().await;
    mount_site(&server, 1).await;

    let persistence = Persistence::with_store(Box::new(MemoryStore::new()));
    let mut coordinator = Coordinator::new(test_config(&server.uri()), persistence, "hash").unwrap();

    let summary = coordinator.run().await.unwrap();
    assert_eq!(summary, expected_summary());

    let state = coordinator.state();
    assert_eq!(state.player_count(), 4);
    assert_eq!(state.visited_count(), 4);
    assert_eq!(state.queue_len(), 0);
    assert_eq!(state.player_state("D"), PlayerState::Visited);
    assert_eq!(state.player_url("D"), "");
    assert!(state.player("A").unwrap().id.is_some());
    assert_eq!(state.event_count(), 2);
    assert_eq!(state.games().len(), 4);

    let store = coordinator.persistence().store().unwrap();
    assert_eq!(store.count_players().unwrap(), 4);
    assert_eq!(store.count_events().unwrap(), 2);
    assert_eq!(store.count_games().unwrap(), 4);
    assert_eq!(store.count_games_with_moves().unwrap(), 3);

    let game1 = store
        .get_game_by_url(&format!("{}/g/1", server.uri()))
        .unwrap()
        .unwrap();
    assert_eq!(game1.move_list.as_deref(), Some("77zz41"));
    assert_eq!(game1.start_color.as_deref(), Some("red"));
    assert!(game1.red_player_id.is_some());

    let game4 = store
        .get_game_by_url(&format!("{}/g/4", server.uri()))
        .unwrap()
        .unwrap();
    assert!(game4.move_list.is_none());
    assert_eq!(game4.event, "Winter Cup");
    assert!(game4.black_player_id.is_some());

    let run = store.get_latest_run().unwrap().unwrap();
    assert_eq!(run.status, RunStatus::Completed);
    assert_eq!(run.summary, expected_summary());
    assert_eq!(run.config_hash, "hash");
}

#[tokio::test]
async fn test_full_crawl_without_persistence() {
    let server = MockServer::start().await;
    mount_site(&server, 1).await;

    let mut coordinator =
        Coordinator::new(test_config(&server.uri()), Persistence::disabled(), "hash").unwrap();

    let summary = coordinator.run().await.unwrap();

    assert_eq!(summary, expected_summary());
    assert!(coordinator.persistence().store().is_none());
    assert!(coordinator.state().player("A").unwrap().id.is_none());
}

#[tokio::test]
async fn test_crawl_into_sqlite_is_idempotent() {
    let server = MockServer::start().await;
    mount_site(&server, 2).await;
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("kydao.db");

    let mut config = test_config(&server.uri());
    config.storage.database_path = Some(db_path.display().to_string());

    let first = run_crawl(config.clone(), "hash").await.unwrap();
    assert_eq!(first, expected_summary());

    let second = run_crawl(config, "hash").await.unwrap();
    assert_eq!(second, expected_summary());

    let storage = SqliteStorage::new(&db_path).unwrap();
    assert_eq!(storage.count_players().unwrap(), 4);
    assert_eq!(storage.count_events().unwrap(), 2);
    assert_eq!(storage.count_games().unwrap(), 4);
    assert_eq!(storage.count_games_with_moves().unwrap(), 3);

    let players = storage.list_players().unwrap();
    let a = players.iter().find(|p| p.name == "A").unwrap();
    assert_eq!(a.url, format!("{}/p/A", server.uri()));

    let run = storage.get_latest_run().unwrap().unwrap();
    assert_eq!(run.id, 2);
    assert_eq!(run.status, RunStatus::Completed);
}

#[tokio::test]
async fn test_player_saved_with_registry_url() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/",
        listing(&[entry(("A", "/p/A"), ("D", "/p/D"), "/g/1", "Open Cup")]),
    )
    .await;
    // A's listing links only A; D's URL is known from the seed page
    mount_page(
        &server,
        "/p/A",
        listing(&[entry(("A", "/p/A"), ("D", ""), "/g/5", "Open Cup")]),
    )
    .await;
    mount_page(&server, "/p/D", listing(&[])).await;
    mount_page(&server, "/g/5", detail_page("/f/5")).await;
    mount_page(&server, "/f/5", frame_page(5)).await;

    let persistence = Persistence::with_store(Box::new(MemoryStore::new()));
    let mut coordinator = Coordinator::new(test_config(&server.uri()), persistence, "hash").unwrap();
    coordinator.run().await.unwrap();

    let store = coordinator.persistence().store().unwrap();
    let players = store.list_players().unwrap();
    let d = players.iter().find(|p| p.name == "D").unwrap();
    assert_eq!(d.url, format!("{}/p/D", server.uri()));

    let game = store
        .get_game_by_url(&format!("{}/g/5", server.uri()))
        .unwrap()
        .unwrap();
    assert_eq!(game.move_list.as_deref(), Some("77zz45"));
}

#[tokio::test]
async fn test_unreachable_seed_fails_the_run() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(500))
        .expect(2)
        .mount(&server)
        .await;

    let mut config = test_config(&server.uri());
    config.fetcher = test_fetcher_config(2);
    let persistence = Persistence::with_store(Box::new(MemoryStore::new()));
    let mut coordinator = Coordinator::new(config, persistence, "hash").unwrap();

    let result = coordinator.run().await;

    assert!(matches!(
        result,
        Err(HarvestError::Fetch(FetchError::Exhausted { attempts: 2, .. }))
    ));
    let run = coordinator
        .persistence()
        .store()
        .unwrap()
        .get_latest_run()
        .unwrap()
        .unwrap();
    assert_eq!(run.status, RunStatus::Failed);
    assert_eq!(coordinator.state().player_count(), 0);
}
