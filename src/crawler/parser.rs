//! Listing page parser
//!
//! This module extracts from one listing page:
//! - Game stubs (red player, black player, result link, event)
//! - Player links, used to seed discovery
//!
//! A game entry on kydao.net looks like:
//!
//! ```html
//! <div class="game">
//!   <div class="red"><a href="/ky-thu/...">Red player</a></div>
//!   <div class="black"><a href="/ky-thu/...">Black player</a></div>
//!   <div class="result"><a href="/van-co/...">1-0</a></div>
//!   <div class="event"><a href="/giai-dau/...">Event name</a></div>
//! </div>
//! ```

use crate::model::{GameStub, PlayerLink};
use crate::HarvestError;
use scraper::{ElementRef, Html, Selector};
use url::Url;

const GAME_SELECTOR: &str = "div.game";
const RED_SELECTOR: &str = "div.red > a";
const BLACK_SELECTOR: &str = "div.black > a";
const RESULT_SELECTOR: &str = "div.result > a";
const EVENT_SELECTOR: &str = "div.event > a";

/// Compiles a built-in CSS selector
pub(crate) fn parse_selector(css: &str) -> Result<Selector, HarvestError> {
    Selector::parse(css).map_err(|e| HarvestError::Selector {
        selector: css.to_string(),
        message: e.to_string(),
    })
}

/// Selectors for the four anchors of a game entry
struct EntrySelectors {
    game: Selector,
    red: Selector,
    black: Selector,
    result: Selector,
    event: Selector,
}

impl EntrySelectors {
    fn new() -> Result<Self, HarvestError> {
        Ok(Self {
            game: parse_selector(GAME_SELECTOR)?,
            red: parse_selector(RED_SELECTOR)?,
            black: parse_selector(BLACK_SELECTOR)?,
            result: parse_selector(RESULT_SELECTOR)?,
            event: parse_selector(EVENT_SELECTOR)?,
        })
    }
}

/// Parses every well-formed game entry on a listing page
///
/// Entries missing any of the red, black, result or event anchors, or whose
/// result anchor has no href, are skipped with a warning.
///
/// # Arguments
///
/// * `html` - The listing page markup
/// * `base_url` - The page URL, used to resolve relative links
///
/// # Example
///
/// ```
/// use kydao_harvest::crawler::parse_game_stubs;
/// use url::Url;
///
/// let html = r#"<div class="game">
///   <div class="red"><a href="/p/1">A</a></div>
///   <div class="black"><a href="/p/2">B</a></div>
///   <div class="result"><a href="/g/9">1-0</a></div>
///   <div class="event"><a href="/e/3">Open</a></div>
/// </div>"#;
/// let base = Url::parse("https://kydao.net/p/1").unwrap();
/// let stubs = parse_game_stubs(html, &base).unwrap();
/// assert_eq!(stubs[0].url, "https://kydao.net/g/9");
/// ```
pub fn parse_game_stubs(html: &str, base_url: &Url) -> Result<Vec<GameStub>, HarvestError> {
    let selectors = EntrySelectors::new()?;
    let document = Html::parse_document(html);
    let mut stubs = Vec::new();

    for entry in document.select(&selectors.game) {
        let anchors = (
            first(&entry, &selectors.red),
            first(&entry, &selectors.black),
            first(&entry, &selectors.result),
            first(&entry, &selectors.event),
        );
        let (Some(red), Some(black), Some(result), Some(event)) = anchors else {
            tracing::warn!("Skipping malformed game entry on {}", base_url);
            continue;
        };

        let game_href = href(&result);
        if game_href.is_empty() {
            tracing::warn!("Game link missing href on {}; skipping", base_url);
            continue;
        }
        let Some(url) = resolve(base_url, game_href) else {
            tracing::warn!("Unresolvable game link '{}' on {}", game_href, base_url);
            continue;
        };

        stubs.push(GameStub {
            red_player: collapse_text(&red),
            red_url: resolve_or_empty(base_url, href(&red)),
            black_player: collapse_text(&black),
            black_url: resolve_or_empty(base_url, href(&black)),
            result: collapse_text(&result),
            url,
            event: collapse_text(&event),
        });
    }

    Ok(stubs)
}

/// Extracts the red and black player anchors of every game entry
///
/// Entries without both player anchors are skipped. A player anchor with
/// an empty href yields an empty URL.
pub fn parse_player_links(html: &str, base_url: &Url) -> Result<Vec<PlayerLink>, HarvestError> {
    let selectors = EntrySelectors::new()?;
    let document = Html::parse_document(html);
    let mut links = Vec::new();

    for entry in document.select(&selectors.game) {
        let (Some(red), Some(black)) = (
            first(&entry, &selectors.red),
            first(&entry, &selectors.black),
        ) else {
            tracing::debug!("Skipping malformed player entry on {}", base_url);
            continue;
        };

        for anchor in [red, black] {
            links.push(PlayerLink {
                name: collapse_text(&anchor),
                url: resolve_or_empty(base_url, href(&anchor)),
            });
        }
    }

    Ok(links)
}

fn first<'a>(element: &ElementRef<'a>, selector: &Selector) -> Option<ElementRef<'a>> {
    element.select(selector).next()
}

fn href<'a>(anchor: &ElementRef<'a>) -> &'a str {
    anchor.value().attr("href").unwrap_or("").trim()
}

/// Joins all text nodes and collapses whitespace runs to single spaces
pub(crate) fn collapse_text(element: &ElementRef) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Resolves a non-empty href against the page URL
pub(crate) fn resolve(base_url: &Url, href: &str) -> Option<String> {
    base_url.join(href).ok().map(|url| url.to_string())
}

fn resolve_or_empty(base_url: &Url, href: &str) -> String {
    if href.is_empty() {
        return String::new();
    }
    resolve(base_url, href).unwrap_or_default()
}
