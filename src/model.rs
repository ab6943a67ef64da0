//! Domain records observed during a crawl
//!
//! Players, events and games are created the moment they are first seen on
//! a listing page and mutated in place as store ids and detail fields arrive.

use url::Url;

/// A player known to the crawl, identified by display name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    pub name: String,

    /// Absolute link to the player's game listing; empty when only the name is known
    pub url: String,

    /// Store identifier, set after the first successful upsert
    pub id: Option<i64>,
}

impl Player {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            id: None,
        }
    }
}

/// An event (tournament) a game was played in
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub name: String,
    pub id: Option<i64>,
}

impl Event {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: None,
        }
    }
}

/// A player anchor extracted from a listing page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerLink {
    pub name: String,
    /// Absolute URL, or empty if the anchor had no href
    pub url: String,
}

/// The minimal game record read off a listing page, before enrichment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameStub {
    pub red_player: String,
    pub red_url: String,
    pub black_player: String,
    pub black_url: String,
    pub result: String,
    /// Absolute link to the game's detail page
    pub url: String,
    pub event: String,
}

/// Dedup key for a game within one run
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GameIdentity {
    pub red_player: String,
    pub black_player: String,
    pub event: String,
    pub url: String,
}

/// A game record with resolved store ids and optional detail fields
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Game {
    pub red_player: String,
    pub red_url: String,
    pub black_player: String,
    pub black_url: String,
    pub event: String,
    /// Natural key for persistence
    pub url: String,
    pub result: String,

    pub id: Option<i64>,
    pub red_player_id: Option<i64>,
    pub black_player_id: Option<i64>,
    pub event_id: Option<i64>,

    /// Raw encoded move string from the board frame
    pub move_list: Option<String>,
    /// Starting position in FEN
    pub begin_fen: Option<String>,
    /// Side to move first
    pub start_color: Option<String>,
}

impl Game {
    pub fn identity(&self) -> GameIdentity {
        GameIdentity {
            red_player: self.red_player.clone(),
            black_player: self.black_player.clone(),
            event: self.event.clone(),
            url: self.url.clone(),
        }
    }

    /// True when at least one detail field was extracted
    pub fn is_enriched(&self) -> bool {
        self.move_list.is_some() || self.begin_fen.is_some() || self.start_color.is_some()
    }
}

impl From<GameStub> for Game {
    fn from(stub: GameStub) -> Self {
        Self {
            red_player: stub.red_player,
            red_url: stub.red_url,
            black_player: stub.black_player,
            black_url: stub.black_url,
            event: stub.event,
            url: stub.url,
            result: stub.result,
            ..Self::default()
        }
    }
}

/// One fetched listing page
#[derive(Debug, Clone)]
pub struct PageCapture {
    pub html: String,
    pub url: Url,
}
