//! Game detail extraction
//!
//! A game's detail page embeds the board in a frame (`#game`). The frame
//! document carries the game data as inline script assignments:
//!
//! ```text
//! var strMoveList = '7747{nonce}1927...';
//! var beginFEN = "rnbakabnr/9/1c5c1/p1p1p1p1p/9/9/P1P1P1P1P/1C5C1/9/RNBAKABNR w";
//! var startColor = 'red';
//! StartBoard('a1b2c3', ...);
//! ```
//!
//! Each value is read with the same narrow grammar:
//!
//! ```text
//! assignment := KEY ws* "=" ws* ( "'" value "'" | '"' value '"' )
//! value      := one or more characters other than ' and "
//! ```
//!
//! `KEY` must not be preceded by an identifier character, so `xstrMoveList`
//! does not match `strMoveList`. The board nonce is the first quoted argument
//! of `StartBoard(`.

use crate::crawler::fetcher::Fetcher;
use crate::crawler::parser::{parse_selector, resolve};
use crate::model::Game;
use crate::storage::Persistence;
use crate::HarvestError;
use regex::{Captures, Regex};
use scraper::Html;
use url::Url;

const FRAME_SELECTOR: &str = "#game";

const MOVE_LIST_KEY: &str = "strMoveList";
const BEGIN_FEN_KEY: &str = "beginFEN";
const START_COLOR_KEY: &str = "startColor";

/// Detail fields extracted from a board frame; each one independently optional
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DetailFields {
    pub move_list: Option<String>,
    pub begin_fen: Option<String>,
    pub start_color: Option<String>,
}

/// Builds the pattern for `KEY = 'value'` / `KEY = "value"`
fn assignment_pattern(key: &str) -> Result<Regex, regex::Error> {
    Regex::new(&format!(
        r#"(?:^|[^A-Za-z0-9_$]){}\s*=\s*(?:'([^'"]+)'|"([^'"]+)")"#,
        regex::escape(key)
    ))
}

/// The value of whichever quote alternative matched
fn quoted_value(captures: &Captures) -> Option<String> {
    captures
        .get(1)
        .or_else(|| captures.get(2))
        .map(|m| m.as_str().to_string())
}

/// Compiled extraction patterns plus the nonce placeholder
#[derive(Debug, Clone)]
pub struct DetailParser {
    move_list: Regex,
    begin_fen: Regex,
    start_color: Regex,
    board_nonce: Regex,
    nonce_placeholder: String,
}

impl DetailParser {
    /// Compiles the extraction patterns
    ///
    /// `nonce_placeholder` is the marker inside the move list that is
    /// replaced by the board nonce; an empty placeholder disables substitution.
    pub fn new(nonce_placeholder: impl Into<String>) -> Result<Self, HarvestError> {
        Ok(Self {
            move_list: assignment_pattern(MOVE_LIST_KEY)?,
            begin_fen: assignment_pattern(BEGIN_FEN_KEY)?,
            start_color: assignment_pattern(START_COLOR_KEY)?,
            board_nonce: Regex::new(r#"StartBoard\(\s*(?:'([^'"]+)'|"([^'"]+)")"#)?,
            nonce_placeholder: nonce_placeholder.into(),
        })
    }

    /// Extracts the move list, starting FEN and starting colour from frame text
    pub fn extract(&self, frame_text: &str) -> DetailFields {
        let move_list = self
            .move_list
            .captures(frame_text)
            .and_then(|c| quoted_value(&c))
            .map(|moves| moves.trim().to_string())
            .map(|moves| self.substitute_nonce(moves, self.board_nonce(frame_text)));

        DetailFields {
            move_list,
            begin_fen: self
                .begin_fen
                .captures(frame_text)
                .and_then(|c| quoted_value(&c)),
            start_color: self
                .start_color
                .captures(frame_text)
                .and_then(|c| quoted_value(&c)),
        }
    }

    /// The first quoted argument of `StartBoard(`, if any
    pub fn board_nonce(&self, frame_text: &str) -> Option<String> {
        self.board_nonce
            .captures(frame_text)
            .and_then(|c| quoted_value(&c))
    }

    fn substitute_nonce(&self, moves: String, nonce: Option<String>) -> String {
        if self.nonce_placeholder.is_empty() {
            return moves;
        }

        let has_placeholder = moves.contains(&self.nonce_placeholder);
        match (has_placeholder, nonce) {
            (true, Some(nonce)) => moves.replace(&self.nonce_placeholder, &nonce),
            (true, None) => {
                tracing::warn!(
                    "Move list contains placeholder '{}' but no board nonce was found",
                    self.nonce_placeholder
                );
                moves
            }
            (false, Some(_)) => {
                tracing::debug!("Board nonce found but move list has no placeholder");
                moves
            }
            (false, None) => moves,
        }
    }

    /// Fetches a game's detail page and board frame, fills its detail fields,
    /// and persists the game
    ///
    /// # Errors
    ///
    /// * `HarvestError::DetailNotFound` - the detail page has no `#game` frame with a `src`
    /// * `HarvestError::Fetch` - the detail page or frame could not be fetched
    ///
    /// On error the game keeps its stub fields and can still be persisted by the caller.
    pub async fn enrich(
        &self,
        fetcher: &Fetcher,
        persistence: &mut Persistence,
        game: &mut Game,
    ) -> Result<(), HarvestError> {
        let detail_url = Url::parse(&game.url)?;
        let detail_html = fetcher.fetch(detail_url.as_str()).await?;
        let frame_url = find_frame_url(&detail_html, &detail_url)?;

        tracing::debug!("Fetching board frame {} for {}", frame_url, game.url);
        let frame_text = fetcher.fetch(&frame_url).await?;

        let fields = self.extract(&frame_text);
        if fields.move_list.is_none() {
            tracing::debug!("No move list in board frame for {}", game.url);
        }
        game.move_list = fields.move_list;
        game.begin_fen = fields.begin_fen;
        game.start_color = fields.start_color;

        persistence.save_game(game);
        Ok(())
    }
}

/// Locates the `#game` frame on a detail page and resolves its `src`
pub fn find_frame_url(html: &str, page_url: &Url) -> Result<String, HarvestError> {
    let selector = parse_selector(FRAME_SELECTOR)?;
    let document = Html::parse_document(html);

    document
        .select(&selector)
        .next()
        .and_then(|frame| frame.value().attr("src"))
        .map(str::trim)
        .filter(|src| !src.is_empty())
        .and_then(|src| resolve(page_url, src))
        .ok_or_else(|| HarvestError::DetailNotFound {
            url: page_url.to_string(),
        })
}
