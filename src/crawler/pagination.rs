//! Pagination walker for a player's game listing
//!
//! Listing pages link to their successor through the pager anchor
//! `#Content_pager_lblnext > a`. A walk follows that link until it is
//! missing, points at a page already yielded, or the page ceiling is hit.

use crate::crawler::fetcher::Fetcher;
use crate::crawler::parser::{parse_selector, resolve};
use crate::model::PageCapture;
use crate::{FetchError, HarvestError};
use scraper::Html;
use std::collections::HashSet;
use url::Url;

const NEXT_PAGE_SELECTOR: &str = "#Content_pager_lblnext > a";

/// Finds the absolute URL of the "next page" link, if any
pub fn find_next_page(html: &str, page_url: &Url) -> Result<Option<Url>, HarvestError> {
    let selector = parse_selector(NEXT_PAGE_SELECTOR)?;
    let document = Html::parse_document(html);

    let next = document
        .select(&selector)
        .next()
        .and_then(|anchor| anchor.value().attr("href"))
        .map(str::trim)
        .filter(|href| !href.is_empty())
        .and_then(|href| resolve(page_url, href))
        .and_then(|url| Url::parse(&url).ok());

    Ok(next)
}

/// A lazy, finite walk over one player's listing pages
///
/// Pages are fetched one at a time as [`PageWalker::next_page`] is called.
/// The walker holds no state beyond its own walk; starting a new walker on
/// the same URL fetches everything again.
pub struct PageWalker<'a> {
    fetcher: &'a Fetcher,
    start_url: Url,
    max_pages: usize,
    visited: HashSet<String>,
    next: Option<Url>,
    yielded: usize,
    finished: bool,
}

impl<'a> PageWalker<'a> {
    /// Creates a walker; nothing is fetched until the first `next_page` call
    ///
    /// `max_pages` is raised to 1 if smaller: the start page is always yielded.
    pub fn new(fetcher: &'a Fetcher, start_url: Url, max_pages: usize) -> Self {
        Self {
            fetcher,
            start_url,
            max_pages: max_pages.max(1),
            visited: HashSet::new(),
            next: None,
            yielded: 0,
            finished: false,
        }
    }

    /// Number of pages yielded so far
    pub fn pages_yielded(&self) -> usize {
        self.yielded
    }

    /// Fetches and returns the next page of the walk
    ///
    /// # Returns
    ///
    /// * `Ok(Some(page))` - The next listing page
    /// * `Ok(None)` - The walk is over
    /// * `Err(FetchError)` - The start page could not be fetched
    ///
    /// Failures on later pages end the walk with `Ok(None)`.
    pub async fn next_page(&mut self) -> Result<Option<PageCapture>, FetchError> {
        if self.finished {
            return Ok(None);
        }

        if self.yielded == 0 {
            let url = self.start_url.clone();
            return match self.fetcher.fetch(url.as_str()).await {
                Ok(html) => Ok(Some(self.capture(html, url))),
                Err(e) => {
                    self.finished = true;
                    Err(e)
                }
            };
        }

        let Some(url) = self.next.take() else {
            tracing::debug!("No next page after {} pages of {}", self.yielded, self.start_url);
            return Ok(self.finish());
        };

        if self.visited.contains(url.as_str()) {
            tracing::info!("Pager points back to seen page {}; stopping pagination", url);
            return Ok(self.finish());
        }

        if self.yielded >= self.max_pages {
            tracing::info!(
                "Reached max_pages ({}) for {}; stopping pagination",
                self.max_pages,
                self.start_url
            );
            return Ok(self.finish());
        }

        match self.fetcher.fetch(url.as_str()).await {
            Ok(html) => Ok(Some(self.capture(html, url))),
            Err(e) => {
                tracing::warn!("Failed to fetch page {}: {}", url, e);
                Ok(self.finish())
            }
        }
    }

    fn capture(&mut self, html: String, url: Url) -> PageCapture {
        self.next = match find_next_page(&html, &url) {
            Ok(next) => next,
            Err(e) => {
                tracing::warn!("Could not look for next page on {}: {}", url, e);
                None
            }
        };
        self.visited.insert(url.to_string());
        self.yielded += 1;
        PageCapture { html, url }
    }

    fn finish(&mut self) -> Option<PageCapture> {
        self.finished = true;
        None
    }
}
