use crate::feed::item::FeedItem;
use crate::feed::parser::{parse_feed, ParseError, ParsedFeed};
use crate::util::{validate_url, UrlValidationError};
use thiserror::Error;

/// Errors that can occur during a fetch-and-parse cycle.
///
/// All of these are reported into [`FeedState::error_message`], never
/// fatal; previously published items remain visible.
#[derive(Debug, Error)]
pub enum FeedError {
    /// The configured feed URL is not a well-formed HTTP(S) URL; the fetch
    /// aborts before any I/O.
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] UrlValidationError),
    /// Network-level error (DNS, connection, TLS, etc.)
    #[error("request failed: {0}")]
    Network(#[from] reqwest::Error),
    /// HTTP response with non-2xx status code
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),
    /// Feed body could not be consumed by the streaming parser
    #[error("failed to parse feed data: {0}")]
    Parse(#[from] ParseError),
}

/// Observable fetch state, owned exclusively by [`FeedCoordinator`].
///
/// Readers get at it through [`FeedCoordinator::state`]; all writes happen
/// inside [`FeedCoordinator::refresh`], after the awaited fetch completes,
/// so `items` and `feed_title` are never visible mid-update.
#[derive(Debug, Clone, Default)]
pub struct FeedState {
    /// Parsed items in document order; replaced wholesale on each
    /// successful fetch, never partially mutated.
    pub items: Vec<FeedItem>,
    /// Channel-level title from the last successful fetch.
    pub feed_title: String,
    /// True strictly between fetch start and completion.
    pub is_loading: bool,
    /// Set only by a failed fetch; cleared at the start of the next one.
    pub error_message: Option<String>,
    /// Target of the next fetch.
    pub feed_url: String,
}

/// Drives one fetch-and-parse cycle per trigger and publishes the outcome.
///
/// The coordinator owns its [`FeedState`] and an injected HTTP client.
/// [`refresh`](Self::refresh) takes `&mut self`, so at most one fetch per
/// coordinator can be in flight — overlapping triggers are ruled out by the
/// borrow checker rather than by runtime de-duplication. No cancellation
/// and no timeout: an in-flight fetch runs to completion (callers wanting a
/// deadline can wrap `refresh` in `tokio::time::timeout`).
pub struct FeedCoordinator {
    client: reqwest::Client,
    state: FeedState,
}

impl FeedCoordinator {
    /// Creates an idle coordinator with a default HTTP client.
    pub fn new(feed_url: impl Into<String>) -> Self {
        Self::with_client(feed_url, reqwest::Client::new())
    }

    /// Creates an idle coordinator with a caller-configured HTTP client.
    pub fn with_client(feed_url: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            client,
            state: FeedState {
                feed_url: feed_url.into(),
                ..FeedState::default()
            },
        }
    }

    /// The published state, read-only to the caller.
    pub fn state(&self) -> &FeedState {
        &self.state
    }

    /// Points the next fetch at a different feed. Does not trigger one.
    pub fn set_feed_url(&mut self, url: impl Into<String>) {
        self.state.feed_url = url.into();
    }

    /// Runs one fetch cycle: validate URL, retrieve, parse, publish.
    ///
    /// On success `items` and `feed_title` are replaced together and
    /// `error_message` stays `None`. On any failure the error is published
    /// into `error_message` and the previously fetched items and title are
    /// left untouched. Either way `is_loading` is false on return.
    ///
    /// # Errors
    ///
    /// Returns the same [`FeedError`] that was published into the state:
    /// [`FeedError::InvalidUrl`] before any I/O, [`FeedError::Network`] or
    /// [`FeedError::HttpStatus`] for a failed retrieval, or
    /// [`FeedError::Parse`] for an unconsumable body.
    pub async fn refresh(&mut self) -> Result<(), FeedError> {
        self.state.error_message = None;
        self.state.is_loading = true;

        let outcome = self.fetch_and_parse().await;
        self.state.is_loading = false;

        match outcome {
            Ok(parsed) => {
                tracing::info!(
                    url = %self.state.feed_url,
                    items = parsed.items.len(),
                    "Feed refreshed"
                );
                self.state.items = parsed.items;
                self.state.feed_title = parsed.title;
                Ok(())
            }
            Err(e) => {
                tracing::warn!(url = %self.state.feed_url, error = %e, "Feed refresh failed");
                self.state.error_message = Some(e.to_string());
                Err(e)
            }
        }
    }

    async fn fetch_and_parse(&self) -> Result<ParsedFeed, FeedError> {
        let url = validate_url(&self.state.feed_url)?;

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FeedError::HttpStatus(status.as_u16()));
        }
        let bytes = response.bytes().await?;

        Ok(parse_feed(&bytes)?)
    }
}
