//! Fetch-and-preview core for RSS-style syndication feeds.
//!
//! Two components, consumed by a presentation layer of the caller's choosing:
//!
//! - [`feed::parse_feed`] — a streaming XML consumer that turns raw feed
//!   bytes into a feed title plus an ordered list of [`feed::FeedItem`]s.
//! - [`feed::FeedCoordinator`] — drives one fetch-and-parse cycle per
//!   trigger and publishes the outcome as observable [`feed::FeedState`].
//!
//! The library performs no persistence and installs no tracing subscriber;
//! it emits `tracing` events and leaves collection to the embedding
//! application.

pub mod feed;
pub mod util;

pub use feed::{
    parse_feed, FeedCoordinator, FeedError, FeedItem, FeedState, ItemId, ParseError, ParsedFeed,
};
