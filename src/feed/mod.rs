//! Feed parsing and fetch orchestration.
//!
//! - [`parser`] - Streaming XML-to-item parsing driven by `quick-xml` events
//! - [`coordinator`] - Fetch state machine that retrieves a feed over HTTP,
//!   hands the body to the parser, and publishes the result
//! - [`item`] - The parsed item value type

mod coordinator;
mod item;
mod parser;

pub use coordinator::{FeedCoordinator, FeedError, FeedState};
pub use item::{FeedItem, ItemId};
pub use parser::{parse_feed, ParseError, ParsedFeed};
