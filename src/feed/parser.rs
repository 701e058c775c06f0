use crate::feed::item::{FeedItem, ItemId};
use chrono::DateTime;
use quick_xml::events::attributes::AttrError;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use thiserror::Error;

/// Errors that can occur while consuming a feed document.
///
/// Parsing is all-or-nothing: any of these discards items parsed so far.
#[derive(Debug, Error)]
pub enum ParseError {
    /// The XML tokenizer could not make progress (bad markup, mismatched
    /// end tag, unresolvable entity).
    #[error("malformed XML: {0}")]
    Xml(#[from] quick_xml::Error),
    /// An element attribute could not be decoded.
    #[error("malformed attribute: {0}")]
    Attr(#[from] AttrError),
    /// The document ended with elements still open (e.g. an unclosed tag).
    #[error("unexpected end of document: {0} unclosed element(s)")]
    UnexpectedEof(usize),
}

/// Result of parsing one feed document.
#[derive(Debug, Clone, Default)]
pub struct ParsedFeed {
    /// Channel-level feed title: the first `<title>` text in the document.
    pub title: String,
    /// Items in document order.
    pub items: Vec<FeedItem>,
}

/// Parses a raw RSS document into a feed title and an ordered item list.
///
/// Streaming consumer: the document is processed as a sequence of
/// element-start, character-data, and element-end events, never built into
/// a tree. Per item it extracts `title`, `link`, `description`, `pubDate`,
/// and the URL of the first `media:content` element (attribute or text
/// form). Missing children yield empty fields, not errors.
///
/// Element scope is tracked with a single current-element register rather
/// than a stack, with per-item accumulators reset at each `<item>` start.
/// Known limitation, kept deliberately: same-named elements at feed and
/// item level are only disambiguated by that reset, and the first `title`
/// text in document order is taken as the feed title — a channel title
/// appearing after the first item would be misattributed.
///
/// # Errors
///
/// Returns [`ParseError`] if the tokenizer cannot consume the stream to
/// completion, including documents that end with unclosed elements.
pub fn parse_feed(bytes: &[u8]) -> Result<ParsedFeed, ParseError> {
    let mut reader = Reader::from_reader(bytes);
    // Mismatched end tags are a hard parse failure, not recoverable noise.
    reader.config_mut().check_end_names = true;
    let mut parser = FeedParser::default();
    let mut buf = Vec::new();
    let mut depth = 0usize;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => {
                depth += 1;
                parser.handle_start(&e)?;
            }
            // Self-closing element: opens and closes in one event, which
            // still moves the current-element register and may carry the
            // image URL attribute.
            Event::Empty(e) => parser.handle_start(&e)?,
            Event::Text(e) => {
                let text = e.unescape()?;
                parser.handle_text(&text);
            }
            Event::CData(e) => {
                let text = String::from_utf8_lossy(&e.into_inner()).into_owned();
                parser.handle_text(&text);
            }
            Event::End(e) => {
                depth = depth.saturating_sub(1);
                parser.handle_end(e.name().as_ref());
            }
            Event::Eof => {
                if depth > 0 {
                    return Err(ParseError::UnexpectedEof(depth));
                }
                return Ok(parser.finish());
            }
            _ => {}
        }
        buf.clear();
    }
}

/// Accumulator state for one pass over a feed document.
///
/// One parser per document; discarded after [`FeedParser::finish`].
#[derive(Default)]
struct FeedParser {
    feed_title: String,
    items: Vec<FeedItem>,
    current_element: String,
    title: String,
    link: String,
    description: String,
    pub_date: String,
    image_url: Option<String>,
    next_id: u64,
}

impl FeedParser {
    fn handle_start(&mut self, e: &BytesStart) -> Result<(), ParseError> {
        let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();

        if name == "item" {
            // Item boundary: a fresh scope for the per-item accumulators.
            // The feed-level title is never reset.
            self.title.clear();
            self.link.clear();
            self.description.clear();
            self.pub_date.clear();
            self.image_url = None;
        } else if name == "media:content" && self.image_url.is_none() {
            // Common form is <media:content url="..."/>; first one wins.
            for attr in e.attributes() {
                let attr = attr?;
                if attr.key.as_ref() == b"url" {
                    self.image_url = Some(attr.unescape_value()?.into_owned());
                    break;
                }
            }
        }

        self.current_element = name;
        Ok(())
    }

    /// Dispatches a character-data chunk on the current-element register.
    ///
    /// Chunks append (a text node may arrive split around CDATA sections or
    /// comments), except for the image URL, which is set once and keeps its
    /// first value.
    fn handle_text(&mut self, text: &str) {
        match self.current_element.as_str() {
            "title" => {
                if self.feed_title.is_empty() {
                    // First title text in the document is the channel title;
                    // it never becomes part of an item title.
                    self.feed_title = text.to_owned();
                } else {
                    self.title.push_str(text);
                }
            }
            "link" => self.link.push_str(text),
            "description" => self.description.push_str(text),
            "pubDate" => self.pub_date.push_str(text),
            "media:content" => {
                if self.image_url.is_none() {
                    self.image_url = Some(text.to_owned());
                }
            }
            _ => {}
        }
    }

    fn handle_end(&mut self, name: &[u8]) {
        if name != b"item" {
            return;
        }
        let item = FeedItem {
            id: ItemId(self.next_id),
            title: self.title.trim().to_owned(),
            link: self.link.trim().to_owned(),
            description: self.description.trim().to_owned(),
            pub_date: normalize_pub_date(self.pub_date.trim()),
            image_url: self.image_url.take(),
        };
        self.next_id += 1;
        tracing::debug!(title = %item.title, "Parsed item");
        self.items.push(item);
    }

    fn finish(self) -> ParsedFeed {
        ParsedFeed {
            title: self.feed_title,
            items: self.items,
        }
    }
}

/// Best-effort date normalization, never a failure.
///
/// RFC-822 style input (`Tue, 01 Sep 2024 10:00:00 +0000`) is reformatted
/// to `2024-09-01 10:00:00`, keeping the wall-clock time of the source
/// offset. Anything else passes through unchanged.
///
/// The weekday name is dropped before parsing rather than checked against
/// the date: feeds routinely carry inconsistent weekdays, and chrono's `%a`
/// would reject them. A date without a weekday prefix parses too.
fn normalize_pub_date(raw: &str) -> String {
    let datetime = raw.split_once(", ").map_or(raw, |(_, rest)| rest);
    match DateTime::parse_from_str(datetime, "%d %b %Y %H:%M:%S %z") {
        Ok(date) => date.format("%Y-%m-%d %H:%M:%S").to_string(),
        Err(_) => raw.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_ITEM_FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0" xmlns:media="http://search.yahoo.com/mrss/">
  <channel>
    <title>Demo Feed</title>
    <item>
      <title>First Post</title>
      <link>https://example.com/first</link>
      <description>Hello &amp; welcome</description>
      <pubDate>Tue, 01 Sep 2024 10:00:00 +0000</pubDate>
      <media:content url="https://example.com/first.jpg"/>
    </item>
    <item>
      <title>Second Post</title>
      <link>https://example.com/second</link>
      <description>More news</description>
      <pubDate>not a date</pubDate>
    </item>
  </channel>
</rss>"#;

    #[test]
    fn test_two_items_in_document_order() {
        let feed = parse_feed(TWO_ITEM_FEED.as_bytes()).unwrap();

        assert_eq!(feed.title, "Demo Feed");
        assert_eq!(feed.items.len(), 2);
        assert_eq!(feed.items[0].title, "First Post");
        assert_eq!(feed.items[0].link, "https://example.com/first");
        assert_eq!(feed.items[0].description, "Hello & welcome");
        assert_eq!(feed.items[1].title, "Second Post");
    }

    #[test]
    fn test_ids_are_distinct() {
        let feed = parse_feed(TWO_ITEM_FEED.as_bytes()).unwrap();
        assert_ne!(feed.items[0].id, feed.items[1].id);
    }

    #[test]
    fn test_feed_title_excluded_from_item_titles() {
        let feed = parse_feed(TWO_ITEM_FEED.as_bytes()).unwrap();
        assert_eq!(feed.title, "Demo Feed");
        assert!(feed.items.iter().all(|i| !i.title.contains("Demo Feed")));
    }

    #[test]
    fn test_missing_children_yield_empty_fields() {
        let xml = r#"<rss><channel>
            <title>T</title>
            <item><title>Only a title</title></item>
        </channel></rss>"#;

        let feed = parse_feed(xml.as_bytes()).unwrap();
        assert_eq!(feed.items.len(), 1);
        let item = &feed.items[0];
        assert_eq!(item.title, "Only a title");
        assert_eq!(item.link, "");
        assert_eq!(item.description, "");
        assert_eq!(item.pub_date, "");
        assert_eq!(item.image_url, None);
    }

    #[test]
    fn test_chunked_character_data_concatenates() {
        // CDATA sections and comments split one text node into multiple
        // character-data events.
        let xml = r#"<rss><channel>
            <title>T</title>
            <item>
                <title>Hel<![CDATA[lo]]></title>
                <link>https://example.com/<!-- split -->a</link>
            </item>
        </channel></rss>"#;

        let feed = parse_feed(xml.as_bytes()).unwrap();
        assert_eq!(feed.items[0].title, "Hello");
        assert_eq!(feed.items[0].link, "https://example.com/a");
    }

    #[test]
    fn test_fields_trimmed_of_surrounding_whitespace() {
        let xml = "<rss><channel><title>T</title><item><title>\n   Padded \n</title></item></channel></rss>";
        let feed = parse_feed(xml.as_bytes()).unwrap();
        assert_eq!(feed.items[0].title, "Padded");
    }

    #[test]
    fn test_pub_date_normalized() {
        let feed = parse_feed(TWO_ITEM_FEED.as_bytes()).unwrap();
        assert_eq!(feed.items[0].pub_date, "2024-09-01 10:00:00");
    }

    #[test]
    fn test_unparseable_date_passes_through() {
        let feed = parse_feed(TWO_ITEM_FEED.as_bytes()).unwrap();
        assert_eq!(feed.items[1].pub_date, "not a date");
    }

    #[test]
    fn test_normalize_pub_date_direct() {
        assert_eq!(
            normalize_pub_date("Tue, 01 Sep 2024 10:00:00 +0000"),
            "2024-09-01 10:00:00"
        );
        assert_eq!(
            normalize_pub_date("Wed, 2 Oct 2024 23:59:59 +0200"),
            "2024-10-02 23:59:59"
        );
        assert_eq!(normalize_pub_date("not a date"), "not a date");
        assert_eq!(normalize_pub_date(""), "");
    }

    #[test]
    fn test_weekday_ignored_when_normalizing() {
        // 2024-09-01 was a Sunday; a wrong weekday name must not block
        // normalization, matching the lenient source formatter.
        assert_eq!(
            normalize_pub_date("Tue, 01 Sep 2024 10:00:00 +0000"),
            "2024-09-01 10:00:00"
        );
        assert_eq!(
            normalize_pub_date("Sun, 01 Sep 2024 10:00:00 +0000"),
            "2024-09-01 10:00:00"
        );
        // Weekday-less input parses as well.
        assert_eq!(
            normalize_pub_date("01 Sep 2024 10:00:00 +0000"),
            "2024-09-01 10:00:00"
        );
        // A stray comma still falls back to pass-through.
        assert_eq!(normalize_pub_date("hello, world"), "hello, world");
    }

    #[test]
    fn test_first_image_url_wins() {
        let xml = r#"<rss><channel><title>T</title>
            <item>
                <media:content url="https://example.com/one.jpg"/>
                <media:content url="https://example.com/two.jpg"/>
            </item>
        </channel></rss>"#;

        let feed = parse_feed(xml.as_bytes()).unwrap();
        assert_eq!(
            feed.items[0].image_url.as_deref(),
            Some("https://example.com/one.jpg")
        );
    }

    #[test]
    fn test_image_url_from_element_text() {
        let xml = r#"<rss><channel><title>T</title>
            <item><media:content>https://example.com/pic.png</media:content></item>
        </channel></rss>"#;

        let feed = parse_feed(xml.as_bytes()).unwrap();
        assert_eq!(
            feed.items[0].image_url.as_deref(),
            Some("https://example.com/pic.png")
        );
    }

    #[test]
    fn test_image_url_resets_per_item() {
        let xml = r#"<rss><channel><title>T</title>
            <item><media:content url="https://example.com/a.jpg"/></item>
            <item><title>No image here</title></item>
        </channel></rss>"#;

        let feed = parse_feed(xml.as_bytes()).unwrap();
        assert!(feed.items[0].image_url.is_some());
        assert_eq!(feed.items[1].image_url, None);
    }

    #[test]
    fn test_unclosed_tag_is_parse_error() {
        let xml = "<rss><channel><title>X</title>";
        match parse_feed(xml.as_bytes()) {
            Err(ParseError::UnexpectedEof(_)) => {}
            other => panic!("expected UnexpectedEof, got {:?}", other),
        }
    }

    #[test]
    fn test_garbage_input_is_parse_error() {
        assert!(parse_feed(b"<not valid xml").is_err());
    }

    #[test]
    fn test_mismatched_end_tag_is_parse_error() {
        let xml = "<rss><channel></chanel></rss>";
        assert!(parse_feed(xml.as_bytes()).is_err());
    }

    #[test]
    fn test_empty_feed_has_no_items() {
        let xml = "<rss><channel><title>Empty</title></channel></rss>";
        let feed = parse_feed(xml.as_bytes()).unwrap();
        assert_eq!(feed.title, "Empty");
        assert!(feed.items.is_empty());
    }

    #[test]
    fn test_reparse_yields_identical_fields() {
        let a = parse_feed(TWO_ITEM_FEED.as_bytes()).unwrap();
        let b = parse_feed(TWO_ITEM_FEED.as_bytes()).unwrap();

        assert_eq!(a.title, b.title);
        assert_eq!(a.items.len(), b.items.len());
        for (x, y) in a.items.iter().zip(&b.items) {
            // Field-by-field: ids need not be stable across parses.
            assert_eq!(x.title, y.title);
            assert_eq!(x.link, y.link);
            assert_eq!(x.description, y.description);
            assert_eq!(x.pub_date, y.pub_date);
            assert_eq!(x.image_url, y.image_url);
        }
    }
}
