/// Opaque identifier for a parsed feed item.
///
/// Unique among the items of one parse result, assigned once at
/// construction and never reused. Ids are not stable across parses of the
/// same document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ItemId(pub(crate) u64);

/// One entry of a parsed feed.
///
/// String fields are trimmed of surrounding whitespace and newlines by the
/// parser before construction. `description` may contain markup, passed
/// through verbatim.
#[derive(Debug, Clone)]
pub struct FeedItem {
    pub id: ItemId,
    pub title: String,
    /// Link URI as it appeared in the document.
    pub link: String,
    pub description: String,
    /// Publication date, normalized to `yyyy-MM-dd HH:mm:ss` when the
    /// source was RFC-822 style; otherwise the original string.
    pub pub_date: String,
    /// URL of the first image-bearing element found in the item, if any.
    pub image_url: Option<String>,
}

// Identity equality: two items are the same item, not items with equal
// content. Content comparison in tests goes field by field.
impl PartialEq for FeedItem {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for FeedItem {}
