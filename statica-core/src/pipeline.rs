//! Ordering and draft filtering applied to a section's items before rendering.

use crate::content::ContentItem;

/// Newest first. The sort is stable, so items sharing a date keep the order
/// the loader produced.
pub fn order(mut items: Vec<ContentItem>) -> Vec<ContentItem> {
    items.sort_by(|a, b| b.published_on.cmp(&a.published_on));
    items
}

pub fn is_published(item: &ContentItem) -> bool {
    !item.draft
}

pub fn filter_published(items: Vec<ContentItem>) -> Vec<ContentItem> {
    items.into_iter().filter(is_published).collect()
}
