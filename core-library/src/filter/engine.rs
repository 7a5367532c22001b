//! Tree filter engine
//!
//! A node is visible when it matches the query, when one of its ancestors
//! matches (children of a matching container stay listed) or when one of its
//! descendants matches (a matching song keeps its containers listed).

use super::{FilterQuery, FilterTag};
use crate::tree::{CollectionItem, CollectionTree, ItemType, NodeId};
use tracing::trace;

/// Per-node visibility predicate for the collection view
///
/// Holds the parsed query for the current filter text; the text is parsed
/// once in [`set_filter_text`](Self::set_filter_text), not once per node.
#[derive(Debug, Clone, Default)]
pub struct CollectionFilter {
    text: String,
    query: FilterQuery,
    // Lowercased copies of the query used for matching
    needle: String,
    tag_needles: Vec<(FilterTag, String)>,
}

impl CollectionFilter {
    pub fn new(text: impl Into<String>) -> Self {
        let mut filter = Self::default();
        filter.set_filter_text(text);
        filter
    }

    /// Replace the filter text. Returns false if the text was unchanged.
    pub fn set_filter_text(&mut self, text: impl Into<String>) -> bool {
        let text = text.into();
        if text == self.text && !text.is_empty() {
            return false;
        }

        self.query = FilterQuery::parse(&text);
        self.needle = self.query.free_text().to_lowercase();
        self.tag_needles = self
            .query
            .tags()
            .iter()
            .map(|(tag, value)| (*tag, value.to_lowercase()))
            .collect();
        trace!(
            free_text = %self.query.free_text(),
            tags = self.tag_needles.len(),
            "Collection filter changed"
        );
        self.text = text;
        true
    }

    pub fn filter_text(&self) -> &str {
        &self.text
    }

    pub fn query(&self) -> &FilterQuery {
        &self.query
    }

    /// Whether `id` should be shown in the view.
    ///
    /// Ids that no longer resolve are never shown. Loading indicators are
    /// always shown.
    pub fn filter_accepts(&self, tree: &CollectionTree, id: NodeId) -> bool {
        let Some(item) = tree.get(id) else {
            return false;
        };

        if item.item_type == ItemType::LoadingIndicator || self.query.is_empty() {
            return true;
        }

        if self.item_matches(tree, item) {
            return true;
        }

        let ancestor_matches = tree
            .ancestors(id)
            .filter_map(|ancestor| tree.get(ancestor))
            .any(|ancestor| self.item_matches(tree, ancestor));
        if ancestor_matches {
            return true;
        }

        self.children_match(tree, id)
    }

    /// Whether a single node matches the query, ignoring its relatives.
    pub fn item_matches(&self, tree: &CollectionTree, item: &CollectionItem) -> bool {
        let text_matches =
            self.needle.is_empty() || contains_ignore_case(item.display_text(), &self.needle);
        if !text_matches {
            return false;
        }

        if self.tag_needles.is_empty() {
            return true;
        }

        if item.song().is_some() && self.song_tag_matches(item) {
            return true;
        }

        match item.container_level {
            Some(level) if level <= 2 => self.container_tag_matches(tree, item, level),
            _ => false,
        }
    }

    fn children_match(&self, tree: &CollectionTree, id: NodeId) -> bool {
        let Some(item) = tree.get(id) else {
            return false;
        };

        self.item_matches(tree, item)
            || item
                .children()
                .iter()
                .any(|child| self.children_match(tree, *child))
    }

    // Only these four song fields are matched on song nodes
    fn song_tag_matches(&self, item: &CollectionItem) -> bool {
        let Some(song) = item.song() else {
            return false;
        };

        self.tag_needles.iter().any(|(tag, value)| {
            let field: &str = match tag {
                FilterTag::AlbumArtist => song.effective_albumartist(),
                FilterTag::Artist => &song.artist,
                FilterTag::Album => &song.album,
                FilterTag::Title => &song.title,
                _ => return false,
            };
            contains_ignore_case(field, value)
        })
    }

    fn container_tag_matches(
        &self,
        tree: &CollectionTree,
        item: &CollectionItem,
        level: usize,
    ) -> bool {
        let Some(tag) = tree.grouping().get(level).filter_tag() else {
            return false;
        };

        self.tag_needles
            .iter()
            .find(|(candidate, _)| *candidate == tag)
            .is_some_and(|(_, value)| contains_ignore_case(item.display_text(), value))
    }

    /// Visible nodes in pre-order, root excluded.
    ///
    /// Children of hidden nodes are not visited.
    pub fn visible_items(&self, tree: &CollectionTree) -> Vec<NodeId> {
        let mut visible = Vec::new();
        let mut pending: Vec<NodeId> = tree.children(tree.root()).iter().rev().copied().collect();

        while let Some(id) = pending.pop() {
            if !self.filter_accepts(tree, id) {
                continue;
            }
            visible.push(id);
            pending.extend(tree.children(id).iter().rev().copied());
        }

        visible
    }
}

/// `needle` must already be lowercase.
fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(needle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grouping::{GroupBy, Grouping};
    use crate::models::Song;
    use std::sync::Arc;

    fn sample_tree() -> CollectionTree {
        CollectionTree::from_songs(
            Grouping::default(),
            vec![
                Song::new("Daft Punk", "Discovery", "One More Time"),
                Song::new("Daft Punk", "Homework", "Around the World"),
                Song::new("Air", "Moon Safari", "Sexy Boy"),
            ],
        )
    }

    fn find(tree: &CollectionTree, text: &str) -> NodeId {
        let mut pending = vec![tree.root()];
        while let Some(id) = pending.pop() {
            if tree.get(id).map(|item| item.display_text()) == Some(text) {
                return id;
            }
            pending.extend(tree.children(id).iter().copied());
        }
        panic!("no node with text {}", text);
    }

    #[test]
    fn test_empty_filter_shows_everything() {
        let tree = sample_tree();
        let filter = CollectionFilter::default();
        assert_eq!(filter.visible_items(&tree).len(), tree.len() - 1);
    }

    #[test]
    fn test_free_text_is_case_insensitive() {
        let tree = sample_tree();
        let filter = CollectionFilter::new("SEXY");
        assert!(filter.filter_accepts(&tree, find(&tree, "Sexy Boy")));
        assert!(filter.filter_accepts(&tree, find(&tree, "Air")));
        assert!(!filter.filter_accepts(&tree, find(&tree, "Daft Punk")));
    }

    #[test]
    fn test_song_tag_keeps_ancestors_visible() {
        let tree = sample_tree();
        let filter = CollectionFilter::new("title:world");

        assert!(filter.filter_accepts(&tree, find(&tree, "Around the World")));
        assert!(filter.filter_accepts(&tree, find(&tree, "Homework")));
        assert!(filter.filter_accepts(&tree, find(&tree, "Daft Punk")));
        assert!(!filter.filter_accepts(&tree, find(&tree, "Discovery")));
        assert!(!filter.filter_accepts(&tree, find(&tree, "One More Time")));
    }

    #[test]
    fn test_container_match_shows_descendants() {
        let tree = sample_tree();
        let filter = CollectionFilter::new("discovery");

        assert!(filter.filter_accepts(&tree, find(&tree, "One More Time")));
        assert!(!filter.filter_accepts(&tree, find(&tree, "Around the World")));
    }

    #[test]
    fn test_untagged_grouping_level_never_matches_by_tag() {
        let grouping = Grouping::new(GroupBy::Year, GroupBy::None, GroupBy::None);
        let mut tree = CollectionTree::new(grouping);
        let year = tree.add_container(tree.root(), 0, "2001").unwrap();
        tree.add_song(year, Arc::new(Song::new("Daft Punk", "Discovery", "Digital Love")))
            .unwrap();

        let filter = CollectionFilter::new("genre:2001");
        assert!(!filter.item_matches(&tree, tree.get(year).unwrap()));
        assert!(!filter.filter_accepts(&tree, year));
    }

    #[test]
    fn test_genre_tag_matches_genre_container() {
        let grouping = Grouping::new(GroupBy::Genre, GroupBy::None, GroupBy::None);
        let tree = CollectionTree::from_songs(
            grouping,
            vec![Song {
                genre: "Electronic".to_string(),
                ..Song::new("Daft Punk", "Discovery", "Digital Love")
            }],
        );
        let genre = find(&tree, "Electronic");
        let song = find(&tree, "Digital Love");

        let filter = CollectionFilter::new("genre:electro");
        assert!(filter.item_matches(&tree, tree.get(genre).unwrap()));
        // Genre is not compared on song leaves, the container carries it
        assert!(!filter.item_matches(&tree, tree.get(song).unwrap()));
        assert!(filter.filter_accepts(&tree, song));
    }

    #[test]
    fn test_loading_indicator_and_stale_ids() {
        let mut tree = sample_tree();
        let air = find(&tree, "Air");
        let loading = tree.add_loading_indicator(air).unwrap();
        let filter = CollectionFilter::new("nothing matches this");

        assert!(filter.filter_accepts(&tree, loading));

        tree.remove(air).unwrap();
        assert!(!filter.filter_accepts(&tree, air));
        assert!(!CollectionFilter::default().filter_accepts(&tree, loading));
    }

    #[test]
    fn test_set_filter_text_reports_changes() {
        let mut filter = CollectionFilter::new("air");
        assert!(!filter.set_filter_text("air"));
        assert!(filter.set_filter_text("artist:air"));
        assert_eq!(filter.query().tag(FilterTag::Artist), Some("air"));
        assert_eq!(filter.filter_text(), "artist:air");
    }

    #[test]
    fn test_visible_items_preorder() {
        let tree = sample_tree();
        let filter = CollectionFilter::new("artist:air");
        let visible: Vec<_> = filter
            .visible_items(&tree)
            .into_iter()
            .map(|id| tree.get(id).unwrap().display_text().to_string())
            .collect();
        assert_eq!(visible, vec!["Air", "Moon Safari", "Sexy Boy"]);
    }
}
