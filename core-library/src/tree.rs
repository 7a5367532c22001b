//! # Collection Tree
//!
//! Arena holding the nodes of the collection view. Nodes refer to each other
//! by [`NodeId`]; a parent owns the ordering of its children and every child
//! keeps the id of its parent. Removing a subtree tombstones its slots, so ids
//! handed out earlier resolve to `None` instead of to a different node.

use crate::error::{LibraryError, Result};
use crate::grouping::{Grouping, GROUPING_LEVELS};
use crate::models::Song;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Index of a node in a [`CollectionTree`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(&self) -> usize {
        self.0
    }
}

/// Kind of node in the collection tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemType {
    Root,
    Container,
    Song,
    /// Placeholder shown while a subtree is being loaded
    LoadingIndicator,
}

/// A node of the collection tree
#[derive(Debug, Clone)]
pub struct CollectionItem {
    pub item_type: ItemType,
    /// Grouping key (containers) or sort key (songs)
    pub key: String,
    display_text: Option<String>,
    /// Grouping level for containers, `None` for every other node
    pub container_level: Option<usize>,
    /// Song metadata, present only on song nodes
    pub metadata: Option<Arc<Song>>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl CollectionItem {
    fn new(item_type: ItemType, key: impl Into<String>) -> Self {
        Self {
            item_type,
            key: key.into(),
            display_text: None,
            container_level: None,
            metadata: None,
            parent: None,
            children: Vec::new(),
        }
    }

    /// Label shown in the view, falling back to the key
    pub fn display_text(&self) -> &str {
        self.display_text.as_deref().unwrap_or(&self.key)
    }

    pub fn set_display_text(&mut self, text: impl Into<String>) {
        self.display_text = Some(text.into());
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Song metadata if this is a song node
    pub fn song(&self) -> Option<&Song> {
        self.metadata.as_deref()
    }
}

/// The collection view's tree of containers and songs
#[derive(Debug, Clone)]
pub struct CollectionTree {
    items: Vec<Option<CollectionItem>>,
    root: NodeId,
    grouping: Grouping,
}

impl CollectionTree {
    pub fn new(grouping: Grouping) -> Self {
        Self {
            items: vec![Some(CollectionItem::new(ItemType::Root, ""))],
            root: NodeId(0),
            grouping,
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn grouping(&self) -> &Grouping {
        &self.grouping
    }

    pub fn get(&self, id: NodeId) -> Option<&CollectionItem> {
        self.items.get(id.0).and_then(Option::as_ref)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut CollectionItem> {
        self.items.get_mut(id.0).and_then(Option::as_mut)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.get(id).is_some()
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(CollectionItem::parent)
    }

    /// Children of a node; empty for removed ids.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.get(id).map(CollectionItem::children).unwrap_or(&[])
    }

    /// Parent, grandparent, ... up to and including the root.
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors {
            tree: self,
            next: self.parent(id),
        }
    }

    /// Number of live nodes, root included
    pub fn len(&self) -> usize {
        self.items.iter().filter(|item| item.is_some()).count()
    }

    /// True when only the root is left
    pub fn is_empty(&self) -> bool {
        self.children(self.root).is_empty()
    }

    /// Add a container at `level` under `parent`.
    pub fn add_container(
        &mut self,
        parent: NodeId,
        level: usize,
        key: impl Into<String>,
    ) -> Result<NodeId> {
        if level >= GROUPING_LEVELS {
            return Err(LibraryError::InvalidInput {
                field: "container_level".to_string(),
                message: format!("level {} exceeds {} grouping levels", level, GROUPING_LEVELS),
            });
        }

        let mut item = CollectionItem::new(ItemType::Container, key);
        item.container_level = Some(level);
        self.attach(parent, item)
    }

    /// Add a song leaf under `parent`. The node's display text is the title.
    pub fn add_song(&mut self, parent: NodeId, song: Arc<Song>) -> Result<NodeId> {
        let mut item = CollectionItem::new(ItemType::Song, sort_key(&song));
        item.set_display_text(song.title.clone());
        item.metadata = Some(song);
        self.attach(parent, item)
    }

    pub fn add_loading_indicator(&mut self, parent: NodeId) -> Result<NodeId> {
        let mut item = CollectionItem::new(ItemType::LoadingIndicator, "");
        item.set_display_text("Loading...");
        self.attach(parent, item)
    }

    fn attach(&mut self, parent: NodeId, mut item: CollectionItem) -> Result<NodeId> {
        let parent_item = self.get(parent).ok_or_else(|| LibraryError::NotFound {
            entity_type: "CollectionItem".to_string(),
            id: parent.0.to_string(),
        })?;

        if matches!(
            parent_item.item_type,
            ItemType::Song | ItemType::LoadingIndicator
        ) {
            return Err(LibraryError::InvalidInput {
                field: "parent".to_string(),
                message: format!("{:?} nodes cannot have children", parent_item.item_type),
            });
        }

        let id = NodeId(self.items.len());
        item.parent = Some(parent);
        self.items.push(Some(item));
        if let Some(parent_item) = self.get_mut(parent) {
            parent_item.children.push(id);
        }
        Ok(id)
    }

    /// Remove a node and its whole subtree. Returns the number of nodes removed.
    ///
    /// The root itself cannot be removed; use [`clear`](Self::clear) instead.
    pub fn remove(&mut self, id: NodeId) -> Result<usize> {
        if id == self.root {
            return Err(LibraryError::InvalidInput {
                field: "id".to_string(),
                message: "the root node cannot be removed".to_string(),
            });
        }

        let parent = self
            .get(id)
            .ok_or_else(|| LibraryError::NotFound {
                entity_type: "CollectionItem".to_string(),
                id: id.0.to_string(),
            })?
            .parent;

        if let Some(parent_item) = parent.and_then(|p| self.get_mut(p)) {
            parent_item.children.retain(|child| *child != id);
        }

        let mut removed = 0;
        let mut pending = vec![id];
        while let Some(next) = pending.pop() {
            if let Some(item) = self.items.get_mut(next.0).and_then(Option::take) {
                pending.extend(item.children);
                removed += 1;
            }
        }
        Ok(removed)
    }

    /// Drop every node except the root.
    ///
    /// Slots are tombstoned, not reused, so ids from before the clear keep
    /// resolving to `None`. The arena therefore does not shrink; to reload a
    /// whole collection build a fresh tree with [`from_songs`](Self::from_songs)
    /// instead of clearing and refilling this one.
    pub fn clear(&mut self) {
        for slot in self.items.iter_mut().skip(1) {
            *slot = None;
        }
        if let Some(root) = self.get_mut(self.root) {
            root.children.clear();
        }
    }

    /// Build a tree grouping `songs` by the levels of `grouping`.
    ///
    /// Containers are created on first use, so children keep the order in
    /// which their first song appears in `songs`.
    pub fn from_songs(grouping: Grouping, songs: impl IntoIterator<Item = Song>) -> Self {
        let mut tree = Self::new(grouping);
        let mut containers: HashMap<(NodeId, String), NodeId> = HashMap::new();
        let mut song_count = 0usize;

        for song in songs {
            let song = Arc::new(song);
            let mut parent = tree.root;

            for (level, group_by) in grouping.levels().enumerate() {
                let Some(key) = song.container_key(group_by) else {
                    break;
                };
                parent = match containers.get(&(parent, key.clone())) {
                    Some(existing) => *existing,
                    None => {
                        let mut item = CollectionItem::new(ItemType::Container, key.clone());
                        item.container_level = Some(level);
                        item.parent = Some(parent);
                        let id = tree.push_child(parent, item);
                        containers.insert((parent, key), id);
                        id
                    }
                };
            }

            let mut item = CollectionItem::new(ItemType::Song, sort_key(&song));
            item.set_display_text(song.title.clone());
            item.metadata = Some(song);
            item.parent = Some(parent);
            tree.push_child(parent, item);
            song_count += 1;
        }

        debug!(
            songs = song_count,
            containers = containers.len(),
            "Built collection tree"
        );
        tree
    }

    // Parent is known to be a live container here.
    fn push_child(&mut self, parent: NodeId, item: CollectionItem) -> NodeId {
        let id = NodeId(self.items.len());
        self.items.push(Some(item));
        if let Some(parent_item) = self.get_mut(parent) {
            parent_item.children.push(id);
        }
        id
    }
}

impl Default for CollectionTree {
    fn default() -> Self {
        Self::new(Grouping::default())
    }
}

/// Iterator over the ancestors of a node, see [`CollectionTree::ancestors`]
pub struct Ancestors<'a> {
    tree: &'a CollectionTree,
    next: Option<NodeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = self.tree.parent(current);
        Some(current)
    }
}

fn sort_key(song: &Song) -> String {
    format!("{:04}{:04}{}", song.disc.max(0), song.track.max(0), song.title)
}
