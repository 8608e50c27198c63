use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use generational_arena::Arena;
use tracing::{instrument, trace};

use crate::domain::node::{Node, NodeId, NodeKind, Subtree};
use crate::domain::strategy::{default_compute_key, Key, KeyStrategy};

static NEXT_TREE_ID: AtomicU64 = AtomicU64::new(1);

/// Arena-backed AND/OR tree.
///
/// The tree owns every node it created, attached or not. Nodes are created
/// detached, become part of the hierarchy when attached below another node or
/// installed as root, and are freed by [`AndOrTree::delete`] or when the tree
/// is dropped.
///
/// Misuse of the structure (attaching a node twice, mixing ids of different
/// trees, using a deleted id) is a programming error and panics.
pub struct AndOrTree<K, V> {
    id: u64,
    /// Arena storage for all nodes, attached or pending
    arena: Arena<Node<K, V>>,
    /// Root node, None for empty trees
    root: Option<NodeId>,
    strategy: KeyStrategy<K, V>,
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for AndOrTree<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AndOrTree")
            .field("id", &self.id)
            .field("root", &self.root)
            .field("arena", &self.arena)
            .finish_non_exhaustive()
    }
}

impl<K: Key, V> Default for AndOrTree<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> AndOrTree<K, V> {
    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    /// Number of live nodes, including detached ones.
    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    /// Whether `id` refers to a live node of this tree.
    pub fn contains(&self, id: NodeId) -> bool {
        id.tree == self.id && self.arena.contains(id.index)
    }

    /// # Panics
    /// If `id` belongs to another tree or was deleted.
    pub fn node(&self, id: NodeId) -> &Node<K, V> {
        assert_eq!(id.tree, self.id, "node {:?} belongs to another tree", id);
        &self.arena[id.index]
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node<K, V> {
        assert_eq!(id.tree, self.id, "node {:?} belongs to another tree", id);
        &mut self.arena[id.index]
    }

    /// Mutable payload access. Keys are not recomputed: strategies that look
    /// at the payload have to be re-triggered with [`AndOrTree::recompute_key`].
    pub fn value_mut(&mut self, id: NodeId) -> &mut V {
        &mut self.node_mut(id).value
    }

    /// Whether the node is the root or hangs below some parent.
    pub fn is_attached(&self, id: NodeId) -> bool {
        self.node(id).parent.is_some() || self.root == Some(id)
    }

    /// Pre-order traversal of the subtree at `start`.
    pub fn subtree(&self, start: NodeId) -> Subtree<'_, K, V> {
        // validate ownership up front, the iterator itself only follows links
        self.node(start);
        Subtree::new(self, Some(start))
    }

    /// Pre-order traversal of the whole tree; empty for an empty tree.
    pub fn iter(&self) -> Subtree<'_, K, V> {
        Subtree::new(self, self.root)
    }
}

impl<K: Key, V> AndOrTree<K, V> {
    /// Empty tree aggregating with [`default_compute_key`].
    pub fn new() -> Self {
        Self::with_strategy(default_compute_key::<K, V>)
    }

    pub fn with_strategy(strategy: KeyStrategy<K, V>) -> Self {
        Self {
            id: NEXT_TREE_ID.fetch_add(1, Ordering::Relaxed),
            arena: Arena::new(),
            root: None,
            strategy,
        }
    }

    /// Create a detached node owned by this tree.
    #[instrument(level = "trace", skip(self, key, value))]
    pub fn create(&mut self, kind: NodeKind, key: K, value: V) -> NodeId {
        let index = self.arena.insert(Node::new(kind, key, value));
        NodeId {
            tree: self.id,
            index,
        }
    }

    /// Attach the detached `child` as last child of `parent`.
    ///
    /// # Panics
    /// If `child` is attached, is the root, belongs to another tree, or is
    /// `parent` itself or one of its ancestors.
    #[instrument(level = "trace", skip(self))]
    pub fn attach(&mut self, parent: NodeId, child: NodeId) {
        assert!(
            !self.is_attached(child),
            "node {:?} is already attached",
            child
        );
        assert!(
            !self.is_ancestor_or_self(child, parent),
            "attaching {:?} below {:?} would create a cycle",
            child,
            parent
        );
        self.node_mut(child).parent = Some(parent);
        self.node_mut(parent).children.push(child);
        self.recompute_key(parent);
    }

    /// Create a node and attach it below `parent`. Returns the new child.
    pub fn append(&mut self, parent: NodeId, kind: NodeKind, key: K, value: V) -> NodeId {
        let child = self.create(kind, key, value);
        self.attach(parent, child);
        child
    }

    /// Remove `id` with its whole subtree from its parent (or from the root
    /// slot) without destroying it. The caller re-attaches or deletes it.
    ///
    /// # Panics
    /// If the node is not attached.
    #[instrument(level = "trace", skip(self))]
    pub fn detach(&mut self, id: NodeId) -> NodeId {
        assert!(self.is_attached(id), "node {:?} is not attached", id);
        if self.root == Some(id) {
            self.root = None;
            return id;
        }
        let parent = self.node(id).parent;
        if let Some(parent) = parent {
            let siblings = &mut self.node_mut(parent).children;
            if let Some(position) = siblings.iter().position(|&c| c == id) {
                siblings.remove(position);
            }
            self.node_mut(id).parent = None;
            self.recompute_key(parent);
        }
        id
    }

    /// Detach (if needed) and destroy `id` and its whole subtree.
    #[instrument(level = "trace", skip(self))]
    pub fn delete(&mut self, id: NodeId) {
        if self.is_attached(id) {
            self.detach(id);
        }
        let doomed: Vec<NodeId> = self.subtree(id).map(|(_, node, _)| node).collect();
        for node in doomed {
            self.arena.remove(node.index);
        }
    }

    /// Install `root` as the new root and destroy the previous root subtree.
    pub fn set_root(&mut self, root: Option<NodeId>) {
        if let Some(previous) = self.replace_root(root) {
            if Some(previous) != root {
                self.delete(previous);
            }
        }
    }

    /// Install `root` as the new root and hand back the previous root, which
    /// stays alive as a detached subtree owned by the caller.
    ///
    /// # Panics
    /// If `root` belongs to another tree or has a parent.
    pub fn replace_root(&mut self, root: Option<NodeId>) -> Option<NodeId> {
        if let Some(new_root) = root {
            assert!(
                self.node(new_root).parent.is_none(),
                "new root {:?} has a parent",
                new_root
            );
        }
        std::mem::replace(&mut self.root, root)
    }

    /// Change the kind of a node and re-aggregate it and its ancestors.
    pub fn set_kind(&mut self, id: NodeId, kind: NodeKind) {
        if self.node(id).kind == kind {
            return;
        }
        self.node_mut(id).kind = kind;
        self.recompute_key(id);
    }

    /// Recompute the subtree key of `id` and of every ancestor up to the root.
    pub fn recompute_key(&mut self, id: NodeId) {
        let mut current = Some(id);
        while let Some(node) = current {
            let key = (self.strategy)(self, node);
            let node = self.node_mut(node);
            node.subtree_key = key;
            current = node.parent;
        }
    }

    /// Put the detached `replacement` in the place of `old`, moving all of
    /// `old`'s children below it, then destroy `old`.
    ///
    /// This is the way to change an own key, which is immutable on a node.
    ///
    /// # Panics
    /// If `replacement` is attached or is `old` itself.
    #[instrument(level = "trace", skip(self))]
    pub fn replace_node(&mut self, old: NodeId, replacement: NodeId) {
        assert_ne!(old, replacement, "node {:?} cannot replace itself", old);
        assert!(
            !self.is_attached(replacement),
            "replacement {:?} is already attached",
            replacement
        );

        let children = std::mem::take(&mut self.node_mut(old).children);
        for &child in &children {
            self.node_mut(child).parent = Some(replacement);
        }
        self.node_mut(replacement).children.extend(children);

        let parent = self.node(old).parent;
        if self.root == Some(old) {
            self.root = Some(replacement);
        } else if let Some(parent) = parent {
            let siblings = &mut self.node_mut(parent).children;
            if let Some(slot) = siblings.iter_mut().find(|c| **c == old) {
                *slot = replacement;
            }
            self.node_mut(replacement).parent = Some(parent);
            self.node_mut(old).parent = None;
        }

        self.recompute_key(replacement);
        self.arena.remove(old.index);
        trace!(?old, ?replacement, "node replaced");
    }

    /// Replace `id` by a node with the same kind and value but a new own key.
    /// Returns the id of the replacement; `id` is no longer valid afterwards.
    pub fn rekey(&mut self, id: NodeId, key: K) -> NodeId
    where
        V: Clone,
    {
        let node = self.node(id);
        let (kind, value) = (node.kind, node.value.clone());
        let replacement = self.create(kind, key, value);
        self.replace_node(id, replacement);
        replacement
    }

    /// Childless copy of `id` owned by this tree.
    pub fn shallow_clone(&mut self, id: NodeId) -> NodeId
    where
        V: Clone,
    {
        let node = self.node(id);
        let (kind, key, value) = (node.kind, node.own_key.clone(), node.value.clone());
        self.create(kind, key, value)
    }

    /// Childless copy of `id` owned by `target`.
    pub fn shallow_clone_into(&self, id: NodeId, target: &mut AndOrTree<K, V>) -> NodeId
    where
        V: Clone,
    {
        let node = self.node(id);
        target.create(node.kind, node.own_key.clone(), node.value.clone())
    }

    /// Copy of the subtree at `id` owned by this tree, detached.
    ///
    /// Subtree keys are copied verbatim, nothing is recomputed.
    pub fn deep_clone(&mut self, id: NodeId) -> NodeId
    where
        V: Clone,
    {
        let cloned = self.shallow_clone(id);
        let node = self.node(id);
        let (children, subtree_key) = (node.children.clone(), node.subtree_key.clone());
        for child in children {
            let cloned_child = self.deep_clone(child);
            self.link(cloned, cloned_child);
        }
        self.node_mut(cloned).subtree_key = subtree_key;
        cloned
    }

    /// Copy of the subtree at `id` owned by `target`, detached.
    ///
    /// Subtree keys are copied verbatim, nothing is recomputed.
    pub fn deep_clone_into(&self, id: NodeId, target: &mut AndOrTree<K, V>) -> NodeId
    where
        V: Clone,
    {
        let node = self.node(id);
        let cloned = self.shallow_clone_into(id, target);
        for &child in &node.children {
            let cloned_child = self.deep_clone_into(child, target);
            target.link(cloned, cloned_child);
        }
        target.node_mut(cloned).subtree_key = node.subtree_key.clone();
        cloned
    }

    /// Structural link without re-aggregation, for verbatim copies.
    fn link(&mut self, parent: NodeId, child: NodeId) {
        self.node_mut(child).parent = Some(parent);
        self.node_mut(parent).children.push(child);
    }

    fn is_ancestor_or_self(&self, ancestor: NodeId, id: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(node) = current {
            if node == ancestor {
                return true;
            }
            current = self.node(node).parent;
        }
        false
    }

    /// Visit the subtree at `start` in pre-order with mutable payload access.
    ///
    /// The callback receives the level relative to `start`, the node id and
    /// its value. Keys are not recomputed.
    pub fn walk_mut<F>(&mut self, start: NodeId, mut visit: F)
    where
        F: FnMut(usize, NodeId, &mut V),
    {
        let order: Vec<(usize, NodeId)> = self
            .subtree(start)
            .map(|(level, id, _)| (level, id))
            .collect();
        for (level, id) in order {
            visit(level, id, &mut self.node_mut(id).value);
        }
    }

    /// Number of levels below and including the root.
    #[instrument(level = "debug", skip(self))]
    pub fn depth(&self) -> usize {
        self.iter().map(|(level, _, _)| level + 1).max().unwrap_or(0)
    }

    /// Whether every attached node's subtree key equals a fresh evaluation
    /// of the strategy.
    pub fn is_consistent(&self) -> bool {
        self.iter()
            .all(|(_, id, node)| node.subtree_key == (self.strategy)(self, id))
    }
}

impl<K: Key, V: Clone> Clone for AndOrTree<K, V> {
    /// Deep copy of the root subtree under a fresh tree identity. Detached
    /// nodes are not copied.
    fn clone(&self) -> Self {
        let mut copy = Self::with_strategy(self.strategy);
        if let Some(root) = self.root {
            let cloned = self.deep_clone_into(root, &mut copy);
            copy.root = Some(cloned);
        }
        copy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_tree() -> (AndOrTree<i64, &'static str>, NodeId, NodeId) {
        let mut tree = AndOrTree::new();
        let root = tree.create(NodeKind::And, 1, "root");
        tree.set_root(Some(root));
        let or = tree.append(root, NodeKind::Or, 10, "or");
        tree.append(or, NodeKind::None, 5, "cheap");
        tree.append(or, NodeKind::None, 7, "dear");
        (tree, root, or)
    }

    #[test]
    fn attach_propagates_to_root() {
        let (tree, root, or) = small_tree();
        assert_eq!(*tree.node(or).subtree_key(), 15);
        assert_eq!(*tree.node(root).subtree_key(), 16);
    }

    #[test]
    fn detach_keeps_subtree_alive() {
        let (mut tree, root, or) = small_tree();
        tree.detach(or);
        assert_eq!(*tree.node(root).subtree_key(), 1);
        assert_eq!(tree.node(or).child_count(), 2);
        assert_eq!(tree.len(), 4);
    }

    #[test]
    fn delete_frees_whole_subtree() {
        let (mut tree, root, or) = small_tree();
        tree.delete(or);
        assert_eq!(tree.len(), 1);
        assert!(!tree.contains(or));
        assert_eq!(*tree.node(root).subtree_key(), 1);
    }

    #[test]
    fn set_root_destroys_previous_root() {
        let (mut tree, _, _) = small_tree();
        let fresh = tree.create(NodeKind::None, 3, "fresh");
        tree.set_root(Some(fresh));
        assert_eq!(tree.len(), 1);
        assert_eq!(tree.root(), Some(fresh));
    }

    #[test]
    fn replace_root_hands_back_previous_root() {
        let (mut tree, root, _) = small_tree();
        let previous = tree.replace_root(None);
        assert_eq!(previous, Some(root));
        assert!(!tree.is_attached(root));
        assert_eq!(tree.len(), 4);
    }

    #[test]
    #[should_panic(expected = "already attached")]
    fn attaching_twice_panics() {
        let (mut tree, root, or) = small_tree();
        tree.attach(root, or);
    }

    #[test]
    #[should_panic(expected = "already attached")]
    fn attaching_root_panics() {
        let (mut tree, root, or) = small_tree();
        tree.attach(or, root);
    }

    #[test]
    #[should_panic(expected = "would create a cycle")]
    fn attaching_below_own_descendant_panics() {
        let (mut tree, _, or) = small_tree();
        tree.detach(or);
        let below = tree.node(or).child(0);
        tree.attach(below, or);
    }

    #[test]
    #[should_panic(expected = "belongs to another tree")]
    fn attaching_across_trees_panics() {
        let (mut tree, root, _) = small_tree();
        let mut other: AndOrTree<i64, &'static str> = AndOrTree::new();
        let stranger = other.create(NodeKind::None, 1, "stranger");
        tree.attach(root, stranger);
    }

    #[test]
    fn subtree_reports_levels_in_preorder() {
        let (tree, _, _) = small_tree();
        let visited: Vec<(usize, &str)> = tree
            .iter()
            .map(|(level, _, node)| (level, *node.value()))
            .collect();
        assert_eq!(
            visited,
            vec![(0, "root"), (1, "or"), (2, "cheap"), (2, "dear")]
        );
    }

    #[test]
    fn walk_mut_matches_subtree_order() {
        let (mut tree, root, _) = small_tree();
        let mut seen = Vec::new();
        tree.walk_mut(root, |level, _, value| {
            seen.push((level, *value));
            *value = "visited";
        });
        assert_eq!(seen.len(), 4);
        assert!(tree.iter().all(|(_, _, node)| *node.value() == "visited"));
    }

    #[test]
    fn set_kind_reaggregates_ancestors() {
        let (mut tree, root, or) = small_tree();
        tree.set_kind(or, NodeKind::And);
        assert_eq!(*tree.node(or).subtree_key(), 22);
        assert_eq!(*tree.node(root).subtree_key(), 23);
        assert!(tree.is_consistent());
    }

    #[test]
    fn rekey_keeps_position_and_children() {
        let (mut tree, root, or) = small_tree();
        let sibling = tree.append(root, NodeKind::None, 100, "sibling");
        let rekeyed = tree.rekey(or, 50);
        assert!(!tree.contains(or));
        assert_eq!(tree.node(root).children(), &[rekeyed, sibling]);
        assert_eq!(tree.node(rekeyed).child_count(), 2);
        assert_eq!(*tree.node(root).subtree_key(), 1 + 55 + 100);
    }

    #[test]
    fn depth_counts_levels() {
        let (tree, _, _) = small_tree();
        assert_eq!(tree.depth(), 3);
        assert_eq!(AndOrTree::<i64, ()>::new().depth(), 0);
    }
}
