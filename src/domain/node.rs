//! Tree nodes and pre-order traversal.

use std::fmt;

use generational_arena::Index;
use tracing::instrument;

use crate::domain::tree::AndOrTree;

/// Kind of an AND/OR tree node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum NodeKind {
    /// All children are required.
    And,
    /// Exactly one child is chosen among the alternatives.
    Or,
    /// Plain component without aggregation semantics of its own.
    #[default]
    None,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeKind::And => write!(f, "&&"),
            NodeKind::Or => write!(f, "||"),
            NodeKind::None => Ok(()),
        }
    }
}

/// Stable handle of a node inside the arena of the tree that owns it.
///
/// The id remembers its owning tree, so handing it to another tree is caught
/// as a contract violation instead of silently addressing a foreign node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    pub(crate) tree: u64,
    pub(crate) index: Index,
}

/// Node of an [`AndOrTree`].
///
/// The own key is fixed at creation; the subtree key is derived by the tree's
/// strategy and kept in sync on every structural change.
#[derive(Debug, Clone)]
pub struct Node<K, V> {
    pub(crate) kind: NodeKind,
    pub(crate) own_key: K,
    pub(crate) subtree_key: K,
    pub(crate) value: V,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
}

impl<K: Clone, V> Node<K, V> {
    pub(crate) fn new(kind: NodeKind, key: K, value: V) -> Self {
        Self {
            kind,
            subtree_key: key.clone(),
            own_key: key,
            value,
            parent: None,
            children: Vec::new(),
        }
    }
}

impl<K, V> Node<K, V> {
    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    /// Intrinsic key of this node alone.
    pub fn own_key(&self) -> &K {
        &self.own_key
    }

    /// Aggregate key of the subtree rooted here.
    pub fn subtree_key(&self) -> &K {
        &self.subtree_key
    }

    pub fn value(&self) -> &V {
        &self.value
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn child(&self, position: usize) -> NodeId {
        self.children[position]
    }

    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

/// Depth-first pre-order iterator over a subtree.
///
/// Yields `(level, id, node)` where `level` is the depth relative to the
/// start node (0 for the start node itself).
pub struct Subtree<'a, K, V> {
    tree: &'a AndOrTree<K, V>,
    stack: Vec<(usize, NodeId)>,
}

impl<'a, K, V> Subtree<'a, K, V> {
    #[instrument(level = "trace", skip(tree))]
    pub(crate) fn new(tree: &'a AndOrTree<K, V>, start: Option<NodeId>) -> Self {
        let mut stack = Vec::new();
        if let Some(start) = start {
            stack.push((0, start));
        }
        Self { tree, stack }
    }
}

impl<'a, K, V> Iterator for Subtree<'a, K, V> {
    type Item = (usize, NodeId, &'a Node<K, V>);

    fn next(&mut self) -> Option<Self::Item> {
        let (level, current) = self.stack.pop()?;
        let node = self.tree.node(current);
        // Push children in reverse order for left-to-right traversal
        for &child in node.children.iter().rev() {
            self.stack.push((level + 1, child));
        }
        Some((level, current, node))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_markers_match_print_format() {
        assert_eq!(NodeKind::And.to_string(), "&&");
        assert_eq!(NodeKind::Or.to_string(), "||");
        assert_eq!(NodeKind::None.to_string(), "");
    }

    #[test]
    fn new_node_starts_detached_with_own_key_as_subtree_key() {
        let node: Node<i64, ()> = Node::new(NodeKind::And, 7, ());
        assert_eq!(*node.subtree_key(), 7);
        assert!(node.parent().is_none());
        assert!(node.is_leaf());
    }
}
