//! Text rendering of trees and configurations via `termtree`.

use std::fmt::Display;

use termtree::Tree;
use tracing::instrument;

use crate::domain::node::{Node, NodeId, NodeKind};
use crate::domain::solution::SolutionIterator;
use crate::domain::strategy::Key;
use crate::domain::tree::AndOrTree;

pub trait TreeRender {
    fn to_tree_string(&self) -> Tree<String>;
}

/// `own (subtree): value kind`; the subtree key only for inner nodes.
fn label<K: Display, X>(node: &Node<K, X>, value: &dyn Display) -> String {
    let mut label = node.own_key().to_string();
    if !node.is_leaf() {
        label.push_str(&format!(" ({})", node.subtree_key()));
    }
    label.push_str(&format!(": {}", value));
    if node.kind() != NodeKind::None {
        label.push_str(&format!(" {}", node.kind()));
    }
    label
}

impl<K: Display, V: Display> TreeRender for AndOrTree<K, V> {
    #[instrument(level = "debug", skip_all)]
    fn to_tree_string(&self) -> Tree<String> {
        fn build<K: Display, V: Display>(tree: &AndOrTree<K, V>, id: NodeId) -> Tree<String> {
            let node = tree.node(id);
            let leaves: Vec<_> = node.children().iter().map(|&c| build(tree, c)).collect();
            Tree::new(label(node, node.value())).with_leaves(leaves)
        }

        match self.root() {
            Some(root) => build(self, root),
            None => Tree::new("<empty>".to_string()),
        }
    }
}

/// Renders the current configuration: unchosen alternatives are omitted.
impl<'s, K: Key + Display, V: Display> TreeRender for SolutionIterator<'s, K, V> {
    #[instrument(level = "debug", skip_all)]
    fn to_tree_string(&self) -> Tree<String> {
        fn build<K: Key + Display, V: Display>(
            iter: &SolutionIterator<'_, K, V>,
            id: NodeId,
        ) -> Tree<String> {
            let node = iter.current_solution().node(id);
            let choice = node.value();
            let shown: Vec<NodeId> = if choice.has_choice() {
                vec![node.child(choice.index())]
            } else {
                node.children().to_vec()
            };
            let leaves: Vec<_> = shown.into_iter().map(|c| build(iter, c)).collect();
            Tree::new(label(node, iter.source_node(id).value())).with_leaves(leaves)
        }

        match self.current_solution().root() {
            Some(root) => build(self, root),
            None => Tree::new("<empty>".to_string()),
        }
    }
}
