//! Key aggregation strategies.
//!
//! A strategy computes the subtree key of one node from its own key and the
//! already up-to-date subtree keys of its children. The tree calls it on the
//! changed node and then on every ancestor up to the root.

use std::ops::Add;

use crate::domain::node::{NodeId, NodeKind};
use crate::domain::tree::AndOrTree;

/// Requirements on a key type: summable, comparable, cheap enough to clone.
pub trait Key: Clone + Ord + Add<Output = Self> {}

impl<T: Clone + Ord + Add<Output = T>> Key for T {}

/// Function computing the subtree key of `node` within `tree`.
pub type KeyStrategy<K, V> = fn(&AndOrTree<K, V>, NodeId) -> K;

/// Minimal possible cost of the subtree.
///
/// - leaf: own key
/// - AND: own key plus the sum of the children
/// - OR: own key plus the cheapest child
///
/// # Panics
/// On a non-leaf node of kind [`NodeKind::None`]: such a node has no
/// aggregation rule.
pub fn default_compute_key<K: Key, V>(tree: &AndOrTree<K, V>, id: NodeId) -> K {
    let node = tree.node(id);
    if node.is_leaf() {
        return node.own_key().clone();
    }
    match node.kind() {
        NodeKind::And => node
            .children()
            .iter()
            .fold(node.own_key().clone(), |key, &child| {
                key + tree.node(child).subtree_key().clone()
            }),
        NodeKind::Or => {
            let cheapest = node
                .children()
                .iter()
                .map(|&child| tree.node(child).subtree_key())
                .min();
            match cheapest {
                Some(cheapest) => node.own_key().clone() + cheapest.clone(),
                None => panic!("OR node {:?} aggregated without alternatives", id),
            }
        }
        NodeKind::None => panic!(
            "unknown non-leaf node kind: node {:?} has {} children but kind None",
            id,
            node.child_count()
        ),
    }
}
