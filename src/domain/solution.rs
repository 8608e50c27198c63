//! Enumeration of configurations of an AND/OR tree.
//!
//! A [`SolutionIterator`] snapshots a source tree into a parallel tree of
//! [`Choice`] values. Every OR node with alternatives acts as one digit of a
//! mixed-radix counter; [`SolutionIterator::next_solution`] increments that
//! counter along the currently selected path, like an odometer.

use tracing::{debug, instrument};

use crate::domain::node::{Node, NodeId, NodeKind};
use crate::domain::strategy::Key;
use crate::domain::tree::AndOrTree;

/// Payloads that can pin their node as the chosen alternative of an OR parent.
pub trait Fixed {
    fn is_fixed(&self) -> bool;
}

/// Enumeration state of one node of the solution tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Choice {
    source: NodeId,
    has_choice: bool,
    is_fixed: bool,
    index: usize,
    power: u64,
}

impl Choice {
    fn plain(source: NodeId) -> Self {
        Self {
            source,
            has_choice: false,
            is_fixed: false,
            index: 0,
            power: 0,
        }
    }

    fn alternative(source: NodeId, is_fixed: bool, index: usize) -> Self {
        Self {
            source,
            has_choice: true,
            is_fixed,
            index,
            power: 0,
        }
    }

    /// Node of the source tree this choice mirrors.
    pub fn source(&self) -> NodeId {
        self.source
    }

    /// OR node with at least one alternative. Independent of fixedness.
    pub fn has_choice(&self) -> bool {
        self.has_choice
    }

    /// One alternative was pinned when the snapshot was taken.
    pub fn is_fixed(&self) -> bool {
        self.is_fixed
    }

    /// Position of the selected alternative; meaningful only with a choice.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Number of configurations reachable from this subtree.
    pub fn power(&self) -> u64 {
        self.power
    }
}

/// Tree of choices mirroring a source tree.
pub type SolutionTree<K> = AndOrTree<K, Choice>;

/// Cost of the currently selected configuration of the subtree.
///
/// Choice nodes add only their selected alternative, every other node adds
/// all of its children.
pub fn choice_based_compute_key<K: Key>(tree: &SolutionTree<K>, id: NodeId) -> K {
    let node = tree.node(id);
    let choice = node.value();
    let own = node.own_key().clone();
    if choice.has_choice {
        // the selected child may not be attached yet while the tree is built
        match node.children().get(choice.index) {
            Some(&selected) => own + tree.node(selected).subtree_key().clone(),
            None => own,
        }
    } else {
        node.children()
            .iter()
            .fold(own, |key, &child| key + tree.node(child).subtree_key().clone())
    }
}

/// Alternative picked at one OR node of the current configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    /// Level of the OR node in the selected view
    pub level: usize,
    /// OR node of the source tree
    pub parameter: NodeId,
    /// Chosen child of `parameter` in the source tree
    pub alternative: NodeId,
    /// Position of `alternative` among the children of `parameter`
    pub position: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Switch {
    /// Nothing to advance below this node
    None,
    /// Advanced to the next configuration
    Success,
    /// Wrapped around, carry to the parent
    Overflow,
}

/// Cursor over every configuration of a source tree.
///
/// The iterator borrows the source tree for its whole life; the snapshot of
/// fixed flags is taken once in [`SolutionIterator::new`].
pub struct SolutionIterator<'s, K, V> {
    source: &'s AndOrTree<K, V>,
    solution: SolutionTree<K>,
}

impl<'s, K: Key, V: Fixed> SolutionIterator<'s, K, V> {
    #[instrument(level = "debug", skip_all)]
    pub fn new(source: &'s AndOrTree<K, V>) -> Self {
        let mut solution = SolutionTree::with_strategy(choice_based_compute_key::<K>);
        if let Some(root) = source.root() {
            let solution_root = Self::clone_for_solution(source, &mut solution, root);
            solution.set_root(Some(solution_root));
        }
        let iterator = Self { source, solution };
        debug!(
            nodes = iterator.solution.len(),
            count = iterator.solution_count(),
            "solution snapshot built"
        );
        iterator
    }

    fn has_choice(node: &Node<K, V>) -> bool {
        node.kind() == NodeKind::Or && !node.is_leaf()
    }

    fn clone_for_solution(
        source: &AndOrTree<K, V>,
        solution: &mut SolutionTree<K>,
        id: NodeId,
    ) -> NodeId {
        let node = source.node(id);
        let choice = if Self::has_choice(node) {
            Self::create_choice(source, id)
        } else {
            Choice::plain(id)
        };
        let cloned = solution.create(node.kind(), node.own_key().clone(), choice);
        for &child in node.children() {
            let cloned_child = Self::clone_for_solution(source, solution, child);
            solution.attach(cloned, cloned_child);
        }
        let power = power_of(solution, cloned);
        solution.value_mut(cloned).power = power;
        cloned
    }

    /// First pinned child wins; without one the first alternative is selected.
    fn create_choice(source: &AndOrTree<K, V>, id: NodeId) -> Choice {
        let pinned = source
            .node(id)
            .children()
            .iter()
            .position(|&child| source.node(child).value().is_fixed());
        match pinned {
            Some(index) => Choice::alternative(id, true, index),
            None => Choice::alternative(id, false, 0),
        }
    }
}

impl<'s, K: Key, V> SolutionIterator<'s, K, V> {
    pub fn source(&self) -> &'s AndOrTree<K, V> {
        self.source
    }

    /// Number of configurations, 0 for an empty source tree.
    pub fn solution_count(&self) -> u64 {
        self.solution
            .root()
            .map_or(0, |root| self.solution.node(root).value().power)
    }

    /// The solution tree as it stands; at choice nodes only the child at
    /// [`Choice::index`] is part of the configuration.
    pub fn current_solution(&self) -> &SolutionTree<K> {
        &self.solution
    }

    /// Cost of the current configuration.
    pub fn price(&self) -> Option<&K> {
        self.solution
            .root()
            .map(|root| self.solution.node(root).subtree_key())
    }

    /// Source node mirrored by a node of the solution tree.
    pub fn source_node(&self, id: NodeId) -> &'s Node<K, V> {
        self.source.node(self.solution.node(id).value().source)
    }

    /// Advance to the next configuration.
    ///
    /// Returns false when the cursor wrapped around to the first
    /// configuration, or when there was nothing to choose at all.
    #[instrument(level = "trace", skip(self))]
    pub fn next_solution(&mut self) -> bool {
        match self.solution.root() {
            Some(root) => self.next_choice(root) == Switch::Success,
            None => false,
        }
    }

    /// Pre-order walk over the current configuration: choice nodes descend
    /// only into their selected alternative.
    pub fn selected(&self) -> Selected<'_, K> {
        Selected::new(&self.solution)
    }

    /// Alternatives picked by the current configuration, in selected-view
    /// pre-order.
    pub fn selections(&self) -> Vec<Selection> {
        self.selected()
            .filter(|(_, _, node)| node.value().has_choice)
            .map(|(level, _, node)| {
                let choice = node.value();
                let parameter = self.source.node(choice.source);
                Selection {
                    level,
                    parameter: choice.source,
                    alternative: parameter.child(choice.index),
                    position: choice.index,
                }
            })
            .collect()
    }

    fn next_choice(&mut self, id: NodeId) -> Switch {
        let node = self.solution.node(id);
        if node.is_leaf() {
            return Switch::None;
        }
        let choice = *node.value();
        if choice.has_choice {
            let alternatives = node.child_count();
            let selected = node.child(choice.index);
            if self.next_choice(selected) == Switch::Success {
                return Switch::Success;
            }
            if choice.is_fixed {
                return Switch::Overflow;
            }
            if choice.index + 1 < alternatives {
                self.select(id, choice.index + 1);
                Switch::Success
            } else {
                self.select(id, 0);
                Switch::Overflow
            }
        } else {
            let children = node.children().to_vec();
            let mut switch = Switch::None;
            for child in children {
                let child_switch = self.next_choice(child);
                if child_switch != Switch::None {
                    switch = child_switch;
                }
                if child_switch == Switch::Success {
                    break;
                }
            }
            switch
        }
    }

    /// Select alternative `index` at `id` and refresh cost and power upwards.
    fn select(&mut self, id: NodeId, index: usize) {
        let alternatives = self.solution.node(id).child_count();
        assert!(
            index < alternatives,
            "alternative {} out of range for {:?} with {} alternatives",
            index,
            id,
            alternatives
        );
        self.solution.value_mut(id).index = index;
        self.solution.recompute_key(id);

        let mut current = Some(id);
        while let Some(node) = current {
            let power = power_of(&self.solution, node);
            self.solution.value_mut(node).power = power;
            current = self.solution.node(node).parent();
        }
    }
}

/// Power of `id` from the powers of its children.
///
/// Non-choice internal nodes take the maximum of their children, not the
/// product.
fn power_of<K>(solution: &SolutionTree<K>, id: NodeId) -> u64 {
    let node = solution.node(id);
    let choice = node.value();
    let child_power = |child: &NodeId| solution.node(*child).value().power;
    if choice.has_choice {
        if choice.is_fixed {
            child_power(&node.child(choice.index))
        } else {
            node.children().iter().map(child_power).sum()
        }
    } else {
        node.children().iter().map(child_power).fold(1, u64::max)
    }
}

/// Pre-order iterator over the selected view of a solution tree.
pub struct Selected<'a, K> {
    tree: &'a SolutionTree<K>,
    stack: Vec<(usize, NodeId)>,
}

impl<'a, K> Selected<'a, K> {
    fn new(tree: &'a SolutionTree<K>) -> Self {
        Self {
            tree,
            stack: tree.root().map(|root| (0, root)).into_iter().collect(),
        }
    }
}

impl<'a, K> Iterator for Selected<'a, K> {
    type Item = (usize, NodeId, &'a Node<K, Choice>);

    fn next(&mut self) -> Option<Self::Item> {
        let (level, current) = self.stack.pop()?;
        let node = self.tree.node(current);
        let choice = node.value();
        if choice.has_choice {
            self.stack.push((level + 1, node.child(choice.index)));
        } else {
            for &child in node.children().iter().rev() {
                self.stack.push((level + 1, child));
            }
        }
        Some((level, current, node))
    }
}
