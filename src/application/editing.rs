//! Catalog editing
//!
//! Nodes are addressed by a slash-separated path of names starting at the
//! root, e.g. `Mark/BMW/Model/X6`. A segment `[n]` picks the n-th child, which
//! also reaches unnamed or same-named siblings.
//!
//! Structural edits keep node kinds meaningful: adding below a plain node
//! turns it into an AND node; removing children turns a parent with one child
//! left into an AND node and one with none left into a plain node.

use tracing::{debug, instrument};

use crate::application::catalog::price_ceiling;
use crate::domain::{Catalog, DomainError, NodeId, NodeItem, NodeKind, Price};

/// Node at `path`.
pub fn resolve(tree: &Catalog, path: &str) -> Result<NodeId, DomainError> {
    let unknown = || DomainError::UnknownNode(path.to_string());
    let mut segments = path.split('/').map(str::trim).filter(|s| !s.is_empty());

    let root = tree.root().ok_or_else(unknown)?;
    let first = segments.next().ok_or_else(unknown)?;
    if first != "[0]" && tree.node(root).value().name() != first {
        return Err(unknown());
    }

    let mut current = root;
    for segment in segments {
        let node = tree.node(current);
        let position = segment
            .strip_prefix('[')
            .and_then(|rest| rest.strip_suffix(']'))
            .and_then(|index| index.parse::<usize>().ok());
        current = match position {
            Some(position) => node.children().get(position).copied(),
            None => node
                .children()
                .iter()
                .copied()
                .find(|&child| tree.node(child).value().name() == segment),
        }
        .ok_or_else(unknown)?;
    }
    Ok(current)
}

/// Change to be checked against the price range before it is applied.
#[derive(Debug, Clone, Copy)]
enum Change {
    Price(NodeId, Price),
    Kind(NodeId, NodeKind),
    Leaf { parent: NodeId, price: Price },
}

/// Price ceiling of the subtree at `id` as if `change` had been applied.
fn ceiling_after(tree: &Catalog, id: NodeId, change: Change) -> Option<Price> {
    let node = tree.node(id);
    let mut kind = node.kind();
    let mut own = *node.own_key();
    let mut children = node
        .children()
        .iter()
        .map(|&child| ceiling_after(tree, child, change))
        .collect::<Option<Vec<Price>>>()?;
    match change {
        Change::Price(target, price) if target == id => own = price,
        Change::Kind(target, new_kind) if target == id => kind = new_kind,
        Change::Leaf { parent, price } if parent == id => {
            children.push(price);
            if kind == NodeKind::None {
                kind = NodeKind::And;
            }
        }
        _ => {}
    }
    price_ceiling(kind, own, children)
}

fn check_range(tree: &Catalog, id: NodeId, change: Change) -> Result<(), DomainError> {
    let Some(root) = tree.root() else {
        return Ok(());
    };
    match ceiling_after(tree, root, change) {
        Some(_) => Ok(()),
        None => Err(DomainError::PriceOverflow {
            name: tree.node(id).value().name().to_string(),
        }),
    }
}

fn check_name(name: &str, path: &str) -> Result<(), DomainError> {
    if name.trim().is_empty() {
        return Err(DomainError::MissingName {
            path: path.to_string(),
        });
    }
    Ok(())
}

fn check_price(name: &str, price: Price) -> Result<(), DomainError> {
    if price < 0 {
        return Err(DomainError::NegativePrice {
            name: name.to_string(),
            price,
        });
    }
    Ok(())
}

/// Append a new childless node below `parent`. A plain parent becomes an
/// AND node first.
#[instrument(level = "debug", skip(tree))]
pub fn add(
    tree: &mut Catalog,
    parent: NodeId,
    name: &str,
    kind: NodeKind,
    price: Price,
) -> Result<NodeId, DomainError> {
    let parent_node = tree.node(parent);
    check_name(
        name,
        &format!("{}/[{}]", parent_node.value().name(), parent_node.child_count()),
    )?;
    check_price(name, price)?;
    check_range(tree, parent, Change::Leaf { parent, price })?;

    if tree.node(parent).kind() == NodeKind::None {
        tree.set_kind(parent, NodeKind::And);
    }
    let id = tree.append(parent, kind, price, NodeItem::new(name.trim()));
    debug!(?id, "node added");
    Ok(id)
}

/// Delete `id` with its subtree and adjust the kind of its parent.
#[instrument(level = "debug", skip(tree))]
pub fn remove(tree: &mut Catalog, id: NodeId) -> Result<(), DomainError> {
    let parent = tree.node(id).parent().ok_or(DomainError::RootNotRemovable)?;
    tree.delete(id);
    match tree.node(parent).child_count() {
        0 => tree.set_kind(parent, NodeKind::None),
        1 => tree.set_kind(parent, NodeKind::And),
        _ => {}
    }
    debug!(?parent, "node removed");
    Ok(())
}

pub fn rename(tree: &mut Catalog, id: NodeId, name: &str) -> Result<(), DomainError> {
    check_name(name, tree.node(id).value().name())?;
    tree.value_mut(id).set_name(name.trim());
    Ok(())
}

/// Give `id` a new own price. Returns the id of the node now holding it.
#[instrument(level = "debug", skip(tree))]
pub fn reprice(tree: &mut Catalog, id: NodeId, price: Price) -> Result<NodeId, DomainError> {
    check_price(tree.node(id).value().name(), price)?;
    check_range(tree, id, Change::Price(id, price))?;
    Ok(tree.rekey(id, price))
}

/// Change the kind of `id`. A node with children cannot become plain.
#[instrument(level = "debug", skip(tree))]
pub fn change_kind(tree: &mut Catalog, id: NodeId, kind: NodeKind) -> Result<(), DomainError> {
    let node = tree.node(id);
    if kind == NodeKind::None && !node.is_leaf() {
        return Err(DomainError::ChildrenUnderPlainNode {
            name: node.value().name().to_string(),
        });
    }
    check_range(tree, id, Change::Kind(id, kind))?;
    tree.set_kind(id, kind);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Fixed;

    fn engines() -> Catalog {
        let mut tree = Catalog::new();
        let root = tree.create(NodeKind::And, 10, NodeItem::new("Car"));
        tree.set_root(Some(root));
        let engine = tree.append(root, NodeKind::Or, 0, NodeItem::new("Engine"));
        tree.append(engine, NodeKind::None, 100, NodeItem::new("Gas"));
        tree.append(engine, NodeKind::None, 150, NodeItem::pinned("Diesel"));
        tree.append(root, NodeKind::None, 5, NodeItem::new("Wheels"));
        tree
    }

    fn price(tree: &Catalog) -> Price {
        *tree.node(tree.root().unwrap()).subtree_key()
    }

    #[test]
    fn resolves_names_and_positions() {
        let tree = engines();

        let by_name = resolve(&tree, "Car/Engine/Diesel").unwrap();
        let by_position = resolve(&tree, "Car/[0]/[1]").unwrap();

        assert_eq!(by_name, by_position);
        assert_eq!(
            resolve(&tree, " Car / Wheels ").unwrap(),
            tree.node(tree.root().unwrap()).child(1)
        );
        assert_eq!(
            resolve(&tree, "Car/Engine/Electric"),
            Err(DomainError::UnknownNode("Car/Engine/Electric".to_string()))
        );
        assert!(resolve(&tree, "Bike").is_err());
        assert!(resolve(&tree, "").is_err());
    }

    #[test]
    fn adding_below_plain_node_makes_it_and() {
        let mut tree = engines();
        let wheels = resolve(&tree, "Car/Wheels").unwrap();

        add(&mut tree, wheels, "Alloy", NodeKind::None, 20).unwrap();

        assert_eq!(tree.node(wheels).kind(), NodeKind::And);
        assert_eq!(*tree.node(wheels).subtree_key(), 25);
        assert_eq!(price(&tree), 10 + 100 + 25);
        assert!(tree.is_consistent());
    }

    #[test]
    fn removing_down_to_one_alternative_makes_parent_and() {
        let mut tree = engines();
        let gas = resolve(&tree, "Car/Engine/Gas").unwrap();

        remove(&mut tree, gas).unwrap();

        let engine = resolve(&tree, "Car/Engine").unwrap();
        assert_eq!(tree.node(engine).kind(), NodeKind::And);
        assert_eq!(price(&tree), 10 + 150 + 5);

        let diesel = resolve(&tree, "Car/Engine/Diesel").unwrap();
        remove(&mut tree, diesel).unwrap();

        assert_eq!(tree.node(engine).kind(), NodeKind::None);
        assert!(tree.node(engine).is_leaf());
        assert_eq!(price(&tree), 10 + 5);
        assert!(tree.is_consistent());
    }

    #[test]
    fn root_cannot_be_removed() {
        let mut tree = engines();
        let root = tree.root().unwrap();
        assert_eq!(remove(&mut tree, root), Err(DomainError::RootNotRemovable));
    }

    #[test]
    fn reprice_replaces_node_and_keeps_children_and_pin() {
        let mut tree = engines();
        let engine = resolve(&tree, "Car/Engine").unwrap();

        let replacement = reprice(&mut tree, engine, 7).unwrap();

        assert_eq!(*tree.node(replacement).own_key(), 7);
        assert_eq!(tree.node(replacement).child_count(), 2);
        assert!(tree.node(tree.node(replacement).child(1)).value().is_fixed());
        assert_eq!(price(&tree), 10 + 107 + 5);
        assert!(!tree.contains(engine));
    }

    #[test]
    fn negative_price_is_refused_before_any_change() {
        let mut tree = engines();
        let gas = resolve(&tree, "Car/Engine/Gas").unwrap();

        assert!(matches!(
            reprice(&mut tree, gas, -1),
            Err(DomainError::NegativePrice { price: -1, .. })
        ));
        assert!(tree.contains(gas));
    }

    #[test]
    fn edits_that_leave_the_price_range_are_refused() {
        let mut tree = engines();
        let gas = resolve(&tree, "Car/Engine/Gas").unwrap();
        let engine = resolve(&tree, "Car/Engine").unwrap();

        assert!(matches!(
            reprice(&mut tree, gas, Price::MAX),
            Err(DomainError::PriceOverflow { .. })
        ));
        assert!(matches!(
            add(&mut tree, engine, "Turbo", NodeKind::None, Price::MAX),
            Err(DomainError::PriceOverflow { .. })
        ));
        assert_eq!(price(&tree), 115);
    }

    #[test]
    fn kind_change_reaggregates_and_rejects_plain_parent() {
        let mut tree = engines();
        let engine = resolve(&tree, "Car/Engine").unwrap();

        change_kind(&mut tree, engine, NodeKind::And).unwrap();
        assert_eq!(price(&tree), 10 + 250 + 5);

        assert!(matches!(
            change_kind(&mut tree, engine, NodeKind::None),
            Err(DomainError::ChildrenUnderPlainNode { .. })
        ));
        assert_eq!(tree.node(engine).kind(), NodeKind::And);
    }

    #[test]
    fn rename_rejects_blank_names() {
        let mut tree = engines();
        let gas = resolve(&tree, "Car/Engine/Gas").unwrap();

        rename(&mut tree, gas, "Petrol").unwrap();

        assert!(resolve(&tree, "Car/Engine/Petrol").is_ok());
        assert!(rename(&mut tree, gas, "  ").is_err());
    }
}
