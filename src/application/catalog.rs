//! Catalog documents
//!
//! A catalog is stored as a TOML document with one `[root]` table; every
//! node may carry a `children` array of tables:
//!
//! ```toml
//! [root]
//! name = "Mark"
//! kind = "or"
//!
//! [[root.children]]
//! name = "BMW"
//! kind = "and"
//! ```

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::domain::{Catalog, DomainError, Fixed, NodeId, NodeItem, NodeKind, Price};

/// Node kind as written in a catalog file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KindName {
    And,
    Or,
    #[default]
    None,
}

impl From<KindName> for NodeKind {
    fn from(kind: KindName) -> Self {
        match kind {
            KindName::And => NodeKind::And,
            KindName::Or => NodeKind::Or,
            KindName::None => NodeKind::None,
        }
    }
}

impl From<NodeKind> for KindName {
    fn from(kind: NodeKind) -> Self {
        match kind {
            NodeKind::And => KindName::And,
            NodeKind::Or => KindName::Or,
            NodeKind::None => KindName::None,
        }
    }
}

fn is_false(value: &bool) -> bool {
    !*value
}

/// One node of a catalog file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeTable {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub kind: KindName,
    #[serde(default)]
    pub price: Price,
    #[serde(default, skip_serializing_if = "is_false")]
    pub fixed: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NodeTable>,
}

/// Whole catalog file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogDocument {
    pub root: Option<NodeTable>,
}

impl CatalogDocument {
    /// Snapshot of the attached part of `tree`.
    pub fn from_tree(tree: &Catalog) -> Self {
        Self {
            root: tree.root().map(|root| table_of(tree, root)),
        }
    }

    /// Validate and build the tree.
    ///
    /// Rejects a missing root, empty names, negative prices and children
    /// below a node of kind `none`. An `or` node without children is
    /// accepted: it is a leaf.
    #[instrument(level = "debug", skip(self))]
    pub fn into_tree(self) -> Result<Catalog, DomainError> {
        let root = self.root.ok_or(DomainError::EmptyCatalog)?;
        let mut tree = Catalog::new();
        let path = if root.name.is_empty() {
            "root".to_string()
        } else {
            root.name.clone()
        };
        let (root_id, _) = build(&mut tree, &root, &path)?;
        tree.set_root(Some(root_id));
        debug!(nodes = tree.len(), "catalog built");
        Ok(tree)
    }
}

fn table_of(tree: &Catalog, id: NodeId) -> NodeTable {
    let node = tree.node(id);
    NodeTable {
        name: node.value().name().to_string(),
        kind: node.kind().into(),
        price: *node.own_key(),
        fixed: node.value().is_fixed(),
        children: node
            .children()
            .iter()
            .map(|&child| table_of(tree, child))
            .collect(),
    }
}

/// Highest total a subtree can reach, given the ceilings of its children.
/// `None` if it does not fit into a [`Price`].
pub(crate) fn price_ceiling<I>(kind: NodeKind, own: Price, children: I) -> Option<Price>
where
    I: IntoIterator<Item = Price>,
{
    let mut children = children.into_iter().peekable();
    if children.peek().is_none() {
        return Some(own);
    }
    match kind {
        NodeKind::Or => own.checked_add(children.max()?),
        NodeKind::And | NodeKind::None => children.try_fold(own, Price::checked_add),
    }
}

/// Builds the subtree of `entry` bottom-up and returns its root with its
/// price ceiling. Children are attached only once the ceiling is known to
/// fit, so aggregation never overflows.
fn build(
    tree: &mut Catalog,
    entry: &NodeTable,
    path: &str,
) -> Result<(NodeId, Price), DomainError> {
    if entry.name.trim().is_empty() {
        return Err(DomainError::MissingName {
            path: path.to_string(),
        });
    }
    if entry.price < 0 {
        return Err(DomainError::NegativePrice {
            name: entry.name.clone(),
            price: entry.price,
        });
    }
    if entry.kind == KindName::None && !entry.children.is_empty() {
        return Err(DomainError::ChildrenUnderPlainNode {
            name: entry.name.clone(),
        });
    }

    let mut children = Vec::with_capacity(entry.children.len());
    for (position, child) in entry.children.iter().enumerate() {
        let child_path = if child.name.is_empty() {
            format!("{}/[{}]", path, position)
        } else {
            format!("{}/{}", path, child.name)
        };
        children.push(build(tree, child, &child_path)?);
    }
    let ceiling = price_ceiling(
        entry.kind.into(),
        entry.price,
        children.iter().map(|&(_, ceiling)| ceiling),
    )
    .ok_or_else(|| DomainError::PriceOverflow {
        name: entry.name.clone(),
    })?;

    let mut item = NodeItem::new(entry.name.as_str());
    item.set_fixed(entry.fixed);
    let id = tree.create(entry.kind.into(), entry.price, item);
    for (child, _) in children {
        tree.attach(id, child);
    }
    Ok((id, ceiling))
}

/// Sample vehicle line-up: one mark with two models, each offering engines,
/// engine power and option packages.
pub fn demo_catalog() -> Catalog {
    fn group(tree: &mut Catalog, parent: NodeId, kind: NodeKind, price: Price, name: &str) -> NodeId {
        tree.append(parent, kind, price, NodeItem::new(name))
    }

    fn alternatives(tree: &mut Catalog, parent: NodeId, name: &str, values: &[(&str, Price)]) {
        let or = group(tree, parent, NodeKind::Or, 0, name);
        for &(value, price) in values {
            group(tree, or, NodeKind::None, price, value);
        }
    }

    fn engines(tree: &mut Catalog, model: NodeId, gas: &[(&str, Price)], diesel: &[(&str, Price)]) {
        let engine = group(tree, model, NodeKind::Or, 0, "Engine");
        let gas_node = group(tree, engine, NodeKind::And, 0, "Gas");
        alternatives(tree, gas_node, "Engine power", gas);
        let diesel_node = group(tree, engine, NodeKind::And, 0, "Diesel");
        alternatives(tree, diesel_node, "Engine power", diesel);
    }

    let mut tree = Catalog::new();
    let mark = tree.create(NodeKind::Or, 0, NodeItem::new("Mark"));
    tree.set_root(Some(mark));
    let bmw = group(&mut tree, mark, NodeKind::And, 0, "BMW");
    let model = group(&mut tree, bmw, NodeKind::Or, 0, "Model");

    let x6 = group(&mut tree, model, NodeKind::And, 2_900_000, "X6");
    engines(
        &mut tree,
        x6,
        &[("306 hp", 503_000), ("450 hp", 1_248_000)],
        &[("249 hp", 541_000), ("313 hp", 858_000), ("381 hp", 1_675_000)],
    );
    let options = group(&mut tree, x6, NodeKind::And, 0, "Options");
    alternatives(
        &mut tree,
        options,
        "Electropackage",
        &[("Front power windows", 30_000), ("Full electropackage", 210_000)],
    );
    alternatives(
        &mut tree,
        options,
        "Audio system",
        &[("Harman", 70_000), ("Bang & Olufsen", 190_000)],
    );

    let x5 = group(&mut tree, model, NodeKind::And, 2_300_000, "X5");
    engines(
        &mut tree,
        x5,
        &[("306 hp", 410_000), ("450 hp", 1_102_000)],
        &[
            ("218 hp", 525_000),
            ("249 hp", 671_000),
            ("313 hp", 786_000),
            ("381 hp", 1_259_500),
        ],
    );
    let options = group(&mut tree, x5, NodeKind::And, 0, "Options");
    alternatives(&mut tree, options, "TV", &[("Yes", 81_017), ("No", 0)]);
    alternatives(
        &mut tree,
        options,
        "Electropackage",
        &[("Front power windows", 35_000), ("Full electropackage", 206_700)],
    );
    alternatives(
        &mut tree,
        options,
        "Audio system",
        &[
            ("Hi-Fi Audio system", 34_576),
            ("Harman", 76_000),
            ("Bang & Olufsen", 278_446),
        ],
    );
    tree
}
