//! Parameters and pinned values
//!
//! A parameter is an OR node with alternatives; pinning one of its children
//! restricts every later solution snapshot to configurations containing it.

use tracing::{debug, instrument};

use crate::domain::{Catalog, DomainError, Fixed, NodeId, NodeKind};

/// OR node offering alternatives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    pub name: String,
    pub depth: usize,
    pub node: NodeId,
    pub alternatives: Vec<String>,
    /// Name of the first pinned alternative
    pub fixed: Option<String>,
}

/// `PARAMETER=VALUE` as given on the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    pub parameter: String,
    pub value: String,
}

/// Every parameter of `tree` in pre-order.
pub fn parameters(tree: &Catalog) -> Vec<Parameter> {
    tree.iter()
        .filter(|(_, _, node)| node.kind() == NodeKind::Or && !node.is_leaf())
        .map(|(depth, id, node)| {
            let alternatives: Vec<&str> = node
                .children()
                .iter()
                .map(|&child| tree.node(child).value().name())
                .collect();
            let fixed = node
                .children()
                .iter()
                .find(|&&child| tree.node(child).value().is_fixed())
                .map(|&child| tree.node(child).value().name().to_string());
            Parameter {
                name: node.value().name().to_string(),
                depth,
                node: id,
                alternatives: alternatives.into_iter().map(String::from).collect(),
                fixed,
            }
        })
        .collect()
}

fn matching(tree: &Catalog, parameter: &str) -> Result<Vec<NodeId>, DomainError> {
    let ids: Vec<NodeId> = parameters(tree)
        .into_iter()
        .filter(|p| p.name == parameter)
        .map(|p| p.node)
        .collect();
    if ids.is_empty() {
        return Err(DomainError::UnknownParameter(parameter.to_string()));
    }
    Ok(ids)
}

/// Pin `value` at every parameter named `parameter` that offers it and unpin
/// its siblings.
///
/// Returns the number of parameters changed. Parameters with the same name
/// but without such an alternative are left untouched.
#[instrument(level = "debug", skip(tree))]
pub fn choose(tree: &mut Catalog, parameter: &str, value: &str) -> Result<usize, DomainError> {
    let mut changed = 0;
    for id in matching(tree, parameter)? {
        let children = tree.node(id).children().to_vec();
        let Some(position) = children
            .iter()
            .position(|&child| tree.node(child).value().name() == value)
        else {
            continue;
        };
        for (index, child) in children.into_iter().enumerate() {
            tree.value_mut(child).set_fixed(index == position);
        }
        changed += 1;
    }
    if changed == 0 {
        return Err(DomainError::UnknownValue {
            parameter: parameter.to_string(),
            value: value.to_string(),
        });
    }
    debug!(changed, "value pinned");
    Ok(changed)
}

/// Unpin every alternative of the parameters named `parameter`.
#[instrument(level = "debug", skip(tree))]
pub fn clear(tree: &mut Catalog, parameter: &str) -> Result<usize, DomainError> {
    let ids = matching(tree, parameter)?;
    for &id in &ids {
        let children = tree.node(id).children().to_vec();
        for child in children {
            tree.value_mut(child).set_fixed(false);
        }
    }
    Ok(ids.len())
}

/// Parse `Engine=Diesel`; whitespace around both sides is ignored.
pub fn parse_assignment(text: &str) -> Result<Assignment, DomainError> {
    let invalid = || DomainError::InvalidAssignment(text.to_string());
    let (parameter, value) = text.split_once('=').ok_or_else(invalid)?;
    let (parameter, value) = (parameter.trim(), value.trim());
    if parameter.is_empty() || value.is_empty() {
        return Err(invalid());
    }
    Ok(Assignment {
        parameter: parameter.to_string(),
        value: value.to_string(),
    })
}

/// Apply assignments in order.
pub fn apply(tree: &mut Catalog, assignments: &[Assignment]) -> Result<(), DomainError> {
    for assignment in assignments {
        choose(tree, &assignment.parameter, &assignment.value)?;
    }
    Ok(())
}
