use crate::types::{Node, PropertyRegistry};
use crate::{MatchError, Value};

/// Outcomes collected by one walk plus the counters reported by
/// [`MatchReport`](crate::MatchReport).
pub(crate) struct Walk<'t, T> {
    pub(crate) outcomes: Vec<&'t T>,
    pub(crate) nodes_visited: usize,
    pub(crate) edges_followed: usize,
}

/// Walk the tree from the root. `lookup` resolves a property index to the
/// record's value, or `None` if the record does not carry the property.
pub(crate) fn walk<'t, 'v, T, F>(
    nodes: &'t [Node],
    outcomes: &'t [T],
    properties: &PropertyRegistry,
    lookup: F,
) -> Result<Walk<'t, T>, MatchError>
where
    F: Fn(usize) -> Option<&'v Value>,
{
    let mut found = Walk {
        outcomes: Vec::new(),
        nodes_visited: 0,
        edges_followed: 0,
    };
    if nodes.is_empty() {
        return Ok(found);
    }

    // Explicit stack: path length is bounded by the rules, not the thread stack.
    let mut stack = vec![0_usize];
    while let Some(id) = stack.pop() {
        let node = &nodes[id];
        found.nodes_visited += 1;
        found
            .outcomes
            .extend(node.outcomes.iter().map(|&rule| &outcomes[rule]));

        let children = stack.len();
        for branch in &node.branches {
            let Some(value) = lookup(branch.property) else {
                continue;
            };
            let scalar = value
                .as_scalar()
                .map_err(|kind| MatchError::InvalidValueKind {
                    property: properties
                        .name(branch.property)
                        .unwrap_or_default()
                        .to_owned(),
                    kind,
                })?;
            if let Some(child) = branch.edges.get(scalar) {
                found.edges_followed += 1;
                stack.push(child);
            }
        }
        // Visit children in branch order.
        stack[children..].reverse();
    }
    Ok(found)
}
