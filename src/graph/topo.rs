use std::collections::HashSet;

use super::node::{Node, NodeId};

/// Depth-first post-order over the operand relation, starting at `root`.
///
/// Every reachable node appears exactly once, after all of its operands.
/// Reversed, this is the order in which a backward pass may process nodes.
/// An explicit stack is used so long chains (e.g. wide neurons) cannot
/// overflow the call stack.
pub(crate) fn topological_order(nodes: &[Node], root: NodeId) -> Vec<NodeId> {
    let mut visited = HashSet::new();
    let mut order = Vec::new();
    // (node, operands already pushed)
    let mut stack = vec![(root, false)];

    while let Some((node_id, expanded)) = stack.pop() {
        if expanded {
            order.push(node_id);
            continue;
        }
        if !visited.insert(node_id) {
            continue;
        }

        stack.push((node_id, true));
        if let Some(op) = nodes[node_id.index()].op {
            // Reverse so the first operand is explored first.
            let operands: Vec<NodeId> = op.operands().collect();
            for &operand in operands.iter().rev() {
                if !visited.contains(&operand) {
                    stack.push((operand, false));
                }
            }
        }
    }

    order
}
