use petgraph::stable_graph::{NodeIndex, StableDiGraph};
use petgraph::visit::NodeIndexable;

use super::types::{ModuleNode, ProductEdge};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Visit {
    Unvisited,
    InProgress,
    Done,
}

/// Depth-first cycle search.
///
/// Roots are tried in `order` and successors in index order, so the reported
/// cycle is stable for a given catalog. The returned path starts and ends with
/// the same module, e.g. `[a, b, a]`.
pub fn find_cycle(
    graph: &StableDiGraph<ModuleNode, ProductEdge>,
    order: &[NodeIndex],
) -> Option<Vec<String>> {
    let mut state = vec![Visit::Unvisited; graph.node_bound()];
    let name = |idx: NodeIndex| {
        graph
            .node_weight(idx)
            .map(|n| n.name.clone())
            .unwrap_or_default()
    };
    let successors = |idx: NodeIndex| {
        let mut next: Vec<NodeIndex> = graph
            .neighbors_directed(idx, petgraph::Direction::Outgoing)
            .collect();
        next.sort();
        next.dedup();
        next
    };

    for &root in order {
        if state[root.index()] != Visit::Unvisited {
            continue;
        }

        // (node, successors, next successor to visit); the stack is the current path
        let mut stack: Vec<(NodeIndex, Vec<NodeIndex>, usize)> = Vec::new();
        state[root.index()] = Visit::InProgress;
        stack.push((root, successors(root), 0));

        loop {
            let Some(frame) = stack.last_mut() else {
                break;
            };
            let next = if frame.2 < frame.1.len() {
                frame.2 += 1;
                Some(frame.1[frame.2 - 1])
            } else {
                None
            };

            match next {
                Some(succ) => match state[succ.index()] {
                    Visit::InProgress => {
                        let start = stack.iter().position(|f| f.0 == succ).unwrap_or(0);
                        let mut cycle: Vec<String> =
                            stack[start..].iter().map(|f| name(f.0)).collect();
                        cycle.push(name(succ));
                        return Some(cycle);
                    }
                    Visit::Unvisited => {
                        state[succ.index()] = Visit::InProgress;
                        stack.push((succ, successors(succ), 0));
                    }
                    Visit::Done => {}
                },
                None => {
                    if let Some((done, _, _)) = stack.pop() {
                        state[done.index()] = Visit::Done;
                    }
                }
            }
        }
    }

    None
}
