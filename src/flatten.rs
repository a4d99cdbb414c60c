use crate::models::{FlattenedStep, PlanNode};

struct Frame<'a> {
    node: &'a PlanNode,
    iterations: Vec<u32>,
}

/// Expand a structured plan into its linear execution sequence
///
/// Repetition blocks unroll in place: each iteration emits the block's
/// children in order before the next iteration begins, and sibling
/// nodes keep their relative order. Every emitted step records its
/// zero-based sequence index and the zero-based iteration index of
/// each enclosing repetition block, outermost first.
///
/// The expansion runs on an explicit worklist, so plan depth is
/// bounded by memory rather than the call stack.
pub fn flatten(nodes: &[PlanNode]) -> Vec<FlattenedStep> {
    let mut out = Vec::new();
    let mut stack: Vec<Frame> = nodes
        .iter()
        .rev()
        .map(|node| Frame {
            node,
            iterations: Vec::new(),
        })
        .collect();

    while let Some(frame) = stack.pop() {
        match frame.node {
            PlanNode::Step(step) => {
                out.push(FlattenedStep {
                    step: step.clone(),
                    index: out.len() as u32,
                    iterations: frame.iterations,
                });
            }
            PlanNode::Repetition { repeat, nodes } => {
                // Reverse push order so iteration 0 of the first child
                // is the next frame popped
                for iteration in (0..*repeat).rev() {
                    for node in nodes.iter().rev() {
                        let mut iterations = frame.iterations.clone();
                        iterations.push(iteration);
                        stack.push(Frame { node, iterations });
                    }
                }
            }
        }
    }

    out
}

/// Number of leaf steps the plan expands to, without expanding it
///
/// Each step counts once per product of the repeat counts of its
/// enclosing blocks. Agrees with `flatten(nodes).len()` except on
/// pathological plans whose expansion exceeds `u64`, where the count
/// saturates.
pub fn leaf_count(nodes: &[PlanNode]) -> u64 {
    let mut total: u64 = 0;
    let mut stack: Vec<(&PlanNode, u64)> = nodes.iter().map(|node| (node, 1)).collect();

    while let Some((node, multiplier)) = stack.pop() {
        match node {
            PlanNode::Step(_) => total = total.saturating_add(multiplier),
            PlanNode::Repetition { repeat, nodes } => {
                let multiplier = multiplier.saturating_mul(u64::from(*repeat));
                if multiplier == 0 {
                    continue;
                }
                for child in nodes {
                    stack.push((child, multiplier));
                }
            }
        }
    }

    total
}
