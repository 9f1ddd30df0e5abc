//! Immutable execution plans.
//!
//! A plan is the topological order of the graph at the moment it was built,
//! with each step's upstream positions resolved to indices into the step
//! list. The scheduler walks it front to back and never mutates it.

use std::sync::Arc;

use crate::error::Result;
use crate::graph::Graph;
use crate::node::NodeHandle;

/// One node invocation.
#[derive(Debug)]
pub(crate) struct PlanStep {
    pub(crate) node: Arc<NodeHandle>,
    /// Positions of upstream steps; every entry is less than this step's own.
    pub(crate) inputs: Box<[usize]>,
}

/// A published, read-only schedule.
#[derive(Debug)]
pub struct ExecutionPlan {
    generation: u64,
    pub(crate) steps: Vec<PlanStep>,
}

impl ExecutionPlan {
    pub(crate) fn empty(generation: u64) -> Self {
        Self {
            generation,
            steps: Vec::new(),
        }
    }

    /// Orders `graph` for execution. Fails only if the graph has a cycle.
    pub(crate) fn build(graph: &Graph, generation: u64) -> Result<Self> {
        let order = graph.topological_order()?;
        let mut position = vec![usize::MAX; graph.slot_count()];
        for (step, &slot) in order.iter().enumerate() {
            position[slot] = step;
        }

        let steps = order
            .iter()
            .filter_map(|&slot| {
                let record = graph.record(slot)?;
                let inputs = graph
                    .inputs_of(slot)
                    .into_iter()
                    .map(|src| position[src])
                    .collect();
                Some(PlanStep {
                    node: Arc::clone(&record.handle),
                    inputs,
                })
            })
            .collect();

        Ok(Self { generation, steps })
    }

    /// Monotonic publication counter.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Number of steps.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// True for a plan with no nodes.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Node ids in execution order.
    pub fn node_ids(&self) -> Vec<&str> {
        self.steps.iter().map(|step| step.node.id.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::NodeRecord;
    use crate::node::{NodeId, NodeKind, NodeProcessor};
    use audiokit_core::BlockFormat;

    fn insert(graph: &mut Graph, id: &str, kind: NodeKind) {
        let format = BlockFormat::new(48000.0, 16, 2);
        let processor = NodeProcessor::new(kind, &format);
        let descriptors = processor.descriptors();
        let values = descriptors.iter().map(|d| d.default).collect();
        graph
            .insert(NodeRecord {
                handle: Arc::new(NodeHandle::new(NodeId::from(id), processor, &format)),
                descriptors,
                values,
            })
            .unwrap();
    }

    #[test]
    fn steps_reference_earlier_positions() {
        let mut graph = Graph::new();
        insert(&mut graph, "out", NodeKind::Output);
        insert(&mut graph, "d", NodeKind::Delay);
        insert(&mut graph, "in", NodeKind::Input);
        graph.connect("in", "d").unwrap();
        graph.connect("d", "out").unwrap();
        graph.connect("in", "out").unwrap();

        let plan = ExecutionPlan::build(&graph, 7).unwrap();
        assert_eq!(plan.generation(), 7);
        assert_eq!(plan.node_ids(), vec!["in", "d", "out"]);
        for (i, step) in plan.steps.iter().enumerate() {
            assert!(step.inputs.iter().all(|&input| input < i));
        }
        assert_eq!(&*plan.steps[2].inputs, &[1, 0]);
    }

    #[test]
    fn removed_slots_are_skipped() {
        let mut graph = Graph::new();
        insert(&mut graph, "a", NodeKind::Filter);
        insert(&mut graph, "b", NodeKind::Filter);
        graph.remove("a").unwrap();
        let plan = ExecutionPlan::build(&graph, 1).unwrap();
        assert_eq!(plan.node_ids(), vec!["b"]);
        assert!(ExecutionPlan::empty(0).is_empty());
    }
}
