//! The control-side editor: validated graph edits, plan publication and
//! deferred reclamation of retired plans.
//!
//! Every method here runs under the controller's mutex. Nothing in this
//! module is reachable from the scheduler.

use std::collections::HashMap;
use std::sync::Arc;

use audiokit_core::{BlockFormat, ParamDescriptor, ParamValue, ParameterInfo};

use crate::control::{NodeInfo, ParamMap};
use crate::error::{EngineError, Result};
use crate::graph::{Graph, NodeRecord};
use crate::monitor::Metrics;
use crate::node::{NodeHandle, NodeId, NodeKind, NodeProcessor};
use crate::plan::ExecutionPlan;
use crate::shared::EngineShared;

/// Looks up `name` among `descriptors`, case-insensitively.
fn find_descriptor(descriptors: &[ParamDescriptor], name: &str) -> Option<usize> {
    descriptors
        .iter()
        .position(|desc| desc.name.eq_ignore_ascii_case(name))
}

fn invalid_parameter(node: &str, param: &str, reason: impl Into<String>) -> EngineError {
    EngineError::InvalidParameter {
        node: NodeId::from(node),
        param: param.to_owned(),
        reason: reason.into(),
    }
}

/// Validates `value` for `name`, returning the descriptor index and the
/// accepted value.
fn validate_param(
    node: &str,
    descriptors: &[ParamDescriptor],
    name: &str,
    value: ParamValue,
) -> Result<(usize, f32)> {
    let index = find_descriptor(descriptors, name)
        .ok_or_else(|| invalid_parameter(node, name, "unknown parameter"))?;
    let accepted = descriptors[index]
        .validate(value)
        .map_err(|err| invalid_parameter(node, name, err.to_string()))?;
    Ok((index, accepted))
}

#[derive(Debug)]
pub(crate) struct TopologyEditor {
    graph: Graph,
    format: BlockFormat,
    shared: Arc<EngineShared>,
    generation: u64,
    /// Plans swapped out but possibly still referenced by the scheduler.
    retired: Vec<Arc<ExecutionPlan>>,
    reported_faults: HashMap<NodeId, u64>,
    reported_io_faults: u64,
}

impl TopologyEditor {
    pub(crate) fn new(format: BlockFormat, shared: Arc<EngineShared>) -> Self {
        Self {
            graph: Graph::new(),
            format,
            shared,
            generation: 0,
            retired: Vec::new(),
            reported_faults: HashMap::new(),
            reported_io_faults: 0,
        }
    }

    /// Builds and validates a node, then stores it. The node is not live
    /// until the next publication.
    pub(crate) fn add_node(&mut self, kind: NodeKind, id: &str, params: &ParamMap) -> Result<()> {
        if self.graph.slot_of(id).is_ok() {
            return Err(EngineError::DuplicateId(NodeId::from(id)));
        }

        let mut processor = NodeProcessor::new(kind, &self.format);
        let descriptors = processor.descriptors();
        for (name, &value) in params.iter() {
            let (index, accepted) = validate_param(id, &descriptors, name, value)?;
            processor.set_param(index, accepted);
        }
        let values = (0..descriptors.len())
            .map(|i| processor.get_param(i))
            .collect();

        let handle = NodeHandle::new(NodeId::from(id), processor, &self.format);
        self.graph.insert(NodeRecord {
            handle: Arc::new(handle),
            descriptors,
            values,
        })?;
        tracing::debug!("graph_add: {kind} node {id}");
        Ok(())
    }

    pub(crate) fn connect(&mut self, from: &str, to: &str) -> Result<()> {
        self.graph.connect(from, to)?;
        if let Err(err) = self.rebuild_plan() {
            self.graph.pop_edge();
            return Err(err);
        }
        tracing::debug!("graph_connect: {from} → {to}");
        Ok(())
    }

    pub(crate) fn disconnect(&mut self, from: &str, to: &str) -> Result<()> {
        let edge = (self.graph.slot_of(from)?, self.graph.slot_of(to)?);
        let position = self.graph.disconnect(from, to)?;
        if let Err(err) = self.rebuild_plan() {
            self.graph.restore_edge(position, edge);
            return Err(err);
        }
        tracing::debug!("graph_disconnect: {from} → {to}");
        Ok(())
    }

    /// Removes the node and its edges, then publishes. Dropping a subset of a
    /// DAG cannot introduce a cycle, so the rebuild cannot fail on order.
    pub(crate) fn remove_node(&mut self, id: &str) -> Result<()> {
        let record = self.graph.remove(id)?;
        self.reported_faults.remove(record.id());
        self.rebuild_plan()?;
        tracing::debug!("graph_remove: node {id}");
        Ok(())
    }

    /// Validates and stages a parameter change for the node's next block.
    pub(crate) fn set_parameter(&mut self, id: &str, name: &str, value: ParamValue) -> Result<()> {
        let slot = self.graph.slot_of(id)?;
        let record = self
            .graph
            .record_mut(slot)
            .ok_or_else(|| EngineError::UnknownNode(NodeId::from(id)))?;
        let (index, accepted) = validate_param(id, &record.descriptors, name, value)?;
        record.values[index] = accepted;
        record.handle.staged.stage(index, accepted);
        tracing::debug!("param_set: {id}.{name} = {accepted}");
        Ok(())
    }

    /// Builds a plan from the current graph and swaps it in atomically.
    pub(crate) fn rebuild_plan(&mut self) -> Result<u64> {
        let generation = self.generation + 1;
        let plan = ExecutionPlan::build(&self.graph, generation)?;
        tracing::debug!(
            "plan_publish: generation {generation}, order [{}]",
            plan.node_ids().join(", ")
        );
        let previous = self.shared.plan.swap(Arc::new(plan));
        self.generation = generation;
        self.retired.push(previous);
        self.collect_garbage();
        Ok(generation)
    }

    /// Drops retired plans the scheduler can no longer be reading.
    ///
    /// Everything is freed while no block is in flight (idle, or stopped).
    /// During a block, a plan is freed only once the scheduler has completed a
    /// block with a newer generation.
    pub(crate) fn collect_garbage(&mut self) -> usize {
        let acknowledged = self.shared.acknowledged_generation();
        let quiescent = self.shared.between_blocks();
        let before = self.retired.len();
        self.retired
            .retain(|plan| !quiescent && plan.generation() >= acknowledged);
        let freed = before - self.retired.len();
        if freed > 0 {
            tracing::debug!(
                "plan_reclaim: freed {freed}, {} pending",
                self.retired.len()
            );
        }
        freed
    }

    pub(crate) fn pending_reclaim(&self) -> usize {
        self.retired.len()
    }

    pub(crate) fn format(&self) -> BlockFormat {
        self.format
    }

    pub(crate) fn list_nodes(&self) -> Vec<NodeInfo> {
        self.graph
            .nodes()
            .map(|record| NodeInfo {
                id: record.id().to_string(),
                kind: record.handle.kind,
                params: record
                    .descriptors
                    .iter()
                    .zip(&record.values)
                    .map(|(desc, &value)| (desc.name, desc.to_value(value)))
                    .collect(),
            })
            .collect()
    }

    pub(crate) fn list_connections(&self) -> Vec<(String, String)> {
        self.graph.connections()
    }

    /// Reads every node's meters and logs fault counters that moved since the
    /// previous poll.
    pub(crate) fn metrics(&mut self) -> Metrics {
        let completed = self.shared.blocks_completed();
        let mut metrics = Metrics {
            active_nodes: Default::default(),
            cpu: Default::default(),
            level: Default::default(),
            faults: Default::default(),
            io_faults: self.shared.io_faults(),
            blocks_processed: completed,
            generation: self.shared.acknowledged_generation(),
            state: self.shared.state(),
        };

        for record in self.graph.nodes() {
            let Some(sample) = record.handle.meters.snapshot() else {
                continue;
            };
            let id = record.id().to_string();
            if sample.ok && completed > 0 && sample.block >= completed {
                metrics.active_nodes.insert(id.clone());
            }
            let reported = self.reported_faults.entry(record.id().clone()).or_insert(0);
            if sample.faults > *reported {
                tracing::warn!(
                    "node_fault: {id} silenced {} time(s) since last poll ({} total)",
                    sample.faults - *reported,
                    sample.faults
                );
                *reported = sample.faults;
            }
            metrics.cpu.insert(id.clone(), sample.cpu);
            metrics.level.insert(id.clone(), sample.level);
            metrics.faults.insert(id, sample.faults);
        }

        if metrics.io_faults > self.reported_io_faults {
            tracing::warn!(
                "io_fault: {} new device fault(s), scheduler {}",
                metrics.io_faults - self.reported_io_faults,
                metrics.state
            );
            self.reported_io_faults = metrics.io_faults;
        }
        metrics
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn editor() -> TopologyEditor {
        TopologyEditor::new(
            BlockFormat::new(48000.0, 32, 2),
            Arc::new(EngineShared::new()),
        )
    }

    #[test]
    fn add_node_validates_before_storing() {
        let mut editor = editor();
        let err = editor
            .add_node(NodeKind::Filter, "f", &ParamMap::new().with("cutoff", 5.0))
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidParameter { .. }));
        let err = editor
            .add_node(NodeKind::Filter, "f", &ParamMap::new().with("drive", 1.0))
            .unwrap_err();
        assert!(err.to_string().contains("unknown parameter"));
        assert!(editor.list_nodes().is_empty());

        editor
            .add_node(NodeKind::Filter, "f", &ParamMap::new().with("Cutoff", 2500.0))
            .unwrap();
        let nodes = editor.list_nodes();
        assert_eq!(nodes[0].params[0], ("cutoff", ParamValue::Float(2500.0)));
    }

    #[test]
    fn add_node_does_not_publish() {
        let mut editor = editor();
        editor
            .add_node(NodeKind::Delay, "d", &ParamMap::new())
            .unwrap();
        let plan = editor.shared.plan.load();
        assert_eq!(plan.generation(), 0);
        assert!(plan.is_empty());
    }

    #[test]
    fn each_edit_publishes_a_new_generation() {
        let mut editor = editor();
        editor.add_node(NodeKind::Input, "in", &ParamMap::new()).unwrap();
        editor.add_node(NodeKind::Output, "out", &ParamMap::new()).unwrap();
        editor.connect("in", "out").unwrap();
        assert_eq!(editor.shared.plan.load().generation(), 1);
        editor.disconnect("in", "out").unwrap();
        assert_eq!(editor.shared.plan.load().generation(), 2);
        editor.remove_node("in").unwrap();
        let plan = editor.shared.plan.load();
        assert_eq!(plan.generation(), 3);
        assert_eq!(plan.node_ids(), vec!["out"]);
    }

    #[test]
    fn idle_scheduler_frees_retired_plans_at_once() {
        let mut editor = editor();
        editor.rebuild_plan().unwrap();
        editor.rebuild_plan().unwrap();
        assert_eq!(editor.pending_reclaim(), 0);
    }

    #[test]
    fn retired_plans_wait_for_acknowledgement_mid_block() {
        let mut editor = editor();
        let shared = Arc::clone(&editor.shared);

        // block 1 runs with generation 0
        assert!(shared.begin_block());
        editor.rebuild_plan().unwrap();
        assert_eq!(editor.pending_reclaim(), 1);
        shared.end_block(Some(0), true);

        // block 2 runs with generation 1
        assert!(shared.begin_block());
        editor.rebuild_plan().unwrap();
        assert_eq!(editor.pending_reclaim(), 2);
        shared.end_block(Some(1), true);

        // block 3 is in flight: generation 0 is behind the acknowledged one
        assert!(shared.begin_block());
        assert_eq!(editor.collect_garbage(), 1);
        assert_eq!(editor.pending_reclaim(), 1);
        shared.end_block(Some(2), true);

        assert_eq!(editor.collect_garbage(), 1);
        assert_eq!(editor.pending_reclaim(), 0);
    }

    #[test]
    fn stopped_scheduler_releases_everything() {
        let mut editor = editor();
        assert!(editor.shared.begin_block());
        editor.rebuild_plan().unwrap();
        editor.shared.request_stop();
        editor.shared.end_block(None, true);
        assert_eq!(editor.collect_garbage(), 1);
    }

    #[test]
    fn integer_parameters_reject_fractions() {
        let mut editor = editor();
        editor.add_node(NodeKind::Input, "in", &ParamMap::new()).unwrap();
        let err = editor
            .set_parameter("in", "channels", ParamValue::Float(1.5))
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidParameter { .. }));
        editor
            .set_parameter("in", "channels", ParamValue::Int(1))
            .unwrap();
        assert_eq!(editor.list_nodes()[0].params[0].1, ParamValue::Int(1));
    }
}
