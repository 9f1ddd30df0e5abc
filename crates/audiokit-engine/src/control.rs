//! The control API.
//!
//! [`Controller`] is a cheap, cloneable handle for CLI, TUI or scripting
//! collaborators. Every call takes a short-held mutex that the scheduler never
//! touches, so a slow control caller can delay other control callers but
//! never the audio path.

use std::collections::BTreeMap;
use std::sync::Arc;

use audiokit_core::{BlockFormat, ParamDescriptor, ParamValue};
use parking_lot::Mutex;

use crate::editor::TopologyEditor;
use crate::error::Result;
use crate::monitor::Metrics;
use crate::node::{NodeKind, NodeProcessor};
use crate::scheduler::Scheduler;
use crate::shared::{EngineShared, SchedulerState};

/// Named parameter values for [`Controller::add_node`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParamMap(BTreeMap<String, ParamValue>);

impl ParamMap {
    /// Empty map; every parameter keeps its default.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.insert(name, value);
        self
    }

    /// Inserts or replaces a value.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<ParamValue>) {
        self.0.insert(name.into(), value.into());
    }

    /// Value for `name`, if present.
    pub fn get(&self, name: &str) -> Option<ParamValue> {
        self.0.get(name).copied()
    }

    /// Entries in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &ParamValue)> {
        self.0.iter()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when no parameters are given.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<ParamValue>> FromIterator<(K, V)> for ParamMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(name, value)| (name.into(), value.into()))
                .collect(),
        )
    }
}

/// One entry of [`Controller::list_nodes`].
#[derive(Debug, Clone, PartialEq)]
pub struct NodeInfo {
    /// Node id.
    pub id: String,
    /// Node type.
    pub kind: NodeKind,
    /// Current parameter values in descriptor order.
    pub params: Vec<(&'static str, ParamValue)>,
}

/// Control-path handle to a running engine.
#[derive(Debug, Clone)]
pub struct Controller {
    editor: Arc<Mutex<TopologyEditor>>,
    shared: Arc<EngineShared>,
}

impl Controller {
    /// Creates a node of `kind` named `id`, validating every entry of
    /// `params`. The node joins the audio path at the next plan publication.
    pub fn add_node(&self, kind: NodeKind, id: &str, params: &ParamMap) -> Result<()> {
        self.editor.lock().add_node(kind, id, params)
    }

    /// Adds the edge `from → to` and publishes a new plan.
    pub fn connect(&self, from: &str, to: &str) -> Result<()> {
        self.editor.lock().connect(from, to)
    }

    /// Removes the edge `from → to` and publishes a new plan.
    pub fn disconnect(&self, from: &str, to: &str) -> Result<()> {
        self.editor.lock().disconnect(from, to)
    }

    /// Removes a node with its edges and publishes a new plan.
    pub fn remove_node(&self, id: &str) -> Result<()> {
        self.editor.lock().remove_node(id)
    }

    /// Validates `value` and stages it; the node applies it at the start of
    /// its next block.
    pub fn set_parameter(&self, id: &str, name: &str, value: impl Into<ParamValue>) -> Result<()> {
        self.editor.lock().set_parameter(id, name, value.into())
    }

    /// Nodes in insertion order with their current parameters.
    pub fn list_nodes(&self) -> Vec<NodeInfo> {
        self.editor.lock().list_nodes()
    }

    /// Edges in the order they were made.
    pub fn list_connections(&self) -> Vec<(String, String)> {
        self.editor.lock().list_connections()
    }

    /// Per-node meters and engine counters.
    pub fn get_metrics(&self) -> Metrics {
        self.editor.lock().metrics()
    }

    /// Publishes a plan for the current graph, returning its generation.
    ///
    /// Needed only to make freshly added, still unconnected nodes live.
    pub fn rebuild_plan(&self) -> Result<u64> {
        self.editor.lock().rebuild_plan()
    }

    /// Node ids of the published plan, in execution order.
    pub fn execution_order(&self) -> Vec<String> {
        let plan = self.shared.plan.load();
        plan.node_ids().into_iter().map(str::to_owned).collect()
    }

    /// Parameter descriptors of a node type, for listing commands.
    pub fn describe(&self, kind: NodeKind) -> Vec<ParamDescriptor> {
        let format = self.editor.lock().format();
        NodeProcessor::new(kind, &format).descriptors()
    }

    /// Frees retired plans the scheduler can no longer hold; returns how many.
    pub fn collect_garbage(&self) -> usize {
        self.editor.lock().collect_garbage()
    }

    /// Retired plans still waiting for the scheduler to move on.
    pub fn pending_reclaim(&self) -> usize {
        self.editor.lock().pending_reclaim()
    }

    /// Requests shutdown. Takes effect between blocks; a block in progress
    /// runs to completion.
    pub fn stop(&self) {
        self.shared.request_stop();
        tracing::info!("engine stop requested");
    }

    /// Current scheduler state.
    pub fn state(&self) -> SchedulerState {
        self.shared.state()
    }
}

/// Creates a connected controller and scheduler pair for `format`.
///
/// The scheduler goes to the device-I/O thread; the controller stays with
/// the control path and may be cloned freely.
pub fn build_engine(format: BlockFormat) -> Result<(Controller, Scheduler)> {
    format.validate()?;
    let shared = Arc::new(EngineShared::new());
    let editor = TopologyEditor::new(format, Arc::clone(&shared));
    let controller = Controller {
        editor: Arc::new(Mutex::new(editor)),
        shared: Arc::clone(&shared),
    };
    tracing::info!(
        "engine ready: {} Hz, {} frames, {} channels",
        format.sample_rate,
        format.frames,
        format.channels
    );
    Ok((controller, Scheduler::new(shared, format)))
}
