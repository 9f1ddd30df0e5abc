//! Node identity, kinds, and the closed set of processors.
//!
//! A node is a [`NodeKind`] tag plus a [`NodeProcessor`] holding its private
//! DSP state. Processors are dispatched by `match`, never through an open
//! trait object, so adding a kind forces every call site to handle it.

use std::borrow::Borrow;
use std::fmt;
use std::str::FromStr;

use audiokit_core::{AudioBlock, BlockFormat, Effect, ParamDescriptor, ParameterInfo};
use audiokit_effects::{Compressor, Delay, LowPassFilter};
use parking_lot::Mutex;
use thiserror::Error;

use crate::adapter::{InputAdapter, OutputAdapter};
use crate::monitor::NodeMeters;
use crate::staged::StagedParams;

/// Unique, stable identifier of a node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(String);

impl NodeId {
    /// Wraps a string id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

impl From<String> for NodeId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl Borrow<str> for NodeId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// How a node participates in the dataflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeRole {
    /// Produces audio without upstream input (reads the device).
    Source,
    /// Consumes audio without feeding other nodes (writes the device).
    Sink,
    /// Turns one input block into one output block.
    Transform,
}

/// The node types the engine can instantiate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// Device input adapter.
    Input,
    /// Device output adapter.
    Output,
    /// Resonant low-pass filter.
    Filter,
    /// Peak compressor.
    Compressor,
    /// Feedback delay.
    Delay,
}

impl NodeKind {
    /// Every kind, in declaration order.
    pub const ALL: [NodeKind; 5] = [
        NodeKind::Input,
        NodeKind::Output,
        NodeKind::Filter,
        NodeKind::Compressor,
        NodeKind::Delay,
    ];

    /// Lowercase name used by listing commands.
    pub fn name(self) -> &'static str {
        match self {
            Self::Input => "input",
            Self::Output => "output",
            Self::Filter => "filter",
            Self::Compressor => "compressor",
            Self::Delay => "delay",
        }
    }

    /// Dataflow role of this kind.
    pub fn role(self) -> NodeRole {
        match self {
            Self::Input => NodeRole::Source,
            Self::Output => NodeRole::Sink,
            Self::Filter | Self::Compressor | Self::Delay => NodeRole::Transform,
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Returned when a string names no [`NodeKind`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown node type '{0}'")]
pub struct ParseNodeKindError(String);

impl FromStr for NodeKind {
    type Err = ParseNodeKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NodeKind::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| ParseNodeKindError(s.to_owned()))
    }
}

/// Private DSP state of one node.
#[derive(Debug, Clone)]
pub enum NodeProcessor {
    /// Device input adapter.
    Input(InputAdapter),
    /// Device output adapter.
    Output(OutputAdapter),
    /// Low-pass filter.
    Filter(LowPassFilter),
    /// Compressor.
    Compressor(Compressor),
    /// Delay.
    Delay(Delay),
}

impl NodeProcessor {
    /// Builds a processor of `kind` with default parameters for `format`.
    pub fn new(kind: NodeKind, format: &BlockFormat) -> Self {
        match kind {
            NodeKind::Input => Self::Input(InputAdapter::new(format)),
            NodeKind::Output => Self::Output(OutputAdapter::new(format)),
            NodeKind::Filter => Self::Filter(LowPassFilter::new(format)),
            NodeKind::Compressor => Self::Compressor(Compressor::new(format)),
            NodeKind::Delay => Self::Delay(Delay::new(format)),
        }
    }

    /// Kind tag of this processor.
    pub fn kind(&self) -> NodeKind {
        match self {
            Self::Input(_) => NodeKind::Input,
            Self::Output(_) => NodeKind::Output,
            Self::Filter(_) => NodeKind::Filter,
            Self::Compressor(_) => NodeKind::Compressor,
            Self::Delay(_) => NodeKind::Delay,
        }
    }

    /// Every parameter descriptor, in index order.
    pub fn descriptors(&self) -> Vec<ParamDescriptor> {
        (0..self.param_count())
            .filter_map(|i| self.param_info(i))
            .collect()
    }
}

macro_rules! dispatch {
    ($self:expr, $p:ident => $body:expr) => {
        match $self {
            NodeProcessor::Input($p) => $body,
            NodeProcessor::Output($p) => $body,
            NodeProcessor::Filter($p) => $body,
            NodeProcessor::Compressor($p) => $body,
            NodeProcessor::Delay($p) => $body,
        }
    };
}

impl Effect for NodeProcessor {
    fn process_block(&mut self, input: &AudioBlock, output: &mut AudioBlock) {
        dispatch!(self, p => p.process_block(input, output));
    }

    fn reset(&mut self) {
        dispatch!(self, p => p.reset());
    }
}

impl ParameterInfo for NodeProcessor {
    fn param_count(&self) -> usize {
        dispatch!(self, p => p.param_count())
    }

    fn param_info(&self, index: usize) -> Option<ParamDescriptor> {
        dispatch!(self, p => p.param_info(index))
    }

    fn get_param(&self, index: usize) -> f32 {
        dispatch!(self, p => p.get_param(index))
    }

    fn set_param(&mut self, index: usize, value: f32) {
        dispatch!(self, p => p.set_param(index, value));
    }
}

/// Audio-side state of a node: the processor and its output block.
#[derive(Debug)]
pub(crate) struct NodeRuntime {
    pub(crate) processor: NodeProcessor,
    pub(crate) output: AudioBlock,
}

/// A node as shared between the graph and the execution plans.
///
/// The control thread touches only `staged` and reads `meters`. The runtime
/// cell is locked exclusively by the scheduler, always with `try_lock`.
#[derive(Debug)]
pub(crate) struct NodeHandle {
    pub(crate) id: NodeId,
    pub(crate) kind: NodeKind,
    pub(crate) staged: StagedParams,
    pub(crate) runtime: Mutex<NodeRuntime>,
    pub(crate) meters: NodeMeters,
}

impl NodeHandle {
    pub(crate) fn new(id: NodeId, processor: NodeProcessor, format: &BlockFormat) -> Self {
        Self {
            id,
            kind: processor.kind(),
            staged: StagedParams::new(processor.param_count()),
            runtime: Mutex::new(NodeRuntime {
                processor,
                output: AudioBlock::for_format(format),
            }),
            meters: NodeMeters::new(),
        }
    }
}
