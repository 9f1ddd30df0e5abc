//! audiokit engine - a real-time audio graph with a concurrent control path
//!
//! The engine splits into two halves that share nothing but a few atomics
//! and the published plan:
//!
//! - [`Controller`] - Control-path API. Validates node creation, parameter
//!   changes and edges, keeps the graph acyclic, and publishes a fresh
//!   [`ExecutionPlan`] on every topology edit.
//! - [`Scheduler`] - Audio-path driver. Runs the latest plan once per block,
//!   contains node faults, and publishes per-node meters.
//!
//! # Threading
//!
//! Topology edits happen under a mutex only the control path takes. Plans are
//! swapped in atomically; parameter changes go through per-node staging slots
//! and land at the start of the node's next block. Retired plans (and the
//! nodes only they reference) are freed on the control path: at once when
//! no block is in flight, otherwise once the scheduler has completed a block
//! with a newer generation.
//!
//! # Example
//!
//! ```rust
//! use audiokit_core::{AudioBlock, BlockFormat};
//! use audiokit_engine::{NodeKind, ParamMap, build_engine};
//!
//! let format = BlockFormat::new(44100.0, 1024, 2);
//! let (controller, mut scheduler) = build_engine(format).unwrap();
//!
//! controller.add_node(NodeKind::Input, "in", &ParamMap::new().with("channels", 2)).unwrap();
//! controller.add_node(NodeKind::Filter, "f", &ParamMap::new().with("cutoff", 1000.0)).unwrap();
//! controller.add_node(NodeKind::Output, "out", &ParamMap::new().with("channels", 2)).unwrap();
//! controller.connect("in", "f").unwrap();
//! controller.connect("f", "out").unwrap();
//!
//! let input = AudioBlock::for_format(&format);
//! let mut output = AudioBlock::for_format(&format);
//! scheduler.process_block(&input, &mut output);
//!
//! assert_eq!(controller.get_metrics().active_nodes.len(), 3);
//! ```

mod adapter;
mod control;
mod editor;
mod error;
mod graph;
mod monitor;
mod node;
mod plan;
mod scheduler;
mod shared;
mod staged;

pub use adapter::{InputAdapter, OutputAdapter};
pub use control::{Controller, NodeInfo, ParamMap, build_engine};
pub use error::{EngineError, Result};
pub use monitor::Metrics;
pub use node::{NodeId, NodeKind, NodeProcessor, NodeRole, ParseNodeKindError};
pub use plan::ExecutionPlan;
pub use scheduler::Scheduler;
pub use shared::{IoFault, IoFaultReporter, SchedulerState};
pub use staged::{MAX_STAGED_PARAMS, StagedParams};
