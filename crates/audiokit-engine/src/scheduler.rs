//! The audio-side block driver.
//!
//! [`Scheduler::process_block`] is called once per device block. It loads the
//! published plan once, runs every step in order and never blocks, logs or
//! allocates: node cells are taken with `try_lock`, scratch blocks are
//! preallocated, and retired plans are freed by the control path.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::time::Instant;

use audiokit_core::{AudioBlock, BlockFormat, Effect, ParameterInfo};

use crate::node::{NodeHandle, NodeKind, NodeProcessor, NodeRuntime};
use crate::plan::PlanStep;
use crate::shared::{EngineShared, IoFault, IoFaultReporter, SchedulerState};

/// Executes published plans, one block per call.
///
/// Created by [`build_engine`](crate::build_engine) and handed to the device
/// I/O thread.
#[derive(Debug)]
pub struct Scheduler {
    shared: Arc<EngineShared>,
    format: BlockFormat,
    /// Fan-in scratch; also the reference block shape.
    mix: AudioBlock,
    deadline_secs: f32,
}

impl Scheduler {
    pub(crate) fn new(shared: Arc<EngineShared>, format: BlockFormat) -> Self {
        Self {
            shared,
            format,
            mix: AudioBlock::for_format(&format),
            deadline_secs: format.deadline().as_secs_f32(),
        }
    }

    /// Negotiated block shape.
    pub fn format(&self) -> BlockFormat {
        self.format
    }

    /// Handle for reporting device faults from callbacks or error handlers.
    pub fn io_faults(&self) -> IoFaultReporter {
        IoFaultReporter::new(Arc::clone(&self.shared))
    }

    /// Current state.
    pub fn state(&self) -> SchedulerState {
        self.shared.state()
    }

    /// Blocks completed so far.
    pub fn blocks_processed(&self) -> u64 {
        self.shared.blocks_completed()
    }

    /// Runs one block: device `input` in, device `output` out.
    ///
    /// Both blocks must match the negotiated shape; a mismatched pair is
    /// reported as a transient I/O fault and answered with silence. When the
    /// scheduler is stopped the output is silence. Returns the state after
    /// the block.
    pub fn process_block(&mut self, input: &AudioBlock, output: &mut AudioBlock) -> SchedulerState {
        if !self.shared.begin_block() {
            output.clear();
            return self.shared.state();
        }

        if !input.same_shape(&self.mix) || !output.same_shape(&self.mix) {
            self.shared.record_io_fault(IoFault::ShapeMismatch);
            output.clear();
            self.shared.end_block(None, false);
            return self.shared.state();
        }

        let block = self.shared.blocks_completed() + 1;
        let plan = self.shared.plan.load();
        output.clear();

        for step in &plan.steps {
            let started = Instant::now();
            let node = &*step.node;
            let level = if node.kind == NodeKind::Input {
                run_node(node, input, None)
            } else {
                gather_inputs(&mut self.mix, &plan.steps, &step.inputs);
                let sink = (node.kind == NodeKind::Output).then_some(&mut *output);
                run_node(node, &self.mix, sink)
            };
            let cpu = started.elapsed().as_secs_f32() / self.deadline_secs;
            node.meters
                .publish(block, cpu, level.unwrap_or(0.0), level.is_some());
        }

        output.saturate();
        let generation = plan.generation();
        drop(plan);
        self.shared.end_block(Some(generation), true);
        self.shared.state()
    }
}

/// Sums the outputs of `inputs` into `mix`, saturating once when more than
/// one edge fans in.
fn gather_inputs(mix: &mut AudioBlock, steps: &[PlanStep], inputs: &[usize]) {
    mix.clear();
    for &position in inputs {
        let Some(step) = steps.get(position) else {
            continue;
        };
        if let Some(upstream) = step.node.runtime.try_lock() {
            mix.mix_from(&upstream.output);
        }
    }
    if inputs.len() > 1 {
        mix.saturate();
    }
}

/// Applies staged parameters and processes one block inside a fault boundary.
///
/// Returns the output peak, or `None` when the node panicked, produced a
/// non-finite sample, or could not be entered. A faulted node's output is
/// silenced and its state reset. `sink`, when given, receives the output.
fn run_node(node: &NodeHandle, input: &AudioBlock, sink: Option<&mut AudioBlock>) -> Option<f32> {
    contain(node, sink, |processor, output| {
        node.staged
            .drain(|index, value| processor.set_param(index, value));
        processor.process_block(input, output);
    })
}

/// Runs `process` on the node's runtime with panics and non-finite output
/// turned into a silenced, reset node.
fn contain<F>(node: &NodeHandle, sink: Option<&mut AudioBlock>, process: F) -> Option<f32>
where
    F: FnOnce(&mut NodeProcessor, &mut AudioBlock),
{
    let mut guard = node.runtime.try_lock()?;
    let NodeRuntime { processor, output } = &mut *guard;

    let result = catch_unwind(AssertUnwindSafe(|| process(processor, output)));

    if result.is_err() || !output.is_finite() {
        output.clear();
        let _ = catch_unwind(AssertUnwindSafe(|| processor.reset()));
        return None;
    }
    if let Some(sink) = sink {
        sink.mix_from(output);
    }
    Some(output.peak())
}
