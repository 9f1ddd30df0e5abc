//! State shared between the control path and the scheduler.
//!
//! [`EngineShared`] is the only meeting point of the two threads besides the
//! per-node staging and meters: the active plan behind an `ArcSwap`, the
//! scheduler state machine, and a handful of counters. Every field is
//! wait-free for the scheduler.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU8, AtomicU64, Ordering};

use arc_swap::ArcSwap;

use crate::plan::ExecutionPlan;

/// Scheduler lifecycle.
///
/// `Idle → Running → Idle` once per block; `Stopped` is terminal and is
/// entered only between blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchedulerState {
    /// Waiting for the next block.
    Idle,
    /// Inside a block.
    Running,
    /// Shut down by request or by an unrecoverable I/O failure.
    Stopped,
}

impl SchedulerState {
    fn from_u8(raw: u8) -> Self {
        match raw {
            IDLE => Self::Idle,
            RUNNING => Self::Running,
            _ => Self::Stopped,
        }
    }
}

impl fmt::Display for SchedulerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Stopped => "stopped",
        })
    }
}

const IDLE: u8 = 0;
const RUNNING: u8 = 1;
const STOPPED: u8 = 2;

/// Faults at the device boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IoFault {
    /// Input arrived faster than it was consumed; samples were dropped.
    Overrun,
    /// Output was requested before input was available; silence was played.
    Underrun,
    /// A callback buffer did not match the negotiated block shape.
    ShapeMismatch,
    /// The device disappeared or the stream died.
    DeviceLost,
}

impl IoFault {
    /// True for single-block misses the stream survives.
    pub fn is_recoverable(self) -> bool {
        !matches!(self, Self::DeviceLost)
    }
}

/// Atomics shared by the controller and the scheduler.
#[derive(Debug)]
pub(crate) struct EngineShared {
    pub(crate) plan: ArcSwap<ExecutionPlan>,
    state: AtomicU8,
    stop_requested: AtomicBool,
    acknowledged_generation: AtomicU64,
    blocks_completed: AtomicU64,
    io_faults: AtomicU64,
}

impl EngineShared {
    pub(crate) fn new() -> Self {
        Self {
            plan: ArcSwap::from_pointee(ExecutionPlan::empty(0)),
            state: AtomicU8::new(IDLE),
            stop_requested: AtomicBool::new(false),
            acknowledged_generation: AtomicU64::new(0),
            blocks_completed: AtomicU64::new(0),
            io_faults: AtomicU64::new(0),
        }
    }

    pub(crate) fn state(&self) -> SchedulerState {
        SchedulerState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Enters `Running`. False when the scheduler is stopped or a stop is pending.
    pub(crate) fn begin_block(&self) -> bool {
        if self.stop_requested.load(Ordering::Acquire) {
            self.state.store(STOPPED, Ordering::Release);
            return false;
        }
        // SeqCst pairs with the load in `between_blocks`: a block that starts
        // after the editor saw Idle also loads the plan it just swapped in.
        self.state
            .compare_exchange(IDLE, RUNNING, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    /// True when no block is in flight, so the scheduler holds no plan.
    pub(crate) fn between_blocks(&self) -> bool {
        self.state.load(Ordering::SeqCst) != RUNNING
    }

    /// Leaves `Running`, acknowledging the generation the block ran with.
    ///
    /// Call only after the plan guard of the block has been dropped.
    pub(crate) fn end_block(&self, generation: Option<u64>, completed: bool) {
        if let Some(generation) = generation {
            self.acknowledged_generation
                .store(generation, Ordering::Release);
        }
        if completed {
            self.blocks_completed.fetch_add(1, Ordering::AcqRel);
        }
        let next = if self.stop_requested.load(Ordering::Acquire) {
            STOPPED
        } else {
            IDLE
        };
        self.state.store(next, Ordering::Release);
    }

    /// Asks the scheduler to stop. Takes effect now if it is between blocks.
    pub(crate) fn request_stop(&self) {
        self.stop_requested.store(true, Ordering::Release);
        let _ = self
            .state
            .compare_exchange(IDLE, STOPPED, Ordering::AcqRel, Ordering::Acquire);
    }

    pub(crate) fn acknowledged_generation(&self) -> u64 {
        self.acknowledged_generation.load(Ordering::Acquire)
    }

    pub(crate) fn blocks_completed(&self) -> u64 {
        self.blocks_completed.load(Ordering::Acquire)
    }

    pub(crate) fn io_faults(&self) -> u64 {
        self.io_faults.load(Ordering::Relaxed)
    }

    pub(crate) fn record_io_fault(&self, fault: IoFault) {
        self.io_faults.fetch_add(1, Ordering::Relaxed);
        if !fault.is_recoverable() {
            self.request_stop();
        }
    }
}

/// Cloneable handle for reporting device-boundary faults.
///
/// Safe to call from device callbacks and error handlers: it only touches
/// atomics. Recoverable faults are counted; an unrecoverable one also stops
/// the scheduler before its next block.
#[derive(Debug, Clone)]
pub struct IoFaultReporter {
    shared: Arc<EngineShared>,
}

impl IoFaultReporter {
    pub(crate) fn new(shared: Arc<EngineShared>) -> Self {
        Self { shared }
    }

    /// Records `fault`.
    pub fn report(&self, fault: IoFault) {
        self.shared.record_io_fault(fault);
    }

    /// Faults reported so far.
    pub fn count(&self) -> u64 {
        self.shared.io_faults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_cycle_returns_to_idle() {
        let shared = EngineShared::new();
        assert_eq!(shared.state(), SchedulerState::Idle);
        assert!(shared.begin_block());
        assert_eq!(shared.state(), SchedulerState::Running);
        shared.end_block(Some(3), true);
        assert_eq!(shared.state(), SchedulerState::Idle);
        assert_eq!(shared.acknowledged_generation(), 3);
        assert_eq!(shared.blocks_completed(), 1);
    }

    #[test]
    fn only_running_holds_a_plan() {
        let shared = EngineShared::new();
        assert!(shared.between_blocks());
        assert!(shared.begin_block());
        assert!(!shared.between_blocks());
        shared.end_block(Some(0), true);
        assert!(shared.between_blocks());
        shared.request_stop();
        assert!(shared.between_blocks());
    }

    #[test]
    fn stop_between_blocks_is_immediate() {
        let shared = EngineShared::new();
        shared.request_stop();
        assert_eq!(shared.state(), SchedulerState::Stopped);
        assert!(!shared.begin_block());
    }

    #[test]
    fn stop_during_block_lands_at_block_end() {
        let shared = EngineShared::new();
        assert!(shared.begin_block());
        shared.request_stop();
        assert_eq!(shared.state(), SchedulerState::Running);
        shared.end_block(None, true);
        assert_eq!(shared.state(), SchedulerState::Stopped);
        assert!(!shared.begin_block());
    }

    #[test]
    fn only_device_loss_stops() {
        let shared = Arc::new(EngineShared::new());
        let reporter = IoFaultReporter::new(Arc::clone(&shared));
        reporter.report(IoFault::Underrun);
        reporter.report(IoFault::Overrun);
        reporter.report(IoFault::ShapeMismatch);
        assert_eq!(shared.state(), SchedulerState::Idle);
        reporter.report(IoFault::DeviceLost);
        assert_eq!(shared.state(), SchedulerState::Stopped);
        assert_eq!(reporter.count(), 4);
    }
}
