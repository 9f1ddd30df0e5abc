//! Per-node meters and the metrics snapshot.
//!
//! The scheduler is the only writer of a [`NodeMeters`]. Readers on the
//! control thread take a versioned snapshot: the sequence number is odd while
//! a write is in progress, and a read is accepted only when the sequence is
//! even and unchanged across the read. Readers retry a bounded number of
//! times and never make the writer wait.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering, fence};

use crate::shared::SchedulerState;

/// Weight of the newest measurement in the rolling CPU estimate.
const CPU_SMOOTHING: f32 = 0.1;

/// Snapshot attempts before a reader gives up on a node for this poll.
const MAX_READ_ATTEMPTS: usize = 64;

/// One consistent reading of a node's meters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct MeterSample {
    /// Index of the last block the node ran in (1-based, 0 = never ran).
    pub(crate) block: u64,
    /// Rolling share of the block deadline spent in the node.
    pub(crate) cpu: f32,
    /// Peak absolute sample of the node's last output block.
    pub(crate) level: f32,
    /// False when the last run faulted and was silenced.
    pub(crate) ok: bool,
    /// Total faults since the node was created.
    pub(crate) faults: u64,
}

/// Seqlock-published meters for one node.
#[derive(Debug, Default)]
pub(crate) struct NodeMeters {
    seq: AtomicU64,
    block: AtomicU64,
    cpu: AtomicU32,
    level: AtomicU32,
    ok: AtomicBool,
    faults: AtomicU64,
}

impl NodeMeters {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Records one run of the node. Scheduler thread only.
    pub(crate) fn publish(&self, block: u64, cpu_fraction: f32, level: f32, ok: bool) {
        let seq = self.seq.load(Ordering::Relaxed);
        self.seq.store(seq.wrapping_add(1), Ordering::Relaxed);
        fence(Ordering::Release);

        let previous = f32::from_bits(self.cpu.load(Ordering::Relaxed));
        let cpu = if self.block.load(Ordering::Relaxed) == 0 {
            cpu_fraction
        } else {
            previous + CPU_SMOOTHING * (cpu_fraction - previous)
        };
        self.block.store(block, Ordering::Relaxed);
        self.cpu.store(cpu.to_bits(), Ordering::Relaxed);
        self.level.store(level.to_bits(), Ordering::Relaxed);
        self.ok.store(ok, Ordering::Relaxed);
        if !ok {
            let faults = self.faults.load(Ordering::Relaxed);
            self.faults.store(faults + 1, Ordering::Relaxed);
        }

        self.seq.store(seq.wrapping_add(2), Ordering::Release);
    }

    /// Consistent reading, or `None` if the writer kept interfering.
    pub(crate) fn snapshot(&self) -> Option<MeterSample> {
        for _ in 0..MAX_READ_ATTEMPTS {
            let before = self.seq.load(Ordering::Acquire);
            if before & 1 == 1 {
                std::hint::spin_loop();
                continue;
            }
            let sample = MeterSample {
                block: self.block.load(Ordering::Relaxed),
                cpu: f32::from_bits(self.cpu.load(Ordering::Relaxed)),
                level: f32::from_bits(self.level.load(Ordering::Relaxed)),
                ok: self.ok.load(Ordering::Relaxed),
                faults: self.faults.load(Ordering::Relaxed),
            };
            fence(Ordering::Acquire);
            if self.seq.load(Ordering::Relaxed) == before {
                return Some(sample);
            }
        }
        None
    }
}

/// Observability snapshot returned by
/// [`Controller::get_metrics`](crate::Controller::get_metrics).
///
/// A node is active when it ran without a fault in the most recently
/// completed block.
#[derive(Debug, Clone, PartialEq)]
pub struct Metrics {
    /// Nodes that ran cleanly in the last completed block.
    pub active_nodes: BTreeSet<String>,
    /// Rolling share of the block deadline spent per node.
    pub cpu: BTreeMap<String, f32>,
    /// Peak output level per node for its last block.
    pub level: BTreeMap<String, f32>,
    /// Total silenced faults per node.
    pub faults: BTreeMap<String, u64>,
    /// Device over/underruns and other boundary faults.
    pub io_faults: u64,
    /// Blocks completed by the scheduler.
    pub blocks_processed: u64,
    /// Generation of the plan used by the last completed block.
    pub generation: u64,
    /// Scheduler state at the time of the poll.
    pub state: SchedulerState,
}
