//! Lock-free parameter staging between the control and audio threads.
//!
//! The control thread writes a value into its slot and raises the slot's bit
//! in a pending mask. The audio thread swaps the mask out at the start of the
//! node's next block and applies every flagged slot. Values are f32 bit-cast
//! into `AtomicU32`, so neither side ever blocks or allocates.

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

/// Most parameters a single node can stage.
pub const MAX_STAGED_PARAMS: usize = 64;

/// Per-node staging area, one slot per parameter index.
#[derive(Debug)]
pub struct StagedParams {
    values: Box<[AtomicU32]>,
    pending: AtomicU64,
}

impl StagedParams {
    /// Allocates `count` slots (capped at [`MAX_STAGED_PARAMS`]).
    pub fn new(count: usize) -> Self {
        let count = count.min(MAX_STAGED_PARAMS);
        Self {
            values: (0..count).map(|_| AtomicU32::new(0)).collect(),
            pending: AtomicU64::new(0),
        }
    }

    /// Number of slots.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True when the node has no parameters.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Stages `value` for parameter `index`. Control thread only.
    ///
    /// A later stage of the same index before the audio thread drains
    /// replaces the earlier one. Out-of-range indices are ignored.
    pub fn stage(&self, index: usize, value: f32) {
        if let Some(slot) = self.values.get(index) {
            slot.store(value.to_bits(), Ordering::Relaxed);
            self.pending.fetch_or(1 << index, Ordering::Release);
        }
    }

    /// True when at least one value is waiting.
    pub fn has_pending(&self) -> bool {
        self.pending.load(Ordering::Acquire) != 0
    }

    /// Hands every pending `(index, value)` to `apply`. Audio thread only.
    ///
    /// Returns the number of values applied.
    pub fn drain(&self, mut apply: impl FnMut(usize, f32)) -> usize {
        let mut mask = self.pending.swap(0, Ordering::Acquire);
        let mut applied = 0;
        while mask != 0 {
            let index = mask.trailing_zeros() as usize;
            mask &= mask - 1;
            apply(index, f32::from_bits(self.values[index].load(Ordering::Relaxed)));
            applied += 1;
        }
        applied
    }
}
