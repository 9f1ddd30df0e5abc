//! Callback-to-block adapter.
//!
//! Devices rarely deliver exactly one engine block per callback. The driver
//! fills an input block frame by frame and, in the same step, drains the
//! previous block's output, so any callback size maps onto fixed blocks at a
//! constant latency of one block. All storage is allocated in [`StreamDriver::new`].

use std::mem;

use audiokit_core::{AudioBlock, BlockFormat};
use audiokit_engine::{IoFault, IoFaultReporter, Scheduler, SchedulerState};

/// Owns the scheduler on the device side of a stream.
#[derive(Debug)]
pub struct StreamDriver {
    scheduler: Scheduler,
    faults: IoFaultReporter,
    input: AudioBlock,
    output: AudioBlock,
    /// Frame position shared by the filling input and draining output block.
    cursor: usize,
    frame: Vec<f32>,
}

impl StreamDriver {
    /// Wraps `scheduler`, preallocating blocks for its format.
    pub fn new(scheduler: Scheduler) -> Self {
        let format = scheduler.format();
        Self {
            faults: scheduler.io_faults(),
            input: AudioBlock::for_format(&format),
            output: AudioBlock::for_format(&format),
            cursor: 0,
            frame: vec![0.0; format.channels],
            scheduler,
        }
    }

    /// Engine block shape.
    pub fn format(&self) -> BlockFormat {
        self.scheduler.format()
    }

    /// Frames between a sample entering and leaving the driver.
    pub fn latency_frames(&self) -> usize {
        self.input.frames()
    }

    /// Scheduler state.
    pub fn state(&self) -> SchedulerState {
        self.scheduler.state()
    }

    /// Fault reporter shared with the scheduler.
    pub fn io_faults(&self) -> IoFaultReporter {
        self.faults.clone()
    }

    /// Releases the scheduler.
    pub fn into_scheduler(self) -> Scheduler {
        self.scheduler
    }

    /// Processes one duplex callback of interleaved samples.
    ///
    /// `input` and `output` must hold the same whole number of frames. A
    /// malformed pair is reported as a transient fault and answered with
    /// silence.
    pub fn process_interleaved(&mut self, input: &[f32], output: &mut [f32]) {
        let channels = self.frame.len();
        if input.len() != output.len() || input.len() % channels != 0 {
            self.faults.report(IoFault::ShapeMismatch);
            output.fill(0.0);
            return;
        }
        for (src, dst) in input
            .chunks_exact(channels)
            .zip(output.chunks_exact_mut(channels))
        {
            self.step(src, dst);
        }
    }

    /// Processes an output-only callback, pulling input samples one at a time.
    ///
    /// Missing input samples are replaced with silence. Returns how many were
    /// missing so the caller can report an underrun.
    pub fn process_output<F>(&mut self, output: &mut [f32], mut next_input: F) -> usize
    where
        F: FnMut() -> Option<f32>,
    {
        let channels = self.frame.len();
        if output.len() % channels != 0 {
            self.faults.report(IoFault::ShapeMismatch);
            output.fill(0.0);
            return 0;
        }
        let mut missing = 0;
        let mut frame = mem::take(&mut self.frame);
        for dst in output.chunks_exact_mut(channels) {
            for sample in &mut frame {
                *sample = next_input().unwrap_or_else(|| {
                    missing += 1;
                    0.0
                });
            }
            self.step(&frame, dst);
        }
        self.frame = frame;
        missing
    }

    fn step(&mut self, src: &[f32], dst: &mut [f32]) {
        self.input.write_frame(self.cursor, src);
        self.output.read_frame(self.cursor, dst);
        self.cursor += 1;
        if self.cursor == self.input.frames() {
            self.scheduler.process_block(&self.input, &mut self.output);
            self.cursor = 0;
        }
    }
}
