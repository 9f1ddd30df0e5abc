//! Deterministic rendering without a device.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::{AudioBackend, Result, StreamConfig, StreamDriver, StreamHandle};

/// Pushes interleaved `input` through `driver` in callbacks of
/// `callback_frames`, returning output aligned with the input.
///
/// The driver's one-block latency is compensated by feeding trailing silence
/// and dropping the leading block, so output sample `i` corresponds to input
/// sample `i`.
pub fn render_offline(driver: &mut StreamDriver, input: &[f32], callback_frames: usize) -> Vec<f32> {
    let channels = driver.format().channels;
    let latency = driver.latency_frames() * channels;
    let chunk = callback_frames.max(1) * channels;
    let whole_frames = input.len() / channels * channels;

    let mut padded = Vec::with_capacity(whole_frames + latency);
    padded.extend_from_slice(&input[..whole_frames]);
    padded.resize(whole_frames + latency, 0.0);

    let mut rendered = vec![0.0; padded.len()];
    for (src, dst) in padded.chunks(chunk).zip(rendered.chunks_mut(chunk)) {
        driver.process_interleaved(src, dst);
    }
    rendered.drain(..latency);
    rendered
}

/// Backend that renders a fixed input buffer as fast as possible.
///
/// `start` runs the whole render synchronously; the result is available from
/// [`rendered`](Self::rendered) once it returns.
#[derive(Debug, Clone)]
pub struct OfflineBackend {
    input: Arc<Vec<f32>>,
    callback_frames: usize,
    output: Arc<Mutex<Vec<f32>>>,
}

impl OfflineBackend {
    /// Renders `input` (interleaved) in callbacks of `callback_frames` frames.
    pub fn new(input: Vec<f32>, callback_frames: usize) -> Self {
        Self {
            input: Arc::new(input),
            callback_frames,
            output: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Output of the last `start`.
    pub fn rendered(&self) -> Vec<f32> {
        self.output.lock().clone()
    }
}

impl AudioBackend for OfflineBackend {
    fn name(&self) -> &'static str {
        "offline"
    }

    fn start(&self, config: &StreamConfig, mut driver: StreamDriver) -> Result<StreamHandle> {
        config.check_driver(&driver)?;
        tracing::info!(
            frames = self.input.len() / config.channels.max(1) as usize,
            callback_frames = self.callback_frames,
            "offline render started"
        );
        let rendered = render_offline(&mut driver, &self.input, self.callback_frames);
        *self.output.lock() = rendered;
        Ok(StreamHandle::new(driver))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use audiokit_core::BlockFormat;
    use audiokit_engine::{NodeKind, ParamMap, build_engine};

    #[test]
    fn rendering_is_latency_compensated() {
        let (controller, scheduler) = build_engine(BlockFormat::new(8000.0, 16, 1)).unwrap();
        let mono = ParamMap::new().with("channels", 1);
        controller.add_node(NodeKind::Input, "in", &mono).unwrap();
        controller.add_node(NodeKind::Output, "out", &mono).unwrap();
        controller.connect("in", "out").unwrap();

        let input: Vec<f32> = (0..50).map(|i| (i as f32 * 0.3).sin() * 0.5).collect();
        let mut driver = StreamDriver::new(scheduler);
        assert_eq!(render_offline(&mut driver, &input, 7), input);
    }
}
