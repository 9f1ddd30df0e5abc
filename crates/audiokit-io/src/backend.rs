//! Pluggable audio backend abstraction.
//!
//! A backend owns the device side of a stream: it negotiates the format once,
//! then calls into a [`StreamDriver`] from its audio callback until the
//! returned [`StreamHandle`] is dropped.
//!
//! ```text
//! ┌──────────────────────────────────┐
//! │   Controller (control thread)    │
//! └──────────────┬───────────────────┘
//!                │ plans, staged params
//!                ▼
//! ┌──────────────────────────────────┐
//! │  StreamDriver → Scheduler        │
//! └──────────────┬───────────────────┘
//!                │ driven by AudioBackend::start
//!        ┌───────┴────────┐
//!        ▼                ▼
//! ┌─────────────┐  ┌──────────────┐
//! │ CpalBackend │  │ Offline      │
//! │ (feature)   │  │ Backend      │
//! └─────────────┘  └──────────────┘
//! ```

use audiokit_core::BlockFormat;

use crate::{Error, Result, StreamDriver};

/// Stream parameters negotiated once at start and fixed for the stream's life.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamConfig {
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Engine block size in frames; also the preferred device buffer size.
    pub block_frames: u32,
    /// Number of interleaved channels.
    pub channels: u16,
    /// Optional device name filter (system default if `None`).
    pub device_name: Option<String>,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44100,
            block_frames: 1024,
            channels: 2,
            device_name: None,
        }
    }
}

impl StreamConfig {
    /// The engine block shape this stream carries.
    pub fn block_format(&self) -> BlockFormat {
        BlockFormat::new(
            self.sample_rate as f32,
            self.block_frames as usize,
            self.channels as usize,
        )
    }

    /// Fails unless `driver` was built for exactly this shape.
    pub fn check_driver(&self, driver: &StreamDriver) -> Result<()> {
        let expected = self.block_format();
        let actual = driver.format();
        if expected == actual {
            Ok(())
        } else {
            Err(Error::UnsupportedFormat(format!(
                "stream is {} Hz / {} frames / {} ch, engine is {} Hz / {} frames / {} ch",
                expected.sample_rate,
                expected.frames,
                expected.channels,
                actual.sample_rate,
                actual.frames,
                actual.channels
            )))
        }
    }
}

/// Type-erased stream handle.
///
/// The stream runs while this handle exists; dropping it stops the stream
/// and drops the driver with it.
pub struct StreamHandle {
    _inner: Box<dyn Send>,
}

impl StreamHandle {
    /// Wraps a backend-specific stream object.
    pub fn new<T: Send + 'static>(stream: T) -> Self {
        Self {
            _inner: Box::new(stream),
        }
    }
}

impl std::fmt::Debug for StreamHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamHandle").finish_non_exhaustive()
    }
}

/// A source and sink of device blocks.
///
/// Object-safe so the backend can be picked at runtime.
pub trait AudioBackend: Send {
    /// Human-readable name of this backend (e.g. "cpal", "offline").
    fn name(&self) -> &str;

    /// Starts streaming through `driver`.
    ///
    /// Fails with [`Error::UnsupportedFormat`] when `config` and the driver's
    /// engine disagree on the block shape.
    fn start(&self, config: &StreamConfig, driver: StreamDriver) -> Result<StreamHandle>;
}
