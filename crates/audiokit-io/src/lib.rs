//! Device boundary for the audiokit engine.
//!
//! This crate provides:
//!
//! - **Stream driving**: [`StreamDriver`] adapts device callbacks of any size
//!   to the engine's fixed block shape
//! - **Backends**: the [`AudioBackend`] trait, a deterministic
//!   [`OfflineBackend`], and a cpal backend behind the `cpal-backend` feature
//! - **WAV file I/O**: [`read_wav`], [`write_wav`] and [`render_file`]
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use audiokit_engine::{NodeKind, ParamMap, build_engine};
//! use audiokit_io::{StreamDriver, render_file};
//!
//! let (controller, scheduler) = build_engine(format)?;
//! controller.add_node(NodeKind::Input, "in", &ParamMap::new())?;
//! controller.add_node(NodeKind::Delay, "echo", &ParamMap::new().with("delay_time", 250.0))?;
//! controller.add_node(NodeKind::Output, "out", &ParamMap::new())?;
//! controller.connect("in", "echo")?;
//! controller.connect("echo", "out")?;
//!
//! let mut driver = StreamDriver::new(scheduler);
//! render_file(&mut driver, "dry.wav", "wet.wav", 512)?;
//! ```

mod backend;
#[cfg(feature = "cpal-backend")]
mod cpal_backend;
mod driver;
mod offline;
mod wav;

pub use backend::{AudioBackend, StreamConfig, StreamHandle};
#[cfg(feature = "cpal-backend")]
pub use cpal_backend::CpalBackend;
pub use driver::StreamDriver;
pub use offline::{OfflineBackend, render_offline};
pub use wav::{WavSpec, read_wav, render_file, write_wav};

use audiokit_engine::EngineError;

/// Error types for audio I/O operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// WAV file read/write error.
    #[error("WAV file error: {0}")]
    Wav(#[from] hound::Error),

    /// Audio stream setup or runtime error.
    #[error("Audio stream error: {0}")]
    Stream(String),

    /// No audio device available on the system.
    #[error("No audio device available")]
    NoDevice,

    /// The requested audio device was not found.
    #[error("Device not found: {0}")]
    DeviceNotFound(String),

    /// The stream or file format does not match the engine.
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// The engine rejected the stream format.
    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    /// Standard I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result type for audio I/O operations.
pub type Result<T> = std::result::Result<T, Error>;
