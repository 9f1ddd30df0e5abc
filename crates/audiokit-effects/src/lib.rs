//! audiokit effects - the DSP behind the engine's transform nodes
//!
//! - [`LowPassFilter`] - Resonant second-order low-pass, one section per channel
//! - [`Compressor`] - Feed-forward peak compressor with linked channels
//! - [`Delay`] - Feedback echo over a fixed-capacity ring
//!
//! Each effect is built for one [`BlockFormat`](audiokit_core::BlockFormat),
//! allocates everything it needs in `new`, and implements both
//! [`Effect`](audiokit_core::Effect) and
//! [`ParameterInfo`](audiokit_core::ParameterInfo).
//!
//! ## Example
//!
//! ```rust
//! use audiokit_core::{AudioBlock, BlockFormat, Effect, ParameterInfo};
//! use audiokit_effects::LowPassFilter;
//!
//! let format = BlockFormat::new(48000.0, 256, 2);
//! let mut filter = LowPassFilter::new(&format);
//! let cutoff = filter.find_param("cutoff").unwrap();
//! filter.set_param(cutoff, 2000.0);
//!
//! let input = AudioBlock::for_format(&format);
//! let mut output = AudioBlock::for_format(&format);
//! filter.process_block(&input, &mut output);
//! ```

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc;

pub mod compressor;
pub mod delay;
pub mod filter;

pub use compressor::Compressor;
pub use delay::{Delay, MAX_DELAY_MS, MAX_FEEDBACK};
pub use filter::LowPassFilter;
