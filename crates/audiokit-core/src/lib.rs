//! audiokit core - block and parameter primitives for the audio graph engine
//!
//! This crate holds the pieces every node of the engine is built from. Nothing
//! in here knows about graphs, threads or devices.
//!
//! # Building Blocks
//!
//! - [`AudioBlock`] - Fixed-shape planar buffer exchanged between nodes
//! - [`BlockFormat`] - Sample rate, frame count and channel count negotiated once per stream
//! - [`Effect`] - Block processing contract implemented by every DSP node
//! - [`ParameterInfo`] / [`ParamDescriptor`] - Typed parameter metadata used for
//!   validation and introspection
//! - [`Biquad`] - Second-order IIR section with RBJ cookbook coefficients
//! - [`DelayRing`] - Fixed-capacity multi-channel circular buffer
//!
//! # Real-time Rules
//!
//! Allocation happens in constructors only. Every method reachable from
//! [`Effect::process_block`] works on storage that already exists.
//!
//! # no_std Support
//!
//! Disable the default `std` feature to build against `alloc` only:
//!
//! ```toml
//! [dependencies]
//! audiokit-core = { version = "0.1", default-features = false }
//! ```

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc;

pub mod biquad;
pub mod block;
pub mod effect;
pub mod math;
pub mod param;
pub mod ring;

pub use biquad::{Biquad, lowpass_coefficients};
pub use block::{AudioBlock, BlockFormat, FormatError};
pub use effect::Effect;
pub use math::{db_to_linear, flush_denormal, linear_to_db, saturate};
pub use param::{ParamDescriptor, ParamError, ParamKind, ParamUnit, ParamValue, ParameterInfo};
pub use ring::DelayRing;
