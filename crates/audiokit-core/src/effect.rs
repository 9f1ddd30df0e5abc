//! Block processing contract for DSP nodes.
//!
//! ## Design Decisions
//!
//! - **Whole blocks**: nodes see one [`AudioBlock`] per call, so per-block work
//!   (coefficient updates, staged parameter changes) happens once at the top of
//!   the call and never mid-block.
//!
//! - **Fixed shape**: input and output share the format the node was built
//!   for. Implementations may still tolerate a mismatch by processing the
//!   overlapping region.
//!
//! - **Object safe**: `dyn Effect` works, although the engine dispatches over a
//!   closed set of node types instead.

use crate::block::AudioBlock;

/// Block-based audio processor with private state.
///
/// # Example
///
/// ```rust
/// use audiokit_core::{AudioBlock, Effect};
///
/// struct Invert;
///
/// impl Effect for Invert {
///     fn process_block(&mut self, input: &AudioBlock, output: &mut AudioBlock) {
///         for ch in 0..output.channels().min(input.channels()) {
///             for (o, i) in output.channel_mut(ch).iter_mut().zip(input.channel(ch)) {
///                 *o = -*i;
///             }
///         }
///     }
///
///     fn reset(&mut self) {}
/// }
/// ```
pub trait Effect {
    /// Processes one block.
    ///
    /// State carried between blocks (filter memory, delay contents, envelope)
    /// continues from the previous call.
    fn process_block(&mut self, input: &AudioBlock, output: &mut AudioBlock);

    /// Clears internal state without touching parameters.
    fn reset(&mut self);
}
