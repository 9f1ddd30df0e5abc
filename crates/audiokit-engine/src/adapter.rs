//! Device boundary adapters.
//!
//! [`InputAdapter`] copies the device input block into the graph and
//! [`OutputAdapter`] hands its input on to the device output. Both work on
//! preallocated blocks only and silence channels above their `channels`
//! parameter.

use audiokit_core::{
    AudioBlock, BlockFormat, Effect, ParamDescriptor, ParamUnit, ParameterInfo,
};

const CHANNELS: ParamDescriptor = ParamDescriptor::integer(
    "channels",
    "Channels",
    "Number of device channels carried by this node",
    ParamUnit::Channels,
    1,
    32,
    2,
);

/// Copies `input` to `output`, keeping only the first `channels` channels.
fn pass_channels(channels: usize, input: &AudioBlock, output: &mut AudioBlock) {
    output.copy_from(input);
    for ch in channels..output.channels() {
        output.channel_mut(ch).fill(0.0);
    }
}

macro_rules! channel_adapter {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone)]
        pub struct $name {
            channels: usize,
        }

        impl $name {
            /// Creates the adapter with the default channel count.
            pub fn new(_format: &BlockFormat) -> Self {
                Self {
                    channels: CHANNELS.default as usize,
                }
            }

            /// Channels carried by this node.
            pub fn channels(&self) -> usize {
                self.channels
            }

            /// Sets the channel count, clamped to `1..=32`.
            pub fn set_channels(&mut self, channels: usize) {
                self.channels = CHANNELS.clamp(channels as f32) as usize;
            }
        }

        impl Effect for $name {
            fn process_block(&mut self, input: &AudioBlock, output: &mut AudioBlock) {
                pass_channels(self.channels, input, output);
            }

            fn reset(&mut self) {}
        }

        impl ParameterInfo for $name {
            fn param_count(&self) -> usize {
                1
            }

            fn param_info(&self, index: usize) -> Option<ParamDescriptor> {
                (index == 0).then_some(CHANNELS)
            }

            fn get_param(&self, index: usize) -> f32 {
                if index == 0 { self.channels as f32 } else { 0.0 }
            }

            fn set_param(&mut self, index: usize, value: f32) {
                if index == 0 {
                    self.channels = CHANNELS.clamp(value) as usize;
                }
            }
        }
    };
}

channel_adapter!(
    /// Source node reading the device input block.
    ///
    /// The scheduler passes the device block as this node's input.
    InputAdapter
);

channel_adapter!(
    /// Sink node whose output is mixed into the device output block.
    OutputAdapter
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channels_above_count_are_silenced() {
        let format = BlockFormat::new(48000.0, 4, 3);
        let mut input = AudioBlock::for_format(&format);
        for ch in 0..3 {
            input.channel_mut(ch).fill(0.5);
        }
        let mut output = AudioBlock::for_format(&format);

        let mut adapter = InputAdapter::new(&format);
        adapter.process_block(&input, &mut output);
        assert_eq!(output.channel(1), &[0.5; 4]);
        assert_eq!(output.channel(2), &[0.0; 4]);

        adapter.set_param(0, 1.0);
        adapter.process_block(&input, &mut output);
        assert_eq!(output.channel(0), &[0.5; 4]);
        assert_eq!(output.channel(1), &[0.0; 4]);
    }

    #[test]
    fn channel_count_is_clamped() {
        let format = BlockFormat::default();
        let mut adapter = OutputAdapter::new(&format);
        adapter.set_channels(0);
        assert_eq!(adapter.channels(), 1);
        adapter.set_param(0, 100.0);
        assert_eq!(adapter.get_param(0), 32.0);
    }
}
