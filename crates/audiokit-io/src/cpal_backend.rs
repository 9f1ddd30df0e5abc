//! cpal-based duplex backend.
//!
//! The input stream pushes captured samples into an `rtrb` ring; the output
//! stream's callback drives the [`StreamDriver`], pulling input from the ring
//! one sample at a time. Neither callback locks or allocates.
//!
//! Fault mapping: a full ring is an overrun, an empty ring an underrun, and a
//! vanished device is unrecoverable and stops the scheduler. Other stream
//! errors are treated as transient underruns.

use audiokit_engine::{IoFault, IoFaultReporter};
use cpal::Host;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use rtrb::RingBuffer;

use crate::{AudioBackend, Error, Result, StreamConfig, StreamDriver, StreamHandle};

/// Blocks of capture the input ring can hold before overrunning.
const RING_BLOCKS: usize = 4;

fn device_name(device: &cpal::Device) -> std::result::Result<String, cpal::DeviceNameError> {
    device.description().map(|d| d.name().to_string())
}

fn stream_fault(err: &cpal::StreamError) -> IoFault {
    match err {
        cpal::StreamError::DeviceNotAvailable => IoFault::DeviceLost,
        _ => IoFault::Underrun,
    }
}

/// Cross-platform device backend (ALSA, CoreAudio, WASAPI).
pub struct CpalBackend {
    host: Host,
}

impl CpalBackend {
    /// Uses the platform's default audio host.
    pub fn new() -> Self {
        tracing::info!(
            host = cpal::default_host().id().name(),
            "cpal backend initialized"
        );
        Self {
            host: cpal::default_host(),
        }
    }

    fn find_device(&self, name: Option<&str>, input: bool) -> Result<Option<cpal::Device>> {
        let Some(search) = name else {
            return Ok(if input {
                self.host.default_input_device()
            } else {
                self.host.default_output_device()
            });
        };

        let search_lower = search.to_lowercase();
        let mut devices = if input {
            self.host.input_devices()
        } else {
            self.host.output_devices()
        }
        .map_err(|e| Error::Stream(e.to_string()))?;

        devices
            .find(|device| {
                device_name(device)
                    .is_ok_and(|dev_name| dev_name.to_lowercase().contains(&search_lower))
            })
            .map(Some)
            .ok_or_else(|| Error::DeviceNotFound(format!("no device matching '{search}'")))
    }
}

impl Default for CpalBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioBackend for CpalBackend {
    fn name(&self) -> &'static str {
        "cpal"
    }

    fn start(&self, config: &StreamConfig, mut driver: StreamDriver) -> Result<StreamHandle> {
        config.check_driver(&driver)?;
        let output_device = self
            .find_device(config.device_name.as_deref(), false)?
            .ok_or(Error::NoDevice)?;
        let input_device = self.find_device(config.device_name.as_deref(), true)?;

        let stream_config = cpal::StreamConfig {
            channels: config.channels,
            sample_rate: config.sample_rate,
            buffer_size: cpal::BufferSize::Fixed(config.block_frames),
        };
        let capacity = config.block_frames as usize * config.channels as usize * RING_BLOCKS;
        let (mut producer, mut consumer) = RingBuffer::<f32>::new(capacity);
        let faults: IoFaultReporter = driver.io_faults();

        let input_stream = match input_device {
            Some(device) => {
                let overruns = faults.clone();
                let errors = faults.clone();
                let stream = device
                    .build_input_stream(
                        &stream_config,
                        move |data: &[f32], _: &cpal::InputCallbackInfo| {
                            let mut dropped = false;
                            for &sample in data {
                                dropped |= producer.push(sample).is_err();
                            }
                            if dropped {
                                overruns.report(IoFault::Overrun);
                            }
                        },
                        move |err| errors.report(stream_fault(&err)),
                        None,
                    )
                    .map_err(|e| Error::Stream(e.to_string()))?;
                stream.play().map_err(|e| Error::Stream(e.to_string()))?;
                Some(stream)
            }
            None => {
                tracing::warn!("no input device available, input nodes will read silence");
                None
            }
        };
        let has_input = input_stream.is_some();

        let underruns = faults.clone();
        let errors = faults;
        let output_stream = output_device
            .build_output_stream(
                &stream_config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    let missing = driver.process_output(data, || consumer.pop().ok());
                    if has_input && missing > 0 {
                        underruns.report(IoFault::Underrun);
                    }
                },
                move |err| errors.report(stream_fault(&err)),
                None,
            )
            .map_err(|e| Error::Stream(e.to_string()))?;
        output_stream
            .play()
            .map_err(|e| Error::Stream(e.to_string()))?;

        tracing::info!(
            channels = config.channels,
            sample_rate = config.sample_rate,
            block_frames = config.block_frames,
            duplex = has_input,
            "stream started"
        );
        Ok(StreamHandle::new((input_stream, output_stream)))
    }
}
