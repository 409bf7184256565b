// Audio module - Forwards core samples to an output device
//
// This module provides:
// - The `AudioSink` interface the host enqueues samples into
// - A bounded interleaved stereo sample queue
// - Cross-platform output using cpal (behind the `audio` feature)
// - A null sink for disabled audio and tests
//
// Samples are forwarded verbatim: no mixing, no resampling. The device is
// opened at the core's own sample rate.

pub mod buffer;
#[cfg(feature = "audio")]
pub mod output;

pub use buffer::SampleQueue;
#[cfg(feature = "audio")]
pub use output::CpalSink;

use crate::error::HostError;
use log::info;

/// Destination for the core's audio frames
pub trait AudioSink {
    /// Queue `frames` interleaved stereo frames from `samples`
    ///
    /// Returns the number of frames accepted. Never blocks.
    fn enqueue(&mut self, samples: &[i16], frames: usize) -> usize;

    /// Stop playback and drop anything queued
    fn close(&mut self);
}

/// Audio output configuration
#[derive(Debug, Clone)]
pub struct AudioConfig {
    /// Sample rate in Hz, taken from the core's timing
    pub sample_rate: u32,

    /// Queue length in milliseconds (affects latency)
    pub buffer_duration_ms: u32,
}

impl AudioConfig {
    /// Create a configuration for a core sample rate
    ///
    /// Default buffer duration: 100 ms
    pub fn new(sample_rate: f64) -> Self {
        Self {
            sample_rate: sample_rate.round().max(1.0) as u32,
            buffer_duration_ms: 100,
        }
    }

    /// Set the buffer duration in milliseconds
    pub fn with_buffer_duration(mut self, duration_ms: u32) -> Self {
        self.buffer_duration_ms = duration_ms.max(1);
        self
    }
}

/// Sink that accepts and discards everything
#[derive(Debug, Default)]
pub struct NullSink {
    frames: u64,
}

impl NullSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Frames accepted so far
    pub fn frames(&self) -> u64 {
        self.frames
    }
}

impl AudioSink for NullSink {
    fn enqueue(&mut self, samples: &[i16], frames: usize) -> usize {
        let accepted = frames.min(samples.len() / buffer::CHANNELS);
        self.frames += accepted as u64;
        accepted
    }

    fn close(&mut self) {}
}

/// Open the output device for a core sample rate
///
/// Failing to open an enabled device is fatal. With `enabled` false, or when
/// built without the `audio` feature, a [`NullSink`] is returned.
pub fn open_sink(config: AudioConfig, enabled: bool) -> Result<Box<dyn AudioSink>, HostError> {
    if !enabled {
        info!("Audio disabled, samples are discarded");
        return Ok(Box::new(NullSink::new()));
    }

    #[cfg(feature = "audio")]
    {
        let sink = CpalSink::open(config).map_err(HostError::Audio)?;
        Ok(Box::new(sink))
    }

    #[cfg(not(feature = "audio"))]
    {
        info!(
            "Built without audio support, discarding {} Hz output",
            config.sample_rate
        );
        Ok(Box::new(NullSink::new()))
    }
}
