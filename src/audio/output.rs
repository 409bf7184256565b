// Audio output - Plays queued core samples through cpal
//
// The core hands over interleaved stereo i16 frames; the device callback
// drains them as f32 and pads with silence when the queue runs dry.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Stream, StreamConfig};
use log::{error, info, warn};
use std::sync::{Arc, Mutex};

use super::buffer::{SampleQueue, CHANNELS};
use super::{AudioConfig, AudioSink};

/// Audio sink backed by the default cpal output device
pub struct CpalSink {
    /// Audio configuration
    config: AudioConfig,

    /// Audio stream, kept alive for playback
    stream: Stream,

    /// Queue shared with the device callback
    queue: Arc<Mutex<SampleQueue>>,
}

impl CpalSink {
    /// Open the default output device at the core's sample rate
    ///
    /// # Returns
    /// Result containing the sink or an error message
    pub fn open(config: AudioConfig) -> Result<Self, String> {
        let host = cpal::default_host();

        let device = host
            .default_output_device()
            .ok_or("No output device available")?;

        info!("Audio device: {}", device.name().unwrap_or_default());

        let stream_config = StreamConfig {
            channels: CHANNELS as u16,
            sample_rate: cpal::SampleRate(config.sample_rate),
            buffer_size: cpal::BufferSize::Default,
        };

        let queue = Arc::new(Mutex::new(SampleQueue::with_duration(
            config.buffer_duration_ms,
            config.sample_rate as f64,
        )));
        let device_queue = Arc::clone(&queue);

        let stream = device
            .build_output_stream(
                &stream_config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    let Ok(mut queue) = device_queue.lock() else {
                        data.fill(0.0);
                        return;
                    };
                    for sample in data.iter_mut() {
                        *sample = queue.pop().map_or(0.0, |s| s as f32 / 32768.0);
                    }
                },
                move |err| {
                    error!("Audio stream error: {}", err);
                },
                None,
            )
            .map_err(|e| format!("Failed to build audio stream: {}", e))?;

        stream
            .play()
            .map_err(|e| format!("Failed to start audio stream: {}", e))?;

        info!(
            "Audio output initialized: {} Hz, {} channels, {} ms buffer",
            config.sample_rate, CHANNELS, config.buffer_duration_ms
        );

        Ok(Self {
            config,
            stream,
            queue,
        })
    }

    /// Get the audio configuration
    pub fn config(&self) -> &AudioConfig {
        &self.config
    }

    /// Frames waiting for the device
    pub fn queued_frames(&self) -> usize {
        self.queue.lock().map(|q| q.frames()).unwrap_or(0)
    }
}

impl AudioSink for CpalSink {
    fn enqueue(&mut self, samples: &[i16], frames: usize) -> usize {
        match self.queue.lock() {
            Ok(mut queue) => queue.push_frames(samples, frames),
            Err(_) => 0,
        }
    }

    fn close(&mut self) {
        if let Err(e) = self.stream.pause() {
            warn!("Failed to pause audio stream: {}", e);
        }
        if let Ok(mut queue) = self.queue.lock() {
            queue.clear();
        }
    }
}
