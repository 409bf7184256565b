// Sample queue - Bounded ring buffer of interleaved stereo samples
//
// Written by the host thread from inside the core's run step and drained by
// the audio device callback. Full frames only: a stereo pair is never split.

/// Channels per frame
pub const CHANNELS: usize = 2;

/// Ring buffer of interleaved i16 samples
#[derive(Debug, Clone)]
pub struct SampleQueue {
    /// Internal ring buffer
    buffer: Vec<i16>,

    /// Read position
    read_pos: usize,

    /// Write position
    write_pos: usize,

    /// Number of samples in the buffer
    count: usize,
}

impl SampleQueue {
    /// Create a queue holding up to `frames` stereo frames
    pub fn new(frames: usize) -> Self {
        Self {
            buffer: vec![0; frames.max(1) * CHANNELS],
            read_pos: 0,
            write_pos: 0,
            count: 0,
        }
    }

    /// Create a queue sized for approximately N milliseconds at the given rate
    pub fn with_duration(milliseconds: u32, sample_rate: f64) -> Self {
        let frames = ((milliseconds as f64 / 1000.0) * sample_rate) as usize;
        Self::new(frames)
    }

    /// Append whole frames from `samples`
    ///
    /// Returns the number of frames accepted. Frames that do not fit are
    /// dropped; the caller never waits for the device.
    pub fn push_frames(&mut self, samples: &[i16], frames: usize) -> usize {
        let available = samples.len() / CHANNELS;
        let free = (self.buffer.len() - self.count) / CHANNELS;
        let accepted = frames.min(available).min(free);

        for &sample in &samples[..accepted * CHANNELS] {
            self.buffer[self.write_pos] = sample;
            self.write_pos = (self.write_pos + 1) % self.buffer.len();
        }
        self.count += accepted * CHANNELS;
        accepted
    }

    /// Pop one sample, `None` when empty
    pub fn pop(&mut self) -> Option<i16> {
        if self.count == 0 {
            return None;
        }

        let sample = self.buffer[self.read_pos];
        self.read_pos = (self.read_pos + 1) % self.buffer.len();
        self.count -= 1;
        Some(sample)
    }

    /// Buffered frames
    pub fn frames(&self) -> usize {
        self.count / CHANNELS
    }

    /// Capacity in frames
    pub fn capacity_frames(&self) -> usize {
        self.buffer.len() / CHANNELS
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Drop everything buffered
    pub fn clear(&mut self) {
        self.read_pos = 0;
        self.write_pos = 0;
        self.count = 0;
    }
}
