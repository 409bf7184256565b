// Run loop - Drives a running core one iteration at a time
//
// Each iteration, in order: frame pacing callback with the elapsed time,
// audio-pull callback, queued window/input events, one run step. There is
// no throttling here; presentation (vsync) is the only brake.

pub mod window;

pub use window::{run_host, HostApp, HostLaunch};

use crate::error::HostError;
use crate::libretro::retro_usec_t;
use crate::plugin::{CoreApi, CoreHost};
use log::{debug, info};
use std::collections::VecDeque;
use std::time::Instant;
use winit::keyboard::PhysicalKey;

/// Elapsed-time source for the frame-pacing callback
#[derive(Debug, Default)]
pub struct FramePacer {
    last: Option<Instant>,
}

impl FramePacer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Microseconds since the previous tick
    ///
    /// The first tick has nothing to measure against and reports `reference`.
    pub fn tick(&mut self, now: Instant, reference: retro_usec_t) -> retro_usec_t {
        let delta = match self.last {
            Some(last) => {
                let micros = now.saturating_duration_since(last).as_micros();
                retro_usec_t::try_from(micros).unwrap_or(retro_usec_t::MAX)
            }
            None => reference,
        };
        self.last = Some(now);
        delta
    }
}

/// Notifications from the windowing side
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostEvent {
    Quit,
    Resize { width: u32, height: u32 },
    KeyPressed(PhysicalKey),
    KeyReleased(PhysicalKey),
}

/// Single-threaded frame loop around a configured core
pub struct FrameLoop<C: CoreApi> {
    host: CoreHost<C>,
    pacer: FramePacer,
    events: VecDeque<HostEvent>,
    iterations: u64,
}

impl<C: CoreApi> FrameLoop<C> {
    pub fn new(host: CoreHost<C>) -> Self {
        Self {
            host,
            pacer: FramePacer::new(),
            events: VecDeque::new(),
            iterations: 0,
        }
    }

    /// Queue an event for the next iteration
    pub fn push_event(&mut self, event: HostEvent) {
        self.events.push_back(event);
    }

    /// Run one iteration
    ///
    /// # Returns
    /// `Ok(true)` while the loop should continue
    pub fn iterate(&mut self, now: Instant) -> Result<bool, HostError> {
        if !self.host.is_running() {
            return Ok(false);
        }

        if let Some(frame_time) = self.host.session().registry().frame_time() {
            let usec = self.pacer.tick(now, frame_time.reference);
            self.host.notify_frame_time(usec)?;
        }

        self.host.pull_audio()?;

        while let Some(event) = self.events.pop_front() {
            self.handle_event(event);
        }

        if !self.host.is_running() {
            info!("Stopping after {} iterations", self.iterations);
            return Ok(false);
        }

        self.host.run_frame()?;
        self.iterations += 1;
        Ok(self.host.is_running())
    }

    fn handle_event(&mut self, event: HostEvent) {
        let session = self.host.session_mut();
        match event {
            HostEvent::Quit => {
                debug!("Quit requested");
                session.request_stop();
            }
            HostEvent::Resize { width, height } => {
                session.presenter_mut().resize(width, height);
            }
            HostEvent::KeyPressed(key) => session.input_mut().handle_key_press(key),
            HostEvent::KeyReleased(key) => session.input_mut().handle_key_release(key),
        }
    }

    /// Iterations that ran the core
    pub fn iterations(&self) -> u64 {
        self.iterations
    }

    pub fn host(&self) -> &CoreHost<C> {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut CoreHost<C> {
        &mut self.host
    }

    /// Tear the core down
    pub fn shutdown(&mut self) {
        self.host.unload();
    }
}
