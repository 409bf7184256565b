// Session - Everything the core's callbacks can reach
//
// One session per loaded core. The extern "C" trampolines find it through
// the callback scope set up by the host around every core call; nothing in
// here is global.
//
// Errors cannot unwind through the core, so the first fatal error is
// stored and every later callback is ignored until the host collects it.

use crate::audio::{AudioSink, NullSink};
use crate::config::PathsConfig;
use crate::environment::{EnvCommand, EnvironmentRegistry};
use crate::error::HostError;
use crate::input::InputSource;
use crate::libretro::*;
use crate::video::{Frame, PixelFormat, Presenter, TextureStream};
use log::{debug, error, info, warn};
use std::os::raw::{c_uint, c_void};

/// Counters for callback traffic
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    pub environment_calls: u64,
    pub video_frames: u64,
    pub input_polls: u64,
    pub audio_frames: u64,
    pub audio_frames_dropped: u64,
}

/// State shared between the host and the core's callbacks
pub struct Session {
    registry: EnvironmentRegistry,
    presenter: Presenter,
    audio: Box<dyn AudioSink>,
    input: InputSource,
    av_change: Option<retro_system_av_info>,
    running: bool,
    failed: bool,
    fatal: Option<HostError>,
    stats: SessionStats,
}

impl Session {
    /// Create a session; audio goes nowhere until a sink is attached
    pub fn new(presenter: Presenter, input: InputSource, paths: &PathsConfig) -> Self {
        Self {
            registry: EnvironmentRegistry::new(&paths.system_directory, &paths.save_directory),
            presenter,
            audio: Box::new(NullSink::new()),
            input,
            av_change: None,
            running: true,
            failed: false,
            fatal: None,
            stats: SessionStats::default(),
        }
    }

    /// Answer one environment call
    pub fn environment(&mut self, command: EnvCommand<'_>) -> bool {
        if self.failed {
            return false;
        }
        self.stats.environment_calls += 1;

        match command {
            EnvCommand::GetCanDupe(out) => {
                *out = true;
                true
            }
            EnvCommand::Shutdown => {
                info!("Core requested shutdown");
                self.running = false;
                true
            }
            EnvCommand::GetSystemDirectory(out) => {
                *out = self.registry.system_directory();
                true
            }
            EnvCommand::GetSaveDirectory(out) => {
                *out = self.registry.save_directory();
                true
            }
            EnvCommand::SetPixelFormat(raw) => self.set_pixel_format(raw),
            EnvCommand::SetHwRender(descriptor) => {
                self.registry.request_hw_render(&descriptor);
                false
            }
            EnvCommand::GetVariableUpdate(out) => {
                *out = false;
                true
            }
            EnvCommand::SetFrameTimeCallback(raw) => {
                self.registry.register_frame_time(raw);
                true
            }
            EnvCommand::SetAudioCallback(raw) => {
                self.registry.register_audio(raw);
                true
            }
            EnvCommand::GetLogInterface => {
                debug!("Log interface declined, core logs to its own output");
                false
            }
            EnvCommand::SetSystemAvInfo(av) => match self.presenter.set_av_info(&av) {
                Ok(()) => {
                    self.av_change = Some(av);
                    true
                }
                Err(e) => {
                    self.fail(e);
                    false
                }
            },
            EnvCommand::SetGeometry(geometry) => match self.presenter.set_geometry(&geometry) {
                Ok(()) => true,
                Err(e) => {
                    warn!("Rejected geometry change: {}", e);
                    false
                }
            },
            EnvCommand::MissingPayload(cmd) => {
                warn!("Env #{} sent without a payload", cmd);
                false
            }
            EnvCommand::Unknown(cmd) => {
                self.registry.record_unhandled(cmd);
                false
            }
        }
    }

    fn set_pixel_format(&mut self, raw: c_uint) -> bool {
        let Some(format) = PixelFormat::from_raw(raw) else {
            warn!("Rejected unknown pixel format {}", raw);
            return false;
        };

        match self.presenter.set_pixel_format(format) {
            Ok(()) => true,
            Err(e) => {
                self.fail(e.into());
                false
            }
        }
    }

    /// Present one frame from the core
    pub fn video_refresh(&mut self, frame: Frame<'_>) {
        if self.failed {
            return;
        }
        self.stats.video_frames += 1;
        if let Err(e) = self.presenter.refresh(frame) {
            self.fail(e);
        }
    }

    /// Present a frame given as the core's raw callback arguments
    ///
    /// # Safety
    /// Unless `data` is null or the hardware sentinel, it must point to
    /// `height` rows of `pitch` bytes in the declared pixel format.
    pub unsafe fn video_refresh_raw(
        &mut self,
        data: *const c_void,
        width: u32,
        height: u32,
        pitch: usize,
    ) {
        if self.failed {
            return;
        }

        if data.is_null() {
            self.video_refresh(Frame::Dupe { width, height });
        } else if data == RETRO_HW_FRAME_BUFFER_VALID {
            // No hardware context was granted, nothing new to show
            debug!("Hardware frame without a context, redrawing previous frame");
            self.video_refresh(Frame::Dupe { width, height });
        } else {
            if let Err(e) = self.presenter.surface().validate_pitch(width, pitch) {
                self.fail(e.into());
                return;
            }
            let bpp = self.presenter.surface().pixel_format().bytes_per_pixel();
            let len = TextureStream::required_len(pitch, width, height, bpp);
            let bytes = std::slice::from_raw_parts(data as *const u8, len);
            self.video_refresh(Frame::Pixels {
                data: bytes,
                width,
                height,
                pitch,
            });
        }
    }

    /// Snapshot input devices for the core
    pub fn input_poll(&mut self) {
        if self.failed {
            return;
        }
        self.stats.input_polls += 1;
        if self.input.poll() && self.running {
            info!("Quit key pressed");
            self.running = false;
        }
    }

    /// State of one input, as of the last poll
    ///
    /// Only port 0 has a device: the joypad.
    pub fn input_state(&self, port: u32, device: u32, _index: u32, id: u32) -> i16 {
        if port != 0 || device & RETRO_DEVICE_MASK != RETRO_DEVICE_JOYPAD {
            return 0;
        }
        i16::from(self.input.joypad().pressed(id))
    }

    /// Forward a single stereo frame
    pub fn audio_sample(&mut self, left: i16, right: i16) {
        self.audio_sample_batch(&[left, right], 1);
    }

    /// Forward a batch of interleaved stereo frames
    ///
    /// Frames the sink cannot take are dropped. The return value counts all
    /// frames as consumed so cores never wait on the host.
    pub fn audio_sample_batch(&mut self, samples: &[i16], frames: usize) -> usize {
        if self.failed {
            return frames;
        }
        let accepted = self.audio.enqueue(samples, frames);
        self.stats.audio_frames += accepted as u64;
        if accepted < frames {
            self.stats.audio_frames_dropped += (frames - accepted) as u64;
        }
        frames
    }

    /// Collect the audio/video description set by the core since the last call
    pub fn take_av_change(&mut self) -> Option<retro_system_av_info> {
        self.av_change.take()
    }

    /// Record a fatal error and stop the loop
    ///
    /// Only the first error is kept.
    pub fn fail(&mut self, e: HostError) {
        if self.failed {
            debug!("Ignoring error after failure: {}", e);
            return;
        }
        error!("{}", e);
        self.failed = true;
        self.running = false;
        self.fatal = Some(e);
    }

    /// Collect the recorded fatal error, if any
    pub fn take_fatal(&mut self) -> Option<HostError> {
        self.fatal.take()
    }

    pub fn has_failed(&self) -> bool {
        self.failed
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Ask the loop to stop after the current iteration
    pub fn request_stop(&mut self) {
        self.running = false;
    }

    pub fn registry(&self) -> &EnvironmentRegistry {
        &self.registry
    }

    pub fn presenter(&self) -> &Presenter {
        &self.presenter
    }

    pub fn presenter_mut(&mut self) -> &mut Presenter {
        &mut self.presenter
    }

    pub fn input_mut(&mut self) -> &mut InputSource {
        &mut self.input
    }

    /// Replace the audio sink, closing the previous one
    pub fn set_audio_sink(&mut self, sink: Box<dyn AudioSink>) {
        self.audio.close();
        self.audio = sink;
    }

    pub fn audio_mut(&mut self) -> &mut dyn AudioSink {
        self.audio.as_mut()
    }

    pub fn stats(&self) -> SessionStats {
        self.stats
    }
}
