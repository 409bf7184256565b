// Plugin module - Loading and driving a core
//
// This module provides:
// - The `CoreApi` capability trait and a libloading-backed implementation
// - The session reachable from the core's callbacks
// - The extern "C" callback trampolines
// - Content loading
// - `CoreHost`, the lifecycle state machine
//
// Lifecycle: Unloaded -> Loaded -> Initialized -> Running -> Unloading -> Unloaded.
// Every call into the core runs inside a callback scope so the core can
// reach the session, and any fatal error recorded there is returned as soon
// as the call comes back.

pub mod api;
pub mod callbacks;
pub mod content;
pub mod dynamic;
pub mod session;

pub use api::{CoreApi, SystemInfo};
pub use content::LoadedContent;
pub use dynamic::DynamicCore;
pub use session::{Session, SessionStats};

use crate::audio::AudioSink;
use crate::error::HostError;
use crate::libretro::*;
use log::{debug, info, warn};
use std::path::Path;

/// Opens an audio sink for the core's timing
pub type AudioOpener =
    Box<dyn FnMut(&retro_system_av_info) -> Result<Box<dyn AudioSink>, HostError>>;

/// Where a core is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoreState {
    Unloaded,
    Loaded,
    Initialized,
    Running,
    Unloading,
}

impl std::fmt::Display for CoreState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            CoreState::Unloaded => "unloaded",
            CoreState::Loaded => "loaded",
            CoreState::Initialized => "initialized",
            CoreState::Running => "running",
            CoreState::Unloading => "unloading",
        };
        f.write_str(name)
    }
}

/// A loaded core and the session it talks to
pub struct CoreHost<C: CoreApi> {
    core: C,
    session: Session,
    state: CoreState,
    system_info: SystemInfo,
    av_info: retro_system_av_info,
    content: Option<LoadedContent>,
    initialized: bool,
    open_audio: Option<AudioOpener>,
}

impl<C: CoreApi> CoreHost<C> {
    /// Bind a core to a session and hand it the host callbacks
    ///
    /// Fails when the core implements a different API version.
    pub fn load(core: C, session: Session) -> Result<Self, HostError> {
        let version = core.api_version();
        if version != RETRO_API_VERSION {
            return Err(HostError::ApiVersion { found: version });
        }

        let mut host = Self {
            core,
            session,
            state: CoreState::Unloaded,
            system_info: SystemInfo::default(),
            av_info: retro_system_av_info::default(),
            content: None,
            initialized: false,
            open_audio: None,
        };

        let core = &host.core;
        callbacks::enter(&mut host.session, || {
            core.set_environment(callbacks::environment);
            core.set_video_refresh(callbacks::video_refresh);
            core.set_input_poll(callbacks::input_poll);
            core.set_input_state(callbacks::input_state);
            core.set_audio_sample(callbacks::audio_sample);
            core.set_audio_sample_batch(callbacks::audio_sample_batch);
        });
        host.system_info = callbacks::enter(&mut host.session, || core.system_info());
        host.state = CoreState::Loaded;
        host.check_fatal()?;

        info!(
            "Core {} (extensions: {}, need_fullpath: {})",
            host.system_info.display_name(),
            host.system_info.valid_extensions,
            host.system_info.need_fullpath
        );
        Ok(host)
    }

    /// Run the core's init entry point
    pub fn init(&mut self) -> Result<(), HostError> {
        self.expect_state("initialize", CoreState::Loaded)?;

        let core = &self.core;
        callbacks::enter(&mut self.session, || core.init());
        self.initialized = true;
        self.state = CoreState::Initialized;
        debug!("Core initialized");
        self.finish_call()
    }

    /// Hand content to the core
    ///
    /// The file is read into memory unless the core asked for a path.
    pub fn load_content<P: AsRef<Path>>(&mut self, path: P) -> Result<(), HostError> {
        self.expect_state("load content", CoreState::Initialized)?;
        if self.content.is_some() {
            return Err(HostError::InvalidState {
                operation: "load content twice",
                state: self.state,
            });
        }

        let path = path.as_ref();
        let content = LoadedContent::open(path, self.system_info.need_fullpath)?;
        let game = content.game_info();

        let core = &self.core;
        let accepted = callbacks::enter(&mut self.session, || core.load_game(&game));
        // The core may keep pointers into the content until unload_game
        self.content = Some(content);
        self.finish_call()?;

        if !accepted {
            self.content = None;
            return Err(HostError::ContentRejected {
                path: path.to_path_buf(),
            });
        }

        info!("Content {} loaded", path.display());
        Ok(())
    }

    /// Set up video, audio and input after content loads
    ///
    /// `open_audio` receives the core's timing and returns the sink to feed.
    /// It is kept and called again whenever the core changes its sample rate.
    pub fn configure<F>(&mut self, open_audio: F) -> Result<(), HostError>
    where
        F: FnMut(&retro_system_av_info) -> Result<Box<dyn AudioSink>, HostError> + 'static,
    {
        self.expect_state("configure", CoreState::Initialized)?;
        if self.content.is_none() {
            return Err(HostError::InvalidState {
                operation: "configure without content",
                state: self.state,
            });
        }

        let core = &self.core;
        let av = callbacks::enter(&mut self.session, || core.system_av_info());
        self.check_fatal()?;
        // The query result supersedes anything set during load_game
        self.session.take_av_change();
        self.session.presenter_mut().configure(&av)?;
        self.av_info = av;

        let mut open_audio: AudioOpener = Box::new(open_audio);
        let sink = open_audio(&av)?;
        self.session.set_audio_sink(sink);
        self.open_audio = Some(open_audio);
        if let Some(set_state) = self.session.registry().audio().and_then(|a| a.set_state) {
            callbacks::enter(&mut self.session, || unsafe { set_state(true) });
        }

        let core = &self.core;
        callbacks::enter(&mut self.session, || {
            core.set_controller_port_device(0, RETRO_DEVICE_JOYPAD)
        });

        self.state = CoreState::Running;
        self.finish_call()
    }

    /// Run one emulation step
    pub fn run_frame(&mut self) -> Result<(), HostError> {
        self.expect_state("run a frame", CoreState::Running)?;
        let core = &self.core;
        callbacks::enter(&mut self.session, || core.run());
        self.finish_call()
    }

    /// Reset the running game
    pub fn reset(&mut self) -> Result<(), HostError> {
        self.expect_state("reset", CoreState::Running)?;
        let core = &self.core;
        callbacks::enter(&mut self.session, || core.reset());
        info!("Core reset");
        self.finish_call()
    }

    /// Invoke the frame-pacing callback, if registered
    pub fn notify_frame_time(&mut self, usec: retro_usec_t) -> Result<(), HostError> {
        if let Some(frame_time) = self.session.registry().frame_time() {
            let callback = frame_time.callback;
            callbacks::enter(&mut self.session, || unsafe { callback(usec) });
        }
        self.finish_call()
    }

    /// Invoke the audio-pull callback, if registered
    pub fn pull_audio(&mut self) -> Result<(), HostError> {
        if let Some(audio) = self.session.registry().audio() {
            let callback = audio.callback;
            callbacks::enter(&mut self.session, || unsafe { callback() });
        }
        self.finish_call()
    }

    /// Tear the core down, skipping steps whose setup never happened
    ///
    /// Safe to call in any state and more than once.
    pub fn unload(&mut self) {
        if self.state == CoreState::Unloaded {
            return;
        }
        self.state = CoreState::Unloading;

        if let Some(set_state) = self.session.registry().audio().and_then(|a| a.set_state) {
            callbacks::enter(&mut self.session, || unsafe { set_state(false) });
        }
        self.session.audio_mut().close();
        self.open_audio = None;

        let core = &self.core;
        if self.content.take().is_some() {
            callbacks::enter(&mut self.session, || core.unload_game());
        }

        if self.initialized {
            callbacks::enter(&mut self.session, || core.deinit());
            self.initialized = false;
        }

        self.session.presenter_mut().shutdown();
        if let Some(e) = self.session.take_fatal() {
            warn!("Core reported an error during teardown: {}", e);
        }

        self.state = CoreState::Unloaded;
        info!("Core unloaded");
    }

    pub fn state(&self) -> CoreState {
        self.state
    }

    pub fn system_info(&self) -> &SystemInfo {
        &self.system_info
    }

    /// Timing and geometry, including changes the core made while running
    pub fn av_info(&self) -> &retro_system_av_info {
        &self.av_info
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    pub fn core(&self) -> &C {
        &self.core
    }

    /// Whether the loop should keep going
    pub fn is_running(&self) -> bool {
        self.state == CoreState::Running && self.session.is_running()
    }

    fn expect_state(&self, operation: &'static str, expected: CoreState) -> Result<(), HostError> {
        if self.state != expected {
            return Err(HostError::InvalidState {
                operation,
                state: self.state,
            });
        }
        Ok(())
    }

    fn check_fatal(&mut self) -> Result<(), HostError> {
        match self.session.take_fatal() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Collect the outcome of a core call: its fatal error, then any new timing
    fn finish_call(&mut self) -> Result<(), HostError> {
        self.check_fatal()?;
        match self.session.take_av_change() {
            Some(av) => self.apply_av_change(av),
            None => Ok(()),
        }
    }

    fn apply_av_change(&mut self, av: retro_system_av_info) -> Result<(), HostError> {
        let previous = self.av_info.timing.sample_rate;
        self.av_info = av;
        if self.state != CoreState::Running || av.timing.sample_rate == previous {
            return Ok(());
        }

        if let Some(open_audio) = self.open_audio.as_mut() {
            info!(
                "Sample rate changed from {:.0} to {:.0} Hz, reopening audio",
                previous, av.timing.sample_rate
            );
            let sink = open_audio(&av)?;
            self.session.set_audio_sink(sink);
        }
        Ok(())
    }
}

impl<C: CoreApi> Drop for CoreHost<C> {
    fn drop(&mut self) {
        self.unload();
    }
}
