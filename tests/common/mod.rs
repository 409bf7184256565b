// Common test utilities for host integration tests
//
// This module provides a scripted in-process core. It implements `CoreApi`
// and talks to the host only through the callback pointers the host hands
// it, exactly like a loaded module would. Everything it observes is written
// to a per-thread event log.

#![allow(dead_code)]

use retro_host::audio::NullSink;
use retro_host::config::PathsConfig;
use retro_host::input::{InputBindingTable, InputSource};
use retro_host::libretro::*;
use retro_host::plugin::{CoreApi, CoreHost, Session, SystemInfo};
use retro_host::video::{HeadlessBackend, HeadlessProbe, Presenter};
use std::cell::{Cell, RefCell};
use std::fs;
use std::os::raw::{c_uint, c_void};
use std::path::PathBuf;
use winit::keyboard::KeyCode;

thread_local! {
    static EVENTS: RefCell<Vec<String>> = const { RefCell::new(Vec::new()) };
}

/// Append to this thread's event log
pub fn record(event: impl Into<String>) {
    EVENTS.with(|events| events.borrow_mut().push(event.into()));
}

/// Snapshot of this thread's event log
pub fn events() -> Vec<String> {
    EVENTS.with(|events| events.borrow().clone())
}

pub fn clear_events() {
    EVENTS.with(|events| events.borrow_mut().clear());
}

/// Whether `event` was recorded
pub fn saw(event: &str) -> bool {
    events().iter().any(|e| e == event)
}

/// Events starting with `prefix`
pub fn events_with_prefix(prefix: &str) -> Vec<String> {
    events()
        .into_iter()
        .filter(|e| e.starts_with(prefix))
        .collect()
}

unsafe extern "C" fn frame_time(usec: retro_usec_t) {
    record(format!("frame_time:{}", usec));
}

unsafe extern "C" fn audio_pull() {
    record("audio_pull");
}

unsafe extern "C" fn audio_set_state(enabled: bool) {
    record(format!("audio_state:{}", enabled));
}

unsafe extern "C" fn context_reset() {
    record("context_reset");
}

unsafe extern "C" fn context_destroy() {
    record("context_destroy");
}

/// What the scripted core emits from `run`
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScriptedFrame {
    /// A frame filled with one byte value, rows padded by `padding` bytes
    Pixels {
        width: u32,
        height: u32,
        padding: usize,
        fill: u8,
    },
    /// Null frame
    Dupe { width: u32, height: u32 },
    /// Hardware frame sentinel
    Hardware { width: u32, height: u32 },
    /// No video callback
    None,
}

/// Environment calls the scripted core makes
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScriptedCommand {
    SetPixelFormat(u32),
    SetGeometry(retro_game_geometry),
    SetSystemAvInfo(retro_system_av_info),
    SetHwRender(u32),
    Shutdown,
    /// Raw command with a null payload
    Raw(u32),
}

/// Behaviour of a scripted core
#[derive(Debug, Clone)]
pub struct CoreScript {
    pub api_version: u32,
    pub need_fullpath: bool,
    pub accept_content: bool,
    pub av_info: retro_system_av_info,
    /// Environment calls made from `init`
    pub on_init: Vec<ScriptedCommand>,
    /// Environment calls made from `load_game`
    pub on_load_game: Vec<ScriptedCommand>,
    /// Environment calls made from `run`, once per call, in order
    pub on_run: Vec<Vec<ScriptedCommand>>,
    /// Register the frame-time callback with this reference
    pub frame_time_reference: Option<retro_usec_t>,
    pub register_audio_callback: bool,
    /// Frames emitted from successive `run` calls; the last one repeats
    pub frames: Vec<ScriptedFrame>,
    /// Stereo frames sent through the batch callback per `run`
    pub audio_frames: usize,
}

impl Default for CoreScript {
    fn default() -> Self {
        Self {
            api_version: RETRO_API_VERSION,
            need_fullpath: false,
            accept_content: true,
            av_info: av_info((256, 224), (256, 224)),
            on_init: Vec::new(),
            on_load_game: Vec::new(),
            on_run: Vec::new(),
            frame_time_reference: None,
            register_audio_callback: false,
            frames: vec![ScriptedFrame::None],
            audio_frames: 0,
        }
    }
}

/// Timing and geometry with a 60 Hz, 44.1 kHz timing
pub fn av_info(base: (u32, u32), max: (u32, u32)) -> retro_system_av_info {
    retro_system_av_info {
        geometry: retro_game_geometry {
            base_width: base.0,
            base_height: base.1,
            max_width: max.0,
            max_height: max.1,
            aspect_ratio: 0.0,
        },
        timing: retro_system_timing {
            fps: 60.0,
            sample_rate: 44_100.0,
        },
    }
}

/// A core that follows a script
pub struct ScriptedCore {
    script: CoreScript,
    environment: Cell<Option<retro_environment_t>>,
    video_refresh: Cell<Option<retro_video_refresh_t>>,
    input_poll: Cell<Option<retro_input_poll_t>>,
    input_state: Cell<Option<retro_input_state_t>>,
    audio_sample: Cell<Option<retro_audio_sample_t>>,
    audio_sample_batch: Cell<Option<retro_audio_sample_batch_t>>,
    runs: Cell<usize>,
    pixels: RefCell<Vec<u8>>,
    pixel_format: Cell<u32>,
}

impl ScriptedCore {
    pub fn new(script: CoreScript) -> Self {
        Self {
            script,
            environment: Cell::new(None),
            video_refresh: Cell::new(None),
            input_poll: Cell::new(None),
            input_state: Cell::new(None),
            audio_sample: Cell::new(None),
            audio_sample_batch: Cell::new(None),
            runs: Cell::new(0),
            pixels: RefCell::new(Vec::new()),
            pixel_format: Cell::new(RETRO_PIXEL_FORMAT_0RGB1555),
        }
    }

    /// Every host callback was handed over
    pub fn fully_bound(&self) -> bool {
        self.environment.get().is_some()
            && self.video_refresh.get().is_some()
            && self.input_poll.get().is_some()
            && self.input_state.get().is_some()
            && self.audio_sample.get().is_some()
            && self.audio_sample_batch.get().is_some()
    }

    fn env(&self, cmd: c_uint, data: *mut c_void) -> bool {
        let environment = self.environment.get().expect("environment callback not set");
        let ok = unsafe { environment(cmd, data) };
        record(format!("env:{}:{}", cmd, ok));
        ok
    }

    fn send(&self, command: ScriptedCommand) -> bool {
        match command {
            ScriptedCommand::SetPixelFormat(format) => {
                let mut raw: c_uint = format;
                let ok = self.env(
                    RETRO_ENVIRONMENT_SET_PIXEL_FORMAT,
                    &mut raw as *mut c_uint as *mut c_void,
                );
                if ok {
                    self.pixel_format.set(format);
                }
                ok
            }
            ScriptedCommand::SetGeometry(mut geometry) => self.env(
                RETRO_ENVIRONMENT_SET_GEOMETRY,
                &mut geometry as *mut retro_game_geometry as *mut c_void,
            ),
            ScriptedCommand::SetSystemAvInfo(mut av) => self.env(
                RETRO_ENVIRONMENT_SET_SYSTEM_AV_INFO,
                &mut av as *mut retro_system_av_info as *mut c_void,
            ),
            ScriptedCommand::SetHwRender(context_type) => {
                let mut hw = retro_hw_render_callback {
                    context_type,
                    context_reset: Some(context_reset),
                    context_destroy: Some(context_destroy),
                    version_major: 3,
                    version_minor: 3,
                    ..Default::default()
                };
                let ok = self.env(
                    RETRO_ENVIRONMENT_SET_HW_RENDER,
                    &mut hw as *mut retro_hw_render_callback as *mut c_void,
                );
                if hw.get_current_framebuffer.is_some() || hw.get_proc_address.is_some() {
                    record("hw_entry_points");
                }
                ok
            }
            ScriptedCommand::Shutdown => self.env(RETRO_ENVIRONMENT_SHUTDOWN, std::ptr::null_mut()),
            ScriptedCommand::Raw(cmd) => self.env(cmd, std::ptr::null_mut()),
        }
    }

    fn bytes_per_pixel(&self) -> usize {
        match self.pixel_format.get() {
            RETRO_PIXEL_FORMAT_XRGB8888 => 4,
            _ => 2,
        }
    }

    fn emit_frame(&self, frame: ScriptedFrame) {
        let Some(video_refresh) = self.video_refresh.get() else {
            return;
        };

        match frame {
            ScriptedFrame::Pixels {
                width,
                height,
                padding,
                fill,
            } => {
                let pitch = width as usize * self.bytes_per_pixel() + padding;
                let mut pixels = self.pixels.borrow_mut();
                pixels.clear();
                pixels.resize(pitch * height as usize, fill);
                unsafe {
                    video_refresh(pixels.as_ptr() as *const c_void, width, height, pitch)
                };
            }
            ScriptedFrame::Dupe { width, height } => unsafe {
                video_refresh(std::ptr::null(), width, height, 0)
            },
            ScriptedFrame::Hardware { width, height } => unsafe {
                video_refresh(RETRO_HW_FRAME_BUFFER_VALID, width, height, 0)
            },
            ScriptedFrame::None => {}
        }
    }
}

impl CoreApi for ScriptedCore {
    fn api_version(&self) -> u32 {
        self.script.api_version
    }

    fn set_environment(&self, callback: retro_environment_t) {
        record("set_environment");
        self.environment.set(Some(callback));
        let mut can_dupe = false;
        self.env(
            RETRO_ENVIRONMENT_GET_CAN_DUPE,
            &mut can_dupe as *mut bool as *mut c_void,
        );
        record(format!("can_dupe:{}", can_dupe));
    }

    fn set_video_refresh(&self, callback: retro_video_refresh_t) {
        self.video_refresh.set(Some(callback));
    }

    fn set_input_poll(&self, callback: retro_input_poll_t) {
        self.input_poll.set(Some(callback));
    }

    fn set_input_state(&self, callback: retro_input_state_t) {
        self.input_state.set(Some(callback));
    }

    fn set_audio_sample(&self, callback: retro_audio_sample_t) {
        self.audio_sample.set(Some(callback));
    }

    fn set_audio_sample_batch(&self, callback: retro_audio_sample_batch_t) {
        self.audio_sample_batch.set(Some(callback));
    }

    fn init(&self) {
        record("init");
        for &command in &self.script.on_init {
            self.send(command);
        }

        if let Some(reference) = self.script.frame_time_reference {
            let mut callback = retro_frame_time_callback {
                callback: Some(frame_time),
                reference,
            };
            self.env(
                RETRO_ENVIRONMENT_SET_FRAME_TIME_CALLBACK,
                &mut callback as *mut retro_frame_time_callback as *mut c_void,
            );
        }

        if self.script.register_audio_callback {
            let mut callback = retro_audio_callback {
                callback: Some(audio_pull),
                set_state: Some(audio_set_state),
            };
            self.env(
                RETRO_ENVIRONMENT_SET_AUDIO_CALLBACK,
                &mut callback as *mut retro_audio_callback as *mut c_void,
            );
        }
    }

    fn deinit(&self) {
        record("deinit");
    }

    fn system_info(&self) -> SystemInfo {
        SystemInfo {
            library_name: "scripted".to_string(),
            library_version: "1.0".to_string(),
            valid_extensions: "bin".to_string(),
            need_fullpath: self.script.need_fullpath,
            block_extract: false,
        }
    }

    fn system_av_info(&self) -> retro_system_av_info {
        self.script.av_info
    }

    fn set_controller_port_device(&self, port: u32, device: u32) {
        record(format!("port:{}:{}", port, device));
    }

    fn reset(&self) {
        record("reset");
    }

    fn run(&self) {
        let run = self.runs.get();
        self.runs.set(run + 1);
        record("run");

        if let Some(input_poll) = self.input_poll.get() {
            unsafe { input_poll() };
        }
        if let Some(input_state) = self.input_state.get() {
            let start =
                unsafe { input_state(0, RETRO_DEVICE_JOYPAD, 0, RETRO_DEVICE_ID_JOYPAD_START) };
            if start != 0 {
                record("start_pressed");
            }
        }

        if let Some(commands) = self.script.on_run.get(run) {
            for &command in commands {
                self.send(command);
            }
        }

        let frame = self
            .script
            .frames
            .get(run)
            .or(self.script.frames.last())
            .copied()
            .unwrap_or(ScriptedFrame::None);
        self.emit_frame(frame);

        if self.script.audio_frames > 0 {
            if let Some(batch) = self.audio_sample_batch.get() {
                let samples = vec![0i16; self.script.audio_frames * 2];
                let consumed = unsafe { batch(samples.as_ptr(), self.script.audio_frames) };
                record(format!("audio_batch:{}", consumed));
            }
        }
    }

    fn load_game(&self, game: &retro_game_info) -> bool {
        record(format!(
            "load_game:{}:{}",
            if game.data.is_null() { "path" } else { "data" },
            game.size
        ));
        for &command in &self.script.on_load_game {
            self.send(command);
        }
        self.script.accept_content
    }

    fn unload_game(&self) {
        record("unload_game");
    }
}

/// A session drawing into a headless backend of the given window size
pub fn headless_session(width: u32, height: u32) -> (Session, HeadlessProbe) {
    let backend = HeadlessBackend::new(width, height);
    let probe = backend.probe();
    let input = InputSource::new(InputBindingTable::default(), KeyCode::Escape);
    let session = Session::new(
        Presenter::new(Box::new(backend)),
        input,
        &PathsConfig::default(),
    );
    (session, probe)
}

/// Write a small content file unique to `tag`
pub fn content_file(tag: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!(
        "retro_host_test_{}_{}.bin",
        std::process::id(),
        tag
    ));
    fs::write(&path, [0x4E, 0x45, 0x53, 0x1A, 0, 0, 0, 0]).expect("write content file");
    path
}

/// Load, init, load content and configure a scripted core
pub fn start_host(
    script: CoreScript,
    window: (u32, u32),
    tag: &str,
) -> (CoreHost<ScriptedCore>, HeadlessProbe) {
    clear_events();
    let (session, probe) = headless_session(window.0, window.1);
    let mut host = CoreHost::load(ScriptedCore::new(script), session).expect("load");
    host.init().expect("init");
    host.load_content(content_file(tag)).expect("load content");
    host.configure(|_| Ok(Box::new(NullSink::new())))
        .expect("configure");
    (host, probe)
}
