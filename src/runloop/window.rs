// Window - winit application driving the frame loop
//
// The window is created hidden, the core is brought up against it, and the
// window is then sized to the core's geometry and shown. Every redraw runs
// one frame loop iteration.

use super::{FrameLoop, HostEvent};
use crate::audio::{open_sink, AudioConfig};
use crate::config::HostConfig;
use crate::error::HostError;
use crate::input::InputSource;
use crate::plugin::{CoreHost, DynamicCore, Session};
use crate::video::math::window_size_for;
use crate::video::{GpuInit, Presenter, WgpuBackend};
use log::info;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use winit::application::ApplicationHandler;
use winit::dpi::{LogicalSize, PhysicalSize};
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Fullscreen, Window, WindowId};

/// What to run
#[derive(Debug, Clone)]
pub struct HostLaunch {
    pub core_path: PathBuf,
    pub content_path: PathBuf,
    pub config: HostConfig,
}

/// The windowing side of the host
pub struct HostApp {
    launch: HostLaunch,
    window: Option<Arc<Window>>,
    frame_loop: Option<FrameLoop<DynamicCore>>,
    error: Option<HostError>,
}

impl HostApp {
    pub fn new(launch: HostLaunch) -> Self {
        Self {
            launch,
            window: None,
            frame_loop: None,
            error: None,
        }
    }

    /// The error that ended the session, if any
    pub fn take_error(&mut self) -> Option<HostError> {
        self.error.take()
    }

    fn start(&mut self, event_loop: &ActiveEventLoop) -> Result<(), HostError> {
        let config = &self.launch.config;

        let attributes = Window::default_attributes()
            .with_title("retro-host")
            .with_inner_size(LogicalSize::new(640, 480))
            .with_visible(false);
        let window = event_loop
            .create_window(attributes)
            .map_err(|e| HostError::Window(e.to_string()))?;
        let window = Arc::new(window);

        let backend = WgpuBackend::new(
            window.clone(),
            GpuInit {
                vsync: config.video.vsync,
                ..GpuInit::default()
            },
        )
        .map_err(HostError::Graphics)?;
        let presenter = Presenter::new(Box::new(backend));

        let bindings = config
            .input
            .keyboard
            .to_binding_table()
            .map_err(HostError::Config)?;
        let quit_key = config.input.quit_key().map_err(HostError::Config)?;
        let mut input = InputSource::new(bindings, quit_key);
        if config.input.gamepads {
            input = input.with_gamepads();
        }

        let session = Session::new(presenter, input, &config.paths);

        // SAFETY: the user chose to run this module as a libretro core
        let core = unsafe { DynamicCore::load(&self.launch.core_path)? };
        let mut host = CoreHost::load(core, session)?;
        host.init()?;
        host.load_content(&self.launch.content_path)?;

        let audio = config.audio.clone();
        host.configure(move |av| {
            let audio_config =
                AudioConfig::new(av.timing.sample_rate).with_buffer_duration(audio.buffer_ms);
            open_sink(audio_config, audio.enabled)
        })?;

        let (width, height) = window_size_for(&host.av_info().geometry, config.video.scale());
        window.set_title(&format!("retro-host {}", host.system_info().display_name()));
        if let Some(size) = window.request_inner_size(PhysicalSize::new(width, height)) {
            host.session_mut()
                .presenter_mut()
                .resize(size.width, size.height);
        }
        if config.video.fullscreen {
            window.set_fullscreen(Some(Fullscreen::Borderless(None)));
        }
        window.set_visible(true);

        info!(
            "Running {} at {}x{} ({}x scale)",
            host.system_info().display_name(),
            width,
            height,
            config.video.scale()
        );

        self.frame_loop = Some(FrameLoop::new(host));
        self.window = Some(window);
        Ok(())
    }

    fn push_event(&mut self, event: HostEvent) {
        if let Some(frame_loop) = self.frame_loop.as_mut() {
            frame_loop.push_event(event);
        }
    }

    fn step(&mut self, event_loop: &ActiveEventLoop) {
        let Some(frame_loop) = self.frame_loop.as_mut() else {
            return;
        };

        match frame_loop.iterate(Instant::now()) {
            Ok(true) => {}
            Ok(false) => self.finish(event_loop),
            Err(e) => {
                self.error = Some(e);
                self.finish(event_loop);
            }
        }
    }

    fn finish(&mut self, event_loop: &ActiveEventLoop) {
        if let Some(mut frame_loop) = self.frame_loop.take() {
            frame_loop.shutdown();
        }
        event_loop.exit();
    }
}

impl ApplicationHandler for HostApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() || self.error.is_some() {
            return;
        }

        if let Err(e) = self.start(event_loop) {
            self.error = Some(e);
            self.finish(event_loop);
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => self.push_event(HostEvent::Quit),
            WindowEvent::Resized(size) => self.push_event(HostEvent::Resize {
                width: size.width,
                height: size.height,
            }),
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key,
                        state,
                        ..
                    },
                ..
            } => match state {
                ElementState::Pressed => self.push_event(HostEvent::KeyPressed(physical_key)),
                ElementState::Released => self.push_event(HostEvent::KeyReleased(physical_key)),
            },
            WindowEvent::RedrawRequested => self.step(event_loop),
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(mut frame_loop) = self.frame_loop.take() {
            frame_loop.shutdown();
        }
    }
}

/// Run a core with content until it stops
pub fn run_host(launch: HostLaunch) -> Result<(), HostError> {
    let event_loop = EventLoop::new().map_err(|e| HostError::Window(e.to_string()))?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = HostApp::new(launch);
    event_loop
        .run_app(&mut app)
        .map_err(|e| HostError::Window(e.to_string()))?;

    match app.take_error() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
