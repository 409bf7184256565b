// Environment negotiation tests
// Commands are issued by a scripted core through the real environment
// callback, so decoding, dispatch and registry updates are all exercised.

mod common;

use common::*;
use retro_host::audio::{AudioSink, NullSink};
use retro_host::libretro::*;
use retro_host::plugin::CoreHost;
use retro_host::video::{PixelFormat, VideoError};
use retro_host::HostError;
use std::cell::RefCell;
use std::rc::Rc;

#[test]
fn test_pixel_format_declared_during_init() {
    let script = CoreScript {
        on_init: vec![ScriptedCommand::SetPixelFormat(RETRO_PIXEL_FORMAT_XRGB8888)],
        ..CoreScript::default()
    };
    let (host, _probe) = start_host(script, (320, 240), "format_init");

    assert!(saw("env:10:true"));
    assert_eq!(
        host.session().presenter().surface().pixel_format(),
        PixelFormat::Xrgb8888
    );
}

#[test]
fn test_unknown_pixel_format_is_declined() {
    let script = CoreScript {
        on_init: vec![
            ScriptedCommand::SetPixelFormat(7),
            ScriptedCommand::SetPixelFormat(RETRO_PIXEL_FORMAT_RGB565),
        ],
        ..CoreScript::default()
    };
    let (host, _probe) = start_host(script, (320, 240), "format_unknown");

    assert_eq!(events_with_prefix("env:10:"), vec!["env:10:false", "env:10:true"]);
    assert_eq!(
        host.session().presenter().surface().pixel_format(),
        PixelFormat::Rgb565
    );
}

#[test]
fn test_format_change_after_texture_is_fatal_and_ignored() {
    let script = CoreScript {
        on_init: vec![ScriptedCommand::SetPixelFormat(RETRO_PIXEL_FORMAT_RGB565)],
        on_run: vec![vec![ScriptedCommand::SetPixelFormat(
            RETRO_PIXEL_FORMAT_XRGB8888,
        )]],
        ..CoreScript::default()
    };
    let (mut host, probe) = start_host(script, (320, 240), "format_locked");
    let before = host.session().presenter().surface().clone();

    let err = host.run_frame().unwrap_err();
    assert!(matches!(
        err,
        HostError::Usage(VideoError::FormatLocked {
            current: PixelFormat::Rgb565,
            requested: PixelFormat::Xrgb8888,
        })
    ));
    assert!(saw("env:10:false"));
    assert_eq!(*host.session().presenter().surface(), before);
    assert_eq!(probe.stats().textures_created, 1);
    assert!(!host.is_running());
}

#[test]
fn test_hw_render_before_pixel_format_keeps_format() {
    let script = CoreScript {
        on_init: vec![
            ScriptedCommand::SetHwRender(RETRO_HW_CONTEXT_OPENGL),
            ScriptedCommand::SetPixelFormat(RETRO_PIXEL_FORMAT_XRGB8888),
        ],
        ..CoreScript::default()
    };
    let (host, _probe) = start_host(script, (320, 240), "hw_first");

    assert_eq!(
        events_with_prefix("env:"),
        vec!["env:3:true", "env:14:false", "env:10:true"]
    );
    assert_eq!(
        host.session().presenter().surface().pixel_format(),
        PixelFormat::Xrgb8888
    );
    assert_eq!(
        host.session().registry().hw_declined().get(&RETRO_HW_CONTEXT_OPENGL),
        Some(&1)
    );
}

#[test]
fn test_every_hw_context_declined() {
    let script = CoreScript {
        on_init: vec![
            ScriptedCommand::SetHwRender(RETRO_HW_CONTEXT_OPENGL_CORE),
            ScriptedCommand::SetHwRender(RETRO_HW_CONTEXT_OPENGLES3),
            ScriptedCommand::SetHwRender(RETRO_HW_CONTEXT_VULKAN),
        ],
        ..CoreScript::default()
    };
    let (host, _probe) = start_host(script, (320, 240), "hw_every");

    assert_eq!(
        events_with_prefix("env:14:"),
        vec!["env:14:false", "env:14:false", "env:14:false"]
    );
    assert_eq!(host.session().registry().hw_declined().len(), 3);
    assert!(!saw("hw_entry_points"));
    assert!(!saw("context_reset"));
    assert!(host.is_running());
}

#[test]
fn test_unknown_commands_declined_and_recorded() {
    let script = CoreScript {
        on_init: vec![
            ScriptedCommand::Raw(52),
            ScriptedCommand::Raw(RETRO_ENVIRONMENT_EXPERIMENTAL | 0x2A),
            ScriptedCommand::Raw(RETRO_ENVIRONMENT_GET_LOG_INTERFACE),
            // Known command, no payload
            ScriptedCommand::Raw(RETRO_ENVIRONMENT_SET_PIXEL_FORMAT),
        ],
        ..CoreScript::default()
    };
    let (host, _probe) = start_host(script, (320, 240), "unknown");

    let unhandled = host.session().registry().unhandled();
    assert_eq!(unhandled.get(&52), Some(&1));
    assert_eq!(unhandled.get(&(RETRO_ENVIRONMENT_EXPERIMENTAL | 0x2A)), Some(&1));
    assert!(saw("env:27:false"));
    assert!(saw("env:10:false"));
    assert!(host.is_running());
}

#[test]
fn test_callback_registration_succeeds() {
    let script = CoreScript {
        frame_time_reference: Some(16_639),
        register_audio_callback: true,
        ..CoreScript::default()
    };
    let (host, _probe) = start_host(script, (320, 240), "registration");

    assert!(saw("env:21:true"));
    assert!(saw("env:22:true"));
    let registry = host.session().registry();
    assert_eq!(registry.frame_time().map(|f| f.reference), Some(16_639));
    assert!(registry.audio().is_some());
}

#[test]
fn test_geometry_change_keeps_texture() {
    let geometry = retro_game_geometry {
        base_width: 256,
        base_height: 239,
        max_width: 0,
        max_height: 0,
        aspect_ratio: 4.0 / 3.0,
    };
    let script = CoreScript {
        av_info: av_info((256, 224), (256, 240)),
        on_run: vec![vec![ScriptedCommand::SetGeometry(geometry)]],
        frames: vec![ScriptedFrame::Dupe {
            width: 256,
            height: 239,
        }],
        ..CoreScript::default()
    };
    let (mut host, probe) = start_host(script, (640, 480), "geometry");

    host.run_frame().unwrap();
    assert!(saw("env:37:true"));
    assert_eq!(probe.stats().textures_created, 1);

    let surface = host.session().presenter().surface();
    assert_eq!(surface.backing_size(), (256, 240));
    assert_eq!(surface.clip_size(), (256, 239));
    assert_eq!(surface.geometry().aspect_ratio, 4.0 / 3.0);
    // 4:3 content in a 4:3 window fills it
    let scale = host.session().presenter().projection().scale;
    assert!((scale.sx - 1.0).abs() < 1e-6);
    assert!((scale.sy - 1.0).abs() < 1e-6);
}

#[test]
fn test_geometry_beyond_backing_declined() {
    let geometry = retro_game_geometry {
        base_width: 512,
        base_height: 448,
        max_width: 0,
        max_height: 0,
        aspect_ratio: 0.0,
    };
    let script = CoreScript {
        on_run: vec![vec![ScriptedCommand::SetGeometry(geometry)]],
        ..CoreScript::default()
    };
    let (mut host, _probe) = start_host(script, (640, 480), "geometry_big");

    host.run_frame().unwrap();
    assert!(saw("env:37:false"));
    assert_eq!(host.session().presenter().surface().clip_size(), (256, 224));
}

#[test]
fn test_system_av_info_reallocates_on_new_max() {
    let script = CoreScript {
        on_run: vec![vec![ScriptedCommand::SetSystemAvInfo(av_info(
            (320, 240),
            (640, 480),
        ))]],
        ..CoreScript::default()
    };
    let (mut host, probe) = start_host(script, (640, 480), "av_info");

    host.run_frame().unwrap();
    assert!(saw("env:32:true"));
    assert_eq!(probe.stats().textures_created, 2);
    assert_eq!(probe.stats().textures_destroyed, 1);
    assert_eq!(
        host.session().presenter().surface().backing_size(),
        (640, 480)
    );
}

#[test]
fn test_system_av_info_sample_rate_reopens_audio() {
    let mut changed = av_info((256, 224), (256, 224));
    changed.timing.sample_rate = 32_000.0;
    let script = CoreScript {
        on_run: vec![
            vec![],
            vec![ScriptedCommand::SetSystemAvInfo(changed)],
            // Same rate again: nothing to reopen
            vec![ScriptedCommand::SetSystemAvInfo(changed)],
        ],
        ..CoreScript::default()
    };

    clear_events();
    let (session, _probe) = headless_session(640, 480);
    let mut host = CoreHost::load(ScriptedCore::new(script), session).unwrap();
    host.init().unwrap();
    host.load_content(content_file("av_rate")).unwrap();

    let opened = Rc::new(RefCell::new(Vec::new()));
    let rates = Rc::clone(&opened);
    host.configure(move |av| {
        rates.borrow_mut().push(av.timing.sample_rate);
        Ok(Box::new(NullSink::new()) as Box<dyn AudioSink>)
    })
    .unwrap();
    assert_eq!(*opened.borrow(), vec![44_100.0]);

    host.run_frame().unwrap();
    host.run_frame().unwrap();
    assert_eq!(host.av_info().timing.sample_rate, 32_000.0);
    assert_eq!(*opened.borrow(), vec![44_100.0, 32_000.0]);

    host.run_frame().unwrap();
    assert_eq!(opened.borrow().len(), 2);
    assert!(host.is_running());
}

#[test]
fn test_audio_reopen_failure_is_returned() {
    let mut changed = av_info((256, 224), (256, 224));
    changed.timing.sample_rate = 22_050.0;
    let script = CoreScript {
        on_run: vec![vec![ScriptedCommand::SetSystemAvInfo(changed)]],
        ..CoreScript::default()
    };

    clear_events();
    let (session, _probe) = headless_session(640, 480);
    let mut host = CoreHost::load(ScriptedCore::new(script), session).unwrap();
    host.init().unwrap();
    host.load_content(content_file("av_rate_fail")).unwrap();
    host.configure(|av| {
        if av.timing.sample_rate < 32_000.0 {
            return Err(HostError::Audio("rate not supported".to_string()));
        }
        Ok(Box::new(NullSink::new()) as Box<dyn AudioSink>)
    })
    .unwrap();

    assert!(host.run_frame().is_err());
}

#[test]
fn test_negotiation_before_content() {
    clear_events();
    let (session, _probe) = headless_session(320, 240);
    let script = CoreScript {
        on_load_game: vec![ScriptedCommand::SetPixelFormat(RETRO_PIXEL_FORMAT_RGB565)],
        ..CoreScript::default()
    };
    let mut host = CoreHost::load(ScriptedCore::new(script), session).unwrap();
    host.init().unwrap();
    host.load_content(content_file("negotiate_load")).unwrap();

    assert!(saw("env:10:true"));
    assert!(host.session().presenter().surface().format_declared());
}
