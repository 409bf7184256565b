// Presentation tests
// Frames travel from a scripted core through the video refresh callback
// into the presenter and a headless backend.

mod common;

use common::*;
use retro_host::libretro::*;
use retro_host::video::{letterbox_scale, PixelFormat, UvRect, VideoError};
use retro_host::HostError;

#[test]
fn test_end_to_end_scenario() {
    let script = CoreScript {
        av_info: av_info((256, 224), (512, 448)),
        on_init: vec![ScriptedCommand::SetPixelFormat(RETRO_PIXEL_FORMAT_XRGB8888)],
        frames: vec![ScriptedFrame::Pixels {
            width: 256,
            height: 224,
            padding: 0,
            fill: 0x80,
        }],
        ..CoreScript::default()
    };
    let (mut host, probe) = start_host(script, (800, 600), "end_to_end");

    let surface = host.session().presenter().surface();
    assert_eq!(surface.backing_size(), (512, 448));
    assert_eq!(
        surface.uv_rect(),
        UvRect {
            u_min: 0.0,
            v_min: 0.0,
            u_max: 0.5,
            v_max: 0.5
        }
    );

    host.run_frame().unwrap();

    let scale = host.session().presenter().projection().scale;
    let expected = (256.0 / 224.0) / (800.0 / 600.0);
    assert!((scale.sx - expected).abs() < 1e-4);
    assert!((scale.sx - 0.857).abs() < 1e-3);
    assert_eq!(scale.sy, 1.0);

    assert_eq!(probe.texcoords().u_max, 0.5);
    assert_eq!(probe.texcoords().v_max, 0.5);
    assert_eq!(probe.viewport().width, 800);
    assert_eq!(probe.viewport().height, 600);
    assert_eq!(probe.stats().uploads, 1);
    assert_eq!(probe.last_row_bytes(), 256 * 4);
}

#[test]
fn test_dupe_frame_redraws_previous_content() {
    let script = CoreScript {
        on_init: vec![ScriptedCommand::SetPixelFormat(RETRO_PIXEL_FORMAT_RGB565)],
        av_info: av_info((16, 8), (16, 8)),
        frames: vec![
            ScriptedFrame::Pixels {
                width: 16,
                height: 8,
                padding: 4,
                fill: 0xFF,
            },
            ScriptedFrame::Dupe {
                width: 16,
                height: 8,
            },
        ],
        ..CoreScript::default()
    };
    let (mut host, probe) = start_host(script, (320, 240), "dupe");

    host.run_frame().unwrap();
    let uploads = probe.stats().uploads;
    let shown = probe.last_frame();
    assert!(shown.iter().all(|&b| b == 0xFF));

    host.run_frame().unwrap();
    host.run_frame().unwrap();

    assert_eq!(probe.stats().uploads, uploads);
    assert_eq!(probe.last_frame(), shown);
    assert_eq!(probe.stats().frames, 3);
    assert_eq!(host.session().presenter().stats().dupes, 2);
}

#[test]
fn test_hardware_sentinel_without_context_redraws() {
    let script = CoreScript {
        on_init: vec![ScriptedCommand::SetHwRender(RETRO_HW_CONTEXT_OPENGLES3)],
        frames: vec![ScriptedFrame::Hardware {
            width: 256,
            height: 224,
        }],
        ..CoreScript::default()
    };
    let (mut host, probe) = start_host(script, (320, 240), "hw_frames");
    assert!(saw("env:14:false"));

    host.run_frame().unwrap();
    host.run_frame().unwrap();
    assert_eq!(probe.stats().uploads, 0);
    assert_eq!(probe.stats().frames, 2);
    assert_eq!(host.session().presenter().stats().dupes, 2);
}

#[test]
fn test_dupe_frame_size_updates_clip() {
    let script = CoreScript {
        av_info: av_info((256, 224), (256, 240)),
        frames: vec![
            ScriptedFrame::Pixels {
                width: 256,
                height: 224,
                padding: 0,
                fill: 0,
            },
            ScriptedFrame::Dupe {
                width: 256,
                height: 240,
            },
        ],
        ..CoreScript::default()
    };
    let (mut host, probe) = start_host(script, (640, 480), "dupe_clip");

    host.run_frame().unwrap();
    let texcoord_uploads = probe.stats().texcoord_uploads;
    host.run_frame().unwrap();

    assert_eq!(host.session().presenter().surface().clip_size(), (256, 240));
    assert_eq!(probe.stats().texcoord_uploads, texcoord_uploads + 1);
    assert_eq!(probe.stats().uploads, 1);
}

#[test]
fn test_first_frame_without_format_uses_default() {
    let script = CoreScript {
        av_info: av_info((8, 8), (8, 8)),
        frames: vec![ScriptedFrame::Pixels {
            width: 8,
            height: 8,
            padding: 0,
            fill: 0,
        }],
        ..CoreScript::default()
    };
    let (mut host, probe) = start_host(script, (320, 240), "default_format");

    host.run_frame().unwrap();
    let surface = host.session().presenter().surface();
    assert_eq!(surface.pixel_format(), PixelFormat::Xrgb1555);
    assert!(surface.format_declared());
    assert_eq!(probe.stats().uploads, 1);
    // 1555 frames are expanded to 4 bytes per texel
    assert_eq!(probe.last_row_bytes(), 8 * 4);
}

#[test]
fn test_shrinking_clip_updates_texcoords_once() {
    let frame = |width, height| ScriptedFrame::Pixels {
        width,
        height,
        padding: 0,
        fill: 1,
    };
    let script = CoreScript {
        on_init: vec![ScriptedCommand::SetPixelFormat(RETRO_PIXEL_FORMAT_XRGB8888)],
        av_info: av_info((64, 64), (64, 64)),
        frames: vec![frame(64, 64), frame(32, 16), frame(32, 16)],
        ..CoreScript::default()
    };
    let (mut host, probe) = start_host(script, (320, 240), "clip");

    host.run_frame().unwrap();
    assert_eq!(probe.stats().texcoord_uploads, 1);
    assert_eq!(probe.texcoords(), UvRect::FULL);

    host.run_frame().unwrap();
    host.run_frame().unwrap();
    assert_eq!(probe.stats().texcoord_uploads, 2);
    assert_eq!(probe.texcoords().u_max, 0.5);
    assert_eq!(probe.texcoords().v_max, 0.25);
    assert_eq!(probe.stats().textures_created, 1);
}

#[test]
fn test_padded_pitch_is_accepted() {
    let script = CoreScript {
        on_init: vec![ScriptedCommand::SetPixelFormat(RETRO_PIXEL_FORMAT_XRGB8888)],
        av_info: av_info((10, 4), (10, 4)),
        frames: vec![ScriptedFrame::Pixels {
            width: 10,
            height: 4,
            padding: 24,
            fill: 3,
        }],
        ..CoreScript::default()
    };
    let (mut host, probe) = start_host(script, (320, 240), "pitch");

    host.run_frame().unwrap();
    assert_eq!(host.session().presenter().surface().pitch(), 64);
    assert_eq!(probe.last_row_bytes(), 64);
}

#[test]
fn test_frame_beyond_backing_is_fatal() {
    let script = CoreScript {
        on_init: vec![ScriptedCommand::SetPixelFormat(RETRO_PIXEL_FORMAT_XRGB8888)],
        av_info: av_info((8, 8), (8, 8)),
        frames: vec![ScriptedFrame::Pixels {
            width: 16,
            height: 8,
            padding: 0,
            fill: 0,
        }],
        ..CoreScript::default()
    };
    let (mut host, _probe) = start_host(script, (320, 240), "oversized");

    assert!(matches!(
        host.run_frame(),
        Err(HostError::Usage(VideoError::ClipExceedsBacking { .. }))
    ));
    assert!(!host.is_running());
}

#[test]
fn test_uv_rectangle_property() {
    let script = CoreScript {
        on_init: vec![ScriptedCommand::SetPixelFormat(RETRO_PIXEL_FORMAT_RGB565)],
        av_info: av_info((40, 30), (40, 30)),
        ..CoreScript::default()
    };
    let (host, _probe) = start_host(script, (320, 240), "uv_property");
    let mut surface = host.session().presenter().surface().clone();

    for w in 1..=40u32 {
        for h in 1..=30u32 {
            surface.set_clip(w, h).unwrap();
            let uv = surface.uv_rect();
            assert_eq!((uv.u_min, uv.v_min), (0.0, 0.0));
            assert_eq!(uv.u_max, w as f32 / 40.0);
            assert_eq!(uv.v_max, h as f32 / 30.0);
        }
    }

    surface.set_clip(40, 30).unwrap();
    assert_eq!(surface.uv_rect(), UvRect::FULL);
}

#[test]
fn test_letterbox_invariant() {
    let windows = [(800, 600), (1920, 1080), (600, 800), (256, 224), (1, 1000), (1000, 1)];
    let aspects = [256.0 / 224.0, 4.0 / 3.0, 16.0 / 9.0, 0.75, 1.0];

    for &(w, h) in &windows {
        for &a0 in &aspects {
            let scale = letterbox_scale(w, h, a0);
            let a = w as f32 / h as f32;

            assert!(scale.sx <= 1.0 && scale.sy <= 1.0);
            assert!(scale.sx == 1.0 || scale.sy == 1.0);
            if a == a0 {
                assert_eq!((scale.sx, scale.sy), (1.0, 1.0));
            } else {
                assert!(scale.sx < 1.0 || scale.sy < 1.0, "{}x{} at {}", w, h, a0);
            }
        }
    }
}
