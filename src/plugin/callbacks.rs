// Callbacks - extern "C" entry points the core calls back into
//
// The host wraps every call into the core in `enter`, which publishes the
// session for the duration of that call. The trampolines below look it up,
// convert their raw arguments and hand over to the session. A callback that
// arrives outside such a call is ignored.

use super::session::Session;
use crate::environment::EnvCommand;
use crate::libretro::*;
use log::warn;
use std::cell::Cell;
use std::os::raw::{c_uint, c_void};
use std::ptr;

thread_local! {
    static ACTIVE: Cell<*mut Session> = const { Cell::new(ptr::null_mut()) };
}

/// Restores the previously active session when a core call ends
struct ScopeGuard {
    previous: *mut Session,
}

impl Drop for ScopeGuard {
    fn drop(&mut self) {
        ACTIVE.with(|active| active.set(self.previous));
    }
}

/// Run a call into the core with `session` reachable from its callbacks
///
/// The session must not be touched by `f` itself; callbacks get exclusive
/// access while the core runs.
pub fn enter<R>(session: &mut Session, f: impl FnOnce() -> R) -> R {
    let previous = ACTIVE.with(|active| active.replace(session as *mut Session));
    let _guard = ScopeGuard { previous };
    f()
}

fn with_session<R>(name: &str, f: impl FnOnce(&mut Session) -> R) -> Option<R> {
    let active = ACTIVE.with(Cell::get);
    if active.is_null() {
        warn!("Core called {} outside of a host call, ignored", name);
        return None;
    }
    // SAFETY: `enter` published this pointer from a live `&mut Session` for
    // the duration of the core call on this thread, and the host does not
    // use the session until the call returns. Callbacks do not nest.
    let session = unsafe { &mut *active };
    Some(f(session))
}

/// Environment dispatch
pub unsafe extern "C" fn environment(cmd: c_uint, data: *mut c_void) -> bool {
    let command = EnvCommand::decode(cmd, data);
    with_session("environment", |session| session.environment(command)).unwrap_or(false)
}

/// Video refresh: null and the hardware sentinel both mean dupe
pub unsafe extern "C" fn video_refresh(
    data: *const c_void,
    width: c_uint,
    height: c_uint,
    pitch: usize,
) {
    with_session("video_refresh", |session| {
        session.video_refresh_raw(data, width, height, pitch)
    });
}

pub unsafe extern "C" fn input_poll() {
    with_session("input_poll", Session::input_poll);
}

pub unsafe extern "C" fn input_state(
    port: c_uint,
    device: c_uint,
    index: c_uint,
    id: c_uint,
) -> i16 {
    with_session("input_state", |session| {
        session.input_state(port, device, index, id)
    })
    .unwrap_or(0)
}

pub unsafe extern "C" fn audio_sample(left: i16, right: i16) {
    with_session("audio_sample", |session| session.audio_sample(left, right));
}

pub unsafe extern "C" fn audio_sample_batch(data: *const i16, frames: usize) -> usize {
    if data.is_null() || frames == 0 {
        return 0;
    }
    let samples = std::slice::from_raw_parts(data, frames * 2);
    with_session("audio_sample_batch", |session| {
        session.audio_sample_batch(samples, frames)
    })
    .unwrap_or(frames)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PathsConfig;
    use crate::input::{InputBindingTable, InputSource};
    use crate::video::{HeadlessBackend, Presenter};
    use winit::keyboard::KeyCode;

    fn session() -> Session {
        Session::new(
            Presenter::new(Box::new(HeadlessBackend::new(64, 64))),
            InputSource::new(InputBindingTable::default(), KeyCode::Escape),
            &PathsConfig::default(),
        )
    }

    #[test]
    fn test_environment_through_scope() {
        let mut session = session();
        let mut can_dupe = false;
        let handled = enter(&mut session, || unsafe {
            environment(
                RETRO_ENVIRONMENT_GET_CAN_DUPE,
                &mut can_dupe as *mut bool as *mut c_void,
            )
        });

        assert!(handled);
        assert!(can_dupe);
        assert_eq!(session.stats().environment_calls, 1);
    }

    #[test]
    fn test_callbacks_outside_scope_are_ignored() {
        let mut can_dupe = false;
        let handled = unsafe {
            environment(
                RETRO_ENVIRONMENT_GET_CAN_DUPE,
                &mut can_dupe as *mut bool as *mut c_void,
            )
        };
        assert!(!handled);
        assert!(!can_dupe);
        assert_eq!(unsafe { input_state(0, RETRO_DEVICE_JOYPAD, 0, 0) }, 0);
    }

    #[test]
    fn test_hw_render_declined_through_scope() {
        let mut session = session();
        let mut descriptor = retro_hw_render_callback {
            context_type: RETRO_HW_CONTEXT_OPENGL,
            ..Default::default()
        };
        let handled = enter(&mut session, || unsafe {
            environment(
                RETRO_ENVIRONMENT_SET_HW_RENDER,
                &mut descriptor as *mut retro_hw_render_callback as *mut c_void,
            )
        });

        assert!(!handled);
        assert!(descriptor.get_current_framebuffer.is_none());
        assert!(descriptor.get_proc_address.is_none());
    }

    #[test]
    fn test_scope_restored_after_call() {
        let mut session = session();
        enter(&mut session, || ());
        assert!(ACTIVE.with(Cell::get).is_null());
    }

    #[test]
    fn test_audio_batch_through_scope() {
        let mut session = session();
        let samples = [0i16; 6];
        let consumed = enter(&mut session, || unsafe {
            audio_sample_batch(samples.as_ptr(), 3)
        });
        assert_eq!(consumed, 3);
        assert_eq!(session.stats().audio_frames, 3);
    }
}
