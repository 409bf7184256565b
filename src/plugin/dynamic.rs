// Dynamic core - Entry points resolved from a shared library
//
// Every mandatory symbol is looked up before a `DynamicCore` is returned, so
// no caller ever sees a partially bound core. The library stays open for as
// long as the function pointers copied out of it.

use super::api::{CoreApi, SystemInfo};
use crate::error::HostError;
use crate::libretro::*;
use libloading::Library;
use log::{debug, info};
use std::os::raw::c_uint;
use std::path::{Path, PathBuf};

type VoidFn = unsafe extern "C" fn();
type ApiVersionFn = unsafe extern "C" fn() -> c_uint;
type SystemInfoFn = unsafe extern "C" fn(info: *mut retro_system_info);
type AvInfoFn = unsafe extern "C" fn(info: *mut retro_system_av_info);
type PortDeviceFn = unsafe extern "C" fn(port: c_uint, device: c_uint);
type LoadGameFn = unsafe extern "C" fn(game: *const retro_game_info) -> bool;
type SetEnvironmentFn = unsafe extern "C" fn(retro_environment_t);
type SetVideoRefreshFn = unsafe extern "C" fn(retro_video_refresh_t);
type SetInputPollFn = unsafe extern "C" fn(retro_input_poll_t);
type SetInputStateFn = unsafe extern "C" fn(retro_input_state_t);
type SetAudioSampleFn = unsafe extern "C" fn(retro_audio_sample_t);
type SetAudioSampleBatchFn = unsafe extern "C" fn(retro_audio_sample_batch_t);

/// Copied entry points of one core
struct CoreSymbols {
    init: VoidFn,
    deinit: VoidFn,
    api_version: ApiVersionFn,
    get_system_info: SystemInfoFn,
    get_system_av_info: AvInfoFn,
    set_controller_port_device: PortDeviceFn,
    reset: VoidFn,
    run: VoidFn,
    load_game: LoadGameFn,
    unload_game: VoidFn,
    set_environment: SetEnvironmentFn,
    set_video_refresh: SetVideoRefreshFn,
    set_input_poll: SetInputPollFn,
    set_input_state: SetInputStateFn,
    set_audio_sample: SetAudioSampleFn,
    set_audio_sample_batch: SetAudioSampleBatchFn,
}

impl CoreSymbols {
    unsafe fn resolve(library: &Library) -> Result<Self, HostError> {
        Ok(Self {
            init: symbol(library, "retro_init")?,
            deinit: symbol(library, "retro_deinit")?,
            api_version: symbol(library, "retro_api_version")?,
            get_system_info: symbol(library, "retro_get_system_info")?,
            get_system_av_info: symbol(library, "retro_get_system_av_info")?,
            set_controller_port_device: symbol(library, "retro_set_controller_port_device")?,
            reset: symbol(library, "retro_reset")?,
            run: symbol(library, "retro_run")?,
            load_game: symbol(library, "retro_load_game")?,
            unload_game: symbol(library, "retro_unload_game")?,
            set_environment: symbol(library, "retro_set_environment")?,
            set_video_refresh: symbol(library, "retro_set_video_refresh")?,
            set_input_poll: symbol(library, "retro_set_input_poll")?,
            set_input_state: symbol(library, "retro_set_input_state")?,
            set_audio_sample: symbol(library, "retro_set_audio_sample")?,
            set_audio_sample_batch: symbol(library, "retro_set_audio_sample_batch")?,
        })
    }
}

unsafe fn symbol<T: Copy>(library: &Library, name: &'static str) -> Result<T, HostError> {
    match library.get::<T>(name.as_bytes()) {
        Ok(sym) => {
            debug!("Resolved {}", name);
            Ok(*sym)
        }
        Err(_) => Err(HostError::MissingSymbol { name }),
    }
}

/// A core loaded from a shared library
pub struct DynamicCore {
    path: PathBuf,
    symbols: CoreSymbols,
    // Dropped last: the symbols point into it
    _library: Library,
}

impl DynamicCore {
    /// Open a core module and resolve its entry points
    ///
    /// # Safety
    /// Loading runs the library's initialisers, and the resolved symbols are
    /// trusted to have the libretro signatures.
    pub unsafe fn load<P: AsRef<Path>>(path: P) -> Result<Self, HostError> {
        let path = path.as_ref();
        let library = Library::new(path).map_err(|source| HostError::Library {
            path: path.to_path_buf(),
            source,
        })?;
        let symbols = CoreSymbols::resolve(&library)?;

        info!("Loaded core module {}", path.display());
        Ok(Self {
            path: path.to_path_buf(),
            symbols,
            _library: library,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CoreApi for DynamicCore {
    fn api_version(&self) -> u32 {
        unsafe { (self.symbols.api_version)() }
    }

    fn set_environment(&self, callback: retro_environment_t) {
        unsafe { (self.symbols.set_environment)(callback) }
    }

    fn set_video_refresh(&self, callback: retro_video_refresh_t) {
        unsafe { (self.symbols.set_video_refresh)(callback) }
    }

    fn set_input_poll(&self, callback: retro_input_poll_t) {
        unsafe { (self.symbols.set_input_poll)(callback) }
    }

    fn set_input_state(&self, callback: retro_input_state_t) {
        unsafe { (self.symbols.set_input_state)(callback) }
    }

    fn set_audio_sample(&self, callback: retro_audio_sample_t) {
        unsafe { (self.symbols.set_audio_sample)(callback) }
    }

    fn set_audio_sample_batch(&self, callback: retro_audio_sample_batch_t) {
        unsafe { (self.symbols.set_audio_sample_batch)(callback) }
    }

    fn init(&self) {
        unsafe { (self.symbols.init)() }
    }

    fn deinit(&self) {
        unsafe { (self.symbols.deinit)() }
    }

    fn system_info(&self) -> SystemInfo {
        let mut raw = retro_system_info::default();
        unsafe {
            (self.symbols.get_system_info)(&mut raw);
            SystemInfo::from_raw(&raw)
        }
    }

    fn system_av_info(&self) -> retro_system_av_info {
        let mut av = retro_system_av_info::default();
        unsafe { (self.symbols.get_system_av_info)(&mut av) };
        av
    }

    fn set_controller_port_device(&self, port: u32, device: u32) {
        unsafe { (self.symbols.set_controller_port_device)(port, device) }
    }

    fn reset(&self) {
        unsafe { (self.symbols.reset)() }
    }

    fn run(&self) {
        unsafe { (self.symbols.run)() }
    }

    fn load_game(&self, game: &retro_game_info) -> bool {
        unsafe { (self.symbols.load_game)(game) }
    }

    fn unload_game(&self) {
        unsafe { (self.symbols.unload_game)() }
    }
}
