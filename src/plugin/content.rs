// Content - The game descriptor handed to the core
//
// Cores that need a path get only the path; everything else gets the whole
// file in memory. The buffers live until the core has unloaded the game.

use crate::error::HostError;
use crate::libretro::retro_game_info;
use log::info;
use std::ffi::CString;
use std::fs;
use std::os::raw::c_void;
use std::path::{Path, PathBuf};
use std::ptr;

/// Content owned by the host while the core uses it
#[derive(Debug)]
pub struct LoadedContent {
    path: PathBuf,
    c_path: CString,
    data: Option<Vec<u8>>,
}

impl LoadedContent {
    /// Prepare content for the core
    ///
    /// # Arguments
    /// * `path` - Content file
    /// * `need_fullpath` - The core reads the file itself
    pub fn open<P: AsRef<Path>>(path: P, need_fullpath: bool) -> Result<Self, HostError> {
        let path = path.as_ref();
        let c_path = CString::new(path.to_string_lossy().into_owned()).map_err(|e| {
            HostError::Content {
                path: path.to_path_buf(),
                source: std::io::Error::new(std::io::ErrorKind::InvalidInput, e),
            }
        })?;

        let data = if need_fullpath {
            if !path.exists() {
                return Err(HostError::Content {
                    path: path.to_path_buf(),
                    source: std::io::Error::from(std::io::ErrorKind::NotFound),
                });
            }
            info!("Passing content path {}", path.display());
            None
        } else {
            let bytes = fs::read(path).map_err(|source| HostError::Content {
                path: path.to_path_buf(),
                source,
            })?;
            info!("Read {} bytes of content from {}", bytes.len(), path.display());
            Some(bytes)
        };

        Ok(Self {
            path: path.to_path_buf(),
            c_path,
            data,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Size of the in-memory content, 0 for path-only content
    pub fn size(&self) -> usize {
        self.data.as_ref().map_or(0, Vec::len)
    }

    /// Descriptor pointing into this content
    pub fn game_info(&self) -> retro_game_info {
        let (data, size) = match &self.data {
            Some(bytes) => (bytes.as_ptr() as *const c_void, bytes.len()),
            None => (ptr::null(), 0),
        };
        retro_game_info {
            path: self.c_path.as_ptr(),
            data,
            size,
            meta: ptr::null(),
        }
    }
}
