// Texture streaming - Turns core frames into texture uploads
//
// Frames whose bytes already match the texture layout are passed through
// with the core's pitch as the row stride. Everything else is expanded into
// a staging buffer that is reused across frames.

use super::backend::TextureRegion;
use super::format::{expand_rows, PixelStorage, TEXTURE_BYTES_PER_PIXEL};
use super::surface::VideoError;

/// Staging state for per-frame uploads
#[derive(Debug, Default)]
pub struct TextureStream {
    staging: Vec<u8>,
    uploads: u64,
}

impl TextureStream {
    pub fn new() -> Self {
        Self::default()
    }

    /// Minimum number of bytes a frame with this layout occupies
    ///
    /// The last row only needs `width * bytes_per_pixel` bytes, not a full pitch.
    pub fn required_len(pitch: usize, width: u32, height: u32, bytes_per_pixel: u32) -> usize {
        if height == 0 {
            return 0;
        }
        pitch * (height as usize - 1) + width as usize * bytes_per_pixel as usize
    }

    /// Prepare the region to upload for one frame
    ///
    /// # Arguments
    /// * `storage` - How the core's format reaches the texture
    /// * `data` - Frame bytes as handed over by the core
    /// * `pitch` - Source row stride in bytes, already validated
    /// * `width` / `height` - Clip size of the frame
    pub fn prepare<'a>(
        &'a mut self,
        storage: PixelStorage,
        data: &'a [u8],
        pitch: usize,
        width: u32,
        height: u32,
    ) -> Result<TextureRegion<'a>, VideoError> {
        let source_bpp = match storage {
            PixelStorage::Bgra8Direct => TEXTURE_BYTES_PER_PIXEL,
            PixelStorage::Expand1555 | PixelStorage::Expand565 => 2,
        };

        let expected = Self::required_len(pitch, width, height, source_bpp);
        if data.len() < expected {
            return Err(VideoError::ShortFrame {
                expected,
                actual: data.len(),
            });
        }

        self.uploads += 1;

        if storage == PixelStorage::Bgra8Direct {
            return Ok(TextureRegion {
                width,
                height,
                bytes_per_row: pitch as u32,
                data: &data[..expected],
            });
        }

        expand_rows(
            storage,
            data,
            pitch,
            width as usize,
            height as usize,
            &mut self.staging,
        );

        Ok(TextureRegion {
            width,
            height,
            bytes_per_row: width * TEXTURE_BYTES_PER_PIXEL,
            data: &self.staging,
        })
    }

    /// Frames prepared so far
    pub fn uploads(&self) -> u64 {
        self.uploads
    }
}
