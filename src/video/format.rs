// Pixel formats - Core framebuffer formats and their GPU storage
//
// The streaming texture is always BGRA8. XRGB8888 frames already have that
// byte layout in memory and are uploaded as-is; the 16-bit formats are
// expanded on the CPU one row at a time.

use crate::libretro::{
    RETRO_PIXEL_FORMAT_0RGB1555, RETRO_PIXEL_FORMAT_RGB565, RETRO_PIXEL_FORMAT_XRGB8888,
};

/// Bytes per texel of the GPU texture
pub const TEXTURE_BYTES_PER_PIXEL: u32 = 4;

/// Pixel format a core can declare
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PixelFormat {
    /// 0RGB1555, native-endian u16. Default when the core never declares one.
    #[default]
    Xrgb1555,
    /// RGB565, native-endian u16
    Rgb565,
    /// XRGB8888, native-endian u32
    Xrgb8888,
}

/// How frames of a given format reach the texture
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelStorage {
    /// Bytes are already BGRA8; upload directly with the source pitch
    Bgra8Direct,
    /// Expand 0RGB1555 to BGRA8
    Expand1555,
    /// Expand RGB565 to BGRA8
    Expand565,
}

impl PixelFormat {
    /// Decode the `retro_pixel_format` value sent by a core
    pub fn from_raw(value: u32) -> Option<Self> {
        match value {
            RETRO_PIXEL_FORMAT_0RGB1555 => Some(PixelFormat::Xrgb1555),
            RETRO_PIXEL_FORMAT_XRGB8888 => Some(PixelFormat::Xrgb8888),
            RETRO_PIXEL_FORMAT_RGB565 => Some(PixelFormat::Rgb565),
            _ => None,
        }
    }

    /// Bytes per pixel in the core's framebuffer
    pub fn bytes_per_pixel(self) -> u32 {
        match self {
            PixelFormat::Xrgb1555 | PixelFormat::Rgb565 => 2,
            PixelFormat::Xrgb8888 => 4,
        }
    }

    /// GPU storage path for this format
    pub fn storage(self) -> PixelStorage {
        match self {
            PixelFormat::Xrgb1555 => PixelStorage::Expand1555,
            PixelFormat::Rgb565 => PixelStorage::Expand565,
            PixelFormat::Xrgb8888 => PixelStorage::Bgra8Direct,
        }
    }

    /// Texture format the frames are stored in
    pub fn texture_format(self) -> wgpu::TextureFormat {
        wgpu::TextureFormat::Bgra8Unorm
    }
}

impl std::fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PixelFormat::Xrgb1555 => write!(f, "0RGB1555"),
            PixelFormat::Rgb565 => write!(f, "RGB565"),
            PixelFormat::Xrgb8888 => write!(f, "XRGB8888"),
        }
    }
}

#[inline]
fn expand5(v: u16) -> u8 {
    let v = (v & 0x1F) as u8;
    (v << 3) | (v >> 2)
}

#[inline]
fn expand6(v: u16) -> u8 {
    let v = (v & 0x3F) as u8;
    (v << 2) | (v >> 4)
}

/// Convert one 0RGB1555 pixel to BGRA8
#[inline]
pub fn xrgb1555_to_bgra(pixel: u16) -> [u8; 4] {
    [expand5(pixel), expand5(pixel >> 5), expand5(pixel >> 10), 0xFF]
}

/// Convert one RGB565 pixel to BGRA8
#[inline]
pub fn rgb565_to_bgra(pixel: u16) -> [u8; 4] {
    [expand5(pixel), expand6(pixel >> 5), expand5(pixel >> 11), 0xFF]
}

/// Expand a block of 16-bit pixels into tightly packed BGRA8 rows
///
/// # Arguments
/// * `storage` - `Expand1555` or `Expand565`
/// * `src` - Source frame, rows `pitch` bytes apart
/// * `pitch` - Source row stride in bytes
/// * `width` / `height` - Pixels to convert
/// * `dst` - Output, resized to `width * height * 4`
///
/// # Panics
/// Panics if `src` is shorter than the block described by `pitch`, `width` and `height`.
pub fn expand_rows(
    storage: PixelStorage,
    src: &[u8],
    pitch: usize,
    width: usize,
    height: usize,
    dst: &mut Vec<u8>,
) {
    let convert: fn(u16) -> [u8; 4] = match storage {
        PixelStorage::Expand1555 => xrgb1555_to_bgra,
        PixelStorage::Expand565 => rgb565_to_bgra,
        PixelStorage::Bgra8Direct => {
            dst.clear();
            for y in 0..height {
                dst.extend_from_slice(&src[y * pitch..y * pitch + width * 4]);
            }
            return;
        }
    };

    dst.resize(width * height * 4, 0);

    for y in 0..height {
        let row = &src[y * pitch..y * pitch + width * 2];
        let out = &mut dst[y * width * 4..(y + 1) * width * 4];

        for (texel, bytes) in out.chunks_exact_mut(4).zip(row.chunks_exact(2)) {
            let pixel = u16::from_ne_bytes([bytes[0], bytes[1]]);
            texel.copy_from_slice(&convert(pixel));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_raw() {
        assert_eq!(PixelFormat::from_raw(0), Some(PixelFormat::Xrgb1555));
        assert_eq!(PixelFormat::from_raw(1), Some(PixelFormat::Xrgb8888));
        assert_eq!(PixelFormat::from_raw(2), Some(PixelFormat::Rgb565));
        assert_eq!(PixelFormat::from_raw(3), None);
    }

    #[test]
    fn test_bytes_per_pixel() {
        assert_eq!(PixelFormat::Xrgb1555.bytes_per_pixel(), 2);
        assert_eq!(PixelFormat::Rgb565.bytes_per_pixel(), 2);
        assert_eq!(PixelFormat::Xrgb8888.bytes_per_pixel(), 4);
        assert_eq!(PixelFormat::default(), PixelFormat::Xrgb1555);
    }

    #[test]
    fn test_1555_primaries() {
        assert_eq!(xrgb1555_to_bgra(0x7C00), [0, 0, 0xFF, 0xFF]); // red
        assert_eq!(xrgb1555_to_bgra(0x03E0), [0, 0xFF, 0, 0xFF]); // green
        assert_eq!(xrgb1555_to_bgra(0x001F), [0xFF, 0, 0, 0xFF]); // blue
        assert_eq!(xrgb1555_to_bgra(0x0000), [0, 0, 0, 0xFF]);
    }

    #[test]
    fn test_565_primaries() {
        assert_eq!(rgb565_to_bgra(0xF800), [0, 0, 0xFF, 0xFF]);
        assert_eq!(rgb565_to_bgra(0x07E0), [0, 0xFF, 0, 0xFF]);
        assert_eq!(rgb565_to_bgra(0x001F), [0xFF, 0, 0, 0xFF]);
        assert_eq!(rgb565_to_bgra(0xFFFF), [0xFF, 0xFF, 0xFF, 0xFF]);
    }

    #[test]
    fn test_expand_rows_honours_pitch() {
        // 2x2 RGB565 frame with 2 pixels of row padding
        let mut src = vec![0u8; 8 * 2];
        let white = 0xFFFFu16.to_ne_bytes();
        src[0..2].copy_from_slice(&white);
        src[8 + 2..8 + 4].copy_from_slice(&white);

        let mut dst = Vec::new();
        expand_rows(PixelStorage::Expand565, &src, 8, 2, 2, &mut dst);

        assert_eq!(dst.len(), 16);
        assert_eq!(&dst[0..4], &[0xFF, 0xFF, 0xFF, 0xFF]);
        assert_eq!(&dst[4..8], &[0, 0, 0, 0xFF]);
        assert_eq!(&dst[8..12], &[0, 0, 0, 0xFF]);
        assert_eq!(&dst[12..16], &[0xFF, 0xFF, 0xFF, 0xFF]);
    }

    #[test]
    fn test_expand_rows_direct_strips_padding() {
        let src: Vec<u8> = (0..24).collect();
        let mut dst = Vec::new();
        expand_rows(PixelStorage::Bgra8Direct, &src, 12, 2, 2, &mut dst);
        assert_eq!(dst, [0, 1, 2, 3, 4, 5, 6, 7, 12, 13, 14, 15, 16, 17, 18, 19]);
    }
}
