// Projection math - Letterbox scales, orthographic projection and viewport
//
// Aspect correction is applied through the projection matrix only: the
// viewport always covers the whole window and the unit quad is scaled down on
// the axis that does not fill it. Nothing here touches the GPU.

use crate::libretro::retro_game_geometry;

/// Column-major 4x4 matrix, `m[column][row]`
pub type Mat4 = [[f32; 4]; 4];

/// Identity matrix
pub const IDENTITY: Mat4 = [
    [1.0, 0.0, 0.0, 0.0],
    [0.0, 1.0, 0.0, 0.0],
    [0.0, 0.0, 1.0, 0.0],
    [0.0, 0.0, 0.0, 1.0],
];

/// Horizontal and vertical scale applied to the unit quad
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LetterboxScale {
    pub sx: f32,
    pub sy: f32,
}

impl LetterboxScale {
    /// No correction
    pub const FULL: Self = Self { sx: 1.0, sy: 1.0 };
}

/// Viewport rectangle in window pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Viewport {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    /// Viewport covering the whole window
    pub fn full(width: u32, height: u32) -> Self {
        Self {
            x: 0,
            y: 0,
            width,
            height,
        }
    }
}

/// Compute the letterbox scale factors for a window and a content aspect
///
/// The axis that would overflow is shrunk so the content keeps `content_aspect`.
/// Exactly one factor is 1.0; the other is at most 1.0.
///
/// # Arguments
/// * `window_width` / `window_height` - Drawable size in pixels
/// * `content_aspect` - Width / height of the content
pub fn letterbox_scale(window_width: u32, window_height: u32, content_aspect: f32) -> LetterboxScale {
    if window_width == 0 || window_height == 0 || !(content_aspect > 0.0) {
        return LetterboxScale::FULL;
    }

    let a = window_width as f32 / window_height as f32;
    let a0 = content_aspect;

    if a > a0 {
        LetterboxScale { sx: a0 / a, sy: 1.0 }
    } else {
        LetterboxScale { sx: 1.0, sy: a / a0 }
    }
}

/// Build an orthographic projection with extra per-axis scaling
#[allow(clippy::too_many_arguments)]
pub fn ortho(
    left: f32,
    right: f32,
    bottom: f32,
    top: f32,
    near: f32,
    far: f32,
    scale_x: f32,
    scale_y: f32,
) -> Mat4 {
    let mut m = [[0.0f32; 4]; 4];
    m[0][0] = 2.0 / (right - left) * scale_x;
    m[1][1] = 2.0 / (top - bottom) * scale_y;
    m[2][2] = -2.0 / (far - near);
    m[3][0] = -(right + left) / (right - left);
    m[3][1] = -(top + bottom) / (top - bottom);
    m[3][2] = -(far + near) / (far - near);
    m[3][3] = 1.0;
    m
}

/// Projection for the centered unit quad (-0.5..+0.5), top-left texel first
///
/// Top and bottom are swapped so that quad y = -0.5 lands on the top of the
/// window, matching row 0 of the frame.
pub fn quad_projection(scale: LetterboxScale) -> Mat4 {
    ortho(-0.5, 0.5, 0.5, -0.5, -1.0, 1.0, scale.sx, scale.sy)
}

/// Aspect ratio of the content described by a geometry
///
/// Uses the declared ratio when positive, the base dimensions otherwise.
pub fn content_aspect(geometry: &retro_game_geometry) -> f32 {
    if geometry.aspect_ratio > 0.0 {
        geometry.aspect_ratio
    } else if geometry.base_height > 0 {
        geometry.base_width as f32 / geometry.base_height as f32
    } else {
        1.0
    }
}

/// Initial window size: base geometry corrected to its aspect, times `scale`
///
/// Landscape content keeps its width and derives the height; portrait content
/// keeps its height and derives the width.
pub fn window_size_for(geometry: &retro_game_geometry, scale: u32) -> (u32, u32) {
    let base_w = geometry.base_width.max(1);
    let base_h = geometry.base_height.max(1);
    let ratio = content_aspect(geometry);

    let (w, h) = if (base_w as f32 / base_h as f32) < 1.0 {
        (derived_dimension(base_h as f32 * ratio), base_h)
    } else {
        (base_w, derived_dimension(base_w as f32 / ratio))
    };

    let scale = scale.max(1);
    (
        w.saturating_mul(scale).min(MAX_WINDOW_DIMENSION),
        h.saturating_mul(scale).min(MAX_WINDOW_DIMENSION),
    )
}

/// Largest window edge derived from core geometry
pub const MAX_WINDOW_DIMENSION: u32 = 16384;

fn derived_dimension(value: f32) -> u32 {
    // `as` saturates, and NaN becomes 0
    (value.round() as u32).clamp(1, MAX_WINDOW_DIMENSION)
}

/// Projection matrix, the scales it was built from, and the applied viewport
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectionState {
    pub matrix: Mat4,
    pub scale: LetterboxScale,
    pub viewport: Viewport,
}

impl ProjectionState {
    /// Compute the projection for a window size and content aspect
    pub fn compute(window_width: u32, window_height: u32, content_aspect: f32) -> Self {
        let scale = letterbox_scale(window_width, window_height, content_aspect);
        Self {
            matrix: quad_projection(scale),
            scale,
            viewport: Viewport::full(window_width, window_height),
        }
    }
}

impl Default for ProjectionState {
    fn default() -> Self {
        Self {
            matrix: IDENTITY,
            scale: LetterboxScale::FULL,
            viewport: Viewport::default(),
        }
    }
}
