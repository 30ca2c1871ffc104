//! Luminance-weighted blend of a source pixel towards the target color.
//!
//! ```text
//! luminance = (0.299 r + 0.587 g + 0.114 b) / 255
//! mix       = clamp(weight * luminance, 0, 1)
//! out       = src * (1 - mix) + color * mix
//! ```
//!
//! BT.601 coefficients, no gamma. The GPU fragment shader evaluates the same expression in
//! normalized space; see [`crate::render::shader`].

use crate::foundation::core::Rgb;

pub const LUMA_WEIGHTS: [f32; 3] = [0.299, 0.587, 0.114];

pub fn luminance(rgb: [f32; 3]) -> f32 {
    (rgb[0] * LUMA_WEIGHTS[0] + rgb[1] * LUMA_WEIGHTS[1] + rgb[2] * LUMA_WEIGHTS[2]) / 255.0
}

pub fn mix_value(weight: f32, luminance: f32) -> f32 {
    (weight * luminance).clamp(0.0, 1.0)
}

pub fn weight_from_u8(v: u8) -> f32 {
    f32::from(v) / 255.0
}

pub fn blend_rgb(src: [f32; 3], weight: f32, color: Rgb) -> [f32; 3] {
    let m = mix_value(weight, luminance(src));
    let c2 = color.to_array();
    let inv = 1.0 - m;
    [
        src[0] * inv + c2[0] * m,
        src[1] * inv + c2[1] * m,
        src[2] * inv + c2[2] * m,
    ]
}

pub fn blend_pixel(src: [u8; 3], weight: f32, color: Rgb) -> [u8; 3] {
    let out = blend_rgb(
        [f32::from(src[0]), f32::from(src[1]), f32::from(src[2])],
        weight,
        color,
    );
    out.map(to_u8)
}

fn to_u8(v: f32) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}
