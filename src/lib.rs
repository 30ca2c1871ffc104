//! Masked, luminance-weighted recoloring of images.
//!
//! A fixed target color is blended into an RGB image wherever a mask is set. The blend
//! strength at each pixel is the mask weight times the pixel's BT.601 luminance, so dark
//! regions keep their texture.
//!
//! The same operator runs on two backends:
//!
//! - [`CpuBackend`]: a per-pixel loop over host images, always available.
//! - `GpuBackend` (feature `gpu`): a wgpu fragment-shader pass over textures.
//!
//! [`RecolorNode`] wraps a backend behind a stream contract (`IMAGE`/`MASK` or
//! `IMAGE_GPU`/`MASK_GPU`), picks the backend once at open time and propagates
//! timestamps.
#![forbid(unsafe_code)]

pub mod config;
pub mod foundation;
pub mod node;
pub mod recolor;
pub mod render;

pub use crate::config::options::{ColorRgb, RecolorOptions};
pub use crate::foundation::core::{ImageFrame, PixelFormat, Rgb, Timestamp};
pub use crate::foundation::error::{RecolorError, RecolorResult};
pub use crate::node::contract::{NodeContract, TAG_IMAGE, TAG_IMAGE_GPU, TAG_MASK, TAG_MASK_GPU};
pub use crate::node::recolor_node::{Packet, RecolorNode};
pub use crate::recolor::blend::{blend_pixel, blend_rgb, luminance, mix_value};
pub use crate::recolor::channel::{MaskChannel, select_mask_channel};
pub use crate::recolor::resample::MaskResample;
pub use crate::render::backend::{
    BackendKind, ExecutionDomain, Frame, RecolorBackend, RecolorSettings, create_backend,
};
pub use crate::render::cpu::{CpuBackend, render_cpu};
#[cfg(feature = "gpu")]
pub use crate::render::gpu::{GpuBackend, GpuContext, GpuImage};
pub use crate::render::lifecycle::ProgramPhase;
pub use crate::render::texels::UploadRole;
