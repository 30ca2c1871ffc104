use image::GrayImage;
use image::imageops::{self, FilterType};

use crate::foundation::core::ImageFrame;
use crate::foundation::error::{RecolorError, RecolorResult};
use crate::recolor::channel::{MaskChannel, select_mask_channel};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaskResample {
    Nearest,
    #[default]
    Bilinear,
}

impl MaskResample {
    fn filter(self) -> FilterType {
        match self {
            Self::Nearest => FilterType::Nearest,
            Self::Bilinear => FilterType::Triangle,
        }
    }
}

pub fn extract_mask_channel(mask: &ImageFrame, channel: MaskChannel) -> RecolorResult<GrayImage> {
    let stride = mask.channels();
    let idx = select_mask_channel(channel, stride);
    let data: Vec<u8> = mask.data().iter().skip(idx).step_by(stride).copied().collect();
    GrayImage::from_raw(mask.width(), mask.height(), data)
        .ok_or_else(|| RecolorError::precondition("mask buffer does not match its dimensions"))
}

pub fn resample_mask(
    mask: GrayImage,
    width: u32,
    height: u32,
    kernel: MaskResample,
) -> GrayImage {
    if mask.dimensions() == (width, height) {
        return mask;
    }
    tracing::debug!(
        from_w = mask.width(),
        from_h = mask.height(),
        to_w = width,
        to_h = height,
        ?kernel,
        "resampling mask"
    );
    imageops::resize(&mask, width, height, kernel.filter())
}

pub fn prepare_mask(
    mask: &ImageFrame,
    channel: MaskChannel,
    width: u32,
    height: u32,
    kernel: MaskResample,
) -> RecolorResult<GrayImage> {
    let gray = extract_mask_channel(mask, channel)?;
    Ok(resample_mask(gray, width, height, kernel))
}
