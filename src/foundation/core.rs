use std::path::Path;

use crate::foundation::error::{RecolorError, RecolorResult};

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct Timestamp(pub i64);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    Gray8,
    Rgb8,
    Rgba8,
}

impl PixelFormat {
    pub fn channels(self) -> usize {
        match self {
            Self::Gray8 => 1,
            Self::Rgb8 => 3,
            Self::Rgba8 => 4,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Rgb {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Rgb {
    pub fn from_u8(r: u8, g: u8, b: u8) -> Self {
        Self {
            r: f32::from(r),
            g: f32::from(g),
            b: f32::from(b),
        }
    }

    pub fn to_array(self) -> [f32; 3] {
        [self.r, self.g, self.b]
    }

    pub fn normalized(self) -> [f32; 3] {
        [self.r / 255.0, self.g / 255.0, self.b / 255.0]
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageFrame {
    width: u32,
    height: u32,
    format: PixelFormat,
    data: Vec<u8>,
}

impl ImageFrame {
    pub fn new(
        width: u32,
        height: u32,
        format: PixelFormat,
        data: Vec<u8>,
    ) -> RecolorResult<Self> {
        let expected = byte_len(width, height, format)?;
        if data.len() != expected {
            return Err(RecolorError::precondition(format!(
                "{format:?} image {width}x{height} expects {expected} bytes, got {}",
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            format,
            data,
        })
    }

    pub fn filled(
        width: u32,
        height: u32,
        format: PixelFormat,
        px: &[u8],
    ) -> RecolorResult<Self> {
        if px.len() != format.channels() {
            return Err(RecolorError::precondition(format!(
                "{format:?} pixel needs {} channels, got {}",
                format.channels(),
                px.len()
            )));
        }
        let count = (width as usize) * (height as usize);
        Self::new(width, height, format, px.repeat(count))
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    pub fn channels(&self) -> usize {
        self.format.channels()
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn pixel(&self, x: u32, y: u32) -> &[u8] {
        let idx = self.offset(x, y);
        &self.data[idx..idx + self.channels()]
    }

    fn offset(&self, x: u32, y: u32) -> usize {
        assert!(
            x < self.width && y < self.height,
            "pixel ({x}, {y}) outside {}x{} image",
            self.width,
            self.height
        );
        ((y as usize) * (self.width as usize) + (x as usize)) * self.channels()
    }

    // Gray is replicated and alpha dropped.
    pub fn into_rgb8(self) -> RecolorResult<Self> {
        if self.format == PixelFormat::Rgb8 {
            return Ok(self);
        }
        let rgb = self.into_dynamic()?.to_rgb8();
        Ok(Self::from_dynamic(image::DynamicImage::ImageRgb8(rgb)))
    }

    pub fn from_dynamic(img: image::DynamicImage) -> Self {
        let (width, height) = (img.width(), img.height());
        let (format, data) = match img {
            image::DynamicImage::ImageLuma8(buf) => (PixelFormat::Gray8, buf.into_raw()),
            image::DynamicImage::ImageRgb8(buf) => (PixelFormat::Rgb8, buf.into_raw()),
            image::DynamicImage::ImageRgba8(buf) => (PixelFormat::Rgba8, buf.into_raw()),
            other => (PixelFormat::Rgba8, other.to_rgba8().into_raw()),
        };
        Self {
            width,
            height,
            format,
            data,
        }
    }

    pub fn into_dynamic(self) -> RecolorResult<image::DynamicImage> {
        let (w, h) = (self.width, self.height);
        let bad = || RecolorError::image("frame buffer does not match its dimensions");
        Ok(match self.format {
            PixelFormat::Gray8 => image::DynamicImage::ImageLuma8(
                image::GrayImage::from_raw(w, h, self.data).ok_or_else(bad)?,
            ),
            PixelFormat::Rgb8 => image::DynamicImage::ImageRgb8(
                image::RgbImage::from_raw(w, h, self.data).ok_or_else(bad)?,
            ),
            PixelFormat::Rgba8 => image::DynamicImage::ImageRgba8(
                image::RgbaImage::from_raw(w, h, self.data).ok_or_else(bad)?,
            ),
        })
    }

    pub fn open(path: &Path) -> RecolorResult<Self> {
        let img = image::open(path)
            .map_err(|e| RecolorError::image(format!("open '{}': {e}", path.display())))?;
        Ok(Self::from_dynamic(img))
    }

    pub fn save(self, path: &Path) -> RecolorResult<()> {
        let shown = path.display().to_string();
        self.into_dynamic()?
            .save(path)
            .map_err(|e| RecolorError::image(format!("write '{shown}': {e}")))
    }
}

fn byte_len(width: u32, height: u32, format: PixelFormat) -> RecolorResult<usize> {
    if width == 0 || height == 0 {
        return Err(RecolorError::precondition("image width/height must be > 0"));
    }
    (width as usize)
        .checked_mul(height as usize)
        .and_then(|v| v.checked_mul(format.channels()))
        .ok_or_else(|| RecolorError::precondition("image buffer size overflow"))
}
