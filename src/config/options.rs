use std::{fs::File, io::BufReader, path::Path};

use crate::{
    foundation::core::Rgb,
    foundation::error::{RecolorError, RecolorResult},
    recolor::{channel::MaskChannel, resample::MaskResample},
    render::backend::RecolorSettings,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ColorRgb {
    pub r: i64,
    pub g: i64,
    pub b: i64,
}

impl ColorRgb {
    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self {
            r: i64::from(r),
            g: i64::from(g),
            b: i64::from(b),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RecolorOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<ColorRgb>,
    #[serde(default)]
    pub mask_channel: MaskChannel,
    #[serde(default)]
    pub resample: MaskResample,
}

impl RecolorOptions {
    pub fn new(color: ColorRgb) -> Self {
        Self {
            color: Some(color),
            ..Self::default()
        }
    }

    pub fn with_mask_channel(mut self, channel: MaskChannel) -> Self {
        self.mask_channel = channel;
        self
    }

    pub fn with_resample(mut self, resample: MaskResample) -> Self {
        self.resample = resample;
        self
    }

    pub fn from_json_str(s: &str) -> RecolorResult<Self> {
        Ok(serde_json::from_str(s)?)
    }

    pub fn from_json_file(path: &Path) -> RecolorResult<Self> {
        let f = File::open(path).map_err(|e| {
            RecolorError::config(format!("open options '{}': {e}", path.display()))
        })?;
        let opts = serde_json::from_reader(BufReader::new(f)).map_err(|e| {
            RecolorError::serde(format!("parse options '{}': {e}", path.display()))
        })?;
        Ok(opts)
    }

    pub fn validate(&self) -> RecolorResult<()> {
        let Some(color) = self.color else {
            return Err(RecolorError::config("missing color option"));
        };
        for (name, v) in [("r", color.r), ("g", color.g), ("b", color.b)] {
            if !(0..=255).contains(&v) {
                return Err(RecolorError::config(format!(
                    "color.{name} must be in 0..=255, got {v}"
                )));
            }
        }
        Ok(())
    }

    pub fn settings(&self) -> RecolorResult<RecolorSettings> {
        self.validate()?;
        let color = self
            .color
            .ok_or_else(|| RecolorError::config("missing color option"))?;
        Ok(RecolorSettings {
            color: Rgb {
                r: color.r as f32,
                g: color.g as f32,
                b: color.b as f32,
            },
            mask_channel: self.mask_channel,
            resample: self.resample,
        })
    }
}
