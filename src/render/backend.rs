use crate::{
    foundation::core::{ImageFrame, Rgb},
    foundation::error::{RecolorError, RecolorResult},
    recolor::{channel::MaskChannel, resample::MaskResample},
};

#[cfg(feature = "gpu")]
use std::sync::Arc;

#[cfg(feature = "gpu")]
use crate::render::gpu::{GpuContext, GpuImage};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ExecutionDomain {
    Cpu,
    Gpu,
}

#[derive(Debug)]
pub enum Frame {
    Cpu(ImageFrame),
    #[cfg(feature = "gpu")]
    Gpu(GpuImage),
}

impl Frame {
    pub fn domain(&self) -> ExecutionDomain {
        match self {
            Self::Cpu(_) => ExecutionDomain::Cpu,
            #[cfg(feature = "gpu")]
            Self::Gpu(_) => ExecutionDomain::Gpu,
        }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        match self {
            Self::Cpu(img) => img.dimensions(),
            #[cfg(feature = "gpu")]
            Self::Gpu(img) => (img.width(), img.height()),
        }
    }

    pub fn as_cpu(&self) -> Option<&ImageFrame> {
        #[allow(unreachable_patterns)]
        match self {
            Self::Cpu(img) => Some(img),
            _ => None,
        }
    }

    pub fn into_cpu(self) -> Option<ImageFrame> {
        #[allow(unreachable_patterns)]
        match self {
            Self::Cpu(img) => Some(img),
            _ => None,
        }
    }

    #[cfg(feature = "gpu")]
    pub fn as_gpu(&self) -> Option<&GpuImage> {
        match self {
            Self::Gpu(img) => Some(img),
            Self::Cpu(_) => None,
        }
    }

    #[cfg(feature = "gpu")]
    pub fn into_gpu(self) -> Option<GpuImage> {
        match self {
            Self::Gpu(img) => Some(img),
            Self::Cpu(_) => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RecolorSettings {
    pub color: Rgb,
    pub mask_channel: MaskChannel,
    pub resample: MaskResample,
}

impl RecolorSettings {
    pub fn new(color: Rgb) -> Self {
        Self {
            color,
            mask_channel: MaskChannel::default(),
            resample: MaskResample::default(),
        }
    }
}

pub trait RecolorBackend {
    fn domain(&self) -> ExecutionDomain;

    fn render(&mut self, image: &Frame, mask: Option<&Frame>) -> RecolorResult<Option<Frame>>;

    fn close(&mut self) -> RecolorResult<()> {
        Ok(())
    }
}

#[derive(Clone, Debug)]
pub enum BackendKind {
    Cpu,
    #[cfg(feature = "gpu")]
    Gpu(Arc<GpuContext>),
}

impl BackendKind {
    pub fn domain(&self) -> ExecutionDomain {
        match self {
            Self::Cpu => ExecutionDomain::Cpu,
            #[cfg(feature = "gpu")]
            Self::Gpu(_) => ExecutionDomain::Gpu,
        }
    }
}

pub fn create_backend(
    kind: BackendKind,
    settings: RecolorSettings,
) -> RecolorResult<Box<dyn RecolorBackend>> {
    match kind {
        BackendKind::Cpu => Ok(Box::new(crate::render::cpu::CpuBackend::new(settings))),
        #[cfg(feature = "gpu")]
        BackendKind::Gpu(ctx) => Ok(Box::new(crate::render::gpu::GpuBackend::new(
            ctx, settings,
        ))),
    }
}

pub(crate) fn wrong_domain(
    what: &str,
    got: ExecutionDomain,
    want: ExecutionDomain,
) -> RecolorError {
    RecolorError::precondition(format!(
        "{what} is {got:?}-resident but this backend runs on {want:?}"
    ))
}
