#[cfg(feature = "gpu")]
use std::sync::Arc;

use crate::{
    config::options::RecolorOptions,
    foundation::core::Timestamp,
    foundation::error::{RecolorError, RecolorResult},
    node::contract::NodeContract,
    render::backend::{
        BackendKind, ExecutionDomain, Frame, RecolorBackend, RecolorSettings, create_backend,
    },
};

#[cfg(feature = "gpu")]
use crate::render::gpu::GpuContext;

#[derive(Debug)]
pub struct Packet {
    pub timestamp: Timestamp,
    pub frame: Frame,
}

pub struct RecolorNode {
    domain: ExecutionDomain,
    settings: RecolorSettings,
    backend: Box<dyn RecolorBackend>,
    closed: bool,
    failed: Option<String>,
}

impl std::fmt::Debug for RecolorNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecolorNode")
            .field("domain", &self.domain)
            .field("settings", &self.settings)
            .field("closed", &self.closed)
            .field("failed", &self.failed)
            .finish_non_exhaustive()
    }
}

impl RecolorNode {
    #[tracing::instrument(skip(options))]
    pub fn open(contract: &NodeContract, options: &RecolorOptions) -> RecolorResult<Self> {
        let domain = contract.validate()?;
        let settings = options.settings()?;
        match domain {
            ExecutionDomain::Cpu => Self::with_backend(domain, settings, BackendKind::Cpu),
            ExecutionDomain::Gpu => Err(RecolorError::config(gpu_unavailable_reason())),
        }
    }

    #[cfg(feature = "gpu")]
    #[tracing::instrument(skip(options, ctx))]
    pub fn open_with_gpu(
        contract: &NodeContract,
        options: &RecolorOptions,
        ctx: Arc<GpuContext>,
    ) -> RecolorResult<Self> {
        let domain = contract.validate()?;
        let settings = options.settings()?;
        let kind = match domain {
            ExecutionDomain::Cpu => BackendKind::Cpu,
            ExecutionDomain::Gpu => BackendKind::Gpu(ctx),
        };
        Self::with_backend(domain, settings, kind)
    }

    fn with_backend(
        domain: ExecutionDomain,
        settings: RecolorSettings,
        kind: BackendKind,
    ) -> RecolorResult<Self> {
        let backend = create_backend(kind, settings)?;
        tracing::debug!(?domain, mask_channel = %settings.mask_channel, "recolor node opened");
        Ok(Self {
            domain,
            settings,
            backend,
            closed: false,
            failed: None,
        })
    }

    pub fn domain(&self) -> ExecutionDomain {
        self.domain
    }

    pub fn settings(&self) -> &RecolorSettings {
        &self.settings
    }

    #[tracing::instrument(level = "debug", skip(self, image, mask), fields(domain = ?self.domain))]
    pub fn process(
        &mut self,
        timestamp: Timestamp,
        image: &Frame,
        mask: Option<&Frame>,
    ) -> RecolorResult<Option<Packet>> {
        if self.closed {
            return Err(RecolorError::precondition("recolor node is closed"));
        }
        if let Some(reason) = &self.failed {
            return Err(RecolorError::precondition(format!(
                "recolor node stopped after an earlier failure: {reason}"
            )));
        }

        match self.invoke(image, mask) {
            Ok(out) => Ok(out.map(|frame| Packet { timestamp, frame })),
            Err(RecolorError::Precondition(reason)) => {
                tracing::error!(%reason, "recolor node failed");
                self.failed = Some(reason.clone());
                Err(RecolorError::Precondition(reason))
            }
            Err(e) => Err(e),
        }
    }

    fn invoke(&mut self, image: &Frame, mask: Option<&Frame>) -> RecolorResult<Option<Frame>> {
        for (what, frame) in [("image", Some(image)), ("mask", mask)] {
            if let Some(frame) = frame
                && frame.domain() != self.domain
            {
                return Err(RecolorError::precondition(format!(
                    "{what} is {:?}-resident but the node was opened for {:?} streams",
                    frame.domain(),
                    self.domain
                )));
            }
        }
        self.backend.render(image, mask)
    }

    pub fn close(&mut self) -> RecolorResult<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.backend.close()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn is_failed(&self) -> bool {
        self.failed.is_some()
    }
}

fn gpu_unavailable_reason() -> &'static str {
    if cfg!(feature = "gpu") {
        "GPU streams need a GpuContext; open the node with open_with_gpu"
    } else {
        "GPU streams requested but recolor was built without the `gpu` feature"
    }
}
