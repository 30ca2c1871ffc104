use crate::{
    foundation::error::{RecolorError, RecolorResult},
    render::backend::ExecutionDomain,
};

pub const TAG_IMAGE: &str = "IMAGE";
pub const TAG_IMAGE_GPU: &str = "IMAGE_GPU";
pub const TAG_MASK: &str = "MASK";
pub const TAG_MASK_GPU: &str = "MASK_GPU";

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NodeContract {
    pub inputs: Vec<String>,
    pub outputs: Vec<String>,
}

impl NodeContract {
    pub fn new<I, O>(inputs: I, outputs: O) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
        O: IntoIterator,
        O::Item: Into<String>,
    {
        Self {
            inputs: inputs.into_iter().map(Into::into).collect(),
            outputs: outputs.into_iter().map(Into::into).collect(),
        }
    }

    pub fn cpu() -> Self {
        Self::new([TAG_IMAGE, TAG_MASK], [TAG_IMAGE])
    }

    pub fn gpu() -> Self {
        Self::new([TAG_IMAGE_GPU, TAG_MASK_GPU], [TAG_IMAGE_GPU])
    }

    pub fn validate(&self) -> RecolorResult<ExecutionDomain> {
        if self.inputs.is_empty() {
            return Err(RecolorError::config("recolor node needs input streams"));
        }
        if self.outputs.is_empty() {
            return Err(RecolorError::config("recolor node needs an output stream"));
        }

        let mut domains = Vec::new();
        for tag in &self.inputs {
            domains.push(input_domain(tag)?);
        }
        for tag in &self.outputs {
            domains.push(output_domain(tag)?);
        }

        exactly_one(&self.inputs, TAG_IMAGE, TAG_IMAGE_GPU, "input image")?;
        exactly_one(&self.inputs, TAG_MASK, TAG_MASK_GPU, "input mask")?;
        exactly_one(&self.outputs, TAG_IMAGE, TAG_IMAGE_GPU, "output image")?;

        let domain = domains[0];
        if domains.iter().any(|d| *d != domain) {
            return Err(RecolorError::config(
                "cannot mix CPU and GPU streams: use IMAGE/MASK/IMAGE or IMAGE_GPU/MASK_GPU/IMAGE_GPU",
            ));
        }
        Ok(domain)
    }
}

fn input_domain(tag: &str) -> RecolorResult<ExecutionDomain> {
    match tag {
        TAG_IMAGE | TAG_MASK => Ok(ExecutionDomain::Cpu),
        TAG_IMAGE_GPU | TAG_MASK_GPU => Ok(ExecutionDomain::Gpu),
        other => Err(RecolorError::config(format!("unknown input tag '{other}'"))),
    }
}

fn output_domain(tag: &str) -> RecolorResult<ExecutionDomain> {
    match tag {
        TAG_IMAGE => Ok(ExecutionDomain::Cpu),
        TAG_IMAGE_GPU => Ok(ExecutionDomain::Gpu),
        other => Err(RecolorError::config(format!("unknown output tag '{other}'"))),
    }
}

fn exactly_one(tags: &[String], cpu: &str, gpu: &str, what: &str) -> RecolorResult<()> {
    let n = tags.iter().filter(|t| *t == cpu || *t == gpu).count();
    if n != 1 {
        return Err(RecolorError::config(format!(
            "expected exactly one {what} stream ({cpu} or {gpu}), found {n}"
        )));
    }
    Ok(())
}
