use crate::{
    foundation::core::{ImageFrame, PixelFormat},
    foundation::error::{RecolorError, RecolorResult},
    recolor::{blend, resample},
    render::backend::{
        ExecutionDomain, Frame, RecolorBackend, RecolorSettings, wrong_domain,
    },
};

pub fn render_cpu(
    image: &ImageFrame,
    mask: &ImageFrame,
    settings: &RecolorSettings,
) -> RecolorResult<ImageFrame> {
    if image.format() != PixelFormat::Rgb8 {
        return Err(RecolorError::precondition(format!(
            "cpu recolor expects a 3-channel RGB image, got {} channels",
            image.channels()
        )));
    }

    let (width, height) = image.dimensions();
    let weights = resample::prepare_mask(
        mask,
        settings.mask_channel,
        width,
        height,
        settings.resample,
    )?;

    let mut out = vec![0u8; image.data().len()];
    for ((dst, src), &m) in out
        .chunks_exact_mut(3)
        .zip(image.data().chunks_exact(3))
        .zip(weights.as_raw().iter())
    {
        let px = blend::blend_pixel(
            [src[0], src[1], src[2]],
            blend::weight_from_u8(m),
            settings.color,
        );
        dst.copy_from_slice(&px);
    }

    ImageFrame::new(width, height, image.format(), out)
}

pub struct CpuBackend {
    settings: RecolorSettings,
}

impl CpuBackend {
    pub fn new(settings: RecolorSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &RecolorSettings {
        &self.settings
    }
}

impl RecolorBackend for CpuBackend {
    fn domain(&self) -> ExecutionDomain {
        ExecutionDomain::Cpu
    }

    #[tracing::instrument(level = "trace", skip_all)]
    fn render(&mut self, image: &Frame, mask: Option<&Frame>) -> RecolorResult<Option<Frame>> {
        let image = image
            .as_cpu()
            .ok_or_else(|| wrong_domain("image", image.domain(), ExecutionDomain::Cpu))?;
        let Some(mask) = mask else {
            tracing::trace!("no mask for this invocation, skipping");
            return Ok(None);
        };
        let mask = mask
            .as_cpu()
            .ok_or_else(|| wrong_domain("mask", mask.domain(), ExecutionDomain::Cpu))?;

        render_cpu(image, mask, &self.settings).map(|out| Some(Frame::Cpu(out)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::core::Rgb;
    use crate::recolor::channel::MaskChannel;

    fn settings(color: [u8; 3]) -> RecolorSettings {
        RecolorSettings::new(Rgb::from_u8(color[0], color[1], color[2]))
    }

    #[test]
    fn reference_image_matches_formula() {
        let image = ImageFrame::filled(2, 2, PixelFormat::Rgb8, &[100, 150, 200]).unwrap();
        let mask = ImageFrame::filled(2, 2, PixelFormat::Gray8, &[255]).unwrap();
        let out = render_cpu(&image, &mask, &settings([0, 0, 255])).unwrap();
        assert_eq!(out.dimensions(), (2, 2));
        assert_eq!(out.format(), PixelFormat::Rgb8);
        for px in out.data().chunks_exact(3) {
            assert_eq!(px, &[45, 67, 230]);
        }
    }

    #[test]
    fn empty_mask_is_identity() {
        let image = ImageFrame::filled(4, 3, PixelFormat::Rgb8, &[90, 10, 200]).unwrap();
        let mask = ImageFrame::filled(4, 3, PixelFormat::Gray8, &[0]).unwrap();
        let out = render_cpu(&image, &mask, &settings([255, 0, 0])).unwrap();
        assert_eq!(out, image);
    }

    #[test]
    fn rgba_source_is_rejected() {
        let image = ImageFrame::filled(1, 1, PixelFormat::Rgba8, &[1, 2, 3, 4]).unwrap();
        let mask = ImageFrame::filled(1, 1, PixelFormat::Gray8, &[255]).unwrap();
        let err = render_cpu(&image, &mask, &settings([0, 0, 0])).unwrap_err();
        assert!(matches!(err, RecolorError::Precondition(_)));
    }

    #[test]
    fn alpha_and_red_selection_differ() {
        let image = ImageFrame::filled(2, 2, PixelFormat::Rgb8, &[255, 255, 255]).unwrap();
        let mask = ImageFrame::filled(2, 2, PixelFormat::Rgba8, &[200, 0, 0, 50]).unwrap();
        let mut s = settings([0, 0, 0]);

        s.mask_channel = MaskChannel::Red;
        let red = render_cpu(&image, &mask, &s).unwrap();
        s.mask_channel = MaskChannel::Alpha;
        let alpha = render_cpu(&image, &mask, &s).unwrap();

        // white source: out = 255 * (1 - w)
        assert_eq!(red.pixel(0, 0), &[55, 55, 55]);
        assert_eq!(alpha.pixel(0, 0), &[205, 205, 205]);
    }

    #[test]
    fn backend_skips_without_mask() {
        let mut backend = CpuBackend::new(settings([0, 0, 255]));
        let image = Frame::Cpu(ImageFrame::filled(1, 1, PixelFormat::Rgb8, &[1, 1, 1]).unwrap());
        assert!(backend.render(&image, None).unwrap().is_none());
        backend.close().unwrap();
        backend.close().unwrap();
    }
}
