use crate::foundation::core::{ImageFrame, PixelFormat};
use crate::foundation::error::{RecolorError, RecolorResult};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UploadRole {
    Image,
    Mask,
}

/// Widen host pixels to the RGBA8 texture layout.
///
/// Gray `v` becomes `(v, v, v, v)` so both the `r` and `a` swizzles read the single channel.
/// RGB masks repeat blue into alpha, which makes an alpha-channel read pick the last channel
/// as the host path does. RGB images get an opaque alpha.
pub fn expand_to_rgba8(frame: &ImageFrame, role: UploadRole) -> Vec<u8> {
    let data = frame.data();
    match frame.format() {
        PixelFormat::Rgba8 => data.to_vec(),
        PixelFormat::Gray8 => data.iter().flat_map(|&v| [v, v, v, v]).collect(),
        PixelFormat::Rgb8 => {
            let mut out = Vec::with_capacity(data.len() / 3 * 4);
            for px in data.chunks_exact(3) {
                let a = match role {
                    UploadRole::Image => 255,
                    UploadRole::Mask => px[2],
                };
                out.extend_from_slice(&[px[0], px[1], px[2], a]);
            }
            out
        }
    }
}

pub fn align_to(value: u32, alignment: u32) -> u32 {
    let mask = alignment - 1;
    (value + mask) & !mask
}

pub fn unpad_rows(
    padded: &[u8],
    width: u32,
    height: u32,
    padded_row_bytes: usize,
) -> RecolorResult<Vec<u8>> {
    let row_bytes = (width as usize) * 4;
    if padded_row_bytes < row_bytes || padded.len() < padded_row_bytes * (height as usize) {
        return Err(RecolorError::gpu(
            "readback buffer is smaller than the texture it holds",
        ));
    }
    let mut out = Vec::with_capacity(row_bytes * height as usize);
    for row in 0..height as usize {
        let start = row * padded_row_bytes;
        out.extend_from_slice(&padded[start..start + row_bytes]);
    }
    Ok(out)
}
