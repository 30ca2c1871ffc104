pub mod backend;
pub mod cpu;
#[cfg(feature = "gpu")]
pub mod gpu;
pub mod lifecycle;
pub mod shader;
pub mod texels;
