//! The recolor operator's numeric core, shared by every backend.

pub mod blend;
pub mod channel;
pub mod resample;
