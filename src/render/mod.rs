//! Pixel synthesis and frame sequencing.

pub(crate) mod composite;
pub(crate) mod frame;
pub(crate) mod pipeline;
pub(crate) mod pixel;
