use std::path::Path;

use anyhow::Context as _;

use crate::encode::sink::{FrameSink, SinkConfig};
use crate::foundation::core::FrameIndex;
use crate::foundation::error::{ShadeError, ShadeResult};
use crate::foundation::math::mul_div255_u16;
use crate::render::frame::FrameRGBA;
use crate::render::pixel::Pixel;

/// Porter-Duff source-over for straight-alpha RGBA8 pixels.
pub fn over_pixel(dst: Pixel, src: Pixel) -> Pixel {
    let sa = u32::from(src[3]);
    if sa == 255 {
        return src;
    }
    if sa == 0 {
        return dst;
    }

    let da = u32::from(mul_div255_u16(u16::from(dst[3]), 255 - sa as u16));
    let out_a = sa + da;

    let mut out = [0u8; 4];
    for i in 0..3 {
        let num = u32::from(src[i]) * sa + u32::from(dst[i]) * da;
        out[i] = ((num + out_a / 2) / out_a).min(255) as u8;
    }
    out[3] = out_a.min(255) as u8;
    out
}

/// Composite `src` over `backdrop`; both must have the same dimensions.
pub fn alpha_over(backdrop: &FrameRGBA, src: &FrameRGBA) -> ShadeResult<FrameRGBA> {
    let mut out = backdrop.clone();
    over_in_place(&mut out, src)?;
    Ok(out)
}

fn over_in_place(dst: &mut FrameRGBA, src: &FrameRGBA) -> ShadeResult<()> {
    if dst.width != src.width || dst.height != src.height {
        return Err(ShadeError::validation(format!(
            "backdrop is {}x{}, frame is {}x{}",
            dst.width, dst.height, src.width, src.height
        )));
    }
    for (d, s) in dst.data.chunks_exact_mut(4).zip(src.data.chunks_exact(4)) {
        let out = over_pixel([d[0], d[1], d[2], d[3]], [s[0], s[1], s[2], s[3]]);
        d.copy_from_slice(&out);
    }
    Ok(())
}

/// Load an image file as a straight-alpha RGBA8 backdrop.
pub fn load_backdrop(path: &Path) -> ShadeResult<FrameRGBA> {
    let img = image::open(path)
        .with_context(|| format!("open backdrop '{}'", path.display()))?
        .into_rgba8();
    Ok(FrameRGBA::from_image(img))
}

/// Sink adapter compositing every frame over a fixed backdrop before forwarding it.
pub struct BackdropSink<S> {
    backdrop: FrameRGBA,
    inner: S,
    scratch: Option<FrameRGBA>,
}

impl<S: FrameSink> BackdropSink<S> {
    /// Wrap `inner`.
    pub fn new(backdrop: FrameRGBA, inner: S) -> Self {
        Self {
            backdrop,
            inner,
            scratch: None,
        }
    }

    /// Unwrap the inner sink.
    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S: FrameSink> FrameSink for BackdropSink<S> {
    fn begin(&mut self, cfg: SinkConfig) -> ShadeResult<()> {
        if cfg.width != self.backdrop.width || cfg.height != self.backdrop.height {
            return Err(ShadeError::validation(format!(
                "backdrop is {}x{}, render is {}x{}",
                self.backdrop.width, self.backdrop.height, cfg.width, cfg.height
            )));
        }
        self.inner.begin(cfg)
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRGBA) -> ShadeResult<()> {
        let scratch = self.scratch.get_or_insert_with(|| self.backdrop.clone());
        scratch.data.copy_from_slice(&self.backdrop.data);
        over_in_place(scratch, frame)?;
        self.inner.push_frame(idx, scratch)
    }

    fn end(&mut self) -> ShadeResult<()> {
        self.inner.end()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/composite.rs"]
mod tests;
