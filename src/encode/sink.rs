use crate::foundation::core::{Fps, FrameIndex};
use crate::foundation::error::{ShadeError, ShadeResult};
use crate::render::frame::FrameRGBA;

/// Configuration provided to a [`FrameSink`] at the start of a range render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SinkConfig {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Playback rate, for sinks that encode time.
    pub fps: Fps,
}

/// Sink contract for consuming rendered frames in timeline order.
///
/// Ordering contract: `begin` once, then `push_frame` in strictly increasing `FrameIndex` order
/// within the requested render range, then `end` once.
pub trait FrameSink {
    /// Prepare for a range of frames of the given size.
    fn begin(&mut self, cfg: SinkConfig) -> ShadeResult<()>;
    /// Consume one completed frame.
    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRGBA) -> ShadeResult<()>;
    /// Flush and finalize.
    fn end(&mut self) -> ShadeResult<()>;
}

impl<S: FrameSink + ?Sized> FrameSink for &mut S {
    fn begin(&mut self, cfg: SinkConfig) -> ShadeResult<()> {
        (**self).begin(cfg)
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRGBA) -> ShadeResult<()> {
        (**self).push_frame(idx, frame)
    }

    fn end(&mut self) -> ShadeResult<()> {
        (**self).end()
    }
}

/// Checks shared by the built-in sinks: size matches `begin` and indices strictly increase.
#[derive(Debug, Default, Clone)]
pub(crate) struct FrameOrder {
    cfg: Option<SinkConfig>,
    last: Option<FrameIndex>,
}

impl FrameOrder {
    pub(crate) fn begin(&mut self, cfg: SinkConfig) -> ShadeResult<()> {
        if cfg.width == 0 || cfg.height == 0 {
            return Err(ShadeError::validation(
                "sink width/height must be non-zero",
            ));
        }
        self.cfg = Some(cfg);
        self.last = None;
        Ok(())
    }

    pub(crate) fn accept(&mut self, idx: FrameIndex, frame: &FrameRGBA) -> ShadeResult<SinkConfig> {
        let Some(cfg) = self.cfg else {
            return Err(ShadeError::evaluation("push_frame called before begin"));
        };
        if let Some(last) = self.last
            && idx <= last
        {
            return Err(ShadeError::validation(format!(
                "frame {} delivered after frame {}",
                idx.0, last.0
            )));
        }
        if frame.width != cfg.width || frame.height != cfg.height {
            return Err(ShadeError::validation(format!(
                "frame size mismatch: got {}x{}, expected {}x{}",
                frame.width, frame.height, cfg.width, cfg.height
            )));
        }
        self.last = Some(idx);
        Ok(cfg)
    }

    pub(crate) fn config(&self) -> Option<SinkConfig> {
        self.cfg
    }
}

/// In-memory sink for tests and debugging.
#[derive(Debug, Default)]
pub struct InMemorySink {
    order: FrameOrder,
    /// Frames in timeline order.
    pub frames: Vec<(FrameIndex, FrameRGBA)>,
    ended: bool,
}

impl InMemorySink {
    /// Empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configuration received by the last `begin`.
    pub fn config(&self) -> Option<SinkConfig> {
        self.order.config()
    }

    /// Return `true` once `end` has been called.
    pub fn is_ended(&self) -> bool {
        self.ended
    }

    /// Drop the indices and keep the frames.
    pub fn into_frames(self) -> Vec<FrameRGBA> {
        self.frames.into_iter().map(|(_, f)| f).collect()
    }
}

impl FrameSink for InMemorySink {
    fn begin(&mut self, cfg: SinkConfig) -> ShadeResult<()> {
        self.order.begin(cfg)?;
        self.frames.clear();
        self.ended = false;
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRGBA) -> ShadeResult<()> {
        self.order.accept(idx, frame)?;
        self.frames.push((idx, frame.clone()));
        Ok(())
    }

    fn end(&mut self) -> ShadeResult<()> {
        self.ended = true;
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/encode/sink.rs"]
mod tests;
