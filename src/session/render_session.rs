use std::sync::Arc;

use crate::config::ShaderJob;
use crate::encode::sink::{FrameSink, SinkConfig};
use crate::foundation::core::{Canvas, Fps, FrameIndex, FrameRange};
use crate::foundation::error::{ShadeError, ShadeResult};
use crate::program::{ChannelProgram, ChannelSources};
use crate::render::frame::FrameRGBA;
use crate::render::pipeline::{
    RenderStats, RenderThreading, build_thread_pool, render_frame, render_frame_parallel,
    render_range_to_sink,
};

/// Lifecycle of a [`RenderSession`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// Formulas accepted but not yet compiled.
    Uncompiled,
    /// Program compiled; ready to render.
    Compiled,
    /// A range render is in progress; holds the next frame to deliver.
    Rendering(FrameIndex),
    /// The last range render delivered every frame.
    Done,
    /// Compilation failed; the session cannot render.
    Failed(String),
}

/// Options controlling `RenderSession` rendering behavior.
#[derive(Clone, Debug, Default)]
pub struct RenderSessionOpts {
    /// Threading and chunking for range renders.
    pub threading: RenderThreading,
    /// Output rate reported to sinks.
    pub fps: Fps,
}

/// Session-oriented renderer.
///
/// A session front-loads compilation of the four channel formulas, then renders single frames
/// or streams ranges into a [`FrameSink`]. The compiled program is shared read-only with workers.
#[derive(Debug)]
pub struct RenderSession {
    sources: Option<ChannelSources>,
    program: Option<Arc<ChannelProgram>>,
    canvas: Canvas,
    frames: u64,
    opts: RenderSessionOpts,
    state: SessionState,
}

impl RenderSession {
    /// Session over an already compiled program.
    pub fn new(
        program: impl Into<Arc<ChannelProgram>>,
        canvas: Canvas,
        frames: u64,
        opts: RenderSessionOpts,
    ) -> ShadeResult<Self> {
        let canvas = Canvas::new(canvas.width, canvas.height)?;
        Ok(Self {
            sources: None,
            program: Some(program.into()),
            canvas,
            frames,
            opts,
            state: SessionState::Compiled,
        })
    }

    /// Session holding formulas that have not been compiled yet.
    pub fn uncompiled(
        sources: ChannelSources,
        canvas: Canvas,
        frames: u64,
        opts: RenderSessionOpts,
    ) -> ShadeResult<Self> {
        let canvas = Canvas::new(canvas.width, canvas.height)?;
        Ok(Self {
            sources: Some(sources),
            program: None,
            canvas,
            frames,
            opts,
            state: SessionState::Uncompiled,
        })
    }

    /// Compile the held formulas. A failure moves the session to [`SessionState::Failed`] for good.
    pub fn compile(&mut self) -> ShadeResult<()> {
        match &self.state {
            SessionState::Uncompiled => {}
            SessionState::Failed(msg) => {
                return Err(ShadeError::validation(format!(
                    "session failed to compile: {msg}"
                )));
            }
            _ => return Ok(()),
        }
        let Some(sources) = self.sources.as_ref() else {
            return Err(ShadeError::evaluation("uncompiled session has no formulas"));
        };
        match ChannelProgram::from_sources(sources) {
            Ok(program) => {
                self.program = Some(Arc::new(program));
                self.state = SessionState::Compiled;
                Ok(())
            }
            Err(e) => {
                tracing::warn!(error = %e, "compile failed");
                self.state = SessionState::Failed(e.to_string());
                Err(e)
            }
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Raster size.
    pub fn canvas(&self) -> Canvas {
        self.canvas
    }

    /// Number of frames in the sequence.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// The compiled program, once compilation succeeded.
    pub fn program(&self) -> Option<&Arc<ChannelProgram>> {
        self.program.as_ref()
    }

    fn ready_program(&self) -> ShadeResult<Arc<ChannelProgram>> {
        match (&self.state, &self.program) {
            (SessionState::Failed(msg), _) => Err(ShadeError::validation(format!(
                "session failed to compile: {msg}"
            ))),
            (SessionState::Uncompiled, _) | (_, None) => {
                Err(ShadeError::validation("session is not compiled"))
            }
            (_, Some(p)) => Ok(Arc::clone(p)),
        }
    }

    /// Render a single frame.
    pub fn render_frame(&self, frame: FrameIndex) -> ShadeResult<FrameRGBA> {
        if frame.0 >= self.frames {
            return Err(ShadeError::validation(format!(
                "render_frame frame {} must be within the {}-frame sequence",
                frame.0, self.frames
            )));
        }
        let program = self.ready_program()?;
        if self.opts.threading.parallel {
            let pool = build_thread_pool(self.opts.threading.threads)?;
            pool.install(|| render_frame_parallel(&program, self.canvas, frame))
        } else {
            render_frame(&program, self.canvas, frame)
        }
    }

    /// Render every frame of the sequence into `sink`.
    pub fn render_all(&mut self, sink: &mut dyn FrameSink) -> ShadeResult<RenderStats> {
        self.render_range(FrameRange::first(self.frames), sink)
    }

    /// Render a frame range and stream frames into a sink.
    ///
    /// The sink receives frames in strictly increasing frame index order. On failure the session
    /// returns to [`SessionState::Compiled`]; frames already delivered stay delivered.
    pub fn render_range(
        &mut self,
        range: FrameRange,
        sink: &mut dyn FrameSink,
    ) -> ShadeResult<RenderStats> {
        if range.is_empty() {
            return Err(ShadeError::validation(
                "render_range range must be non-empty",
            ));
        }
        if range.end.0 > self.frames {
            return Err(ShadeError::validation(
                "render_range range must be within the sequence",
            ));
        }
        let program = self.ready_program()?;

        self.state = SessionState::Rendering(range.start);
        let mut tracker = Progress {
            inner: sink,
            state: &mut self.state,
        };
        let res = render_range_to_sink(
            &program,
            self.canvas,
            self.opts.fps,
            range,
            &self.opts.threading,
            &mut tracker,
        );
        self.state = match res {
            Ok(_) => SessionState::Done,
            Err(_) => SessionState::Compiled,
        };
        res
    }
}

/// Forwards to the caller's sink while recording the next frame index in the session state.
struct Progress<'a, 'b, S: FrameSink + ?Sized> {
    inner: &'a mut S,
    state: &'b mut SessionState,
}

impl<S: FrameSink + ?Sized> FrameSink for Progress<'_, '_, S> {
    fn begin(&mut self, cfg: SinkConfig) -> ShadeResult<()> {
        self.inner.begin(cfg)
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRGBA) -> ShadeResult<()> {
        self.inner.push_frame(idx, frame)?;
        *self.state = SessionState::Rendering(FrameIndex(idx.0 + 1));
        Ok(())
    }

    fn end(&mut self) -> ShadeResult<()> {
        self.inner.end()
    }
}

/// Validate a job, compile its formulas and build a session.
///
/// Formula errors surface here, before any frame is rendered.
#[tracing::instrument(skip_all, fields(frames = job.frames))]
pub fn compile_session(job: &ShaderJob, threading: RenderThreading) -> ShadeResult<RenderSession> {
    job.validate()?;
    let opts = RenderSessionOpts {
        threading,
        fps: job.fps()?,
    };
    let mut session =
        RenderSession::uncompiled(job.channels.clone(), job.canvas()?, job.frames, opts)?;
    session.compile()?;
    tracing::info!(
        width = session.canvas.width,
        height = session.canvas.height,
        frames = session.frames,
        frame_invariant = session.program().is_some_and(|p| p.is_frame_invariant()),
        "session compiled"
    );
    Ok(session)
}

#[cfg(test)]
#[path = "../../tests/unit/session/render_session.rs"]
mod tests;
