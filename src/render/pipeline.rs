use rayon::prelude::*;

use crate::encode::sink::{FrameSink, SinkConfig};
use crate::foundation::core::{Canvas, Fps, FrameIndex, FrameRange};
use crate::foundation::error::{ShadeError, ShadeResult};
use crate::program::ChannelProgram;
use crate::render::frame::FrameRGBA;
use crate::render::pixel::PixelShader;

/// Render a single frame, row by row on the calling thread.
///
/// Returns a [`FrameRGBA`] containing **straight** RGBA8 pixels.
#[tracing::instrument(skip(program, frame), fields(frame = frame.0))]
pub fn render_frame(
    program: &ChannelProgram,
    canvas: Canvas,
    frame: FrameIndex,
) -> ShadeResult<FrameRGBA> {
    let mut shader = PixelShader::new(program);
    render_frame_with(&mut shader, canvas, frame)
}

/// Render a single frame with rows spread over the current rayon pool.
///
/// Each worker owns its evaluation stack; the result is byte-identical to [`render_frame`].
#[tracing::instrument(skip(program, frame), fields(frame = frame.0))]
pub fn render_frame_parallel(
    program: &ChannelProgram,
    canvas: Canvas,
    frame: FrameIndex,
) -> ShadeResult<FrameRGBA> {
    let f = frame_value(frame)?;
    let mut out = blank_frame(canvas)?;
    let stride = out.stride();
    out.data
        .par_chunks_mut(stride)
        .enumerate()
        .try_for_each_init(
            || PixelShader::new(program),
            |shader, (y, row)| shader.shade_row(row, y as i64, f),
        )?;
    Ok(out)
}

fn render_frame_with(
    shader: &mut PixelShader<'_>,
    canvas: Canvas,
    frame: FrameIndex,
) -> ShadeResult<FrameRGBA> {
    let f = frame_value(frame)?;
    let mut out = blank_frame(canvas)?;
    let stride = out.stride();
    for (y, row) in out.data.chunks_exact_mut(stride).enumerate() {
        shader.shade_row(row, y as i64, f)?;
    }
    Ok(out)
}

fn blank_frame(canvas: Canvas) -> ShadeResult<FrameRGBA> {
    Canvas::new(canvas.width, canvas.height).map(FrameRGBA::blank)
}

fn frame_value(frame: FrameIndex) -> ShadeResult<i64> {
    i64::try_from(frame.0)
        .map_err(|_| ShadeError::validation(format!("frame index {} is out of range", frame.0)))
}

/// Threading and chunking for range renders.
#[derive(Clone, Debug)]
pub struct RenderThreading {
    /// Render frames of a chunk concurrently on a dedicated rayon pool.
    pub parallel: bool,
    /// Frames per chunk; `0` is treated as `1`.
    pub chunk_size: usize,
    /// Override the number of rayon worker threads. `None` uses rayon defaults.
    pub threads: Option<usize>,
    /// Render once and repeat when no channel reads `frame`.
    pub static_frame_elision: bool,
}

impl Default for RenderThreading {
    fn default() -> Self {
        Self {
            parallel: false,
            chunk_size: 64,
            threads: None,
            static_frame_elision: true,
        }
    }
}

/// Range render statistics.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RenderStats {
    /// Total frames in the requested range.
    pub frames_total: u64,
    /// Frames actually evaluated.
    pub frames_rendered: u64,
    /// Frames repeated from an earlier render because the program ignores `frame`.
    pub frames_elided: u64,
}

/// Render a frame range into memory.
pub fn render_frames(
    program: &ChannelProgram,
    canvas: Canvas,
    range: FrameRange,
) -> ShadeResult<Vec<FrameRGBA>> {
    render_frames_with_stats(program, canvas, range, &RenderThreading::default())
        .map(|(frames, _)| frames)
}

/// [`render_frames`] with explicit threading, also returning [`RenderStats`].
pub fn render_frames_with_stats(
    program: &ChannelProgram,
    canvas: Canvas,
    range: FrameRange,
    threading: &RenderThreading,
) -> ShadeResult<(Vec<FrameRGBA>, RenderStats)> {
    let mut sink = crate::encode::sink::InMemorySink::new();
    let stats = render_range_to_sink(
        program,
        canvas,
        Fps::default(),
        range,
        threading,
        &mut sink,
    )?;
    Ok((sink.into_frames(), stats))
}

/// Render `range` and stream the frames, in increasing index order, into `sink`.
///
/// Frames are rendered in chunks of `threading.chunk_size`; a chunk is fully rendered before any
/// of its frames reach the sink. On error the sink has seen only frames before the failing chunk
/// and `end` is not called.
#[tracing::instrument(
    skip(program, threading, sink),
    fields(start = range.start.0, end = range.end.0)
)]
pub fn render_range_to_sink(
    program: &ChannelProgram,
    canvas: Canvas,
    fps: Fps,
    range: FrameRange,
    threading: &RenderThreading,
    sink: &mut dyn FrameSink,
) -> ShadeResult<RenderStats> {
    if range.is_empty() {
        return Err(ShadeError::validation("render range must be non-empty"));
    }

    let chunk_size = normalized_chunk_size(threading.chunk_size);
    let pool = if threading.parallel {
        Some(build_thread_pool(threading.threads)?)
    } else {
        None
    };

    sink.begin(SinkConfig {
        width: canvas.width,
        height: canvas.height,
        fps,
    })?;

    let mut stats = RenderStats::default();

    if threading.static_frame_elision && program.is_frame_invariant() {
        let frame = match pool.as_ref() {
            Some(pool) => pool.install(|| render_frame_parallel(program, canvas, range.start))?,
            None => render_frame(program, canvas, range.start)?,
        };
        stats.frames_rendered = 1;
        for f in range.iter() {
            sink.push_frame(f, &frame)?;
            stats.frames_total += 1;
        }
        stats.frames_elided = stats.frames_total - stats.frames_rendered;
        tracing::debug!(frames = stats.frames_total, "program ignores frame; rendered once");
    } else {
        let mut shader = PixelShader::new(program);
        let mut chunk_start = range.start.0;
        while chunk_start < range.end.0 {
            let chunk_end = (chunk_start + chunk_size).min(range.end.0);
            let frames = match pool.as_ref() {
                Some(pool) => render_chunk_parallel(program, canvas, chunk_start, chunk_end, pool)?,
                None => (chunk_start..chunk_end)
                    .map(|f| render_frame_with(&mut shader, canvas, FrameIndex(f)))
                    .collect::<ShadeResult<Vec<_>>>()?,
            };
            for (f, frame) in (chunk_start..chunk_end).zip(&frames) {
                sink.push_frame(FrameIndex(f), frame)?;
            }
            let n = chunk_end - chunk_start;
            stats.frames_total += n;
            stats.frames_rendered += n;
            tracing::debug!(chunk_start, chunk_end, "chunk delivered");
            chunk_start = chunk_end;
        }
    }

    sink.end()?;
    tracing::info!(
        frames_total = stats.frames_total,
        frames_rendered = stats.frames_rendered,
        frames_elided = stats.frames_elided,
        "range rendered"
    );
    Ok(stats)
}

fn render_chunk_parallel(
    program: &ChannelProgram,
    canvas: Canvas,
    start: u64,
    end: u64,
    pool: &rayon::ThreadPool,
) -> ShadeResult<Vec<FrameRGBA>> {
    let rendered = pool.install(|| {
        (start..end)
            .into_par_iter()
            .map_init(
                || PixelShader::new(program),
                |shader, f| render_frame_with(shader, canvas, FrameIndex(f)),
            )
            .collect::<Vec<_>>()
    });
    rendered.into_iter().collect()
}

pub(crate) fn build_thread_pool(threads: Option<usize>) -> ShadeResult<rayon::ThreadPool> {
    if let Some(n) = threads
        && n == 0
    {
        return Err(ShadeError::validation(
            "render threading 'threads' must be >= 1 when set",
        ));
    }

    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(n) = threads {
        builder = builder.num_threads(n);
    }
    builder
        .build()
        .map_err(|e| ShadeError::evaluation(format!("failed to build rayon thread pool: {e}")))
}

fn normalized_chunk_size(chunk_size: usize) -> u64 {
    if chunk_size == 0 {
        1
    } else {
        chunk_size as u64
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/pipeline.rs"]
mod tests;
