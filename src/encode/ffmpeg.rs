use std::io::Read as _;
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command, Stdio};
use std::thread::JoinHandle;

use crate::encode::sink::{FrameOrder, FrameSink, SinkConfig};
use crate::foundation::core::FrameIndex;
use crate::foundation::error::{ShadeError, ShadeResult};
use crate::foundation::math::mul_div255_u16;
use crate::render::frame::FrameRGBA;

/// Return `true` when an `ffmpeg` binary answers `-version`.
pub fn is_ffmpeg_on_path() -> bool {
    Command::new("ffmpeg")
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

pub(crate) fn ensure_parent_dir(path: &Path) -> ShadeResult<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        use anyhow::Context as _;
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory '{}'", parent.display()))?;
    }
    Ok(())
}

/// Check that a sink configuration can be encoded as yuv420p H.264 at an integer rate.
pub(crate) fn validate_mp4_config(cfg: &SinkConfig) -> ShadeResult<u32> {
    if cfg.width == 0 || cfg.height == 0 {
        return Err(ShadeError::validation(
            "encode width/height must be non-zero",
        ));
    }
    if !cfg.width.is_multiple_of(2) || !cfg.height.is_multiple_of(2) {
        return Err(ShadeError::validation(
            "encode width/height must be even (required for yuv420p mp4 output)",
        ));
    }
    if cfg.fps.den != 1 || cfg.fps.num == 0 {
        return Err(ShadeError::validation(format!(
            "mp4 output requires a positive integer fps, got {}/{}",
            cfg.fps.num, cfg.fps.den
        )));
    }
    Ok(cfg.fps.num)
}

/// Streams frames to a system `ffmpeg` process producing an H.264 MP4.
///
/// Straight alpha is flattened over `bg_rgba` before encoding.
pub struct FfmpegSink {
    out_path: PathBuf,
    bg_rgba: [u8; 4],
    overwrite: bool,
    order: FrameOrder,
    child: Option<Child>,
    stdin: Option<ChildStdin>,
    stderr_drain: Option<JoinHandle<String>>,
    scratch: Vec<u8>,
}

impl FfmpegSink {
    /// Sink writing to `out_path`, flattening alpha over `bg_rgba`.
    pub fn new(out_path: impl Into<PathBuf>, bg_rgba: [u8; 4]) -> Self {
        Self {
            out_path: out_path.into(),
            bg_rgba,
            overwrite: true,
            order: FrameOrder::default(),
            child: None,
            stdin: None,
            stderr_drain: None,
            scratch: Vec::new(),
        }
    }

    /// Refuse to replace an existing output file.
    pub fn no_overwrite(mut self) -> Self {
        self.overwrite = false;
        self
    }
}

impl FrameSink for FfmpegSink {
    fn begin(&mut self, cfg: SinkConfig) -> ShadeResult<()> {
        let fps = validate_mp4_config(&cfg)?;
        self.order.begin(cfg)?;
        ensure_parent_dir(&self.out_path)?;

        if !self.overwrite && self.out_path.exists() {
            return Err(ShadeError::validation(format!(
                "output file '{}' already exists",
                self.out_path.display()
            )));
        }
        if !is_ffmpeg_on_path() {
            return Err(ShadeError::evaluation(
                "ffmpeg is required for MP4 encoding, but was not found on PATH",
            ));
        }

        let mut cmd = Command::new("ffmpeg");
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());
        cmd.arg(if self.overwrite { "-y" } else { "-n" });
        cmd.args([
            "-loglevel",
            "error",
            "-f",
            "rawvideo",
            "-pix_fmt",
            "rgba",
            "-s",
            &format!("{}x{}", cfg.width, cfg.height),
            "-r",
            &fps.to_string(),
            "-i",
            "pipe:0",
            "-an",
            "-c:v",
            "libx264",
            "-pix_fmt",
            "yuv420p",
            "-movflags",
            "+faststart",
        ])
        .arg(&self.out_path);

        let mut child = cmd.spawn().map_err(|e| {
            ShadeError::evaluation(format!(
                "failed to spawn ffmpeg (is it installed and on PATH?): {e}"
            ))
        })?;
        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| ShadeError::evaluation("failed to open ffmpeg stdin (unexpected)"))?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| ShadeError::evaluation("failed to open ffmpeg stderr (unexpected)"))?;
        // ffmpeg stalls once its stderr pipe is full.
        self.stderr_drain = Some(std::thread::spawn(move || {
            let mut buf = String::new();
            let _ = stderr.read_to_string(&mut buf);
            buf
        }));

        tracing::debug!(out = %self.out_path.display(), width = cfg.width, height = cfg.height, fps, "ffmpeg started");
        self.scratch = vec![0u8; cfg.width as usize * cfg.height as usize * 4];
        self.child = Some(child);
        self.stdin = Some(stdin);
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRGBA) -> ShadeResult<()> {
        self.order.accept(idx, frame)?;
        flatten_to_opaque_rgba8(&mut self.scratch, &frame.data, self.bg_rgba)?;

        let Some(stdin) = self.stdin.as_mut() else {
            return Err(ShadeError::evaluation("ffmpeg encoder is not running"));
        };
        use std::io::Write as _;
        stdin.write_all(&self.scratch).map_err(|e| {
            ShadeError::evaluation(format!("failed to write frame to ffmpeg stdin: {e}"))
        })?;
        Ok(())
    }

    fn end(&mut self) -> ShadeResult<()> {
        drop(self.stdin.take());
        let Some(mut child) = self.child.take() else {
            return Err(ShadeError::evaluation("ffmpeg encoder is not running"));
        };

        let status = child.wait().map_err(|e| {
            ShadeError::evaluation(format!("failed to wait for ffmpeg to finish: {e}"))
        })?;
        let stderr = self
            .stderr_drain
            .take()
            .and_then(|h| h.join().ok())
            .unwrap_or_default();

        if !status.success() {
            return Err(ShadeError::evaluation(format!(
                "ffmpeg exited with status {status}: {}",
                stderr.trim()
            )));
        }
        if !stderr.trim().is_empty() {
            tracing::warn!(stderr = stderr.trim(), "ffmpeg reported diagnostics");
        }
        Ok(())
    }
}

impl Drop for FfmpegSink {
    fn drop(&mut self) {
        drop(self.stdin.take());
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

/// Composite straight-alpha RGBA8 `src` over the opaque color `bg_rgba` into `dst`.
pub(crate) fn flatten_to_opaque_rgba8(
    dst: &mut [u8],
    src: &[u8],
    bg_rgba: [u8; 4],
) -> ShadeResult<()> {
    if dst.len() != src.len() || !dst.len().is_multiple_of(4) {
        return Err(ShadeError::validation(
            "flatten_to_opaque_rgba8 expects equal-length rgba8 buffers",
        ));
    }

    let bg = [
        u16::from(bg_rgba[0]),
        u16::from(bg_rgba[1]),
        u16::from(bg_rgba[2]),
    ];

    for (d, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
        let a = u16::from(s[3]);
        if a == 255 {
            d.copy_from_slice(s);
            continue;
        }
        let inv = 255 - a;
        for i in 0..3 {
            let c = mul_div255_u16(u16::from(s[i]), a) + mul_div255_u16(bg[i], inv);
            d[i] = c.min(255) as u8;
        }
        d[3] = 255;
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/encode/ffmpeg.rs"]
mod tests;
