use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use crate::foundation::core::{Canvas, Fps};
use crate::foundation::error::{ShadeError, ShadeResult};
use crate::program::{Channel, ChannelSources};

fn default_fps() -> u32 {
    30
}

fn default_frames() -> u64 {
    1
}

/// A render job: four channel formulas plus raster size, length and rate.
///
/// This is the JSON-facing representation read by the CLI:
///
/// ```json
/// { "width": 256, "height": 256, "frames": 60, "fps": 30,
///   "channels": { "r": "x", "g": "y", "b": "frame", "a": "255" } }
/// ```
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ShaderJob {
    /// Raster width; taken from the backdrop when omitted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    /// Raster height; taken from the backdrop when omitted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    /// Number of frames, rendered as indices `0..frames`.
    #[serde(default = "default_frames")]
    pub frames: u64,
    /// Integer output frame rate.
    #[serde(default = "default_fps")]
    pub fps: u32,
    /// Channel formulas.
    pub channels: ChannelSources,
    /// Optional image every frame is composited over.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backdrop: Option<PathBuf>,
}

impl ShaderJob {
    /// Job with explicit size and length, default fps and no backdrop.
    pub fn new(width: u32, height: u32, frames: u64, channels: ChannelSources) -> Self {
        Self {
            width: Some(width),
            height: Some(height),
            frames,
            fps: default_fps(),
            channels,
            backdrop: None,
        }
    }

    /// Parse a job from a JSON reader.
    pub fn from_reader<R: std::io::Read>(r: R) -> ShadeResult<Self> {
        serde_json::from_reader(r).map_err(|e| ShadeError::serde(format!("parse job JSON: {e}")))
    }

    /// Parse a job from a JSON file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> ShadeResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            ShadeError::validation(format!("open job JSON '{}': {e}", path.display()))
        })?;
        Self::from_reader(BufReader::new(f))
    }

    /// Check sizes and counts. Formula text is checked by [`crate::ChannelProgram::compile`].
    pub fn validate(&self) -> ShadeResult<()> {
        if self.frames == 0 {
            return Err(ShadeError::validation("job frames must be >= 1"));
        }
        if self.fps == 0 {
            return Err(ShadeError::validation("job fps must be >= 1"));
        }
        if self.width == Some(0) || self.height == Some(0) {
            return Err(ShadeError::validation("job width/height must be non-zero"));
        }
        if (self.width.is_none() || self.height.is_none()) && self.backdrop.is_none() {
            return Err(ShadeError::validation(
                "job needs width and height unless a backdrop provides them",
            ));
        }
        Ok(())
    }

    /// Output rate as an [`Fps`].
    pub fn fps(&self) -> ShadeResult<Fps> {
        Fps::integer(self.fps)
    }

    /// Raster size, reading the backdrop's dimensions for any side not given explicitly.
    pub fn canvas(&self) -> ShadeResult<Canvas> {
        match (self.width, self.height, self.backdrop.as_deref()) {
            (Some(w), Some(h), _) => Canvas::new(w, h),
            (w, h, Some(path)) => {
                let (bw, bh) = image::image_dimensions(path).map_err(|e| {
                    ShadeError::validation(format!(
                        "read backdrop dimensions '{}': {e}",
                        path.display()
                    ))
                })?;
                Canvas::new(w.unwrap_or(bw), h.unwrap_or(bh))
            }
            _ => Err(ShadeError::validation(
                "job needs width and height unless a backdrop provides them",
            )),
        }
    }
}

/// Field-by-field overrides applied on top of an optional job file.
#[derive(Debug, Clone, Default)]
pub struct JobOverrides {
    /// Red formula.
    pub r: Option<String>,
    /// Green formula.
    pub g: Option<String>,
    /// Blue formula.
    pub b: Option<String>,
    /// Alpha formula.
    pub a: Option<String>,
    /// Raster width.
    pub width: Option<u32>,
    /// Raster height.
    pub height: Option<u32>,
    /// Frame count.
    pub frames: Option<u64>,
    /// Frame rate.
    pub fps: Option<u32>,
    /// Backdrop image.
    pub backdrop: Option<PathBuf>,
}

impl JobOverrides {
    /// Merge onto `base`; without a base, R, G and B must all be given.
    pub fn apply(self, base: Option<ShaderJob>) -> ShadeResult<ShaderJob> {
        let mut job = match base {
            Some(job) => job,
            None => {
                let missing = |c: Channel| {
                    ShadeError::validation(format!("no job file and no {c} channel formula given"))
                };
                let r = self.r.clone().ok_or_else(|| missing(Channel::Red))?;
                let g = self.g.clone().ok_or_else(|| missing(Channel::Green))?;
                let b = self.b.clone().ok_or_else(|| missing(Channel::Blue))?;
                let a = self
                    .a
                    .clone()
                    .unwrap_or_else(crate::program::opaque_alpha);
                ShaderJob {
                    width: None,
                    height: None,
                    frames: default_frames(),
                    fps: default_fps(),
                    channels: ChannelSources::new(r, g, b, a),
                    backdrop: None,
                }
            }
        };

        if let Some(r) = self.r {
            job.channels.r = r;
        }
        if let Some(g) = self.g {
            job.channels.g = g;
        }
        if let Some(b) = self.b {
            job.channels.b = b;
        }
        if let Some(a) = self.a {
            job.channels.a = a;
        }
        if let Some(w) = self.width {
            job.width = Some(w);
        }
        if let Some(h) = self.height {
            job.height = Some(h);
        }
        if let Some(n) = self.frames {
            job.frames = n;
        }
        if let Some(fps) = self.fps {
            job.fps = fps;
        }
        if let Some(path) = self.backdrop {
            job.backdrop = Some(path);
        }
        Ok(job)
    }
}

#[cfg(test)]
#[path = "../tests/unit/config/config.rs"]
mod tests;
