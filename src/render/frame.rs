use anyhow::Context as _;

use crate::foundation::core::Canvas;
use crate::foundation::error::{ShadeError, ShadeResult};
use crate::render::pixel::Pixel;

/// A rendered frame as RGBA8 pixels.
///
/// Alpha is straight (not premultiplied): each channel is exactly the saturated formula result.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameRGBA {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// RGBA8 bytes, tightly packed, row-major.
    pub data: Vec<u8>,
}

impl FrameRGBA {
    /// Allocate a transparent black frame.
    pub fn blank(canvas: Canvas) -> Self {
        Self {
            width: canvas.width,
            height: canvas.height,
            data: vec![0u8; canvas.rgba_len()],
        }
    }

    /// Wrap an existing RGBA8 buffer, checking its length.
    pub fn from_rgba(width: u32, height: u32, data: Vec<u8>) -> ShadeResult<Self> {
        let want = width as usize * height as usize * 4;
        if data.len() != want {
            return Err(ShadeError::validation(format!(
                "rgba buffer is {} bytes, expected {want} for {width}x{height}",
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Dimensions as a [`Canvas`].
    pub fn canvas(&self) -> Canvas {
        Canvas {
            width: self.width,
            height: self.height,
        }
    }

    /// Pixel at column `x`, row `y`.
    pub fn pixel(&self, x: u32, y: u32) -> Option<Pixel> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y as usize * self.width as usize + x as usize) * 4;
        Some([
            self.data[i],
            self.data[i + 1],
            self.data[i + 2],
            self.data[i + 3],
        ])
    }

    /// Byte length of one row.
    pub fn stride(&self) -> usize {
        self.width as usize * 4
    }

    /// Copy into an [`image::RgbaImage`].
    pub fn to_image(&self) -> ShadeResult<image::RgbaImage> {
        image::RgbaImage::from_raw(self.width, self.height, self.data.clone())
            .context("frame buffer does not match its dimensions")
            .map_err(ShadeError::from)
    }

    /// Take ownership of an [`image::RgbaImage`].
    pub fn from_image(img: image::RgbaImage) -> Self {
        let (width, height) = img.dimensions();
        Self {
            width,
            height,
            data: img.into_raw(),
        }
    }
}
