use crate::expression::eval::Binding;
use crate::expression::vm::eval_program_with_stack;
use crate::foundation::error::{ShadeError, ShadeResult};
use crate::foundation::math::saturate_channel;
use crate::program::{Channel, ChannelProgram};

/// One RGBA8 pixel, straight alpha.
pub type Pixel = [u8; 4];

/// Evaluate the four channels at `(x, y)` of `frame` and saturate them into a pixel.
///
/// Uses the tree evaluator. A failure on any channel fails the whole pixel.
pub fn render_pixel(program: &ChannelProgram, x: i64, y: i64, frame: i64) -> ShadeResult<Pixel> {
    let binding = Binding::new(x, y, frame);
    let mut out = [0u8; 4];
    for channel in Channel::ALL {
        out[channel.index()] = saturate_channel(program.eval_channel(channel, binding)?);
    }
    Ok(out)
}

/// Per-worker pixel evaluator running the lowered bytecode with one reusable stack.
///
/// Produces the same pixels as [`render_pixel`].
pub(crate) struct PixelShader<'p> {
    program: &'p ChannelProgram,
    stack: Vec<f64>,
}

impl<'p> PixelShader<'p> {
    pub(crate) fn new(program: &'p ChannelProgram) -> Self {
        Self {
            program,
            stack: Vec::with_capacity(program.max_stack()),
        }
    }

    pub(crate) fn shade(&mut self, binding: Binding) -> ShadeResult<Pixel> {
        let vars = binding.values();
        let mut out = [0u8; 4];
        for channel in Channel::ALL {
            let v = eval_program_with_stack(self.program.bytecode(channel), vars, &mut self.stack)
                .map_err(|e| ShadeError::evaluation(format!("{channel} channel: {e}")))?;
            out[channel.index()] = saturate_channel(v);
        }
        Ok(out)
    }

    /// Fill one RGBA8 row `y` of `frame`; `row.len()` must be a multiple of 4.
    pub(crate) fn shade_row(&mut self, row: &mut [u8], y: i64, frame: i64) -> ShadeResult<()> {
        for (x, px) in row.chunks_exact_mut(4).enumerate() {
            let p = self.shade(Binding::new(x as i64, y, frame))?;
            px.copy_from_slice(&p);
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/pixel.rs"]
mod tests;
