//! shadeframe renders RGBA image sequences from four per-channel arithmetic formulas.
//!
//! Each formula is evaluated at every pixel of every frame with `x` (column), `y` (row) and
//! `frame` bound, and the result is saturated into a byte. The API is session-oriented:
//!
//! - Compile four formulas into a [`ChannelProgram`] (parse errors, unknown names and bad calls
//!   are reported here, before any pixel is produced)
//! - Create a [`RenderSession`], or call [`render_frame`] / [`render_pixel`] directly
//! - Render single frames or stream a range into a [`FrameSink`]
#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod foundation;

/// Job files and CLI overrides.
pub mod config;
pub(crate) mod encode;
pub(crate) mod expression;
/// Compiled four-channel programs.
pub mod program;
pub(crate) mod render;
pub(crate) mod session;

pub use crate::foundation::core::{Canvas, Fps, FrameIndex, FrameRange};
pub use crate::foundation::error::{ShadeError, ShadeResult};
pub use crate::foundation::math::{ieee_remainder, saturate_channel};

pub use crate::config::{JobOverrides, ShaderJob};
pub use crate::encode::ffmpeg::{FfmpegSink, is_ffmpeg_on_path};
pub use crate::encode::png::{PngSequenceSink, write_png};
pub use crate::encode::sink::{FrameSink, InMemorySink, SinkConfig};
pub use crate::expression::ast::{BinaryOp, Expr, UnaryOp};
pub use crate::expression::error::{EvalError, ExprError};
pub use crate::expression::eval::{
    BOUND_NAMES, Binding, Scope, check_expr, check_pixel_expr, evaluate,
};
pub use crate::expression::intrinsics::Intrinsic;
pub use crate::expression::parser::parse_expr;
pub use crate::program::{Channel, ChannelProgram, ChannelSources};
pub use crate::render::composite::{BackdropSink, alpha_over, load_backdrop, over_pixel};
pub use crate::render::frame::FrameRGBA;
pub use crate::render::pipeline::{
    RenderStats, RenderThreading, render_frame, render_frame_parallel, render_frames,
    render_frames_with_stats, render_range_to_sink,
};
pub use crate::render::pixel::{Pixel, render_pixel};
pub use crate::session::render_session::{
    RenderSession, RenderSessionOpts, SessionState, compile_session,
};
