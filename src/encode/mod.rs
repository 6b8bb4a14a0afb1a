//! Frame sinks.
//!
//! Sinks consume rendered frames in timeline order and are driven by
//! [`render_range_to_sink`](crate::render_range_to_sink) and [`RenderSession`](crate::RenderSession).

pub(crate) mod ffmpeg;
pub(crate) mod png;
pub(crate) mod sink;
