use std::fmt;

use crate::expression::ast::Expr;
use crate::expression::bytecode::{BytecodeProgram, VarSlot};
use crate::expression::eval::{Binding, check_pixel_expr, evaluate};
use crate::expression::lower::lower_to_bytecode;
use crate::expression::parser::parse_expr;
use crate::foundation::error::{ShadeError, ShadeResult};

/// One of the four output channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Channel {
    /// Red.
    Red,
    /// Green.
    Green,
    /// Blue.
    Blue,
    /// Alpha.
    Alpha,
}

impl Channel {
    /// All channels in compile and output order.
    pub const ALL: [Channel; 4] = [Self::Red, Self::Green, Self::Blue, Self::Alpha];

    /// Byte offset of this channel within an RGBA8 pixel.
    pub fn index(self) -> usize {
        match self {
            Self::Red => 0,
            Self::Green => 1,
            Self::Blue => 2,
            Self::Alpha => 3,
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Red => "R",
            Self::Green => "G",
            Self::Blue => "B",
            Self::Alpha => "A",
        })
    }
}

/// The four formula strings of a shader, as authored.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ChannelSources {
    /// Red formula.
    pub r: String,
    /// Green formula.
    pub g: String,
    /// Blue formula.
    pub b: String,
    /// Alpha formula; opaque when omitted.
    #[serde(default = "opaque_alpha")]
    pub a: String,
}

pub(crate) fn opaque_alpha() -> String {
    "255".to_owned()
}

impl ChannelSources {
    /// Bundle four formulas.
    pub fn new(
        r: impl Into<String>,
        g: impl Into<String>,
        b: impl Into<String>,
        a: impl Into<String>,
    ) -> Self {
        Self {
            r: r.into(),
            g: g.into(),
            b: b.into(),
            a: a.into(),
        }
    }

    /// Formula for `channel`.
    pub fn get(&self, channel: Channel) -> &str {
        match channel {
            Channel::Red => &self.r,
            Channel::Green => &self.g,
            Channel::Blue => &self.b,
            Channel::Alpha => &self.a,
        }
    }
}

#[derive(Debug, Clone)]
struct CompiledChannel {
    source: String,
    tree: Expr,
    bytecode: BytecodeProgram,
}

/// Four parsed, validated and lowered channel formulas.
///
/// Built once per run by [`ChannelProgram::compile`]; immutable afterwards and shared read-only
/// between render workers.
#[derive(Debug, Clone)]
pub struct ChannelProgram {
    channels: [CompiledChannel; 4],
}

impl ChannelProgram {
    /// Parse R, G, B, A in that order, then validate names and calls once.
    ///
    /// The first parse failure aborts compilation and names its channel. Validation runs only
    /// after all four formulas parse.
    #[tracing::instrument(skip_all)]
    pub fn compile(r: &str, g: &str, b: &str, a: &str) -> ShadeResult<Self> {
        let sources = [r, g, b, a];

        let mut trees = Vec::with_capacity(4);
        for (channel, src) in Channel::ALL.into_iter().zip(sources) {
            let tree = parse_expr(src).map_err(|error| ShadeError::Parse {
                channel,
                formula: src.to_owned(),
                error,
            })?;
            trees.push(tree);
        }

        for (channel, tree) in Channel::ALL.into_iter().zip(&trees) {
            check_pixel_expr(tree).map_err(|e| ShadeError::from_eval(channel, e))?;
        }

        let mut compiled = Vec::with_capacity(4);
        for ((channel, src), tree) in Channel::ALL.into_iter().zip(sources).zip(trees) {
            let bytecode =
                lower_to_bytecode(&tree).map_err(|e| ShadeError::from_eval(channel, e))?;
            tracing::debug!(%channel, formula = src, ops = bytecode.ops.len(), "compiled channel");
            compiled.push(CompiledChannel {
                source: src.to_owned(),
                tree,
                bytecode,
            });
        }

        let channels: [CompiledChannel; 4] = compiled
            .try_into()
            .map_err(|_| ShadeError::evaluation("internal error: expected four channels"))?;
        Ok(Self { channels })
    }

    /// [`ChannelProgram::compile`] from a [`ChannelSources`] bundle.
    pub fn from_sources(sources: &ChannelSources) -> ShadeResult<Self> {
        Self::compile(&sources.r, &sources.g, &sources.b, &sources.a)
    }

    /// Parsed tree of one channel.
    pub fn tree(&self, channel: Channel) -> &Expr {
        &self.channels[channel.index()].tree
    }

    /// Formula text of one channel, as compiled.
    pub fn source(&self, channel: Channel) -> &str {
        &self.channels[channel.index()].source
    }

    pub(crate) fn bytecode(&self, channel: Channel) -> &BytecodeProgram {
        &self.channels[channel.index()].bytecode
    }

    /// Evaluate one channel with the tree walker; the result is not yet clamped.
    pub fn eval_channel(&self, channel: Channel, binding: Binding) -> ShadeResult<f64> {
        evaluate(self.tree(channel), &binding).map_err(|e| ShadeError::from_eval(channel, e))
    }

    /// Return `true` when no channel reads `frame`, so every frame renders identically.
    pub fn is_frame_invariant(&self) -> bool {
        self.channels
            .iter()
            .all(|c| !c.bytecode.loads(VarSlot::Frame))
    }

    /// Deepest VM stack any channel needs.
    pub(crate) fn max_stack(&self) -> usize {
        self.channels
            .iter()
            .map(|c| c.bytecode.max_stack)
            .max()
            .unwrap_or(0)
    }
}

#[cfg(test)]
#[path = "../tests/unit/program/program.rs"]
mod tests;
