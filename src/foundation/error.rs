use crate::expression::error::{EvalError, ExprError};
use crate::program::Channel;

/// Convenience result type used across shadeframe.
pub type ShadeResult<T> = Result<T, ShadeError>;

/// Top-level error taxonomy used by engine APIs.
///
/// The three formula variants (`Parse`, `UndefinedVariable`, `UnsupportedExpression`) are static
/// authoring mistakes. They are reported at compile time, before any frame renders, and are never
/// retried.
#[derive(thiserror::Error, Debug)]
pub enum ShadeError {
    /// A channel formula failed to parse.
    #[error("parse error in {channel} channel formula `{formula}`: {error}")]
    Parse {
        /// Channel whose formula failed.
        channel: Channel,
        /// The formula text as supplied.
        formula: String,
        /// Position and description of the offending token.
        #[source]
        error: ExprError,
    },

    /// A formula references an identifier outside `{x, y, frame}`.
    #[error("undefined variable `{name}` in {channel} channel formula")]
    UndefinedVariable {
        /// Channel whose formula failed.
        channel: Channel,
        /// The unknown identifier.
        name: String,
    },

    /// A formula calls an unknown function or uses the wrong arity.
    #[error("unsupported expression in {channel} channel formula: {detail}")]
    UnsupportedExpression {
        /// Channel whose formula failed.
        channel: Channel,
        /// Human-readable description of the construct.
        detail: String,
    },

    /// Invalid user-provided configuration.
    #[error("validation error: {0}")]
    Validation(String),

    /// Errors while evaluating pixels or driving sinks.
    #[error("evaluation error: {0}")]
    Evaluation(String),

    /// Errors when deserializing job files.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ShadeError {
    /// Build a [`ShadeError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`ShadeError::Evaluation`] value.
    pub fn evaluation(msg: impl Into<String>) -> Self {
        Self::Evaluation(msg.into())
    }

    /// Build a [`ShadeError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }

    /// Attach a channel to an expression-level evaluation failure.
    pub fn from_eval(channel: Channel, err: EvalError) -> Self {
        match err {
            EvalError::UndefinedVariable(name) => Self::UndefinedVariable { channel, name },
            EvalError::UnsupportedExpression(detail) => {
                Self::UnsupportedExpression { channel, detail }
            }
        }
    }

    /// Return `true` for errors caused by the formula text itself.
    pub fn is_formula_error(&self) -> bool {
        matches!(
            self,
            Self::Parse { .. } | Self::UndefinedVariable { .. } | Self::UnsupportedExpression { .. }
        )
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
