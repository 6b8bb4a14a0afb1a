use std::fmt;

/// Syntax error in formula text, located by byte offset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExprError {
    /// Byte offset of the offending token.
    pub offset: usize,
    /// What was wrong, naming the offending text.
    pub message: String,
}

impl ExprError {
    pub(crate) fn new(offset: usize, message: impl Into<String>) -> Self {
        Self {
            offset,
            message: message.into(),
        }
    }
}

impl fmt::Display for ExprError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "expr error at byte {}: {}", self.offset, self.message)
    }
}

impl std::error::Error for ExprError {}

/// Failure while evaluating (or statically checking) a parsed expression.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum EvalError {
    /// Identifier with no value in the current scope.
    #[error("undefined variable: {0}")]
    UndefinedVariable(String),
    /// Unknown function, wrong argument count, or a construct outside the grammar.
    #[error("unsupported expression: {0}")]
    UnsupportedExpression(String),
}
