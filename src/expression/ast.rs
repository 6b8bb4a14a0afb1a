use std::fmt;

use crate::foundation::math::{ieee_remainder, shl_u64, shr_u64, trunc_i64};

/// Parsed formula. Immutable once built and safe to share across threads.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Numeric literal; integer literals are promoted to `f64`.
    Lit(f64),
    /// Bound name such as `x`, `y` or `frame`.
    Var(String),
    /// Prefix operator.
    Unary {
        /// Operator.
        op: UnaryOp,
        /// Operand.
        expr: Box<Expr>,
    },
    /// Infix operator.
    Binary {
        /// Operator.
        op: BinaryOp,
        /// Left operand.
        left: Box<Expr>,
        /// Right operand.
        right: Box<Expr>,
    },
    /// Intrinsic call `func(args...)`.
    Call {
        /// Function name as written.
        func: String,
        /// Arguments in source order.
        args: Vec<Expr>,
    },
    /// Parenthesised sub-expression.
    Group(Box<Expr>),
}

/// Prefix operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    /// `+e`
    Plus,
    /// `-e`
    Neg,
}

/// Infix operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    /// `+`
    Add,
    /// `-`
    Sub,
    /// `*`
    Mul,
    /// `/`
    Div,
    /// `%`, IEEE remainder.
    Rem,
    /// `&`
    And,
    /// `|`
    Or,
    /// `^`
    Xor,
    /// `&^`, and-not.
    AndNot,
    /// `<<`
    Shl,
    /// `>>`
    Shr,
}

impl UnaryOp {
    pub(crate) fn apply(self, v: f64) -> f64 {
        match self {
            Self::Plus => v,
            Self::Neg => -v,
        }
    }

    /// Source spelling.
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Plus => "+",
            Self::Neg => "-",
        }
    }
}

impl BinaryOp {
    /// Apply the operator to two evaluated operands.
    ///
    /// Arithmetic stays in `f64`. Bitwise operators cross into 64-bit integers: signed truncation
    /// for `& | ^ &^`, unsigned for the shifts.
    pub(crate) fn apply(self, a: f64, b: f64) -> f64 {
        match self {
            Self::Add => a + b,
            Self::Sub => a - b,
            Self::Mul => a * b,
            Self::Div => a / b,
            Self::Rem => ieee_remainder(a, b),
            Self::And => (trunc_i64(a) & trunc_i64(b)) as f64,
            Self::Or => (trunc_i64(a) | trunc_i64(b)) as f64,
            Self::Xor => (trunc_i64(a) ^ trunc_i64(b)) as f64,
            Self::AndNot => (trunc_i64(a) & !trunc_i64(b)) as f64,
            Self::Shl => shl_u64(a, b),
            Self::Shr => shr_u64(a, b),
        }
    }

    /// Source spelling.
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Rem => "%",
            Self::And => "&",
            Self::Or => "|",
            Self::Xor => "^",
            Self::AndNot => "&^",
            Self::Shl => "<<",
            Self::Shr => ">>",
        }
    }
}

impl Expr {
    /// Visit this node and every descendant, parents before children, arguments in order.
    pub fn walk<'a>(&'a self, f: &mut impl FnMut(&'a Expr)) {
        f(self);
        match self {
            Self::Lit(_) | Self::Var(_) => {}
            Self::Unary { expr, .. } | Self::Group(expr) => expr.walk(f),
            Self::Binary { left, right, .. } => {
                left.walk(f);
                right.walk(f);
            }
            Self::Call { args, .. } => {
                for a in args {
                    a.walk(f);
                }
            }
        }
    }

    /// Return `true` if any `Var` node in the tree is named `name`.
    pub fn references(&self, name: &str) -> bool {
        let mut found = false;
        self.walk(&mut |e| {
            if let Self::Var(v) = e
                && v == name
            {
                found = true;
            }
        });
        found
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lit(v) => write!(f, "{v}"),
            Self::Var(name) => f.write_str(name),
            Self::Unary { op, expr } => write!(f, "{}{expr}", op.symbol()),
            Self::Binary { op, left, right } => write!(f, "{left} {} {right}", op.symbol()),
            Self::Call { func, args } => {
                write!(f, "{func}(")?;
                for (i, a) in args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{a}")?;
                }
                f.write_str(")")
            }
            Self::Group(inner) => write!(f, "({inner})"),
        }
    }
}
