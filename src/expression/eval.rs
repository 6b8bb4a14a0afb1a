use std::collections::{BTreeMap, HashMap};

use crate::expression::ast::Expr;
use crate::expression::error::EvalError;
use crate::expression::intrinsics::{Intrinsic, MAX_ARITY, unsupported_call};

/// Names a formula may reference, in binding order.
pub const BOUND_NAMES: [&str; 3] = ["x", "y", "frame"];

/// Source of variable values for one evaluation.
pub trait Scope {
    /// Value bound to `name`, or `None` when the name is not bound.
    fn lookup(&self, name: &str) -> Option<f64>;
}

/// The per-pixel binding: column, row and frame index, all 0-based.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Binding {
    /// Column.
    pub x: i64,
    /// Row.
    pub y: i64,
    /// Frame index.
    pub frame: i64,
}

impl Binding {
    /// Bind one pixel of one frame.
    pub fn new(x: i64, y: i64, frame: i64) -> Self {
        Self { x, y, frame }
    }

    /// Values in [`BOUND_NAMES`] order.
    pub fn values(self) -> [f64; 3] {
        [self.x as f64, self.y as f64, self.frame as f64]
    }
}

impl Scope for Binding {
    fn lookup(&self, name: &str) -> Option<f64> {
        match name {
            "x" => Some(self.x as f64),
            "y" => Some(self.y as f64),
            "frame" => Some(self.frame as f64),
            _ => None,
        }
    }
}

/// Nothing bound; only constant formulas evaluate.
impl Scope for () {
    fn lookup(&self, _name: &str) -> Option<f64> {
        None
    }
}

impl Scope for BTreeMap<String, i64> {
    fn lookup(&self, name: &str) -> Option<f64> {
        self.get(name).map(|v| *v as f64)
    }
}

impl Scope for HashMap<String, i64> {
    fn lookup(&self, name: &str) -> Option<f64> {
        self.get(name).map(|v| *v as f64)
    }
}

/// Evaluate a tree against a scope.
///
/// Numeric edge cases (division by zero, `sqrt` of a negative, overflow) are not errors; they
/// surface as infinities or NaN. Operands evaluate left to right, call arguments before the call.
pub fn evaluate<S: Scope + ?Sized>(expr: &Expr, scope: &S) -> Result<f64, EvalError> {
    match expr {
        Expr::Lit(v) => Ok(*v),
        Expr::Var(name) => scope
            .lookup(name)
            .ok_or_else(|| EvalError::UndefinedVariable(name.clone())),
        Expr::Group(inner) => evaluate(inner, scope),
        Expr::Unary { op, expr } => Ok(op.apply(evaluate(expr, scope)?)),
        Expr::Binary { op, left, right } => {
            let a = evaluate(left, scope)?;
            let b = evaluate(right, scope)?;
            Ok(op.apply(a, b))
        }
        Expr::Call { func, args } => {
            let Some(f) = Intrinsic::lookup(func, args.len()) else {
                return Err(EvalError::UnsupportedExpression(unsupported_call(
                    func,
                    args.len(),
                )));
            };
            let mut vals = [0.0f64; MAX_ARITY];
            for (slot, arg) in vals.iter_mut().zip(args) {
                *slot = evaluate(arg, scope)?;
            }
            Ok(f.apply(&vals[..args.len()]))
        }
    }
}

/// Statically check a tree: every variable satisfies `is_bound` and every call resolves in the
/// intrinsic table. Reports the first offending node in source order.
pub fn check_expr(expr: &Expr, is_bound: impl Fn(&str) -> bool) -> Result<(), EvalError> {
    let mut first: Option<EvalError> = None;
    expr.walk(&mut |e| {
        if first.is_some() {
            return;
        }
        match e {
            Expr::Var(name) if !is_bound(name) => {
                first = Some(EvalError::UndefinedVariable(name.clone()));
            }
            Expr::Call { func, args } if Intrinsic::lookup(func, args.len()).is_none() => {
                first = Some(EvalError::UnsupportedExpression(unsupported_call(
                    func,
                    args.len(),
                )));
            }
            _ => {}
        }
    });
    match first {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

/// [`check_expr`] against the fixed per-pixel names.
pub fn check_pixel_expr(expr: &Expr) -> Result<(), EvalError> {
    check_expr(expr, |name| BOUND_NAMES.contains(&name))
}

#[cfg(test)]
#[path = "../../tests/unit/expression/eval.rs"]
mod tests;
