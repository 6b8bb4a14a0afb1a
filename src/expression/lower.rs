use crate::expression::ast::{Expr, UnaryOp};
use crate::expression::bytecode::{BytecodeProgram, Op, VarSlot};
use crate::expression::error::EvalError;
use crate::expression::intrinsics::{Intrinsic, unsupported_call};

/// Lower a tree to postfix bytecode over the per-pixel slots.
///
/// Fails on the same inputs the static check rejects, so lowering a checked tree cannot fail.
pub(crate) fn lower_to_bytecode(expr: &Expr) -> Result<BytecodeProgram, EvalError> {
    let mut out = BytecodeProgram::new();
    let mut depth = 0usize;
    lower(expr, &mut out, &mut depth)?;
    Ok(out)
}

fn lower(expr: &Expr, out: &mut BytecodeProgram, depth: &mut usize) -> Result<(), EvalError> {
    match expr {
        Expr::Lit(v) => {
            let idx = out.push_const(*v);
            out.ops.push(Op::PushConst(idx));
            grow(out, depth, 1);
        }
        Expr::Var(name) => {
            let slot = VarSlot::from_name(name)
                .ok_or_else(|| EvalError::UndefinedVariable(name.clone()))?;
            out.ops.push(Op::LoadVar(slot));
            grow(out, depth, 1);
        }
        Expr::Group(inner) => lower(inner, out, depth)?,
        Expr::Unary { op, expr } => {
            lower(expr, out, depth)?;
            if *op == UnaryOp::Neg {
                out.ops.push(Op::Neg);
            }
        }
        Expr::Binary { op, left, right } => {
            lower(left, out, depth)?;
            lower(right, out, depth)?;
            out.ops.push(Op::Binary(*op));
            *depth -= 1;
        }
        Expr::Call { func, args } => {
            let f = Intrinsic::lookup(func, args.len()).ok_or_else(|| {
                EvalError::UnsupportedExpression(unsupported_call(func, args.len()))
            })?;
            for a in args {
                lower(a, out, depth)?;
            }
            out.ops.push(Op::Call(f));
            // n args in, one result out
            *depth = *depth + 1 - args.len();
            out.max_stack = out.max_stack.max(*depth);
        }
    }
    Ok(())
}

fn grow(out: &mut BytecodeProgram, depth: &mut usize, n: usize) {
    *depth += n;
    out.max_stack = out.max_stack.max(*depth);
}

#[cfg(test)]
#[path = "../../tests/unit/expression/lower.rs"]
mod tests;
