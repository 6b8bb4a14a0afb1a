use crate::expression::bytecode::{BytecodeProgram, Op};
use crate::expression::intrinsics::MAX_ARITY;

#[derive(Debug, Clone)]
pub(crate) struct VmError {
    pub(crate) message: String,
}

impl VmError {
    pub(crate) fn new(msg: impl Into<String>) -> Self {
        Self {
            message: msg.into(),
        }
    }
}

impl std::fmt::Display for VmError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "vm error: {}", self.message)
    }
}

impl std::error::Error for VmError {}

/// Run `p` with the slot values `vars` (`[x, y, frame]`).
#[cfg(test)]
pub(crate) fn eval_program(p: &BytecodeProgram, vars: [f64; 3]) -> Result<f64, VmError> {
    let mut stack: Vec<f64> = Vec::with_capacity(p.max_stack);
    eval_program_with_stack(p, vars, &mut stack)
}

/// Run `p` with the slot values `vars` (`[x, y, frame]`), reusing a caller-owned stack.
pub(crate) fn eval_program_with_stack(
    p: &BytecodeProgram,
    vars: [f64; 3],
    stack: &mut Vec<f64>,
) -> Result<f64, VmError> {
    stack.clear();

    for &op in &p.ops {
        match op {
            Op::PushConst(idx) => {
                let c = p
                    .consts
                    .get(idx.0 as usize)
                    .ok_or_else(|| VmError::new("const idx out of range"))?;
                stack.push(*c);
            }
            Op::LoadVar(slot) => stack.push(vars[slot.index()]),
            Op::Neg => {
                let v = pop(stack)?;
                stack.push(-v);
            }
            Op::Binary(bin) => {
                let b = pop(stack)?;
                let a = pop(stack)?;
                stack.push(bin.apply(a, b));
            }
            Op::Call(f) => {
                let argc = f.arity();
                if stack.len() < argc {
                    return Err(VmError::new(format!(
                        "stack underflow in call to {}",
                        f.name()
                    )));
                }
                let mut args = [0.0f64; MAX_ARITY];
                let base = stack.len() - argc;
                args[..argc].copy_from_slice(&stack[base..]);
                stack.truncate(base);
                stack.push(f.apply(&args[..argc]));
            }
        }
    }

    if stack.len() != 1 {
        return Err(VmError::new(format!(
            "stack has {} values at end of program",
            stack.len()
        )));
    }
    pop(stack)
}

fn pop(stack: &mut Vec<f64>) -> Result<f64, VmError> {
    stack.pop().ok_or_else(|| VmError::new("stack underflow"))
}

#[cfg(test)]
#[path = "../../tests/unit/expression/vm.rs"]
mod tests;
