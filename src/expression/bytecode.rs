use crate::expression::ast::BinaryOp;
use crate::expression::intrinsics::Intrinsic;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ConstIdx(pub(crate) u32);

/// Index into [`crate::expression::eval::BOUND_NAMES`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum VarSlot {
    X,
    Y,
    Frame,
}

impl VarSlot {
    pub(crate) fn from_name(name: &str) -> Option<Self> {
        match name {
            "x" => Some(Self::X),
            "y" => Some(Self::Y),
            "frame" => Some(Self::Frame),
            _ => None,
        }
    }

    pub(crate) fn index(self) -> usize {
        match self {
            Self::X => 0,
            Self::Y => 1,
            Self::Frame => 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Op {
    PushConst(ConstIdx),
    LoadVar(VarSlot),

    Neg,
    Binary(BinaryOp),

    Call(Intrinsic),
}

/// Flat postfix program for one channel.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct BytecodeProgram {
    pub(crate) ops: Vec<Op>,
    pub(crate) consts: Vec<f64>,
    /// Deepest operand stack the program reaches.
    pub(crate) max_stack: usize,
}

impl BytecodeProgram {
    pub(crate) fn new() -> Self {
        Self {
            ops: Vec::new(),
            consts: Vec::new(),
            max_stack: 0,
        }
    }

    pub(crate) fn push_const(&mut self, c: f64) -> ConstIdx {
        if let Some(i) = self.consts.iter().position(|v| v.to_bits() == c.to_bits()) {
            return ConstIdx(i as u32);
        }
        let idx = ConstIdx(self.consts.len() as u32);
        self.consts.push(c);
        idx
    }

    /// Return `true` if any op loads `slot`.
    pub(crate) fn loads(&self, slot: VarSlot) -> bool {
        self.ops.iter().any(|op| *op == Op::LoadVar(slot))
    }
}
