/// Built-in functions callable from formulas. The table is closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intrinsic {
    /// `sin(a)`
    Sin,
    /// `cos(a)`
    Cos,
    /// `tan(a)`
    Tan,
    /// `exp(a)`
    Exp,
    /// `sqrt(a)`
    Sqrt,
    /// `abs(a)`
    Abs,
    /// `pow(a, b)`
    Pow,
}

/// Largest arity in the table.
pub(crate) const MAX_ARITY: usize = 2;

const TABLE: &[(&str, usize, Intrinsic)] = &[
    ("sin", 1, Intrinsic::Sin),
    ("cos", 1, Intrinsic::Cos),
    ("tan", 1, Intrinsic::Tan),
    ("exp", 1, Intrinsic::Exp),
    ("sqrt", 1, Intrinsic::Sqrt),
    ("abs", 1, Intrinsic::Abs),
    ("pow", 2, Intrinsic::Pow),
];

impl Intrinsic {
    /// Resolve a call by `(name, arity)`.
    pub fn lookup(name: &str, arity: usize) -> Option<Self> {
        TABLE
            .iter()
            .find(|(n, a, _)| *n == name && *a == arity)
            .map(|(_, _, f)| *f)
    }

    /// Name as written in formulas.
    pub fn name(self) -> &'static str {
        TABLE
            .iter()
            .find(|(_, _, f)| *f == self)
            .map_or("?", |(n, _, _)| *n)
    }

    /// Number of arguments the function takes.
    pub fn arity(self) -> usize {
        match self {
            Self::Pow => 2,
            _ => 1,
        }
    }

    /// Every intrinsic, in table order.
    pub fn all() -> impl Iterator<Item = Self> {
        TABLE.iter().map(|(_, _, f)| *f)
    }

    /// Apply to already-evaluated arguments; `args.len()` must equal [`Intrinsic::arity`].
    pub(crate) fn apply(self, args: &[f64]) -> f64 {
        match self {
            Self::Sin => args[0].sin(),
            Self::Cos => args[0].cos(),
            Self::Tan => args[0].tan(),
            Self::Exp => args[0].exp(),
            Self::Sqrt => args[0].sqrt(),
            Self::Abs => args[0].abs(),
            Self::Pow => args[0].powf(args[1]),
        }
    }
}

/// Describe why `name(arity args)` does not resolve.
pub(crate) fn unsupported_call(name: &str, arity: usize) -> String {
    match TABLE.iter().find(|(n, _, _)| *n == name) {
        Some((_, want, _)) => format!(
            "function `{name}` takes {want} argument{}, got {arity}",
            if *want == 1 { "" } else { "s" }
        ),
        None => format!("unknown function `{name}`"),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/expression/intrinsics.rs"]
mod tests;
