use crate::expression::ast::{BinaryOp, Expr, UnaryOp};
use crate::expression::error::ExprError;
use crate::expression::lexer::{Span, Token, TokenKind, lex};

/// Parse one formula into an expression tree.
///
/// Precedence from tightest to loosest: unary `+ -`, `* / %`, `+ -`, then the bitwise
/// operators `& | ^ &^ << >>` (one level). Every binary level is left-associative.
///
/// Formulas nesting deeper than 128 levels are rejected; parentheses, unary operators and each
/// link of a binary operator chain count as one level.
pub fn parse_expr(src: &str) -> Result<Expr, ExprError> {
    let tokens = lex(src)?;
    let mut p = Parser {
        tokens,
        pos: 0,
        depth: 0,
    };
    let expr = p.parse_bitwise()?;
    p.expect_eof()?;
    Ok(expr)
}

/// Deepest nesting a formula may reach.
const MAX_DEPTH: usize = 128;

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> &Token {
        &self.tokens[self.pos]
    }

    fn bump(&mut self) -> &Token {
        let t = &self.tokens[self.pos];
        // Eof is sticky.
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        t
    }

    fn span(&self) -> Span {
        self.peek().span
    }

    fn expect(&mut self, kind: TokenKind, context: &str) -> Result<(), ExprError> {
        if self.peek().kind == kind {
            self.bump();
            Ok(())
        } else {
            Err(ExprError::new(
                self.span().start,
                format!("expected {kind} {context}, found {}", self.peek().kind),
            ))
        }
    }

    fn expect_eof(&self) -> Result<(), ExprError> {
        match &self.peek().kind {
            TokenKind::Eof => Ok(()),
            TokenKind::RParen => Err(ExprError::new(
                self.span().start,
                "unbalanced ')' with no matching '('",
            )),
            other => Err(ExprError::new(
                self.span().start,
                format!("expected end of input, found {other}"),
            )),
        }
    }

    fn descend(&mut self) -> Result<(), ExprError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(ExprError::new(
                self.span().start,
                "formula nested too deeply",
            ));
        }
        Ok(())
    }

    fn consume(&mut self, kind: TokenKind) -> bool {
        if self.peek().kind == kind {
            self.bump();
            true
        } else {
            false
        }
    }

    fn parse_bitwise(&mut self) -> Result<Expr, ExprError> {
        let mut e = self.parse_additive()?;
        let mut links = 0;
        loop {
            let op = match self.peek().kind {
                TokenKind::Amp => BinaryOp::And,
                TokenKind::Pipe => BinaryOp::Or,
                TokenKind::Caret => BinaryOp::Xor,
                TokenKind::AmpCaret => BinaryOp::AndNot,
                TokenKind::Shl => BinaryOp::Shl,
                TokenKind::Shr => BinaryOp::Shr,
                _ => break,
            };
            self.bump();
            self.descend()?;
            links += 1;
            let r = self.parse_additive()?;
            e = Expr::Binary {
                op,
                left: Box::new(e),
                right: Box::new(r),
            };
        }
        self.depth -= links;
        Ok(e)
    }

    fn parse_additive(&mut self) -> Result<Expr, ExprError> {
        let mut e = self.parse_term()?;
        let mut links = 0;
        loop {
            let op = if self.consume(TokenKind::Plus) {
                BinaryOp::Add
            } else if self.consume(TokenKind::Minus) {
                BinaryOp::Sub
            } else {
                break;
            };
            self.descend()?;
            links += 1;
            let r = self.parse_term()?;
            e = Expr::Binary {
                op,
                left: Box::new(e),
                right: Box::new(r),
            };
        }
        self.depth -= links;
        Ok(e)
    }

    fn parse_term(&mut self) -> Result<Expr, ExprError> {
        let mut e = self.parse_unary()?;
        let mut links = 0;
        loop {
            let op = if self.consume(TokenKind::Star) {
                BinaryOp::Mul
            } else if self.consume(TokenKind::Slash) {
                BinaryOp::Div
            } else if self.consume(TokenKind::Percent) {
                BinaryOp::Rem
            } else {
                break;
            };
            self.descend()?;
            links += 1;
            let r = self.parse_unary()?;
            e = Expr::Binary {
                op,
                left: Box::new(e),
                right: Box::new(r),
            };
        }
        self.depth -= links;
        Ok(e)
    }

    fn parse_unary(&mut self) -> Result<Expr, ExprError> {
        self.descend()?;
        let op = if self.consume(TokenKind::Minus) {
            Some(UnaryOp::Neg)
        } else if self.consume(TokenKind::Plus) {
            Some(UnaryOp::Plus)
        } else {
            None
        };
        let e = match op {
            Some(op) => Expr::Unary {
                op,
                expr: Box::new(self.parse_unary()?),
            },
            None => self.parse_postfix()?,
        };
        self.depth -= 1;
        Ok(e)
    }

    fn parse_postfix(&mut self) -> Result<Expr, ExprError> {
        let e = self.parse_primary()?;
        if self.peek().kind != TokenKind::LParen {
            return Ok(e);
        }
        match e {
            Expr::Var(func) => {
                self.bump();
                let args = self.parse_args(&func)?;
                Ok(Expr::Call { func, args })
            }
            _ => Err(ExprError::new(
                self.span().start,
                "call target must be a function name",
            )),
        }
    }

    fn parse_args(&mut self, func: &str) -> Result<Vec<Expr>, ExprError> {
        let mut args = Vec::new();
        if self.consume(TokenKind::RParen) {
            return Ok(args);
        }
        loop {
            args.push(self.parse_bitwise()?);
            if self.consume(TokenKind::Comma) {
                continue;
            }
            self.expect(TokenKind::RParen, &format!("to close call to '{func}'"))?;
            return Ok(args);
        }
    }

    fn parse_primary(&mut self) -> Result<Expr, ExprError> {
        let t = self.bump().clone();
        match t.kind {
            TokenKind::Number(v) => Ok(Expr::Lit(v)),
            TokenKind::Ident(s) => Ok(Expr::Var(s)),
            TokenKind::LParen => {
                let e = self.parse_bitwise()?;
                self.expect(TokenKind::RParen, "to close '('")?;
                Ok(Expr::Group(Box::new(e)))
            }
            TokenKind::Eof => Err(ExprError::new(t.span.start, "unexpected end of input")),
            other => Err(ExprError::new(
                t.span.start,
                format!("unexpected token {other}"),
            )),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/expression/parser.rs"]
mod tests;
