//! Recursive-descent expression parser and evaluator.
//!
//! Precedence, high to low: unary `-`/`~`; `*` `/` `%`; `+` `-`;
//! `<<` `>>`; `&`; `^`; `|`. All arithmetic is 32-bit signed.

use crate::ast::{BinOp, Expr};
use crate::error::EvalError;
use crate::lexer::Token;

pub struct Parser<'t> {
    tokens: &'t [Token],
    pos: usize,
}

impl<'t> Parser<'t> {
    #[must_use]
    pub fn new(tokens: &'t [Token]) -> Self {
        Self { tokens, pos: 0 }
    }

    #[must_use]
    pub fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    #[must_use]
    pub fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    pub fn advance(&mut self) -> Option<&Token> {
        let tok = self.tokens.get(self.pos);
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    pub fn eat(&mut self, expected: &Token) -> Result<(), EvalError> {
        if self.peek() == Some(expected) {
            self.pos += 1;
            Ok(())
        } else {
            Err(EvalError::InvalidLiteral(format!("expected {expected:?}")))
        }
    }

    pub fn parse_expr(&mut self) -> Result<Expr, EvalError> {
        self.parse_or()
    }

    fn parse_or(&mut self) -> Result<Expr, EvalError> {
        let mut lhs = self.parse_xor()?;
        while self.peek() == Some(&Token::Pipe) {
            self.pos += 1;
            let rhs = self.parse_xor()?;
            lhs = Expr::Binary(BinOp::Or, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_xor(&mut self) -> Result<Expr, EvalError> {
        let mut lhs = self.parse_and()?;
        while self.peek() == Some(&Token::Caret) {
            self.pos += 1;
            let rhs = self.parse_and()?;
            lhs = Expr::Binary(BinOp::Xor, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_and(&mut self) -> Result<Expr, EvalError> {
        let mut lhs = self.parse_shift()?;
        while self.peek() == Some(&Token::Amp) {
            self.pos += 1;
            let rhs = self.parse_shift()?;
            lhs = Expr::Binary(BinOp::And, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_shift(&mut self) -> Result<Expr, EvalError> {
        let mut lhs = self.parse_add()?;
        loop {
            let op = match self.peek() {
                Some(Token::Shl) => BinOp::Shl,
                Some(Token::Shr) => BinOp::Shr,
                _ => break,
            };
            self.pos += 1;
            let rhs = self.parse_add()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_add(&mut self) -> Result<Expr, EvalError> {
        let mut lhs = self.parse_mul()?;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => BinOp::Add,
                Some(Token::Minus) => BinOp::Sub,
                _ => break,
            };
            self.pos += 1;
            let rhs = self.parse_mul()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_mul(&mut self) -> Result<Expr, EvalError> {
        let mut lhs = self.parse_unary()?;
        loop {
            let op = match self.peek() {
                Some(Token::Star) => BinOp::Mul,
                Some(Token::Slash) => BinOp::Div,
                Some(Token::Percent) => BinOp::Mod,
                _ => break,
            };
            self.pos += 1;
            let rhs = self.parse_unary()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> Result<Expr, EvalError> {
        match self.peek() {
            Some(Token::Minus) => {
                self.pos += 1;
                Ok(Expr::Neg(Box::new(self.parse_unary()?)))
            }
            Some(Token::Tilde) => {
                self.pos += 1;
                Ok(Expr::BitNot(Box::new(self.parse_unary()?)))
            }
            _ => self.parse_atom(),
        }
    }

    fn parse_atom(&mut self) -> Result<Expr, EvalError> {
        match self.advance().cloned() {
            Some(Token::Number(n)) => Ok(Expr::Number(n)),
            Some(Token::Ident(name)) => Ok(Expr::Symbol(name)),
            Some(Token::Dollar) => Ok(Expr::CurrentPc),
            Some(Token::DollarDollar) => Ok(Expr::LastLabelPc),
            Some(Token::LParen) => {
                let inner = self.parse_expr()?;
                self.eat(&Token::RParen)?;
                Ok(inner)
            }
            other => Err(EvalError::InvalidLiteral(format!("{other:?}"))),
        }
    }
}

/// Resolves a symbol reference to its 32-bit value. Returning
/// `Ok(v)` for an unresolved name is how pass 1 records a pending
/// site and still advances sizing; pass 2 instead returns
/// `Err(EvalError::UndefinedSymbol)`.
pub trait SymbolResolver {
    fn resolve(&mut self, name: &str) -> Result<i64, EvalError>;
}

pub struct EvalContext<'a> {
    pub current_pc: i64,
    pub last_label_pc: i64,
    pub resolver: &'a mut dyn SymbolResolver,
}

pub fn eval(expr: &Expr, ctx: &mut EvalContext<'_>) -> Result<i64, EvalError> {
    Ok(match expr {
        Expr::Number(n) => *n,
        Expr::Symbol(name) => ctx.resolver.resolve(name)?,
        Expr::CurrentPc => ctx.current_pc,
        Expr::LastLabelPc => ctx.last_label_pc,
        Expr::Neg(e) => -eval(e, ctx)?,
        Expr::BitNot(e) => !eval(e, ctx)?,
        Expr::Binary(op, lhs, rhs) => {
            let l = eval(lhs, ctx)?;
            let r = eval(rhs, ctx)?;
            match op {
                BinOp::Mul => l.wrapping_mul(r),
                BinOp::Div => {
                    if r == 0 {
                        0
                    } else {
                        l.wrapping_div(r)
                    }
                }
                BinOp::Mod => {
                    if r == 0 {
                        0
                    } else {
                        l.wrapping_rem(r)
                    }
                }
                BinOp::Add => l.wrapping_add(r),
                BinOp::Sub => l.wrapping_sub(r),
                BinOp::Shl => l.wrapping_shl(r as u32),
                BinOp::Shr => l.wrapping_shr(r as u32),
                BinOp::And => l & r,
                BinOp::Xor => l ^ r,
                BinOp::Or => l | r,
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;

    struct NullResolver;
    impl SymbolResolver for NullResolver {
        fn resolve(&mut self, name: &str) -> Result<i64, EvalError> {
            Err(EvalError::UndefinedSymbol(name.to_string()))
        }
    }

    fn eval_str(s: &str) -> i64 {
        let toks = tokenize(s).unwrap();
        let mut p = Parser::new(&toks);
        let expr = p.parse_expr().unwrap();
        let mut resolver = NullResolver;
        let mut ctx = EvalContext {
            current_pc: 0,
            last_label_pc: 0,
            resolver: &mut resolver,
        };
        eval(&expr, &mut ctx).unwrap()
    }

    #[test]
    fn precedence_mul_before_add() {
        assert_eq!(eval_str("2 + 3 * 4"), 14);
    }

    #[test]
    fn shift_before_and() {
        assert_eq!(eval_str("1 << 4 & 0xf0"), 16);
    }

    #[test]
    fn unary_minus_and_not() {
        assert_eq!(eval_str("-5"), -5);
        assert_eq!(eval_str("~0"), -1);
    }
}
