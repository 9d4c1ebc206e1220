// src/sandbox/parser.rs

//! Recursive-descent parser over the closed arithmetic grammar.
//!
//! The node set is final: assignments, variable reads, numeric literals,
//! unary negation and the seven binary arithmetic operators. The parser can
//! build nothing else, so constructs like calls are named and rejected here
//! rather than half-understood.

use super::error::SandboxError;
use super::lexer::Token;

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(f64),
    Var(String),
    Neg(Box<Expr>),
    Binary {
        op: BinOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    FloorDiv,
    Mod,
    Pow,
}

/// The only statement form the sandbox accepts: `name = expr`.
#[derive(Debug, Clone, PartialEq)]
pub struct Assign {
    pub target: String,
    pub value: Expr,
}

pub fn parse(tokens: &[Token]) -> Result<Vec<Assign>, SandboxError> {
    Parser { tokens, pos: 0 }.program()
}

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.pos)
    }

    fn bump(&mut self) -> Option<&'a Token> {
        let token = self.tokens.get(self.pos);
        self.pos += 1;
        token
    }

    fn eat(&mut self, token: &Token) -> bool {
        if self.peek() == Some(token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn program(&mut self) -> Result<Vec<Assign>, SandboxError> {
        let mut statements = Vec::new();
        loop {
            while self.eat(&Token::Newline) {}
            if self.peek().is_none() {
                return Ok(statements);
            }
            statements.push(self.assignment()?);
            match self.peek() {
                None | Some(Token::Newline) => {}
                Some(token) => {
                    return Err(SandboxError::Syntax(format!(
                        "unexpected token after statement: {:?}",
                        token
                    )));
                }
            }
        }
    }

    fn assignment(&mut self) -> Result<Assign, SandboxError> {
        let target = match self.peek() {
            Some(Token::Ident(name)) => name.clone(),
            // A line that opens with anything but a name can only be a bare
            // expression, which the allow-list does not include.
            Some(_) => return Err(SandboxError::Disallowed("expression statement")),
            None => return Err(SandboxError::Syntax("expected a statement".into())),
        };
        self.pos += 1;

        if !self.eat(&Token::Assign) {
            if self.peek() == Some(&Token::LParen) {
                return Err(SandboxError::Disallowed("function call"));
            }
            return Err(SandboxError::Disallowed("expression statement"));
        }

        let value = self.expr()?;
        Ok(Assign { target, value })
    }

    fn expr(&mut self) -> Result<Expr, SandboxError> {
        let mut lhs = self.term()?;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => BinOp::Add,
                Some(Token::Minus) => BinOp::Sub,
                _ => return Ok(lhs),
            };
            self.pos += 1;
            let rhs = self.term()?;
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
    }

    fn term(&mut self) -> Result<Expr, SandboxError> {
        let mut lhs = self.unary()?;
        loop {
            let op = match self.peek() {
                Some(Token::Star) => BinOp::Mul,
                Some(Token::Slash) => BinOp::Div,
                Some(Token::DoubleSlash) => BinOp::FloorDiv,
                Some(Token::Percent) => BinOp::Mod,
                _ => return Ok(lhs),
            };
            self.pos += 1;
            let rhs = self.unary()?;
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
    }

    fn unary(&mut self) -> Result<Expr, SandboxError> {
        if self.eat(&Token::Minus) {
            return Ok(Expr::Neg(Box::new(self.unary()?)));
        }
        self.power()
    }

    // `**` binds tighter than unary minus on its left and is right
    // associative, so `-2 ** 2` is `-(2 ** 2)` and `2 ** -3` parses.
    fn power(&mut self) -> Result<Expr, SandboxError> {
        let base = self.atom()?;
        if self.eat(&Token::DoubleStar) {
            let exponent = self.unary()?;
            return Ok(Expr::Binary {
                op: BinOp::Pow,
                lhs: Box::new(base),
                rhs: Box::new(exponent),
            });
        }
        Ok(base)
    }

    fn atom(&mut self) -> Result<Expr, SandboxError> {
        match self.bump() {
            Some(Token::Number(n)) => Ok(Expr::Number(*n)),
            Some(Token::Ident(name)) => {
                if self.peek() == Some(&Token::LParen) {
                    return Err(SandboxError::Disallowed("function call"));
                }
                Ok(Expr::Var(name.clone()))
            }
            Some(Token::LParen) => {
                let inner = self.expr()?;
                if !self.eat(&Token::RParen) {
                    return Err(SandboxError::Syntax("unbalanced parentheses".into()));
                }
                Ok(inner)
            }
            Some(token) => Err(SandboxError::Syntax(format!(
                "unexpected token: {:?}",
                token
            ))),
            None => Err(SandboxError::Syntax("unexpected end of snippet".into())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sandbox::lexer::tokenize;

    fn parse_str(snippet: &str) -> Result<Vec<Assign>, SandboxError> {
        parse(&tokenize(snippet)?)
    }

    #[test]
    fn parses_multiline_assignments() {
        let stmts = parse_str("a = 1\nb = a + 2\nresult = b * 3").unwrap();
        assert_eq!(stmts.len(), 3);
        assert_eq!(stmts[2].target, "result");
    }

    #[test]
    fn multiplication_binds_tighter_than_addition() {
        let stmts = parse_str("result = 2 + 3 * 4").unwrap();
        match &stmts[0].value {
            Expr::Binary { op: BinOp::Add, rhs, .. } => {
                assert!(matches!(**rhs, Expr::Binary { op: BinOp::Mul, .. }));
            }
            other => panic!("expected addition at the root, got {:?}", other),
        }
    }

    #[test]
    fn rejects_function_calls() {
        assert_eq!(
            parse_str("result = foo(2)"),
            Err(SandboxError::Disallowed("function call"))
        );
    }

    #[test]
    fn rejects_bare_expression_statements() {
        assert_eq!(
            parse_str("2 + 3"),
            Err(SandboxError::Disallowed("expression statement"))
        );
        assert_eq!(
            parse_str("x + 3"),
            Err(SandboxError::Disallowed("expression statement"))
        );
    }

    #[test]
    fn unary_minus_binds_looser_than_power() {
        let stmts = parse_str("result = -2 ** 2").unwrap();
        assert!(matches!(stmts[0].value, Expr::Neg(_)));
    }

    #[test]
    fn rejects_unbalanced_parens() {
        assert!(matches!(
            parse_str("result = (2 + 3"),
            Err(SandboxError::Syntax(_))
        ));
    }
}
