//! Recursive-descent compiler for the XPath subset, with an explicit
//! precedence cascade (`or_expr` -> `and_expr` -> `cmp_expr` -> `prim`)
//! rather than a general parsing framework.

use crate::error::{Error, Result};

use super::ast::{CmpOp, Expr, Func, NameTest, Step};
use super::lexer::{Lexer, Token, TokenKind};

pub struct Parser<'a> {
    lexer: Lexer<'a>,
    current: Token,
}

impl<'a> Parser<'a> {
    pub fn new(input: &'a str) -> Result<Parser<'a>> {
        let mut lexer = Lexer::new(input);
        let current = lexer.next_token()?;
        Ok(Parser { lexer, current })
    }

    fn bump(&mut self) -> Result<Token> {
        let next = self.lexer.next_token()?;
        Ok(std::mem::replace(&mut self.current, next))
    }

    fn expect(&mut self, kind: &TokenKind) -> Result<Token> {
        if std::mem::discriminant(&self.current.kind) == std::mem::discriminant(kind) {
            self.bump()
        } else {
            Err(Error::unsupported_at(
                format!("expected {kind:?}, found {:?}", self.current.kind),
                self.current.pos,
            ))
        }
    }

    /// Parses a full `path` and checks that input is fully consumed.
    pub fn parse_path(&mut self, allow_absolute: bool) -> Result<(bool, Vec<Step>)> {
        let absolute = matches!(self.current.kind, TokenKind::Slash);
        if absolute {
            if !allow_absolute {
                return Err(Error::unsupported_at(
                    "absolute path not allowed in a subset-scoped query",
                    self.current.pos,
                ));
            }
            self.bump()?;
        }
        let mut steps = vec![self.parse_step()?];
        while matches!(self.current.kind, TokenKind::Slash) {
            self.bump()?;
            steps.push(self.parse_step()?);
        }
        if !matches!(self.current.kind, TokenKind::Eof) {
            return Err(Error::unsupported_at(
                format!("unexpected trailing input: {:?}", self.current.kind),
                self.current.pos,
            ));
        }
        Ok((absolute, steps))
    }

    fn parse_step(&mut self) -> Result<Step> {
        let name_test = match self.bump()?.kind {
            TokenKind::Star => NameTest::Wildcard,
            TokenKind::Ident(name) => NameTest::Name(name),
            other => {
                return Err(Error::unsupported_at(
                    format!("expected a name or '*', found {other:?}"),
                    self.current.pos,
                ))
            }
        };
        let mut predicates = Vec::new();
        while matches!(self.current.kind, TokenKind::LBracket) {
            self.bump()?;
            let expr = self.parse_expr()?;
            self.expect(&TokenKind::RBracket)?;
            predicates.push(finalize_predicate(expr));
        }
        Ok(Step { name_test, predicates })
    }

    fn parse_expr(&mut self) -> Result<Expr> {
        self.parse_or()
    }

    fn parse_or(&mut self) -> Result<Expr> {
        let mut lhs = self.parse_and()?;
        while is_ident(&self.current.kind, "or") {
            self.bump()?;
            let rhs = self.parse_and()?;
            lhs = Expr::Or(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_and(&mut self) -> Result<Expr> {
        let mut lhs = self.parse_cmp()?;
        while is_ident(&self.current.kind, "and") {
            self.bump()?;
            let rhs = self.parse_cmp()?;
            lhs = Expr::And(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_cmp(&mut self) -> Result<Expr> {
        let lhs = self.parse_prim()?;
        let op = match self.current.kind {
            TokenKind::Eq => CmpOp::Eq,
            TokenKind::Ne => CmpOp::Ne,
            TokenKind::Lt => CmpOp::Lt,
            TokenKind::Gt => CmpOp::Gt,
            TokenKind::Le => CmpOp::Le,
            TokenKind::Ge => CmpOp::Ge,
            _ => return Ok(lhs),
        };
        self.bump()?;
        let rhs = self.parse_prim()?;
        Ok(Expr::Compare(Box::new(lhs), op, Box::new(rhs)))
    }

    fn parse_prim(&mut self) -> Result<Expr> {
        let tok = self.bump()?;
        match tok.kind {
            TokenKind::Int(n) => Ok(Expr::Int(n)),
            TokenKind::Str(s) => Ok(Expr::Str(s)),
            TokenKind::At => match self.bump()?.kind {
                TokenKind::Ident(name) => Ok(Expr::Attr(name)),
                other => Err(Error::unsupported_at(
                    format!("expected attribute name after '@', found {other:?}"),
                    tok.pos,
                )),
            },
            TokenKind::LParen => {
                let inner = self.parse_expr()?;
                self.expect(&TokenKind::RParen)?;
                Ok(inner)
            }
            TokenKind::Ident(name) => {
                if matches!(self.current.kind, TokenKind::LParen) {
                    self.parse_func_call(name, tok.pos)
                } else {
                    Ok(Expr::ElementNameIs(name))
                }
            }
            other => Err(Error::unsupported_at(
                format!("unexpected token {other:?} in expression"),
                tok.pos,
            )),
        }
    }

    fn parse_func_call(&mut self, name: String, name_pos: usize) -> Result<Expr> {
        let func = Func::from_name(&name)
            .ok_or_else(|| Error::unsupported_at(format!("unknown function '{name}'"), name_pos))?;
        self.expect(&TokenKind::LParen)?;
        let mut args = Vec::new();
        if !matches!(self.current.kind, TokenKind::RParen) {
            args.push(self.parse_expr_checked(name_pos)?);
            while matches!(self.current.kind, TokenKind::Comma) {
                self.bump()?;
                args.push(self.parse_expr_checked(name_pos)?);
            }
        }
        if !matches!(self.current.kind, TokenKind::RParen) {
            return Err(Error::unsupported_at(
                format!("unterminated call to '{name}'"),
                name_pos,
            ));
        }
        self.bump()?;
        if args.len() != func.arity() {
            return Err(Error::unsupported_at(
                format!(
                    "'{name}' expects {} argument(s), found {}",
                    func.arity(),
                    args.len()
                ),
                name_pos,
            ));
        }
        Ok(Expr::Call(func, args))
    }

    /// Like `parse_expr`, but wraps any parse error's position with
    /// `name_pos` so a failure inside a function call's argument list is
    /// reported at the call's own start, not deep inside the arguments.
    fn parse_expr_checked(&mut self, name_pos: usize) -> Result<Expr> {
        self.parse_expr().map_err(|e| match e {
            Error::Positioned { kind, message, .. } => Error::at(kind, message, name_pos),
            other => other,
        })
    }
}

fn is_ident(kind: &TokenKind, word: &str) -> bool {
    matches!(kind, TokenKind::Ident(s) if s == word)
}

/// `[N]` is shorthand for `[position()=N]`.
fn finalize_predicate(expr: Expr) -> Expr {
    if let Expr::Int(n) = expr {
        Expr::Compare(
            Box::new(Expr::Call(Func::Position, vec![])),
            CmpOp::Eq,
            Box::new(Expr::Int(n)),
        )
    } else {
        expr
    }
}
