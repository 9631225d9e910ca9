//! Expression grammar: `pbool` (loosest) down through `factor` (tightest).
//!
//! Each level is a thin `{ op rhs }*` loop over the next-tighter level,
//! except `rel` (non-associative: only one comparison per expression) and
//! `unary`/`factor`, which recurse into themselves and into each other.

use loomc_lex::{Tag, Token};
use loomc_util::Symbol;

use crate::ast::{ArithOp, ArrayCap, BoolOp, Expr};

use super::{Aborted, PResult, Parser};

impl<'ctx, 'src> Parser<'ctx, 'src> {
    pub(super) fn pbool(&mut self) -> PResult<Expr<'ctx>> {
        let mut lhs = self.join()?;
        while self.tok.is(Tag::Or) {
            let span = self.span();
            self.advance();
            let rhs = self.join()?;
            lhs = Expr::Bool { op: BoolOp::Or, lhs: Box::new(lhs), rhs: Box::new(rhs), span };
        }
        Ok(lhs)
    }

    fn join(&mut self) -> PResult<Expr<'ctx>> {
        let mut lhs = self.equality()?;
        while self.tok.is(Tag::And) {
            let span = self.span();
            self.advance();
            let rhs = self.equality()?;
            lhs = Expr::Bool { op: BoolOp::And, lhs: Box::new(lhs), rhs: Box::new(rhs), span };
        }
        Ok(lhs)
    }

    fn equality(&mut self) -> PResult<Expr<'ctx>> {
        let mut lhs = self.rel()?;
        loop {
            let op = match self.tok.tag() {
                Tag::Eq => BoolOp::Eq,
                Tag::Ne => BoolOp::Ne,
                _ => break,
            };
            let span = self.span();
            self.advance();
            let rhs = self.rel()?;
            lhs = Expr::Bool { op, lhs: Box::new(lhs), rhs: Box::new(rhs), span };
        }
        Ok(lhs)
    }

    /// Non-associative: at most one comparison, unlike every level above
    /// and below it.
    fn rel(&mut self) -> PResult<Expr<'ctx>> {
        let lhs = self.expr()?;
        let op = match self.tok.tag() {
            Tag::Char('<') => BoolOp::Lt,
            Tag::Le => BoolOp::Le,
            Tag::Ge => BoolOp::Ge,
            Tag::Char('>') => BoolOp::Gt,
            _ => return Ok(lhs),
        };
        let span = self.span();
        self.advance();
        let rhs = self.expr()?;
        Ok(Expr::Bool { op, lhs: Box::new(lhs), rhs: Box::new(rhs), span })
    }

    fn expr(&mut self) -> PResult<Expr<'ctx>> {
        let mut lhs = self.term()?;
        loop {
            let op = match self.tok.tag() {
                Tag::Char('+') => ArithOp::Add,
                Tag::Char('-') => ArithOp::Sub,
                _ => break,
            };
            let span = self.span();
            self.advance();
            let rhs = self.term()?;
            lhs = Expr::Arith { op, lhs: Box::new(lhs), rhs: Box::new(rhs), span };
        }
        Ok(lhs)
    }

    fn term(&mut self) -> PResult<Expr<'ctx>> {
        let mut lhs = self.unary()?;
        loop {
            let op = match self.tok.tag() {
                Tag::Char('*') => ArithOp::Mul,
                Tag::Char('/') => ArithOp::Div,
                _ => break,
            };
            let span = self.span();
            self.advance();
            let rhs = self.unary()?;
            lhs = Expr::Arith { op, lhs: Box::new(lhs), rhs: Box::new(rhs), span };
        }
        Ok(lhs)
    }

    fn unary(&mut self) -> PResult<Expr<'ctx>> {
        match self.tok.tag() {
            Tag::Char('-') => {
                let span = self.span();
                self.advance();
                let operand = self.unary()?;
                Ok(Expr::Neg { operand: Box::new(operand), span })
            }
            Tag::Char('!') => {
                let span = self.span();
                self.advance();
                let operand = self.unary()?;
                Ok(Expr::Not { operand: Box::new(operand), span })
            }
            _ => self.factor(),
        }
    }

    fn factor(&mut self) -> PResult<Expr<'ctx>> {
        match self.tok.tag() {
            Tag::Char('(') => {
                self.advance();
                let inner = self.recurse(|p| p.pbool())?;
                self.expect(Tag::Char(')'), "')'")?;
                Ok(inner)
            }
            Tag::Num => {
                let Token::Number(n) = self.tok else {
                    unreachable!("Tag::Num only tags a Token::Number")
                };
                self.advance();
                Ok(Expr::FConstant(n))
            }
            Tag::True => {
                self.advance();
                Ok(Expr::FConstant(1.0))
            }
            Tag::False => {
                self.advance();
                Ok(Expr::FConstant(0.0))
            }
            Tag::Id => self.id_factor(),
            Tag::Char('[') => {
                let span = self.span();
                self.advance();
                let elements = self.recurse(|p| p.expr_seq())?;
                self.expect(Tag::Char(']'), "']'")?;
                self.build_array_constant(elements, span)
            }
            Tag::Eof => {
                self.ctx.error("unexpected end of program", self.span());
                Err(Aborted)
            }
            _ => {
                self.ctx.error("unexpected token", self.span());
                self.advance();
                Ok(Expr::FConstant(0.0))
            }
        }
    }

    /// Factor's `ID` case. Discriminates on the looked-up entity and the
    /// next token: plain scalar is a `Load`, array with nothing following
    /// is an `ArrayLoad`, array followed by `[` is a `Load` over an
    /// `Access`, and an unknown name followed by `(` is a call.
    fn id_factor(&mut self) -> PResult<Expr<'ctx>> {
        let span = self.span();
        let Token::Word(_, name) = self.tok else {
            unreachable!("Tag::Id only tags a Token::Word")
        };
        self.advance();

        match self.ctx.lookup(name) {
            Some(decl_id) => {
                if self.ctx.decl(decl_id).is_array() {
                    if self.tok.is(Tag::Char('[')) {
                        let indices = self.index_list()?;
                        let access = Expr::Access { base: decl_id, indices, span };
                        Ok(Expr::Load { operand: Box::new(access), span })
                    } else {
                        Ok(Expr::ArrayLoad(decl_id))
                    }
                } else {
                    Ok(Expr::Load { operand: Box::new(Expr::Id(decl_id)), span })
                }
            }
            None => {
                if self.tok.is(Tag::Char('(')) {
                    self.fun_call(name, span)
                } else {
                    self.ctx.error(format!("using of undeclared '{}'", name.as_str()), span);
                    Ok(Expr::FConstant(0.0))
                }
            }
        }
    }

    pub(super) fn index_list(&mut self) -> PResult<Vec<Expr<'ctx>>> {
        let mut indices = Vec::new();
        while self.tok.is(Tag::Char('[')) {
            self.advance();
            indices.push(self.pbool()?);
            self.expect(Tag::Char(']'), "']'")?;
        }
        Ok(indices)
    }

    pub(super) fn fun_call(&mut self, name: Symbol, span: loomc_util::Span) -> PResult<Expr<'ctx>> {
        self.expect(Tag::Char('('), "'('")?;
        let args = self.expr_seq()?;
        self.expect(Tag::Char(')'), "')'")?;
        Ok(Expr::Call { name, args, span })
    }

    pub(super) fn expr_seq(&mut self) -> PResult<Vec<Expr<'ctx>>> {
        let mut items = Vec::new();
        if self.is_expr_start() {
            items.push(self.pbool()?);
            while self.tok.is(Tag::Char(',')) {
                self.advance();
                items.push(self.pbool()?);
            }
        }
        Ok(items)
    }

    fn is_expr_start(&self) -> bool {
        matches!(
            self.tok.tag(),
            Tag::Char('(')
                | Tag::Num
                | Tag::True
                | Tag::False
                | Tag::Id
                | Tag::Char('[')
                | Tag::Char('-')
                | Tag::Char('!')
        )
    }

    /// Validates the shape and constantness of an array literal - either
    /// every element is an already-typed `FConstant`, or every element is
    /// itself an `ArrayConstant` of one common shape - and computes the
    /// resulting array capability. A malformed literal reports "constant
    /// array has non-constant initializer" and returns a harmless scalar
    /// placeholder so parsing can continue.
    fn build_array_constant(&mut self, elements: Vec<Expr<'ctx>>, span: loomc_util::Span) -> PResult<Expr<'ctx>> {
        if elements.is_empty() {
            self.ctx.error("constant array has non-constant initializer", span);
            return Ok(Expr::FConstant(0.0));
        }

        if matches!(elements[0], Expr::ArrayConstant { .. }) {
            let Expr::ArrayConstant { array_cap: first_cap, .. } = &elements[0] else {
                unreachable!()
            };
            let first_cap = *first_cap;
            for element in &elements {
                match element {
                    Expr::ArrayConstant { array_cap, .. } if array_cap.array_ty == first_cap.array_ty => {}
                    _ => {
                        self.ctx.error("constant array has non-constant initializer", span);
                        return Ok(Expr::FConstant(0.0));
                    }
                }
            }
            let array_ty = first_cap.array_ty.array_type(elements.len() as u32);
            let align = self.ctx.preferred_alignment(&array_ty);
            Ok(Expr::ArrayConstant { elements, array_cap: ArrayCap { array_ty, align }, span })
        } else {
            for element in &elements {
                if !matches!(element, Expr::FConstant(_)) {
                    self.ctx.error("constant array has non-constant initializer", span);
                    return Ok(Expr::FConstant(0.0));
                }
            }
            let f64_ty = self.ctx.context.f64_type();
            let array_ty = f64_ty.array_type(elements.len() as u32);
            let align = self.ctx.preferred_alignment(&array_ty);
            Ok(Expr::ArrayConstant { elements, array_cap: ArrayCap { array_ty, align }, span })
        }
    }
}
