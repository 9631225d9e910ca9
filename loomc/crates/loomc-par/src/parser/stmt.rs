//! Statement grammar.

use loomc_lex::Tag;

use crate::ast::{DeclId, Expr, Stmt};

use super::{Aborted, PResult, Parser};

impl<'ctx, 'src> Parser<'ctx, 'src> {
    /// One statement, dispatched on the lookahead token. Defaults to a bare
    /// expression statement when nothing else matches.
    pub(super) fn stmt(&mut self) -> PResult<Stmt<'ctx>> {
        match self.tok.tag() {
            Tag::Char(';') => Ok(Stmt::ExprStmt(None)),
            Tag::Let => self.decls().map(|(stmt, _)| stmt),
            Tag::If => self.if_stmt(),
            Tag::While => self.while_stmt(),
            Tag::Repeat => self.repeat_stmt(),
            Tag::For => self.for_stmt(),
            Tag::Break => self.break_stmt(),
            Tag::Return => self.return_stmt(),
            Tag::Id => self.assign_or_call(),
            _ => {
                let expr = self.pbool()?;
                Ok(Stmt::ExprStmt(Some(expr)))
            }
        }
    }

    /// A statement block: statements chained left-associatively until the
    /// enclosing `Dedent`/`Eof`. An empty block compiles to a no-op.
    pub(super) fn stmts(&mut self) -> PResult<Stmt<'ctx>> {
        let mut block = Stmt::ExprStmt(None);
        while !self.tok.is(Tag::Dedent) && !self.tok.is(Tag::Eof) {
            let next = self.stmt()?;
            if self.tok.is(Tag::Char(';')) {
                self.advance();
            }
            block = Stmt::StmtSeq(Box::new(block), Box::new(next));
        }
        Ok(block)
    }

    /// `'let' ID` followed by either one-or-more `[NUM]` dimensions (an
    /// array) or a bare optional initializer (a scalar). Returns both the
    /// statement and the declared slot, since `for` reuses this to get at
    /// the counter's `DeclId`.
    pub(super) fn decls(&mut self) -> PResult<(Stmt<'ctx>, DeclId)> {
        self.advance(); // 'let'
        let span = self.span();
        let name = self.expect_id()?;

        if self.tok.is(Tag::Char('[')) {
            let mut dims = Vec::new();
            while self.tok.is(Tag::Char('[')) {
                self.advance();
                dims.push(self.array_dim()?);
                self.expect(Tag::Char(']'), "']'")?;
            }
            let decl_id = self.get_array(name, &dims, span);
            if self.tok.is(Tag::Char('=')) {
                self.advance();
                let value = self.pbool()?;
                let store = Expr::Store { dest: Box::new(Expr::Array(decl_id)), value: Box::new(value), span };
                Ok((Stmt::ExprStmt(Some(store)), decl_id))
            } else {
                Ok((Stmt::ExprStmt(None), decl_id))
            }
        } else {
            let decl_id = self.get_id(name, span);
            if self.tok.is(Tag::Char('=')) {
                self.advance();
                let value = self.pbool()?;
                let store = Expr::Store { dest: Box::new(Expr::Id(decl_id)), value: Box::new(value), span };
                Ok((Stmt::ExprStmt(Some(store)), decl_id))
            } else {
                Ok((Stmt::ExprStmt(None), decl_id))
            }
        }
    }

    /// `ID` at statement position: either a call (when followed by `(` and
    /// undeclared as a variable) or an assignment to a scalar/array slot.
    fn assign_or_call(&mut self) -> PResult<Stmt<'ctx>> {
        let span = self.span();
        let name = self.expect_id()?;

        if self.ctx.lookup(name).is_none() && self.tok.is(Tag::Char('(')) {
            let call = self.fun_call(name, span)?;
            return Ok(Stmt::ExprStmt(Some(call)));
        }

        let Some(decl_id) = self.ctx.lookup(name) else {
            self.ctx.error(format!("using of undeclared '{}'", name.as_str()), span);
            // Resynchronize past a best-effort rhs so a missing declaration
            // doesn't cascade into a flood of further diagnostics.
            if self.tok.is(Tag::Char('=')) {
                self.advance();
                self.pbool()?;
            }
            return Ok(Stmt::ExprStmt(None));
        };

        let dest = if self.ctx.decl(decl_id).is_array() && self.tok.is(Tag::Char('[')) {
            let indices = self.index_list()?;
            Expr::Access { base: decl_id, indices, span }
        } else if self.ctx.decl(decl_id).is_array() {
            Expr::Array(decl_id)
        } else {
            Expr::Id(decl_id)
        };

        self.expect(Tag::Char('='), "'='")?;
        let value = self.pbool()?;
        let store = Expr::Store { dest: Box::new(dest), value: Box::new(value), span };
        Ok(Stmt::ExprStmt(Some(store)))
    }

    fn if_stmt(&mut self) -> PResult<Stmt<'ctx>> {
        let span = self.span();
        self.advance(); // 'if'
        let cond = self.pbool()?;
        self.expect(Tag::Indent, "an indented block")?;
        let then_body = self.with_scope(|p| p.stmts())?;
        self.expect(Tag::Dedent, "a dedent closing the block")?;

        if self.tok.is(Tag::Else) {
            self.advance();
            self.expect(Tag::Indent, "an indented block")?;
            let else_body = self.with_scope(|p| p.stmts())?;
            self.expect(Tag::Dedent, "a dedent closing the block")?;
            Ok(Stmt::IfElse { cond, then_body: Box::new(then_body), else_body: Box::new(else_body), span })
        } else {
            Ok(Stmt::If { cond, then_body: Box::new(then_body), span })
        }
    }

    fn while_stmt(&mut self) -> PResult<Stmt<'ctx>> {
        let span = self.span();
        self.advance(); // 'while'
        let cond = self.pbool()?;
        self.expect(Tag::Indent, "an indented block")?;
        self.with_loop(|p, id| {
            let body = p.with_scope(|p| p.stmts())?;
            p.expect(Tag::Dedent, "a dedent closing the block")?;
            Ok(Stmt::While { id, cond, body: Box::new(body), span })
        })
    }

    fn repeat_stmt(&mut self) -> PResult<Stmt<'ctx>> {
        let span = self.span();
        self.advance(); // 'repeat'
        self.expect(Tag::Indent, "an indented block")?;
        self.with_loop(|p, id| {
            let body = p.with_scope(|p| p.stmts())?;
            p.expect(Tag::Dedent, "a dedent closing the block")?;
            p.expect(Tag::Until, "'until'")?;
            let cond = p.pbool()?;
            Ok(Stmt::RepeatUntil { id, body: Box::new(body), cond, span })
        })
    }

    fn for_stmt(&mut self) -> PResult<Stmt<'ctx>> {
        let span = self.span();
        self.advance(); // 'for'
        self.with_scope(|p| {
            let (init, counter) = p.decls()?;
            let downto = match p.tok.tag() {
                Tag::To => false,
                Tag::Downto => true,
                _ => {
                    p.ctx.error("expected 'to' or 'downto'", p.span());
                    false
                }
            };
            p.advance();
            let limit = p.pbool()?;
            p.expect(Tag::Indent, "an indented block")?;
            p.with_loop(|p, id| {
                let body = p.with_scope(|p| p.stmts())?;
                p.expect(Tag::Dedent, "a dedent closing the block")?;
                Ok(Stmt::For {
                    id,
                    counter,
                    init: Box::new(init),
                    downto,
                    limit,
                    body: Box::new(body),
                    span,
                })
            })
        })
    }

    fn break_stmt(&mut self) -> PResult<Stmt<'ctx>> {
        let span = self.span();
        self.advance(); // 'break'
        let loop_id = self.loop_stack.last().copied();
        if loop_id.is_none() {
            self.ctx.error("unenclosed break", span);
        }
        Ok(Stmt::Break { loop_id, span })
    }

    fn return_stmt(&mut self) -> PResult<Stmt<'ctx>> {
        let span = self.span();
        self.advance(); // 'return'
        let value = self.pbool()?;
        self.ctx.record_return();
        Ok(Stmt::Return { value, span })
    }
}
