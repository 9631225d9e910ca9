//! Recursive-descent parser, one-token lookahead.
//!
//! Split by concern:
//! - this module - token handling, scope/loop guards, declarations
//! - `expr` - the expression grammar (`pbool` down to `factor`)
//! - `stmt` - the statement grammar
//!
//! Declarations (`Id`/`Array` slots, `FunStmt` skeletons) are emitted
//! eagerly as a side effect of parsing; call arguments and function
//! bodies are only *collected* here and compiled later by whoever drives
//! [`crate::compile`].

mod expr;
mod stmt;

use inkwell::context::Context;
use inkwell::module::Linkage;
use loomc_lex::{Lexer, Tag, Token};
use loomc_util::{Handler, Span, Symbol};

use crate::ast::{ArrayCap, Decl, DeclId, LoopId, Stmt};
use crate::ctx::EmitCtx;

/// The only way a parse can be aborted outright: running out of input
/// mid-production, or exceeding the recursion-depth limit. Every other
/// diagnostic is reported and parsing continues on a best-effort basis.
#[derive(Debug)]
pub struct Aborted;

pub type PResult<T> = Result<T, Aborted>;

pub struct Parser<'ctx, 'src> {
    lexer: Lexer<'src>,
    tok: Token,
    pub ctx: EmitCtx<'ctx, 'src>,
    loop_stack: Vec<LoopId>,
}

impl<'ctx, 'src> Parser<'ctx, 'src> {
    pub fn new(source: &'src str, handler: &'src Handler, context: &'ctx Context, module_name: &str) -> Self {
        let mut lexer = Lexer::new(source, handler);
        let tok = Lexer::scan(&mut lexer);
        let ctx = EmitCtx::program_preinit(context, module_name, handler);
        Self { lexer, tok, ctx, loop_stack: Vec::new() }
    }

    pub fn into_ctx(self) -> EmitCtx<'ctx, 'src> {
        self.ctx
    }

    /// Top-level items, in source order. Each `fun_def` is fully declared
    /// (function + parameter slots + `ret` slot) but its body is only
    /// collected, not compiled; each top-level `fun_call` is likewise just
    /// collected as an `ExprStmt`. The caller compiles them in order.
    pub fn parse_program(&mut self) -> PResult<Vec<Stmt<'ctx>>> {
        let mut items = Vec::new();
        while !self.tok.is(Tag::Eof) {
            if self.tok.is(Tag::Fun) {
                items.push(self.fun_def()?);
            } else {
                let span = self.span();
                let name = self.expect_id()?;
                let call = self.fun_call(name, span)?;
                if self.tok.is(Tag::Char(';')) {
                    self.advance();
                }
                items.push(Stmt::ExprStmt(Some(call)));
            }
        }
        Ok(items)
    }

    fn fun_def(&mut self) -> PResult<Stmt<'ctx>> {
        self.advance(); // 'fun'
        let name = self.expect_id()?;
        self.expect(Tag::Char('('), "'('")?;
        let mut params = Vec::new();
        if !self.tok.is(Tag::Char(')')) {
            loop {
                params.push(self.expect_id()?);
                if self.tok.is(Tag::Char(',')) {
                    self.advance();
                } else {
                    break;
                }
            }
        }
        self.expect(Tag::Char(')'), "')'")?;

        let f64_ty = self.ctx.context.f64_type();
        let param_tys: Vec<_> = params.iter().map(|_| f64_ty.into()).collect();
        let fn_ty = f64_ty.fn_type(&param_tys, false);
        let function = self.ctx.module.add_function(name.as_str(), fn_ty, Some(Linkage::External));
        let entry = self.ctx.context.append_basic_block(function, "entry");
        self.ctx.builder.position_at_end(entry);
        let ret_slot = self.ctx.builder.build_alloca(f64_ty, "ret").expect("building an alloca cannot fail");
        self.ctx.reset_return_count();

        let body = self.with_scope(|parser| {
            for (index, pname) in params.iter().enumerate() {
                let ptr = parser
                    .ctx
                    .builder
                    .build_alloca(f64_ty, pname.as_str())
                    .expect("building an alloca cannot fail");
                let param_val = function
                    .get_nth_param(index as u32)
                    .expect("parameter count matches declared signature")
                    .into_float_value();
                param_val.set_name(pname.as_str());
                parser.ctx.builder.build_store(ptr, param_val).expect("building a store cannot fail");
                let decl_id = parser.ctx.declare(Decl { name: *pname, ptr, array_cap: None });
                parser.ctx.env.insert(*pname, decl_id);
            }
            parser.expect(Tag::Indent, "an indented function body")?;
            let body = parser.stmts()?;
            parser.expect(Tag::Dedent, "a dedent closing the function body")?;
            Ok(body)
        })?;

        if self.ctx.returns_seen() == 0 {
            self.ctx.error("function must have a return statement", self.span());
        }

        Ok(Stmt::FunStmt { function, ret_slot, body: Box::new(body) })
    }

    // -- token handling ----------------------------------------------------

    fn advance(&mut self) {
        self.tok = Lexer::scan(&mut self.lexer);
    }

    fn span(&self) -> Span {
        Span::new(0, 0, self.lexer.line(), 1)
    }

    /// Consumes `tag` if present; otherwise reports a diagnostic and
    /// leaves the token stream where it is, so the caller can attempt to
    /// resynchronize rather than aborting. Running out of input is the
    /// one case that does abort.
    fn expect(&mut self, tag: Tag, what: &str) -> PResult<()> {
        if self.tok.is(Tag::Eof) {
            self.ctx.error("unexpected end of program", self.span());
            return Err(Aborted);
        }
        if self.tok.is(tag) {
            self.advance();
        } else {
            self.ctx.error(format!("expected {what}"), self.span());
        }
        Ok(())
    }

    fn expect_id(&mut self) -> PResult<Symbol> {
        if self.tok.is(Tag::Eof) {
            self.ctx.error("unexpected end of program", self.span());
            return Err(Aborted);
        }
        match self.tok {
            Token::Word(Tag::Id, sym) => {
                self.advance();
                Ok(sym)
            }
            _ => {
                self.ctx.error("expected identifier", self.span());
                Ok(Symbol::intern("<error>"))
            }
        }
    }

    // -- scoped acquisition -------------------------------------------------

    /// Pushes a fresh scope for the duration of `f`, guaranteeing it is
    /// popped on every exit path - including the `?` short-circuit on a
    /// fatal parse error.
    fn with_scope<T>(&mut self, f: impl FnOnce(&mut Self) -> PResult<T>) -> PResult<T> {
        self.ctx.env.push();
        let result = f(self);
        self.ctx.env.pop();
        result
    }

    /// Marks `f`'s dynamic extent as inside a new loop, so any `Break`
    /// parsed within it captures this loop's id.
    fn with_loop<T>(&mut self, f: impl FnOnce(&mut Self, LoopId) -> PResult<T>) -> PResult<T> {
        let id = self.ctx.fresh_loop_id();
        self.loop_stack.push(id);
        let result = f(self, id);
        self.loop_stack.pop();
        result
    }

    /// Guards a production that may nest arbitrarily deep (parenthesized
    /// expressions, array literals) against unbounded recursion.
    fn recurse<T>(&mut self, f: impl FnOnce(&mut Self) -> PResult<T>) -> PResult<T> {
        if !self.ctx.enter_recursive() {
            return Err(Aborted);
        }
        let result = f(self);
        self.ctx.leave_recursive();
        result
    }

    // -- declarations --------------------------------------------------------

    fn get_id(&mut self, name: Symbol, span: Span) -> DeclId {
        if self.ctx.env.get_current(name).is_some() {
            self.ctx.error(format!("redefinition of '{}'", name.as_str()), span);
        }
        let f64_ty = self.ctx.context.f64_type();
        let ptr = self.ctx.builder.build_alloca(f64_ty, name.as_str()).expect("building an alloca cannot fail");
        let decl_id = self.ctx.declare(Decl { name, ptr, array_cap: None });
        self.ctx.env.insert(name, decl_id);
        decl_id
    }

    fn get_array(&mut self, name: Symbol, dims: &[u32], span: Span) -> DeclId {
        if self.ctx.env.get_current(name).is_some() {
            self.ctx.error(format!("redefinition of '{}'", name.as_str()), span);
        }
        let f64_ty = self.ctx.context.f64_type();
        let (last, rest) = dims.split_last().expect("decls always parses at least one dimension");
        let mut array_ty = f64_ty.array_type(*last);
        for &dim in rest.iter().rev() {
            array_ty = array_ty.array_type(dim);
        }
        let ptr = self.ctx.builder.build_alloca(array_ty, name.as_str()).expect("building an alloca cannot fail");
        let align = self.ctx.preferred_alignment(&array_ty);
        let decl_id = self.ctx.declare(Decl { name, ptr, array_cap: Some(ArrayCap { array_ty, align }) });
        self.ctx.env.insert(name, decl_id);
        decl_id
    }

    fn array_dim(&mut self) -> PResult<u32> {
        if self.tok.is(Tag::Eof) {
            self.ctx.error("unexpected end of program", self.span());
            return Err(Aborted);
        }
        match self.tok {
            Token::Number(n) => {
                self.advance();
                if n.fract() != 0.0 {
                    self.ctx.error("array size must not be double", self.span());
                    Ok(1)
                } else if n <= 0.0 {
                    self.ctx.error("array size must be positive number", self.span());
                    Ok(1)
                } else {
                    Ok(n as u32)
                }
            }
            _ => {
                self.ctx.error("expected array size", self.span());
                Ok(1)
            }
        }
    }
}
