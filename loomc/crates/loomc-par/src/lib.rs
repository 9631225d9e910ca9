//! loomc-par - the tree-building, IR-emitting parser.
//!
//! This crate owns everything the pipeline's middle four components need:
//! the tagged expression/statement tree ([`ast`]), the lexically scoped
//! symbol environment ([`env`]), the process-wide emission context
//! ([`ctx`]), the `compile` capability that lowers the tree into IR
//! ([`compile`]), and the recursive-descent parser that drives both the
//! scanner and emission in one pass ([`parser`]).
//!
//! [`compile_module`] is the entry point the driver calls: it parses the
//! whole program, then compiles every top-level item in source order,
//! repositioning the builder back into `main` after each one (compiling a
//! `fun_def`'s body leaves the builder inside that function, not in
//! `main`, so every subsequent top-level `fun_call` needs to be pointed
//! back before it emits).

pub mod ast;
pub mod compile;
pub mod ctx;
pub mod env;
pub mod parser;

#[cfg(test)]
mod tests;

use inkwell::context::Context;
use inkwell::module::Module;
use loomc_util::Handler;

use compile::Compile;
use parser::Parser;

/// Parses and compiles `source` into an IR module. Returns `None` when any
/// error was recorded — the caller (the driver) checks `handler` to report
/// the aggregate count and must not write output in that case.
pub fn compile_module<'ctx>(
    context: &'ctx Context,
    module_name: &str,
    source: &str,
    handler: &Handler,
) -> Option<Module<'ctx>> {
    let mut parser = Parser::new(source, handler, context, module_name);
    let items = parser.parse_program().ok()?;
    let mut ctx = parser.into_ctx();

    let main = ctx.main_function();
    for item in &items {
        item.compile(&mut ctx);
        let last_block = main.get_last_basic_block().expect("main always has a block");
        ctx.builder.position_at_end(last_block);
    }

    ctx.program_postinit();

    if ctx.err_num() > 0 {
        None
    } else {
        Some(ctx.module)
    }
}
