//! The process-wide emission context.
//!
//! Every `compile` call receives a `&mut EmitCtx`: the module under
//! construction, the builder (whose insertion point moves as blocks are
//! built), a data-layout oracle for alignment/size queries, the
//! declaration arena, the active scope stack, and a handful of counters.
//! There is exactly one `EmitCtx` per compilation; nothing here is ever
//! shared across threads (see the driver for why that's fine).

use inkwell::basic_block::BasicBlock;
use inkwell::builder::Builder;
use inkwell::context::Context;
use inkwell::module::{Linkage, Module};
use inkwell::targets::TargetData;
use inkwell::types::BasicTypeEnum;
use inkwell::values::{FunctionValue, PointerValue};
use inkwell::AddressSpace;
use rustc_hash::FxHashMap;

use loomc_util::{Handler, Span, Symbol};

use crate::ast::{ArrayCap, Decl, DeclId, LoopId};
use crate::env::Env;

/// A generic little-endian 64-bit layout - this front end never targets a
/// real machine, it only needs `TargetData` for alignment and
/// size-in-bits queries, not for codegen.
const DATA_LAYOUT: &str = "e-m:e-i64:64-f80:128-n8:16:32:64-S128";

/// Maximum nesting depth for parenthesized expressions and array literals
/// before the parser gives up with "reached recursion limits".
pub const MAX_RECURSION_DEPTH: u32 = 1000;

pub struct EmitCtx<'ctx, 'h> {
    pub context: &'ctx Context,
    pub module: Module<'ctx>,
    pub builder: Builder<'ctx>,
    pub layout: TargetData,
    pub handler: &'h Handler,

    pub env: Env,
    pub decls: Vec<Decl<'ctx>>,

    /// Return statements seen while parsing the function currently being
    /// built; reset to zero on entry to each `fun_def`.
    ret_num: u32,
    /// The `ret` slot of the function currently being emitted, or `None`
    /// outside of any function body.
    current_ret_slot: Option<PointerValue<'ctx>>,
    /// Recursion depth for parenthesized expressions and array literals.
    depth: u32,

    next_loop_id: u32,
    /// Placeholder blocks emitted by `Break`, grouped by the loop they
    /// target, waiting for that loop's fix-up pass.
    break_sites: FxHashMap<LoopId, Vec<BasicBlock<'ctx>>>,

    next_array_constant_id: u32,
}

impl<'ctx, 'h> EmitCtx<'ctx, 'h> {
    /// Creates the module, declares the runtime stubs, and opens `main`'s
    /// entry block with the builder positioned at its start. Top-level
    /// calls are emitted into `main` as they're parsed.
    pub fn program_preinit(context: &'ctx Context, module_name: &str, handler: &'h Handler) -> Self {
        let module = context.create_module(module_name);
        let layout =
            TargetData::create(DATA_LAYOUT);
        module.set_data_layout(&layout.get_data_layout());

        let mut ctx = Self {
            context,
            module,
            builder: context.create_builder(),
            layout,
            handler,
            env: Env::new(),
            decls: Vec::new(),
            ret_num: 0,
            current_ret_slot: None,
            depth: 0,
            next_loop_id: 0,
            break_sites: FxHashMap::default(),
            next_array_constant_id: 0,
        };
        ctx.declare_runtime();
        ctx.open_main();
        ctx
    }

    /// Declares `printf`/`scanf` and defines the `print`/`read` wrappers
    /// every emitted module carries (see the external-interfaces surface).
    fn declare_runtime(&mut self) {
        let i8_ptr = self.context.ptr_type(AddressSpace::default());
        let i32_ty = self.context.i32_type();
        let f64_ty = self.context.f64_type();

        let printf_ty = i32_ty.fn_type(&[i8_ptr.into()], true);
        self.module.add_function("printf", printf_ty, Some(Linkage::External));

        let scanf_ty = i32_ty.fn_type(&[i8_ptr.into()], true);
        self.module.add_function("scanf", scanf_ty, Some(Linkage::External));

        self.define_print_wrapper(f64_ty);
        self.define_read_wrapper(f64_ty);
    }

    fn define_print_wrapper(&mut self, f64_ty: inkwell::types::FloatType<'ctx>) {
        let print_ty = f64_ty.fn_type(&[f64_ty.into()], false);
        let print_fn = self.module.add_function("print", print_ty, None);
        let entry = self.context.append_basic_block(print_fn, "entry");
        self.builder.position_at_end(entry);

        let fmt = self
            .builder
            .build_global_string_ptr("%lf\n", "print_fmt")
            .expect("building a global string cannot fail");
        let arg = print_fn.get_nth_param(0).expect("print takes one argument").into_float_value();
        let printf = self.module.get_function("printf").expect("printf declared above");
        self.builder
            .build_call(printf, &[fmt.as_pointer_value().into(), arg.into()], "printf_call")
            .expect("building a call cannot fail");
        self.builder.build_return(Some(&arg)).expect("building a return cannot fail");
    }

    fn define_read_wrapper(&mut self, f64_ty: inkwell::types::FloatType<'ctx>) {
        let ptr_ty = self.context.ptr_type(AddressSpace::default());
        let read_ty = f64_ty.fn_type(&[ptr_ty.into()], false);
        let read_fn = self.module.add_function("read", read_ty, None);
        let entry = self.context.append_basic_block(read_fn, "entry");
        self.builder.position_at_end(entry);

        let fmt = self
            .builder
            .build_global_string_ptr("%lf", "read_fmt")
            .expect("building a global string cannot fail");
        let dest = read_fn.get_nth_param(0).expect("read takes one argument").into_pointer_value();
        let scanf = self.module.get_function("scanf").expect("scanf declared above");
        self.builder
            .build_call(scanf, &[fmt.as_pointer_value().into(), dest.into()], "scanf_call")
            .expect("building a call cannot fail");
        let value = self
            .builder
            .build_load(f64_ty, dest, "read_value")
            .expect("building a load cannot fail");
        self.builder.build_return(Some(&value)).expect("building a return cannot fail");
    }

    fn open_main(&mut self) {
        let main_ty = self.context.i32_type().fn_type(&[], false);
        let main_fn = self.module.add_function("main", main_ty, None);
        let entry = self.context.append_basic_block(main_fn, "entry");
        self.builder.position_at_end(entry);
    }

    /// Closes `main` with `ret i32 0`. The module is now ready for the
    /// external printer to serialize.
    pub fn program_postinit(&mut self) {
        let main_fn = self.module.get_function("main").expect("main opened in program_preinit");
        let last_block = main_fn.get_last_basic_block().expect("main always has a block");
        self.builder.position_at_end(last_block);
        let zero = self.context.i32_type().const_int(0, false);
        self.builder.build_return(Some(&zero)).expect("building a return cannot fail");
    }

    pub fn main_function(&self) -> FunctionValue<'ctx> {
        self.module.get_function("main").expect("main opened in program_preinit")
    }

    // -- declarations ----------------------------------------------------

    pub fn declare(&mut self, decl: Decl<'ctx>) -> DeclId {
        let id = DeclId(self.decls.len());
        self.decls.push(decl);
        id
    }

    pub fn decl(&self, id: DeclId) -> &Decl<'ctx> {
        &self.decls[id.0]
    }

    pub fn array_cap_of(&self, id: DeclId) -> Option<ArrayCap<'ctx>> {
        self.decl(id).array_cap
    }

    pub fn fresh_array_constant_name(&mut self) -> String {
        let id = self.next_array_constant_id;
        self.next_array_constant_id += 1;
        format!("array{id}")
    }

    // -- layout queries ----------------------------------------------------

    pub fn preferred_alignment(&self, ty: &dyn inkwell::types::AnyType<'ctx>) -> u32 {
        self.layout.get_preferred_alignment(ty)
    }

    pub fn bit_size(&self, ty: BasicTypeEnum<'ctx>) -> u64 {
        self.layout.get_bit_size(&ty)
    }

    // -- current-function state ------------------------------------------

    pub fn enter_function(&mut self, ret_slot: PointerValue<'ctx>) {
        self.current_ret_slot = Some(ret_slot);
    }

    pub fn leave_function(&mut self) {
        self.current_ret_slot = None;
    }

    pub fn ret_slot(&self) -> Option<PointerValue<'ctx>> {
        self.current_ret_slot
    }

    /// Counts `return` statements seen while *parsing* a function body, so
    /// `fun_def` can check for at least one before the body is ever
    /// compiled. Reset at the start of each function, independent of the
    /// emission-time `current_ret_slot` state.
    pub fn reset_return_count(&mut self) {
        self.ret_num = 0;
    }

    pub fn record_return(&mut self) {
        self.ret_num += 1;
    }

    pub fn returns_seen(&self) -> u32 {
        self.ret_num
    }

    // -- recursion depth ---------------------------------------------------

    /// Increments the recursion-depth counter, returning `false` (and
    /// reporting "reached recursion limits") when the caller should abort
    /// instead of descending further.
    #[must_use]
    pub fn enter_recursive(&mut self) -> bool {
        self.depth += 1;
        if self.depth > MAX_RECURSION_DEPTH {
            self.error("reached recursion limits", Span::DUMMY);
            false
        } else {
            true
        }
    }

    pub fn leave_recursive(&mut self) {
        self.depth -= 1;
    }

    // -- loops and break fix-up -------------------------------------------

    pub fn fresh_loop_id(&mut self) -> LoopId {
        let id = LoopId(self.next_loop_id);
        self.next_loop_id += 1;
        id
    }

    pub fn register_break_site(&mut self, loop_id: LoopId, placeholder: BasicBlock<'ctx>) {
        self.break_sites.entry(loop_id).or_default().push(placeholder);
    }

    /// Takes every placeholder block `Break` registered for `loop_id`, for
    /// the loop's fix-up pass to retarget.
    pub fn take_break_sites(&mut self, loop_id: LoopId) -> Vec<BasicBlock<'ctx>> {
        self.break_sites.remove(&loop_id).unwrap_or_default()
    }

    // -- errors --------------------------------------------------------------

    pub fn error(&self, message: impl Into<String>, span: Span) {
        self.handler.error(message.into(), span);
    }

    pub fn err_num(&self) -> usize {
        self.handler.error_count()
    }

    pub fn lookup(&self, name: Symbol) -> Option<DeclId> {
        self.env.get(name)
    }
}
