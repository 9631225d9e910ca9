//! Lowering the tree into IR.
//!
//! Every node gets the same capability: `compile(&mut EmitCtx) -> Output`.
//! For expressions that's an `Option<BasicValueEnum>` - absent exactly
//! when an error was already reported for this node or one of its
//! children, so callers propagate `None` without reporting twice. For
//! statements there is no value, only the side effect of emission.
//!
//! `Id`, `Array`, and `Access` all happen to produce a *pointer* as their
//! `BasicValueEnum`, which is what lets `Store`'s destination operand and
//! every value-producing operand share one return type - exactly the
//! "uniform compile capability" the tree is built around.

use inkwell::types::{ArrayType, BasicTypeEnum};
use inkwell::values::{BasicValueEnum, FloatValue};
use inkwell::FloatPredicate;

use loomc_util::Span;

use crate::ast::{ArithOp, ArrayCap, BoolOp, Expr, Stmt};
use crate::ctx::EmitCtx;

pub trait Compile<'ctx> {
    type Output;
    fn compile(&self, ctx: &mut EmitCtx<'ctx, '_>) -> Self::Output;
}

/// The array capability of an already-built expression, resolved through
/// the declaration arena for `Array`/`ArrayLoad` and read straight off the
/// node for `ArrayConstant`. Every other variant has none.
fn array_cap_of<'ctx>(expr: &Expr<'ctx>, ctx: &EmitCtx<'ctx, '_>) -> Option<ArrayCap<'ctx>> {
    match expr {
        Expr::Array(id) | Expr::ArrayLoad(id) => ctx.array_cap_of(*id),
        Expr::ArrayConstant { array_cap, .. } => Some(*array_cap),
        _ => None,
    }
}

/// Narrows a boolean-valued double (always exactly `0.0` or `1.0`) to the
/// `i1` a conditional branch needs.
fn branch_cond<'ctx>(ctx: &EmitCtx<'ctx, '_>, value: FloatValue<'ctx>) -> inkwell::values::IntValue<'ctx> {
    ctx.builder
        .build_float_to_unsigned_int(value, ctx.context.bool_type(), "brcond")
        .expect("building a cast cannot fail")
}

/// Widens an `i1` result of a comparison back into the language's one
/// boolean representation: a double holding `0.0` or `1.0`.
fn widen<'ctx>(ctx: &EmitCtx<'ctx, '_>, bit: inkwell::values::IntValue<'ctx>) -> FloatValue<'ctx> {
    ctx.builder
        .build_unsigned_int_to_float(bit, ctx.context.f64_type(), "widen")
        .expect("building a cast cannot fail")
}

/// Branches to `target` unless the current block already ends in a
/// terminator - which happens when the block just compiled a `Break`,
/// whose placeholder branch is itself a terminator. Without this guard,
/// loops and `if` bodies that end in `break` would try to append a second
/// terminator to the same block.
fn branch_if_open<'ctx>(ctx: &EmitCtx<'ctx, '_>, target: inkwell::basic_block::BasicBlock<'ctx>) {
    let current = ctx.builder.get_insert_block().expect("builder always has a block while emitting");
    if current.get_terminator().is_none() {
        ctx.builder.build_unconditional_branch(target).expect("building a branch cannot fail");
    }
}

fn array_nesting_depth(ty: ArrayType<'_>) -> usize {
    let mut depth = 1;
    let mut elem = ty.get_element_type();
    while let BasicTypeEnum::ArrayType(inner) = elem {
        depth += 1;
        elem = inner.get_element_type();
    }
    depth
}

impl<'ctx> Compile<'ctx> for Expr<'ctx> {
    type Output = Option<BasicValueEnum<'ctx>>;

    fn compile(&self, ctx: &mut EmitCtx<'ctx, '_>) -> Self::Output {
        match self {
            Expr::Id(id) | Expr::Array(id) | Expr::ArrayLoad(id) => {
                Some(ctx.decl(*id).ptr.into())
            }

            Expr::FConstant(value) => Some(ctx.context.f64_type().const_float(*value).into()),

            Expr::ArrayConstant { elements, array_cap, .. } => {
                let value = build_constant_aggregate(ctx, elements)?;
                let name = ctx.fresh_array_constant_name();
                let global = ctx.module.add_global(array_cap.array_ty, None, &name);
                global.set_initializer(&value);
                global.set_linkage(inkwell::module::Linkage::Private);
                global.set_constant(true);
                global.set_alignment(array_cap.align);
                Some(global.as_pointer_value().into())
            }

            Expr::Arith { op, lhs, rhs, span } => {
                if operand_is_array(lhs, rhs, ctx, *span) {
                    return None;
                }
                let l = lhs.compile(ctx)?.into_float_value();
                let r = rhs.compile(ctx)?.into_float_value();
                let result = match op {
                    ArithOp::Add => ctx.builder.build_float_add(l, r, "addtmp"),
                    ArithOp::Sub => ctx.builder.build_float_sub(l, r, "subtmp"),
                    ArithOp::Mul => ctx.builder.build_float_mul(l, r, "multmp"),
                    ArithOp::Div => ctx.builder.build_float_div(l, r, "divtmp"),
                }
                .expect("building a float op cannot fail");
                Some(result.into())
            }

            Expr::Neg { operand, span } => {
                if array_cap_of(operand, ctx).is_some() {
                    ctx.error("invalid operand type", *span);
                    return None;
                }
                let v = operand.compile(ctx)?.into_float_value();
                Some(ctx.builder.build_float_neg(v, "negtmp").expect("building a negation cannot fail").into())
            }

            Expr::Bool { op, lhs, rhs, span } => {
                if operand_is_array(lhs, rhs, ctx, *span) {
                    return None;
                }
                let l = lhs.compile(ctx)?.into_float_value();
                let r = rhs.compile(ctx)?.into_float_value();
                let bit = match op {
                    BoolOp::And => {
                        let lb = truthy(ctx, l);
                        let rb = truthy(ctx, r);
                        ctx.builder.build_and(lb, rb, "andtmp")
                    }
                    BoolOp::Or => {
                        let lb = truthy(ctx, l);
                        let rb = truthy(ctx, r);
                        ctx.builder.build_or(lb, rb, "ortmp")
                    }
                    BoolOp::Eq => ctx.builder.build_float_compare(FloatPredicate::OEQ, l, r, "eqtmp"),
                    BoolOp::Ne => ctx.builder.build_float_compare(FloatPredicate::ONE, l, r, "netmp"),
                    BoolOp::Le => ctx.builder.build_float_compare(FloatPredicate::OLE, l, r, "letmp"),
                    BoolOp::Ge => ctx.builder.build_float_compare(FloatPredicate::OGE, l, r, "getmp"),
                    BoolOp::Lt => ctx.builder.build_float_compare(FloatPredicate::OLT, l, r, "lttmp"),
                    BoolOp::Gt => ctx.builder.build_float_compare(FloatPredicate::OGT, l, r, "gttmp"),
                }
                .expect("building a comparison cannot fail");
                Some(widen(ctx, bit).into())
            }

            Expr::Not { operand, span } => {
                if array_cap_of(operand, ctx).is_some() {
                    ctx.error("invalid operand type", *span);
                    return None;
                }
                let v = operand.compile(ctx)?.into_float_value();
                let is_truthy = truthy(ctx, v);
                let all_ones = ctx.context.bool_type().const_all_ones();
                let negated =
                    ctx.builder.build_xor(is_truthy, all_ones, "nottmp").expect("building a xor cannot fail");
                Some(widen(ctx, negated).into())
            }

            Expr::Load { operand, .. } => {
                let ptr = operand.compile(ctx)?.into_pointer_value();
                let loaded = ctx
                    .builder
                    .build_load(ctx.context.f64_type(), ptr, "loadtmp")
                    .expect("building a load cannot fail");
                Some(loaded)
            }

            Expr::Access { base, indices, span } => {
                let decl = *ctx.decl(*base);
                let Some(cap) = decl.array_cap else {
                    ctx.error("trying to access non-array id", *span);
                    return None;
                };
                if indices.len() != array_nesting_depth(cap.array_ty) {
                    ctx.error("invalid index", *span);
                    return None;
                }
                let mut gep_indices = vec![ctx.context.i32_type().const_int(0, false)];
                for index in indices {
                    let v = index.compile(ctx)?.into_float_value();
                    let i = ctx
                        .builder
                        .build_float_to_unsigned_int(v, ctx.context.i32_type(), "idx")
                        .expect("building a cast cannot fail");
                    gep_indices.push(i);
                }
                let ptr = unsafe {
                    ctx.builder
                        .build_gep(cap.array_ty, decl.ptr, &gep_indices, "elem")
                        .expect("building a gep cannot fail")
                };
                Some(ptr.into())
            }

            Expr::Store { dest, value, span } => compile_store(ctx, dest, value, *span),

            Expr::Call { name, args, span } => compile_call(ctx, *name, args, *span),
        }
    }
}

/// `true` (and reports "invalid operand type") when either side of a
/// binary scalar operation carries array capability.
fn operand_is_array<'ctx>(
    lhs: &Expr<'ctx>,
    rhs: &Expr<'ctx>,
    ctx: &EmitCtx<'ctx, '_>,
    span: Span,
) -> bool {
    if array_cap_of(lhs, ctx).is_some() || array_cap_of(rhs, ctx).is_some() {
        ctx.error("invalid operand type", span);
        true
    } else {
        false
    }
}

fn truthy<'ctx>(ctx: &EmitCtx<'ctx, '_>, value: FloatValue<'ctx>) -> inkwell::values::IntValue<'ctx> {
    let zero = ctx.context.f64_type().const_float(0.0);
    ctx.builder
        .build_float_compare(FloatPredicate::UNE, value, zero, "truthy")
        .expect("building a comparison cannot fail")
}

fn build_constant_aggregate<'ctx>(
    ctx: &EmitCtx<'ctx, '_>,
    elements: &[Expr<'ctx>],
) -> Option<inkwell::values::ArrayValue<'ctx>> {
    if let Some(Expr::ArrayConstant { array_cap, .. }) = elements.first() {
        let elem_ty = array_cap.array_ty;
        let mut rows = Vec::with_capacity(elements.len());
        for element in elements {
            let Expr::ArrayConstant { elements: inner, .. } = element else {
                unreachable!("array-literal shape already validated during parsing");
            };
            rows.push(build_constant_aggregate(ctx, inner)?);
        }
        Some(elem_ty.const_array(&rows))
    } else {
        let mut values = Vec::with_capacity(elements.len());
        for element in elements {
            let Expr::FConstant(v) = element else {
                unreachable!("array-literal constantness already validated during parsing");
            };
            values.push(ctx.context.f64_type().const_float(*v));
        }
        Some(ctx.context.f64_type().const_array(&values))
    }
}

fn compile_store<'ctx>(
    ctx: &mut EmitCtx<'ctx, '_>,
    dest: &Expr<'ctx>,
    value: &Expr<'ctx>,
    span: Span,
) -> Option<BasicValueEnum<'ctx>> {
    let dest_cap = array_cap_of(dest, ctx);
    let value_cap = array_cap_of(value, ctx);

    match (dest_cap, value_cap) {
        (None, None) => {
            let dest_ptr = dest.compile(ctx)?.into_pointer_value();
            let v = value.compile(ctx)?.into_float_value();
            ctx.builder.build_store(dest_ptr, v).expect("building a store cannot fail");
            Some(v.into())
        }
        (Some(dc), Some(vc)) => {
            if dc.array_ty != vc.array_ty {
                ctx.error("incompatible array types", span);
                return None;
            }
            let dest_ptr = dest.compile(ctx)?.into_pointer_value();
            let src_ptr = value.compile(ctx)?.into_pointer_value();
            let size = ctx.context.i64_type().const_int(ctx.bit_size(dc.array_ty.into()) / 8, false);
            ctx.builder
                .build_memcpy(dest_ptr, dc.align, src_ptr, vc.align, size)
                .expect("building a memcpy cannot fail");
            Some(dest_ptr.into())
        }
        _ => {
            ctx.error("incompatible types", span);
            None
        }
    }
}

fn compile_call<'ctx>(
    ctx: &mut EmitCtx<'ctx, '_>,
    name: loomc_util::Symbol,
    args: &[Expr<'ctx>],
    span: Span,
) -> Option<BasicValueEnum<'ctx>> {
    let Some(function) = ctx.module.get_function(name.as_str()) else {
        ctx.error("unknown function referenced", span);
        return None;
    };

    let expected = function.count_params() as usize;
    if args.len() != expected {
        ctx.error(format!("wrong arguments number: expected {expected}, but {} provided", args.len()), span);
        return None;
    }

    let mut compiled = Vec::with_capacity(args.len());
    for arg in args {
        compiled.push(arg.compile(ctx)?.into());
    }

    let call = ctx.builder.build_call(function, &compiled, "calltmp").expect("building a call cannot fail");
    call.try_as_basic_value().left()
}

impl<'ctx> Compile<'ctx> for Stmt<'ctx> {
    type Output = ();

    fn compile(&self, ctx: &mut EmitCtx<'ctx, '_>) {
        match self {
            Stmt::ExprStmt(expr) => {
                if let Some(expr) = expr {
                    expr.compile(ctx);
                }
            }

            Stmt::StmtSeq(first, second) => {
                first.compile(ctx);
                second.compile(ctx);
            }

            Stmt::If { cond, then_body, .. } => {
                let Some(cond_val) = cond.compile(ctx) else { return };
                let function = current_function(ctx);
                let i1 = branch_cond(ctx, cond_val.into_float_value());

                let then_block = ctx.context.append_basic_block(function, "if.then");
                let end_block = ctx.context.append_basic_block(function, "if.end");
                ctx.builder.build_conditional_branch(i1, then_block, end_block).expect("building a branch cannot fail");

                ctx.builder.position_at_end(then_block);
                then_body.compile(ctx);
                branch_if_open(ctx, end_block);

                ctx.builder.position_at_end(end_block);
            }

            Stmt::IfElse { cond, then_body, else_body, .. } => {
                let Some(cond_val) = cond.compile(ctx) else { return };
                let function = current_function(ctx);
                let i1 = branch_cond(ctx, cond_val.into_float_value());

                let then_block = ctx.context.append_basic_block(function, "if.then");
                let else_block = ctx.context.append_basic_block(function, "if.else");
                let end_block = ctx.context.append_basic_block(function, "if.end");
                ctx.builder.build_conditional_branch(i1, then_block, else_block).expect("building a branch cannot fail");

                ctx.builder.position_at_end(then_block);
                then_body.compile(ctx);
                branch_if_open(ctx, end_block);

                ctx.builder.position_at_end(else_block);
                else_body.compile(ctx);
                branch_if_open(ctx, end_block);

                ctx.builder.position_at_end(end_block);
            }

            Stmt::While { id, cond, body, .. } => {
                let function = current_function(ctx);
                let entry_block = ctx.context.append_basic_block(function, "while.entry");
                branch_if_open(ctx, entry_block);
                ctx.builder.position_at_end(entry_block);

                let Some(cond_val) = cond.compile(ctx) else { return };
                let i1 = branch_cond(ctx, cond_val.into_float_value());
                let body_block = ctx.context.append_basic_block(function, "while.body");
                let exit_block = ctx.context.append_basic_block(function, "while.exit");
                ctx.builder.build_conditional_branch(i1, body_block, exit_block).expect("building a branch cannot fail");

                ctx.builder.position_at_end(body_block);
                body.compile(ctx);
                branch_if_open(ctx, entry_block);

                ctx.builder.position_at_end(exit_block);
                fix_up_breaks(ctx, *id, exit_block);
            }

            Stmt::RepeatUntil { id, body, cond, .. } => {
                let function = current_function(ctx);
                let entry_block = ctx.context.append_basic_block(function, "repeat.entry");
                branch_if_open(ctx, entry_block);
                ctx.builder.position_at_end(entry_block);

                body.compile(ctx);

                let exit_block = ctx.context.append_basic_block(function, "repeat.exit");
                if let Some(cond_val) = cond.compile(ctx) {
                    let i1 = branch_cond(ctx, cond_val.into_float_value());
                    ctx.builder
                        .build_conditional_branch(i1, entry_block, exit_block)
                        .expect("building a branch cannot fail");
                }

                ctx.builder.position_at_end(exit_block);
                fix_up_breaks(ctx, *id, exit_block);
            }

            Stmt::For { id, counter, init, downto, limit, body, .. } => {
                init.compile(ctx);

                let function = current_function(ctx);
                let entry_block = ctx.context.append_basic_block(function, "for.entry");
                branch_if_open(ctx, entry_block);
                ctx.builder.position_at_end(entry_block);

                let counter_ptr = ctx.decl(*counter).ptr;
                let f64_ty = ctx.context.f64_type();
                let Some(limit_val) = limit.compile(ctx) else { return };
                let current = ctx.builder.build_load(f64_ty, counter_ptr, "i").expect("building a load cannot fail");
                let predicate = if *downto { FloatPredicate::OGE } else { FloatPredicate::OLE };
                let i1 = ctx
                    .builder
                    .build_float_compare(predicate, current.into_float_value(), limit_val.into_float_value(), "forcond")
                    .expect("building a comparison cannot fail");

                let body_block = ctx.context.append_basic_block(function, "for.body");
                let inc_block = ctx.context.append_basic_block(function, "for.inc");
                let exit_block = ctx.context.append_basic_block(function, "for.exit");
                ctx.builder.build_conditional_branch(i1, body_block, exit_block).expect("building a branch cannot fail");

                ctx.builder.position_at_end(body_block);
                body.compile(ctx);
                branch_if_open(ctx, inc_block);

                ctx.builder.position_at_end(inc_block);
                let cur = ctx.builder.build_load(f64_ty, counter_ptr, "cur").expect("building a load cannot fail");
                let one = f64_ty.const_float(1.0);
                let next = if *downto {
                    ctx.builder.build_float_sub(cur.into_float_value(), one, "dec")
                } else {
                    ctx.builder.build_float_add(cur.into_float_value(), one, "inc")
                }
                .expect("building a float op cannot fail");
                ctx.builder.build_store(counter_ptr, next).expect("building a store cannot fail");
                ctx.builder.build_unconditional_branch(entry_block).expect("building a branch cannot fail");

                ctx.builder.position_at_end(exit_block);
                fix_up_breaks(ctx, *id, exit_block);
            }

            Stmt::Break { loop_id, .. } => {
                let Some(id) = loop_id else { return };
                let function = current_function(ctx);
                let placeholder = ctx.context.append_basic_block(function, "break.target");
                ctx.builder.build_unconditional_branch(placeholder).expect("building a branch cannot fail");
                ctx.register_break_site(*id, placeholder);

                let dead = ctx.context.append_basic_block(function, "break.dead");
                ctx.builder.position_at_end(dead);
            }

            Stmt::Return { value, .. } => {
                if let (Some(val), Some(slot)) = (value.compile(ctx), ctx.ret_slot()) {
                    ctx.builder.build_store(slot, val.into_float_value()).expect("building a store cannot fail");
                }
            }

            Stmt::FunStmt { function, ret_slot, body } => {
                let entry = function.get_first_basic_block().expect("FunStmt opens its entry block at construction");
                ctx.builder.position_at_end(entry);
                ctx.enter_function(*ret_slot);

                body.compile(ctx);

                let still_open = ctx.builder.get_insert_block().map(|b| b.get_terminator().is_none()).unwrap_or(false);
                if still_open {
                    let f64_ty = ctx.context.f64_type();
                    let ret_val = ctx.builder.build_load(f64_ty, *ret_slot, "retval").expect("building a load cannot fail");
                    ctx.builder.build_return(Some(&ret_val)).expect("building a return cannot fail");
                }
                ctx.leave_function();
            }
        }
    }
}

fn current_function<'ctx>(ctx: &EmitCtx<'ctx, '_>) -> inkwell::values::FunctionValue<'ctx> {
    ctx.builder
        .get_insert_block()
        .expect("builder always has a block while emitting")
        .get_parent()
        .expect("every block belongs to a function")
}

/// The fix-up pass: every placeholder block a `Break` created while this
/// loop's body was being compiled now just jumps straight to the real
/// exit block.
fn fix_up_breaks<'ctx>(ctx: &mut EmitCtx<'ctx, '_>, id: crate::ast::LoopId, exit_block: inkwell::basic_block::BasicBlock<'ctx>) {
    for placeholder in ctx.take_break_sites(id) {
        ctx.builder.position_at_end(placeholder);
        branch_if_open(ctx, exit_block);
    }
    ctx.builder.position_at_end(exit_block);
}
