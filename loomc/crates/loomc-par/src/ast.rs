//! The expression/statement tree.
//!
//! Every node carries exactly the data its `compile` needs (see
//! [`crate::compile`]) and nothing else - there is no separate "resolved"
//! representation. Declarations (`Id`/`Array` slots) do not live inline in
//! the tree; they live in [`crate::ctx::EmitCtx`]'s declaration arena and
//! are referenced by [`DeclId`], which is `Copy` and cheap to share between
//! the scope that declared a name and every expression that reads it.

use inkwell::types::ArrayType;
use inkwell::values::{FunctionValue, PointerValue};
use loomc_util::{Span, Symbol};

/// Index into [`crate::ctx::EmitCtx::decls`]. Stable for the lifetime of a
/// single compilation.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub struct DeclId(pub usize);

/// Identifies one loop statement so a `Break` parsed inside it can find the
/// right set of exit branches to register itself into, without holding a
/// direct reference to the loop's (not-yet-built) exit block.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub struct LoopId(pub u32);

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum BoolOp {
    And,
    Or,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

/// The `(type, alignment)` query shared by every array-shaped node.
/// Re-architected from a secondary interface into a plain field: a node
/// either carries one of these or it doesn't, and `Expr::array_cap`
/// answers the question without any dynamic casting.
#[derive(Clone, Copy, Debug)]
pub struct ArrayCap<'ctx> {
    pub array_ty: ArrayType<'ctx>,
    pub align: u32,
}

/// A declared name: either a scalar stack slot or an array stack slot.
/// Lives in [`crate::ctx::EmitCtx::decls`]; scopes and `Expr` nodes refer
/// to it by [`DeclId`] rather than embedding it, so one declaration can be
/// shared by every expression that reads or writes it.
#[derive(Clone, Copy, Debug)]
pub struct Decl<'ctx> {
    pub name: Symbol,
    pub ptr: PointerValue<'ctx>,
    pub array_cap: Option<ArrayCap<'ctx>>,
}

impl<'ctx> Decl<'ctx> {
    pub fn is_array(&self) -> bool {
        self.array_cap.is_some()
    }
}

/// Expression nodes. Every variant's `compile` (in [`crate::compile`])
/// returns an `Option<BasicValueEnum>` - for `Id`/`Array`/`Access` that
/// value happens to be a pointer, which lets `Store`'s destination operand
/// and every value-producing operand share the same return type.
#[derive(Clone, Debug)]
pub enum Expr<'ctx> {
    /// Reference to a declared scalar slot, as a place (not yet loaded).
    Id(DeclId),
    /// Reference to a declared array slot, as a place (not yet loaded).
    Array(DeclId),
    FConstant(f64),
    /// A constant aggregate literal. Materialized as a fresh private global
    /// on `compile`; `array_cap` is known before compilation because every
    /// element's shape is checked during construction.
    ArrayConstant { elements: Vec<Expr<'ctx>>, array_cap: ArrayCap<'ctx>, span: Span },
    Arith { op: ArithOp, lhs: Box<Expr<'ctx>>, rhs: Box<Expr<'ctx>>, span: Span },
    /// Unary negation.
    Neg { operand: Box<Expr<'ctx>>, span: Span },
    Bool { op: BoolOp, lhs: Box<Expr<'ctx>>, rhs: Box<Expr<'ctx>>, span: Span },
    Not { operand: Box<Expr<'ctx>>, span: Span },
    /// Scalar fetch through a pointer-producing operand.
    Load { operand: Box<Expr<'ctx>>, span: Span },
    /// Whole-array reference: carries array capability through the tree
    /// without emitting a load, since whole-array reads are blit copies.
    ArrayLoad(DeclId),
    /// Pointer into an array via an index list (a `getelementptr`).
    Access { base: DeclId, indices: Vec<Expr<'ctx>>, span: Span },
    /// Write to a scalar slot, or blit an array, depending on whether
    /// either side carries array capability.
    Store { dest: Box<Expr<'ctx>>, value: Box<Expr<'ctx>>, span: Span },
    Call { name: Symbol, args: Vec<Expr<'ctx>>, span: Span },
}

impl<'ctx> Expr<'ctx> {
    pub fn span(&self) -> Span {
        match self {
            Expr::Id(_) | Expr::Array(_) | Expr::ArrayLoad(_) => Span::DUMMY,
            Expr::FConstant(_) => Span::DUMMY,
            Expr::ArrayConstant { span, .. }
            | Expr::Arith { span, .. }
            | Expr::Neg { span, .. }
            | Expr::Bool { span, .. }
            | Expr::Not { span, .. }
            | Expr::Load { span, .. }
            | Expr::Access { span, .. }
            | Expr::Store { span, .. }
            | Expr::Call { span, .. } => *span,
        }
    }
}

/// Statement nodes. Always compile to no value; the only observable effect
/// is emission into the current function.
#[derive(Clone, Debug)]
pub enum Stmt<'ctx> {
    ExprStmt(Option<Expr<'ctx>>),
    StmtSeq(Box<Stmt<'ctx>>, Box<Stmt<'ctx>>),
    If { cond: Expr<'ctx>, then_body: Box<Stmt<'ctx>>, span: Span },
    IfElse { cond: Expr<'ctx>, then_body: Box<Stmt<'ctx>>, else_body: Box<Stmt<'ctx>>, span: Span },
    While { id: LoopId, cond: Expr<'ctx>, body: Box<Stmt<'ctx>>, span: Span },
    RepeatUntil { id: LoopId, body: Box<Stmt<'ctx>>, cond: Expr<'ctx>, span: Span },
    For {
        id: LoopId,
        counter: DeclId,
        /// The `decls` statement that allocates and stores the counter's
        /// initial value - compiled once, before the loop header.
        init: Box<Stmt<'ctx>>,
        downto: bool,
        limit: Expr<'ctx>,
        body: Box<Stmt<'ctx>>,
        span: Span,
    },
    /// `loop_id` is `None` when the break had no enclosing loop at
    /// construction time; the parser has already reported "unenclosed
    /// break" in that case and `compile` is a silent no-op.
    Break { loop_id: Option<LoopId>, span: Span },
    Return { value: Expr<'ctx>, span: Span },
    FunStmt { function: FunctionValue<'ctx>, ret_slot: PointerValue<'ctx>, body: Box<Stmt<'ctx>> },
}
