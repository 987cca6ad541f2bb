//! Block expression trees.
//!
//! Scripts are immutable trees shared through [`Expr`]. The engine reads them
//! and, when it reifies a script, works on a deep copy whose empty slots are
//! labelled with implicit-parameter ids.

use std::fmt;
use std::sync::Arc;

use blockflow_foundation::Value;

use crate::definition::CustomBlockDefinition;
use crate::primitive::Primitive;

/// Shared handle to an expression.
pub type Expr = Arc<Expression>;

/// One node of a block script.
#[derive(Clone, Debug, PartialEq)]
pub enum Expression {
    /// A command script: blocks run one after another.
    Sequence(Vec<Expr>),
    /// A variadic input group; evaluates to a list.
    MultiArg(Vec<Expr>),
    /// An input slot.
    BoundInput(Slot),
    /// A block invocation.
    BlockCall(BlockCall),
    /// An internal pseudo-op.
    Selector(PseudoOp),
}

/// An input slot of a block.
#[derive(Clone, Debug, PartialEq)]
pub struct Slot {
    /// Implicit-parameter id assigned when the enclosing script is reified.
    pub binding_id: Option<u32>,
    /// What the slot holds.
    pub contents: SlotContents,
}

/// Contents of an input slot.
#[derive(Clone, Debug, PartialEq)]
pub enum SlotContents {
    /// Nothing typed or dropped in.
    Empty,
    /// A typed-in constant.
    Literal(Value),
    /// A C-slot of a control block; evaluates to a closure without copying.
    Body(Option<Expr>),
    /// A command ring slot; its script is reified when evaluated.
    Script(Option<Expr>),
    /// A reporter ring slot; its block is reified when evaluated.
    Reporter(Option<Expr>),
}

/// A block invocation: who implements it, and its argument expressions.
#[derive(Clone, Debug, PartialEq)]
pub struct BlockCall {
    /// Implementation of the block.
    pub callee: Callee,
    /// Argument expressions, one per input slot.
    pub args: Vec<Expr>,
}

/// Where a block's behaviour lives.
#[derive(Clone)]
pub enum Callee {
    /// Implemented by the engine.
    Primitive(Primitive),
    /// Implemented by the receiver, looked up by selector.
    Receiver(Arc<str>),
    /// A user-defined block.
    Custom(Arc<CustomBlockDefinition>),
    /// A variable getter.
    Variable(Arc<str>),
}

/// Internal markers the engine pushes as contexts of their own.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PseudoOp {
    /// Suspend the process unless it is warping.
    Yield,
    /// Leave warp mode.
    StopWarping,
    /// Forward a reporter invocation's result (nothing, if none arrived).
    ReportNothing,
    /// Stop the process.
    Stop,
}

impl Callee {
    /// Selector or label used in traces and error markers.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Primitive(p) => p.selector(),
            Self::Receiver(name) | Self::Variable(name) => name,
            Self::Custom(def) => &def.spec,
        }
    }
}

impl PartialEq for Callee {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Primitive(a), Self::Primitive(b)) => a == b,
            (Self::Receiver(a), Self::Receiver(b)) | (Self::Variable(a), Self::Variable(b)) => {
                a == b
            }
            (Self::Custom(a), Self::Custom(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for Callee {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Primitive(p) => write!(f, "Primitive({p})"),
            Self::Receiver(name) => write!(f, "Receiver({name})"),
            Self::Custom(def) => write!(f, "Custom({:?})", def.spec),
            Self::Variable(name) => write!(f, "Variable({name})"),
        }
    }
}

impl Slot {
    /// An unlabelled slot.
    #[must_use]
    pub const fn new(contents: SlotContents) -> Self {
        Self {
            binding_id: None,
            contents,
        }
    }

    /// True for an empty, unlabelled slot (a candidate implicit parameter).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.binding_id.is_none() && matches!(self.contents, SlotContents::Empty)
    }
}

impl Expression {
    /// True for command scripts.
    #[must_use]
    pub const fn is_sequence(&self) -> bool {
        matches!(self, Self::Sequence(_))
    }

    /// True for expressions that report into a parent (blocks, slots, groups).
    #[must_use]
    pub const fn is_reporter_shaped(&self) -> bool {
        !matches!(self, Self::Sequence(_) | Self::Selector(_))
    }

    /// Short label used for error markers and traces.
    #[must_use]
    pub fn label(&self) -> String {
        match self {
            Self::Sequence(items) => format!("script ({} blocks)", items.len()),
            Self::MultiArg(_) => "input list".to_string(),
            Self::BoundInput(_) => "input".to_string(),
            Self::BlockCall(call) => call.callee.name().to_string(),
            Self::Selector(op) => format!("{op:?}"),
        }
    }

    /// Number of empty slots a reification of this expression would label.
    #[must_use]
    pub fn empty_slot_count(&self) -> u32 {
        match self {
            Self::Sequence(items) | Self::MultiArg(items) => {
                items.iter().map(|e| e.empty_slot_count()).sum()
            }
            Self::BoundInput(slot) if slot.is_empty() => 1,
            Self::BoundInput(Slot {
                contents: SlotContents::Body(Some(body)),
                ..
            }) => body.empty_slot_count(),
            Self::BlockCall(call)
                if call.callee == Callee::Primitive(Primitive::ReportScript) =>
            {
                0
            }
            Self::BlockCall(call) => call.args.iter().map(|e| e.empty_slot_count()).sum(),
            Self::BoundInput(_) | Self::Selector(_) => 0,
        }
    }

    /// Copies the whole tree, sharing nothing with the original.
    #[must_use]
    pub fn deep_copy(&self) -> Expression {
        match self {
            Self::Sequence(items) => Self::Sequence(copy_all(items)),
            Self::MultiArg(items) => Self::MultiArg(copy_all(items)),
            Self::BoundInput(slot) => Self::BoundInput(Slot {
                binding_id: slot.binding_id,
                contents: match &slot.contents {
                    SlotContents::Empty => SlotContents::Empty,
                    SlotContents::Literal(v) => SlotContents::Literal(v.clone()),
                    SlotContents::Body(e) => SlotContents::Body(copy_opt(e.as_ref())),
                    SlotContents::Script(e) => SlotContents::Script(copy_opt(e.as_ref())),
                    SlotContents::Reporter(e) => SlotContents::Reporter(copy_opt(e.as_ref())),
                },
            }),
            Self::BlockCall(call) => Self::BlockCall(BlockCall {
                callee: call.callee.clone(),
                args: copy_all(&call.args),
            }),
            Self::Selector(op) => Self::Selector(*op),
        }
    }

    /// Deep-copies the tree and labels its empty slots `1..=n` in reading
    /// order. Rings nested inside keep their own empty slots.
    ///
    /// Returns the copy and `n`.
    #[must_use]
    pub fn labelled_copy(&self) -> (Expression, u32) {
        let mut count = 0;
        let copy = relabel(self, &mut count);
        (copy, count)
    }

    /// For a continuation captured while this expression was evaluating its
    /// input at `position`: a copy whose input there reads implicit
    /// parameter 1. `None` if the expression has no such input.
    #[must_use]
    pub fn with_input_bound(&self, position: usize) -> Option<Expression> {
        let bound = Arc::new(Self::BoundInput(Slot {
            binding_id: Some(1),
            contents: SlotContents::Empty,
        }));
        match self {
            Self::BlockCall(call) if position < call.args.len() => {
                let mut args = call.args.clone();
                args[position] = bound;
                Some(Self::BlockCall(BlockCall {
                    callee: call.callee.clone(),
                    args,
                }))
            }
            Self::MultiArg(items) if position < items.len() => {
                let mut items = items.clone();
                items[position] = bound;
                Some(Self::MultiArg(items))
            }
            _ => None,
        }
    }
}

fn copy_all(items: &[Expr]) -> Vec<Expr> {
    items.iter().map(|e| Arc::new(e.deep_copy())).collect()
}

fn copy_opt(expr: Option<&Expr>) -> Option<Expr> {
    expr.map(|e| Arc::new(e.deep_copy()))
}

fn relabel_all(items: &[Expr], count: &mut u32) -> Vec<Expr> {
    items.iter().map(|e| Arc::new(relabel(e, count))).collect()
}

fn relabel(expr: &Expression, count: &mut u32) -> Expression {
    match expr {
        Expression::Sequence(items) => Expression::Sequence(relabel_all(items, count)),
        Expression::MultiArg(items) => Expression::MultiArg(relabel_all(items, count)),
        Expression::BoundInput(slot) if slot.is_empty() => {
            *count += 1;
            Expression::BoundInput(Slot {
                binding_id: Some(*count),
                contents: SlotContents::Empty,
            })
        }
        Expression::BoundInput(Slot {
            binding_id,
            contents: SlotContents::Body(Some(body)),
        }) => Expression::BoundInput(Slot {
            binding_id: *binding_id,
            contents: SlotContents::Body(Some(Arc::new(relabel(body, count)))),
        }),
        Expression::BlockCall(call)
            if call.callee == Callee::Primitive(Primitive::ReportScript) =>
        {
            expr.deep_copy()
        }
        Expression::BlockCall(call) => Expression::BlockCall(BlockCall {
            callee: call.callee.clone(),
            args: relabel_all(&call.args, count),
        }),
        other => other.deep_copy(),
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sequence(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, "; ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Self::MultiArg(items) => {
                write!(f, "<")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, ">")
            }
            Self::BoundInput(slot) => {
                if let Some(id) = slot.binding_id {
                    return write!(f, "#{id}");
                }
                match &slot.contents {
                    SlotContents::Empty => write!(f, "_"),
                    SlotContents::Literal(Value::String(s)) => write!(f, "{s:?}"),
                    SlotContents::Literal(v) => write!(f, "{v}"),
                    SlotContents::Body(Some(e))
                    | SlotContents::Script(Some(e))
                    | SlotContents::Reporter(Some(e)) => write!(f, "{e}"),
                    SlotContents::Body(None)
                    | SlotContents::Script(None)
                    | SlotContents::Reporter(None) => write!(f, "[]"),
                }
            }
            Self::BlockCall(call) => {
                write!(f, "{}(", call.callee.name())?;
                for (i, arg) in call.args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                write!(f, ")")
            }
            Self::Selector(op) => write!(f, "{op:?}"),
        }
    }
}
