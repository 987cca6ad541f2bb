//! Evaluation contexts and continuation copies.

use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

use blockflow_foundation::{ContextId, FrameId, Result, Value};
use blockflow_language::{Expr, Expression, PseudoOp, builder};

use crate::frame::UpvarReference;
use crate::heap::Heap;
use crate::host::ReceiverRef;
use crate::process::ProcessHandle;

/// One activation in a process's evaluation chain.
///
/// A context is also what a closure is: a reified script keeps the context
/// that describes its code and lexical environment.
#[derive(Clone)]
pub struct Context {
    /// Dynamic parent; receives this context's reported value.
    pub parent: Option<ContextId>,
    /// Lexically enclosing context (where the closure was created).
    pub outer: Option<ContextId>,
    /// What is being evaluated; `None` pops immediately.
    pub expression: Option<Expr>,
    /// Who runs it.
    pub receiver: Option<ReceiverRef>,
    /// Variables visible here.
    pub variables: FrameId,
    /// Upvar aliases in scope.
    pub upvars: Option<Rc<UpvarReference>>,
    /// Values reported by children so far.
    pub inputs: Vec<Value>,
    /// Next element of a sequence.
    pub pc: usize,
    /// When a timed primitive started.
    pub start_time: Option<u64>,
    /// Where a glide started.
    pub start_value: Option<(f64, f64)>,
    /// Formal parameter names of a closure.
    pub parameters: Vec<Arc<str>>,
    /// Implicit parameters of a closure.
    pub empty_slots: u32,
    /// Boundary that `report` unwinds to.
    pub is_lambda: bool,
    /// Boundary of a custom block invocation.
    pub is_custom_block: bool,
    /// Somewhere inside a custom block invocation.
    pub is_inside_custom_block: bool,
    /// A captured continuation.
    pub is_continuation: bool,
    /// Processes a `broadcast and wait` is waiting for.
    pub active_sends: Option<Vec<ProcessHandle>>,
}

impl Context {
    /// A blank context over `variables`.
    #[must_use]
    pub fn new(variables: FrameId) -> Self {
        Self {
            parent: None,
            outer: None,
            expression: None,
            receiver: None,
            variables,
            upvars: None,
            inputs: Vec::new(),
            pc: 0,
            start_time: None,
            start_value: None,
            parameters: Vec::new(),
            empty_slots: 0,
            is_lambda: false,
            is_custom_block: false,
            is_inside_custom_block: false,
            is_continuation: false,
            active_sends: None,
        }
    }

    /// A pseudo-op context sharing this context's scope.
    #[must_use]
    pub fn pseudo(&self, op: PseudoOp, parent: Option<ContextId>) -> Self {
        Self {
            parent,
            expression: Some(builder::pseudo(op)),
            outer: self.outer,
            receiver: self.receiver.clone(),
            upvars: self.upvars.clone(),
            is_inside_custom_block: self.is_inside_custom_block,
            ..Self::new(self.variables)
        }
    }

    /// The lexical scope of this context.
    #[must_use]
    pub fn scope(&self) -> Scope {
        Scope {
            outer: self.outer,
            variables: self.variables,
            receiver: self.receiver.clone(),
        }
    }

    /// Flags a context replacing this one in its chain must carry.
    #[must_use]
    pub fn tail_position(&self) -> TailPosition {
        TailPosition {
            upvars: self.upvars.clone(),
            is_lambda: self.is_lambda,
            is_custom_block: self.is_custom_block,
            is_inside_custom_block: self.is_inside_custom_block,
        }
    }

    /// The expression, if it is a pseudo-op.
    #[must_use]
    pub fn pseudo_op(&self) -> Option<PseudoOp> {
        match self.expression.as_deref() {
            Some(Expression::Selector(op)) => Some(*op),
            _ => None,
        }
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("expression", &self.expression.as_ref().map(|e| e.label()))
            .field("parent", &self.parent)
            .field("outer", &self.outer)
            .field("variables", &self.variables)
            .field("inputs", &self.inputs)
            .field("pc", &self.pc)
            .field("is_lambda", &self.is_lambda)
            .field("is_custom_block", &self.is_custom_block)
            .field("is_continuation", &self.is_continuation)
            .finish_non_exhaustive()
    }
}

/// Lexical environment of a context or closure.
#[derive(Clone)]
pub struct Scope {
    /// Enclosing context.
    pub outer: Option<ContextId>,
    /// Variables.
    pub variables: FrameId,
    /// Who runs code in this scope.
    pub receiver: Option<ReceiverRef>,
}

/// What a replacement context inherits from the one it replaces.
#[derive(Clone, Debug, Default)]
pub struct TailPosition {
    upvars: Option<Rc<UpvarReference>>,
    is_lambda: bool,
    is_custom_block: bool,
    is_inside_custom_block: bool,
}

impl TailPosition {
    /// A context in this position.
    #[must_use]
    pub fn context(&self, parent: Option<ContextId>, expression: Expr, scope: Scope) -> Context {
        Context {
            parent,
            expression: Some(expression),
            outer: scope.outer,
            receiver: scope.receiver,
            upvars: self.upvars.clone(),
            is_lambda: self.is_lambda,
            is_custom_block: self.is_custom_block,
            is_inside_custom_block: self.is_inside_custom_block,
            ..Context::new(scope.variables)
        }
    }
}

impl Heap {
    /// Captures the rest of the computation as seen from `from`.
    ///
    /// A context running a command script continues with itself; anything
    /// else continues with its parent. A chain with nowhere to go yields a
    /// continuation that stops the process.
    ///
    /// # Errors
    ///
    /// Fails only on stale ids.
    pub fn continuation(&mut self, from: ContextId) -> Result<ContextId> {
        let context = self.context(from)?;
        let source = if context.expression.as_deref().is_some_and(Expression::is_sequence) {
            Some(from)
        } else {
            context.parent
        };
        let (receiver, variables) = (context.receiver.clone(), context.variables);
        let head = match source {
            Some(id) => self.copy_for_continuation(id)?,
            None => {
                let stop = Context {
                    expression: Some(builder::pseudo(PseudoOp::Stop)),
                    receiver,
                    ..Context::new(variables)
                };
                self.alloc_context(stop)
            }
        };
        self.context_mut(head)?.is_continuation = true;
        Ok(head)
    }

    /// Copies every level of the chain starting at `id`.
    ///
    /// If the head is evaluating a reporter, its pending input becomes
    /// implicit parameter 1. Inputs already evaluated at every level are kept,
    /// so each level resumes at the argument it was waiting for.
    ///
    /// # Errors
    ///
    /// Fails only on stale ids.
    pub fn copy_for_continuation(&mut self, id: ContextId) -> Result<ContextId> {
        let mut head = self.context(id)?.clone();
        let is_reporter = head
            .expression
            .as_deref()
            .is_some_and(Expression::is_reporter_shaped);
        if is_reporter {
            let position = head.inputs.len();
            if let Some(bound) = head
                .expression
                .as_deref()
                .and_then(|e| e.with_input_bound(position))
            {
                head.expression = Some(Arc::new(bound));
                head.empty_slots = 1;
            }
        }
        self.copy_chain(head)
    }

    /// Copies a continuation again before resuming it, so the captured
    /// original stays reusable.
    ///
    /// # Errors
    ///
    /// Fails only on stale ids.
    pub fn copy_for_continuation_call(&mut self, id: ContextId) -> Result<ContextId> {
        let mut head = self.context(id)?.clone();
        head.is_continuation = false;
        self.copy_chain(head)
    }

    fn copy_chain(&mut self, head: Context) -> Result<ContextId> {
        let mut next = head.parent;
        let head_id = self.alloc_context(head);
        let mut previous = head_id;
        while let Some(level) = next {
            let copy = self.context(level)?.clone();
            next = copy.parent;
            let copy_id = self.alloc_context(copy);
            self.context_mut(previous)?.parent = Some(copy_id);
            previous = copy_id;
        }
        Ok(head_id)
    }
}
