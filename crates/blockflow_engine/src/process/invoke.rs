//! Closures, custom blocks, `launch`, and first-class continuations.

use std::rc::Rc;
use std::sync::Arc;

use blockflow_debug::TraceEvent;
use blockflow_foundation::{ContextId, Error, FrameId, Result, Type, Value};
use blockflow_language::{CustomBlockDefinition, Expr, ParamKind, PseudoOp};

use super::{Env, Flow, Position, Process};
use crate::context::{Context, Scope};
use crate::frame::{UpvarReference, VariableFrame};
use crate::heap::Heap;

impl Process {
    /// The script and scope of a closure value; `None` for nothing.
    pub(super) fn script_of(&self, heap: &Heap, value: &Value) -> Result<Option<(Expr, Scope)>> {
        match value {
            Value::Nil => Ok(None),
            Value::Closure(id) => {
                let closure = heap.context(*id)?;
                Ok(closure
                    .expression
                    .clone()
                    .map(|expression| (expression, closure.scope())))
            }
            other => Err(Error::type_mismatch(Type::Closure, other.value_type())),
        }
    }

    /// A closure over a C-slot script. The script is shared, not copied.
    pub(super) fn reify_body(&mut self, heap: &mut Heap, script: Option<Expr>) -> Result<Value> {
        let current = heap.context(self.current_id()?)?;
        let closure = Context {
            expression: script,
            ..closure_in(current.scope())
        };
        Ok(Value::Closure(heap.alloc_context(closure)))
    }

    /// A closure over a deep copy of `expression`.
    ///
    /// Without formal parameters, the copy's empty slots become implicit
    /// parameters numbered in reading order.
    pub(super) fn reify(
        &mut self,
        heap: &mut Heap,
        expression: Option<&Expr>,
        parameters: Vec<Arc<str>>,
    ) -> Result<Value> {
        let current = heap.context(self.current_id()?)?;
        let (expression, empty_slots) = match expression {
            Some(expr) if parameters.is_empty() => {
                let (copy, count) = expr.labelled_copy();
                (Some(Arc::new(copy)), count)
            }
            Some(expr) => (Some(Arc::new(expr.deep_copy())), 0),
            None => (None, 0),
        };
        let closure = Context {
            expression,
            parameters,
            empty_slots,
            ..closure_in(current.scope())
        };
        Ok(Value::Closure(heap.alloc_context(closure)))
    }

    /// `run`/`call`: evaluates a closure with arguments.
    ///
    /// In command position the closure takes over the caller's place in the
    /// chain. In reporter position it runs behind a yield and a relay that
    /// forwards its result.
    pub(super) fn invoke_closure(
        &mut self,
        env: &mut Env<'_>,
        closure: &Value,
        args: Vec<Value>,
        position: Position,
    ) -> Result<Flow> {
        let id = match closure {
            Value::Closure(id) => *id,
            Value::Nil => {
                return Ok(match position {
                    Position::Command => Flow::Pop,
                    Position::Reporter => Flow::Report(Value::Nil),
                });
            }
            other => return Err(Error::type_mismatch(Type::Closure, other.value_type())),
        };
        if env.heap.context(id)?.is_continuation {
            return self.run_continuation(env, id, &args);
        }
        let caller = self.current_id()?;
        let (parent, inside_custom_block) = {
            let current = env.heap.context(caller)?;
            (current.parent, current.is_inside_custom_block)
        };
        let runnable = Context {
            parent,
            is_inside_custom_block: inside_custom_block,
            ..prepare_runnable(env.heap, id, args)?
        };
        match position {
            Position::Command => {
                let runnable = env.heap.alloc_context(runnable);
                env.heap.context_mut(caller)?.parent = Some(runnable);
            }
            Position::Reporter => splice_reporter(env.heap, caller, runnable)?,
        }
        Ok(Flow::Pop)
    }

    /// Runs a custom block's definition with the evaluated inputs.
    pub(super) fn evaluate_custom_block(
        &mut self,
        heap: &mut Heap,
        definition: &Arc<CustomBlockDefinition>,
        args: Vec<Value>,
        position: Position,
    ) -> Result<Flow> {
        let caller = self.current_id()?;
        let (parent, receiver, caller_frame, caller_upvars) = {
            let current = heap.context(caller)?;
            (
                current.parent,
                current.receiver.clone(),
                current.variables,
                current.upvars.clone(),
            )
        };
        let receiver_frame = receiver.as_ref().and_then(|r| r.borrow().variables());
        let frame = heap.alloc_frame(VariableFrame::new(receiver_frame));
        let outer = heap.alloc_context(Context {
            receiver: receiver.clone(),
            ..Context::new(frame)
        });

        let mut upvars = UpvarReference::new(caller_upvars.clone());
        let mut args = args.into_iter();
        for parameter in &definition.parameters {
            let value = args.next().unwrap_or_default();
            match parameter.kind {
                ParamKind::Normal => heap.frame_mut(frame)?.add_var(parameter.name.clone(), value),
                ParamKind::Upvar => {
                    let target = heap.resolve_or_declare(caller, &value.to_string(), caller_frame)?;
                    upvars.add_reference(parameter.name.clone(), target);
                }
            }
        }
        let upvars = if upvars.is_empty() {
            caller_upvars
        } else {
            Some(Rc::new(upvars))
        };

        let runnable = Context {
            parent,
            outer: Some(outer),
            expression: definition.body().cloned(),
            receiver,
            upvars,
            is_custom_block: true,
            is_inside_custom_block: true,
            ..Context::new(frame)
        };
        match position {
            Position::Command => {
                let runnable_id = heap.alloc_context(runnable);
                let guard = heap
                    .context(runnable_id)?
                    .pseudo(PseudoOp::Yield, Some(runnable_id));
                let guard = heap.alloc_context(guard);
                heap.context_mut(caller)?.parent = Some(guard);
            }
            Position::Reporter => splice_reporter(heap, caller, runnable)?,
        }
        Ok(Flow::Pop)
    }

    /// `launch`: runs a closure in a new process.
    pub(super) fn fork(
        &mut self,
        env: &mut Env<'_>,
        closure: &Value,
        args: Vec<Value>,
    ) -> Result<Flow> {
        let id = match closure {
            Value::Closure(id) => *id,
            Value::Nil => return Ok(Flow::Pop),
            other => return Err(Error::type_mismatch(Type::Closure, other.value_type())),
        };
        if env.heap.context(id)?.is_continuation {
            return Err(Error::continuation_fork());
        }
        let runnable = prepare_runnable(env.heap, id, args)?;
        let home = runnable.outer.ok_or_else(|| Error::internal("runnable without scope"))?;
        let receiver = runnable.receiver.clone().or_else(|| self.receiver.clone());
        let runnable = env.heap.alloc_context(runnable);
        let start = env
            .heap
            .context(runnable)?
            .pseudo(PseudoOp::Yield, Some(runnable));
        let start = env.heap.alloc_context(start);

        let child = env.next_id();
        env.launched
            .push(Process::assemble(child, None, receiver, home, start));
        env.tracer.record(TraceEvent::Forked {
            parent: self.id,
            child,
        });
        Ok(Flow::Pop)
    }

    /// `run/call w/continuation`: calls a closure with the rest of this
    /// computation as its argument.
    pub(super) fn call_with_continuation(
        &mut self,
        env: &mut Env<'_>,
        closure: &Value,
        position: Position,
    ) -> Result<Flow> {
        let continuation = env.heap.continuation(self.current_id()?)?;
        self.invoke_closure(env, closure, vec![Value::Closure(continuation)], position)
    }

    /// Abandons the current chain for a copy of the captured one.
    fn run_continuation(
        &mut self,
        env: &mut Env<'_>,
        continuation: ContextId,
        args: &[Value],
    ) -> Result<Flow> {
        let resumed = env.heap.copy_for_continuation_call(continuation)?;
        if let [value] = args {
            let enclosing = env.heap.context(resumed)?.variables;
            let mut frame = VariableFrame::new(Some(enclosing));
            frame.bind_slot(1, value.clone());
            let frame = env.heap.alloc_frame(frame);
            env.heap.context_mut(resumed)?.variables = frame;
        }
        let current = self.current_id()?;
        env.heap.context_mut(current)?.parent = Some(resumed);
        env.tracer
            .record(TraceEvent::ContinuationInvoked { process: self.id });
        Ok(Flow::Pop)
    }
}

/// A closure context capturing `scope`.
fn closure_in(scope: Scope) -> Context {
    Context {
        outer: scope.outer,
        receiver: scope.receiver,
        ..Context::new(scope.variables)
    }
}

/// The context that runs a closure, with its arguments bound in a fresh frame.
fn prepare_runnable(heap: &mut Heap, closure: ContextId, args: Vec<Value>) -> Result<Context> {
    let closure = heap.context(closure)?.clone();
    let frame = heap.alloc_frame(VariableFrame::new(Some(closure.variables)));
    bind_arguments(heap, frame, &closure, args)?;
    let outer = heap.alloc_context(Context {
        outer: closure.outer,
        receiver: closure.receiver.clone(),
        ..Context::new(frame)
    });
    Ok(Context {
        outer: Some(outer),
        expression: closure.expression,
        receiver: closure.receiver,
        is_lambda: true,
        ..Context::new(frame)
    })
}

/// Binds formal parameters by name, or fills the implicit slots.
///
/// One argument fills every empty slot. Otherwise the count must match the
/// empty slots, which are filled in order.
fn bind_arguments(heap: &mut Heap, frame: FrameId, closure: &Context, args: Vec<Value>) -> Result<()> {
    let scope = heap.frame_mut(frame)?;
    if !closure.parameters.is_empty() {
        let mut args = args.into_iter();
        for name in &closure.parameters {
            scope.add_var(name.clone(), args.next().unwrap_or_default());
        }
        return Ok(());
    }
    let slots = closure.empty_slots;
    let count = args.len();
    if count == 1 {
        for id in 1..=slots {
            scope.bind_slot(id, args[0].clone());
        }
    } else if count == slots as usize {
        for (id, value) in (1..).zip(args) {
            scope.bind_slot(id, value);
        }
    } else {
        return Err(Error::arity_mismatch(slots as usize, count));
    }
    Ok(())
}

/// Puts `runnable` above the caller behind a yield guard, with a relay
/// below it delivering the result (or nothing) to the caller's parent.
fn splice_reporter(heap: &mut Heap, caller: ContextId, mut runnable: Context) -> Result<()> {
    let relay = runnable.pseudo(PseudoOp::ReportNothing, runnable.parent);
    let relay = Context {
        is_inside_custom_block: heap.context(caller)?.is_inside_custom_block,
        ..relay
    };
    runnable.parent = Some(heap.alloc_context(relay));
    let runnable = heap.alloc_context(runnable);
    let guard = heap
        .context(runnable)?
        .pseudo(PseudoOp::Yield, Some(runnable));
    let guard = heap.alloc_context(guard);
    heap.context_mut(caller)?.parent = Some(guard);
    Ok(())
}
