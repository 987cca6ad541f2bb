//! One evaluation step.

use std::sync::Arc;

use blockflow_foundation::{ContextId, Error, Result, Value};
use blockflow_language::{
    BlockCall, Callee, Expr, Expression, Primitive, PseudoOp, Slot, SlotContents,
};

use super::operators::{self, arg};
use super::{Env, Flow, Position, Process};
use crate::heap::Heap;
use crate::host::TopBlock;

impl Process {
    /// Advances the current context by one step.
    pub(crate) fn evaluate_context(&mut self, env: &mut Env<'_>) -> Result<()> {
        let id = self.current_id()?;
        let Some(expression) = env.heap.context(id)?.expression.clone() else {
            return self.pop_context(env.heap);
        };
        match expression.as_ref() {
            Expression::Sequence(items) => self.evaluate_sequence(env.heap, id, items),
            Expression::MultiArg(items) => self.evaluate_multi_arg(env.heap, id, items),
            Expression::BoundInput(slot) => self.evaluate_input(env.heap, id, slot),
            Expression::BlockCall(call) => self.evaluate_block(env, id, call),
            Expression::Selector(op) => self.evaluate_pseudo_op(env, id, *op),
        }
    }

    fn evaluate_sequence(&mut self, heap: &mut Heap, id: ContextId, items: &[Expr]) -> Result<()> {
        let pc = heap.context(id)?.pc;
        if pc >= items.len() {
            return self.pop_context(heap);
        }
        if pc + 1 == items.len() {
            // Last element: take this context's place so loops and recursion
            // in tail position run in constant depth.
            let scope = heap.context(id)?.scope();
            self.replace_context(heap, items[pc].clone(), scope)?;
            return Ok(());
        }
        heap.context_mut(id)?.pc = pc + 1;
        self.push_context(heap, items[pc].clone())?;
        Ok(())
    }

    fn evaluate_multi_arg(&mut self, heap: &mut Heap, id: ContextId, items: &[Expr]) -> Result<()> {
        let evaluated = heap.context(id)?.inputs.len();
        if let Some(next) = items.get(evaluated) {
            self.push_context(heap, next.clone())?;
            return Ok(());
        }
        let list = Value::List(heap.context(id)?.inputs.iter().cloned().collect());
        self.apply_flow(heap, Flow::Report(list))
    }

    fn evaluate_input(&mut self, heap: &mut Heap, id: ContextId, slot: &Slot) -> Result<()> {
        let value = match slot.binding_id {
            Some(binding) => {
                let frame = heap.context(id)?.variables;
                heap.slot_value(frame, binding)?.unwrap_or(Value::Nil)
            }
            None => match &slot.contents {
                SlotContents::Empty => Value::Nil,
                SlotContents::Literal(value) => value.clone(),
                SlotContents::Body(script) => self.reify_body(heap, script.clone())?,
                SlotContents::Script(expr) | SlotContents::Reporter(expr) => {
                    self.reify(heap, expr.as_ref(), Vec::new())?
                }
            },
        };
        self.apply_flow(heap, Flow::Report(value))
    }

    fn evaluate_block(&mut self, env: &mut Env<'_>, id: ContextId, call: &BlockCall) -> Result<()> {
        if let Callee::Primitive(primitive) = &call.callee {
            if primitive.is_special_form() {
                return self.evaluate_special_form(env.heap, id, *primitive, call);
            }
        }
        let evaluated = env.heap.context(id)?.inputs.len();
        if let Some(next) = call.args.get(evaluated) {
            self.push_context(env.heap, next.clone())?;
            return Ok(());
        }
        let inputs = env.heap.context(id)?.inputs.clone();
        let flow = match &call.callee {
            Callee::Primitive(primitive) => self.invoke_primitive(env, *primitive, &inputs)?,
            Callee::Receiver(selector) => self.invoke_receiver(env.heap, selector, &inputs)?,
            Callee::Custom(definition) => {
                let position = if definition.kind.is_command() {
                    Position::Command
                } else {
                    Position::Reporter
                };
                self.evaluate_custom_block(env.heap, definition, inputs, position)?
            }
            Callee::Variable(name) => Flow::Report(env.heap.get_var(id, name)?),
        };
        self.apply_flow(env.heap, flow)
    }

    /// `and`, `or`, and rings decide which of their inputs get evaluated.
    fn evaluate_special_form(
        &mut self,
        heap: &mut Heap,
        id: ContextId,
        primitive: Primitive,
        call: &BlockCall,
    ) -> Result<()> {
        let flow = match primitive {
            Primitive::ReportAnd | Primitive::ReportOr => {
                let short_circuit = primitive == Primitive::ReportOr;
                match heap.context(id)?.inputs.as_slice() {
                    [] => None,
                    [first] if first.is_truthy() == short_circuit => {
                        Some(Flow::Report(Value::Bool(short_circuit)))
                    }
                    [_] => None,
                    [_, second, ..] => Some(Flow::Report(Value::Bool(second.is_truthy()))),
                }
            }
            Primitive::ReportScript => {
                let parameters = ring_parameters(call.args.first());
                let body = call.args.get(1).and_then(|slot| match slot.as_ref() {
                    Expression::BoundInput(Slot {
                        contents: SlotContents::Script(expr) | SlotContents::Reporter(expr),
                        ..
                    }) => expr.clone(),
                    _ => None,
                });
                Some(Flow::Report(self.reify(heap, body.as_ref(), parameters)?))
            }
            other => return Err(Error::internal(format!("{other} is not a special form"))),
        };
        match flow {
            Some(flow) => self.apply_flow(heap, flow),
            None => {
                let next = heap.context(id)?.inputs.len();
                match call.args.get(next) {
                    Some(arg) => {
                        self.push_context(heap, arg.clone())?;
                        Ok(())
                    }
                    None => self.apply_flow(heap, Flow::Report(Value::Bool(false))),
                }
            }
        }
    }

    fn evaluate_pseudo_op(&mut self, env: &mut Env<'_>, id: ContextId, op: PseudoOp) -> Result<()> {
        match op {
            PseudoOp::Yield => {
                self.pop_context(env.heap)?;
                if !self.is_atomic {
                    self.ready_to_yield = true;
                }
                Ok(())
            }
            PseudoOp::StopWarping => self.do_stop_warping(env.heap),
            PseudoOp::ReportNothing => {
                let value = env
                    .heap
                    .context(id)?
                    .inputs
                    .first()
                    .cloned()
                    .unwrap_or_default();
                self.apply_flow(env.heap, Flow::Report(value))
            }
            PseudoOp::Stop => {
                self.stop();
                Ok(())
            }
        }
    }

    fn invoke_primitive(
        &mut self,
        env: &mut Env<'_>,
        primitive: Primitive,
        args: &[Value],
    ) -> Result<Flow> {
        use Primitive as P;
        Ok(match primitive {
            P::DoIf => self.do_if(env.heap, args)?,
            P::DoIfElse => self.do_if_else(env.heap, args)?,
            P::DoForever => self.do_forever(env.heap, args)?,
            P::DoRepeat => self.do_repeat(env.heap, args)?,
            P::DoUntil => self.do_until(env.heap, args)?,
            P::DoWaitUntil => self.do_wait_until(env.heap, args)?,
            P::DoWait => self.do_wait(env, args)?,
            P::DoWarp => self.do_warp(env.heap, args)?,
            P::DoReport => self.do_report(env.heap, args)?,
            P::DoStopBlock => self.do_stop_block(env.heap)?,
            P::DoStop => {
                self.stop();
                Flow::Pop
            }
            P::DoStopAll => {
                *env.stop_all = true;
                self.stop();
                Flow::Pop
            }
            P::DoBroadcast => self.do_broadcast(env, args)?,
            P::DoBroadcastAndWait => self.do_broadcast_and_wait(env, args)?,
            P::DoRun => {
                self.invoke_closure(env, arg(args, 0), spread(arg(args, 1)), Position::Command)?
            }
            P::Evaluate => {
                self.invoke_closure(env, arg(args, 0), spread(arg(args, 1)), Position::Reporter)?
            }
            P::Fork => self.fork(env, arg(args, 0), spread(arg(args, 1)))?,
            P::DoCallCC => self.call_with_continuation(env, arg(args, 0), Position::Command)?,
            P::ReportCallCC => self.call_with_continuation(env, arg(args, 0), Position::Reporter)?,
            P::DoGlide => self.do_glide(env, args)?,
            P::DoSayFor => self.do_say_for(env, args, false)?,
            P::DoThinkFor => self.do_say_for(env, args, true)?,
            P::DoSetVar => self.do_set_var(env.heap, args)?,
            P::DoChangeVar => self.do_change_var(env.heap, args)?,
            P::DoDeclareVariables => self.do_declare_variables(env.heap, args)?,
            P::DoShowVar => self.do_toggle_watcher(env, args, true),
            P::DoHideVar => self.do_toggle_watcher(env, args, false),
            P::ReportRandom => {
                Flow::Report(operators::random(env.rng, arg(args, 0), arg(args, 1))?)
            }
            P::ReportKeyPressed => {
                let key = arg(args, 0).to_string();
                Flow::Report(Value::Bool(env.host.is_some_and(|h| h.is_key_pressed(&key))))
            }
            pure => Flow::Report(operators::apply(pure, args)?),
        })
    }

    fn invoke_receiver(&mut self, heap: &Heap, selector: &str, args: &[Value]) -> Result<Flow> {
        let receiver = self
            .current_receiver(heap)
            .ok_or_else(|| Error::unknown_selector(selector))?;
        let mut receiver = receiver.borrow_mut();
        TopBlock::check_selector(&*receiver, selector)?;
        Ok(match receiver.invoke(selector, args)? {
            Some(value) => Flow::Report(value),
            None => Flow::Pop,
        })
    }
}

/// The inputs of `run`/`call`/`launch`: a list spreads into arguments.
fn spread(inputs: &Value) -> Vec<Value> {
    match inputs {
        Value::Nil => Vec::new(),
        Value::List(items) => items.iter().cloned().collect(),
        other => vec![other.clone()],
    }
}

/// Formal parameter names written into a ring.
fn ring_parameters(names: Option<&Expr>) -> Vec<Arc<str>> {
    let Some(Expression::MultiArg(items)) = names.map(AsRef::as_ref) else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| match item.as_ref() {
            Expression::BoundInput(Slot {
                contents: SlotContents::Literal(value),
                ..
            }) => Some(Arc::from(value.to_string())),
            _ => None,
        })
        .collect()
}
