//! Control-flow and timed primitives.
//!
//! Loops re-run themselves by leaving their context in place under a yield
//! and a body. Conditionals and `warp` replace their context so the body
//! inherits its tail position.

#![allow(clippy::cast_precision_loss)]

use blockflow_debug::TraceEvent;
use blockflow_foundation::{Error, Result, Value};
use blockflow_language::{PseudoOp, builder};

use super::operators::arg;
use super::{Env, Flow, Process, ProcessHandle};
use crate::context::Context;
use crate::heap::Heap;
use crate::host::ReceiverRef;

impl Process {
    pub(super) fn do_if(&mut self, heap: &mut Heap, args: &[Value]) -> Result<Flow> {
        if arg(args, 0).is_truthy() {
            self.run_in_place(heap, arg(args, 1))
        } else {
            Ok(Flow::Pop)
        }
    }

    pub(super) fn do_if_else(&mut self, heap: &mut Heap, args: &[Value]) -> Result<Flow> {
        let branch = if arg(args, 0).is_truthy() {
            arg(args, 1)
        } else {
            arg(args, 2)
        };
        self.run_in_place(heap, branch)
    }

    /// Replaces the current context with the script of a body closure.
    fn run_in_place(&mut self, heap: &mut Heap, body: &Value) -> Result<Flow> {
        match self.script_of(heap, body)? {
            Some((script, scope)) => {
                self.replace_context(heap, script, scope)?;
                Ok(Flow::Rewired)
            }
            None => Ok(Flow::Pop),
        }
    }

    /// Leaves the current context in place, then a yield, then the body.
    fn loop_once(&mut self, heap: &mut Heap, body: &Value) -> Result<Flow> {
        self.push_pseudo(heap, PseudoOp::Yield)?;
        if let Some((script, scope)) = self.script_of(heap, body)? {
            self.push_in_scope(heap, script, scope)?;
        }
        Ok(Flow::Rewired)
    }

    pub(super) fn do_forever(&mut self, heap: &mut Heap, args: &[Value]) -> Result<Flow> {
        self.loop_once(heap, arg(args, 0))
    }

    pub(super) fn do_repeat(&mut self, heap: &mut Heap, args: &[Value]) -> Result<Flow> {
        let remaining = match arg(args, 0).to_number()? {
            Value::Int(n) if n >= 1 => Value::Int(n - 1),
            Value::Float(f) if f >= 1.0 => Value::Float(f - 1.0),
            _ => return Ok(Flow::Pop),
        };
        let id = self.current_id()?;
        heap.context_mut(id)?.inputs = vec![remaining, arg(args, 1).clone()];
        self.loop_once(heap, arg(args, 1))
    }

    pub(super) fn do_until(&mut self, heap: &mut Heap, args: &[Value]) -> Result<Flow> {
        if arg(args, 0).is_truthy() {
            return self.replace_with_yield(heap);
        }
        let id = self.current_id()?;
        heap.context_mut(id)?.inputs.clear();
        self.loop_once(heap, arg(args, 1))
    }

    pub(super) fn do_wait_until(&mut self, heap: &mut Heap, args: &[Value]) -> Result<Flow> {
        if arg(args, 0).is_truthy() {
            return self.replace_with_yield(heap);
        }
        let id = self.current_id()?;
        heap.context_mut(id)?.inputs.clear();
        self.push_pseudo(heap, PseudoOp::Yield)?;
        Ok(Flow::Rewired)
    }

    fn replace_with_yield(&mut self, heap: &mut Heap) -> Result<Flow> {
        let scope = heap.context(self.current_id()?)?.scope();
        self.replace_context(heap, builder::pseudo(PseudoOp::Yield), scope)?;
        Ok(Flow::Rewired)
    }

    pub(super) fn do_wait(&mut self, env: &mut Env<'_>, args: &[Value]) -> Result<Flow> {
        let seconds = arg(args, 0).to_f64()?;
        let elapsed = self.elapsed_since_start(env)?;
        if elapsed as f64 >= seconds * 1000.0 {
            return Ok(Flow::Pop);
        }
        self.push_pseudo(env.heap, PseudoOp::Yield)?;
        Ok(Flow::Rewired)
    }

    /// Milliseconds since the current context first ran, starting the
    /// timer on the first call.
    fn elapsed_since_start(&mut self, env: &mut Env<'_>) -> Result<u64> {
        let now = env.clock.now_ms();
        let context = env.heap.context_mut(self.current_id()?)?;
        let start = *context.start_time.get_or_insert(now);
        Ok(now.saturating_sub(start))
    }

    pub(super) fn do_warp(&mut self, heap: &mut Heap, args: &[Value]) -> Result<Flow> {
        self.replace_with_yield(heap)?;
        if !self.is_atomic {
            self.push_pseudo(heap, PseudoOp::StopWarping)?;
        }
        if let Some((script, scope)) = self.script_of(heap, arg(args, 0))? {
            self.push_in_scope(heap, script, scope)?;
        }
        self.is_atomic = true;
        if let Some(receiver) = self.current_receiver(heap) {
            receiver.borrow_mut().start_warp();
        }
        Ok(Flow::Rewired)
    }

    pub(super) fn do_stop_warping(&mut self, heap: &Heap) -> Result<()> {
        let receiver = self.current_receiver(heap);
        self.pop_context(heap)?;
        self.is_atomic = false;
        if let Some(receiver) = receiver {
            receiver.borrow_mut().end_warp();
        }
        Ok(())
    }

    /// Pops until `boundary` holds for the current context, leaving warp on
    /// the way out.
    fn unwind_to(&mut self, heap: &Heap, boundary: impl Fn(&Context) -> bool) -> Result<()> {
        while let Some(id) = self.context {
            let context = heap.context(id)?;
            if boundary(context) {
                break;
            }
            if context.pseudo_op() == Some(PseudoOp::StopWarping) {
                self.do_stop_warping(heap)?;
            } else {
                self.pop_context(heap)?;
            }
        }
        Ok(())
    }

    pub(super) fn do_report(&mut self, heap: &Heap, args: &[Value]) -> Result<Flow> {
        self.unwind_to(heap, |c| c.is_lambda || c.is_custom_block)?;
        Ok(Flow::Report(arg(args, 0).clone()))
    }

    pub(super) fn do_stop_block(&mut self, heap: &Heap) -> Result<Flow> {
        if !heap.context(self.current_id()?)?.is_inside_custom_block {
            self.stop();
            return Ok(Flow::Pop);
        }
        self.unwind_to(heap, |c| c.is_custom_block)?;
        Ok(Flow::Pop)
    }

    /// Starts every script listening for `message`.
    fn broadcast(&mut self, env: &mut Env<'_>, message: &str) -> Vec<ProcessHandle> {
        let Some(host) = env.host.filter(|_| !message.is_empty()) else {
            return Vec::new();
        };
        let handles: Vec<ProcessHandle> = host
            .scripts_for_message(message)
            .into_iter()
            .map(|top_block| {
                let id = env.next_id();
                let process = Process::new(env.heap, top_block, id);
                let handle = process.handle();
                env.launched.push(process);
                handle
            })
            .collect();
        env.tracer.record(TraceEvent::Broadcast {
            process: self.id,
            message: message.to_string(),
            receivers: handles.len(),
        });
        handles
    }

    pub(super) fn do_broadcast(&mut self, env: &mut Env<'_>, args: &[Value]) -> Result<Flow> {
        let message = arg(args, 0).to_string();
        self.broadcast(env, &message);
        Ok(Flow::Pop)
    }

    pub(super) fn do_broadcast_and_wait(
        &mut self,
        env: &mut Env<'_>,
        args: &[Value],
    ) -> Result<Flow> {
        let id = self.current_id()?;
        if env.heap.context(id)?.active_sends.is_none() {
            let message = arg(args, 0).to_string();
            let handles = self.broadcast(env, &message);
            env.heap.context_mut(id)?.active_sends = Some(handles);
        }
        let waiting = env
            .heap
            .context(id)?
            .active_sends
            .as_ref()
            .is_some_and(|sends| sends.iter().any(ProcessHandle::is_running));
        if waiting {
            self.push_pseudo(env.heap, PseudoOp::Yield)?;
            Ok(Flow::Rewired)
        } else {
            Ok(Flow::Pop)
        }
    }

    fn timed_receiver(&self, heap: &Heap, selector: &str) -> Result<ReceiverRef> {
        self.current_receiver(heap)
            .ok_or_else(|| Error::primitive(selector, "nobody to run this"))
    }

    pub(super) fn do_glide(&mut self, env: &mut Env<'_>, args: &[Value]) -> Result<Flow> {
        let duration = arg(args, 0).to_f64()? * 1000.0;
        let (x, y) = (arg(args, 1).to_f64()?, arg(args, 2).to_f64()?);
        let receiver = self.timed_receiver(env.heap, "doGlide")?;
        let id = self.current_id()?;
        if env.heap.context(id)?.start_value.is_none() {
            let origin = receiver.borrow().position();
            env.heap.context_mut(id)?.start_value = Some(origin);
        }
        let elapsed = self.elapsed_since_start(env)? as f64;
        if elapsed >= duration {
            receiver.borrow_mut().goto_xy(x, y);
            return Ok(Flow::Pop);
        }
        let (x0, y0) = env.heap.context(id)?.start_value.unwrap_or_default();
        let fraction = elapsed / duration;
        receiver
            .borrow_mut()
            .goto_xy(x0 + (x - x0) * fraction, y0 + (y - y0) * fraction);
        self.push_pseudo(env.heap, PseudoOp::Yield)?;
        Ok(Flow::Rewired)
    }

    pub(super) fn do_say_for(
        &mut self,
        env: &mut Env<'_>,
        args: &[Value],
        is_thought: bool,
    ) -> Result<Flow> {
        let selector = if is_thought { "doThinkFor" } else { "doSayFor" };
        let text = arg(args, 0).to_string();
        let duration = arg(args, 1).to_f64()? * 1000.0;
        let receiver = self.timed_receiver(env.heap, selector)?;
        let id = self.current_id()?;
        if env.heap.context(id)?.start_time.is_none() {
            receiver.borrow_mut().bubble(Some(&text), is_thought);
        }
        if self.elapsed_since_start(env)? as f64 >= duration {
            receiver.borrow_mut().bubble(None, is_thought);
            return Ok(Flow::Pop);
        }
        self.push_pseudo(env.heap, PseudoOp::Yield)?;
        Ok(Flow::Rewired)
    }
}
