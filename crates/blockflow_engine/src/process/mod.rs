//! Processes: one running script each.
//!
//! A process owns a pointer into a chain of contexts in the heap. Every
//! evaluation step looks at the current context, either pushes a child for a
//! pending input or applies the block, and hands the result up the chain.
//! Control primitives rewire the chain directly.

mod control;
mod evaluate;
mod invoke;
mod operators;
mod variables;

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use blockflow_debug::{TraceEvent, Tracer};
use blockflow_foundation::{ContextId, Error, ErrorContext, ProcessId, Result, Value};
use blockflow_language::{Expr, PseudoOp, builder};
use rand_chacha::ChaCha8Rng;

use crate::clock::Clock;
use crate::config::{EngineConfig, ExecutionMode};
use crate::context::{Context, Scope};
use crate::frame::VariableFrame;
use crate::heap::Heap;
use crate::host::{Host, ReceiverRef, TopBlock};

/// Observable state of a process, shared with whoever started it.
///
/// `broadcast and wait` holds handles of the processes it launched.
#[derive(Clone)]
pub struct ProcessHandle(Rc<HandleState>);

struct HandleState {
    id: ProcessId,
    running: Cell<bool>,
    errored: Cell<bool>,
}

impl ProcessHandle {
    fn new(id: ProcessId) -> Self {
        Self(Rc::new(HandleState {
            id,
            running: Cell::new(true),
            errored: Cell::new(false),
        }))
    }

    /// The process id.
    #[must_use]
    pub fn id(&self) -> ProcessId {
        self.0.id
    }

    /// True until the process finishes, stops, or fails.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.0.running.get()
    }

    /// True if the process stopped on an error.
    #[must_use]
    pub fn has_error(&self) -> bool {
        self.0.errored.get()
    }
}

impl fmt::Debug for ProcessHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessHandle")
            .field("id", &self.id())
            .field("running", &self.is_running())
            .field("errored", &self.has_error())
            .finish()
    }
}

/// What a primitive did to the context chain.
pub(crate) enum Flow {
    /// Hand a value to the parent and pop.
    Report(Value),
    /// Pop without a value.
    Pop,
    /// The primitive rearranged the chain itself; leave it alone.
    Rewired,
}

/// Where a closure is invoked from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Position {
    Command,
    Reporter,
}

/// Everything a process needs from its scheduler while it runs.
pub(crate) struct Env<'a> {
    pub heap: &'a mut Heap,
    pub tracer: &'a mut Tracer,
    pub config: &'a EngineConfig,
    pub clock: &'a dyn Clock,
    pub host: Option<&'a dyn Host>,
    pub rng: &'a mut ChaCha8Rng,
    /// Processes started during this step, registered after it.
    pub launched: &'a mut Vec<Process>,
    pub stop_all: &'a mut bool,
    pub next_process_id: &'a mut u64,
    /// The other registered processes, for collection roots.
    pub siblings: [&'a [Process]; 2],
}

impl Env<'_> {
    pub(crate) fn next_id(&mut self) -> ProcessId {
        *self.next_process_id += 1;
        ProcessId(*self.next_process_id)
    }
}

/// A running script.
pub struct Process {
    id: ProcessId,
    top_block: Option<Rc<TopBlock>>,
    receiver: Option<ReceiverRef>,
    context: Option<ContextId>,
    home_context: ContextId,
    ready_to_yield: bool,
    ready_to_terminate: bool,
    error_flag: bool,
    is_atomic: bool,
    last_yield: u64,
    last_error: Option<Error>,
    handle: ProcessHandle,
}

impl Process {
    /// A process for a top block, starting with a yield so the first step
    /// only marks it as running.
    pub(crate) fn new(heap: &mut Heap, top_block: Rc<TopBlock>, id: ProcessId) -> Self {
        let receiver = top_block.receiver.clone();
        let receiver_frame = receiver.borrow().variables();
        let frame = heap.alloc_frame(VariableFrame::new(receiver_frame));
        let home = heap.alloc_context(Context {
            receiver: Some(receiver.clone()),
            ..Context::new(frame)
        });
        let script = heap.alloc_context(Context {
            outer: Some(home),
            expression: Some(top_block.expression.clone()),
            receiver: Some(receiver.clone()),
            ..Context::new(frame)
        });
        let start = heap.alloc_context(Context {
            parent: Some(script),
            expression: Some(builder::pseudo(PseudoOp::Yield)),
            receiver: Some(receiver.clone()),
            ..Context::new(frame)
        });
        Self::assemble(id, Some(top_block), Some(receiver), home, start)
    }

    pub(crate) fn assemble(
        id: ProcessId,
        top_block: Option<Rc<TopBlock>>,
        receiver: Option<ReceiverRef>,
        home_context: ContextId,
        context: ContextId,
    ) -> Self {
        Self {
            id,
            top_block,
            receiver,
            context: Some(context),
            home_context,
            ready_to_yield: false,
            ready_to_terminate: false,
            error_flag: false,
            is_atomic: false,
            last_yield: 0,
            last_error: None,
            handle: ProcessHandle::new(id),
        }
    }

    /// The process id.
    #[must_use]
    pub fn id(&self) -> ProcessId {
        self.id
    }

    /// The script this process was started from; `None` for launched closures.
    #[must_use]
    pub fn top_block(&self) -> Option<&Rc<TopBlock>> {
        self.top_block.as_ref()
    }

    /// The receiver the process runs for.
    #[must_use]
    pub fn receiver(&self) -> Option<&ReceiverRef> {
        self.receiver.as_ref()
    }

    /// The context evaluated next.
    #[must_use]
    pub fn context(&self) -> Option<ContextId> {
        self.context
    }

    /// The context receiving the script's own result.
    #[must_use]
    pub fn home_context(&self) -> ContextId {
        self.home_context
    }

    /// True while there is something left to evaluate.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.context.is_some() && !self.ready_to_terminate
    }

    /// True if the process stopped on an error.
    #[must_use]
    pub fn error_flag(&self) -> bool {
        self.error_flag
    }

    /// True while warping.
    #[must_use]
    pub fn is_atomic(&self) -> bool {
        self.is_atomic
    }

    /// Clock reading at the end of the last step.
    #[must_use]
    pub fn last_yield(&self) -> u64 {
        self.last_yield
    }

    /// The error that stopped the process, if any.
    #[must_use]
    pub fn last_error(&self) -> Option<&Error> {
        self.last_error.as_ref()
    }

    /// A handle observing this process.
    #[must_use]
    pub fn handle(&self) -> ProcessHandle {
        self.handle.clone()
    }

    /// The value the script reported, if it has finished with one.
    #[must_use]
    pub fn result(&self, heap: &Heap) -> Option<Value> {
        heap.context(self.home_context)
            .ok()
            .and_then(|home| home.inputs.first().cloned())
    }

    /// Length of the dynamic chain from the current context.
    #[must_use]
    pub fn chain_length(&self, heap: &Heap) -> usize {
        let mut length = 0;
        let mut next = self.context;
        while let Some(id) = next {
            length += 1;
            next = heap.context(id).ok().and_then(|c| c.parent);
        }
        length
    }

    /// Asks the process to terminate at the end of its current step.
    pub fn stop(&mut self) {
        self.ready_to_yield = true;
        self.ready_to_terminate = true;
        self.error_flag = false;
        self.sync_handle();
    }

    pub(crate) fn roots(&self) -> impl Iterator<Item = ContextId> + '_ {
        self.context.into_iter().chain(Some(self.home_context))
    }

    fn sync_handle(&self) {
        self.handle.0.running.set(self.is_running());
        self.handle.0.errored.set(self.error_flag);
    }

    /// Evaluates until the process yields, finishes, or exhausts its slice.
    ///
    /// Errors are contained in the process unless the engine runs in debug
    /// mode, where they are also returned.
    pub(crate) fn run_step(&mut self, env: &mut Env<'_>) -> Result<()> {
        self.ready_to_yield = false;
        let slice_start = env.clock.now_ms();
        let timeout = env.config.timeout_ms();
        let mut evaluations = 0_u64;
        let mut outcome = Ok(());

        while !self.ready_to_yield
            && !self.ready_to_terminate
            && self.context.is_some()
            && env.clock.now_ms().saturating_sub(slice_start) < timeout
        {
            evaluations += 1;
            if let Err(error) = self.evaluate_context(env) {
                self.handle_error(env, error.clone());
                if env.config.execution_mode == ExecutionMode::Debug {
                    outcome = Err(error);
                    break;
                }
            }
            if env.heap.wants_collection() {
                self.collect_garbage(env);
            }
        }

        self.last_yield = env.clock.now_ms();
        if self.is_atomic {
            if let Some(receiver) = self.receiver.as_ref() {
                let mut receiver = receiver.borrow_mut();
                receiver.end_warp();
                receiver.start_warp();
            }
        }
        if self.ready_to_terminate {
            while let Some(id) = self.context {
                self.context = env.heap.context(id).ok().and_then(|c| c.parent);
            }
            if self.is_atomic {
                self.is_atomic = false;
                if let Some(receiver) = self.receiver.as_ref() {
                    receiver.borrow_mut().end_warp();
                }
            }
        } else if self.ready_to_yield && self.context.is_some() {
            env.tracer.record(TraceEvent::ProcessYielded {
                process: self.id,
                evaluations,
            });
        }
        self.sync_handle();
        outcome
    }

    fn handle_error(&mut self, env: &mut Env<'_>, error: Error) {
        let element = self
            .context
            .and_then(|id| env.heap.context(id).ok())
            .and_then(|c| c.expression.as_ref().map(|e| e.label()))
            .unwrap_or_else(|| "script".to_string());
        let error = match error.context {
            Some(_) => error,
            None => {
                let mut context = ErrorContext::new().with_element(&element);
                if let Some(top) = &self.top_block {
                    context = context.with_script(top.expression.label());
                }
                error.with_context(context)
            }
        };
        let message = error.to_string();

        self.stop();
        self.error_flag = true;
        if let Some(view) = self.top_block.as_ref().and_then(|top| top.view.as_ref()) {
            view.add_error_highlight();
            view.show_error(&element, &message);
        }
        env.tracer.process_error(self.id, &element, &message);
        self.last_error = Some(error);
        self.sync_handle();
    }

    fn collect_garbage(&mut self, env: &mut Env<'_>) {
        let mut roots: Vec<ContextId> = self.roots().collect();
        for process in env.siblings.iter().flat_map(|s| s.iter()).chain(env.launched.iter()) {
            roots.extend(process.roots());
        }
        let stats = env.heap.collect(&roots);
        env.tracer.record(TraceEvent::Collection {
            contexts_freed: stats.contexts_freed,
            frames_freed: stats.frames_freed,
            live_contexts: stats.live_contexts,
        });
    }

    // -------------------------------------------------------------------------
    // Chain manipulation
    // -------------------------------------------------------------------------

    pub(crate) fn current_id(&self) -> Result<ContextId> {
        self.context
            .ok_or_else(|| Error::internal("process has no current context"))
    }

    pub(crate) fn pop_context(&mut self, heap: &Heap) -> Result<()> {
        if let Some(id) = self.context {
            self.context = heap.context(id)?.parent;
        }
        Ok(())
    }

    /// Pushes a child of the current context sharing its scope.
    pub(crate) fn push_context(&mut self, heap: &mut Heap, expression: Expr) -> Result<ContextId> {
        let scope = heap.context(self.current_id()?)?.scope();
        self.push_in_scope(heap, expression, scope)
    }

    /// Pushes a child of the current context running in another scope, as
    /// when a control block runs the script in its C-slot.
    pub(crate) fn push_in_scope(
        &mut self,
        heap: &mut Heap,
        expression: Expr,
        scope: Scope,
    ) -> Result<ContextId> {
        let parent = self.current_id()?;
        let current = heap.context(parent)?;
        let child = Context {
            parent: Some(parent),
            expression: Some(expression),
            outer: scope.outer,
            receiver: scope.receiver,
            upvars: current.upvars.clone(),
            is_inside_custom_block: current.is_inside_custom_block,
            ..Context::new(scope.variables)
        };
        let id = heap.alloc_context(child);
        self.context = Some(id);
        Ok(id)
    }

    pub(crate) fn push_pseudo(&mut self, heap: &mut Heap, op: PseudoOp) -> Result<ContextId> {
        let parent = self.current_id()?;
        let pseudo = heap.context(parent)?.pseudo(op, Some(parent));
        let id = heap.alloc_context(pseudo);
        self.context = Some(id);
        Ok(id)
    }

    /// Swaps the current context for a new one in the same chain position.
    pub(crate) fn replace_context(
        &mut self,
        heap: &mut Heap,
        expression: Expr,
        scope: Scope,
    ) -> Result<ContextId> {
        let current = heap.context(self.current_id()?)?;
        let replacement = current
            .tail_position()
            .context(current.parent, expression, scope);
        let id = heap.alloc_context(replacement);
        self.context = Some(id);
        Ok(id)
    }

    pub(crate) fn return_value_to_parent(&mut self, heap: &mut Heap, value: Value) -> Result<()> {
        let parent = match self.context {
            Some(id) => heap.context(id)?.parent,
            None => None,
        };
        let target = parent.unwrap_or(self.home_context);
        heap.context_mut(target)?.inputs.push(value);
        Ok(())
    }

    pub(crate) fn apply_flow(&mut self, heap: &mut Heap, flow: Flow) -> Result<()> {
        match flow {
            Flow::Report(value) => {
                self.return_value_to_parent(heap, value)?;
                self.pop_context(heap)
            }
            Flow::Pop => self.pop_context(heap),
            Flow::Rewired => Ok(()),
        }
    }

    /// The receiver code at the current context runs against.
    pub(crate) fn current_receiver(&self, heap: &Heap) -> Option<ReceiverRef> {
        self.context
            .and_then(|id| heap.context(id).ok())
            .and_then(|c| c.receiver.clone())
            .or_else(|| self.receiver.clone())
    }
}

impl fmt::Debug for Process {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Process")
            .field("id", &self.id)
            .field("context", &self.context)
            .field("running", &self.is_running())
            .field("error_flag", &self.error_flag)
            .field("is_atomic", &self.is_atomic)
            .finish_non_exhaustive()
    }
}
