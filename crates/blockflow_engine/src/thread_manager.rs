//! The scheduler.
//!
//! A host calls [`ThreadManager::step`] once per display frame. Each step:
//! 1. Gives every registered process one time slice, in registration order
//! 2. Registers processes started during the step (broadcasts, `launch`)
//! 3. Sweeps processes that have finished, delivering reporter results
//! 4. Collects the heap every `collect_every` ticks

use std::fmt;
use std::rc::Rc;

use blockflow_debug::{TraceEvent, Tracer};
use blockflow_foundation::{ContextId, Error, FrameId, ProcessId, Result};
use blockflow_language::BlockKind;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::clock::{Clock, SystemClock};
use crate::config::EngineConfig;
use crate::frame::VariableFrame;
use crate::heap::{CollectStats, Heap};
use crate::host::{Host, TopBlock};
use crate::process::{Env, Process, ProcessHandle};

/// Owns every process and the heap their contexts live in.
pub struct ThreadManager {
    processes: Vec<Process>,
    heap: Heap,
    config: EngineConfig,
    clock: Rc<dyn Clock>,
    host: Option<Rc<dyn Host>>,
    tracer: Tracer,
    rng: ChaCha8Rng,
    next_process_id: u64,
    tick_number: u64,
}

impl Default for ThreadManager {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl ThreadManager {
    /// Creates a scheduler on the system clock.
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        Self {
            processes: Vec::new(),
            heap: Heap::new().with_collect_threshold(config.collect_threshold),
            tracer: Tracer::new(config.tracer.clone()),
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            clock: Rc::new(SystemClock::new()),
            host: None,
            next_process_id: 0,
            tick_number: 0,
            config,
        }
    }

    /// Builder method to read time from another clock.
    #[must_use]
    pub fn with_clock(mut self, clock: Rc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Builder method to attach the stage that answers broadcasts and
    /// sensing.
    #[must_use]
    pub fn with_host(mut self, host: Rc<dyn Host>) -> Self {
        self.host = Some(host);
        self
    }

    fn next_id(&mut self) -> ProcessId {
        self.next_process_id += 1;
        ProcessId(self.next_process_id)
    }

    fn position_of(&self, top_block: &Rc<TopBlock>) -> Option<usize> {
        self.processes.iter().rposition(|p| {
            p.top_block()
                .is_some_and(|block| Rc::ptr_eq(block, top_block))
        })
    }

    // -------------------------------------------------------------------------
    // Starting and stopping
    // -------------------------------------------------------------------------

    /// Starts a script, restarting it if it is already running.
    pub fn start_process(&mut self, top_block: &Rc<TopBlock>) -> ProcessHandle {
        let id = self.next_id();
        let process = Process::new(&mut self.heap, Rc::clone(top_block), id);
        let handle = process.handle();
        self.register(process);
        handle
    }

    /// Adds a new process, replacing any process for the same script.
    fn register(&mut self, process: Process) {
        if let Some(top_block) = process.top_block().cloned() {
            if let Some(index) = self.position_of(&top_block) {
                let mut previous = self.processes.remove(index);
                previous.stop();
                self.tracer.record(TraceEvent::ProcessStopped {
                    process: previous.id(),
                });
            }
            if let Some(view) = &top_block.view {
                view.add_highlight();
            }
            self.tracer
                .process_started(process.id(), || top_block.expression.label());
        } else {
            self.tracer
                .process_started(process.id(), || "launched script".to_string());
        }
        self.processes.push(process);
    }

    /// Asks the process running `top_block` to stop at its next step.
    pub fn stop_process(&mut self, top_block: &Rc<TopBlock>) {
        if let Some(index) = self.position_of(top_block) {
            let process = &mut self.processes[index];
            process.stop();
            self.tracer.record(TraceEvent::ProcessStopped {
                process: process.id(),
            });
        }
    }

    /// Stops every process, including failed ones.
    pub fn stop_all(&mut self) {
        for process in &mut self.processes {
            process.stop();
            self.tracer.record(TraceEvent::ProcessStopped {
                process: process.id(),
            });
        }
    }

    /// Stops `top_block` if it has a process, otherwise starts it.
    pub fn toggle_process(&mut self, top_block: &Rc<TopBlock>) -> Option<ProcessHandle> {
        if self.position_of(top_block).is_some() {
            self.stop_process(top_block);
            None
        } else {
            Some(self.start_process(top_block))
        }
    }

    // -------------------------------------------------------------------------
    // Stepping
    // -------------------------------------------------------------------------

    /// Runs one scheduler tick.
    ///
    /// # Errors
    ///
    /// In `ExecutionMode::Debug`, returns the first error a process raised
    /// during the tick. Otherwise errors stay with their process.
    pub fn step(&mut self) -> Result<()> {
        self.tick_number += 1;
        self.tracer.tick_start(self.tick_number);

        let mut launched = Vec::new();
        let mut first_error: Option<Error> = None;
        let count = self.processes.len();
        for index in 0..count {
            let mut stop_all = false;
            let (before, rest) = self.processes.split_at_mut(index);
            let Some((process, after)) = rest.split_first_mut() else {
                break;
            };
            let picked_up = process
                .receiver()
                .is_some_and(|receiver| receiver.borrow().is_picked_up());
            if picked_up || !process.is_running() {
                continue;
            }
            let mut env = Env {
                heap: &mut self.heap,
                tracer: &mut self.tracer,
                config: &self.config,
                clock: &*self.clock,
                host: self.host.as_deref(),
                rng: &mut self.rng,
                launched: &mut launched,
                stop_all: &mut stop_all,
                next_process_id: &mut self.next_process_id,
                siblings: [&*before, &*after],
            };
            if let Err(error) = process.run_step(&mut env) {
                first_error.get_or_insert(error);
            }
            if stop_all {
                launched.clear();
                self.stop_all();
            }
        }
        for process in launched {
            self.register(process);
        }

        self.remove_terminated_processes();
        if self.config.collect_every > 0 && self.tick_number % self.config.collect_every == 0 {
            self.collect_garbage();
        }
        self.tracer.tick_end(self.tick_number, self.processes.len());
        first_error.map_or(Ok(()), Err)
    }

    /// Drops processes that finished or were stopped. Failed processes stay
    /// so their error remains visible.
    fn remove_terminated_processes(&mut self) {
        let (done, remaining): (Vec<Process>, Vec<Process>) = std::mem::take(&mut self.processes)
            .into_iter()
            .partition(|p| !p.is_running() && !p.error_flag());
        self.processes = remaining;
        for process in done {
            let result = process.result(&self.heap);
            if let Some(top_block) = process.top_block() {
                if let Some(view) = &top_block.view {
                    view.remove_highlight();
                    if top_block.kind != BlockKind::Command {
                        if let Some(value) = &result {
                            view.show_bubble(value);
                        }
                    }
                }
            }
            self.tracer.process_finished(process.id(), result);
        }
    }

    /// Steps until no process is running or `max_ticks` have passed.
    /// Returns the number of ticks run.
    ///
    /// # Errors
    ///
    /// Returns the first error [`ThreadManager::step`] returns.
    pub fn run_until_idle(&mut self, max_ticks: u64) -> Result<u64> {
        let mut ticks = 0;
        while ticks < max_ticks && self.processes.iter().any(Process::is_running) {
            self.step()?;
            ticks += 1;
        }
        Ok(ticks)
    }

    /// Collects every context and frame no process can reach.
    pub fn collect_garbage(&mut self) -> CollectStats {
        let roots: Vec<ContextId> = self.processes.iter().flat_map(Process::roots).collect();
        let stats = self.heap.collect(&roots);
        self.tracer.record(TraceEvent::Collection {
            contexts_freed: stats.contexts_freed,
            frames_freed: stats.frames_freed,
            live_contexts: stats.live_contexts,
        });
        stats
    }

    /// A frame that survives every collection, for a receiver's own
    /// variables or for globals.
    pub fn new_variable_frame(&mut self, parent: Option<FrameId>) -> FrameId {
        let frame = self.heap.alloc_frame(VariableFrame::new(parent));
        self.heap.pin_frame(frame);
        frame
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    /// Registered processes, in registration order.
    #[must_use]
    pub fn processes(&self) -> &[Process] {
        &self.processes
    }

    /// The process running `top_block`, if any.
    #[must_use]
    pub fn find_process(&self, top_block: &Rc<TopBlock>) -> Option<&Process> {
        self.position_of(top_block).map(|i| &self.processes[i])
    }

    /// True if `top_block` has a process that has not finished.
    #[must_use]
    pub fn is_running(&self, top_block: &Rc<TopBlock>) -> bool {
        self.find_process(top_block).is_some_and(Process::is_running)
    }

    /// The heap.
    #[must_use]
    pub fn heap(&self) -> &Heap {
        &self.heap
    }

    /// Mutable access to the heap, for setting up variables.
    pub fn heap_mut(&mut self) -> &mut Heap {
        &mut self.heap
    }

    /// The tracer.
    #[must_use]
    pub fn tracer(&self) -> &Tracer {
        &self.tracer
    }

    /// Mutable access to the tracer.
    pub fn tracer_mut(&mut self) -> &mut Tracer {
        &mut self.tracer
    }

    /// Ticks run so far.
    #[must_use]
    pub fn tick_number(&self) -> u64 {
        self.tick_number
    }

    /// The configuration this scheduler was built with.
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
}

impl fmt::Debug for ThreadManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ThreadManager")
            .field("processes", &self.processes)
            .field("live_contexts", &self.heap.live_contexts())
            .field("tick_number", &self.tick_number)
            .finish_non_exhaustive()
    }
}
