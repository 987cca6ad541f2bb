//! Arena storage for contexts and variable frames.
//!
//! Contexts form a graph: dynamic `parent` chains, lexical `outer` chains,
//! closures held in values, and continuation copies sharing ancestors. Every
//! node lives in an arena slot addressed by a generational id, and a
//! mark-and-sweep pass reclaims whatever no process can reach.

// Arena indices are u32; we never allocate past that.
#![allow(clippy::cast_possible_truncation)]

use blockflow_foundation::{ContextId, Error, FrameId, Result, Value};

use crate::context::Context;
use crate::frame::VariableFrame;

/// A slot arena with generation tracking.
///
/// Even generations are free, odd generations are alive.
#[derive(Debug)]
pub(crate) struct Arena<T> {
    entries: Vec<Entry<T>>,
    free_list: Vec<u32>,
    live_count: usize,
}

#[derive(Debug)]
struct Entry<T> {
    generation: u32,
    value: Option<T>,
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            free_list: Vec::new(),
            live_count: 0,
        }
    }
}

impl<T> Arena<T> {
    /// Stores a value, reusing a free slot when one exists.
    fn insert(&mut self, value: T) -> (u32, u32) {
        self.live_count += 1;
        if let Some(index) = self.free_list.pop() {
            let entry = &mut self.entries[index as usize];
            entry.generation += 1;
            entry.value = Some(value);
            (index, entry.generation)
        } else {
            let index = self.entries.len() as u32;
            self.entries.push(Entry {
                generation: 1,
                value: Some(value),
            });
            (index, 1)
        }
    }

    fn get(&self, index: u32, generation: u32) -> Option<&T> {
        self.entries
            .get(index as usize)
            .filter(|entry| entry.generation == generation)
            .and_then(|entry| entry.value.as_ref())
    }

    fn get_mut(&mut self, index: u32, generation: u32) -> Option<&mut T> {
        self.entries
            .get_mut(index as usize)
            .filter(|entry| entry.generation == generation)
            .and_then(|entry| entry.value.as_mut())
    }

    #[cfg(test)]
    fn generation_of(&self, index: u32) -> Option<u32> {
        self.entries
            .get(index as usize)
            .filter(|entry| entry.generation % 2 == 1)
            .map(|entry| entry.generation)
    }

    /// Frees every live slot whose mark is unset. Returns how many were freed.
    fn sweep(&mut self, marks: &[bool]) -> usize {
        let mut freed = 0;
        for (index, entry) in self.entries.iter_mut().enumerate() {
            if entry.generation % 2 == 1 && !marks.get(index).copied().unwrap_or(false) {
                entry.generation += 1;
                entry.value = None;
                self.free_list.push(index as u32);
                freed += 1;
            }
        }
        self.live_count -= freed;
        freed
    }

    fn slots(&self) -> usize {
        self.entries.len()
    }

    fn len(&self) -> usize {
        self.live_count
    }
}

/// What one collection reclaimed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CollectStats {
    /// Contexts freed.
    pub contexts_freed: usize,
    /// Frames freed.
    pub frames_freed: usize,
    /// Contexts still alive.
    pub live_contexts: usize,
    /// Frames still alive.
    pub live_frames: usize,
}

/// Owner of every context and variable frame.
#[derive(Debug)]
pub struct Heap {
    contexts: Arena<Context>,
    frames: Arena<VariableFrame>,
    pinned_frames: Vec<FrameId>,
    allocations: usize,
    collect_threshold: usize,
}

impl Default for Heap {
    fn default() -> Self {
        Self::new()
    }
}

impl Heap {
    /// Creates an empty heap.
    #[must_use]
    pub fn new() -> Self {
        Self {
            contexts: Arena::default(),
            frames: Arena::default(),
            pinned_frames: Vec::new(),
            allocations: 0,
            collect_threshold: 100_000,
        }
    }

    /// Builder method to set how many allocations trigger an in-step collection.
    #[must_use]
    pub fn with_collect_threshold(mut self, threshold: usize) -> Self {
        self.collect_threshold = threshold.max(1);
        self
    }

    /// Stores a context.
    pub fn alloc_context(&mut self, context: Context) -> ContextId {
        self.allocations += 1;
        let (index, generation) = self.contexts.insert(context);
        ContextId::new(index, generation)
    }

    /// Looks up a context.
    ///
    /// # Errors
    ///
    /// Returns a stale-reference error if the context was collected.
    pub fn context(&self, id: ContextId) -> Result<&Context> {
        self.contexts
            .get(id.index, id.generation)
            .ok_or_else(|| Error::stale_reference(id))
    }

    /// Looks up a context for mutation.
    ///
    /// # Errors
    ///
    /// Returns a stale-reference error if the context was collected.
    pub fn context_mut(&mut self, id: ContextId) -> Result<&mut Context> {
        self.contexts
            .get_mut(id.index, id.generation)
            .ok_or_else(|| Error::stale_reference(id))
    }

    /// Stores a variable frame.
    pub fn alloc_frame(&mut self, frame: VariableFrame) -> FrameId {
        self.allocations += 1;
        let (index, generation) = self.frames.insert(frame);
        FrameId::new(index, generation)
    }

    /// Looks up a variable frame.
    ///
    /// # Errors
    ///
    /// Returns a stale-reference error if the frame was collected.
    pub fn frame(&self, id: FrameId) -> Result<&VariableFrame> {
        self.frames
            .get(id.index, id.generation)
            .ok_or_else(|| Error::stale_reference(id))
    }

    /// Looks up a variable frame for mutation.
    ///
    /// # Errors
    ///
    /// Returns a stale-reference error if the frame was collected.
    pub fn frame_mut(&mut self, id: FrameId) -> Result<&mut VariableFrame> {
        self.frames
            .get_mut(id.index, id.generation)
            .ok_or_else(|| Error::stale_reference(id))
    }

    /// Keeps a frame (and everything it reaches) alive across collections.
    ///
    /// Receivers and global scopes own pinned frames.
    pub fn pin_frame(&mut self, id: FrameId) {
        if !self.pinned_frames.contains(&id) {
            self.pinned_frames.push(id);
        }
    }

    /// Releases a pinned frame.
    pub fn unpin_frame(&mut self, id: FrameId) {
        self.pinned_frames.retain(|pinned| *pinned != id);
    }

    /// Number of live contexts.
    #[must_use]
    pub fn live_contexts(&self) -> usize {
        self.contexts.len()
    }

    /// Number of live frames.
    #[must_use]
    pub fn live_frames(&self) -> usize {
        self.frames.len()
    }

    pub(crate) fn wants_collection(&self) -> bool {
        self.allocations >= self.collect_threshold
    }

    /// Frees every context and frame unreachable from `roots` and the pinned
    /// frames.
    pub fn collect(&mut self, roots: &[ContextId]) -> CollectStats {
        let mut context_marks = vec![false; self.contexts.slots()];
        let mut frame_marks = vec![false; self.frames.slots()];
        let mut pending_contexts = roots.to_vec();
        let mut pending_frames = self.pinned_frames.clone();

        loop {
            if let Some(id) = pending_contexts.pop() {
                let Some(context) = self.contexts.get(id.index, id.generation) else {
                    continue;
                };
                let mark = &mut context_marks[id.index as usize];
                if *mark {
                    continue;
                }
                *mark = true;
                pending_contexts.extend(context.parent);
                pending_contexts.extend(context.outer);
                pending_frames.push(context.variables);
                if let Some(upvars) = &context.upvars {
                    pending_frames.extend(upvars.targets());
                }
                for value in &context.inputs {
                    trace_value(value, &mut pending_contexts);
                }
                continue;
            }
            if let Some(id) = pending_frames.pop() {
                let Some(frame) = self.frames.get(id.index, id.generation) else {
                    continue;
                };
                let mark = &mut frame_marks[id.index as usize];
                if *mark {
                    continue;
                }
                *mark = true;
                pending_frames.extend(frame.parent);
                for value in frame.values() {
                    trace_value(value, &mut pending_contexts);
                }
                continue;
            }
            break;
        }

        let contexts_freed = self.contexts.sweep(&context_marks);
        let frames_freed = self.frames.sweep(&frame_marks);
        self.allocations = 0;
        CollectStats {
            contexts_freed,
            frames_freed,
            live_contexts: self.contexts.len(),
            live_frames: self.frames.len(),
        }
    }

    /// Rebuilds the id of a live context from its slot index.
    #[cfg(test)]
    pub(crate) fn context_id_at(&self, index: u32) -> Option<ContextId> {
        self.contexts
            .generation_of(index)
            .map(|generation| ContextId::new(index, generation))
    }
}

fn trace_value(value: &Value, pending: &mut Vec<ContextId>) {
    match value {
        Value::Closure(id) => pending.push(*id),
        Value::List(items) => {
            for item in items.iter() {
                trace_value(item, pending);
            }
        }
        _ => {}
    }
}
