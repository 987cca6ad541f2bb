//! Variable frames and name resolution.
//!
//! A frame maps names to values and points at a lexical parent frame.
//! Resolution from a context walks the lexical frame chain first, then the
//! upvar aliases in scope, then the dynamic chain of calling contexts.

use std::collections::HashMap;
use std::rc::Rc;
use std::sync::Arc;

use blockflow_foundation::{ContextId, Error, ErrorKind, FrameId, Result, Value};

use crate::heap::Heap;

/// One scope of variables.
#[derive(Clone, Debug, Default)]
pub struct VariableFrame {
    vars: HashMap<Arc<str>, Value>,
    slots: HashMap<u32, Value>,
    /// Lexically enclosing frame.
    pub parent: Option<FrameId>,
}

impl VariableFrame {
    /// Creates an empty frame.
    #[must_use]
    pub fn new(parent: Option<FrameId>) -> Self {
        Self {
            parent,
            ..Self::default()
        }
    }

    /// Declares (or overwrites) a variable in this frame.
    pub fn add_var(&mut self, name: impl Into<Arc<str>>, value: Value) {
        self.vars.insert(name.into(), value);
    }

    /// True if this frame itself declares `name`.
    #[must_use]
    pub fn has_var(&self, name: &str) -> bool {
        self.vars.contains_key(name)
    }

    /// The value declared here, without looking at parents.
    #[must_use]
    pub fn local(&self, name: &str) -> Option<&Value> {
        self.vars.get(name)
    }

    fn local_mut(&mut self, name: &str) -> Option<&mut Value> {
        self.vars.get_mut(name)
    }

    /// Binds an implicit parameter.
    pub fn bind_slot(&mut self, id: u32, value: Value) {
        self.slots.insert(id, value);
    }

    /// An implicit parameter bound here.
    #[must_use]
    pub fn slot(&self, id: u32) -> Option<&Value> {
        self.slots.get(&id)
    }

    /// Names declared here, unordered.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.vars.keys().map(AsRef::as_ref)
    }

    pub(crate) fn values(&self) -> impl Iterator<Item = &Value> {
        self.vars.values().chain(self.slots.values())
    }
}

/// Aliases from a custom block's upvar parameters to the caller's variables.
///
/// Tables chain to the table of the enclosing invocation.
#[derive(Debug, Default)]
pub struct UpvarReference {
    aliases: HashMap<Arc<str>, Binding>,
    parent: Option<Rc<UpvarReference>>,
}

impl UpvarReference {
    /// Creates an empty table on top of `parent`.
    #[must_use]
    pub fn new(parent: Option<Rc<UpvarReference>>) -> Self {
        Self {
            aliases: HashMap::new(),
            parent,
        }
    }

    /// Makes `upvar` another name for `target`.
    pub fn add_reference(&mut self, upvar: impl Into<Arc<str>>, target: Binding) {
        self.aliases.insert(upvar.into(), target);
    }

    /// Follows the chain looking for an alias.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<&Binding> {
        let mut table = Some(self);
        while let Some(current) = table {
            if let Some(binding) = current.aliases.get(name) {
                return Some(binding);
            }
            table = current.parent.as_deref();
        }
        None
    }

    /// True if this level declares no alias.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }

    pub(crate) fn targets(&self) -> Vec<FrameId> {
        let mut frames = Vec::new();
        let mut table = Some(self);
        while let Some(current) = table {
            frames.extend(current.aliases.values().map(|binding| binding.frame));
            table = current.parent.as_deref();
        }
        frames
    }
}

/// Where a name lives once aliases are followed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Binding {
    /// The frame declaring the variable.
    pub frame: FrameId,
    /// The variable's name in that frame.
    pub name: Arc<str>,
}

impl Heap {
    /// Finds the frame declaring `name` on the lexical chain starting at `frame`.
    ///
    /// # Errors
    ///
    /// Fails only on a stale frame id.
    pub fn find_frame(&self, frame: FrameId, name: &str) -> Result<Option<FrameId>> {
        let mut current = Some(frame);
        while let Some(id) = current {
            let scope = self.frame(id)?;
            if scope.has_var(name) {
                return Ok(Some(id));
            }
            current = scope.parent;
        }
        Ok(None)
    }

    /// Reads `name` from the lexical chain of a frame.
    ///
    /// # Errors
    ///
    /// Returns an unbound-variable error if no frame on the chain declares it.
    pub fn frame_var(&self, frame: FrameId, name: &str) -> Result<Value> {
        let found = self
            .find_frame(frame, name)?
            .ok_or_else(|| Error::unbound_variable(name))?;
        self.read(&Binding {
            frame: found,
            name: Arc::from(name),
        })
    }

    /// Reads implicit parameter `id` from the lexical chain of a frame.
    ///
    /// # Errors
    ///
    /// Fails only on a stale frame id.
    pub fn slot_value(&self, frame: FrameId, id: u32) -> Result<Option<Value>> {
        let mut current = Some(frame);
        while let Some(frame_id) = current {
            let scope = self.frame(frame_id)?;
            if let Some(value) = scope.slot(id) {
                return Ok(Some(value.clone()));
            }
            current = scope.parent;
        }
        Ok(None)
    }

    /// Resolves `name` as seen from a running context.
    ///
    /// # Errors
    ///
    /// Returns an unbound-variable error if neither chain knows the name.
    pub fn resolve(&self, context: ContextId, name: &str) -> Result<Binding> {
        let mut last_searched = None;
        let mut current = Some(context);
        while let Some(id) = current {
            let ctx = self.context(id)?;
            if last_searched != Some(ctx.variables) {
                if let Some(frame) = self.find_frame(ctx.variables, name)? {
                    return Ok(Binding {
                        frame,
                        name: Arc::from(name),
                    });
                }
                if let Some(binding) = ctx.upvars.as_deref().and_then(|u| u.find(name)) {
                    return Ok(binding.clone());
                }
                last_searched = Some(ctx.variables);
            }
            current = ctx.parent;
        }
        Err(Error::unbound_variable(name))
    }

    /// Reads a resolved variable.
    ///
    /// # Errors
    ///
    /// Returns an unbound-variable error if the declaring frame dropped it.
    pub fn read(&self, binding: &Binding) -> Result<Value> {
        self.frame(binding.frame)?
            .local(&binding.name)
            .cloned()
            .ok_or_else(|| Error::unbound_variable(binding.name.as_ref()))
    }

    /// Overwrites a resolved variable.
    ///
    /// # Errors
    ///
    /// Returns an unbound-variable error if the declaring frame dropped it.
    pub fn write(&mut self, binding: &Binding, value: Value) -> Result<()> {
        let slot = self
            .frame_mut(binding.frame)?
            .local_mut(&binding.name)
            .ok_or_else(|| Error::unbound_variable(binding.name.as_ref()))?;
        *slot = value;
        Ok(())
    }

    /// Reads a variable as seen from a running context.
    ///
    /// # Errors
    ///
    /// Returns an unbound-variable error if the name is not in scope.
    pub fn get_var(&self, context: ContextId, name: &str) -> Result<Value> {
        let binding = self.resolve(context, name)?;
        self.read(&binding)
    }

    /// Assigns an existing variable as seen from a running context.
    ///
    /// # Errors
    ///
    /// Returns an unbound-variable error if the name is not in scope; no
    /// variable is created.
    pub fn set_var(&mut self, context: ContextId, name: &str, value: Value) -> Result<()> {
        let binding = self.resolve(context, name)?;
        self.write(&binding, value)
    }

    /// Resolves `name`, declaring it with value zero in `fallback` if it is
    /// not in scope.
    pub(crate) fn resolve_or_declare(
        &mut self,
        context: ContextId,
        name: &str,
        fallback: FrameId,
    ) -> Result<Binding> {
        match self.resolve(context, name) {
            Err(Error {
                kind: ErrorKind::UnboundVariable(_),
                ..
            }) => {
                self.frame_mut(fallback)?.add_var(name, Value::Int(0));
                Ok(Binding {
                    frame: fallback,
                    name: Arc::from(name),
                })
            }
            other => other,
        }
    }
}
