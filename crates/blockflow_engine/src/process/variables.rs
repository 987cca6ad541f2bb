//! Variable primitives. None of these create a binding except `script
//! variables`.

use blockflow_foundation::{Result, Value};

use super::operators::{arg, sum};
use super::{Env, Flow, Process};
use crate::heap::Heap;

impl Process {
    pub(super) fn do_set_var(&mut self, heap: &mut Heap, args: &[Value]) -> Result<Flow> {
        let id = self.current_id()?;
        let name = arg(args, 0).to_string();
        heap.set_var(id, &name, arg(args, 1).clone())?;
        Ok(Flow::Pop)
    }

    pub(super) fn do_change_var(&mut self, heap: &mut Heap, args: &[Value]) -> Result<Flow> {
        let id = self.current_id()?;
        let binding = heap.resolve(id, &arg(args, 0).to_string())?;
        let changed = sum(&heap.read(&binding)?, arg(args, 1))?;
        heap.write(&binding, changed)?;
        Ok(Flow::Pop)
    }

    /// `script variables a b c`: declares each name as zero in the frame of
    /// the running script.
    pub(super) fn do_declare_variables(&mut self, heap: &mut Heap, args: &[Value]) -> Result<Flow> {
        let frame = heap.context(self.current_id()?)?.variables;
        let names: Vec<String> = match arg(args, 0) {
            Value::List(items) => items.iter().map(ToString::to_string).collect(),
            Value::Nil => Vec::new(),
            single => vec![single.to_string()],
        };
        let frame = heap.frame_mut(frame)?;
        for name in names.into_iter().filter(|n| !n.is_empty()) {
            frame.add_var(name, Value::Int(0));
        }
        Ok(Flow::Pop)
    }

    pub(super) fn do_toggle_watcher(
        &mut self,
        env: &mut Env<'_>,
        args: &[Value],
        visible: bool,
    ) -> Flow {
        if let Some(host) = env.host {
            host.set_watcher_visible(&arg(args, 0).to_string(), visible);
        }
        Flow::Pop
    }
}
