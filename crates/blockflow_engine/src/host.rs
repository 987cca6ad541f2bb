//! Interfaces to the objects the engine runs scripts for.
//!
//! The engine never draws anything. Sprites, the stage, and the script
//! editor plug in through these traits.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use blockflow_foundation::{Error, FrameId, Result, Value};
use blockflow_language::{BlockKind, Expr};

/// The domain object (sprite or stage) a script runs against.
///
/// Only one process borrows a receiver at a time.
#[allow(unused_variables)]
pub trait Receiver {
    /// Name for traces and error markers.
    fn name(&self) -> &str;

    /// The receiver's own variable frame (see `ThreadManager::new_variable_frame`).
    fn variables(&self) -> Option<FrameId> {
        None
    }

    /// True while the user drags this receiver; its processes are skipped.
    fn is_picked_up(&self) -> bool {
        false
    }

    /// True if [`Receiver::invoke`] understands the selector.
    fn responds_to(&self, selector: &str) -> bool;

    /// Runs a receiver primitive. `Some` for reporters, `None` for commands.
    ///
    /// # Errors
    ///
    /// Any failure, reported as a primitive error on the calling process.
    fn invoke(&mut self, selector: &str, args: &[Value]) -> Result<Option<Value>>;

    /// Entering warp: visual updates may be batched.
    fn start_warp(&mut self) {}

    /// Leaving warp (also called at the end of each warped time slice).
    fn end_warp(&mut self) {}

    /// Current position, for gliding.
    fn position(&self) -> (f64, f64) {
        (0.0, 0.0)
    }

    /// Moves to a position.
    fn goto_xy(&mut self, x: f64, y: f64) {}

    /// Shows (`Some`) or clears (`None`) a speech or thought bubble.
    fn bubble(&mut self, text: Option<&str>, is_thought: bool) {}
}

/// Shared handle to a receiver.
pub type ReceiverRef = Rc<RefCell<dyn Receiver>>;

/// Visual feedback hooks of a top block in the script editor.
#[allow(unused_variables)]
pub trait BlockView {
    /// The script started running.
    fn add_highlight(&self) {}

    /// The script stopped running.
    fn remove_highlight(&self) {}

    /// The script stopped on an error.
    fn add_error_highlight(&self) {}

    /// A reporter script produced a value.
    fn show_bubble(&self, value: &Value) {}

    /// One-line error marker next to the failing element.
    fn show_error(&self, element: &str, message: &str) {}
}

/// The stage or other container the receivers live in.
#[allow(unused_variables)]
pub trait Host {
    /// Hat-block scripts that start when `message` is broadcast.
    fn scripts_for_message(&self, message: &str) -> Vec<Rc<TopBlock>> {
        Vec::new()
    }

    /// Keyboard state.
    fn is_key_pressed(&self, key: &str) -> bool {
        false
    }

    /// Shows or hides a variable watcher.
    fn set_watcher_visible(&self, variable: &str, visible: bool) {}
}

/// A script as the user sees it: the thing a process is started from.
///
/// Identity is pointer identity of the `Rc<TopBlock>`.
pub struct TopBlock {
    /// What to run: a command script, or a single reporter.
    pub expression: Expr,
    /// Who runs it.
    pub receiver: ReceiverRef,
    /// Command scripts report nothing; reporter results go to the view.
    pub kind: BlockKind,
    /// Editor hooks.
    pub view: Option<Rc<dyn BlockView>>,
}

impl TopBlock {
    /// A command script.
    #[must_use]
    pub fn script(expression: Expr, receiver: ReceiverRef) -> Self {
        Self {
            expression,
            receiver,
            kind: BlockKind::Command,
            view: None,
        }
    }

    /// A lone reporter block clicked in the editor.
    #[must_use]
    pub fn reporter(expression: Expr, receiver: ReceiverRef) -> Self {
        Self {
            expression,
            receiver,
            kind: BlockKind::Reporter,
            view: None,
        }
    }

    /// Builder method to attach editor hooks.
    #[must_use]
    pub fn with_view(mut self, view: Rc<dyn BlockView>) -> Self {
        self.view = Some(view);
        self
    }

    /// Fails with an unknown-selector error unless the receiver understands it.
    pub(crate) fn check_selector(receiver: &dyn Receiver, selector: &str) -> Result<()> {
        if receiver.responds_to(selector) {
            Ok(())
        } else {
            Err(Error::unknown_selector(selector))
        }
    }
}

impl fmt::Debug for TopBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TopBlock")
            .field("expression", &self.expression.to_string())
            .field("receiver", &self.receiver.borrow().name())
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}
