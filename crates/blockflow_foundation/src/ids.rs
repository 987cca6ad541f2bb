//! Generational identifiers for arena-allocated runtime objects.

use std::fmt;

macro_rules! generational_id {
    ($(#[$meta:meta])* $name:ident, $tag:literal) => {
        $(#[$meta])*
        #[derive(Copy, Clone, Eq, PartialEq, Hash)]
        pub struct $name {
            /// Slot index in the owning arena.
            pub index: u32,
            /// Generation counter for stale reference detection.
            pub generation: u32,
        }

        impl $name {
            /// Creates an id from its parts.
            #[must_use]
            pub const fn new(index: u32, generation: u32) -> Self {
                Self { index, generation }
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($tag, "({}v{})"), self.index, self.generation)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($tag, "#{}"), self.index)
            }
        }
    };
}

generational_id!(
    /// Handle to a `Context` living in the engine heap.
    ///
    /// The generation changes every time the slot is reclaimed, so an id that
    /// outlives its context is detected instead of aliasing a newer one.
    ContextId,
    "Context"
);

generational_id!(
    /// Handle to a `VariableFrame` living in the engine heap.
    FrameId,
    "Frame"
);

/// Identifier assigned to each process by the scheduler, in start order.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct ProcessId(pub u64);

impl fmt::Display for ProcessId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P{}", self.0)
    }
}
