//! Opaque handles to engine-owned states.

use std::fmt;
use std::rc::Rc;

/// A cheap, cloneable handle to a state owned by the routing engine.
///
/// The binding layer never inspects state definitions; it only carries
/// handles around (as viewport creation contexts and relative-resolution
/// anchors) and reads the fully-qualified name. Two handles are equal
/// when they name the same state.
#[derive(Clone)]
pub struct StateRef {
    inner: Rc<str>,
}

impl StateRef {
    /// Create a handle for the state with the given fully-qualified name.
    ///
    /// Engines construct these; the binding layer only clones them.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            inner: Rc::from(name.into()),
        }
    }

    /// Fully-qualified, dot-separated state name. The engine root is `""`.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.inner
    }

    /// Whether this handle names the engine root state.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.inner.is_empty()
    }

    /// Whether two handles share the same backing allocation.
    #[must_use]
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Rc::ptr_eq(&a.inner, &b.inner)
    }
}

impl PartialEq for StateRef {
    fn eq(&self, other: &Self) -> bool {
        self.inner == other.inner
    }
}

impl Eq for StateRef {}

impl fmt::Debug for StateRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("StateRef").field(&self.name()).finish()
    }
}
