//! Exit-veto bridging.
//!
//! A component occupying a viewport may veto transitions that would
//! exit the state that activated it. [`ExitBinding`] associates the
//! most-recently-bound component instance with that state and keeps a
//! before-transition hook registered with the engine for exactly as
//! long as that instance is the current occupant: rebinding a new
//! instance releases the previous hook before installing the next, and
//! the final unmount releases the last one.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use tracing::debug;
use trailhead_core::engine::{Deregister, RouterEngine};
use trailhead_core::transition::{HookCriteria, HookResult, TransitionHandle};

/// Implemented by component instances that want an exit veto.
///
/// The return value is forwarded to the engine unmodified: `Allow` lets
/// the transition proceed, `Block` vetoes it and leaves the previously
/// active state current.
pub trait ExitAware {
    /// Called before any transition that would exit the bound state.
    fn can_exit(&self, transition: &TransitionHandle) -> HookResult;
}

struct Bound {
    /// Identity of the bound instance (allocation address; never
    /// dereferenced).
    instance: *const (),
    dereg: Deregister,
}

/// Tracks the current occupant of one viewport and its exit hook.
pub struct ExitBinding {
    engine: Rc<dyn RouterEngine>,
    state_name: String,
    bound: RefCell<Option<Bound>>,
}

impl ExitBinding {
    /// Create a binding scoped to transitions exiting `state_name`.
    #[must_use]
    pub fn new(engine: Rc<dyn RouterEngine>, state_name: impl Into<String>) -> Self {
        Self {
            engine,
            state_name: state_name.into(),
            bound: RefCell::new(None),
        }
    }

    /// State this binding guards.
    #[must_use]
    pub fn state_name(&self) -> &str {
        &self.state_name
    }

    /// Bind `instance` as the current occupant.
    ///
    /// Idempotent when the instance is unchanged. Otherwise the previous
    /// hook is released first, then a fresh before-hook scoped to
    /// `{exiting: state}` is installed. The hook holds the instance
    /// weakly: if the instance is gone by the time a transition runs,
    /// the veto allows.
    pub fn rebind(&self, instance: &Rc<dyn ExitAware>) {
        let identity = Rc::as_ptr(instance).cast::<()>();
        if let Some(bound) = &*self.bound.borrow()
            && bound.instance == identity
        {
            return;
        }

        self.release();
        let weak: Weak<dyn ExitAware> = Rc::downgrade(instance);
        let dereg = self.engine.transitions().on_before(
            HookCriteria {
                exiting: Some(self.state_name.clone()),
            },
            Rc::new(move |transition| match weak.upgrade() {
                Some(instance) => instance.can_exit(transition),
                None => HookResult::Allow,
            }),
        );
        debug!(state = %self.state_name, "exit hook bound");
        *self.bound.borrow_mut() = Some(Bound {
            instance: identity,
            dereg,
        });
    }

    /// Record that the current occupant exposes no exit callback.
    /// Releases any previously installed hook.
    pub fn rebind_inert(&self) {
        self.release();
    }

    fn release(&self) {
        if let Some(bound) = self.bound.borrow_mut().take() {
            bound.dereg.call();
            debug!(state = %self.state_name, "exit hook released");
        }
    }
}

impl Drop for ExitBinding {
    fn drop(&mut self) {
        self.release();
    }
}

impl std::fmt::Debug for ExitBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExitBinding")
            .field("state", &self.state_name)
            .field("bound", &self.bound.borrow().is_some())
            .finish()
    }
}
