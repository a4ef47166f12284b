//! Transition handles, options, and lifecycle hook types.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use crate::params::Params;
use crate::state::StateRef;

/// Settlement state of a transition. The engine owns settlement; the
/// binding layer only triggers transitions and reads the outcome.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransitionOutcome {
    /// Still in flight (or superseded without settlement).
    Pending,
    /// The transition completed and the target state is now current.
    Success,
    /// A before-hook vetoed the transition or the engine aborted it.
    Aborted,
}

struct TransitionInner {
    id: u64,
    to: String,
    params: Params,
    outcome: Cell<TransitionOutcome>,
}

/// Opaque handle to one unit of navigation work.
///
/// Cloning shares the same underlying transition; equality is by
/// transition identity, not by target.
#[derive(Clone)]
pub struct TransitionHandle {
    inner: Rc<TransitionInner>,
}

impl TransitionHandle {
    /// Create a pending transition. Engines construct these; the binding
    /// layer only reads them.
    #[must_use]
    pub fn new(id: u64, to: impl Into<String>, params: Params) -> Self {
        Self {
            inner: Rc::new(TransitionInner {
                id,
                to: to.into(),
                params,
                outcome: Cell::new(TransitionOutcome::Pending),
            }),
        }
    }

    /// Engine-assigned transition id, unique per engine instance.
    #[must_use]
    pub fn id(&self) -> u64 {
        self.inner.id
    }

    /// Canonical name of the target state.
    #[must_use]
    pub fn to(&self) -> &str {
        &self.inner.to
    }

    /// Parameters the transition was started with.
    #[must_use]
    pub fn params(&self) -> &Params {
        &self.inner.params
    }

    /// Current settlement state.
    #[must_use]
    pub fn outcome(&self) -> TransitionOutcome {
        self.inner.outcome.get()
    }

    /// Settle the transition. Called by the engine exactly once.
    pub fn settle(&self, outcome: TransitionOutcome) {
        self.inner.outcome.set(outcome);
    }
}

impl PartialEq for TransitionHandle {
    fn eq(&self, other: &Self) -> bool {
        self.inner.id == other.inner.id
    }
}

impl Eq for TransitionHandle {}

impl fmt::Debug for TransitionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransitionHandle")
            .field("id", &self.inner.id)
            .field("to", &self.inner.to)
            .field("outcome", &self.inner.outcome.get())
            .finish()
    }
}

/// Options accompanying `go`/`href` calls.
///
/// `relative` anchors resolution of leading-dot target names; `inherit`
/// defaults to `true` when unset (current params flow into the target).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TransitionOptions {
    /// Anchor state for relative target names.
    pub relative: Option<StateRef>,
    /// Whether current params are inherited. `None` means "engine default",
    /// which the link resolver pins to `true`.
    pub inherit: Option<bool>,
    /// Force re-entry of the target state even if already current.
    pub reload: bool,
}

/// Match criteria for transition lifecycle hooks.
///
/// An empty criteria matches every transition. `exiting` matches
/// transitions that exit the named state.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HookCriteria {
    /// Name of a state that must be exited for the hook to fire.
    pub exiting: Option<String>,
}

/// Result of a before-transition hook. Forwarded to the engine
/// unmodified; the engine interprets `Block` as a veto.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HookResult {
    /// Let the transition proceed.
    Allow,
    /// Veto the transition; the previously active state stays current.
    Block,
}

impl HookResult {
    /// Whether the transition may proceed.
    #[must_use]
    pub fn allows(self) -> bool {
        matches!(self, Self::Allow)
    }
}

/// Callback invoked before a matching transition runs.
pub type BeforeHook = Rc<dyn Fn(&TransitionHandle) -> HookResult>;

/// Callback invoked after a matching transition succeeds.
pub type SuccessHook = Rc<dyn Fn(&TransitionHandle)>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handle_starts_pending_and_settles() {
        let t = TransitionHandle::new(1, "home", Params::new());
        assert_eq!(t.outcome(), TransitionOutcome::Pending);
        t.settle(TransitionOutcome::Success);
        assert_eq!(t.outcome(), TransitionOutcome::Success);
    }

    #[test]
    fn clones_share_settlement() {
        let t = TransitionHandle::new(2, "home", Params::new());
        let t2 = t.clone();
        t.settle(TransitionOutcome::Aborted);
        assert_eq!(t2.outcome(), TransitionOutcome::Aborted);
        assert_eq!(t, t2);
    }

    #[test]
    fn equality_is_by_id() {
        let a = TransitionHandle::new(3, "a", Params::new());
        let b = TransitionHandle::new(4, "a", Params::new());
        assert_ne!(a, b);
    }

    #[test]
    fn default_options_leave_inherit_unset() {
        let opts = TransitionOptions::default();
        assert!(opts.relative.is_none());
        assert_eq!(opts.inherit, None);
        assert!(!opts.reload);
    }
}
