//! The trait family an external routing engine implements, plus the
//! idempotent deregistration guard used across every registration seam.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use crate::config::ViewConfig;
use crate::error::Result;
use crate::params::Params;
use crate::state::StateRef;
use crate::transition::{
    BeforeHook, HookCriteria, SuccessHook, TransitionHandle, TransitionOptions,
};

/// Idempotent deregistration guard.
///
/// Returned from every registration entry point. [`call()`](Self::call)
/// releases the registration; a second call is a no-op. Dropping an
/// uncalled guard releases the registration too, so holding a
/// `Deregister` for the lifetime of a mount is the usual pattern.
pub struct Deregister {
    release: Cell<Option<Box<dyn FnOnce()>>>,
}

impl Deregister {
    /// Wrap a release closure.
    #[must_use]
    pub fn new(release: impl FnOnce() + 'static) -> Self {
        Self {
            release: Cell::new(Some(Box::new(release))),
        }
    }

    /// A guard that releases nothing.
    #[must_use]
    pub fn noop() -> Self {
        Self {
            release: Cell::new(None),
        }
    }

    /// Release the registration. Safe to call more than once; only the
    /// first call has an effect.
    pub fn call(&self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }

    /// Whether the registration has already been released.
    #[must_use]
    pub fn is_spent(&self) -> bool {
        // Cell<Option<..>> has no borrow-free peek; take and put back.
        let inner = self.release.take();
        let spent = inner.is_none();
        self.release.set(inner);
        spent
    }
}

impl Drop for Deregister {
    fn drop(&mut self) {
        self.call();
    }
}

impl fmt::Debug for Deregister {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Deregister")
            .field("spent", &self.is_spent())
            .finish()
    }
}

/// Callback the engine invokes when view ownership of a viewport changes.
///
/// `None` means no component targets the viewport anymore. The `Result`
/// lets a malformed configuration (reserved-token collision) surface
/// synchronously from the transition that delivered it.
pub type ConfigCallback = Rc<dyn Fn(Option<ViewConfig>) -> Result<()>>;

/// Descriptor registered with the engine for each mounted viewport.
pub struct ActiveViewport {
    /// Registry-unique id, never reused across remounts.
    pub id: u64,
    /// Viewport segment name (defaults to `$default`).
    pub name: String,
    /// Dot-joined path of ancestor viewport names.
    pub fqn: String,
    /// State that was active when the placeholder was created.
    pub creation_context: StateRef,
    /// Invoked asynchronously when view ownership changes.
    pub config_updated: ConfigCallback,
}

impl fmt::Debug for ActiveViewport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActiveViewport")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("fqn", &self.fqn)
            .field("creation_context", &self.creation_context)
            .finish_non_exhaustive()
    }
}

/// Active-viewport registration entry point.
pub trait ViewService {
    /// Register a mounted viewport. The engine later invokes the
    /// descriptor's `config_updated` callback; the returned guard must be
    /// released exactly once on unmount.
    fn register_viewport(&self, viewport: ActiveViewport) -> Deregister;
}

/// Navigation and current-state queries.
pub trait StateService {
    /// Start a transition to `to` (possibly relative, per
    /// `options.relative`). Errors from synchronous config delivery
    /// propagate; vetoes settle the returned handle as aborted instead.
    fn go(&self, to: &str, params: &Params, options: &TransitionOptions)
    -> Result<TransitionHandle>;

    /// URL for the (possibly relative) target, or `None` when the target
    /// is not yet concrete (e.g. an unresolved future state).
    fn href(&self, to: &str, params: &Params, options: &TransitionOptions) -> Option<String>;

    /// Whether `name` is exactly the current state and `params` match on
    /// overlapping keys.
    fn is(&self, name: &str, params: &Params) -> bool;

    /// Whether the current state is `name` or a descendant of it, with
    /// `params` matching on overlapping keys.
    fn includes(&self, name: &str, params: &Params) -> bool;
}

/// State definition lookups and registry-change notification.
pub trait StateRegistry {
    /// Resolve a (possibly relative) name against `context`. Returns
    /// `None` when no concrete state matches.
    fn get(&self, name: &str, context: Option<&StateRef>) -> Option<StateRef>;

    /// The engine's root state.
    fn root(&self) -> StateRef;

    /// Subscribe to registered-state-set changes (states added, removed,
    /// or future states becoming concrete).
    fn on_states_changed(&self, callback: Rc<dyn Fn()>) -> Deregister;
}

/// Transition lifecycle hook registry.
pub trait TransitionService {
    /// Register a veto hook invoked before transitions matching
    /// `criteria` run.
    fn on_before(&self, criteria: HookCriteria, callback: BeforeHook) -> Deregister;

    /// Register a callback invoked after transitions matching `criteria`
    /// succeed.
    fn on_success(&self, criteria: HookCriteria, callback: SuccessHook) -> Deregister;
}

/// Umbrella trait tying the engine services together.
pub trait RouterEngine {
    /// Bootstrap the engine and begin URL synchronization. Called once by
    /// the root provider.
    fn start(&self);

    /// Viewport registration surface.
    fn views(&self) -> &dyn ViewService;

    /// Navigation surface.
    fn states(&self) -> &dyn StateService;

    /// State definition registry.
    fn registry(&self) -> &dyn StateRegistry;

    /// Transition hook registry.
    fn transitions(&self) -> &dyn TransitionService;
}
