//! Active-state aggregation.
//!
//! An [`ActiveGroup`] collects (state, params) interests registered by
//! descendant links, subscribes once to the engine's transition-success
//! stream, and recomputes on every success whether any interest is
//! active (`includes` semantics) or exactly active (`is` semantics).
//! The aggregate flag drives class merging; groups nest independently,
//! so a link inside two groups contributes to both and receives both
//! active classes when both match.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use ahash::AHashMap;
use tracing::{debug, trace};
use trailhead_core::engine::{Deregister, RouterEngine};
use trailhead_core::params::Params;
use trailhead_core::reactive::{Signal, Subscription};
use trailhead_core::transition::HookCriteria;

use crate::address::{ViewportAddress, resolve_target};
use crate::scope::Scope;

/// Merge `class` into an existing space-separated class list without
/// duplicating tokens already present.
#[must_use]
pub fn merge_class(existing: &str, class: &str) -> String {
    let mut merged: Vec<&str> = existing.split_whitespace().collect();
    for token in class.split_whitespace() {
        if !merged.contains(&token) {
            merged.push(token);
        }
    }
    merged.join(" ")
}

struct ActiveEntry {
    state: String,
    params: Params,
}

struct ActiveShared {
    engine: Rc<dyn RouterEngine>,
    viewport: Option<ViewportAddress>,
    class: String,
    exact: bool,
    entries: RefCell<AHashMap<u64, ActiveEntry>>,
    next_token: Cell<u64>,
    active: Signal<bool>,
    success_sub: RefCell<Option<Deregister>>,
}

impl ActiveShared {
    /// Subscribe to transition successes. Deferred to the first
    /// registration so an empty group costs the engine nothing.
    fn ensure_subscribed(self: &Rc<Self>) {
        if self.success_sub.borrow().is_some() {
            return;
        }
        let weak = Rc::downgrade(self);
        let sub = self.engine.transitions().on_success(
            HookCriteria::default(),
            Rc::new(move |_transition| {
                if let Some(shared) = weak.upgrade() {
                    shared.recompute();
                }
            }),
        );
        *self.success_sub.borrow_mut() = Some(sub);
    }

    fn register(self: &Rc<Self>, state: String, params: Params) -> Deregister {
        self.ensure_subscribed();
        let token = self.next_token.get();
        self.next_token.set(token + 1);
        debug!(class = %self.class, state = %state, token, "active interest registered");
        self.entries
            .borrow_mut()
            .insert(token, ActiveEntry { state, params });
        self.recompute();

        let weak = Rc::downgrade(self);
        Deregister::new(move || {
            if let Some(shared) = weak.upgrade() {
                shared.entries.borrow_mut().remove(&token);
                shared.recompute();
            }
        })
    }

    fn recompute(&self) {
        let states = self.engine.states();
        let any_active = self.entries.borrow().values().any(|entry| {
            let name = self.canonical(&entry.state);
            if self.exact {
                states.is(&name, &entry.params)
            } else {
                states.includes(&name, &entry.params)
            }
        });
        trace!(class = %self.class, active = any_active, "active state recomputed");
        self.active.set(any_active);
    }

    /// Resolve a relative interest (leading `.`) against the enclosing
    /// viewport's context before matching. Absolute names pass through,
    /// as do relative names that cannot be resolved yet.
    fn canonical(&self, name: &str) -> String {
        if !name.starts_with('.') {
            return name.to_string();
        }
        resolve_target(&*self.engine.registry(), name, self.viewport.as_ref())
            .map_or_else(|| name.to_string(), |state| state.name().to_string())
    }
}

/// Registration hook handed to descendant links through the [`Scope`].
///
/// Holds the group weakly: registering against an unmounted group is a
/// safe no-op.
#[derive(Clone)]
pub struct ActiveHook {
    shared: Weak<ActiveShared>,
}

impl ActiveHook {
    /// Register one (state, params) interest; the returned guard removes
    /// exactly that interest.
    #[must_use]
    pub fn register(&self, state: String, params: Params) -> Deregister {
        match self.shared.upgrade() {
            Some(shared) => shared.register(state, params),
            None => Deregister::noop(),
        }
    }
}

impl std::fmt::Debug for ActiveHook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActiveHook")
            .field("live", &(self.shared.strong_count() > 0))
            .finish()
    }
}

/// Aggregates descendant link interests into one active flag and an
/// active class.
///
/// Dropping the group releases its transition-success subscription and
/// inerts all outstanding hooks.
pub struct ActiveGroup {
    shared: Rc<ActiveShared>,
}

impl ActiveGroup {
    /// Mount a group using descendant-inclusive matching (`includes`).
    #[must_use]
    pub fn mount(scope: &Scope, class: impl Into<String>) -> Self {
        Self::mount_inner(scope, class.into(), false)
    }

    /// Mount a group using exact matching (`is`): descendant states do
    /// not count as active.
    #[must_use]
    pub fn mount_exact(scope: &Scope, class: impl Into<String>) -> Self {
        Self::mount_inner(scope, class.into(), true)
    }

    fn mount_inner(scope: &Scope, class: String, exact: bool) -> Self {
        Self {
            shared: Rc::new(ActiveShared {
                engine: Rc::clone(scope.engine()),
                viewport: scope.viewport().cloned(),
                class,
                exact,
                entries: RefCell::new(AHashMap::new()),
                next_token: Cell::new(1),
                active: Signal::new(false),
                success_sub: RefCell::new(None),
            }),
        }
    }

    /// The composition scope for descendants, with this group's hook
    /// stacked on top of any enclosing groups.
    #[must_use]
    pub fn scope(&self, parent: &Scope) -> Scope {
        parent.with_aggregator(self.hook())
    }

    /// This group's registration hook.
    #[must_use]
    pub fn hook(&self) -> ActiveHook {
        ActiveHook {
            shared: Rc::downgrade(&self.shared),
        }
    }

    /// Register one (state, params) interest directly.
    #[must_use]
    pub fn add_state_info(&self, state: impl Into<String>, params: Params) -> Deregister {
        self.shared.register(state.into(), params)
    }

    /// Whether any registered interest is currently active.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.shared.active.get()
    }

    /// Subscribe to changes of the aggregate active flag.
    #[must_use]
    pub fn on_active_changed(&self, callback: impl Fn(&bool) + 'static) -> Subscription {
        self.shared.active.subscribe(callback)
    }

    /// Merge this group's active class into `existing` when active;
    /// otherwise pass `existing` through unchanged.
    #[must_use]
    pub fn apply_class(&self, existing: &str) -> String {
        if self.is_active() {
            merge_class(existing, &self.shared.class)
        } else {
            existing.to_string()
        }
    }
}

impl std::fmt::Debug for ActiveGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActiveGroup")
            .field("class", &self.shared.class)
            .field("exact", &self.shared.exact)
            .field("entries", &self.shared.entries.borrow().len())
            .field("active", &self.is_active())
            .finish()
    }
}
