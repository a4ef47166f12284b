//! Navigation link resolution.
//!
//! A [`Link`] computes a navigable href for a (possibly relative) target
//! state and exposes a click handler that triggers the transition. The
//! href is recomputed when the engine's registered-state set changes
//! (lazy-loaded future states becoming concrete), or when params or
//! options change by deep structural comparison — never on mere
//! reference churn.
//!
//! On mount the link registers its resolved target with every ancestor
//! active-state aggregator; the interests are re-registered with the
//! new values whenever params or options change structurally, and
//! released exactly once on unmount.

use std::cell::RefCell;
use std::rc::Rc;

use tracing::trace;
use trailhead_core::engine::{Deregister, RouterEngine};
use trailhead_core::error::{BindError, Result};
use trailhead_core::params::Params;
use trailhead_core::transition::{TransitionHandle, TransitionOptions};

use crate::active::ActiveHook;
use crate::address::ViewportAddress;
use crate::memo::DeepMemo;
use crate::scope::Scope;

/// Activation event fed to [`Link::click`].
///
/// Mirrors the pointer semantics links must respect: a handled event, a
/// modifier click, or a non-default anchor target leaves navigation to
/// the host and does not trigger a transition.
#[derive(Clone, Debug, Default)]
pub struct LinkEvent {
    /// A prior handler already consumed the event.
    pub default_prevented: bool,
    /// Middle-button activation (open in new surface).
    pub middle_button: bool,
    /// Ctrl held during activation.
    pub ctrl: bool,
    /// Meta/command held during activation.
    pub meta: bool,
    /// Anchor `target` attribute, when the host rendered one.
    pub anchor_target: Option<String>,
}

impl LinkEvent {
    /// A plain primary-button activation with no modifiers.
    #[must_use]
    pub fn plain() -> Self {
        Self::default()
    }

    fn defers_to_host(&self) -> bool {
        if self.default_prevented || self.middle_button || self.ctrl || self.meta {
            return true;
        }
        self.anchor_target
            .as_deref()
            .is_some_and(|target| target != "_self")
    }
}

struct LinkShared {
    engine: Rc<dyn RouterEngine>,
    viewport: Option<ViewportAddress>,
    to: String,
    params: RefCell<Params>,
    options: RefCell<TransitionOptions>,
    href: RefCell<Option<String>>,
}

impl LinkShared {
    /// Options with `relative` anchored at the enclosing viewport and
    /// `inherit` pinned to the engine default of `true`, unless the
    /// caller overrode either.
    fn effective_options(&self) -> TransitionOptions {
        let options = self.options.borrow();
        TransitionOptions {
            relative: options.relative.clone().or_else(|| {
                self.viewport
                    .as_ref()
                    .and_then(ViewportAddress::context)
            }),
            inherit: Some(options.inherit.unwrap_or(true)),
            reload: options.reload,
        }
    }

    fn recompute_href(&self) {
        let href = self.engine.states().href(
            &self.to,
            &self.params.borrow(),
            &self.effective_options(),
        );
        trace!(to = %self.to, href = ?href, "link href recomputed");
        *self.href.borrow_mut() = href;
    }

    /// Canonical name of the target, for active-interest registration.
    /// Anchored at the effective relative context; falls back to the
    /// literal target when the engine cannot resolve it yet.
    fn resolved_name(&self) -> String {
        let context = self.effective_options().relative;
        self.engine
            .registry()
            .get(&self.to, context.as_ref())
            .map_or_else(|| self.to.clone(), |state| state.name().to_string())
    }
}

/// A mounted navigation link.
///
/// Dropping it releases the states-changed subscription and every
/// aggregator interest exactly once.
pub struct Link {
    shared: Rc<LinkShared>,
    hooks: Vec<ActiveHook>,
    interests: RefCell<Vec<Deregister>>,
    params_memo: RefCell<DeepMemo<Params>>,
    options_memo: RefCell<DeepMemo<TransitionOptions>>,
    _states_sub: Deregister,
}

impl Link {
    /// Mount a link targeting `to` (possibly relative to the enclosing
    /// viewport's context).
    ///
    /// A blank target is a configuration error raised before any engine
    /// call is made.
    pub fn mount(
        scope: &Scope,
        to: impl Into<String>,
        params: Params,
        options: TransitionOptions,
    ) -> Result<Self> {
        let to = to.into();
        if to.trim().is_empty() {
            return Err(BindError::BlankTarget);
        }

        let shared = Rc::new(LinkShared {
            engine: Rc::clone(scope.engine()),
            viewport: scope.viewport().cloned(),
            to,
            params: RefCell::new(params.clone()),
            options: RefCell::new(options.clone()),
            href: RefCell::new(None),
        });
        shared.recompute_href();

        let weak = Rc::downgrade(&shared);
        let states_sub = shared
            .engine
            .registry()
            .on_states_changed(Rc::new(move || {
                if let Some(shared) = weak.upgrade() {
                    shared.recompute_href();
                }
            }));

        let hooks: Vec<ActiveHook> = scope.aggregators().to_vec();
        let resolved = shared.resolved_name();
        let interests = hooks
            .iter()
            .map(|hook| hook.register(resolved.clone(), params.clone()))
            .collect();

        let mut params_memo = DeepMemo::new();
        let _ = params_memo.version_of(params);
        let mut options_memo = DeepMemo::new();
        let _ = options_memo.version_of(options);

        Ok(Self {
            shared,
            hooks,
            interests: RefCell::new(interests),
            params_memo: RefCell::new(params_memo),
            options_memo: RefCell::new(options_memo),
            _states_sub: states_sub,
        })
    }

    /// Replace every aggregator interest with one carrying the current
    /// resolved target and params. Fresh interests are registered before
    /// the old guards are dropped.
    fn reregister_interests(&self) {
        let resolved = self.shared.resolved_name();
        let params = self.shared.params.borrow().clone();
        let fresh: Vec<Deregister> = self
            .hooks
            .iter()
            .map(|hook| hook.register(resolved.clone(), params.clone()))
            .collect();
        *self.interests.borrow_mut() = fresh;
    }

    /// The literal target this link was mounted with.
    #[must_use]
    pub fn target(&self) -> &str {
        &self.shared.to
    }

    /// Current navigable URL, or `None` while the target is not yet
    /// concrete.
    #[must_use]
    pub fn href(&self) -> Option<String> {
        self.shared.href.borrow().clone()
    }

    /// Replace the link's params. Recomputes the href and re-registers
    /// the aggregator interests only when the new value differs
    /// structurally from the previous one.
    pub fn set_params(&self, params: Params) {
        let previous = self.params_memo.borrow().version();
        if self.params_memo.borrow_mut().version_of(params.clone()) == previous {
            return;
        }
        *self.shared.params.borrow_mut() = params;
        self.shared.recompute_href();
        self.reregister_interests();
    }

    /// Replace the link's options, with the same deep-equality gating as
    /// [`set_params`](Self::set_params). A changed `relative` anchor can
    /// shift the resolved target, so the interests are refreshed too.
    pub fn set_options(&self, options: TransitionOptions) {
        let previous = self.options_memo.borrow().version();
        if self.options_memo.borrow_mut().version_of(options.clone()) == previous {
            return;
        }
        *self.shared.options.borrow_mut() = options;
        self.shared.recompute_href();
        self.reregister_interests();
    }

    /// Handle an activation.
    ///
    /// When the event defers to the host (already handled, modifier
    /// click, or a non-default anchor target) nothing happens and `None`
    /// is returned. Otherwise the event is marked handled and the engine
    /// is asked to transition to the **literal** target string this link
    /// was mounted with.
    pub fn click(&self, event: &mut LinkEvent) -> Result<Option<TransitionHandle>> {
        if event.defers_to_host() {
            return Ok(None);
        }
        event.default_prevented = true;
        let handle = self.shared.engine.states().go(
            &self.shared.to,
            &self.shared.params.borrow(),
            &self.shared.effective_options(),
        )?;
        Ok(Some(handle))
    }
}

impl std::fmt::Debug for Link {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Link")
            .field("to", &self.shared.to)
            .field("href", &self.href())
            .finish_non_exhaustive()
    }
}
