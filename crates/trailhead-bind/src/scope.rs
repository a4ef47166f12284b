//! Ambient composition context, threaded explicitly.
//!
//! A [`Scope`] is an immutable snapshot of the ambient bindings visible
//! at one point of the component tree: the owning [`Router`], the
//! nearest ancestor viewport address, and the stack of active-state
//! aggregator hooks. Nesting never mutates a scope in place; each layer
//! produces a new snapshot, so a scope captured at composition time
//! stays valid for the lifetime of the component that captured it.

use std::rc::Rc;

use trailhead_core::engine::RouterEngine;

use crate::active::ActiveHook;
use crate::address::ViewportAddress;
use crate::router::Router;

/// Immutable snapshot of the ambient bindings at one tree position.
#[derive(Clone)]
pub struct Scope {
    router: Rc<Router>,
    viewport: Option<ViewportAddress>,
    aggregators: Rc<[ActiveHook]>,
}

impl Scope {
    pub(crate) fn root(router: Rc<Router>) -> Self {
        Self {
            router,
            viewport: None,
            aggregators: Rc::from([]),
        }
    }

    /// The router this scope descends from.
    #[must_use]
    pub fn router(&self) -> &Rc<Router> {
        &self.router
    }

    /// The engine behind the router.
    #[must_use]
    pub fn engine(&self) -> &Rc<dyn RouterEngine> {
        self.router.engine()
    }

    /// Nearest ancestor viewport address, if any viewport encloses this
    /// position.
    #[must_use]
    pub fn viewport(&self) -> Option<&ViewportAddress> {
        self.viewport.as_ref()
    }

    /// Active-state aggregator hooks visible here, outermost first. A
    /// link registers with every one of them.
    #[must_use]
    pub fn aggregators(&self) -> &[ActiveHook] {
        &self.aggregators
    }

    /// A child snapshot with `address` as the nearest viewport.
    #[must_use]
    pub fn with_viewport(&self, address: ViewportAddress) -> Self {
        Self {
            router: Rc::clone(&self.router),
            viewport: Some(address),
            aggregators: Rc::clone(&self.aggregators),
        }
    }

    /// A child snapshot with one more aggregator hook stacked on top.
    #[must_use]
    pub fn with_aggregator(&self, hook: ActiveHook) -> Self {
        let mut hooks: Vec<ActiveHook> = self.aggregators.to_vec();
        hooks.push(hook);
        Self {
            router: Rc::clone(&self.router),
            viewport: self.viewport.clone(),
            aggregators: Rc::from(hooks),
        }
    }
}

impl std::fmt::Debug for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scope")
            .field("viewport", &self.viewport.as_ref().map(ViewportAddress::fqn))
            .field("aggregators", &self.aggregators.len())
            .finish()
    }
}
