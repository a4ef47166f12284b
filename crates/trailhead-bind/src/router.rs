//! Root provider: one `Router` per engine instance.
//!
//! The router bootstraps the engine, hands out the root [`Scope`], and
//! owns the mutable registries the binding layer needs: the monotonic
//! viewport id counter (ids are never reused within a router's lifetime,
//! so a remounted placeholder can always be told apart from its
//! predecessor) and the set of live viewport fqns (at most one viewport
//! per fqn may be registered at any instant).
//!
//! Owning these per router instance, not process-wide, lets multiple
//! independent engines coexist in one process.

use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use std::rc::Rc;

use tracing::debug;
use trailhead_core::engine::RouterEngine;
use trailhead_core::error::{BindError, Result};

use crate::scope::Scope;

/// Root provider tying the binding layer to one engine instance.
pub struct Router {
    engine: Rc<dyn RouterEngine>,
    next_viewport_id: Cell<u64>,
    live_fqns: RefCell<HashSet<String, ahash::RandomState>>,
}

impl Router {
    /// Bootstrap `engine` (starting URL synchronization) and return the
    /// root provider.
    #[must_use]
    pub fn new(engine: Rc<dyn RouterEngine>) -> Rc<Self> {
        engine.start();
        debug!("router started");
        Rc::new(Self {
            engine,
            next_viewport_id: Cell::new(1),
            live_fqns: RefCell::new(HashSet::default()),
        })
    }

    /// The engine this router wraps.
    #[must_use]
    pub fn engine(&self) -> &Rc<dyn RouterEngine> {
        &self.engine
    }

    /// The root composition scope: no enclosing viewport, no aggregators.
    #[must_use]
    pub fn scope(self: &Rc<Self>) -> Scope {
        Scope::root(Rc::clone(self))
    }

    /// Allocate the next viewport id. Monotonic; never reused.
    pub(crate) fn next_viewport_id(&self) -> u64 {
        let id = self.next_viewport_id.get();
        self.next_viewport_id.set(id + 1);
        id
    }

    /// Claim an fqn for a mounting viewport.
    pub(crate) fn claim_fqn(&self, fqn: &str) -> Result<()> {
        if !self.live_fqns.borrow_mut().insert(fqn.to_string()) {
            return Err(BindError::DuplicateViewport {
                fqn: fqn.to_string(),
            });
        }
        Ok(())
    }

    /// Release an fqn on unmount.
    pub(crate) fn release_fqn(&self, fqn: &str) {
        self.live_fqns.borrow_mut().remove(fqn);
    }
}

impl std::fmt::Debug for Router {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Router")
            .field("next_viewport_id", &self.next_viewport_id.get())
            .field("live_viewports", &self.live_fqns.borrow().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::StubEngine;

    #[test]
    fn new_starts_the_engine() {
        let stub = StubEngine::new();
        let _router = Router::new(stub.as_engine());
        assert!(stub.started());
    }

    #[test]
    fn viewport_ids_are_monotonic() {
        let stub = StubEngine::new();
        let router = Router::new(stub.as_engine());
        let a = router.next_viewport_id();
        let b = router.next_viewport_id();
        assert!(b > a);
    }

    #[test]
    fn fqn_claims_are_exclusive_until_released() {
        let stub = StubEngine::new();
        let router = Router::new(stub.as_engine());
        router.claim_fqn("$default").unwrap();
        assert_eq!(
            router.claim_fqn("$default"),
            Err(BindError::DuplicateViewport {
                fqn: "$default".into()
            })
        );
        router.release_fqn("$default");
        router.claim_fqn("$default").unwrap();
    }
}
