//! Minimal scripted engine for unit tests.
//!
//! Implements just enough of the [`RouterEngine`] contract to exercise
//! the binding layer: registrations are recorded, notifications are
//! fired manually, and current-state queries match by name prefix. The
//! full-fidelity engine lives in `trailhead-harness`.

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, BTreeSet};
use std::rc::Rc;

use trailhead_core::engine::{
    ActiveViewport, ConfigCallback, Deregister, RouterEngine, StateRegistry, StateService,
    TransitionService, ViewService,
};
use trailhead_core::error::Result;
use trailhead_core::params::{Params, params_match};
use trailhead_core::state::StateRef;
use trailhead_core::transition::{
    BeforeHook, HookCriteria, HookResult, SuccessHook, TransitionHandle, TransitionOptions,
    TransitionOutcome,
};

type Registry<T> = Rc<RefCell<Vec<(u64, T)>>>;

fn deregister_from<T: 'static>(registry: &Registry<T>, entry_id: u64) -> Deregister {
    let registry = Rc::clone(registry);
    Deregister::new(move || registry.borrow_mut().retain(|(id, _)| *id != entry_id))
}

fn snapshot<T: Clone>(registry: &Registry<T>) -> Vec<T> {
    registry
        .borrow()
        .iter()
        .map(|(_, entry)| entry.clone())
        .collect()
}

#[derive(Default)]
struct StubInner {
    started: Cell<bool>,
    states: RefCell<BTreeSet<String>>,
    hrefs: RefCell<BTreeMap<String, String>>,
    current: RefCell<Option<(String, Params)>>,
    viewports: Registry<(String, ConfigCallback)>,
    before: Registry<(HookCriteria, BeforeHook)>,
    success: Registry<SuccessHook>,
    states_changed: Registry<Rc<dyn Fn()>>,
    go_log: RefCell<Vec<(String, Params, TransitionOptions)>>,
    next_id: Cell<u64>,
    before_registrations: Cell<u32>,
    href_calls: Cell<u32>,
}

impl StubInner {
    fn fresh_id(&self) -> u64 {
        let id = self.next_id.get() + 1;
        self.next_id.set(id);
        id
    }

    fn resolve(&self, name: &str, relative: Option<&StateRef>) -> String {
        if name.starts_with('.') {
            let base = relative.map_or_else(String::new, |s| s.name().to_string());
            format!("{base}{name}")
        } else {
            name.to_string()
        }
    }

    fn fire_success(&self, handle: &TransitionHandle) {
        for hook in snapshot(&self.success) {
            hook(handle);
        }
    }
}

impl ViewService for StubInner {
    fn register_viewport(&self, viewport: ActiveViewport) -> Deregister {
        let entry_id = self.fresh_id();
        self.viewports
            .borrow_mut()
            .push((entry_id, (viewport.fqn, viewport.config_updated)));
        deregister_from(&self.viewports, entry_id)
    }
}

impl StateService for StubInner {
    fn go(
        &self,
        to: &str,
        params: &Params,
        options: &TransitionOptions,
    ) -> Result<TransitionHandle> {
        self.go_log
            .borrow_mut()
            .push((to.to_string(), params.clone(), options.clone()));
        let resolved = self.resolve(to, options.relative.as_ref());
        *self.current.borrow_mut() = Some((resolved.clone(), params.clone()));
        let handle = TransitionHandle::new(self.fresh_id(), resolved, params.clone());
        handle.settle(TransitionOutcome::Success);
        self.fire_success(&handle);
        Ok(handle)
    }

    fn href(&self, to: &str, params: &Params, options: &TransitionOptions) -> Option<String> {
        let _ = params;
        self.href_calls.set(self.href_calls.get() + 1);
        let resolved = self.resolve(to, options.relative.as_ref());
        self.hrefs.borrow().get(&resolved).cloned()
    }

    fn is(&self, name: &str, params: &Params) -> bool {
        self.current
            .borrow()
            .as_ref()
            .is_some_and(|(current, current_params)| {
                current == name && params_match(params, current_params)
            })
    }

    fn includes(&self, name: &str, params: &Params) -> bool {
        self.current
            .borrow()
            .as_ref()
            .is_some_and(|(current, current_params)| {
                (current == name || current.starts_with(&format!("{name}.")))
                    && params_match(params, current_params)
            })
    }
}

impl StateRegistry for StubInner {
    fn get(&self, name: &str, context: Option<&StateRef>) -> Option<StateRef> {
        let resolved = self.resolve(name, context);
        self.states
            .borrow()
            .contains(&resolved)
            .then(|| StateRef::new(resolved))
    }

    fn root(&self) -> StateRef {
        StateRef::new("")
    }

    fn on_states_changed(&self, callback: Rc<dyn Fn()>) -> Deregister {
        let entry_id = self.fresh_id();
        self.states_changed.borrow_mut().push((entry_id, callback));
        deregister_from(&self.states_changed, entry_id)
    }
}

impl TransitionService for StubInner {
    fn on_before(&self, criteria: HookCriteria, callback: BeforeHook) -> Deregister {
        self.before_registrations
            .set(self.before_registrations.get() + 1);
        let entry_id = self.fresh_id();
        self.before
            .borrow_mut()
            .push((entry_id, (criteria, callback)));
        deregister_from(&self.before, entry_id)
    }

    fn on_success(&self, _criteria: HookCriteria, callback: SuccessHook) -> Deregister {
        let entry_id = self.fresh_id();
        self.success.borrow_mut().push((entry_id, callback));
        deregister_from(&self.success, entry_id)
    }
}

impl RouterEngine for StubInner {
    fn start(&self) {
        self.started.set(true);
    }

    fn views(&self) -> &dyn ViewService {
        self
    }

    fn states(&self) -> &dyn StateService {
        self
    }

    fn registry(&self) -> &dyn StateRegistry {
        self
    }

    fn transitions(&self) -> &dyn TransitionService {
        self
    }
}

/// Scripted engine handle used by unit tests.
pub(crate) struct StubEngine {
    inner: Rc<StubInner>,
}

impl StubEngine {
    pub fn new() -> Self {
        Self {
            inner: Rc::new(StubInner::default()),
        }
    }

    pub fn as_engine(&self) -> Rc<dyn RouterEngine> {
        Rc::clone(&self.inner) as Rc<dyn RouterEngine>
    }

    pub fn started(&self) -> bool {
        self.inner.started.get()
    }

    pub fn root(&self) -> StateRef {
        self.inner.root()
    }

    /// Register a concrete state and notify states-changed subscribers.
    pub fn add_state(&self, name: &str) {
        self.inner.states.borrow_mut().insert(name.to_string());
        for callback in snapshot(&self.inner.states_changed) {
            callback();
        }
    }

    pub fn set_href(&self, name: &str, url: &str) {
        self.inner
            .hrefs
            .borrow_mut()
            .insert(name.to_string(), url.to_string());
    }

    pub fn set_current(&self, name: &str, params: Params) {
        *self.inner.current.borrow_mut() = Some((name.to_string(), params));
    }

    /// Fire success hooks for a synthetic transition to the current state.
    pub fn fire_success(&self) {
        let to = self
            .inner
            .current
            .borrow()
            .as_ref()
            .map_or_else(String::new, |(name, _)| name.clone());
        let handle = TransitionHandle::new(self.inner.fresh_id(), to, Params::new());
        handle.settle(TransitionOutcome::Success);
        self.inner.fire_success(&handle);
    }

    /// Deliver a view configuration to the viewport registered at `fqn`.
    pub fn fire_config(
        &self,
        fqn: &str,
        config: Option<trailhead_core::config::ViewConfig>,
    ) -> Result<()> {
        self.config_callback(fqn)(config)
    }

    /// Clone out the config callback registered at `fqn`.
    pub fn config_callback(&self, fqn: &str) -> ConfigCallback {
        self.inner
            .viewports
            .borrow()
            .iter()
            .find(|(_, (registered, _))| registered == fqn)
            .map(|(_, (_, cb))| Rc::clone(cb))
            .expect("viewport registered at fqn")
    }

    pub fn registered_fqns(&self) -> Vec<String> {
        self.inner
            .viewports
            .borrow()
            .iter()
            .map(|(_, (fqn, _))| fqn.clone())
            .collect()
    }

    pub fn success_hook_count(&self) -> usize {
        self.inner.success.borrow().len()
    }

    pub fn before_hook_count(&self) -> usize {
        self.inner.before.borrow().len()
    }

    pub fn before_hook_registrations(&self) -> u32 {
        self.inner.before_registrations.get()
    }

    pub fn before_hook_criteria(&self) -> Vec<HookCriteria> {
        self.inner
            .before
            .borrow()
            .iter()
            .map(|(_, (criteria, _))| criteria.clone())
            .collect()
    }

    /// Run every registered before-hook; `Block` wins.
    pub fn run_before_hooks(&self, transition: &TransitionHandle) -> HookResult {
        let hooks: Vec<(HookCriteria, BeforeHook)> = snapshot(&self.inner.before);
        let blocked = hooks.iter().any(|(_, hook)| !hook(transition).allows());
        if blocked {
            HookResult::Block
        } else {
            HookResult::Allow
        }
    }

    pub fn go_log(&self) -> Vec<(String, Params, TransitionOptions)> {
        self.inner.go_log.borrow().clone()
    }

    pub fn href_calls(&self) -> u32 {
        self.inner.href_calls.get()
    }
}
