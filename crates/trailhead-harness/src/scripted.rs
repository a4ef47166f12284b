//! The scripted engine implementation.

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, BTreeSet};
use std::rc::Rc;

use serde_json::Value;
use tracing::{debug, trace};
use trailhead_core::config::{Component, Resolvable, ViewConfig};
use trailhead_core::engine::{
    ActiveViewport, ConfigCallback, Deregister, RouterEngine, StateRegistry, StateService,
    TransitionService, ViewService,
};
use trailhead_core::error::{BindError, Result};
use trailhead_core::params::{Params, params_match};
use trailhead_core::state::StateRef;
use trailhead_core::transition::{
    BeforeHook, HookCriteria, SuccessHook, TransitionHandle, TransitionOptions, TransitionOutcome,
};

/// Declarative description of one state for the scripted engine.
#[derive(Clone, Debug)]
pub struct StateSpec {
    name: String,
    url: String,
    views: Vec<(String, Component)>,
    resolves: Vec<(String, Value)>,
    opaque: Vec<(u64, Value)>,
}

impl StateSpec {
    /// A state at `name` (dot-separated) with a URL segment template.
    /// `:param` segments are substituted from transition params.
    #[must_use]
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            views: Vec::new(),
            resolves: Vec::new(),
            opaque: Vec::new(),
        }
    }

    /// Target `component` at the viewport with the given fqn.
    #[must_use]
    pub fn view(mut self, fqn: impl Into<String>, component: Component) -> Self {
        self.views.push((fqn.into(), component));
        self
    }

    /// Declare a resolved data value available to this state's views.
    #[must_use]
    pub fn resolve(mut self, token: impl Into<String>, value: Value) -> Self {
        self.resolves.push((token.into(), value));
        self
    }

    /// Declare an engine-internal resolvable with a non-string token.
    #[must_use]
    pub fn opaque_resolve(mut self, token: u64, value: Value) -> Self {
        self.opaque.push((token, value));
        self
    }
}

struct StateDecl {
    state: StateRef,
    url: String,
    views: Vec<(String, Component)>,
    resolves: Vec<(String, Value)>,
    opaque: Vec<(u64, Value)>,
}

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

/// Ancestor chain of a dot-separated name, shallowest first, including
/// the name itself.
fn path_of(name: &str) -> Vec<String> {
    let mut path = Vec::new();
    let mut end = 0;
    for segment in name.split('.') {
        end += segment.len();
        path.push(name[..end].to_string());
        end += 1; // the dot
    }
    path
}

fn is_or_ancestor_of(candidate: &str, name: &str) -> bool {
    name == candidate || name.starts_with(&format!("{candidate}."))
}

#[derive(Default)]
struct EngineInner {
    started: Cell<bool>,
    states: RefCell<BTreeMap<String, StateDecl>>,
    futures: RefCell<BTreeSet<String>>,
    current: RefCell<Option<(StateRef, Params)>>,
    viewports: Registry<(String, ConfigCallback)>,
    before: Registry<(HookCriteria, BeforeHook)>,
    success: Registry<(HookCriteria, SuccessHook)>,
    states_changed: Registry<Rc<dyn Fn()>>,
    next_id: Cell<u64>,
}

impl EngineInner {
    fn fresh_id(&self) -> u64 {
        let id = self.next_id.get() + 1;
        self.next_id.set(id);
        id
    }

    fn resolve_name(&self, name: &str, relative: Option<&StateRef>) -> String {
        if name.starts_with('.') {
            let base = relative.map_or_else(String::new, |s| s.name().to_string());
            format!("{base}{name}")
        } else {
            name.to_string()
        }
    }

    /// States exited when moving from the current state to `target`,
    /// deepest first.
    fn exiting_states(&self, target: &str) -> Vec<String> {
        let Some((current, _)) = &*self.current.borrow() else {
            return Vec::new();
        };
        path_of(current.name())
            .into_iter()
            .rev()
            .filter(|ancestor| !is_or_ancestor_of(ancestor, target))
            .collect()
    }

    fn criteria_matches(criteria: &HookCriteria, exiting: &[String]) -> bool {
        match &criteria.exiting {
            None => true,
            Some(state) => exiting.iter().any(|name| name == state),
        }
    }

    /// Build the config for one viewport out of the entered path, or
    /// `None` when no state on the path targets it. The deepest
    /// targeting state wins.
    fn config_for(&self, fqn: &str, target: &str, handle: &TransitionHandle) -> Option<ViewConfig> {
        let states = self.states.borrow();
        path_of(target)
            .into_iter()
            .rev()
            .find_map(|name| {
                let decl = states.get(&name)?;
                let component = decl
                    .views
                    .iter()
                    .find(|(view_fqn, _)| view_fqn == fqn)
                    .map(|(_, component)| component.clone())?;
                let mut resolvables: Vec<Resolvable> = decl
                    .resolves
                    .iter()
                    .map(|(token, value)| Resolvable::data(token.clone(), value.clone()))
                    .collect();
                resolvables.extend(
                    decl.opaque
                        .iter()
                        .map(|(token, value)| Resolvable::opaque(*token, value.clone())),
                );
                resolvables.push(Resolvable::transition(handle.clone()));
                Some(ViewConfig {
                    state: decl.state.clone(),
                    component: Some(component),
                    resolvables,
                })
            })
    }

    fn notify_states_changed(&self) {
        for callback in snapshot(&self.states_changed) {
            callback();
        }
    }
}

impl ViewService for EngineInner {
    fn register_viewport(&self, viewport: ActiveViewport) -> Deregister {
        let entry_id = self.fresh_id();
        debug!(id = viewport.id, fqn = %viewport.fqn, "viewport registered with engine");
        self.viewports
            .borrow_mut()
            .push((entry_id, (viewport.fqn, viewport.config_updated)));
        deregister_from(&self.viewports, entry_id)
    }
}

impl StateService for EngineInner {
    fn go(
        &self,
        to: &str,
        params: &Params,
        options: &TransitionOptions,
    ) -> Result<TransitionHandle> {
        let resolved = self.resolve_name(to, options.relative.as_ref());
        let target_state = self
            .states
            .borrow()
            .get(&resolved)
            .map(|decl| decl.state.clone())
            .ok_or_else(|| BindError::UnknownState {
                name: resolved.clone(),
            })?;

        let handle = TransitionHandle::new(self.fresh_id(), resolved.clone(), params.clone());
        let exiting = self.exiting_states(&resolved);

        for (criteria, hook) in snapshot(&self.before) {
            if Self::criteria_matches(&criteria, &exiting) && !hook(&handle).allows() {
                trace!(to = %resolved, "transition vetoed");
                handle.settle(TransitionOutcome::Aborted);
                return Ok(handle);
            }
        }

        *self.current.borrow_mut() = Some((target_state, params.clone()));
        handle.settle(TransitionOutcome::Success);
        trace!(to = %resolved, id = handle.id(), "transition succeeded");

        for (fqn, callback) in snapshot(&self.viewports) {
            callback(self.config_for(&fqn, &resolved, &handle))?;
        }
        for (criteria, hook) in snapshot(&self.success) {
            if Self::criteria_matches(&criteria, &exiting) {
                hook(&handle);
            }
        }
        Ok(handle)
    }

    fn href(&self, to: &str, params: &Params, options: &TransitionOptions) -> Option<String> {
        let resolved = self.resolve_name(to, options.relative.as_ref());
        let states = self.states.borrow();
        states.get(&resolved)?;

        let mut url = String::new();
        for name in path_of(&resolved) {
            url.push_str(&states.get(&name).map_or(String::new(), |decl| {
                substitute_params(&decl.url, params)
            }));
        }
        Some(url)
    }

    fn is(&self, name: &str, params: &Params) -> bool {
        self.current
            .borrow()
            .as_ref()
            .is_some_and(|(current, current_params)| {
                current.name() == name && params_match(params, current_params)
            })
    }

    fn includes(&self, name: &str, params: &Params) -> bool {
        self.current
            .borrow()
            .as_ref()
            .is_some_and(|(current, current_params)| {
                is_or_ancestor_of(name, current.name()) && params_match(params, current_params)
            })
    }
}

impl StateRegistry for EngineInner {
    fn get(&self, name: &str, context: Option<&StateRef>) -> Option<StateRef> {
        let resolved = self.resolve_name(name, context);
        self.states
            .borrow()
            .get(&resolved)
            .map(|decl| decl.state.clone())
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

impl TransitionService for EngineInner {
    fn on_before(&self, criteria: HookCriteria, callback: BeforeHook) -> Deregister {
        let entry_id = self.fresh_id();
        self.before
            .borrow_mut()
            .push((entry_id, (criteria, callback)));
        deregister_from(&self.before, entry_id)
    }

    fn on_success(&self, criteria: HookCriteria, callback: SuccessHook) -> Deregister {
        let entry_id = self.fresh_id();
        self.success
            .borrow_mut()
            .push((entry_id, (criteria, callback)));
        deregister_from(&self.success, entry_id)
    }
}

impl RouterEngine for EngineInner {
    fn start(&self) {
        self.started.set(true);
        debug!("scripted engine started");
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

/// Substitute `:param` segments of a URL template from `params`.
/// Unknown params are left in place.
fn substitute_params(template: &str, params: &Params) -> String {
    let mut url = String::new();
    for (index, segment) in template.split('/').enumerate() {
        if index > 0 {
            url.push('/');
        }
        match segment.strip_prefix(':').and_then(|key| params.get(key)) {
            Some(Value::String(s)) => url.push_str(s),
            Some(value) => url.push_str(&value.to_string()),
            None => url.push_str(segment),
        }
    }
    url
}

/// Scripted in-memory routing engine.
///
/// Cloning shares the same engine; [`engine()`](Self::engine) hands the
/// trait-object form to [`trailhead_bind::Router`]-style consumers.
#[derive(Clone, Default)]
pub struct ScriptedRouter {
    inner: Rc<EngineInner>,
}

impl ScriptedRouter {
    /// An engine with no states registered.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Trait-object handle for the binding layer.
    #[must_use]
    pub fn engine(&self) -> Rc<dyn RouterEngine> {
        Rc::clone(&self.inner) as Rc<dyn RouterEngine>
    }

    /// Consume into the trait-object handle.
    #[must_use]
    pub fn into_engine(self) -> Rc<dyn RouterEngine> {
        self.inner as Rc<dyn RouterEngine>
    }

    /// Whether `start()` has been called.
    #[must_use]
    pub fn started(&self) -> bool {
        self.inner.started.get()
    }

    /// Register a concrete state and notify states-changed subscribers.
    /// Replaces any future pattern reserving the same subtree.
    pub fn add_state(&self, spec: StateSpec) {
        let StateSpec {
            name,
            url,
            views,
            resolves,
            opaque,
        } = spec;
        self.inner
            .futures
            .borrow_mut()
            .retain(|prefix| !is_or_ancestor_of(prefix, &name));
        self.inner.states.borrow_mut().insert(
            name.clone(),
            StateDecl {
                state: StateRef::new(name),
                url,
                views,
                resolves,
                opaque,
            },
        );
        self.inner.notify_states_changed();
    }

    /// Reserve a lazy-loaded subtree with a `name.**` pattern. The
    /// subtree stays non-concrete (no href, no `go`) until real states
    /// replace it via [`add_state`](Self::add_state).
    pub fn add_future_state(&self, pattern: &str) {
        let prefix = pattern.strip_suffix(".**").unwrap_or(pattern);
        self.inner.futures.borrow_mut().insert(prefix.to_string());
        self.inner.notify_states_changed();
    }

    /// Whether `name` falls under a reserved future pattern.
    #[must_use]
    pub fn is_future(&self, name: &str) -> bool {
        self.inner
            .futures
            .borrow()
            .iter()
            .any(|prefix| is_or_ancestor_of(prefix, name))
    }

    /// Name of the current state, if any transition has succeeded.
    #[must_use]
    pub fn current_state(&self) -> Option<String> {
        self.inner
            .current
            .borrow()
            .as_ref()
            .map(|(state, _)| state.name().to_string())
    }

    /// Number of live viewport registrations.
    #[must_use]
    pub fn viewport_count(&self) -> usize {
        self.inner.viewports.borrow().len()
    }

    /// Number of live before-hook registrations.
    #[must_use]
    pub fn before_hook_count(&self) -> usize {
        self.inner.before.borrow().len()
    }

    /// Number of live success-hook registrations.
    #[must_use]
    pub fn success_hook_count(&self) -> usize {
        self.inner.success.borrow().len()
    }
}

impl std::fmt::Debug for ScriptedRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptedRouter")
            .field("states", &self.inner.states.borrow().len())
            .field("current", &self.current_state())
            .field("viewports", &self.viewport_count())
            .finish()
    }
}
