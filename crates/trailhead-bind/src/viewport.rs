//! Viewport registry bridge.
//!
//! A [`Viewport`] is a placeholder in the component tree that the engine
//! can target with a component. Mounting registers an active-viewport
//! descriptor with the engine exactly once; the engine later calls back
//! with view configurations, which the bridge projects into a renderable
//! `{component, props}` pair published through a [`Signal`]. Dropping
//! the viewport deregisters exactly once.
//!
//! # Stale configurations
//!
//! The engine callback holds only a `Weak` reference to the viewport's
//! shared state. A configuration arriving after unmount (or between
//! unmount and a remount, which gets a fresh id and fresh shared state)
//! is dropped silently.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::Rc;

use serde_json::Value;
use tracing::{debug, trace};
use trailhead_core::config::{
    Component, ResolveToken, ResolveValue, Resolvable, TRANSITION_TOKEN, ViewConfig, ViewProps,
};
use trailhead_core::engine::{ActiveViewport, Deregister};
use trailhead_core::error::{BindError, Result};
use trailhead_core::reactive::{Signal, Subscription};
use trailhead_core::transition::TransitionHandle;

use crate::address::{DEFAULT_VIEWPORT, ViewportAddress};
use crate::exit::{ExitAware, ExitBinding};
use crate::router::Router;
use crate::scope::Scope;

/// Caller-supplied presentation options for a viewport placeholder.
#[derive(Clone, Debug, Default)]
pub struct ViewportOptions {
    /// Viewport segment name; defaults to `$default`.
    pub name: Option<String>,
    /// Class list merged into every rendered view's props.
    pub class_name: Option<String>,
    /// Inline style merged into every rendered view's props.
    pub style: Option<String>,
}

/// The renderable projection of the current view configuration.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderedView {
    /// Render target; the neutral placeholder when nothing targets the
    /// viewport.
    pub component: Component,
    /// Props computed from the configuration's resolvable path.
    pub props: ViewProps,
}

impl RenderedView {
    fn empty(class_name: Option<&str>, style: Option<&str>) -> Self {
        Self {
            component: Component::empty(),
            props: ViewProps {
                resolves: BTreeMap::new(),
                transition: None,
                class_name: class_name.map(str::to_string),
                style: style.map(str::to_string),
            },
        }
    }
}

struct ViewportShared {
    mounted: Cell<bool>,
    address: ViewportAddress,
    class_name: Option<String>,
    style: Option<String>,
    rendered: Signal<RenderedView>,
}

impl ViewportShared {
    fn apply_config(&self, config: Option<ViewConfig>) -> Result<()> {
        let rendered = match config {
            None => {
                trace!(fqn = self.address.fqn(), "viewport cleared");
                RenderedView::empty(self.class_name.as_deref(), self.style.as_deref())
            }
            Some(config) => {
                self.address.set_context(config.state.clone());
                let (resolves, transition) =
                    split_resolvables(&config.resolvables, self.address.fqn())?;
                trace!(
                    fqn = self.address.fqn(),
                    state = config.state.name(),
                    "viewport config updated"
                );
                RenderedView {
                    component: config.component.unwrap_or_else(Component::empty),
                    props: ViewProps {
                        resolves,
                        transition,
                        class_name: self.class_name.clone(),
                        style: self.style.clone(),
                    },
                }
            }
        };
        self.rendered.set(rendered);
        Ok(())
    }
}

/// Project a configuration's resolvable path into view props.
///
/// Opaque tokens are skipped. The distinguished `"transition"` entry is
/// split out; a data resolve reusing that token name, or a second
/// transition entry, is a configuration error.
fn split_resolvables(
    resolvables: &[Resolvable],
    fqn: &str,
) -> Result<(BTreeMap<String, Value>, Option<TransitionHandle>)> {
    let mut resolves = BTreeMap::new();
    let mut transition = None;
    for resolvable in resolvables {
        let ResolveToken::Name(token) = &resolvable.token else {
            continue;
        };
        match &resolvable.value {
            ResolveValue::Transition(handle) if token == TRANSITION_TOKEN => {
                if transition.is_some() {
                    return Err(BindError::ReservedResolveToken {
                        fqn: fqn.to_string(),
                    });
                }
                transition = Some(handle.clone());
            }
            ResolveValue::Transition(_) => {
                trace!(fqn, token = %token, "skipping transition resolvable under non-reserved token");
            }
            ResolveValue::Data(_) if token == TRANSITION_TOKEN => {
                return Err(BindError::ReservedResolveToken {
                    fqn: fqn.to_string(),
                });
            }
            ResolveValue::Data(value) => {
                resolves.insert(token.clone(), value.clone());
            }
        }
    }
    Ok((resolves, transition))
}

/// A mounted viewport placeholder.
///
/// Dropping it deregisters from the engine, releases its fqn, and
/// releases any installed exit hook.
pub struct Viewport {
    id: u64,
    router: Rc<Router>,
    scope: Scope,
    shared: Rc<ViewportShared>,
    deregister: Deregister,
    exit: RefCell<Option<ExitBinding>>,
}

impl Viewport {
    /// Mount a placeholder at the position described by `scope`.
    ///
    /// Registers an active-viewport descriptor with the engine. Fails
    /// when another viewport is already live at the same fqn.
    pub fn mount(scope: &Scope, options: ViewportOptions) -> Result<Self> {
        let router = Rc::clone(scope.router());
        let engine = Rc::clone(scope.engine());

        let address = match scope.viewport() {
            Some(parent) => ViewportAddress::child(parent, options.name.as_deref()),
            None => ViewportAddress::root(options.name.as_deref(), engine.registry().root()),
        };
        router.claim_fqn(address.fqn())?;

        let id = router.next_viewport_id();
        let creation_context = scope
            .viewport()
            .and_then(ViewportAddress::context)
            .unwrap_or_else(|| engine.registry().root());

        let shared = Rc::new(ViewportShared {
            mounted: Cell::new(true),
            address: address.clone(),
            class_name: options.class_name.clone(),
            style: options.style.clone(),
            rendered: Signal::new(RenderedView::empty(
                options.class_name.as_deref(),
                options.style.as_deref(),
            )),
        });

        let weak = Rc::downgrade(&shared);
        let callback_fqn = address.fqn().to_string();
        let deregister = engine.views().register_viewport(ActiveViewport {
            id,
            name: options.name.unwrap_or_else(|| DEFAULT_VIEWPORT.to_string()),
            fqn: address.fqn().to_string(),
            creation_context,
            config_updated: Rc::new(move |config| {
                let Some(shared) = weak.upgrade() else {
                    trace!(fqn = %callback_fqn, "dropping config for unmounted viewport");
                    return Ok(());
                };
                if !shared.mounted.get() {
                    trace!(fqn = %callback_fqn, "dropping stale config");
                    return Ok(());
                }
                shared.apply_config(config)
            }),
        });
        debug!(id, fqn = address.fqn(), "viewport registered");

        Ok(Self {
            id,
            scope: scope.with_viewport(address),
            router,
            shared,
            deregister,
            exit: RefCell::new(None),
        })
    }

    /// Registry-unique viewport id.
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// This viewport's address handle.
    #[must_use]
    pub fn address(&self) -> &ViewportAddress {
        &self.shared.address
    }

    /// Fully-qualified viewport name.
    #[must_use]
    pub fn fqn(&self) -> &str {
        self.shared.address.fqn()
    }

    /// The composition scope for this viewport's descendants.
    #[must_use]
    pub fn scope(&self) -> Scope {
        self.scope.clone()
    }

    /// Snapshot of the current renderable view.
    #[must_use]
    pub fn rendered(&self) -> RenderedView {
        self.shared.rendered.get()
    }

    /// Subscribe to render updates (the framework's re-render trigger).
    #[must_use]
    pub fn on_render(&self, callback: impl Fn(&RenderedView) + 'static) -> Subscription {
        self.shared.rendered.subscribe(callback)
    }

    /// Bind `instance` as the current occupant's exit veto.
    ///
    /// The hook is scoped to exiting the state that activated the current
    /// view, so it only fires while this state is being left. Rebinding
    /// the same instance is a no-op; rebinding a different instance
    /// releases the previous hook first.
    pub fn bind_exit(&self, instance: &Rc<dyn ExitAware>) -> Result<()> {
        let state = self
            .shared
            .address
            .context()
            .filter(|s| !s.is_root())
            .ok_or(BindError::NoActiveState)?;

        let mut slot = self.exit.borrow_mut();
        let binding = match slot.take() {
            Some(existing) if existing.state_name() == state.name() => existing,
            // A stale binding drops here, releasing its hook first.
            _ => ExitBinding::new(Rc::clone(self.scope.engine()), state.name()),
        };
        binding.rebind(instance);
        *slot = Some(binding);
        Ok(())
    }
}

impl Drop for Viewport {
    fn drop(&mut self) {
        self.shared.mounted.set(false);
        self.deregister.call();
        self.router.release_fqn(self.shared.address.fqn());
        debug!(id = self.id, fqn = self.fqn(), "viewport deregistered");
    }
}

impl std::fmt::Debug for Viewport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Viewport")
            .field("id", &self.id)
            .field("fqn", &self.fqn())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::StubEngine;
    use serde_json::json;
    use trailhead_core::params::Params;
    use trailhead_core::state::StateRef;

    fn mounted(stub: &StubEngine) -> (Rc<Router>, Viewport) {
        let router = Router::new(stub.as_engine());
        let viewport = Viewport::mount(&router.scope(), ViewportOptions::default()).unwrap();
        (router, viewport)
    }

    #[test]
    fn mount_registers_once() {
        let stub = StubEngine::new();
        let (_router, viewport) = mounted(&stub);
        assert_eq!(stub.registered_fqns(), vec!["$default".to_string()]);
        assert_eq!(viewport.fqn(), "$default");
        assert!(viewport.rendered().component.is_empty_placeholder());
    }

    #[test]
    fn config_updates_rendered_view_and_address_context() {
        let stub = StubEngine::new();
        let (_router, viewport) = mounted(&stub);

        let transition = TransitionHandle::new(1, "home", Params::new());
        stub.fire_config(
            "$default",
            Some(ViewConfig {
                state: StateRef::new("home"),
                component: Some(Component::named("Home")),
                resolvables: vec![
                    Resolvable::data("user", json!({"id": 3})),
                    Resolvable::opaque(99, json!("ignored")),
                    Resolvable::transition(transition.clone()),
                ],
            }),
        )
        .unwrap();

        let rendered = viewport.rendered();
        assert_eq!(rendered.component, Component::named("Home"));
        assert_eq!(rendered.props.resolves["user"], json!({"id": 3}));
        assert!(!rendered.props.resolves.contains_key("transition"));
        assert_eq!(rendered.props.transition, Some(transition));
        assert_eq!(viewport.address().context().unwrap().name(), "home");
    }

    #[test]
    fn cleared_config_falls_back_to_empty_component() {
        let stub = StubEngine::new();
        let (_router, viewport) = mounted(&stub);

        stub.fire_config(
            "$default",
            Some(ViewConfig {
                state: StateRef::new("home"),
                component: Some(Component::named("Home")),
                resolvables: Vec::new(),
            }),
        )
        .unwrap();
        stub.fire_config("$default", None).unwrap();
        assert!(viewport.rendered().component.is_empty_placeholder());
    }

    #[test]
    fn caller_class_and_style_are_merged_into_props() {
        let stub = StubEngine::new();
        let router = Router::new(stub.as_engine());
        let viewport = Viewport::mount(
            &router.scope(),
            ViewportOptions {
                name: None,
                class_name: Some("pane".into()),
                style: Some("flex:1".into()),
            },
        )
        .unwrap();

        assert_eq!(viewport.rendered().props.class_name.as_deref(), Some("pane"));
        stub.fire_config(
            "$default",
            Some(ViewConfig {
                state: StateRef::new("home"),
                component: None,
                resolvables: Vec::new(),
            }),
        )
        .unwrap();
        let props = viewport.rendered().props;
        assert_eq!(props.class_name.as_deref(), Some("pane"));
        assert_eq!(props.style.as_deref(), Some("flex:1"));
    }

    #[test]
    fn data_resolve_under_reserved_token_is_an_error() {
        let stub = StubEngine::new();
        let (_router, viewport) = mounted(&stub);
        let _ = &viewport;

        let err = stub
            .fire_config(
                "$default",
                Some(ViewConfig {
                    state: StateRef::new("home"),
                    component: None,
                    resolvables: vec![Resolvable::data(TRANSITION_TOKEN, json!(1))],
                }),
            )
            .unwrap_err();
        assert!(matches!(err, BindError::ReservedResolveToken { .. }));
    }

    #[test]
    fn stale_config_after_unmount_is_dropped_silently() {
        let stub = StubEngine::new();
        let (_router, viewport) = mounted(&stub);
        let callback = stub.config_callback("$default");
        drop(viewport);

        // The engine entry is gone, but a callback captured before the
        // unmount must still be safe to invoke.
        callback(Some(ViewConfig {
            state: StateRef::new("home"),
            component: Some(Component::named("Home")),
            resolvables: Vec::new(),
        }))
        .unwrap();
        assert!(stub.registered_fqns().is_empty());
    }

    #[test]
    fn duplicate_fqn_is_rejected() {
        let stub = StubEngine::new();
        let router = Router::new(stub.as_engine());
        let _first = Viewport::mount(&router.scope(), ViewportOptions::default()).unwrap();
        let err = Viewport::mount(&router.scope(), ViewportOptions::default()).unwrap_err();
        assert!(matches!(err, BindError::DuplicateViewport { .. }));
    }

    #[test]
    fn remount_gets_a_fresh_id() {
        let stub = StubEngine::new();
        let router = Router::new(stub.as_engine());
        let first = Viewport::mount(&router.scope(), ViewportOptions::default()).unwrap();
        let first_id = first.id();
        drop(first);
        let second = Viewport::mount(&router.scope(), ViewportOptions::default()).unwrap();
        assert!(second.id() > first_id);
    }

    #[test]
    fn nested_viewport_fqn_descends_from_parent() {
        let stub = StubEngine::new();
        let router = Router::new(stub.as_engine());
        let parent = Viewport::mount(&router.scope(), ViewportOptions::default()).unwrap();
        let child = Viewport::mount(
            &parent.scope(),
            ViewportOptions {
                name: Some("detail".into()),
                ..ViewportOptions::default()
            },
        )
        .unwrap();
        assert_eq!(child.fqn(), "$default.detail");
    }

    #[test]
    fn bind_exit_tracks_the_context_state() {
        use trailhead_core::transition::{HookCriteria, HookResult};

        struct Occupant;
        impl ExitAware for Occupant {
            fn can_exit(&self, _transition: &TransitionHandle) -> HookResult {
                HookResult::Allow
            }
        }

        let stub = StubEngine::new();
        let (_router, viewport) = mounted(&stub);
        let occupant = Rc::new(Occupant) as Rc<dyn ExitAware>;
        assert_eq!(
            viewport.bind_exit(&occupant).unwrap_err(),
            BindError::NoActiveState
        );

        let config = |state: &str| {
            Some(ViewConfig {
                state: StateRef::new(state),
                component: Some(Component::named("Editor")),
                resolvables: Vec::new(),
            })
        };
        stub.fire_config("$default", config("editor")).unwrap();
        viewport.bind_exit(&occupant).unwrap();
        viewport.bind_exit(&occupant).unwrap();
        assert_eq!(stub.before_hook_registrations(), 1);
        assert_eq!(
            stub.before_hook_criteria(),
            vec![HookCriteria {
                exiting: Some("editor".into())
            }]
        );

        // A new activating state swaps the hook instead of stacking one.
        stub.fire_config("$default", config("other")).unwrap();
        viewport.bind_exit(&occupant).unwrap();
        assert_eq!(stub.before_hook_count(), 1);
        assert_eq!(
            stub.before_hook_criteria(),
            vec![HookCriteria {
                exiting: Some("other".into())
            }]
        );
    }

    #[test]
    fn on_render_notifies_subscribers() {
        let stub = StubEngine::new();
        let (_router, viewport) = mounted(&stub);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = Rc::clone(&seen);
        let _sub = viewport.on_render(move |view| s.borrow_mut().push(view.component.clone()));

        stub.fire_config(
            "$default",
            Some(ViewConfig {
                state: StateRef::new("home"),
                component: Some(Component::named("Home")),
                resolvables: Vec::new(),
            }),
        )
        .unwrap();
        assert_eq!(*seen.borrow(), vec![Component::named("Home")]);
    }
}
