//! Viewport addressing: fully-qualified names and relative target
//! resolution.
//!
//! Every mounted viewport has a fixed fully-qualified name (fqn), the
//! dot-joined path of ancestor viewport names, and a context cell that is
//! filled in once the first view configuration targeting the viewport
//! arrives. Descendant links resolve relative target names against that
//! context.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use trailhead_core::engine::StateRegistry;
use trailhead_core::state::StateRef;

/// Viewport name used when the caller supplies none.
pub const DEFAULT_VIEWPORT: &str = "$default";

/// The public handle a viewport exposes to its descendants.
///
/// Cloning shares the same context cell: the fqn is fixed at mount, but
/// the context is set later, when a view configuration arrives, and
/// every clone observes the update.
#[derive(Clone)]
pub struct ViewportAddress {
    fqn: Rc<str>,
    context: Rc<RefCell<Option<StateRef>>>,
}

impl ViewportAddress {
    /// Address for a root viewport (no ancestor placeholder). The fqn is
    /// the viewport's own name and the context starts at the engine root.
    #[must_use]
    pub fn root(name: Option<&str>, root_context: StateRef) -> Self {
        Self {
            fqn: Rc::from(name.unwrap_or(DEFAULT_VIEWPORT)),
            context: Rc::new(RefCell::new(Some(root_context))),
        }
    }

    /// Address for a viewport nested under `parent`. The context stays
    /// unset until a view configuration targets this fqn.
    #[must_use]
    pub fn child(parent: &ViewportAddress, name: Option<&str>) -> Self {
        let segment = name.unwrap_or(DEFAULT_VIEWPORT);
        Self {
            fqn: Rc::from(format!("{}.{segment}", parent.fqn)),
            context: Rc::new(RefCell::new(None)),
        }
    }

    /// Fully-qualified, dot-joined viewport name.
    #[must_use]
    pub fn fqn(&self) -> &str {
        &self.fqn
    }

    /// State that owns the view currently targeting this viewport, once
    /// known.
    #[must_use]
    pub fn context(&self) -> Option<StateRef> {
        self.context.borrow().clone()
    }

    pub(crate) fn set_context(&self, state: StateRef) {
        *self.context.borrow_mut() = Some(state);
    }
}

impl fmt::Debug for ViewportAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewportAddress")
            .field("fqn", &self.fqn())
            .field("context", &self.context())
            .finish()
    }
}

/// Resolve a (possibly relative) target state name against the nearest
/// ancestor viewport's context, falling back to the engine root when no
/// ancestor exists or its context is not yet known.
#[must_use]
pub fn resolve_target(
    registry: &dyn StateRegistry,
    name: &str,
    address: Option<&ViewportAddress>,
) -> Option<StateRef> {
    let context = address
        .and_then(ViewportAddress::context)
        .unwrap_or_else(|| registry.root());
    registry.get(name, Some(&context))
}
