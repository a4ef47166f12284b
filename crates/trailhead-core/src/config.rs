//! View configurations: what the engine tells a viewport to render.
//!
//! A [`ViewConfig`] is produced by the engine per transition, per targeted
//! viewport. The binding layer only reads it: it extracts the render
//! target, the owning state, and the resolvable path (string-token resolve
//! data plus the distinguished transition entry).

use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use serde_json::Value;

use crate::state::StateRef;
use crate::transition::TransitionHandle;

/// Reserved resolvable token carrying the owning transition. A data
/// resolve may not reuse this name.
pub const TRANSITION_TOKEN: &str = "transition";

/// Name of the neutral placeholder component rendered when no view
/// configuration targets a viewport.
pub const EMPTY_COMPONENT: &str = "$empty";

/// Opaque render target token.
///
/// The binding layer never invokes components; it only forwards the token
/// (plus computed props) to the surrounding rendering framework.
#[derive(Clone, PartialEq, Eq)]
pub struct Component {
    name: Rc<str>,
}

impl Component {
    /// A named component supplied by a state definition.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Rc::from(name.into()),
        }
    }

    /// The neutral empty-container placeholder used when a configuration
    /// carries no component, or when no configuration targets the viewport.
    #[must_use]
    pub fn empty() -> Self {
        Self::named(EMPTY_COMPONENT)
    }

    /// Component name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether this is the neutral placeholder.
    #[must_use]
    pub fn is_empty_placeholder(&self) -> bool {
        &*self.name == EMPTY_COMPONENT
    }
}

impl fmt::Debug for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Component").field(&self.name()).finish()
    }
}

/// Identity of one entry in a configuration's resolvable path.
///
/// Only plain string tokens are projected into view props; opaque tokens
/// (engine-internal resolvables keyed by non-string identities) are
/// skipped during extraction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ResolveToken {
    /// A plain string token, visible to views.
    Name(String),
    /// An engine-internal token with no string identity.
    Opaque(u64),
}

/// Value carried by one resolvable entry.
#[derive(Clone, Debug, PartialEq)]
pub enum ResolveValue {
    /// Resolved data, available to the view under its token name.
    Data(Value),
    /// The owning transition, carried under [`TRANSITION_TOKEN`].
    Transition(TransitionHandle),
}

/// One entry of a view configuration's resolvable path.
#[derive(Clone, Debug, PartialEq)]
pub struct Resolvable {
    /// Entry identity.
    pub token: ResolveToken,
    /// Resolved value.
    pub value: ResolveValue,
}

impl Resolvable {
    /// A string-token data resolvable.
    #[must_use]
    pub fn data(token: impl Into<String>, value: Value) -> Self {
        Self {
            token: ResolveToken::Name(token.into()),
            value: ResolveValue::Data(value),
        }
    }

    /// The distinguished transition entry.
    #[must_use]
    pub fn transition(handle: TransitionHandle) -> Self {
        Self {
            token: ResolveToken::Name(TRANSITION_TOKEN.to_string()),
            value: ResolveValue::Transition(handle),
        }
    }

    /// An opaque-token resolvable (skipped during props extraction).
    #[must_use]
    pub fn opaque(token: u64, value: Value) -> Self {
        Self {
            token: ResolveToken::Opaque(token),
            value: ResolveValue::Data(value),
        }
    }
}

/// Engine-produced descriptor of what currently targets a viewport.
#[derive(Clone, Debug, PartialEq)]
pub struct ViewConfig {
    /// The state that owns this view.
    pub state: StateRef,
    /// Render target; `None` means the neutral placeholder.
    pub component: Option<Component>,
    /// Resolvable path for this view, including the transition entry.
    pub resolvables: Vec<Resolvable>,
}

/// Renderable props computed from a view configuration, merged with the
/// placeholder's caller-supplied presentation attributes.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ViewProps {
    /// String-token resolve values, keyed by token name.
    pub resolves: BTreeMap<String, Value>,
    /// The transition that produced this configuration, if any.
    pub transition: Option<TransitionHandle>,
    /// Caller-supplied class list for the placeholder.
    pub class_name: Option<String>,
    /// Caller-supplied inline style for the placeholder.
    pub style: Option<String>,
}
