//! Error taxonomy for the binding layer.
//!
//! Configuration errors surface synchronously at the point of misuse and
//! are never swallowed; hosts are expected to let them crash the
//! offending subtree. Engine-surfaced outcomes (vetoed or aborted
//! transitions) are not errors here — they pass through as transition
//! outcomes. Stale-registration races are absorbed silently and never
//! reach this type.

use thiserror::Error;

/// Result alias for binding-layer operations.
pub type Result<T> = std::result::Result<T, BindError>;

/// Fatal configuration errors raised by the binding layer.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BindError {
    /// A link was mounted with an empty or whitespace-only target name.
    /// Raised before any engine call is made.
    #[error("link target must be a non-empty state name")]
    BlankTarget,

    /// A second viewport tried to register under an fqn that is already
    /// live. At most one descriptor per fqn may be registered at once.
    #[error("viewport already registered at fqn `{fqn}`")]
    DuplicateViewport {
        /// The contested fully-qualified viewport name.
        fqn: String,
    },

    /// A data resolve reused the reserved `"transition"` token name, or a
    /// configuration carried more than one transition entry.
    #[error("resolve token collides with the reserved `transition` token (viewport `{fqn}`)")]
    ReservedResolveToken {
        /// Fqn of the viewport whose configuration was malformed.
        fqn: String,
    },

    /// An exit hook was bound before any view configuration targeted the
    /// viewport, so there is no owning state to scope the hook to.
    #[error("no view configuration has targeted this viewport yet")]
    NoActiveState,

    /// The engine has no state registered (or resolvable) under the
    /// requested name.
    #[error("unknown target state `{name}`")]
    UnknownState {
        /// The name that failed to resolve.
        name: String,
    },
}
