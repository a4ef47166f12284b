#![forbid(unsafe_code)]

//! Binding layer between a component-tree rendering framework and an
//! external hierarchical state/routing engine.
//!
//! The engine owns state definitions, URL matching, transitions, and
//! resolve computation. This crate owns the view side:
//!
//! - [`Viewport`]: a placeholder registered with the engine's view
//!   registry; it receives view configurations and publishes the
//!   renderable `{component, props}` pair through a signal.
//! - [`Link`]: computes a navigable href for a (possibly relative)
//!   target and a click handler that triggers the transition.
//! - [`ActiveGroup`]: tracks which registered links correspond to the
//!   currently active state and merges an active class accordingly.
//! - [`ExitBinding`]: forwards a component's exit veto into the engine's
//!   before-transition hooks while that component occupies a viewport.
//! - [`DeepMemo`]: structural-equality change detection for params and
//!   options passed as freshly built but equivalent values.
//!
//! Composition is threaded through immutable [`Scope`] snapshots rooted
//! at a [`Router`], which owns the per-engine viewport registry.

pub mod active;
pub mod address;
pub mod exit;
pub mod link;
pub mod memo;
pub mod router;
pub mod scope;
pub mod viewport;

#[cfg(test)]
pub(crate) mod testutil;

pub use active::{ActiveGroup, ActiveHook, merge_class};
pub use address::{DEFAULT_VIEWPORT, ViewportAddress, resolve_target};
pub use exit::{ExitAware, ExitBinding};
pub use link::{Link, LinkEvent};
pub use memo::DeepMemo;
pub use router::Router;
pub use scope::Scope;
pub use viewport::{RenderedView, Viewport, ViewportOptions};
