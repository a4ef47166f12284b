#![forbid(unsafe_code)]

//! Scripted in-memory routing engine for exercising the binding layer.
//!
//! [`ScriptedRouter`] implements the full [`RouterEngine`] contract over
//! a hierarchical state tree with dot-separated names:
//!
//! - URL templates are concatenated along the state path, with `:param`
//!   segments substituted from transition params.
//! - Transitions evaluate before-hooks against the set of states being
//!   exited; a single `Block` aborts the transition and leaves the
//!   current state untouched.
//! - Successful transitions deliver view configurations to every
//!   registered viewport (deepest targeting state wins, `None` for
//!   untargeted viewports) and then notify success subscribers.
//! - Future-state patterns (`name.**`) reserve a name subtree without
//!   making it concrete; replacing one with real states fires the
//!   states-changed notification, like a lazy route bundle loading.
//!
//! The engine is deliberately synchronous: config delivery and success
//! notification happen inside `go`, which is what lets configuration
//! errors from malformed resolvable paths propagate to the caller.

mod scripted;

pub use scripted::{ScriptedRouter, StateSpec};
