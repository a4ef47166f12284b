#![forbid(unsafe_code)]

//! Core contract between the Trailhead binding layer and an external
//! hierarchical state/routing engine.
//!
//! This crate defines the types the engine produces ([`ViewConfig`],
//! [`TransitionHandle`], [`StateRef`]), the trait family an engine must
//! implement ([`RouterEngine`] and friends), the reactive primitives the
//! binding layer publishes render state through ([`reactive::Signal`]),
//! and the error taxonomy ([`BindError`]).
//!
//! Everything here is single-threaded and callback-driven: handles are
//! `Rc`-backed, callbacks are `Rc<dyn Fn..>`, and deregistration is an
//! idempotent [`Deregister`] guard.

pub mod config;
pub mod engine;
pub mod error;
pub mod params;
pub mod reactive;
pub mod state;
pub mod transition;

pub use config::{Component, Resolvable, ResolveToken, ResolveValue, ViewConfig, ViewProps};
pub use engine::{
    ActiveViewport, ConfigCallback, Deregister, RouterEngine, StateRegistry, StateService,
    TransitionService, ViewService,
};
pub use error::{BindError, Result};
pub use params::{Params, params_match};
pub use state::StateRef;
pub use transition::{
    BeforeHook, HookCriteria, HookResult, SuccessHook, TransitionHandle, TransitionOptions,
    TransitionOutcome,
};
