#![forbid(unsafe_code)]

//! Trailhead public facade crate.
//!
//! This crate provides the stable, ergonomic surface area for users.

pub mod prelude {
    pub use trailhead_bind::{
        ActiveGroup, ActiveHook, DeepMemo, ExitAware, ExitBinding, Link, LinkEvent, RenderedView,
        Router, Scope, Viewport, ViewportAddress, ViewportOptions, merge_class,
    };
    pub use trailhead_core::{
        BindError, Component, Params, RouterEngine, StateRef, TransitionHandle, TransitionOptions,
        ViewConfig, ViewProps,
    };
}

pub use trailhead_bind as bind;
pub use trailhead_core as core;
