//! `cib` assembles a firmware program out of independently-authored components.
//!
//! Components declare, at build time, which [`service`](service) they export,
//! which contributions they add to services exported by other components, and
//! under what static conditions those contributions apply. The [`nexus`] walks
//! a project's [`config`] tree, collects exports and extensions, prunes
//! anything gated behind a false [`Conditional`](config::ConfigItem::Conditional),
//! and drives every service's builder to a finalized value. Two sibling
//! subsystems build on the same "assemble once, dispatch forever" idea:
//!
//! - [`flow`] turns a partial order over named steps into a callable that
//!   executes them in a valid linearization.
//! - [`indexed`] and [`matcher`] turn a set of `(matcher, action)` callbacks
//!   into a per-field lookup structure for O(#fields + #candidates) dispatch.
//!
//! Composition itself never allocates on an embedded target's hot path: it
//! runs once, before the built values are ever read, and everything it
//! produces is immutable afterwards.

pub mod config;
pub mod error;
pub mod flow;
pub mod indexed;
pub mod matcher;
pub mod nexus;
pub mod service;
pub mod sink;
pub mod tag;

pub use config::{
    components, conditional, config, exports, exports_published, extend, extend_nested, Component,
    ConfigItem, ConfigTree,
};
pub use error::{CompositionError, CompositionWarning};
pub use flow::Flow;
pub use nexus::{service_for, Nexus, Publish};
pub use service::{Contribute, NestedBuilder, Service, ServiceBuilder};
pub use sink::CompositionSink;
pub use tag::{Tag, TagId};
