//! The service contract: a builder that accumulates contributions, value
//! semantics, append-only, and eventually produces an interface value.

use crate::tag::Tag;

/// An append-only value type that accumulates contributions for a single
/// service and eventually builds the service's runtime interface.
///
/// Builders are plain values, not trait objects: `add` takes `self` by value
/// and returns a new builder, so a builder can be threaded through a fold
/// without any interior mutability. [`ServiceBuilder::build`] is called
/// exactly once, after every contribution from every reachable component has
/// been folded in.
pub trait ServiceBuilder: Default + Clone + Send + Sync + 'static {
    /// The object a caller actually interacts with at run time: a function
    /// pointer, or a type exposing the service's ABI via `Fn`-like methods.
    type Interface: Send + Sync + 'static;

    /// Finalize the builder into the service's runtime interface.
    ///
    /// Called at most once per service, after composition has folded in every
    /// contribution reachable from the project's config tree.
    fn build(self) -> Self::Interface;
}

/// Binds a [`Tag`] to the builder type used to assemble its service.
///
/// A project never implements this directly; components implement it once
/// per service they export, and the [`nexus`](crate::nexus) uses it to look
/// up which builder to seed for a given tag.
pub trait Service: Tag {
    /// The builder that accumulates this service's contributions.
    type Builder: ServiceBuilder;
}

/// A builder that knows how to fold a contribution of type `C` into itself.
///
/// A builder may implement `Contribute<C>` for several distinct `C`s — e.g.
/// a logger builder might accept both `Sink` and `(Sink, LevelFilter)`
/// contributions. Every `extend<Tag>(contribution)` call resolves to exactly
/// one `add` call picked by the contribution's type.
pub trait Contribute<C>: ServiceBuilder {
    /// Fold `contribution` into `self`, returning the new builder.
    fn add(self, contribution: C) -> Self;
}

/// A builder that itself owns a nested, independently addressable
/// sub-builder — the mechanism behind multi-element `extend` paths.
///
/// `Inner` is the tag naming the nested slot; `Sub` is the builder type
/// stored there. A path `[Outer, Inner]` resolves by looking up `Outer`'s
/// slot, then using this trait to reach into its `Inner` sub-builder.
pub trait NestedBuilder<Inner: Tag>: ServiceBuilder {
    /// The builder type nested under `Inner`.
    type Sub: ServiceBuilder;

    /// Apply `f` to the current nested sub-builder, replacing it with the result.
    fn with_sub(self, f: impl FnOnce(Self::Sub) -> Self::Sub) -> Self;
}
