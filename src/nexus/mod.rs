//! The composition engine: walks a project's config tree and assembles every
//! exported service into a single, immutable table.
//!
//! Composition happens once, explicitly, via [`Nexus::build`] — there is no
//! hidden global registration step. The returned [`Nexus`] is read-only:
//! [`Nexus::service`] is a pure lookup, and [`Nexus::init`] only exists to
//! publish function-pointer interfaces into whatever global hooks the
//! firmware's linkage expects.

mod build;

use std::any::Any;
use std::marker::PhantomData;

use indexmap::IndexMap;

use crate::error::CompositionError;
use crate::service::Service;
use crate::sink::CompositionSink;
use crate::tag::TagId;
use crate::ConfigTree;

pub(crate) struct Slot {
    pub(crate) builder: Option<Box<dyn Any + Send + Sync>>,
    pub(crate) build: fn(Box<dyn Any + Send + Sync>) -> Box<dyn Any + Send + Sync>,
    pub(crate) publish: Option<fn(&(dyn Any + Send + Sync))>,
}

/// A service whose built interface is a function pointer (or similarly thin
/// handle) that must be installed into a process-wide hook before any caller
/// can reach it.
///
/// Most services are plain objects looked up through [`Nexus::service`] and
/// never need this; implement it only for interfaces registered via
/// [`crate::config::exports_published`].
pub trait Publish: 'static {
    /// Install `self` into this interface's global hook.
    ///
    /// Called once per hook from [`Nexus::init`], and safe to call again —
    /// publication just re-installs the same pointer.
    fn publish(&self);
}

/// The assembled program: every exported service's built interface, stored
/// in a typed slot addressable by its tag.
pub struct Nexus<A> {
    services: IndexMap<TagId, Box<dyn Any + Send + Sync>>,
    publishers: Vec<(TagId, fn(&(dyn Any + Send + Sync)))>,
    _args: PhantomData<fn(&A)>,
}

impl<A> Nexus<A> {
    /// Walk `tree`, evaluating conditionals against `args`, and build every
    /// exported service's interface.
    ///
    /// Returns every composition error found — not just the first — so a
    /// single run can report every missing export or duplicate tag in the
    /// project at once.
    pub fn build(tree: &ConfigTree<A>, args: &A) -> Result<Self, Vec<CompositionError>> {
        build::build(tree, args)
    }

    /// Look up the built interface for service `S`.
    ///
    /// # Panics
    ///
    /// Panics if `S` was not exported anywhere in the tree this nexus was
    /// built from — that's a composition bug, not a runtime condition, so it
    /// is caught by [`Nexus::build`] returning
    /// [`CompositionError::MissingExport`] for any dangling `extend`, but a
    /// tag that is neither exported nor extended is simply absent and would
    /// only be noticed here.
    pub fn service<S: Service>(&self) -> &<S::Builder as crate::service::ServiceBuilder>::Interface {
        self.services
            .get(&S::id())
            .unwrap_or_else(|| panic!("service `{}` was never exported by this project", S::NAME))
            .downcast_ref::<<S::Builder as crate::service::ServiceBuilder>::Interface>()
            .expect("export slot held the wrong interface type")
    }

    /// Install every function-pointer interface into its global hook.
    ///
    /// Idempotent: calling it more than once just re-installs the same
    /// pointers. Must run before any handler that relies on a published hook
    /// is invoked.
    pub fn init(&self) {
        for (tag, publish) in &self.publishers {
            let built = self
                .services
                .get(tag)
                .expect("a publisher was registered for a tag with no built service");
            publish(built.as_ref());
        }
    }
}

/// Member-access equivalent of [`Nexus::service`].
pub fn service_for<S: Service, A>(
    nexus: &Nexus<A>,
) -> &<S::Builder as crate::service::ServiceBuilder>::Interface {
    nexus.service::<S>()
}

pub(crate) fn missing_export(tag: TagId, sink: &CompositionSink) {
    sink.push_error(CompositionError::MissingExport {
        tag: tag.name().to_string(),
    });
}

pub(crate) fn duplicate_export(tag: TagId, sink: &CompositionSink) {
    sink.push_error(CompositionError::DuplicateExport {
        tag: tag.name().to_string(),
    });
}
