//! The config tree: the declarative project description the [`nexus`](crate::nexus) evaluates.
//!
//! A project's `config` is a [`ConfigTree`] built out of five item kinds —
//! [`exports`], [`extend`], [`components`], [`conditional`] and [`config`]
//! itself — composed the way the project author writes them. The tree is
//! plain data: nothing here touches a service's builder until the nexus
//! walks it.

use std::any::Any;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::service::{Contribute, NestedBuilder, ServiceBuilder};
use crate::tag::{Tag, TagId};
use crate::Service;

/// An ordered composition of [`ConfigItem`]s.
///
/// `ConfigTree`s nest: a [`components`] item folds in the `config` of other
/// components, and a [`conditional`] item wraps a subtree that only
/// participates when its predicate holds.
pub struct ConfigTree<A> {
    pub(crate) items: Vec<ConfigItem<A>>,
}

impl<A> ConfigTree<A> {
    /// An empty tree; contributes nothing.
    pub fn empty() -> Self {
        Self { items: Vec::new() }
    }
}

/// One node of a [`ConfigTree`].
pub enum ConfigItem<A> {
    /// Declares that this subtree defines services with the given tags,
    /// seeding an empty builder for each.
    Exports(Vec<ExportSpec>),
    /// Adds a contribution to the builder reached by a path of tags.
    Extend(ExtendSpec<A>),
    /// Concatenates the configuration trees of several components,
    /// depth-first, left to right.
    Components(Vec<ConfigTree<A>>),
    /// Includes a subtree only if `Pred(project_args)` holds.
    Conditional(Conditional<A>),
    /// An ordered composition of items; equivalent to nesting another tree.
    Config(Vec<ConfigItem<A>>),
}

/// A type contributing a `config` fragment to a project.
pub trait Component<A> {
    /// This component's configuration fragment.
    fn config() -> ConfigTree<A>;
}

/// One `exports<Tag>` entry: a tag plus a way to seed its empty builder and,
/// later, to finalize it into the service's interface.
pub struct ExportSpec {
    pub(crate) tag: TagId,
    pub(crate) make_builder: fn() -> Box<dyn Any + Send + Sync>,
    pub(crate) build: fn(Box<dyn Any + Send + Sync>) -> Box<dyn Any + Send + Sync>,
    pub(crate) publish: Option<fn(&(dyn Any + Send + Sync))>,
}

impl ExportSpec {
    /// Build an export entry for service `S`, without publication.
    pub fn new<S: Service>() -> Self {
        Self {
            tag: S::id(),
            make_builder: || Box::new(<S::Builder as Default>::default()),
            build: |boxed| {
                let builder = *boxed
                    .downcast::<S::Builder>()
                    .expect("export slot held the wrong builder type");
                Box::new(builder.build())
            },
            publish: None,
        }
    }

    /// Build an export entry for service `S` whose built interface must also
    /// be installed into a global hook via [`Publish::publish`](crate::nexus::Publish::publish)
    /// when [`Nexus::init`](crate::nexus::Nexus::init) runs.
    pub fn new_published<S>() -> Self
    where
        S: Service,
        S::Builder: ServiceBuilder,
        <S::Builder as ServiceBuilder>::Interface: crate::nexus::Publish,
    {
        Self {
            tag: S::id(),
            make_builder: || Box::new(<S::Builder as Default>::default()),
            build: |boxed| {
                let builder = *boxed
                    .downcast::<S::Builder>()
                    .expect("export slot held the wrong builder type");
                Box::new(builder.build())
            },
            publish: Some(|built| {
                let value = built
                    .downcast_ref::<<S::Builder as ServiceBuilder>::Interface>()
                    .expect("built slot held the wrong interface type");
                crate::nexus::Publish::publish(value);
            }),
        }
    }
}

/// One `extend<Path>(contribution)` entry.
pub struct ExtendSpec<A> {
    pub(crate) path: Vec<TagId>,
    pub(crate) apply: Arc<dyn Fn(&mut (dyn Any + Send + Sync)) + Send + Sync>,
    _args: PhantomData<fn(&A)>,
}

/// A `conditional<Pred, Body>` entry.
pub struct Conditional<A> {
    pub(crate) predicate: Arc<dyn Fn(&A) -> bool + Send + Sync>,
    pub(crate) body: Box<ConfigTree<A>>,
}

/// `exports<S>()`: declare that this subtree exports service `S`.
pub fn exports<A, S: Service>() -> ConfigItem<A> {
    ConfigItem::Exports(vec![ExportSpec::new::<S>()])
}

/// `exports<S>()`, additionally publishing the built interface in
/// [`Nexus::init`](crate::nexus::Nexus::init).
pub fn exports_published<A, S>() -> ConfigItem<A>
where
    S: Service,
    <S::Builder as ServiceBuilder>::Interface: crate::nexus::Publish,
{
    ConfigItem::Exports(vec![ExportSpec::new_published::<S>()])
}

/// `extend<S>(contribution)`: add one contribution to the single-element
/// path `[S]`.
pub fn extend<A, S, C>(contribution: C) -> ConfigItem<A>
where
    S: Service,
    S::Builder: Contribute<C>,
    C: Clone + Send + Sync + 'static,
{
    let contribution = Arc::new(contribution);
    ConfigItem::Extend(ExtendSpec {
        path: vec![S::id()],
        apply: Arc::new(move |slot| {
            let builder = slot
                .downcast_mut::<S::Builder>()
                .expect("extend slot held the wrong builder type");
            let current = std::mem::take(builder);
            *builder = current.add((*contribution).clone());
        }),
        _args: PhantomData,
    })
}

/// `extend<Outer, Inner>(contribution)`: add one contribution to the nested
/// builder reached by the two-element path `[Outer, Inner]`.
pub fn extend_nested<A, Outer, Inner, C>(contribution: C) -> ConfigItem<A>
where
    Outer: Service,
    Outer::Builder: NestedBuilder<Inner>,
    Inner: Tag,
    <Outer::Builder as NestedBuilder<Inner>>::Sub: Contribute<C>,
    C: Clone + Send + Sync + 'static,
{
    let contribution = Arc::new(contribution);
    ConfigItem::Extend(ExtendSpec {
        path: vec![Outer::id(), Inner::id()],
        apply: Arc::new(move |slot| {
            let builder = slot
                .downcast_mut::<Outer::Builder>()
                .expect("extend slot held the wrong builder type");
            let current = std::mem::take(builder);
            let contribution = Arc::clone(&contribution);
            *builder = current.with_sub(move |sub| sub.add((*contribution).clone()));
        }),
        _args: PhantomData,
    })
}

/// `components<Cs...>`: fold in the `config` of each listed component,
/// depth-first, left to right.
pub fn components<A>(trees: Vec<ConfigTree<A>>) -> ConfigItem<A> {
    ConfigItem::Components(trees)
}

/// `conditional(pred, body)`: include `body` only when `pred(project_args)` holds.
pub fn conditional<A>(
    predicate: impl Fn(&A) -> bool + Send + Sync + 'static,
    body: ConfigTree<A>,
) -> ConfigItem<A> {
    ConfigItem::Conditional(Conditional {
        predicate: Arc::new(predicate),
        body: Box::new(body),
    })
}

/// `config<Items...>`: an ordered composition of items.
pub fn config<A>(items: Vec<ConfigItem<A>>) -> ConfigTree<A> {
    ConfigTree { items }
}
