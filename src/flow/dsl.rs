//! The flow expression language: `a >> b` (before), `a & b` (parallel, no
//! ordering obligation) and `.mentioned()` (the `*a` marker from §4.2).
//!
//! Rust has no overloadable `&&`, so parallel composition uses `&`
//! ([`std::ops::BitAnd`]) instead of the source material's `&&`; `*a` becomes
//! the [`Expr::mentioned`] method, since unary `*` is already `Deref`. `>>`
//! keeps its natural meaning via [`std::ops::Shr`].

use std::sync::Arc;

use crate::matcher::algebra::{Evaluate, Leaf, Matcher};
use crate::tag::{Tag, TagId};

/// A leaf condition in a [`FlowPredicate`]: a named, opaque test over some
/// context `Ctx` (typically the project's runtime state or arguments).
///
/// Two `NamedLeaf`s are equal iff they share a name and were built from the
/// same underlying test closure — in practice, iff one was cloned from the
/// other. Node and edge predicates are expected to share leaves this way, so
/// that [`implies`](crate::matcher::implies) recognizes `P` on a node and `P`
/// on its edge as the same fact rather than two unrelated atoms.
pub struct NamedLeaf<Ctx> {
    name: &'static str,
    test: Arc<dyn Fn(&Ctx) -> bool + Send + Sync>,
}

impl<Ctx> NamedLeaf<Ctx> {
    /// Name this predicate carries into diagnostics and formulas.
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl<Ctx> Clone for NamedLeaf<Ctx> {
    fn clone(&self) -> Self {
        Self { name: self.name, test: Arc::clone(&self.test) }
    }
}

impl<Ctx> PartialEq for NamedLeaf<Ctx> {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && Arc::ptr_eq(&self.test, &other.test)
    }
}

impl<Ctx> Eq for NamedLeaf<Ctx> {}

impl<Ctx> std::hash::Hash for NamedLeaf<Ctx> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.name.hash(state);
        (Arc::as_ptr(&self.test) as *const () as usize).hash(state);
    }
}

impl<Ctx> PartialOrd for NamedLeaf<Ctx> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl<Ctx> Ord for NamedLeaf<Ctx> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.name.cmp(other.name).then(
            (Arc::as_ptr(&self.test) as *const () as usize)
                .cmp(&(Arc::as_ptr(&other.test) as *const () as usize)),
        )
    }
}

impl<Ctx> std::fmt::Debug for NamedLeaf<Ctx> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

impl<Ctx> Leaf for NamedLeaf<Ctx> {
    fn describe(&self) -> String {
        self.name.to_string()
    }
}

impl<Ctx> Evaluate<Ctx> for NamedLeaf<Ctx> {
    fn eval(&self, ctx: &Ctx) -> bool {
        (self.test)(ctx)
    }
}

/// A boolean formula gating a flow node or edge. See [`predicate`].
pub type FlowPredicate<Ctx> = Matcher<NamedLeaf<Ctx>>;

/// Build a named flow predicate from a test closure.
///
/// Clone the returned value (cheap — it's `Arc`-backed) to attach the *same*
/// predicate to both a node and the edges that should be gated identically;
/// the implication check in [`build`](super::graph::build) only recognizes
/// two predicates as "the same fact" when they share this identity.
pub fn predicate<Ctx>(name: &'static str, test: impl Fn(&Ctx) -> bool + Send + Sync + 'static) -> FlowPredicate<Ctx> {
    Matcher::leaf(NamedLeaf { name, test: Arc::new(test) })
}

pub(crate) enum StepKind {
    Action(Arc<dyn Fn() + Send + Sync>),
    Milestone,
}

/// A single flow step: a tag, an optional action, a gating predicate, and
/// whether it's a milestone.
pub(crate) struct Step<Ctx> {
    pub(crate) tag: TagId,
    pub(crate) kind: StepKind,
    pub(crate) predicate: FlowPredicate<Ctx>,
}

impl<Ctx> Clone for Step<Ctx> {
    fn clone(&self) -> Self {
        Self { tag: self.tag, kind: self.kind.clone_kind(), predicate: self.predicate.clone() }
    }
}

impl StepKind {
    fn clone_kind(&self) -> Self {
        match self {
            StepKind::Action(f) => StepKind::Action(Arc::clone(f)),
            StepKind::Milestone => StepKind::Milestone,
        }
    }
}

/// A flow graph expression, built from [`action`], [`milestone`],
/// [`step_ref`] and composed with `>>`, `&` and [`Expr::mentioned`].
pub enum Expr<Ctx> {
    /// A bare reference to a tag, with no step data of its own — used to
    /// form an edge to/from a step declared (with its data) elsewhere in the
    /// same graph.
    Ref(TagId),
    /// A fully declared step.
    Leaf(Step<Ctx>),
    /// `before >> after`, optionally gated by an edge predicate (see
    /// [`Expr::gated_by`]).
    Before(Box<Expr<Ctx>>, Box<Expr<Ctx>>, Option<FlowPredicate<Ctx>>),
    /// `a & b & ...`: every branch's nodes participate, with no ordering
    /// obligation between them.
    Parallel(Vec<Expr<Ctx>>),
    /// The `*a` marker: every node in `inner` counts as mentioned, even if
    /// it's not an edge endpoint.
    Mentioned(Box<Expr<Ctx>>),
}

impl<Ctx> Clone for Expr<Ctx> {
    fn clone(&self) -> Self {
        match self {
            Expr::Ref(tag) => Expr::Ref(*tag),
            Expr::Leaf(step) => Expr::Leaf(step.clone()),
            Expr::Before(l, r, p) => Expr::Before(l.clone(), r.clone(), p.clone()),
            Expr::Parallel(list) => Expr::Parallel(list.clone()),
            Expr::Mentioned(inner) => Expr::Mentioned(inner.clone()),
        }
    }
}

/// A step with an inline `void()` action, gated by `always` until
/// [`Expr::predicated`] narrows it.
pub fn action<T: Tag, Ctx>(action: impl Fn() + Send + Sync + 'static) -> Expr<Ctx> {
    Expr::Leaf(Step {
        tag: T::id(),
        kind: StepKind::Action(Arc::new(action)),
        predicate: Matcher::always(),
    })
}

/// A milestone: a named synchronization point with no action.
pub fn milestone<T: Tag, Ctx>() -> Expr<Ctx> {
    Expr::Leaf(Step { tag: T::id(), kind: StepKind::Milestone, predicate: Matcher::always() })
}

/// A bare reference to `T`, used to extend an edge to/from a step whose full
/// declaration (its [`action`] or [`milestone`]) appears elsewhere in the
/// same graph expression.
pub fn step_ref<T: Tag, Ctx>() -> Expr<Ctx> {
    Expr::Ref(T::id())
}

impl<Ctx> Expr<Ctx> {
    /// Gate this step's inclusion at run time on `pred`: a node whose
    /// predicate is false at flow-invocation time is skipped, not removed
    /// from the build.
    ///
    /// Only meaningful on [`Expr::Leaf`]; applied to anything else, it's a
    /// no-op.
    pub fn predicated(mut self, pred: FlowPredicate<Ctx>) -> Self {
        if let Expr::Leaf(step) = &mut self {
            step.predicate = pred;
        }
        self
    }

    /// Attach an edge predicate to a `Before` expression (`a >> b`), gating
    /// that specific ordering obligation rather than either endpoint.
    ///
    /// Only meaningful on [`Expr::Before`]; applied to anything else, it's a
    /// no-op.
    pub fn gated_by(self, pred: FlowPredicate<Ctx>) -> Self {
        match self {
            Expr::Before(l, r, _) => Expr::Before(l, r, Some(pred)),
            other => other,
        }
    }

    /// `a & b`: both participate, with no ordering obligation between them.
    /// Flattens nested `Parallel` groups on either side.
    pub fn and(self, other: Self) -> Self {
        let mut branches = Vec::new();
        match self {
            Expr::Parallel(list) => branches.extend(list),
            other => branches.push(other),
        }
        match other {
            Expr::Parallel(list) => branches.extend(list),
            other => branches.push(other),
        }
        Expr::Parallel(branches)
    }

    /// The `*a` marker: mark every node in this subexpression as mentioned,
    /// satisfying §4.2's "declared but not linked" check even for a step
    /// with no edges (e.g. a lone branch of a `&` group).
    pub fn mentioned(self) -> Self {
        Expr::Mentioned(Box::new(self))
    }
}

impl<Ctx> std::ops::Shr for Expr<Ctx> {
    type Output = Expr<Ctx>;
    fn shr(self, rhs: Self) -> Self::Output {
        Expr::Before(Box::new(self), Box::new(rhs), None)
    }
}

impl<Ctx> std::ops::BitAnd for Expr<Ctx> {
    type Output = Expr<Ctx>;
    fn bitand(self, rhs: Self) -> Self::Output {
        self.and(rhs)
    }
}
