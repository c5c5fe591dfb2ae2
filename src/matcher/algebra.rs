//! The matcher algebra: `and`/`or`/`not`, negation, simplification, sum-of-products
//! normalization, and structural implication — shared by [`flow`](crate::flow)'s
//! edge-predicate check and [`indexed`](crate::indexed)'s preprocessing pass.
//!
//! The algebra is generic over a leaf type `L` so both subsystems reuse the
//! same rewrite rules: [`flow`](crate::flow) instantiates it with named,
//! opaque boolean atoms; [`indexed`](crate::indexed) instantiates it with
//! [`field`](super::field) equalities and orderings that know how to collapse
//! against each other.

use std::cmp::Ordering;
use std::fmt;

/// A leaf condition in a [`Matcher`] formula.
///
/// Implementors describe a single atomic fact (a named flag, a field
/// comparison, ...) and the structural relationships the algebra needs in
/// order to simplify and decide implication without evaluating anything.
pub trait Leaf: Clone + Eq + std::hash::Hash + Ord + fmt::Debug {
    /// The structural negation of this leaf, when expressible as another
    /// leaf of the same kind (e.g. `less_than(F, 5)` negates to
    /// `greater_equal(F, 5)`). Returning `None` falls back to wrapping the
    /// leaf in [`Matcher::Not`].
    fn negate_leaf(&self) -> Option<Self> {
        None
    }

    /// `true` iff every model of `self` is also a model of `other`.
    ///
    /// Leaves about unrelated facts should return `self == other`; leaves
    /// about the same fact (e.g. the same field) can use their ordering to
    /// decide more, e.g. `less_than(F, 3)` implies `less_than(F, 5)`.
    fn implies_leaf(&self, other: &Self) -> bool {
        self == other
    }

    /// `true` iff `self` and `other` can never both hold.
    fn conflicts_leaf(&self, other: &Self) -> bool {
        self.negate_leaf().as_ref() == Some(other) || Some(self.clone()) == other.negate_leaf()
    }

    /// Attempt to collapse `self AND other` into a single, simpler leaf (or
    /// `never`/`always`), when both leaves constrain the same underlying
    /// fact. Returns `None` when no collapse rule applies.
    fn collapse_and(&self, _other: &Self) -> Option<Collapsed<Self>> {
        None
    }

    /// A human-readable rendering used in diagnostics.
    fn describe(&self) -> String {
        format!("{self:?}")
    }
}

/// The result of trying to collapse `A ∧ B` for two same-domain leaves.
pub enum Collapsed<L> {
    /// The conjunction is equivalent to a single leaf.
    Leaf(L),
    /// The conjunction is unsatisfiable.
    Never,
    /// The conjunction is a tautology.
    Always,
}

/// A boolean formula over leaves of type `L`.
///
/// Construct formulas with [`Matcher::leaf`], [`Matcher::and`], [`Matcher::or`],
/// [`Matcher::not`], [`Matcher::always`] and [`Matcher::never`], or with the
/// [`std::ops`] overloads (`&`, `|`, `!`).
#[derive(Clone, Debug)]
pub enum Matcher<L> {
    /// ⊤: always matches.
    Always,
    /// ⊥: never matches.
    Never,
    /// A single leaf condition.
    Leaf(L),
    /// ¬M.
    Not(Box<Matcher<L>>),
    /// L ∧ R.
    And(Box<Matcher<L>>, Box<Matcher<L>>),
    /// L ∨ R.
    Or(Box<Matcher<L>>, Box<Matcher<L>>),
}

impl<L: Leaf> Matcher<L> {
    /// ⊤.
    pub fn always() -> Self {
        Matcher::Always
    }

    /// ⊥.
    pub fn never() -> Self {
        Matcher::Never
    }

    /// A single leaf condition.
    pub fn leaf(leaf: L) -> Self {
        Matcher::Leaf(leaf)
    }

    /// `self ∧ other`.
    pub fn and(self, other: Self) -> Self {
        Matcher::And(Box::new(self), Box::new(other))
    }

    /// `self ∨ other`.
    pub fn or(self, other: Self) -> Self {
        Matcher::Or(Box::new(self), Box::new(other))
    }

    /// `¬self`.
    pub fn not(self) -> Self {
        Matcher::Not(Box::new(self))
    }

    /// A human-readable rendering of the formula, e.g. `"id == 0x80 and opcode == 1"`.
    pub fn describe(&self) -> String {
        match self {
            Matcher::Always => "always".to_string(),
            Matcher::Never => "never".to_string(),
            Matcher::Leaf(l) => l.describe(),
            Matcher::Not(m) => format!("not ({})", m.describe()),
            Matcher::And(l, r) => format!("({}) and ({})", l.describe(), r.describe()),
            Matcher::Or(l, r) => format!("({}) or ({})", l.describe(), r.describe()),
        }
    }

    /// Evaluate the formula against a context `msg`, where `L: Evaluate<C>`.
    pub fn eval<C>(&self, msg: &C) -> bool
    where
        L: Evaluate<C>,
    {
        match self {
            Matcher::Always => true,
            Matcher::Never => false,
            Matcher::Leaf(l) => l.eval(msg),
            Matcher::Not(m) => !m.eval(msg),
            Matcher::And(l, r) => l.eval(msg) && r.eval(msg),
            Matcher::Or(l, r) => l.eval(msg) || r.eval(msg),
        }
    }

    /// A structured explanation of why this formula did or didn't match
    /// `ctx`, annotating every leaf with whether it held.
    ///
    /// This is what a callback's "match explanation" (§4.3's diagnostics) is
    /// built from: on an unmatched message, the dispatcher renders one of
    /// these per candidate so the log names exactly which clause failed.
    pub fn describe_match<C>(&self, ctx: &C) -> String
    where
        L: Evaluate<C>,
    {
        match self {
            Matcher::Always => "always".to_string(),
            Matcher::Never => "never".to_string(),
            Matcher::Leaf(l) => {
                let verdict = if l.eval(ctx) { "satisfied" } else { "NOT satisfied" };
                format!("{} [{verdict}]", l.describe())
            }
            Matcher::Not(m) => format!("not ({})", m.describe_match(ctx)),
            Matcher::And(l, r) => format!("({}) and ({})", l.describe_match(ctx), r.describe_match(ctx)),
            Matcher::Or(l, r) => format!("({}) or ({})", l.describe_match(ctx), r.describe_match(ctx)),
        }
    }
}

/// Evaluates a leaf against a context of type `C` (a message, project args, ...).
pub trait Evaluate<C> {
    /// Evaluate this leaf against `ctx`.
    fn eval(&self, ctx: &C) -> bool;
}

/// `negate(M)`: the customization point from §4.4 — relational leaves
/// collapse to their opposite relation via [`Leaf::negate_leaf`]; everything
/// else falls back to wrapping in [`Matcher::Not`].
pub fn negate<L: Leaf>(m: Matcher<L>) -> Matcher<L> {
    match m {
        Matcher::Always => Matcher::Never,
        Matcher::Never => Matcher::Always,
        Matcher::Leaf(l) => match l.negate_leaf() {
            Some(negated) => Matcher::Leaf(negated),
            None => Matcher::Not(Box::new(Matcher::Leaf(l))),
        },
        Matcher::Not(inner) => *inner,
        Matcher::And(l, r) => Matcher::Or(Box::new(negate(*l)), Box::new(negate(*r))),
        Matcher::Or(l, r) => Matcher::And(Box::new(negate(*l)), Box::new(negate(*r))),
    }
}

/// Rewrite `m` to a fixed point using the rules in §4.4: idempotence,
/// identity, annihilation, complementation, absorption, double negation, De
/// Morgan, and relational collapse.
pub fn simplify<L: Leaf>(m: Matcher<L>) -> Matcher<L> {
    let mut current = m;
    loop {
        let next = simplify_once(current.clone());
        if matches_structurally(&next, &current) {
            return next;
        }
        current = next;
    }
}

fn simplify_once<L: Leaf>(m: Matcher<L>) -> Matcher<L> {
    match m {
        Matcher::Always | Matcher::Never | Matcher::Leaf(_) => m,
        Matcher::Not(inner) => {
            let inner = simplify_once(*inner);
            match inner {
                // Double negation.
                Matcher::Not(x) => *x,
                Matcher::Always => Matcher::Never,
                Matcher::Never => Matcher::Always,
                Matcher::Leaf(l) => negate(Matcher::Leaf(l)),
                other => Matcher::Not(Box::new(other)),
            }
        }
        Matcher::And(l, r) => {
            let l = simplify_once(*l);
            let r = simplify_once(*r);
            simplify_and(l, r)
        }
        Matcher::Or(l, r) => {
            let l = simplify_once(*l);
            let r = simplify_once(*r);
            simplify_or(l, r)
        }
    }
}

fn simplify_and<L: Leaf>(l: Matcher<L>, r: Matcher<L>) -> Matcher<L> {
    match (l, r) {
        (Matcher::Never, _) | (_, Matcher::Never) => Matcher::Never,
        (Matcher::Always, x) | (x, Matcher::Always) => x,
        (l, r) if matches_structurally(&l, &r) => l,
        // Absorption: X ∧ (X ∨ Y) → X.
        (x, Matcher::Or(a, b)) | (Matcher::Or(a, b), x) if matches_structurally(&x, &a) || matches_structurally(&x, &b) => {
            x
        }
        (Matcher::Leaf(a), Matcher::Leaf(b)) => {
            if a.conflicts_leaf(&b) {
                Matcher::Never
            } else if let Some(collapsed) = a.collapse_and(&b) {
                match collapsed {
                    Collapsed::Leaf(c) => Matcher::Leaf(c),
                    Collapsed::Never => Matcher::Never,
                    Collapsed::Always => Matcher::Always,
                }
            } else {
                Matcher::And(Box::new(Matcher::Leaf(a)), Box::new(Matcher::Leaf(b)))
            }
        }
        (l, r) => {
            if complementary(&l, &r) {
                Matcher::Never
            } else {
                Matcher::And(Box::new(l), Box::new(r))
            }
        }
    }
}

fn simplify_or<L: Leaf>(l: Matcher<L>, r: Matcher<L>) -> Matcher<L> {
    match (l, r) {
        (Matcher::Always, _) | (_, Matcher::Always) => Matcher::Always,
        (Matcher::Never, x) | (x, Matcher::Never) => x,
        (l, r) if matches_structurally(&l, &r) => l,
        // Absorption: X ∨ (X ∧ Y) → X.
        (x, Matcher::And(a, b)) | (Matcher::And(a, b), x) if matches_structurally(&x, &a) || matches_structurally(&x, &b) => {
            x
        }
        (l, r) => {
            if complementary(&l, &r) {
                Matcher::Always
            } else {
                Matcher::Or(Box::new(l), Box::new(r))
            }
        }
    }
}

fn complementary<L: Leaf>(l: &Matcher<L>, r: &Matcher<L>) -> bool {
    match (l, r) {
        (Matcher::Leaf(a), Matcher::Leaf(b)) => a.conflicts_leaf(b),
        (Matcher::Not(a), b) => matches_structurally(a, b),
        (a, Matcher::Not(b)) => matches_structurally(a, b),
        _ => false,
    }
}

/// Structural (syntactic, post-simplification) equivalence — used by
/// [`implies`] for the `P ≡ Q` base case and by [`simplify`] to detect its
/// fixed point.
pub fn matches_structurally<L: Leaf>(a: &Matcher<L>, b: &Matcher<L>) -> bool {
    match (a, b) {
        (Matcher::Always, Matcher::Always) => true,
        (Matcher::Never, Matcher::Never) => true,
        (Matcher::Leaf(x), Matcher::Leaf(y)) => x == y,
        (Matcher::Not(x), Matcher::Not(y)) => matches_structurally(x, y),
        (Matcher::And(a1, a2), Matcher::And(b1, b2)) => {
            matches_structurally(a1, b1) && matches_structurally(a2, b2)
        }
        (Matcher::Or(a1, a2), Matcher::Or(b1, b2)) => {
            matches_structurally(a1, b1) && matches_structurally(a2, b2)
        }
        _ => false,
    }
}

/// Sort the operands of every `And`/`Or` node by [`compare`], so that two
/// formulas equivalent only up to reordering (`A ∧ B` vs `B ∧ A`) compare
/// structurally equal. This is the "ordered canonicalization" §4.4 uses to
/// decide `P ≡ Q`.
pub fn canonicalize<L: Leaf>(m: &Matcher<L>) -> Matcher<L> {
    match m {
        Matcher::Always => Matcher::Always,
        Matcher::Never => Matcher::Never,
        Matcher::Leaf(l) => Matcher::Leaf(l.clone()),
        Matcher::Not(inner) => Matcher::Not(Box::new(canonicalize(inner))),
        Matcher::And(l, r) => {
            let (l, r) = (canonicalize(l), canonicalize(r));
            if compare(&l, &r) == Ordering::Greater {
                Matcher::And(Box::new(r), Box::new(l))
            } else {
                Matcher::And(Box::new(l), Box::new(r))
            }
        }
        Matcher::Or(l, r) => {
            let (l, r) = (canonicalize(l), canonicalize(r));
            if compare(&l, &r) == Ordering::Greater {
                Matcher::Or(Box::new(r), Box::new(l))
            } else {
                Matcher::Or(Box::new(l), Box::new(r))
            }
        }
    }
}

/// `implies(P, Q)`: does every model of `P` satisfy `Q`? Decided structurally
/// per §4.4, without enumerating models.
pub fn implies<L: Leaf>(p: &Matcher<L>, q: &Matcher<L>) -> bool {
    match (p, q) {
        (Matcher::Never, _) => true,
        (_, Matcher::Always) => true,
        _ if matches_structurally(p, q) => true,
        _ if matches_structurally(&canonicalize(p), &canonicalize(q)) => true,
        (_, Matcher::And(q1, q2)) => implies(p, q1) && implies(p, q2),
        (_, Matcher::Or(q1, q2)) => implies(p, q1) || implies(p, q2),
        (Matcher::And(p1, p2), _) => implies(p1, q) || implies(p2, q),
        (Matcher::Leaf(a), Matcher::Leaf(b)) => a.implies_leaf(b),
        (Matcher::Leaf(a), Matcher::Not(q)) => match &**q {
            Matcher::Leaf(b) => a.conflicts_leaf(b),
            _ => false,
        },
        _ => false,
    }
}

/// `sop(M)`: normalize to `OR(AND(leaf | not-leaf, ...), ...)` by pushing
/// negations to the leaves and distributing `AND` over `OR`.
pub fn sop<L: Leaf>(m: Matcher<L>) -> Matcher<L> {
    let pushed = push_negations(m);
    distribute(pushed)
}

fn push_negations<L: Leaf>(m: Matcher<L>) -> Matcher<L> {
    match m {
        Matcher::Not(inner) => match *inner {
            Matcher::And(l, r) => Matcher::Or(
                Box::new(push_negations(negate(*l))),
                Box::new(push_negations(negate(*r))),
            ),
            Matcher::Or(l, r) => Matcher::And(
                Box::new(push_negations(negate(*l))),
                Box::new(push_negations(negate(*r))),
            ),
            Matcher::Not(x) => push_negations(*x),
            other => negate(other),
        },
        Matcher::And(l, r) => Matcher::And(Box::new(push_negations(*l)), Box::new(push_negations(*r))),
        Matcher::Or(l, r) => Matcher::Or(Box::new(push_negations(*l)), Box::new(push_negations(*r))),
        other => other,
    }
}

fn distribute<L: Leaf>(m: Matcher<L>) -> Matcher<L> {
    match m {
        Matcher::And(l, r) => {
            let l = distribute(*l);
            let r = distribute(*r);
            match (l, r) {
                (Matcher::Or(a, b), r) => Matcher::Or(
                    Box::new(distribute(Matcher::And(a, Box::new(r.clone())))),
                    Box::new(distribute(Matcher::And(b, Box::new(r)))),
                ),
                (l, Matcher::Or(a, b)) => Matcher::Or(
                    Box::new(distribute(Matcher::And(Box::new(l.clone()), a))),
                    Box::new(distribute(Matcher::And(Box::new(l), b))),
                ),
                (l, r) => Matcher::And(Box::new(l), Box::new(r)),
            }
        }
        Matcher::Or(l, r) => Matcher::Or(Box::new(distribute(*l)), Box::new(distribute(*r))),
        other => other,
    }
}

/// A strict weak ordering over formulas, for canonicalization and stable
/// diagnostics (§4.4's "Ordering").
pub fn compare<L: Leaf>(a: &Matcher<L>, b: &Matcher<L>) -> Ordering {
    fn rank<L>(m: &Matcher<L>) -> u8 {
        match m {
            Matcher::Never => 0,
            Matcher::Always => 1,
            Matcher::Leaf(_) => 2,
            Matcher::Not(_) => 3,
            Matcher::And(_, _) => 4,
            Matcher::Or(_, _) => 5,
        }
    }
    match (a, b) {
        (Matcher::Leaf(x), Matcher::Leaf(y)) => x.cmp(y),
        (Matcher::Not(x), Matcher::Not(y)) => compare(x, y),
        (Matcher::And(a1, a2), Matcher::And(b1, b2)) | (Matcher::Or(a1, a2), Matcher::Or(b1, b2)) => {
            compare(a1, b1).then_with(|| compare(a2, b2))
        }
        _ => rank(a).cmp(&rank(b)),
    }
}

/// The formula `required` still unsatisfied when `given` already holds, or
/// `None` if `given` already implies `required`.
///
/// Used by [`flow`](crate::flow) to name the missing predicate on a
/// `WeakerEdgePredicate` diagnostic: the residual is `required ∧ ¬given`.
pub fn missing<L: Leaf>(given: &Matcher<L>, required: &Matcher<L>) -> Option<Matcher<L>> {
    if implies(given, required) {
        None
    } else {
        Some(simplify(Matcher::And(
            Box::new(required.clone()),
            Box::new(Matcher::Not(Box::new(given.clone()))),
        )))
    }
}

impl<L: Leaf> std::ops::BitAnd for Matcher<L> {
    type Output = Matcher<L>;
    fn bitand(self, rhs: Self) -> Self::Output {
        self.and(rhs)
    }
}

impl<L: Leaf> std::ops::BitOr for Matcher<L> {
    type Output = Matcher<L>;
    fn bitor(self, rhs: Self) -> Self::Output {
        self.or(rhs)
    }
}

impl<L: Leaf> std::ops::Not for Matcher<L> {
    type Output = Matcher<L>;
    fn not(self) -> Self::Output {
        self.not()
    }
}
