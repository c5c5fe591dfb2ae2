//! Compiles a fixed set of `(matcher, action)` callbacks into a per-field
//! lookup structure, per §4.3.

use std::sync::Arc;

use ahash::AHashMap;
use fixedbitset::FixedBitSet;

use crate::error::{CompositionError, CompositionWarning};
use crate::matcher::algebra::{sop, Leaf, Matcher};
use crate::matcher::field::{Field, FieldLeaf, Relation};

use super::dispatch::{Callback, IndexedField, IndexedHandler};

/// Accumulates callbacks for one indexed service, then [`build`](IndexedHandlerBuilder::build)s
/// the compiled dispatcher.
///
/// `Msg` is the message type dispatched over; `Extra` is threaded through to
/// every action alongside the message (use `()` for none, a tuple for several).
pub struct IndexedHandlerBuilder<Msg, Extra = ()> {
    indexed_fields: Vec<Arc<Field>>,
    declared_fields: Vec<Arc<Field>>,
    callbacks: Vec<Callback<Msg, Extra>>,
}

impl<Msg, Extra> IndexedHandlerBuilder<Msg, Extra>
where
    Msg: 'static,
    Extra: 'static,
{
    /// Declare which fields are indexable for this service. Order is
    /// preserved and determines dispatch's per-message lookup order.
    ///
    /// The indexed fields also become this message's declared field set (see
    /// [`IndexedHandlerBuilder::declared_fields`]) unless overridden.
    pub fn new(indexed_fields: Vec<Arc<Field>>) -> Self {
        Self {
            declared_fields: indexed_fields.clone(),
            indexed_fields,
            callbacks: Vec::new(),
        }
    }

    /// Override this message's full declared field set: every field a
    /// callback's matcher is allowed to name, not just the indexed ones.
    ///
    /// A matcher naming a field outside this set is a composition error
    /// ([`CompositionError::MalformedMatcher`]), caught by [`build`](Self::build)
    /// rather than surfacing as a runtime lookup miss.
    pub fn declared_fields(mut self, fields: Vec<Arc<Field>>) -> Self {
        self.declared_fields = fields;
        self
    }

    /// Add one callback. Callbacks fire in the order they were added.
    pub fn callback(
        mut self,
        name: &'static str,
        matcher: Matcher<FieldLeaf>,
        action: impl Fn(&Msg, &Extra) + Send + Sync + 'static,
    ) -> Self {
        self.callbacks.push(Callback {
            name,
            matcher,
            action: Arc::new(action),
        });
        self
    }

    /// Compile the accumulated callbacks into a dispatcher.
    ///
    /// Fails with one [`CompositionError::MalformedMatcher`] per callback
    /// leaf naming a field outside this message's declared field set. If
    /// composition succeeds, also returns one
    /// [`CompositionWarning::UnsatisfiableMatcher`] per callback whose
    /// matcher simplifies to `never` — such a callback can never fire and is
    /// a candidate for removal, but its presence doesn't fail composition.
    pub fn build(self) -> Result<(IndexedHandler<Msg, Extra>, Vec<CompositionWarning>), Vec<CompositionError>> {
        let mut errors = Vec::new();
        for cb in &self.callbacks {
            let mut fields = Vec::new();
            collect_fields(&cb.matcher, &mut fields);
            for field in fields {
                if !self.declared_fields.iter().any(|f| f.name == field.name) {
                    errors.push(CompositionError::MalformedMatcher {
                        matcher: cb.matcher.describe(),
                        field: field.name.to_string(),
                    });
                }
            }
        }
        if !errors.is_empty() {
            return Err(errors);
        }

        let n = self.callbacks.len();
        let mut warnings = Vec::new();

        let normalized: Vec<(Callback<Msg, Extra>, Matcher<FieldLeaf>)> = self
            .callbacks
            .into_iter()
            .map(|cb| {
                let normal = sop(crate::matcher::algebra::simplify(cb.matcher.clone()));
                if matches!(normal, Matcher::Never) {
                    warnings.push(CompositionWarning::UnsatisfiableMatcher {
                        callback: cb.name.to_string(),
                    });
                }
                (cb, normal)
            })
            .collect();

        let indexed_fields = self
            .indexed_fields
            .iter()
            .map(|field| build_field_index(field, &normalized, n))
            .collect();

        let callbacks = normalized.into_iter().map(|(cb, _)| cb).collect();

        Ok((IndexedHandler::new(indexed_fields, callbacks), warnings))
    }
}

/// Every field a matcher's leaves refer to, in tree order, duplicates included.
fn collect_fields(m: &Matcher<FieldLeaf>, out: &mut Vec<Arc<Field>>) {
    match m {
        Matcher::Always | Matcher::Never => {}
        Matcher::Leaf(l) => out.push(Arc::clone(&l.field)),
        Matcher::Not(inner) => collect_fields(inner, out),
        Matcher::And(l, r) | Matcher::Or(l, r) => {
            collect_fields(l, out);
            collect_fields(r, out);
        }
    }
}

/// One product term of a sum-of-products formula: a conjunction of leaves.
fn flatten_and(m: &Matcher<FieldLeaf>) -> Vec<FieldLeaf> {
    match m {
        Matcher::And(l, r) => {
            let mut v = flatten_and(l);
            v.extend(flatten_and(r));
            v
        }
        Matcher::Leaf(l) => vec![l.clone()],
        Matcher::Always => vec![],
        Matcher::Never => vec![],
        Matcher::Not(_) => {
            unreachable!("sum-of-products over field leaves never leaves a bare `not`")
        }
        Matcher::Or(_, _) => unreachable!("a product term cannot itself contain `or`"),
    }
}

/// Every product term (conjunction of leaves) in a sum-of-products formula.
fn product_terms(m: &Matcher<FieldLeaf>) -> Vec<Vec<FieldLeaf>> {
    match m {
        Matcher::Or(l, r) => {
            let mut v = product_terms(l);
            v.extend(product_terms(r));
            v
        }
        Matcher::Never => vec![],
        other => vec![flatten_and(other)],
    }
}

fn term_is_satisfiable(term: &[FieldLeaf]) -> bool {
    for (i, a) in term.iter().enumerate() {
        for b in &term[i + 1..] {
            if a.field == b.field && a.conflicts_leaf(b) {
                return false;
            }
        }
    }
    true
}

fn build_field_index<Msg, Extra>(
    field: &Arc<Field>,
    normalized: &[(Callback<Msg, Extra>, Matcher<FieldLeaf>)],
    n: usize,
) -> IndexedField {
    let mut map: AHashMap<u64, FixedBitSet> = AHashMap::new();
    let mut default = FixedBitSet::with_capacity(n);

    for (i, (_, formula)) in normalized.iter().enumerate() {
        for term in product_terms(formula) {
            if !term_is_satisfiable(&term) {
                // Distributing `AND` over `OR` in `sop` can produce a product
                // term whose leaves conflict even though the pre-`sop`
                // formula didn't; such a term contributes no candidates.
                continue;
            }
            let mut equalities = Vec::new();
            let mut unconstrained = true;
            for leaf in &term {
                if leaf.field != *field {
                    continue;
                }
                unconstrained = false;
                if leaf.relation == Relation::Eq {
                    equalities.push(leaf.value);
                } else {
                    // A non-equality constraint on an indexed field can't be
                    // represented as a finite set of matching values; fall
                    // back to the default bucket and let the residual
                    // `matcher.eval` call in `dispatch` filter it precisely.
                    unconstrained = true;
                }
            }
            if unconstrained {
                default.set(i, true);
            }
            for v in equalities {
                map.entry(v).or_insert_with(|| FixedBitSet::with_capacity(n)).set(i, true);
            }
        }
    }

    IndexedField {
        field: Arc::clone(field),
        map,
        default,
    }
}
