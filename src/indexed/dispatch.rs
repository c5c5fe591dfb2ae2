//! The compiled dispatcher: per-field candidate bitsets plus the residual
//! matcher check, per §4.3's dispatch algorithm.

use std::sync::Arc;

use ahash::AHashMap;
use fixedbitset::FixedBitSet;

use crate::matcher::algebra::Matcher;
use crate::matcher::field::{Field, FieldLeaf};

pub(crate) struct Callback<Msg, Extra> {
    pub(crate) name: &'static str,
    pub(crate) matcher: Matcher<FieldLeaf>,
    pub(crate) action: Arc<dyn Fn(&Msg, &Extra) + Send + Sync>,
}

pub(crate) struct IndexedField {
    pub(crate) field: Arc<Field>,
    pub(crate) map: AHashMap<u64, FixedBitSet>,
    pub(crate) default: FixedBitSet,
}

/// A compiled set of callbacks, ready to [`dispatch`](IndexedHandler::dispatch)
/// against incoming messages in O(#indexed fields + #candidates).
pub struct IndexedHandler<Msg, Extra = ()> {
    indexed_fields: Vec<IndexedField>,
    callbacks: Vec<Callback<Msg, Extra>>,
}

impl<Msg, Extra> IndexedHandler<Msg, Extra> {
    pub(crate) fn new(indexed_fields: Vec<IndexedField>, callbacks: Vec<Callback<Msg, Extra>>) -> Self {
        Self { indexed_fields, callbacks }
    }

    /// Number of callbacks compiled into this handler.
    pub fn len(&self) -> usize {
        self.callbacks.len()
    }

    /// `true` if this handler has no callbacks at all.
    pub fn is_empty(&self) -> bool {
        self.callbacks.is_empty()
    }
}

impl<Msg, Extra> IndexedHandler<Msg, Extra>
where
    Msg: AsRef<[u8]>,
{
    /// Dispatch `msg`, invoking every callback whose matcher is satisfied by
    /// it, in declaration order, passing `extra` alongside the message to
    /// every invoked action.
    ///
    /// Unmatched messages are logged via `tracing`, with each callback's
    /// [`Matcher::describe_match`] explaining why it did not fire.
    pub fn dispatch(&self, msg: &Msg, extra: &Extra) {
        let n = self.callbacks.len();
        let mut candidates = FixedBitSet::with_capacity(n);
        candidates.insert_range(..);

        for indexed in &self.indexed_fields {
            let value = indexed.field.extract(msg.as_ref());
            let mut allowed = indexed.map.get(&value).cloned().unwrap_or_else(|| FixedBitSet::with_capacity(n));
            allowed.union_with(&indexed.default);
            candidates.intersect_with(&allowed);
        }

        let mut matched = false;
        for i in candidates.ones() {
            let callback = &self.callbacks[i];
            if callback.matcher.eval(msg) {
                (callback.action)(msg, extra);
                matched = true;
            }
        }

        if !matched {
            self.log_unmatched(msg);
        }
    }

    fn log_unmatched(&self, msg: &Msg) {
        if !tracing::enabled!(tracing::Level::DEBUG) {
            return;
        }
        for callback in &self.callbacks {
            tracing::debug!(
                callback = callback.name,
                explanation = %callback.matcher.describe_match(msg),
                "message did not match any callback"
            );
        }
    }
}
