//! Boolean matchers over messages, and the bit-field addressing they test.
//!
//! [`algebra`] is the generic boolean algebra (`and`/`or`/`not`, `simplify`,
//! `sop`, `implies`) shared by [`flow`](crate::flow)'s predicate checks and
//! [`indexed`](crate::indexed)'s preprocessing pass. [`field`] instantiates
//! it with relational leaves over bit-packed message fields.

pub mod algebra;
pub mod field;

pub use algebra::{implies, negate, simplify, sop, Evaluate, Leaf, Matcher};
pub use field::{
    equal_to, greater_equal, greater_than, in_values, less_equal, less_than, not_equal_to, Field,
    FieldLeaf, Relation, Slice,
};
