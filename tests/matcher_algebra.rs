//! Tests for the matcher algebra's invariants (§8): simplify idempotence and
//! semantic preservation, negate involution, basic implication facts, the
//! `equal_to(F,5) ∧ equal_to(F,6) = never` scenario, and `sop`'s De Morgan
//! step on negated composites.

use std::sync::Arc;

use cib::matcher::{equal_to, greater_than, implies, less_than, negate, simplify, sop, Field, Matcher};

fn f(name: &'static str) -> Arc<Field> {
    Arc::new(Field::single(name, 0, 7, 0))
}

fn buf(value: u8) -> [u8; 1] {
    [value]
}

#[test]
fn simplify_is_idempotent() {
    let field = f("x");
    let m = equal_to(Arc::clone(&field), 1).or(equal_to(Arc::clone(&field), 1));
    let once = simplify(m);
    let twice = simplify(once.clone());
    assert_eq!(once.describe(), twice.describe());
}

#[test]
fn simplify_preserves_semantics_across_sampled_inputs() {
    let field = f("x");
    let m = (equal_to(Arc::clone(&field), 3).or(equal_to(Arc::clone(&field), 5)))
        .and(less_than(Arc::clone(&field), 10));
    let simplified = simplify(m.clone());

    for v in 0u8..=20 {
        assert_eq!(m.eval(&buf(v)), simplified.eval(&buf(v)), "mismatch at x = {v}");
    }
}

#[test]
fn negate_is_an_involution() {
    let field = f("x");
    let m = equal_to(Arc::clone(&field), 7).or(greater_than(Arc::clone(&field), 2));
    let once = negate(m.clone());
    let twice = negate(once);

    for v in 0u8..=10 {
        assert_eq!(m.eval(&buf(v)), twice.eval(&buf(v)), "mismatch at x = {v}");
    }
}

#[test]
fn implies_basic_facts() {
    let field = f("x");
    let lt_3 = less_than(Arc::clone(&field), 3);
    let lt_5 = less_than(Arc::clone(&field), 5);
    assert!(implies(&lt_3, &lt_5), "x < 3 implies x < 5");
    assert!(!implies(&lt_5, &lt_3), "x < 5 does not imply x < 3");

    let eq_1 = equal_to(Arc::clone(&field), 1);
    assert!(implies(&eq_1, &lt_5), "x == 1 implies x < 5");

    assert!(implies(&Matcher::never(), &eq_1), "never implies anything");
    assert!(implies(&eq_1, &Matcher::always()), "anything implies always");
}

#[test]
fn conflicting_equalities_on_the_same_field_simplify_to_never() {
    let field = f("x");
    let m = equal_to(Arc::clone(&field), 5).and(equal_to(Arc::clone(&field), 6));
    let simplified = simplify(m);
    assert!(matches!(simplified, Matcher::Never));
}

#[test]
fn sop_of_a_negated_conjunction_applies_de_morgan() {
    // not (x == 1 and x == 2): De Morgan must turn this into
    // (not x == 1) or (not x == 2), not `x == 1 or x == 2`.
    let field = f("x");
    let m = equal_to(Arc::clone(&field), 1).and(equal_to(Arc::clone(&field), 2)).not();
    let normalized = sop(m.clone());

    for v in 0u8..=5 {
        assert_eq!(m.eval(&buf(v)), normalized.eval(&buf(v)), "mismatch at x = {v}");
    }
    // x = 1 satisfies the negated conjunction (1 != 2), so sop must too.
    assert!(normalized.eval(&buf(1)));
}

#[test]
fn sop_of_a_negated_disjunction_applies_de_morgan() {
    // not (x == 1 or x == 2): must become (not x == 1) and (not x == 2).
    let field = f("x");
    let m = equal_to(Arc::clone(&field), 1).or(equal_to(Arc::clone(&field), 2)).not();
    let normalized = sop(m.clone());

    for v in 0u8..=5 {
        assert_eq!(m.eval(&buf(v)), normalized.eval(&buf(v)), "mismatch at x = {v}");
    }
    // x = 1 violates the negated disjunction, so sop must reject it too.
    assert!(!normalized.eval(&buf(1)));
}
