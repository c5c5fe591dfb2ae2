//! End-to-end tests for `flow::build`: linearization, the lexicographic
//! tie-break, and every composition error the build algorithm can raise.

use cib::flow::{action, build, milestone, predicate, step_ref, Expr};
use cib::Tag;

struct A;
impl Tag for A {
    const NAME: &'static str = "A";
}
struct B;
impl Tag for B {
    const NAME: &'static str = "B";
}
struct C;
impl Tag for C {
    const NAME: &'static str = "C";
}
struct D;
impl Tag for D {
    const NAME: &'static str = "D";
}

fn names(order: Vec<cib::TagId>) -> Vec<&'static str> {
    order.into_iter().map(|t| t.name()).collect()
}

#[test]
fn diamond_linearizes_with_lexicographic_tie_break() {
    // A >> B, A >> C, B >> D, C >> D: both ABCD and ACBD are valid
    // topological orders; the tie-break between B and C (both ready once A
    // has run) must deterministically pick B first.
    // Each tag's real declaration (action) is listed separately from the
    // edges that reference it; the edges themselves satisfy the "mentioned"
    // requirement, so no explicit `.mentioned()` is needed here.
    let expr: Expr<()> = (step_ref::<A, _>() >> step_ref::<B, _>())
        & (step_ref::<A, _>() >> step_ref::<C, _>())
        & (step_ref::<B, _>() >> step_ref::<D, _>())
        & (step_ref::<C, _>() >> step_ref::<D, _>())
        & action::<A, ()>(|| {})
        & action::<B, ()>(|| {})
        & action::<C, ()>(|| {})
        & action::<D, ()>(|| {});

    let flow = build(expr).expect("diamond graph has no cycle");
    assert_eq!(names(flow.order()), vec!["A", "B", "C", "D"]);
}

#[test]
fn call_skips_steps_whose_predicate_is_false() {
    use std::sync::atomic::{AtomicU32, Ordering};
    static RAN: AtomicU32 = AtomicU32::new(0);

    struct Ctx {
        enabled: bool,
    }

    let gate = predicate::<Ctx>("enabled", |ctx| ctx.enabled);
    let expr: Expr<Ctx> = action::<A, Ctx>(|| {
        RAN.fetch_add(1, Ordering::SeqCst);
    })
    .predicated(gate)
    .mentioned();

    let flow = build(expr).unwrap();
    flow.call(&Ctx { enabled: false });
    assert_eq!(RAN.load(Ordering::SeqCst), 0);
    flow.call(&Ctx { enabled: true });
    assert_eq!(RAN.load(Ordering::SeqCst), 1);
}

#[test]
fn cycle_is_rejected() {
    // A >> B >> A, both declared.
    let expr: Expr<()> =
        (milestone::<A, ()>() >> step_ref::<B, _>()) & (milestone::<B, ()>() >> step_ref::<A, _>());

    let err = build(expr).expect_err("a cycle between A and B must be rejected");
    assert_eq!(err.len(), 1);
    match &err[0] {
        cib::CompositionError::FlowCycle { steps } => {
            let mut steps = steps.clone();
            steps.sort();
            assert_eq!(steps, vec!["A".to_string(), "B".to_string()]);
        }
        other => panic!("expected FlowCycle, got {other:?}"),
    }
}

#[test]
fn edge_to_an_undeclared_step_is_missing_flow_step() {
    // B is referenced by the edge but never declared with a milestone/action.
    let expr: Expr<()> = milestone::<A, ()>() >> step_ref::<B, _>();

    let errors = build(expr).expect_err("B was never declared");
    assert!(errors
        .iter()
        .any(|e| matches!(e, cib::CompositionError::MissingFlowStep { step } if step == "B")));
}

#[test]
fn declared_step_with_no_edge_or_mention_is_unlinked() {
    let expr: Expr<()> = milestone::<A, ()>().mentioned() & milestone::<B, ()>();

    let errors = build(expr).expect_err("B was declared but never linked");
    assert!(errors
        .iter()
        .any(|e| matches!(e, cib::CompositionError::UnlinkedFlowStep { step } if step == "B")));
}

#[test]
fn mentioning_the_same_step_twice_is_a_duplicate() {
    let expr: Expr<()> = milestone::<A, ()>().mentioned() & milestone::<A, ()>().mentioned();

    let errors = build(expr).expect_err("A was declared twice");
    assert!(errors
        .iter()
        .any(|e| matches!(e, cib::CompositionError::DuplicateFlowStep { step } if step == "A")));
}

#[test]
fn edge_predicate_weaker_than_endpoints_is_rejected() {
    struct Ctx {
        flag: bool,
    }
    let strong = predicate::<Ctx>("flag", |ctx| ctx.flag);

    // Both endpoints are declared (not bare refs), so the edge itself
    // satisfies the "mentioned" requirement for both.
    let expr: Expr<Ctx> = milestone::<A, Ctx>().predicated(strong.clone())
        >> milestone::<B, Ctx>().predicated(strong);

    let errors = build(expr).expect_err("edge has no predicate, but both endpoints require `flag`");
    assert!(errors
        .iter()
        .any(|e| matches!(e, cib::CompositionError::WeakerEdgePredicate { .. })));
}

#[test]
fn edge_gated_by_the_same_predicate_as_its_endpoints_is_accepted() {
    struct Ctx {
        flag: bool,
    }
    let strong = predicate::<Ctx>("flag", |ctx| ctx.flag);

    let expr: Expr<Ctx> = (milestone::<A, Ctx>().predicated(strong.clone())
        >> milestone::<B, Ctx>().predicated(strong.clone()))
    .gated_by(strong);

    build(expr).expect("edge predicate matches both endpoints exactly");
}
