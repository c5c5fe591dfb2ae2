//! End-to-end tests for the indexed message handler builder (§4.3): building
//! a per-field index from a fixed callback set and dispatching against it.

use std::sync::{Arc, Mutex};

use cib::indexed::IndexedHandlerBuilder;
use cib::matcher::{equal_to, greater_than, Field};

fn field(name: &'static str, byte: usize) -> Arc<Field> {
    Arc::new(Field::single(name, byte, 7, 0))
}

#[test]
fn dispatch_fires_every_callback_whose_matcher_holds() {
    let c1 = field("c1", 0);
    let c2 = field("c2", 1);
    let c3 = field("c3", 2);

    let fired: Arc<Mutex<Vec<&'static str>>> = Arc::new(Mutex::new(Vec::new()));

    let (handler, warnings) = IndexedHandlerBuilder::<[u8; 3], ()>::new(vec![
        Arc::clone(&c1),
        Arc::clone(&c2),
        Arc::clone(&c3),
    ])
    .callback("c1_is_1", equal_to(Arc::clone(&c1), 1), {
        let fired = Arc::clone(&fired);
        move |_msg: &[u8; 3], _extra: &()| fired.lock().unwrap().push("c1_is_1")
    })
    .callback(
        "c1_is_1_and_c2_is_2",
        equal_to(Arc::clone(&c1), 1).and(equal_to(Arc::clone(&c2), 2)),
        {
            let fired = Arc::clone(&fired);
            move |_msg: &[u8; 3], _extra: &()| fired.lock().unwrap().push("c1_is_1_and_c2_is_2")
        },
    )
    .callback("c3_is_3", equal_to(Arc::clone(&c3), 3), {
        let fired = Arc::clone(&fired);
        move |_msg: &[u8; 3], _extra: &()| fired.lock().unwrap().push("c3_is_3")
    })
    .build()
    .expect("every matcher only names declared fields");

    assert!(warnings.is_empty());
    assert_eq!(handler.len(), 3);

    handler.dispatch(&[1, 2, 0], &());
    let mut got = fired.lock().unwrap().clone();
    got.sort_unstable();
    assert_eq!(got, vec!["c1_is_1", "c1_is_1_and_c2_is_2"]);
}

#[test]
fn dispatch_leaves_unmatched_messages_with_no_side_effect() {
    let c1 = field("c1", 0);
    let (handler, _warnings) = IndexedHandlerBuilder::<[u8; 1], ()>::new(vec![Arc::clone(&c1)])
        .callback("c1_is_9", equal_to(Arc::clone(&c1), 9), |_: &[u8; 1], _: &()| {
            panic!("must not fire for a message where c1 != 9");
        })
        .build()
        .expect("c1 is a declared field");

    handler.dispatch(&[1], &());
}

#[test]
fn non_equality_constraint_on_an_indexed_field_still_dispatches_correctly() {
    // `c1 > 5` can't be represented as a finite set of matching values in the
    // per-field map; it must fall into the default bucket and still be
    // caught by the residual matcher re-check.
    let c1 = field("c1", 0);
    let fired = Arc::new(Mutex::new(false));

    let (handler, _warnings) = IndexedHandlerBuilder::<[u8; 1], ()>::new(vec![Arc::clone(&c1)])
        .callback("c1_gt_5", greater_than(Arc::clone(&c1), 5), {
            let fired = Arc::clone(&fired);
            move |_: &[u8; 1], _: &()| *fired.lock().unwrap() = true
        })
        .build()
        .expect("c1 is a declared field");

    handler.dispatch(&[3], &());
    assert!(!*fired.lock().unwrap());

    handler.dispatch(&[10], &());
    assert!(*fired.lock().unwrap());
}

#[test]
fn unsatisfiable_callback_is_reported_as_a_warning_but_still_compiles() {
    let c1 = field("c1", 0);
    let (handler, warnings) = IndexedHandlerBuilder::<[u8; 1], ()>::new(vec![Arc::clone(&c1)])
        .callback(
            "impossible",
            equal_to(Arc::clone(&c1), 1).and(equal_to(Arc::clone(&c1), 2)),
            |_: &[u8; 1], _: &()| panic!("an unsatisfiable matcher must never fire"),
        )
        .build()
        .expect("c1 is a declared field");

    assert_eq!(handler.len(), 1);
    assert_eq!(warnings.len(), 1);
    match &warnings[0] {
        cib::CompositionWarning::UnsatisfiableMatcher { callback } => assert_eq!(callback, "impossible"),
    }

    handler.dispatch(&[1], &());
    handler.dispatch(&[2], &());
}

#[test]
fn matcher_naming_an_undeclared_field_is_malformed_matcher() {
    let c1 = field("c1", 0);
    let stray = field("stray", 1);

    let errors = IndexedHandlerBuilder::<[u8; 2], ()>::new(vec![Arc::clone(&c1)])
        .callback("uses_stray", equal_to(Arc::clone(&stray), 1), |_: &[u8; 2], _: &()| {
            panic!("a malformed matcher must never compile into a dispatchable callback");
        })
        .build()
        .expect_err("`stray` is not in the declared field set");

    assert_eq!(errors.len(), 1);
    match &errors[0] {
        cib::CompositionError::MalformedMatcher { field, .. } => assert_eq!(field, "stray"),
        other => panic!("expected MalformedMatcher, got {other:?}"),
    }
}
