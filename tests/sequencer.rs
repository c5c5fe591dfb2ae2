//! Tests for the bidirectional [`cib::flow::Sequencer`], grounded on the
//! original `test/seq/sequencer.cpp` scenarios: an empty chain, a single slow
//! step in each direction, a direction reversal mid-retry, and a multi-step
//! chain that cascades within a single call.

use std::cell::Cell;
use std::sync::{Arc, Mutex};

use cib::flow::{SequencerBuilder, Status};

#[test]
fn empty_sequencer_is_immediately_done_in_either_direction() {
    let mut seq = SequencerBuilder::new().build();
    assert_eq!(seq.forward(), Status::Done);
    assert_eq!(seq.backward(), Status::Done);
}

#[test]
fn single_step_that_settles_immediately_round_trips() {
    let mut seq = SequencerBuilder::new()
        .step("s1", || Status::Done, || Status::Done)
        .build();
    assert_eq!(seq.current(), Some("s1"));
    assert_eq!(seq.forward(), Status::Done);
    assert_eq!(seq.backward(), Status::Done);
}

#[test]
fn forward_retries_a_slow_step_until_it_reports_done() {
    let calls = Cell::new(0);
    let mut seq = SequencerBuilder::new()
        .step(
            "slow",
            move || {
                calls.set(calls.get() + 1);
                if calls.get() < 3 {
                    Status::NotDone
                } else {
                    Status::Done
                }
            },
            || Status::Done,
        )
        .build();

    assert_eq!(seq.forward(), Status::NotDone);
    assert_eq!(seq.forward(), Status::NotDone);
    assert_eq!(seq.forward(), Status::Done);
}

#[test]
fn backward_call_keeps_retrying_a_pending_forward_until_it_completes() {
    // Mirrors the original's "backward can be called, but will not proceed
    // until forward is done" scenario: while `forward` is mid-retry, calling
    // `backward` keeps invoking `forward` (not `backward`) until it settles,
    // and only then pivots to actually driving backward once.
    let log: Arc<Mutex<String>> = Arc::new(Mutex::new(String::new()));
    let forward_calls = Arc::new(Mutex::new(0u32));

    let log_fwd = Arc::clone(&log);
    let log_bwd = Arc::clone(&log);
    let mut seq = SequencerBuilder::new()
        .step(
            "s1",
            move || {
                let mut n = forward_calls.lock().unwrap();
                *n += 1;
                log_fwd.lock().unwrap().push('F');
                if *n < 3 {
                    Status::NotDone
                } else {
                    Status::Done
                }
            },
            move || {
                log_bwd.lock().unwrap().push('B');
                Status::Done
            },
        )
        .build();

    assert_eq!(seq.forward(), Status::NotDone); // F
    assert_eq!(seq.backward(), Status::NotDone); // F, still mid-retry
    assert_eq!(seq.backward(), Status::Done); // F completes, then B once
    assert_eq!(*log.lock().unwrap(), "FFFB");
}

#[test]
fn three_step_chain_cascades_within_a_single_call() {
    let log: Arc<Mutex<String>> = Arc::new(Mutex::new(String::new()));

    fn mk(
        name: &'static str,
        log: Arc<Mutex<String>>,
    ) -> (impl FnMut() -> Status + Send + 'static, impl FnMut() -> Status + Send + 'static) {
        let fwd_log = Arc::clone(&log);
        let bwd_log = log;
        (
            move || {
                fwd_log.lock().unwrap().push_str(&format!("F{name}"));
                Status::Done
            },
            move || {
                bwd_log.lock().unwrap().push_str(&format!("B{name}"));
                Status::Done
            },
        )
    }

    let (f1, b1) = mk("1", Arc::clone(&log));
    let (f2, b2) = mk("2", Arc::clone(&log));
    let (f3, b3) = mk("3", Arc::clone(&log));

    let mut seq = SequencerBuilder::new()
        .step("s1", f1, b1)
        .step("s2", f2, b2)
        .step("s3", f3, b3)
        .build();

    assert_eq!(seq.forward(), Status::Done);
    assert_eq!(*log.lock().unwrap(), "F1F2F3");

    assert_eq!(seq.backward(), Status::Done);
    assert_eq!(*log.lock().unwrap(), "F1F2F3B3B2B1");
}
