//! Snapshot tests for the Graphviz/Mermaid flow renderers.

use cib::flow::render::{to_graphviz, to_mermaid};
use cib::flow::{action, build, milestone, step_ref, Expr};
use cib::Tag;

struct Start;
impl Tag for Start {
    const NAME: &'static str = "start";
}
struct Check;
impl Tag for Check {
    const NAME: &'static str = "check";
}

fn sample_flow() -> cib::Flow<()> {
    let expr: Expr<()> =
        (action::<Start, ()>(|| {}) >> step_ref::<Check, _>()) & milestone::<Check, ()>();
    build(expr).expect("two-node chain has no cycle")
}

#[test]
fn graphviz_rendering() {
    let flow = sample_flow();
    insta::assert_snapshot!(to_graphviz(&flow), @r#"
    digraph flow {
        "start" [shape=box];
        "check" [shape=diamond];
        "start" -> "check";
    }
    "#);
}

#[test]
fn mermaid_rendering() {
    let flow = sample_flow();
    insta::assert_snapshot!(to_mermaid(&flow), @r#"
    graph TD
        start[start]
        check{{check}}
        start --> check
    "#);
}
