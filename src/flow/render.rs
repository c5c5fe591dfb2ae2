//! Graphviz and Mermaid renderings of a built [`Flow`], for documentation
//! and debugging — never consulted by [`Flow::call`].

use super::dsl::StepKind;
use super::graph::Flow;

/// Render as a Graphviz `digraph`. Milestones are drawn as diamonds, steps
/// with an action as boxes.
pub fn to_graphviz<Ctx>(flow: &Flow<Ctx>) -> String {
    let mut out = String::from("digraph flow {\n");
    for step in flow.steps() {
        let shape = match &step.kind {
            StepKind::Milestone => "diamond",
            StepKind::Action(_) => "box",
        };
        out.push_str(&format!("    \"{}\" [shape={shape}];\n", step.tag.name()));
    }
    for (from, to) in flow.edges() {
        out.push_str(&format!("    \"{}\" -> \"{}\";\n", from.name(), to.name()));
    }
    out.push_str("}\n");
    out
}

/// Render as a Mermaid `graph TD` diagram.
pub fn to_mermaid<Ctx>(flow: &Flow<Ctx>) -> String {
    let mut out = String::from("graph TD\n");
    for step in flow.steps() {
        let node = match &step.kind {
            StepKind::Milestone => format!("{name}{{{{{name}}}}}", name = step.tag.name()),
            StepKind::Action(_) => format!("{name}[{name}]", name = step.tag.name()),
        };
        out.push_str(&format!("    {node}\n"));
    }
    for (from, to) in flow.edges() {
        out.push_str(&format!("    {} --> {}\n", from.name(), to.name()));
    }
    out
}
