//! The composition error taxonomy.
//!
//! Every error in `cib`'s core is a *composition* error: something the
//! [`nexus`](crate::nexus) or [`flow`](crate::flow) builder discovers while
//! assembling the program, before any service is ever called. There is no
//! run-time error surface on the dispatch path; an unmatched message is
//! logged (see [`indexed`](crate::indexed)), not raised as an error.

use miette::Diagnostic;
use thiserror::Error;

/// A single composition-time failure, naming the tag(s) or step(s) at fault.
#[derive(Debug, Error, Diagnostic)]
pub enum CompositionError {
    /// An `extend<Tag, ...>` whose leading tag is not exported anywhere in
    /// the project.
    #[error("`extend` targets `{tag}`, but no component exports a service with that tag")]
    #[diagnostic(code(cib::missing_export))]
    MissingExport {
        /// The tag named by the dangling `extend`.
        tag: String,
    },

    /// The same tag appears in `exports<...>` more than once, reachably.
    #[error("`{tag}` is exported more than once")]
    #[diagnostic(code(cib::duplicate_export))]
    DuplicateExport {
        /// The tag exported twice.
        tag: String,
    },

    /// A step appears as the endpoint of a flow edge but was never mentioned
    /// (via a bare step reference or `*step`).
    #[error("flow step `{step}` appears in an edge but is never mentioned")]
    #[diagnostic(code(cib::missing_flow_step))]
    MissingFlowStep {
        /// The step that needs a mention somewhere in the graph expression.
        step: String,
    },

    /// A step was mentioned more than once in the same flow graph.
    #[error("flow step `{step}` is mentioned more than once")]
    #[diagnostic(code(cib::duplicate_flow_step))]
    DuplicateFlowStep {
        /// The step mentioned twice.
        step: String,
    },

    /// A step was declared (added to the node set) but never connected by
    /// any edge or explicit mention.
    #[error("flow step `{step}` is declared but never linked into the graph")]
    #[diagnostic(code(cib::unlinked_flow_step))]
    UnlinkedFlowStep {
        /// The orphaned step.
        step: String,
    },

    /// The partial order over flow steps contains a cycle.
    #[error("cycle in flow graph among steps: {}", steps.join(", "))]
    #[diagnostic(code(cib::flow_cycle))]
    FlowCycle {
        /// The steps left with a nonzero in-degree when Kahn's algorithm stalled.
        steps: Vec<String>,
    },

    /// An edge's predicate does not imply the conjunction of its endpoints'
    /// predicates.
    #[error(
        "edge `{from} >> {to}` is gated by a predicate weaker than its endpoints; missing: {missing}"
    )]
    #[diagnostic(code(cib::weaker_edge_predicate))]
    WeakerEdgePredicate {
        /// The edge's source step.
        from: String,
        /// The edge's destination step.
        to: String,
        /// A rendering of the predicate the edge is missing.
        missing: String,
    },

    /// A matcher refers to a field that does not belong to its message's
    /// declared field set.
    #[error("matcher `{matcher}` refers to field `{field}`, which is not declared on this message")]
    #[diagnostic(code(cib::malformed_matcher))]
    MalformedMatcher {
        /// A rendering of the offending matcher.
        matcher: String,
        /// The field name the matcher refers to.
        field: String,
    },
}

/// A non-fatal composition observation: the program still assembles, but the
/// author probably made a mistake.
#[derive(Debug, Error, Diagnostic, Clone, PartialEq, Eq)]
pub enum CompositionWarning {
    /// A callback's matcher simplified to `never`; it can never fire and is
    /// a candidate for removal.
    #[error("callback `{callback}` can never fire: its matcher simplifies to `never`")]
    #[diagnostic(code(cib::unsatisfiable_matcher), severity(warning))]
    UnsatisfiableMatcher {
        /// The callback whose matcher is unsatisfiable.
        callback: String,
    },
}
