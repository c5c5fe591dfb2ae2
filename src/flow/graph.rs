//! Builds a [`Flow`] from an [`Expr`] tree: §4.2's build algorithm —
//! extract nodes and edges, validate the mentioned set, check edge
//! predicates against their endpoints, then linearize with Kahn's algorithm
//! and a lexicographic tie-break.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, HashSet};

use indexmap::IndexMap;
use petgraph::graphmap::DiGraphMap;
use petgraph::Direction;

use crate::error::CompositionError;
use crate::matcher::algebra::{missing, Matcher};
use crate::tag::TagId;

use super::dsl::{Expr, FlowPredicate, Step, StepKind};

struct Edge<Ctx> {
    from: TagId,
    to: TagId,
    predicate: Option<FlowPredicate<Ctx>>,
}

struct Collected<Ctx> {
    nodes: IndexMap<TagId, Step<Ctx>>,
    edges: Vec<Edge<Ctx>>,
    mentioned: HashSet<TagId>,
    duplicates: Vec<TagId>,
}

impl<Ctx> Collected<Ctx> {
    fn new() -> Self {
        Self {
            nodes: IndexMap::new(),
            edges: Vec::new(),
            mentioned: HashSet::new(),
            duplicates: Vec::new(),
        }
    }

    fn mention(&mut self, tag: TagId) {
        if !self.mentioned.insert(tag) {
            self.duplicates.push(tag);
        }
    }
}

/// Returns this subexpression's entry points (nodes with no predecessor
/// within it) and exit points (no successor within it).
fn collect<Ctx>(expr: &Expr<Ctx>, out: &mut Collected<Ctx>) -> (Vec<TagId>, Vec<TagId>) {
    match expr {
        Expr::Ref(tag) => (vec![*tag], vec![*tag]),
        Expr::Leaf(step) => {
            if out.nodes.insert(step.tag, step.clone()).is_some() {
                out.duplicates.push(step.tag);
            }
            (vec![step.tag], vec![step.tag])
        }
        Expr::Before(l, r, pred) => {
            let (entries_l, exits_l) = collect(l, out);
            let (entries_r, exits_r) = collect(r, out);
            for &u in &exits_l {
                for &v in &entries_r {
                    out.edges.push(Edge { from: u, to: v, predicate: pred.clone() });
                    out.mentioned.insert(u);
                    out.mentioned.insert(v);
                }
            }
            (entries_l, exits_r)
        }
        Expr::Parallel(branches) => {
            let mut entries = Vec::new();
            let mut exits = Vec::new();
            for branch in branches {
                let (e, x) = collect(branch, out);
                entries.extend(e);
                exits.extend(x);
            }
            (entries, exits)
        }
        Expr::Mentioned(inner) => {
            let (entries, exits) = collect(inner, out);
            let mut seen = HashSet::new();
            for &tag in entries.iter().chain(exits.iter()) {
                if seen.insert(tag) {
                    out.mention(tag);
                }
            }
            (entries, exits)
        }
    }
}

/// A linearized flow graph, ready to [`call`](Flow::call).
pub struct Flow<Ctx> {
    order: Vec<Step<Ctx>>,
    edges: Vec<(TagId, TagId)>,
}

impl<Ctx> Flow<Ctx> {
    /// Invoke every step's action, in topological order, skipping any step
    /// whose predicate is false for `ctx`. Milestones are walked over but
    /// have no action to invoke.
    pub fn call(&self, ctx: &Ctx) {
        for step in &self.order {
            if !step.predicate.eval(ctx) {
                continue;
            }
            if let StepKind::Action(action) = &step.kind {
                action();
            }
        }
    }

    /// The linearization, as tag names in invocation order. Mostly useful
    /// for tests and [`render`](super::render).
    pub fn order(&self) -> Vec<TagId> {
        self.order.iter().map(|s| s.tag).collect()
    }

    pub(crate) fn steps(&self) -> &[Step<Ctx>] {
        &self.order
    }

    /// The edges of the underlying graph, as `(from, to)` tag pairs, in no
    /// particular order. Used by [`render`](super::render).
    pub fn edges(&self) -> &[(TagId, TagId)] {
        &self.edges
    }
}

/// Build a [`Flow`] from a graph expression, per §4.2's build algorithm.
///
/// Fails with every applicable [`CompositionError`] at once (not just the
/// first): missing mentions, duplicate mentions, orphaned declarations,
/// under-gated edges, and — checked last, since it's the only failure that
/// can't be localized to one step — a cycle.
pub fn build<Ctx>(expr: Expr<Ctx>) -> Result<Flow<Ctx>, Vec<CompositionError>> {
    let mut collected = Collected::new();
    collect(&expr, &mut collected);

    let mut errors = Vec::new();

    let declared: HashSet<TagId> = collected.nodes.keys().copied().collect();
    let referenced: HashSet<TagId> =
        collected.edges.iter().flat_map(|e| [e.from, e.to]).collect();

    let mut missing_steps: Vec<TagId> = referenced.difference(&declared).copied().collect();
    missing_steps.sort_by_key(|t| t.name());
    for tag in missing_steps {
        errors.push(CompositionError::MissingFlowStep { step: tag.name().to_string() });
    }

    let mut dup: Vec<TagId> = collected.duplicates.clone();
    dup.sort_by_key(|t| t.name());
    dup.dedup();
    for tag in dup {
        errors.push(CompositionError::DuplicateFlowStep { step: tag.name().to_string() });
    }

    let mut unlinked: Vec<TagId> = declared.difference(&collected.mentioned).copied().collect();
    unlinked.sort_by_key(|t| t.name());
    for tag in unlinked {
        errors.push(CompositionError::UnlinkedFlowStep { step: tag.name().to_string() });
    }

    if !errors.is_empty() {
        return Err(errors);
    }

    for edge in &collected.edges {
        let from_pred = &collected.nodes[&edge.from].predicate;
        let to_pred = &collected.nodes[&edge.to].predicate;
        let required = Matcher::and(from_pred.clone(), to_pred.clone());
        let edge_pred = edge.predicate.clone().unwrap_or_else(Matcher::always);
        if let Some(gap) = missing(&edge_pred, &required) {
            errors.push(CompositionError::WeakerEdgePredicate {
                from: edge.from.name().to_string(),
                to: edge.to.name().to_string(),
                missing: gap.describe(),
            });
        }
    }

    if !errors.is_empty() {
        return Err(errors);
    }

    let mut graph: DiGraphMap<TagId, ()> = DiGraphMap::new();
    for &tag in declared.iter() {
        graph.add_node(tag);
    }
    for edge in &collected.edges {
        graph.add_edge(edge.from, edge.to, ());
    }

    let edges = collected.edges.iter().map(|e| (e.from, e.to)).collect();

    match topo_sort(&graph) {
        Ok(order) => {
            let steps = order
                .into_iter()
                .map(|tag| collected.nodes.shift_remove(&tag).expect("topo_sort only emits declared tags"))
                .collect();
            Ok(Flow { order: steps, edges })
        }
        Err(mut remaining) => {
            remaining.sort_by_key(|t| t.name());
            Err(vec![CompositionError::FlowCycle {
                steps: remaining.into_iter().map(|t| t.name().to_string()).collect(),
            }])
        }
    }
}

/// Kahn's algorithm with a lexicographic (by tag name) tie-break among
/// ready nodes, so the linearization is deterministic regardless of
/// insertion order.
fn topo_sort(graph: &DiGraphMap<TagId, ()>) -> Result<Vec<TagId>, Vec<TagId>> {
    let mut in_degree: HashMap<TagId, usize> = graph
        .nodes()
        .map(|n| (n, graph.neighbors_directed(n, Direction::Incoming).count()))
        .collect();

    let mut ready: BinaryHeap<Reverse<TagId>> = in_degree
        .iter()
        .filter(|&(_, &deg)| deg == 0)
        .map(|(&tag, _)| Reverse(tag))
        .collect();

    let mut order = Vec::with_capacity(graph.node_count());
    while let Some(Reverse(tag)) = ready.pop() {
        order.push(tag);
        for succ in graph.neighbors_directed(tag, Direction::Outgoing) {
            let deg = in_degree.get_mut(&succ).expect("successor was counted into in_degree");
            *deg -= 1;
            if *deg == 0 {
                ready.push(Reverse(succ));
            }
        }
    }

    if order.len() == graph.node_count() {
        Ok(order)
    } else {
        let remaining = in_degree.into_iter().filter(|&(_, deg)| deg > 0).map(|(tag, _)| tag).collect();
        Err(remaining)
    }
}
