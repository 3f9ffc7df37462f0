//! Explicit-stack depth-first walk shared by every trace query
//!
//! The walk keeps a frontier of `(service, depth)` entries, the path from the
//! start to the node being visited, and the cumulative latency at every path
//! position. Popping an entry first cuts the path back to that entry's depth,
//! discarding whatever an abandoned sibling branch left behind, then appends
//! the node. Cumulative latencies saturate instead of overflowing.
//!
//! The walk itself never decides what counts as a match or which revisits are
//! allowed. A [`Visitor`] inspects each [`Trail`] and answers
//! [`Visit::Expand`] or [`Visit::Prune`].

use crate::graph::ServiceGraph;
use crate::{Latency, ServiceId};
use tracing::{trace, warn};

/// Decision taken for the node at the end of a trail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visit {
    /// Push this node's neighbors onto the frontier
    Expand,
    /// Backtrack without exploring further from this node
    Prune,
}

/// The branch currently being examined.
#[derive(Debug, Clone, Copy)]
pub struct Trail<'a> {
    nodes: &'a [&'a ServiceId],
    latency: Latency,
}

impl<'a> Trail<'a> {
    /// Service at the end of the trail
    pub fn node(&self) -> &'a ServiceId {
        self.nodes[self.nodes.len() - 1]
    }

    /// Number of links traversed from the start
    pub fn hops(&self) -> usize {
        self.nodes.len() - 1
    }

    /// Sum of link averages along the trail
    pub fn latency(&self) -> Latency {
        self.latency
    }

    /// Every service on the trail, start first
    pub fn nodes(&self) -> &'a [&'a ServiceId] {
        self.nodes
    }

    /// Whether the end node already appeared earlier on this trail
    pub fn revisits(&self) -> bool {
        let (last, earlier) = match self.nodes.split_last() {
            Some(split) => split,
            None => return false,
        };
        earlier.contains(last)
    }
}

/// Per-query policy applied at every visited node
pub trait Visitor {
    fn visit(&mut self, trail: &Trail<'_>) -> Visit;
}

/// Depth-first walk over a [`ServiceGraph`] starting at one service.
pub struct DepthFirstWalk<'g> {
    graph: &'g ServiceGraph,
    frontier: Vec<(&'g ServiceId, usize)>,
    path: Vec<&'g ServiceId>,
    latencies: Vec<Latency>,
    max_depth: usize,
    depth_limited: bool,
}

impl<'g> DepthFirstWalk<'g> {
    /// Prepare a walk from `start`. An unknown start yields an empty walk.
    pub fn new(graph: &'g ServiceGraph, start: &str) -> Self {
        let mut frontier = Vec::new();
        if let Some(vertex) = graph.vertex(start) {
            frontier.push((&vertex.name, 0));
        }
        Self {
            graph,
            frontier,
            path: Vec::new(),
            latencies: Vec::new(),
            max_depth: graph.max_depth(),
            depth_limited: false,
        }
    }

    /// Cap how many hops a branch may take before it is cut
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Whether any branch was cut by the depth guard
    pub fn depth_limited(&self) -> bool {
        self.depth_limited
    }

    /// Drive the walk to completion, consulting `visitor` at every node.
    pub fn run<V: Visitor>(&mut self, visitor: &mut V) {
        while let Some((node, depth)) = self.frontier.pop() {
            self.path.truncate(depth);
            self.latencies.truncate(depth);

            let latency = match self.path.last() {
                None => 0,
                Some(&prev) => match self.graph.link_average(prev, node) {
                    Some(step) => self.latencies[depth - 1].saturating_add(step),
                    None => {
                        warn!(from = %prev, to = %node, "Neighbor without a link, skipping");
                        continue;
                    }
                },
            };
            self.path.push(node);
            self.latencies.push(latency);

            let trail = Trail {
                nodes: &self.path,
                latency,
            };
            let decision = visitor.visit(&trail);
            trace!(node = %node, depth, latency, ?decision, "Visited");

            if decision == Visit::Prune {
                continue;
            }
            if depth >= self.max_depth {
                if !self.depth_limited {
                    warn!(max_depth = self.max_depth, "Traversal depth guard reached, cutting branch");
                }
                self.depth_limited = true;
                continue;
            }

            // Reverse so neighbors pop in name order.
            let graph = self.graph;
            let mark = self.frontier.len();
            self.frontier
                .extend(graph.neighbors(node.as_str()).map(|next| (next, depth + 1)));
            self.frontier[mark..].reverse();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn diamond() -> ServiceGraph {
        let mut graph = ServiceGraph::new();
        graph.add_edge("A", "B", 1);
        graph.add_edge("A", "C", 2);
        graph.add_edge("B", "D", 3);
        graph.add_edge("C", "D", 4);
        graph
    }

    /// Records every trail and prunes once `prune_at` hops are reached
    struct Recorder {
        prune_at: usize,
        prune_revisits: bool,
        seen: Vec<(String, Latency)>,
        revisit_hops: Vec<usize>,
    }

    impl Recorder {
        fn new() -> Self {
            Self {
                prune_at: usize::MAX,
                prune_revisits: false,
                seen: Vec::new(),
                revisit_hops: Vec::new(),
            }
        }
    }

    impl Visitor for Recorder {
        fn visit(&mut self, trail: &Trail<'_>) -> Visit {
            let names: Vec<&str> = trail.nodes().iter().map(|n| n.as_str()).collect();
            self.seen.push((names.join("-"), trail.latency()));
            if trail.revisits() {
                self.revisit_hops.push(trail.hops());
                if self.prune_revisits {
                    return Visit::Prune;
                }
            }
            if trail.hops() >= self.prune_at {
                Visit::Prune
            } else {
                Visit::Expand
            }
        }
    }

    fn collect_paths(graph: &ServiceGraph, start: &str) -> Vec<(String, Latency)> {
        let mut recorder = Recorder::new();
        DepthFirstWalk::new(graph, start).run(&mut recorder);
        recorder.seen
    }

    #[test]
    fn test_visits_in_depth_first_name_order() {
        let graph = diamond();
        let paths = collect_paths(&graph, "A");
        assert_eq!(
            paths,
            vec![
                ("A".to_string(), 0),
                ("A-B".to_string(), 1),
                ("A-B-D".to_string(), 4),
                ("A-C".to_string(), 2),
                ("A-C-D".to_string(), 6),
            ]
        );
    }

    #[test]
    fn test_sibling_branch_does_not_inherit_residue() {
        let graph = diamond();
        let paths = collect_paths(&graph, "A");
        assert!(paths.iter().any(|(p, _)| p == "A-C-D"));
        assert!(!paths.iter().any(|(p, _)| p.starts_with("A-B-D-") || p.starts_with("A-B-C")));
    }

    #[test]
    fn test_unknown_start_visits_nothing() {
        let graph = diamond();
        assert!(collect_paths(&graph, "Z").is_empty());
    }

    #[test]
    fn test_prune_stops_descent() {
        let graph = diamond();
        let mut recorder = Recorder::new();
        recorder.prune_at = 1;
        DepthFirstWalk::new(&graph, "A").run(&mut recorder);
        assert_eq!(recorder.seen.len(), 3);
    }

    #[test]
    fn test_depth_guard_cuts_cycles() {
        let mut graph = ServiceGraph::new();
        graph.add_edge("A", "B", 0);
        graph.add_edge("B", "A", 0);

        let mut recorder = Recorder::new();
        let mut walk = DepthFirstWalk::new(&graph, "A").with_max_depth(5);
        walk.run(&mut recorder);
        let deepest = recorder.seen.iter().map(|(p, _)| p.matches('-').count()).max();
        assert_eq!(deepest, Some(5));
        assert!(walk.depth_limited());
    }

    #[test]
    fn test_trail_revisits() {
        let mut graph = ServiceGraph::new();
        graph.add_edge("A", "B", 1);
        graph.add_edge("B", "A", 1);

        let mut recorder = Recorder::new();
        recorder.prune_revisits = true;
        DepthFirstWalk::new(&graph, "A").run(&mut recorder);
        assert_eq!(recorder.revisit_hops, vec![2]);
        assert_eq!(recorder.seen.len(), 3);
    }
}
