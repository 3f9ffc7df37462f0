//! Trace queries over a [`ServiceGraph`]
//!
//! - [`ServiceGraph::average_latency`]: latency of an explicit trace
//! - [`ServiceGraph::count_traces_by_stops`]: walks bounded by hop count
//! - [`ServiceGraph::shortest_trace`]: minimum-latency trace
//! - [`ServiceGraph::count_traces_under_latency`]: walks under a latency ceiling
//!
//! The three searches share [`DepthFirstWalk`] and differ only in their
//! visitor: what counts as a match and which branches are cut.

use crate::error::TraceError;
use crate::graph::ServiceGraph;
use crate::traversal::{DepthFirstWalk, Trail, Visit, Visitor};
use crate::{Latency, ServiceId};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Rendering of a trace whose links do not all exist
pub const NO_SUCH_TRACE: &str = "NO SUCH TRACE";

/// How the hop bound of [`ServiceGraph::count_traces_by_stops`] applies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopCondition {
    /// At least one and at most `stops` hops
    MaxStops,
    /// Exactly `stops` hops
    ExactStops,
}

impl StopCondition {
    fn accepts(self, hops: usize, stops: usize) -> bool {
        match self {
            StopCondition::MaxStops => (1..=stops).contains(&hops),
            StopCondition::ExactStops => hops >= 1 && hops == stops,
        }
    }
}

/// Latency of an explicit trace
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PathLatency {
    Total(Latency),
    /// Some consecutive pair on the trace has no link
    NoSuchTrace,
}

impl PathLatency {
    pub fn total(self) -> Option<Latency> {
        match self {
            PathLatency::Total(latency) => Some(latency),
            PathLatency::NoSuchTrace => None,
        }
    }
}

impl std::fmt::Display for PathLatency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathLatency::Total(latency) => write!(f, "{}", latency),
            PathLatency::NoSuchTrace => f.write_str(NO_SUCH_TRACE),
        }
    }
}

/// An explicit sequence of services, written `A-B-C`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trace(Vec<ServiceId>);

impl Trace {
    pub fn new(services: impl IntoIterator<Item = impl Into<ServiceId>>) -> Self {
        Self(services.into_iter().map(Into::into).collect())
    }

    pub fn services(&self) -> &[ServiceId] {
        &self.0
    }

    /// Number of links the trace crosses
    pub fn hops(&self) -> usize {
        self.0.len().saturating_sub(1)
    }
}

impl FromStr for Trace {
    type Err = TraceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Ok(Trace(Vec::new()));
        }
        s.split('-')
            .map(|name| {
                let name = name.trim();
                if name.is_empty() {
                    Err(TraceError::InvalidTrace(s.to_string()))
                } else {
                    Ok(ServiceId::new(name))
                }
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Trace)
    }
}

impl std::fmt::Display for Trace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, service) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("-")?;
            }
            write!(f, "{}", service)?;
        }
        Ok(())
    }
}

/// Counts arrivals at `to` whose hop count satisfies the condition.
struct StopCounter<'q> {
    to: &'q str,
    stops: usize,
    condition: StopCondition,
    count: usize,
}

impl Visitor for StopCounter<'_> {
    fn visit(&mut self, trail: &Trail<'_>) -> Visit {
        let hops = trail.hops();
        if trail.node().as_str() == self.to && self.condition.accepts(hops, self.stops) {
            self.count += 1;
        }
        if hops < self.stops {
            Visit::Expand
        } else {
            Visit::Prune
        }
    }
}

/// Tracks the cheapest arrival at `to` over branches that do not repeat a
/// service, except for re-entering the destination itself.
struct ShortestSearch<'q> {
    to: &'q str,
    best: Option<Latency>,
}

impl Visitor for ShortestSearch<'_> {
    fn visit(&mut self, trail: &Trail<'_>) -> Visit {
        if trail.hops() == 0 {
            return Visit::Expand;
        }
        if trail.node().as_str() == self.to {
            let latency = trail.latency();
            self.best = Some(self.best.map_or(latency, |best| best.min(latency)));
            return Visit::Prune;
        }
        if trail.revisits() {
            Visit::Prune
        } else {
            Visit::Expand
        }
    }
}

/// Counts arrivals at `to` cheaper than the ceiling. Branches already over
/// the ceiling are cut; arrivals keep exploring.
struct LatencyCounter<'q> {
    to: &'q str,
    max_latency: Latency,
    count: usize,
}

impl Visitor for LatencyCounter<'_> {
    fn visit(&mut self, trail: &Trail<'_>) -> Visit {
        let latency = trail.latency();
        if latency > self.max_latency {
            return Visit::Prune;
        }
        if trail.hops() > 0 && trail.node().as_str() == self.to && latency < self.max_latency {
            self.count += 1;
        }
        Visit::Expand
    }
}

impl ServiceGraph {
    /// Sum of link averages along `path`.
    ///
    /// Returns [`PathLatency::NoSuchTrace`] as soon as a consecutive pair has
    /// no link. A path of zero or one service has latency 0. Sums saturate
    /// at `Latency::MAX`.
    pub fn average_latency<S: AsRef<str>>(&self, path: &[S]) -> PathLatency {
        let ids: Vec<ServiceId> = path.iter().map(|s| ServiceId::new(s.as_ref())).collect();
        self.trace_latency(&Trace(ids))
    }

    /// [`Self::average_latency`] for an already parsed trace
    pub fn trace_latency(&self, trace: &Trace) -> PathLatency {
        let mut total: Latency = 0;
        for pair in trace.services().windows(2) {
            match self.link_average(&pair[0], &pair[1]) {
                Some(average) => total = total.saturating_add(average),
                None => return PathLatency::NoSuchTrace,
            }
        }
        PathLatency::Total(total)
    }

    /// Number of walks from `from` to `to` whose hop count satisfies
    /// `condition` against `stops`. Services may repeat along a walk; the
    /// zero-hop stay at the start never counts.
    pub fn count_traces_by_stops(
        &self,
        from: &str,
        to: &str,
        stops: usize,
        condition: StopCondition,
    ) -> usize {
        let mut counter = StopCounter {
            to,
            stops,
            condition,
            count: 0,
        };
        DepthFirstWalk::new(self, from).run(&mut counter);
        counter.count
    }

    /// Minimum latency over traces from `from` to `to` of at least one hop.
    ///
    /// Only the destination may appear twice on a trace, so `from == to`
    /// finds the cheapest cycle through the start. `None` when no trace
    /// exists.
    pub fn shortest_trace(&self, from: &str, to: &str) -> Option<Latency> {
        let mut search = ShortestSearch { to, best: None };
        DepthFirstWalk::new(self, from).run(&mut search);
        search.best
    }

    /// Number of walks from `from` to `to` with total latency strictly below
    /// `max_latency`. Walks may pass through `to` and come back to it.
    ///
    /// Pruning assumes non-negative latencies; cycles that never raise the
    /// total are cut by the traversal depth guard.
    pub fn count_traces_under_latency(&self, from: &str, to: &str, max_latency: Latency) -> usize {
        let mut counter = LatencyCounter {
            to,
            max_latency,
            count: 0,
        };
        DepthFirstWalk::new(self, from).run(&mut counter);
        counter.count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_graph() -> ServiceGraph {
        let mut graph = ServiceGraph::new();
        graph.add_edge("A", "B", 5);
        graph.add_edge("B", "C", 4);
        graph.add_edge("C", "D", 8);
        graph.add_edge("D", "C", 8);
        graph.add_edge("D", "E", 6);
        graph.add_edge("A", "D", 5);
        graph.add_edge("C", "E", 2);
        graph.add_edge("E", "B", 3);
        graph.add_edge("A", "E", 7);
        graph
    }

    #[test]
    fn test_trace_parsing() {
        let trace: Trace = "A-B-C".parse().unwrap();
        assert_eq!(trace.hops(), 2);
        assert_eq!(trace.to_string(), "A-B-C");

        let trace: Trace = "auth - billing".parse().unwrap();
        assert_eq!(trace.services()[1].as_str(), "billing");

        assert!(matches!("A--C".parse::<Trace>(), Err(TraceError::InvalidTrace(_))));
        assert_eq!("".parse::<Trace>().unwrap().hops(), 0);
    }

    #[test]
    fn test_average_latency() {
        let graph = sample_graph();
        assert_eq!(graph.average_latency(&["A", "B", "C"]), PathLatency::Total(9));
        assert_eq!(graph.average_latency(&["A", "E", "D"]), PathLatency::NoSuchTrace);
        assert_eq!(graph.average_latency(&["A"]), PathLatency::Total(0));
        assert_eq!(graph.average_latency::<&str>(&[]), PathLatency::Total(0));
    }

    #[test]
    fn test_path_latency_display() {
        assert_eq!(PathLatency::Total(22).to_string(), "22");
        assert_eq!(PathLatency::NoSuchTrace.to_string(), "NO SUCH TRACE");
        assert_eq!(PathLatency::NoSuchTrace.total(), None);
    }

    #[test]
    fn test_stop_condition_bounds() {
        assert!(!StopCondition::MaxStops.accepts(0, 3));
        assert!(StopCondition::MaxStops.accepts(1, 3));
        assert!(StopCondition::MaxStops.accepts(3, 3));
        assert!(!StopCondition::MaxStops.accepts(4, 3));
        assert!(StopCondition::ExactStops.accepts(3, 3));
        assert!(!StopCondition::ExactStops.accepts(2, 3));
        assert!(!StopCondition::ExactStops.accepts(0, 0));
    }

    #[test]
    fn test_zero_hop_stay_never_counts() {
        let graph = sample_graph();
        assert_eq!(graph.count_traces_by_stops("C", "C", 0, StopCondition::ExactStops), 0);
        assert_eq!(graph.count_traces_by_stops("C", "C", 0, StopCondition::MaxStops), 0);
    }

    #[test]
    fn test_stop_counts() {
        let graph = sample_graph();
        assert_eq!(graph.count_traces_by_stops("C", "C", 3, StopCondition::MaxStops), 2);
        assert_eq!(graph.count_traces_by_stops("A", "C", 4, StopCondition::ExactStops), 3);
    }

    #[test]
    fn test_shortest_trace() {
        let graph = sample_graph();
        assert_eq!(graph.shortest_trace("A", "C"), Some(9));
        assert_eq!(graph.shortest_trace("B", "B"), Some(9));
        assert_eq!(graph.shortest_trace("Z", "A"), None);
    }

    #[test]
    fn test_shortest_trace_genuine_zero() {
        let mut graph = ServiceGraph::new();
        graph.add_edge("A", "B", 0);
        graph.add_edge("A", "C", 4);
        graph.add_edge("C", "B", 1);
        assert_eq!(graph.shortest_trace("A", "B"), Some(0));
        assert_eq!(graph.shortest_trace("B", "A"), None);
    }

    #[test]
    fn test_count_under_latency() {
        let graph = sample_graph();
        assert_eq!(graph.count_traces_under_latency("C", "C", 30), 7);
        assert_eq!(graph.count_traces_under_latency("C", "C", 9), 0);
        assert_eq!(graph.count_traces_under_latency("C", "C", 10), 1);
    }
}
