//! Query plans and their results
//!
//! A plan is a list of [`Query`] values answered against each input graph.
//! The standard plan asks the ten questions the tool was built for; a
//! configuration file may replace it.

use crate::error::TraceError;
use crate::graph::ServiceGraph;
use crate::query::{PathLatency, StopCondition, Trace, NO_SUCH_TRACE};
use crate::Latency;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::info;

/// One question asked of a graph
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Query {
    /// Latency of an explicit trace such as `A-B-C`
    AverageLatency { trace: String },
    /// Walks between two services bounded by hop count
    TracesByStops {
        from: String,
        to: String,
        stops: usize,
        condition: StopCondition,
    },
    /// Minimum-latency trace between two services
    ShortestTrace { from: String, to: String },
    /// Walks between two services with latency below a ceiling
    TracesUnderLatency {
        from: String,
        to: String,
        max_latency: Latency,
    },
}

impl Query {
    /// The ten standard questions
    pub fn standard_plan() -> Vec<Query> {
        let latency = |trace: &str| Query::AverageLatency {
            trace: trace.to_string(),
        };
        vec![
            latency("A-B-C"),
            latency("A-D"),
            latency("A-D-C"),
            latency("A-E-B-C-D"),
            latency("A-E-D"),
            Query::TracesByStops {
                from: "C".to_string(),
                to: "C".to_string(),
                stops: 3,
                condition: StopCondition::MaxStops,
            },
            Query::TracesByStops {
                from: "A".to_string(),
                to: "C".to_string(),
                stops: 4,
                condition: StopCondition::ExactStops,
            },
            Query::ShortestTrace {
                from: "A".to_string(),
                to: "C".to_string(),
            },
            Query::ShortestTrace {
                from: "B".to_string(),
                to: "B".to_string(),
            },
            Query::TracesUnderLatency {
                from: "C".to_string(),
                to: "C".to_string(),
                max_latency: 30,
            },
        ]
    }

    /// Answer this query against `graph`. Fails only on a malformed trace.
    pub fn run(&self, graph: &ServiceGraph) -> Result<QueryOutcome, TraceError> {
        let outcome = match self {
            Query::AverageLatency { trace } => {
                let trace: Trace = trace.parse()?;
                QueryOutcome::Latency(graph.trace_latency(&trace))
            }
            Query::TracesByStops {
                from,
                to,
                stops,
                condition,
            } => QueryOutcome::Count(graph.count_traces_by_stops(from, to, *stops, *condition)),
            Query::ShortestTrace { from, to } => {
                QueryOutcome::Shortest(graph.shortest_trace(from, to))
            }
            Query::TracesUnderLatency {
                from,
                to,
                max_latency,
            } => QueryOutcome::Count(graph.count_traces_under_latency(from, to, *max_latency)),
        };
        Ok(outcome)
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Query::AverageLatency { trace } => write!(f, "average latency of {}", trace),
            Query::TracesByStops {
                from,
                to,
                stops,
                condition,
            } => {
                let bound = match condition {
                    StopCondition::MaxStops => "at most",
                    StopCondition::ExactStops => "exactly",
                };
                write!(f, "traces {} -> {} with {} {} stops", from, to, bound, stops)
            }
            Query::ShortestTrace { from, to } => write!(f, "shortest trace {} -> {}", from, to),
            Query::TracesUnderLatency {
                from,
                to,
                max_latency,
            } => write!(f, "traces {} -> {} under latency {}", from, to, max_latency),
        }
    }
}

/// Answer to a [`Query`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryOutcome {
    Latency(PathLatency),
    Count(usize),
    Shortest(Option<Latency>),
}

impl fmt::Display for QueryOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryOutcome::Latency(latency) => write!(f, "{}", latency),
            QueryOutcome::Count(count) => write!(f, "{}", count),
            QueryOutcome::Shortest(Some(latency)) => write!(f, "{}", latency),
            QueryOutcome::Shortest(None) => f.write_str(NO_SUCH_TRACE),
        }
    }
}

/// Outcomes of one plan against one graph, in plan order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    /// 1-based index of the input graph
    pub graph: usize,
    pub outcomes: Vec<QueryOutcome>,
}

impl Report {
    /// Run every query of `plan` against `graph`
    pub fn build(graph_no: usize, graph: &ServiceGraph, plan: &[Query]) -> Result<Self, TraceError> {
        let outcomes = plan
            .iter()
            .map(|query| query.run(graph))
            .collect::<Result<Vec<_>, _>>()?;
        info!(
            graph = graph_no,
            services = graph.service_count(),
            links = graph.link_count(),
            queries = outcomes.len(),
            "Answered query plan"
        );
        Ok(Self {
            graph: graph_no,
            outcomes,
        })
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for outcome in &self.outcomes {
            writeln!(f, "{}", outcome)?;
        }
        Ok(())
    }
}

/// Text rendering: one outcome per line, a blank line after every graph
pub fn render_text(reports: &[Report]) -> String {
    reports.iter().map(|report| format!("{}\n", report)).collect()
}

/// JSON rendering of all reports
pub fn render_json(reports: &[Report]) -> Result<String, TraceError> {
    Ok(serde_json::to_string_pretty(reports)?)
}
