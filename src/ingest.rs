//! Edge list input
//!
//! Each input line describes one graph as comma-separated tokens of the form
//! `LetterLetterNumber`, e.g. `AB5, BC4, CD8`: a link from `A` to `B` with
//! latency 5.

use crate::error::TraceError;
use crate::{Latency, ServiceId};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

static EDGE_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([A-Za-z])([A-Za-z])([0-9]+)$").unwrap());

/// One `(from, to, latency)` triple
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeSpec {
    pub from: ServiceId,
    pub to: ServiceId,
    pub latency: Latency,
}

impl EdgeSpec {
    pub fn new(from: impl Into<ServiceId>, to: impl Into<ServiceId>, latency: Latency) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            latency,
        }
    }

    /// Parse a single token such as `AB5`. `line` is only used for the error.
    pub fn parse_token(line: usize, token: &str) -> Result<Self, TraceError> {
        let invalid = || TraceError::InvalidToken {
            line,
            token: token.to_string(),
        };
        let caps = EDGE_TOKEN.captures(token.trim()).ok_or_else(invalid)?;
        let latency = caps[3].parse::<Latency>().map_err(|_| invalid())?;
        Ok(Self::new(&caps[1], &caps[2], latency))
    }
}

/// Parse one input line into its edges. `line_no` is 1-based.
pub fn parse_line(line_no: usize, line: &str) -> Result<Vec<EdgeSpec>, TraceError> {
    line.trim()
        .split(',')
        .map(|token| EdgeSpec::parse_token(line_no, token.trim()))
        .collect()
}

/// Parse a whole document, one edge list per non-blank line
pub fn parse_edge_lists(input: &str) -> Result<Vec<Vec<EdgeSpec>>, TraceError> {
    let mut graphs = Vec::new();
    for (idx, line) in input.lines().enumerate() {
        if line.trim().is_empty() {
            debug!(line = idx + 1, "Skipping blank line");
            continue;
        }
        graphs.push(parse_line(idx + 1, line)?);
    }
    Ok(graphs)
}

/// Read and parse an edge list file
pub fn read_edge_lists(path: impl AsRef<Path>) -> Result<Vec<Vec<EdgeSpec>>, TraceError> {
    let path = path.as_ref();
    let input = std::fs::read_to_string(path).map_err(|e| TraceError::io(path, e))?;
    let graphs = parse_edge_lists(&input)?;
    debug!(path = %path.display(), graphs = graphs.len(), "Read edge lists");
    Ok(graphs)
}
