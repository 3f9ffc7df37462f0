//! Service graph: node registry, link table and average-latency lookup
//!
//! Vertices live in one owning table keyed by name. A vertex's neighbors are
//! stored as names and resolved through that table, so the cyclic service
//! topology never turns into an ownership cycle.

use crate::cache::{AverageCache, MemoCache, NoopCache};
use crate::config::{TraceConfig, DEFAULT_MAX_DEPTH};
use crate::ingest::EdgeSpec;
use crate::link::{Link, LinkKey};
use crate::{Latency, ServiceId};
use std::collections::{BTreeSet, HashMap};
use tracing::debug;

/// A service and the services it has a direct link to.
#[derive(Debug, Clone)]
pub struct Vertex {
    pub name: ServiceId,
    neighbors: BTreeSet<ServiceId>,
}

impl Vertex {
    fn new(name: ServiceId) -> Self {
        Self {
            name,
            neighbors: BTreeSet::new(),
        }
    }

    /// Outgoing neighbors, in name order
    pub fn neighbors(&self) -> impl Iterator<Item = &ServiceId> {
        self.neighbors.iter()
    }

    pub fn has_neighbor(&self, name: &str) -> bool {
        self.neighbors.contains(name)
    }

    pub fn out_degree(&self) -> usize {
        self.neighbors.len()
    }
}

/// Directed, weighted, possibly cyclic graph of services.
pub struct ServiceGraph {
    vertices: HashMap<ServiceId, Vertex>,
    links: HashMap<LinkKey, Link>,
    averages: Box<dyn AverageCache>,
    max_depth: usize,
}

impl ServiceGraph {
    /// Empty graph with an unbounded memo cache
    pub fn new() -> Self {
        Self::with_cache(Box::new(MemoCache::new()))
    }

    /// Empty graph using the given average cache
    pub fn with_cache(averages: Box<dyn AverageCache>) -> Self {
        Self {
            vertices: HashMap::new(),
            links: HashMap::new(),
            averages,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Empty graph set up from configuration
    pub fn from_config(config: &TraceConfig) -> Self {
        let averages: Box<dyn AverageCache> = if !config.cache.enabled {
            Box::new(NoopCache)
        } else {
            match config.cache.ttl() {
                Some(ttl) => Box::new(MemoCache::with_ttl(ttl)),
                None => Box::new(MemoCache::new()),
            }
        };
        let mut graph = Self::with_cache(averages);
        graph.max_depth = config.traversal.max_depth;
        graph
    }

    /// Build a graph from parsed edges
    pub fn from_edges<'a>(
        edges: impl IntoIterator<Item = &'a EdgeSpec>,
        config: &TraceConfig,
    ) -> Self {
        let mut graph = Self::from_config(config);
        for edge in edges {
            graph.add_edge(edge.from.clone(), edge.to.clone(), edge.latency);
        }
        graph
    }

    /// Override the traversal depth guard
    pub fn set_max_depth(&mut self, max_depth: usize) {
        self.max_depth = max_depth;
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Record one latency sample for the link `from -> to`.
    ///
    /// Creates missing vertices and the link on first use, and drops any
    /// cached average for the pair.
    pub fn add_edge(&mut self, from: impl Into<ServiceId>, to: impl Into<ServiceId>, latency: Latency) {
        let from = from.into();
        let to = to.into();

        self.vertices
            .entry(to.clone())
            .or_insert_with(|| Vertex::new(to.clone()));
        self.vertices
            .entry(from.clone())
            .or_insert_with(|| Vertex::new(from.clone()))
            .neighbors
            .insert(to.clone());

        let key = LinkKey::new(from, to);
        match self.links.get_mut(&key) {
            Some(link) => link.record(latency),
            None => {
                self.links.insert(key.clone(), Link::new(latency));
            }
        }
        self.averages.invalidate(&key);

        debug!(link = %key, latency, "Recorded latency sample");
    }

    pub fn vertex(&self, name: &str) -> Option<&Vertex> {
        self.vertices.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.vertices.contains_key(name)
    }

    pub fn service_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    /// Neighbors of `name`; empty for unknown services
    pub fn neighbors<'g>(&'g self, name: &str) -> impl Iterator<Item = &'g ServiceId> + 'g {
        self.vertices
            .get(name)
            .into_iter()
            .flat_map(|vertex| vertex.neighbors())
    }

    pub fn link(&self, from: &str, to: &str) -> Option<&Link> {
        self.links.get(&LinkKey::new(from.into(), to.into()))
    }

    /// All links, in no particular order
    pub fn links(&self) -> impl Iterator<Item = (&LinkKey, &Link)> {
        self.links.iter()
    }

    /// Average latency of the link `from -> to`, served from the cache when
    /// possible. `None` if no such link exists.
    pub fn link_average(&self, from: &ServiceId, to: &ServiceId) -> Option<Latency> {
        let key = LinkKey::new(from.clone(), to.clone());
        let link = self.links.get(&key)?;
        Some(self.average_of(key, link))
    }

    fn average_of(&self, key: LinkKey, link: &Link) -> Latency {
        if let Some(average) = self.averages.get(&key) {
            return average;
        }
        let average = link.mean();
        self.averages.insert(key, average);
        average
    }

    /// Number of link averages currently memoized
    pub fn cached_averages(&self) -> usize {
        self.averages.len()
    }
}

impl Default for ServiceGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ServiceGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceGraph")
            .field("services", &self.vertices.len())
            .field("links", &self.links.len())
            .field("cached_averages", &self.cached_averages())
            .field("max_depth", &self.max_depth)
            .finish()
    }
}
