//! Weighted undirected graph space with memoised single-source Dijkstra.
//!
//! Distances are shortest-path lengths. Each query resolves against a
//! single-source shortest-path tree computed on demand via
//! [`pathfinding::prelude::dijkstra_all`] and memoised in an LRU cache keyed
//! by source node (default capacity [`DEFAULT_CACHE_CAPACITY`] sources).
//!
//! Edge weights are `f64` but the search runs on integer costs (scaled by
//! [`WEIGHT_SCALE`]) because the search needs `Ord`; integer arithmetic also
//! makes the canonical-parent selection below exact. Parent links are
//! canonicalised to the smallest neighbour on a shortest path so that
//! interpolation is deterministic regardless of heap pop order.

use std::collections::HashMap;
use std::hash::Hash;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};

use lru::LruCache;
use pathfinding::prelude::dijkstra_all;

use super::{Iloc, Loc, TransportSpace};

/// Scale factor converting `f64` edge weights to integer search costs.
const WEIGHT_SCALE: f64 = 1_000_000.0;

/// Default number of memoised single-source shortest-path trees.
pub const DEFAULT_CACHE_CAPACITY: usize = 10_000;

/// Single-source shortest-path tree: scaled distances plus canonical parents.
struct ShortestPathTree<N> {
    dist: HashMap<N, u64>,
    parent: HashMap<N, N>,
}

pub struct WeightedGraph<N: Loc + Eq + Hash + Ord = Iloc> {
    adjacency: HashMap<N, Vec<(N, u64)>>,
    velocity: f64,
    cache: Mutex<LruCache<N, Arc<ShortestPathTree<N>>>>,
}

impl<N: Loc + Eq + Hash + Ord> WeightedGraph<N> {
    pub fn new(velocity: f64) -> Self {
        Self::with_cache_capacity(velocity, DEFAULT_CACHE_CAPACITY)
    }

    pub fn with_cache_capacity(velocity: f64, capacity: usize) -> Self {
        assert!(
            velocity > 0.0 && velocity.is_finite(),
            "velocity must be positive and finite"
        );
        Self {
            adjacency: HashMap::new(),
            velocity,
            cache: Mutex::new(LruCache::new(
                NonZeroUsize::new(capacity.max(1)).expect("cache capacity must be non-zero"),
            )),
        }
    }

    pub fn from_edges(velocity: f64, edges: impl IntoIterator<Item = (N, N, f64)>) -> Self {
        let mut graph = Self::new(velocity);
        for (u, v, weight) in edges {
            graph.add_edge(u, v, weight);
        }
        graph
    }

    pub fn add_vertex(&mut self, v: N) {
        self.adjacency.entry(v).or_default();
    }

    /// Add an undirected edge. Invalidates memoised shortest-path trees.
    pub fn add_edge(&mut self, u: N, v: N, weight: f64) {
        assert!(
            weight >= 0.0 && weight.is_finite(),
            "edge weight must be non-negative and finite"
        );
        let scaled = (weight * WEIGHT_SCALE).round() as u64;
        self.adjacency.entry(u).or_default().push((v, scaled));
        self.adjacency.entry(v).or_default().push((u, scaled));
        self.cache.lock().unwrap().clear();
    }

    pub fn contains(&self, v: N) -> bool {
        self.adjacency.contains_key(&v)
    }

    pub fn num_vertices(&self) -> usize {
        self.adjacency.len()
    }

    fn shortest_paths(&self, source: N) -> Arc<ShortestPathTree<N>> {
        if let Some(tree) = self.cache.lock().unwrap().get(&source) {
            return Arc::clone(tree);
        }
        let tree = Arc::new(self.compute_tree(source));
        self.cache.lock().unwrap().put(source, Arc::clone(&tree));
        tree
    }

    fn compute_tree(&self, source: N) -> ShortestPathTree<N> {
        let reachable = dijkstra_all(&source, |n: &N| {
            self.adjacency
                .get(n)
                .into_iter()
                .flatten()
                .map(|&(m, w)| (m, w))
        });

        let mut dist = HashMap::with_capacity(reachable.len() + 1);
        dist.insert(source, 0u64);
        for (&node, &(_, cost)) in &reachable {
            dist.insert(node, cost);
        }

        // Canonical parent: the smallest neighbour lying on a shortest path.
        // Exact in scaled integer arithmetic, so independent of pop order.
        let mut parent = HashMap::with_capacity(reachable.len());
        for (&node, _) in &reachable {
            let d_node = dist[&node];
            let canonical = self
                .adjacency
                .get(&node)
                .into_iter()
                .flatten()
                .filter(|(p, w)| dist.get(p).is_some_and(|&d_p| d_p + w == d_node))
                .map(|&(p, _)| p)
                .min();
            if let Some(p) = canonical {
                parent.insert(node, p);
            }
        }

        ShortestPathTree { dist, parent }
    }

    fn scaled_d(&self, u: N, v: N) -> Option<u64> {
        if u == v {
            return Some(0);
        }
        self.shortest_paths(u).dist.get(&v).copied()
    }
}

impl<N: Loc + Eq + Hash + Ord> TransportSpace for WeightedGraph<N> {
    type Loc = N;

    fn d(&self, u: N, v: N) -> f64 {
        match self.scaled_d(u, v) {
            Some(scaled) => scaled as f64 / WEIGHT_SCALE,
            None => f64::INFINITY,
        }
    }

    fn t(&self, u: N, v: N) -> f64 {
        self.d(u, v) / self.velocity
    }

    fn interp_dist(&self, u: N, v: N, dist_to_dest: f64) -> (N, f64) {
        if dist_to_dest <= 0.0 {
            return (v, 0.0);
        }
        let tree = self.shortest_paths(u);
        let Some(&total) = tree.dist.get(&v) else {
            // Unreachable; the vehicle cannot advance.
            return (u, f64::INFINITY);
        };
        let target = (dist_to_dest * WEIGHT_SCALE).round() as u64;
        if target >= total {
            return (u, (target - total) as f64 / WEIGHT_SCALE);
        }
        // Walk the parent chain from v toward u. `acc` is the distance from
        // the current node back to v; edge lengths come out exactly as
        // differences of tree distances.
        let mut current = v;
        let mut acc = 0u64;
        while current != u {
            let p = tree.parent[&current];
            let edge = tree.dist[&current] - tree.dist[&p];
            if acc + edge >= target {
                if acc + edge == target {
                    return (p, 0.0);
                }
                return (current, (target - acc) as f64 / WEIGHT_SCALE);
            }
            acc += edge;
            current = p;
        }
        (u, 0.0)
    }

    fn interp_time(&self, u: N, v: N, time_to_dest: f64) -> (N, f64) {
        let (loc, jump_dist) = self.interp_dist(u, v, time_to_dest * self.velocity);
        (loc, jump_dist / self.velocity)
    }

    fn velocity(&self) -> f64 {
        self.velocity
    }
}
