//! Directed graph of dialogues connected by choices.
//!
//! # Architecture
//!
//! - [`EdgeIndex`]: Index of one choice edge
//! - [`Edge`]: The dialogue a choice leads to
//! - [`ChoiceGraph`]: Node storage plus incoming/outgoing edge tables
//!
//! Capabilities:
//! - Self-loops and parallel edges (two choices leading to the same dialogue)
//! - Root detection (nodes with no incoming edges)
//! - Reachability from the roots, to spot dialogues that only cycles lead to

use std::{
    collections::{HashMap, HashSet, VecDeque},
    fmt::Debug,
    hash::Hash,
};

/// Index of an edge in a [`ChoiceGraph`].
#[derive(Debug, Clone, Copy)]
struct EdgeIndex(usize);

/// A directed edge produced by one choice.
#[derive(Debug)]
struct Edge<K> {
    target: K,
}

/// Dialogues as nodes keyed by `K`; choices as edges.
#[derive(Debug)]
pub(crate) struct ChoiceGraph<K>
where
    K: Clone + Eq + Hash + Debug,
{
    nodes: HashSet<K>,
    edges: Vec<Edge<K>>,
    income_edges: HashMap<K, Vec<EdgeIndex>>,
    outgoing_edges: HashMap<K, Vec<EdgeIndex>>,
}

impl<K> ChoiceGraph<K>
where
    K: Clone + Eq + Hash + Debug,
{
    pub(crate) fn new() -> Self {
        Self {
            nodes: HashSet::new(),
            edges: Vec::new(),
            income_edges: HashMap::new(),
            outgoing_edges: HashMap::new(),
        }
    }

    pub(crate) fn nodes_count(&self) -> usize {
        self.nodes.len()
    }

    pub(crate) fn edges_count(&self) -> usize {
        self.edges.len()
    }

    pub(crate) fn contains_node(&self, key: &K) -> bool {
        self.nodes.contains(key)
    }

    /// Adds a node. Returns `false` if it was already present.
    pub(crate) fn add_node(&mut self, key: K) -> bool {
        self.nodes.insert(key)
    }

    /// Adds an edge for one choice of `source`.
    ///
    /// # Panics
    /// Panics in debug builds if either endpoint is not a node of the graph.
    pub(crate) fn add_edge(&mut self, source: &K, target: &K) {
        debug_assert!(
            self.contains_node(source),
            "Adding edge: source {source:?} does not exist"
        );
        debug_assert!(
            self.contains_node(target),
            "Adding edge: target {target:?} does not exist"
        );

        self.edges.push(Edge {
            target: target.clone(),
        });

        let idx = EdgeIndex(self.edges.len() - 1);
        self.outgoing_edges
            .entry(source.clone())
            .or_default()
            .push(idx);
        self.income_edges.entry(target.clone()).or_default().push(idx);
    }

    /// Returns `true` if no edge leads to `key`.
    pub(crate) fn is_root(&self, key: &K) -> bool {
        !self.income_edges.contains_key(key)
    }

    /// Returns the keys of nodes with no incoming edges.
    pub(crate) fn roots(&self) -> impl Iterator<Item = &K> {
        self.nodes.iter().filter(|key| self.is_root(key))
    }

    /// Returns the targets of `source`'s outgoing edges, duplicates included.
    pub(crate) fn outgoing(&self, source: &K) -> impl Iterator<Item = &K> {
        self.outgoing_edges
            .get(source)
            .into_iter()
            .flatten()
            .map(|idx| &self.edges[idx.0].target)
    }

    /// Returns the nodes that no root can reach.
    ///
    /// These are exactly the nodes whose every incoming path starts inside a
    /// cycle.
    pub(crate) fn unreachable(&self) -> Vec<&K> {
        let mut seen: HashSet<&K> = self.roots().collect();
        let mut queue: VecDeque<&K> = seen.iter().copied().collect();

        while let Some(key) = queue.pop_front() {
            for next in self.outgoing(key) {
                if seen.insert(next) {
                    queue.push_back(next);
                }
            }
        }

        self.nodes.iter().filter(|key| !seen.contains(key)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph(nodes: &[&'static str], edges: &[(&'static str, &'static str)]) -> ChoiceGraph<&'static str> {
        let mut graph = ChoiceGraph::new();
        for key in nodes {
            graph.add_node(*key);
        }
        for (source, target) in edges {
            graph.add_edge(source, target);
        }
        graph
    }

    fn sorted<'a>(keys: impl IntoIterator<Item = &'a &'static str>) -> Vec<&'static str> {
        let mut keys: Vec<&'static str> = keys.into_iter().copied().collect();
        keys.sort();
        keys
    }

    #[test]
    fn test_graph_new() {
        let graph: ChoiceGraph<&str> = ChoiceGraph::new();

        assert_eq!(graph.nodes_count(), 0);
        assert_eq!(graph.edges_count(), 0);
        assert_eq!(graph.roots().count(), 0);
        assert!(graph.unreachable().is_empty());
    }

    #[test]
    fn test_roots() {
        let graph = graph(&["a", "b", "c"], &[("a", "c")]);

        assert_eq!(sorted(graph.roots()), vec!["a", "b"]);
        assert!(graph.is_root(&"a"));
        assert!(!graph.is_root(&"c"));
    }

    #[test]
    fn test_node_added_once() {
        let mut graph = graph(&["a"], &[]);
        assert!(!graph.add_node("a"));

        assert_eq!(graph.nodes_count(), 1);
        assert!(graph.contains_node(&"a"));
        assert!(!graph.contains_node(&"z"));
    }

    #[test]
    fn test_self_loop_is_not_a_root() {
        let graph = graph(&["a"], &[("a", "a")]);

        assert_eq!(graph.roots().count(), 0);
        assert_eq!(sorted(graph.outgoing(&"a")), vec!["a"]);
        assert_eq!(sorted(graph.unreachable()), vec!["a"]);
    }

    #[test]
    fn test_parallel_edges() {
        let mut graph = graph(&["a", "b"], &[]);
        graph.add_edge(&"a", &"b");
        graph.add_edge(&"a", &"b");

        assert_eq!(graph.edges_count(), 2);
        assert_eq!(graph.outgoing(&"a").count(), 2);
        assert_eq!(graph.outgoing(&"b").count(), 0);
    }

    #[test]
    fn test_unreachable_cycle() {
        // start -> mid -> end, and a detached loop x <-> y
        let graph = graph(
            &["start", "mid", "end", "x", "y"],
            &[("start", "mid"), ("mid", "end"), ("x", "y"), ("y", "x")],
        );

        assert_eq!(sorted(graph.roots()), vec!["start"]);
        assert_eq!(sorted(graph.unreachable()), vec!["x", "y"]);
    }

    #[test]
    fn test_diamond_is_fully_reachable() {
        let graph = graph(
            &["top", "left", "right", "bottom"],
            &[
                ("top", "left"),
                ("top", "right"),
                ("left", "bottom"),
                ("right", "bottom"),
            ],
        );

        assert_eq!(sorted(graph.roots()), vec!["top"]);
        assert!(graph.unreachable().is_empty());
    }
}
