//! Dependency graph inspection using `petgraph`.
//!
//! Resolution walks the dependency graph implicitly and never builds it. This
//! module materializes a snapshot of a context's bindings for start-up
//! checks: unbound dependencies, cycles, instantiation order, and DOT output.

use std::collections::HashMap;
use std::fmt::Write as _;

use petgraph::Direction;
use petgraph::graph::NodeIndex;
use weave_common::types::ComponentKey;

use crate::cycle::CycleTrace;

/// How a node in the graph is bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BindingKind {
    /// Bound to a fixed instance.
    Instance,
    /// Bound to an implementation type and its selected constructor.
    Constructor,
    /// Referenced as a dependency but not bound.
    Unbound,
}

/// A node of the dependency graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GraphNode {
    /// Component key of the node.
    pub key: ComponentKey,
    /// How the key is bound.
    pub kind: BindingKind,
}

/// A dependency that has no binding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingDependency {
    /// The unbound key.
    pub dependency: ComponentKey,
    /// Bound components whose constructors need it, sorted by name.
    pub required_by: Vec<ComponentKey>,
}

/// Snapshot of the bindings of a context as a directed graph.
///
/// Edges point from a dependency to the component that needs it, so a
/// topological sort lists dependencies first.
#[derive(Debug)]
pub struct DependencyGraph {
    graph: petgraph::Graph<GraphNode, ()>,
    nodes: HashMap<ComponentKey, NodeIndex>,
}

impl DependencyGraph {
    /// Builds the graph from `(key, kind, dependencies)` triples.
    pub(crate) fn from_bindings(bindings: &[(ComponentKey, BindingKind, Vec<ComponentKey>)]) -> Self {
        let mut graph = Self {
            graph: petgraph::Graph::new(),
            nodes: HashMap::new(),
        };
        for &(key, kind, _) in bindings {
            let _ = graph.add_node(key, kind);
        }
        for (key, _, dependencies) in bindings {
            let dependent = graph.nodes[key];
            for &dependency in dependencies {
                let dependency = graph.add_node(dependency, BindingKind::Unbound);
                if !graph.graph.contains_edge(dependency, dependent) {
                    let _ = graph.graph.add_edge(dependency, dependent, ());
                }
            }
        }
        graph
    }

    fn add_node(&mut self, key: ComponentKey, kind: BindingKind) -> NodeIndex {
        if let Some(&idx) = self.nodes.get(&key) {
            return idx;
        }
        let idx = self.graph.add_node(GraphNode { key, kind });
        let _ = self.nodes.insert(key, idx);
        idx
    }

    /// Number of nodes, bound or not.
    #[must_use]
    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    /// Returns `true` for a graph of an empty context.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Returns `true` if `key` is bound or referenced.
    #[must_use]
    pub fn contains(&self, key: ComponentKey) -> bool {
        self.nodes.contains_key(&key)
    }

    /// Returns the node for `key`.
    #[must_use]
    pub fn node(&self, key: ComponentKey) -> Option<GraphNode> {
        self.nodes
            .get(&key)
            .and_then(|&idx| self.graph.node_weight(idx).copied())
    }

    /// Direct dependencies of `key`, sorted by name.
    #[must_use]
    pub fn dependencies_of(&self, key: ComponentKey) -> Vec<ComponentKey> {
        self.neighbors(key, Direction::Incoming)
    }

    /// Components that directly depend on `key`, sorted by name.
    #[must_use]
    pub fn dependents_of(&self, key: ComponentKey) -> Vec<ComponentKey> {
        self.neighbors(key, Direction::Outgoing)
    }

    fn neighbors(&self, key: ComponentKey, direction: Direction) -> Vec<ComponentKey> {
        let Some(&idx) = self.nodes.get(&key) else {
            return Vec::new();
        };
        let mut keys: Vec<_> = self
            .graph
            .neighbors_directed(idx, direction)
            .map(|n| self.graph[n].key)
            .collect();
        keys.sort();
        keys
    }

    /// Referenced keys that have no binding, sorted by name.
    #[must_use]
    pub fn missing(&self) -> Vec<MissingDependency> {
        let mut missing: Vec<_> = self
            .graph
            .node_weights()
            .filter(|n| n.kind == BindingKind::Unbound)
            .map(|n| MissingDependency {
                dependency: n.key,
                required_by: self.dependents_of(n.key),
            })
            .collect();
        missing.sort_by_key(|m| m.dependency);
        missing
    }

    /// Every dependency cycle, as its members sorted by name.
    ///
    /// A cycle is a strongly connected component with more than one member,
    /// or a single component that depends on itself.
    #[must_use]
    pub fn cycles(&self) -> Vec<CycleTrace> {
        let mut cycles: Vec<_> = petgraph::algo::tarjan_scc(&self.graph)
            .into_iter()
            .filter(|scc| scc.len() > 1 || scc.iter().any(|&n| self.graph.contains_edge(n, n)))
            .map(|scc| {
                let mut members: Vec<_> = scc.into_iter().map(|n| self.graph[n].key).collect();
                members.sort();
                members
            })
            .collect();
        cycles.sort();
        cycles.into_iter().map(CycleTrace::from_components).collect()
    }

    /// Returns the bound components in instantiation order, dependencies
    /// first.
    ///
    /// # Errors
    ///
    /// Returns the cycle containing the first offending node if the graph is
    /// not acyclic.
    pub fn resolve_order(&self) -> Result<Vec<ComponentKey>, CycleTrace> {
        match petgraph::algo::toposort(&self.graph, None) {
            Ok(indices) => Ok(indices
                .into_iter()
                .map(|idx| self.graph[idx])
                .filter(|n| n.kind != BindingKind::Unbound)
                .map(|n| n.key)
                .collect()),
            Err(cycle) => {
                let key = self.graph[cycle.node_id()].key;
                Err(self
                    .cycles()
                    .into_iter()
                    .find(|c| c.contains(key))
                    .unwrap_or_else(|| CycleTrace::from_components(vec![key])))
            }
        }
    }

    /// Renders the graph in Graphviz DOT format, with edges pointing from a
    /// component to what it needs.
    #[must_use]
    pub fn to_dot(&self) -> String {
        let mut output = String::from("digraph Dependencies {\n");
        output.push_str("  rankdir=LR;\n");
        output.push_str("  node [shape=box, style=\"rounded,filled\"];\n\n");

        let mut nodes: Vec<_> = self.graph.node_weights().copied().collect();
        nodes.sort_by_key(|n| n.key);
        for node in &nodes {
            let color = match node.kind {
                BindingKind::Instance => "lightblue",
                BindingKind::Constructor => "lightgreen",
                BindingKind::Unbound => "salmon",
            };
            let _ = writeln!(
                output,
                "  \"{}\" [label=\"{}\", fillcolor={color}];",
                node.key.name(),
                node.key.short_name()
            );
        }

        output.push('\n');
        for node in &nodes {
            for dependency in self.dependencies_of(node.key) {
                let _ = writeln!(
                    output,
                    "  \"{}\" -> \"{}\";",
                    node.key.name(),
                    dependency.name()
                );
            }
        }

        output.push_str("}\n");
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Api;
    struct Db;
    struct Cache;
    struct Config;

    fn key<T: 'static>() -> ComponentKey {
        ComponentKey::of::<T>()
    }

    fn graph(bindings: &[(ComponentKey, BindingKind, Vec<ComponentKey>)]) -> DependencyGraph {
        let mut sorted = bindings.to_vec();
        sorted.sort_by_key(|(k, _, _)| *k);
        DependencyGraph::from_bindings(&sorted)
    }

    #[test]
    fn empty_graph_resolves_to_empty() {
        let graph = graph(&[]);
        assert!(graph.is_empty());
        assert!(graph.resolve_order().expect("should resolve").is_empty());
    }

    #[test]
    fn linear_chain_orders_dependencies_first() {
        let graph = graph(&[
            (key::<Api>(), BindingKind::Constructor, vec![key::<Db>()]),
            (key::<Db>(), BindingKind::Constructor, vec![key::<Config>()]),
            (key::<Config>(), BindingKind::Instance, Vec::new()),
        ]);
        let order = graph.resolve_order().expect("should resolve");
        assert_eq!(order, vec![key::<Config>(), key::<Db>(), key::<Api>()]);
    }

    #[test]
    fn diamond_dependency() {
        let graph = graph(&[
            (key::<Api>(), BindingKind::Constructor, vec![key::<Db>(), key::<Cache>()]),
            (key::<Db>(), BindingKind::Constructor, vec![key::<Config>()]),
            (key::<Cache>(), BindingKind::Constructor, vec![key::<Config>()]),
            (key::<Config>(), BindingKind::Instance, Vec::new()),
        ]);
        let order = graph.resolve_order().expect("should resolve");
        assert_eq!(order.len(), 4);
        let pos = |k: ComponentKey| order.iter().position(|n| *n == k).expect("present");
        assert!(pos(key::<Config>()) < pos(key::<Db>()));
        assert!(pos(key::<Config>()) < pos(key::<Cache>()));
        assert!(pos(key::<Db>()) < pos(key::<Api>()));
        assert!(pos(key::<Cache>()) < pos(key::<Api>()));
        assert_eq!(
            graph.dependencies_of(key::<Api>()),
            {
                let mut expected = vec![key::<Cache>(), key::<Db>()];
                expected.sort();
                expected
            }
        );
    }

    #[test]
    fn unbound_dependencies_are_reported_with_requirers() {
        let graph = graph(&[
            (key::<Api>(), BindingKind::Constructor, vec![key::<Db>()]),
            (key::<Cache>(), BindingKind::Constructor, vec![key::<Db>()]),
        ]);
        let missing = graph.missing();
        assert_eq!(missing.len(), 1);
        assert_eq!(missing[0].dependency, key::<Db>());
        assert_eq!(missing[0].required_by.len(), 2);
        assert_eq!(graph.node(key::<Db>()).map(|n| n.kind), Some(BindingKind::Unbound));

        let order = graph.resolve_order().expect("acyclic");
        assert!(!order.contains(&key::<Db>()), "unbound keys are not instantiated");
    }

    #[test]
    fn two_node_cycle_detection() {
        let graph = graph(&[
            (key::<Api>(), BindingKind::Constructor, vec![key::<Db>()]),
            (key::<Db>(), BindingKind::Constructor, vec![key::<Api>()]),
        ]);
        let cycles = graph.cycles();
        assert_eq!(cycles.len(), 1);
        assert_eq!(cycles[0].len(), 2);

        let err = graph.resolve_order().unwrap_err();
        assert!(err.contains(key::<Api>()));
        assert!(err.contains(key::<Db>()));
    }

    #[test]
    fn three_node_cycle_excludes_outside_nodes() {
        let graph = graph(&[
            (key::<Config>(), BindingKind::Constructor, vec![key::<Api>()]),
            (key::<Api>(), BindingKind::Constructor, vec![key::<Db>()]),
            (key::<Db>(), BindingKind::Constructor, vec![key::<Cache>()]),
            (key::<Cache>(), BindingKind::Constructor, vec![key::<Api>()]),
        ]);
        let cycles = graph.cycles();
        assert_eq!(cycles.len(), 1);
        assert_eq!(cycles[0].len(), 3);
        assert!(!cycles[0].contains(key::<Config>()));
    }

    #[test]
    fn self_dependency_is_a_cycle() {
        let graph = graph(&[(key::<Api>(), BindingKind::Constructor, vec![key::<Api>()])]);
        let cycles = graph.cycles();
        assert_eq!(cycles.len(), 1);
        assert_eq!(cycles[0].components(), &[key::<Api>()]);
    }

    #[test]
    fn to_dot_lists_nodes_and_edges() {
        let graph = graph(&[
            (key::<Api>(), BindingKind::Constructor, vec![key::<Db>()]),
            (key::<Db>(), BindingKind::Instance, Vec::new()),
        ]);
        let dot = graph.to_dot();
        assert!(dot.starts_with("digraph"));
        assert!(dot.contains("label=\"Api\""), "got: {dot}");
        assert!(
            dot.contains(&format!("\"{}\" -> \"{}\"", key::<Api>().name(), key::<Db>().name())),
            "got: {dot}"
        );
    }
}
