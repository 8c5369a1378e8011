//! Breadth-first queries over the format graph.

use crate::graph::{EdgePath, FormatGraph};
use petgraph::Direction;
use std::collections::VecDeque;

/// Direction for edge traversal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraversalDirection {
    /// Follow outgoing edges (what can `from` become)
    Forward,
    /// Follow incoming edges (what can become `target`)
    Backward,
}

impl TraversalDirection {
    fn petgraph(self) -> Direction {
        match self {
            TraversalDirection::Forward => Direction::Outgoing,
            TraversalDirection::Backward => Direction::Incoming,
        }
    }
}

/// A breadth-first traversal whose visited set survives between queries.
///
/// Vertices reported by one query are neither reported nor expanded again by
/// later queries on the same traversal until [`Traversal::clear`] is called.
/// This is how several reachability sets are merged without duplicates.
#[derive(Debug)]
pub struct Traversal<'g> {
    graph: &'g FormatGraph,
    visited: Vec<bool>,
}

impl<'g> Traversal<'g> {
    /// Create a new traversal with nothing visited.
    pub fn new(graph: &'g FormatGraph) -> Self {
        Self {
            graph,
            visited: vec![false; graph.vertex_count()],
        }
    }

    /// Forget every visited vertex.
    pub fn clear(&mut self) {
        self.visited.iter_mut().for_each(|v| *v = false);
    }

    /// Whether a vertex has been visited by any query so far.
    pub fn is_visited(&self, vertex: usize) -> bool {
        self.visited.get(vertex).copied().unwrap_or(false)
    }

    /// Vertices reachable from `from` (including `from`) that pass `include`.
    ///
    /// Excluded vertices are still traversed through.
    pub fn reachable(&mut self, from: usize, include: impl FnMut(usize) -> bool) -> Vec<usize> {
        self.run(from, TraversalDirection::Forward, include)
    }

    /// Vertices that can reach `target` (including `target`) that pass `include`.
    pub fn reachable_to(
        &mut self,
        target: usize,
        include: impl FnMut(usize) -> bool,
    ) -> Vec<usize> {
        self.run(target, TraversalDirection::Backward, include)
    }

    fn run(
        &mut self,
        start: usize,
        direction: TraversalDirection,
        mut include: impl FnMut(usize) -> bool,
    ) -> Vec<usize> {
        let mut result = Vec::new();
        let Some(mut queue) = self.seed(start) else {
            return result;
        };

        while let Some(current) = queue.pop_front() {
            if include(current) {
                result.push(current);
            }
            for (_, next) in self.graph.neighbors(current, direction.petgraph()) {
                if !self.visited[next] {
                    self.visited[next] = true;
                    queue.push_back(next);
                }
            }
        }

        result
    }

    fn seed(&mut self, start: usize) -> Option<VecDeque<usize>> {
        if !self.graph.contains_vertex(start) {
            return None;
        }
        let mut queue = VecDeque::new();
        if !self.visited[start] {
            self.visited[start] = true;
            queue.push_back(start);
        }
        Some(queue)
    }
}

impl FormatGraph {
    /// Start a traversal that keeps its visited set across queries.
    pub fn traversal(&self) -> Traversal<'_> {
        Traversal::new(self)
    }

    /// Vertices reachable from `from`, filtered by `include`.
    pub fn get_reachable(&self, from: usize, include: impl FnMut(usize) -> bool) -> Vec<usize> {
        self.traversal().reachable(from, include)
    }

    /// Vertices from which `target` is reachable, filtered by `include`.
    pub fn get_reachable_to(
        &self,
        target: usize,
        include: impl FnMut(usize) -> bool,
    ) -> Vec<usize> {
        self.traversal().reachable_to(target, include)
    }

    /// Whether `to` can be reached from `from`. A vertex reaches itself.
    pub fn is_reachable(&self, from: usize, to: usize) -> bool {
        if !self.contains_vertex(from) || !self.contains_vertex(to) {
            return false;
        }
        if from == to {
            return true;
        }

        let mut visited = vec![false; self.vertex_count()];
        let mut queue = VecDeque::from([from]);
        visited[from] = true;

        while let Some(current) = queue.pop_front() {
            if current == to {
                return true;
            }
            for (_, next) in self.neighbors(current, Direction::Outgoing) {
                if !visited[next] {
                    visited[next] = true;
                    queue.push_back(next);
                }
            }
        }

        false
    }

    /// Shortest path (fewest edges) from `from` to `to`.
    ///
    /// Among equally short paths the one using the earliest-added edges wins.
    /// Returns an empty path when `to` is unreachable and when `from == to`.
    pub fn get_path(&self, from: usize, to: usize) -> EdgePath {
        if from == to || !self.contains_vertex(from) || !self.contains_vertex(to) {
            return EdgePath::new();
        }

        let count = self.vertex_count();
        let mut visited = vec![false; count];
        // predecessor (edge, vertex) for each reached vertex
        let mut prev: Vec<Option<(usize, usize)>> = vec![None; count];
        let mut queue = VecDeque::from([from]);
        visited[from] = true;

        'search: while let Some(current) = queue.pop_front() {
            for (edge, next) in self.neighbors(current, Direction::Outgoing) {
                if visited[next] {
                    continue;
                }
                visited[next] = true;
                prev[next] = Some((edge, current));
                if next == to {
                    break 'search;
                }
                queue.push_back(next);
            }
        }

        let mut edges = Vec::new();
        let mut current = to;
        while let Some((edge, vertex)) = prev[current] {
            edges.push(edge);
            current = vertex;
        }

        if current != from {
            return EdgePath::new();
        }

        edges.reverse();
        EdgePath::from(edges)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const LYX: usize = 0;
    const LATEX: usize = 1;
    const DVI: usize = 2;
    const PS: usize = 3;
    const PDF: usize = 4;

    /// lyx -> latex -> dvi -> {pdf, ps}, ps -> pdf
    fn create_test_graph() -> FormatGraph {
        let mut graph = FormatGraph::with_vertices(5);
        graph.add_edge(LYX, LATEX).unwrap(); // 0
        graph.add_edge(LATEX, DVI).unwrap(); // 1
        graph.add_edge(DVI, PDF).unwrap(); // 2
        graph.add_edge(DVI, PS).unwrap(); // 3
        graph.add_edge(PS, PDF).unwrap(); // 4
        graph
    }

    #[test]
    fn test_get_path_shortest_route() {
        let graph = create_test_graph();
        let path = graph.get_path(LYX, PDF);
        assert_eq!(path.as_slice(), &[0, 1, 2]);
    }

    #[test]
    fn test_get_path_endpoints() {
        let graph = create_test_graph();
        let path = graph.get_path(LATEX, PS);
        assert_eq!(graph.edge_endpoints(path.first().unwrap()).unwrap().0, LATEX);
        assert_eq!(graph.edge_endpoints(path.last().unwrap()).unwrap().1, PS);
    }

    #[test]
    fn test_get_path_identity_is_empty() {
        let graph = create_test_graph();
        for v in 0..graph.vertex_count() {
            assert!(graph.get_path(v, v).is_empty());
        }
    }

    #[test]
    fn test_get_path_unreachable_is_empty() {
        let graph = create_test_graph();
        assert!(graph.get_path(PDF, LYX).is_empty());
    }

    #[test]
    fn test_get_path_first_added_edge_wins() {
        let mut graph = FormatGraph::with_vertices(4);
        graph.add_edge(0, 2).unwrap(); // 0
        graph.add_edge(0, 1).unwrap(); // 1
        graph.add_edge(2, 3).unwrap(); // 2
        graph.add_edge(1, 3).unwrap(); // 3

        assert_eq!(graph.get_path(0, 3).as_slice(), &[0, 2]);
    }

    #[test]
    fn test_get_path_parallel_edges_prefers_first() {
        let mut graph = FormatGraph::with_vertices(2);
        graph.add_edge(0, 1).unwrap();
        graph.add_edge(0, 1).unwrap();
        assert_eq!(graph.get_path(0, 1).as_slice(), &[0]);
    }

    #[test]
    fn test_no_edges_nothing_reachable() {
        let graph = FormatGraph::with_vertices(3);
        assert!(!graph.is_reachable(0, 1));
        assert!(!graph.is_reachable(2, 0));
        assert!(graph.is_reachable(1, 1));
        assert!(graph.get_path(0, 2).is_empty());
    }

    #[test]
    fn test_round_trip_edges() {
        let mut graph = FormatGraph::with_vertices(2);
        graph.add_edge(0, 1).unwrap();
        graph.add_edge(1, 0).unwrap();

        assert!(graph.is_reachable(0, 1));
        assert!(graph.is_reachable(1, 0));
        assert_eq!(graph.get_path(0, 1).as_slice(), &[0]);
        assert_eq!(graph.get_path(1, 0).as_slice(), &[1]);
    }

    #[test]
    fn test_out_of_range_queries_are_empty() {
        let graph = create_test_graph();
        assert!(graph.get_path(0, 42).is_empty());
        assert!(!graph.is_reachable(42, 0));
        assert!(graph.get_reachable(42, |_| true).is_empty());
        assert!(graph.get_reachable_to(42, |_| true).is_empty());

        let empty = FormatGraph::new();
        assert!(empty.get_reachable(0, |_| true).is_empty());
        assert!(!empty.is_reachable(0, 0));
    }

    #[test]
    fn test_get_reachable_breadth_first_order() {
        let graph = create_test_graph();
        let reached = graph.get_reachable(LATEX, |_| true);
        assert_eq!(reached, vec![LATEX, DVI, PDF, PS]);
    }

    #[test]
    fn test_get_reachable_filter_still_traverses() {
        let graph = create_test_graph();
        // dvi is filtered out but pdf and ps behind it are still found
        let reached = graph.get_reachable(LATEX, |v| v != DVI && v != LATEX);
        assert_eq!(reached, vec![PDF, PS]);
    }

    #[test]
    fn test_get_reachable_to() {
        let graph = create_test_graph();
        let sources = graph.get_reachable_to(PS, |_| true);
        assert_eq!(sources, vec![PS, DVI, LATEX, LYX]);
    }

    #[test]
    fn test_traversal_keeps_visited_between_queries() {
        let graph = create_test_graph();
        let mut traversal = graph.traversal();

        let first = traversal.reachable(DVI, |_| true);
        assert_eq!(first, vec![DVI, PDF, PS]);

        // latex reaches dvi, pdf and ps but those were already reported
        let second = traversal.reachable(LATEX, |_| true);
        assert_eq!(second, vec![LATEX]);

        traversal.clear();
        let third = traversal.reachable(LATEX, |_| true);
        assert_eq!(third, vec![LATEX, DVI, PDF, PS]);
    }

    #[test]
    fn test_traversal_visited_start_yields_nothing() {
        let graph = create_test_graph();
        let mut traversal = graph.traversal();
        traversal.reachable_to(PDF, |_| true);
        assert!(traversal.is_visited(LYX));
        assert!(traversal.reachable_to(DVI, |_| true).is_empty());
    }
}
