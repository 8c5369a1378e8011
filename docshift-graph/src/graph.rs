//! FormatGraph - the directed graph of formats and converters.

use crate::error::GraphError;
use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use serde::{Deserialize, Serialize};

/// Ordered sequence of converter indices leading from one format to another.
///
/// An empty path means either "no conversion needed" (source == target) or
/// "no route"; callers distinguish the two by comparing the endpoints.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EdgePath(Vec<usize>);

impl EdgePath {
    /// Create a new empty path.
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn first(&self) -> Option<usize> {
        self.0.first().copied()
    }

    pub fn last(&self) -> Option<usize> {
        self.0.last().copied()
    }

    /// Iterate over the converter indices in execution order.
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.0.iter().copied()
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.0
    }
}

impl From<Vec<usize>> for EdgePath {
    fn from(edges: Vec<usize>) -> Self {
        Self(edges)
    }
}

impl IntoIterator for EdgePath {
    type Item = usize;
    type IntoIter = std::vec::IntoIter<usize>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// The format graph: one vertex per format, one edge per converter.
///
/// Vertices are addressed by their position (the format id) and every edge
/// carries the index of the converter it was created for. Edges are only
/// ever appended, so the edge index handed out by [`FormatGraph::add_edge`]
/// stays valid until the next [`FormatGraph::init`].
pub struct FormatGraph {
    /// Underlying directed graph from petgraph, edge weight is the converter index
    inner: DiGraph<(), usize>,
}

impl Default for FormatGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl FormatGraph {
    /// Create a new empty graph.
    pub fn new() -> Self {
        Self {
            inner: DiGraph::new(),
        }
    }

    /// Create a graph with `size` vertices and no edges.
    pub fn with_vertices(size: usize) -> Self {
        let mut graph = Self::new();
        graph.init(size);
        graph
    }

    // === Construction ===

    /// (Re)allocate `size` vertices, dropping every edge.
    pub fn init(&mut self, size: usize) {
        self.inner = DiGraph::with_capacity(size, size * 2);
        for _ in 0..size {
            self.inner.add_node(());
        }
    }

    /// Add an edge from `source` to `target`.
    ///
    /// Returns the new edge index. Self loops and parallel edges are allowed.
    pub fn add_edge(&mut self, source: usize, target: usize) -> Result<usize, GraphError> {
        self.check_vertex(source)?;
        self.check_vertex(target)?;

        let index = self.inner.edge_count();
        self.inner
            .add_edge(NodeIndex::new(source), NodeIndex::new(target), index);
        Ok(index)
    }

    fn check_vertex(&self, vertex: usize) -> Result<(), GraphError> {
        if vertex < self.vertex_count() {
            Ok(())
        } else {
            Err(GraphError::VertexOutOfRange {
                vertex,
                vertex_count: self.vertex_count(),
            })
        }
    }

    // === Accessors ===

    /// Get count of vertices.
    pub fn vertex_count(&self) -> usize {
        self.inner.node_count()
    }

    /// Get count of edges.
    pub fn edge_count(&self) -> usize {
        self.inner.edge_count()
    }

    pub fn contains_vertex(&self, vertex: usize) -> bool {
        vertex < self.vertex_count()
    }

    /// Edges leaving (or entering) `vertex`, as `(edge index, other vertex)`
    /// pairs in the order the edges were added.
    pub(crate) fn neighbors(&self, vertex: usize, direction: Direction) -> Vec<(usize, usize)> {
        if !self.contains_vertex(vertex) {
            return vec![];
        }

        // petgraph walks adjacency lists newest first
        let mut edges: Vec<(usize, usize)> = self
            .inner
            .edges_directed(NodeIndex::new(vertex), direction)
            .map(|e| {
                let other = match direction {
                    Direction::Outgoing => e.target(),
                    Direction::Incoming => e.source(),
                };
                (*e.weight(), other.index())
            })
            .collect();
        edges.sort_unstable_by_key(|&(edge, _)| edge);
        edges
    }

    /// Endpoints of an edge, if it exists.
    pub fn edge_endpoints(&self, edge: usize) -> Option<(usize, usize)> {
        self.inner
            .edge_endpoints(petgraph::graph::EdgeIndex::new(edge))
            .map(|(s, t)| (s.index(), t.index()))
    }
}

impl std::fmt::Debug for FormatGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FormatGraph")
            .field("vertex_count", &self.vertex_count())
            .field("edge_count", &self.edge_count())
            .finish()
    }
}
