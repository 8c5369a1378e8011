//! Error types for the docshift-graph crate.

use thiserror::Error;

/// Errors related to Graph operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GraphError {
    #[error("Vertex {vertex} out of range: graph has {vertex_count} vertices")]
    VertexOutOfRange { vertex: usize, vertex_count: usize },
}
