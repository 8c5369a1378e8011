//! # docshift-graph
//!
//! Format graph data structures for docshift.
//!
//! Every registered format is a vertex and every registered converter is an
//! edge carrying its converter index. The crate knows nothing about formats
//! themselves; it answers the structural questions the converter registry
//! asks:
//!
//! - **Shortest path**: [`FormatGraph::get_path`] returns the [`EdgePath`]
//!   with the fewest conversion steps
//! - **Reachability**: [`FormatGraph::is_reachable`], [`FormatGraph::get_reachable`]
//!   and [`FormatGraph::get_reachable_to`]
//! - **Merged queries**: a [`Traversal`] keeps its visited set between queries
//!
//! ## Example
//!
//! ```rust
//! use docshift_graph::FormatGraph;
//!
//! // latex(0) -> dvi(1) -> pdf(2), latex(0) -> pdf(2)
//! let mut graph = FormatGraph::with_vertices(3);
//! graph.add_edge(0, 1).unwrap();
//! graph.add_edge(1, 2).unwrap();
//! graph.add_edge(0, 2).unwrap();
//!
//! assert_eq!(graph.get_path(0, 2).as_slice(), &[2]);
//! assert!(graph.is_reachable(1, 2));
//! assert!(!graph.is_reachable(2, 0));
//! ```

pub mod error;
pub mod graph;
pub mod query;

pub use error::GraphError;
pub use graph::{EdgePath, FormatGraph};
pub use query::{Traversal, TraversalDirection};
