//! Book catalog model: records, the bipartite book/attribute graph, facet
//! values and the filter algebra over them.
//!
//! Everything here is pure and synchronous; the canvas rebuilds the base graph
//! whenever the record list is replaced and re-filters it whenever the
//! selection changes.

mod builder;
mod facets;
mod filter;
mod record;
mod text;
mod types;

pub use builder::build_graph;
pub use facets::{FacetIndex, extract_facets};
pub use filter::{EmptyState, Selection, Tab, filter_graph};
pub use record::{BookRecord, parse_records};
pub use text::collate;
pub use types::{Edge, Endpoint, GraphData, Node, NodeHandle, NodeType};
