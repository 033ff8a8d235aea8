//! Graph data structures shared by the builder, filter and canvas.

use std::fmt;

/// Role of a node in the book/attribute graph.
///
/// Ordering follows declaration order, which is also the tab order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum NodeType {
	/// A catalog record.
	Book,
	/// A person credited as author.
	Author,
	Translator,
	/// Library classification.
	Category,
	Subject,
	Genre,
	/// Reading level.
	Level,
	/// Edition note such as "개정판".
	Division,
}

impl NodeType {
	/// Every role, books first.
	pub const ALL: [NodeType; 8] = [
		NodeType::Book,
		NodeType::Author,
		NodeType::Translator,
		NodeType::Category,
		NodeType::Subject,
		NodeType::Genre,
		NodeType::Level,
		NodeType::Division,
	];

	/// The seven attribute roles (everything but books).
	pub const ATTRIBUTES: [NodeType; 7] = [
		NodeType::Author,
		NodeType::Translator,
		NodeType::Category,
		NodeType::Subject,
		NodeType::Genre,
		NodeType::Level,
		NodeType::Division,
	];

	/// Machine key used as the node id prefix.
	pub fn key(self) -> &'static str {
		match self {
			NodeType::Book => "book",
			NodeType::Author => "author",
			NodeType::Translator => "translator",
			NodeType::Category => "category",
			NodeType::Subject => "subject",
			NodeType::Genre => "genre",
			NodeType::Level => "level",
			NodeType::Division => "division",
		}
	}

	/// Localized tag shown on tabs.
	pub fn tag(self) -> &'static str {
		match self {
			NodeType::Book => "도서",
			NodeType::Author => "저자",
			NodeType::Translator => "역자",
			NodeType::Category => "분류",
			NodeType::Subject => "주제",
			NodeType::Genre => "장르",
			NodeType::Level => "단계",
			NodeType::Division => "구분",
		}
	}

	/// Whether this is the book type.
	pub fn is_book(self) -> bool {
		self == NodeType::Book
	}

	/// Content-addressed node id: `"<key>:<value>"`.
	pub fn node_id(self, value: &str) -> String {
		format!("{}:{}", self.key(), value)
	}
}

impl fmt::Display for NodeType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.key())
	}
}

/// A node in the catalog graph.
///
/// Book nodes carry denormalized copies of display metadata for previews;
/// these are plain copies, never references into other nodes.
#[derive(Clone, Debug, PartialEq)]
pub struct Node {
	/// Content-addressed id, `"<type>:<value>"`.
	pub id: String,
	/// Title for books, the attribute value otherwise.
	pub label: String,
	/// Role; also the prefix of `id`.
	pub node_type: NodeType,
	/// Record id, books only.
	pub book_id: Option<String>,
	/// Cover URL, books only.
	pub image: Option<String>,
	/// Author as plain text, books only.
	pub author: Option<String>,
	/// Books only.
	pub publisher: Option<String>,
}

impl Node {
	/// An attribute node with no extras.
	pub fn attribute(node_type: NodeType, value: &str) -> Self {
		Self {
			id: node_type.node_id(value),
			label: value.to_string(),
			node_type,
			book_id: None,
			image: None,
			author: None,
			publisher: None,
		}
	}
}

/// Handle to a node slot inside a running physics engine.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct NodeHandle {
	/// Id of the node in the slot.
	pub id: String,
	/// Index into the engine's node and position tables.
	pub slot: usize,
}

/// One end of an edge: a plain id, or a handle once an engine has hydrated
/// the link.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Endpoint {
	/// Unresolved id, as parsed.
	Id(String),
	/// Resolved to an engine slot.
	Ref(NodeHandle),
}

impl Endpoint {
	/// The node id, whatever the representation.
	pub fn id(&self) -> &str {
		match self {
			Endpoint::Id(id) => id,
			Endpoint::Ref(handle) => &handle.id,
		}
	}

	/// Plain-id form of this endpoint.
	pub fn normalized(&self) -> Endpoint {
		Endpoint::Id(self.id().to_string())
	}
}

impl From<&str> for Endpoint {
	fn from(id: &str) -> Self {
		Endpoint::Id(id.to_string())
	}
}

impl From<String> for Endpoint {
	fn from(id: String) -> Self {
		Endpoint::Id(id)
	}
}

/// A typed book -> attribute edge.
#[derive(Clone, Debug, PartialEq)]
pub struct Edge {
	/// The book end.
	pub source: Endpoint,
	/// The attribute end.
	pub target: Endpoint,
	/// Type of the attribute end.
	pub edge_type: NodeType,
}

impl Edge {
	/// Edge typed by its attribute end.
	pub fn new(source: impl Into<Endpoint>, target: impl Into<Endpoint>, edge_type: NodeType) -> Self {
		Self {
			source: source.into(),
			target: target.into(),
			edge_type,
		}
	}

	/// Id of the book end.
	pub fn source_id(&self) -> &str {
		self.source.id()
	}

	/// Id of the attribute end.
	pub fn target_id(&self) -> &str {
		self.target.id()
	}

	/// Whether either end is `id`.
	pub fn touches(&self, id: &str) -> bool {
		self.source_id() == id || self.target_id() == id
	}

	/// Same edge with both ends reduced to plain ids.
	pub fn normalized(&self) -> Edge {
		Edge {
			source: self.source.normalized(),
			target: self.target.normalized(),
			edge_type: self.edge_type,
		}
	}
}

/// Complete graph data: nodes and links.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GraphData {
	/// Nodes in insertion order.
	pub nodes: Vec<Node>,
	/// Book to attribute links.
	pub links: Vec<Edge>,
}

impl GraphData {
	/// No nodes at all.
	pub fn is_empty(&self) -> bool {
		self.nodes.is_empty()
	}

	/// Linear lookup by id.
	pub fn node(&self, id: &str) -> Option<&Node> {
		self.nodes.iter().find(|n| n.id == id)
	}

	/// Number of edges touching `id`.
	pub fn degree(&self, id: &str) -> usize {
		self.links.iter().filter(|l| l.touches(id)).count()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_node_id_is_content_addressed() {
		assert_eq!(NodeType::Genre.node_id("SF"), "genre:SF");
		assert_eq!(Node::attribute(NodeType::Level, "1단계").id, "level:1단계");
	}

	#[test]
	fn test_endpoint_normalization() {
		let hydrated = Endpoint::Ref(NodeHandle {
			id: "book:7".into(),
			slot: 3,
		});
		assert_eq!(hydrated.id(), "book:7");
		assert_eq!(hydrated.normalized(), Endpoint::Id("book:7".into()));

		let edge = Edge {
			source: hydrated,
			target: "author:A".into(),
			edge_type: NodeType::Author,
		};
		assert!(edge.touches("author:A"));
		assert_eq!(edge.normalized().source, Endpoint::Id("book:7".into()));
	}
}
