//! Bipartite graph construction from book records.

use std::collections::{HashMap, HashSet};

use super::record::BookRecord;
use super::types::{Edge, GraphData, Node, NodeType};

/// Accumulates unique nodes and deduplicated edges.
#[derive(Default)]
struct GraphAccumulator {
	nodes: Vec<Node>,
	index: HashMap<String, usize>,
	links: Vec<Edge>,
	seen_links: HashSet<(String, String)>,
}

impl GraphAccumulator {
	/// Insert unless the id exists; the first write keeps its label and extras.
	fn node(&mut self, node: Node) -> &str {
		let slot = match self.index.get(&node.id) {
			Some(&slot) => slot,
			None => {
				let slot = self.nodes.len();
				self.index.insert(node.id.clone(), slot);
				self.nodes.push(node);
				slot
			}
		};
		&self.nodes[slot].id
	}

	fn link(&mut self, source: &str, target: &str, edge_type: NodeType) {
		if self.seen_links.insert((source.to_string(), target.to_string())) {
			self.links.push(Edge::new(source, target, edge_type));
		}
	}

	fn finish(self) -> GraphData {
		GraphData {
			nodes: self.nodes,
			links: self.links,
		}
	}
}

fn book_node(record: &BookRecord, key: &str, title: &str) -> Node {
	Node {
		id: NodeType::Book.node_id(key),
		label: title.to_string(),
		node_type: NodeType::Book,
		book_id: Some(key.to_string()),
		image: record.image.clone(),
		author: record.author.as_deref().map(str::trim).map(str::to_string),
		publisher: record.publisher.clone(),
	}
}

/// Build the book/attribute graph.
///
/// Records without an id or title are skipped. Attribute nodes are shared
/// across books through their content-addressed id, and a book links to a
/// given attribute at most once even if the value repeats in its record.
pub fn build_graph(books: &[BookRecord]) -> GraphData {
	let mut acc = GraphAccumulator::default();
	let mut skipped = 0usize;

	for record in books {
		let (Some(key), Some(title)) = (record.key(), record.display_title()) else {
			skipped += 1;
			continue;
		};
		let book_id = acc.node(book_node(record, key, title)).to_string();

		for (node_type, value) in record.attributes() {
			let attr_id = acc.node(Node::attribute(node_type, &value)).to_string();
			acc.link(&book_id, &attr_id, node_type);
		}
	}

	if skipped > 0 {
		log::debug!("book-globe: builder skipped {} records without id/title", skipped);
	}
	acc.finish()
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::catalog::strategies::arb_books;
	use crate::catalog::types::Endpoint;
	use proptest::prelude::*;

	fn with_author(id: &str, title: &str, author: &str) -> BookRecord {
		BookRecord {
			author: Some(author.into()),
			..BookRecord::new(id, title)
		}
	}

	fn ids(graph: &GraphData) -> Vec<&str> {
		graph.nodes.iter().map(|n| n.id.as_str()).collect()
	}

	#[test]
	fn test_shared_author_makes_one_node() {
		let graph = build_graph(&[with_author("1", "T1", "A"), with_author("2", "T2", "A")]);
		assert_eq!(ids(&graph), vec!["book:1", "author:A", "book:2"]);
		assert_eq!(graph.links.len(), 2);
		assert!(graph.links.iter().all(|l| l.target_id() == "author:A"));
	}

	#[test]
	fn test_multi_valued_category_splits() {
		let record = BookRecord {
			category: Some("사회/정치, 역사".into()),
			..BookRecord::new("1", "T")
		};
		let graph = build_graph(&[record]);
		let categories: Vec<_> = graph
			.nodes
			.iter()
			.filter(|n| n.node_type == NodeType::Category)
			.map(|n| n.label.as_str())
			.collect();
		assert_eq!(categories, vec!["사회", "정치", "역사"]);
		assert_eq!(graph.links.len(), 3);
		assert!(graph.links.iter().all(|l| l.source_id() == "book:1"));
	}

	#[test]
	fn test_division_normalized() {
		let record = BookRecord {
			division: Some("국내 번역서".into()),
			..BookRecord::new("1", "T")
		};
		let graph = build_graph(&[record]);
		assert!(graph.node("division:번역서").is_some());
		assert!(graph.node("division:국내서").is_none());
	}

	#[test]
	fn test_repeated_value_links_once() {
		let record = BookRecord {
			category: Some("사회,사회".into()),
			..BookRecord::new("1", "T")
		};
		let graph = build_graph(&[record]);
		assert_eq!(graph.nodes.len(), 2);
		assert_eq!(graph.links.len(), 1);
	}

	#[test]
	fn test_first_write_wins_and_extras_are_copied() {
		let first = BookRecord {
			image: Some("a.png".into()),
			publisher: Some("P".into()),
			..with_author("1", "First", "A")
		};
		let dup = with_author("1", "Second", "B");
		let graph = build_graph(&[first, dup]);
		let book = graph.node("book:1").unwrap();
		assert_eq!(book.label, "First");
		assert_eq!(book.image.as_deref(), Some("a.png"));
		assert_eq!(book.author.as_deref(), Some("A"));
		assert_eq!(book.publisher.as_deref(), Some("P"));
		// The duplicate record still contributes its attributes.
		assert!(graph.node("author:B").is_some());
		assert_eq!(graph.links.len(), 2);
	}

	#[test]
	fn test_malformed_records_skipped() {
		let graph = build_graph(&[
			BookRecord {
				title: Some("no id".into()),
				..Default::default()
			},
			BookRecord {
				id: Some("9".into()),
				author: Some("A".into()),
				..Default::default()
			},
		]);
		assert!(graph.is_empty());
		assert!(graph.links.is_empty());
	}

	#[test]
	fn test_empty_values_skipped() {
		let record = BookRecord {
			author: Some("   ".into()),
			genre: Some(" / ".into()),
			..BookRecord::new("1", "T")
		};
		let graph = build_graph(&[record]);
		assert_eq!(ids(&graph), vec!["book:1"]);
	}

	#[test]
	fn test_edges_are_plain_ids() {
		let graph = build_graph(&[with_author("1", "T1", "A")]);
		assert_eq!(graph.links[0].source, Endpoint::Id("book:1".into()));
		assert_eq!(graph.links[0].edge_type, NodeType::Author);
	}

	proptest! {
		#[test]
		fn prop_node_ids_unique(books in arb_books()) {
			let graph = build_graph(&books);
			let unique: HashSet<_> = graph.nodes.iter().map(|n| &n.id).collect();
			prop_assert_eq!(unique.len(), graph.nodes.len());
		}

		#[test]
		fn prop_rebuild_is_isomorphic(books in arb_books()) {
			let a = build_graph(&books);
			let b = build_graph(&books);
			let edges = |g: &GraphData| {
				let mut e: Vec<_> = g
					.links
					.iter()
					.map(|l| (l.source_id().to_string(), l.target_id().to_string()))
					.collect();
				e.sort();
				e
			};
			prop_assert_eq!(ids(&a), ids(&b));
			prop_assert_eq!(edges(&a), edges(&b));
		}

		#[test]
		fn prop_edges_are_bipartite(books in arb_books()) {
			let graph = build_graph(&books);
			for link in &graph.links {
				let source = graph.node(link.source_id()).unwrap();
				let target = graph.node(link.target_id()).unwrap();
				prop_assert!(source.node_type.is_book());
				prop_assert!(!target.node_type.is_book());
				prop_assert_eq!(target.node_type, link.edge_type);
			}
		}
	}
}
