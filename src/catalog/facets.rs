//! Facet values for the filter controls.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use super::record::BookRecord;
use super::text::collate;
use super::types::NodeType;

/// Sorted distinct attribute values per attribute type.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FacetIndex {
	values: BTreeMap<NodeType, Vec<String>>,
	/// Distinct books per attribute node id.
	counts: HashMap<String, usize>,
}

impl FacetIndex {
	/// Values for one type, empty when the type has none (or is `Book`).
	pub fn values(&self, node_type: NodeType) -> &[String] {
		self.values.get(&node_type).map(Vec::as_slice).unwrap_or(&[])
	}

	/// Attribute types that have at least one value, in tab order.
	pub fn types(&self) -> impl Iterator<Item = NodeType> + '_ {
		self.values.iter().filter(|(_, v)| !v.is_empty()).map(|(t, _)| *t)
	}

	/// Whether `value` is still offered as a chip.
	pub fn contains(&self, node_type: NodeType, value: &str) -> bool {
		self.values(node_type).iter().any(|v| v == value)
	}

	/// Number of distinct books carrying a value; the chip badge.
	pub fn book_count(&self, node_type: NodeType, value: &str) -> usize {
		self.counts.get(&node_type.node_id(value)).copied().unwrap_or(0)
	}
}

/// Collect every attribute value present across valid records.
///
/// Uses the builder's validity rule and value normalization, so each listed
/// value names a node of the built graph.
pub fn extract_facets(books: &[BookRecord]) -> FacetIndex {
	let mut sets: BTreeMap<NodeType, BTreeSet<String>> = NodeType::ATTRIBUTES
		.into_iter()
		.map(|t| (t, BTreeSet::new()))
		.collect();

	let mut holders: HashMap<String, HashSet<&str>> = HashMap::new();

	for record in books.iter().filter(|r| r.is_valid()) {
		let Some(key) = record.key() else {
			continue;
		};
		for (node_type, value) in record.attributes() {
			holders.entry(node_type.node_id(&value)).or_default().insert(key);
			sets.entry(node_type).or_default().insert(value);
		}
	}
	let counts = holders.into_iter().map(|(id, keys)| (id, keys.len())).collect();

	let values = sets
		.into_iter()
		.map(|(t, set)| {
			let mut sorted: Vec<String> = set.into_iter().collect();
			sorted.sort_by(|a, b| collate(a, b));
			(t, sorted)
		})
		.collect();
	FacetIndex { values, counts }
}
