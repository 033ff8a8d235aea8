//! Induced subgraphs for a tab/chip selection.

use std::collections::HashSet;
use std::fmt;

use super::types::{Edge, GraphData, Node, NodeType};

/// Top-level filter tab.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Tab {
	/// Everything, unfiltered.
	#[default]
	All,
	/// One attribute type and the books linked to it.
	Facet(NodeType),
}

impl Tab {
	/// Sentinel tab label for the unfiltered view.
	pub const ALL_LABEL: &'static str = "ALL";

}

impl fmt::Display for Tab {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Tab::All => f.write_str(Self::ALL_LABEL),
			Tab::Facet(t) => f.write_str(t.tag()),
		}
	}
}

/// Current filter state: a tab and an optional chip value within it.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Selection {
	/// Which tab is open.
	pub tab: Tab,
	/// Attribute value within the tab; ignored for `All`.
	pub chip: Option<String>,
}

impl Selection {
	/// The unfiltered selection.
	pub fn all() -> Self {
		Self::default()
	}

	/// A facet tab with no chip.
	pub fn facet(node_type: NodeType) -> Self {
		Self {
			tab: Tab::Facet(node_type),
			chip: None,
		}
	}

	/// A facet tab narrowed to one value.
	pub fn chip(node_type: NodeType, value: impl Into<String>) -> Self {
		Self {
			tab: Tab::Facet(node_type),
			chip: Some(value.into()),
		}
	}
}

/// Why the canvas has nothing to draw.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EmptyState {
	/// No books were loaded at all.
	NoData,
	/// Books exist but the selection matches none.
	NoResults,
}

impl EmptyState {
	/// Text drawn in the middle of the canvas.
	pub fn message(self) -> &'static str {
		match self {
			EmptyState::NoData => "표시할 도서 데이터가 없습니다",
			EmptyState::NoResults => "선택한 조건에 맞는 도서가 없습니다",
		}
	}

	/// Why nothing is drawn, if nothing is.
	pub fn of(base: &GraphData, active: &GraphData) -> Option<EmptyState> {
		if base.is_empty() {
			Some(EmptyState::NoData)
		} else if active.is_empty() {
			Some(EmptyState::NoResults)
		} else {
			None
		}
	}
}

/// Nodes of `base` whose id is in `keep`, in base order.
fn retain_nodes(base: &GraphData, keep: &HashSet<&str>) -> Vec<Node> {
	base.nodes
		.iter()
		.filter(|n| keep.contains(n.id.as_str()))
		.cloned()
		.collect()
}

/// Derive the active graph for `selection`.
///
/// Edges always come back with plain-id endpoints, whatever shape the base
/// graph's endpoints are in. A chip that matches no edge yields an empty
/// graph: an attribute node without books is never shown on its own.
pub fn filter_graph(base: &GraphData, selection: &Selection) -> GraphData {
	let Tab::Facet(node_type) = selection.tab else {
		return GraphData {
			nodes: base.nodes.clone(),
			links: base.links.iter().map(Edge::normalized).collect(),
		};
	};

	let links: Vec<Edge> = match selection.chip.as_deref() {
		None => base
			.links
			.iter()
			.filter(|l| l.edge_type == node_type)
			.map(Edge::normalized)
			.collect(),
		Some(chip) => {
			let target = node_type.node_id(chip);
			base.links
				.iter()
				.filter(|l| l.edge_type == node_type && l.touches(&target))
				.map(Edge::normalized)
				.collect()
		}
	};

	let keep: HashSet<&str> = links
		.iter()
		.flat_map(|l| [l.source_id(), l.target_id()])
		.collect();
	let nodes = retain_nodes(base, &keep);

	log::debug!(
		"book-globe: filter {} / {:?} -> {} nodes, {} links",
		selection.tab,
		selection.chip,
		nodes.len(),
		links.len()
	);
	GraphData { nodes, links }
}
