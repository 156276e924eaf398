//! Flattens a leveled decomposition into render-ready node and edge lists
//! plus the deterministic prune order used for playback.

use std::collections::HashMap;

use super::dataset::DecompositionData;

/// Builds the canonical edge id. Ids are undirected but stored in the
/// orientation the dataset produced; lookups must try both orientations.
pub fn edge_id(source: &str, target: &str) -> String {
	format!("{source}-{target}")
}

/// Returns the opposite orientation of an edge id, if it splits cleanly.
pub fn flipped_id(id: &str) -> Option<String> {
	id.split_once('-').map(|(s, t)| format!("{t}-{s}"))
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FlatNode {
	pub id: String,
	/// Highest level the node appears under.
	pub level: u32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FlatEdge {
	pub id: String,
	pub source: String,
	pub target: String,
	/// Level whose edge list produced this entry.
	pub level: u32,
}

/// Output of [`flatten`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FlatGraph {
	pub nodes: Vec<FlatNode>,
	pub edges: Vec<FlatEdge>,
	/// Edge ids in playback order: the reverse of the server-side pruning
	/// sequence, so stepping proceeds from the outermost shell inward.
	pub prune_order: Vec<String>,
}

/// Flattens a decomposition. Levels are scanned numerically descending and
/// a node's level is fixed on first (highest) encounter. Edges are
/// accumulated across all levels without de-duplication; duplicate ids are
/// an accepted quirk of the source data and are collapsed downstream by the
/// reconciler's unordered-pair check. An empty dataset yields empty output.
pub fn flatten(data: &DecompositionData) -> FlatGraph {
	let mut flat = FlatGraph::default();
	let mut seen: HashMap<String, usize> = HashMap::new();
	let mut pruned: Vec<String> = Vec::new();

	for (&level, slice) in data.iter().rev() {
		for &node in &slice.nodes {
			let id = node.to_string();
			if !seen.contains_key(&id) {
				seen.insert(id.clone(), flat.nodes.len());
				flat.nodes.push(FlatNode { id, level });
			}
		}
		for &(source, target) in &slice.edges {
			let (source, target) = (source.to_string(), target.to_string());
			flat.edges.push(FlatEdge {
				id: edge_id(&source, &target),
				source,
				target,
				level,
			});
		}
		for &(source, target) in &slice.pruned_edges {
			pruned.push(edge_id(&source.to_string(), &target.to_string()));
		}
	}

	pruned.reverse();
	flat.prune_order = pruned;
	flat
}
